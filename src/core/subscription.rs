// Slot arena for subscriber lists
//
// Used by the game loop (per-tick callbacks) and the physics world
// (collision listeners). Slots never move: removing a subscriber empties its
// slot, so the iteration order of the survivors is stable, and the lowest
// empty slot is handed out again before the arena grows.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

/// Token returned by [`Subscribers::subscribe`]
///
/// The generation makes a token stale once its slot has been emptied, so an
/// old token can never remove the subscriber that reused the slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId {
    index: u32,
    generation: u32,
}

impl SubscriptionId {
    /// Slot index of this subscription
    pub fn slot(&self) -> usize {
        self.index as usize
    }
}

#[derive(Debug)]
struct Slot<T> {
    generation: u32,
    value: Option<T>,
}

/// Growable list of subscribers addressed by stable slots
#[derive(Debug)]
pub struct Subscribers<T> {
    slots: Vec<Slot<T>>,
    /// Empty slot indices, smallest first
    free: BinaryHeap<Reverse<u32>>,
}

impl<T> Subscribers<T> {
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: BinaryHeap::new(),
        }
    }

    /// Store a subscriber in the lowest empty slot, or append one
    pub fn subscribe(&mut self, value: T) -> SubscriptionId {
        if let Some(Reverse(index)) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.value = Some(value);
            return SubscriptionId {
                index,
                generation: slot.generation,
            };
        }

        let index = self.slots.len() as u32;
        self.slots.push(Slot {
            generation: 0,
            value: Some(value),
        });
        SubscriptionId {
            index,
            generation: 0,
        }
    }

    /// Empty the slot behind `id`
    ///
    /// Returns the removed subscriber, or `None` when the token is stale.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> Option<T> {
        let slot = self.slots.get_mut(id.slot())?;
        if slot.generation != id.generation {
            return None;
        }
        let value = slot.value.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(Reverse(id.index));
        Some(value)
    }

    /// Live subscribers in slot order
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.slots.iter().filter_map(|slot| slot.value.as_ref())
    }
}

// Inspection helpers for tests
#[cfg(test)]
impl<T> Subscribers<T> {
    /// Check whether `id` still refers to a live subscriber
    pub fn contains(&self, id: SubscriptionId) -> bool {
        self.slots
            .get(id.slot())
            .is_some_and(|slot| slot.generation == id.generation && slot.value.is_some())
    }

    pub fn get(&self, id: SubscriptionId) -> Option<&T> {
        self.slots
            .get(id.slot())
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.value.as_ref())
    }

    /// Empty every slot
    pub fn clear(&mut self) {
        for (index, slot) in self.slots.iter_mut().enumerate() {
            if slot.value.take().is_some() {
                slot.generation = slot.generation.wrapping_add(1);
                self.free.push(Reverse(index as u32));
            }
        }
    }

    /// Number of live subscribers
    pub fn len(&self) -> usize {
        self.slots.len() - self.free.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of slots ever allocated (live and empty)
    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }
}

impl<T: Clone> Subscribers<T> {
    /// Copy of the live subscribers, used to dispatch without holding a borrow
    pub fn snapshot(&self) -> Vec<T> {
        self.iter().cloned().collect()
    }
}

impl<T> Default for Subscribers<T> {
    fn default() -> Self {
        Self::new()
    }
}
