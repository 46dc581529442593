use rapier2d::prelude::*;
use std::sync::{Arc, Mutex};

/// Collision filter for a body
///
/// `category` is what the body is, `mask` what it collides with. Two bodies
/// touch only if each one's category is in the other's mask.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollisionFilter {
    pub category: u32,
    pub mask: u32,
}

impl CollisionFilter {
    pub const fn new(category: u32, mask: u32) -> Self {
        Self { category, mask }
    }

    /// Whether two filtered bodies are allowed to collide
    #[cfg(test)]
    pub fn accepts(&self, other: &CollisionFilter) -> bool {
        (self.category & other.mask) != 0 && (other.category & self.mask) != 0
    }

    /// Convert to rapier2d's InteractionGroups
    ///
    /// Rapier's membership/filter test is exactly the category/mask test.
    pub fn to_interaction_groups(self) -> InteractionGroups {
        InteractionGroups::new(
            Group::from_bits_truncate(self.category),
            Group::from_bits_truncate(self.mask),
        )
    }
}

impl Default for CollisionFilter {
    /// Category 1, collides with everything
    fn default() -> Self {
        Self::new(0x0001, u32::MAX)
    }
}

/// One pair of bodies that started touching during a step
#[derive(Debug, Clone, PartialEq)]
pub struct CollisionPair {
    pub body_a: RigidBodyHandle,
    pub body_b: RigidBodyHandle,
    pub label_a: String,
    pub label_b: String,
}

impl CollisionPair {
    /// View this pair from `body`'s side, if it takes part in it
    pub fn oriented(&self, body: RigidBodyHandle) -> Option<BodyContact> {
        if self.body_a == body {
            Some(BodyContact {
                body: self.body_a,
                other_body: self.body_b,
                other_label: self.label_b.clone(),
            })
        } else if self.body_b == body {
            Some(BodyContact {
                body: self.body_b,
                other_body: self.body_a,
                other_label: self.label_a.clone(),
            })
        } else {
            None
        }
    }
}

/// Every pair that started touching during one world step, in report order
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CollisionStart {
    pub pairs: Vec<CollisionPair>,
}

impl CollisionStart {
    /// Keep the pairs involving `body`, oriented so it is always `body`
    pub fn for_body(&self, body: RigidBodyHandle) -> Option<BodyCollision> {
        let pairs: Vec<_> = self
            .pairs
            .iter()
            .filter_map(|pair| pair.oriented(body))
            .collect();

        if pairs.is_empty() {
            None
        } else {
            Some(BodyCollision { pairs })
        }
    }
}

/// A contact seen from one body
#[derive(Debug, Clone, PartialEq)]
pub struct BodyContact {
    pub body: RigidBodyHandle,
    pub other_body: RigidBodyHandle,
    pub other_label: String,
}

/// Collision start event filtered to a single body; never empty
#[derive(Debug, Clone, PartialEq)]
pub struct BodyCollision {
    pub pairs: Vec<BodyContact>,
}

/// Queue for storing collision starts during physics step
///
/// Rapier reports collider handles; they are resolved to their parent
/// bodies while the collider set is at hand.
pub struct CollisionEventQueue {
    events: Arc<Mutex<Vec<(RigidBodyHandle, RigidBodyHandle)>>>,
}

impl CollisionEventQueue {
    pub fn new() -> Self {
        Self {
            events: Arc::new(Mutex::new(Vec::with_capacity(32))), // Pre-allocate for common case
        }
    }

    /// Clear all events (call at start of physics step)
    pub fn clear(&self) {
        if let Ok(mut events) = self.events.lock() {
            events.clear();
        }
    }

    /// Take every body pair recorded since the last clear
    pub fn drain(&self) -> Vec<(RigidBodyHandle, RigidBodyHandle)> {
        self.events
            .lock()
            .map(|mut events| events.drain(..).collect())
            .unwrap_or_default()
    }

    fn push(&self, pair: (RigidBodyHandle, RigidBodyHandle)) {
        if let Ok(mut events) = self.events.lock() {
            events.push(pair);
        }
    }
}

impl Default for CollisionEventQueue {
    fn default() -> Self {
        Self::new()
    }
}

// Implement rapier2d's EventHandler trait for our event queue
impl EventHandler for CollisionEventQueue {
    fn handle_collision_event(
        &self,
        _bodies: &RigidBodySet,
        colliders: &ColliderSet,
        event: CollisionEvent,
        _contact_pair: Option<&ContactPair>,
    ) {
        // Only starts are republished
        if let CollisionEvent::Started(h1, h2, _flags) = event {
            let parent = |handle| colliders.get(handle).and_then(|c| c.parent());
            if let (Some(a), Some(b)) = (parent(h1), parent(h2)) {
                self.push((a, b));
            }
        }
    }

    fn handle_contact_force_event(
        &self,
        _dt: Real,
        _bodies: &RigidBodySet,
        _colliders: &ColliderSet,
        _contact_pair: &ContactPair,
        _total_force_magnitude: Real,
    ) {
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn handles() -> (RigidBodyHandle, RigidBodyHandle, RigidBodyHandle) {
        let mut set = RigidBodySet::new();
        (
            set.insert(RigidBodyBuilder::dynamic().build()),
            set.insert(RigidBodyBuilder::dynamic().build()),
            set.insert(RigidBodyBuilder::dynamic().build()),
        )
    }

    fn pair(a: RigidBodyHandle, b: RigidBodyHandle) -> CollisionPair {
        CollisionPair {
            body_a: a,
            body_b: b,
            label_a: "a".into(),
            label_b: "b".into(),
        }
    }

    #[test]
    fn test_filter_accepts_matching_masks() {
        let one = CollisionFilter::new(0b01, 0b10);
        let two = CollisionFilter::new(0b10, 0b01);
        assert!(one.accepts(&two));
        assert!(two.accepts(&one));
    }

    #[test]
    fn test_filter_needs_both_directions() {
        let player = CollisionFilter::new(0x2, 0x1);
        let arrow = CollisionFilter::new(0x4, 0x1);
        let border = CollisionFilter::default();

        assert!(player.accepts(&border));
        assert!(arrow.accepts(&border));
        assert!(!player.accepts(&arrow));
    }

    #[test]
    fn test_filter_matches_rapier_groups() {
        let one = CollisionFilter::new(0b01, 0b10);
        let two = CollisionFilter::new(0b10, 0b01);
        let three = CollisionFilter::new(0b100, 0b100);

        let g1 = one.to_interaction_groups();
        assert!(g1.test(two.to_interaction_groups()));
        assert!(!g1.test(three.to_interaction_groups()));
    }

    #[test]
    fn test_default_filter_collides_with_everything() {
        let groups = CollisionFilter::default().to_interaction_groups();
        assert_eq!(groups.filter, Group::ALL);
        assert_eq!(groups.memberships, Group::GROUP_1);
    }

    #[test]
    fn test_for_body_orients_pairs() {
        let (a, b, c) = handles();
        let event = CollisionStart {
            pairs: vec![pair(a, b), pair(c, a), pair(b, c)],
        };

        let filtered = event.for_body(a).expect("a takes part");
        assert_eq!(filtered.pairs.len(), 2);
        assert!(filtered.pairs.iter().all(|p| p.body == a));
        assert_eq!(filtered.pairs[0].other_body, b);
        assert_eq!(filtered.pairs[0].other_label, "b");
        assert_eq!(filtered.pairs[1].other_body, c);
        assert_eq!(filtered.pairs[1].other_label, "a");
    }

    #[test]
    fn test_for_body_without_match() {
        let (a, b, c) = handles();
        let event = CollisionStart {
            pairs: vec![pair(a, b)],
        };
        assert!(event.for_body(c).is_none());
    }
}
