/// Game loop scheduling and timing
///
/// The loop owns an ordered list of per-tick callbacks. The platform drives
/// it once per display refresh by calling [`GameLoop::tick`]; each tick runs
/// every live subscriber to completion, in slot order, on the calling thread.
///
/// Subscribers run from a snapshot taken when the tick starts, so a callback
/// may subscribe or unsubscribe (itself or others) freely: the change shows
/// up on the next tick.
use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;
use std::time::{Duration, Instant};

use crate::core::{SubscriptionId, Subscribers};

/// Nominal display refresh rate the simulation is tuned for
pub const TICKS_PER_SECOND: f32 = 60.0;

/// FPS tracking window (average over last N frames)
const FPS_WINDOW_SIZE: usize = 60;

type Callback = Rc<RefCell<dyn FnMut()>>;

struct LoopState {
    subscribers: Subscribers<Callback>,

    /// Cleared by `stop`; a stopped loop never ticks again
    running: bool,

    /// Whether the game is paused
    paused: bool,

    /// Time of last tick
    last_tick: Option<Instant>,

    /// Frame timing history for FPS calculation
    frame_times: VecDeque<Duration>,

    /// Ticks run so far
    frame_count: u64,

    /// Current FPS (updated periodically)
    current_fps: f32,
}

/// Owner of the per-tick scheduler
///
/// Dropping it stops the loop. Components receive a [`LoopHandle`] instead.
pub struct GameLoop {
    state: Rc<RefCell<LoopState>>,
}

/// Cloneable subscription handle onto a [`GameLoop`]
#[derive(Clone)]
pub struct LoopHandle {
    state: Rc<RefCell<LoopState>>,
}

impl GameLoop {
    /// Create a new, running game loop with no subscribers
    pub fn new() -> Self {
        Self {
            state: Rc::new(RefCell::new(LoopState {
                subscribers: Subscribers::new(),
                running: true,
                paused: false,
                last_tick: None,
                frame_times: VecDeque::with_capacity(FPS_WINDOW_SIZE),
                frame_count: 0,
                current_fps: 0.0,
            })),
        }
    }

    /// Handle passed to the components that subscribe to this loop
    pub fn handle(&self) -> LoopHandle {
        LoopHandle {
            state: Rc::clone(&self.state),
        }
    }

    /// Run one iteration
    ///
    /// Returns whether another tick should be scheduled.
    pub fn tick(&self) -> bool {
        let callbacks = {
            let mut state = self.state.borrow_mut();
            if !state.running {
                return false;
            }
            state.record_frame(Instant::now());
            if state.paused {
                return true;
            }
            state.subscribers.snapshot()
        };

        log::trace!("tick: {} subscribers", callbacks.len());
        for callback in callbacks {
            (callback.borrow_mut())();
        }

        self.state.borrow().running
    }

    /// Cancel the next tick; a tick already in progress still completes
    pub fn stop(&self) {
        let mut state = self.state.borrow_mut();
        if state.running {
            state.running = false;
            log::info!("Game loop stopped after {} frames", state.frame_count);
        }
    }

    pub fn is_running(&self) -> bool {
        self.state.borrow().running
    }

    /// Check if game is paused
    pub fn is_paused(&self) -> bool {
        self.state.borrow().paused
    }

    /// Pause the game
    pub fn pause(&self) {
        let mut state = self.state.borrow_mut();
        if !state.paused {
            state.paused = true;
            log::info!("Game paused");
        }
    }

    /// Resume the game
    pub fn resume(&self) {
        let mut state = self.state.borrow_mut();
        if state.paused {
            state.paused = false;
            log::info!("Game resumed");
        }
    }

    /// Toggle pause state
    pub fn toggle_pause(&self) {
        if self.is_paused() {
            self.resume();
        } else {
            self.pause();
        }
    }

    /// Get total number of ticks run
    pub fn frame_count(&self) -> u64 {
        self.state.borrow().frame_count
    }

    /// Get current FPS
    pub fn fps(&self) -> f32 {
        self.state.borrow().current_fps
    }

    /// Number of live subscribers
    #[cfg(test)]
    pub fn subscriber_count(&self) -> usize {
        self.state.borrow().subscribers.len()
    }
}

impl Default for GameLoop {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for GameLoop {
    fn drop(&mut self) {
        // Callbacks are dropped after the borrow ends: their captures may
        // unsubscribe from this loop when they go away.
        let subscribers = match self.state.try_borrow_mut() {
            Ok(mut state) => {
                state.running = false;
                std::mem::take(&mut state.subscribers)
            }
            Err(_) => return,
        };
        drop(subscribers);
    }
}

impl LoopHandle {
    /// Register a callback run once per tick, after every callback already
    /// registered in a lower slot
    pub fn subscribe<F>(&self, callback: F) -> SubscriptionId
    where
        F: FnMut() + 'static,
    {
        let callback: Callback = Rc::new(RefCell::new(callback));
        self.state.borrow_mut().subscribers.subscribe(callback)
    }

    /// Remove a callback; stale tokens are ignored
    pub fn unsubscribe(&self, id: SubscriptionId) {
        self.state.borrow_mut().subscribers.unsubscribe(id);
    }

    #[cfg(test)]
    pub fn is_subscribed(&self, id: SubscriptionId) -> bool {
        self.state.borrow().subscribers.contains(id)
    }
}

impl LoopState {
    fn record_frame(&mut self, now: Instant) {
        self.frame_count += 1;

        if let Some(last) = self.last_tick.replace(now) {
            // Store frame time for FPS calculation
            self.frame_times.push_back(now.duration_since(last));
            if self.frame_times.len() > FPS_WINDOW_SIZE {
                self.frame_times.pop_front();
            }
        }

        // Update FPS counter every 10 frames
        if self.frame_count % 10 == 0 {
            self.update_fps();
        }
    }

    /// Update FPS calculation
    fn update_fps(&mut self) {
        if self.frame_times.is_empty() {
            self.current_fps = 0.0;
            return;
        }

        // Calculate average frame time
        let total: Duration = self.frame_times.iter().sum();
        let avg_frame_time = total / self.frame_times.len() as u32;

        // Convert to FPS
        self.current_fps = if avg_frame_time.as_secs_f32() > 0.0 {
            1.0 / avg_frame_time.as_secs_f32()
        } else {
            0.0
        };
    }
}
