// Core utilities shared by the engine and the game

pub mod clock;
pub mod math;
pub mod subscription;

pub use clock::{Clock, SystemClock};
#[cfg(test)]
pub use clock::ManualClock;
pub use subscription::{SubscriptionId, Subscribers};
