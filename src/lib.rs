//! Typed in-process event bus.
//!
//! Publishers send messages without knowing who receives them; listeners
//! subscribe to one exact message type without knowing who sends it. Messages
//! are delivered immediately with [`EventBus::dispatch`], or queued with
//! [`EventBus::enqueue`] and delivered when the host drains the bus on its
//! next tick, optionally under a time budget.

pub mod bus;
mod clock;
mod config;
mod error;
mod message;
pub mod ticker;

pub use bus::{DrainReport, EventBus, Listener, ListenerId, Subscription, SubscriptionRegistry};
pub use clock::{Clock, ManualClock, MonotonicClock};
pub use config::DrainConfig;
pub use error::BusError;
pub use message::{Message, MessageType};
pub use ticker::{TickDriver, TickStats};
#[cfg(feature = "thread")]
pub use ticker::TickerThread;
