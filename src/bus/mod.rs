//! Event bus - typed publish/subscribe with a deferred queue.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                 EventBus (cloneable handle)                  │
//! │  dispatch() / enqueue() / drain() / clear()                  │
//! └─────────────────────────────────────────────────────────────┘
//!                │                              │
//!                ▼                              ▼
//! ┌───────────────────────────────┐  ┌──────────────────────────┐
//! │     SubscriptionRegistry      │  │       MessageQueue       │
//! │  type → [listener, ...]       │  │  FIFO of type-erased     │
//! │  known ids / one-shot marks   │  │  envelopes               │
//! └───────────────────────────────┘  └──────────────────────────┘
//! ```
//!
//! ## Delivery modes
//!
//! - **Immediate**: [`EventBus::dispatch`] calls every listener of the
//!   message's exact type on the calling thread before returning.
//! - **Deferred**: [`EventBus::enqueue`] stores the message; the host calls
//!   [`EventBus::drain`] once per tick, optionally with a time budget.
//! - **Once**: [`EventBus::add_listener_once`] listeners are evicted right
//!   after the dispatch that reached them.
//!
//! Dispatch works from a snapshot of the listener list taken before the first
//! callback runs. Changes made by callbacks apply to later messages, never to
//! the one being delivered.

mod event_bus;
mod listener;
mod queue;
mod registry;
mod subscription;

pub use event_bus::{DrainReport, EventBus};
pub use listener::{Listener, ListenerId};
pub use registry::SubscriptionRegistry;
pub use subscription::Subscription;
