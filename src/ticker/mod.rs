//! Host tick wiring.
//!
//! The bus never drains on its own. A host either calls
//! [`TickDriver::tick`] from its frame or poll loop, or lets a
//! [`TickerThread`] do it on a fixed interval.

mod driver;
#[cfg(feature = "thread")]
mod thread;

pub use driver::{TickDriver, TickStats};
#[cfg(feature = "thread")]
pub use thread::TickerThread;
