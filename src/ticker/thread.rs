//! Background tick loop for hosts without a frame loop of their own.

use std::sync::mpsc::{channel, Sender, TryRecvError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::info;

use super::driver::{TickDriver, TickStats};
use crate::bus::EventBus;
use crate::config::DrainConfig;

/// A background thread that drains an [`EventBus`] at a fixed interval.
///
/// Queued messages are delivered on the ticker thread. Listeners must be
/// ready for that; the bus itself is already safe to share.
///
/// ## Example
///
/// ```
/// use tickbus::{DrainConfig, EventBus, TickerThread};
/// use std::time::Duration;
///
/// let bus = EventBus::new();
///
/// let ticker = TickerThread::spawn(
///     bus.clone(),
///     DrainConfig::limited(Duration::from_millis(4)),
///     Duration::from_millis(16),
/// );
///
/// // ... enqueue from anywhere ...
///
/// let stats = ticker.stop();
/// println!("Dispatched {} messages", stats.messages_dispatched);
/// ```
pub struct TickerThread {
    stop_tx: Sender<()>,
    handle: Option<JoinHandle<TickStats>>,
}

impl TickerThread {
    /// Spawn a ticker that drains `bus` every `interval`.
    pub fn spawn(bus: EventBus, config: DrainConfig, interval: Duration) -> Self {
        Self::spawn_with_id(bus, config, interval, "ticker")
    }

    /// Spawn a ticker with a custom id, used to tell tickers apart in logs.
    pub fn spawn_with_id(
        bus: EventBus,
        config: DrainConfig,
        interval: Duration,
        ticker_id: &str,
    ) -> Self {
        let (stop_tx, stop_rx) = channel();
        let ticker_id = ticker_id.to_string();

        let handle = thread::spawn(move || {
            let mut driver = TickDriver::new(bus, config);
            info!(ticker = %ticker_id, ?interval, "ticker started");

            loop {
                // Check for stop signal
                match stop_rx.try_recv() {
                    Ok(()) | Err(TryRecvError::Disconnected) => break,
                    Err(TryRecvError::Empty) => {}
                }

                driver.tick();
                thread::sleep(interval);
            }

            let stats = driver.stats();
            info!(
                ticker = %ticker_id,
                ticks = stats.ticks,
                messages_dispatched = stats.messages_dispatched,
                "ticker stopped"
            );
            stats
        });

        Self {
            stop_tx,
            handle: Some(handle),
        }
    }

    /// Whether the ticker thread is still running.
    pub fn is_running(&self) -> bool {
        self.handle
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Stop the ticker and wait for it to finish.
    ///
    /// Returns the stats gathered by the thread. Messages still queued stay on
    /// the bus.
    pub fn stop(mut self) -> TickStats {
        self.shutdown()
    }

    fn shutdown(&mut self) -> TickStats {
        let _ = self.stop_tx.send(());
        match self.handle.take() {
            Some(handle) => handle.join().unwrap_or_default(),
            None => TickStats::default(),
        }
    }
}

impl Drop for TickerThread {
    fn drop(&mut self) {
        if self.handle.is_some() {
            self.shutdown();
        }
    }
}
