use tracing::info;

use crate::bus::{DrainReport, EventBus};
use crate::config::DrainConfig;

/// Counters accumulated across ticks.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TickStats {
    pub ticks: usize,
    pub messages_dispatched: usize,
    /// Ticks that stopped on the drain budget with messages left over.
    pub budget_exhausted_ticks: usize,
}

/// Host-side glue: drains the bus once per tick under a [`DrainConfig`].
///
/// Call [`tick`](Self::tick) from the frame or poll loop and
/// [`shutdown`](Self::shutdown) when the host exits.
///
/// ```
/// use std::time::Duration;
/// use tickbus::{DrainConfig, EventBus, Listener, TickDriver};
///
/// struct Spawned;
///
/// let bus = EventBus::new();
/// bus.add_listener(&Listener::new(|_: &Spawned| {}));
/// bus.enqueue(Spawned);
///
/// let mut driver = TickDriver::new(bus.clone(), DrainConfig::limited(Duration::from_millis(4)));
/// driver.tick();
/// assert!(bus.is_queue_empty());
///
/// let stats = driver.shutdown();
/// assert_eq!(stats.messages_dispatched, 1);
/// ```
#[derive(Debug)]
pub struct TickDriver {
    bus: EventBus,
    config: DrainConfig,
    stats: TickStats,
}

impl TickDriver {
    pub fn new(bus: EventBus, config: DrainConfig) -> Self {
        Self {
            bus,
            config,
            stats: TickStats::default(),
        }
    }

    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    pub fn config(&self) -> DrainConfig {
        self.config
    }

    /// Replace the drain config; takes effect on the next tick.
    pub fn set_config(&mut self, config: DrainConfig) {
        self.config = config;
    }

    pub fn stats(&self) -> TickStats {
        self.stats
    }

    /// Drain the bus once.
    pub fn tick(&mut self) -> DrainReport {
        let report = self.bus.drain_with(&self.config);

        self.stats.ticks += 1;
        self.stats.messages_dispatched += report.dispatched;
        if report.budget_exhausted {
            self.stats.budget_exhausted_ticks += 1;
        }

        report
    }

    /// Clear the bus and return the accumulated stats.
    pub fn shutdown(self) -> TickStats {
        self.bus.clear();
        info!(
            ticks = self.stats.ticks,
            messages_dispatched = self.stats.messages_dispatched,
            "tick driver shut down"
        );
        self.stats
    }
}
