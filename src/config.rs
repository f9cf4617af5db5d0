//! Drain budget configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::BusError;

/// How much time a single drain may spend dispatching queued messages.
///
/// With `limit_enabled: false` a drain empties the queue. With
/// `limit_enabled: true` it stops once the accumulated dispatch time exceeds
/// `budget_ms`, and the rest waits for the next drain.
///
/// ```
/// use std::time::Duration;
/// use tickbus::DrainConfig;
///
/// let config = DrainConfig::from_json(r#"{"limit_enabled": true, "budget_ms": 4}"#).unwrap();
/// assert_eq!(config.limit(), Some(Duration::from_millis(4)));
///
/// assert_eq!(DrainConfig::default().limit(), None);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DrainConfig {
    pub limit_enabled: bool,
    pub budget_ms: u64,
}

impl DrainConfig {
    /// Drain everything on every call.
    pub fn unbounded() -> Self {
        Self::default()
    }

    /// Stop draining once `budget` of dispatch time has been spent.
    pub fn limited(budget: Duration) -> Self {
        Self {
            limit_enabled: true,
            budget_ms: u64::try_from(budget.as_millis()).unwrap_or(u64::MAX),
        }
    }

    /// The budget to pass to a drain, `None` when unlimited.
    pub fn limit(&self) -> Option<Duration> {
        self.limit_enabled
            .then(|| Duration::from_millis(self.budget_ms))
    }

    pub fn from_json(json: &str) -> Result<Self, BusError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String, BusError> {
        Ok(serde_json::to_string(self)?)
    }
}
