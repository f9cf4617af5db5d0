use thiserror::Error;

/// Errors surfaced by the bus.
///
/// Nothing in dispatch is fatal: a message nobody listens to is logged and
/// dropped. These variants exist for callers that want the rejection as a
/// value they can propagate with `?`.
#[derive(Debug, Error)]
pub enum BusError {
    #[error("no listeners registered for message type {message_type}")]
    NoSubscribers { message_type: &'static str },

    #[error("invalid drain config: {0}")]
    Config(#[from] serde_json::Error),
}
