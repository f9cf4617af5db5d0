//! Scoped subscriptions.

use std::fmt;

use super::event_bus::EventBus;
use super::listener::ListenerId;
use crate::message::MessageType;

/// Keeps a listener subscribed for as long as it is alive.
///
/// Returned by [`EventBus::subscribe`]. Dropping the guard removes the
/// listener, which ties a subscription to the lifetime of whatever component
/// owns the guard. Use [`detach`](Self::detach) to keep the listener
/// registered past the guard.
///
/// ```
/// use tickbus::{EventBus, Listener};
///
/// struct Tick;
///
/// let bus = EventBus::new();
/// let on_tick = Listener::new(|_: &Tick| {});
///
/// {
///     let _subscription = bus.subscribe(&on_tick);
///     assert!(bus.has_listener(&on_tick));
/// }
/// assert!(!bus.has_listener(&on_tick));
/// ```
#[must_use = "dropping a Subscription immediately unsubscribes the listener"]
pub struct Subscription {
    bus: Option<EventBus>,
    message_type: MessageType,
    listener_id: ListenerId,
}

impl Subscription {
    pub(crate) fn new(bus: EventBus, message_type: MessageType, listener_id: ListenerId) -> Self {
        Self {
            bus: Some(bus),
            message_type,
            listener_id,
        }
    }

    pub fn message_type(&self) -> MessageType {
        self.message_type
    }

    pub fn listener_id(&self) -> ListenerId {
        self.listener_id
    }

    /// Unsubscribe now.
    pub fn cancel(mut self) {
        self.release();
    }

    /// Drop the guard but leave the listener registered.
    pub fn detach(mut self) {
        self.bus = None;
    }

    fn release(&mut self) {
        if let Some(bus) = self.bus.take() {
            bus.unsubscribe(self);
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.release();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("message_type", &self.message_type)
            .field("listener_id", &self.listener_id)
            .field("attached", &self.bus.is_some())
            .finish()
    }
}
