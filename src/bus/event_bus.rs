//! The event bus: immediate dispatch plus a budgeted deferred queue.

use std::any::Any;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread;
use std::time::Duration;

use parking_lot::ReentrantMutex;
use tracing::{debug, info, warn};

use super::listener::Listener;
use super::queue::MessageQueue;
use super::registry::{Invocation, SubscriptionRegistry};
use super::subscription::Subscription;
use crate::clock::{Clock, MonotonicClock};
use crate::config::DrainConfig;
use crate::error::BusError;
use crate::message::{Envelope, Message, MessageType};

#[derive(Default)]
struct BusState {
    registry: SubscriptionRegistry,
    queue: MessageQueue,
}

/// Outcome of one [`EventBus::drain`] call.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DrainReport {
    /// Messages popped and dispatched by this drain.
    pub dispatched: usize,
    /// Messages still queued when the drain returned.
    pub remaining: usize,
    /// Whether the drain stopped on its time budget rather than an empty queue.
    pub budget_exhausted: bool,
    /// Accumulated dispatch time, measured only when a limit was given.
    pub spent: Duration,
}

/// Typed in-process publish/subscribe bus.
///
/// `EventBus` is a handle: clones share the same registry and queue, so the
/// bus can be handed to every component that publishes or listens. Separate
/// `EventBus::new()` calls produce unrelated buses.
///
/// All state sits behind a single mutex. Callbacks run with that mutex
/// released, so a callback may freely add or remove listeners, enqueue, or
/// dispatch on the same bus.
///
/// Dispatches and drains also hold a re-entrant delivery gate for their whole
/// run. Only one thread delivers at a time: a one-shot listener fires once
/// even when two threads dispatch to it, and concurrent drains hand out
/// queued messages in FIFO order. A callback that waits on another thread
/// which is itself dispatching on this bus will deadlock.
///
/// ## Example
///
/// ```
/// use std::sync::{Arc, Mutex};
/// use tickbus::{EventBus, Listener};
///
/// struct BoxClicked { id: u32 }
///
/// let bus = EventBus::new();
/// let clicked = Arc::new(Mutex::new(Vec::new()));
///
/// let sink = Arc::clone(&clicked);
/// let on_click = Listener::new(move |e: &BoxClicked| sink.lock().unwrap().push(e.id));
/// bus.add_listener(&on_click);
///
/// // Immediate
/// bus.dispatch(&BoxClicked { id: 1 });
///
/// // Deferred until the host's next tick
/// assert!(bus.enqueue(BoxClicked { id: 2 }));
/// bus.drain(None);
///
/// assert_eq!(*clicked.lock().unwrap(), vec![1, 2]);
/// ```
#[derive(Clone)]
pub struct EventBus {
    state: Arc<Mutex<BusState>>,
    delivery: Arc<ReentrantMutex<()>>,
    clock: Arc<dyn Clock>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventBus {
    /// Create a bus that measures drain budgets with a [`MonotonicClock`].
    pub fn new() -> Self {
        Self::with_clock(MonotonicClock::new())
    }

    /// Create a bus that measures drain budgets with the given clock.
    pub fn with_clock(clock: impl Clock + 'static) -> Self {
        Self {
            state: Arc::new(Mutex::new(BusState::default())),
            delivery: Arc::new(ReentrantMutex::new(())),
            clock: Arc::new(clock),
        }
    }

    // No lock is held while user callbacks run, so a poisoned lock still
    // guards consistent state.
    fn state(&self) -> MutexGuard<'_, BusState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // ------------------------------------------------------------------
    // Subscriptions
    // ------------------------------------------------------------------

    /// Subscribe `listener` to messages of type `T`.
    ///
    /// Adding a listener that is already registered does nothing.
    pub fn add_listener<T: Message>(&self, listener: &Listener<T>) {
        self.state().registry.add(listener);
    }

    /// Subscribe `listener` for a single delivery.
    ///
    /// The listener is removed right after the next dispatch that reaches it.
    /// Calling this on an already registered listener turns it into a
    /// one-shot listener.
    pub fn add_listener_once<T: Message>(&self, listener: &Listener<T>) {
        self.state().registry.add_once(listener);
    }

    /// Unsubscribe `listener`. Unknown listeners are ignored.
    pub fn remove_listener<T: Message>(&self, listener: &Listener<T>) {
        self.state().registry.remove(listener);
    }

    pub fn has_listener<T: Message>(&self, listener: &Listener<T>) -> bool {
        self.state().registry.contains(listener)
    }

    /// Whether any listener is registered for exactly `T`.
    pub fn has_subscribers<T: Message>(&self) -> bool {
        self.state().registry.has_subscribers(MessageType::of::<T>())
    }

    pub fn listener_count<T: Message>(&self) -> usize {
        self.state()
            .registry
            .subscriber_count(MessageType::of::<T>())
    }

    /// True when no listener of any type is registered.
    pub fn has_no_listeners(&self) -> bool {
        self.state().registry.is_empty()
    }

    /// Drop every subscription. Queued messages stay queued.
    pub fn remove_all_listeners(&self) {
        self.state().registry.clear();
    }

    /// Subscribe and get a guard that unsubscribes when dropped.
    pub fn subscribe<T: Message>(&self, listener: &Listener<T>) -> Subscription {
        self.add_listener(listener);
        Subscription::new(self.clone(), MessageType::of::<T>(), listener.id())
    }

    /// Like [`subscribe`](Self::subscribe), for a single delivery.
    pub fn subscribe_once<T: Message>(&self, listener: &Listener<T>) -> Subscription {
        self.add_listener_once(listener);
        Subscription::new(self.clone(), MessageType::of::<T>(), listener.id())
    }

    pub(crate) fn unsubscribe(&self, subscription: &Subscription) {
        self.state()
            .registry
            .remove_id(subscription.message_type(), subscription.listener_id());
    }

    // ------------------------------------------------------------------
    // Dispatch
    // ------------------------------------------------------------------

    /// Deliver `message` now to every listener of its exact type, in
    /// registration order, then evict the one-shot listeners that received it.
    ///
    /// Returns how many listeners were invoked. A message without listeners
    /// is logged and dropped.
    pub fn dispatch<T: Message>(&self, message: &T) -> usize {
        self.dispatch_erased(MessageType::of::<T>(), message)
    }

    fn dispatch_erased(&self, message_type: MessageType, message: &dyn Any) -> usize {
        let _delivering = self.delivery.lock();
        let snapshot = self.state().registry.snapshot(message_type);
        let Some(invocations) = snapshot else {
            warn!(message_type = %message_type, "message has no listeners");
            return 0;
        };

        let delivery = Delivery {
            bus: self,
            message_type,
            invocations,
        };
        for invocation in &delivery.invocations {
            invocation.call(message);
        }

        delivery.invocations.len()
    }

    // ------------------------------------------------------------------
    // Queue
    // ------------------------------------------------------------------

    /// Queue `message` for the next drain.
    ///
    /// Returns `false`, and queues nothing, when no listener is registered for
    /// the message type at this moment.
    pub fn enqueue<T: Message>(&self, message: T) -> bool {
        self.try_enqueue(message).is_ok()
    }

    /// [`enqueue`](Self::enqueue) with the rejection as an error.
    pub fn try_enqueue<T: Message>(&self, message: T) -> Result<(), BusError> {
        let message_type = MessageType::of::<T>();
        let mut state = self.state();

        if !state.registry.has_subscribers(message_type) {
            drop(state);
            warn!(message_type = %message_type, "enqueue rejected, message has no listeners");
            return Err(BusError::NoSubscribers {
                message_type: message_type.name(),
            });
        }

        state.queue.push(Envelope::new(message));
        Ok(())
    }

    /// Dispatch queued messages in FIFO order.
    ///
    /// Without a limit the queue is emptied, including anything callbacks
    /// enqueue along the way. With a limit, the time each dispatch takes is
    /// added up and the drain stops before the next message once the total
    /// exceeds the limit. A dispatch in progress is never cut short, so at
    /// least one message is handled per call. Whatever is left stays queued,
    /// in order, for the next drain.
    pub fn drain(&self, limit: Option<Duration>) -> DrainReport {
        let _delivering = self.delivery.lock();
        let mut report = DrainReport::default();
        let mut over_budget = false;

        loop {
            if let Some(limit) = limit {
                if report.spent > limit {
                    over_budget = true;
                    break;
                }
            }

            let next = self.state().queue.pop();
            let Some(envelope) = next else {
                break;
            };

            let started = limit.map(|_| self.clock.now());
            self.dispatch_erased(envelope.message_type(), envelope.payload());
            report.dispatched += 1;

            if let Some(started) = started {
                report.spent += self.clock.now().saturating_sub(started);
            }
        }

        report.remaining = self.queue_len();
        report.budget_exhausted = over_budget && report.remaining > 0;
        if report.budget_exhausted {
            debug!(
                dispatched = report.dispatched,
                remaining = report.remaining,
                spent = ?report.spent,
                "drain budget exhausted, deferring remaining messages"
            );
        } else if report.dispatched > 0 {
            debug!(dispatched = report.dispatched, "drain completed");
        }

        report
    }

    /// Drain using the limit described by `config`.
    pub fn drain_with(&self, config: &DrainConfig) -> DrainReport {
        self.drain(config.limit())
    }

    pub fn queue_len(&self) -> usize {
        self.state().queue.len()
    }

    pub fn is_queue_empty(&self) -> bool {
        self.state().queue.is_empty()
    }

    /// Types of the queued messages, head first.
    pub fn queued_types(&self) -> Vec<MessageType> {
        self.state().queue.message_types()
    }

    /// Discard every pending message and every subscription.
    pub fn clear(&self) {
        let mut state = self.state();
        let dropped = state.queue.len();
        state.queue.clear();
        state.registry.clear();
        drop(state);

        info!(dropped_messages = dropped, "event bus cleared");
    }
}

/// Ends a dispatch: evicts the one-shot listeners it delivered to, or, when a
/// callback panicked, hands their claims back so a later dispatch reaches them.
struct Delivery<'a> {
    bus: &'a EventBus,
    message_type: MessageType,
    invocations: Vec<Invocation>,
}

impl Drop for Delivery<'_> {
    fn drop(&mut self) {
        let mut state = self.bus.state();
        if thread::panicking() {
            state
                .registry
                .release_claims(self.message_type, &self.invocations);
        } else {
            state
                .registry
                .evict_fired(self.message_type, &self.invocations);
        }
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state();
        f.debug_struct("EventBus")
            .field("listeners", &state.registry.len())
            .field("queued", &state.queue.len())
            .finish()
    }
}
