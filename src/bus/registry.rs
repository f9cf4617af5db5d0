//! Subscription registry: who listens to which message type.

use std::any::Any;
use std::collections::{HashMap, HashSet};

use tracing::trace;

use super::listener::{ErasedCallback, Listener, ListenerId};
use crate::message::{Message, MessageType};

/// One registration of a listener against a message type.
#[derive(Clone)]
struct Subscriber {
    id: ListenerId,
    /// Fresh for every successful registration; lets the eviction pass tell a
    /// re-registration apart from the registration it invoked.
    seq: u64,
    invoke: ErasedCallback,
}

/// A subscriber as captured at the start of a dispatch.
#[derive(Clone)]
pub(crate) struct Invocation {
    id: ListenerId,
    seq: u64,
    once: bool,
    invoke: ErasedCallback,
}

impl Invocation {
    pub(crate) fn call(&self, message: &dyn Any) {
        (self.invoke)(message)
    }
}

/// Maps message types to an ordered list of listeners.
///
/// Four structures are kept in step:
/// - `listeners`: per-type subscribers in registration order (delivery order)
/// - `known`: every registered listener id, for duplicate detection
/// - `once`: listeners to evict after their next delivery
/// - `claimed`: one-shot listeners already captured by a dispatch in
///   progress; later snapshots skip them until they are evicted
///
/// A type entry never stays in `listeners` with an empty list.
#[derive(Default)]
pub struct SubscriptionRegistry {
    listeners: HashMap<MessageType, Vec<Subscriber>>,
    known: HashSet<ListenerId>,
    once: HashSet<ListenerId>,
    claimed: HashSet<ListenerId>,
    next_seq: u64,
}

impl SubscriptionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `listener` for `T`. Returns `false` if it was already registered.
    pub fn add<T: Message>(&mut self, listener: &Listener<T>) -> bool {
        let id = listener.id();
        if self.known.contains(&id) {
            return false;
        }

        let message_type = MessageType::of::<T>();
        self.next_seq += 1;
        self.listeners
            .entry(message_type)
            .or_default()
            .push(Subscriber {
                id,
                seq: self.next_seq,
                invoke: listener.erase(),
            });
        self.known.insert(id);

        trace!(listener = %id, message_type = %message_type, "listener added");
        true
    }

    /// Register `listener` for `T` and mark it one-shot.
    ///
    /// If the listener is already registered the existing subscription keeps
    /// its position and is marked one-shot from now on.
    pub fn add_once<T: Message>(&mut self, listener: &Listener<T>) -> bool {
        let added = self.add(listener);
        self.once.insert(listener.id());
        added
    }

    /// Remove `listener` from `T`. Returns `false` if it was not registered.
    pub fn remove<T: Message>(&mut self, listener: &Listener<T>) -> bool {
        self.remove_id(MessageType::of::<T>(), listener.id())
    }

    pub(crate) fn remove_id(&mut self, message_type: MessageType, id: ListenerId) -> bool {
        let removed = self.known.remove(&id);
        self.once.remove(&id);
        self.claimed.remove(&id);

        if let Some(subscribers) = self.listeners.get_mut(&message_type) {
            subscribers.retain(|subscriber| subscriber.id != id);
            if subscribers.is_empty() {
                self.listeners.remove(&message_type);
            }
        }

        if removed {
            trace!(listener = %id, message_type = %message_type, "listener removed");
        }
        removed
    }

    pub fn contains<T: Message>(&self, listener: &Listener<T>) -> bool {
        self.listeners
            .get(&MessageType::of::<T>())
            .is_some_and(|subscribers| subscribers.iter().any(|s| s.id == listener.id()))
    }

    pub fn is_once<T: Message>(&self, listener: &Listener<T>) -> bool {
        self.once.contains(&listener.id())
    }

    /// Whether anything at all is registered.
    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
            && self.known.is_empty()
            && self.once.is_empty()
            && self.claimed.is_empty()
    }

    pub fn has_subscribers(&self, message_type: MessageType) -> bool {
        self.listeners.contains_key(&message_type)
    }

    pub fn subscriber_count(&self, message_type: MessageType) -> usize {
        self.listeners.get(&message_type).map_or(0, Vec::len)
    }

    /// Number of distinct listeners across all message types.
    pub fn len(&self) -> usize {
        self.known.len()
    }

    pub fn clear(&mut self) {
        self.listeners.clear();
        self.known.clear();
        self.once.clear();
        self.claimed.clear();
    }

    /// Capture the current subscribers of a type, in delivery order, with their
    /// one-shot flag as of now. `None` when the type has no subscribers.
    ///
    /// One-shot subscribers are claimed by the snapshot that captures them: a
    /// nested dispatch started before the eviction pass does not deliver to
    /// them again.
    pub(crate) fn snapshot(&mut self, message_type: MessageType) -> Option<Vec<Invocation>> {
        let subscribers = self.listeners.get(&message_type)?;
        let mut invocations = Vec::with_capacity(subscribers.len());

        for subscriber in subscribers {
            if self.claimed.contains(&subscriber.id) {
                continue;
            }
            let once = self.once.contains(&subscriber.id);
            if once {
                self.claimed.insert(subscriber.id);
            }
            invocations.push(Invocation {
                id: subscriber.id,
                seq: subscriber.seq,
                once,
                invoke: subscriber.invoke.clone(),
            });
        }

        Some(invocations)
    }

    /// Evict the one-shot subscribers of a finished dispatch.
    ///
    /// Only registrations that were one-shot in the snapshot and are still the
    /// same registration now are removed. Anything removed or re-registered
    /// by a callback in the meantime is left as it is.
    pub(crate) fn evict_fired(&mut self, message_type: MessageType, invoked: &[Invocation]) -> usize {
        let mut evicted = 0;

        for invocation in invoked.iter().filter(|invocation| invocation.once) {
            let still_registered = self
                .listeners
                .get(&message_type)
                .and_then(|subscribers| subscribers.iter().find(|s| s.id == invocation.id))
                .is_some_and(|subscriber| subscriber.seq == invocation.seq);

            if still_registered && self.remove_id(message_type, invocation.id) {
                evicted += 1;
            }
        }

        evicted
    }

    /// Undo the claims of a dispatch that did not finish, keeping its one-shot
    /// subscribers registered.
    pub(crate) fn release_claims(&mut self, message_type: MessageType, invoked: &[Invocation]) {
        for invocation in invoked.iter().filter(|invocation| invocation.once) {
            let same_registration = self
                .listeners
                .get(&message_type)
                .and_then(|subscribers| subscribers.iter().find(|s| s.id == invocation.id))
                .is_some_and(|subscriber| subscriber.seq == invocation.seq);

            if same_registration {
                self.claimed.remove(&invocation.id);
            }
        }
    }
}
