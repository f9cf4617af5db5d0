//! Listener handles with stable identity.

use std::any::Any;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::message::{Message, MessageType};

static NEXT_LISTENER_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of a [`Listener`]. Shared by all clones of the same handle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

impl ListenerId {
    fn next() -> Self {
        ListenerId(NEXT_LISTENER_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for ListenerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "listener-{}", self.0)
    }
}

/// Type-erased callback as stored in the registry.
pub(crate) type ErasedCallback = Arc<dyn Fn(&dyn Any) + Send + Sync>;

/// A callback for messages of type `T`.
///
/// Closures have no usable identity in Rust, so the bus keys subscriptions on
/// the handle instead. Keep the handle (or a clone of it) around to remove or
/// query the subscription later.
///
/// ## Example
///
/// ```
/// use tickbus::{EventBus, Listener};
///
/// struct Ping;
///
/// let bus = EventBus::new();
/// let on_ping = Listener::new(|_: &Ping| println!("ping"));
///
/// bus.add_listener(&on_ping);
/// bus.add_listener(&on_ping); // no-op, already registered
/// assert_eq!(bus.listener_count::<Ping>(), 1);
///
/// bus.remove_listener(&on_ping);
/// assert!(!bus.has_listener(&on_ping));
/// ```
pub struct Listener<T> {
    id: ListenerId,
    callback: Arc<dyn Fn(&T) + Send + Sync>,
}

impl<T: Message> Listener<T> {
    /// Wrap a callback. Every call produces a new identity, even for the same closure.
    pub fn new<F>(callback: F) -> Self
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        Self {
            id: ListenerId::next(),
            callback: Arc::new(callback),
        }
    }

    pub fn id(&self) -> ListenerId {
        self.id
    }

    pub fn message_type(&self) -> MessageType {
        MessageType::of::<T>()
    }

    /// Invoke the callback directly, bypassing any bus.
    pub fn call(&self, message: &T) {
        (self.callback)(message)
    }

    /// Non-generic wrapper that downcasts before calling through.
    pub(crate) fn erase(&self) -> ErasedCallback {
        let callback = Arc::clone(&self.callback);
        Arc::new(move |message: &dyn Any| {
            if let Some(message) = message.downcast_ref::<T>() {
                callback(message);
            }
        })
    }
}

impl<T> Clone for Listener<T> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            callback: Arc::clone(&self.callback),
        }
    }
}

impl<T> PartialEq for Listener<T> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl<T> Eq for Listener<T> {}

impl<T> fmt::Debug for Listener<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Listener")
            .field("id", &self.id)
            .field("message_type", &std::any::type_name::<T>())
            .finish()
    }
}
