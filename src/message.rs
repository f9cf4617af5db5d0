//! Messages and their dispatch key.

use std::any::{Any, TypeId};
use std::fmt;
use std::hash::{Hash, Hasher};

/// Marker for values that can travel on an [`EventBus`](crate::EventBus).
///
/// Any owned `Send` type qualifies. The concrete Rust type is the routing key:
/// a listener registered for `Ping` only ever sees `Ping`, never a wrapper or
/// a type that happens to contain one.
pub trait Message: Any + Send {}

impl<T: Any + Send> Message for T {}

/// Exact runtime type of a message, used as the registry key.
///
/// Equality and hashing use the `TypeId` only. The name is kept for
/// diagnostics.
#[derive(Clone, Copy)]
pub struct MessageType {
    id: TypeId,
    name: &'static str,
}

impl MessageType {
    /// Key for message type `T`.
    pub fn of<T: Message>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }

    pub fn id(&self) -> TypeId {
        self.id
    }

    /// Fully qualified type name, e.g. `my_game::events::BoxClicked`.
    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl PartialEq for MessageType {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for MessageType {}

impl Hash for MessageType {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("MessageType").field(&self.name).finish()
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// A queued message with its type erased.
pub(crate) struct Envelope {
    message_type: MessageType,
    payload: Box<dyn Any + Send>,
}

impl Envelope {
    pub(crate) fn new<T: Message>(message: T) -> Self {
        Self {
            message_type: MessageType::of::<T>(),
            payload: Box::new(message),
        }
    }

    pub(crate) fn message_type(&self) -> MessageType {
        self.message_type
    }

    pub(crate) fn payload(&self) -> &dyn Any {
        &*self.payload
    }
}

impl fmt::Debug for Envelope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Envelope")
            .field("message_type", &self.message_type)
            .finish_non_exhaustive()
    }
}
