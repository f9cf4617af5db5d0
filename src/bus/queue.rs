//! FIFO backlog of messages awaiting deferred dispatch.

use std::collections::VecDeque;

use crate::message::{Envelope, MessageType};

/// Pending messages in arrival order.
///
/// No deduplication, no reordering, no capacity bound.
#[derive(Debug, Default)]
pub(crate) struct MessageQueue {
    pending: VecDeque<Envelope>,
}

impl MessageQueue {
    pub(crate) fn push(&mut self, envelope: Envelope) {
        self.pending.push_back(envelope);
    }

    pub(crate) fn pop(&mut self) -> Option<Envelope> {
        self.pending.pop_front()
    }

    pub(crate) fn len(&self) -> usize {
        self.pending.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub(crate) fn clear(&mut self) {
        self.pending.clear();
    }

    /// Types of the pending messages, head first.
    pub(crate) fn message_types(&self) -> Vec<MessageType> {
        self.pending.iter().map(Envelope::message_type).collect()
    }
}
