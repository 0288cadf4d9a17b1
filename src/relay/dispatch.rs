//! Outbound deliveries produced by the relay handler

use crate::protocol::ServerMessage;
use crate::registry::ConnectionId;

/// One message addressed to one connection
#[derive(Debug, Clone, PartialEq)]
pub struct Delivery {
    pub to: ConnectionId,
    pub message: ServerMessage,
}

/// Every message an event produced, in send order
#[derive(Debug, Default)]
pub struct Dispatch {
    deliveries: Vec<Delivery>,
}

impl Dispatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// A dispatch with a single reply
    pub fn reply(to: ConnectionId, message: ServerMessage) -> Self {
        let mut dispatch = Self::new();
        dispatch.push(to, message);
        dispatch
    }

    /// Queue a message for one connection
    pub fn push(&mut self, to: ConnectionId, message: ServerMessage) {
        self.deliveries.push(Delivery { to, message });
    }

    /// Queue the same message for several connections
    ///
    /// Cloning a frame message only bumps the payload's reference count.
    pub fn fan_out<I>(&mut self, targets: I, message: ServerMessage)
    where
        I: IntoIterator<Item = ConnectionId>,
    {
        for to in targets {
            self.deliveries.push(Delivery {
                to,
                message: message.clone(),
            });
        }
    }

    pub fn len(&self) -> usize {
        self.deliveries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.deliveries.is_empty()
    }

    /// Messages addressed to one connection
    pub fn messages_for(&self, to: ConnectionId) -> Vec<&ServerMessage> {
        self.deliveries
            .iter()
            .filter(|d| d.to == to)
            .map(|d| &d.message)
            .collect()
    }

    /// Sorted recipients of every message with the given event name
    pub fn recipients_of(&self, event: &str) -> Vec<ConnectionId> {
        let mut recipients: Vec<_> = self
            .deliveries
            .iter()
            .filter(|d| d.message.event_name() == event)
            .map(|d| d.to)
            .collect();
        recipients.sort();
        recipients
    }
}

impl IntoIterator for Dispatch {
    type Item = Delivery;
    type IntoIter = std::vec::IntoIter<Delivery>;

    fn into_iter(self) -> Self::IntoIter {
        self.deliveries.into_iter()
    }
}
