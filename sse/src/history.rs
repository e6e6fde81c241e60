use crate::filter::{self, EventFilter};
use crate::message::Message;
use axum::body::Bytes;
use std::collections::VecDeque;

/// Bounded record of the most recent data-bearing frames, oldest first.
#[derive(Debug)]
pub struct History {
    capacity: usize,
    messages: VecDeque<Message>,
}

impl History {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            messages: VecDeque::with_capacity(capacity.min(1024)),
        }
    }

    /// Append a message, evicting the oldest entries while over capacity.
    pub fn append(&mut self, message: Message) {
        self.messages.push_back(message);
        while self.messages.len() > self.capacity {
            self.messages.pop_front();
        }
    }

    /// The last `count` frames accepted by `filter`, in publish order.
    pub fn replay_window(&self, filter: Option<&EventFilter>, count: usize) -> Vec<Bytes> {
        if count == 0 {
            return Vec::new();
        }

        let mut window: Vec<Bytes> = self
            .messages
            .iter()
            .rev()
            .filter(|m| filter::accepts(filter, m.event.as_deref()))
            .take(count)
            .map(|m| m.frame.clone())
            .collect();
        window.reverse();
        window
    }

    pub fn clear(&mut self) {
        self.messages.clear();
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = u64> + '_ {
        self.messages.iter().map(|m| m.id)
    }
}
