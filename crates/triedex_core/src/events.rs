//! Lifecycle event hub.
//!
//! The indexer emits typed lifecycle signals to any number of subscribers.
//! Subscribers receive events over plain mpsc channels; receivers that have
//! been dropped are pruned on the next emit.

use crate::state::ProgressState;
use crate::transform::Message;
use parking_lot::RwLock;
use std::sync::mpsc::{self, Receiver, Sender};

/// A lifecycle signal emitted by the indexer.
#[derive(Debug, Clone, PartialEq)]
pub enum IndexEvent<V> {
    /// A pass started from the given persisted state.
    Start(ProgressState),
    /// A new progress state was persisted.
    State(ProgressState),
    /// A batch completed and its checkpoint persisted.
    Indexed {
        /// The messages that were delivered to the mapping function.
        batch: Vec<Message<V>>,
        /// True if the trie had no further changes when the batch landed.
        caught_up: bool,
    },
    /// The current pass completed with the indexer caught up.
    Ready,
    /// The indexer was paused.
    Paused,
    /// The indexer was resumed.
    Resumed,
    /// A run aborted; the message is the error's display form.
    Error(String),
}

/// Distributes lifecycle events to subscribers.
///
/// Events are emitted in order and cloned per active subscriber.
pub(crate) struct EventHub<V> {
    subscribers: RwLock<Vec<Sender<IndexEvent<V>>>>,
}

impl<V: Clone> EventHub<V> {
    pub(crate) fn new() -> Self {
        Self {
            subscribers: RwLock::new(Vec::new()),
        }
    }

    /// Subscribes to all future events.
    pub(crate) fn subscribe(&self) -> Receiver<IndexEvent<V>> {
        let (tx, rx) = mpsc::channel();
        self.subscribers.write().push(tx);
        rx
    }

    /// Emits an event to all subscribers, pruning disconnected ones.
    pub(crate) fn emit(&self, event: IndexEvent<V>) {
        let mut subscribers = self.subscribers.write();
        subscribers.retain(|tx| tx.send(event.clone()).is_ok());
    }

    #[cfg(test)]
    pub(crate) fn subscriber_count(&self) -> usize {
        self.subscribers.read().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn emit_and_receive_in_order() {
        let hub: EventHub<Vec<u8>> = EventHub::new();
        let rx = hub.subscribe();

        hub.emit(IndexEvent::Start(ProgressState::default()));
        hub.emit(IndexEvent::Ready);

        assert_eq!(
            rx.recv().unwrap(),
            IndexEvent::Start(ProgressState::default())
        );
        assert_eq!(rx.recv().unwrap(), IndexEvent::Ready);
    }

    #[test]
    fn multiple_subscribers_each_receive() {
        let hub: EventHub<Vec<u8>> = EventHub::new();
        let rx1 = hub.subscribe();
        let rx2 = hub.subscribe();

        hub.emit(IndexEvent::Ready);
        assert_eq!(rx1.recv().unwrap(), IndexEvent::Ready);
        assert_eq!(rx2.recv().unwrap(), IndexEvent::Ready);
    }

    #[test]
    fn dropped_subscribers_are_pruned() {
        let hub: EventHub<Vec<u8>> = EventHub::new();
        let rx = hub.subscribe();
        assert_eq!(hub.subscriber_count(), 1);

        drop(rx);
        hub.emit(IndexEvent::Ready);
        assert_eq!(hub.subscriber_count(), 0);
    }
}
