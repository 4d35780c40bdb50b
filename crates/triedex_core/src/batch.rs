//! Batch accumulation and dispatch to the mapping function.

use crate::error::IndexResult;
use crate::transform::Message;

/// The mapping function projecting batches into downstream storage.
///
/// Returning `Ok` is the completion signal that lets the scheduler persist
/// progress past the batch. Delivery is at-least-once: a batch whose effects
/// landed but whose checkpoint did not will be redelivered after a restart,
/// so mapping functions must be idempotent with respect to redelivery.
pub type MapFn<V> = Box<dyn FnMut(&[Message<V>]) -> IndexResult<()> + Send>;

/// Accumulates transformed messages and hands full batches to the mapping
/// function.
///
/// The dispatcher never invokes the mapping function with an empty batch.
pub(crate) struct BatchDispatcher<V> {
    batch: Vec<Message<V>>,
    batch_size: usize,
}

impl<V> BatchDispatcher<V> {
    pub(crate) fn new(batch_size: usize) -> Self {
        Self {
            batch: Vec::with_capacity(batch_size.min(1024)),
            batch_size,
        }
    }

    pub(crate) fn accumulate(&mut self, message: Message<V>) {
        self.batch.push(message);
    }

    pub(crate) fn is_full(&self) -> bool {
        self.batch.len() >= self.batch_size
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.batch.is_empty()
    }

    /// Invokes the mapping function with the accumulated batch and returns
    /// the batch after completion. Empty batches are returned without
    /// invoking the mapping function.
    pub(crate) fn flush(
        &mut self,
        map: &mut dyn FnMut(&[Message<V>]) -> IndexResult<()>,
    ) -> IndexResult<Vec<Message<V>>> {
        if self.batch.is_empty() {
            return Ok(Vec::new());
        }
        map(&self.batch)?;
        Ok(std::mem::take(&mut self.batch))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(version: u64) -> Message<Vec<u8>> {
        Message {
            key: format!("k{version}"),
            version,
            value: vec![version as u8],
            delete: false,
            previous_value: None,
        }
    }

    #[test]
    fn fills_at_batch_size() {
        let mut dispatcher = BatchDispatcher::new(2);
        assert!(!dispatcher.is_full());
        dispatcher.accumulate(message(1));
        assert!(!dispatcher.is_full());
        dispatcher.accumulate(message(2));
        assert!(dispatcher.is_full());
    }

    #[test]
    fn flush_awaits_map_and_resets() {
        let mut dispatcher = BatchDispatcher::new(2);
        dispatcher.accumulate(message(1));
        dispatcher.accumulate(message(2));

        let mut seen = 0usize;
        let batch = dispatcher
            .flush(&mut |batch| {
                seen = batch.len();
                Ok(())
            })
            .unwrap();
        assert_eq!(seen, 2);
        assert_eq!(batch.len(), 2);
        assert!(dispatcher.is_empty());
    }

    #[test]
    fn empty_flush_never_calls_map() {
        let mut dispatcher: BatchDispatcher<Vec<u8>> = BatchDispatcher::new(2);
        let batch = dispatcher
            .flush(&mut |_| panic!("map must not run on an empty batch"))
            .unwrap();
        assert!(batch.is_empty());
    }

    #[test]
    fn map_error_keeps_batch() {
        let mut dispatcher = BatchDispatcher::new(2);
        dispatcher.accumulate(message(1));
        let err = dispatcher
            .flush(&mut |_| Err(crate::error::IndexError::map_failed("downstream busy")))
            .unwrap_err();
        assert!(matches!(err, crate::error::IndexError::Map { .. }));
        // The batch stays accumulated for redelivery semantics upstream.
        assert!(!dispatcher.is_empty());
    }
}
