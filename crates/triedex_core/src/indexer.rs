//! The run scheduler.
//!
//! [`Indexer`] is the reentrant state machine tying the engine together: it
//! fetches the persisted progress state, opens a snapshot, computes the
//! unprocessed range, drives diff iteration through the batch dispatcher,
//! persists progress after every batch, and decides whether to loop or stop.
//!
//! ## Reentrancy
//!
//! At most one run is active per indexer at any time. `run()` issued while a
//! run is active only sets a `pending` flag and returns; any number of
//! concurrent triggers coalesce into at most one follow-up pass. The
//! `running`/`pending` pair is checked-and-set under a single mutex, which
//! makes the scheme safe under preemptive threads.
//!
//! ## Durability ordering
//!
//! The mapping function's completion is the only signal that advances the
//! progress state. A crash between a completed batch and its checkpoint
//! means the batch is redelivered on restart: at-least-once, never
//! at-most-once.

use crate::batch::{BatchDispatcher, MapFn};
use crate::consumer::DiffConsumer;
use crate::error::{IndexError, IndexResult};
use crate::events::{EventHub, IndexEvent};
use crate::options::IndexerOptions;
use crate::state::ProgressState;
use crate::state_store::{MemoryStateStore, StateStore};
use crate::transform::transform_entry;
use parking_lot::Mutex;
use std::sync::mpsc::Receiver;
use std::sync::Arc;
use tracing::{debug, trace};
use triedex_codec::{BytesCodec, ValueCodec};
use triedex_trie::{DiffOptions, DiffStart, Trie, WatchToken};

/// The scheduler's current state-machine variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunPhase {
    /// No run is active.
    Idle,
    /// Loading the persisted progress state.
    Fetching,
    /// A snapshot is open and the unprocessed range is known.
    RangeComputed,
    /// Pulling change entries into the current batch.
    Iterating,
    /// Flushing a batch through the mapping function and persisting the
    /// resulting state.
    Persisting,
    /// The current pass is wrapping up.
    Finishing,
    /// The indexer is paused; no new work is scheduled.
    Paused,
    /// The current run aborted with an error.
    Errored,
}

impl RunPhase {
    /// Returns true while a run is actively processing a range.
    pub fn is_active(&self) -> bool {
        matches!(
            self,
            RunPhase::Fetching
                | RunPhase::RangeComputed
                | RunPhase::Iterating
                | RunPhase::Persisting
                | RunPhase::Finishing
        )
    }
}

/// The coalescing flag pair plus the cooperative pause bit.
///
/// All three are read and written under one mutex; check-and-set is atomic
/// with respect to every thread touching the scheduler.
#[derive(Debug, Default)]
struct RunFlags {
    running: bool,
    pending: bool,
    paused: bool,
}

/// How a completed pass ends the run loop.
enum PassEnd {
    /// More work is pending; loop immediately.
    Continue,
    /// Caught up with the trie; emit readiness and go idle.
    CaughtUp,
    /// Paused mid-run; go quiet without a readiness signal.
    Halted,
}

/// A resumable, checkpointed indexer over a versioned trie.
///
/// Construction goes through [`IndexerBuilder`]; see the crate docs for a
/// complete example.
pub struct Indexer<V: Clone + Send + 'static> {
    trie: Arc<dyn Trie>,
    codec: Arc<dyn ValueCodec<Value = V>>,
    state_store: Arc<dyn StateStore>,
    map: Mutex<MapFn<V>>,
    options: IndexerOptions,
    events: EventHub<V>,
    flags: Mutex<RunFlags>,
    phase: Mutex<RunPhase>,
    watch: Mutex<Option<WatchToken>>,
}

/// Builder for [`Indexer`].
pub struct IndexerBuilder<V: Clone + Send + 'static> {
    trie: Arc<dyn Trie>,
    codec: Arc<dyn ValueCodec<Value = V>>,
    state_store: Arc<dyn StateStore>,
    map: MapFn<V>,
    options: IndexerOptions,
}

impl<V: Clone + Send + 'static> IndexerBuilder<V> {
    /// Creates a builder with the default in-memory state store and default
    /// options.
    pub fn new(
        trie: Arc<dyn Trie>,
        codec: Arc<dyn ValueCodec<Value = V>>,
        map: MapFn<V>,
    ) -> Self {
        Self {
            trie,
            codec,
            state_store: Arc::new(MemoryStateStore::new()),
            map,
            options: IndexerOptions::default(),
        }
    }

    /// Uses a durable state store instead of the in-memory default.
    #[must_use]
    pub fn state_store(mut self, store: Arc<dyn StateStore>) -> Self {
        self.state_store = store;
        self
    }

    /// Replaces the configuration.
    #[must_use]
    pub fn options(mut self, options: IndexerOptions) -> Self {
        self.options = options;
        self
    }

    /// Builds the indexer.
    pub fn build(self) -> Arc<Indexer<V>> {
        Arc::new(Indexer {
            trie: self.trie,
            codec: self.codec,
            state_store: self.state_store,
            map: Mutex::new(self.map),
            options: self.options,
            events: EventHub::new(),
            flags: Mutex::new(RunFlags::default()),
            phase: Mutex::new(RunPhase::Idle),
            watch: Mutex::new(None),
        })
    }
}

impl Indexer<Vec<u8>> {
    /// Creates an indexer over raw byte values with default options and an
    /// in-memory state store.
    pub fn with_defaults(trie: Arc<dyn Trie>, map: MapFn<Vec<u8>>) -> Arc<Self> {
        IndexerBuilder::new(trie, Arc::new(BytesCodec::new()), map).build()
    }
}

impl<V: Clone + Send + 'static> Indexer<V> {
    /// Creates a builder. Equivalent to [`IndexerBuilder::new`].
    pub fn builder(
        trie: Arc<dyn Trie>,
        codec: Arc<dyn ValueCodec<Value = V>>,
        map: MapFn<V>,
    ) -> IndexerBuilder<V> {
        IndexerBuilder::new(trie, codec, map)
    }

    /// Subscribes to lifecycle events.
    pub fn subscribe(&self) -> Receiver<IndexEvent<V>> {
        self.events.subscribe()
    }

    /// The scheduler's current state-machine variant.
    pub fn phase(&self) -> RunPhase {
        *self.phase.lock()
    }

    /// Returns true while a run is active.
    pub fn is_running(&self) -> bool {
        self.flags.lock().running
    }

    /// Returns true while the indexer is paused.
    pub fn is_paused(&self) -> bool {
        self.flags.lock().paused
    }

    /// The configuration this indexer was built with.
    pub fn options(&self) -> &IndexerOptions {
        &self.options
    }

    /// Registers the live-watch listener (when `live` is enabled) and runs
    /// the initial catch-up pass.
    ///
    /// Call once the trie is initialized; tries with asynchronous setup
    /// expose [`Trie::ready`] for sequencing this call.
    ///
    /// # Errors
    ///
    /// Returns any error from the initial pass. Later live-triggered passes
    /// report failures through [`IndexEvent::Error`].
    pub fn start(self: &Arc<Self>) -> IndexResult<()> {
        if self.options.live && self.watch.lock().is_none() {
            let weak = Arc::downgrade(self);
            let token = self.trie.watch(
                &self.options.prefix,
                Arc::new(move || {
                    if let Some(indexer) = weak.upgrade() {
                        // Failures surface via the error event stream.
                        let _ = indexer.run();
                    }
                }),
            );
            *self.watch.lock() = Some(token);
        }
        self.run()
    }

    /// Unregisters the live-watch listener. Further trie writes no longer
    /// trigger runs; an in-flight run is unaffected.
    pub fn stop(&self) {
        if let Some(token) = self.watch.lock().take() {
            self.trie.unwatch(token);
        }
    }

    /// Pauses the indexer.
    ///
    /// No new run starts and no further batch pull begins, but a batch
    /// already dispatched to the mapping function completes and its
    /// checkpoint persists before the run halts.
    pub fn pause(&self) {
        let was_idle = {
            let mut flags = self.flags.lock();
            flags.paused = true;
            !flags.running
        };
        if was_idle {
            self.set_phase(RunPhase::Paused);
        }
        self.events.emit(IndexEvent::Paused);
    }

    /// Resumes a paused indexer and runs a catch-up pass.
    ///
    /// # Errors
    ///
    /// Returns any error from the catch-up pass.
    pub fn resume(&self) -> IndexResult<()> {
        {
            let mut flags = self.flags.lock();
            if !flags.paused {
                return Ok(());
            }
            flags.paused = false;
        }
        self.set_phase(RunPhase::Idle);
        self.events.emit(IndexEvent::Resumed);
        self.run()
    }

    /// Runs until caught up with the trie.
    ///
    /// Blocking entry point of the state machine. Returns `Ok(())`
    /// immediately when a run is already active (the trigger is coalesced
    /// into at most one follow-up pass) or when the indexer is paused.
    ///
    /// # Errors
    ///
    /// Returns the first error of the pass; the same error is emitted as
    /// [`IndexEvent::Error`]. The last persisted state stays valid and the
    /// next `run()` resumes from it.
    pub fn run(&self) -> IndexResult<()> {
        if !self.begin_run() {
            return Ok(());
        }

        let outcome = loop {
            match self.run_pass() {
                Err(error) => break Err(error),
                Ok(snapshot_version) => match self.end_of_pass(snapshot_version) {
                    PassEnd::Continue => continue,
                    PassEnd::CaughtUp => break Ok(true),
                    PassEnd::Halted => break Ok(false),
                },
            }
        };

        match outcome {
            Ok(true) => {
                self.set_phase(RunPhase::Idle);
                self.events.emit(IndexEvent::Ready);
                Ok(())
            }
            Ok(false) => {
                self.set_phase(RunPhase::Paused);
                Ok(())
            }
            Err(error) => {
                // The phase stays Errored until the next run claims the slot.
                self.set_phase(RunPhase::Errored);
                self.events.emit(IndexEvent::Error(error.to_string()));
                {
                    let mut flags = self.flags.lock();
                    flags.running = false;
                    flags.pending = false;
                }
                Err(error)
            }
        }
    }

    /// Atomically claims the active-run slot, or records a pending trigger.
    fn begin_run(&self) -> bool {
        let mut flags = self.flags.lock();
        if flags.paused {
            return false;
        }
        if flags.running {
            flags.pending = true;
            return false;
        }
        flags.running = true;
        flags.pending = false;
        true
    }

    /// Decides, atomically with respect to concurrent triggers, whether the
    /// run loops for another pass or ends.
    fn end_of_pass(&self, snapshot_version: u64) -> PassEnd {
        let mut flags = self.flags.lock();
        if flags.paused {
            flags.running = false;
            return PassEnd::Halted;
        }
        if flags.pending {
            flags.pending = false;
            return PassEnd::Continue;
        }
        if self.options.live && self.trie.version() > snapshot_version {
            return PassEnd::Continue;
        }
        flags.running = false;
        PassEnd::CaughtUp
    }

    /// One pass: fetch state, compute the range, iterate, persist batches.
    /// Returns the version of the snapshot the pass ran against.
    fn run_pass(&self) -> IndexResult<u64> {
        self.set_phase(RunPhase::Fetching);
        let stored = self.state_store.fetch()?;
        let state = match stored {
            Some(bytes) => ProgressState::decode(&bytes)?,
            None => ProgressState::default(),
        };
        self.events.emit(IndexEvent::Start(state.clone()));

        // Resume a prior range exactly via its checkpoint, or open a fresh
        // snapshot and take everything committed since the last range end.
        let (snapshot, from, to, cursor_start);
        if let Some(checkpoint) = state.checkpoint {
            to = state
                .to
                .ok_or_else(|| IndexError::state_corrupt("checkpoint without a range end"))?;
            if state.from > to {
                return Err(IndexError::state_corrupt(format!(
                    "range start {} past range end {to}",
                    state.from
                )));
            }
            snapshot = self.trie.snapshot_at(to)?;
            from = state.from;
            cursor_start = DiffStart::Checkpoint(checkpoint);
        } else {
            let start = state.to.unwrap_or(state.from);
            snapshot = self.trie.snapshot()?;
            to = snapshot.version();
            if start >= to {
                self.set_phase(RunPhase::Finishing);
                debug!(version = to, "nothing to index");
                return Ok(to);
            }
            from = start;
            cursor_start = DiffStart::Version(start);
        }
        self.set_phase(RunPhase::RangeComputed);
        debug!(from, to, prefix = %self.options.prefix, "index pass over range");

        let diff_options = DiffOptions {
            hidden: self.options.hidden,
        };
        let cursor = snapshot.diff(cursor_start, &self.options.prefix, &diff_options)?;
        let mut consumer = DiffConsumer::new(cursor);
        let mut dispatcher = BatchDispatcher::new(self.options.batch_size);

        loop {
            self.set_phase(RunPhase::Iterating);
            let mut halted = false;
            while !dispatcher.is_full() {
                if self.is_paused() {
                    halted = true;
                    break;
                }
                match consumer.next()? {
                    Some(entry) => {
                        let message = transform_entry(
                            entry,
                            self.codec.as_ref(),
                            self.options.transform_node,
                        )?;
                        dispatcher.accumulate(message);
                    }
                    None => break,
                }
            }
            let exhausted = consumer.is_done();

            // Paused before any entry of this batch was pulled: nothing was
            // dispatched, so there is nothing to persist.
            if dispatcher.is_empty() && halted && !exhausted {
                break;
            }

            self.set_phase(RunPhase::Persisting);
            let batch = {
                let mut map = self.map.lock();
                dispatcher.flush(&mut **map)?
            };
            let checkpoint = if exhausted {
                None
            } else {
                Some(consumer.checkpoint()?)
            };
            let new_state = ProgressState {
                from,
                to: Some(to),
                checkpoint,
            };
            self.state_store.store(&new_state.encode())?;
            trace!(
                batch = batch.len(),
                resumable = new_state.checkpoint.is_some(),
                "progress persisted"
            );

            self.events.emit(IndexEvent::State(new_state));
            if !batch.is_empty() {
                let caught_up = exhausted && self.trie.version() == to;
                self.events.emit(IndexEvent::Indexed { batch, caught_up });
            }

            if exhausted || halted {
                break;
            }
        }

        self.set_phase(RunPhase::Finishing);
        Ok(snapshot.version())
    }

    fn set_phase(&self, phase: RunPhase) {
        *self.phase.lock() = phase;
    }
}

impl<V: Clone + Send + 'static> Drop for Indexer<V> {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::Arc;
    use triedex_trie::MemoryTrie;

    fn collecting_map(
        sink: Arc<Mutex<Vec<(String, Vec<u8>, bool)>>>,
    ) -> MapFn<Vec<u8>> {
        Box::new(move |batch| {
            let mut sink = sink.lock();
            for message in batch {
                sink.push((message.key.clone(), message.value.clone(), message.delete));
            }
            Ok(())
        })
    }

    #[test]
    fn single_pass_catch_up() {
        let trie = MemoryTrie::new();
        trie.put("a", vec![1]);
        trie.put("b", vec![2]);
        trie.delete("a");

        let sink = Arc::new(Mutex::new(Vec::new()));
        let indexer = Indexer::with_defaults(Arc::new(trie), collecting_map(Arc::clone(&sink)));

        indexer.run().unwrap();
        assert_eq!(indexer.phase(), RunPhase::Idle);
        assert!(!indexer.is_running());

        let seen = sink.lock().clone();
        assert_eq!(
            seen,
            vec![
                ("a".to_string(), vec![1], false),
                ("b".to_string(), vec![2], false),
                ("a".to_string(), vec![1], true),
            ]
        );
    }

    #[test]
    fn second_run_is_a_no_op() {
        let trie = MemoryTrie::new();
        trie.put("a", vec![1]);

        let sink = Arc::new(Mutex::new(Vec::new()));
        let indexer = Indexer::with_defaults(Arc::new(trie), collecting_map(Arc::clone(&sink)));

        indexer.run().unwrap();
        indexer.run().unwrap();
        assert_eq!(sink.lock().len(), 1);
    }

    #[test]
    fn run_while_paused_is_refused() {
        let trie = MemoryTrie::new();
        trie.put("a", vec![1]);

        let sink = Arc::new(Mutex::new(Vec::new()));
        let indexer = Indexer::with_defaults(Arc::new(trie), collecting_map(Arc::clone(&sink)));

        indexer.pause();
        assert_eq!(indexer.phase(), RunPhase::Paused);
        indexer.run().unwrap();
        assert!(sink.lock().is_empty());

        indexer.resume().unwrap();
        assert_eq!(sink.lock().len(), 1);
        assert_eq!(indexer.phase(), RunPhase::Idle);
    }

    #[test]
    fn corrupt_stored_state_fails_the_run() {
        let trie = MemoryTrie::new();
        trie.put("a", vec![1]);

        let store = Arc::new(MemoryStateStore::with_state(vec![0x80]));
        let sink = Arc::new(Mutex::new(Vec::new()));
        let indexer = IndexerBuilder::new(
            Arc::new(trie),
            Arc::new(BytesCodec::new()),
            collecting_map(Arc::clone(&sink)),
        )
        .state_store(store)
        .build();

        let events = indexer.subscribe();
        let err = indexer.run().unwrap_err();
        assert!(matches!(err, IndexError::StateCorrupt { .. }));
        assert!(sink.lock().is_empty());
        assert_eq!(indexer.phase(), RunPhase::Errored);

        // The failure is also emitted as an event.
        let mut saw_error = false;
        while let Ok(event) = events.try_recv() {
            if matches!(event, IndexEvent::Error(_)) {
                saw_error = true;
            }
        }
        assert!(saw_error);
    }

    #[test]
    fn errored_phase_is_observable_until_the_next_run() {
        let trie = MemoryTrie::new();
        trie.put("a", vec![1]);

        let store = Arc::new(MemoryStateStore::with_state(vec![0x80]));
        let sink = Arc::new(Mutex::new(Vec::new()));
        let indexer = IndexerBuilder::new(
            Arc::new(trie),
            Arc::new(BytesCodec::new()),
            collecting_map(Arc::clone(&sink)),
        )
        .state_store(Arc::clone(&store) as Arc<dyn StateStore>)
        .build();

        indexer.run().unwrap_err();
        assert_eq!(indexer.phase(), RunPhase::Errored);
        assert!(!indexer.is_running());

        // Repairing the store lets the next run recover and go idle.
        store.store(&[]).unwrap();
        indexer.run().unwrap();
        assert_eq!(indexer.phase(), RunPhase::Idle);
        assert_eq!(sink.lock().len(), 1);
    }

    #[test]
    fn checkpoint_without_range_end_is_corruption() {
        let trie = MemoryTrie::new();
        trie.put("a", vec![1]);

        let bad = ProgressState {
            from: 0,
            to: None,
            checkpoint: Some(vec![0u8; 8]),
        };
        let store = Arc::new(MemoryStateStore::with_state(bad.encode()));
        let indexer = IndexerBuilder::new(
            Arc::new(trie),
            Arc::new(BytesCodec::new()),
            Box::new(|_: &[crate::Message<Vec<u8>>]| Ok(())) as MapFn<Vec<u8>>,
        )
        .state_store(store)
        .build();

        let err = indexer.run().unwrap_err();
        assert!(matches!(err, IndexError::StateCorrupt { .. }));
    }
}
