//! Live indexing walkthrough: an indexer follows a trie as writes land,
//! pauses, accumulates a backlog, and catches up on resume.
//!
//! Run with `cargo run -p triedex-demo-live-feed`.

use parking_lot::Mutex;
use std::sync::Arc;
use std::thread;
use tracing::info;
use tracing_subscriber::EnvFilter;
use triedex_core::{IndexEvent, Indexer, MapFn};
use triedex_trie::MemoryTrie;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let trie = MemoryTrie::new();
    trie.put("sensor/1", b"18.5".to_vec());
    trie.put("sensor/2", b"21.0".to_vec());

    let seen: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
    let target = Arc::clone(&seen);
    let map: MapFn<Vec<u8>> = Box::new(move |batch| {
        let mut seen = target.lock();
        for message in batch {
            seen.push(format!(
                "v{} {} = {}",
                message.version,
                message.key,
                String::from_utf8_lossy(&message.value)
            ));
        }
        Ok(())
    });

    let indexer = Indexer::with_defaults(Arc::new(trie.clone()), map);
    let events = indexer.subscribe();
    let printer = thread::spawn(move || {
        for event in events {
            match event {
                IndexEvent::Indexed { batch, caught_up } => {
                    info!(batch = batch.len(), caught_up, "batch indexed");
                }
                IndexEvent::Ready => info!("caught up"),
                IndexEvent::Paused => info!("paused"),
                IndexEvent::Resumed => info!("resumed"),
                IndexEvent::Error(message) => info!(%message, "run failed"),
                _ => {}
            }
        }
    });

    // Initial catch-up over the two writes above.
    indexer.start()?;

    // Live writes trigger runs through the watch listener.
    trie.put("sensor/3", b"19.2".to_vec());
    trie.delete("sensor/1");

    // While paused, writes only accumulate.
    indexer.pause();
    trie.put("sensor/1", b"17.8".to_vec());
    trie.put("sensor/2", b"21.4".to_vec());
    info!(backlog = 2, indexed = seen.lock().len(), "paused with a backlog");

    // Resume drains the backlog in one pass.
    indexer.resume()?;

    for line in seen.lock().iter() {
        println!("{line}");
    }

    indexer.stop();
    drop(indexer);
    printer.join().expect("event printer exits");
    Ok(())
}
