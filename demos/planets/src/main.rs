//! Builds a `kind:name` secondary index over a small set of records.
//!
//! Run with `cargo run -p triedex-demo-planets`. Set `RUST_LOG=debug` to see
//! the indexer's pass-by-pass progress.

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;
use triedex_codec::JsonCodec;
use triedex_core::{IndexerBuilder, MapFn, Message};
use triedex_trie::MemoryTrie;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Record {
    kind: String,
    name: String,
}

fn record(kind: &str, name: &str) -> Vec<u8> {
    serde_json::to_vec(&Record {
        kind: kind.into(),
        name: name.into(),
    })
    .expect("record serializes")
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let trie = MemoryTrie::new();
    trie.put("earth-key", record("planet", "earth"));
    trie.put("nile-key", record("river", "nile"));
    trie.put("mars-key", record("planet", "marsss"));
    trie.put("venus-key", record("planet", "venus"));
    // Correct the typo; the index entry derived from the old value is
    // removed via previous_value.
    trie.put("mars-key", record("planet", "mars"));
    trie.delete("venus-key");

    let index: Arc<RwLock<BTreeMap<String, String>>> = Arc::new(RwLock::new(BTreeMap::new()));
    let target = Arc::clone(&index);
    let map: MapFn<Record> = Box::new(move |batch: &[Message<Record>]| {
        let mut index = target.write();
        for message in batch {
            if let Some(previous) = &message.previous_value {
                index.remove(&format!("{}:{}", previous.kind, previous.name));
            }
            let entry = format!("{}:{}", message.value.kind, message.value.name);
            if message.delete {
                index.remove(&entry);
            } else {
                index.insert(entry, message.key.clone());
            }
        }
        Ok(())
    });

    let indexer = IndexerBuilder::new(
        Arc::new(trie),
        Arc::new(JsonCodec::<Record>::new()),
        map,
    )
    .build();
    indexer.run()?;

    info!("index built");
    for (entry, key) in index.read().iter() {
        println!("{entry} -> {key}");
    }
    Ok(())
}
