//! Common test utilities shared across integration tests.

#![allow(dead_code)]

use std::path::Path;
use std::process::{Command, Output};
use waypoint::domain::{ItemId, NewItem};
use waypoint::graph::DependencyManager;
use waypoint::store::{InMemoryStore, ItemStore};

/// A manager over a fresh in-memory store.
pub fn new_manager() -> DependencyManager {
    DependencyManager::new(Box::new(InMemoryStore::new("test".to_string())))
}

/// Create one item per title, returning their ids in order.
pub async fn create_items(store: &mut dyn ItemStore, titles: &[&str]) -> Vec<ItemId> {
    let mut ids = Vec::with_capacity(titles.len());
    for title in titles {
        let item = store
            .create_item(NewItem::titled(*title))
            .await
            .expect("item creation should succeed");
        ids.push(item.id);
    }
    ids
}

/// Run the waypoint binary in `dir` with colors disabled.
pub fn run_waypoint_in_dir(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_waypoint"))
        .args(args)
        .current_dir(dir)
        .env("NO_COLOR", "1")
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to execute waypoint binary")
}

/// Run the binary with `--json` and parse stdout, asserting success.
pub fn run_json(dir: &Path, args: &[&str]) -> serde_json::Value {
    let mut full = vec!["--json"];
    full.extend_from_slice(args);
    let output = run_waypoint_in_dir(dir, &full);
    assert!(
        output.status.success(),
        "waypoint {args:?} failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).expect("stdout should be valid JSON")
}
