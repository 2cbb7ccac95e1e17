//! JSONL persistence for the in-memory store.
//!
//! One record per line, tagged by `kind`:
//!
//! ```text
//! {"kind":"item","id":"road-a3f8","title":"Public beta",...}
//! {"kind":"dependency","id":"dep-k2x9","source_id":"road-a3f8","target_id":"road-77qe","type":"blocks",...}
//! ```
//!
//! Items are written before edges, each group sorted by id, so saves are
//! deterministic and diff cleanly under version control.

use super::InMemoryStore;
use crate::domain::{DependencyEdge, Item, ItemId, Snapshot};
use crate::error::{Error, Result, StorageError};
use crate::store::{ImportWarning, ItemStore};
use petgraph::algo::is_cyclic_directed;
use petgraph::graphmap::DiGraphMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, BufWriter};

#[derive(Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum Record {
    Item(Item),
    Dependency(DependencyEdge),
}

#[derive(Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum RecordRef<'a> {
    Item(&'a Item),
    Dependency(&'a DependencyEdge),
}

/// Non-fatal problems found while loading a JSONL file.
///
/// Loading continues past each of these; the affected record is skipped
/// (except for [`LoadWarning::CyclicGraph`], which only reports).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadWarning {
    /// A line was not valid JSON or not a known record kind
    MalformedRecord {
        /// 1-based line number
        line_number: usize,
        /// Parser message
        error: String,
    },

    /// An item record failed validation
    InvalidItem {
        /// The item's id
        item_id: ItemId,
        /// 1-based line number
        line_number: usize,
        /// Validation message
        error: String,
    },

    /// A record was rejected while rebuilding the store
    Import(ImportWarning),

    /// The loaded edges contain at least one cycle.
    ///
    /// Cycles are kept as-is so they can be inspected and removed by hand.
    CyclicGraph,
}

impl fmt::Display for LoadWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MalformedRecord { line_number, error } => {
                write!(f, "line {line_number}: skipped malformed record: {error}")
            }
            Self::InvalidItem {
                item_id,
                line_number,
                error,
            } => write!(f, "line {line_number}: skipped invalid item {item_id}: {error}"),
            Self::Import(warning) => write!(f, "{warning}"),
            Self::CyclicGraph => write!(
                f,
                "dependency graph contains cycles; run 'waypoint dep cycles' to list them"
            ),
        }
    }
}

/// Load a store from a JSONL file.
///
/// # Error Handling
///
/// - **Malformed lines**: skipped with a warning
/// - **Invalid items**: skipped with a warning
/// - **Orphaned or duplicate edges**: skipped with a warning
/// - **Cycles**: kept, reported once
///
/// # Errors
///
/// Returns an error only if the file can't be opened or read.
pub async fn load_from_jsonl(path: &Path, prefix: String) -> Result<(InMemoryStore, Vec<LoadWarning>)> {
    let file = File::open(path).await?;
    let mut lines = BufReader::new(file).lines();

    let mut warnings = Vec::new();
    let mut snapshot = Snapshot::default();
    let mut line_number = 0;

    while let Some(line) = lines.next_line().await? {
        line_number += 1;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        match serde_json::from_str::<Record>(line) {
            Ok(Record::Item(item)) => match item.validate() {
                Ok(()) => snapshot.items.push(item),
                Err(error) => warnings.push(LoadWarning::InvalidItem {
                    item_id: item.id,
                    line_number,
                    error,
                }),
            },
            Ok(Record::Dependency(edge)) => snapshot.edges.push(edge),
            Err(e) => warnings.push(LoadWarning::MalformedRecord {
                line_number,
                error: e.to_string(),
            }),
        }
    }

    let mut store = InMemoryStore::new(prefix);
    let import_warnings = store.import(snapshot).await?;
    warnings.extend(import_warnings.into_iter().map(LoadWarning::Import));

    if contains_cycle(&store.all_edges().await?) {
        warnings.push(LoadWarning::CyclicGraph);
    }

    tracing::debug!(
        path = %path.display(),
        lines = line_number,
        warnings = warnings.len(),
        "Loaded JSONL store"
    );

    Ok((store, warnings))
}

fn contains_cycle(edges: &[DependencyEdge]) -> bool {
    let graph: DiGraphMap<&str, ()> = edges
        .iter()
        .map(|edge| (edge.source_id.as_str(), edge.target_id.as_str()))
        .collect();
    is_cyclic_directed(&graph)
}

/// Save a store to a JSONL file atomically.
///
/// Writes to `<path>.tmp` first and renames over the target, so a crash
/// mid-write leaves the previous file intact. On failure the temp file is
/// removed.
///
/// # Errors
///
/// Returns an error if exporting, serializing, writing or renaming fails.
pub async fn save_to_jsonl(store: &dyn ItemStore, path: &Path) -> Result<()> {
    let temp_path = path.with_extension("tmp");

    let snapshot = store.export_all().await?;

    let written = match write_records(&temp_path, &snapshot).await {
        Ok(()) => tokio::fs::rename(&temp_path, path).await.map_err(Error::Io),
        Err(err) => Err(err),
    };
    if let Err(err) = written {
        // Best-effort cleanup of the temp file.
        let _ = tokio::fs::remove_file(&temp_path).await;
        return Err(err);
    }

    tracing::debug!(
        path = %path.display(),
        items = snapshot.items.len(),
        edges = snapshot.edges.len(),
        "Saved JSONL store"
    );

    Ok(())
}

async fn write_records(temp_path: &Path, snapshot: &Snapshot) -> Result<()> {
    let file = File::create(temp_path).await?;
    let mut writer = BufWriter::new(file);

    let records = snapshot
        .items
        .iter()
        .map(RecordRef::Item)
        .chain(snapshot.edges.iter().map(RecordRef::Dependency));
    for record in records {
        let json = serde_json::to_string(&record).map_err(StorageError::Serialization)?;
        writer.write_all(json.as_bytes()).await?;
        writer.write_all(b"\n").await?;
    }

    writer.flush().await?;
    Ok(())
}
