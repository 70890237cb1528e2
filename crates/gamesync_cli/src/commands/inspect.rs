//! Inspect command implementation.

use super::open_store;
use chrono::{DateTime, Utc};
use gamesync_engine::SyncConfig;
use gamesync_protocol::{GameProgressSnapshot, SyncOperation};
use gamesync_storage::{FileStore, LocalStore, LocalStoreExt};
use serde::Serialize;
use std::path::Path;

/// Store inspection result.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InspectResult {
    /// Store path.
    pub path: String,
    /// Snapshot version, if a snapshot is cached.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<u64>,
    /// When the snapshot was last saved locally.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_saved: Option<DateTime<Utc>>,
    /// When the remote store last confirmed the snapshot.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_synced_at: Option<DateTime<Utc>>,
    /// Snapshot sections.
    pub sections: Vec<SectionStats>,
    /// Pending sync operations.
    pub queue_length: usize,
    /// Other documents in the store, such as feature mirrors.
    pub other_keys: Vec<String>,
}

/// Statistics for one section.
#[derive(Debug, Serialize)]
pub struct SectionStats {
    /// Section key.
    pub key: String,
    /// Encoded size in bytes.
    pub size: usize,
}

/// Runs the inspect command.
pub fn run(path: &Path, config: &SyncConfig, format: &str) -> Result<(), Box<dyn std::error::Error>> {
    let store = open_store(path)?;
    let result = inspect(&store, config)?;

    match format {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        _ => {
            print_text_output(&result);
        }
    }

    Ok(())
}

/// Summarizes the snapshot and queue held by `store`.
pub fn inspect(
    store: &FileStore,
    config: &SyncConfig,
) -> Result<InspectResult, Box<dyn std::error::Error>> {
    let snapshot: Option<GameProgressSnapshot> = store.load(&config.progress_key)?;
    let queue: Vec<SyncOperation> = store.load(&config.queue_key)?.unwrap_or_default();

    let sections = match &snapshot {
        Some(snapshot) => snapshot
            .sections
            .iter()
            .map(|(key, value)| {
                Ok(SectionStats {
                    key: key.clone(),
                    size: serde_json::to_vec(value)?.len(),
                })
            })
            .collect::<Result<Vec<_>, serde_json::Error>>()?,
        None => Vec::new(),
    };

    let other_keys = store
        .keys()?
        .into_iter()
        .filter(|k| *k != config.progress_key && *k != config.queue_key)
        .collect();

    Ok(InspectResult {
        path: store.dir().display().to_string(),
        version: snapshot.as_ref().map(|s| s.version),
        last_saved: snapshot.as_ref().and_then(|s| s.last_saved),
        last_synced_at: snapshot.as_ref().and_then(|s| s.last_synced_at),
        sections,
        queue_length: queue.len(),
        other_keys,
    })
}

fn print_text_output(result: &InspectResult) {
    println!("GameSync Local Store");
    println!("====================");
    println!("Path: {}", result.path);
    println!();

    match result.version {
        Some(version) => println!("Version:        {}", version),
        None => println!("Version:        (no snapshot)"),
    }
    if let Some(saved) = result.last_saved {
        println!("Last saved:     {}", saved.to_rfc3339());
    }
    if let Some(synced) = result.last_synced_at {
        println!("Last synced:    {}", synced.to_rfc3339());
    }
    println!("Queue length:   {}", result.queue_length);

    if !result.sections.is_empty() {
        println!();
        println!("Sections");
        println!("--------");
        for section in &result.sections {
            println!("  {:20} {} bytes", section.key, section.size);
        }
    }

    if !result.other_keys.is_empty() {
        println!();
        println!("Other keys: {}", result.other_keys.join(", "));
    }
}
