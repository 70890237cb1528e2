//! Dump queue command implementation.

use super::open_store;
use gamesync_engine::SyncConfig;
use gamesync_protocol::SyncOperation;
use gamesync_storage::{FileStore, LocalStoreExt};
use serde::Serialize;
use std::path::Path;

/// Queued operation representation for output.
#[derive(Debug, Serialize)]
pub struct QueuedOpInfo {
    /// Position in the queue, 0 is next to send.
    pub position: usize,
    /// Operation id.
    pub id: String,
    /// `full` or `partial:<key>`.
    pub label: String,
    /// When it was queued (RFC 3339).
    pub enqueued_at: String,
    /// Failed attempts so far.
    pub retry_count: u32,
    /// Encoded payload size in bytes.
    pub payload_size: usize,
}

/// Runs the dump-queue command.
pub fn run(
    path: &Path,
    config: &SyncConfig,
    limit: Option<usize>,
    format: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let store = open_store(path)?;
    let ops = read_queue(&store, config, limit)?;

    match format {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&ops)?);
        }
        _ => {
            print_text_output(&ops, config.max_retries);
        }
    }

    Ok(())
}

/// Reads up to `limit` queued operations, oldest first.
pub fn read_queue(
    store: &FileStore,
    config: &SyncConfig,
    limit: Option<usize>,
) -> Result<Vec<QueuedOpInfo>, Box<dyn std::error::Error>> {
    let queue: Vec<SyncOperation> = store.load(&config.queue_key)?.unwrap_or_default();
    let max_ops = limit.unwrap_or(usize::MAX);

    queue
        .iter()
        .take(max_ops)
        .enumerate()
        .map(|(position, op)| -> Result<QueuedOpInfo, Box<dyn std::error::Error>> {
            Ok(QueuedOpInfo {
                position,
                id: op.id.to_string(),
                label: op.label(),
                enqueued_at: op.enqueued_at.to_rfc3339(),
                retry_count: op.retry_count,
                payload_size: serde_json::to_vec(&op.payload)?.len(),
            })
        })
        .collect()
}

fn print_text_output(ops: &[QueuedOpInfo], max_retries: u32) {
    println!("Sync Queue ({} shown)", ops.len());
    println!("==========");
    println!();

    for op in ops {
        println!(
            "[{:04}] {:24} retries={}/{} size={} queued={} id={}",
            op.position,
            op.label,
            op.retry_count,
            max_retries,
            op.payload_size,
            op.enqueued_at,
            op.id
        );
    }
}
