//! CLI command implementations.

pub mod dump_queue;
pub mod inspect;

use gamesync_storage::FileStore;
use std::path::Path;

/// Opens the store at `path`, refusing to create a missing directory.
fn open_store(path: &Path) -> Result<FileStore, Box<dyn std::error::Error>> {
    if !path.is_dir() {
        return Err(format!("No local store found at {:?}", path).into());
    }
    Ok(FileStore::open(path)?)
}
