// src/core/persistence/aof_rewriter.rs

//! Background compaction of the append-only file.
//!
//! The snapshot and the final swap both happen under the exclusive side of the
//! gate. Between them the gate is free: mutations keep flowing to the live
//! file while the writer also buffers them for the new one.

use crate::core::CaradeError;
use crate::core::protocol::RespFrame;
use crate::core::state::ServerState;
use crate::core::storage::data_types::ValueCell;
use bytes::Bytes;
use std::fs::File as StdFile;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::Ordering;
use tracing::{error, info};

/// Runs one full rewrite and returns once the new file is live.
pub async fn rewrite_aof(state: Arc<ServerState>) -> Result<(), CaradeError> {
    let Some(aof) = state.aof.clone() else {
        return Err(CaradeError::AofError("append only file is disabled".into()));
    };
    let temp_path = get_temp_aof_path(aof.path())?;

    let snapshot = {
        let _gate = state.gate.exclusive().await;
        if state
            .persistence
            .rewrite_in_progress
            .swap(true, Ordering::AcqRel)
        {
            return Err(CaradeError::RewriteInProgress);
        }
        aof.begin_rewrite();
        state.keyspace.snapshot()
    };
    info!("AOF rewrite started. New writes are buffered for the rewritten file.");

    let result = async {
        let path = temp_path.clone();
        let last_db = tokio::task::spawn_blocking(move || write_snapshot(&path, &snapshot))
            .await
            .map_err(|e| CaradeError::Internal(format!("AOF rewrite task panicked: {e}")))??;

        let _gate = state.gate.exclusive().await;
        aof.complete_rewrite(temp_path.clone(), last_db).await
    }
    .await;

    match &result {
        Ok(()) => info!("AOF rewrite completed successfully."),
        Err(e) => {
            error!("AOF rewrite failed: {}. Keeping the current file.", e);
            aof.abort_rewrite();
            let _ = tokio::fs::remove_file(&temp_path).await;
        }
    }
    state
        .persistence
        .rewrite_in_progress
        .store(false, Ordering::Release);
    result
}

/// Starts a rewrite in the background unless one is already running.
pub fn spawn_rewrite(state: &Arc<ServerState>) -> Result<(), CaradeError> {
    if state.aof.is_none() {
        return Err(CaradeError::AofError("append only file is disabled".into()));
    }
    if state.persistence.rewrite_in_progress.load(Ordering::Acquire) {
        return Err(CaradeError::RewriteInProgress);
    }
    let task_state = state.clone();
    let handle = tokio::spawn(async move {
        let _ = rewrite_aof(task_state).await;
    });
    *state.persistence.aof_rewrite_handle.lock() = Some(handle);
    Ok(())
}

/// Writes the construction commands for every key and returns the db the
/// file ends in.
fn write_snapshot(path: &Path, snapshot: &[Vec<(Bytes, ValueCell)>]) -> Result<usize, CaradeError> {
    info!("AOF rewrite: writing snapshot to {}", path.display());
    let mut file = BufWriter::new(StdFile::create(path)?);
    let mut last_db = 0;
    for (db, entries) in snapshot.iter().enumerate() {
        if entries.is_empty() {
            continue;
        }
        let select = RespFrame::from_args([Bytes::from_static(b"SELECT"), Bytes::from(db.to_string())]);
        file.write_all(&select.encode_to_vec()?)?;
        last_db = db;
        for (key, cell) in entries {
            for args in cell.to_rewrite_commands(key) {
                file.write_all(&RespFrame::from_args(args).encode_to_vec()?)?;
            }
        }
    }
    file.flush()?;
    file.get_ref().sync_all()?;
    Ok(last_db)
}

/// Generates the path for the temporary AOF file, e.g., "temp-rewrite-carade.aof".
pub fn get_temp_aof_path(original_path: &Path) -> Result<PathBuf, CaradeError> {
    let parent = original_path.parent().unwrap_or_else(|| Path::new("."));
    let file_name = original_path
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| CaradeError::AofError("Invalid AOF path".into()))?;
    Ok(parent.join(format!("temp-rewrite-{file_name}")))
}
