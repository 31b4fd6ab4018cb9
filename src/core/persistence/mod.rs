// src/core/persistence/mod.rs

//! The append-only command log: the writer task, the startup loader and the
//! background rewrite, plus the DUMP/RESTORE value codec.

mod aof_loader;
mod aof_rewriter;
mod aof_writer;
pub mod value_codec;

pub use aof_loader::AofLoader;
pub use aof_rewriter::{get_temp_aof_path, rewrite_aof, spawn_rewrite};
pub use aof_writer::{AofMessage, AofWriterTask, encode_entry};

use crate::core::CaradeError;
use bytes::Bytes;
use std::path::PathBuf;
use tokio::sync::{mpsc, oneshot};
use tracing::warn;

/// One mutating command as it is written to the log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRecord {
    pub db: usize,
    pub args: Vec<Bytes>,
}

impl LogRecord {
    pub fn new(db: usize, args: Vec<Bytes>) -> Self {
        Self { db, args }
    }
}

/// A unit the writer appends atomically: a single command, or the records of
/// one `EXEC` wrapped in `MULTI`/`EXEC`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogEntry {
    Single(LogRecord),
    Transaction(Vec<LogRecord>),
}

/// A cloneable handle to the writer task.
///
/// Sends never block, so `log` may be called while a keyspace shard lock is
/// held and the log order then matches the mutation order.
#[derive(Debug, Clone)]
pub struct AppendLog {
    tx: mpsc::UnboundedSender<AofMessage>,
    path: PathBuf,
}

impl AppendLog {
    /// Creates the handle and the receiver the writer task will own.
    pub fn channel(path: impl Into<PathBuf>) -> (Self, mpsc::UnboundedReceiver<AofMessage>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            Self {
                tx,
                path: path.into(),
            },
            rx,
        )
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    pub fn log(&self, db: usize, args: Vec<Bytes>) {
        self.send(AofMessage::Entry(LogEntry::Single(LogRecord::new(db, args))));
    }

    pub fn log_transaction(&self, records: Vec<LogRecord>) {
        if records.is_empty() {
            return;
        }
        self.send(AofMessage::Entry(LogEntry::Transaction(records)));
    }

    /// Starts buffering entries for a rewrite. Callers hold the gate exclusively.
    pub(crate) fn begin_rewrite(&self) {
        self.send(AofMessage::BeginRewrite);
    }

    /// Hands the finished temp file to the writer and waits for the swap.
    pub(crate) async fn complete_rewrite(
        &self,
        temp_path: PathBuf,
        last_db: usize,
    ) -> Result<(), CaradeError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(AofMessage::CompleteRewrite {
                temp_path,
                last_db,
                reply,
            })
            .map_err(|_| CaradeError::AofError("AOF writer is not running".into()))?;
        rx.await
            .map_err(|_| CaradeError::AofError("AOF writer dropped the rewrite".into()))?
    }

    pub(crate) fn abort_rewrite(&self) {
        self.send(AofMessage::AbortRewrite);
    }

    /// Waits until everything sent so far has been flushed and synced.
    pub async fn sync(&self) -> Result<(), CaradeError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(AofMessage::Sync { reply })
            .map_err(|_| CaradeError::AofError("AOF writer is not running".into()))?;
        rx.await
            .map_err(|_| CaradeError::AofError("AOF writer stopped before syncing".into()))?
    }

    /// Asks the writer to drain, sync and stop, and waits for it to finish.
    pub async fn close(&self) {
        let (reply, rx) = oneshot::channel();
        if self.tx.send(AofMessage::Shutdown { reply }).is_ok() {
            let _ = rx.await;
        }
    }

    fn send(&self, message: AofMessage) {
        if self.tx.send(message).is_err() {
            warn!("AOF writer is gone; dropping log entry.");
        }
    }
}
