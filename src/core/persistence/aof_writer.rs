// src/core/persistence/aof_writer.rs

//! The task that owns the append-only file.
//!
//! Entries arrive over an unbounded channel in mutation order. The task
//! inserts `SELECT` whenever the database changes, applies the configured
//! fsync policy and, while a rewrite is running, keeps a copy of every entry
//! so it can be appended to the new file before the swap.

use super::{LogEntry, LogRecord};
use crate::config::AppendFsync;
use crate::core::CaradeError;
use crate::core::protocol::RespFrame;
use crate::core::state::ServerState;
use bytes::Bytes;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::Duration;
use tokio::fs::{File, OpenOptions};
use tokio::io::{AsyncWriteExt, BufWriter};
use tokio::sync::{mpsc, oneshot};
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

/// The number of retry attempts for a failed AOF write operation.
const AOF_RETRY_ATTEMPTS: u32 = 5;
/// The delay between AOF write retry attempts.
const AOF_RETRY_DELAY: Duration = Duration::from_secs(2);
/// How often buffered writes are flushed (and synced under `everysec`).
const FLUSH_INTERVAL: Duration = Duration::from_secs(1);

/// Requests handled by the writer task.
#[derive(Debug)]
pub enum AofMessage {
    Entry(LogEntry),
    BeginRewrite,
    CompleteRewrite {
        temp_path: PathBuf,
        last_db: usize,
        reply: oneshot::Sender<Result<(), CaradeError>>,
    },
    AbortRewrite,
    Sync {
        reply: oneshot::Sender<Result<(), CaradeError>>,
    },
    Shutdown {
        reply: oneshot::Sender<()>,
    },
}

/// Encodes one entry as RESP, emitting `SELECT` when a record's db differs
/// from `selected_db` and updating it.
pub fn encode_entry(entry: &LogEntry, selected_db: &mut Option<usize>) -> Result<Vec<u8>, CaradeError> {
    let mut out = Vec::new();
    match entry {
        LogEntry::Single(record) => encode_record(record, selected_db, &mut out)?,
        LogEntry::Transaction(records) => {
            // The first SELECT goes before MULTI so the block replays in one db.
            if let Some(first) = records.first() {
                encode_select(first.db, selected_db, &mut out)?;
            }
            out.extend(RespFrame::from_args([Bytes::from_static(b"MULTI")]).encode_to_vec()?);
            for record in records {
                encode_record(record, selected_db, &mut out)?;
            }
            out.extend(RespFrame::from_args([Bytes::from_static(b"EXEC")]).encode_to_vec()?);
        }
    }
    Ok(out)
}

fn encode_record(
    record: &LogRecord,
    selected_db: &mut Option<usize>,
    out: &mut Vec<u8>,
) -> Result<(), CaradeError> {
    encode_select(record.db, selected_db, out)?;
    out.extend(RespFrame::from_args(record.args.iter().cloned()).encode_to_vec()?);
    Ok(())
}

fn encode_select(db: usize, selected_db: &mut Option<usize>, out: &mut Vec<u8>) -> Result<(), CaradeError> {
    if *selected_db != Some(db) {
        let frame = RespFrame::from_args([Bytes::from_static(b"SELECT"), Bytes::from(db.to_string())]);
        out.extend(frame.encode_to_vec()?);
        *selected_db = Some(db);
    }
    Ok(())
}

/// The main struct for the AOF writer background task.
pub struct AofWriterTask {
    state: Arc<ServerState>,
    path: PathBuf,
    writer: BufWriter<File>,
    rx: mpsc::UnboundedReceiver<AofMessage>,
    fsync: AppendFsync,
    /// The database the file is positioned in. `None` until the first SELECT.
    selected_db: Option<usize>,
    /// Entries written since the current rewrite took its snapshot.
    rewrite_buffer: Option<Vec<LogEntry>>,
}

impl AofWriterTask {
    /// Opens the log for appending. Failing here is fatal for the server.
    pub async fn new(
        state: Arc<ServerState>,
        rx: mpsc::UnboundedReceiver<AofMessage>,
    ) -> Result<Self, CaradeError> {
        let path = PathBuf::from(&state.config.persistence.aof_path);
        let writer = BufWriter::new(open_append(&path).await?);
        let fsync = state.config.persistence.appendfsync;
        Ok(Self {
            state,
            path,
            writer,
            rx,
            fsync,
            selected_db: None,
            rewrite_buffer: None,
        })
    }

    /// Runs until `AppendLog::close` is called or every handle is dropped.
    pub async fn run(mut self) -> Result<(), CaradeError> {
        info!(
            "AOF writer task started. Writing to {}. Fsync policy: {}",
            self.path.display(),
            self.fsync
        );
        let mut ticker = tokio::time::interval(FLUSH_INTERVAL);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => self.on_tick().await,
                message = self.rx.recv() => match message {
                    Some(AofMessage::Entry(entry)) => self.handle_entry(entry).await,
                    Some(AofMessage::BeginRewrite) => {
                        if self.rewrite_buffer.is_some() {
                            warn!("AOF rewrite started while another was buffering; restarting the buffer.");
                        }
                        self.rewrite_buffer = Some(Vec::new());
                    }
                    Some(AofMessage::CompleteRewrite { temp_path, last_db, reply }) => {
                        let result = self.finish_rewrite(&temp_path, last_db).await;
                        if let Err(e) = &result {
                            error!("Failed to install rewritten AOF: {}", e);
                        }
                        let _ = reply.send(result);
                    }
                    Some(AofMessage::AbortRewrite) => {
                        if self.rewrite_buffer.take().is_some() {
                            warn!("AOF rewrite aborted; discarding the rewrite buffer.");
                        }
                    }
                    Some(AofMessage::Sync { reply }) => {
                        let _ = reply.send(self.flush_and_sync().await);
                    }
                    Some(AofMessage::Shutdown { reply }) => {
                        info!("AOF writer task shutting down. Performing final drain and sync.");
                        self.drain_and_sync_all().await;
                        let _ = reply.send(());
                        return Ok(());
                    }
                    None => {
                        info!("AOF channel closed, writer task shutting down.");
                        self.drain_and_sync_all().await;
                        return Ok(());
                    }
                }
            }
        }
    }

    async fn handle_entry(&mut self, entry: LogEntry) {
        let bytes = match encode_entry(&entry, &mut self.selected_db) {
            Ok(bytes) => bytes,
            Err(e) => {
                error!("Could not encode AOF entry: {}", e);
                return;
            }
        };
        if let Some(buffer) = &mut self.rewrite_buffer {
            buffer.push(entry);
        }
        if let Err(e) = self.write_with_retry(&bytes).await {
            error!("AOF write failed, entry lost: {}", e);
            // The file may not have seen the SELECT; emit it again next time.
            self.selected_db = None;
            return;
        }
        if self.fsync == AppendFsync::Always
            && let Err(e) = self.flush_and_sync().await
        {
            error!("AOF fsync failed: {}", e);
        }
    }

    async fn on_tick(&mut self) {
        let result = match self.fsync {
            AppendFsync::Always => return,
            AppendFsync::EverySec => self.flush_and_sync().await,
            AppendFsync::No => self.writer.flush().await.map_err(CaradeError::from),
        };
        if let Err(e) = result {
            error!("AOF fsync failed in periodic task: {}", e);
        }
    }

    /// Drains pending entries after a shutdown request and syncs the file.
    async fn drain_and_sync_all(&mut self) {
        self.rx.close();
        while let Some(message) = self.rx.recv().await {
            match message {
                AofMessage::Entry(entry) => self.handle_entry(entry).await,
                AofMessage::CompleteRewrite { reply, .. } => {
                    let _ = reply.send(Err(CaradeError::AofError("AOF writer is shutting down".into())));
                }
                AofMessage::Sync { reply } => {
                    let _ = reply.send(Ok(()));
                }
                AofMessage::Shutdown { reply } => {
                    let _ = reply.send(());
                }
                AofMessage::BeginRewrite | AofMessage::AbortRewrite => {}
            }
        }
        if let Err(e) = self.flush_and_sync().await {
            error!("Failed to sync AOF file on shutdown: {}", e);
        }
    }

    async fn finish_rewrite(&mut self, temp_path: &Path, last_db: usize) -> Result<(), CaradeError> {
        let Some(buffered) = self.rewrite_buffer.take() else {
            return Err(CaradeError::AofError("no AOF rewrite in progress".into()));
        };
        let result = self.swap_in(temp_path, last_db, buffered).await;
        if result.is_err() {
            let _ = tokio::fs::remove_file(temp_path).await;
        }
        result
    }

    /// Appends the buffered entries to the rewritten file and renames it over the live log.
    async fn swap_in(
        &mut self,
        temp_path: &Path,
        last_db: usize,
        buffered: Vec<LogEntry>,
    ) -> Result<(), CaradeError> {
        info!(
            "Appending {} buffered entries to the rewritten AOF.",
            buffered.len()
        );
        let mut temp = BufWriter::new(OpenOptions::new().append(true).open(temp_path).await?);
        let mut selected = Some(last_db);
        for entry in &buffered {
            temp.write_all(&encode_entry(entry, &mut selected)?).await?;
        }
        temp.flush().await?;
        temp.get_ref().sync_all().await?;
        drop(temp);

        self.flush_and_sync().await?;
        tokio::fs::rename(temp_path, &self.path).await?;
        self.writer = BufWriter::new(open_append(&self.path).await?);
        self.selected_db = selected;

        let size = tokio::fs::metadata(&self.path).await.map(|m| m.len()).unwrap_or(0);
        self.state
            .persistence
            .aof_last_rewrite_size
            .store(size, Ordering::Relaxed);
        info!(
            "Switched to the rewritten AOF file {} ({} bytes).",
            self.path.display(),
            size
        );
        Ok(())
    }

    /// Writes `bytes`, retrying when the disk is full or not writable.
    async fn write_with_retry(&mut self, bytes: &[u8]) -> Result<(), CaradeError> {
        let mut attempt = 0;
        loop {
            match self.writer.write_all(bytes).await {
                Ok(()) => return Ok(()),
                Err(e)
                    if attempt < AOF_RETRY_ATTEMPTS
                        && matches!(e.kind(), ErrorKind::StorageFull | ErrorKind::PermissionDenied) =>
                {
                    attempt += 1;
                    warn!(
                        "AOF write failed: {}. Retrying in {:?} (Attempt {}/{})",
                        e, AOF_RETRY_DELAY, attempt, AOF_RETRY_ATTEMPTS
                    );
                    tokio::time::sleep(AOF_RETRY_DELAY).await;
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    async fn flush_and_sync(&mut self) -> Result<(), CaradeError> {
        self.writer.flush().await?;
        self.writer.get_ref().sync_all().await?;
        debug!("AOF synced to disk.");
        Ok(())
    }
}

async fn open_append(path: &Path) -> Result<File, CaradeError> {
    Ok(OpenOptions::new().create(true).append(true).open(path).await?)
}
