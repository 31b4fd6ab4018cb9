// src/core/persistence/aof_loader.rs

//! Replays the append-only file into memory when the server starts.

use crate::config::PersistenceConfig;
use crate::core::commands::command_trait::CommandExt;
use crate::core::protocol::RespFrameCodec;
use crate::core::state::ServerState;
use crate::core::storage::context::ExecutionContext;
use crate::core::{CaradeError, Command};
use bytes::BytesMut;
use std::path::Path;
use std::sync::Arc;
use tokio::fs::File as TokioFile;
use tokio::io::{AsyncReadExt, BufReader};
use tokio_util::codec::Decoder;
use tracing::{debug, info, warn};

/// `AofLoader` reads an AOF file and replays the commands to rebuild the keyspace.
pub struct AofLoader {
    config: PersistenceConfig,
}

impl AofLoader {
    pub fn new(config: PersistenceConfig) -> Self {
        Self { config }
    }

    /// Loads the AOF file into `state` and returns how many commands and
    /// transactions were applied.
    ///
    /// Commands run with journaling off, so nothing is logged again and no
    /// waiters are served. A truncated tail ends the replay with a warning.
    pub async fn load_into(&self, state: &Arc<ServerState>) -> Result<usize, CaradeError> {
        if !self.config.aof_enabled {
            return Ok(0);
        }

        let path = Path::new(&self.config.aof_path);
        if !path.exists() {
            info!(
                "AOF file not found at '{}', starting with an empty state.",
                self.config.aof_path
            );
            return Ok(0);
        }

        info!("Loading data from AOF file: {}", self.config.aof_path);
        state.keyspace.set_loading(true);
        let result = self.replay_file(path, state).await;
        state.keyspace.set_loading(false);
        let applied = result?;
        info!("Successfully loaded {} commands/transactions from AOF.", applied);
        Ok(applied)
    }

    async fn replay_file(&self, path: &Path, state: &Arc<ServerState>) -> Result<usize, CaradeError> {
        let mut reader = BufReader::new(TokioFile::open(path).await?);
        let mut buffer = BytesMut::with_capacity(8192);
        let mut codec = RespFrameCodec;
        let mut ctx = ExecutionContext::for_replay(state.clone());
        let mut applied = 0;
        let mut tx_commands: Option<Vec<Command>> = None;

        'read: loop {
            if reader.read_buf(&mut buffer).await? == 0 {
                if !buffer.is_empty() {
                    warn!("AOF file has trailing, incomplete data. Ignoring.");
                }
                break;
            }

            loop {
                let frame = match codec.decode(&mut buffer) {
                    Ok(Some(frame)) => frame,
                    Ok(None) => break,
                    Err(e) => {
                        warn!("AOF file is corrupt after {} entries: {}. Continuing with loaded data.", applied, e);
                        break 'read;
                    }
                };
                let command = match Command::try_from(frame) {
                    Ok(command) => command,
                    Err(e) => {
                        warn!("Skipping unparseable command in AOF file: {}", e);
                        continue;
                    }
                };
                debug!("Loading from AOF, command: {}", command.name());

                match command {
                    Command::Multi(_) => {
                        if tx_commands.replace(Vec::new()).is_some() {
                            warn!("Nested MULTI in AOF file; dropping the open block.");
                        }
                    }
                    Command::Exec(_) => match tx_commands.take() {
                        Some(queued) => {
                            for cmd in &queued {
                                replay(&mut ctx, cmd).await;
                            }
                            applied += 1;
                        }
                        None => warn!("EXEC without MULTI in AOF file. Ignoring."),
                    },
                    Command::Discard(_) => {
                        if tx_commands.take().is_none() {
                            warn!("DISCARD without MULTI in AOF file. Ignoring.");
                        }
                    }
                    cmd => match &mut tx_commands {
                        Some(queued) => queued.push(cmd),
                        None => {
                            replay(&mut ctx, &cmd).await;
                            applied += 1;
                        }
                    },
                }
            }
        }

        if tx_commands.is_some() {
            warn!("AOF file ends with an unclosed MULTI block. The transaction is discarded.");
        }

        Ok(applied)
    }
}

async fn replay(ctx: &mut ExecutionContext, cmd: &Command) {
    if let Err(e) = cmd.execute(ctx).await {
        warn!("Command `{}` from AOF failed during replay: {}", cmd.name(), e);
    }
    // Replay has no waiters or watchers to wake.
    ctx.touched.clear();
}
