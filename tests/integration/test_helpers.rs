// tests/integration/test_helpers.rs

//! Test helpers and utilities for integration tests

use bytes::Bytes;
use carade::config::Config;
use carade::connection::SessionState;
use carade::core::CaradeError;
use carade::core::Command;
use carade::core::RespValue;
use carade::core::handler::command_router::{RouteResponse, Router};
use carade::core::persistence::AofWriterTask;
use carade::core::protocol::RespFrame;
use carade::core::state::ServerState;
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, reload};

static NEXT_SESSION_ID: AtomicU64 = AtomicU64::new(1);

/// TestContext is one client session against a real, in-process server state.
///
/// Commands go through the same `Router` a connection uses, so gate selection,
/// transactions, watches and blocking all behave as they do over the wire.
pub struct TestContext {
    pub state: Arc<ServerState>,
    pub session_id: u64,
    session: Mutex<SessionState>,
    #[allow(dead_code)]
    pub aof_task: Option<JoinHandle<Result<(), CaradeError>>>,
}

impl TestContext {
    /// Creates a new test context with default configuration and AOF disabled.
    pub async fn new() -> Self {
        let mut config = Config::default();
        config.databases = 4;
        config.persistence.aof_enabled = false;
        Self::with_config(config).await
    }

    /// Creates a new test context with custom configuration.
    ///
    /// When AOF is enabled the writer task is started, but no replay happens.
    pub async fn with_config(config: Config) -> Self {
        init_tracing();

        let server_init = ServerState::initialize(config).expect("Failed to initialize server state");
        let state = server_init.state;
        let aof_task = match server_init.aof_rx {
            Some(rx) => {
                let writer = AofWriterTask::new(state.clone(), rx)
                    .await
                    .expect("Failed to open AOF file");
                Some(tokio::spawn(writer.run()))
            }
            None => None,
        };

        Self {
            state,
            session_id: NEXT_SESSION_ID.fetch_add(1, Ordering::Relaxed),
            session: Mutex::new(SessionState::new()),
            aof_task,
        }
    }

    /// Opens another client session on the same server state.
    pub fn new_client(&self) -> Self {
        Self::for_state(self.state.clone())
    }

    /// Opens a client session on an existing state, such as one rebuilt by replay.
    pub fn for_state(state: Arc<ServerState>) -> Self {
        Self {
            state,
            session_id: NEXT_SESSION_ID.fetch_add(1, Ordering::Relaxed),
            session: Mutex::new(SessionState::new()),
            aof_task: None,
        }
    }

    /// Executes a parsed command and returns the reply.
    pub async fn execute(&self, command: Command) -> Result<RespValue, CaradeError> {
        let mut session = self.session.lock().await;
        let addr: SocketAddr = ([127, 0, 0, 1], 50_000).into();
        let mut router = Router::new(self.state.clone(), self.session_id, addr, &mut *session);
        match router.route(command).await {
            Ok(RouteResponse::Single(reply)) | Ok(RouteResponse::Close(reply)) => Ok(reply),
            Err(e) => {
                // A connection marks the open transaction failed the same way.
                session.mark_transaction_error();
                Err(e)
            }
        }
    }

    /// Parses `args` as a client would send them and executes the command.
    pub async fn exec_args(&self, args: &[&str]) -> Result<RespValue, CaradeError> {
        let frame = RespFrame::from_args(args.iter().map(|a| Bytes::copy_from_slice(a.as_bytes())));
        let command = match Command::try_from(frame) {
            Ok(command) => command,
            Err(e) => {
                self.session.lock().await.mark_transaction_error();
                return Err(e);
            }
        };
        self.execute(command).await
    }

    /// Like `exec_args`, but panics on an error reply.
    pub async fn ok(&self, args: &[&str]) -> RespValue {
        match self.exec_args(args).await {
            Ok(reply) => reply,
            Err(e) => panic!("{:?} failed: {}", args, e),
        }
    }

    #[allow(dead_code)]
    pub async fn current_db(&self) -> usize {
        self.session.lock().await.current_db_index
    }

    /// Helper to execute a SET command
    #[allow(dead_code)]
    pub async fn set(&self, key: &str, value: &str) -> Result<RespValue, CaradeError> {
        self.exec_args(&["SET", key, value]).await
    }

    /// Helper to execute a GET command
    #[allow(dead_code)]
    pub async fn get(&self, key: &str) -> Result<RespValue, CaradeError> {
        self.exec_args(&["GET", key]).await
    }

    /// Helper to execute an LPUSH command
    #[allow(dead_code)]
    pub async fn lpush(&self, key: &str, values: &[&str]) -> Result<RespValue, CaradeError> {
        let mut args = vec!["LPUSH", key];
        args.extend_from_slice(values);
        self.exec_args(&args).await
    }

    /// Helper to execute an RPUSH command
    #[allow(dead_code)]
    pub async fn rpush(&self, key: &str, values: &[&str]) -> Result<RespValue, CaradeError> {
        let mut args = vec!["RPUSH", key];
        args.extend_from_slice(values);
        self.exec_args(&args).await
    }

    /// Helper to execute an LRANGE command
    #[allow(dead_code)]
    pub async fn lrange(&self, key: &str, start: i64, stop: i64) -> Result<RespValue, CaradeError> {
        let (start, stop) = (start.to_string(), stop.to_string());
        self.exec_args(&["LRANGE", key, &start, &stop]).await
    }

    /// Helper to execute a BLPOP command with a timeout in seconds
    #[allow(dead_code)]
    pub async fn blpop(&self, keys: &[&str], timeout: f64) -> Result<RespValue, CaradeError> {
        let timeout = timeout.to_string();
        let mut args = vec!["BLPOP"];
        args.extend_from_slice(keys);
        args.push(&timeout);
        self.exec_args(&args).await
    }

    /// Waits until the AOF writer has flushed and synced everything sent so far.
    #[allow(dead_code)]
    pub async fn sync_aof(&self) {
        if let Some(aof) = &self.state.aof {
            aof.sync().await.expect("AOF sync failed");
        }
    }

    /// Stops the AOF writer after a final drain.
    #[allow(dead_code)]
    pub async fn close_aof(&mut self) {
        if let Some(aof) = &self.state.aof {
            aof.close().await;
        }
        if let Some(task) = self.aof_task.take() {
            task.await.expect("AOF writer panicked").expect("AOF writer failed");
        }
    }
}

fn init_tracing() {
    let env_filter = EnvFilter::new("warn");
    let (filter, _reload_handle) = reload::Layer::new(env_filter);

    // Ignore the error when another test already installed a subscriber.
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_test_writer())
        .try_init();
}

/// Shorthand for a bulk string reply.
#[allow(dead_code)]
pub fn bulk(s: &str) -> RespValue {
    RespValue::BulkString(Bytes::copy_from_slice(s.as_bytes()))
}

/// Shorthand for an array of bulk strings.
#[allow(dead_code)]
pub fn bulk_array(items: &[&str]) -> RespValue {
    RespValue::Array(items.iter().map(|s| bulk(s)).collect())
}

/// Builds an AOF-enabled config writing under `dir`.
#[allow(dead_code)]
pub fn aof_config(dir: &std::path::Path) -> Config {
    let mut config = Config::default();
    config.databases = 4;
    config.persistence.aof_enabled = true;
    config.persistence.aof_path = dir.join("appendonly.aof").to_string_lossy().into_owned();
    config.persistence.appendfsync = carade::config::AppendFsync::Always;
    config
}
