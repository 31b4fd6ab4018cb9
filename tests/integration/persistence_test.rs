// tests/integration/persistence_test.rs

//! Integration tests for the append-only file
//! Tests: logging, replay at startup, BGREWRITEAOF and rewrites under concurrent writes

use super::test_helpers::{TestContext, aof_config, bulk, bulk_array};
use bytes::Bytes;
use carade::config::Config;
use carade::core::CaradeError;
use carade::core::RespValue;
use carade::core::persistence::{AofLoader, rewrite_aof};
use carade::core::state::ServerState;
use carade::core::storage::data_types::DataValue;
use std::collections::BTreeMap;
use std::io::Write;
use std::sync::Arc;
use tempfile::TempDir;

type Dump = Vec<BTreeMap<Bytes, (DataValue, Option<u64>)>>;

/// Every live key of every database with its value and absolute deadline.
fn dump(state: &ServerState) -> Dump {
    state
        .keyspace
        .snapshot()
        .into_iter()
        .map(|db| {
            db.into_iter()
                .map(|(key, cell)| (key, (cell.data, cell.expire_at)))
                .collect()
        })
        .collect()
}

/// Builds a fresh server state and replays `config`'s AOF into it.
async fn replay(config: Config) -> Arc<ServerState> {
    let state = ServerState::initialize(config.clone())
        .expect("Failed to initialize server state")
        .state;
    AofLoader::new(config.persistence.clone())
        .load_into(&state)
        .await
        .expect("AOF replay failed");
    state
}

fn aof_text(config: &Config) -> String {
    String::from_utf8_lossy(&std::fs::read(&config.persistence.aof_path).unwrap()).into_owned()
}

#[tokio::test]
async fn test_writes_are_logged_and_reads_are_not() {
    let dir = TempDir::new().unwrap();
    let config = aof_config(dir.path());
    let mut ctx = TestContext::with_config(config.clone()).await;

    ctx.set("a", "1").await.unwrap();
    ctx.get("a").await.unwrap();
    ctx.ok(&["SELECT", "2"]).await;
    ctx.ok(&["RPUSH", "l", "x"]).await;
    // No-op writes leave no trace.
    ctx.ok(&["DEL", "missing"]).await;
    ctx.close_aof().await;

    let text = aof_text(&config);
    assert!(text.starts_with("*2\r\n$6\r\nSELECT\r\n$1\r\n0\r\n"));
    assert!(text.contains("$3\r\nSET\r\n$1\r\na\r\n$1\r\n1\r\n"));
    assert!(text.contains("$6\r\nSELECT\r\n$1\r\n2\r\n"));
    assert!(text.contains("RPUSH"));
    assert!(!text.contains("GET"));
    assert!(!text.contains("DEL"));
}

#[tokio::test]
async fn test_replay_restores_every_type() {
    let dir = TempDir::new().unwrap();
    let config = aof_config(dir.path());
    let mut ctx = TestContext::with_config(config.clone()).await;

    ctx.ok(&["SET", "s", "v", "EX", "1000"]).await;
    ctx.ok(&["INCRBY", "n", "41"]).await;
    ctx.ok(&["INCR", "n"]).await;
    ctx.ok(&["RPUSH", "l", "a", "b", "c"]).await;
    ctx.ok(&["LPOP", "l"]).await;
    ctx.ok(&["HSET", "h", "f1", "v1", "f2", "v2"]).await;
    ctx.ok(&["HDEL", "h", "f1"]).await;
    ctx.ok(&["SADD", "st", "m1", "m2"]).await;
    ctx.ok(&["ZADD", "z", "1.5", "a", "2", "b"]).await;
    ctx.ok(&["ZINCRBY", "z", "10", "a"]).await;
    ctx.ok(&["PFADD", "hll", "x", "y", "z"]).await;
    ctx.ok(&["SET", "gone", "v"]).await;
    ctx.ok(&["RENAME", "gone", "renamed"]).await;
    ctx.ok(&["SELECT", "3"]).await;
    ctx.ok(&["MSET", "k1", "v1", "k2", "v2"]).await;
    ctx.close_aof().await;

    let restored = replay(config).await;
    assert_eq!(dump(&restored), dump(&ctx.state));
}

#[tokio::test]
async fn test_transactions_replay_as_a_block() {
    let dir = TempDir::new().unwrap();
    let config = aof_config(dir.path());
    let mut ctx = TestContext::with_config(config.clone()).await;

    ctx.ok(&["MULTI"]).await;
    ctx.ok(&["SET", "a", "1"]).await;
    ctx.ok(&["SELECT", "1"]).await;
    ctx.ok(&["INCR", "counter"]).await;
    ctx.ok(&["GET", "a"]).await;
    ctx.ok(&["EXEC"]).await;
    ctx.close_aof().await;

    let text = aof_text(&config);
    let multi = text.find("MULTI").expect("MULTI missing");
    let exec = text.find("EXEC").expect("EXEC missing");
    assert!(multi < text.find("counter").unwrap());
    assert!(text.find("counter").unwrap() < exec);
    assert!(!text.contains("GET"));

    let restored = replay(config).await;
    assert_eq!(dump(&restored), dump(&ctx.state));
}

#[tokio::test]
async fn test_truncated_tail_is_ignored() {
    let dir = TempDir::new().unwrap();
    let config = aof_config(dir.path());
    let mut ctx = TestContext::with_config(config.clone()).await;
    ctx.set("kept", "yes").await.unwrap();
    ctx.close_aof().await;

    let mut file = std::fs::OpenOptions::new()
        .append(true)
        .open(&config.persistence.aof_path)
        .unwrap();
    file.write_all(b"*3\r\n$3\r\nSET\r\n$4\r\nlost").unwrap();
    drop(file);

    let restored = replay(config).await;
    let reader = TestContext::for_state(restored);
    assert_eq!(reader.get("kept").await.unwrap(), bulk("yes"));
    assert_eq!(reader.get("lost").await.unwrap(), RespValue::Null);
}

#[tokio::test]
async fn test_unclosed_multi_block_is_discarded() {
    let dir = TempDir::new().unwrap();
    let config = aof_config(dir.path());
    std::fs::write(
        &config.persistence.aof_path,
        b"*2\r\n$6\r\nSELECT\r\n$1\r\n0\r\n*3\r\n$3\r\nSET\r\n$1\r\na\r\n$1\r\n1\r\n*1\r\n$5\r\nMULTI\r\n*3\r\n$3\r\nSET\r\n$1\r\nb\r\n$1\r\n2\r\n",
    )
    .unwrap();

    let restored = replay(config).await;
    let reader = TestContext::for_state(restored);
    assert_eq!(reader.get("a").await.unwrap(), bulk("1"));
    assert_eq!(reader.get("b").await.unwrap(), RespValue::Null);
}

#[tokio::test]
async fn test_expired_keys_stay_expired_after_replay() {
    let dir = TempDir::new().unwrap();
    let config = aof_config(dir.path());
    let mut ctx = TestContext::with_config(config.clone()).await;
    ctx.ok(&["SET", "short", "v", "PX", "40"]).await;
    ctx.ok(&["SET", "long", "v", "EX", "1000"]).await;
    ctx.close_aof().await;

    tokio::time::sleep(std::time::Duration::from_millis(80)).await;
    let restored = replay(config).await;
    let reader = TestContext::for_state(restored);
    assert_eq!(reader.get("short").await.unwrap(), RespValue::Null);
    assert_eq!(reader.get("long").await.unwrap(), bulk("v"));
}

#[tokio::test]
async fn test_write_onto_expired_key_replays_as_fresh_key() {
    let dir = TempDir::new().unwrap();
    let config = aof_config(dir.path());
    let mut ctx = TestContext::with_config(config.clone()).await;
    ctx.rpush("k", &["a"]).await.unwrap();
    ctx.ok(&["PEXPIRE", "k", "50"]).await;
    tokio::time::sleep(std::time::Duration::from_millis(120)).await;

    ctx.lpush("k", &["x"]).await.unwrap();
    assert_eq!(ctx.lrange("k", 0, -1).await.unwrap(), bulk_array(&["x"]));
    ctx.close_aof().await;
    assert!(aof_text(&config).contains("$3\r\nDEL\r\n$1\r\nk\r\n"));

    let restored = replay(config).await;
    let reader = TestContext::for_state(restored.clone());
    assert_eq!(reader.lrange("k", 0, -1).await.unwrap(), bulk_array(&["x"]));
    assert_eq!(reader.ok(&["PTTL", "k"]).await, RespValue::Integer(-1));
    assert_eq!(dump(&restored), dump(&ctx.state));
}

#[tokio::test]
async fn test_read_that_expires_a_key_is_logged() {
    let dir = TempDir::new().unwrap();
    let config = aof_config(dir.path());
    let mut ctx = TestContext::with_config(config.clone()).await;
    ctx.rpush("k", &["a", "b"]).await.unwrap();
    ctx.ok(&["PEXPIRE", "k", "50"]).await;
    tokio::time::sleep(std::time::Duration::from_millis(120)).await;

    // The read removes the key; the push then finds nothing to drop.
    assert_eq!(ctx.ok(&["LLEN", "k"]).await, RespValue::Integer(0));
    ctx.rpush("k", &["c"]).await.unwrap();
    ctx.close_aof().await;

    let restored = replay(config).await;
    let reader = TestContext::for_state(restored);
    assert_eq!(reader.lrange("k", 0, -1).await.unwrap(), bulk_array(&["c"]));
}

#[tokio::test]
async fn test_rewrite_compacts_and_preserves_data() {
    let dir = TempDir::new().unwrap();
    let config = aof_config(dir.path());
    let mut ctx = TestContext::with_config(config.clone()).await;

    for i in 0..200 {
        ctx.ok(&["INCR", "counter"]).await;
        ctx.ok(&["RPUSH", "l", &i.to_string()]).await;
    }
    ctx.ok(&["LPOP", "l", "150"]).await;
    ctx.ok(&["ZADD", "z", "3", "c", "1", "a"]).await;
    ctx.ok(&["SELECT", "1"]).await;
    ctx.ok(&["HSET", "h", "f", "v"]).await;
    ctx.sync_aof().await;
    let before = std::fs::metadata(&config.persistence.aof_path).unwrap().len();

    rewrite_aof(ctx.state.clone()).await.expect("rewrite failed");
    ctx.sync_aof().await;
    let after = std::fs::metadata(&config.persistence.aof_path).unwrap().len();
    assert!(after < before, "rewrite did not shrink the file: {before} -> {after}");

    // Writes after the swap land in the new file.
    ctx.ok(&["SET", "post", "rewrite"]).await;
    ctx.close_aof().await;

    let restored = replay(config).await;
    assert_eq!(dump(&restored), dump(&ctx.state));
}

#[tokio::test]
async fn test_rewrite_under_concurrent_mutations() {
    let dir = TempDir::new().unwrap();
    let config = aof_config(dir.path());
    let mut ctx = TestContext::with_config(config.clone()).await;

    for i in 0..100 {
        ctx.ok(&["SET", &format!("seed:{i}"), "x"]).await;
    }

    let mut writers = Vec::new();
    for w in 0..10 {
        let client = ctx.new_client();
        writers.push(tokio::spawn(async move {
            for i in 0..100 {
                let n = i.to_string();
                let args: Vec<String> = match i % 5 {
                    0 => vec!["INCR".into(), format!("counter:{w}")],
                    1 => vec!["RPUSH".into(), format!("list:{w}"), n],
                    2 => vec!["ZADD".into(), "scores".into(), n.clone(), format!("m{w}:{n}")],
                    3 => vec!["HSET".into(), format!("hash:{}", i % 7), format!("f{w}"), n],
                    _ => vec!["DEL".into(), format!("seed:{}", w * 10 + i / 10)],
                };
                let args: Vec<&str> = args.iter().map(String::as_str).collect();
                client.ok(&args).await;
                tokio::task::yield_now().await;
            }
        }));
    }

    let rewrite = tokio::spawn(rewrite_aof(ctx.state.clone()));
    for writer in writers {
        writer.await.unwrap();
    }
    rewrite.await.unwrap().expect("rewrite failed");
    ctx.close_aof().await;

    let restored = replay(config).await;
    assert_eq!(dump(&restored), dump(&ctx.state));
}

#[tokio::test]
async fn test_second_rewrite_is_refused_while_one_runs() {
    let dir = TempDir::new().unwrap();
    let config = aof_config(dir.path());
    let mut ctx = TestContext::with_config(config).await;
    ctx.set("k", "v").await.unwrap();

    ctx.state
        .persistence
        .rewrite_in_progress
        .store(true, std::sync::atomic::Ordering::Release);
    let err = ctx.exec_args(&["BGREWRITEAOF"]).await.unwrap_err();
    assert!(matches!(err, CaradeError::RewriteInProgress));
    ctx.state
        .persistence
        .rewrite_in_progress
        .store(false, std::sync::atomic::Ordering::Release);

    let reply = ctx.ok(&["BGREWRITEAOF"]).await;
    assert_eq!(
        reply,
        RespValue::SimpleString("Background append only file rewriting started".into())
    );
    if let Some(handle) = ctx.state.persistence.take_rewrite_handle() {
        handle.await.unwrap();
    }
    ctx.close_aof().await;
}

#[tokio::test]
async fn test_bgrewriteaof_without_aof_is_an_error() {
    let ctx = TestContext::new().await;
    assert!(ctx.exec_args(&["BGREWRITEAOF"]).await.is_err());
}

#[tokio::test]
async fn test_served_blocking_pop_is_logged() {
    let dir = TempDir::new().unwrap();
    let config = aof_config(dir.path());
    let mut ctx = TestContext::with_config(config.clone()).await;
    let waiter = Arc::new(ctx.new_client());

    let pending = {
        let waiter = waiter.clone();
        tokio::spawn(async move { waiter.blpop(&["q"], 2.0).await })
    };
    let key = Bytes::from_static(b"q");
    while ctx.state.blocker_manager.waiter_count(0, &key) == 0 {
        tokio::task::yield_now().await;
    }
    ctx.rpush("q", &["a", "b"]).await.unwrap();
    assert_eq!(pending.await.unwrap().unwrap(), bulk_array(&["q", "a"]));
    ctx.close_aof().await;

    let restored = replay(config).await;
    assert_eq!(dump(&restored), dump(&ctx.state));
}
