// tests/integration/string_commands_test.rs

//! Integration tests for string and generic key commands
//! Tests: GET, SET, MSET, INCR/DECR family, DEL, EXISTS, TYPE, RENAME, KEYS, SELECT, expiry, DUMP/RESTORE

use super::test_helpers::{TestContext, bulk, bulk_array};
use bytes::Bytes;
use carade::core::CaradeError;
use carade::core::Command;
use carade::core::RespValue;
use carade::core::protocol::RespFrame;
use std::time::Duration;

// ===== SET / GET =====

#[tokio::test]
async fn test_set_then_get() {
    let ctx = TestContext::new().await;
    assert_eq!(ctx.set("greeting", "hello").await.unwrap(), RespValue::ok());
    assert_eq!(ctx.get("greeting").await.unwrap(), bulk("hello"));
    assert_eq!(ctx.get("missing").await.unwrap(), RespValue::Null);
}

#[tokio::test]
async fn test_set_nx_and_xx() {
    let ctx = TestContext::new().await;

    assert_eq!(ctx.ok(&["SET", "k", "v1", "XX"]).await, RespValue::Null);
    assert_eq!(ctx.ok(&["SET", "k", "v1", "NX"]).await, RespValue::ok());
    assert_eq!(ctx.ok(&["SET", "k", "v2", "NX"]).await, RespValue::Null);
    assert_eq!(ctx.ok(&["SET", "k", "v3", "XX"]).await, RespValue::ok());
    assert_eq!(ctx.get("k").await.unwrap(), bulk("v3"));
}

#[tokio::test]
async fn test_set_get_option_returns_old_value() {
    let ctx = TestContext::new().await;
    assert_eq!(ctx.ok(&["SET", "k", "a", "GET"]).await, RespValue::Null);
    assert_eq!(ctx.ok(&["SET", "k", "b", "GET"]).await, bulk("a"));
    assert_eq!(ctx.get("k").await.unwrap(), bulk("b"));
}

#[tokio::test]
async fn test_get_on_wrong_type() {
    let ctx = TestContext::new().await;
    ctx.lpush("list", &["x"]).await.unwrap();
    let err = ctx.get("list").await.unwrap_err();
    assert!(matches!(err, CaradeError::WrongType));
}

#[tokio::test]
async fn test_mset_sets_every_pair() {
    let ctx = TestContext::new().await;
    assert_eq!(ctx.ok(&["MSET", "a", "1", "b", "2"]).await, RespValue::ok());
    assert_eq!(ctx.get("a").await.unwrap(), bulk("1"));
    assert_eq!(ctx.get("b").await.unwrap(), bulk("2"));

    let err = ctx.exec_args(&["MSET", "a", "1", "b"]).await.unwrap_err();
    assert!(matches!(err, CaradeError::WrongArgumentCount(_)));
}

// ===== Counters =====

#[tokio::test]
async fn test_incr_family() {
    let ctx = TestContext::new().await;
    assert_eq!(ctx.ok(&["INCR", "n"]).await, RespValue::Integer(1));
    assert_eq!(ctx.ok(&["INCRBY", "n", "10"]).await, RespValue::Integer(11));
    assert_eq!(ctx.ok(&["DECR", "n"]).await, RespValue::Integer(10));
    assert_eq!(ctx.ok(&["DECRBY", "n", "15"]).await, RespValue::Integer(-5));
    assert_eq!(ctx.get("n").await.unwrap(), bulk("-5"));
}

#[tokio::test]
async fn test_incr_rejects_non_integer_values() {
    let ctx = TestContext::new().await;
    ctx.set("s", "abc").await.unwrap();
    let err = ctx.exec_args(&["INCR", "s"]).await.unwrap_err();
    assert!(matches!(err, CaradeError::NotAnInteger));
    assert_eq!(ctx.get("s").await.unwrap(), bulk("abc"));
}

#[tokio::test]
async fn test_incr_overflow_is_an_error() {
    let ctx = TestContext::new().await;
    ctx.set("n", &i64::MAX.to_string()).await.unwrap();
    let err = ctx.exec_args(&["INCR", "n"]).await.unwrap_err();
    assert!(matches!(err, CaradeError::Overflow));
    assert_eq!(ctx.get("n").await.unwrap(), bulk(&i64::MAX.to_string()));
}

#[tokio::test]
async fn test_incr_keeps_existing_ttl() {
    let ctx = TestContext::new().await;
    ctx.ok(&["SET", "n", "1", "EX", "100"]).await;
    ctx.ok(&["INCR", "n"]).await;
    match ctx.ok(&["TTL", "n"]).await {
        RespValue::Integer(ttl) => assert!((99..=100).contains(&ttl)),
        other => panic!("Expected integer TTL, got {:?}", other),
    }
}

// ===== Generic key commands =====

#[tokio::test]
async fn test_del_and_exists_count_keys() {
    let ctx = TestContext::new().await;
    ctx.set("a", "1").await.unwrap();
    ctx.set("b", "2").await.unwrap();
    assert_eq!(ctx.ok(&["EXISTS", "a", "b", "a", "c"]).await, RespValue::Integer(3));
    assert_eq!(ctx.ok(&["DEL", "a", "c"]).await, RespValue::Integer(1));
    assert_eq!(ctx.ok(&["EXISTS", "a"]).await, RespValue::Integer(0));
}

#[tokio::test]
async fn test_type_reports_each_kind() {
    let ctx = TestContext::new().await;
    ctx.set("s", "v").await.unwrap();
    ctx.lpush("l", &["v"]).await.unwrap();
    ctx.ok(&["HSET", "h", "f", "v"]).await;
    ctx.ok(&["SADD", "st", "m"]).await;
    ctx.ok(&["ZADD", "z", "1", "m"]).await;

    for (key, kind) in [("s", "string"), ("l", "list"), ("h", "hash"), ("st", "set"), ("z", "zset"), ("none", "none")] {
        assert_eq!(
            ctx.ok(&["TYPE", key]).await,
            RespValue::SimpleString(kind.into()),
            "TYPE {key}"
        );
    }
}

#[tokio::test]
async fn test_rename_moves_value_and_ttl() {
    let ctx = TestContext::new().await;
    ctx.ok(&["SET", "src", "v", "EX", "100"]).await;
    ctx.set("dst", "old").await.unwrap();

    assert_eq!(ctx.ok(&["RENAME", "src", "dst"]).await, RespValue::ok());
    assert_eq!(ctx.get("src").await.unwrap(), RespValue::Null);
    assert_eq!(ctx.get("dst").await.unwrap(), bulk("v"));
    assert!(matches!(ctx.ok(&["TTL", "dst"]).await, RespValue::Integer(t) if t > 0));

    let err = ctx.exec_args(&["RENAME", "missing", "x"]).await.unwrap_err();
    assert!(matches!(err, CaradeError::KeyNotFound));
}

#[tokio::test]
async fn test_keys_matches_glob_patterns() {
    let ctx = TestContext::new().await;
    for key in ["user:1", "user:2", "order:1"] {
        ctx.set(key, "x").await.unwrap();
    }
    let RespValue::Array(items) = ctx.ok(&["KEYS", "user:*"]).await else {
        panic!("Expected array from KEYS");
    };
    let mut keys: Vec<RespValue> = items;
    keys.sort_by_key(|v| format!("{:?}", v));
    assert_eq!(keys, vec![bulk("user:1"), bulk("user:2")]);
}

#[tokio::test]
async fn test_select_isolates_databases() {
    let ctx = TestContext::new().await;
    ctx.set("k", "db0").await.unwrap();
    assert_eq!(ctx.ok(&["SELECT", "1"]).await, RespValue::ok());
    assert_eq!(ctx.current_db().await, 1);
    assert_eq!(ctx.get("k").await.unwrap(), RespValue::Null);
    assert_eq!(ctx.ok(&["DBSIZE"]).await, RespValue::Integer(0));

    let err = ctx.exec_args(&["SELECT", "99"]).await.unwrap_err();
    assert!(matches!(err, CaradeError::DbIndexOutOfRange));
    assert_eq!(ctx.current_db().await, 1);
}

#[tokio::test]
async fn test_flushdb_and_flushall() {
    let ctx = TestContext::new().await;
    ctx.set("a", "1").await.unwrap();
    ctx.ok(&["SELECT", "1"]).await;
    ctx.set("b", "1").await.unwrap();

    ctx.ok(&["FLUSHDB"]).await;
    assert_eq!(ctx.ok(&["DBSIZE"]).await, RespValue::Integer(0));
    ctx.ok(&["SELECT", "0"]).await;
    assert_eq!(ctx.ok(&["DBSIZE"]).await, RespValue::Integer(1));

    ctx.ok(&["FLUSHALL"]).await;
    assert_eq!(ctx.ok(&["DBSIZE"]).await, RespValue::Integer(0));
}

// ===== Expiry =====

#[tokio::test]
async fn test_ttl_states() {
    let ctx = TestContext::new().await;
    assert_eq!(ctx.ok(&["TTL", "missing"]).await, RespValue::Integer(-2));
    ctx.set("k", "v").await.unwrap();
    assert_eq!(ctx.ok(&["TTL", "k"]).await, RespValue::Integer(-1));
    assert_eq!(ctx.ok(&["EXPIRE", "k", "50"]).await, RespValue::Integer(1));
    assert!(matches!(ctx.ok(&["PTTL", "k"]).await, RespValue::Integer(ms) if ms > 49_000 && ms <= 50_000));
    assert_eq!(ctx.ok(&["PERSIST", "k"]).await, RespValue::Integer(1));
    assert_eq!(ctx.ok(&["TTL", "k"]).await, RespValue::Integer(-1));
    assert_eq!(ctx.ok(&["EXPIRE", "missing", "5"]).await, RespValue::Integer(0));
}

#[tokio::test]
async fn test_key_expires_after_pexpire() {
    let ctx = TestContext::new().await;
    ctx.set("k", "v").await.unwrap();
    ctx.ok(&["PEXPIRE", "k", "50"]).await;
    tokio::time::sleep(Duration::from_millis(80)).await;
    assert_eq!(ctx.get("k").await.unwrap(), RespValue::Null);
    assert_eq!(ctx.ok(&["EXISTS", "k"]).await, RespValue::Integer(0));
}

#[tokio::test]
async fn test_non_positive_expire_deletes_the_key() {
    let ctx = TestContext::new().await;
    ctx.set("k", "v").await.unwrap();
    assert_eq!(ctx.ok(&["EXPIRE", "k", "0"]).await, RespValue::Integer(1));
    assert_eq!(ctx.ok(&["EXISTS", "k"]).await, RespValue::Integer(0));

    ctx.set("k2", "v").await.unwrap();
    assert_eq!(ctx.ok(&["PEXPIREAT", "k2", "1"]).await, RespValue::Integer(1));
    assert_eq!(ctx.get("k2").await.unwrap(), RespValue::Null);
}

#[tokio::test]
async fn test_plain_set_clears_ttl() {
    let ctx = TestContext::new().await;
    ctx.ok(&["SET", "k", "v", "PX", "100000"]).await;
    ctx.set("k", "w").await.unwrap();
    assert_eq!(ctx.ok(&["TTL", "k"]).await, RespValue::Integer(-1));

    ctx.ok(&["SET", "k", "x", "EX", "100"]).await;
    ctx.ok(&["SET", "k", "y", "KEEPTTL"]).await;
    assert!(matches!(ctx.ok(&["TTL", "k"]).await, RespValue::Integer(t) if t > 0));
}

// ===== DUMP / RESTORE =====

fn restore_command(key: &str, payload: Bytes) -> Command {
    Command::try_from(RespFrame::from_args([
        Bytes::from_static(b"RESTORE"),
        Bytes::copy_from_slice(key.as_bytes()),
        Bytes::from_static(b"0"),
        payload,
    ]))
    .unwrap()
}

#[tokio::test]
async fn test_dump_restore_roundtrip_through_commands() {
    let ctx = TestContext::new().await;
    ctx.ok(&["ZADD", "z", "1", "a", "2.5", "b"]).await;

    let RespValue::BulkString(payload) = ctx.ok(&["DUMP", "z"]).await else {
        panic!("Expected bulk payload from DUMP");
    };
    assert_eq!(ctx.ok(&["DUMP", "missing"]).await, RespValue::Null);

    let reply = ctx.execute(restore_command("z2", payload.clone())).await.unwrap();
    assert_eq!(reply, RespValue::ok());
    assert_eq!(
        ctx.ok(&["ZRANGE", "z2", "0", "-1", "WITHSCORES"]).await,
        bulk_array(&["a", "1", "b", "2.5"])
    );

    let err = ctx.execute(restore_command("z2", payload)).await.unwrap_err();
    assert!(matches!(err, CaradeError::BusyKey));
}

#[tokio::test]
async fn test_restore_rejects_corrupt_payload() {
    let ctx = TestContext::new().await;
    let err = ctx.exec_args(&["RESTORE", "k", "0", "garbage"]).await.unwrap_err();
    assert!(matches!(err, CaradeError::BadDumpPayload));
}

#[tokio::test]
async fn test_ping_and_echo() {
    let ctx = TestContext::new().await;
    assert_eq!(ctx.ok(&["PING"]).await, RespValue::SimpleString("PONG".into()));
    assert_eq!(ctx.ok(&["PING", "hi"]).await, bulk("hi"));
    assert_eq!(ctx.ok(&["ECHO", "hey"]).await, bulk("hey"));
}

#[tokio::test]
async fn test_unknown_command() {
    let ctx = TestContext::new().await;
    let err = ctx.exec_args(&["NOSUCHCMD", "x"]).await.unwrap_err();
    assert!(matches!(err, CaradeError::UnknownCommand(name) if name == "NOSUCHCMD"));
}
