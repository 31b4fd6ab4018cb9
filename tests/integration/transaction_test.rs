// tests/integration/transaction_test.rs

//! Integration tests for transaction commands
//! Tests: MULTI, EXEC, DISCARD, WATCH, UNWATCH

use super::test_helpers::{TestContext, bulk};
use carade::core::CaradeError;
use carade::core::RespValue;

// ===== MULTI/EXEC Basic Tests =====

#[tokio::test]
async fn test_multi_exec_empty_transaction() {
    let ctx = TestContext::new().await;
    assert_eq!(ctx.ok(&["MULTI"]).await, RespValue::ok());
    assert_eq!(ctx.ok(&["EXEC"]).await, RespValue::Array(vec![]));
}

#[tokio::test]
async fn test_commands_are_queued_then_run_in_order() {
    let ctx = TestContext::new().await;
    ctx.ok(&["MULTI"]).await;
    assert_eq!(ctx.ok(&["SET", "a", "1"]).await, RespValue::SimpleString("QUEUED".into()));
    assert_eq!(ctx.ok(&["INCR", "a"]).await, RespValue::SimpleString("QUEUED".into()));
    assert_eq!(ctx.ok(&["GET", "a"]).await, RespValue::SimpleString("QUEUED".into()));

    // Nothing ran yet.
    let other = ctx.new_client();
    assert_eq!(other.get("a").await.unwrap(), RespValue::Null);

    let result = ctx.ok(&["EXEC"]).await;
    assert_eq!(
        result,
        RespValue::Array(vec![RespValue::ok(), RespValue::Integer(2), bulk("2")])
    );
    assert_eq!(other.get("a").await.unwrap(), bulk("2"));
}

#[tokio::test]
async fn test_runtime_error_does_not_roll_back() {
    let ctx = TestContext::new().await;
    ctx.set("s", "text").await.unwrap();

    ctx.ok(&["MULTI"]).await;
    ctx.ok(&["SET", "a", "1"]).await;
    ctx.ok(&["INCR", "s"]).await;
    ctx.ok(&["SET", "b", "2"]).await;
    let RespValue::Array(replies) = ctx.ok(&["EXEC"]).await else {
        panic!("Expected array from EXEC");
    };

    assert_eq!(replies.len(), 3);
    assert_eq!(replies[0], RespValue::ok());
    assert!(matches!(&replies[1], RespValue::Error(msg) if msg.contains("not an integer")));
    assert_eq!(replies[2], RespValue::ok());
    assert_eq!(ctx.get("a").await.unwrap(), bulk("1"));
    assert_eq!(ctx.get("b").await.unwrap(), bulk("2"));
}

#[tokio::test]
async fn test_select_inside_transaction_applies_in_order() {
    let ctx = TestContext::new().await;
    ctx.ok(&["MULTI"]).await;
    ctx.ok(&["SET", "k", "db0"]).await;
    ctx.ok(&["SELECT", "2"]).await;
    ctx.ok(&["SET", "k", "db2"]).await;
    ctx.ok(&["EXEC"]).await;

    assert_eq!(ctx.current_db().await, 2);
    assert_eq!(ctx.get("k").await.unwrap(), bulk("db2"));
    ctx.ok(&["SELECT", "0"]).await;
    assert_eq!(ctx.get("k").await.unwrap(), bulk("db0"));
}

// ===== Queue-time errors =====

#[tokio::test]
async fn test_queue_error_aborts_exec() {
    let ctx = TestContext::new().await;
    ctx.ok(&["MULTI"]).await;
    ctx.ok(&["SET", "a", "1"]).await;
    assert!(ctx.exec_args(&["GET"]).await.is_err());

    let err = ctx.exec_args(&["EXEC"]).await.unwrap_err();
    assert!(matches!(err, CaradeError::ExecAborted));
    assert_eq!(ctx.get("a").await.unwrap(), RespValue::Null);

    // The session is out of the transaction afterwards.
    assert_eq!(ctx.set("a", "2").await.unwrap(), RespValue::ok());
}

#[tokio::test]
async fn test_unknown_command_in_multi_aborts_exec() {
    let ctx = TestContext::new().await;
    ctx.ok(&["MULTI"]).await;
    assert!(ctx.exec_args(&["NOPE"]).await.is_err());
    assert!(matches!(
        ctx.exec_args(&["EXEC"]).await.unwrap_err(),
        CaradeError::ExecAborted
    ));
}

#[tokio::test]
async fn test_nested_multi() {
    let ctx = TestContext::new().await;
    ctx.ok(&["MULTI"]).await;
    let err = ctx.exec_args(&["MULTI"]).await.unwrap_err();
    assert!(matches!(err, CaradeError::InvalidState(msg) if msg.contains("nested")));
    assert!(matches!(
        ctx.exec_args(&["EXEC"]).await.unwrap_err(),
        CaradeError::ExecAborted
    ));
}

#[tokio::test]
async fn test_watch_inside_multi_is_an_error() {
    let ctx = TestContext::new().await;
    ctx.ok(&["MULTI"]).await;
    let err = ctx.exec_args(&["WATCH", "k"]).await.unwrap_err();
    assert!(matches!(err, CaradeError::InvalidState(_)));
}

// ===== DISCARD Tests =====

#[tokio::test]
async fn test_discard_drops_the_queue() {
    let ctx = TestContext::new().await;
    ctx.ok(&["MULTI"]).await;
    ctx.ok(&["SET", "a", "1"]).await;
    assert_eq!(ctx.ok(&["DISCARD"]).await, RespValue::ok());
    assert_eq!(ctx.get("a").await.unwrap(), RespValue::Null);
}

#[tokio::test]
async fn test_discard_without_multi() {
    let ctx = TestContext::new().await;
    let err = ctx.exec_args(&["DISCARD"]).await.unwrap_err();
    assert!(matches!(err, CaradeError::InvalidState(msg) if msg.contains("DISCARD without MULTI")));
}

#[tokio::test]
async fn test_exec_without_multi() {
    let ctx = TestContext::new().await;
    let err = ctx.exec_args(&["EXEC"]).await.unwrap_err();
    match err {
        CaradeError::InvalidState(msg) => assert!(msg.contains("EXEC without MULTI")),
        other => panic!("Expected InvalidState error, got {:?}", other),
    }
}

// ===== WATCH Tests =====

#[tokio::test]
async fn test_watched_key_modified_by_other_client_aborts() {
    let ctx = TestContext::new().await;
    let other = ctx.new_client();
    ctx.set("balance", "10").await.unwrap();

    ctx.ok(&["WATCH", "balance"]).await;
    other.set("balance", "20").await.unwrap();

    ctx.ok(&["MULTI"]).await;
    ctx.ok(&["SET", "balance", "30"]).await;
    assert_eq!(ctx.ok(&["EXEC"]).await, RespValue::NullArray);
    assert_eq!(ctx.get("balance").await.unwrap(), bulk("20"));
}

#[tokio::test]
async fn test_watch_dirty_even_when_value_is_unchanged() {
    let ctx = TestContext::new().await;
    let other = ctx.new_client();
    ctx.set("k", "same").await.unwrap();

    ctx.ok(&["WATCH", "k"]).await;
    other.set("k", "same").await.unwrap();

    ctx.ok(&["MULTI"]).await;
    ctx.ok(&["GET", "k"]).await;
    assert_eq!(ctx.ok(&["EXEC"]).await, RespValue::NullArray);
}

#[tokio::test]
async fn test_untouched_watch_lets_exec_run() {
    let ctx = TestContext::new().await;
    let other = ctx.new_client();
    ctx.ok(&["WATCH", "k"]).await;
    other.set("unrelated", "x").await.unwrap();
    // Reads never dirty a watch.
    other.get("k").await.unwrap();

    ctx.ok(&["MULTI"]).await;
    ctx.ok(&["SET", "k", "mine"]).await;
    assert_eq!(ctx.ok(&["EXEC"]).await, RespValue::Array(vec![RespValue::ok()]));
}

#[tokio::test]
async fn test_watch_same_key_in_other_db_is_independent() {
    let ctx = TestContext::new().await;
    let other = ctx.new_client();
    ctx.ok(&["WATCH", "k"]).await;
    other.ok(&["SELECT", "1"]).await;
    other.set("k", "x").await.unwrap();

    ctx.ok(&["MULTI"]).await;
    ctx.ok(&["PING"]).await;
    assert!(matches!(ctx.ok(&["EXEC"]).await, RespValue::Array(_)));
}

#[tokio::test]
async fn test_unwatch_clears_dirty_state() {
    let ctx = TestContext::new().await;
    let other = ctx.new_client();
    ctx.ok(&["WATCH", "k"]).await;
    other.set("k", "x").await.unwrap();
    assert_eq!(ctx.ok(&["UNWATCH"]).await, RespValue::ok());

    ctx.ok(&["MULTI"]).await;
    ctx.ok(&["GET", "k"]).await;
    assert_eq!(ctx.ok(&["EXEC"]).await, RespValue::Array(vec![bulk("x")]));
}

#[tokio::test]
async fn test_exec_clears_watches() {
    let ctx = TestContext::new().await;
    let other = ctx.new_client();
    ctx.ok(&["WATCH", "k"]).await;
    ctx.ok(&["MULTI"]).await;
    ctx.ok(&["EXEC"]).await;
    assert_eq!(ctx.state.watches.watched_key_count(), 0);

    // A later write does not affect the next transaction.
    other.set("k", "x").await.unwrap();
    ctx.ok(&["MULTI"]).await;
    assert_eq!(ctx.ok(&["EXEC"]).await, RespValue::Array(vec![]));
}

#[tokio::test]
async fn test_expiry_of_watched_key_dirties_the_watch() {
    let ctx = TestContext::new().await;
    let other = ctx.new_client();
    ctx.ok(&["SET", "k", "v", "PX", "30"]).await;
    ctx.ok(&["WATCH", "k"]).await;
    tokio::time::sleep(std::time::Duration::from_millis(60)).await;

    // Another client finds the key expired, which removes it.
    assert_eq!(other.get("k").await.unwrap(), RespValue::Null);

    ctx.ok(&["MULTI"]).await;
    ctx.ok(&["SET", "k", "again"]).await;
    assert_eq!(ctx.ok(&["EXEC"]).await, RespValue::NullArray);
    assert_eq!(ctx.get("k").await.unwrap(), RespValue::Null);
}

#[tokio::test]
async fn test_flushall_dirties_every_watch() {
    let ctx = TestContext::new().await;
    let other = ctx.new_client();
    ctx.set("k", "v").await.unwrap();
    ctx.ok(&["WATCH", "k"]).await;
    other.ok(&["FLUSHALL"]).await;

    ctx.ok(&["MULTI"]).await;
    assert_eq!(ctx.ok(&["EXEC"]).await, RespValue::NullArray);
}

// ===== Isolation under concurrency =====

fn as_int(reply: &RespValue) -> i64 {
    match reply {
        RespValue::BulkString(b) => std::str::from_utf8(b).unwrap().parse().unwrap(),
        RespValue::Null => 0,
        other => panic!("unexpected reply {:?}", other),
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_exec_is_never_seen_half_applied() {
    let ctx = TestContext::new().await;
    let writer = ctx.new_client();
    let reader = ctx.new_client();
    let tx_reader = ctx.new_client();

    let writes = tokio::spawn(async move {
        for i in 1..=300 {
            let v = i.to_string();
            writer.ok(&["MULTI"]).await;
            writer.ok(&["SET", "a", v.as_str()]).await;
            writer.ok(&["SET", "b", v.as_str()]).await;
            writer.ok(&["EXEC"]).await;
        }
    });
    let plain_reads = tokio::spawn(async move {
        for _ in 0..300 {
            let a = as_int(&reader.get("a").await.unwrap());
            let b = as_int(&reader.get("b").await.unwrap());
            // `b` is read second, so it can only be as new as `a` or newer.
            assert!(b >= a, "read a={} then b={}", a, b);
        }
    });
    let queued_reads = tokio::spawn(async move {
        for _ in 0..300 {
            tx_reader.ok(&["MULTI"]).await;
            tx_reader.ok(&["GET", "a"]).await;
            tx_reader.ok(&["GET", "b"]).await;
            let RespValue::Array(replies) = tx_reader.ok(&["EXEC"]).await else {
                panic!("EXEC did not return an array");
            };
            assert_eq!(as_int(&replies[0]), as_int(&replies[1]));
        }
    });

    writes.await.unwrap();
    plain_reads.await.unwrap();
    queued_reads.await.unwrap();
    assert_eq!(ctx.get("a").await.unwrap(), bulk("300"));
    assert_eq!(ctx.get("b").await.unwrap(), bulk("300"));
}
