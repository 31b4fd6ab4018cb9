// tests/integration/blocking_test.rs

//! Integration tests for blocking operations
//! Tests: BLPOP, BRPOP, BLMOVE, BRPOPLPUSH, BZPOPMIN, BZPOPMAX

use super::test_helpers::{TestContext, bulk, bulk_array};
use bytes::Bytes;
use carade::core::RespValue;
use carade::core::blocking::{BlockKind, Woken};
use carade::core::commands::list::logic::Side;
use carade::core::gate::ExecutionLocks;
use carade::core::storage::ExecutionContext;
use carade::core::storage::data_types::{DataValue, ValueCell};
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::sleep;

/// Waits until `count` clients are parked on `key` in db 0.
async fn wait_for_waiters(ctx: &TestContext, key: &str, count: usize) {
    let key = Bytes::copy_from_slice(key.as_bytes());
    for _ in 0..200 {
        if ctx.state.blocker_manager.waiter_count(0, &key) >= count {
            return;
        }
        sleep(Duration::from_millis(5)).await;
    }
    panic!("waiters never registered on {:?}", key);
}

/// Waits until the queue on `key` in db 0 has been drained.
async fn wait_for_no_waiters(ctx: &TestContext, key: &str) {
    let key = Bytes::copy_from_slice(key.as_bytes());
    for _ in 0..200 {
        if ctx.state.blocker_manager.waiter_count(0, &key) == 0 {
            return;
        }
        sleep(Duration::from_millis(5)).await;
    }
    panic!("waiters on {:?} were never served", key);
}

fn list_cell(items: &[&str]) -> ValueCell {
    let list: VecDeque<Bytes> = items
        .iter()
        .map(|item| Bytes::copy_from_slice(item.as_bytes()))
        .collect();
    ValueCell::new(DataValue::List(list))
}

// ===== BLPOP Tests =====

#[tokio::test]
async fn test_blpop_immediate_success() {
    let ctx = TestContext::new().await;

    // Pre-populate the list
    ctx.lpush("mylist", &["value1", "value2"]).await.unwrap();

    // BLPOP should return immediately
    let result = ctx.blpop(&["mylist"], 1.0).await.unwrap();
    assert_eq!(result, bulk_array(&["mylist", "value2"]));

    // Verify the list now has one less element
    let result = ctx.lrange("mylist", 0, -1).await.unwrap();
    assert_eq!(result, bulk_array(&["value1"]));
}

#[tokio::test]
async fn test_blpop_scans_keys_in_order() {
    let ctx = TestContext::new().await;
    ctx.rpush("second", &["b"]).await.unwrap();
    ctx.rpush("third", &["c"]).await.unwrap();

    let result = ctx.blpop(&["first", "second", "third"], 1.0).await.unwrap();
    assert_eq!(result, bulk_array(&["second", "b"]));
}

#[tokio::test]
async fn test_blpop_timeout() {
    let ctx = TestContext::new().await;

    // BLPOP on empty list with short timeout
    let start = Instant::now();
    let result = ctx.blpop(&["mylist"], 0.1).await.unwrap();
    let elapsed = start.elapsed();

    assert_eq!(result, RespValue::NullArray);
    assert!(elapsed >= Duration::from_millis(90));
    assert!(elapsed < Duration::from_millis(1000));

    // The timed-out waiter is gone.
    let key = bytes::Bytes::from_static(b"mylist");
    assert_eq!(ctx.state.blocker_manager.waiter_count(0, &key), 0);
}

#[tokio::test]
async fn test_blpop_woken_by_push_from_another_client() {
    let ctx = Arc::new(TestContext::new().await);
    let pusher = ctx.new_client();

    let waiter = {
        let ctx = ctx.clone();
        tokio::spawn(async move { ctx.blpop(&["jobs"], 0.0).await })
    };
    wait_for_waiters(&ctx, "jobs", 1).await;

    assert_eq!(pusher.rpush("jobs", &["job-1"]).await.unwrap(), RespValue::Integer(1));

    let result = tokio::time::timeout(Duration::from_secs(2), waiter)
        .await
        .expect("BLPOP was not woken")
        .unwrap()
        .unwrap();
    assert_eq!(result, bulk_array(&["jobs", "job-1"]));

    // The element was handed to the waiter, not left in the list.
    assert_eq!(pusher.ok(&["LLEN", "jobs"]).await, RespValue::Integer(0));
    assert_eq!(pusher.ok(&["EXISTS", "jobs"]).await, RespValue::Integer(0));
}

#[tokio::test]
async fn test_waiters_are_served_in_arrival_order() {
    let ctx = TestContext::new().await;
    let first = Arc::new(ctx.new_client());
    let second = Arc::new(ctx.new_client());

    let a = {
        let c = first.clone();
        tokio::spawn(async move { c.blpop(&["q"], 2.0).await })
    };
    wait_for_waiters(&ctx, "q", 1).await;
    let b = {
        let c = second.clone();
        tokio::spawn(async move { c.blpop(&["q"], 2.0).await })
    };
    wait_for_waiters(&ctx, "q", 2).await;

    ctx.rpush("q", &["one", "two"]).await.unwrap();

    assert_eq!(a.await.unwrap().unwrap(), bulk_array(&["q", "one"]));
    assert_eq!(b.await.unwrap().unwrap(), bulk_array(&["q", "two"]));
}

#[tokio::test]
async fn test_brpop_pops_from_the_tail() {
    let ctx = TestContext::new().await;
    ctx.rpush("l", &["a", "b", "c"]).await.unwrap();
    assert_eq!(ctx.ok(&["BRPOP", "l", "1"]).await, bulk_array(&["l", "c"]));
}

#[tokio::test]
async fn test_negative_timeout_is_rejected() {
    let ctx = TestContext::new().await;
    let err = ctx.exec_args(&["BLPOP", "l", "-1"]).await.unwrap_err();
    assert!(matches!(err, carade::core::CaradeError::InvalidTimeout));
}

// ===== BLMOVE / BRPOPLPUSH =====

#[tokio::test]
async fn test_blmove_woken_by_push() {
    let ctx = Arc::new(TestContext::new().await);
    let pusher = ctx.new_client();

    let waiter = {
        let ctx = ctx.clone();
        tokio::spawn(async move { ctx.exec_args(&["BLMOVE", "src", "dst", "LEFT", "RIGHT", "2"]).await })
    };
    wait_for_waiters(&ctx, "src", 1).await;

    pusher.rpush("dst", &["existing"]).await.unwrap();
    pusher.rpush("src", &["moved"]).await.unwrap();

    assert_eq!(waiter.await.unwrap().unwrap(), bulk("moved"));
    assert_eq!(
        pusher.lrange("dst", 0, -1).await.unwrap(),
        bulk_array(&["existing", "moved"])
    );
    assert_eq!(pusher.ok(&["EXISTS", "src"]).await, RespValue::Integer(0));
}

#[tokio::test]
async fn test_brpoplpush_times_out_with_null() {
    let ctx = TestContext::new().await;
    let result = ctx.ok(&["BRPOPLPUSH", "src", "dst", "0.05"]).await;
    assert_eq!(result, RespValue::Null);
}

// ===== BZPOPMIN / BZPOPMAX =====

#[tokio::test]
async fn test_bzpopmin_immediate() {
    let ctx = TestContext::new().await;
    ctx.ok(&["ZADD", "z", "2", "b", "1", "a"]).await;
    assert_eq!(ctx.ok(&["BZPOPMIN", "z", "1"]).await, bulk_array(&["z", "a", "1"]));
    assert_eq!(ctx.ok(&["BZPOPMAX", "z", "1"]).await, bulk_array(&["z", "b", "2"]));
    assert_eq!(ctx.ok(&["EXISTS", "z"]).await, RespValue::Integer(0));
}

#[tokio::test]
async fn test_bzpopmax_woken_by_zadd() {
    let ctx = Arc::new(TestContext::new().await);
    let writer = ctx.new_client();

    let waiter = {
        let ctx = ctx.clone();
        tokio::spawn(async move { ctx.exec_args(&["BZPOPMAX", "scores", "2"]).await })
    };
    wait_for_waiters(&ctx, "scores", 1).await;

    writer.ok(&["ZADD", "scores", "5", "low", "9", "high"]).await;

    assert_eq!(
        waiter.await.unwrap().unwrap(),
        bulk_array(&["scores", "high", "9"])
    );
    assert_eq!(
        writer.ok(&["ZRANGE", "scores", "0", "-1"]).await,
        bulk_array(&["low"])
    );
}

#[tokio::test]
async fn test_bzpopmin_timeout() {
    let ctx = TestContext::new().await;
    assert_eq!(ctx.ok(&["BZPOPMIN", "z", "0.05"]).await, RespValue::NullArray);
}

// ===== Blocking inside MULTI =====

#[tokio::test]
async fn test_blocking_command_in_transaction_does_not_block() {
    let ctx = TestContext::new().await;
    ctx.ok(&["MULTI"]).await;
    ctx.ok(&["BLPOP", "empty", "0"]).await;
    let start = Instant::now();
    let result = ctx.ok(&["EXEC"]).await;
    assert!(start.elapsed() < Duration::from_secs(1));
    assert_eq!(result, RespValue::Array(vec![RespValue::NullArray]));
}

#[tokio::test]
async fn test_waiter_is_not_served_after_session_cleanup() {
    let ctx = TestContext::new().await;
    let client = Arc::new(ctx.new_client());
    let session_id = client.session_id;

    let waiter = {
        let c = client.clone();
        tokio::spawn(async move { c.blpop(&["q"], 0.0).await })
    };
    wait_for_waiters(&ctx, "q", 1).await;

    // What a connection's guard does when the socket goes away.
    waiter.abort();
    ctx.state.blocker_manager.remove_waiters_for_session(session_id);

    ctx.rpush("q", &["kept"]).await.unwrap();
    assert_eq!(ctx.lrange("q", 0, -1).await.unwrap(), bulk_array(&["kept"]));
}

// ===== Waiters that went away without cleanup =====

#[tokio::test]
async fn test_dropped_list_waiter_gives_the_element_back() {
    let ctx = TestContext::new().await;
    let client = Arc::new(ctx.new_client());

    let waiter = {
        let c = client.clone();
        tokio::spawn(async move { c.blpop(&["q"], 0.0).await })
    };
    wait_for_waiters(&ctx, "q", 1).await;

    // The receiver is dropped but the queue still holds the sender.
    waiter.abort();
    let _ = waiter.await;
    assert_eq!(ctx.state.blocker_manager.waiter_count(0, &Bytes::from_static(b"q")), 1);

    ctx.rpush("q", &["a", "b"]).await.unwrap();
    assert_eq!(ctx.lrange("q", 0, -1).await.unwrap(), bulk_array(&["a", "b"]));
    assert_eq!(ctx.state.blocker_manager.waiter_count(0, &Bytes::from_static(b"q")), 0);
}

#[tokio::test]
async fn test_dropped_zset_waiter_gives_the_member_back() {
    let ctx = TestContext::new().await;
    let client = Arc::new(ctx.new_client());

    let waiter = {
        let c = client.clone();
        tokio::spawn(async move { c.exec_args(&["BZPOPMIN", "z", "0"]).await })
    };
    wait_for_waiters(&ctx, "z", 1).await;
    waiter.abort();
    let _ = waiter.await;

    ctx.ok(&["ZADD", "z", "1", "a", "2", "b"]).await;
    assert_eq!(
        ctx.ok(&["ZRANGE", "z", "0", "-1", "WITHSCORES"]).await,
        bulk_array(&["a", "1", "b", "2"])
    );
}

#[tokio::test]
async fn test_dropped_move_waiter_restores_both_lists() {
    let ctx = TestContext::new().await;
    let client = Arc::new(ctx.new_client());

    let waiter = {
        let c = client.clone();
        tokio::spawn(async move { c.exec_args(&["BLMOVE", "src", "dst", "LEFT", "RIGHT", "0"]).await })
    };
    wait_for_waiters(&ctx, "src", 1).await;
    waiter.abort();
    let _ = waiter.await;

    ctx.rpush("dst", &["existing"]).await.unwrap();
    ctx.rpush("src", &["moved", "next"]).await.unwrap();
    // Moves are served from a task holding the exclusive gate.
    wait_for_no_waiters(&ctx, "src").await;

    assert_eq!(ctx.lrange("src", 0, -1).await.unwrap(), bulk_array(&["moved", "next"]));
    assert_eq!(ctx.lrange("dst", 0, -1).await.unwrap(), bulk_array(&["existing"]));
}

// ===== Serving on enqueue =====

#[tokio::test]
async fn test_enqueue_keeps_serving_after_another_waiter_is_served() {
    let ctx = TestContext::new().await;
    let first = Arc::new(ctx.new_client());

    let queued = {
        let c = first.clone();
        tokio::spawn(async move { c.blpop(&["k1"], 0.0).await })
    };
    wait_for_waiters(&ctx, "k1", 1).await;

    // Data lands without waking anyone, as if between a caller's attempt and its enqueue.
    ctx.state.keyspace.put(0, Bytes::from_static(b"k1"), list_cell(&["a"]));
    ctx.state.keyspace.put(0, Bytes::from_static(b"k2"), list_cell(&["b"]));

    let second = ctx.new_client();
    let gate = ctx.state.gate.shared().await;
    let mut exec = ExecutionContext::new(
        ctx.state.clone(),
        0,
        second.session_id,
        ExecutionLocks::Shared(gate),
    );
    let keys = [Bytes::from_static(b"k1"), Bytes::from_static(b"k2")];
    let woken = ctx
        .state
        .blocker_manager
        .block_on(
            &mut exec,
            &keys,
            BlockKind::Pop(Side::Left),
            Some(Duration::from_millis(300)),
        )
        .await
        .unwrap();

    assert_eq!(
        woken,
        Some(Woken::Pop {
            key: Bytes::from_static(b"k2"),
            value: Bytes::from_static(b"b"),
        })
    );
    assert_eq!(queued.await.unwrap().unwrap(), bulk_array(&["k1", "a"]));
    assert_eq!(ctx.ok(&["EXISTS", "k1", "k2"]).await, RespValue::Integer(0));
}
