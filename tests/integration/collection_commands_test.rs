// tests/integration/collection_commands_test.rs

//! Integration tests for list, hash and set commands
//! Tests: LPUSH, RPUSH, LPOP, RPOP, LLEN, LRANGE, LMOVE, RPOPLPUSH, HSET, HGET, HDEL, HGETALL, HLEN,
//! SADD, SREM, SMEMBERS, SISMEMBER, SCARD

use super::test_helpers::{TestContext, bulk, bulk_array};
use carade::core::CaradeError;
use carade::core::RespValue;

// ===== Lists =====

#[tokio::test]
async fn test_push_order() {
    let ctx = TestContext::new().await;
    assert_eq!(ctx.lpush("l", &["a", "b"]).await.unwrap(), RespValue::Integer(2));
    assert_eq!(ctx.rpush("l", &["c"]).await.unwrap(), RespValue::Integer(3));
    assert_eq!(ctx.lrange("l", 0, -1).await.unwrap(), bulk_array(&["b", "a", "c"]));
    assert_eq!(ctx.ok(&["LLEN", "l"]).await, RespValue::Integer(3));
}

#[tokio::test]
async fn test_lrange_index_clamping() {
    let ctx = TestContext::new().await;
    ctx.rpush("l", &["a", "b", "c", "d"]).await.unwrap();
    assert_eq!(ctx.lrange("l", -2, -1).await.unwrap(), bulk_array(&["c", "d"]));
    assert_eq!(ctx.lrange("l", -100, 1).await.unwrap(), bulk_array(&["a", "b"]));
    assert_eq!(ctx.lrange("l", 2, 100).await.unwrap(), bulk_array(&["c", "d"]));
    assert_eq!(ctx.lrange("l", 3, 1).await.unwrap(), RespValue::Array(vec![]));
    assert_eq!(ctx.lrange("nope", 0, -1).await.unwrap(), RespValue::Array(vec![]));
}

#[tokio::test]
async fn test_pop_with_and_without_count() {
    let ctx = TestContext::new().await;
    ctx.rpush("l", &["a", "b", "c", "d"]).await.unwrap();

    assert_eq!(ctx.ok(&["LPOP", "l"]).await, bulk("a"));
    assert_eq!(ctx.ok(&["RPOP", "l"]).await, bulk("d"));
    assert_eq!(ctx.ok(&["LPOP", "l", "5"]).await, bulk_array(&["b", "c"]));

    // The emptied list is gone.
    assert_eq!(ctx.ok(&["EXISTS", "l"]).await, RespValue::Integer(0));
    assert_eq!(ctx.ok(&["LPOP", "l"]).await, RespValue::Null);
    assert_eq!(ctx.ok(&["LPOP", "l", "2"]).await, RespValue::NullArray);

    let err = ctx.exec_args(&["LPOP", "l", "-1"]).await.unwrap_err();
    assert!(matches!(err, CaradeError::InvalidRequest(_)));
}

#[tokio::test]
async fn test_lmove_between_lists() {
    let ctx = TestContext::new().await;
    ctx.rpush("src", &["a", "b", "c"]).await.unwrap();
    ctx.rpush("dst", &["x"]).await.unwrap();

    assert_eq!(ctx.ok(&["LMOVE", "src", "dst", "RIGHT", "LEFT"]).await, bulk("c"));
    assert_eq!(ctx.lrange("dst", 0, -1).await.unwrap(), bulk_array(&["c", "x"]));
    assert_eq!(ctx.ok(&["RPOPLPUSH", "src", "dst"]).await, bulk("b"));
    assert_eq!(ctx.lrange("src", 0, -1).await.unwrap(), bulk_array(&["a"]));
    assert_eq!(ctx.ok(&["LMOVE", "missing", "dst", "LEFT", "LEFT"]).await, RespValue::Null);
}

#[tokio::test]
async fn test_lmove_rotates_a_single_list() {
    let ctx = TestContext::new().await;
    ctx.rpush("l", &["a", "b", "c"]).await.unwrap();
    assert_eq!(ctx.ok(&["LMOVE", "l", "l", "LEFT", "RIGHT"]).await, bulk("a"));
    assert_eq!(ctx.lrange("l", 0, -1).await.unwrap(), bulk_array(&["b", "c", "a"]));
}

#[tokio::test]
async fn test_lmove_wrong_destination_type_keeps_source() {
    let ctx = TestContext::new().await;
    ctx.rpush("src", &["a"]).await.unwrap();
    ctx.set("dst", "string").await.unwrap();

    let err = ctx.exec_args(&["LMOVE", "src", "dst", "LEFT", "LEFT"]).await.unwrap_err();
    assert!(matches!(err, CaradeError::WrongType));
    assert_eq!(ctx.lrange("src", 0, -1).await.unwrap(), bulk_array(&["a"]));
}

#[tokio::test]
async fn test_lmove_rejects_bad_direction() {
    let ctx = TestContext::new().await;
    let err = ctx.exec_args(&["LMOVE", "a", "b", "UP", "LEFT"]).await.unwrap_err();
    assert!(matches!(err, CaradeError::SyntaxError));
}

// ===== Hashes =====

#[tokio::test]
async fn test_hash_roundtrip() {
    let ctx = TestContext::new().await;
    assert_eq!(ctx.ok(&["HSET", "h", "name", "ann", "age", "30"]).await, RespValue::Integer(2));
    assert_eq!(ctx.ok(&["HSET", "h", "age", "31", "city", "oslo"]).await, RespValue::Integer(1));

    assert_eq!(ctx.ok(&["HGET", "h", "age"]).await, bulk("31"));
    assert_eq!(ctx.ok(&["HGET", "h", "nope"]).await, RespValue::Null);
    assert_eq!(ctx.ok(&["HLEN", "h"]).await, RespValue::Integer(3));
    assert_eq!(
        ctx.ok(&["HGETALL", "h"]).await,
        bulk_array(&["name", "ann", "age", "31", "city", "oslo"])
    );
}

#[tokio::test]
async fn test_hdel_removes_empty_hash() {
    let ctx = TestContext::new().await;
    ctx.ok(&["HSET", "h", "a", "1", "b", "2"]).await;
    assert_eq!(ctx.ok(&["HDEL", "h", "a", "zzz"]).await, RespValue::Integer(1));
    assert_eq!(ctx.ok(&["HDEL", "h", "b"]).await, RespValue::Integer(1));
    assert_eq!(ctx.ok(&["EXISTS", "h"]).await, RespValue::Integer(0));
    assert_eq!(ctx.ok(&["HGETALL", "h"]).await, RespValue::Array(vec![]));
}

#[tokio::test]
async fn test_hset_odd_arguments() {
    let ctx = TestContext::new().await;
    let err = ctx.exec_args(&["HSET", "h", "a"]).await.unwrap_err();
    assert!(matches!(err, CaradeError::WrongArgumentCount(_)));
}

// ===== Sets =====

#[tokio::test]
async fn test_set_membership() {
    let ctx = TestContext::new().await;
    assert_eq!(ctx.ok(&["SADD", "s", "a", "b", "a"]).await, RespValue::Integer(2));
    assert_eq!(ctx.ok(&["SADD", "s", "b", "c"]).await, RespValue::Integer(1));
    assert_eq!(ctx.ok(&["SCARD", "s"]).await, RespValue::Integer(3));
    assert_eq!(ctx.ok(&["SISMEMBER", "s", "c"]).await, RespValue::Integer(1));
    assert_eq!(ctx.ok(&["SISMEMBER", "s", "z"]).await, RespValue::Integer(0));

    let RespValue::Array(mut members) = ctx.ok(&["SMEMBERS", "s"]).await else {
        panic!("Expected array from SMEMBERS");
    };
    members.sort_by_key(|m| format!("{:?}", m));
    assert_eq!(members, vec![bulk("a"), bulk("b"), bulk("c")]);
}

#[tokio::test]
async fn test_srem_removes_empty_set() {
    let ctx = TestContext::new().await;
    ctx.ok(&["SADD", "s", "a", "b"]).await;
    assert_eq!(ctx.ok(&["SREM", "s", "a", "b", "c"]).await, RespValue::Integer(2));
    assert_eq!(ctx.ok(&["EXISTS", "s"]).await, RespValue::Integer(0));
    assert_eq!(ctx.ok(&["SCARD", "s"]).await, RespValue::Integer(0));
}

#[tokio::test]
async fn test_collection_commands_on_wrong_type() {
    let ctx = TestContext::new().await;
    ctx.set("str", "v").await.unwrap();
    for args in [
        vec!["LPUSH", "str", "x"],
        vec!["LLEN", "str"],
        vec!["HSET", "str", "f", "v"],
        vec!["HGETALL", "str"],
        vec!["SADD", "str", "m"],
        vec!["SMEMBERS", "str"],
    ] {
        let err = ctx.exec_args(&args).await.unwrap_err();
        assert!(matches!(err, CaradeError::WrongType), "{:?}", args);
    }
    // The failed writes left the string alone.
    assert_eq!(ctx.get("str").await.unwrap(), bulk("v"));
}
