// tests/integration/zset_commands_test.rs

//! Integration tests for sorted set commands
//! Tests: ZADD, ZINCRBY, ZREM, ZSCORE, ZCARD, ZRANK, ZRANGE, ZREVRANGE, ZRANGEBYSCORE, ZPOPMIN, ZPOPMAX

use super::test_helpers::{TestContext, bulk, bulk_array};
use carade::core::CaradeError;
use carade::core::RespValue;

async fn leaderboard() -> TestContext {
    let ctx = TestContext::new().await;
    ctx.ok(&["ZADD", "lb", "100", "alice", "50", "bob", "75", "carol", "50", "aaron"])
        .await;
    ctx
}

#[tokio::test]
async fn test_zadd_counts_new_members_only() {
    let ctx = TestContext::new().await;
    assert_eq!(ctx.ok(&["ZADD", "z", "1", "a", "2", "b"]).await, RespValue::Integer(2));
    assert_eq!(ctx.ok(&["ZADD", "z", "5", "a", "3", "c"]).await, RespValue::Integer(1));
    assert_eq!(ctx.ok(&["ZSCORE", "z", "a"]).await, bulk("5"));
    assert_eq!(ctx.ok(&["ZCARD", "z"]).await, RespValue::Integer(3));
}

#[tokio::test]
async fn test_zadd_ch_counts_changed_scores() {
    let ctx = TestContext::new().await;
    ctx.ok(&["ZADD", "z", "1", "a", "2", "b"]).await;
    assert_eq!(
        ctx.ok(&["ZADD", "z", "CH", "1", "a", "9", "b", "3", "c"]).await,
        RespValue::Integer(2)
    );
}

#[tokio::test]
async fn test_zadd_nx_and_xx() {
    let ctx = TestContext::new().await;
    ctx.ok(&["ZADD", "z", "1", "a"]).await;

    assert_eq!(ctx.ok(&["ZADD", "z", "NX", "7", "a", "2", "b"]).await, RespValue::Integer(1));
    assert_eq!(ctx.ok(&["ZSCORE", "z", "a"]).await, bulk("1"));

    assert_eq!(ctx.ok(&["ZADD", "z", "XX", "8", "a", "3", "c"]).await, RespValue::Integer(0));
    assert_eq!(ctx.ok(&["ZSCORE", "z", "a"]).await, bulk("8"));
    assert_eq!(ctx.ok(&["ZSCORE", "z", "c"]).await, RespValue::Null);
}

#[tokio::test]
async fn test_zadd_incr_behaves_like_zincrby() {
    let ctx = TestContext::new().await;
    assert_eq!(ctx.ok(&["ZADD", "z", "INCR", "2.5", "a"]).await, bulk("2.5"));
    assert_eq!(ctx.ok(&["ZADD", "z", "INCR", "1.5", "a"]).await, bulk("4"));
    assert_eq!(ctx.ok(&["ZADD", "z", "NX", "INCR", "1", "a"]).await, RespValue::Null);

    let err = ctx.exec_args(&["ZADD", "z", "INCR", "1", "a", "2", "b"]).await.unwrap_err();
    assert!(matches!(err, CaradeError::InvalidRequest(_)));
}

#[tokio::test]
async fn test_zadd_rejects_bad_scores() {
    let ctx = TestContext::new().await;
    let err = ctx.exec_args(&["ZADD", "z", "notanumber", "a"]).await.unwrap_err();
    assert!(matches!(err, CaradeError::NotAFloat));
    let err = ctx.exec_args(&["ZADD", "z", "1", "a", "2"]).await.unwrap_err();
    assert!(matches!(err, CaradeError::SyntaxError));
    assert_eq!(ctx.ok(&["EXISTS", "z"]).await, RespValue::Integer(0));
}

#[tokio::test]
async fn test_zincrby_to_nan_is_rejected() {
    let ctx = TestContext::new().await;
    ctx.ok(&["ZADD", "z", "+inf", "a"]).await;
    let err = ctx.exec_args(&["ZINCRBY", "z", "-inf", "a"]).await.unwrap_err();
    assert!(matches!(err, CaradeError::NotAFloat));
    assert_eq!(ctx.ok(&["ZSCORE", "z", "a"]).await, bulk("inf"));
}

#[tokio::test]
async fn test_zincrby_creates_member() {
    let ctx = TestContext::new().await;
    assert_eq!(ctx.ok(&["ZINCRBY", "z", "3", "m"]).await, bulk("3"));
    assert_eq!(ctx.ok(&["ZINCRBY", "z", "-1.25", "m"]).await, bulk("1.75"));
}

#[tokio::test]
async fn test_zrange_orders_by_score_then_member() {
    let ctx = leaderboard().await;
    assert_eq!(
        ctx.ok(&["ZRANGE", "lb", "0", "-1"]).await,
        bulk_array(&["aaron", "bob", "carol", "alice"])
    );
    assert_eq!(
        ctx.ok(&["ZREVRANGE", "lb", "0", "1", "WITHSCORES"]).await,
        bulk_array(&["alice", "100", "carol", "75"])
    );
    assert_eq!(ctx.ok(&["ZRANGE", "lb", "10", "20"]).await, RespValue::Array(vec![]));
    assert_eq!(ctx.ok(&["ZRANGE", "missing", "0", "-1"]).await, RespValue::Array(vec![]));
}

#[tokio::test]
async fn test_zrank_and_zrem() {
    let ctx = leaderboard().await;
    assert_eq!(ctx.ok(&["ZRANK", "lb", "carol"]).await, RespValue::Integer(2));
    assert_eq!(ctx.ok(&["ZRANK", "lb", "nobody"]).await, RespValue::Null);

    assert_eq!(ctx.ok(&["ZREM", "lb", "bob", "nobody"]).await, RespValue::Integer(1));
    assert_eq!(ctx.ok(&["ZRANK", "lb", "carol"]).await, RespValue::Integer(1));

    ctx.ok(&["ZREM", "lb", "alice", "carol", "aaron"]).await;
    assert_eq!(ctx.ok(&["EXISTS", "lb"]).await, RespValue::Integer(0));
}

#[tokio::test]
async fn test_zrangebyscore_bounds_and_limit() {
    let ctx = leaderboard().await;
    assert_eq!(
        ctx.ok(&["ZRANGEBYSCORE", "lb", "50", "75"]).await,
        bulk_array(&["aaron", "bob", "carol"])
    );
    assert_eq!(
        ctx.ok(&["ZRANGEBYSCORE", "lb", "(50", "+inf", "WITHSCORES"]).await,
        bulk_array(&["carol", "75", "alice", "100"])
    );
    assert_eq!(
        ctx.ok(&["ZRANGEBYSCORE", "lb", "-inf", "+inf", "LIMIT", "1", "2"]).await,
        bulk_array(&["bob", "carol"])
    );
    assert_eq!(
        ctx.ok(&["ZRANGEBYSCORE", "lb", "-inf", "+inf", "LIMIT", "2", "-1"]).await,
        bulk_array(&["carol", "alice"])
    );
    assert_eq!(
        ctx.ok(&["ZRANGEBYSCORE", "lb", "80", "60"]).await,
        RespValue::Array(vec![])
    );
}

#[tokio::test]
async fn test_zpopmin_and_zpopmax() {
    let ctx = leaderboard().await;
    assert_eq!(ctx.ok(&["ZPOPMIN", "lb"]).await, bulk_array(&["aaron", "50"]));
    assert_eq!(
        ctx.ok(&["ZPOPMAX", "lb", "2"]).await,
        bulk_array(&["alice", "100", "carol", "75"])
    );
    assert_eq!(ctx.ok(&["ZPOPMAX", "lb", "10"]).await, bulk_array(&["bob", "50"]));
    assert_eq!(ctx.ok(&["EXISTS", "lb"]).await, RespValue::Integer(0));
    assert_eq!(ctx.ok(&["ZPOPMIN", "lb"]).await, RespValue::Array(vec![]));
}

#[tokio::test]
async fn test_zset_commands_on_wrong_type() {
    let ctx = TestContext::new().await;
    ctx.set("s", "v").await.unwrap();
    for args in [
        vec!["ZADD", "s", "1", "a"],
        vec!["ZSCORE", "s", "a"],
        vec!["ZRANGE", "s", "0", "-1"],
        vec!["ZPOPMIN", "s"],
    ] {
        let err = ctx.exec_args(&args).await.unwrap_err();
        assert!(matches!(err, CaradeError::WrongType), "{:?}", args);
    }
}
