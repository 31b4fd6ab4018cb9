// tests/integration/hyperloglog_test.rs

//! Integration tests for HyperLogLog commands
//! Tests: PFADD, PFCOUNT, PFMERGE

use super::test_helpers::TestContext;
use carade::core::CaradeError;
use carade::core::RespValue;

fn count_of(reply: RespValue) -> i64 {
    match reply {
        RespValue::Integer(n) => n,
        other => panic!("Expected integer from PFCOUNT, got {:?}", other),
    }
}

fn assert_close(estimate: i64, exact: i64) {
    let error = (estimate - exact).abs() as f64 / exact as f64;
    assert!(error < 0.05, "estimate {estimate} too far from {exact}");
}

#[tokio::test]
async fn test_pfadd_reports_register_changes() {
    let ctx = TestContext::new().await;
    assert_eq!(ctx.ok(&["PFADD", "hll", "a", "b", "c"]).await, RespValue::Integer(1));
    assert_eq!(ctx.ok(&["PFADD", "hll", "a", "b"]).await, RespValue::Integer(0));
    assert_eq!(count_of(ctx.ok(&["PFCOUNT", "hll"]).await), 3);
}

#[tokio::test]
async fn test_pfadd_without_elements_creates_the_key() {
    let ctx = TestContext::new().await;
    assert_eq!(ctx.ok(&["PFADD", "hll"]).await, RespValue::Integer(1));
    assert_eq!(ctx.ok(&["EXISTS", "hll"]).await, RespValue::Integer(1));
    assert_eq!(ctx.ok(&["PFADD", "hll"]).await, RespValue::Integer(0));
    assert_eq!(count_of(ctx.ok(&["PFCOUNT", "hll"]).await), 0);
}

#[tokio::test]
async fn test_pfcount_estimates_large_cardinality() {
    let ctx = TestContext::new().await;
    let elements: Vec<String> = (0..10_000).map(|i| format!("user:{i}")).collect();
    for chunk in elements.chunks(500) {
        let mut args = vec!["PFADD", "visitors"];
        args.extend(chunk.iter().map(String::as_str));
        ctx.ok(&args).await;
    }
    assert_close(count_of(ctx.ok(&["PFCOUNT", "visitors"]).await), 10_000);
}

#[tokio::test]
async fn test_pfcount_of_several_keys_is_the_union() {
    let ctx = TestContext::new().await;
    ctx.ok(&["PFADD", "a", "1", "2", "3"]).await;
    ctx.ok(&["PFADD", "b", "3", "4"]).await;
    assert_eq!(count_of(ctx.ok(&["PFCOUNT", "a", "b", "missing"]).await), 4);
    // The sources are untouched.
    assert_eq!(count_of(ctx.ok(&["PFCOUNT", "a"]).await), 3);
}

#[tokio::test]
async fn test_pfmerge_includes_destination() {
    let ctx = TestContext::new().await;
    ctx.ok(&["PFADD", "dest", "x", "y"]).await;
    ctx.ok(&["PFADD", "a", "1", "2"]).await;
    ctx.ok(&["PFADD", "b", "2", "3"]).await;

    assert_eq!(ctx.ok(&["PFMERGE", "dest", "a", "b"]).await, RespValue::ok());
    assert_eq!(count_of(ctx.ok(&["PFCOUNT", "dest"]).await), 5);

    assert_eq!(ctx.ok(&["PFMERGE", "fresh", "a"]).await, RespValue::ok());
    assert_eq!(count_of(ctx.ok(&["PFCOUNT", "fresh"]).await), 2);
}

#[tokio::test]
async fn test_hll_commands_reject_other_types() {
    let ctx = TestContext::new().await;
    ctx.ok(&["SADD", "s", "m"]).await;
    for args in [
        vec!["PFADD", "s", "x"],
        vec!["PFCOUNT", "s"],
        vec!["PFMERGE", "d", "s"],
    ] {
        let err = ctx.exec_args(&args).await.unwrap_err();
        assert!(matches!(err, CaradeError::WrongType), "{:?}", args);
    }
}
