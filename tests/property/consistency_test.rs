// tests/property/consistency_test.rs

//! Property-based tests for data consistency
//! Tests that command sequences agree with simple models, live and after AOF replay

use crate::test_helpers::{TestContext, aof_config, bulk};
use carade::core::RespValue;
use carade::core::persistence::AofLoader;
use carade::core::state::ServerState;
use proptest::prelude::*;
use std::collections::{HashMap, VecDeque};
use tempfile::TempDir;

#[derive(Debug, Clone)]
enum ListOp {
    LPush(String),
    RPush(String),
    LPop,
    RPop,
}

fn list_op() -> impl Strategy<Value = ListOp> {
    prop_oneof![
        "[a-z]{1,8}".prop_map(ListOp::LPush),
        "[a-z]{1,8}".prop_map(ListOp::RPush),
        Just(ListOp::LPop),
        Just(ListOp::RPop),
    ]
}

fn popped(value: Option<String>) -> RespValue {
    value.map_or(RespValue::Null, |v| bulk(&v))
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 50, // Each case spins up a server state
        max_shrink_iters: 500,
        ..ProptestConfig::default()
    })]

    #[test]
    fn test_list_matches_deque_model(ops in prop::collection::vec(list_op(), 1..=60)) {
        let rt = tokio::runtime::Runtime::new().unwrap();
        rt.block_on(async {
            let ctx = TestContext::new().await;
            let mut model: VecDeque<String> = VecDeque::new();

            for op in ops {
                match op {
                    ListOp::LPush(v) => {
                        model.push_front(v.clone());
                        let reply = ctx.lpush("l", &[&v]).await.unwrap();
                        assert_eq!(reply, RespValue::Integer(model.len() as i64));
                    }
                    ListOp::RPush(v) => {
                        model.push_back(v.clone());
                        let reply = ctx.rpush("l", &[&v]).await.unwrap();
                        assert_eq!(reply, RespValue::Integer(model.len() as i64));
                    }
                    ListOp::LPop => {
                        assert_eq!(ctx.ok(&["LPOP", "l"]).await, popped(model.pop_front()));
                    }
                    ListOp::RPop => {
                        assert_eq!(ctx.ok(&["RPOP", "l"]).await, popped(model.pop_back()));
                    }
                }
            }

            let items: Vec<RespValue> = model.iter().map(|v| bulk(v)).collect();
            assert_eq!(ctx.lrange("l", 0, -1).await.unwrap(), RespValue::Array(items));
            let exists = if model.is_empty() { 0 } else { 1 };
            assert_eq!(ctx.ok(&["EXISTS", "l"]).await, RespValue::Integer(exists));
        });
    }

    #[test]
    fn test_counters_survive_replay(
        increments in prop::collection::vec((0usize..5, -1000i64..1000), 1..=40)
    ) {
        let rt = tokio::runtime::Runtime::new().unwrap();
        rt.block_on(async {
            let dir = TempDir::new().unwrap();
            let config = aof_config(dir.path());
            let mut ctx = TestContext::with_config(config.clone()).await;
            let mut model: HashMap<usize, i64> = HashMap::new();

            for (key, delta) in &increments {
                *model.entry(*key).or_default() += delta;
                let reply = ctx.ok(&["INCRBY", &format!("c:{key}"), &delta.to_string()]).await;
                assert_eq!(reply, RespValue::Integer(model[key]));
            }
            ctx.close_aof().await;

            let state = ServerState::initialize(config.clone()).unwrap().state;
            AofLoader::new(config.persistence.clone())
                .load_into(&state)
                .await
                .unwrap();
            let restored = TestContext::for_state(state);
            for (key, total) in &model {
                let reply = restored.get(&format!("c:{key}")).await.unwrap();
                assert_eq!(reply, bulk(&total.to_string()));
            }
        });
    }
}
