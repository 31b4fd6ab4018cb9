// src/core/commands/zset/zadd.rs

use crate::core::commands::command_spec::CommandSpec;
use crate::core::commands::command_trait::{
    CommandFlags, ExecutableCommand, ParseCommand, WriteOutcome,
};
use crate::core::commands::helpers::{extract_bytes, extract_string, parse_f64};
use crate::core::protocol::{RespFrame, format_score};
use crate::core::storage::ExecutionContext;
use crate::core::storage::data_types::{DataValue, ValueCell};
use crate::core::storage::zset::{AddOutcome, SortedSet};
use crate::core::{CaradeError, RespValue};
use async_trait::async_trait;
use bytes::Bytes;

/// Defines the condition for `ZADD` execution (`NX` or `XX`).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum ZaddCondition {
    #[default]
    None,
    IfNotExists, // NX
    IfExists,    // XX
}

/// Represents the full `ZADD` command with all its options.
#[derive(Debug, Clone, Default)]
pub struct Zadd {
    pub key: Bytes,
    pub members: Vec<(f64, Bytes)>,
    pub condition: ZaddCondition,
    pub ch: bool,
    pub incr: bool,
}

impl ParseCommand for Zadd {
    fn parse(args: &[RespFrame]) -> Result<Self, CaradeError> {
        if args.is_empty() {
            return Err(CaradeError::WrongArgumentCount("ZADD".to_string()));
        }

        let key = extract_bytes(&args[0])?;
        let mut i = 1;
        let mut condition = ZaddCondition::None;
        let mut ch = false;
        let mut incr = false;

        while i < args.len() {
            let Ok(flag) = extract_string(&args[i]) else {
                break;
            };
            match flag.to_ascii_lowercase().as_str() {
                "nx" => condition = ZaddCondition::IfNotExists,
                "xx" => condition = ZaddCondition::IfExists,
                "ch" => ch = true,
                "incr" => incr = true,
                _ => break,
            }
            i += 1;
        }

        let pairs = &args[i..];
        if pairs.is_empty() || pairs.len() % 2 != 0 {
            return Err(CaradeError::SyntaxError);
        }
        if incr && pairs.len() != 2 {
            return Err(CaradeError::InvalidRequest(
                "INCR option supports a single increment-element pair".into(),
            ));
        }
        let members = pairs
            .chunks_exact(2)
            .map(|chunk| Ok((parse_f64(&chunk[0])?, extract_bytes(&chunk[1])?)))
            .collect::<Result<_, CaradeError>>()?;

        Ok(Zadd {
            key,
            members,
            condition,
            ch,
            incr,
        })
    }
}

#[async_trait]
impl ExecutableCommand for Zadd {
    async fn execute(
        &self,
        ctx: &mut ExecutionContext,
    ) -> Result<(RespValue, WriteOutcome), CaradeError> {
        let log_args = self.to_log_args();
        let (resp, changed) = ctx.compute(&self.key, |slot, fx| {
            if slot.is_none() && self.condition == ZaddCondition::IfExists {
                let resp = if self.incr { RespValue::Null } else { RespValue::Integer(0) };
                return Ok((resp, false));
            }
            let cell = slot.get_or_insert_with(|| ValueCell::new(DataValue::SortedSet(SortedSet::new())));
            let DataValue::SortedSet(zset) = &mut cell.data else {
                return Err(CaradeError::WrongType);
            };

            let admits = |zset: &SortedSet, member: &Bytes| match self.condition {
                ZaddCondition::IfNotExists => zset.score(member).is_none(),
                ZaddCondition::IfExists => zset.score(member).is_some(),
                ZaddCondition::None => true,
            };

            if self.incr {
                let (delta, member) = &self.members[0];
                if !admits(zset, member) {
                    return Ok((RespValue::Null, false));
                }
                let score = zset.incr_by(*delta, member.clone()).ok_or(CaradeError::NotAFloat)?;
                fx.propagate(&self.key, log_args);
                return Ok((RespValue::from_score(score), true));
            }

            let mut added = 0;
            let mut updated = 0;
            for (score, member) in &self.members {
                if !admits(zset, member) {
                    continue;
                }
                match zset.insert(*score, member.clone()) {
                    AddOutcome::Added => added += 1,
                    AddOutcome::Updated => updated += 1,
                    AddOutcome::Unchanged => {}
                }
            }
            let changed = added + updated > 0;
            if changed {
                fx.propagate(&self.key, log_args);
            }
            let reply = if self.ch { added + updated } else { added };
            Ok((RespValue::Integer(reply), changed))
        })?;

        let outcome = if changed {
            WriteOutcome::Write { keys_modified: 1 }
        } else {
            WriteOutcome::DidNotWrite
        };
        Ok((resp, outcome))
    }
}

impl CommandSpec for Zadd {
    fn name(&self) -> &'static str {
        "zadd"
    }
    fn arity(&self) -> i64 {
        -4
    }
    fn flags(&self) -> CommandFlags {
        CommandFlags::WRITE | CommandFlags::DENY_OOM
    }
    fn first_key(&self) -> i64 {
        1
    }
    fn last_key(&self) -> i64 {
        1
    }
    fn step(&self) -> i64 {
        1
    }
    fn get_keys(&self) -> Vec<Bytes> {
        vec![self.key.clone()]
    }
    fn to_resp_args(&self) -> Vec<Bytes> {
        let mut args = vec![self.key.clone()];
        match self.condition {
            ZaddCondition::IfNotExists => args.push("NX".into()),
            ZaddCondition::IfExists => args.push("XX".into()),
            ZaddCondition::None => {}
        }
        if self.ch {
            args.push("CH".into());
        }
        if self.incr {
            args.push("INCR".into());
        }
        for (score, member) in &self.members {
            args.push(format_score(*score));
            args.push(member.clone());
        }
        args
    }
}
