// src/core/commands/zset/zrangebyscore.rs

use super::helpers::{format_score_boundary, format_zrange_response, read_zset};
use crate::core::commands::command_spec::CommandSpec;
use crate::core::commands::command_trait::{
    CommandFlags, ExecutableCommand, ParseCommand, WriteOutcome,
};
use crate::core::commands::helpers::{ArgParser, extract_bytes, parse_i64, parse_score_boundary};
use crate::core::protocol::RespFrame;
use crate::core::storage::ExecutionContext;
use crate::core::storage::zset::ScoreBoundary;
use crate::core::{CaradeError, RespValue};
use async_trait::async_trait;
use bytes::Bytes;

/// `ZRANGEBYSCORE key min max [WITHSCORES] [LIMIT offset count]`
#[derive(Debug, Clone)]
pub struct ZRangeByScore {
    pub key: Bytes,
    pub min: ScoreBoundary,
    pub max: ScoreBoundary,
    pub with_scores: bool,
    pub limit: Option<(i64, i64)>,
}

impl Default for ZRangeByScore {
    fn default() -> Self {
        Self {
            key: Bytes::new(),
            min: ScoreBoundary::Inclusive(f64::NEG_INFINITY),
            max: ScoreBoundary::Inclusive(f64::INFINITY),
            with_scores: false,
            limit: None,
        }
    }
}

impl ParseCommand for ZRangeByScore {
    fn parse(args: &[RespFrame]) -> Result<Self, CaradeError> {
        if args.len() < 3 {
            return Err(CaradeError::WrongArgumentCount("ZRANGEBYSCORE".to_string()));
        }
        let key = extract_bytes(&args[0])?;
        let min = parse_score_boundary(&args[1])?;
        let max = parse_score_boundary(&args[2])?;

        let mut parser = ArgParser::new(&args[3..]);
        let mut with_scores = false;
        let mut limit = None;
        while !parser.is_exhausted() {
            if parser.match_flag("withscores") {
                with_scores = true;
            } else if parser.match_flag("limit") {
                let rest = parser.remaining_args();
                if rest.len() < 2 {
                    return Err(CaradeError::SyntaxError);
                }
                limit = Some((parse_i64(&rest[0])?, parse_i64(&rest[1])?));
                parser = ArgParser::new(&rest[2..]);
            } else {
                return Err(CaradeError::SyntaxError);
            }
        }

        Ok(ZRangeByScore {
            key,
            min,
            max,
            with_scores,
            limit,
        })
    }
}

#[async_trait]
impl ExecutableCommand for ZRangeByScore {
    async fn execute(
        &self,
        ctx: &mut ExecutionContext,
    ) -> Result<(RespValue, WriteOutcome), CaradeError> {
        let mut range = read_zset(ctx, &self.key, vec![], |zset| {
            zset.range_by_score(self.min, self.max)
        })?;

        if let Some((offset, count)) = self.limit {
            // A negative offset yields nothing; a negative count means "to the end".
            if offset < 0 {
                range.clear();
            } else {
                let take = if count < 0 { usize::MAX } else { count as usize };
                range = range.into_iter().skip(offset as usize).take(take).collect();
            }
        }

        Ok((
            format_zrange_response(range, self.with_scores),
            WriteOutcome::DidNotWrite,
        ))
    }
}

impl CommandSpec for ZRangeByScore {
    fn name(&self) -> &'static str {
        "zrangebyscore"
    }
    fn arity(&self) -> i64 {
        -4
    }
    fn flags(&self) -> CommandFlags {
        CommandFlags::READONLY
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
        let mut args = vec![
            self.key.clone(),
            format_score_boundary(&self.min),
            format_score_boundary(&self.max),
        ];
        if self.with_scores {
            args.push("WITHSCORES".into());
        }
        if let Some((offset, count)) = self.limit {
            args.push("LIMIT".into());
            args.push(offset.to_string().into());
            args.push(count.to_string().into());
        }
        args
    }
}
