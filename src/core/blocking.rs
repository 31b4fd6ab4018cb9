// src/core/blocking.rs

//! Manages clients that are blocked waiting for data on list/zset keys.
//!
//! Waiters queue per `(db, key)` in arrival order. The task whose mutation
//! makes data available serves the queue head itself: it pops the element
//! inside the key's compute guard and hands it to the waiter through a
//! `oneshot` channel. The waiter never re-reads, so it cannot lose the race
//! to another client.
//!
//! A waiter's sender sits in a shared slot. Whoever takes it out decides the
//! outcome: the fulfiller (the waiter gets data) or the timeout path (the
//! waiter gets nothing). A fulfiller that finds the slot empty, or whose send
//! fails, puts the element back.

use crate::core::commands::list::logic::Side;
use crate::core::commands::zset::zpop_logic::PopSide;
use crate::core::gate::GateMode;
use crate::core::state::ServerState;
use crate::core::storage::ExecutionContext;
use crate::core::storage::context::del_args;
use crate::core::storage::data_types::{DataValue, ValueCell};
use crate::core::storage::zset::SortedSet;
use crate::core::{CaradeError, RespValue};
use bytes::Bytes;
use dashmap::DashMap;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use tracing::debug;

/// What a served waiter receives.
#[derive(Debug, Clone, PartialEq)]
pub enum Woken {
    Pop { key: Bytes, value: Bytes },
    ZPop { key: Bytes, member: Bytes, score: f64 },
    Moved { value: Bytes },
}

impl Woken {
    /// The reply the blocked command sends.
    pub fn into_resp(self) -> RespValue {
        match self {
            Woken::Pop { key, value } => {
                RespValue::Array(vec![RespValue::BulkString(key), RespValue::BulkString(value)])
            }
            Woken::ZPop { key, member, score } => RespValue::Array(vec![
                RespValue::BulkString(key),
                RespValue::BulkString(member),
                RespValue::from_score(score),
            ]),
            Woken::Moved { value } => RespValue::BulkString(value),
        }
    }
}

/// The operation a waiter is blocked on.
#[derive(Debug, Clone, PartialEq)]
pub enum BlockKind {
    Pop(Side),
    ZPop(PopSide),
    Move { target: Bytes, from: Side, to: Side },
}

type WakeResult = Result<Woken, CaradeError>;
type Waker = oneshot::Sender<WakeResult>;

/// The slot holding a waiter's sender. `None` once the waiter is settled.
pub type SharedWaker = Arc<Mutex<Option<Waker>>>;

#[derive(Clone, Debug)]
struct WaiterInfo {
    session_id: u64,
    kind: BlockKind,
    waker: SharedWaker,
}

impl WaiterInfo {
    fn is_settled(&self) -> bool {
        self.waker.lock().is_none()
    }

    /// Hands `woken` to the waiter. Gives the value back if the waiter is
    /// already settled or has gone away.
    fn commit(&self, woken: Woken) -> Result<(), Option<Woken>> {
        let Some(sender) = self.waker.lock().take() else {
            return Err(Some(woken));
        };
        sender.send(Ok(woken)).map_err(|returned| returned.ok())
    }

    fn fail(&self, err: CaradeError) {
        if let Some(sender) = self.waker.lock().take() {
            let _ = sender.send(Err(err));
        }
    }
}

/// What happened when the queue head was offered the key's data.
enum ServeStep {
    /// The head got a value. Carries other keys the serve pushed data into.
    Served(Option<Bytes>),
    /// The head was settled or failed; try the next waiter.
    Skipped,
    /// The head can't be served now; leave the queue as is.
    Stop,
}

/// Manages all clients currently blocked and waiting for data on list/zset keys.
#[derive(Debug, Default)]
pub struct BlockerManager {
    waiters: DashMap<(usize, Bytes), VecDeque<WaiterInfo>>,
}

impl BlockerManager {
    /// Creates a new, empty `BlockerManager`.
    pub fn new() -> Self {
        Default::default()
    }

    /// Registers one waiter on every key in `keys`, in FIFO position.
    pub fn enqueue(
        &self,
        db: usize,
        keys: &[Bytes],
        session_id: u64,
        kind: BlockKind,
    ) -> (SharedWaker, oneshot::Receiver<WakeResult>) {
        let (tx, rx) = oneshot::channel();
        let waker: SharedWaker = Arc::new(Mutex::new(Some(tx)));
        for key in keys {
            self.waiters
                .entry((db, key.clone()))
                .or_default()
                .push_back(WaiterInfo {
                    session_id,
                    kind: kind.clone(),
                    waker: waker.clone(),
                });
        }
        debug!("Session {}: Registered to block on keys: {:?}", session_id, keys);
        (waker, rx)
    }

    /// Number of waiters still queued on `key`, settled ones included.
    pub fn waiter_count(&self, db: usize, key: &Bytes) -> usize {
        self.waiters.get(&(db, key.clone())).map_or(0, |q| q.len())
    }

    /// Suspends the current command until one of `keys` can serve it.
    ///
    /// The caller has already tried every key without blocking. Returns `None`
    /// on timeout, or at once inside a transaction. A `wait` of `None` blocks
    /// forever.
    pub async fn block_on(
        self: &Arc<Self>,
        ctx: &mut ExecutionContext,
        keys: &[Bytes],
        kind: BlockKind,
        wait: Option<Duration>,
    ) -> Result<Option<Woken>, CaradeError> {
        if ctx.in_transaction {
            return Ok(None);
        }
        let (waker, mut rx) = self.enqueue(ctx.db, keys, ctx.session_id, kind);

        // Data may have arrived between the caller's attempt and the enqueue.
        // Serving a key can settle other waiters queued ahead of this one, so
        // keep going until this waiter's own slot is taken.
        let mode = ctx.gate_mode();
        for key in keys {
            if waker.lock().is_none() {
                break;
            }
            self.try_serve_immediately(&ctx.state, ctx.db, key, mode);
        }

        ctx.release_locks();

        let outcome = match wait {
            Some(limit) => match tokio::time::timeout(limit, &mut rx).await {
                Ok(received) => received.ok(),
                Err(_) => {
                    let taken = waker.lock().take();
                    match taken {
                        Some(_) => None,
                        // A fulfiller committed first; its value is on the way.
                        None => rx.await.ok(),
                    }
                }
            },
            None => rx.await.ok(),
        };

        self.remove_waiter(ctx.db, keys, &waker);
        outcome.transpose()
    }

    /// Serves as many queued waiters on `key` as its current data allows.
    /// Returns whether any waiter was served.
    ///
    /// Runs with the gate held in `mode`. Moves need the exclusive side; under
    /// any other mode a move at the head is handed to a task that takes it.
    pub fn try_serve_immediately(
        &self,
        state: &Arc<ServerState>,
        db: usize,
        key: &Bytes,
        mode: GateMode,
    ) -> bool {
        let queue_key = (db, key.clone());
        let mut served_any = false;
        let mut fed_keys = Vec::new();
        {
            let Some(mut queue) = self.waiters.get_mut(&queue_key) else {
                return false;
            };
            while let Some(head) = queue.front().cloned() {
                if head.is_settled() {
                    queue.pop_front();
                    continue;
                }
                let step = match (&head.kind, mode) {
                    (BlockKind::Pop(side), GateMode::Shared | GateMode::Exclusive) => {
                        serve_list_pop(state, db, key, *side, &head)
                    }
                    (BlockKind::ZPop(side), GateMode::Shared | GateMode::Exclusive) => {
                        serve_zpop(state, db, key, *side, &head)
                    }
                    (BlockKind::Move { target, from, to }, GateMode::Exclusive) => {
                        serve_move(state, db, key, target, *from, *to, &head)
                    }
                    _ => {
                        schedule_exclusive_serve(state, db, key);
                        ServeStep::Stop
                    }
                };
                match step {
                    ServeStep::Served(fed) => {
                        queue.pop_front();
                        served_any = true;
                        fed_keys.extend(fed);
                    }
                    ServeStep::Skipped => {
                        queue.pop_front();
                    }
                    ServeStep::Stop => break,
                }
            }
            if queue.is_empty() {
                drop(queue);
                self.waiters.remove_if(&queue_key, |_, q| q.is_empty());
            }
        }

        if served_any {
            state.watches.notify_watchers(db, key);
        }
        // A move pushed into another key, whose own waiters may now be servable.
        for target in fed_keys {
            state.watches.notify_watchers(db, &target);
            self.try_serve_immediately(state, db, &target, mode);
        }
        served_any
    }

    /// Called after a command mutated `key`, with the gate still held in `mode`.
    pub fn on_key_mutated(&self, state: &Arc<ServerState>, db: usize, key: &Bytes, mode: GateMode) {
        if self.waiters.is_empty() || !self.waiters.contains_key(&(db, key.clone())) {
            return;
        }
        self.try_serve_immediately(state, db, key, mode);
    }

    /// Drops `waker`'s entries from the queues of `keys`.
    fn remove_waiter(&self, db: usize, keys: &[Bytes], waker: &SharedWaker) {
        for key in keys {
            let queue_key = (db, key.clone());
            let now_empty = match self.waiters.get_mut(&queue_key) {
                Some(mut queue) => {
                    queue.retain(|w| !Arc::ptr_eq(&w.waker, waker));
                    queue.is_empty()
                }
                None => false,
            };
            if now_empty {
                self.waiters.remove_if(&queue_key, |_, q| q.is_empty());
            }
        }
    }

    /// Removes every waiter registered by a session. Called on disconnect.
    pub fn remove_waiters_for_session(&self, session_id: u64) {
        self.waiters.retain(|_, queue| {
            queue.retain(|w| {
                let keep = w.session_id != session_id;
                if !keep {
                    w.waker.lock().take();
                }
                keep
            });
            !queue.is_empty()
        });
    }
}

fn log(state: &ServerState, db: usize, args: Vec<Bytes>) {
    if let Some(aof) = &state.aof {
        aof.log(db, args);
    }
}

fn log_expired(state: &ServerState, db: usize, key: &Bytes) {
    log(state, db, del_args(key));
    state.watches.notify_watchers(db, key);
}

/// `Keyspace::compute`, logging `DEL key` first if an expired cell was dropped.
fn compute<R, F>(state: &ServerState, db: usize, key: &Bytes, f: F) -> Result<R, CaradeError>
where
    F: FnOnce(&mut Option<ValueCell>) -> Result<R, CaradeError>,
{
    state.keyspace.compute_observed(db, key, |slot, expired| {
        if expired {
            log_expired(state, db, key);
        }
        f(slot)
    })
}

/// `Keyspace::read`, logging `DEL key` if the read removed an expired cell.
fn read<R, F>(state: &ServerState, db: usize, key: &Bytes, f: F) -> Result<R, CaradeError>
where
    F: FnOnce(Option<&ValueCell>) -> Result<R, CaradeError>,
{
    state
        .keyspace
        .read_observed(db, key, |k| log_expired(state, db, k), f)
}

fn serve_list_pop(state: &ServerState, db: usize, key: &Bytes, side: Side, waiter: &WaiterInfo) -> ServeStep {
    compute(state, db, key, |slot| {
        let Some(ValueCell {
            data: DataValue::List(list),
            ..
        }) = slot
        else {
            return Ok(ServeStep::Stop);
        };
        let Some(value) = side.pop(list) else {
            return Ok(ServeStep::Stop);
        };
        match waiter.commit(Woken::Pop {
            key: key.clone(),
            value,
        }) {
            Ok(()) => {
                log(state, db, vec![side.pop_command(), key.clone()]);
                Ok(ServeStep::Served(None))
            }
            Err(returned) => {
                if let Some(Woken::Pop { value, .. }) = returned {
                    side.push(list, value);
                }
                Ok(ServeStep::Skipped)
            }
        }
    })
    .unwrap_or(ServeStep::Stop)
}

fn serve_zpop(state: &ServerState, db: usize, key: &Bytes, side: PopSide, waiter: &WaiterInfo) -> ServeStep {
    compute(state, db, key, |slot| {
        let Some(ValueCell {
            data: DataValue::SortedSet(zset),
            ..
        }) = slot
        else {
            return Ok(ServeStep::Stop);
        };
        let Some(entry) = pop_one(zset, side) else {
            return Ok(ServeStep::Stop);
        };
        match waiter.commit(Woken::ZPop {
            key: key.clone(),
            member: entry.member,
            score: entry.score,
        }) {
            Ok(()) => {
                log(state, db, vec![side.command_name(), key.clone()]);
                Ok(ServeStep::Served(None))
            }
            Err(returned) => {
                if let Some(Woken::ZPop { member, score, .. }) = returned {
                    zset.add(score, member);
                }
                Ok(ServeStep::Skipped)
            }
        }
    })
    .unwrap_or(ServeStep::Stop)
}

fn pop_one(zset: &mut SortedSet, side: PopSide) -> Option<crate::core::storage::zset::ZSetEntry> {
    match side {
        PopSide::Min => zset.pop_min(1).pop(),
        PopSide::Max => zset.pop_max(1).pop(),
    }
}

/// Moves one element from `source` to `target` for a `BLMOVE` waiter.
///
/// Requires the exclusive gate: the two keys are updated in separate guards.
fn serve_move(
    state: &ServerState,
    db: usize,
    source: &Bytes,
    target: &Bytes,
    from: Side,
    to: Side,
    waiter: &WaiterInfo,
) -> ServeStep {
    let has_data = read(state, db, source, |cell| {
        Ok(matches!(cell, Some(ValueCell { data: DataValue::List(l), .. }) if !l.is_empty()))
    })
    .unwrap_or(false);
    if !has_data {
        return ServeStep::Stop;
    }
    let target_is_list = read(state, db, target, |cell| {
        Ok(cell.is_none_or(|c| matches!(c.data, DataValue::List(_))))
    })
    .unwrap_or(false);
    if !target_is_list {
        waiter.fail(CaradeError::WrongType);
        return ServeStep::Skipped;
    }

    let popped = compute(state, db, source, |slot| {
        Ok(match slot {
            Some(ValueCell {
                data: DataValue::List(list),
                ..
            }) => from.pop(list),
            _ => None,
        })
    });
    let Ok(Some(value)) = popped else {
        return ServeStep::Stop;
    };
    let pushed = push_list(state, db, target, to, value.clone());

    match (pushed, waiter.commit(Woken::Moved { value: value.clone() })) {
        (Ok(()), Ok(())) => {
            log(
                state,
                db,
                vec![
                    Bytes::from_static(b"LMOVE"),
                    source.clone(),
                    target.clone(),
                    from.as_bytes(),
                    to.as_bytes(),
                ],
            );
            state.watches.notify_watchers(db, source);
            ServeStep::Served(Some(target.clone()))
        }
        (pushed, _) => {
            if pushed.is_ok() {
                let _ = state.keyspace.compute(db, target, |slot| {
                    if let Some(ValueCell {
                        data: DataValue::List(list),
                        ..
                    }) = slot
                    {
                        to.pop(list);
                    }
                    Ok(())
                });
            }
            let _ = push_list(state, db, source, from, value);
            ServeStep::Skipped
        }
    }
}

fn push_list(state: &ServerState, db: usize, key: &Bytes, side: Side, value: Bytes) -> Result<(), CaradeError> {
    compute(state, db, key, |slot| {
    let cell = slot.get_or_insert_with(|| ValueCell::new(DataValue::List(VecDeque::new())));
    match &mut cell.data {
        DataValue::List(list) => {
            side.push(list, value);
            Ok(())
        }
        _ => Err(CaradeError::WrongType),
    }
})
}

/// Serves a key from a fresh task holding the exclusive gate.
fn schedule_exclusive_serve(state: &Arc<ServerState>, db: usize, key: &Bytes) {
let state = state.clone();
let key = key.clone();
tokio::spawn(async move {
    let _gate = state.gate.exclusive().await;
    state
        .blocker_manager
        .on_key_mutated(&state, db, &key, GateMode::Exclusive);
});
}
