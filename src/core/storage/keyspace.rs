// src/core/storage/keyspace.rs

//! The per-database maps from key to `ValueCell`.
//!
//! Each database is a `DashMap`, so a single key's compute-and-replace is
//! atomic with respect to every other access to that key. Cross-key atomicity
//! is the job of the `Gate`, which callers hold while using this store.

use super::data_types::{DataValue, LfuInfo, ValueCell, unix_millis};
use super::key_index::DbIndex;
use crate::core::CaradeError;
use bytes::Bytes;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use rand::SeedableRng;
use rand::rngs::SmallRng;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// Result of one active-expiry sample on a database.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ExpirySample {
    /// Number of volatile keys inspected.
    pub sampled: usize,
    /// Keys that were past their deadline and have been removed.
    pub expired: Vec<Bytes>,
}

#[derive(Debug)]
pub struct Keyspace {
    dbs: Vec<DashMap<Bytes, ValueCell>>,
    /// Sampling indexes, one per database, kept in step with `dbs`.
    indexes: Vec<DbIndex>,
    used_memory: AtomicUsize,
    loading: AtomicBool,
}

impl Keyspace {
    pub fn new(databases: usize) -> Self {
        Self {
            dbs: (0..databases).map(|_| DashMap::new()).collect(),
            indexes: (0..databases).map(|_| DbIndex::default()).collect(),
            used_memory: AtomicUsize::new(0),
            loading: AtomicBool::new(false),
        }
    }

    /// While loading, nothing counts as expired, so a replayed key keeps its
    /// past deadline instead of vanishing before later records touch it.
    pub fn set_loading(&self, loading: bool) {
        self.loading.store(loading, Ordering::Release);
    }

    /// The clock expiry is judged against: unix milliseconds, or 0 while loading.
    pub fn now(&self) -> u64 {
        if self.loading.load(Ordering::Acquire) {
            0
        } else {
            unix_millis()
        }
    }

    pub fn db_count(&self) -> usize {
        self.dbs.len()
    }

    fn db(&self, db: usize) -> Result<&DashMap<Bytes, ValueCell>, CaradeError> {
        self.dbs.get(db).ok_or(CaradeError::DbIndexOutOfRange)
    }

    /// Bytes accounted to keys and payloads across all databases.
    pub fn used_memory(&self) -> usize {
        self.used_memory.load(Ordering::Relaxed)
    }

    fn update_memory(&self, diff: isize) {
        if diff > 0 {
            self.used_memory.fetch_add(diff as usize, Ordering::Relaxed);
        } else if diff < 0 {
            let _ = self
                .used_memory
                .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |cur| {
                    Some(cur.saturating_sub((-diff) as usize))
                });
        }
    }

    fn footprint(key: &Bytes, cell: &ValueCell) -> isize {
        (key.len() + cell.size) as isize
    }

    /// Runs `f` over the live value of `key` and writes back whatever `f` leaves in the slot.
    ///
    /// An expired cell is presented as `None`. A slot left as `None` or holding an
    /// empty container removes the key. The shard lock for `key` is held for the
    /// whole call, so `f` must not touch the same database map again.
    pub fn compute<R, F>(&self, db: usize, key: &Bytes, f: F) -> Result<R, CaradeError>
    where
        F: FnOnce(&mut Option<ValueCell>) -> Result<R, CaradeError>,
    {
        self.compute_observed(db, key, |slot, _| f(slot))
    }

    /// Like `compute`, also telling `f` whether an expired cell was dropped to
    /// present the empty slot. The flag lets callers log that removal before
    /// their own write, under the same guard.
    pub fn compute_observed<R, F>(&self, db: usize, key: &Bytes, f: F) -> Result<R, CaradeError>
    where
        F: FnOnce(&mut Option<ValueCell>, bool) -> Result<R, CaradeError>,
    {
        let map = self.db(db)?;
        let index = &self.indexes[db];
        let now = self.now();
        match map.entry(key.clone()) {
            Entry::Occupied(mut occupied) => {
                let before = Self::footprint(key, occupied.get());
                let expired = occupied.get().is_expired_at(now);
                let mut slot = if expired {
                    None
                } else {
                    let mut cell = std::mem::replace(occupied.get_mut(), ValueCell::placeholder());
                    cell.touch();
                    Some(cell)
                };
                let result = f(&mut slot, expired);
                match slot {
                    Some(mut cell) if !cell.data.is_empty_container() => {
                        cell.size = cell.data.memory_usage();
                        self.update_memory(Self::footprint(key, &cell) - before);
                        index.track(key, Some(&cell));
                        *occupied.get_mut() = cell;
                    }
                    _ => {
                        occupied.remove();
                        index.track(key, None);
                        self.update_memory(-before);
                    }
                }
                result
            }
            Entry::Vacant(vacant) => {
                let mut slot = None;
                let result = f(&mut slot, false);
                if let Some(mut cell) = slot
                    && !cell.data.is_empty_container()
                {
                    cell.size = cell.data.memory_usage();
                    self.update_memory(Self::footprint(key, &cell));
                    index.track(key, Some(&cell));
                    vacant.insert(cell);
                }
                result
            }
        }
    }

    /// Runs `f` over the live value of `key` without changing it.
    ///
    /// Records the access, and removes the key first if it has expired.
    pub fn read<R, F>(&self, db: usize, key: &Bytes, f: F) -> Result<R, CaradeError>
    where
        F: FnOnce(Option<&ValueCell>) -> Result<R, CaradeError>,
    {
        self.read_observed(db, key, |_| {}, f)
    }

    /// Like `read`, running `on_expired` under the key's shard lock if the read
    /// found the key expired and removed it.
    pub fn read_observed<R, E, F>(&self, db: usize, key: &Bytes, on_expired: E, f: F) -> Result<R, CaradeError>
    where
        E: FnOnce(&Bytes),
        F: FnOnce(Option<&ValueCell>) -> Result<R, CaradeError>,
    {
        let map = self.db(db)?;
        let now = self.now();
        if let Some(mut cell) = map.get_mut(key) {
            if !cell.is_expired_at(now) {
                cell.touch();
                return f(Some(&*cell));
            }
        } else {
            return f(None);
        }
        self.remove_if_expired_with(db, key, on_expired);
        f(None)
    }

    pub fn get(&self, db: usize, key: &Bytes) -> Option<ValueCell> {
        self.read(db, key, |cell| Ok(cell.cloned())).ok().flatten()
    }

    /// Stores `cell` under `key`, returning the previous live value.
    pub fn put(&self, db: usize, key: Bytes, cell: ValueCell) -> Option<ValueCell> {
        self.compute(db, &key, |slot| Ok(slot.replace(cell))).ok().flatten()
    }

    /// Removes `key`, returning its value if it was live.
    pub fn remove(&self, db: usize, key: &Bytes) -> Option<ValueCell> {
        self.remove_with(db, key, |_| {})
    }

    /// Like `remove`, but runs `on_removed` while the key's shard lock is still held.
    pub fn remove_with<F>(&self, db: usize, key: &Bytes, on_removed: F) -> Option<ValueCell>
    where
        F: FnOnce(&Bytes),
    {
        let map = self.db(db).ok()?;
        let index = &self.indexes[db];
        let (_, cell) = map.remove_if(key, |k, _| {
            on_removed(k);
            index.track(k, None);
            true
        })?;
        self.update_memory(-Self::footprint(key, &cell));
        (!cell.is_expired_at(self.now())).then_some(cell)
    }

    pub fn exists(&self, db: usize, key: &Bytes) -> bool {
        self.read(db, key, |cell| Ok(cell.is_some())).unwrap_or(false)
    }

    /// Removes `key` only if it is past its deadline. Returns whether it was removed.
    pub fn remove_if_expired(&self, db: usize, key: &Bytes) -> bool {
        self.remove_if_expired_with(db, key, |_| {})
    }

    /// Like `remove_if_expired`, running `on_expired` under the key's shard lock.
    pub fn remove_if_expired_with<F>(&self, db: usize, key: &Bytes, on_expired: F) -> bool
    where
        F: FnOnce(&Bytes),
    {
        let Ok(map) = self.db(db) else {
            return false;
        };
        let index = &self.indexes[db];
        let now = self.now();
        let removed = map.remove_if(key, |k, cell| {
            let expired = cell.is_expired_at(now);
            if expired {
                on_expired(k);
                index.track(k, None);
            }
            expired
        });
        match removed {
            Some((k, cell)) => {
                self.update_memory(-Self::footprint(&k, &cell));
                true
            }
            None => false,
        }
    }

    /// Lazily yields the live keys of `db`.
    ///
    /// The iterator holds shard read locks while it runs; do not mutate the
    /// same database until it is dropped.
    pub fn keys(&self, db: usize) -> impl Iterator<Item = Bytes> + '_ {
        let now = self.now();
        self.dbs
            .get(db)
            .into_iter()
            .flat_map(|map| map.iter())
            .filter(move |entry| !entry.value().is_expired_at(now))
            .map(|entry| entry.key().clone())
    }

    /// Number of entries in `db`, including ones that have expired but not yet been removed.
    pub fn dbsize(&self, db: usize) -> usize {
        self.dbs.get(db).map_or(0, |map| map.len())
    }

    pub fn total_keys(&self) -> usize {
        self.dbs.iter().map(|map| map.len()).sum()
    }

    /// Empties one database and returns how many keys it held.
    pub fn clear(&self, db: usize) -> usize {
        let Some(map) = self.dbs.get(db) else {
            return 0;
        };
        let mut freed = 0isize;
        let mut count = 0;
        map.retain(|key, cell| {
            freed += Self::footprint(key, cell);
            count += 1;
            false
        });
        self.indexes[db].clear();
        self.update_memory(-freed);
        count
    }

    pub fn clear_all(&self) {
        for db in 0..self.dbs.len() {
            self.clear(db);
        }
    }

    /// Deep copy of every live key, grouped by database.
    ///
    /// Callers hold the gate exclusively so the copy is a consistent point-in-time view.
    pub fn snapshot(&self) -> Vec<Vec<(Bytes, ValueCell)>> {
        let now = self.now();
        self.dbs
            .iter()
            .map(|map| {
                map.iter()
                    .filter(|entry| !entry.value().is_expired_at(now))
                    .map(|entry| (entry.key().clone(), entry.value().clone()))
                    .collect()
            })
            .collect()
    }

    /// Samples up to `count` volatile keys of `db` and removes the expired ones.
    ///
    /// Draws from the database's volatile index, so the cost follows `count`
    /// rather than the size of the database. `on_expired` runs for each
    /// removed key while its shard lock is held.
    pub fn sample_expired<F>(&self, db: usize, count: usize, mut on_expired: F) -> ExpirySample
    where
        F: FnMut(&Bytes),
    {
        let Some(index) = self.indexes.get(db) else {
            return ExpirySample::default();
        };
        let mut rng = SmallRng::from_entropy();
        let candidates = index.volatile.sample(count, &mut rng);
        let sampled = candidates.len();
        let expired = candidates
            .into_iter()
            .filter(|key| self.remove_if_expired_with(db, key, &mut on_expired))
            .collect();
        ExpirySample { sampled, expired }
    }

    /// Picks up to `count` random entries of `db`, optionally only volatile ones,
    /// returning the metadata eviction policies rank by.
    pub fn sample_for_eviction(
        &self,
        db: usize,
        count: usize,
        volatile_only: bool,
        rng: &mut SmallRng,
    ) -> Vec<EvictionCandidate> {
        let (Some(map), Some(index)) = (self.dbs.get(db), self.indexes.get(db)) else {
            return Vec::new();
        };
        let keys = if volatile_only {
            index.volatile.sample(count, rng)
        } else {
            index.all.sample(count, rng)
        };
        keys.into_iter()
            .filter_map(|key| {
                let entry = map.get(&key)?;
                let cell = entry.value();
                if volatile_only && cell.expire_at.is_none() {
                    return None;
                }
                Some(EvictionCandidate {
                    db,
                    last_accessed: cell.last_accessed,
                    lfu_counter: cell.lfu_counter(),
                    expire_at: cell.expire_at,
                    key,
                })
            })
            .collect()
    }
}

/// A sampled key with the fields eviction policies compare.
#[derive(Debug, Clone)]
pub struct EvictionCandidate {
    pub db: usize,
    pub key: Bytes,
    pub last_accessed: u64,
    pub lfu_counter: u8,
    pub expire_at: Option<u64>,
}

impl ValueCell {
    /// Stand-in left in a map slot while `Keyspace::compute` owns the real cell.
    pub(crate) fn placeholder() -> Self {
        Self {
            data: DataValue::String(Bytes::new()),
            expire_at: None,
            last_accessed: 0,
            lfu: LfuInfo {
                last_decrement_time: 0,
                counter: 0,
            },
            size: 0,
        }
    }
}
