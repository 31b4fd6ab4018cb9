// src/core/storage/eviction.rs

//! Victim selection for the `maxmemory` policies.

use super::keyspace::{EvictionCandidate, Keyspace};
use crate::config::EvictionPolicy;
use bytes::Bytes;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, warn};

/// Keys sampled from each database per pick.
const SAMPLE_SIZE: usize = 5;

impl Keyspace {
    /// Removes one key chosen by `policy` and returns where it lived.
    ///
    /// Volatile policies that find no key with a TTL fall back to allkeys-random.
    /// `on_evicted` runs while the victim's shard lock is held.
    pub fn evict_one<F>(&self, policy: EvictionPolicy, on_evicted: F) -> Option<(usize, Bytes)>
    where
        F: FnOnce(usize, &Bytes),
    {
        if policy == EvictionPolicy::NoEviction || self.total_keys() == 0 {
            return None;
        }
        let mut rng = SmallRng::from_entropy();

        let picked = match policy {
            EvictionPolicy::AllkeysLru => self.pick_by(&mut rng, false, |c| c.last_accessed),
            EvictionPolicy::VolatileLru => self.pick_by(&mut rng, true, |c| c.last_accessed),
            EvictionPolicy::AllkeysLfu => self.pick_by(&mut rng, false, |c| c.lfu_counter as u64),
            EvictionPolicy::VolatileLfu => self.pick_by(&mut rng, true, |c| c.lfu_counter as u64),
            EvictionPolicy::VolatileTtl => {
                self.pick_by(&mut rng, true, |c| c.expire_at.unwrap_or(u64::MAX))
            }
            EvictionPolicy::AllkeysRandom => self.pick_random(&mut rng, false),
            EvictionPolicy::VolatileRandom => self.pick_random(&mut rng, true),
            EvictionPolicy::NoEviction => None,
        };

        let picked = match picked {
            Some(candidate) => Some(candidate),
            None => {
                warn!(
                    "Could not find a key to evict with policy '{}'. Falling back to allkeys-random.",
                    policy
                );
                self.pick_random(&mut rng, false)
            }
        }?;

        // An already-expired victim still frees its memory, so any removal counts.
        let mut removed = false;
        self.remove_with(picked.db, &picked.key, |key| {
            removed = true;
            on_evicted(picked.db, key);
        });
        if !removed {
            return None;
        }
        debug!(
            "Evicted key '{}' from db {} ({}).",
            String::from_utf8_lossy(&picked.key),
            picked.db,
            policy
        );
        Some((picked.db, picked.key))
    }

    /// Samples every non-empty database and keeps the candidate with the lowest rank.
    fn pick_by<F>(&self, rng: &mut SmallRng, volatile_only: bool, rank: F) -> Option<EvictionCandidate>
    where
        F: Fn(&EvictionCandidate) -> u64,
    {
        (0..self.db_count())
            .filter(|&db| self.dbsize(db) > 0)
            .flat_map(|db| self.sample_for_eviction(db, SAMPLE_SIZE, volatile_only, rng))
            .min_by_key(|c| rank(c))
    }

    fn pick_random(&self, rng: &mut SmallRng, volatile_only: bool) -> Option<EvictionCandidate> {
        let populated: Vec<usize> = (0..self.db_count())
            .filter(|&db| self.dbsize(db) > 0)
            .collect();
        if populated.is_empty() {
            return None;
        }
        let db = populated[rng.gen_range(0..populated.len())];
        self.sample_for_eviction(db, 1, volatile_only, rng).pop()
    }
}
