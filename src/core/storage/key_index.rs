// src/core/storage/key_index.rs

//! Random-access key lists that let expiry and eviction sample a database
//! without walking its whole map.
//!
//! Keys are spread over lock stripes by hash. `Keyspace` updates the index
//! while it holds the key's shard lock, so for any one key the index agrees
//! with the map once the mutation returns.

use super::data_types::ValueCell;
use bytes::Bytes;
use parking_lot::Mutex;
use rand::Rng;
use rand::rngs::SmallRng;
use std::collections::HashMap;
use std::hash::{BuildHasher, RandomState};

const STRIPES: usize = 16;
/// Random draws allowed per requested key before a sample settles for fewer.
const DRAWS_PER_KEY: usize = 4;

#[derive(Debug, Default)]
struct Stripe {
    keys: Vec<Bytes>,
    positions: HashMap<Bytes, usize>,
}

impl Stripe {
    fn insert(&mut self, key: &Bytes) {
        if self.positions.contains_key(key) {
            return;
        }
        self.positions.insert(key.clone(), self.keys.len());
        self.keys.push(key.clone());
    }

    fn remove(&mut self, key: &Bytes) {
        let Some(pos) = self.positions.remove(key) else {
            return;
        };
        self.keys.swap_remove(pos);
        if let Some(moved) = self.keys.get(pos) {
            self.positions.insert(moved.clone(), pos);
        }
    }
}

/// A set of keys supporting O(1) insert, remove and uniform random pick.
#[derive(Debug)]
pub struct KeyIndex {
    stripes: Vec<Mutex<Stripe>>,
    hasher: RandomState,
}

impl Default for KeyIndex {
    fn default() -> Self {
        Self {
            stripes: (0..STRIPES).map(|_| Mutex::new(Stripe::default())).collect(),
            hasher: RandomState::new(),
        }
    }
}

impl KeyIndex {
    fn stripe(&self, key: &Bytes) -> &Mutex<Stripe> {
        let slot = self.hasher.hash_one(key) as usize % self.stripes.len();
        &self.stripes[slot]
    }

    pub fn insert(&self, key: &Bytes) {
        self.stripe(key).lock().insert(key);
    }

    pub fn remove(&self, key: &Bytes) {
        self.stripe(key).lock().remove(key);
    }

    pub fn len(&self) -> usize {
        self.stripes.iter().map(|s| s.lock().keys.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        for stripe in &self.stripes {
            let mut stripe = stripe.lock();
            stripe.keys.clear();
            stripe.positions.clear();
        }
    }

    /// Up to `count` distinct keys picked uniformly at random.
    ///
    /// Costs O(count) stripe lookups regardless of how many keys are indexed.
    /// Keys inserted or removed while sampling may or may not be seen.
    pub fn sample(&self, count: usize, rng: &mut SmallRng) -> Vec<Bytes> {
        let lens: Vec<usize> = self.stripes.iter().map(|s| s.lock().keys.len()).collect();
        let total: usize = lens.iter().sum();
        if total <= count {
            return self
                .stripes
                .iter()
                .flat_map(|s| s.lock().keys.clone())
                .take(count)
                .collect();
        }

        let mut picked: Vec<Bytes> = Vec::with_capacity(count);
        for _ in 0..count * DRAWS_PER_KEY {
            if picked.len() == count {
                break;
            }
            let mut offset = rng.gen_range(0..total);
            let mut stripe = 0;
            while offset >= lens[stripe] {
                offset -= lens[stripe];
                stripe += 1;
            }
            let guard = self.stripes[stripe].lock();
            if let Some(key) = guard.keys.get(offset)
                && !picked.contains(key)
            {
                picked.push(key.clone());
            }
        }
        picked
    }
}

/// The sampling indexes of one database.
#[derive(Debug, Default)]
pub struct DbIndex {
    pub all: KeyIndex,
    /// Keys that carry a deadline.
    pub volatile: KeyIndex,
}

impl DbIndex {
    /// Records the state `key` was left in: holding `cell`, or removed.
    pub fn track(&self, key: &Bytes, cell: Option<&ValueCell>) {
        match cell {
            Some(cell) => {
                self.all.insert(key);
                if cell.expire_at.is_some() {
                    self.volatile.insert(key);
                } else {
                    self.volatile.remove(key);
                }
            }
            None => {
                self.all.remove(key);
                self.volatile.remove(key);
            }
        }
    }

    pub fn clear(&self) {
        self.all.clear();
        self.volatile.clear();
    }
}
