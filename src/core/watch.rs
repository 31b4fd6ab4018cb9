// src/core/watch.rs

//! The global index of `WATCH`ed keys.
//!
//! A session owns one `WatchFlag`; the registry maps every watched key to the
//! flags of the sessions watching it. A successful mutation of the key flips
//! those flags. Nothing compares values: a key that was touched is dirty even
//! if it ends up holding the same data.

use bytes::Bytes;
use dashmap::DashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

#[derive(Debug, Default)]
pub struct WatchFlag {
    dirty: AtomicBool,
}

impl WatchFlag {
    pub fn is_dirty(&self) -> bool {
        self.dirty.load(Ordering::Acquire)
    }

    fn mark(&self) {
        self.dirty.store(true, Ordering::Release);
    }
}

#[derive(Debug, Default)]
pub struct WatchRegistry {
    watchers: DashMap<(usize, Bytes), Vec<Arc<WatchFlag>>>,
}

impl WatchRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn watch(&self, db: usize, key: Bytes, flag: &Arc<WatchFlag>) {
        let mut flags = self.watchers.entry((db, key)).or_default();
        if !flags.iter().any(|f| Arc::ptr_eq(f, flag)) {
            flags.push(flag.clone());
        }
    }

    /// Drops `flag` from every key in `keys`.
    pub fn unwatch(&self, keys: &[(usize, Bytes)], flag: &Arc<WatchFlag>) {
        for key in keys {
            let now_empty = match self.watchers.get_mut(key) {
                Some(mut flags) => {
                    flags.retain(|f| !Arc::ptr_eq(f, flag));
                    flags.is_empty()
                }
                None => false,
            };
            if now_empty {
                self.watchers.remove_if(key, |_, flags| flags.is_empty());
            }
        }
    }

    /// Marks every session watching `key` as dirty.
    pub fn notify_watchers(&self, db: usize, key: &Bytes) {
        if self.watchers.is_empty() {
            return;
        }
        if let Some(flags) = self.watchers.get(&(db, key.clone())) {
            flags.iter().for_each(|f| f.mark());
        }
    }

    /// Marks every watcher of a key in `db`, or in any db when `db` is `None`.
    pub fn notify_db(&self, db: Option<usize>) {
        for entry in self.watchers.iter() {
            if db.is_none_or(|d| d == entry.key().0) {
                entry.value().iter().for_each(|f| f.mark());
            }
        }
    }

    pub fn watched_key_count(&self) -> usize {
        self.watchers.len()
    }
}

/// The `WATCH` state one connection carries.
#[derive(Debug, Default)]
pub struct WatchSet {
    pub flag: Arc<WatchFlag>,
    pub keys: Vec<(usize, Bytes)>,
}

impl WatchSet {
    pub fn add(&mut self, registry: &WatchRegistry, db: usize, key: Bytes) {
        registry.watch(db, key.clone(), &self.flag);
        if !self.keys.iter().any(|(d, k)| *d == db && *k == key) {
            self.keys.push((db, key));
        }
    }

    pub fn is_dirty(&self) -> bool {
        self.flag.is_dirty()
    }

    /// Unregisters every key and starts over with a clean flag.
    pub fn clear(&mut self, registry: &WatchRegistry) {
        registry.unwatch(&self.keys, &self.flag);
        self.keys.clear();
        self.flag = Arc::new(WatchFlag::default());
    }
}
