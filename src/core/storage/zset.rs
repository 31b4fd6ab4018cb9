// src/core/storage/zset.rs

use bytes::Bytes;
use std::cmp::Ordering;
use std::collections::{BTreeSet, HashMap, btree_set};
use std::fmt;
use std::ops::Bound;

/// One member of a sorted set, ordered by score and then by member bytes.
#[derive(Debug, Clone)]
pub struct ZSetEntry {
    pub score: f64,
    pub member: Bytes,
}

impl Ord for ZSetEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        self.score
            .total_cmp(&other.score)
            .then_with(|| self.member.cmp(&other.member))
    }
}

impl PartialOrd for ZSetEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for ZSetEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for ZSetEntry {}

/// One end of a score interval, as written in `ZRANGEBYSCORE`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ScoreBoundary {
    Inclusive(f64),
    Exclusive(f64),
}

impl ScoreBoundary {
    pub fn value(&self) -> f64 {
        match self {
            ScoreBoundary::Inclusive(v) | ScoreBoundary::Exclusive(v) => *v,
        }
    }

    fn admits_from_below(&self, score: f64) -> bool {
        match self {
            ScoreBoundary::Inclusive(min) => score >= *min,
            ScoreBoundary::Exclusive(min) => score > *min,
        }
    }

    fn admits_from_above(&self, score: f64) -> bool {
        match self {
            ScoreBoundary::Inclusive(max) => score <= *max,
            ScoreBoundary::Exclusive(max) => score < *max,
        }
    }
}

impl fmt::Display for ScoreBoundary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScoreBoundary::Inclusive(score) => write!(f, "{score}"),
            ScoreBoundary::Exclusive(score) => write!(f, "({score}"),
        }
    }
}

/// What `SortedSet::insert` did to the member.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    Added,
    Updated,
    Unchanged,
}

/// Member-to-score map paired with an ordered index.
///
/// Every member present in `members` has exactly one entry in `sorted`
/// carrying the same score.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SortedSet {
    members: HashMap<Bytes, f64>,
    sorted: BTreeSet<ZSetEntry>,
}

impl SortedSet {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn iter(&self) -> btree_set::Iter<'_, ZSetEntry> {
        self.sorted.iter()
    }

    pub fn memory_usage(&self) -> usize {
        // Each member is stored twice: as a map key and inside the tree entry.
        self.members
            .keys()
            .map(|member| 2 * (member.len() + std::mem::size_of::<f64>()))
            .sum()
    }

    /// Inserts or rescores `member`. Returns 1 only if the member was new.
    pub fn add(&mut self, score: f64, member: Bytes) -> usize {
        match self.insert(score, member) {
            AddOutcome::Added => 1,
            AddOutcome::Updated | AddOutcome::Unchanged => 0,
        }
    }

    pub fn insert(&mut self, score: f64, member: Bytes) -> AddOutcome {
        // -0.0 and 0.0 must share a slot in the tree.
        let score = if score == 0.0 { 0.0 } else { score };
        match self.members.insert(member.clone(), score) {
            Some(old) if old.total_cmp(&score) == Ordering::Equal => AddOutcome::Unchanged,
            Some(old) => {
                self.sorted.remove(&ZSetEntry {
                    score: old,
                    member: member.clone(),
                });
                self.sorted.insert(ZSetEntry { score, member });
                AddOutcome::Updated
            }
            None => {
                self.sorted.insert(ZSetEntry { score, member });
                AddOutcome::Added
            }
        }
    }

    /// Adds `delta` to the member's score, inserting it at `delta` when absent.
    /// Returns `None` and leaves the set untouched if the sum is NaN.
    pub fn incr_by(&mut self, delta: f64, member: Bytes) -> Option<f64> {
        let current = self.members.get(&member).copied().unwrap_or(0.0);
        let updated = current + delta;
        if updated.is_nan() {
            return None;
        }
        self.insert(updated, member);
        Some(updated)
    }

    /// Removes a member, returning its score.
    pub fn remove(&mut self, member: &Bytes) -> Option<f64> {
        let score = self.members.remove(member)?;
        self.sorted.remove(&ZSetEntry {
            score,
            member: member.clone(),
        });
        Some(score)
    }

    pub fn score(&self, member: &Bytes) -> Option<f64> {
        self.members.get(member).copied()
    }

    /// 0-based position of `member` in ascending order.
    pub fn rank(&self, member: &Bytes) -> Option<usize> {
        let score = self.score(member)?;
        let bound = ZSetEntry {
            score,
            member: member.clone(),
        };
        Some(self.sorted.range(..bound).count())
    }

    pub fn pop_min(&mut self, count: usize) -> Vec<ZSetEntry> {
        let mut popped = Vec::with_capacity(count.min(self.len()));
        while popped.len() < count {
            let Some(entry) = self.sorted.pop_first() else {
                break;
            };
            self.members.remove(&entry.member);
            popped.push(entry);
        }
        popped
    }

    pub fn pop_max(&mut self, count: usize) -> Vec<ZSetEntry> {
        let mut popped = Vec::with_capacity(count.min(self.len()));
        while popped.len() < count {
            let Some(entry) = self.sorted.pop_last() else {
                break;
            };
            self.members.remove(&entry.member);
            popped.push(entry);
        }
        popped
    }

    /// Entries with ranks in `start..=stop`; negative indices count from the end.
    pub fn range_by_rank(&self, start: i64, stop: i64) -> Vec<ZSetEntry> {
        match normalize_rank_range(start, stop, self.len()) {
            Some((skip, take)) => self.sorted.iter().skip(skip).take(take).cloned().collect(),
            None => vec![],
        }
    }

    /// Like `range_by_rank` but ranks are counted from the highest score.
    pub fn rev_range_by_rank(&self, start: i64, stop: i64) -> Vec<ZSetEntry> {
        match normalize_rank_range(start, stop, self.len()) {
            Some((skip, take)) => self
                .sorted
                .iter()
                .rev()
                .skip(skip)
                .take(take)
                .cloned()
                .collect(),
            None => vec![],
        }
    }

    /// Entries whose score lies between `min` and `max`, ascending.
    pub fn range_by_score(&self, min: ScoreBoundary, max: ScoreBoundary) -> Vec<ZSetEntry> {
        if min.value() > max.value() {
            return vec![];
        }
        // The empty member sorts first among entries with the same score.
        let start = ZSetEntry {
            score: if min.value() == 0.0 { 0.0 } else { min.value() },
            member: Bytes::new(),
        };
        self.sorted
            .range((Bound::Included(start), Bound::Unbounded))
            .skip_while(|e| !min.admits_from_below(e.score))
            .take_while(|e| max.admits_from_above(e.score))
            .cloned()
            .collect()
    }
}

fn normalize_rank_range(start: i64, stop: i64, len: usize) -> Option<(usize, usize)> {
    let len = len as i64;
    if len == 0 {
        return None;
    }
    let start = if start < 0 { len + start } else { start }.max(0);
    let stop = if stop < 0 { len + stop } else { stop }.min(len - 1);
    if start > stop || start >= len {
        return None;
    }
    Some((start as usize, (stop - start + 1) as usize))
}
