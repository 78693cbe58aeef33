//! Capacity-bounded best-first frontier.
//!
//! Entries are kept in a `BTreeMap` ordered best-first, so both the best entry
//! (for extraction) and the worst entry (for eviction) are reachable in
//! O(log capacity). Equal ranks are broken by insertion order, which keeps
//! repeated extraction of ties deterministic.

use std::{cmp::Ordering, collections::BTreeMap};

use crate::error::{Error, Result};

use super::sequence::Sequence;

/// Anything that can be ranked in a frontier. Higher is better.
pub trait Ranked {
    fn rank(&self) -> f64;
}

impl Ranked for Sequence {
    fn rank(&self) -> f64 {
        Sequence::rank(self)
    }
}

#[derive(Debug, Clone, Copy)]
struct FrontierKey {
    rank: f64,
    order: u64,
}

impl FrontierKey {
    fn new(rank: f64, order: u64) -> Self {
        // NaN never outranks anything.
        let rank = if rank.is_nan() { f64::NEG_INFINITY } else { rank };
        Self { rank, order }
    }
}

impl PartialEq for FrontierKey {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for FrontierKey {}

impl PartialOrd for FrontierKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Best first: higher rank, then earlier insertion.
impl Ord for FrontierKey {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .rank
            .total_cmp(&self.rank)
            .then_with(|| self.order.cmp(&other.order))
    }
}

/// Keeps at most `capacity` of the best items seen so far.
#[derive(Debug)]
pub struct BoundedFrontier<T> {
    entries: BTreeMap<FrontierKey, T>,
    capacity: usize,
    next_order: u64,
}

impl<T: Ranked> BoundedFrontier<T> {
    pub fn new(capacity: usize) -> Result<Self> {
        if capacity < 1 {
            return Err(Error::invalid_config("frontier capacity must be at least 1"));
        }
        Ok(Self { entries: BTreeMap::new(), capacity, next_order: 0 })
    }

    /// Offers `item` to the frontier. Returns `false` if it was dropped.
    ///
    /// At capacity, an item that does not strictly outrank the current worst
    /// entry is dropped; otherwise the worst entry is evicted to make room.
    pub fn insert(&mut self, item: T) -> bool {
        let key = FrontierKey::new(item.rank(), self.next_order);
        if self.entries.len() >= self.capacity {
            match self.entries.last_key_value() {
                Some((worst, _)) if key < *worst => {}
                _ => return false,
            }
        }
        self.next_order += 1;
        self.entries.insert(key, item);
        while self.entries.len() > self.capacity {
            self.entries.pop_last();
        }
        true
    }

    /// Removes and returns the best item.
    pub fn extract_best(&mut self) -> Result<T> {
        self.entries.pop_first().map(|(_, item)| item).ok_or(Error::EmptyFrontier)
    }

    pub fn peek_best(&self) -> Result<&T> {
        self.entries.first_key_value().map(|(_, item)| item).ok_or(Error::EmptyFrontier)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.next_order = 0;
    }

    /// Changes the capacity. Shrinking keeps the best `capacity` items.
    pub fn resize(&mut self, capacity: usize) -> Result<()> {
        if capacity < 1 {
            return Err(Error::invalid_config("frontier capacity must be at least 1"));
        }
        self.capacity = capacity;
        while self.entries.len() > capacity {
            self.entries.pop_last();
        }
        Ok(())
    }
}
