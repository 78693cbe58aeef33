//! Least-recently-used memo of model evaluations keyed by feature context.

use std::{collections::HashMap, sync::Arc};

/// Score vector shared between the cache and the search.
pub type Scores = Arc<[f64]>;

const NIL: usize = usize::MAX;

#[derive(Debug)]
struct Node {
    key: Vec<String>,
    value: Scores,
    prev: usize,
    next: usize,
}

/// Fixed-capacity LRU cache. A capacity of 0 disables caching entirely.
///
/// Nodes live in an arena and are linked by index; `head` is the most
/// recently used entry and `tail` the next to be evicted.
#[derive(Debug)]
pub struct EvaluationCache {
    capacity: usize,
    map: HashMap<Vec<String>, usize>,
    nodes: Vec<Node>,
    head: usize,
    tail: usize,
    hits: u64,
    misses: u64,
}

impl EvaluationCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            map: HashMap::with_capacity(capacity),
            nodes: Vec::with_capacity(capacity),
            head: NIL,
            tail: NIL,
            hits: 0,
            misses: 0,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.capacity > 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn hits(&self) -> u64 {
        self.hits
    }

    pub fn misses(&self) -> u64 {
        self.misses
    }

    /// Looks up `context` and marks it most recently used.
    pub fn get(&mut self, context: &[String]) -> Option<Scores> {
        if !self.is_enabled() {
            return None;
        }
        match self.map.get(context).copied() {
            Some(idx) => {
                self.hits += 1;
                self.detach(idx);
                self.push_front(idx);
                Some(self.nodes[idx].value.clone())
            }
            None => {
                self.misses += 1;
                None
            }
        }
    }

    /// Stores `scores` for `context`, evicting the least recently used entry when full.
    pub fn put(&mut self, context: Vec<String>, scores: Scores) {
        if !self.is_enabled() {
            return;
        }
        if let Some(&idx) = self.map.get(&context) {
            self.nodes[idx].value = scores;
            self.detach(idx);
            self.push_front(idx);
            return;
        }
        let idx = if self.nodes.len() < self.capacity {
            self.nodes.push(Node { key: context.clone(), value: scores, prev: NIL, next: NIL });
            self.nodes.len() - 1
        } else {
            // Reuse the slot of the evicted tail.
            let idx = self.tail;
            self.detach(idx);
            let node = &mut self.nodes[idx];
            let old = std::mem::replace(&mut node.key, context.clone());
            node.value = scores;
            self.map.remove(&old);
            idx
        };
        self.map.insert(context, idx);
        self.push_front(idx);
    }

    pub fn clear(&mut self) {
        self.map.clear();
        self.nodes.clear();
        self.head = NIL;
        self.tail = NIL;
    }

    fn detach(&mut self, idx: usize) {
        let (prev, next) = (self.nodes[idx].prev, self.nodes[idx].next);
        if prev == NIL {
            self.head = next;
        } else {
            self.nodes[prev].next = next;
        }
        if next == NIL {
            self.tail = prev;
        } else {
            self.nodes[next].prev = prev;
        }
        self.nodes[idx].prev = NIL;
        self.nodes[idx].next = NIL;
    }

    fn push_front(&mut self, idx: usize) {
        self.nodes[idx].next = self.head;
        self.nodes[idx].prev = NIL;
        if self.head != NIL {
            self.nodes[self.head].prev = idx;
        }
        self.head = idx;
        if self.tail == NIL {
            self.tail = idx;
        }
    }
}
