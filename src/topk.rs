//! A bounded top-k collector.
//!
//! `BoundedHeap` keeps the `k` best `(score, key)` entries seen so far in a
//! fixed-capacity min-heap: the root is always the worst retained entry, and an
//! incoming entry only gets in by evicting it. Higher scores are better; among
//! equal scores the smaller key is better, which makes the retained set and its
//! order independent of insertion order.

use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

/// A scored entry ordered so that "greater" means "ranks higher".
#[derive(Debug, Clone)]
struct Ranked<K> {
  score: f32,
  key: K,
}

impl<K: Ord> Ord for Ranked<K> {
  fn cmp(&self, other: &Self) -> Ordering {
    self
      .score
      .total_cmp(&other.score)
      .then_with(|| other.key.cmp(&self.key))
  }
}

impl<K: Ord> PartialOrd for Ranked<K> {
  fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
    Some(self.cmp(other))
  }
}

impl<K: Ord> PartialEq for Ranked<K> {
  fn eq(&self, other: &Self) -> bool {
    self.cmp(other) == Ordering::Equal
  }
}

impl<K: Ord> Eq for Ranked<K> {}

/// Collects the `capacity` highest-scoring keys.
#[derive(Debug, Clone)]
pub struct BoundedHeap<K> {
  capacity: usize,
  heap: BinaryHeap<Reverse<Ranked<K>>>,
}

impl<K: Ord> BoundedHeap<K> {
  /// Creates a collector that retains at most `capacity` entries.
  pub fn new(capacity: usize) -> Self {
    Self {
      capacity,
      heap: BinaryHeap::with_capacity(capacity.min(4096)),
    }
  }

  /// Offers an entry. Returns `true` if it was retained.
  pub fn push(&mut self, score: f32, key: K) -> bool {
    if self.capacity == 0 {
      return false;
    }

    let candidate = Ranked { score, key };
    if self.heap.len() < self.capacity {
      self.heap.push(Reverse(candidate));
      return true;
    }

    match self.heap.peek() {
      Some(Reverse(worst)) if candidate > *worst => {
        self.heap.pop();
        self.heap.push(Reverse(candidate));
        true
      }
      _ => false,
    }
  }

  /// Number of retained entries.
  pub fn len(&self) -> usize {
    self.heap.len()
  }

  /// Returns `true` if nothing has been retained.
  pub fn is_empty(&self) -> bool {
    self.heap.is_empty()
  }

  /// Consumes the collector, returning entries best-first.
  pub fn into_sorted_vec(self) -> Vec<(f32, K)> {
    // Ascending order of `Reverse<_>` is descending rank.
    self
      .heap
      .into_sorted_vec()
      .into_iter()
      .map(|Reverse(ranked)| (ranked.score, ranked.key))
      .collect()
  }
}
