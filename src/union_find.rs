// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Union-find over the right-availability bit vector.
//!
//! The chainer repeatedly asks "which is the first string at or after
//! position `i + 1` that is still available as a merge right end?" while
//! positions keep getting consumed. Consumed positions form runs; each run
//! is one union-find component whose root remembers the first available
//! position past the run, which makes the query amortised near-constant
//! instead of a linear scan.

use crate::intvec::{bits_for, BitVec, IntVector};

/// Weighted quick-union with iterative path compression.
///
/// `find` is iterative and compresses through a reusable scratch buffer so
/// the hot path never allocates.
#[derive(Debug, Clone)]
pub struct UnionFind {
    parent: Vec<u32>,
    size: Vec<u32>,
    scratch: Vec<u32>,
}

impl UnionFind {
    pub fn new(n: usize) -> Self {
        assert!(n <= u32::MAX as usize, "element count exceeds u32 range");
        UnionFind {
            parent: (0..n as u32).collect(),
            size: vec![1; n],
            scratch: Vec::new(),
        }
    }

    pub fn find(&mut self, mut i: usize) -> usize {
        self.scratch.clear();
        while self.parent[i] as usize != i {
            self.scratch.push(i as u32);
            i = self.parent[i] as usize;
        }
        for &j in &self.scratch {
            self.parent[j as usize] = i as u32;
        }
        i
    }

    /// Unite the components of `a` and `b`; returns the surviving root.
    pub fn union(&mut self, a: usize, b: usize) -> usize {
        let ra = self.find(a);
        let rb = self.find(b);
        if ra == rb {
            return ra;
        }
        if self.size[ra] < self.size[rb] {
            self.parent[ra] = rb as u32;
            self.size[rb] += self.size[ra];
            rb
        } else {
            self.parent[rb] = ra as u32;
            self.size[ra] += self.size[rb];
            ra
        }
    }

    pub fn component_size(&mut self, i: usize) -> usize {
        let r = self.find(i);
        self.size[r] as usize
    }
}

/// Availability bits with a fast "next still-available position" query.
///
/// Positions start available. [`RightAvailability::consume`] retires one;
/// [`RightAvailability::next_available`] returns the smallest available
/// position `>= i + 1`, or `n` when none remains.
#[derive(Debug, Clone)]
pub struct RightAvailability {
    uf: UnionFind,
    /// Per run root: first available position after the run (may be `n`).
    next_free: IntVector,
    available: BitVec,
    n: usize,
}

impl RightAvailability {
    pub fn new(n: usize) -> Self {
        RightAvailability {
            uf: UnionFind::new(n),
            next_free: IntVector::new(n, bits_for(n as u64)),
            available: BitVec::new(n, true),
            n,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.n
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.n == 0
    }

    #[inline]
    pub fn is_available(&self, i: usize) -> bool {
        self.available.get(i)
    }

    pub fn remaining(&self) -> usize {
        self.available.count_ones()
    }

    /// Mark `k` unavailable, merging it into the adjacent runs.
    ///
    /// The caller must not consume a position twice.
    pub fn consume(&mut self, k: usize) {
        debug_assert!(self.available.get(k), "position consumed twice");
        self.available.set(k, false);

        let mut nxt = (k + 1) as u64;
        if k + 1 < self.n && !self.available.get(k + 1) {
            let right_root = self.uf.find(k + 1);
            nxt = self.next_free.get(right_root);
            self.uf.union(k, k + 1);
        }
        if k > 0 && !self.available.get(k - 1) {
            self.uf.union(k - 1, k);
        }
        let root = self.uf.find(k);
        self.next_free.set(root, nxt);
    }

    /// Smallest available position `>= i + 1`, or `n` when none remains.
    pub fn next_available(&mut self, i: usize) -> usize {
        let j = i + 1;
        if j >= self.n {
            return self.n;
        }
        if self.available.get(j) {
            return j;
        }
        let root = self.uf.find(j);
        self.next_free.get(root) as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn union_by_size_and_compression() {
        let mut uf = UnionFind::new(6);
        uf.union(0, 1);
        uf.union(2, 3);
        uf.union(1, 3);
        assert_eq!(uf.find(0), uf.find(2));
        assert_eq!(uf.component_size(3), 4);
        assert_ne!(uf.find(4), uf.find(0));
    }

    #[test]
    fn next_available_skips_runs() {
        let mut ra = RightAvailability::new(8);
        assert_eq!(ra.next_available(0), 1);
        ra.consume(1);
        ra.consume(2);
        ra.consume(3);
        assert_eq!(ra.next_available(0), 4);
        assert_eq!(ra.next_available(1), 4);
        assert_eq!(ra.next_available(3), 4);
        ra.consume(4);
        assert_eq!(ra.next_available(0), 5);
    }

    #[test]
    fn run_merging_across_late_joins() {
        let mut ra = RightAvailability::new(6);
        // Build two runs, then bridge them.
        ra.consume(0);
        ra.consume(2);
        ra.consume(3);
        // The query starts strictly after its argument, so position 1
        // being available does not show up from next_available(1).
        assert_eq!(ra.next_available(1), 4);
        assert!(ra.is_available(1));
        ra.consume(1); // bridges 0 and 2..=3
        assert_eq!(ra.next_available(0), 4);
        ra.consume(5);
        ra.consume(4); // everything gone
        for i in 0..6 {
            assert_eq!(ra.next_available(i), 6, "from {}", i);
        }
        assert_eq!(ra.remaining(), 0);
    }

    #[test]
    fn matches_naive_scan_on_random_pattern() {
        let n = 64;
        let mut ra = RightAvailability::new(n);
        let mut naive = vec![true; n];
        // Deterministic pseudo-random consumption order.
        let mut x = 9u64;
        for _ in 0..n {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            let k = (x >> 33) as usize % n;
            if naive[k] {
                naive[k] = false;
                ra.consume(k);
            }
            for i in 0..n {
                let expect = (i + 1..n).find(|&j| naive[j]).unwrap_or(n);
                assert_eq!(ra.next_available(i), expect, "query from {}", i);
            }
        }
    }
}
