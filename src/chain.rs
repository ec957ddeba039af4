// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Superstring chaining: accept overlap candidates, refuse cycles, emit.
//!
//! Both cores end up here. The Aho-Corasick engine produces a finished
//! [`ChainSet`] directly; the suffix-tree core drives a
//! [`SuperstringBuilder`] through its match callback, one candidate at a
//! time, and asks for the chain set afterwards.
//!
//! The acceptance rule is the classical greedy one: a candidate
//! `(left, right, overlap)` is taken iff `right` is still available as a
//! right end and the merge would not close a cycle. `leftend`/`rightend`
//! track chain endpoints so the cycle test is a single comparison, and the
//! union-find in [`crate::union_find::RightAvailability`] finds the first
//! admissible `right` inside a suffix-array window without scanning.

use std::io::{self, Write};

use crate::intvec::{bits_for, BitVec, IntVector};
use crate::records::{Merge, MergeArray};
use crate::types::Successor;
use crate::union_find::RightAvailability;

/// A finished run: successor edges plus the chain start set.
pub struct ChainSet {
    pub links: Vec<Option<Successor>>,
    pub start_positions: Vec<usize>,
}

/// Write the superstring described by a chain set.
///
/// `string_at(i)` returns the stored bytes of string `i`; `map_byte`
/// translates them on the way out (alphabet decode for the compacted
/// core, identity otherwise). Each chain start is written in full and
/// every successor from its overlap offset onward.
pub fn write_superstring<'a, W, F, M>(
    chains: &ChainSet,
    string_at: F,
    map_byte: M,
    out: &mut W,
) -> io::Result<()>
where
    W: Write,
    F: Fn(usize) -> &'a [u8],
    M: Fn(u8) -> u8,
{
    let mut buf = Vec::new();
    for &start in &chains.start_positions {
        buf.clear();
        buf.extend(string_at(start).iter().map(|&c| map_byte(c)));
        out.write_all(&buf)?;

        let mut cur = start;
        while let Some(succ) = chains.links[cur] {
            let bytes = string_at(succ.index);
            debug_assert!(succ.overlap <= bytes.len());
            buf.clear();
            buf.extend(bytes[succ.overlap..].iter().map(|&c| map_byte(c)));
            out.write_all(&buf)?;
            cur = succ.index;
        }
    }
    Ok(())
}

/// Greedy merge acceptance for the suffix-tree core.
///
/// String indices here are positions in the byte-sorted, deduplicated
/// string set, which is also the order of the sentinel rows in the suffix
/// array; the sweep hands windows in that space straight to [`offer`].
///
/// [`offer`]: SuperstringBuilder::offer
pub struct SuperstringBuilder {
    string_count: usize,
    unique_count: usize,
    merges_done: usize,
    availability: RightAvailability,
    is_unique: BitVec,
    /// Chain start of the chain containing each endpoint.
    leftend: IntVector,
    /// Chain end of the chain containing each endpoint.
    rightend: IntVector,
    merges: MergeArray,
}

impl SuperstringBuilder {
    /// `is_unique` flags strings (in sorted order) that are not substrings
    /// of other strings; the rest can never participate in a merge.
    pub fn new(is_unique: BitVec, max_overlap: usize) -> Self {
        let string_count = is_unique.len();
        let unique_count = is_unique.count_ones();
        let mut availability = RightAvailability::new(string_count);
        for i in 0..string_count {
            if !is_unique.get(i) {
                availability.consume(i);
            }
        }

        let idx_bits = bits_for(string_count as u64);
        let mut leftend = IntVector::new(string_count, idx_bits);
        let mut rightend = IntVector::new(string_count, idx_bits);
        for i in 0..string_count {
            leftend.set(i, i as u64);
            rightend.set(i, i as u64);
        }

        SuperstringBuilder {
            string_count,
            unique_count,
            merges_done: 0,
            availability,
            is_unique,
            leftend,
            rightend,
            merges: MergeArray::new(
                unique_count.saturating_sub(1),
                string_count,
                max_overlap,
            ),
        }
    }

    #[inline]
    pub fn merges_done(&self) -> usize {
        self.merges_done
    }

    /// Offer the candidate `left -> j` for every `j` in the sorted-string
    /// window `range_lo..=range_hi`, at the given overlap.
    ///
    /// Returns true when the caller should stop offering candidates for
    /// `left` (a merge was accepted, or no merges remain to be made).
    pub fn offer(
        &mut self,
        left: usize,
        overlap: usize,
        range_lo: usize,
        range_hi: usize,
    ) -> bool {
        debug_assert!(left < self.string_count);
        debug_assert!(self.is_unique.get(left), "non-unique left end offered");

        if self.merges_done + 1 >= self.unique_count {
            return true; // No more merges can be done.
        }

        let Some(k) = self.first_available_in(range_lo, range_hi) else {
            return false;
        };
        if self.try_merge(left, k, overlap) {
            return true;
        }

        // The only rejection is the cycle guard, and only one position in
        // the window can be this chain's start; the second try must land.
        let k2 = self.availability.next_available(k);
        if k2 > range_hi {
            return false;
        }
        if self.try_merge(left, k2, overlap) {
            return true;
        }
        unreachable!("second merge attempt cannot close a cycle");
    }

    fn first_available_in(&mut self, lo: usize, hi: usize) -> Option<usize> {
        if lo >= self.string_count {
            return None;
        }
        let k = if self.availability.is_available(lo) {
            lo
        } else {
            self.availability.next_available(lo)
        };
        (k <= hi && k < self.string_count).then_some(k)
    }

    /// Record `right` as the successor of `left` unless that closes a
    /// cycle. `right` must currently be available.
    fn try_merge(&mut self, left: usize, right: usize, overlap: usize) -> bool {
        debug_assert!(self.availability.is_available(right));
        if self.leftend.get(left) as usize == right {
            return false;
        }

        self.merges.push(Merge { left, right, overlap });
        self.availability.consume(right);

        let chain_start = self.leftend.get(left);
        let chain_end = self.rightend.get(right);
        self.leftend.set(chain_end as usize, chain_start);
        self.rightend.set(chain_start as usize, chain_end);

        self.merges_done += 1;
        true
    }

    /// Sort the merge log and produce the chain set.
    ///
    /// Panics if a non-empty unique set produced no chain start; that is
    /// structural corruption, not an input condition.
    pub fn finish(mut self) -> ChainSet {
        self.merges.sort_by_left();

        let mut links: Vec<Option<Successor>> = vec![None; self.string_count];
        for merge in self.merges.iter() {
            debug_assert!(links[merge.left].is_none(), "left end merged twice");
            links[merge.left] = Some(Successor {
                index: merge.right,
                overlap: merge.overlap,
            });
        }

        let start_positions: Vec<usize> = (0..self.string_count)
            .filter(|&i| self.is_unique.get(i) && self.availability.is_available(i))
            .collect();
        if self.unique_count > 0 {
            assert!(
                !start_positions.is_empty(),
                "no chain starts over a non-empty string set"
            );
        }

        ChainSet {
            links,
            start_positions,
        }
    }
}
