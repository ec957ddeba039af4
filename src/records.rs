// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Bit-packed record arrays for per-string bookkeeping and merge logs.
//!
//! Records live as parallel packed vectors ([`crate::intvec::IntVector`]),
//! so a "record" only exists as a value read out of the columns and
//! written back whole. Sorting therefore cannot hand out references;
//! [`sort_packed_by`] drives an in-place introsort purely through
//! [`PackedStore::get_item`] / [`PackedStore::set_item`], which is the
//! closest Rust gets to the proxy-iterator idiom of packed-vector
//! libraries.

use std::cmp::Ordering;

use crate::intvec::{bits_for, BitVec, IntVector};
use crate::types::Node;

/// Store of fixed-size records addressable by index.
pub trait PackedStore {
    type Item;

    fn get_item(&self, i: usize) -> Self::Item;
    fn set_item(&mut self, i: usize, item: &Self::Item);

    fn swap_items(&mut self, i: usize, j: usize) {
        if i != j {
            let a = self.get_item(i);
            let b = self.get_item(j);
            self.set_item(i, &b);
            self.set_item(j, &a);
        }
    }
}

/// In-place sort of `store[lo..hi]` by a comparator over record values.
///
/// Quicksort with median-of-three pivots and an explicit segment stack,
/// falling back to insertion sort below a small cutoff. Not stable; the
/// callers that care about tie order encode it in the comparator.
pub fn sort_packed_by<S, F>(store: &mut S, lo: usize, hi: usize, cmp: F)
where
    S: PackedStore,
    F: Fn(&S::Item, &S::Item) -> Ordering,
{
    const INSERTION_CUTOFF: usize = 16;

    let mut stack = vec![(lo, hi)];
    while let Some((lo, hi)) = stack.pop() {
        if hi - lo <= INSERTION_CUTOFF {
            insertion_sort(store, lo, hi, &cmp);
            continue;
        }

        // Median of three into position `lo`.
        let mid = lo + (hi - lo) / 2;
        let last = hi - 1;
        if cmp(&store.get_item(mid), &store.get_item(lo)) == Ordering::Less {
            store.swap_items(mid, lo);
        }
        if cmp(&store.get_item(last), &store.get_item(lo)) == Ordering::Less {
            store.swap_items(last, lo);
        }
        if cmp(&store.get_item(mid), &store.get_item(last)) == Ordering::Less {
            store.swap_items(mid, last);
        }
        let pivot = store.get_item(last);

        let mut split = lo;
        for i in lo..last {
            if cmp(&store.get_item(i), &pivot) == Ordering::Less {
                store.swap_items(i, split);
                split += 1;
            }
        }
        store.swap_items(split, last);

        // Larger segment deferred; bounded stack depth either way since
        // each push halves at least one side.
        let (a, b) = ((lo, split), (split + 1, hi));
        let (small, large) = if a.1 - a.0 < b.1 - b.0 { (a, b) } else { (b, a) };
        if large.1 - large.0 > 1 {
            stack.push(large);
        }
        if small.1 - small.0 > 1 {
            stack.push(small);
        }
    }
}

fn insertion_sort<S, F>(store: &mut S, lo: usize, hi: usize, cmp: &F)
where
    S: PackedStore,
    F: Fn(&S::Item, &S::Item) -> Ordering,
{
    for i in (lo + 1)..hi {
        let item = store.get_item(i);
        let mut j = i;
        while j > lo {
            let prev = store.get_item(j - 1);
            if cmp(&prev, &item) != Ordering::Greater {
                break;
            }
            store.set_item(j, &prev);
            j -= 1;
        }
        if j != i {
            store.set_item(j, &item);
        }
    }
}

/// Per-string classification result from the branch checker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StringRecord {
    /// Lex rank of this string's leading sentinel row in the suffix array.
    pub sa_idx: usize,
    /// Original string length.
    pub length: usize,
    /// False iff this string occurs inside some other input string.
    pub is_unique: bool,
    /// Longest suffix that occurs somewhere else in the text.
    pub matching_suffix_length: usize,
    /// Shortest left extension of that suffix with a single occurrence.
    pub branching_suffix_length: usize,
    /// Locus of the matching suffix; updated by the suffix-link sweep.
    pub matching_node: Node,
}

impl StringRecord {
    pub fn new(sa_idx: usize, length: usize) -> Self {
        StringRecord {
            sa_idx,
            length,
            is_unique: true,
            matching_suffix_length: 0,
            branching_suffix_length: 0,
            matching_node: Node { lb: 0, rb: 0, depth: 0 },
        }
    }
}

/// Packed array of [`StringRecord`]s.
pub struct StringArray {
    sa_idxs: IntVector,
    lengths: IntVector,
    matching_suffix_lengths: IntVector,
    branching_suffix_lengths: IntVector,
    node_lbs: IntVector,
    node_rbs: IntVector,
    node_depths: IntVector,
    is_unique: BitVec,
}

impl StringArray {
    /// `count` records over a text of `text_len` positions with string
    /// lengths up to `max_len`.
    pub fn new(count: usize, text_len: usize, max_len: usize) -> Self {
        let n_bits = bits_for(text_len as u64);
        let len_bits = bits_for(max_len as u64 + 1);
        StringArray {
            sa_idxs: IntVector::new(count, n_bits),
            lengths: IntVector::new(count, len_bits),
            matching_suffix_lengths: IntVector::new(count, len_bits),
            branching_suffix_lengths: IntVector::new(count, len_bits),
            node_lbs: IntVector::new(count, n_bits),
            node_rbs: IntVector::new(count, n_bits),
            node_depths: IntVector::new(count, len_bits),
            is_unique: BitVec::new(count, true),
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.sa_idxs.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.sa_idxs.is_empty()
    }

    pub fn get(&self, k: usize) -> StringRecord {
        StringRecord {
            sa_idx: self.sa_idxs.get(k) as usize,
            length: self.lengths.get(k) as usize,
            is_unique: self.is_unique.get(k),
            matching_suffix_length: self.matching_suffix_lengths.get(k) as usize,
            branching_suffix_length: self.branching_suffix_lengths.get(k) as usize,
            matching_node: Node {
                lb: self.node_lbs.get(k) as usize,
                rb: self.node_rbs.get(k) as usize,
                depth: self.node_depths.get(k) as usize,
            },
        }
    }

    pub fn set(&mut self, k: usize, record: &StringRecord) {
        self.sa_idxs.set(k, record.sa_idx as u64);
        self.lengths.set(k, record.length as u64);
        self.is_unique.set(k, record.is_unique);
        self.matching_suffix_lengths
            .set(k, record.matching_suffix_length as u64);
        self.branching_suffix_lengths
            .set(k, record.branching_suffix_length as u64);
        self.node_lbs.set(k, record.matching_node.lb as u64);
        self.node_rbs.set(k, record.matching_node.rb as u64);
        self.node_depths.set(k, record.matching_node.depth as u64);
    }

    /// Uniqueness bits in record order (before any sorting).
    pub fn is_unique_bits(&self) -> BitVec {
        self.is_unique.clone()
    }

    pub fn max_matching_suffix_length(&self) -> usize {
        (0..self.len())
            .map(|k| self.matching_suffix_lengths.get(k) as usize)
            .max()
            .unwrap_or(0)
    }

    pub fn iter(&self) -> impl Iterator<Item = StringRecord> + '_ {
        (0..self.len()).map(move |k| self.get(k))
    }
}

impl PackedStore for StringArray {
    type Item = StringRecord;

    fn get_item(&self, i: usize) -> StringRecord {
        self.get(i)
    }

    fn set_item(&mut self, i: usize, item: &StringRecord) {
        self.set(i, item);
    }
}

/// One accepted merge: `right` follows `left` with `overlap` shared bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Merge {
    pub left: usize,
    pub right: usize,
    pub overlap: usize,
}

/// Packed log of merges, sortable by left endpoint before emission.
pub struct MergeArray {
    lefts: IntVector,
    rights: IntVector,
    overlaps: IntVector,
    len: usize,
}

impl MergeArray {
    /// Room for `capacity` merges between `string_count` strings with
    /// overlaps up to `max_overlap`.
    pub fn new(capacity: usize, string_count: usize, max_overlap: usize) -> Self {
        let idx_bits = bits_for(string_count as u64);
        let len_bits = bits_for(max_overlap as u64 + 1);
        MergeArray {
            lefts: IntVector::new(capacity, idx_bits),
            rights: IntVector::new(capacity, idx_bits),
            overlaps: IntVector::new(capacity, len_bits),
            len: 0,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn push(&mut self, merge: Merge) {
        let k = self.len;
        assert!(k < self.lefts.len(), "merge log capacity exceeded");
        self.lefts.set(k, merge.left as u64);
        self.rights.set(k, merge.right as u64);
        self.overlaps.set(k, merge.overlap as u64);
        self.len += 1;
    }

    pub fn get(&self, k: usize) -> Merge {
        debug_assert!(k < self.len);
        Merge {
            left: self.lefts.get(k) as usize,
            right: self.rights.get(k) as usize,
            overlap: self.overlaps.get(k) as usize,
        }
    }

    /// Sort the recorded merges by left endpoint.
    pub fn sort_by_left(&mut self) {
        let len = self.len;
        sort_packed_by(self, 0, len, |a, b| a.left.cmp(&b.left));
    }

    pub fn iter(&self) -> impl Iterator<Item = Merge> + '_ {
        (0..self.len).map(move |k| self.get(k))
    }
}

impl PackedStore for MergeArray {
    type Item = Merge;

    fn get_item(&self, i: usize) -> Merge {
        self.get(i)
    }

    fn set_item(&mut self, i: usize, item: &Merge) {
        debug_assert!(i < self.len);
        self.lefts.set(i, item.left as u64);
        self.rights.set(i, item.right as u64);
        self.overlaps.set(i, item.overlap as u64);
    }
}
