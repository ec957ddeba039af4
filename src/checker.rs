// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Uniqueness and branch-point classification over the suffix index.
//!
//! For every input string `s` the walk decides whether `s` occurs inside
//! another string (non-unique, it contributes nothing to the superstring)
//! and, for unique strings, finds the longest suffix that occurs anywhere
//! else in the text together with its suffix-tree locus. That suffix is
//! the longest overlap `s` could possibly have with a right partner, so
//! it is where the suffix-link sweep starts.
//!
//! The walk runs two lexicographic ranges per live group of strings:
//!
//! - the *substring range*: suffixes matching `σ · sentinel` - each row is
//!   one input string whose suffix is the reversed-walk prefix `σ`;
//! - the *match range*: suffixes matching `σ` alone.
//!
//! Both start at the full sentinel range paired with the whole array and
//! extend leftwards one character per epoch. The distinct preceding
//! characters come from `interval_symbols`; extending by each splits the
//! group into adjacent sub-blocks of the jump list, which is what makes
//! the in-place partition O(1) per block. Three things can happen:
//!
//! - the preceding character is the sentinel: those strings have been
//!   consumed whole and still match elsewhere, so they are non-unique;
//! - the match range narrows to a single row: `c·σ` occurs exactly once,
//!   so `σ` is the longest suffix of this (now pinned) string occurring
//!   elsewhere - record it;
//! - otherwise the sub-block stays live for the next epoch.
//!
//! String identity is recovered with a Ψ-walk of `branching_suffix_length`
//! steps from the recorded row to the string's end sentinel. Any
//! impossible configuration here is index corruption and panics.

use crate::alphabet::{SENTINEL, TERMINATOR};
use crate::index::{IntervalSymbols, SuffixIndex};
use crate::intvec::{bits_for, IntVector};
use crate::jump_list::JumpList;
use crate::records::{StringArray, StringRecord};
use crate::types::Node;

/// Dual-range state per live block, packed.
#[derive(Debug, Clone, Copy)]
struct BwtRange {
    sub_l: usize,
    sub_r: usize,
    match_l: usize,
    match_r: usize,
}

impl BwtRange {
    #[inline]
    fn substring_is_singular(&self) -> bool {
        self.sub_l == self.sub_r
    }

    #[inline]
    fn match_is_singular(&self) -> bool {
        self.match_l == self.match_r
    }

    #[inline]
    fn substring_count(&self) -> usize {
        self.sub_r - self.sub_l + 1
    }
}

/// Packed parallel storage for [`BwtRange`]s, keyed by jump-list position.
struct BwtRangeArray {
    substring_ranges: IntVector,
    match_ranges: IntVector,
}

impl BwtRangeArray {
    fn new(count: usize, text_len: usize) -> Self {
        let bits = bits_for(text_len as u64);
        BwtRangeArray {
            substring_ranges: IntVector::new(2 * count, bits),
            match_ranges: IntVector::new(2 * count, bits),
        }
    }

    fn get(&self, k: usize) -> BwtRange {
        BwtRange {
            sub_l: self.substring_ranges.get(2 * k) as usize,
            sub_r: self.substring_ranges.get(2 * k + 1) as usize,
            match_l: self.match_ranges.get(2 * k) as usize,
            match_r: self.match_ranges.get(2 * k + 1) as usize,
        }
    }

    fn set(&mut self, k: usize, range: BwtRange) {
        self.substring_ranges.set(2 * k, range.sub_l as u64);
        self.substring_ranges.set(2 * k + 1, range.sub_r as u64);
        self.match_ranges.set(2 * k, range.match_l as u64);
        self.match_ranges.set(2 * k + 1, range.match_r as u64);
    }
}

/// Classify every indexed string; see the module docs.
///
/// `string_lengths` holds the byte length of each string in sorted order.
/// The returned records appear in `sa_idx` order.
pub fn classify_strings<I: SuffixIndex>(index: &I, string_lengths: &IntVector) -> StringArray {
    let n = index.len();
    let (left, right) = index
        .backward_search(0, n - 1, SENTINEL)
        .expect("text without sentinels");
    let row_count = right - left + 1;
    let string_count = row_count - 1; // the "#$" row is not a string
    assert_eq!(
        string_count,
        string_lengths.len(),
        "string lengths disagree with the sentinel range"
    );

    let max_len = string_lengths.iter().max().unwrap_or(0) as usize;
    let mut strings = StringArray::new(string_count, n, max_len);
    for i in 0..string_count {
        strings.set(
            i,
            &StringRecord::new(left + 1 + i, string_lengths.get(i) as usize),
        );
    }
    if string_count == 0 {
        return strings;
    }

    let mut walk = Walk {
        index,
        strings,
        ranges: BwtRangeArray::new(row_count, n),
        list: JumpList::new(row_count),
        buf: IntervalSymbols::new(index.sigma()),
        epoch: 0,
        left,
        right,
    };
    walk.ranges.set(
        0,
        BwtRange {
            sub_l: left,
            sub_r: right,
            match_l: 0,
            match_r: n - 1,
        },
    );
    walk.run();
    walk.strings
}

struct Walk<'a, I: SuffixIndex> {
    index: &'a I,
    strings: StringArray,
    ranges: BwtRangeArray,
    list: JumpList,
    buf: IntervalSymbols,
    epoch: usize,
    /// Sentinel range bounds; `left` is the "#$" row.
    left: usize,
    right: usize,
}

impl<'a, I: SuffixIndex> Walk<'a, I> {
    fn run(&mut self) {
        while self.list.reset() {
            while !self.list.at_end() {
                let range = self.ranges.get(self.list.current());
                if range.substring_is_singular() {
                    self.handle_singular_range(range);
                } else {
                    self.handle_non_singular_range(range);
                }
            }
            self.epoch += 1;
        }
    }

    /// Position of the string with this sentinel row, in sorted order.
    #[inline]
    fn string_of_row(&self, sentinel_row: usize) -> usize {
        debug_assert!(sentinel_row > self.left && sentinel_row <= self.right);
        sentinel_row - self.left - 1
    }

    fn handle_singular_range(&mut self, mut range: BwtRange) {
        let next_character = self.index.bwt(range.sub_l);
        // The walk never runs past the start of the text from a singular
        // block: the terminator-preceded row is consumed in epoch 0.
        assert_ne!(next_character, TERMINATOR, "walked past the text start");

        if next_character == SENTINEL {
            // The whole string has been consumed and its match range is
            // still plural: it occurs inside some other string.
            assert!(!range.match_is_singular());
            let sentinel_row = self.index.lf(range.sub_l);
            self.mark_non_unique(sentinel_row);
            self.list.advance_and_mark_skipped(1);
            return;
        }

        range.sub_l = self.index.lf(range.sub_l);
        range.sub_r = range.sub_l;
        let matched = self
            .index
            .backward_search(range.match_l, range.match_r, next_character)
            .expect("substring rows must extend within the match range");
        range.match_l = matched.0;
        range.match_r = matched.1;

        if range.match_is_singular() {
            self.add_match(range);
            self.list.advance_and_mark_skipped(1);
        } else {
            let pos = self.list.current();
            self.ranges.set(pos, range);
            self.list.advance(1);
        }
    }

    fn handle_non_singular_range(&mut self, range: BwtRange) {
        let mut remaining = range.substring_count();
        debug_assert!(remaining > 1);

        self.index
            .interval_symbols(range.sub_l, range.sub_r + 1, &mut self.buf);
        debug_assert!(self.buf.count > 0);

        for si in 0..self.buf.count {
            if remaining == 0 {
                break;
            }
            let next_character = self.buf.symbols[si];
            let block = (self.buf.rank_hi[si] - self.buf.rank_lo[si]) as usize;

            if next_character == TERMINATOR {
                // The suffix starting at the very first sentinel; it
                // belongs to no string.
                self.list.advance_and_mark_skipped(block);
                remaining -= block;
                continue;
            }

            if next_character == SENTINEL {
                // Strings consumed whole with other occurrences left.
                let (l, r) = self
                    .index
                    .backward_search(range.sub_l, range.sub_r, SENTINEL)
                    .expect("sentinel symbol came from this range");
                debug_assert_eq!(r - l + 1, block);
                for row in l..=r {
                    self.mark_non_unique(row);
                }
                self.list.advance_and_mark_skipped(block);
                remaining -= block;
                continue;
            }

            let mut new_range = range;
            let narrowed = self
                .index
                .backward_search(new_range.sub_l, new_range.sub_r, next_character)
                .expect("symbol came from this range");
            new_range.sub_l = narrowed.0;
            new_range.sub_r = narrowed.1;
            debug_assert_eq!(new_range.substring_count(), block);

            let matched = self
                .index
                .backward_search(new_range.match_l, new_range.match_r, next_character)
                .expect("substring rows must extend within the match range");
            new_range.match_l = matched.0;
            new_range.match_r = matched.1;

            if new_range.match_is_singular() {
                // A singular match forces a singular substring range:
                // substring rows are a subset of match rows.
                assert!(new_range.substring_is_singular());
                self.add_match(new_range);
                self.list.advance_and_mark_skipped(1);
            } else {
                let pos = self.list.current();
                self.ranges.set(pos, new_range);
                self.list.advance(block);
            }
            remaining -= block;
        }
        debug_assert_eq!(remaining, 0, "interval symbols did not cover the block");
    }

    fn mark_non_unique(&mut self, sentinel_row: usize) {
        let i = self.string_of_row(sentinel_row);
        let mut record = self.strings.get(i);
        debug_assert_eq!(record.sa_idx, sentinel_row);
        record.is_unique = false;
        self.strings.set(i, &record);
    }

    /// Record the branching suffix for the (unique) string pinned by a
    /// singular match range.
    fn add_match(&mut self, range: BwtRange) {
        debug_assert!(range.substring_is_singular() && range.match_is_singular());
        let branching_suffix_length = self.epoch + 1;

        // Ψ-walk to the string's end sentinel to learn which string the
        // singular substring row belongs to.
        let mut row = range.sub_l;
        for _ in 0..branching_suffix_length {
            row = self.index.psi(row);
        }
        let identity_row = if row == self.left { self.right } else { row - 1 };
        let i = self.string_of_row(identity_row);

        let matching_suffix_length = branching_suffix_length - 1;
        let matching_node = if matching_suffix_length == 0 {
            self.index.root()
        } else {
            // Dropping the branching character of the singular occurrence
            // yields the locus of the matching suffix.
            self.index.sl(Node {
                lb: range.match_l,
                rb: range.match_r,
                depth: branching_suffix_length,
            })
        };

        let mut record = self.strings.get(i);
        debug_assert!(record.is_unique, "matched a string already marked non-unique");
        debug_assert!(
            matching_suffix_length < record.length,
            "matching suffix cannot cover the whole string"
        );
        record.matching_suffix_length = matching_suffix_length;
        record.branching_suffix_length = branching_suffix_length;
        record.matching_node = matching_node;
        self.strings.set(i, &record);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::build_index;

    fn classify(words: &[&[u8]]) -> (Vec<StringRecord>, Vec<Vec<u8>>) {
        let sequences: Vec<Vec<u8>> = words.iter().map(|w| w.to_vec()).collect();
        let (index, _) = build_index(sequences.clone(), b'#').unwrap();
        let records = classify_strings(&index.esa, &index.string_lengths).iter().collect();
        let mut sorted = sequences;
        sorted.sort_unstable();
        sorted.dedup();
        (records, sorted)
    }

    /// Naive oracle: `s` occurs in some other surviving string.
    fn substr_of_other(sorted: &[Vec<u8>], i: usize) -> bool {
        sorted.iter().enumerate().any(|(j, other)| {
            j != i && other.windows(sorted[i].len()).any(|w| w == sorted[i])
        })
    }

    #[test]
    fn classifies_substrings_as_non_unique() {
        let (records, sorted) = classify(&[b"AACA", b"CAAT", b"AT"]);
        assert_eq!(records.len(), 3);
        for (i, r) in records.iter().enumerate() {
            assert_eq!(
                r.is_unique,
                !substr_of_other(&sorted, i),
                "string {:?}",
                sorted[i]
            );
        }
        // "AT" is inside "CAAT".
        let at = sorted.iter().position(|s| s == b"AT").unwrap();
        assert!(!records[at].is_unique);
    }

    #[test]
    fn duplicate_strings_collapse_before_classification() {
        let (records, _) = classify(&[b"AAA", b"AAA"]);
        assert_eq!(records.len(), 1);
        assert!(records[0].is_unique);
    }

    #[test]
    fn matching_suffix_is_the_longest_shared_one() {
        let (records, sorted) = classify(&[b"ACAG", b"CAGT", b"AGTC"]);
        for (i, r) in records.iter().enumerate() {
            assert!(r.is_unique);
            // Oracle: longest proper suffix occurring anywhere else in the
            // sentinel text (equivalently: in any string at any position,
            // or as a proper prefix/infix of this one).
            let s = &sorted[i];
            let text: Vec<u8> = {
                let mut t = vec![b'#'];
                for x in &sorted {
                    t.extend_from_slice(x);
                    t.push(b'#');
                }
                t
            };
            let expect = (0..s.len())
                .map(|k| &s[k..])
                .find(|suffix| {
                    let occurrences = text
                        .windows(suffix.len())
                        .filter(|w| w == suffix)
                        .count();
                    occurrences >= 2
                })
                .map(|suffix| suffix.len())
                .unwrap_or(0);
            assert_eq!(r.matching_suffix_length, expect, "string {:?}", s);
            if expect > 0 {
                assert_eq!(r.branching_suffix_length, expect + 1);
            }
        }
        // Concretely: ACAG ends with CAG / AG / G... "CAG" occurs in CAGT.
        let acag = sorted.iter().position(|s| s == b"ACAG").unwrap();
        assert_eq!(records[acag].matching_suffix_length, 3);
    }

    #[test]
    fn matching_node_is_the_locus_of_the_matching_suffix() {
        let words: &[&[u8]] = &[b"ACAG", b"CAGT", b"AGTC"];
        let sequences: Vec<Vec<u8>> = words.iter().map(|w| w.to_vec()).collect();
        let (index, _) = build_index(sequences, b'#').unwrap();
        let esa = &index.esa;
        let records: Vec<StringRecord> =
            classify_strings(esa, &index.string_lengths).iter().collect();

        for r in records.iter().filter(|r| r.matching_suffix_length > 0) {
            let node = r.matching_node;
            assert_eq!(node.depth, r.matching_suffix_length);
            // Every row of the node starts with the suffix of the string
            // at sa_idx: read it back from the text.
            let own_pos = esa.suffix_at(r.sa_idx) + 1; // skip the sentinel
            let suffix_start = own_pos + r.length - r.matching_suffix_length;
            let expect = &esa.text()[suffix_start..suffix_start + r.matching_suffix_length];
            for row in node.lb..=node.rb {
                let pos = esa.suffix_at(row);
                assert_eq!(
                    &esa.text()[pos..pos + node.depth],
                    expect,
                    "row {} of node for sa_idx {}",
                    row,
                    r.sa_idx
                );
            }
        }
    }

    #[test]
    fn identity_recovery_hits_every_string() {
        // Shared suffixes force deep walks; identical last characters
        // force block splits.
        let (records, sorted) =
            classify(&[b"TTAGG", b"GAGG", b"CCAGG", b"AGG", b"TTT"]);
        for (i, r) in records.iter().enumerate() {
            assert_eq!(r.sa_idx, 2 + i);
            assert_eq!(r.length, sorted[i].len());
        }
        // "AGG" is a suffix of the others -> non-unique? No: a suffix is
        // still a substring occurrence.
        let agg = sorted.iter().position(|s| s == b"AGG").unwrap();
        assert!(!records[agg].is_unique);
    }

    #[test]
    fn no_shared_content_means_zero_matching_suffix() {
        let (records, _) = classify(&[b"ABCD", b"EFGH"]);
        for r in &records {
            assert!(r.is_unique);
            assert_eq!(r.matching_suffix_length, 0);
        }
    }
}
