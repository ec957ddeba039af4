// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Suffix-link sweep: turn branch-checker records into overlap merges.
//!
//! Records arrive sorted by `matching_suffix_length`; the sweep walks a
//! jump list over them longest-first, one discarded character per outer
//! round. A record is live while its current suffix is as long as the
//! round's remaining length; each round every live record tries the
//! Weiner link by the sentinel - a hit means `# · suffix` occurs in the
//! text, i.e. the suffix is a prefix of the strings in the linked range,
//! which go to the chainer as merge candidates at the current overlap
//! length. On a miss (or a refused merge) the record follows one suffix
//! link and waits for the next round.
//!
//! Candidates therefore come out in non-increasing overlap order, and
//! within a round in ascending `sa_idx` (the pre-sort breaks length ties
//! by descending `sa_idx` precisely so the reversed traversal runs
//! ascending).

use std::io::Write;

use crate::alphabet::SENTINEL;
use crate::chain::{write_superstring, SuperstringBuilder};
use crate::checker::classify_strings;
use crate::index::{Index, SortedStrings, SuffixIndex};
use crate::jump_list::JumpList;
use crate::monitor::RunMonitor;
use crate::records::{sort_packed_by, StringArray};
use crate::types::{Error, Result};

/// Offset between a string's sentinel row and its sorted position: row 0
/// is the terminator suffix, row 1 is `#$`.
const ROW_OFFSET: usize = 2;

/// Drive merge candidates into `callback` in non-increasing overlap
/// order.
///
/// `strings` must be sorted by `matching_suffix_length` ascending (ties
/// by descending `sa_idx`). The callback receives
/// `(sa_idx, overlap, lb, rb)` in suffix-array row space and returns true
/// to retire the record.
pub fn find_suffix_overlaps<I, F>(index: &I, strings: &mut StringArray, mut callback: F)
where
    I: SuffixIndex,
    F: FnMut(usize, usize, usize, usize) -> bool,
{
    let count = strings.len();
    if count == 0 {
        return;
    }
    let max_length = strings.max_matching_suffix_length();

    let mut list = JumpList::new(count);
    let mut discarded = 0; // characters consumed off every live suffix
    while discarded < max_length && list.reset() {
        let remaining = max_length - discarded;

        while !list.at_end() {
            // Traverse from the longest matching suffix downwards.
            let k = count - 1 - list.current();
            let mut record = strings.get(k);

            if !record.is_unique {
                list.advance_and_mark_skipped(1);
                continue;
            }
            // Everything further on is shorter still; next round.
            if record.matching_suffix_length < remaining {
                break;
            }

            debug_assert_eq!(record.matching_node.depth, remaining);
            if let Some(prefix_node) = index.wl(record.matching_node, SENTINEL) {
                let accepted = callback(
                    record.sa_idx,
                    remaining,
                    prefix_node.lb,
                    prefix_node.rb,
                );
                if accepted {
                    list.advance_and_mark_skipped(1);
                    continue;
                }
            }

            record.matching_node = index.sl(record.matching_node);
            strings.set(k, &record);
            list.advance(1);
        }

        discarded += 1;
    }
}

/// Sort key for the sweep: `matching_suffix_length` ascending, ties by
/// descending `sa_idx`.
pub fn sort_for_sweep(strings: &mut StringArray) {
    let len = strings.len();
    sort_packed_by(strings, 0, len, |a, b| {
        a.matching_suffix_length
            .cmp(&b.matching_suffix_length)
            .then(b.sa_idx.cmp(&a.sa_idx))
    });
}

/// The suffix-tree engine end to end: classify, sweep, chain, emit.
pub fn find_superstring<W: Write>(
    index: &Index,
    strings: &SortedStrings,
    out: &mut W,
    monitor: &mut RunMonitor,
) -> Result<()> {
    if strings.len() != index.string_count() {
        return Err(Error::BadFormat(format!(
            "sorted-strings file has {} strings but the index was built over {}",
            strings.len(),
            index.string_count()
        )));
    }

    let mut records = monitor.phase(
        "Checking non-unique strings and finding match starting positions",
        || classify_strings(&index.esa, &index.string_lengths),
    );
    let is_unique = records.is_unique_bits();
    monitor.phase("Sorting by matching suffix length", || {
        sort_for_sweep(&mut records)
    });

    let mut builder = SuperstringBuilder::new(is_unique, index.max_string_length());
    monitor.phase("Matching prefixes and suffixes", || {
        find_suffix_overlaps(&index.esa, &mut records, |sa_idx, overlap, lb, rb| {
            builder.offer(
                sa_idx - ROW_OFFSET,
                overlap,
                lb - ROW_OFFSET,
                rb - ROW_OFFSET,
            )
        })
    });

    monitor.phase("Building the final superstring", || -> Result<()> {
        let chains = builder.finish();
        write_superstring(&chains, |i| strings.string_at(i), |b| b, out)?;
        out.write_all(b"\n")?;
        Ok(())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::build_index;

    fn superstring_of(words: &[&[u8]]) -> Vec<u8> {
        let sequences: Vec<Vec<u8>> = words.iter().map(|w| w.to_vec()).collect();
        let (index, sidecar) = build_index(sequences, b'#').unwrap();
        let strings = SortedStrings::parse(sidecar, b'#').unwrap();
        let mut out = Vec::new();
        find_superstring(&index, &strings, &mut out, &mut RunMonitor::quiet()).unwrap();
        assert_eq!(out.pop(), Some(b'\n'));
        out
    }

    fn contains(hay: &[u8], needle: &[u8]) -> bool {
        hay.len() >= needle.len() && hay.windows(needle.len()).any(|w| w == needle)
    }

    #[test]
    fn perfect_chain_of_three() {
        assert_eq!(superstring_of(&[b"ACAG", b"CAGT", b"AGTC"]), b"ACAGTC");
    }

    #[test]
    fn absorbed_substring() {
        assert_eq!(superstring_of(&[b"AACA", b"CAAT", b"AT"]), b"AACAAT");
    }

    #[test]
    fn duplicates_collapse() {
        assert_eq!(superstring_of(&[b"AAA", b"AAA"]), b"AAA");
    }

    #[test]
    fn nested_lengths_collapse_to_longest() {
        assert_eq!(superstring_of(&[b"AAAAA", b"AAAA", b"AAA"]), b"AAAAA");
    }

    #[test]
    fn no_overlap_still_covers_everything() {
        let out = superstring_of(&[b"ABCD", b"EFGH"]);
        assert_eq!(out.len(), 8);
        assert!(contains(&out, b"ABCD"));
        assert!(contains(&out, b"EFGH"));
    }

    #[test]
    fn circular_overlaps_stop_before_cycling() {
        let out = superstring_of(&[b"ATG", b"TGC", b"GCA", b"CAT"]);
        assert_eq!(out.len(), 6, "expected three overlaps of two, got {:?}", out);
        for w in [b"ATG", b"TGC", b"GCA", b"CAT"] {
            assert!(contains(&out, w), "{:?} missing from {:?}", w, out);
        }
    }

    #[test]
    fn single_string_round_trips() {
        assert_eq!(superstring_of(&[b"GATTACA"]), b"GATTACA");
    }

    #[test]
    fn every_input_is_a_substring_of_the_output() {
        let words: &[&[u8]] = &[
            b"AGGTC", b"GTCAA", b"CAAGG", b"TCAAG", b"AAGGT", b"TTTT", b"GGGG",
        ];
        let out = superstring_of(words);
        for w in words {
            assert!(contains(&out, w), "{:?} missing from {:?}", w, out);
        }
    }
}
