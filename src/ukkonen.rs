// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Greedy overlap computation on the Aho-Corasick automaton.
//!
//! This is Ukkonen's linear-time rendering of the classic greedy
//! superstring approximation: instead of materialising the overlap graph,
//! walk the automaton's states from the deepest up and let the failure
//! links carry candidate left ends toward shorter overlaps.
//!
//! Per state `s` the sweep maintains:
//!
//! - `L(s)` - the supporter list: accepted string indices whose terminal
//!   state lies in the subtree under `s`. A string is deleted from every
//!   `L(·)` list the moment it is consumed as a merge right end, which
//!   needs the inverse map `by_string` and O(1) unlinking, hence the
//!   arena-backed intrusive lists.
//! - `P(s)` - a queue of batches of candidate left ends. Each terminal
//!   state injects its own string into `P(failure(terminal))`; leftover
//!   batches are spliced into `P(failure(s))` when `s` is done.
//!
//! States are visited in reverse BFS order, so every descendant is
//! processed before its ancestor and a batch reaching state `s` has
//! already been offered every overlap longer than `depth(s)`. The depth of
//! the state where a pair `(ii, j)` meets is exactly their overlap length.
//!
//! A merge is accepted only under the conjunction
//! `left_available[ii] && right_available[j]`, and only when it would not
//! close a cycle (`first[ii] != j`). `first`/`last` track the endpoints of
//! every partial chain so the cycle test is O(1).

use std::io::Write;

use crate::alphabet::Alphabet;
use crate::chain::{write_superstring, ChainSet};
use crate::intvec::BitVec;
use crate::jump_list::JumpList;
use crate::monitor::RunMonitor;
use crate::trie::{KeywordTrie, StateId, ROOT};
use crate::types::{Error, Result, Successor};

const NONE: u32 = u32::MAX;

struct LNode {
    string_idx: u32,
    state_rank: u32,
    prev: u32,
    next: u32,
}

/// Arena of per-state supporter lists with O(1) removal by string.
struct SupporterLists {
    nodes: Vec<LNode>,
    head: Vec<u32>,
    tail: Vec<u32>,
    by_string: Vec<Vec<u32>>,
}

impl SupporterLists {
    fn build(trie: &KeywordTrie, string_count: usize) -> Self {
        let state_count = trie.state_count();
        let mut lists = SupporterLists {
            nodes: Vec::new(),
            head: vec![NONE; state_count],
            tail: vec![NONE; state_count],
            by_string: vec![Vec::new(); string_count],
        };
        for &terminal in trie.final_states_in_bfs_order() {
            let string_idx = trie
                .keyword_at(terminal)
                .expect("final state without keyword");
            let mut cursor = Some(terminal);
            while let Some(s) = cursor {
                lists.append(trie.bfs_rank(s) as u32, string_idx);
                cursor = trie.parent(s);
            }
        }
        lists
    }

    fn append(&mut self, state_rank: u32, string_idx: u32) {
        let id = self.nodes.len() as u32;
        let old_tail = self.tail[state_rank as usize];
        self.nodes.push(LNode {
            string_idx,
            state_rank,
            prev: old_tail,
            next: NONE,
        });
        if old_tail == NONE {
            self.head[state_rank as usize] = id;
        } else {
            self.nodes[old_tail as usize].next = id;
        }
        self.tail[state_rank as usize] = id;
        self.by_string[string_idx as usize].push(id);
    }

    /// Remove every occurrence of `string_idx` from every list.
    fn remove_string(&mut self, string_idx: u32) {
        let ids = std::mem::take(&mut self.by_string[string_idx as usize]);
        for id in ids {
            self.unlink(id);
        }
    }

    fn unlink(&mut self, id: u32) {
        let (prev, next, rank) = {
            let n = &self.nodes[id as usize];
            (n.prev, n.next, n.state_rank as usize)
        };
        if prev == NONE {
            self.head[rank] = next;
        } else {
            self.nodes[prev as usize].next = next;
        }
        if next == NONE {
            self.tail[rank] = prev;
        } else {
            self.nodes[next as usize].prev = prev;
        }
    }
}

/// One batch in a `P(s)` queue: packed candidate values plus a jump-list
/// cursor that supports O(1) mid-batch consumption.
struct Batch {
    values: Vec<u32>,
    cursor: JumpList,
}

impl Batch {
    fn new(values: Vec<u32>) -> Self {
        let cursor = JumpList::new(values.len());
        Batch { values, cursor }
    }
}

/// Find the Hamiltonian path of the overlap graph as discussed in
/// Ukkonen's paper.
///
/// `states_by_string[i]` is the terminal state string `i` was accepted at;
/// the trie must be finalized.
pub fn build_overlap_links(trie: &KeywordTrie, states_by_string: &[StateId]) -> ChainSet {
    let string_count = states_by_string.len();
    debug_assert_eq!(string_count, trie.keyword_count());
    let state_count = trie.state_count();

    let mut left_available = BitVec::new(string_count, true);
    let mut right_available = BitVec::new(string_count, true);
    let mut links: Vec<Option<Successor>> = vec![None; string_count];

    let mut supporters = SupporterLists::build(trie, string_count);

    // Initial values for P(s), FIRST and LAST.
    let mut first: Vec<u32> = (0..string_count as u32).collect();
    let mut last: Vec<u32> = (0..string_count as u32).collect();
    let mut p_map: Vec<Vec<Batch>> = Vec::with_capacity(state_count);
    p_map.resize_with(state_count, Vec::new);
    {
        let mut seeds: Vec<Vec<u32>> = vec![Vec::new(); state_count];
        for &terminal in trie.final_states_in_bfs_order() {
            let string_idx = trie.keyword_at(terminal).expect("unmarked final state");
            let failure = trie.failure(terminal).unwrap_or(ROOT);
            seeds[trie.bfs_rank(failure)].push(string_idx);
        }
        for (rank, values) in seeds.into_iter().enumerate() {
            if !values.is_empty() {
                p_map[rank].push(Batch::new(values));
            }
        }
    }

    // Main loop: children before parents.
    let bfs_order: Vec<StateId> = trie.states_in_bfs_order().to_vec();
    for &state in bfs_order.iter().rev() {
        let rank = trie.bfs_rank(state);
        let mut batches = std::mem::take(&mut p_map[rank]);
        let overlap = trie.depth(state);

        for batch in batches.iter_mut() {
            if batch.cursor.is_empty() {
                continue;
            }
            let mut l_cursor = supporters.head[rank];
            while l_cursor != NONE {
                if batch.cursor.is_empty() {
                    break;
                }
                let next_l = supporters.nodes[l_cursor as usize].next;
                let string_idx = supporters.nodes[l_cursor as usize].string_idx;

                batch.cursor.reset();
                let mut ii = batch.values[batch.cursor.current()];
                if first[ii as usize] == string_idx {
                    // Merging ii -> string_idx would close a cycle; offer
                    // the batch's second entry instead, if it has one.
                    if batch.cursor.len() == 1 {
                        l_cursor = next_l;
                        continue;
                    }
                    batch.cursor.advance(1);
                    ii = batch.values[batch.cursor.current()];
                }
                debug_assert!(!batch.cursor.at_end());
                batch.cursor.advance_and_mark_skipped(1);

                if left_available.get(ii as usize) && right_available.get(string_idx as usize) {
                    links[ii as usize] = Some(Successor {
                        index: string_idx as usize,
                        overlap,
                    });
                    left_available.set(ii as usize, false);
                    right_available.set(string_idx as usize, false);

                    first[last[string_idx as usize] as usize] = first[ii as usize];
                    last[first[ii as usize] as usize] = last[string_idx as usize];

                    // string_idx is spoken for; stop offering it anywhere.
                    supporters.remove_string(string_idx);
                }

                l_cursor = next_l;
            }
        }

        batches.retain(|b| !b.cursor.is_empty());
        if state != ROOT && !batches.is_empty() {
            let failure = trie.failure(state).unwrap_or(ROOT);
            p_map[trie.bfs_rank(failure)].append(&mut batches);
        }
    }

    let mut start_positions = Vec::new();
    for i in 0..string_count {
        if right_available.get(i) && trie.keyword_at(states_by_string[i]).is_some() {
            start_positions.push(i);
        }
    }

    ChainSet {
        links,
        start_positions,
    }
}

/// The Aho-Corasick engine end to end: compact, insert, sweep, emit.
pub fn find_superstring_ukkonen<W: Write>(
    sequences: Vec<Vec<u8>>,
    out: &mut W,
    monitor: &mut RunMonitor,
) -> Result<()> {
    let sequences: Vec<Vec<u8>> = sequences.into_iter().filter(|s| !s.is_empty()).collect();
    if sequences.is_empty() {
        return Err(Error::EmptyInput);
    }

    let alphabet = monitor.phase("Compressing the alphabet", || {
        Alphabet::first_seen(sequences.iter().map(|s| s.as_slice()))
    });

    let mut trie = KeywordTrie::new(alphabet.sigma());
    let mut strings: Vec<Vec<u8>> = Vec::new();
    let mut states: Vec<StateId> = Vec::new();
    monitor.phase("Inserting the sequences", || {
        for mut seq in sequences {
            alphabet.encode_in_place(&mut seq);
            if let Some(state) = trie.insert(&seq, strings.len() as u32) {
                states.push(state);
                strings.push(seq);
            }
        }
    });

    monitor.phase("Postprocessing the trie", || trie.finalize());
    let chains = monitor.phase("Processing the strings", || {
        build_overlap_links(&trie, &states)
    });
    if chains.start_positions.is_empty() {
        return Err(Error::Invariant("no start positions".to_string()));
    }

    monitor.phase("Writing the superstring", || -> Result<()> {
        write_superstring(
            &chains,
            |i| strings[i].as_slice(),
            |code| alphabet.decode(code),
            out,
        )?;
        out.write_all(b"\n")?;
        Ok(())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alphabet::Alphabet;

    /// Insert raw byte strings through a first-seen alphabet; returns the
    /// engine output plus the accepted strings (compacted codes).
    fn run(words: &[&[u8]]) -> (ChainSet, Vec<Vec<u8>>, Alphabet) {
        let alphabet = Alphabet::first_seen(words.iter().copied());
        let mut trie = KeywordTrie::new(alphabet.sigma().max(1));
        let mut accepted: Vec<Vec<u8>> = Vec::new();
        let mut states = Vec::new();
        for w in words {
            let mut codes = w.to_vec();
            alphabet.encode_in_place(&mut codes);
            if let Some(state) = trie.insert(&codes, accepted.len() as u32) {
                states.push(state);
                accepted.push(codes);
            }
        }
        trie.finalize();
        let links = build_overlap_links(&trie, &states);
        (links, accepted, alphabet)
    }

    fn materialise(links: &ChainSet, strings: &[Vec<u8>], alphabet: &Alphabet) -> Vec<u8> {
        let mut out = Vec::new();
        for &start in &links.start_positions {
            let mut decoded = Vec::new();
            alphabet.decode_to(&strings[start], &mut decoded);
            out.extend_from_slice(&decoded);
            let mut cur = start;
            while let Some(succ) = links.links[cur] {
                let mut d = Vec::new();
                alphabet.decode_to(&strings[succ.index][succ.overlap..], &mut d);
                out.extend_from_slice(&d);
                cur = succ.index;
            }
        }
        out
    }

    #[test]
    fn chains_three_way_overlap() {
        let (links, strings, alphabet) = run(&[b"ACAG", b"CAGT", b"AGTC"]);
        let superstring = materialise(&links, &strings, &alphabet);
        assert_eq!(superstring, b"ACAGTC");
    }

    #[test]
    fn circular_word_set_does_not_cycle() {
        let (links, strings, alphabet) = run(&[b"ATG", b"TGC", b"GCA", b"CAT"]);
        let superstring = materialise(&links, &strings, &alphabet);
        assert_eq!(superstring.len(), 6);
        // Every input occurs in the output.
        for w in [b"ATG", b"TGC", b"GCA", b"CAT"] {
            assert!(
                superstring.windows(3).any(|x| x == w.as_slice()),
                "{:?} missing from {:?}",
                w,
                superstring
            );
        }
    }

    #[test]
    fn substring_inputs_are_absorbed() {
        let (links, _, _) = run(&[b"AACA", b"CAAT", b"AT"]);
        // AT is an infix of CAAT; only two strings chain.
        assert_eq!(links.start_positions.len(), 1);
    }

    #[test]
    fn disjoint_strings_form_separate_chains_or_zero_overlap_joins() {
        let (links, strings, alphabet) = run(&[b"ABCD", b"EFGH"]);
        let superstring = materialise(&links, &strings, &alphabet);
        assert_eq!(superstring.len(), 8);
        assert!(superstring.windows(4).any(|w| w == b"ABCD"));
        assert!(superstring.windows(4).any(|w| w == b"EFGH"));
    }

    #[test]
    fn emitted_overlaps_are_real_overlaps() {
        let words: &[&[u8]] = &[b"AGGTC", b"GTCAA", b"CAAGG", b"TCAAG", b"AAGGT"];
        let (links, strings, _) = run(words);
        for (i, link) in links.links.iter().enumerate() {
            if let Some(succ) = link {
                let left = &strings[i];
                let right = &strings[succ.index];
                assert!(succ.overlap <= left.len());
                assert!(succ.overlap <= right.len());
                assert_eq!(
                    &left[left.len() - succ.overlap..],
                    &right[..succ.overlap],
                    "bad overlap between {} and {}",
                    i,
                    succ.index
                );
            }
        }
    }

    #[test]
    fn successor_map_is_acyclic_and_injective() {
        // Equal lengths, all distinct: nothing gets absorbed, so every
        // string must appear in exactly one chain.
        let words: &[&[u8]] = &[b"AAB", b"ABA", b"BAA", b"ABB", b"BBA"];
        let (links, strings, _) = run(words);
        let mut seen_right = vec![false; strings.len()];
        for link in links.links.iter().flatten() {
            assert!(!seen_right[link.index], "two predecessors for one string");
            seen_right[link.index] = true;
        }
        // Walking from every start terminates and covers everything once.
        let mut visited = vec![false; strings.len()];
        for &start in &links.start_positions {
            let mut cur = start;
            loop {
                assert!(!visited[cur], "cycle through {}", cur);
                visited[cur] = true;
                match links.links[cur] {
                    Some(s) => cur = s.index,
                    None => break,
                }
            }
        }
        assert!(visited.iter().all(|&v| v), "some string unreached");
    }

    #[test]
    fn single_string_is_its_own_chain() {
        let (links, strings, alphabet) = run(&[b"XYZZY"]);
        assert_eq!(links.start_positions, vec![0]);
        assert_eq!(materialise(&links, &strings, &alphabet), b"XYZZY");
    }
}
