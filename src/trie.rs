// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Aho-Corasick keyword trie with alphabet-dense transitions.
//!
//! States live in a single flat vector and refer to each other by index;
//! parent and failure links are plain lookups, so the cyclic link graph
//! never turns into an ownership cycle. Child lookup is O(1) through a
//! dense per-state array of `sigma` slots (space traded for time), with
//! `used` tracking the occupied slots for cheap iteration.
//!
//! The accepted keyword set is antichain-closed: no accepted keyword is a
//! proper substring of another. Duplicates and proper prefixes are
//! rejected at insertion, keywords strictly contained in a newly inserted
//! one are unmarked at insertion, and [`KeywordTrie::finalize`] unmarks
//! keywords that occur as suffixes or infixes of others (every such
//! keyword sits on the failure chain of some trie state, so one pass over
//! the immediate failure links finds them all).
//!
//! `finalize` also assigns breadth-first ranks, which satisfy
//! `rank(parent) < rank(child)`; the greedy engine depends on that for its
//! reverse-BFS sweep.

pub type StateId = u32;

/// Dense character-to-child map for one state.
#[derive(Debug, Clone)]
pub struct TransitionMap {
    /// Child id per code; 0 means "no child" (the root is never a child).
    slots: Vec<StateId>,
    /// Codes with a child, in insertion order.
    used: Vec<u8>,
}

impl TransitionMap {
    fn new(sigma: usize) -> Self {
        TransitionMap {
            slots: vec![0; sigma],
            used: Vec::new(),
        }
    }

    #[inline]
    pub fn get(&self, code: u8) -> Option<StateId> {
        match self.slots[code as usize] {
            0 => None,
            id => Some(id),
        }
    }

    fn set(&mut self, code: u8, id: StateId) {
        debug_assert_eq!(self.slots[code as usize], 0);
        debug_assert_ne!(id, 0);
        self.slots[code as usize] = id;
        self.used.push(code);
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.used.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.used.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (u8, StateId)> + '_ {
        self.used.iter().map(move |&c| (c, self.slots[c as usize]))
    }
}

#[derive(Debug, Clone)]
struct State {
    transitions: TransitionMap,
    parent: Option<StateId>,
    failure: Option<StateId>,
    depth: u32,
    /// Accepted string index whose complete label ends here.
    keyword: Option<u32>,
    /// Terminal states in this state's subtree, itself included.
    finals_in_subtree: u32,
}

/// Aho-Corasick trie over a compacted alphabet.
///
/// The alphabet must be fixed before construction; inserting a code
/// outside `0..sigma` is a programmer error.
pub struct KeywordTrie {
    states: Vec<State>,
    sigma: usize,
    accepted: u32,
    finalized: bool,
    bfs_order: Vec<StateId>,
    bfs_rank: Vec<u32>,
    final_states_bfs: Vec<StateId>,
}

pub const ROOT: StateId = 0;

impl KeywordTrie {
    pub fn new(sigma: usize) -> Self {
        assert!(sigma > 0 && sigma <= 256, "alphabet size out of range");
        KeywordTrie {
            states: vec![State {
                transitions: TransitionMap::new(sigma),
                parent: None,
                failure: None,
                depth: 0,
                keyword: None,
                finals_in_subtree: 0,
            }],
            sigma,
            accepted: 0,
            finalized: false,
            bfs_order: Vec::new(),
            bfs_rank: Vec::new(),
            final_states_bfs: Vec::new(),
        }
    }

    /// Number of states, root included.
    #[inline]
    pub fn state_count(&self) -> usize {
        self.states.len()
    }

    /// Number of strings accepted at insertion. Not decremented when a
    /// keyword is later unmarked; the engine sizes its arrays from this.
    #[inline]
    pub fn keyword_count(&self) -> usize {
        self.accepted as usize
    }

    /// Insert a compacted word; returns its terminal state, or `None` when
    /// the word is a duplicate or a proper prefix of an accepted keyword.
    ///
    /// Accepted keywords that are proper prefixes of `word` are unmarked.
    pub fn insert(&mut self, word: &[u8], string_idx: u32) -> Option<StateId> {
        assert!(!self.finalized, "insert after finalize");
        assert!(!word.is_empty(), "empty keyword");

        // First walk without creating anything so rejection is a no-op.
        let mut state = ROOT;
        let mut walked = 0usize;
        for &c in word {
            debug_assert!((c as usize) < self.sigma, "code outside the alphabet");
            match self.states[state as usize].transitions.get(c) {
                Some(next) => {
                    state = next;
                    walked += 1;
                }
                None => break,
            }
        }

        if walked == word.len() {
            let end = &self.states[state as usize];
            if end.keyword.is_some() || end.finals_in_subtree > 0 {
                // Duplicate, or a proper prefix of an accepted keyword.
                return None;
            }
        }

        // Create the remaining path.
        for &c in &word[walked..] {
            let id = self.states.len() as StateId;
            assert!(id != u32::MAX, "state count overflow");
            let depth = self.states[state as usize].depth + 1;
            self.states.push(State {
                transitions: TransitionMap::new(self.sigma),
                parent: Some(state),
                failure: None,
                depth,
                keyword: None,
                finals_in_subtree: 0,
            });
            self.states[state as usize].transitions.set(c, id);
            state = id;
        }

        // Unmark accepted keywords dominated by the new one (its proper
        // prefixes), then mark the end state.
        let mut cursor = self.states[state as usize].parent;
        while let Some(s) = cursor {
            if self.states[s as usize].keyword.take().is_some() {
                self.adjust_subtree_finals(s, -1);
            }
            cursor = self.states[s as usize].parent;
        }
        self.states[state as usize].keyword = Some(string_idx);
        self.adjust_subtree_finals(state, 1);
        self.accepted += 1;
        Some(state)
    }

    fn adjust_subtree_finals(&mut self, state: StateId, delta: i32) {
        let mut cursor = Some(state);
        while let Some(s) = cursor {
            let count = &mut self.states[s as usize].finals_in_subtree;
            *count = count.wrapping_add_signed(delta);
            cursor = self.states[s as usize].parent;
        }
    }

    /// Compute failure links, BFS ranks and the terminal pruning pass.
    pub fn finalize(&mut self) {
        assert!(!self.finalized, "finalize called twice");
        self.finalized = true;

        let count = self.states.len();
        self.bfs_order = Vec::with_capacity(count);
        self.bfs_rank = vec![0; count];

        // BFS over states; the work queue is seeded with the root's
        // children, whose failure link is the root itself.
        let mut queue = std::collections::VecDeque::new();
        self.bfs_order.push(ROOT);
        let root_children: Vec<StateId> = self.states[ROOT as usize]
            .transitions
            .iter()
            .map(|(_, child)| child)
            .collect();
        for child in root_children {
            self.states[child as usize].failure = Some(ROOT);
            queue.push_back(child);
        }
        while let Some(s) = queue.pop_front() {
            self.bfs_order.push(s);
            let fail_s = self.states[s as usize].failure.unwrap_or(ROOT);
            let transitions: Vec<(u8, StateId)> =
                self.states[s as usize].transitions.iter().collect();
            for (c, child) in transitions {
                let mut f = fail_s;
                let target = loop {
                    if let Some(t) = self.states[f as usize].transitions.get(c) {
                        break t;
                    }
                    match self.states[f as usize].failure {
                        Some(up) => f = up,
                        None => break ROOT,
                    }
                };
                self.states[child as usize].failure =
                    Some(if target == child { ROOT } else { target });
                queue.push_back(child);
            }
        }
        debug_assert_eq!(self.bfs_order.len(), count);
        for (rank, &s) in self.bfs_order.iter().enumerate() {
            self.bfs_rank[s as usize] = rank as u32;
        }

        // A keyword sitting on any state's failure link is a proper suffix
        // of that state's label, hence a substring of some longer keyword.
        for idx in 0..count {
            if let Some(f) = self.states[idx].failure {
                if f != ROOT {
                    self.states[f as usize].keyword = None;
                }
            }
        }

        self.final_states_bfs = self
            .bfs_order
            .iter()
            .copied()
            .filter(|&s| self.states[s as usize].keyword.is_some())
            .collect();
    }

    /// All states in BFS order. Available after `finalize`.
    pub fn states_in_bfs_order(&self) -> &[StateId] {
        debug_assert!(self.finalized);
        &self.bfs_order
    }

    /// Surviving terminal states in BFS order. Available after `finalize`.
    pub fn final_states_in_bfs_order(&self) -> &[StateId] {
        debug_assert!(self.finalized);
        &self.final_states_bfs
    }

    /// BFS rank of a state; parents rank below children.
    #[inline]
    pub fn bfs_rank(&self, state: StateId) -> usize {
        self.bfs_rank[state as usize] as usize
    }

    #[inline]
    pub fn depth(&self, state: StateId) -> usize {
        self.states[state as usize].depth as usize
    }

    #[inline]
    pub fn parent(&self, state: StateId) -> Option<StateId> {
        self.states[state as usize].parent
    }

    #[inline]
    pub fn failure(&self, state: StateId) -> Option<StateId> {
        self.states[state as usize].failure
    }

    /// Accepted string index ending at this state, if still marked.
    #[inline]
    pub fn keyword_at(&self, state: StateId) -> Option<u32> {
        self.states[state as usize].keyword
    }

    #[inline]
    pub fn child(&self, state: StateId, code: u8) -> Option<StateId> {
        self.states[state as usize].transitions.get(code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build(words: &[&[u8]]) -> (KeywordTrie, Vec<Option<StateId>>) {
        let sigma = 26;
        let mut trie = KeywordTrie::new(sigma);
        let mut states = Vec::new();
        let mut idx = 0u32;
        for w in words {
            let codes: Vec<u8> = w.iter().map(|&c| c - b'a').collect();
            let state = trie.insert(&codes, idx);
            if state.is_some() {
                idx += 1;
            }
            states.push(state);
        }
        (trie, states)
    }

    #[test]
    fn duplicate_and_prefix_are_rejected() {
        let (trie, states) = build(&[b"abc", b"abc", b"ab"]);
        assert!(states[0].is_some());
        assert!(states[1].is_none());
        assert!(states[2].is_none());
        assert_eq!(trie.keyword_count(), 1);
    }

    #[test]
    fn containing_word_unmarks_its_prefix() {
        let (mut trie, states) = build(&[b"ab", b"abc"]);
        assert!(states[0].is_some());
        assert!(states[1].is_some());
        trie.finalize();
        assert_eq!(trie.keyword_at(states[0].unwrap()), None);
        assert_eq!(trie.keyword_at(states[1].unwrap()), Some(1));
        assert_eq!(trie.final_states_in_bfs_order().len(), 1);
    }

    #[test]
    fn finalize_unmarks_suffixes_and_infixes() {
        // "at" is an infix of "cats", "ts" is a suffix of it.
        let (mut trie, states) = build(&[b"cats", b"at", b"ts", b"dog"]);
        trie.finalize();
        assert_eq!(trie.keyword_at(states[1].unwrap()), None);
        assert_eq!(trie.keyword_at(states[2].unwrap()), None);
        assert!(trie.keyword_at(states[0].unwrap()).is_some());
        assert!(trie.keyword_at(states[3].unwrap()).is_some());
        assert_eq!(trie.final_states_in_bfs_order().len(), 2);
    }

    #[test]
    fn bfs_rank_orders_parents_before_children() {
        let (mut trie, _) = build(&[b"abcd", b"bcd", b"cd", b"d"]);
        trie.finalize();
        for &s in trie.states_in_bfs_order() {
            if let Some(p) = trie.parent(s) {
                assert!(trie.bfs_rank(p) < trie.bfs_rank(s));
            }
        }
        assert_eq!(trie.states_in_bfs_order().len(), trie.state_count());
    }

    #[test]
    fn failure_links_point_to_longest_proper_suffix() {
        let (mut trie, states) = build(&[b"ab", b"bab"]);
        trie.finalize();
        // state of "bab" fails to state of "ab".
        let bab = states[1].unwrap();
        let ab = states[0].unwrap();
        assert_eq!(trie.failure(bab), Some(ab));
        // "ab" was just unmarked as a substring of "bab".
        assert_eq!(trie.keyword_at(ab), None);
    }

    #[test]
    fn antichain_property_on_random_words() {
        let words: Vec<Vec<u8>> = (0..60u64)
            .map(|k| {
                let mut x = k.wrapping_mul(0x9E37_79B9_7F4A_7C15) | 1;
                let len = (x % 7 + 1) as usize;
                (0..len)
                    .map(|_| {
                        x ^= x << 13;
                        x ^= x >> 7;
                        (x % 3) as u8
                    })
                    .collect()
            })
            .collect();

        let mut trie = KeywordTrie::new(3);
        let mut accepted: Vec<(u32, Vec<u8>)> = Vec::new();
        let mut states = Vec::new();
        for (i, w) in words.iter().enumerate() {
            if let Some(s) = trie.insert(w, i as u32) {
                states.push((s, w.clone()));
                accepted.push((i as u32, w.clone()));
            }
        }
        trie.finalize();

        let is_substring = |needle: &[u8], hay: &[u8]| {
            hay.windows(needle.len()).any(|w| w == needle)
        };
        let survivors: Vec<&Vec<u8>> = states
            .iter()
            .filter(|(s, _)| trie.keyword_at(*s).is_some())
            .map(|(_, w)| w)
            .collect();
        for a in &survivors {
            for b in &survivors {
                if !std::ptr::eq(*a, *b) {
                    assert!(
                        !is_substring(a, b),
                        "{:?} survives but is a substring of {:?}",
                        a,
                        b
                    );
                }
            }
        }
        // Every word is still covered by some survivor.
        for w in &words {
            assert!(
                survivors.iter().any(|s| is_substring(w, s)),
                "{:?} lost",
                w
            );
        }
    }
}
