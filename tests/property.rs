//! Property tests for the engine laws.
//!
//! The strategies stay on small alphabets on purpose: overlaps, repeated
//! substrings and duplicate reads are where the sweeps earn their keep,
//! and a four-letter alphabet hits those constantly.

use proptest::prelude::*;

use stitch::checker::classify_strings;
use stitch::index::{build_index, SortedStrings};
use stitch::jump_list::JumpList;
use stitch::monitor::RunMonitor;
use stitch::records::StringRecord;
use stitch::sweep::find_superstring;
use stitch::types::Successor;
use stitch::ukkonen::find_superstring_ukkonen;
use stitch::verify::verify_superstring;
use stitch::alphabet::Alphabet;
use stitch::readers::SequenceToken;

fn words_strategy() -> impl Strategy<Value = Vec<Vec<u8>>> {
    let word = prop::collection::vec(prop::sample::select(b"ACGT".to_vec()), 1..12);
    prop::collection::vec(word, 1..16)
}

fn contains(hay: &[u8], needle: &[u8]) -> bool {
    hay.len() >= needle.len() && hay.windows(needle.len()).any(|w| w == needle)
}

fn core_a(words: &[Vec<u8>]) -> Vec<u8> {
    let mut out = Vec::new();
    find_superstring_ukkonen(words.to_vec(), &mut out, &mut RunMonitor::quiet()).unwrap();
    out.pop();
    out
}

fn core_b(words: &[Vec<u8>]) -> Vec<u8> {
    let (index, sidecar) = build_index(words.to_vec(), b'#').unwrap();
    let strings = SortedStrings::parse(sidecar, b'#').unwrap();
    let mut out = Vec::new();
    find_superstring(&index, &strings, &mut out, &mut RunMonitor::quiet()).unwrap();
    out.pop();
    out
}

proptest! {
    /// Coverage: every input is a substring of both cores' outputs.
    #[test]
    fn both_cores_cover_all_inputs(words in words_strategy()) {
        let a = core_a(&words);
        let b = core_b(&words);
        for w in &words {
            prop_assert!(contains(&a, w), "trie engine lost {:?}", w);
            prop_assert!(contains(&b, w), "index engine lost {:?}", w);
        }
        // Neither output can beat the longest input.
        let longest = words.iter().map(|w| w.len()).max().unwrap();
        prop_assert!(a.len() >= longest);
        prop_assert!(b.len() >= longest);
    }

    /// Verifier round trip: each core's output passes verification
    /// against the original input set.
    #[test]
    fn verifier_accepts_both_cores(words in words_strategy()) {
        for candidate in [core_a(&words), core_b(&words)] {
            let (index, _) = build_index(vec![candidate], b'#').unwrap();
            let sequences: Vec<(SequenceToken, Vec<u8>)> = words
                .iter()
                .enumerate()
                .map(|(i, w)| (SequenceToken::Line(i as u32 + 1), w.clone()))
                .collect();
            let outcome = verify_superstring(&index, &sequences);
            prop_assert!(outcome.succeeded(), "missing: {:?}", outcome.missing);
        }
    }

    /// Substring classification agrees with the naive oracle.
    #[test]
    fn uniqueness_matches_naive_oracle(words in words_strategy()) {
        let mut sorted = words.clone();
        sorted.sort_unstable();
        sorted.dedup();

        let (index, _) = build_index(words, b'#').unwrap();
        let records: Vec<StringRecord> =
            classify_strings(&index.esa, &index.string_lengths).iter().collect();

        for (i, r) in records.iter().enumerate() {
            let naive = sorted
                .iter()
                .enumerate()
                .any(|(j, other)| j != i && contains(other, &sorted[i]));
            prop_assert_eq!(
                r.is_unique, !naive,
                "string {:?}", String::from_utf8_lossy(&sorted[i])
            );
        }
    }

    /// The matching suffix really is the longest suffix with a second
    /// occurrence in the sentinel text.
    #[test]
    fn matching_suffix_length_is_maximal(words in words_strategy()) {
        let mut sorted = words.clone();
        sorted.sort_unstable();
        sorted.dedup();
        let mut text = vec![b'#'];
        for w in &sorted {
            text.extend_from_slice(w);
            text.push(b'#');
        }

        let (index, _) = build_index(words, b'#').unwrap();
        let records: Vec<StringRecord> =
            classify_strings(&index.esa, &index.string_lengths).iter().collect();

        for (i, r) in records.iter().enumerate() {
            if !r.is_unique {
                continue;
            }
            let s = &sorted[i];
            let expect = (0..s.len())
                .map(|k| &s[k..])
                .find(|suffix| text.windows(suffix.len()).filter(|w| w == suffix).count() >= 2)
                .map_or(0, |suffix| suffix.len());
            prop_assert_eq!(r.matching_suffix_length, expect);
        }
    }

    /// Alphabet compaction is idempotent and order-preserving in the
    /// ordered variant.
    #[test]
    fn alphabet_compaction_laws(words in words_strategy()) {
        let a = Alphabet::ordered(words.iter().map(|w| w.as_slice()), b'#').unwrap();
        let b = Alphabet::ordered(words.iter().map(|w| w.as_slice()), b'#').unwrap();
        prop_assert_eq!(&a, &b);
        // Order preservation over the raw bytes.
        let mut seen: Vec<u8> = words.iter().flatten().copied().collect();
        seen.sort_unstable();
        seen.dedup();
        for pair in seen.windows(2) {
            prop_assert!(a.encode(pair[0]).unwrap() < a.encode(pair[1]).unwrap());
        }

        let c = Alphabet::first_seen(words.iter().map(|w| w.as_slice()));
        let d = Alphabet::first_seen(words.iter().map(|w| w.as_slice()));
        prop_assert_eq!(&c, &d);
    }

    /// The jump list behaves exactly like a naive array-backed list under
    /// random advance/skip/reset sequences.
    #[test]
    fn jump_list_matches_naive_list(
        capacity in 1usize..40,
        ops in prop::collection::vec(0u8..3, 0..120),
    ) {
        let mut list = JumpList::new(capacity);
        let mut naive: Vec<usize> = (0..capacity).collect();

        let mut cursor = 0usize; // index into naive
        let mut started = list.reset();
        prop_assert_eq!(started, !naive.is_empty());

        for op in ops {
            match op {
                // reset
                0 => {
                    started = list.reset();
                    cursor = 0;
                    prop_assert_eq!(started, !naive.is_empty());
                }
                // advance
                1 => {
                    if started && cursor < naive.len() {
                        prop_assert_eq!(list.current(), naive[cursor]);
                        list.advance(1);
                        cursor += 1;
                    }
                }
                // advance_and_mark_skipped
                _ => {
                    if started && cursor < naive.len() {
                        prop_assert_eq!(list.current(), naive[cursor]);
                        list.advance_and_mark_skipped(1);
                        naive.remove(cursor);
                    }
                }
            }
            prop_assert_eq!(list.len(), naive.len());
            if started {
                prop_assert_eq!(cursor >= naive.len(), list.at_end());
            }
        }
    }
}

/// Overlap correctness of the trie engine links, checked directly on the
/// successor map rather than through the output.
#[test]
fn core_a_links_are_true_overlaps() {
    use stitch::trie::KeywordTrie;
    use stitch::ukkonen::build_overlap_links;

    let words: Vec<Vec<u8>> = vec![
        b"AGGTCA".to_vec(),
        b"GTCAGG".to_vec(),
        b"CAGGTT".to_vec(),
        b"TTAGGT".to_vec(),
        b"GGTTAG".to_vec(),
    ];
    let alphabet = Alphabet::first_seen(words.iter().map(|w| w.as_slice()));
    let mut trie = KeywordTrie::new(alphabet.sigma());
    let mut accepted: Vec<Vec<u8>> = Vec::new();
    let mut states = Vec::new();
    for w in &words {
        let mut codes = w.clone();
        alphabet.encode_in_place(&mut codes);
        if let Some(s) = trie.insert(&codes, accepted.len() as u32) {
            states.push(s);
            accepted.push(codes);
        }
    }
    trie.finalize();
    let chains = build_overlap_links(&trie, &states);

    let mut prev_count = vec![0usize; accepted.len()];
    for (i, link) in chains.links.iter().enumerate() {
        if let Some(Successor { index, overlap }) = link {
            prev_count[*index] += 1;
            assert_eq!(
                &accepted[i][accepted[i].len() - overlap..],
                &accepted[*index][..*overlap]
            );
        }
    }
    // Pairing: nothing is the right end of two merges.
    assert!(prev_count.iter().all(|&c| c <= 1));
}
