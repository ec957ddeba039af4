// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Index construction, persistence and the sorted-strings sidecar.
//!
//! `create-index` sorts the input strings by byte value, collapses exact
//! duplicates, writes the sentinel-separated concatenation
//! `#s_0#s_1…#s_{m-1}#` as the sidecar, and builds the enhanced suffix
//! array over the compacted code text (terminator appended). Sorting
//! before concatenation is what makes the i-th sentinel row of the suffix
//! array correspond to the i-th string, which both the branch checker and
//! the chainer rely on.

pub mod binary;
mod esa;
mod sais;

pub use binary::{decode_index, encode_index, read_size_tree, SizeTree};
pub use esa::{Esa, IntervalSymbols, SuffixIndex};
pub use sais::suffix_array;

use std::fs;
use std::path::Path;

use crate::alphabet::{Alphabet, SENTINEL, TERMINATOR};
use crate::intvec::IntVector;
use crate::types::{Error, Result};

/// A loaded index: the suffix structure plus everything needed to map
/// between bytes, codes and sorted-string positions.
pub struct Index {
    pub esa: Esa,
    pub alphabet: Alphabet,
    /// Length of each string, in sorted order.
    pub string_lengths: IntVector,
    /// Raw sentinel byte.
    pub sentinel: u8,
    /// Whether the file carries the debug-variant structures (LCP).
    pub contains_debug_info: bool,
}

impl Index {
    /// Number of indexed strings.
    pub fn string_count(&self) -> usize {
        self.string_lengths.len()
    }

    pub fn max_string_length(&self) -> usize {
        self.string_lengths.iter().max().unwrap_or(0) as usize
    }
}

/// Sort, deduplicate and index a set of sequences.
///
/// Returns the index and the sidecar bytes (the raw sentinel-separated
/// concatenation of the surviving strings).
pub fn build_index(mut sequences: Vec<Vec<u8>>, sentinel: u8) -> Result<(Index, Vec<u8>)> {
    sequences.retain(|s| !s.is_empty());
    if sequences.is_empty() {
        return Err(Error::EmptyInput);
    }

    sequences.sort_unstable();
    sequences.dedup();

    let alphabet = Alphabet::ordered(sequences.iter().map(|s| s.as_slice()), sentinel)?;

    // Sidecar: raw bytes. Code text: same shape, compacted, terminated.
    let total: usize = sequences.iter().map(|s| s.len()).sum();
    let mut sidecar = Vec::with_capacity(total + sequences.len() + 1);
    let mut text = Vec::with_capacity(total + sequences.len() + 2);
    for seq in &sequences {
        sidecar.push(sentinel);
        sidecar.extend_from_slice(seq);
        text.push(SENTINEL);
        text.extend(seq.iter().map(|&c| {
            alphabet
                .encode(c)
                .expect("alphabet was built over these bytes")
        }));
    }
    sidecar.push(sentinel);
    text.push(SENTINEL);
    text.push(TERMINATOR);

    let max_len = sequences.iter().map(|s| s.len()).max().unwrap_or(0);
    let string_lengths = IntVector::from_values(
        sequences.iter().map(|s| s.len() as u64),
        max_len as u64,
    );

    let esa = Esa::from_text(text, alphabet.sigma());

    Ok((
        Index {
            esa,
            alphabet,
            string_lengths,
            sentinel,
            contains_debug_info: cfg!(debug_assertions),
        },
        sidecar,
    ))
}

/// Serialise an index to disk; returns the section size tree.
pub fn save_index(index: &Index, path: &Path) -> Result<SizeTree> {
    let (bytes, tree) = encode_index(index);
    fs::write(path, bytes)?;
    Ok(tree)
}

/// Load an index from disk, validating the CRC and the debug-variant
/// flag against this build.
///
/// A debug build refuses an index without the debugging structures; a
/// release build accepts a debugging index with a warning (memory
/// accounting will overstate).
pub fn load_index(path: &Path) -> Result<Index> {
    let bytes = fs::read(path)?;
    let index = decode_index(&bytes)?;

    if cfg!(debug_assertions) && !index.contains_debug_info {
        return Err(Error::IndexMismatch(
            "this build has assertions enabled but the index does not \
             contain the necessary debugging structures; rebuild the index"
                .to_string(),
        ));
    }
    if !cfg!(debug_assertions) && index.contains_debug_info {
        eprintln!(
            "WARNING: the index contains debugging structures this build \
             does not use; memory usage figures will not be accurate."
        );
    }
    Ok(index)
}

/// The sorted-strings sidecar, parsed into addressable strings.
pub struct SortedStrings {
    bytes: Vec<u8>,
    /// Byte offset of each string in `bytes`.
    starts: Vec<usize>,
    lengths: Vec<usize>,
}

impl SortedStrings {
    pub fn parse(bytes: Vec<u8>, sentinel: u8) -> Result<Self> {
        if bytes.first() != Some(&sentinel) || bytes.last() != Some(&sentinel) {
            return Err(Error::BadFormat(
                "sorted-strings file must start and end with the sentinel".to_string(),
            ));
        }
        let mut starts = Vec::new();
        let mut lengths = Vec::new();
        let mut start = 1;
        for (i, &b) in bytes.iter().enumerate().skip(1) {
            if b == sentinel {
                if i == start {
                    return Err(Error::BadFormat(
                        "empty string in the sorted-strings file".to_string(),
                    ));
                }
                starts.push(start);
                lengths.push(i - start);
                start = i + 1;
            }
        }
        if start != bytes.len() {
            return Err(Error::BadFormat(
                "trailing bytes after the final sentinel".to_string(),
            ));
        }
        Ok(SortedStrings {
            bytes,
            starts,
            lengths,
        })
    }

    pub fn load(path: &Path, sentinel: u8) -> Result<Self> {
        Self::parse(fs::read(path)?, sentinel)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.starts.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.starts.is_empty()
    }

    #[inline]
    pub fn string_at(&self, i: usize) -> &[u8] {
        &self.bytes[self.starts[i]..self.starts[i] + self.lengths[i]]
    }
}
