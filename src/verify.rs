// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Superstring verification.
//!
//! The index here is built over the *candidate superstring*; every input
//! sequence must occur in it as a substring. Each sequence is checked by
//! walking Weiner links from the root, one character from the right end
//! at a time - backward search in suffix-tree clothing - so a check costs
//! one rank query per character.
//!
//! The index load forms the barrier: verification only starts once it is
//! resident. With the `parallel` feature the checks fan out over rayon
//! workers and diagnostics are collected under a single lock; ordering of
//! diagnostics is not promised beyond that.

use parking_lot::Mutex;

use crate::index::{Index, SuffixIndex};
use crate::readers::SequenceToken;

/// Result of checking every input against the candidate.
pub struct VerifyOutcome {
    pub checked: usize,
    /// Diagnostics for sequences the candidate does not contain.
    pub missing: Vec<String>,
}

impl VerifyOutcome {
    pub fn succeeded(&self) -> bool {
        self.missing.is_empty()
    }
}

fn locate(index: &Index, seq: &[u8]) -> bool {
    let mut node = index.esa.root();
    for &byte in seq.iter().rev() {
        let Some(code) = index.alphabet.encode(byte) else {
            return false; // byte never occurs in the candidate
        };
        match index.esa.wl(node, code) {
            Some(next) => node = next,
            None => return false,
        }
    }
    true
}

/// Check every sequence for containment in the candidate superstring.
pub fn verify_superstring(
    index: &Index,
    sequences: &[(SequenceToken, Vec<u8>)],
) -> VerifyOutcome {
    let missing: Mutex<Vec<String>> = Mutex::new(Vec::new());

    let check = |(token, seq): &(SequenceToken, Vec<u8>)| {
        if !locate(index, seq) {
            missing
                .lock()
                .push(format!("Did not find path for string {}.", token));
        }
    };

    #[cfg(feature = "parallel")]
    {
        use rayon::prelude::*;
        sequences.par_iter().for_each(check);
    }

    #[cfg(not(feature = "parallel"))]
    {
        sequences.iter().for_each(check);
    }

    VerifyOutcome {
        checked: sequences.len(),
        missing: missing.into_inner(),
    }
}
