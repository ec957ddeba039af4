// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Shared types for the superstring engines.
//!
//! Both cores speak the same small vocabulary: strings are identified by
//! their 0-based index into the accepted input set, overlaps are byte
//! counts, and a finished run is a partial successor map plus the set of
//! chain starts.
//!
//! # Invariants (the stuff that breaks if you ignore it)
//!
//! - **Successor**: `overlap <= len(strings[index])` for the left-hand
//!   string. The chain writer slices `strings[next][overlap..]`, so a bad
//!   overlap is an immediate panic, not a silently wrong superstring.
//! - **Error**: every variant maps to a stable process exit code; the CLI
//!   relies on `exit_code()` rather than matching variants itself.

use std::fmt;
use std::io;

/// Successor edge in the directed overlap graph.
///
/// `next[i] = Some(Successor { index: j, overlap })` means string `j`
/// follows string `i` in the final chain and the last `overlap` bytes of
/// `s_i` equal the first `overlap` bytes of `s_j`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Successor {
    pub index: usize,
    pub overlap: usize,
}

/// Handle to a suffix-tree locus inside a text index.
///
/// `lb..=rb` is the lexicographic range of suffixes whose prefix is the
/// node's path label; `depth` is the label's length in characters. The
/// root is `lb = 0, rb = len - 1, depth = 0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Node {
    pub lb: usize,
    pub rb: usize,
    pub depth: usize,
}

impl Node {
    #[inline]
    pub fn is_leaf(&self) -> bool {
        self.lb == self.rb
    }

    /// Number of suffixes under this node.
    #[inline]
    pub fn count(&self) -> usize {
        self.rb - self.lb + 1
    }
}

/// Input file format accepted by the readers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Fasta,
    Text,
}

impl fmt::Display for SourceFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceFormat::Fasta => write!(f, "fasta"),
            SourceFormat::Text => write!(f, "text"),
        }
    }
}

/// Error surface of the crate.
///
/// Readers and index constructors push these up to the driver, which
/// prints a single diagnostic and exits with `exit_code()`. Structural
/// assertions inside the engine sweeps are *not* represented here; those
/// panic (the index or the engine state is corrupt and nothing can be
/// salvaged).
#[derive(Debug)]
pub enum Error {
    /// File open/read/write failure.
    Io(io::Error),
    /// Malformed FASTA or unexpected source-format value.
    BadFormat(String),
    /// An input byte equals the sentinel character.
    SentinelInInput { sentinel: u8, token: String },
    /// More than the supported number of distinct input bytes.
    AlphabetOverflow { limit: usize },
    /// No mode given or a required sidecar is missing.
    Mode(String),
    /// Index debug-variant flag incompatible with this build.
    IndexMismatch(String),
    /// The input contained no strings at all.
    EmptyInput,
    /// Detected structural corruption that is a bug, not an input problem.
    Invariant(String),
}

impl Error {
    /// Process exit code for this error kind.
    ///
    /// 1 = configuration, 2 = input, 3 = internal invariant.
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::Mode(_) => 1,
            Error::Io(_)
            | Error::BadFormat(_)
            | Error::SentinelInInput { .. }
            | Error::AlphabetOverflow { .. }
            | Error::IndexMismatch(_)
            | Error::EmptyInput => 2,
            Error::Invariant(_) => 3,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Io(e) => write!(f, "I/O error: {}", e),
            Error::BadFormat(msg) => write!(f, "bad input format: {}", msg),
            Error::SentinelInInput { sentinel, token } => write!(
                f,
                "sequence {} contains the sentinel character {:?}",
                token, *sentinel as char
            ),
            Error::AlphabetOverflow { limit } => {
                write!(f, "more than {} distinct input bytes", limit)
            }
            Error::Mode(msg) => write!(f, "configuration error: {}", msg),
            Error::IndexMismatch(msg) => write!(f, "index mismatch: {}", msg),
            Error::EmptyInput => write!(f, "the input contains no sequences"),
            Error::Invariant(msg) => write!(f, "internal invariant violated: {}", msg),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Self {
        Error::Io(e)
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_are_stable() {
        assert_eq!(Error::Mode("x".into()).exit_code(), 1);
        assert_eq!(Error::EmptyInput.exit_code(), 2);
        assert_eq!(Error::AlphabetOverflow { limit: 254 }.exit_code(), 2);
        assert_eq!(Error::Invariant("x".into()).exit_code(), 3);
    }
}
