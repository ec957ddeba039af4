//! Greedy shortest common superstring, two ways.
//!
//! This crate computes an approximate shortest common superstring over a
//! multiset of byte strings with two independent engines sharing one
//! input/output contract:
//!
//! ```text
//! Aho-Corasick engine                suffix-tree engine
//! ┌──────────┐  ┌─────────┐          ┌───────────┐  ┌─────────┐
//! │ alphabet │─▶│  trie   │          │  index::  │─▶│ checker │
//! └──────────┘  └────┬────┘          │  Esa      │  └────┬────┘
//!                    │               └───────────┘       │
//!                    ▼                                   ▼
//!               ┌─────────┐                         ┌─────────┐
//!               │ ukkonen │                         │  sweep  │
//!               └────┬────┘                         └────┬────┘
//!                    └──────────────┬────────────────────┘
//!                                   ▼
//!                             ┌───────────┐
//!                             │   chain   │ ─▶ superstring
//!                             └───────────┘
//! ```
//!
//! Both engines realise the same classical greedy: repeatedly merge the
//! pair with the largest suffix/prefix overlap whose endpoints are still
//! free and whose union does not close a cycle, then emit the chains.
//! The trie engine does it in linear time over the whole input (Ukkonen
//! 1990); the suffix-tree engine works over a suffix-array index with
//! Weiner and suffix links, built once and reusable from disk.
//!
//! The supporting cast is shared: a pointerless jump list for in-sweep
//! deletion, a union-find with next-available tracking for the chainer,
//! and width-packed record arrays with a get/set-driven sort.
//!
//! # Usage
//!
//! ```
//! use stitch::index::{build_index, SortedStrings};
//! use stitch::monitor::RunMonitor;
//! use stitch::sweep::find_superstring;
//!
//! let reads = vec![b"ACAG".to_vec(), b"CAGT".to_vec(), b"AGTC".to_vec()];
//! let (index, sidecar) = build_index(reads, b'#').unwrap();
//! let strings = SortedStrings::parse(sidecar, b'#').unwrap();
//!
//! let mut out = Vec::new();
//! find_superstring(&index, &strings, &mut out, &mut RunMonitor::quiet()).unwrap();
//! assert_eq!(out, b"ACAGTC\n");
//! ```

pub mod alphabet;
pub mod chain;
pub mod checker;
pub mod index;
pub mod intvec;
pub mod jump_list;
pub mod monitor;
pub mod readers;
pub mod records;
pub mod sweep;
pub mod trie;
pub mod types;
pub mod ukkonen;
pub mod union_find;
pub mod verify;

pub use chain::{write_superstring, ChainSet, SuperstringBuilder};
pub use index::{build_index, load_index, save_index, Esa, Index, SortedStrings, SuffixIndex};
pub use sweep::find_superstring;
pub use types::{Error, Node, Result, SourceFormat, Successor};
pub use ukkonen::find_superstring_ukkonen;
