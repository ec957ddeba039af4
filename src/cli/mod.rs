// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! CLI definitions for the stitch command-line interface.
//!
//! Five mutually exclusive modes: `create-index` and `find-superstring`
//! form the suffix-tree pipeline, `find-superstring-ukkonen` runs the
//! Aho-Corasick engine end to end, `index-visualization` renders an index
//! file's section sizes, and `verify-superstring` checks a candidate
//! superstring against the original input. All modes accept
//! `--output-memory-usage` for the HTML phase/memory report.

pub mod display;

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use stitch::types::SourceFormat;

#[derive(Parser)]
#[command(
    name = "stitch",
    about = "Greedy shortest common superstring toolkit",
    version
)]
pub struct Cli {
    /// Write an HTML report of phase timings and structure sizes
    #[arg(long = "output-memory-usage", global = true, value_name = "PATH")]
    pub output_memory_usage: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Build the suffix-tree index and the sorted-strings sidecar
    CreateIndex {
        /// Input sequences
        #[arg(long)]
        source_file: PathBuf,

        /// Input format
        #[arg(long, value_enum)]
        source_format: SourceFormatArg,

        /// Where to write the serialised index
        #[arg(long)]
        index_file: PathBuf,

        /// Where to write the sentinel-separated sorted strings
        #[arg(long)]
        sorted_strings_file: PathBuf,

        /// Sentinel character; must not occur in the input
        #[arg(long, default_value_t = '#')]
        sentinel: char,
    },

    /// Compute the superstring from a prebuilt index
    FindSuperstring {
        /// Index produced by create-index
        #[arg(long)]
        index_file: PathBuf,

        /// Sidecar produced by create-index
        #[arg(long)]
        sorted_strings_file: PathBuf,
    },

    /// Compute the superstring with the Aho-Corasick engine
    FindSuperstringUkkonen {
        /// Input sequences
        #[arg(long)]
        source_file: PathBuf,

        /// Input format
        #[arg(long, value_enum)]
        source_format: SourceFormatArg,

        /// Write the superstring here instead of stdout
        #[arg(long)]
        output_file: Option<PathBuf>,
    },

    /// Render an index file's section sizes as an HTML chart
    IndexVisualization {
        /// Index produced by create-index
        #[arg(long)]
        index_file: PathBuf,

        /// Where to write the HTML chart
        #[arg(long)]
        memory_chart_file: PathBuf,
    },

    /// Check that every input occurs in a candidate superstring
    VerifySuperstring {
        /// Index built over the candidate superstring
        #[arg(long)]
        index_file: PathBuf,

        /// The original input sequences
        #[arg(long)]
        source_file: PathBuf,

        /// Input format
        #[arg(long, value_enum)]
        source_format: SourceFormatArg,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SourceFormatArg {
    Fasta,
    Text,
}

impl From<SourceFormatArg> for SourceFormat {
    fn from(arg: SourceFormatArg) -> Self {
        match arg {
            SourceFormatArg::Fasta => SourceFormat::Fasta,
            SourceFormatArg::Text => SourceFormat::Text,
        }
    }
}
