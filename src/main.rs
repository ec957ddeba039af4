// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Stitch CLI: build indexes, compute superstrings, verify them.
//!
//! ```bash
//! # Build the suffix-tree index over a FASTA file
//! stitch create-index --source-file reads.fa --source-format fasta \
//!     --index-file reads.stitch --sorted-strings-file reads.strings
//!
//! # Compute the superstring from the index
//! stitch find-superstring --index-file reads.stitch \
//!     --sorted-strings-file reads.strings > superstring.txt
//!
//! # Or run the Aho-Corasick engine directly on the input
//! stitch find-superstring-ukkonen --source-file reads.fa \
//!     --source-format fasta
//!
//! # Check the result against the input
//! stitch create-index --source-file superstring.txt --source-format text \
//!     --index-file candidate.stitch --sorted-strings-file candidate.strings
//! stitch verify-superstring --index-file candidate.stitch \
//!     --source-file reads.fa --source-format fasta
//! ```
//!
//! Exit codes: 0 success, 1 configuration error, 2 input error,
//! 3 internal invariant failure.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::panic::AssertUnwindSafe;
use std::path::Path;

use anyhow::Context;
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};

use stitch::index::{build_index, load_index, read_size_tree, save_index, SortedStrings};
use stitch::monitor::{write_size_chart, RunMonitor};
use stitch::readers::collect_sequences;
use stitch::sweep::find_superstring;
use stitch::types::Error;
use stitch::ukkonen::find_superstring_ukkonen;
use stitch::verify::verify_superstring;

mod cli;
use cli::display::{styled, GREEN, RED, YELLOW};
use cli::{Cli, Commands};

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            // Clap's own exit codes do not match ours; everything wrong
            // with the command line is a configuration error.
            let _ = e.print();
            std::process::exit(1);
        }
    };

    eprintln!(
        "Assertions have been {}.",
        if cfg!(debug_assertions) { "enabled" } else { "disabled" }
    );

    let memory_usage_path = cli.output_memory_usage.clone();
    let mut monitor = RunMonitor::new();
    let outcome = std::panic::catch_unwind(AssertUnwindSafe(|| run(cli, &mut monitor)));

    let code = match outcome {
        Ok(Ok(code)) => {
            if let Some(path) = &memory_usage_path {
                if let Err(e) = write_memory_report(&monitor, path) {
                    eprintln!(
                        "{} could not write the memory report: {}",
                        styled(YELLOW, "WARNING:"),
                        e
                    );
                }
            }
            code
        }
        Ok(Err(err)) => {
            eprintln!("{} {:#}", styled(RED, "ERROR:"), err);
            // Typed errors carry their exit code; anything else (bare I/O,
            // usually) is an input problem.
            err.downcast_ref::<Error>()
                .map(Error::exit_code)
                .unwrap_or(2)
        }
        Err(_) => {
            // The panic hook has already printed the message.
            eprintln!("{}", styled(RED, "Internal invariant failure."));
            3
        }
    };

    eprintln!("Total time elapsed: {} ms.", monitor.total_elapsed_ms());
    std::process::exit(code);
}

fn write_memory_report(monitor: &RunMonitor, path: &Path) -> std::io::Result<()> {
    let mut out = BufWriter::new(File::create(path)?);
    monitor.write_html(&mut out)?;
    out.flush()
}

fn run(cli: Cli, monitor: &mut RunMonitor) -> anyhow::Result<i32> {
    match cli.command {
        Commands::CreateIndex {
            source_file,
            source_format,
            index_file,
            sorted_strings_file,
            sentinel,
        } => {
            let sentinel = single_byte(sentinel)?;
            let source = File::open(&source_file)
                .with_context(|| format!("opening {}", source_file.display()))?;
            let sequences = monitor.phase("Reading the sequences", || {
                collect_sequences(BufReader::new(source), source_format.into())
            })?;

            for (token, seq) in &sequences {
                if seq.contains(&sentinel) {
                    return Err(Error::SentinelInInput {
                        sentinel,
                        token: token.to_string(),
                    }
                    .into());
                }
            }

            let bytes: Vec<Vec<u8>> = sequences.into_iter().map(|(_, s)| s).collect();
            let (index, sidecar) =
                monitor.phase("Creating the index", || build_index(bytes, sentinel))?;
            monitor.phase("Writing the strings file", || {
                fs::write(&sorted_strings_file, &sidecar)
            })?;
            let tree = monitor.phase("Serialising", || save_index(&index, &index_file))?;
            monitor.note_bytes("index file", tree.total());
            monitor.note_bytes("sorted strings file", sidecar.len() as u64);
            Ok(0)
        }

        Commands::FindSuperstring {
            index_file,
            sorted_strings_file,
        } => {
            let index = monitor.phase("Loading the index", || load_index(&index_file))?;
            let strings = SortedStrings::load(&sorted_strings_file, index.sentinel)?;
            for (label, size) in index.esa.component_sizes() {
                monitor.note_bytes(label, size as u64);
            }

            let stdout = std::io::stdout();
            let mut out = BufWriter::new(stdout.lock());
            find_superstring(&index, &strings, &mut out, monitor)?;
            out.flush()?;
            Ok(0)
        }

        Commands::FindSuperstringUkkonen {
            source_file,
            source_format,
            output_file,
        } => {
            let source = File::open(&source_file)
                .with_context(|| format!("opening {}", source_file.display()))?;
            let sequences = monitor.phase("Reading the sequences", || {
                collect_sequences(BufReader::new(source), source_format.into())
            })?;
            let bytes: Vec<Vec<u8>> = sequences.into_iter().map(|(_, s)| s).collect();

            match output_file {
                Some(path) => {
                    let mut out = BufWriter::new(File::create(&path)?);
                    find_superstring_ukkonen(bytes, &mut out, monitor)?;
                    out.flush()?;
                }
                None => {
                    let stdout = std::io::stdout();
                    let mut out = BufWriter::new(stdout.lock());
                    find_superstring_ukkonen(bytes, &mut out, monitor)?;
                    out.flush()?;
                }
            }
            Ok(0)
        }

        Commands::IndexVisualization {
            index_file,
            memory_chart_file,
        } => {
            let spinner = ProgressBar::new_spinner();
            spinner.set_style(
                ProgressStyle::default_spinner()
                    .template("{spinner:.cyan} {msg}")
                    .expect("static template"),
            );
            spinner.set_message("Reading the index file...");
            spinner.enable_steady_tick(std::time::Duration::from_millis(80));

            let bytes = fs::read(&index_file)
                .with_context(|| format!("reading {}", index_file.display()))?;
            let tree = read_size_tree(&bytes)?;
            spinner.finish_with_message(format!("Read {} bytes", bytes.len()));

            let mut out = BufWriter::new(File::create(&memory_chart_file)?);
            write_size_chart(&tree, &mut out)?;
            out.flush()?;
            monitor.note_bytes("index file", bytes.len() as u64);
            Ok(0)
        }

        Commands::VerifySuperstring {
            index_file,
            source_file,
            source_format,
        } => {
            // The load is the barrier: nothing verifies before the index
            // is resident.
            let index = monitor.phase("Loading the index", || load_index(&index_file))?;
            let source = File::open(&source_file)
                .with_context(|| format!("opening {}", source_file.display()))?;
            let sequences = monitor.phase("Reading the sequences", || {
                collect_sequences(BufReader::new(source), source_format.into())
            })?;

            let outcome =
                monitor.phase("Verifying", || verify_superstring(&index, &sequences));
            for diagnostic in &outcome.missing {
                eprintln!("{}", diagnostic);
            }
            if outcome.succeeded() {
                eprintln!("{}", styled(GREEN, "All sequences were located."));
                Ok(0)
            } else {
                eprintln!(
                    "{} not all sequences were located.",
                    styled(YELLOW, "WARNING:")
                );
                Ok(2)
            }
        }
    }
}

fn single_byte(c: char) -> Result<u8, Error> {
    u8::try_from(c).map_err(|_| {
        Error::Mode(format!(
            "the sentinel must be a single byte, got {:?}",
            c
        ))
    })
}
