// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Push-style sequence readers.
//!
//! Both readers drive a consumer callback with `(token, buffer)` events,
//! where the buffer is an owned `Vec<u8>` drawn from a shared
//! [`BufferPool`]. The consumer gives the buffer back with
//! [`BufferPool::give`] once it is done - immediately for sequential
//! consumers, from the worker task for parallel ones - so at most
//! `pool size` buffers are ever alive regardless of input size.
//!
//! FASTA: `;` lines are comments, `>` starts a named record, sequence
//! data wraps over any number of lines. Text: one sequence per line,
//! empty lines skipped, the token is the 1-based line number.

use std::fmt;
use std::io::BufRead;

use parking_lot::{Condvar, Mutex};

use crate::types::{Error, Result, SourceFormat};

/// Identifies a sequence back to its origin for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SequenceToken {
    /// FASTA record identifier.
    Record(String),
    /// 1-based line number.
    Line(u32),
}

impl fmt::Display for SequenceToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SequenceToken::Record(id) => write!(f, "with identifier '{}'", id),
            SequenceToken::Line(no) => write!(f, "on line {}", no),
        }
    }
}

/// Fixed-size pool of reusable byte buffers.
///
/// [`BufferPool::take`] blocks while the pool is empty; that is the only
/// suspension point in the ingest path.
pub struct BufferPool {
    buffers: Mutex<Vec<Vec<u8>>>,
    available: Condvar,
}

impl BufferPool {
    pub fn new(count: usize) -> Self {
        assert!(count > 0, "a pool without buffers would deadlock");
        BufferPool {
            buffers: Mutex::new((0..count).map(|_| Vec::new()).collect()),
            available: Condvar::new(),
        }
    }

    pub fn take(&self) -> Vec<u8> {
        let mut buffers = self.buffers.lock();
        loop {
            if let Some(mut buf) = buffers.pop() {
                buf.clear();
                return buf;
            }
            self.available.wait(&mut buffers);
        }
    }

    pub fn give(&self, buf: Vec<u8>) {
        self.buffers.lock().push(buf);
        self.available.notify_one();
    }
}

/// Read sequences, pushing each to the consumer with a pool buffer.
pub fn read_sequences<R, F>(
    reader: R,
    format: SourceFormat,
    pool: &BufferPool,
    handle: F,
) -> Result<()>
where
    R: BufRead,
    F: FnMut(SequenceToken, Vec<u8>) -> Result<()>,
{
    match format {
        SourceFormat::Fasta => read_fasta(reader, pool, handle),
        SourceFormat::Text => read_lines(reader, pool, handle),
    }
}

fn read_fasta<R, F>(mut reader: R, pool: &BufferPool, mut handle: F) -> Result<()>
where
    R: BufRead,
    F: FnMut(SequenceToken, Vec<u8>) -> Result<()>,
{
    let mut line = String::new();
    let mut current: Option<(String, Vec<u8>)> = None;

    loop {
        line.clear();
        let read = reader.read_line(&mut line)?;
        if read == 0 {
            break;
        }
        let trimmed = line.trim_end_matches(['\n', '\r']);

        if trimmed.starts_with(';') {
            continue;
        }
        if let Some(identifier) = trimmed.strip_prefix('>') {
            if let Some((id, buf)) = current.take() {
                emit(&mut handle, SequenceToken::Record(id), buf, pool)?;
            }
            current = Some((identifier.trim().to_string(), pool.take()));
            continue;
        }
        if trimmed.is_empty() {
            continue;
        }
        match current.as_mut() {
            Some((_, buf)) => buf.extend_from_slice(trimmed.as_bytes()),
            None => {
                return Err(Error::BadFormat(
                    "FASTA sequence data before the first '>' header".to_string(),
                ))
            }
        }
    }

    if let Some((id, buf)) = current.take() {
        emit(&mut handle, SequenceToken::Record(id), buf, pool)?;
    }
    Ok(())
}

fn read_lines<R, F>(mut reader: R, pool: &BufferPool, mut handle: F) -> Result<()>
where
    R: BufRead,
    F: FnMut(SequenceToken, Vec<u8>) -> Result<()>,
{
    let mut line = String::new();
    let mut line_no = 0u32;
    loop {
        line.clear();
        let read = reader.read_line(&mut line)?;
        if read == 0 {
            return Ok(());
        }
        line_no += 1;
        let trimmed = line.trim_end_matches(['\n', '\r']);
        if trimmed.is_empty() {
            continue;
        }
        let mut buf = pool.take();
        buf.extend_from_slice(trimmed.as_bytes());
        handle(SequenceToken::Line(line_no), buf)?;
    }
}

fn emit<F>(
    handle: &mut F,
    token: SequenceToken,
    buf: Vec<u8>,
    pool: &BufferPool,
) -> Result<()>
where
    F: FnMut(SequenceToken, Vec<u8>) -> Result<()>,
{
    if buf.is_empty() {
        // Headers without sequence data contribute nothing.
        pool.give(buf);
        return Ok(());
    }
    handle(token, buf)
}

/// Convenience for the drivers: collect all sequences into memory.
pub fn collect_sequences<R: BufRead>(
    reader: R,
    format: SourceFormat,
) -> Result<Vec<(SequenceToken, Vec<u8>)>> {
    let pool = BufferPool::new(1);
    let mut out = Vec::new();
    read_sequences(reader, format, &pool, |token, buf| {
        out.push((token, buf.clone()));
        pool.give(buf);
        Ok(())
    })?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn fasta_records_with_comments_and_wrapping() {
        let input = b"; a comment\n>read1 description\nACGT\nACGT\n;mid comment\n>read2\nTTTT\n";
        let seqs = collect_sequences(Cursor::new(&input[..]), SourceFormat::Fasta).unwrap();
        assert_eq!(seqs.len(), 2);
        assert_eq!(
            seqs[0].0,
            SequenceToken::Record("read1 description".to_string())
        );
        assert_eq!(seqs[0].1, b"ACGTACGT");
        assert_eq!(seqs[1].1, b"TTTT");
    }

    #[test]
    fn fasta_data_before_header_is_an_error() {
        let err =
            collect_sequences(Cursor::new(&b"ACGT\n"[..]), SourceFormat::Fasta).unwrap_err();
        assert!(matches!(err, Error::BadFormat(_)));
    }

    #[test]
    fn fasta_empty_records_are_dropped() {
        let input = b">empty\n>full\nAC\n";
        let seqs = collect_sequences(Cursor::new(&input[..]), SourceFormat::Fasta).unwrap();
        assert_eq!(seqs.len(), 1);
        assert_eq!(seqs[0].1, b"AC");
    }

    #[test]
    fn text_lines_skip_blanks_and_keep_numbers() {
        let input = b"ACGT\n\nTT\r\n";
        let seqs = collect_sequences(Cursor::new(&input[..]), SourceFormat::Text).unwrap();
        assert_eq!(seqs.len(), 2);
        assert_eq!(seqs[0].0, SequenceToken::Line(1));
        assert_eq!(seqs[1].0, SequenceToken::Line(3));
        assert_eq!(seqs[1].1, b"TT");
    }

    #[test]
    fn pool_recycles_buffers() {
        let pool = BufferPool::new(2);
        let a = pool.take();
        let b = pool.take();
        pool.give(a);
        pool.give(b);
        let c = pool.take();
        assert!(c.is_empty());
        pool.give(c);
    }
}
