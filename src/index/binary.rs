// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Binary index file format.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │ magic "STCH" │ version │ flags │ sentinel │ sigma │ m    │
//! ├──────────────────────────────────────────────────────────┤
//! │ alphabet     u16 count + comp2char bytes                 │
//! │ text         u64 len + code bytes                        │
//! │ suffix_array packed vector                               │
//! │ str_lengths  packed vector                               │
//! │ lcp          packed vector (debug-variant builds only)   │
//! ├──────────────────────────────────────────────────────────┤
//! │ CRC32 of everything above (little-endian u32)            │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! Packed vectors serialise as `u64 len, u8 width, u64 word_count,
//! word_count * u64` with little-endian words. The CRC is validated
//! before any section is interpreted; a flipped bit anywhere fails the
//! load instead of corrupting a sweep.

use serde::Serialize;

use crate::alphabet::Alphabet;
use crate::intvec::IntVector;
use crate::types::{Error, Result};

use super::esa::Esa;
use super::Index;

pub const MAGIC: [u8; 4] = *b"STCH";
pub const VERSION: u8 = 1;
/// The index carries the structures only debug-assertion builds need.
pub const FLAG_DEBUG_INFO: u8 = 0b0000_0001;

/// Named byte-footprint tree for `index-visualization` and the memory
/// report.
#[derive(Debug, Clone, Serialize)]
pub struct SizeTree {
    pub name: String,
    pub bytes: u64,
    pub children: Vec<SizeTree>,
}

impl SizeTree {
    fn leaf(name: &str, bytes: usize) -> Self {
        SizeTree {
            name: name.to_string(),
            bytes: bytes as u64,
            children: Vec::new(),
        }
    }

    pub fn total(&self) -> u64 {
        self.bytes + self.children.iter().map(|c| c.total()).sum::<u64>()
    }
}

/// Serialise an index; returns the file bytes and their section tree.
pub fn encode_index(index: &Index) -> (Vec<u8>, SizeTree) {
    let mut buf = Vec::new();
    let mut children = Vec::new();

    buf.extend_from_slice(&MAGIC);
    buf.push(VERSION);
    buf.push(if index.contains_debug_info {
        FLAG_DEBUG_INFO
    } else {
        0
    });
    buf.push(index.sentinel);
    buf.extend_from_slice(&(index.alphabet.sigma() as u16).to_le_bytes());
    buf.extend_from_slice(&(index.string_lengths.len() as u64).to_le_bytes());
    children.push(SizeTree::leaf("header", buf.len()));

    let mark = buf.len();
    let table = index.alphabet.comp_table();
    buf.extend_from_slice(&(table.len() as u16).to_le_bytes());
    buf.extend_from_slice(table);
    children.push(SizeTree::leaf("alphabet", buf.len() - mark));

    let mark = buf.len();
    let text = index.esa.text();
    buf.extend_from_slice(&(text.len() as u64).to_le_bytes());
    buf.extend_from_slice(text);
    children.push(SizeTree::leaf("text", buf.len() - mark));

    let mark = buf.len();
    let n = text.len();
    let sa_packed = IntVector::from_values(
        index.esa.sa_slice().iter().map(|&v| v as u64),
        n as u64 - 1,
    );
    write_intvector(&mut buf, &sa_packed);
    children.push(SizeTree::leaf("suffix_array", buf.len() - mark));

    let mark = buf.len();
    write_intvector(&mut buf, &index.string_lengths);
    children.push(SizeTree::leaf("string_lengths", buf.len() - mark));

    if index.contains_debug_info {
        let mark = buf.len();
        let lcp_packed = IntVector::from_values(
            index.esa.lcp_slice().iter().map(|&v| v as u64),
            n as u64,
        );
        write_intvector(&mut buf, &lcp_packed);
        children.push(SizeTree::leaf("lcp", buf.len() - mark));
    }

    let crc = crc32fast::hash(&buf);
    buf.extend_from_slice(&crc.to_le_bytes());
    children.push(SizeTree::leaf("crc32", 4));

    let tree = SizeTree {
        name: "stitch::index".to_string(),
        bytes: 0,
        children,
    };
    (buf, tree)
}

/// Parse and validate an index file.
pub fn decode_index(bytes: &[u8]) -> Result<Index> {
    let mut r = Reader::new(bytes);
    let (sentinel, sigma, string_count, flags) = r.header()?;

    let crc_offset = bytes.len() - 4;
    let stored = u32::from_le_bytes(bytes[crc_offset..].try_into().unwrap());
    let computed = crc32fast::hash(&bytes[..crc_offset]);
    if stored != computed {
        return Err(Error::BadFormat(format!(
            "index CRC mismatch (stored {:08x}, computed {:08x})",
            stored, computed
        )));
    }

    let table_len = r.u16()? as usize;
    let table = r.bytes(table_len)?;
    if table.len() != sigma {
        return Err(Error::BadFormat("alphabet table length disagrees".into()));
    }
    let alphabet = Alphabet::from_comp_table(table);

    let text_len = r.u64()? as usize;
    let text = r.bytes(text_len)?.to_vec();

    let sa_packed = r.intvector()?;
    if sa_packed.len() != text_len {
        return Err(Error::BadFormat("suffix array length disagrees".into()));
    }
    let sa: Vec<u32> = sa_packed.iter().map(|v| v as u32).collect();

    let string_lengths = r.intvector()?;
    if string_lengths.len() != string_count {
        return Err(Error::BadFormat("string count disagrees".into()));
    }

    let contains_debug_info = flags & FLAG_DEBUG_INFO != 0;
    let lcp = if contains_debug_info {
        let packed = r.intvector()?;
        if packed.len() != text_len {
            return Err(Error::BadFormat("lcp length disagrees".into()));
        }
        Some(packed.iter().map(|v| v as u32).collect())
    } else {
        None
    };

    let esa = Esa::from_parts(text, sa, sigma, lcp);
    Ok(Index {
        esa,
        alphabet,
        string_lengths,
        sentinel,
        contains_debug_info,
    })
}

/// Section tree of a serialised index, without reconstructing it.
pub fn read_size_tree(bytes: &[u8]) -> Result<SizeTree> {
    let mut r = Reader::new(bytes);
    let (_, _, _, flags) = r.header()?;
    let mut children = vec![SizeTree::leaf("header", r.pos)];

    let mark = r.pos;
    let table_len = r.u16()? as usize;
    r.bytes(table_len)?;
    children.push(SizeTree::leaf("alphabet", r.pos - mark));

    let mark = r.pos;
    let text_len = r.u64()? as usize;
    r.bytes(text_len)?;
    children.push(SizeTree::leaf("text", r.pos - mark));

    let mark = r.pos;
    r.intvector()?;
    children.push(SizeTree::leaf("suffix_array", r.pos - mark));

    let mark = r.pos;
    r.intvector()?;
    children.push(SizeTree::leaf("string_lengths", r.pos - mark));

    if flags & FLAG_DEBUG_INFO != 0 {
        let mark = r.pos;
        r.intvector()?;
        children.push(SizeTree::leaf("lcp", r.pos - mark));
    }
    children.push(SizeTree::leaf("crc32", 4));

    Ok(SizeTree {
        name: "stitch::index".to_string(),
        bytes: 0,
        children,
    })
}

fn write_intvector(buf: &mut Vec<u8>, v: &IntVector) {
    buf.extend_from_slice(&(v.len() as u64).to_le_bytes());
    buf.push(v.width() as u8);
    let words = v.words();
    buf.extend_from_slice(&(words.len() as u64).to_le_bytes());
    for &w in words {
        buf.extend_from_slice(&w.to_le_bytes());
    }
}

struct Reader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Reader { bytes, pos: 0 }
    }

    fn header(&mut self) -> Result<(u8, usize, usize, u8)> {
        if self.bytes.len() < 20 {
            return Err(Error::BadFormat("index file too small".into()));
        }
        let magic = self.bytes(4)?;
        if magic != MAGIC {
            return Err(Error::BadFormat("not a stitch index (bad magic)".into()));
        }
        let version = self.u8()?;
        if version != VERSION {
            return Err(Error::BadFormat(format!(
                "unsupported index version {}",
                version
            )));
        }
        let flags = self.u8()?;
        let sentinel = self.u8()?;
        let sigma = self.u16()? as usize;
        let string_count = self.u64()? as usize;
        Ok((sentinel, sigma, string_count, flags))
    }

    fn bytes(&mut self, count: usize) -> Result<&'a [u8]> {
        // The trailing 4 bytes are the CRC; sections must not reach them.
        if self.pos + count + 4 > self.bytes.len() {
            return Err(Error::BadFormat("truncated index file".into()));
        }
        let slice = &self.bytes[self.pos..self.pos + count];
        self.pos += count;
        Ok(slice)
    }

    fn u8(&mut self) -> Result<u8> {
        Ok(self.bytes(1)?[0])
    }

    fn u16(&mut self) -> Result<u16> {
        Ok(u16::from_le_bytes(self.bytes(2)?.try_into().unwrap()))
    }

    fn u64(&mut self) -> Result<u64> {
        Ok(u64::from_le_bytes(self.bytes(8)?.try_into().unwrap()))
    }

    fn intvector(&mut self) -> Result<IntVector> {
        let len = self.u64()? as usize;
        let width = self.u8()? as usize;
        if width == 0 || width > 64 {
            return Err(Error::BadFormat("bad packed-vector width".into()));
        }
        let word_count = self.u64()? as usize;
        if word_count * 64 < len * width {
            return Err(Error::BadFormat("packed vector shorter than its length".into()));
        }
        let raw = self.bytes(word_count * 8)?;
        let words: Vec<u64> = raw
            .chunks_exact(8)
            .map(|c| u64::from_le_bytes(c.try_into().unwrap()))
            .collect();
        Ok(IntVector::from_raw_parts(words, len, width))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::build_index;

    fn sample_index() -> Index {
        let sequences: Vec<Vec<u8>> = vec![b"ACAG".to_vec(), b"CAGT".to_vec(), b"AGTC".to_vec()];
        build_index(sequences, b'#').unwrap().0
    }

    #[test]
    fn round_trip_preserves_everything() {
        let index = sample_index();
        let (bytes, tree) = encode_index(&index);
        assert_eq!(tree.total() as usize, bytes.len());

        let loaded = decode_index(&bytes).unwrap();
        assert_eq!(loaded.sentinel, index.sentinel);
        assert_eq!(loaded.esa.text(), index.esa.text());
        assert_eq!(loaded.esa.sa_slice(), index.esa.sa_slice());
        assert_eq!(loaded.esa.lcp_slice(), index.esa.lcp_slice());
        assert_eq!(
            loaded.string_lengths.iter().collect::<Vec<_>>(),
            index.string_lengths.iter().collect::<Vec<_>>()
        );
        assert_eq!(loaded.contains_debug_info, index.contains_debug_info);
    }

    #[test]
    fn any_corrupted_byte_fails_the_crc() {
        let index = sample_index();
        let (bytes, _) = encode_index(&index);
        for victim in [4usize, 10, bytes.len() / 2, bytes.len() - 5] {
            let mut evil = bytes.clone();
            evil[victim] ^= 0x40;
            assert!(
                decode_index(&evil).is_err(),
                "flipping byte {} went unnoticed",
                victim
            );
        }
    }

    #[test]
    fn size_tree_spans_the_file() {
        let index = sample_index();
        let (bytes, _) = encode_index(&index);
        let tree = read_size_tree(&bytes).unwrap();
        assert_eq!(tree.total() as usize, bytes.len());
        let names: Vec<&str> = tree.children.iter().map(|c| c.name.as_str()).collect();
        assert!(names.contains(&"suffix_array"));
        assert!(names.contains(&"text"));
    }

    #[test]
    fn rejects_foreign_files() {
        assert!(decode_index(b"not an index at all").is_err());
        let mut junk = MAGIC.to_vec();
        junk.extend_from_slice(&[9; 40]);
        assert!(decode_index(&junk).is_err());
    }
}
