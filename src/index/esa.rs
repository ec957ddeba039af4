// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Enhanced-suffix-array backend for the suffix-tree capability interface.
//!
//! The engines are written against [`SuffixIndex`], the capability set of
//! a compressed suffix tree: BWT access, LF and Ψ steps, backward search,
//! wavelet-tree style interval symbol listing, Weiner and suffix links,
//! and node arithmetic. [`Esa`] implements it with plain arrays - suffix
//! array, its inverse, Kasai LCP, the BWT with sampled occurrence counts -
//! plus a min sparse table over LCP so that a suffix-tree node (an LCP
//! interval) can be recovered from any of its rows in O(log n).
//!
//! Nodes are value handles `{lb, rb, depth}`; nothing borrows the index.

use crate::types::Node;

use super::sais::suffix_array;

/// Occurrence-count sampling stride for the BWT rank structure.
const OCC_SAMPLE: usize = 128;

/// Reusable output buffer for [`SuffixIndex::interval_symbols`].
///
/// Allocated once per engine (`sigma` slots) and reused across calls so
/// the walk's hot loop never allocates.
#[derive(Debug, Clone)]
pub struct IntervalSymbols {
    pub symbols: Vec<u8>,
    pub rank_lo: Vec<u32>,
    pub rank_hi: Vec<u32>,
    pub count: usize,
}

impl IntervalSymbols {
    pub fn new(sigma: usize) -> Self {
        IntervalSymbols {
            symbols: Vec::with_capacity(sigma),
            rank_lo: Vec::with_capacity(sigma),
            rank_hi: Vec::with_capacity(sigma),
            count: 0,
        }
    }

    fn clear(&mut self) {
        self.symbols.clear();
        self.rank_lo.clear();
        self.rank_hi.clear();
        self.count = 0;
    }
}

/// Capability set of a compressed suffix tree over the sentinel text.
///
/// Every operation a sweep needs, nothing it does not; the engines are
/// deliberately decoupled from the backing representation.
pub trait SuffixIndex {
    /// Text length, terminator included.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Alphabet size of the code text.
    fn sigma(&self) -> usize;

    fn root(&self) -> Node;

    /// Character preceding the suffix of lex rank `i`.
    fn bwt(&self, i: usize) -> u8;

    /// Rank of the suffix one position to the left.
    fn lf(&self, i: usize) -> usize;

    /// Rank of the suffix one position to the right.
    fn psi(&self, i: usize) -> usize;

    /// Text position of the suffix of lex rank `i`.
    fn suffix_at(&self, i: usize) -> usize;

    /// Leaf node for the suffix of lex rank `rank`.
    fn select_leaf(&self, rank: usize) -> Node;

    /// Lex range of `c` prepended to the patterns of `lb..=rb`.
    fn backward_search(&self, lb: usize, rb: usize, c: u8) -> Option<(usize, usize)>;

    /// Distinct BWT symbols in `[lo, hi)` with their rank pairs, in
    /// ascending symbol order.
    fn interval_symbols(&self, lo: usize, hi: usize, buf: &mut IntervalSymbols);

    /// Weiner link: the locus of `c · label(node)`, if the extension
    /// occurs at all.
    fn wl(&self, node: Node, c: u8) -> Option<Node>;

    /// Suffix link: the locus of `label(node)` minus its first character.
    fn sl(&self, node: Node) -> Node;

    fn parent(&self, node: Node) -> Node;

    fn depth(&self, node: Node) -> usize {
        node.depth
    }

    fn lb(&self, node: Node) -> usize {
        node.lb
    }

    fn rb(&self, node: Node) -> usize {
        node.rb
    }
}

/// Enhanced suffix array over a compacted code text.
pub struct Esa {
    text: Vec<u8>,
    sa: Vec<u32>,
    isa: Vec<u32>,
    lcp: Vec<u32>,
    bwt: Vec<u8>,
    sigma: usize,
    /// `less[c]` = number of text symbols strictly below `c`.
    less: Vec<u32>,
    /// Sampled per-symbol occurrence counts over the BWT.
    occ_samples: Vec<u32>,
    rmq: SparseRmq,
}

impl Esa {
    /// Index a code text whose last element is the unique terminator 0.
    pub fn from_text(text: Vec<u8>, sigma: usize) -> Self {
        let sa = suffix_array(&text);
        Self::from_parts(text, sa, sigma, None)
    }

    /// Reassemble from serialised parts; the LCP array is recomputed
    /// unless the debugging variant stored it.
    pub fn from_parts(text: Vec<u8>, sa: Vec<u32>, sigma: usize, lcp: Option<Vec<u32>>) -> Self {
        let n = text.len();
        assert_eq!(sa.len(), n);
        assert!(sigma >= 1 && sigma <= 256);

        let mut isa = vec![0u32; n];
        for (rank, &pos) in sa.iter().enumerate() {
            isa[pos as usize] = rank as u32;
        }

        let lcp = lcp.unwrap_or_else(|| kasai(&text, &sa, &isa));
        debug_assert_eq!(lcp.len(), n);

        let mut bwt = vec![0u8; n];
        for (rank, &pos) in sa.iter().enumerate() {
            let p = pos as usize;
            bwt[rank] = if p == 0 { text[n - 1] } else { text[p - 1] };
        }

        let mut less = vec![0u32; sigma + 1];
        for &c in &text {
            less[c as usize + 1] += 1;
        }
        for c in 0..sigma {
            less[c + 1] += less[c];
        }

        let sample_rows = n / OCC_SAMPLE + 1;
        let mut occ_samples = vec![0u32; sample_rows * sigma];
        let mut running = vec![0u32; sigma];
        for i in 0..n {
            if i % OCC_SAMPLE == 0 {
                occ_samples[(i / OCC_SAMPLE) * sigma..][..sigma].copy_from_slice(&running);
            }
            running[bwt[i] as usize] += 1;
        }
        if n % OCC_SAMPLE == 0 {
            // rank(c, n) lands on the one-past-the-end checkpoint.
            occ_samples[(n / OCC_SAMPLE) * sigma..][..sigma].copy_from_slice(&running);
        }

        let rmq = SparseRmq::new(&lcp);

        Esa {
            text,
            sa,
            isa,
            lcp,
            bwt,
            sigma,
            less,
            occ_samples,
            rmq,
        }
    }

    #[inline]
    pub fn text(&self) -> &[u8] {
        &self.text
    }

    #[inline]
    pub fn sa_slice(&self) -> &[u32] {
        &self.sa
    }

    #[inline]
    pub fn lcp_slice(&self) -> &[u32] {
        &self.lcp
    }

    /// Occurrences of `c` in `bwt[0..i]`.
    pub fn rank(&self, c: u8, i: usize) -> usize {
        debug_assert!(i <= self.bwt.len());
        let block = i / OCC_SAMPLE;
        let mut count = self.occ_samples[block * self.sigma + c as usize] as usize;
        for &b in &self.bwt[block * OCC_SAMPLE..i] {
            count += (b == c) as usize;
        }
        count
    }

    /// Maximal LCP interval of string depth `>= depth` containing `row`.
    fn expand(&self, row: usize, depth: usize) -> Node {
        let n = self.sa.len();
        if depth == 0 {
            return self.root();
        }

        // Largest rb: min(lcp[row+1 ..= rb]) >= depth is monotone in rb.
        let mut lo = row;
        let mut hi = n - 1;
        while lo < hi {
            let mid = lo + (hi - lo + 1) / 2;
            if self.rmq.min(row + 1, mid) >= depth as u32 {
                lo = mid;
            } else {
                hi = mid - 1;
            }
        }
        let rb = lo;

        // Smallest lb: min(lcp[lb+1 ..= row]) >= depth is monotone in lb.
        let mut lo2 = 0;
        let mut hi2 = row;
        while lo2 < hi2 {
            let mid = lo2 + (hi2 - lo2) / 2;
            if self.rmq.min(mid + 1, row) >= depth as u32 {
                hi2 = mid;
            } else {
                lo2 = mid + 1;
            }
        }
        let lb = lo2;

        Node { lb, rb, depth }
    }

    /// Rough heap footprint of each structure, for the size report.
    pub fn component_sizes(&self) -> Vec<(&'static str, usize)> {
        vec![
            ("text", self.text.len()),
            ("suffix_array", self.sa.len() * 4),
            ("inverse_suffix_array", self.isa.len() * 4),
            ("lcp", self.lcp.len() * 4),
            ("bwt", self.bwt.len()),
            ("occ_samples", self.occ_samples.len() * 4),
            ("rmq", self.rmq.size_in_bytes()),
        ]
    }
}

impl SuffixIndex for Esa {
    fn len(&self) -> usize {
        self.text.len()
    }

    fn sigma(&self) -> usize {
        self.sigma
    }

    fn root(&self) -> Node {
        Node {
            lb: 0,
            rb: self.text.len() - 1,
            depth: 0,
        }
    }

    fn bwt(&self, i: usize) -> u8 {
        self.bwt[i]
    }

    fn lf(&self, i: usize) -> usize {
        let c = self.bwt[i];
        self.less[c as usize] as usize + self.rank(c, i)
    }

    fn psi(&self, i: usize) -> usize {
        let n = self.text.len();
        let pos = self.sa[i] as usize;
        self.isa[(pos + 1) % n] as usize
    }

    fn suffix_at(&self, i: usize) -> usize {
        self.sa[i] as usize
    }

    fn select_leaf(&self, rank: usize) -> Node {
        Node {
            lb: rank,
            rb: rank,
            depth: self.text.len() - self.sa[rank] as usize,
        }
    }

    fn backward_search(&self, lb: usize, rb: usize, c: u8) -> Option<(usize, usize)> {
        debug_assert!(lb <= rb && rb < self.text.len());
        let base = self.less[c as usize] as usize;
        let l = base + self.rank(c, lb);
        let r = base + self.rank(c, rb + 1);
        (l < r).then_some((l, r - 1))
    }

    fn interval_symbols(&self, lo: usize, hi: usize, buf: &mut IntervalSymbols) {
        buf.clear();
        for c in 0..self.sigma as u8 {
            let rl = self.rank(c, lo);
            let rh = self.rank(c, hi);
            if rh > rl {
                buf.symbols.push(c);
                buf.rank_lo.push(rl as u32);
                buf.rank_hi.push(rh as u32);
            }
        }
        buf.count = buf.symbols.len();
    }

    fn wl(&self, node: Node, c: u8) -> Option<Node> {
        self.backward_search(node.lb, node.rb, c)
            .map(|(lb, rb)| Node {
                lb,
                rb,
                depth: node.depth + 1,
            })
    }

    fn sl(&self, node: Node) -> Node {
        if node.depth <= 1 {
            return self.root();
        }
        let pos = self.sa[node.lb] as usize;
        debug_assert!(pos + 1 < self.text.len());
        let row = self.isa[pos + 1] as usize;
        self.expand(row, node.depth - 1)
    }

    fn parent(&self, node: Node) -> Node {
        let n = self.text.len();
        if node.lb == 0 && node.rb == n - 1 {
            return node; // root is its own parent
        }
        let left = if node.lb == 0 { 0 } else { self.lcp[node.lb] };
        let right = if node.rb + 1 < n { self.lcp[node.rb + 1] } else { 0 };
        let depth = left.max(right) as usize;
        self.expand(node.lb, depth)
    }
}

fn kasai(text: &[u8], sa: &[u32], isa: &[u32]) -> Vec<u32> {
    let n = text.len();
    let mut lcp = vec![0u32; n];
    let mut h = 0usize;
    for i in 0..n {
        let r = isa[i] as usize;
        if r > 0 {
            let j = sa[r - 1] as usize;
            while i + h < n && j + h < n && text[i + h] == text[j + h] {
                h += 1;
            }
            lcp[r] = h as u32;
            h = h.saturating_sub(1);
        } else {
            h = 0;
        }
    }
    lcp
}

/// Min sparse table for O(1)-after-O(n log n) range minimum queries.
struct SparseRmq {
    levels: Vec<Vec<u32>>,
}

impl SparseRmq {
    fn new(values: &[u32]) -> Self {
        let n = values.len();
        let mut levels = vec![values.to_vec()];
        let mut span = 1;
        while span * 2 <= n {
            let prev = levels.last().unwrap();
            let next: Vec<u32> = (0..=n - span * 2)
                .map(|i| prev[i].min(prev[i + span]))
                .collect();
            levels.push(next);
            span *= 2;
        }
        SparseRmq { levels }
    }

    /// Minimum of `values[a..=b]`; `u32::MAX` on an empty range.
    fn min(&self, a: usize, b: usize) -> u32 {
        if a > b {
            return u32::MAX;
        }
        let len = b - a + 1;
        let k = usize::BITS as usize - 1 - len.leading_zeros() as usize;
        let level = &self.levels[k];
        level[a].min(level[b + 1 - (1 << k)])
    }

    fn size_in_bytes(&self) -> usize {
        self.levels.iter().map(|l| l.len() * 4).sum()
    }
}
