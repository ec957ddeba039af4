//! SA-IS: Suffix Array by Induced Sorting
//!
//! Linear-time O(n) suffix array construction.
//!
//! # Algorithm Overview
//!
//! ```text
//! Input: code text "banana" + in-band terminator 0
//!
//! Step 1: classify suffixes
//! ┌───┬───┬───┬───┬───┬───┬───┐
//! │ b │ a │ n │ a │ n │ a │ 0 │   (terminator, unique minimum)
//! ├───┼───┼───┼───┼───┼───┼───┤
//! │ L │ S │ L │ S │ L │ L │ S │   (S = smaller than next, L = larger)
//! └───┴───┴───┴───┴───┴───┴───┘
//!
//! Step 2: find LMS (leftmost S-type) positions: S preceded by L
//! Step 3: place LMS at bucket tails, induce L left-to-right,
//!         induce S right-to-left
//! Step 4: name LMS substrings; recurse on the reduced text when
//!         names collide
//! Step 5: induce the final suffix array from the sorted LMS order
//! ```
//!
//! Unlike textbook formulations the terminator is part of the text here:
//! the sentinel-separated concatenation already ends with code 0, which
//! occurs exactly once and sorts below everything. Callers must uphold
//! that.
//!
//! # References
//!
//! - Nong, Zhang, Chan (2009): "Linear Suffix Array Construction by
//!   Almost Pure Induced-Sorting" - <https://doi.org/10.1109/DCC.2009.42>

/// Suffix type classification.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum SuffixType {
    /// Suffix is lexicographically smaller than the one after it.
    S,
    /// Suffix is lexicographically larger than the one after it.
    L,
}

const EMPTY: u32 = u32::MAX;

/// Build the suffix array of a code text whose final element is its
/// unique minimum.
///
/// # Panics
///
/// Panics when the text is empty, longer than `u32` range, or the last
/// element is not the unique minimum.
pub fn suffix_array(text: &[u8]) -> Vec<u32> {
    assert!(!text.is_empty(), "cannot index an empty text");
    assert!(
        (text.len() as u64) < u32::MAX as u64,
        "text too long for 32-bit suffix positions"
    );
    let last = *text.last().unwrap();
    assert!(
        text[..text.len() - 1].iter().all(|&c| c > last),
        "terminator must be the unique minimum"
    );

    let codes: Vec<u32> = text.iter().map(|&c| c as u32).collect();
    let mut sa = vec![EMPTY; codes.len()];
    sais(&codes, 256, &mut sa);
    sa
}

fn sais(text: &[u32], sigma: usize, sa: &mut [u32]) {
    let n = text.len();
    match n {
        0 => return,
        1 => {
            sa[0] = 0;
            return;
        }
        2 => {
            // The terminator sorts first.
            sa[0] = 1;
            sa[1] = 0;
            return;
        }
        _ => {}
    }

    let types = classify(text);
    let lms: Vec<u32> = (1..n)
        .filter(|&i| is_lms(&types, i))
        .map(|i| i as u32)
        .collect();
    let buckets = bucket_sizes(text, sigma);

    // First induction: approximate LMS order.
    sa.fill(EMPTY);
    place_lms(text, &buckets, &lms, sa);
    induce(text, &types, &buckets, sa);

    // Name the LMS substrings in their induced order.
    let mut names = vec![EMPTY; n];
    let mut name = 0u32;
    let mut prev: Option<usize> = None;
    for &p in sa.iter() {
        let p = p as usize;
        if !is_lms(&types, p) {
            continue;
        }
        if let Some(q) = prev {
            if !lms_substrings_equal(text, &types, q, p) {
                name += 1;
            }
        }
        names[p] = name;
        prev = Some(p);
    }
    let name_count = name as usize + 1;

    let sorted_lms: Vec<u32> = if name_count < lms.len() {
        // Collisions: recurse on the reduced problem. The reduced text
        // ends with the terminator's LMS name, which is 0 and unique.
        let reduced: Vec<u32> = lms.iter().map(|&p| names[p as usize]).collect();
        let mut reduced_sa = vec![EMPTY; reduced.len()];
        sais(&reduced, name_count, &mut reduced_sa);
        reduced_sa.iter().map(|&r| lms[r as usize]).collect()
    } else {
        // All names distinct: the induced order is already correct.
        let mut sorted = vec![0u32; lms.len()];
        for &p in &lms {
            sorted[names[p as usize] as usize] = p;
        }
        sorted
    };

    // Final induction from the exact LMS order.
    sa.fill(EMPTY);
    place_lms(text, &buckets, &sorted_lms, sa);
    induce(text, &types, &buckets, sa);
}

fn classify(text: &[u32]) -> Vec<SuffixType> {
    let n = text.len();
    let mut types = vec![SuffixType::S; n];
    for i in (0..n - 1).rev() {
        types[i] = match text[i].cmp(&text[i + 1]) {
            std::cmp::Ordering::Less => SuffixType::S,
            std::cmp::Ordering::Greater => SuffixType::L,
            std::cmp::Ordering::Equal => types[i + 1],
        };
    }
    types
}

#[inline]
fn is_lms(types: &[SuffixType], i: usize) -> bool {
    i > 0 && types[i] == SuffixType::S && types[i - 1] == SuffixType::L
}

fn bucket_sizes(text: &[u32], sigma: usize) -> Vec<u32> {
    let mut sizes = vec![0u32; sigma];
    for &c in text {
        sizes[c as usize] += 1;
    }
    sizes
}

fn bucket_heads(sizes: &[u32]) -> Vec<u32> {
    let mut heads = vec![0u32; sizes.len()];
    let mut sum = 0u32;
    for (c, &s) in sizes.iter().enumerate() {
        heads[c] = sum;
        sum += s;
    }
    heads
}

fn bucket_tails(sizes: &[u32]) -> Vec<u32> {
    let mut tails = vec![0u32; sizes.len()];
    let mut sum = 0u32;
    for (c, &s) in sizes.iter().enumerate() {
        sum += s;
        tails[c] = sum;
    }
    tails
}

fn place_lms(text: &[u32], buckets: &[u32], lms: &[u32], sa: &mut [u32]) {
    let mut tails = bucket_tails(buckets);
    for &p in lms.iter().rev() {
        let c = text[p as usize] as usize;
        tails[c] -= 1;
        sa[tails[c] as usize] = p;
    }
}

fn induce(text: &[u32], types: &[SuffixType], buckets: &[u32], sa: &mut [u32]) {
    let n = text.len();

    let mut heads = bucket_heads(buckets);
    for i in 0..n {
        let p = sa[i];
        if p == EMPTY || p == 0 {
            continue;
        }
        let j = p as usize - 1;
        if types[j] == SuffixType::L {
            let c = text[j] as usize;
            sa[heads[c] as usize] = j as u32;
            heads[c] += 1;
        }
    }

    let mut tails = bucket_tails(buckets);
    for i in (0..n).rev() {
        let p = sa[i];
        if p == EMPTY || p == 0 {
            continue;
        }
        let j = p as usize - 1;
        if types[j] == SuffixType::S {
            let c = text[j] as usize;
            tails[c] -= 1;
            sa[tails[c] as usize] = j as u32;
        }
    }
}

fn lms_substrings_equal(text: &[u32], types: &[SuffixType], a: usize, b: usize) -> bool {
    let n = text.len();
    if a == n - 1 || b == n - 1 {
        return a == b;
    }
    let mut i = 0;
    loop {
        if text[a + i] != text[b + i] || types[a + i] != types[b + i] {
            return false;
        }
        if i > 0 {
            let a_end = is_lms(types, a + i);
            let b_end = is_lms(types, b + i);
            if a_end || b_end {
                return a_end && b_end;
            }
        }
        i += 1;
    }
}
