//! Shelf ordering for series names.
//!
//! Approximates Japanese locale collation at the primary level: case,
//! full-width/half-width ASCII and hiragana/katakana differences are folded
//! before comparing. Exact ties fall back to plain code-point order.

use std::cmp::Ordering;

fn fold_char(ch: char) -> char {
    let folded = match ch {
        // Full-width ASCII variants → ASCII
        '\u{FF01}'..='\u{FF5E}' => char::from_u32(ch as u32 - 0xFEE0).unwrap_or(ch),
        '\u{3000}' => ' ',
        // Katakana → hiragana
        '\u{30A1}'..='\u{30F6}' => char::from_u32(ch as u32 - 0x60).unwrap_or(ch),
        _ => ch,
    };
    folded.to_lowercase().next().unwrap_or(folded)
}

fn sort_key(s: &str) -> Vec<char> {
    s.chars().map(fold_char).collect()
}

/// Compare two series names in shelf order.
pub fn shelf_order(a: &str, b: &str) -> Ordering {
    sort_key(a).cmp(&sort_key(b)).then_with(|| a.cmp(b))
}
