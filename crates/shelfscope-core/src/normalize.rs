/// Punctuation ignored when comparing series names: half/full-width bang,
/// question mark, colon and hyphen, plus the nakaguro.
const IGNORED_PUNCTUATION: &[char] = &['！', '!', '？', '?', '・', ':', '：', '-', '－'];

/// Canonical form of a series name, for equality checks only.
///
/// Never use the result for display or as a storage key.
pub fn normalize_series(series: &str) -> String {
    series
        .chars()
        .filter(|c| !c.is_whitespace() && !IGNORED_PUNCTUATION.contains(c))
        .collect::<String>()
        .to_lowercase()
}

/// Whether two series names refer to the same series after normalization.
pub fn same_series(a: &str, b: &str) -> bool {
    normalize_series(a) == normalize_series(b)
}
