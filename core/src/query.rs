use lazy_static::lazy_static;
use regex::Regex;

/// Result count used when the query carries no `top N` directive.
pub const DEFAULT_K: usize = 5;

lazy_static! {
    static ref TOP_N: Regex = Regex::new(r"(?i)\btop\s+(\d+)\b").expect("valid regex");
}

/// Split a raw query into its search text and requested result count.
///
/// `k` is not bounded here; the recommender clamps it to the index size.
pub fn parse_query(raw: &str) -> (String, usize) {
    parse_query_with_default(raw, DEFAULT_K)
}

/// Like [`parse_query`], with a caller-chosen fallback for `k`.
///
/// Every `top N` occurrence is removed from the text; the first one sets `k`.
/// Counts too large for `usize` saturate.
pub fn parse_query_with_default(raw: &str, default_k: usize) -> (String, usize) {
    let k = TOP_N
        .captures(raw)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().parse::<usize>().unwrap_or(usize::MAX))
        .unwrap_or(default_k);
    let clean = TOP_N.replace_all(raw, " ");
    (clean.trim().to_string(), k)
}
