use crate::vectorize::TermVector;

/// Cosine similarity of two sparse vectors.
///
/// The dot product runs over shared terms only; each norm covers the full
/// vector. A zero norm on either side yields 0.
pub fn cosine(v1: &TermVector, v2: &TermVector) -> f64 {
    let (small, large) = if v1.len() <= v2.len() { (v1, v2) } else { (v2, v1) };
    let dot: f64 = small
        .iter()
        .filter_map(|(term, w)| large.get(term).map(|w2| w * w2))
        .sum();
    let n1 = v1.norm();
    let n2 = v2.norm();
    if n1 == 0.0 || n2 == 0.0 {
        return 0.0;
    }
    (dot / (n1 * n2)).clamp(0.0, 1.0)
}
