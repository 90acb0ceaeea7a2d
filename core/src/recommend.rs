use crate::error::{Error, Result};
use crate::index::Index;
use crate::query::parse_query_with_default;
use crate::similarity::cosine;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Decimal places kept in reported scores.
pub const SCORE_DECIMALS: i32 = 4;

/// Shared reference to the currently served index.
///
/// Readers take a cheap `Arc` clone of the current snapshot and score against
/// it without holding the lock; [`IndexHandle::replace`] swaps in a whole new
/// snapshot so in-flight queries keep the one they started with.
#[derive(Clone, Default)]
pub struct IndexHandle {
    current: Arc<RwLock<Option<Arc<Index>>>>,
}

impl IndexHandle {
    /// A handle with no index loaded yet.
    pub fn empty() -> Self { Self::default() }

    pub fn with_index(index: Index) -> Self {
        let handle = Self::empty();
        handle.replace(index);
        handle
    }

    /// Swap in a new snapshot, returning the previous one.
    pub fn replace(&self, index: Index) -> Option<Arc<Index>> {
        let next = Arc::new(index);
        self.current.write().replace(next)
    }

    pub fn snapshot(&self) -> Result<Arc<Index>> {
        self.current.read().clone().ok_or(Error::IndexUnavailable)
    }

    pub fn is_loaded(&self) -> bool { self.current.read().is_some() }
}

/// One ranked faculty match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredResult {
    /// Build position of the record in the index.
    pub index: usize,
    pub faculty_id: String,
    pub name: String,
    pub specialization: String,
    pub research: String,
    pub mail: String,
    pub score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendations {
    /// Query text after the `top N` directive was removed.
    pub query: String,
    /// Result count after clamping to the index size.
    pub top_k: usize,
    /// Documents with a non-zero score.
    pub total_hits: usize,
    pub results: Vec<ScoredResult>,
}

pub struct Recommender {
    handle: IndexHandle,
}

impl Recommender {
    pub fn new(handle: IndexHandle) -> Self { Self { handle } }

    pub fn handle(&self) -> &IndexHandle { &self.handle }

    /// Rank the loaded index against a raw query.
    ///
    /// A `top N` directive in the query wins over `default_k`.
    pub fn get_recommendations(&self, raw_query: &str, default_k: usize) -> Result<Recommendations> {
        let index = self.handle.snapshot()?;
        recommend(&index, raw_query, default_k)
    }
}

/// Score every document of `index` against `raw_query` and keep the best `k`.
pub fn recommend(index: &Index, raw_query: &str, default_k: usize) -> Result<Recommendations> {
    let (clean, k) = parse_query_with_default(raw_query, default_k);
    if clean.is_empty() {
        return Err(Error::EmptyQuery);
    }

    let query_vec = index.vectorize(&clean);
    let k = k.clamp(1, index.num_docs().max(1));

    let mut scored: Vec<(usize, f64)> = index
        .vectors()
        .iter()
        .enumerate()
        .map(|(i, v)| (i, cosine(&query_vec, v)))
        .filter(|(_, s)| *s > 0.0)
        .collect();
    // stable sort keeps ascending index order among equal scores
    scored.sort_by(|a, b| b.1.total_cmp(&a.1));
    let total_hits = scored.len();

    tracing::debug!(query = %clean, query_terms = query_vec.len(), k, total_hits, "scored query");

    let results = scored
        .into_iter()
        .take(k)
        .filter_map(|(i, score)| {
            let r = index.record(i)?;
            Some(ScoredResult {
                index: i,
                faculty_id: r.faculty_id.clone(),
                name: r.name.clone(),
                specialization: r.specialization.clone(),
                research: r.research.clone(),
                mail: r.mail.clone(),
                score: round_score(score),
            })
        })
        .collect();

    Ok(Recommendations { query: clean, top_k: k, total_hits, results })
}

fn round_score(score: f64) -> f64 {
    let scale = 10f64.powi(SCORE_DECIMALS);
    (score * scale).round() / scale
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::{BuildConfig, IndexBuilder};
    use crate::record::FacultyRecord;

    fn index_of(docs: &[&str]) -> Index {
        let records = docs
            .iter()
            .enumerate()
            .map(|(i, d)| FacultyRecord { faculty_id: i.to_string(), research: d.to_string(), ..Default::default() })
            .collect();
        IndexBuilder::new(BuildConfig::default()).build(records)
    }

    #[test]
    fn unloaded_handle_is_unavailable() {
        let rec = Recommender::new(IndexHandle::empty());
        assert!(matches!(rec.get_recommendations("nlp", 5), Err(Error::IndexUnavailable)));
    }

    #[test]
    fn empty_query_is_rejected() {
        let index = index_of(&["nlp", "graphs"]);
        assert!(matches!(recommend(&index, "top 3", 5), Err(Error::EmptyQuery)));
        assert!(matches!(recommend(&index, "   ", 5), Err(Error::EmptyQuery)));
    }

    #[test]
    fn out_of_vocabulary_query_has_no_hits() {
        let index = index_of(&["nlp", "graphs"]);
        let out = recommend(&index, "quantum chemistry", 5).unwrap();
        assert_eq!(out.total_hits, 0);
        assert!(out.results.is_empty());
    }

    #[test]
    fn ties_break_by_build_position() {
        let index = index_of(&["nlp vision", "databases", "nlp vision"]);
        let out = recommend(&index, "nlp", 5).unwrap();
        let order: Vec<usize> = out.results.iter().map(|r| r.index).collect();
        assert_eq!(order, vec![0, 2]);
    }

    #[test]
    fn k_is_clamped_to_index_size() {
        let index = index_of(&["nlp a", "nlp b", "graphs"]);
        let out = recommend(&index, "nlp top 50", 5).unwrap();
        assert_eq!(out.top_k, 3);
        let out = recommend(&index, "nlp top 0", 5).unwrap();
        assert_eq!(out.top_k, 1);
        assert_eq!(out.results.len(), 1);
    }

    #[test]
    fn scores_are_rounded() {
        let index = index_of(&["nlp graphs", "databases", "vision"]);
        let out = recommend(&index, "nlp", 5).unwrap();
        let s = out.results[0].score;
        assert_eq!(s, (s * 10_000.0).round() / 10_000.0);
    }

    #[test]
    fn replace_swaps_whole_snapshot() {
        let handle = IndexHandle::with_index(index_of(&["nlp"]));
        let before = handle.snapshot().unwrap();
        let old = handle.replace(index_of(&["graphs", "nlp"]));
        assert!(Arc::ptr_eq(&before, &old.unwrap()));
        assert_eq!(before.num_docs(), 1);
        assert_eq!(handle.snapshot().unwrap().num_docs(), 2);
    }
}
