use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Sparse term -> weight map. Only strictly positive weights are stored.
///
/// Backed by a `BTreeMap` so iteration (and therefore every floating point
/// sum over a vector) happens in a fixed term order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TermVector(BTreeMap<String, f64>);

impl TermVector {
    pub fn new() -> Self { Self::default() }

    /// Insert a weight, dropping it when it is not strictly positive.
    pub fn insert(&mut self, term: impl Into<String>, weight: f64) {
        let term = term.into();
        if weight > 0.0 {
            self.0.insert(term, weight);
        } else {
            self.0.remove(&term);
        }
    }

    pub fn get(&self, term: &str) -> Option<f64> { self.0.get(term).copied() }
    pub fn len(&self) -> usize { self.0.len() }
    pub fn is_empty(&self) -> bool { self.0.is_empty() }
    pub fn terms(&self) -> impl Iterator<Item = &str> { self.0.keys().map(String::as_str) }
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> { self.0.iter().map(|(t, w)| (t.as_str(), *w)) }

    pub fn norm(&self) -> f64 {
        self.0.values().map(|w| w * w).sum::<f64>().sqrt()
    }

    /// Terms sorted by descending weight, ties by term.
    pub fn top_terms(&self, n: usize) -> Vec<(&str, f64)> {
        let mut terms: Vec<(&str, f64)> = self.iter().collect();
        terms.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        terms.truncate(n);
        terms
    }
}

impl FromIterator<(String, f64)> for TermVector {
    fn from_iter<I: IntoIterator<Item = (String, f64)>>(iter: I) -> Self {
        let mut v = TermVector::new();
        for (t, w) in iter {
            v.insert(t, w);
        }
        v
    }
}

/// Corpus-wide inverse document frequencies. Every term seen in at least one
/// document has an entry, including terms whose weight is zero.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IdfTable(BTreeMap<String, f64>);

impl IdfTable {
    pub fn get(&self, term: &str) -> Option<f64> { self.0.get(term).copied() }
    pub fn contains(&self, term: &str) -> bool { self.0.contains_key(term) }
    pub fn len(&self) -> usize { self.0.len() }
    pub fn is_empty(&self) -> bool { self.0.is_empty() }
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> { self.0.iter().map(|(t, w)| (t.as_str(), *w)) }
}

/// IDF formula applied uniformly across the corpus.
///
/// `Plain` gives `ln(N / df)`, so a term present in every document weighs 0.
/// `Smoothed` gives `ln(1 + N / df)`, which keeps such terms positive.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum IdfSmoothing {
    #[default]
    Plain,
    Smoothed,
}

impl IdfSmoothing {
    fn weight(self, n: usize, df: usize) -> f64 {
        let ratio = n as f64 / df.max(1) as f64;
        match self {
            IdfSmoothing::Plain => ratio.ln(),
            IdfSmoothing::Smoothed => (1.0 + ratio).ln(),
        }
    }
}

/// Raw occurrence count of each term.
pub fn compute_tf(tokens: &[String]) -> TermVector {
    let mut counts: BTreeMap<String, f64> = BTreeMap::new();
    for t in tokens {
        *counts.entry(t.clone()).or_insert(0.0) += 1.0;
    }
    TermVector(counts)
}

pub fn compute_idf(corpus: &[Vec<String>], smoothing: IdfSmoothing) -> IdfTable {
    let n = corpus.len();
    let mut df: BTreeMap<String, usize> = BTreeMap::new();
    for tokens in corpus {
        let unique: BTreeSet<&String> = tokens.iter().collect();
        for term in unique {
            *df.entry(term.clone()).or_insert(0) += 1;
        }
    }
    IdfTable(df.into_iter().map(|(term, df_t)| (term, smoothing.weight(n, df_t))).collect())
}

/// Weight each term by its IDF. Terms missing from `idf` or with zero IDF
/// are pruned from the result.
pub fn compute_tfidf(tf: &TermVector, idf: &IdfTable) -> TermVector {
    tf.iter()
        .map(|(term, count)| (term.to_string(), count * idf.get(term).unwrap_or(0.0)))
        .collect()
}
