use crate::error::{Error, Result};
use crate::record::{FacultyRecord, FieldWeights};
use crate::tokenizer::{TokenSequence, TokenizerPolicy};
use crate::vectorize::{compute_idf, compute_tf, compute_tfidf, IdfSmoothing, IdfTable, TermVector};
use serde::{Deserialize, Serialize};

/// Bumped whenever the snapshot layout changes.
pub const SNAPSHOT_VERSION: u32 = 1;

/// Everything that shapes the vectors. Stored in the snapshot so queries are
/// vectorized exactly like the documents were.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildConfig {
    pub weights: FieldWeights,
    pub smoothing: IdfSmoothing,
    pub tokenizer: TokenizerPolicy,
}

/// Immutable, positionally aligned index: `vectors[i]` belongs to `meta[i]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Index {
    version: u32,
    created_at: String,
    config: BuildConfig,
    vectors: Vec<TermVector>,
    meta: Vec<FacultyRecord>,
    idf: IdfTable,
}

impl Index {
    pub fn version(&self) -> u32 { self.version }
    pub fn created_at(&self) -> &str { &self.created_at }
    /// Build settings; fixed for the lifetime of the index.
    pub fn config(&self) -> &BuildConfig { &self.config }
    pub fn num_docs(&self) -> usize { self.meta.len() }
    pub fn is_empty(&self) -> bool { self.meta.is_empty() }
    pub fn vectors(&self) -> &[TermVector] { &self.vectors }
    pub fn meta(&self) -> &[FacultyRecord] { &self.meta }
    pub fn idf(&self) -> &IdfTable { &self.idf }
    pub fn record(&self, i: usize) -> Option<&FacultyRecord> { self.meta.get(i) }

    /// Vectorize query text against this index's IDF table and tokenizer.
    /// Out-of-vocabulary terms are dropped.
    pub fn vectorize(&self, text: &str) -> TermVector {
        let tokens = self.config.tokenizer.tokenize(text);
        compute_tfidf(&compute_tf(&tokens), &self.idf)
    }

    /// Check the alignment and vocabulary invariants of a loaded snapshot.
    pub fn validate(&self) -> Result<()> {
        if self.version != SNAPSHOT_VERSION {
            return Err(Error::corrupt(format!(
                "snapshot version {} is not supported (expected {})",
                self.version, SNAPSHOT_VERSION
            )));
        }
        if self.vectors.len() != self.meta.len() {
            return Err(Error::corrupt(format!(
                "{} vectors for {} records",
                self.vectors.len(),
                self.meta.len()
            )));
        }
        if let Some((term, w)) = self.idf.iter().find(|(_, w)| !w.is_finite() || *w < 0.0) {
            return Err(Error::corrupt(format!("idf for {term:?} is {w}")));
        }
        for (i, v) in self.vectors.iter().enumerate() {
            for (term, w) in v.iter() {
                if !self.idf.contains(term) {
                    return Err(Error::corrupt(format!("document {i} has term {term:?} outside the vocabulary")));
                }
                if !w.is_finite() || w <= 0.0 {
                    return Err(Error::corrupt(format!("document {i} has weight {w} for {term:?}")));
                }
            }
        }
        Ok(())
    }
}

/// Batch builder turning a full set of records into a fresh [`Index`].
pub struct IndexBuilder {
    config: BuildConfig,
}

impl IndexBuilder {
    pub fn new(config: BuildConfig) -> Self { Self { config } }

    pub fn build(&self, records: Vec<FacultyRecord>) -> Index {
        let corpus: Vec<TokenSequence> = records
            .iter()
            .map(|r| self.config.tokenizer.tokenize(&r.document(&self.config.weights)))
            .collect();

        let idf = compute_idf(&corpus, self.config.smoothing);
        let vectors: Vec<TermVector> = corpus
            .iter()
            .map(|tokens| compute_tfidf(&compute_tf(tokens), &idf))
            .collect();

        let empty_docs = vectors.iter().filter(|v| v.is_empty()).count();
        if empty_docs > 0 {
            tracing::warn!(empty_docs, "records produced no weighted terms");
        }
        tracing::info!(num_docs = records.len(), num_terms = idf.len(), "built index");

        Index {
            version: SNAPSHOT_VERSION,
            created_at: now_rfc3339(),
            config: self.config,
            vectors,
            meta: records,
            idf,
        }
    }
}

fn now_rfc3339() -> String {
    time::OffsetDateTime::now_utc()
        .format(&time::format_description::well_known::Rfc3339)
        .unwrap_or_default()
}
