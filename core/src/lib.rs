//! TF-IDF indexing and cosine-similarity ranking of faculty profiles.

pub mod error;
pub mod index;
pub mod persist;
pub mod query;
pub mod recommend;
pub mod record;
pub mod similarity;
pub mod tokenizer;
pub mod vectorize;

pub use error::{Error, Result};
pub use index::{BuildConfig, Index, IndexBuilder};
pub use recommend::{IndexHandle, Recommendations, Recommender, ScoredResult};
pub use record::{FacultyRecord, FieldWeights, RawFacultyRecord};
pub use vectorize::{IdfSmoothing, IdfTable, TermVector};
