use thiserror::Error;

/// Result type alias using the crate error
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// Source data could not be obtained or decoded during a build.
    #[error("data fetch failed for {source_name}: {message}")]
    DataFetch { source_name: String, message: String },

    /// Query text was empty once the `top N` directive was removed.
    #[error("query is empty")]
    EmptyQuery,

    /// A query arrived before any index snapshot was loaded.
    #[error("no index snapshot is loaded")]
    IndexUnavailable,

    #[error("corrupt index snapshot: {0}")]
    CorruptIndex(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] bincode::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub fn data_fetch(source_name: impl Into<String>, message: impl std::fmt::Display) -> Self {
        Error::DataFetch { source_name: source_name.into(), message: message.to_string() }
    }

    pub fn corrupt(msg: impl Into<String>) -> Self {
        Error::CorruptIndex(msg.into())
    }
}
