//! Pipeline error types.
//!
//! Every variant is fatal to the run: nothing here is retried or downgraded.
//! The orchestrator's only recovery duty is closing the store connection
//! before the error surfaces.

use thiserror::Error;

/// Pipeline-wide result alias.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// The source table is unparsable, empty, or holds values the pipeline
    /// cannot place in a numeric vector.
    #[error("data format error: {0}")]
    DataFormat(String),

    /// The configured label column is absent from the table.
    #[error("column not found in dataset: {column}")]
    ColumnNotFound { column: String },

    /// A row lacks an expected value column. Indicates schema drift between
    /// the column list computed at startup and the rows being read.
    #[error("row is missing expected field: {column}")]
    MissingField { column: String },

    /// The collection already exists and the caller asked for neither delete
    /// nor append. Refusing to guess avoids silent duplication or loss.
    #[error("collection {collection} already exists; pass --delete-collection or --append-collection")]
    CollectionConflict { collection: String },

    /// Remote bulk insert failed. Records already acknowledged by the store
    /// are not rolled back.
    #[error("bulk insert failed: {0}")]
    Insertion(#[source] Box<Error>),

    /// A nearest-vector query matched nothing.
    #[error("query returned no results for collection {collection}")]
    EmptyResult { collection: String },

    /// Any failure reported by the vector-store backend.
    #[error("vector store error: {message}")]
    Store { message: String },

    /// Dataset could not be fetched from its provider.
    #[error("dataset provider error: {0}")]
    Provider(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Wrap a backend failure, keeping only its message.
    pub fn store(err: impl std::fmt::Display) -> Self {
        Error::Store {
            message: err.to_string(),
        }
    }
}
