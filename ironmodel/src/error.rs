//! Error types for loading models.

use ironmodel_schema::ParseError;
use std::path::PathBuf;
use thiserror::Error;

/// Error type for loader operations.
#[derive(Debug, Error)]
pub enum LoadError {
    /// The model file could not be read.
    #[error("IO error for '{}': {source}", path.display())]
    Io {
        /// Path as given.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The document could not be parsed or serialized.
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// The model has no schema under the requested name.
    #[error("schema '{name}' not found in '{}'", path.display())]
    SchemaNotFound {
        /// Model file.
        path: PathBuf,
        /// Requested schema name.
        name: String,
    },
}

/// Result type for loader operations.
pub type Result<T> = std::result::Result<T, LoadError>;
