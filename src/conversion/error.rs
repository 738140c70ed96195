use std::{io, path::PathBuf};

use thiserror::Error;

/// [ConvertError] represents a failure that aborts the whole conversion.
/// Missing elements inside a record are never reported here, they turn into
/// empty cells instead.
#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("failed to read input '{}': {source}", .path.display())]
    Read { path: PathBuf, source: io::Error },

    #[error("malformed XML: {0}")]
    Parse(#[from] roxmltree::Error),

    #[error("failed to create output for '{}': {source}", .path.display())]
    CreateOutput { path: PathBuf, source: io::Error },

    #[error("failed to write output: {0}")]
    Write(#[from] io::Error),

    #[error("CSV encoding error: {0}")]
    Csv(#[from] csv::Error),

    #[error("failed to move finished output into place: {0}")]
    Persist(#[from] tempfile::PersistError),
}
