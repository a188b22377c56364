use std::path::PathBuf;

use thiserror::Error;

/// Errors produced by the extraction pipeline and the job coordinator.
///
/// Scoping: `NamingResolution` aborts a single element, `GroupCollision` and
/// `Parse` abort the whole file, `Write` propagates from the storage layer
/// unchanged, `Worker` wraps an abnormally-terminated per-component task.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("no enclosing named function for <{tag}> at offset {offset}")]
    NamingResolution { tag: String, offset: usize },

    #[error("style group \"{key}\" of {function} collides with an incompatible entry: {detail}")]
    GroupCollision {
        function: String,
        key: String,
        detail: String,
    },

    #[error("failed to parse {path}: {message}")]
    Parse { path: String, message: String },

    #[error("failed to write {path}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("component task {component} failed: {message}")]
    Worker { component: String, message: String },
}

pub type Result<T> = std::result::Result<T, ExtractError>;
