//! Typed errors for the ingestion pipeline.
//!
//! Every stage maps its failures into one [`IngestError`] variant so callers
//! (the CLI, the HTTP server, a UI) can tell stages apart without parsing
//! messages. The pipeline never retries and never wraps an error twice: what
//! a stage returns is what [`Pipeline::ingest`](crate::pipeline::Pipeline::ingest)
//! returns.

use thiserror::Error;

/// Failure of one ingestion stage.
#[derive(Debug, Error)]
pub enum IngestError {
    /// Input rejected before any I/O (unsupported URL, missing API key).
    #[error("validation failed: {0}")]
    Validation(String),

    /// Transport failure, malformed URL, undecodable page body, or a non-2xx
    /// reply from the generation endpoint.
    #[error("network error: {0}")]
    Network(String),

    /// The generation endpoint rejected the API key (401/403).
    #[error("authentication rejected: {0}")]
    Auth(String),

    /// The generation endpoint answered with JSON of an unexpected shape.
    #[error("could not decode response: {0}")]
    Decode(String),

    /// A packaged asset (prompt template, template archive) is absent or unreadable.
    #[error("resource missing: {0}")]
    ResourceMissing(String),

    /// Workspace extraction, move, or write failed.
    #[error("workspace error: {0}")]
    Workspace(String),

    /// The catalog store could not save or read.
    #[error("persistence error: {0}")]
    Persistence(String),

    /// The page carried no recognizable problem data and the pipeline is
    /// configured to require it.
    #[error("no problem data found on page: {0}")]
    ProblemNotFound(String),

    /// The external editor could not be spawned.
    #[error("failed to launch editor: {0}")]
    Launch(String),
}

impl IngestError {
    /// Stable machine-readable code, used in HTTP error bodies and CLI output.
    pub fn code(&self) -> &'static str {
        match self {
            IngestError::Validation(_) => "validation",
            IngestError::Network(_) => "network",
            IngestError::Auth(_) => "auth",
            IngestError::Decode(_) => "decode",
            IngestError::ResourceMissing(_) => "resource_missing",
            IngestError::Workspace(_) => "workspace",
            IngestError::Persistence(_) => "persistence",
            IngestError::ProblemNotFound(_) => "problem_not_found",
            IngestError::Launch(_) => "launch",
        }
    }
}

impl From<sqlx::Error> for IngestError {
    fn from(err: sqlx::Error) -> Self {
        IngestError::Persistence(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_distinct() {
        let errors = [
            IngestError::Validation(String::new()),
            IngestError::Network(String::new()),
            IngestError::Auth(String::new()),
            IngestError::Decode(String::new()),
            IngestError::ResourceMissing(String::new()),
            IngestError::Workspace(String::new()),
            IngestError::Persistence(String::new()),
            IngestError::ProblemNotFound(String::new()),
            IngestError::Launch(String::new()),
        ];
        let mut codes: Vec<&str> = errors.iter().map(|e| e.code()).collect();
        codes.sort();
        codes.dedup();
        assert_eq!(codes.len(), errors.len());
    }

    #[test]
    fn display_includes_detail() {
        let err = IngestError::Workspace("permission denied".to_string());
        assert_eq!(err.to_string(), "workspace error: permission denied");
    }
}
