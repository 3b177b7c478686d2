//! Error kinds surfaced by the export and rollback flows.

use thiserror::Error;

/// Errors that can occur while exporting or rolling back a dashboard
#[derive(Debug, Error)]
pub enum Error {
    /// The dashboard service answered with a non-2xx status
    #[error("Dashboard service returned {status}: {body}")]
    ExternalService { status: u16, body: String },

    /// A git command exited non-zero (or could not be run)
    #[error("git {command} failed: {stderr}")]
    VersionControl { command: String, stderr: String },

    /// Requested revision or artifact path does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Content is not well-formed dashboard JSON
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Missing or invalid caller-supplied parameter
    #[error("Invalid input: {0}")]
    Input(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl Error {
    /// Stable snake_case name of the error kind
    pub fn kind(&self) -> &'static str {
        match self {
            Error::ExternalService { .. } => "external_service",
            Error::VersionControl { .. } => "version_control",
            Error::NotFound(_) => "not_found",
            Error::Validation(_) => "validation",
            Error::Input(_) => "input",
            Error::Io(_) => "io",
            Error::Http(_) => "http",
        }
    }

    /// Whether the failure was caused by the caller rather than a collaborator
    pub fn is_input(&self) -> bool {
        matches!(self, Error::Input(_))
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
