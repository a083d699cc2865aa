//! Error types for the converter.
//!
//! One enum, [`ParserError`], covers every failure the library reports.
//! Each variant carries its payload as named fields, and [`ParserError::kind`]
//! places it in the coarse taxonomy used to decide between aborting a document
//! and degrading a single section.

use std::path::PathBuf;

use thiserror::Error;

/// Main error type for the converter library.
#[derive(Debug, Error)]
pub enum ParserError {
    /// The input could not be parsed into a tree.
    #[error("Failed to parse {}: {message}", .path.display())]
    Parse { path: PathBuf, message: String },

    /// The input file could not be read.
    #[error("Failed to load {}: {source}", .path.display())]
    FileLoad {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Schema or registry misuse.
    #[error("Parser configuration error: {0}")]
    ParserConfiguration(String),

    /// Generic validation failure.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Schema validation failed with one message per offending node.
    #[error("Schema validation failed with {} error(s): {}", .errors.len(), .errors.join("; "))]
    SchemaValidation { errors: Vec<String> },

    /// A section could not be extracted.
    #[error("Failed to extract {section}: {message}")]
    Extraction { section: String, message: String },

    /// A required element is missing.
    #[error("Element not found: {element_name}{}", .path.as_ref().map(|p| format!(" (path: {p})")).unwrap_or_default())]
    ElementNotFound {
        element_name: String,
        path: Option<String>,
    },

    /// Unexpected content type returned by a portal.
    #[error("Unexpected content type: {content_type}")]
    ContentType { content_type: String },

    /// Network failure in the download layer.
    #[error("Network error: {message}{}", .status.map(|s| format!(" (HTTP {s})")).unwrap_or_default())]
    Network { message: String, status: Option<u16> },

    /// Portal rejected the credentials.
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// Portal throttled the client.
    #[error("Rate limit exceeded{}", .retry_after.map(|s| format!(", retry after {s}s")).unwrap_or_default())]
    RateLimit { retry_after: Option<u64> },

    /// A SPARQL query failed.
    #[error("SPARQL query failed: {message} (query: {query})")]
    Sparql { query: String, message: String },

    /// No parser is registered for the requested key or the input format is unrecognised.
    #[error("Unknown format: {0}")]
    UnknownFormat(String),

    /// A parser key was registered twice.
    #[error("Parser already registered for format '{0}'")]
    DuplicateRegistration(String),

    /// The input does not follow the layout the selected dialect expects.
    #[error("Document does not match the {dialect} dialect: {reason}")]
    DialectMismatch { dialect: String, reason: String },

    /// XML tree construction failed.
    #[error("XML parsing failed: {0}")]
    XmlParse(#[from] roxmltree::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error.
    #[error("JSON serialization failed: {0}")]
    Json(#[from] serde_json::Error),
}

/// Coarse classification of a [`ParserError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// No root tree could be built; the document is lost.
    Parse,
    /// Schema or registry misuse.
    Configuration,
    /// The tree was built but does not validate; recoverable.
    Validation,
    /// A single section could not be extracted; diagnostic.
    Extraction,
    /// Failure in the download layer.
    Network,
}

impl ParserError {
    /// Classify the error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Parse { .. }
            | Self::FileLoad { .. }
            | Self::XmlParse(_)
            | Self::Io(_)
            | Self::DialectMismatch { .. } => ErrorKind::Parse,
            Self::ParserConfiguration(_)
            | Self::UnknownFormat(_)
            | Self::DuplicateRegistration(_) => ErrorKind::Configuration,
            Self::Validation(_) | Self::SchemaValidation { .. } | Self::Json(_) => {
                ErrorKind::Validation
            }
            Self::Extraction { .. } | Self::ElementNotFound { .. } => ErrorKind::Extraction,
            Self::ContentType { .. }
            | Self::Network { .. }
            | Self::Authentication(_)
            | Self::RateLimit { .. }
            | Self::Sparql { .. } => ErrorKind::Network,
        }
    }

    /// Whether the error ends processing of the current document.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(self.kind(), ErrorKind::Parse | ErrorKind::Configuration)
    }

    /// Shorthand for a missing element without a path.
    pub fn element_not_found(element_name: impl Into<String>) -> Self {
        Self::ElementNotFound {
            element_name: element_name.into(),
            path: None,
        }
    }
}

/// Result type alias for converter operations.
pub type Result<T> = std::result::Result<T, ParserError>;
