//! LegalJSON converter - turn legal acts into one canonical JSON shape.
//!
//! This crate reads legislative documents in several XML and HTML dialects
//! (Akoma Ntoso and its national profiles, Formex 4, BOE XML and EUR-Lex,
//! Commission proposal and regional portal HTML) and converts each of them
//! to LegalJSON: preface, preamble, chapters, articles and conclusions.
//!
//! # Example
//!
//! ```
//! use legaljson::registry::sniff_html;
//! use legaljson::types::Article;
//!
//! assert_eq!(sniff_html(r#"<div class="eli-main-title">"#), Some("cellar"));
//! assert_eq!(Article::new("art_7").ordinal(), 7);
//! ```
//!
//! # Architecture
//!
//! The converter is organized into several modules:
//!
//! - [`config`]: Per-dialect configuration and constants
//! - [`types`]: LegalJSON data types
//! - [`error`]: Error types and Result alias
//! - [`text`]: Text normalization
//! - [`xml`]: XML tree queries and schema validation
//! - [`html`]: HTML tree helpers
//! - [`parser`]: Parser contract and the fixed-order workflow
//! - [`dialects`]: One parser per source dialect
//! - [`registry`]: Format detection and the parser registry
//! - [`legaljson`]: LegalJSON schema validation
//! - [`batch`]: Parallel conversion of many inputs
//! - [`cli`]: Command-line interface

pub mod batch;
pub mod cli;
pub mod config;
pub mod dialects;
pub mod error;
pub mod html;
pub mod legaljson;
pub mod parser;
pub mod registry;
pub mod text;
pub mod types;
pub mod xml;

// Re-export commonly used items
pub use batch::{parse_batch, BatchReport, BatchSummary};
pub use config::ParseOptions;
pub use error::{ErrorKind, ParserError, Result};
pub use legaljson::LegalJsonValidator;
pub use parser::{DocumentParser, Parsed, ParserContract, Step};
pub use registry::{create_parser, detect, registry, ParserRegistry};
pub use types::{Article, ArticleChild, Conclusion, LegalDocument};
