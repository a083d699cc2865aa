//! Format router and parser registry.
//!
//! The registry is built once, on first use, from the built-in parsers and
//! is read-only afterwards. Detection maps an input path to a registry key.

mod core;
pub mod detect;

pub use core::{create_parser, registry, ParserFactory, ParserRegistry, BUILTIN};
pub use detect::{detect, detect_akoma_ntoso, read_root_tag, sniff_html, RootTag};
