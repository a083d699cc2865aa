//! Registry mapping format keys to parser constructors.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::LazyLock;

use super::detect::detect;
use crate::config::{AKN4EU, AKOMA_NTOSO, BOE, FORMEX, GERMAN_LEGALDOCML, LUXEMBOURG};
use crate::dialects::{
    AkomaNtosoParser, BoeParser, CellarParser, CellarStandardParser, FormexParser,
    ProposalParser, RegionalParser,
};
use crate::error::{ParserError, Result};
use crate::parser::DocumentParser;

/// Constructor for a fresh parser instance.
pub type ParserFactory = fn() -> Box<dyn DocumentParser>;

struct Entry {
    description: &'static str,
    factory: ParserFactory,
}

/// Parsers shipped with the crate: key, description and constructor.
pub const BUILTIN: &[(&str, &str, ParserFactory)] = &[
    (
        AKOMA_NTOSO.key,
        "Akoma Ntoso 3.0 (OASIS LegalDocML), identifiers in eId",
        || Box::new(AkomaNtosoParser::standard()),
    ),
    (
        AKN4EU.key,
        "AKN4EU, the EU profile of Akoma Ntoso, identifiers in xml:id",
        || Box::new(AkomaNtosoParser::akn4eu()),
    ),
    (
        GERMAN_LEGALDOCML.key,
        "German LegalDocML.de; schema validation is skipped",
        || Box::new(AkomaNtosoParser::german()),
    ),
    (
        LUXEMBOURG.key,
        "Luxembourg Akoma Ntoso CSD13 with alinea content",
        || Box::new(AkomaNtosoParser::luxembourg()),
    ),
    (
        FORMEX.key,
        "Formex 4, the Publications Office format for the Official Journal",
        || Box::new(FormexParser::new()),
    ),
    (
        BOE.key,
        "Spanish Boletin Oficial del Estado XML",
        || Box::new(BoeParser::new()),
    ),
    (
        "cellar",
        "Semantic EUR-Lex XHTML with ELI identifiers",
        || Box::new(CellarParser::new()),
    ),
    (
        "cellar-standard",
        "Plain EUR-Lex HTML wrapped in TXT_TE, or consolidated text",
        || Box::new(CellarStandardParser::new()),
    ),
    (
        "proposal",
        "European Commission legislative proposals with explanatory memorandum",
        || Box::new(ProposalParser::new()),
    ),
    (
        "regional",
        "Regional authority HTML (Veneto regional council)",
        || Box::new(RegionalParser::new()),
    ),
];

/// Immutable lookup from format key to parser constructor.
///
/// Keys are kept sorted so listings are stable.
pub struct ParserRegistry {
    entries: BTreeMap<&'static str, Entry>,
}

impl ParserRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    /// A registry holding every built-in parser.
    #[must_use]
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        for &(key, description, factory) in BUILTIN {
            if let Err(err) = registry.register(key, description, factory) {
                tracing::error!(key, error = %err, "Skipping built-in parser");
            }
        }
        registry
    }

    /// Register a constructor under `key`.
    ///
    /// # Errors
    /// `DuplicateRegistration` if `key` is already taken; the existing entry is kept.
    pub fn register(
        &mut self,
        key: &'static str,
        description: &'static str,
        factory: ParserFactory,
    ) -> Result<()> {
        if self.entries.contains_key(key) {
            return Err(ParserError::DuplicateRegistration(key.to_string()));
        }
        self.entries.insert(key, Entry { description, factory });
        Ok(())
    }

    /// Create a parser for `key`.
    ///
    /// # Errors
    /// `UnknownFormat` if nothing is registered under `key`.
    pub fn create(&self, key: &str) -> Result<Box<dyn DocumentParser>> {
        self.entries
            .get(key)
            .map(|entry| (entry.factory)())
            .ok_or_else(|| ParserError::UnknownFormat(key.to_string()))
    }

    /// Detect the format of `path` and create its parser.
    ///
    /// # Errors
    /// Detection errors, or `UnknownFormat` if the detected key is not registered.
    pub fn create_for(&self, path: &Path) -> Result<Box<dyn DocumentParser>> {
        let key = detect(path)?;
        tracing::debug!(path = %path.display(), format = key, "Detected format");
        self.create(key)
    }

    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Registered keys in sorted order.
    pub fn keys(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.entries.keys().copied()
    }

    /// Registered keys with their descriptions, in sorted order.
    pub fn descriptions(&self) -> impl Iterator<Item = (&'static str, &'static str)> + '_ {
        self.entries
            .iter()
            .map(|(key, entry)| (*key, entry.description))
    }
}

impl Default for ParserRegistry {
    fn default() -> Self {
        Self::new()
    }
}

static REGISTRY: LazyLock<ParserRegistry> = LazyLock::new(ParserRegistry::builtin);

/// The process-wide registry of built-in parsers.
pub fn registry() -> &'static ParserRegistry {
    &REGISTRY
}

/// Create a parser by key, or by detecting the format of `path` when no key is given.
///
/// # Errors
/// `UnknownFormat` for an unregistered key or an unrecognised input.
pub fn create_parser(format: Option<&str>, path: &Path) -> Result<Box<dyn DocumentParser>> {
    match format {
        Some(key) => registry().create(key),
        None => registry().create_for(path),
    }
}
