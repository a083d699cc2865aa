//! Configuration constants and per-dialect settings.
//!
//! Every XML dialect is described by an immutable [`DialectConfig`]. The
//! Akoma Ntoso variants share one parser and differ only in the value
//! passed to it.

use std::sync::Arc;

use roxmltree::Node;

use crate::xml::schema::XmlValidator;

/// Standard Akoma Ntoso 3.0 namespace.
pub const AKN_NAMESPACE: &str = "http://docs.oasis-open.org/legaldocml/ns/akn/3.0";

/// Luxembourg Committee Specification Draft 13 namespace.
pub const CSD13_NAMESPACE: &str = "http://docs.oasis-open.org/legaldocml/ns/akn/3.0/CSD13";

/// Luxembourg metadata namespace.
pub const SCL_NAMESPACE: &str = "http://www.scl.lu";

/// German LegalDocML namespaces share this prefix; the version follows it.
pub const GERMAN_NAMESPACE_PATTERN: &str = "http://Inhaltsdaten.LegalDocML.de/*";

/// Namespace of the `xml:` prefix.
pub const XML_NAMESPACE: &str = "http://www.w3.org/XML/1998/namespace";

/// Substring that marks a German LegalDocML namespace.
pub const GERMAN_MARKER: &str = "LegalDocML.de";

/// Substring that marks the Luxembourg CSD13 namespace.
pub const CSD13_MARKER: &str = "CSD13";

/// Extensions considered when an XML dialect is pointed at a directory.
pub const XML_EXTENSIONS: &[&str] = &["xml", "fmx4", "fmx", "akn"];

/// Extensions considered when an HTML dialect is pointed at a directory.
pub const HTML_EXTENSIONS: &[&str] = &["html", "xhtml", "htm"];

/// Number of trailing paragraphs searched for a closing formula in legacy HTML.
pub const CONCLUSION_SEARCH_WINDOW: usize = 20;

/// Paragraphs shorter than this may be promoted to an article heading.
pub const HEADING_MAX_LEN: usize = 100;

/// Text wrap width for CLI listings.
pub const TEXT_WRAP_WIDTH: usize = 88;

/// Attribute a dialect reads element identifiers from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdAttribute {
    /// `eId` (Akoma Ntoso 3.0).
    EId,
    /// `xml:id` (AKN4EU).
    XmlId,
    /// Plain `id` (Luxembourg CSD13).
    Id,
    /// No identifier attribute; positions are used instead.
    Positional,
}

impl IdAttribute {
    /// Read the identifier of `node`, if the dialect has one and it is set.
    pub fn read<'a>(self, node: Node<'a, '_>) -> Option<&'a str> {
        match self {
            Self::EId => node.attribute("eId"),
            Self::XmlId => node.attribute((XML_NAMESPACE, "id")),
            Self::Id => node
                .attributes()
                .find(|a| a.name() == "id" && a.namespace().is_none())
                .map(|a| a.value()),
            Self::Positional => None,
        }
    }
}

/// How article sub-paragraphs are collected in the Akoma Ntoso family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChildStrategy {
    /// Group `p` texts by their nearest identified ancestor.
    GroupByOwner,
    /// One child per `paragraph` element.
    Paragraphs,
    /// One child per `alinea`, plus one per list item inside its content.
    Alineas,
}

/// Immutable settings for one XML dialect.
#[derive(Debug, Clone, Copy)]
pub struct DialectConfig {
    /// Registry key.
    pub key: &'static str,
    /// Prefix to namespace URI. A URI ending in `*` matches by prefix.
    pub namespaces: &'static [(&'static str, &'static str)],
    pub id_attribute: IdAttribute,
    /// Separator marking nested identifiers (sub-chapters).
    pub nesting_separator: &'static str,
    pub child_strategy: ChildStrategy,
    /// Whether a supplied XML schema is checked before extraction.
    pub validate_schema: bool,
}

impl DialectConfig {
    /// Resolve a query prefix to its namespace pattern.
    #[must_use]
    pub fn namespace(&self, prefix: &str) -> Option<&'static str> {
        self.namespaces
            .iter()
            .find(|(p, _)| *p == prefix)
            .map(|(_, uri)| *uri)
    }

    /// Read an element identifier according to the dialect.
    pub fn id_of<'a>(&self, node: Node<'a, '_>) -> Option<&'a str> {
        self.id_attribute.read(node)
    }
}

/// Match a namespace URI against a pattern from [`DialectConfig::namespaces`].
///
/// # Examples
/// ```
/// use legaljson::config::namespace_matches;
///
/// assert!(namespace_matches("http://Inhaltsdaten.LegalDocML.de/*", "http://Inhaltsdaten.LegalDocML.de/1.8.2/"));
/// assert!(namespace_matches("http://www.scl.lu", "http://www.scl.lu"));
/// assert!(!namespace_matches("http://www.scl.lu", "http://www.scl.lu/other"));
/// ```
#[must_use]
pub fn namespace_matches(pattern: &str, uri: &str) -> bool {
    match pattern.strip_suffix('*') {
        Some(prefix) => uri.starts_with(prefix),
        None => uri == pattern,
    }
}

pub const AKOMA_NTOSO: DialectConfig = DialectConfig {
    key: "akn",
    namespaces: &[("akn", AKN_NAMESPACE), ("an", AKN_NAMESPACE)],
    id_attribute: IdAttribute::EId,
    nesting_separator: "__",
    child_strategy: ChildStrategy::GroupByOwner,
    validate_schema: true,
};

pub const AKN4EU: DialectConfig = DialectConfig {
    key: "akn4eu",
    namespaces: &[("akn", AKN_NAMESPACE), ("an", AKN_NAMESPACE)],
    id_attribute: IdAttribute::XmlId,
    nesting_separator: "__",
    child_strategy: ChildStrategy::Paragraphs,
    validate_schema: true,
};

pub const GERMAN_LEGALDOCML: DialectConfig = DialectConfig {
    key: "german",
    namespaces: &[
        ("akn", GERMAN_NAMESPACE_PATTERN),
        ("an", GERMAN_NAMESPACE_PATTERN),
    ],
    id_attribute: IdAttribute::EId,
    nesting_separator: "__",
    child_strategy: ChildStrategy::GroupByOwner,
    validate_schema: false,
};

pub const LUXEMBOURG: DialectConfig = DialectConfig {
    key: "luxembourg",
    namespaces: &[
        ("akn", CSD13_NAMESPACE),
        ("an", CSD13_NAMESPACE),
        ("scl", SCL_NAMESPACE),
    ],
    id_attribute: IdAttribute::Id,
    nesting_separator: "__",
    child_strategy: ChildStrategy::Alineas,
    validate_schema: false,
};

pub const FORMEX: DialectConfig = DialectConfig {
    key: "formex",
    namespaces: &[],
    id_attribute: IdAttribute::Positional,
    nesting_separator: ".",
    child_strategy: ChildStrategy::GroupByOwner,
    validate_schema: true,
};

pub const BOE: DialectConfig = DialectConfig {
    key: "boe",
    namespaces: &[],
    id_attribute: IdAttribute::Positional,
    nesting_separator: ".",
    child_strategy: ChildStrategy::GroupByOwner,
    validate_schema: false,
};

/// Options for a single parse.
#[derive(Debug, Clone, Default)]
pub struct ParseOptions {
    /// XML schema checked against the root before extraction.
    pub schema: Option<Arc<XmlValidator>>,
}

impl ParseOptions {
    #[must_use]
    pub fn with_schema(schema: Arc<XmlValidator>) -> Self {
        Self {
            schema: Some(schema),
        }
    }
}
