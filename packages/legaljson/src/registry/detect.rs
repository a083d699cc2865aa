//! Format detection from the root start-tag.
//!
//! XML inputs are read only up to their first element, which is enough to
//! tell the dialects apart. HTML inputs are sniffed for the markers each
//! portal layout carries.

use std::fs::{self, File};
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::config::{
    AKN4EU, AKOMA_NTOSO, BOE, CSD13_MARKER, FORMEX, GERMAN_LEGALDOCML, GERMAN_MARKER,
    HTML_EXTENSIONS, LUXEMBOURG,
};
use crate::error::{ParserError, Result};
use crate::parser::input::select_document;
use crate::parser::InputKind;

/// Name and attributes of a document's first element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RootTag {
    /// Qualified name, prefix included.
    pub name: String,
    pub attributes: Vec<(String, String)>,
}

impl RootTag {
    fn from_start(start: &BytesStart<'_>) -> Self {
        let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
        let attributes = start
            .attributes()
            .filter_map(|a| a.ok())
            .map(|a| {
                let key = String::from_utf8_lossy(a.key.as_ref()).into_owned();
                let value = a
                    .unescape_value()
                    .map(|v| v.into_owned())
                    .unwrap_or_else(|_| String::from_utf8_lossy(&a.value).into_owned());
                (key, value)
            })
            .collect();
        Self { name, attributes }
    }

    /// Name without its namespace prefix.
    #[must_use]
    pub fn local_name(&self) -> &str {
        self.name
            .rsplit_once(':')
            .map_or(self.name.as_str(), |(_, local)| local)
    }

    /// Namespace URIs declared on the element.
    pub fn namespaces(&self) -> impl Iterator<Item = &str> {
        self.attributes
            .iter()
            .filter(|(key, _)| key == "xmlns" || key.starts_with("xmlns:"))
            .map(|(_, value)| value.as_str())
    }

    #[must_use]
    pub fn has_attribute(&self, key: &str) -> bool {
        self.attributes.iter().any(|(k, _)| k == key)
    }
}

/// Read events until the first element and return its tag.
///
/// # Errors
/// The reader's error if the prolog is not well-formed.
pub fn read_root_tag<R: BufRead>(source: R) -> std::result::Result<Option<RootTag>, quick_xml::Error> {
    let mut reader = Reader::from_reader(source);
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) | Event::Empty(e) => return Ok(Some(RootTag::from_start(&e))),
            Event::Eof => return Ok(None),
            _ => {}
        }
        buf.clear();
    }
}

/// Pick the Akoma Ntoso variant of an `akomaNtoso` root.
///
/// Namespace markers win over the `xml:id` attribute; a root matching
/// neither is standard Akoma Ntoso.
#[must_use]
pub fn detect_akoma_ntoso(root: &RootTag) -> &'static str {
    if root.namespaces().any(|ns| ns.contains(GERMAN_MARKER)) {
        GERMAN_LEGALDOCML.key
    } else if root.namespaces().any(|ns| ns.contains(CSD13_MARKER)) {
        LUXEMBOURG.key
    } else if root.has_attribute("xml:id") {
        AKN4EU.key
    } else {
        AKOMA_NTOSO.key
    }
}

/// Formex roots are upper-case element names such as `ACT` or `CONS.ACT`.
fn is_formex_root(name: &str) -> bool {
    name.chars().any(|c| c.is_ascii_uppercase())
        && name
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || matches!(c, '.' | '_' | '-'))
}

/// Pick the HTML dialect from markers in the page source.
///
/// # Examples
/// ```
/// use legaljson::registry::detect::sniff_html;
///
/// assert_eq!(sniff_html("<html><body><TXT_TE><p>x</p></TXT_TE></body></html>"), Some("cellar-standard"));
/// assert_eq!(sniff_html(r#"<div class="row testo"></div>"#), Some("regional"));
/// assert_eq!(sniff_html("<html><body><p>x</p></body></html>"), None);
/// ```
#[must_use]
pub fn sniff_html(source: &str) -> Option<&'static str> {
    if source.contains("TXT_TE") || source.contains("txt_te") {
        Some("cellar-standard")
    } else if source.contains("eli-main-title") || source.contains(r#"id="enc_"#) {
        Some("cellar")
    } else if source.contains(r#"class="Statut""#) || source.contains("Rfrenceinstitutionnelle") {
        Some("proposal")
    } else if source.contains("row testo") {
        Some("regional")
    } else {
        None
    }
}

fn has_html_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| HTML_EXTENSIONS.iter().any(|c| c.eq_ignore_ascii_case(ext)))
}

fn unknown(path: &Path, reason: &str) -> ParserError {
    ParserError::UnknownFormat(format!("{}: {reason}", path.display()))
}

fn detect_html_file(path: &Path) -> Result<&'static str> {
    let source = fs::read_to_string(path).map_err(|source| ParserError::FileLoad {
        path: path.to_path_buf(),
        source,
    })?;
    sniff_html(&source).ok_or_else(|| unknown(path, "no known HTML layout markers"))
}

/// The document a directory input resolves to, trying XML candidates first.
fn resolve_input(path: &Path) -> Result<PathBuf> {
    if !path.is_dir() {
        return Ok(path.to_path_buf());
    }
    select_document(path, InputKind::Xml).or_else(|err| {
        tracing::debug!(error = %err, "No XML candidate, trying HTML");
        select_document(path, InputKind::Html)
    })
}

/// Detect the registry key for the file or directory at `path`.
///
/// # Errors
/// * `FileLoad` if the input cannot be read or a directory holds no candidate
/// * `Parse` if the XML prolog is malformed
/// * `UnknownFormat` if no dialect matches
pub fn detect(path: &Path) -> Result<&'static str> {
    let file_path = resolve_input(path)?;
    if has_html_extension(&file_path) {
        return detect_html_file(&file_path);
    }

    let file = File::open(&file_path).map_err(|source| ParserError::FileLoad {
        path: file_path.clone(),
        source,
    })?;
    let root = read_root_tag(BufReader::new(file))
        .map_err(|e| ParserError::Parse {
            path: file_path.clone(),
            message: e.to_string(),
        })?
        .ok_or_else(|| unknown(&file_path, "no root element"))?;

    let key = match root.local_name() {
        "akomaNtoso" => detect_akoma_ntoso(&root),
        "documento" => BOE.key,
        name if name.eq_ignore_ascii_case("html") => return detect_html_file(&file_path),
        name if is_formex_root(name) => FORMEX.key,
        name => return Err(unknown(&file_path, &format!("unrecognised root element <{name}>"))),
    };
    tracing::debug!(root = %root.name, format = key, "Detected XML dialect");
    Ok(key)
}
