//! Parser contract shared by every dialect.
//!
//! A dialect implements [`ParserContract`]: two required extraction steps
//! (preface and articles), a root loader, and optional steps that default to
//! empty sections. The fixed step order and per-step failure isolation live
//! in [`workflow`]; dialects never drive the sequence themselves.
//!
//! [`DocumentParser`] is the object-safe face of a contract, used by the
//! registry and the batch runner.

pub mod input;
pub mod workflow;

use std::fmt;
use std::path::{Path, PathBuf};

use crate::config::{ParseOptions, HTML_EXTENSIONS, XML_EXTENSIONS};
use crate::error::Result;
use crate::types::{Article, Chapter, Citation, Conclusion, LegalDocument, Recital};
use crate::xml::schema::XmlValidator;

/// Markup family a dialect reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    Xml,
    Html,
}

impl InputKind {
    /// File extensions considered when selecting a document from a directory.
    #[must_use]
    pub fn extensions(self) -> &'static [&'static str] {
        match self {
            Self::Xml => XML_EXTENSIONS,
            Self::Html => HTML_EXTENSIONS,
        }
    }
}

/// Steps of the conversion workflow, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Step {
    LoadRoot,
    Validate,
    Preface,
    Preamble,
    Formula,
    Citations,
    Recitals,
    PreambleFinal,
    Body,
    Chapters,
    Articles,
    Conclusions,
    Supplements,
}

impl Step {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::LoadRoot => "load_root",
            Self::Validate => "validate",
            Self::Preface => "preface",
            Self::Preamble => "preamble",
            Self::Formula => "formula",
            Self::Citations => "citations",
            Self::Recitals => "recitals",
            Self::PreambleFinal => "preamble_final",
            Self::Body => "body",
            Self::Chapters => "chapters",
            Self::Articles => "articles",
            Self::Conclusions => "conclusions",
            Self::Supplements => "supplements",
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A step that failed and was degraded to its empty default.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepFailure {
    pub step: Step,
    pub message: String,
}

/// Result of converting one document.
#[derive(Debug, Clone)]
pub struct Parsed {
    pub document: LegalDocument,
    /// File that was actually read (after directory selection).
    pub source: PathBuf,
    /// Registry key of the dialect that produced the document.
    pub dialect: &'static str,
    /// Steps that failed; their sections are empty.
    pub failures: Vec<StepFailure>,
    /// Schema validation outcome, `None` when no schema was checked.
    pub valid: Option<bool>,
    /// Messages from schema validation.
    pub validation_errors: Vec<String>,
}

impl Parsed {
    /// Whether every step succeeded.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    /// Whether `step` failed.
    #[must_use]
    pub fn failed(&self, step: Step) -> bool {
        self.failures.iter().any(|f| f.step == step)
    }
}

/// Capabilities of a dialect parser.
///
/// `Doc` is the dialect's loaded document plus whatever state the preamble
/// and body steps locate for later steps. It may borrow from the source text.
pub trait ParserContract: Send + Sync {
    type Doc<'src>;

    /// Registry key of the dialect.
    fn name(&self) -> &'static str;

    fn input_kind(&self) -> InputKind;

    /// Build the document tree. Failure is fatal for the document.
    fn load_root<'src>(&self, source: &'src str) -> Result<Self::Doc<'src>>;

    /// Whether a supplied XML schema is checked before extraction.
    fn validates_schema(&self) -> bool {
        false
    }

    fn validate(&self, _doc: &Self::Doc<'_>, _schema: &XmlValidator) -> Result<()> {
        Ok(())
    }

    fn preface(&self, doc: &Self::Doc<'_>) -> Result<Option<String>>;

    /// Locate the preamble for the steps that follow.
    fn preamble(&self, _doc: &mut Self::Doc<'_>) -> Result<()> {
        Ok(())
    }

    fn formula(&self, _doc: &Self::Doc<'_>) -> Result<Option<String>> {
        Ok(None)
    }

    fn citations(&self, _doc: &Self::Doc<'_>) -> Result<Vec<Citation>> {
        Ok(Vec::new())
    }

    fn recitals(&self, _doc: &Self::Doc<'_>) -> Result<Vec<Recital>> {
        Ok(Vec::new())
    }

    fn preamble_final(&self, _doc: &Self::Doc<'_>) -> Result<Option<String>> {
        Ok(None)
    }

    /// Locate the enacting terms for the steps that follow.
    fn body(&self, _doc: &mut Self::Doc<'_>) -> Result<()> {
        Ok(())
    }

    fn chapters(&self, _doc: &Self::Doc<'_>) -> Result<Vec<Chapter>> {
        Ok(Vec::new())
    }

    fn articles(&self, doc: &Self::Doc<'_>) -> Result<Vec<Article>>;

    fn conclusions(&self, _doc: &Self::Doc<'_>) -> Result<Option<Conclusion>> {
        Ok(None)
    }

    /// Fill dialect-specific extension fields.
    fn supplements(&self, _doc: &Self::Doc<'_>, _document: &mut LegalDocument) -> Result<()> {
        Ok(())
    }

    /// Whole-document rules applied after every step ran.
    fn finalize(&self, _document: &mut LegalDocument) {}
}

/// Object-safe entry point for converting documents.
pub trait DocumentParser: Send + Sync {
    /// Registry key of the dialect.
    fn dialect(&self) -> &'static str;

    fn kind(&self) -> InputKind;

    /// Convert the file (or the selected file of a directory) at `path`.
    fn parse_with_options(&self, path: &Path, options: &ParseOptions) -> Result<Parsed>;

    fn parse(&self, path: &Path) -> Result<Parsed> {
        self.parse_with_options(path, &ParseOptions::default())
    }
}

impl<P: ParserContract> DocumentParser for P {
    fn dialect(&self) -> &'static str {
        self.name()
    }

    fn kind(&self) -> InputKind {
        self.input_kind()
    }

    fn parse_with_options(&self, path: &Path, options: &ParseOptions) -> Result<Parsed> {
        workflow::run(self, path, options)
    }
}
