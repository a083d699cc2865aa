//! Fixed-order conversion workflow.
//!
//! Loading the root is the only fatal step. Every later step runs through a
//! [`StepGuard`]: a failure is logged, recorded in the report, and the
//! section degrades to its empty default while the remaining steps still run.

use std::fs;
use std::path::Path;

use crate::config::ParseOptions;
use crate::error::{ParserError, Result};
use crate::parser::{input, ParserContract, Parsed, Step, StepFailure};
use crate::types::LegalDocument;

struct StepGuard {
    dialect: &'static str,
    failures: Vec<StepFailure>,
}

impl StepGuard {
    fn run<T: Default>(&mut self, step: Step, f: impl FnOnce() -> Result<T>) -> T {
        match f() {
            Ok(value) => value,
            Err(err) => {
                tracing::warn!(
                    dialect = self.dialect,
                    step = %step,
                    error = %err,
                    "Step failed, continuing with empty section"
                );
                self.failures.push(StepFailure {
                    step,
                    message: err.to_string(),
                });
                T::default()
            }
        }
    }
}

/// Convert `path` with `parser`.
///
/// # Errors
/// * `FileLoad` if the input cannot be read or no document is found in a directory
/// * `Parse` if the root tree cannot be built
pub fn run<P: ParserContract>(parser: &P, path: &Path, options: &ParseOptions) -> Result<Parsed> {
    let dialect = parser.name();
    let source_path = input::resolve(path, parser.input_kind())?;
    tracing::debug!(dialect, path = %source_path.display(), "Parsing document");

    let source = fs::read_to_string(&source_path).map_err(|source| ParserError::FileLoad {
        path: source_path.clone(),
        source,
    })?;

    let mut doc = parser.load_root(&source).map_err(|err| match err {
        ParserError::XmlParse(e) => ParserError::Parse {
            path: source_path.clone(),
            message: e.to_string(),
        },
        other => other,
    })?;

    let mut guard = StepGuard {
        dialect,
        failures: Vec::new(),
    };

    let mut valid = None;
    let mut validation_errors = Vec::new();
    if let Some(schema) = &options.schema {
        if parser.validates_schema() {
            match parser.validate(&doc, schema) {
                Ok(()) => valid = Some(true),
                Err(ParserError::SchemaValidation { errors }) => {
                    tracing::warn!(
                        dialect,
                        errors = errors.len(),
                        "Schema validation failed, extracting anyway"
                    );
                    valid = Some(false);
                    validation_errors = errors;
                }
                Err(err) => {
                    valid = Some(false);
                    guard.run::<()>(Step::Validate, || Err(err));
                }
            }
        } else {
            tracing::debug!(dialect, "Schema validation bypassed for dialect");
        }
    }

    let preface = guard.run(Step::Preface, || parser.preface(&doc));
    guard.run(Step::Preamble, || parser.preamble(&mut doc));
    let formula = guard.run(Step::Formula, || parser.formula(&doc));
    let citations = guard.run(Step::Citations, || parser.citations(&doc));
    let recitals = guard.run(Step::Recitals, || parser.recitals(&doc));
    let preamble_final = guard.run(Step::PreambleFinal, || parser.preamble_final(&doc));
    guard.run(Step::Body, || parser.body(&mut doc));
    let chapters = guard.run(Step::Chapters, || parser.chapters(&doc));
    let articles = guard.run(Step::Articles, || parser.articles(&doc));
    let conclusions = guard.run(Step::Conclusions, || parser.conclusions(&doc));

    let mut document = LegalDocument {
        preface,
        formula,
        citations,
        recitals,
        preamble_final,
        chapters,
        articles,
        conclusions,
        metadata: None,
        explanatory_memorandum: None,
    };
    guard.run(Step::Supplements, || parser.supplements(&doc, &mut document));
    parser.finalize(&mut document);

    tracing::info!(
        dialect,
        articles = document.articles.len(),
        failed_steps = guard.failures.len(),
        "Document parsed"
    );

    Ok(Parsed {
        document,
        source: source_path,
        dialect,
        failures: guard.failures,
        valid,
        validation_errors,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::{DocumentParser, InputKind};
    use crate::types::{Article, Recital};
    use std::io::Write;
    use tempfile::NamedTempFile;

    /// Reads one article per line; recitals always fail.
    struct LineParser;

    impl ParserContract for LineParser {
        type Doc<'src> = Vec<&'src str>;

        fn name(&self) -> &'static str {
            "lines"
        }

        fn input_kind(&self) -> InputKind {
            InputKind::Xml
        }

        fn load_root<'src>(&self, source: &'src str) -> Result<Self::Doc<'src>> {
            if source.is_empty() {
                return Err(ParserError::Validation("empty".to_string()));
            }
            Ok(source.lines().collect())
        }

        fn preface(&self, doc: &Self::Doc<'_>) -> Result<Option<String>> {
            Ok(doc.first().map(|l| l.to_string()))
        }

        fn recitals(&self, _doc: &Self::Doc<'_>) -> Result<Vec<Recital>> {
            Err(ParserError::element_not_found("recital"))
        }

        fn articles(&self, doc: &Self::Doc<'_>) -> Result<Vec<Article>> {
            Ok(doc
                .iter()
                .skip(1)
                .enumerate()
                .map(|(i, _)| Article::new(format!("art_{}", i + 1)))
                .collect())
        }
    }

    fn input(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_failed_step_degrades_to_default() {
        let file = input("Title\nfirst\nsecond");
        let parsed = LineParser.parse(file.path()).unwrap();

        assert_eq!(parsed.document.preface.as_deref(), Some("Title"));
        assert_eq!(parsed.document.articles.len(), 2);
        assert!(parsed.document.recitals.is_empty());
        assert!(parsed.failed(Step::Recitals));
        assert!(!parsed.is_complete());
        assert_eq!(parsed.dialect, "lines");
        assert_eq!(parsed.valid, None);
    }

    #[test]
    fn test_load_root_failure_is_fatal() {
        let file = input("");
        assert!(LineParser.parse(file.path()).is_err());
    }

    #[test]
    fn test_missing_file_is_file_load_error() {
        let err = LineParser
            .parse(Path::new("/nonexistent/input.xml"))
            .unwrap_err();
        assert!(matches!(err, ParserError::FileLoad { .. }));
    }

    #[test]
    fn test_parse_is_deterministic() {
        let file = input("Title\nfirst");
        let a = LineParser.parse(file.path()).unwrap();
        let b = LineParser.parse(file.path()).unwrap();
        assert_eq!(a.document, b.document);
    }
}
