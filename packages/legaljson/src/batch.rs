//! Parallel conversion of many inputs.
//!
//! Every input is converted independently on the rayon pool with its own
//! parser instance from the registry. A failing document is recorded in
//! the report and never stops the batch.

use std::path::{Path, PathBuf};

use rayon::prelude::*;

use crate::config::ParseOptions;
use crate::error::Result;
use crate::parser::{Parsed, Step};
use crate::registry::create_parser;

/// Outcome of one input.
#[derive(Debug)]
pub struct BatchOutcome {
    pub input: PathBuf,
    pub result: Result<Parsed>,
}

impl BatchOutcome {
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}

/// A document that failed outright or lost sections.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedDocument {
    pub input: PathBuf,
    /// Fatal error, if the document could not be converted at all.
    pub error: Option<String>,
    /// Sections that degraded to their empty default.
    pub sections: Vec<Step>,
}

/// Counts over a finished batch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    /// Failed sections across all converted documents.
    pub sections_failed: usize,
    pub failed_documents: Vec<FailedDocument>,
}

/// Outcomes in input order.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub outcomes: Vec<BatchOutcome>,
}

impl BatchReport {
    #[must_use]
    pub fn summary(&self) -> BatchSummary {
        let mut summary = BatchSummary {
            total: self.outcomes.len(),
            ..Default::default()
        };
        for outcome in &self.outcomes {
            match &outcome.result {
                Ok(parsed) => {
                    summary.succeeded += 1;
                    summary.sections_failed += parsed.failures.len();
                    if !parsed.is_complete() {
                        summary.failed_documents.push(FailedDocument {
                            input: outcome.input.clone(),
                            error: None,
                            sections: parsed.failures.iter().map(|f| f.step).collect(),
                        });
                    }
                }
                Err(err) => {
                    summary.failed += 1;
                    summary.failed_documents.push(FailedDocument {
                        input: outcome.input.clone(),
                        error: Some(err.to_string()),
                        sections: Vec::new(),
                    });
                }
            }
        }
        summary
    }
}

fn parse_one(input: &Path, format: Option<&str>, options: &ParseOptions) -> Result<Parsed> {
    let parser = create_parser(format, input)?;
    parser.parse_with_options(input, options)
}

/// Convert every input in parallel.
///
/// `on_done` is called from the worker threads as each input finishes, in
/// completion order. The report keeps input order.
pub fn parse_batch<F>(
    inputs: &[PathBuf],
    format: Option<&str>,
    options: &ParseOptions,
    on_done: F,
) -> BatchReport
where
    F: Fn(&BatchOutcome) + Sync,
{
    let outcomes = inputs
        .par_iter()
        .map(|input| {
            let result = parse_one(input, format, options);
            if let Err(err) = &result {
                tracing::warn!(path = %input.display(), error = %err, "Document failed");
            }
            let outcome = BatchOutcome {
                input: input.clone(),
                result,
            };
            on_done(&outcome);
            outcome
        })
        .collect();
    BatchReport { outcomes }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::tempdir;

    const BOE_DOCUMENT: &str = r#"<documento><texto>
<p class="parrafo">Preámbulo.</p>
<p class="articulo">Artículo 1.</p>
<p class="parrafo">Texto.</p>
</texto></documento>"#;

    #[test]
    fn test_batch_keeps_input_order_and_isolates_failures() {
        let dir = tempdir().unwrap();
        let good = dir.path().join("boe.xml");
        let broken = dir.path().join("broken.xml");
        let missing = dir.path().join("missing.xml");
        fs::write(&good, BOE_DOCUMENT).unwrap();
        fs::write(&broken, "<documento><texto>").unwrap();

        let inputs = vec![broken.clone(), good.clone(), missing.clone()];
        let done = AtomicUsize::new(0);
        let report = parse_batch(&inputs, Some("boe"), &ParseOptions::default(), |_| {
            done.fetch_add(1, Ordering::SeqCst);
        });

        assert_eq!(done.load(Ordering::SeqCst), 3);
        let order: Vec<_> = report.outcomes.iter().map(|o| o.input.clone()).collect();
        assert_eq!(order, inputs);
        assert!(report.outcomes[1].is_success());

        let summary = report.summary();
        assert_eq!(summary.total, 3);
        assert_eq!(summary.succeeded, 1);
        assert_eq!(summary.failed, 2);
        assert_eq!(summary.sections_failed, 0);
        let failed: Vec<_> = summary.failed_documents.iter().map(|f| f.input.clone()).collect();
        assert_eq!(failed, vec![broken, missing]);
    }

    #[test]
    fn test_batch_detects_formats() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("boe.xml");
        fs::write(&input, BOE_DOCUMENT).unwrap();

        let report = parse_batch(&[input], None, &ParseOptions::default(), |_| {});
        let parsed = report.outcomes[0].result.as_ref().unwrap();
        assert_eq!(parsed.dialect, "boe");
        assert_eq!(parsed.document.articles.len(), 1);
    }
}
