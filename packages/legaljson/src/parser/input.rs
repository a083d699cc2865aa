//! Input resolution: a file is used as-is, a directory is searched for the
//! most plausible document.

use std::fs::{self, File};
use std::io::BufReader;
use std::path::{Path, PathBuf};

use crate::error::{ParserError, Result};
use crate::parser::InputKind;
use crate::registry::read_root_tag;

/// Root elements of a Formex act.
const ACT_ROOTS: &[&str] = &["ACT", "DECISION", "CONS.ACT"];

/// Resolve `path` to a single file.
pub fn resolve(path: &Path, kind: InputKind) -> Result<PathBuf> {
    if path.is_dir() {
        select_document(path, kind)
    } else {
        Ok(path.to_path_buf())
    }
}

/// Pick the document to parse from a directory.
///
/// XML directories prefer the first file (by name) whose root element is an
/// act marker. Otherwise, and always for HTML, the largest candidate wins.
///
/// # Errors
/// `FileLoad` if the directory cannot be read or holds no candidate.
pub fn select_document(dir: &Path, kind: InputKind) -> Result<PathBuf> {
    let load_error = |source: std::io::Error| ParserError::FileLoad {
        path: dir.to_path_buf(),
        source,
    };

    let mut candidates: Vec<PathBuf> = fs::read_dir(dir)
        .map_err(load_error)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.is_file() && has_extension(p, kind.extensions()))
        .collect();
    candidates.sort();

    if candidates.is_empty() {
        tracing::error!(dir = %dir.display(), "No candidate document in directory");
        return Err(load_error(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!(
                "no file with extension {} in directory",
                kind.extensions().join("/")
            ),
        )));
    }

    let selected = match kind {
        InputKind::Html => largest(candidates),
        InputKind::Xml => match candidates.iter().find(|p| carries_act_marker(p)) {
            Some(marked) => {
                tracing::debug!(file = %marked.display(), "Selected document by root marker");
                marked.clone()
            }
            None => largest(candidates),
        },
    };

    tracing::info!(file = %selected.display(), "Selected document from directory");
    Ok(selected)
}

fn has_extension(path: &Path, extensions: &[&str]) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| extensions.iter().any(|c| c.eq_ignore_ascii_case(ext)))
}

fn carries_act_marker(path: &Path) -> bool {
    let root = File::open(path)
        .map_err(|err| err.to_string())
        .and_then(|file| read_root_tag(BufReader::new(file)).map_err(|err| err.to_string()));
    match root {
        Ok(root) => root.is_some_and(|tag| ACT_ROOTS.contains(&tag.local_name())),
        Err(err) => {
            tracing::warn!(file = %path.display(), error = %err, "Skipping unreadable candidate");
            false
        }
    }
}

/// Largest file; on equal size the first by name wins.
fn largest(candidates: Vec<PathBuf>) -> PathBuf {
    let mut best: Option<(PathBuf, u64)> = None;
    for path in candidates {
        let size = fs::metadata(&path).map(|m| m.len()).unwrap_or(0);
        if best.as_ref().is_none_or(|(_, best_size)| size > *best_size) {
            best = Some((path, size));
        }
    }
    tracing::debug!("Selected largest candidate");
    best.map(|(path, _)| path).unwrap_or_default()
}
