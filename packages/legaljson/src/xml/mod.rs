//! XML tree access for the dialect parsers.
//!
//! [`XmlDocument`] wraps a roxmltree document. roxmltree trees are
//! read-only, so removal is recorded in a prune set that every query and
//! text operation honours.

pub mod query;
pub mod schema;
mod utils;

use std::collections::HashSet;

use roxmltree::{Document, Node, NodeId, ParsingOptions};

use crate::config::DialectConfig;
use crate::error::{ParserError, Result};
use query::Query;

pub use utils::{
    element_children, find_by_path, find_child, find_children, get_tag_name, get_text, has_tag,
    inside_any,
};

/// A parsed XML document with removable nodes.
pub struct XmlDocument<'input> {
    doc: Document<'input>,
    pruned: HashSet<NodeId>,
}

impl<'input> XmlDocument<'input> {
    /// Parse `source`. DTDs are allowed since Formex and BOE files declare one.
    pub fn parse(source: &'input str) -> Result<Self> {
        let options = ParsingOptions {
            allow_dtd: true,
            ..ParsingOptions::default()
        };
        let doc = Document::parse_with_options(source, options)?;
        Ok(Self {
            doc,
            pruned: HashSet::new(),
        })
    }

    /// The underlying tree.
    #[must_use]
    pub fn document(&self) -> &Document<'input> {
        &self.doc
    }

    /// The root element.
    #[must_use]
    pub fn root(&self) -> Node<'_, 'input> {
        self.doc.root_element()
    }

    /// Look up a node by id.
    #[must_use]
    pub fn get(&self, id: NodeId) -> Option<Node<'_, 'input>> {
        self.doc.get_node(id)
    }

    /// 1-based line of a node in the source.
    #[must_use]
    pub fn line_of(&self, node: Node<'_, 'input>) -> u32 {
        self.doc.text_pos_at(node.range().start).row
    }

    /// Whether `node` or one of its ancestors was removed.
    #[must_use]
    pub fn is_pruned(&self, node: Node<'_, 'input>) -> bool {
        node.ancestors().any(|n| self.pruned.contains(&n.id()))
    }

    /// First match of `path` below `scope`.
    pub fn find<'a>(
        &'a self,
        scope: Node<'a, 'input>,
        path: &str,
        config: &DialectConfig,
    ) -> Result<Option<Node<'a, 'input>>> {
        Ok(self.find_all(scope, path, config)?.into_iter().next())
    }

    /// All matches of `path` below `scope`, in document order.
    pub fn find_all<'a>(
        &'a self,
        scope: Node<'a, 'input>,
        path: &str,
        config: &DialectConfig,
    ) -> Result<Vec<Node<'a, 'input>>> {
        let query = Query::parse(path, config)?;
        Ok(query
            .select(scope)
            .into_iter()
            .filter(|n| !self.is_pruned(*n))
            .collect())
    }

    /// Trimmed concatenation of all text below `node`.
    #[must_use]
    pub fn text(&self, node: Node<'_, 'input>) -> String {
        self.text_with(node, &|_| None).trim().to_string()
    }

    /// Concatenation of all text below `node`, untrimmed.
    ///
    /// Elements for which `substitute` returns a value contribute that value
    /// instead of their content.
    #[must_use]
    pub fn text_with(
        &self,
        node: Node<'_, 'input>,
        substitute: &dyn Fn(Node<'_, 'input>) -> Option<&'static str>,
    ) -> String {
        let mut out = String::new();
        self.collect_text(node, substitute, &mut out);
        out
    }

    fn collect_text(
        &self,
        node: Node<'_, 'input>,
        substitute: &dyn Fn(Node<'_, 'input>) -> Option<&'static str>,
        out: &mut String,
    ) {
        for child in node.children() {
            if self.pruned.contains(&child.id()) {
                continue;
            }
            if child.is_text() {
                out.push_str(child.text().unwrap_or_default());
            } else if child.is_element() {
                match substitute(child) {
                    Some(replacement) => out.push_str(replacement),
                    None => self.collect_text(child, substitute, out),
                }
            }
        }
    }

    /// Text of every match of `path`, skipping empty results.
    pub fn text_of_all(
        &self,
        scope: Node<'_, 'input>,
        path: &str,
        config: &DialectConfig,
    ) -> Result<Vec<String>> {
        Ok(self
            .find_all(scope, path, config)?
            .into_iter()
            .map(|n| self.text(n))
            .filter(|t| !t.is_empty())
            .collect())
    }

    /// Remove every match of `path` below `scope`.
    ///
    /// With `preserve_tail` the text following a removed element stays in
    /// place, so removing an inline note keeps the sentence around it.
    /// Without it that text goes too. Returns the number of removed elements.
    pub fn remove(
        &mut self,
        scope: NodeId,
        path: &str,
        config: &DialectConfig,
        preserve_tail: bool,
    ) -> Result<usize> {
        let scope_node = self.doc.get_node(scope).ok_or_else(|| {
            ParserError::ParserConfiguration(format!("Unknown scope node for '{path}'"))
        })?;
        let matches = Query::parse(path, config)?.select(scope_node);
        let count = matches.len();

        let mut removed = Vec::with_capacity(count * 2);
        for node in matches {
            removed.push(node.id());
            if !preserve_tail {
                if let Some(tail) = node.next_sibling().filter(|s| s.is_text()) {
                    removed.push(tail.id());
                }
            }
        }
        self.pruned.extend(removed);

        Ok(count)
    }
}
