//! XML dialects.

pub mod akomantoso;
pub mod boe;
pub mod formex;

use roxmltree::{Node, NodeId};

use crate::error::{ParserError, Result};
use crate::xml::XmlDocument;

pub use akomantoso::AkomaNtosoParser;
pub use boe::BoeParser;
pub use formex::FormexParser;

/// Loaded XML tree plus the anchors located by the preamble and body steps.
pub struct XmlState<'input> {
    pub tree: XmlDocument<'input>,
    pub preamble: Option<NodeId>,
    pub body: Option<NodeId>,
}

impl<'input> XmlState<'input> {
    pub fn load(source: &'input str) -> Result<Self> {
        Ok(Self {
            tree: XmlDocument::parse(source)?,
            preamble: None,
            body: None,
        })
    }

    #[must_use]
    pub fn preamble_node(&self) -> Option<Node<'_, 'input>> {
        self.preamble.and_then(|id| self.tree.get(id))
    }

    #[must_use]
    pub fn body_node(&self) -> Option<Node<'_, 'input>> {
        self.body.and_then(|id| self.tree.get(id))
    }

    /// The body located by the body step.
    ///
    /// # Errors
    /// `ElementNotFound` when the body step found nothing.
    pub fn require_body(&self) -> Result<Node<'_, 'input>> {
        self.body_node()
            .ok_or_else(|| ParserError::element_not_found("body"))
    }
}
