//! Formex 4 parser (EU Publications Office).
//!
//! Formex carries no element identifiers worth keeping, so citations,
//! recitals and chapters get synthesized ids and article children are
//! renumbered after extraction.

use std::sync::LazyLock;

use regex::Regex;
use roxmltree::Node;

use crate::config::{DialectConfig, FORMEX};
use crate::dialects::xml::XmlState;
use crate::error::Result;
use crate::parser::{InputKind, ParserContract};
use crate::text::{non_empty, normalize, strip_control};
use crate::types::{
    renumber_articles, Article, ArticleChild, Chapter, Citation, Conclusion, LegalDocument,
    Recital, Signature,
};
use crate::xml::schema::XmlValidator;
use crate::xml::{get_tag_name, get_text, inside_any, XmlDocument};

/// A preface naming only an annex (`ANNEX IV`, `ANNEX II Part`) marks an annex file.
#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static ANNEX_PREFACE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^ANNEX\s+[IVXLCDM0-9]+(\s+\S+)?$").expect("valid regex")
});

/// Article title elements, excluded from child text.
const ARTICLE_TITLES: &[&str] = &["TI.ART", "STI.ART"];

#[derive(Debug, Clone, Copy, Default)]
pub struct FormexParser;

impl FormexParser {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    fn config(&self) -> &'static DialectConfig {
        &FORMEX
    }

    fn first_text<'a, 'input>(
        &self,
        tree: &'a XmlDocument<'input>,
        scope: Node<'a, 'input>,
        path: &str,
    ) -> Result<Option<String>> {
        Ok(tree
            .find(scope, path, self.config())?
            .and_then(|n| non_empty(normalize(&tree.text(n)))))
    }

    /// Child text with inline quotes rendered as `'` and control characters removed.
    fn child_text<'a, 'input>(&self, tree: &'a XmlDocument<'input>, node: Node<'a, 'input>) -> String {
        let raw = tree.text_with(node, &|n| {
            let tag = get_tag_name(n);
            if tag == "QUOT.START" || tag == "QUOT.END" {
                Some("'")
            } else if ARTICLE_TITLES.contains(&tag) {
                Some("")
            } else {
                None
            }
        });
        strip_control(&raw)
    }

    fn push_children<'a, 'input>(
        &self,
        tree: &'a XmlDocument<'input>,
        nodes: impl IntoIterator<Item = Node<'a, 'input>>,
        start_index: usize,
        children: &mut Vec<ArticleChild>,
    ) {
        for (offset, node) in nodes.into_iter().enumerate() {
            let text = self.child_text(tree, node);
            if text.is_empty() || text == ";" {
                continue;
            }
            let e_id = ["IDENTIFIER", "ID", "NO.P"]
                .iter()
                .find_map(|attr| node.attribute(*attr))
                .map_or_else(
                    || format!("{:03}", start_index + offset),
                    ToString::to_string,
                );
            children.push(ArticleChild::new(e_id, text).with_amendment(false));
        }
    }

    /// Children in order of preference: `PARAG`, `ALINEA`, `P`, raw text.
    fn article_children<'a, 'input>(
        &self,
        tree: &'a XmlDocument<'input>,
        article: Node<'a, 'input>,
    ) -> Result<Vec<ArticleChild>> {
        let config = self.config();
        let mut children = Vec::new();

        let parags = tree.find_all(article, ".//PARAG", config)?;
        if !parags.is_empty() {
            self.push_children(tree, parags, 0, &mut children);
            return Ok(children);
        }

        let alineas = tree.find_all(article, ".//ALINEA", config)?;
        if !alineas.is_empty() {
            for alinea in alineas {
                let paragraphs: Vec<_> = tree
                    .find_all(alinea, ".//P", config)?
                    .into_iter()
                    .filter(|p| !inside_any(*p, Some(alinea), &["LIST"]))
                    .collect();
                let paragraph_count = paragraphs.len();
                self.push_children(tree, paragraphs, 0, &mut children);

                let items = tree.find_all(alinea, ".//LIST//ITEM", config)?;
                let item_count = items.len();
                self.push_children(tree, items, paragraph_count, &mut children);

                if paragraph_count == 0 && item_count == 0 {
                    self.push_children(tree, [alinea], 0, &mut children);
                }
            }
            return Ok(children);
        }

        let paragraphs: Vec<_> = tree
            .find_all(article, ".//P", config)?
            .into_iter()
            .filter(|p| !inside_any(*p, Some(article), ARTICLE_TITLES))
            .collect();
        if !paragraphs.is_empty() {
            self.push_children(tree, paragraphs, 0, &mut children);
            return Ok(children);
        }

        self.push_children(tree, [article], 0, &mut children);
        Ok(children)
    }
}

impl ParserContract for FormexParser {
    type Doc<'src> = XmlState<'src>;

    fn name(&self) -> &'static str {
        FORMEX.key
    }

    fn input_kind(&self) -> InputKind {
        InputKind::Xml
    }

    fn load_root<'src>(&self, source: &'src str) -> Result<Self::Doc<'src>> {
        XmlState::load(source)
    }

    fn validates_schema(&self) -> bool {
        FORMEX.validate_schema
    }

    fn validate(&self, doc: &Self::Doc<'_>, schema: &XmlValidator) -> Result<()> {
        schema.validate(doc.tree.document())
    }

    fn preface(&self, doc: &Self::Doc<'_>) -> Result<Option<String>> {
        let tree = &doc.tree;
        let Some(title) = tree.find(tree.root(), ".//TITLE", self.config())? else {
            return Ok(None);
        };
        let texts = tree.text_of_all(title, ".//P", self.config())?;
        Ok(non_empty(normalize(&texts.join(" "))))
    }

    fn preamble(&self, doc: &mut Self::Doc<'_>) -> Result<()> {
        let found = doc
            .tree
            .find(doc.tree.root(), ".//PREAMBLE", self.config())?
            .map(|n| n.id());
        if let Some(id) = found {
            let removed = doc.tree.remove(id, ".//NOTE", self.config(), true)?;
            tracing::debug!(removed, "Removed notes from preamble");
        }
        doc.preamble = found;
        Ok(())
    }

    fn formula(&self, doc: &Self::Doc<'_>) -> Result<Option<String>> {
        match doc.preamble_node() {
            Some(preamble) => self.first_text(&doc.tree, preamble, "PREAMBLE.INIT"),
            None => Ok(None),
        }
    }

    fn citations(&self, doc: &Self::Doc<'_>) -> Result<Vec<Citation>> {
        let Some(preamble) = doc.preamble_node() else {
            return Ok(Vec::new());
        };
        let tree = &doc.tree;
        Ok(tree
            .find_all(preamble, ".//GR.VISA//VISA", self.config())?
            .into_iter()
            .enumerate()
            .map(|(index, visa)| {
                Citation::new(format!("cit_{}", index + 1), normalize(&tree.text(visa)))
            })
            .collect())
    }

    fn recitals(&self, doc: &Self::Doc<'_>) -> Result<Vec<Recital>> {
        let Some(preamble) = doc.preamble_node() else {
            return Ok(Vec::new());
        };
        let tree = &doc.tree;
        let Some(section) = tree.find(preamble, ".//GR.CONSID", self.config())? else {
            return Ok(Vec::new());
        };

        if let Some(intro) = self.first_text(tree, section, ".//GR.CONSID.INIT")? {
            tracing::debug!(e_id = "rct_0", text = %intro, "Recital introduction");
        }

        let mut recitals = Vec::new();
        for (index, consid) in tree
            .find_all(section, ".//CONSID", self.config())?
            .into_iter()
            .enumerate()
        {
            let texts = tree.text_of_all(consid, ".//TXT", self.config())?;
            recitals.push(Recital::new(
                format!("rct_{}", index + 1),
                normalize(&texts.join(" ")),
            ));
        }
        Ok(recitals)
    }

    fn preamble_final(&self, doc: &Self::Doc<'_>) -> Result<Option<String>> {
        match doc.preamble_node() {
            Some(preamble) => self.first_text(&doc.tree, preamble, ".//PREAMBLE.FINAL"),
            None => Ok(None),
        }
    }

    fn body(&self, doc: &mut Self::Doc<'_>) -> Result<()> {
        let found = doc
            .tree
            .find(doc.tree.root(), ".//ENACTING.TERMS", self.config())?
            .map(|n| n.id());
        match found {
            Some(id) => {
                doc.tree.remove(id, ".//NOTE", self.config(), true)?;
            }
            None => tracing::warn!("No enacting terms found"),
        }
        doc.body = found;
        Ok(())
    }

    fn chapters(&self, doc: &Self::Doc<'_>) -> Result<Vec<Chapter>> {
        let body = doc.require_body()?;
        let tree = &doc.tree;
        let mut chapters = Vec::new();
        for title in tree.find_all(body, ".//TITLE", self.config())? {
            let headings = tree.find_all(title, ".//HT", self.config())?;
            if headings.len() < 2 {
                continue;
            }
            chapters.push(Chapter {
                e_id: format!("cpt_{}", chapters.len() + 1),
                num: non_empty(normalize(&tree.text(headings[0]))),
                heading: non_empty(normalize(&tree.text(headings[1]))),
            });
        }
        Ok(chapters)
    }

    fn articles(&self, doc: &Self::Doc<'_>) -> Result<Vec<Article>> {
        let body = doc.require_body()?;
        let tree = &doc.tree;
        let mut articles = Vec::new();
        for (index, node) in tree
            .find_all(body, ".//ARTICLE", self.config())?
            .into_iter()
            .enumerate()
        {
            let e_id = match node.attribute("IDENTIFIER") {
                Some(identifier) => format!("art_{identifier}"),
                None => format!("art_{}", index + 1),
            };
            let mut article = Article::new(e_id);
            article.num = self.first_text(tree, node, "TI.ART")?;
            article.heading = self.first_text(tree, node, "STI.ART")?;
            article.children = self.article_children(tree, node)?;
            articles.push(article);
        }
        renumber_articles(&mut articles);
        Ok(articles)
    }

    fn conclusions(&self, doc: &Self::Doc<'_>) -> Result<Option<Conclusion>> {
        let tree = &doc.tree;
        let config = self.config();
        let Some(final_section) = tree.find(tree.root(), ".//FINAL", config)? else {
            return Ok(None);
        };

        let conclusion_text = self
            .first_text(tree, final_section, ".//P")?
            .unwrap_or_default();

        let signature = match tree.find(final_section, ".//SIGNATURE", config)? {
            Some(block) => Some(Signature {
                place: tree
                    .find(block, ".//PL.DATE/P", config)?
                    .and_then(|p| non_empty(get_text(p))),
                date: tree
                    .find(block, ".//PL.DATE/P/DATE", config)?
                    .and_then(|d| d.text())
                    .map(ToString::to_string),
                signatory: self.first_text(tree, block, ".//SIGNATORY/P/HT")?,
                title: self.first_text(tree, block, ".//SIGNATORY/P[2]/HT")?,
            }),
            None => None,
        };

        Ok(Some(Conclusion::Text {
            conclusion_text,
            signature,
        }))
    }

    fn finalize(&self, document: &mut LegalDocument) {
        let is_annex = document
            .preface
            .as_deref()
            .is_some_and(|p| ANNEX_PREFACE.is_match(p));
        if is_annex && !document.articles.is_empty() {
            tracing::info!(
                articles = document.articles.len(),
                "Annex document, dropping articles"
            );
            document.articles.clear();
        }
    }
}
