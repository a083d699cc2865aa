//! Akoma Ntoso family parser.
//!
//! Standard Akoma Ntoso 3.0, AKN4EU, German LegalDocML and Luxembourg CSD13
//! share this parser. They differ only in the [`DialectConfig`] it holds:
//! namespace table, identifier attribute and article child strategy.

use roxmltree::Node;

use crate::config::{
    ChildStrategy, DialectConfig, AKN4EU, AKOMA_NTOSO, GERMAN_LEGALDOCML, LUXEMBOURG,
};
use crate::dialects::xml::XmlState;
use crate::error::Result;
use crate::parser::{InputKind, ParserContract};
use crate::text::{join_non_empty, non_empty, normalize};
use crate::types::{Article, ArticleChild, Chapter, Citation, Conclusion, Recital};
use crate::xml::schema::XmlValidator;
use crate::xml::{element_children, get_tag_name, has_tag, inside_any, XmlDocument};

/// Elements whose content belongs to another act.
const AMENDMENT_CONTAINERS: &[&str] = &["quotedStructure", "mod"];

#[derive(Debug, Clone, Copy)]
pub struct AkomaNtosoParser {
    config: &'static DialectConfig,
}

impl AkomaNtosoParser {
    #[must_use]
    pub fn new(config: &'static DialectConfig) -> Self {
        Self { config }
    }

    #[must_use]
    pub fn standard() -> Self {
        Self::new(&AKOMA_NTOSO)
    }

    #[must_use]
    pub fn akn4eu() -> Self {
        Self::new(&AKN4EU)
    }

    #[must_use]
    pub fn german() -> Self {
        Self::new(&GERMAN_LEGALDOCML)
    }

    #[must_use]
    pub fn luxembourg() -> Self {
        Self::new(&LUXEMBOURG)
    }

    #[must_use]
    pub fn config(&self) -> &'static DialectConfig {
        self.config
    }

    fn id_or(&self, node: Node<'_, '_>, fallback: impl FnOnce() -> String) -> String {
        self.config
            .id_of(node)
            .map_or_else(fallback, ToString::to_string)
    }

    /// `p` texts of `node` joined by a space, or its whole text when it has none.
    fn paragraph_text<'a, 'input>(
        &self,
        tree: &'a XmlDocument<'input>,
        node: Node<'a, 'input>,
    ) -> Result<String> {
        let texts = tree.text_of_all(node, ".//akn:p", self.config)?;
        if texts.is_empty() {
            Ok(normalize(&tree.text(node)))
        } else {
            Ok(normalize(&texts.join(" ")))
        }
    }

    /// The formula named `preferred`, else the one `fallback` picks by index from the count.
    fn formula_text(
        &self,
        doc: &XmlState<'_>,
        preferred: &str,
        fallback: fn(usize) -> Option<usize>,
    ) -> Result<Option<String>> {
        let Some(preamble) = doc.preamble_node() else {
            return Ok(None);
        };
        let tree = &doc.tree;
        let path = format!(".//akn:formula[@name='{preferred}']");
        let formula = match tree.find(preamble, &path, self.config)? {
            Some(node) => Some(node),
            None => {
                let all = tree.find_all(preamble, ".//akn:formula", self.config)?;
                fallback(all.len()).and_then(|i| all.get(i).copied())
            }
        };
        match formula {
            Some(node) => Ok(non_empty(self.paragraph_text(tree, node)?)),
            None => Ok(None),
        }
    }

    fn children<'a, 'input>(
        &self,
        tree: &'a XmlDocument<'input>,
        article: Node<'a, 'input>,
        article_id: &str,
    ) -> Result<Vec<ArticleChild>> {
        let children = match self.config.child_strategy {
            ChildStrategy::GroupByOwner => Vec::new(),
            ChildStrategy::Paragraphs => self.paragraph_children(tree, article, article_id)?,
            ChildStrategy::Alineas => self.alinea_children(tree, article, article_id)?,
        };
        if children.is_empty() {
            self.grouped_children(tree, article, article_id)
        } else {
            Ok(children)
        }
    }

    /// `p` texts grouped by their nearest identified ancestor, plus one child per table.
    fn grouped_children<'a, 'input>(
        &self,
        tree: &'a XmlDocument<'input>,
        article: Node<'a, 'input>,
        article_id: &str,
    ) -> Result<Vec<ArticleChild>> {
        struct Group {
            position: usize,
            owner: String,
            texts: Vec<String>,
            amendment: bool,
        }

        let mut groups: Vec<Group> = Vec::new();
        for p in tree.find_all(article, ".//akn:p", self.config)? {
            if inside_any(p, Some(article), &["table"]) {
                continue;
            }
            let text = tree.text(p);
            if text.is_empty() {
                continue;
            }
            let owner = p
                .ancestors()
                .take_while(|n| *n != article)
                .find_map(|n| self.config.id_of(n))
                .unwrap_or(article_id)
                .to_string();
            let amendment = inside_any(p, Some(article), AMENDMENT_CONTAINERS);

            match groups.iter_mut().find(|g| g.owner == owner) {
                Some(group) => {
                    group.texts.push(text);
                    group.amendment |= amendment;
                }
                None => groups.push(Group {
                    position: p.range().start,
                    owner,
                    texts: vec![text],
                    amendment,
                }),
            }
        }

        let mut positioned: Vec<(usize, ArticleChild)> = groups
            .into_iter()
            .map(|g| {
                let child = ArticleChild::new(g.owner, normalize(&g.texts.join(" ")))
                    .with_amendment(g.amendment);
                (g.position, child)
            })
            .collect();

        let tables = tree.find_all(article, ".//akn:table", self.config)?;
        for (index, table) in tables.into_iter().enumerate() {
            let text = table_text(tree, table);
            if text.is_empty() {
                continue;
            }
            let e_id = self.id_or(table, || format!("{article_id}__table_{}", index + 1));
            let amendment = inside_any(table, Some(article), AMENDMENT_CONTAINERS);
            positioned.push((
                table.range().start,
                ArticleChild::new(e_id, text).with_amendment(amendment),
            ));
        }

        positioned.sort_by_key(|(position, _)| *position);
        Ok(positioned.into_iter().map(|(_, child)| child).collect())
    }

    fn paragraph_children<'a, 'input>(
        &self,
        tree: &'a XmlDocument<'input>,
        article: Node<'a, 'input>,
        article_id: &str,
    ) -> Result<Vec<ArticleChild>> {
        let mut children = Vec::new();
        for (index, paragraph) in tree
            .find_all(article, ".//akn:paragraph", self.config)?
            .into_iter()
            .enumerate()
        {
            let text = self.paragraph_text(tree, paragraph)?;
            if text.is_empty() {
                continue;
            }
            let e_id = self.id_or(paragraph, || format!("{article_id}__para_{}", index + 1));
            let amendment = inside_any(paragraph, Some(article), AMENDMENT_CONTAINERS);
            children.push(ArticleChild::new(e_id, text).with_amendment(amendment));
        }
        Ok(children)
    }

    /// One child per alinea (`content/p`), then one per list entry inside its content.
    fn alinea_children<'a, 'input>(
        &self,
        tree: &'a XmlDocument<'input>,
        article: Node<'a, 'input>,
        article_id: &str,
    ) -> Result<Vec<ArticleChild>> {
        let mut children = Vec::new();
        for (index, alinea) in tree
            .find_all(article, ".//akn:alinea", self.config)?
            .into_iter()
            .enumerate()
        {
            let alinea_id = self.id_or(alinea, || format!("{article_id}__al_{}", index + 1));
            let amendment = inside_any(alinea, Some(article), AMENDMENT_CONTAINERS);

            let text = normalize(&join_non_empty(
                tree.text_of_all(alinea, "akn:content/akn:p", self.config)?,
                " ",
            ));
            if !text.is_empty() {
                children.push(ArticleChild::new(alinea_id.clone(), text).with_amendment(amendment));
            }

            let mut entries = tree.find_all(alinea, "akn:content//akn:item", self.config)?;
            entries.extend(tree.find_all(alinea, "akn:content//akn:point", self.config)?);
            entries.sort_by_key(|n| n.range().start);

            for (position, entry) in entries.into_iter().enumerate() {
                let text = normalize(&tree.text(entry));
                if text.is_empty() {
                    continue;
                }
                let e_id = self.id_or(entry, || format!("{alinea_id}__item_{}", position + 1));
                children.push(ArticleChild::new(e_id, text).with_amendment(amendment));
            }
        }
        Ok(children)
    }
}

/// Table rows as `c1 | c2`, one line per row.
fn table_text<'a, 'input>(tree: &'a XmlDocument<'input>, table: Node<'a, 'input>) -> String {
    let rows = table
        .descendants()
        .filter(|n| has_tag(*n, "tr") && !tree.is_pruned(*n))
        .map(|row| {
            let cells = element_children(row)
                .filter(|c| matches!(get_tag_name(*c), "td" | "th"))
                .map(|c| normalize(&tree.text(c)))
                .collect::<Vec<_>>();
            join_non_empty(cells, " | ")
        });
    join_non_empty(rows, "\n")
}

impl ParserContract for AkomaNtosoParser {
    type Doc<'src> = XmlState<'src>;

    fn name(&self) -> &'static str {
        self.config.key
    }

    fn input_kind(&self) -> InputKind {
        InputKind::Xml
    }

    fn load_root<'src>(&self, source: &'src str) -> Result<Self::Doc<'src>> {
        XmlState::load(source)
    }

    fn validates_schema(&self) -> bool {
        self.config.validate_schema
    }

    fn validate(&self, doc: &Self::Doc<'_>, schema: &XmlValidator) -> Result<()> {
        schema.validate(doc.tree.document())
    }

    fn preface(&self, doc: &Self::Doc<'_>) -> Result<Option<String>> {
        let tree = &doc.tree;
        let Some(preface) = tree.find(tree.root(), ".//akn:preface", self.config)? else {
            tracing::debug!(dialect = self.config.key, "No preface");
            return Ok(None);
        };
        let texts = tree.text_of_all(preface, ".//akn:p", self.config)?;
        Ok(non_empty(normalize(&texts.join(" "))))
    }

    fn preamble(&self, doc: &mut Self::Doc<'_>) -> Result<()> {
        let found = doc
            .tree
            .find(doc.tree.root(), ".//akn:preamble", self.config)?
            .map(|n| n.id());
        if let Some(id) = found {
            doc.tree
                .remove(id, ".//akn:authorialNote", self.config, true)?;
        } else {
            tracing::debug!(dialect = self.config.key, "No preamble");
        }
        doc.preamble = found;
        Ok(())
    }

    fn formula(&self, doc: &Self::Doc<'_>) -> Result<Option<String>> {
        self.formula_text(doc, "actingEntity", |count| (count > 0).then_some(0))
    }

    fn citations(&self, doc: &Self::Doc<'_>) -> Result<Vec<Citation>> {
        let Some(preamble) = doc.preamble_node() else {
            return Ok(Vec::new());
        };
        let tree = &doc.tree;
        Ok(tree
            .find_all(preamble, ".//akn:citation", self.config)?
            .into_iter()
            .enumerate()
            .map(|(index, citation)| {
                let e_id = self.id_or(citation, || index.to_string());
                Citation::new(e_id, normalize(&tree.text(citation)))
            })
            .collect())
    }

    fn recitals(&self, doc: &Self::Doc<'_>) -> Result<Vec<Recital>> {
        let Some(preamble) = doc.preamble_node() else {
            return Ok(Vec::new());
        };
        let tree = &doc.tree;
        let mut recitals = Vec::new();
        for (index, recital) in tree
            .find_all(preamble, ".//akn:recital", self.config)?
            .into_iter()
            .enumerate()
        {
            let e_id = self.id_or(recital, || index.to_string());
            let texts = tree.text_of_all(recital, ".//akn:p", self.config)?;
            recitals.push(Recital::new(e_id, normalize(&texts.join(" "))));
        }
        Ok(recitals)
    }

    fn preamble_final(&self, doc: &Self::Doc<'_>) -> Result<Option<String>> {
        self.formula_text(doc, "enactingFormula", |count| {
            (count >= 2).then(|| count - 1)
        })
    }

    fn body(&self, doc: &mut Self::Doc<'_>) -> Result<()> {
        let root = doc.tree.root();
        let found = match doc.tree.find(root, ".//akn:body", self.config)? {
            Some(node) => Some(node.id()),
            None => {
                tracing::info!(
                    dialect = self.config.key,
                    "Namespaced body not found, trying unqualified body"
                );
                doc.tree.find(root, ".//body", self.config)?.map(|n| n.id())
            }
        };
        if let Some(id) = found {
            doc.tree
                .remove(id, ".//akn:authorialNote", self.config, true)?;
        }
        doc.body = found;
        Ok(())
    }

    fn chapters(&self, doc: &Self::Doc<'_>) -> Result<Vec<Chapter>> {
        let body = doc.require_body()?;
        let tree = &doc.tree;
        let mut chapters = Vec::new();
        for (index, chapter) in tree
            .find_all(body, ".//akn:chapter", self.config)?
            .into_iter()
            .enumerate()
        {
            let e_id = self.id_or(chapter, || index.to_string());
            if e_id.contains(self.config.nesting_separator) {
                continue;
            }
            let child_text = |path: &str| -> Result<Option<String>> {
                Ok(tree
                    .find(chapter, path, self.config)?
                    .and_then(|n| non_empty(normalize(&tree.text(n)))))
            };
            chapters.push(Chapter {
                e_id,
                num: child_text("akn:num")?,
                heading: child_text("akn:heading")?,
            });
        }
        Ok(chapters)
    }

    fn articles(&self, doc: &Self::Doc<'_>) -> Result<Vec<Article>> {
        let body = doc.require_body()?;
        let tree = &doc.tree;
        let mut articles = Vec::new();

        let candidates = tree
            .find_all(body, ".//akn:article", self.config)?
            .into_iter()
            .filter(|a| !inside_any(*a, Some(body), AMENDMENT_CONTAINERS));

        for (index, node) in candidates.enumerate() {
            let e_id = self.id_or(node, || format!("art_{index}"));
            let mut article = Article::new(e_id.clone());
            article.num = tree
                .find(node, "akn:num", self.config)?
                .and_then(|n| non_empty(normalize(&tree.text(n))));
            article.heading = tree
                .find(node, "akn:heading", self.config)?
                .and_then(|n| non_empty(normalize(&tree.text(n))));
            article.children = self.children(tree, node, &e_id)?;
            articles.push(article);
        }
        Ok(articles)
    }

    fn conclusions(&self, doc: &Self::Doc<'_>) -> Result<Option<Conclusion>> {
        let tree = &doc.tree;
        let Some(conclusions) = tree.find(tree.root(), ".//akn:conclusions", self.config)? else {
            return Ok(None);
        };

        let date = tree
            .find(conclusions, ".//akn:date", self.config)?
            .and_then(|n| non_empty(normalize(&tree.text(n))));

        let mut blocks = tree.find_all(conclusions, ".//akn:signature", self.config)?;
        blocks.extend(
            tree.find_all(conclusions, ".//akn:p", self.config)?
                .into_iter()
                .filter(|p| {
                    !inside_any(*p, Some(conclusions), &["signature"])
                        && !p.descendants().any(|d| has_tag(d, "signature"))
                }),
        );
        blocks.sort_by_key(|n| n.range().start);

        let signatures = blocks
            .into_iter()
            .filter_map(|block| {
                let lines: Vec<String> = if has_tag(block, "signature") {
                    element_children(block)
                        .filter(|c| !tree.is_pruned(*c))
                        .map(|c| normalize(&tree.text(c)))
                        .filter(|t| !t.is_empty())
                        .collect()
                } else {
                    non_empty(normalize(&tree.text(block))).into_iter().collect()
                };
                (!lines.is_empty()).then_some(lines)
            })
            .collect();

        Ok(Some(Conclusion::Blocks { date, signatures }))
    }
}
