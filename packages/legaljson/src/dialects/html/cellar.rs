//! Semantic EUR-Lex portal HTML.
//!
//! Structure is carried by element ids: `pbl_1` is the preamble, `cit_*`,
//! `rct_*`, `cpt_*` and `art_*` mark citations, recitals, chapters and
//! articles, and a `.` in an id marks a nested subdivision.

use std::sync::LazyLock;

use regex::Regex;
use scraper::{ElementRef, Html};

use crate::error::Result;
use crate::html::{
    child_elements, has_any_class, parse_document, selector, tag_name, text_without,
};
use crate::parser::{InputKind, ParserContract};
use crate::text::{join_non_empty, non_empty, normalize_quotes};
use crate::types::{
    renumber_articles, Article, ArticleChild, Chapter, Citation, Conclusion, Recital,
};

#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static RECITAL_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\(\d+\)\s*").expect("valid regex"));

const ARTICLE_TITLE: &[&str] = &["oj-ti-art", "title-article-norm"];
const ARTICLE_SUBTITLE: &[&str] = &["oj-sti-art", "stitle-article-norm"];

/// Where the enacting terms were found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BodyScope {
    Enacting,
    Container,
    Document,
}

pub struct CellarDoc {
    html: Html,
    body: BodyScope,
}

impl CellarDoc {
    fn preamble(&self) -> Option<ElementRef<'_>> {
        self.html.select(selector!("div#pbl_1")).next()
    }

    /// The preamble, or the whole document when there is none.
    fn preamble_or_root(&self) -> ElementRef<'_> {
        self.preamble().unwrap_or_else(|| self.html.root_element())
    }

    fn body_element(&self) -> ElementRef<'_> {
        let found = match self.body {
            BodyScope::Enacting => self.html.select(selector!(r#"div[id^="enc_"]"#)).next(),
            BodyScope::Container => self.html.select(selector!(".eli-container")).next(),
            BodyScope::Document => None,
        };
        found.unwrap_or_else(|| self.html.root_element())
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct CellarParser;

impl CellarParser {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

/// Anchors pointing inside the document are note references.
fn is_note_anchor(element: ElementRef<'_>) -> bool {
    tag_name(element) == "a"
        && element
            .value()
            .attr("href")
            .is_some_and(|href| href.starts_with('#'))
}

fn clean(element: ElementRef<'_>) -> String {
    normalize_quotes(&text_without(element, &is_note_anchor))
}

fn is_top_level(id: &str) -> bool {
    !id.contains('.')
}

/// Text of a subdivision: its paragraphs joined, or its whole text.
fn subdivision_text(element: ElementRef<'_>) -> String {
    let paragraphs: Vec<String> = element.select(selector!("p")).map(clean).collect();
    let joined = join_non_empty(paragraphs, " ");
    if joined.is_empty() {
        clean(element)
    } else {
        joined
    }
}

fn contains_blocks(element: ElementRef<'_>) -> bool {
    element.select(selector!("p, div, table")).next().is_some()
}

/// Article children in document order.
fn collect_children(element: ElementRef<'_>, out: &mut Vec<String>) {
    for child in child_elements(element) {
        match tag_name(child) {
            "p" => {
                if !has_any_class(child, ARTICLE_TITLE) && !has_any_class(child, ARTICLE_SUBTITLE) {
                    out.push(clean(child));
                }
            }
            "table" => {
                for row in child.select(selector!("tr")) {
                    let cells: Vec<String> = child_elements(row)
                        .filter(|c| tag_name(*c) == "td")
                        .map(clean)
                        .collect();
                    if cells.len() >= 2 {
                        out.push(join_non_empty(&cells[..2], " "));
                    }
                }
            }
            _ if child.value().id().is_some() => out.push(subdivision_text(child)),
            _ if contains_blocks(child) => collect_children(child, out),
            _ => out.push(clean(child)),
        }
    }
}

impl ParserContract for CellarParser {
    type Doc<'src> = CellarDoc;

    fn name(&self) -> &'static str {
        "cellar"
    }

    fn input_kind(&self) -> InputKind {
        InputKind::Html
    }

    fn load_root<'src>(&self, source: &'src str) -> Result<Self::Doc<'src>> {
        Ok(CellarDoc {
            html: parse_document(source),
            body: BodyScope::Document,
        })
    }

    fn preface(&self, doc: &Self::Doc<'_>) -> Result<Option<String>> {
        Ok(doc
            .html
            .select(selector!("div.eli-main-title"))
            .next()
            .and_then(|e| non_empty(subdivision_text(e))))
    }

    fn formula(&self, doc: &Self::Doc<'_>) -> Result<Option<String>> {
        Ok(doc
            .preamble()
            .and_then(|p| p.select(selector!("p.oj-normal")).next())
            .and_then(|e| non_empty(clean(e))))
    }

    fn citations(&self, doc: &Self::Doc<'_>) -> Result<Vec<Citation>> {
        Ok(doc
            .preamble_or_root()
            .select(selector!(r#"div[id^="cit_"]"#))
            .filter_map(|e| {
                let id = e.value().id()?;
                Some(Citation::new(id, clean(e)))
            })
            .collect())
    }

    fn recitals(&self, doc: &Self::Doc<'_>) -> Result<Vec<Recital>> {
        Ok(doc
            .preamble_or_root()
            .select(selector!(r#"div[id^="rct_"]"#))
            .filter_map(|e| {
                let id = e.value().id()?;
                let text = clean(e);
                Some(Recital::new(id, RECITAL_NUMBER.replace(&text, "").into_owned()))
            })
            .collect())
    }

    fn preamble_final(&self, doc: &Self::Doc<'_>) -> Result<Option<String>> {
        Ok(doc
            .preamble()
            .and_then(|p| p.select(selector!("p.oj-normal")).last())
            .and_then(|e| non_empty(clean(e))))
    }

    fn body(&self, doc: &mut Self::Doc<'_>) -> Result<()> {
        doc.body = if doc.html.select(selector!(r#"div[id^="enc_"]"#)).next().is_some() {
            BodyScope::Enacting
        } else if doc.html.select(selector!(".eli-container")).next().is_some() {
            tracing::info!("No enacting terms division, using the ELI container");
            BodyScope::Container
        } else {
            tracing::info!("No enacting terms division or ELI container, using the whole document");
            BodyScope::Document
        };
        Ok(())
    }

    fn chapters(&self, doc: &Self::Doc<'_>) -> Result<Vec<Chapter>> {
        Ok(doc
            .body_element()
            .select(selector!(r#"div[id^="cpt_"]"#))
            .filter_map(|chapter| {
                let id = chapter.value().id().filter(|id| is_top_level(id))?;
                Some(Chapter {
                    e_id: id.to_string(),
                    num: chapter
                        .select(selector!("p.oj-ti-section-1"))
                        .next()
                        .and_then(|e| non_empty(clean(e))),
                    heading: chapter
                        .select(selector!("div.eli-title"))
                        .next()
                        .and_then(|e| non_empty(clean(e))),
                })
            })
            .collect())
    }

    fn articles(&self, doc: &Self::Doc<'_>) -> Result<Vec<Article>> {
        let mut articles = Vec::new();
        for node in doc
            .body_element()
            .select(selector!(r#"div[id^="art_"], div#art"#))
        {
            let Some(id) = node.value().id().filter(|id| is_top_level(id)) else {
                continue;
            };
            let Some(title) = node
                .select(selector!("p.oj-ti-art, p.title-article-norm"))
                .next()
            else {
                tracing::warn!(article = id, "Article without title, skipping");
                continue;
            };

            let mut article = Article::new(id);
            article.num = non_empty(clean(title));
            article.heading = node
                .select(selector!("p.oj-sti-art, p.stitle-article-norm"))
                .next()
                .and_then(|e| non_empty(clean(e)));

            let mut texts = Vec::new();
            collect_children(node, &mut texts);
            article.children = texts
                .into_iter()
                .filter(|t| !t.is_empty())
                .enumerate()
                .map(|(index, text)| ArticleChild::new(format!("{id}.{:03}", index + 1), text))
                .collect();
            articles.push(article);
        }
        renumber_articles(&mut articles);
        Ok(articles)
    }

    fn conclusions(&self, doc: &Self::Doc<'_>) -> Result<Option<Conclusion>> {
        Ok(doc
            .html
            .select(selector!("div.oj-final"))
            .next()
            .map(|e| Conclusion::text(clean(e))))
    }
}
