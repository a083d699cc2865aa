//! Plain EUR-Lex portal HTML.
//!
//! Older acts wrap their text in a `TXT_TE` element holding flat `p` and
//! `table` children with no semantic markup, so every section is found by
//! matching the wording of its paragraphs. Consolidated versions have no
//! `TXT_TE` at all; there the article headings are recognised by their
//! inline style.

use std::sync::LazyLock;

use regex::Regex;
use scraper::{ElementRef, Html};

use crate::config::{CONCLUSION_SEARCH_WINDOW, HEADING_MAX_LEN};
use crate::error::{ParserError, Result};
use crate::html::{child_elements, element_text, parse_document, selector, table_rows, tag_name};
use crate::parser::{InputKind, ParserContract};
use crate::text::{clean_legacy, non_empty};
use crate::types::{Article, ArticleChild, Citation, Conclusion, Recital};

#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static ARTICLE_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^Article\s+(\d+)\s*(.*)$").expect("valid regex"));

#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static FORMULA: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(THE (COUNCIL|COMMISSION|EUROPEAN PARLIAMENT)|HAS ADOPTED)")
        .expect("valid regex")
});

#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static PREAMBLE_FINAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^HAS (ADOPTED|DECIDED)").expect("valid regex"));

#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static TABLE_RECITAL_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\(?(\d+)\)?$").expect("valid regex"));

#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static NUMBERED_RECITAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\((\d+)\)\s*(.+)$").expect("valid regex"));

#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static RECITALS_END: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^(HAS ADOPTED|HAS DECIDED|Article)").expect("valid regex"));

#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static SIGNATURE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"(?i)^(Done at",
        r"|For the (Commission|Council|European Parliament)",
        r"|Member of the Commission",
        r"|President of the (Council|Commission|European Parliament)",
        r"|The President",
        r"|Brussels,)"
    ))
    .expect("valid regex")
});

#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static FOOTNOTE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\(\d+\)\s+OJ\s+[A-Z]").expect("valid regex"));

#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static DONE_AT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^Done at").expect("valid regex"));

#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static POINT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*(\([a-z]\)|\([ivxlcdm]+\))\s+").expect("valid regex")
});

pub struct StandardDoc {
    html: Html,
    /// No `TXT_TE` wrapper; the text sits directly in `body`.
    consolidated: bool,
}

impl StandardDoc {
    fn container(&self) -> ElementRef<'_> {
        let found = if self.consolidated {
            self.html.select(selector!("body")).next()
        } else {
            self.html.select(selector!("txt_te")).next()
        };
        found.unwrap_or_else(|| self.html.root_element())
    }

    /// Every paragraph in the container, nested ones included.
    fn paragraphs(&self) -> Vec<ElementRef<'_>> {
        self.container().select(selector!("p")).collect()
    }

    fn paragraph_texts(&self) -> impl Iterator<Item = String> + '_ {
        self.paragraphs().into_iter().map(clean)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct CellarStandardParser;

impl CellarStandardParser {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

fn clean(element: ElementRef<'_>) -> String {
    clean_legacy(&element_text(element))
}

fn style(element: ElementRef<'_>) -> &str {
    element.value().attr("style").unwrap_or("")
}

/// Text after which nothing belongs to the enacting terms.
fn ends_articles(text: &str) -> bool {
    !text.is_empty() && (SIGNATURE.is_match(text) || FOOTNOTE.is_match(text))
}

fn table_text(table: ElementRef<'_>) -> Option<String> {
    let rows: Vec<String> = table_rows(table, clean_legacy)
        .into_iter()
        .filter(|cells| cells.iter().any(|c| !c.is_empty()))
        .map(|cells| cells.join(" | "))
        .collect();
    non_empty(rows.join("\n"))
}

/// An article whose paragraphs are still being collected.
struct OpenArticle {
    article: Article,
    paragraphs: Vec<String>,
}

impl OpenArticle {
    fn new(number: &str) -> Self {
        let mut article = Article::new(format!("art_{number}"));
        article.num = Some(format!("Article {number}"));
        Self {
            article,
            paragraphs: Vec::new(),
        }
    }

    /// Promote a title-like first paragraph to the heading, then merge each
    /// run of consecutive lettered or roman points into one child.
    fn close(self) -> Article {
        let Self {
            mut article,
            mut paragraphs,
        } = self;

        if article.heading.is_none() {
            if let Some(first) = paragraphs.first() {
                let is_title = first.chars().count() < HEADING_MAX_LEN
                    && !first.ends_with(['.', '!', '?']);
                if is_title {
                    article.heading = Some(paragraphs.remove(0));
                }
            }
        }

        // (is a run of points, lines)
        let mut groups: Vec<(bool, Vec<String>)> = Vec::new();
        for paragraph in paragraphs {
            let is_point = POINT.is_match(&paragraph);
            match groups.last_mut() {
                Some((true, lines)) if is_point => lines.push(paragraph),
                _ => groups.push((is_point, vec![paragraph])),
            }
        }

        article.children = groups
            .into_iter()
            .map(|(_, lines)| ArticleChild::new(String::new(), lines.join("\n")))
            .collect();
        article.renumber_children();
        article
    }
}

fn collect_articles(container: ElementRef<'_>, consolidated: bool) -> Vec<Article> {
    let elements: Vec<ElementRef<'_>> = child_elements(container)
        .filter(|e| matches!(tag_name(*e), "p" | "table"))
        .collect();

    let mut articles = Vec::new();
    let mut current: Option<OpenArticle> = None;

    for (index, element) in elements.iter().copied().enumerate() {
        if tag_name(element) == "table" {
            if let (Some(open), Some(table)) = (current.as_mut(), table_text(element)) {
                open.paragraphs.push(format!("[TABLE]\n{table}"));
            }
            continue;
        }

        let text = clean(element);
        let inline = style(element);

        let heading_line = !consolidated || (inline.contains("italic") && inline.contains("center"));
        if heading_line {
            if let Some(caps) = ARTICLE_NUMBER.captures(&text) {
                if let Some(open) = current.take() {
                    articles.push(open.close());
                }
                let mut open = OpenArticle::new(&caps[1]);
                open.article.heading = if consolidated {
                    elements
                        .get(index + 1)
                        .filter(|next| tag_name(**next) == "p")
                        .filter(|next| {
                            let next_style = style(**next);
                            next_style.contains("bold") && next_style.contains("center")
                        })
                        .map(|next| clean(*next))
                } else {
                    non_empty(caps[2].to_string())
                };
                current = Some(open);
                continue;
            }
            if consolidated {
                continue;
            }
        }

        if ends_articles(&text) {
            if let Some(open) = current.take() {
                articles.push(open.close());
            }
            break;
        }

        let Some(open) = current.as_mut() else {
            continue;
        };
        if consolidated {
            if open.article.heading.as_deref() == Some(text.as_str()) {
                continue;
            }
            if !text.is_empty() && !inline.contains("center") && !inline.contains("italic") {
                open.paragraphs.push(text);
            }
        } else if !text.is_empty() {
            open.paragraphs.push(text);
        }
    }

    if let Some(open) = current {
        articles.push(open.close());
    }
    articles
}

impl ParserContract for CellarStandardParser {
    type Doc<'src> = StandardDoc;

    fn name(&self) -> &'static str {
        "cellar-standard"
    }

    fn input_kind(&self) -> InputKind {
        InputKind::Html
    }

    fn load_root<'src>(&self, source: &'src str) -> Result<Self::Doc<'src>> {
        let html = parse_document(source);
        let consolidated = if html.select(selector!("txt_te")).next().is_some() {
            tracing::debug!("Using the TXT_TE container");
            false
        } else if html.select(selector!("body p")).next().is_some() {
            tracing::info!("No TXT_TE container, reading the consolidated body");
            true
        } else {
            return Err(ParserError::DialectMismatch {
                dialect: self.name().to_string(),
                reason: "no TXT_TE container and no paragraphs in the body".to_string(),
            });
        };
        Ok(StandardDoc { html, consolidated })
    }

    fn preface(&self, doc: &Self::Doc<'_>) -> Result<Option<String>> {
        let description = doc
            .html
            .select(selector!(r#"meta[name="DC.description"]"#))
            .next()
            .and_then(|meta| meta.value().attr("content"))
            .and_then(|content| non_empty(content.trim().to_string()));
        if description.is_some() {
            return Ok(description);
        }

        let heading = doc
            .html
            .select(selector!("h1"))
            .next()
            .or_else(|| doc.html.select(selector!("strong")).next());
        Ok(heading.and_then(|e| non_empty(clean(e))))
    }

    fn formula(&self, doc: &Self::Doc<'_>) -> Result<Option<String>> {
        Ok(doc.paragraph_texts().find(|text| FORMULA.is_match(text)))
    }

    fn citations(&self, doc: &Self::Doc<'_>) -> Result<Vec<Citation>> {
        Ok(doc
            .paragraph_texts()
            .filter(|text| text.starts_with("Having regard to") || text.starts_with("Having considered"))
            .enumerate()
            .map(|(index, text)| Citation::new(format!("cit_{}", index + 1), text))
            .collect())
    }

    fn recitals(&self, doc: &Self::Doc<'_>) -> Result<Vec<Recital>> {
        let mut recitals = Vec::new();
        for row in doc.container().select(selector!("table tr")) {
            let cells: Vec<ElementRef<'_>> = child_elements(row)
                .filter(|c| tag_name(*c) == "td")
                .collect();
            let [number, content] = cells.as_slice() else {
                continue;
            };
            if let Some(caps) = TABLE_RECITAL_NUMBER.captures(&clean(*number)) {
                recitals.push(Recital::new(format!("rct_{}", &caps[1]), clean(*content)));
            }
        }
        if !recitals.is_empty() {
            return Ok(recitals);
        }

        let mut texts = doc.paragraph_texts().skip_while(|text| text != "Whereas:");
        texts.next();
        for text in texts {
            if RECITALS_END.is_match(&text) {
                break;
            }
            if let Some(caps) = NUMBERED_RECITAL.captures(&text) {
                recitals.push(Recital::new(format!("rct_{}", &caps[1]), &caps[2]));
            }
        }
        Ok(recitals)
    }

    fn preamble_final(&self, doc: &Self::Doc<'_>) -> Result<Option<String>> {
        Ok(doc.paragraph_texts().find(|text| PREAMBLE_FINAL.is_match(text)))
    }

    fn articles(&self, doc: &Self::Doc<'_>) -> Result<Vec<Article>> {
        Ok(collect_articles(doc.container(), doc.consolidated))
    }

    fn conclusions(&self, doc: &Self::Doc<'_>) -> Result<Option<Conclusion>> {
        let texts: Vec<String> = doc.paragraph_texts().collect();
        let lowest = texts
            .len()
            .checked_sub(CONCLUSION_SEARCH_WINDOW)
            .map_or(0, |start| start + 1);
        let start = (lowest..texts.len())
            .rev()
            .find(|&index| DONE_AT.is_match(&texts[index]));
        Ok(start.map(|index| Conclusion::text(texts[index..].join(" "))))
    }
}
