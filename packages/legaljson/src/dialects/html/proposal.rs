//! European Commission legislative proposals (COM documents).
//!
//! Proposals are exported from a word processor, so structure lives in
//! style classes such as `Titrearticle` or `ManualConsidrant`. The cover
//! page is repeated before the act itself, and the explanatory memorandum
//! precedes the act as a numbered outline.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;
use scraper::{ElementRef, Html, Selector};

use crate::error::Result;
use crate::html::{has_class, parse_document, selector, split_on_br, table_rows, tag_name, text_without};
use crate::parser::{InputKind, ParserContract};
use crate::text::{join_non_empty, non_empty, normalize_quotes};
use crate::types::{
    renumber_articles, Article, ArticleChild, Citation, Conclusion, LegalDocument, Memorandum,
    OutlineItem, OutlineSection, Recital,
};

#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static ARTICLE_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Article\s+(\d+)").expect("valid regex"));

pub struct ProposalDoc {
    html: Html,
}

impl ProposalDoc {
    /// Text of the first element matching `selector`, or of the second
    /// when the cover page repeats it.
    fn repeated_text(&self, selector: &Selector) -> Option<String> {
        let found: Vec<ElementRef<'_>> = self.html.select(selector).take(2).collect();
        found.last().and_then(|e| non_empty(clean(*e)))
    }

    fn first_text(&self, selector: &Selector) -> Option<String> {
        self.html.select(selector).next().and_then(|e| non_empty(clean(e)))
    }

    /// Paragraphs and tables in document order, leaving out paragraphs
    /// inside tables.
    fn blocks(&self) -> impl Iterator<Item = ElementRef<'_>> {
        self.html.select(selector!("p, table")).filter(|e| {
            tag_name(*e) == "table" || !e.ancestors().filter_map(ElementRef::wrap).any(|a| tag_name(a) == "table")
        })
    }

    fn metadata(&self) -> BTreeMap<String, String> {
        let fields = [
            ("institution", self.first_text(selector!(".Logo"))),
            ("emission_date", self.first_text(selector!(".Emission"))),
            ("com_reference", self.first_text(selector!(".Rfrenceinstitutionnelle"))),
            (
                "interinstitutional_reference",
                self.first_text(selector!(".Rfrenceinterinstitutionnelle")),
            ),
            ("status", self.repeated_text(selector!(".Statut"))),
            (
                "document_type",
                self.repeated_text(selector!(".Typedudocument, .Typedudocument_cp")),
            ),
            ("title", self.repeated_text(selector!(".Titreobjet, .Titreobjet_cp"))),
        ];
        fields
            .into_iter()
            .filter_map(|(key, value)| Some((key.to_string(), value?)))
            .collect()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ProposalParser;

impl ProposalParser {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

fn clean(element: ElementRef<'_>) -> String {
    normalize_quotes(&element.text().collect::<String>())
}

fn is_number(element: ElementRef<'_>) -> bool {
    tag_name(element) == "span" && has_class(element, "num")
}

/// The `span.num` of a numbered paragraph or heading, and the text after it.
fn split_number(element: ElementRef<'_>) -> (Option<String>, String) {
    let number = element
        .select(selector!("span.num"))
        .next()
        .and_then(|span| non_empty(clean(span)));
    let text = normalize_quotes(&text_without(element, &is_number));
    (number, text)
}

fn table_text(table: ElementRef<'_>) -> String {
    let rows: Vec<String> = table_rows(table, normalize_quotes)
        .into_iter()
        .map(|cells| join_non_empty(cells, " | "))
        .collect();
    join_non_empty(rows, "\n")
}

fn heading_level(element: ElementRef<'_>) -> Option<u8> {
    [("ManualHeading1", 1), ("ManualHeading2", 2), ("ManualHeading3", 3)]
        .into_iter()
        .find(|(class, _)| has_class(element, class))
        .map(|(_, level)| level)
}

/// Builds the nested outline of the memorandum.
#[derive(Default)]
struct Outline {
    items: Vec<OutlineItem>,
    open: Vec<OutlineSection>,
}

impl Outline {
    fn push(&mut self, item: OutlineItem) {
        match self.open.last_mut() {
            Some(section) => section.content.push(item),
            None => self.items.push(item),
        }
    }

    fn close_one(&mut self) {
        if let Some(section) = self.open.pop() {
            self.push(OutlineItem::Section(section));
        }
    }

    fn open_section(&mut self, level: u8, number: Option<String>, heading: String) {
        while self.open.last().is_some_and(|s| s.level >= level) {
            self.close_one();
        }
        self.open.push(OutlineSection {
            level,
            number,
            heading,
            content: Vec::new(),
        });
    }

    fn finish(mut self) -> Vec<OutlineItem> {
        while !self.open.is_empty() {
            self.close_one();
        }
        self.items
    }
}

fn memorandum(doc: &ProposalDoc) -> Option<Memorandum> {
    let mut blocks = doc
        .blocks()
        .skip_while(|e| !has_class(*e, "Exposdesmotifstitre"));
    let title = blocks.next()?;

    let mut outline = Outline::default();
    for block in blocks {
        if has_class(block, "Statut") || has_class(block, "Institutionquiagit") {
            break;
        }
        if tag_name(block) == "table" {
            let data: Vec<Vec<String>> = table_rows(block, normalize_quotes)
                .into_iter()
                .filter(|row| row.iter().any(|cell| !cell.is_empty()))
                .collect();
            if !data.is_empty() {
                outline.push(OutlineItem::Table { data });
            }
            continue;
        }

        let (number, text) = split_number(block);
        if let Some(level) = heading_level(block) {
            outline.open_section(level, number, text);
        } else if text.is_empty() {
            continue;
        } else if number.is_some() {
            outline.push(OutlineItem::NumberedParagraph { number, text });
        } else {
            outline.push(OutlineItem::Paragraph { text });
        }
    }

    Some(Memorandum {
        title: non_empty(clean(title)),
        sections: outline.finish(),
    })
}

impl ParserContract for ProposalParser {
    type Doc<'src> = ProposalDoc;

    fn name(&self) -> &'static str {
        "proposal"
    }

    fn input_kind(&self) -> InputKind {
        InputKind::Html
    }

    fn load_root<'src>(&self, source: &'src str) -> Result<Self::Doc<'src>> {
        Ok(ProposalDoc {
            html: parse_document(source),
        })
    }

    fn preface(&self, doc: &Self::Doc<'_>) -> Result<Option<String>> {
        let parts = [
            doc.repeated_text(selector!(".Statut")),
            doc.repeated_text(selector!(".Typedudocument, .Typedudocument_cp")),
            doc.repeated_text(selector!(".Titreobjet, .Titreobjet_cp")),
        ];
        Ok(non_empty(join_non_empty(parts.into_iter().flatten(), " ")))
    }

    fn formula(&self, doc: &Self::Doc<'_>) -> Result<Option<String>> {
        Ok(doc.first_text(selector!("p.Institutionquiagit")))
    }

    fn citations(&self, doc: &Self::Doc<'_>) -> Result<Vec<Citation>> {
        let mut blocks = doc
            .blocks()
            .skip_while(|e| !has_class(*e, "Institutionquiagit"));
        if blocks.next().is_none() {
            tracing::debug!("No formula, so no citations");
            return Ok(Vec::new());
        }

        let texts = blocks
            .filter(|e| tag_name(*e) == "p")
            .map(clean)
            .take_while(|text| text != "Whereas:");
        Ok(texts
            .filter(|text| text.starts_with("Having regard to"))
            .enumerate()
            .map(|(index, text)| Citation::new(format!("cit_{}", index + 1), text))
            .collect())
    }

    fn recitals(&self, doc: &Self::Doc<'_>) -> Result<Vec<Recital>> {
        Ok(doc
            .html
            .select(selector!("p.ManualConsidrant"))
            .enumerate()
            .map(|(index, p)| {
                let (num, text) = split_number(p);
                Recital {
                    e_id: format!("rct_{}", index + 1),
                    text,
                    num,
                }
            })
            .collect())
    }

    fn preamble_final(&self, doc: &Self::Doc<'_>) -> Result<Option<String>> {
        Ok(doc.first_text(selector!("p.Formuledadoption")))
    }

    fn articles(&self, doc: &Self::Doc<'_>) -> Result<Vec<Article>> {
        let mut articles: Vec<Article> = Vec::new();
        for block in doc.blocks() {
            if has_class(block, "Fait") {
                break;
            }
            if has_class(block, "Titrearticle") {
                let lines: Vec<String> = split_on_br(block)
                    .iter()
                    .map(|line| normalize_quotes(line))
                    .filter(|line| !line.is_empty())
                    .collect();
                let num = lines.first().cloned();
                let e_id = num
                    .as_deref()
                    .and_then(|n| ARTICLE_NUMBER.captures(n))
                    .and_then(|caps| caps[1].parse::<u32>().ok())
                    .map_or_else(
                        || format!("{:03}", articles.len() + 1),
                        |number| format!("{number:03}"),
                    );
                let mut article = Article::new(e_id);
                article.num = num;
                article.heading = non_empty(join_non_empty(lines.iter().skip(1), " "));
                articles.push(article);
                continue;
            }

            let Some(article) = articles.last_mut() else {
                continue;
            };
            let text = if tag_name(block) == "table" {
                table_text(block)
            } else {
                clean(block)
            };
            if !text.is_empty() {
                article.children.push(ArticleChild::new(String::new(), text));
            }
        }
        renumber_articles(&mut articles);
        Ok(articles)
    }

    fn conclusions(&self, doc: &Self::Doc<'_>) -> Result<Option<Conclusion>> {
        let Some(done) = doc.first_text(selector!("p.Fait")) else {
            return Ok(None);
        };
        let signature = doc.first_text(selector!("div.signature"));
        let text = join_non_empty([Some(done), signature].into_iter().flatten(), " ");
        Ok(Some(Conclusion::text(text)))
    }

    fn supplements(&self, doc: &Self::Doc<'_>, document: &mut LegalDocument) -> Result<()> {
        let metadata = doc.metadata();
        if !metadata.is_empty() {
            document.metadata = Some(metadata);
        }
        document.explanatory_memorandum = memorandum(doc);
        Ok(())
    }
}
