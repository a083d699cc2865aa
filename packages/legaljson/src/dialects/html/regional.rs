//! Regional authority acts (Veneto regional council portal).
//!
//! Only the first `div.row.testo` holds the act. Chapter and article
//! titles are plain headings of the form `Art. 1 - Purpose`, and an
//! article's text is the `div` right after its heading, one paragraph
//! per line break.

use scraper::{ElementRef, Html};

use crate::error::{ParserError, Result};
use crate::html::{element_text, next_element, parse_document, selector, split_on_br, tag_name};
use crate::parser::{InputKind, ParserContract};
use crate::text::{collapse_whitespace, non_empty};
use crate::types::{Article, ArticleChild, Chapter, Conclusion, Recital};

pub struct RegionalDoc {
    html: Html,
}

impl RegionalDoc {
    fn container(&self) -> ElementRef<'_> {
        self.html
            .select(selector!("div.row.testo"))
            .next()
            .unwrap_or_else(|| self.html.root_element())
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RegionalParser;

impl RegionalParser {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

fn clean(element: ElementRef<'_>) -> String {
    collapse_whitespace(&element_text(element))
}

/// Split a title on its first dash into number and heading. Without a
/// dash the title is all heading and the number is `position`.
fn split_title(title: &str, position: usize) -> (String, String) {
    let title = title.replace('\u{2013}', "-");
    match title.split_once(" - ") {
        Some((num, heading)) => (num.trim().to_string(), heading.trim().to_string()),
        None => (position.to_string(), title.trim().to_string()),
    }
}

impl ParserContract for RegionalParser {
    type Doc<'src> = RegionalDoc;

    fn name(&self) -> &'static str {
        "regional"
    }

    fn input_kind(&self) -> InputKind {
        InputKind::Html
    }

    fn load_root<'src>(&self, source: &'src str) -> Result<Self::Doc<'src>> {
        let html = parse_document(source);
        if html.select(selector!("div.row.testo")).next().is_none() {
            return Err(ParserError::DialectMismatch {
                dialect: self.name().to_string(),
                reason: "no div with classes row and testo".to_string(),
            });
        }
        Ok(RegionalDoc { html })
    }

    fn preface(&self, doc: &Self::Doc<'_>) -> Result<Option<String>> {
        Ok(doc
            .container()
            .select(selector!("h1, h2"))
            .next()
            .and_then(|e| non_empty(clean(e))))
    }

    fn recitals(&self, doc: &Self::Doc<'_>) -> Result<Vec<Recital>> {
        Ok(doc
            .container()
            .select(selector!("b"))
            .next()
            .map(|b| vec![Recital::new("0", clean(b))])
            .unwrap_or_default())
    }

    fn chapters(&self, doc: &Self::Doc<'_>) -> Result<Vec<Chapter>> {
        Ok(doc
            .container()
            .select(selector!("h3.TITOLOCAPOTITOLO, h4.TITOLOCAPOCAPO"))
            .enumerate()
            .map(|(index, heading)| {
                let (num, heading) = split_title(&clean(heading), index + 1);
                Chapter {
                    e_id: index.to_string(),
                    num: Some(num),
                    heading: Some(heading),
                }
            })
            .collect())
    }

    fn articles(&self, doc: &Self::Doc<'_>) -> Result<Vec<Article>> {
        Ok(doc
            .container()
            .select(selector!("h6"))
            .enumerate()
            .map(|(index, title)| {
                let (num, heading) = split_title(&clean(title), index + 1);
                let mut article = Article::new(index.to_string());
                article.num = Some(num);
                article.heading = Some(heading);
                if let Some(content) = next_element(title).filter(|e| tag_name(*e) == "div") {
                    article.children = split_on_br(content)
                        .iter()
                        .map(|line| collapse_whitespace(line))
                        .filter(|line| !line.is_empty())
                        .enumerate()
                        .map(|(position, text)| ArticleChild::new(position.to_string(), text))
                        .collect();
                }
                article
            })
            .collect())
    }

    fn conclusions(&self, doc: &Self::Doc<'_>) -> Result<Option<Conclusion>> {
        let closing = doc
            .container()
            .select(selector!("div.oj-final"))
            .next()
            .ok_or_else(|| ParserError::ElementNotFound {
                element_name: "oj-final".to_string(),
                path: Some("div.oj-final".to_string()),
            })?;
        Ok(Some(Conclusion::text(clean(closing))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn page(content: &str) -> String {
        format!(
            r#"<html><body><div class="menu"><h1>Portal</h1></div><div class="row testo">{content}</div><div class="row testo"><h6>Art. 99</h6></div></body></html>"#
        )
    }

    fn articles(content: &str) -> Vec<Article> {
        let doc = RegionalParser.load_root(&page(content)).unwrap();
        RegionalParser.articles(&doc).unwrap()
    }

    #[test]
    fn test_missing_container_fails_load() {
        let err = RegionalParser
            .load_root(r#"<html><body><div class="other">Content</div></body></html>"#)
            .err()
            .unwrap();
        assert!(matches!(err, ParserError::DialectMismatch { .. }));
    }

    #[test]
    fn test_preface_and_recital() {
        let source = page("<h2>Legge regionale 1 marzo 2024, n. 5</h2><p><b>Norme   in materia</b></p>");
        let doc = RegionalParser.load_root(&source).unwrap();
        assert_eq!(
            RegionalParser.preface(&doc).unwrap().as_deref(),
            Some("Legge regionale 1 marzo 2024, n. 5")
        );
        assert_eq!(
            RegionalParser.recitals(&doc).unwrap(),
            vec![Recital::new("0", "Norme in materia")]
        );

        let bare = RegionalParser.load_root(&page("No title here")).unwrap();
        assert_eq!(RegionalParser.preface(&bare).unwrap(), None);
    }

    #[test]
    fn test_chapters_in_document_order() {
        let source = page(
            r#"<h3 class="TITOLOCAPOTITOLO">Capo I - Disposizioni generali</h3>
               <h4 class="TITOLOCAPOCAPO">1 – First Section</h4>
               <h4 class="TITOLOCAPOCAPO">Untitled</h4>"#,
        );
        let doc = RegionalParser.load_root(&source).unwrap();
        let chapters = RegionalParser.chapters(&doc).unwrap();
        let summary: Vec<_> = chapters
            .iter()
            .map(|c| (c.e_id.as_str(), c.num.as_deref(), c.heading.as_deref()))
            .collect();
        assert_eq!(
            summary,
            vec![
                ("0", Some("Capo I"), Some("Disposizioni generali")),
                ("1", Some("1"), Some("First Section")),
                ("2", Some("3"), Some("Untitled")),
            ]
        );
    }

    #[test]
    fn test_article_titles() {
        let found = articles(
            "<h6>Art. 1 - Purpose</h6><div>x</div><h6>Art. 2 \u{2013} Definitions</h6><h6>Just a heading</h6>",
        );
        let titles: Vec<_> = found
            .iter()
            .map(|a| (a.e_id.as_str(), a.num.as_deref(), a.heading.as_deref()))
            .collect();
        assert_eq!(
            titles,
            vec![
                ("0", Some("Art. 1"), Some("Purpose")),
                ("1", Some("Art. 2"), Some("Definitions")),
                ("2", Some("3"), Some("Just a heading")),
            ]
        );
        assert!(found[1].children.is_empty(), "no div follows the heading");
    }

    #[test]
    fn test_article_children_split_on_line_breaks() {
        let found = articles(
            "<h6>Art. 1 - Test</h6><div><b>Bold   text</b> and <i>italic</i><br/><br/>Second\n  line<br>Third</div>",
        );
        let children: Vec<_> = found[0]
            .children
            .iter()
            .map(|c| (c.e_id.as_str(), c.text.as_str()))
            .collect();
        assert_eq!(
            children,
            vec![("0", "Bold text and italic"), ("1", "Second line"), ("2", "Third")]
        );
    }

    #[test]
    fn test_conclusions_require_final_block() {
        let doc = RegionalParser
            .load_root(&page(r#"<div class="oj-final">Final   conclusions text</div>"#))
            .unwrap();
        assert_eq!(
            RegionalParser.conclusions(&doc).unwrap(),
            Some(Conclusion::text("Final conclusions text"))
        );

        let bare = RegionalParser.load_root(&page("No conclusions here")).unwrap();
        assert!(matches!(
            RegionalParser.conclusions(&bare),
            Err(ParserError::ElementNotFound { .. })
        ));
    }
}
