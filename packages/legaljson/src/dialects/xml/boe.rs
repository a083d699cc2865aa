//! Spanish national gazette (BOE) parser.
//!
//! BOE documents are flat: every paragraph of the text is a `p` directly
//! under `texto`, and its `class` says what it is.

use roxmltree::Node;

use crate::config::BOE;
use crate::dialects::xml::XmlState;
use crate::error::Result;
use crate::parser::{InputKind, ParserContract};
use crate::text::{non_empty, normalize};
use crate::types::{renumber_articles, Article, ArticleChild};
use crate::xml::{has_tag, XmlDocument};

#[derive(Debug, Clone, Copy, Default)]
pub struct BoeParser;

impl BoeParser {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

/// Paragraphs whose parent is `texto`, in document order.
fn text_paragraphs<'a, 'input>(tree: &'a XmlDocument<'input>) -> Vec<Node<'a, 'input>> {
    tree.root()
        .descendants()
        .filter(|n| has_tag(*n, "p") && n.parent().is_some_and(|p| has_tag(p, "texto")))
        .collect()
}

fn is_body_paragraph(class: Option<&str>) -> bool {
    matches!(class, Some("parrafo" | "parrafo_2"))
}

impl ParserContract for BoeParser {
    type Doc<'src> = XmlState<'src>;

    fn name(&self) -> &'static str {
        BOE.key
    }

    fn input_kind(&self) -> InputKind {
        InputKind::Xml
    }

    fn load_root<'src>(&self, source: &'src str) -> Result<Self::Doc<'src>> {
        XmlState::load(source)
    }

    fn preface(&self, doc: &Self::Doc<'_>) -> Result<Option<String>> {
        let tree = &doc.tree;
        let lines: Vec<String> = text_paragraphs(tree)
            .into_iter()
            .take_while(|p| p.attribute("class") != Some("articulo"))
            .filter(|p| is_body_paragraph(p.attribute("class")))
            .map(|p| normalize(&tree.text(p)))
            .collect();
        Ok(non_empty(lines.join("\n")))
    }

    fn articles(&self, doc: &Self::Doc<'_>) -> Result<Vec<Article>> {
        let tree = &doc.tree;
        let mut articles: Vec<Article> = Vec::new();

        for p in text_paragraphs(tree) {
            let text = normalize(&tree.text(p));
            match p.attribute("class") {
                Some("articulo") => {
                    let mut article = Article::new(format!("art_{}", articles.len() + 1));
                    article.num = non_empty(text);
                    articles.push(article);
                }
                Some("parrafo") => {
                    if let Some(article) = articles.last_mut() {
                        let index = article.children.len() + 1;
                        article.children.push(ArticleChild::new(index.to_string(), text));
                    }
                }
                _ => {}
            }
        }

        renumber_articles(&mut articles);
        Ok(articles)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const DOCUMENTO: &str = r#"<documento fecha_actualizacion="20240101">
  <metadatos><titulo>Ley 1/2024</titulo></metadatos>
  <texto>
    <p class="parrafo">Sea notorio a todos los ciudadanos.</p>
    <p class="parrafo_2">Preámbulo.</p>
    <p class="centro_redonda">I</p>
    <p class="articulo">Artículo 1. Objeto.</p>
    <p class="parrafo">La presente ley tiene por objeto</p>
    <p class="parrafo">regular algo.</p>
    <p class="articulo">Artículo 2. Ámbito.</p>
    <p class="parrafo_2">Ignored continuation.</p>
    <blockquote><p class="parrafo">Nested paragraphs do not count.</p></blockquote>
  </texto>
</documento>"#;

    #[test]
    fn test_preface_stops_at_first_article() {
        let doc = BoeParser.load_root(DOCUMENTO).unwrap();
        assert_eq!(
            BoeParser.preface(&doc).unwrap().as_deref(),
            Some("Sea notorio a todos los ciudadanos.\nPreámbulo.")
        );
    }

    #[test]
    fn test_articles_collect_parrafo_children() {
        let doc = BoeParser.load_root(DOCUMENTO).unwrap();
        let articles = BoeParser.articles(&doc).unwrap();

        assert_eq!(articles.len(), 2);
        assert_eq!(articles[0].e_id, "art_1");
        assert_eq!(articles[0].num.as_deref(), Some("Artículo 1. Objeto."));
        let children: Vec<_> = articles[0]
            .children
            .iter()
            .map(|c| (c.e_id.as_str(), c.text.as_str()))
            .collect();
        assert_eq!(
            children,
            vec![
                ("001.001", "La presente ley tiene por objeto"),
                ("001.002", "regular algo."),
            ]
        );
        assert!(articles[1].children.is_empty());
    }

    #[test]
    fn test_other_sections_are_empty() {
        let doc = BoeParser.load_root(DOCUMENTO).unwrap();
        assert!(BoeParser.citations(&doc).unwrap().is_empty());
        assert_eq!(BoeParser.conclusions(&doc).unwrap(), None);
    }
}
