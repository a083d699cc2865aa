//! Core data types for LegalJSON documents.
//!
//! A [`LegalDocument`] is built once per parse, filled step by step by a
//! dialect parser, and serialized as-is. Field names match the LegalJSON
//! wire format exactly (`eId`, `preamble_final`, ...).

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Article ordinal inside an identifier such as `art_12` or a bare `005`.
#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static ARTICLE_ORDINAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:^|art_)(\d+)").expect("valid regex"));

/// A legislative act in canonical LegalJSON shape.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LegalDocument {
    pub preface: Option<String>,
    pub formula: Option<String>,
    #[serde(default)]
    pub citations: Vec<Citation>,
    #[serde(default)]
    pub recitals: Vec<Recital>,
    pub preamble_final: Option<String>,
    #[serde(default)]
    pub chapters: Vec<Chapter>,
    #[serde(default)]
    pub articles: Vec<Article>,
    pub conclusions: Option<Conclusion>,

    /// Cover-page metadata (legislative proposals only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<BTreeMap<String, String>>,

    /// Explanatory memorandum outline (legislative proposals only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanatory_memorandum: Option<Memorandum>,
}

impl LegalDocument {
    /// Total number of article children across all articles.
    #[must_use]
    pub fn child_count(&self) -> usize {
        self.articles.iter().map(|a| a.children.len()).sum()
    }

    /// Serialize to pretty-printed JSON.
    pub fn to_json(&self) -> crate::error::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// A "Having regard to ..." clause.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Citation {
    #[serde(rename = "eId")]
    pub e_id: String,
    pub text: String,
}

impl Citation {
    pub fn new(e_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            e_id: e_id.into(),
            text: text.into(),
        }
    }
}

/// A "Whereas ..." clause.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recital {
    #[serde(rename = "eId")]
    pub e_id: String,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub num: Option<String>,
}

impl Recital {
    pub fn new(e_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            e_id: e_id.into(),
            text: text.into(),
            num: None,
        }
    }
}

/// A top-level chapter heading.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chapter {
    #[serde(rename = "eId")]
    pub e_id: String,
    pub num: Option<String>,
    pub heading: Option<String>,
}

/// An article and its sub-paragraphs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Article {
    #[serde(rename = "eId")]
    pub e_id: String,
    pub num: Option<String>,
    pub heading: Option<String>,
    #[serde(default)]
    pub children: Vec<ArticleChild>,
}

impl Article {
    pub fn new(e_id: impl Into<String>) -> Self {
        Self {
            e_id: e_id.into(),
            num: None,
            heading: None,
            children: Vec::new(),
        }
    }

    /// Ordinal encoded in the article identifier, or 0 if there is none.
    ///
    /// # Examples
    /// ```
    /// use legaljson::types::Article;
    ///
    /// assert_eq!(Article::new("art_12").ordinal(), 12);
    /// assert_eq!(Article::new("005").ordinal(), 5);
    /// assert_eq!(Article::new("preamble").ordinal(), 0);
    /// ```
    #[must_use]
    pub fn ordinal(&self) -> u32 {
        ARTICLE_ORDINAL
            .captures(&self.e_id)
            .and_then(|caps| caps[1].parse().ok())
            .unwrap_or(0)
    }

    /// Rewrite child identifiers to `<article:03>.<child:03>`, dropping source numbering.
    pub fn renumber_children(&mut self) {
        let ordinal = self.ordinal();
        for (index, child) in self.children.iter_mut().enumerate() {
            child.e_id = format!("{ordinal:03}.{:03}", index + 1);
        }
    }
}

/// Renumber the children of every article.
pub fn renumber_articles(articles: &mut [Article]) {
    for article in articles {
        article.renumber_children();
    }
}

/// A paragraph, point or table inside an article.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArticleChild {
    #[serde(rename = "eId")]
    pub e_id: String,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amendment: Option<bool>,
}

impl ArticleChild {
    pub fn new(e_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            e_id: e_id.into(),
            text: text.into(),
            amendment: None,
        }
    }

    #[must_use]
    pub fn with_amendment(mut self, amendment: bool) -> Self {
        self.amendment = Some(amendment);
        self
    }
}

/// Closing part of the act.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Conclusion {
    /// Closing text with an optional single signature.
    Text {
        conclusion_text: String,
        signature: Option<Signature>,
    },
    /// Akoma Ntoso signature blocks, one inner list per block.
    Blocks {
        date: Option<String>,
        signatures: Vec<Vec<String>>,
    },
}

impl Conclusion {
    /// Closing text without a signature.
    pub fn text(conclusion_text: impl Into<String>) -> Self {
        Self::Text {
            conclusion_text: conclusion_text.into(),
            signature: None,
        }
    }

    #[must_use]
    pub fn signature(&self) -> Option<&Signature> {
        match self {
            Self::Text { signature, .. } => signature.as_ref(),
            Self::Blocks { .. } => None,
        }
    }
}

/// Place, date and signatory of a closing formula.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signature {
    pub place: Option<String>,
    pub date: Option<String>,
    pub signatory: Option<String>,
    pub title: Option<String>,
}

/// Explanatory memorandum of a legislative proposal.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Memorandum {
    pub title: Option<String>,
    #[serde(default)]
    pub sections: Vec<OutlineItem>,
}

/// A heading in the memorandum outline with its content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutlineSection {
    pub level: u8,
    pub number: Option<String>,
    pub heading: String,
    #[serde(default)]
    pub content: Vec<OutlineItem>,
}

/// One entry of the memorandum outline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutlineItem {
    Section(OutlineSection),
    NumberedParagraph { number: Option<String>, text: String },
    Paragraph { text: String },
    Table { data: Vec<Vec<String>> },
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_renumber_uses_article_ordinal() {
        let mut article = Article::new("art_2");
        article.children = vec![
            ArticleChild::new("1", "First."),
            ArticleChild::new("x", "Second."),
        ];
        article.renumber_children();

        let ids: Vec<_> = article.children.iter().map(|c| c.e_id.as_str()).collect();
        assert_eq!(ids, vec!["002.001", "002.002"]);
    }

    #[test]
    fn test_renumber_without_ordinal_defaults_to_zero() {
        let mut article = Article::new("preamble");
        article.children = vec![ArticleChild::new("a", "Only.")];
        article.renumber_children();
        assert_eq!(article.children[0].e_id, "000.001");
    }

    #[test]
    fn test_serialize_field_names() {
        let doc = LegalDocument {
            preface: Some("Regulation".to_string()),
            articles: vec![Article {
                e_id: "art_1".to_string(),
                num: Some("Article 1".to_string()),
                heading: None,
                children: vec![ArticleChild::new("001.001", "Text.").with_amendment(false)],
            }],
            ..Default::default()
        };

        let value = serde_json::to_value(&doc).unwrap();
        assert_eq!(value["articles"][0]["eId"], "art_1");
        assert_eq!(value["articles"][0]["children"][0]["amendment"], false);
        assert!(value["preamble_final"].is_null());
        assert!(value.get("metadata").is_none());
        assert!(value.get("explanatory_memorandum").is_none());
    }

    #[test]
    fn test_child_without_amendment_omits_field() {
        let value = serde_json::to_value(ArticleChild::new("0", "x")).unwrap();
        assert!(value.get("amendment").is_none());
    }

    #[test]
    fn test_conclusion_shapes() {
        let text = Conclusion::Text {
            conclusion_text: "Done at Brussels,".to_string(),
            signature: Some(Signature {
                place: Some("Done at Brussels,".to_string()),
                ..Default::default()
            }),
        };
        let value = serde_json::to_value(&text).unwrap();
        assert_eq!(value["signature"]["place"], "Done at Brussels,");

        let blocks = Conclusion::Blocks {
            date: Some("1 January 2024".to_string()),
            signatures: vec![vec!["For the Council".to_string(), "The President".to_string()]],
        };
        let value = serde_json::to_value(&blocks).unwrap();
        assert_eq!(value["signatures"][0][1], "The President");

        let back: Conclusion = serde_json::from_value(value).unwrap();
        assert_eq!(back, blocks);
    }

    #[test]
    fn test_outline_item_tagging() {
        let item = OutlineItem::Section(OutlineSection {
            level: 1,
            number: Some("1.".to_string()),
            heading: "Context".to_string(),
            content: vec![OutlineItem::Paragraph {
                text: "Body".to_string(),
            }],
        });
        let value = serde_json::to_value(&item).unwrap();
        assert_eq!(value["type"], "section");
        assert_eq!(value["content"][0]["type"], "paragraph");
    }
}
