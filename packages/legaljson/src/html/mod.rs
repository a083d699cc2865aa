//! HTML tree access for the portal dialects.
//!
//! HTML is parsed leniently: malformed markup is repaired by the parser and
//! never fails a load. Dialects decide themselves whether the repaired tree
//! has the structure they need.

pub mod utils;

use scraper::Html;

pub(crate) use utils::selector;
pub use utils::{
    child_elements, element_text, has_any_class, has_class, next_element, split_on_br,
    table_rows, tag_name, text_without,
};

/// Parse a full HTML document.
#[must_use]
pub fn parse_document(source: &str) -> Html {
    let html = Html::parse_document(source);
    if !html.errors.is_empty() {
        tracing::debug!(errors = html.errors.len(), "HTML repaired while parsing");
    }
    html
}
