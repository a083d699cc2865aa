//! HTML utility functions for navigating and extracting text from scraper trees.

use scraper::ElementRef;

/// A CSS selector compiled once on first use.
///
/// ```ignore
/// for p in html.select(selector!("p.oj-normal")) { ... }
/// ```
macro_rules! selector {
    ($css:literal) => {{
        #[allow(clippy::expect_used)] // Static selector that is guaranteed to be valid
        static SELECTOR: std::sync::LazyLock<scraper::Selector> = std::sync::LazyLock::new(|| {
            scraper::Selector::parse($css).expect("valid selector")
        });
        &*SELECTOR
    }};
}
pub(crate) use selector;

/// All text below `element`, concatenated without separators.
#[must_use]
pub fn element_text(element: ElementRef<'_>) -> String {
    element.text().collect()
}

/// Text below `element`, leaving out the subtrees `skip` returns true for.
#[must_use]
pub fn text_without(element: ElementRef<'_>, skip: &dyn Fn(ElementRef<'_>) -> bool) -> String {
    let mut out = String::new();
    collect_text(element, skip, &mut out);
    out
}

fn collect_text(element: ElementRef<'_>, skip: &dyn Fn(ElementRef<'_>) -> bool, out: &mut String) {
    for child in element.children() {
        if let Some(text) = child.value().as_text() {
            out.push_str(text);
        } else if let Some(child_element) = ElementRef::wrap(child) {
            if !skip(child_element) {
                collect_text(child_element, skip, out);
            }
        }
    }
}

/// Text below `element`, split into one segment per `<br>`.
///
/// Segments are returned raw; callers clean and filter them.
#[must_use]
pub fn split_on_br(element: ElementRef<'_>) -> Vec<String> {
    let mut segments = vec![String::new()];
    split_into(element, &mut segments);
    segments
}

fn split_into(element: ElementRef<'_>, segments: &mut Vec<String>) {
    for child in element.children() {
        if let Some(text) = child.value().as_text() {
            if let Some(current) = segments.last_mut() {
                current.push_str(text);
            }
        } else if let Some(child_element) = ElementRef::wrap(child) {
            if child_element.value().name() == "br" {
                segments.push(String::new());
            } else {
                split_into(child_element, segments);
            }
        }
    }
}

/// Whether `element` carries `class`.
#[must_use]
pub fn has_class(element: ElementRef<'_>, class: &str) -> bool {
    element.value().classes().any(|c| c == class)
}

/// Whether `element` carries any of `classes`.
#[must_use]
pub fn has_any_class(element: ElementRef<'_>, classes: &[&str]) -> bool {
    element.value().classes().any(|c| classes.contains(&c))
}

/// Tag name of `element` (always lower case for parsed HTML).
#[must_use]
pub fn tag_name<'a>(element: ElementRef<'a>) -> &'a str {
    element.value().name()
}

/// Element children of `element`.
pub fn child_elements<'a>(element: ElementRef<'a>) -> impl Iterator<Item = ElementRef<'a>> {
    element.children().filter_map(ElementRef::wrap)
}

/// The next sibling that is an element.
#[must_use]
pub fn next_element(element: ElementRef<'_>) -> Option<ElementRef<'_>> {
    element.next_siblings().find_map(ElementRef::wrap)
}

/// Table rows as lists of cell texts, cleaned by `clean`.
pub fn table_rows(table: ElementRef<'_>, clean: fn(&str) -> String) -> Vec<Vec<String>> {
    table
        .descendants()
        .filter_map(ElementRef::wrap)
        .filter(|e| tag_name(*e) == "tr")
        .map(|row| {
            child_elements(row)
                .filter(|c| matches!(tag_name(*c), "td" | "th"))
                .map(|c| clean(&element_text(c)))
                .collect()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::Html;

    fn first<'a>(html: &'a Html, css: &str) -> ElementRef<'a> {
        let selector = scraper::Selector::parse(css).unwrap();
        html.select(&selector).next().unwrap()
    }

    #[test]
    fn test_selector_macro() {
        let html = Html::parse_fragment("<p>one</p><p>two</p>");
        assert_eq!(html.select(selector!("p")).count(), 2);
    }

    #[test]
    fn test_text_without_skips_subtrees() {
        let html = Html::parse_fragment(
            r##"<p>Directive 2016/680<a href="#ntr1">(1)</a> applies</p>"##,
        );
        let p = first(&html, "p");
        let text = text_without(p, &|e| tag_name(e) == "a");
        assert_eq!(text, "Directive 2016/680 applies");
    }

    #[test]
    fn test_split_on_br() {
        let html = Html::parse_fragment("<div>First<br>Second <b>bold</b><br/><br/>Third</div>");
        let segments = split_on_br(first(&html, "div"));
        assert_eq!(segments, vec!["First", "Second bold", "", "Third"]);
    }

    #[test]
    fn test_classes_and_siblings() {
        let html = Html::parse_fragment(
            r#"<h6 class="a b">Art. 1</h6> text <div class="c">Body</div>"#,
        );
        let h6 = first(&html, "h6");
        assert!(has_class(h6, "b"));
        assert!(!has_class(h6, "c"));
        assert!(has_any_class(h6, &["x", "a"]));
        assert_eq!(next_element(h6).map(tag_name), Some("div"));
    }

    #[test]
    fn test_table_rows() {
        let html = Html::parse_fragment(
            "<table><tr><td> (a) </td><td>first</td></tr><tr><th>x</th></tr></table>",
        );
        let rows = table_rows(first(&html, "table"), |s| s.trim().to_string());
        assert_eq!(rows, vec![vec!["(a)", "first"], vec!["x"]]);
    }
}
