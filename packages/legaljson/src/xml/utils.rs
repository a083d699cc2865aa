//! XML utility functions for navigating and extracting data from DOM trees.
//!
//! These helpers match on local names only. Namespace-aware lookups go
//! through [`crate::xml::XmlDocument::find`].

use roxmltree::Node;

/// Get the tag name without namespace prefix.
///
/// # Arguments
/// * `node` - XML node
///
/// # Returns
/// Tag name without namespace (e.g., "article" not "{ns}article")
///
/// # Examples
/// ```
/// use roxmltree::Document;
/// use legaljson::xml::get_tag_name;
///
/// let xml = r#"<akn:act xmlns:akn="http://docs.oasis-open.org/legaldocml/ns/akn/3.0"><akn:body/></akn:act>"#;
/// let doc = Document::parse(xml).unwrap();
/// let body = doc.root_element().first_element_child().unwrap();
/// assert_eq!(get_tag_name(body), "body");
/// ```
pub fn get_tag_name<'a>(node: Node<'a, '_>) -> &'a str {
    node.tag_name().name()
}

/// Find the first child element with the given tag name.
///
/// # Arguments
/// * `node` - Parent node to search in
/// * `tag` - Tag name to search for
///
/// # Returns
/// First matching child element, or `None` if not found
///
/// # Examples
/// ```
/// use roxmltree::Document;
/// use legaljson::xml::find_child;
///
/// let xml = r#"<ARTICLE><TI.ART>Article 1</TI.ART><STI.ART>Subject</STI.ART></ARTICLE>"#;
/// let doc = Document::parse(xml).unwrap();
/// let article = doc.root_element();
///
/// assert!(find_child(article, "TI.ART").is_some());
/// assert!(find_child(article, "PARAG").is_none());
/// ```
pub fn find_child<'a, 'input>(node: Node<'a, 'input>, tag: &str) -> Option<Node<'a, 'input>> {
    node.children()
        .find(|child| child.is_element() && get_tag_name(*child) == tag)
}

/// Find all child elements with the given tag name.
///
/// # Arguments
/// * `node` - Parent node to search in
/// * `tag` - Tag name to search for
///
/// # Returns
/// Iterator over matching child elements
pub fn find_children<'a, 'input>(
    node: Node<'a, 'input>,
    tag: &'a str,
) -> impl Iterator<Item = Node<'a, 'input>> {
    node.children()
        .filter(move |child| child.is_element() && get_tag_name(*child) == tag)
}

/// Find a descendant element matching a path of tag names.
///
/// # Arguments
/// * `node` - Starting node
/// * `path` - Slash-separated path of tag names (e.g., "PL.DATE/P")
///
/// # Returns
/// Matching element, or `None` if path not found
///
/// # Examples
/// ```
/// use roxmltree::Document;
/// use legaljson::xml::find_by_path;
///
/// let xml = r#"<SIGNATURE><PL.DATE><P>Done at Brussels,</P></PL.DATE></SIGNATURE>"#;
/// let doc = Document::parse(xml).unwrap();
///
/// let p = find_by_path(doc.root_element(), "PL.DATE/P");
/// assert_eq!(p.and_then(|n| n.text()), Some("Done at Brussels,"));
/// ```
pub fn find_by_path<'a, 'input>(node: Node<'a, 'input>, path: &str) -> Option<Node<'a, 'input>> {
    let mut current = node;

    for part in path.split('/') {
        current = find_child(current, part)?;
    }

    Some(current)
}

/// Get the direct text content of a node, trimmed.
///
/// Only the first text run is returned; text inside child elements is not.
///
/// # Arguments
/// * `node` - Node to get text from
///
/// # Returns
/// Trimmed text content, or empty string if no text
pub fn get_text(node: Node<'_, '_>) -> String {
    node.text()
        .map(|s| s.trim().to_string())
        .unwrap_or_default()
}

/// Check if a node has a specific tag name.
///
/// # Arguments
/// * `node` - Node to check
/// * `tag` - Expected tag name
///
/// # Returns
/// `true` if the node has the specified tag name
pub fn has_tag(node: Node<'_, '_>, tag: &str) -> bool {
    node.is_element() && get_tag_name(node) == tag
}

/// Get all element children of a node.
///
/// # Arguments
/// * `node` - Parent node
///
/// # Returns
/// Iterator over element children (excludes text nodes, comments, etc.)
pub fn element_children<'a, 'input>(
    node: Node<'a, 'input>,
) -> impl Iterator<Item = Node<'a, 'input>> {
    node.children().filter(|child| child.is_element())
}

/// Check whether a node sits inside one of `tags`, looking no further up than `stop`.
///
/// Walks up from the parent of `node`. The walk ends at `stop` without
/// testing it, so an article never counts as its own ancestor.
///
/// # Examples
/// ```
/// use roxmltree::Document;
/// use legaljson::xml::{find_by_path, inside_any};
///
/// let xml = r#"<article><mod><quotedStructure><p>x</p></quotedStructure></mod><p>y</p></article>"#;
/// let doc = Document::parse(xml).unwrap();
/// let article = doc.root_element();
/// let quoted = find_by_path(article, "mod/quotedStructure/p").unwrap();
/// let plain = find_by_path(article, "p").unwrap();
///
/// assert!(inside_any(quoted, Some(article), &["quotedStructure", "mod"]));
/// assert!(!inside_any(plain, Some(article), &["quotedStructure", "mod"]));
/// ```
pub fn inside_any<'a, 'input>(
    node: Node<'a, 'input>,
    stop: Option<Node<'a, 'input>>,
    tags: &[&str],
) -> bool {
    let mut current = node.parent();
    while let Some(parent) = current {
        if stop.is_some_and(|s| s == parent) {
            return false;
        }
        if parent.is_element() && tags.contains(&get_tag_name(parent)) {
            return true;
        }
        current = parent.parent();
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use roxmltree::Document;

    #[test]
    fn test_get_tag_name_with_namespace() {
        let xml = r#"<ns:root xmlns:ns="http://example.com"><ns:child/></ns:root>"#;
        let doc = Document::parse(xml).unwrap();
        assert_eq!(get_tag_name(doc.root_element()), "root");
    }

    #[test]
    fn test_find_children() {
        let xml = r#"<GR.VISA><VISA>1</VISA><NOTE/><VISA>2</VISA></GR.VISA>"#;
        let doc = Document::parse(xml).unwrap();
        let items: Vec<_> = find_children(doc.root_element(), "VISA").collect();
        assert_eq!(items.len(), 2);
    }

    #[test]
    fn test_find_by_path_missing() {
        let xml = r#"<SIGNATORY><P/></SIGNATORY>"#;
        let doc = Document::parse(xml).unwrap();
        assert!(find_by_path(doc.root_element(), "P/HT").is_none());
    }

    #[test]
    fn test_get_text_is_direct_only() {
        let xml = r#"<P>  Done at Strasbourg, <DATE>13 March 2024</DATE></P>"#;
        let doc = Document::parse(xml).unwrap();
        assert_eq!(get_text(doc.root_element()), "Done at Strasbourg,");
    }

    #[test]
    fn test_has_tag_and_element_children() {
        let xml = r#"<texto>intro<p/>more<p/></texto>"#;
        let doc = Document::parse(xml).unwrap();
        let root = doc.root_element();

        assert!(has_tag(root, "texto"));
        assert!(!has_tag(root, "p"));
        assert_eq!(element_children(root).count(), 2);
    }

    #[test]
    fn test_inside_any_without_stop() {
        let xml = r#"<mod><p/></mod>"#;
        let doc = Document::parse(xml).unwrap();
        let p = doc.root_element().first_element_child().unwrap();
        assert!(inside_any(p, None, &["mod"]));
    }
}
