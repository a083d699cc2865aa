//! Path queries over XML trees.
//!
//! Supports the small path subset the dialect parsers need:
//!
//! - `a/b` selects `b` children of `a` children
//! - `.//a` and `a//b` select descendants
//! - `*` matches any element
//! - `akn:article` resolves `akn` through the dialect's namespace table;
//!   an unprefixed name matches the local name in any namespace
//! - `[@attr='value']`, `[@attr]` and positional `[n]` (1-based) predicates

use roxmltree::Node;

use crate::config::{namespace_matches, DialectConfig, XML_NAMESPACE};
use crate::error::{ParserError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Axis {
    Child,
    Descendant,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum NameTest {
    Any,
    Name {
        namespace: Option<&'static str>,
        local: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Predicate {
    Attribute {
        namespace: Option<&'static str>,
        name: String,
        value: Option<String>,
    },
    Position(usize),
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Step {
    axis: Axis,
    test: NameTest,
    predicates: Vec<Predicate>,
}

/// A compiled path expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    steps: Vec<Step>,
}

impl Query {
    /// Compile `path`, resolving prefixes through `config`.
    ///
    /// # Examples
    /// ```
    /// use legaljson::config::AKOMA_NTOSO;
    /// use legaljson::xml::query::Query;
    ///
    /// assert!(Query::parse(".//akn:recital[@eId='rec_1']", &AKOMA_NTOSO).is_ok());
    /// assert!(Query::parse("foo:bar", &AKOMA_NTOSO).is_err());
    /// ```
    pub fn parse(path: &str, config: &DialectConfig) -> Result<Self> {
        let invalid = |reason: &str| {
            ParserError::ParserConfiguration(format!("Invalid path '{path}': {reason}"))
        };

        let segments = split_segments(path);
        let mut steps = Vec::new();
        let mut descendant = false;

        for (index, segment) in segments.iter().enumerate() {
            match *segment {
                "" if index + 1 == segments.len() => return Err(invalid("trailing '/'")),
                "" => descendant = true,
                "." => {}
                segment => {
                    let axis = if descendant {
                        Axis::Descendant
                    } else {
                        Axis::Child
                    };
                    descendant = false;
                    steps.push(parse_step(segment, axis, config, path)?);
                }
            }
        }

        if steps.is_empty() {
            return Err(invalid("no element step"));
        }

        Ok(Self { steps })
    }

    /// Evaluate the query relative to `scope`, returning matches in document order.
    pub fn select<'a, 'input>(&self, scope: Node<'a, 'input>) -> Vec<Node<'a, 'input>> {
        let mut current = vec![scope];

        for step in &self.steps {
            let mut next = Vec::new();
            for node in &current {
                let mut candidates: Vec<Node<'a, 'input>> = match step.axis {
                    Axis::Child => node.children().filter(|c| step.matches(*c)).collect(),
                    Axis::Descendant => node
                        .descendants()
                        .skip(1)
                        .filter(|c| step.matches(*c))
                        .collect(),
                };
                for predicate in &step.predicates {
                    if let Predicate::Position(position) = predicate {
                        candidates = candidates
                            .get(position - 1)
                            .map(|n| vec![*n])
                            .unwrap_or_default();
                    }
                }
                next.extend(candidates);
            }
            next.sort_by_key(|n| n.range().start);
            next.dedup_by_key(|n| n.id());
            current = next;
        }

        current
    }
}

impl Step {
    fn matches(&self, node: Node<'_, '_>) -> bool {
        if !node.is_element() {
            return false;
        }

        let name_ok = match &self.test {
            NameTest::Any => true,
            NameTest::Name { namespace, local } => {
                node.tag_name().name() == local
                    && namespace.is_none_or(|pattern| {
                        node.tag_name()
                            .namespace()
                            .is_some_and(|uri| namespace_matches(pattern, uri))
                    })
            }
        };

        name_ok
            && self.predicates.iter().all(|predicate| match predicate {
                Predicate::Attribute {
                    namespace,
                    name,
                    value,
                } => node
                    .attributes()
                    .find(|attr| {
                        attr.name() == name
                            && match namespace {
                                None => attr.namespace().is_none(),
                                Some(pattern) => attr
                                    .namespace()
                                    .is_some_and(|uri| namespace_matches(pattern, uri)),
                            }
                    })
                    .is_some_and(|attr| value.as_deref().is_none_or(|v| attr.value() == v)),
                Predicate::Position(_) => true,
            })
    }
}

/// Split on `/` outside predicates and quotes.
fn split_segments(path: &str) -> Vec<&str> {
    let mut segments = Vec::new();
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut start = 0;

    for (i, c) in path.char_indices() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '\'' | '"') => quote = Some(c),
            (None, '[') => depth += 1,
            (None, ']') => depth = depth.saturating_sub(1),
            (None, '/') if depth == 0 => {
                segments.push(&path[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    segments.push(&path[start..]);
    segments
}

fn parse_step(segment: &str, axis: Axis, config: &DialectConfig, path: &str) -> Result<Step> {
    let invalid = |reason: String| {
        ParserError::ParserConfiguration(format!("Invalid path '{path}': {reason}"))
    };

    let (name, mut rest) = match segment.find('[') {
        Some(i) => (&segment[..i], &segment[i..]),
        None => (segment, ""),
    };

    let test = match name {
        "*" => NameTest::Any,
        "" => return Err(invalid(format!("missing element name in '{segment}'"))),
        name => {
            let (namespace, local) = resolve_name(name, config).map_err(invalid)?;
            NameTest::Name {
                namespace,
                local: local.to_string(),
            }
        }
    };

    let mut predicates = Vec::new();
    while !rest.is_empty() {
        let body_end = rest
            .find(']')
            .ok_or_else(|| invalid(format!("unclosed predicate in '{segment}'")))?;
        let body = rest[1..body_end].trim();
        rest = &rest[body_end + 1..];

        if let Some(attribute) = body.strip_prefix('@') {
            let (attr_name, value) = match attribute.split_once('=') {
                Some((n, v)) => {
                    let v = v.trim();
                    let unquoted = v
                        .strip_prefix('\'')
                        .and_then(|s| s.strip_suffix('\''))
                        .or_else(|| v.strip_prefix('"').and_then(|s| s.strip_suffix('"')))
                        .ok_or_else(|| invalid(format!("unquoted value in '{body}'")))?;
                    (n.trim(), Some(unquoted.to_string()))
                }
                None => (attribute.trim(), None),
            };
            let (namespace, local) = match attr_name.split_once(':') {
                Some(("xml", local)) => (Some(XML_NAMESPACE), local),
                Some(_) => resolve_name(attr_name, config).map_err(invalid)?,
                None => (None, attr_name),
            };
            predicates.push(Predicate::Attribute {
                namespace,
                name: local.to_string(),
                value,
            });
        } else {
            let position: usize = body
                .parse()
                .ok()
                .filter(|p| *p > 0)
                .ok_or_else(|| invalid(format!("unsupported predicate '[{body}]'")))?;
            predicates.push(Predicate::Position(position));
        }
    }

    Ok(Step {
        axis,
        test,
        predicates,
    })
}

fn resolve_name<'n>(
    name: &'n str,
    config: &DialectConfig,
) -> std::result::Result<(Option<&'static str>, &'n str), String> {
    match name.split_once(':') {
        Some((prefix, local)) => config
            .namespace(prefix)
            .map(|uri| (Some(uri), local))
            .ok_or_else(|| format!("unknown namespace prefix '{prefix}'")),
        None => Ok((None, name)),
    }
}
