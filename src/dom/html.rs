//! HTML form of element snapshots
//!
//! Chrome hands us `outerHTML`; the in-memory page renders its tree the same
//! way. Both go through `scraper`, which also runs every selector match.

use crate::dom::element::ElementNode;
use crate::dom::selector::Selector;
use crate::dom::tree::NodePath;
use crate::error::{Result, ScriptError};
use scraper::node::Node;
use scraper::{ElementRef, Html};
use std::fmt::Write;

/// Marks rendered elements with their position so matches map back onto the tree
const PATH_ATTRIBUTE: &str = "data-snapshot-path";

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track", "wbr",
];

/// Markup the parser needs around a lone `tag` to keep it where it is
fn context_for(tag: &str) -> (&'static str, &'static str) {
    match tag {
        "tr" => ("<table><tbody>", "</tbody></table>"),
        "td" | "th" => ("<table><tbody><tr>", "</tr></tbody></table>"),
        "tbody" | "thead" | "tfoot" | "caption" | "colgroup" => ("<table>", "</table>"),
        "col" => ("<table><colgroup>", "</colgroup></table>"),
        "option" | "optgroup" => ("<select>", "</select>"),
        _ => ("", ""),
    }
}

fn parse_in_context(tag: &str, html: &str) -> Html {
    let (open, close) = context_for(tag);
    Html::parse_document(&format!("{}{}{}", open, html, close))
}

fn escape_text(text: &str) -> String {
    text.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

fn escape_attribute(value: &str) -> String {
    value.replace('&', "&amp;").replace('"', "&quot;")
}

fn write_element(node: &ElementNode, path: Option<&mut NodePath>, out: &mut String) {
    out.push('<');
    out.push_str(&node.tag_name);

    let mut attributes: Vec<_> = node.attributes.iter().collect();
    attributes.sort();
    for (name, value) in attributes {
        let _ = write!(out, " {}=\"{}\"", name, escape_attribute(value));
    }
    if let Some(path) = path.as_deref() {
        let marker = path.iter().map(usize::to_string).collect::<Vec<_>>().join(".");
        let _ = write!(out, " {}=\"{}\"", PATH_ATTRIBUTE, marker);
    }
    out.push('>');

    if VOID_ELEMENTS.contains(&node.tag_name.as_str()) {
        return;
    }
    if let Some(text) = &node.text_content {
        out.push_str(&escape_text(text));
    }
    match path {
        Some(path) => {
            for (i, child) in node.children.iter().enumerate() {
                path.push(i);
                write_element(child, Some(&mut *path), out);
                path.pop();
            }
        }
        None => {
            for child in &node.children {
                write_element(child, None, out);
            }
        }
    }
    let _ = write!(out, "</{}>", node.tag_name);
}

/// Outer HTML of `node`, attributes in name order
pub fn outer_html(node: &ElementNode) -> String {
    let mut out = String::new();
    write_element(node, None, &mut out);
    out
}

fn parse_path(marker: &str) -> Option<NodePath> {
    if marker.is_empty() {
        return Some(Vec::new());
    }
    marker.split('.').map(|i| i.parse().ok()).collect()
}

/// Paths below `root` (itself included, as `[]`) of the elements matching `selector`, in document order
pub fn match_paths(root: &ElementNode, selector: &Selector) -> Vec<NodePath> {
    let mut html = String::new();
    write_element(root, Some(&mut Vec::new()), &mut html);

    let document = parse_in_context(&root.tag_name, &html);
    let paths = document
        .select(selector.compiled())
        .filter_map(|el| el.value().attr(PATH_ATTRIBUTE))
        .filter_map(parse_path)
        .collect();
    paths
}

/// Snapshot of a parsed element and its subtree
pub fn snapshot(element: ElementRef<'_>) -> ElementNode {
    let mut node = ElementNode::new(element.value().name());
    for (name, value) in element.value().attrs() {
        if name != PATH_ATTRIBUTE {
            node.set_attribute(name, value);
        }
    }

    let mut text = String::new();
    for child in element.children() {
        match child.value() {
            Node::Text(t) => text.push_str(t),
            Node::Element(_) => {
                if let Some(child) = ElementRef::wrap(child) {
                    node.children.push(snapshot(child));
                }
            }
            _ => {}
        }
    }
    if !text.is_empty() {
        node.text_content = Some(text);
    }
    node
}

fn opening_tag(html: &str) -> Option<String> {
    let rest = html.trim_start().strip_prefix('<')?;
    let tag: String = rest
        .chars()
        .take_while(|c| c.is_ascii_alphanumeric() || *c == '-')
        .collect::<String>()
        .to_ascii_lowercase();
    (!tag.is_empty()).then_some(tag)
}

/// Parse the `outerHTML` of a single element
pub fn parse_outer_html(html: &str) -> Result<ElementNode> {
    let not_an_element = || {
        let preview: String = html.chars().take(40).collect();
        ScriptError::PageOperationFailed(format!("Not an element: {}", preview))
    };
    let tag = opening_tag(html).ok_or_else(not_an_element)?;
    let selector = Selector::parse(&tag)?;

    let document = parse_in_context(&tag, html);
    let element = document.select(selector.compiled()).next().map(snapshot);
    element.ok_or_else(not_an_element)
}

/// Serde adapter carrying an [`ElementNode`] as its outer HTML
pub mod as_outer_html {
    use crate::dom::element::ElementNode;
    use serde::de::Error;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(node: &ElementNode, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&super::outer_html(node))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<ElementNode, D::Error> {
        let html = String::deserialize(deserializer)?;
        super::parse_outer_html(&html).map_err(D::Error::custom)
    }
}
