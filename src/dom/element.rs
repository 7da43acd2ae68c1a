use crate::dom::html;
use crate::dom::selector::Selector;
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Snapshot of a DOM element as read from the host page
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct ElementNode {
    /// HTML tag name (e.g., "div", "button", "li")
    pub tag_name: String,

    /// Element attributes (e.g., id, class, data-id)
    #[serde(default)]
    pub attributes: HashMap<String, String>,

    /// Text directly owned by the element
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_content: Option<String>,

    /// Child elements
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<ElementNode>,
}

impl ElementNode {
    /// Create a new ElementNode
    pub fn new(tag_name: impl Into<String>) -> Self {
        Self {
            tag_name: tag_name.into().to_ascii_lowercase(),
            attributes: HashMap::new(),
            text_content: None,
            children: Vec::new(),
        }
    }

    /// Builder method: add an attribute
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// Builder method: set text content
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text_content = Some(text.into());
        self
    }

    /// Builder method: append a child
    pub fn with_child(mut self, child: ElementNode) -> Self {
        self.children.push(child);
        self
    }

    /// Builder method: set children
    pub fn with_children(mut self, children: Vec<ElementNode>) -> Self {
        self.children = children;
        self
    }

    /// Set a single attribute
    pub fn set_attribute(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.attributes.insert(key.into(), value.into());
    }

    /// Remove an attribute, returning its previous value
    pub fn remove_attribute(&mut self, key: &str) -> Option<String> {
        self.attributes.remove(key)
    }

    /// Get attribute value by key
    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }

    /// Get a `data-*` attribute
    pub fn data(&self, key: &str) -> Option<&str> {
        self.attr(&format!("data-{}", key))
    }

    /// Check if element has a specific class
    pub fn has_class(&self, class_name: &str) -> bool {
        self.attr("class")
            .is_some_and(|classes| classes.split_whitespace().any(|c| c == class_name))
    }

    /// Whether the element carries the `disabled` attribute
    pub fn is_disabled(&self) -> bool {
        self.attributes.contains_key("disabled")
    }

    /// Check if element is a specific tag
    pub fn is_tag(&self, tag: &str) -> bool {
        self.tag_name.eq_ignore_ascii_case(tag)
    }

    /// Trimmed text of the element and all its descendants
    pub fn text(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out.trim().to_string()
    }

    fn collect_text(&self, out: &mut String) {
        if let Some(text) = &self.text_content {
            out.push_str(text);
        }
        for child in &self.children {
            child.collect_text(out);
        }
    }

    /// Element at `path` below this one; the empty path is the element itself
    pub fn descendant(&self, path: &[usize]) -> Option<&ElementNode> {
        path.iter().try_fold(self, |node, &i| node.children.get(i))
    }

    /// First descendant matching `selector`
    pub fn find(&self, selector: &str) -> Result<Option<&ElementNode>> {
        Ok(self.find_all(selector)?.into_iter().next())
    }

    /// All descendants matching `selector`, in document order
    pub fn find_all(&self, selector: &str) -> Result<Vec<&ElementNode>> {
        self.matching(selector, |path| !path.is_empty())
    }

    /// Direct children matching `selector`
    pub fn children_matching(&self, selector: &str) -> Result<Vec<&ElementNode>> {
        self.matching(selector, |path| path.len() == 1)
    }

    fn matching(&self, selector: &str, keep: impl Fn(&[usize]) -> bool) -> Result<Vec<&ElementNode>> {
        let selector = Selector::parse(selector)?;
        Ok(html::match_paths(self, &selector)
            .iter()
            .filter(|path| keep(path))
            .filter_map(|path| self.descendant(path))
            .collect())
    }
}
