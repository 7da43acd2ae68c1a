//! In-memory page used by tests and offline runs
//!
//! Hooks bind to element positions at install time, the way DOM observers bind
//! to nodes. Mutations made through the `MemoryPage` API generate the same
//! events a browser would report for those hooks.

use crate::dom::tree::contains_path;
use crate::dom::{DomTree, ElementNode, NodePath};
use crate::error::{Result, ScriptError};
use crate::page::{Hook, HookId, Page, PageEvent};
use indexmap::IndexMap;
use serde_json::Value;
use std::collections::VecDeque;

#[derive(Debug, Clone)]
struct InstalledHook {
    hook: Hook,
    targets: Vec<NodePath>,
}

/// A page backed by a [`DomTree`]
#[derive(Debug, Clone)]
pub struct MemoryPage {
    tree: DomTree,
    hash: String,
    next_hook: u64,
    hooks: IndexMap<HookId, InstalledHook>,
    events: VecDeque<PageEvent>,
    posted: Vec<Value>,
    injected: Vec<String>,
    hash_writes: Vec<String>,
    unloaded: bool,
}

impl MemoryPage {
    /// Create a page showing `root` at `hash`
    pub fn new(root: ElementNode, hash: impl Into<String>) -> Self {
        Self {
            tree: DomTree::new(root),
            hash: hash.into(),
            next_hook: 1,
            hooks: IndexMap::new(),
            events: VecDeque::new(),
            posted: Vec::new(),
            injected: Vec::new(),
            hash_writes: Vec::new(),
            unloaded: false,
        }
    }

    /// Number of hooks currently installed
    pub fn hook_count(&self) -> usize {
        self.hooks.len()
    }

    /// Messages the script posted on the window bus
    pub fn posted_messages(&self) -> &[Value] {
        &self.posted
    }

    /// Take and clear the posted window messages
    pub fn take_posted_messages(&mut self) -> Vec<Value> {
        std::mem::take(&mut self.posted)
    }

    /// Script sources injected into the page
    pub fn injected_scripts(&self) -> &[String] {
        &self.injected
    }

    /// Hashes the script assigned, in order
    pub fn hash_writes(&self) -> &[String] {
        &self.hash_writes
    }

    fn first_path(&self, selector: &str) -> Result<NodePath> {
        self.tree
            .find_path(selector)?
            .ok_or_else(|| ScriptError::ElementMissing(selector.to_string()))
    }

    /// Set an attribute on the first element matching `selector`
    pub fn set_attribute(&mut self, selector: &str, name: &str, value: &str) -> Result<()> {
        let path = self.first_path(selector)?;
        self.tree.expect_node_mut(&path, selector)?.set_attribute(name, value);
        self.emit_mutation(&path, Some(name))
    }

    /// Remove an attribute from the first element matching `selector`
    pub fn remove_attribute(&mut self, selector: &str, name: &str) -> Result<()> {
        let path = self.first_path(selector)?;
        self.tree.expect_node_mut(&path, selector)?.remove_attribute(name);
        self.emit_mutation(&path, Some(name))
    }

    /// Replace the own text of the first element matching `selector`
    pub fn set_text(&mut self, selector: &str, text: &str) -> Result<()> {
        let path = self.first_path(selector)?;
        self.tree.expect_node_mut(&path, selector)?.text_content = Some(text.to_string());
        self.emit_mutation(&path, None)
    }

    /// Replace the children of the first element matching `selector`
    pub fn set_children(&mut self, selector: &str, children: Vec<ElementNode>) -> Result<()> {
        let path = self.first_path(selector)?;
        self.tree.expect_node_mut(&path, selector)?.children = children;
        self.emit_mutation(&path, None)
    }

    /// Navigate as the page itself would (user click, redirect)
    pub fn navigate(&mut self, hash: &str) {
        self.change_hash(hash.to_string());
    }

    /// Deliver a window message
    pub fn deliver_message(&mut self, same_source: bool, data: Value) {
        let hooks: Vec<HookId> = self
            .hooks
            .iter()
            .filter(|(_, h)| matches!(h.hook, Hook::WindowMessages))
            .map(|(id, _)| *id)
            .collect();
        for hook in hooks {
            self.events.push_back(PageEvent::WindowMessage { hook, same_source, data: data.clone() });
        }
    }

    /// Replace the document the way a reload does; every hook and queued event is lost
    pub fn unload(&mut self) {
        self.hooks.clear();
        self.events.clear();
        self.unloaded = true;
    }

    /// Click the first element matching `selector`
    pub fn click(&mut self, selector: &str) -> Result<()> {
        let path = self.first_path(selector)?;
        let clicked: Vec<HookId> = self
            .hooks
            .iter()
            .filter(|(_, h)| matches!(h.hook, Hook::Decorate { .. }) && h.targets.contains(&path))
            .map(|(id, _)| *id)
            .collect();
        for hook in clicked {
            self.events.push_back(PageEvent::DecorationClicked { hook });
        }
        Ok(())
    }

    fn change_hash(&mut self, hash: String) {
        if hash == self.hash {
            return;
        }
        self.hash = hash;
        let hooks: Vec<HookId> = self
            .hooks
            .iter()
            .filter(|(_, h)| matches!(h.hook, Hook::HashChange))
            .map(|(id, _)| *id)
            .collect();
        for hook in hooks {
            self.events.push_back(PageEvent::HashChanged { hook, hash: self.hash.clone() });
        }
    }

    fn emit_mutation(&mut self, path: &[usize], attribute: Option<&str>) -> Result<()> {
        let mut events = Vec::new();

        for (id, installed) in &self.hooks {
            match &installed.hook {
                Hook::Attributes { attributes, .. } => {
                    let Some(name) = attribute else { continue };
                    if installed.targets.iter().any(|t| t.as_slice() == path)
                        && attributes.iter().any(|a| a == name)
                    {
                        if let Some(element) = self.tree.node(path) {
                            events.push(PageEvent::AttributeChanged {
                                hook: *id,
                                element: element.clone(),
                                attribute: name.to_string(),
                            });
                        }
                    }
                }
                Hook::Subtree { .. } => {
                    if installed.targets.iter().any(|t| contains_path(t, path)) {
                        events.push(PageEvent::SubtreeChanged { hook: *id });
                    }
                }
                Hook::Delegated { target, .. } => {
                    let Some(root) = installed.targets.first() else { continue };
                    if !contains_path(root, path) {
                        continue;
                    }
                    let matched = self.tree.find_paths(target)?;
                    for len in (root.len() + 1..=path.len()).rev() {
                        let candidate = &path[..len];
                        if !matched.iter().any(|m| m.as_slice() == candidate) {
                            continue;
                        }
                        let Some(element) = self.tree.node(candidate) else { continue };
                        let row_index = if len >= 2 { candidate[len - 2] } else { 0 };
                        events.push(PageEvent::DelegatedChanged { hook: *id, element: element.clone(), row_index });
                    }
                }
                Hook::HashChange | Hook::WindowMessages | Hook::Decorate { .. } => {}
            }
        }

        self.events.extend(events);
        Ok(())
    }
}

impl Page for MemoryPage {
    fn query(&self, selector: &str) -> Result<Option<ElementNode>> {
        self.tree.query(selector)
    }

    fn query_all(&self, selector: &str) -> Result<Vec<ElementNode>> {
        self.tree.query_all(selector)
    }

    fn location_hash(&self) -> Result<String> {
        Ok(self.hash.clone())
    }

    fn set_location_hash(&mut self, hash: &str) -> Result<()> {
        self.hash_writes.push(hash.to_string());
        self.change_hash(format!("#{}", hash));
        Ok(())
    }

    fn post_message(&mut self, message: &Value) -> Result<()> {
        self.posted.push(message.clone());
        Ok(())
    }

    fn inject_script(&mut self, src: &str) -> Result<()> {
        self.injected.push(src.to_string());
        Ok(())
    }

    fn install(&mut self, hook: Hook) -> Result<HookId> {
        let targets = match &hook {
            Hook::Attributes { selector, .. } => vec![self.first_path(selector)?],
            Hook::Delegated { root, .. } => vec![self.first_path(root)?],
            Hook::Subtree { selector } | Hook::Decorate { selector, .. } => {
                let paths = self.tree.find_paths(selector)?;
                if paths.is_empty() {
                    return Err(ScriptError::ElementMissing(selector.clone()));
                }
                paths
            }
            Hook::HashChange | Hook::WindowMessages => Vec::new(),
        };

        if let Hook::Decorate { decoration, .. } = &hook {
            let style = format!("background: url({}); cursor: pointer;", decoration.background_url);
            for path in &targets {
                if let Some(node) = self.tree.node_mut(path) {
                    node.set_attribute("style", style.clone());
                    node.set_attribute("title", decoration.title.clone());
                }
            }
        }

        let id = HookId(self.next_hook);
        self.next_hook += 1;
        self.hooks.insert(id, InstalledHook { hook, targets });
        Ok(id)
    }

    fn uninstall(&mut self, id: HookId) -> Result<()> {
        let installed = self.hooks.shift_remove(&id).ok_or(ScriptError::UnknownHook(id.0))?;
        if let Hook::Decorate { .. } = installed.hook {
            for path in &installed.targets {
                if let Some(node) = self.tree.node_mut(path) {
                    node.remove_attribute("style");
                    node.remove_attribute("title");
                }
            }
        }
        self.events.retain(|event| event.hook() != id);
        Ok(())
    }

    fn poll_events(&mut self) -> Result<Vec<PageEvent>> {
        if self.unloaded {
            return Err(ScriptError::PageUnloaded);
        }
        Ok(self.events.drain(..).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page::Decoration;

    fn page() -> MemoryPage {
        let root = ElementNode::new("body")
            .with_child(ElementNode::new("div").with_attribute("id", "vslider").with_attribute("aria-valuenow", "70"))
            .with_child(
                ElementNode::new("div").with_attribute("id", "main").with_child(
                    ElementNode::new("table").with_child(
                        ElementNode::new("tbody")
                            .with_child(
                                ElementNode::new("tr").with_attribute("class", "song-row").with_child(
                                    ElementNode::new("td").with_attribute("data-col", "rating").with_attribute("data-rating", "0"),
                                ),
                            )
                            .with_child(
                                ElementNode::new("tr").with_attribute("class", "song-row").with_child(
                                    ElementNode::new("td").with_attribute("data-col", "rating").with_attribute("data-rating", "5"),
                                ),
                            ),
                    ),
                ),
            )
            .with_child(ElementNode::new("div").with_attribute("class", "music-banner-icon"));
        MemoryPage::new(root, "#/now")
    }

    #[test]
    fn test_attribute_hook_respects_filter() {
        let mut page = page();
        let hook = page
            .install(Hook::Attributes { selector: "#vslider".into(), attributes: vec!["aria-valuenow".into()] })
            .unwrap();

        page.set_attribute("#vslider", "aria-valuenow", "40").unwrap();
        page.set_attribute("#vslider", "aria-label", "Volume").unwrap();

        let events = page.poll_events().unwrap();
        assert_eq!(events.len(), 1);
        match &events[0] {
            PageEvent::AttributeChanged { hook: h, element, attribute } => {
                assert_eq!(*h, hook);
                assert_eq!(attribute, "aria-valuenow");
                assert_eq!(element.attr("aria-valuenow"), Some("40"));
            }
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[test]
    fn test_install_on_missing_element_fails() {
        let mut page = page();
        let result = page.install(Hook::Subtree { selector: "#playerSongInfo".into() });
        assert!(matches!(result, Err(ScriptError::ElementMissing(_))));
        assert_eq!(page.hook_count(), 0);
    }

    #[test]
    fn test_delegated_reports_row_index() {
        let mut page = page();
        page.install(Hook::Delegated { root: "#main".into(), target: ".song-row td[data-col='rating']".into() })
            .unwrap();

        let second_cell = "#main tr.song-row td[data-rating='5']";
        page.set_attribute(second_cell, "data-rating", "4").unwrap();

        let events = page.poll_events().unwrap();
        assert_eq!(events.len(), 1);
        assert!(matches!(&events[0], PageEvent::DelegatedChanged { row_index: 1, element, .. }
            if element.data("rating") == Some("4")));
    }

    #[test]
    fn test_subtree_hook_fires_for_descendants() {
        let mut page = page();
        let hook = page.install(Hook::Subtree { selector: "#main".into() }).unwrap();
        page.set_text("#main td", "x").unwrap();
        page.set_text("#vslider", "y").unwrap();
        assert_eq!(page.poll_events().unwrap(), vec![PageEvent::SubtreeChanged { hook }]);
    }

    #[test]
    fn test_hash_changes() {
        let mut page = page();
        let hook = page.install(Hook::HashChange).unwrap();

        page.set_location_hash("/rd").unwrap();
        page.set_location_hash("/rd").unwrap();
        assert_eq!(page.location_hash().unwrap(), "#/rd");
        assert_eq!(page.hash_writes(), ["/rd", "/rd"]);
        assert_eq!(page.poll_events().unwrap(), vec![PageEvent::HashChanged { hook, hash: "#/rd".into() }]);
    }

    #[test]
    fn test_decoration_applied_and_reverted() {
        let mut page = page();
        let decoration = Decoration { background_url: "img/on.png".into(), title: "connected".into() };
        let hook = page
            .install(Hook::Decorate { selector: ".music-banner-icon".into(), decoration })
            .unwrap();

        let icon = page.query(".music-banner-icon").unwrap().unwrap();
        assert_eq!(icon.attr("title"), Some("connected"));

        page.click(".music-banner-icon").unwrap();
        assert_eq!(page.poll_events().unwrap(), vec![PageEvent::DecorationClicked { hook }]);

        page.uninstall(hook).unwrap();
        let icon = page.query(".music-banner-icon").unwrap().unwrap();
        assert_eq!(icon.attr("title"), None);
        assert_eq!(icon.attr("style"), None);
        assert!(page.uninstall(hook).is_err());
    }

    #[test]
    fn test_unload_drops_hooks_and_fails_polling() {
        let mut page = page();
        page.install(Hook::Subtree { selector: "#main".into() }).unwrap();
        page.set_text("#main td", "x").unwrap();

        page.unload();
        assert_eq!(page.hook_count(), 0);
        assert!(matches!(page.poll_events(), Err(ScriptError::PageUnloaded)));
    }

    #[test]
    fn test_uninstall_drops_pending_events() {
        let mut page = page();
        let hook = page.install(Hook::Subtree { selector: "#main".into() }).unwrap();
        page.set_text("#main td", "x").unwrap();
        page.uninstall(hook).unwrap();
        assert!(page.poll_events().unwrap().is_empty());
    }
}
