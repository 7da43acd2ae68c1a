//! Access to the host page
//!
//! The page is owned by someone else and changes under our feet, so every read
//! is a fallible snapshot and every observer is a [`Hook`] installed through the
//! [`Page`] trait. Asynchronous page activity (mutations, hash changes, window
//! messages, clicks on our decorations) comes back as [`PageEvent`]s drained by
//! [`Page::poll_events`].

pub mod cdp;
pub mod memory;

pub use cdp::CdpPage;
pub use memory::MemoryPage;

use crate::dom::ElementNode;
use crate::dom::html::as_outer_html;
use crate::error::Result;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Handle for an installed hook
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HookId(pub u64);

impl fmt::Display for HookId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "hook#{}", self.0)
    }
}

/// Visual marker applied to a page element
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Decoration {
    pub background_url: String,
    pub title: String,
}

/// Something the script wants to observe or change on the page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Hook {
    /// Attribute changes on the first element matching `selector`
    Attributes { selector: String, attributes: Vec<String> },
    /// Any change inside the elements matching `selector`
    Subtree { selector: String },
    /// Changes inside `root` bubbling through an element matching `target`
    Delegated { root: String, target: String },
    /// Location hash changes
    HashChange,
    /// Messages posted to the window
    WindowMessages,
    /// Decorate the elements matching `selector` and report clicks on them
    Decorate { selector: String, decoration: Decoration },
}

/// Asynchronous activity reported by the page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum PageEvent {
    /// An observed attribute changed; `element` is the snapshot after the change
    #[serde(rename_all = "camelCase")]
    AttributeChanged {
        hook: HookId,
        #[serde(with = "as_outer_html")]
        element: ElementNode,
        attribute: String,
    },
    /// Something inside an observed subtree changed
    SubtreeChanged { hook: HookId },
    /// A delegated target changed; `row_index` is the position of its parent among siblings
    #[serde(rename_all = "camelCase")]
    DelegatedChanged {
        hook: HookId,
        #[serde(with = "as_outer_html")]
        element: ElementNode,
        row_index: usize,
    },
    /// The location hash changed
    HashChanged { hook: HookId, hash: String },
    /// A window message arrived; `same_source` is true when the page window posted it
    #[serde(rename_all = "camelCase")]
    WindowMessage { hook: HookId, same_source: bool, data: Value },
    /// A decorated element was clicked
    DecorationClicked { hook: HookId },
}

impl PageEvent {
    /// Hook that produced the event
    pub fn hook(&self) -> HookId {
        match self {
            PageEvent::AttributeChanged { hook, .. }
            | PageEvent::SubtreeChanged { hook }
            | PageEvent::DelegatedChanged { hook, .. }
            | PageEvent::HashChanged { hook, .. }
            | PageEvent::WindowMessage { hook, .. }
            | PageEvent::DecorationClicked { hook } => *hook,
        }
    }
}

/// The host page as seen by the content script
pub trait Page {
    /// Snapshot of the first element matching `selector`
    fn query(&self, selector: &str) -> Result<Option<ElementNode>>;

    /// Snapshots of all elements matching `selector`, in document order
    fn query_all(&self, selector: &str) -> Result<Vec<ElementNode>>;

    /// Current location hash including the leading `#`
    fn location_hash(&self) -> Result<String>;

    /// Set the location hash (without the leading `#`)
    fn set_location_hash(&mut self, hash: &str) -> Result<()>;

    /// Post a message on the window bus, restricted to the page's own origin
    fn post_message(&mut self, message: &Value) -> Result<()>;

    /// Append a script element with the given source to the document head
    fn inject_script(&mut self, src: &str) -> Result<()>;

    /// Install a hook
    fn install(&mut self, hook: Hook) -> Result<HookId>;

    /// Remove a hook, reverting any decoration it applied
    fn uninstall(&mut self, id: HookId) -> Result<()>;

    /// Drain page activity since the last call
    fn poll_events(&mut self) -> Result<Vec<PageEvent>>;
}
