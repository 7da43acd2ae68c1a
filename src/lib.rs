//! # primeplayer-content
//!
//! The content side of the PrimePlayer remote: watches the Google Play Music web
//! player, relays its state to a background process and forwards commands back
//! into the page.
//!
//! ## Features
//!
//! - **Watchers**: attribute observers and debounced subtree observers over the player markup
//! - **Navigation**: drives the single-page app to a view and resumes once it has rendered
//! - **Relay**: typed messages on the background channel and the page's window bus
//! - **Cleanup**: removes every observer, listener and decoration when the channel closes
//!
//! ## Running against Chrome
//!
//! ```bash
//! # Attach to (or open) the player tab in a visible browser
//! cargo run -- --user-data-dir ~/.primeplayer-profile
//!
//! # Use an already running browser
//! cargo run -- --ws-endpoint ws://127.0.0.1:9222/devtools/browser/<id>
//! ```
//!
//! The binary speaks the background channel as one JSON message per line on
//! stdin/stdout.
//!
//! ## Library Usage
//!
//! The script is sans-IO: the caller feeds it messages, page events and the
//! clock. [`MemoryPage`] stands in for the browser:
//!
//! ```rust
//! use primeplayer_content::{ContentScript, ElementNode, InboundMessage, MemoryPage, ScriptConfig, ToBackground};
//! use std::time::Instant;
//! use tokio::sync::mpsc::unbounded_channel;
//!
//! let volume = ElementNode::new("div").with_attribute("id", "vslider").with_attribute("aria-valuenow", "70");
//! let page = MemoryPage::new(ElementNode::new("body").with_child(volume), "#/now");
//!
//! let (tx, mut rx) = unbounded_channel();
//! let mut script = ContentScript::connect(page, ScriptConfig::default(), tx);
//! script.handle_port_message(InboundMessage::Connected);
//! script.pump(Instant::now());
//!
//! while let Ok(ToBackground::Message(message)) = rx.try_recv() {
//!     println!("{}", serde_json::to_string(&message).unwrap());
//! }
//! ```
//!
//! ## Module Overview
//!
//! - [`page`]: the [`Page`] trait and its in-memory and Chrome backends
//! - [`dom`]: element snapshots, their HTML form, and CSS selectors compiled with `scraper`
//! - [`watch`]: attribute and debounced content watchers
//! - [`navigation`]: the navigation state machine
//! - [`scrape`]: extraction of song info, quick links and navigation lists
//! - [`protocol`]: background and window-bus messages
//! - [`script`]: the session tying it all together
//! - [`browser`]: Chrome launch and tab lookup
//! - [`config`], [`error`]: options and error types

pub mod browser;
pub mod config;
pub mod dom;
pub mod error;
pub mod navigation;
pub mod page;
pub mod protocol;
pub mod scrape;
pub mod script;
pub mod watch;

pub use browser::{BrowserSession, ConnectionOptions, LaunchOptions};
pub use config::ScriptConfig;
pub use dom::{DomTree, ElementNode, Selector};
pub use error::{Result, ScriptError};
pub use navigation::{Completion, Continuation, NavState, Navigator};
pub use page::{CdpPage, MemoryPage, Page, PageEvent};
pub use protocol::{ChannelSession, InboundMessage, OutboundMessage, Route, ToBackground};
pub use script::{ContentScript, ContentTask};
