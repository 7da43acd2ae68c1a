//! Watch registrations over the host page
//!
//! - AttributeWatchers: attribute observers that emit a normalized value on
//!   every change, seeded once at registration
//! - ContentWatchers: subtree observers whose callbacks run once mutation
//!   activity has settled

pub mod attribute;
pub mod content;

pub use attribute::{AttributeWatchers, Extractor, raw_attribute};
pub use content::ContentWatchers;
