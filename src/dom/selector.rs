use crate::error::{Result, ScriptError};

/// A compiled CSS selector
///
/// Only standard CSS is accepted; callers that want the first match take it
/// from the selection instead of writing `:first`.
#[derive(Debug, Clone)]
pub struct Selector {
    source: String,
    compiled: scraper::Selector,
}

impl Selector {
    pub fn parse(input: &str) -> Result<Self> {
        let compiled = scraper::Selector::parse(input).map_err(|e| ScriptError::InvalidSelector {
            selector: input.to_string(),
            reason: e.to_string(),
        })?;
        Ok(Self { source: input.to_string(), compiled })
    }

    /// The selector as written
    pub fn as_str(&self) -> &str {
        &self.source
    }

    pub(crate) fn compiled(&self) -> &scraper::Selector {
        &self.compiled
    }
}
