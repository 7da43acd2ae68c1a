use crate::dom::ElementNode;
use crate::dom::html::parse_outer_html;
use crate::error::{Result, ScriptError};
use crate::page::{Hook, HookId, Page, PageEvent};
use headless_chrome::Tab;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;

/// A live page in a Chrome tab, driven over the DevTools protocol
///
/// Observers run page-side inside a small bridge script; their events queue up
/// in the page until [`Page::poll_events`] drains them. Elements cross over as
/// `outerHTML` and are parsed back into snapshots here.
pub struct CdpPage {
    tab: Arc<Tab>,
}

impl CdpPage {
    /// Install the bridge into `tab`
    pub fn attach(tab: Arc<Tab>) -> Result<Self> {
        let page = Self { tab };
        page.evaluate(include_str!("bridge.js"))?;
        Ok(page)
    }

    /// The underlying tab
    pub fn tab(&self) -> &Arc<Tab> {
        &self.tab
    }

    fn evaluate(&self, expression: &str) -> Result<Option<Value>> {
        let result = self
            .tab
            .evaluate(expression, false)
            .map_err(|e| ScriptError::PageOperationFailed(format!("Failed to evaluate script: {}", e)))?;
        Ok(result.value)
    }

    fn call(&self, function: &str, args: &[Value]) -> Result<Option<Value>> {
        let args = args.iter().map(Value::to_string).collect::<Vec<_>>().join(", ");
        self.evaluate(&format!("window.__primeplayerBridge.{}({})", function, args))
    }

    /// Call a bridge function that returns a JSON string
    fn call_json<T: DeserializeOwned>(&self, function: &str, args: &[Value]) -> Result<T> {
        let value = self
            .call(function, args)?
            .ok_or_else(|| ScriptError::PageOperationFailed(format!("No value returned from {}", function)))?;
        let json: String = serde_json::from_value(value)?;
        Ok(serde_json::from_str(&json)?)
    }
}

impl Page for CdpPage {
    fn query(&self, selector: &str) -> Result<Option<ElementNode>> {
        let html: Option<String> = self.call_json("query", &[Value::from(selector), Value::Bool(false)])?;
        html.as_deref().map(parse_outer_html).transpose()
    }

    fn query_all(&self, selector: &str) -> Result<Vec<ElementNode>> {
        let html: Vec<String> = self.call_json("query", &[Value::from(selector), Value::Bool(true)])?;
        html.iter().map(|el| parse_outer_html(el)).collect()
    }

    fn location_hash(&self) -> Result<String> {
        let value = self.evaluate("location.hash")?;
        Ok(value.and_then(|v| v.as_str().map(str::to_string)).unwrap_or_default())
    }

    fn set_location_hash(&mut self, hash: &str) -> Result<()> {
        self.evaluate(&format!("location.hash = {}", Value::from(hash)))?;
        Ok(())
    }

    fn post_message(&mut self, message: &Value) -> Result<()> {
        self.call("post", std::slice::from_ref(message))?;
        Ok(())
    }

    fn inject_script(&mut self, src: &str) -> Result<()> {
        self.call("inject", &[Value::from(src)])?;
        Ok(())
    }

    fn install(&mut self, hook: Hook) -> Result<HookId> {
        let value = self.call("install", &[serde_json::to_value(&hook)?])?.and_then(|v| v.as_u64());
        match (value, hook) {
            (Some(id), _) => Ok(HookId(id)),
            (None, Hook::Attributes { selector, .. })
            | (None, Hook::Subtree { selector })
            | (None, Hook::Decorate { selector, .. })
            | (None, Hook::Delegated { root: selector, .. }) => Err(ScriptError::ElementMissing(selector)),
            (None, hook) => Err(ScriptError::PageOperationFailed(format!("Failed to install {:?}", hook))),
        }
    }

    fn uninstall(&mut self, id: HookId) -> Result<()> {
        let removed = self.call("uninstall", &[Value::from(id.0)])?.and_then(|v| v.as_bool());
        match removed {
            Some(true) => Ok(()),
            _ => Err(ScriptError::UnknownHook(id.0)),
        }
    }

    fn poll_events(&mut self) -> Result<Vec<PageEvent>> {
        // a new document has no bridge, and none of our hooks
        let drained = self.evaluate("window.__primeplayerBridge ? window.__primeplayerBridge.drain() : null")?;
        match drained {
            Some(Value::String(json)) => Ok(serde_json::from_str(&json)?),
            _ => Err(ScriptError::PageUnloaded),
        }
    }
}
