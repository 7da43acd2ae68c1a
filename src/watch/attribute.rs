use crate::dom::ElementNode;
use crate::error::{Result, ScriptError};
use crate::page::{Hook, HookId, Page};
use crate::protocol::{AttributeEvent, OutboundMessage};
use serde_json::Value;

/// Maps the mutated element and attribute name to the value sent to the background
pub type Extractor = Box<dyn Fn(&ElementNode, &str, &dyn Page) -> Value>;

/// Raw attribute value, or null when the attribute is absent
pub fn raw_attribute() -> Extractor {
    Box::new(|el, attribute, _| el.attr(attribute).map_or(Value::Null, Value::from))
}

struct AttributeWatch {
    hook: HookId,
    event: AttributeEvent,
    extractor: Extractor,
}

/// Attribute watch registrations
#[derive(Default)]
pub struct AttributeWatchers {
    watches: Vec<AttributeWatch>,
}

impl AttributeWatchers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Observe `attributes` on the element at `selector`
    ///
    /// Returns the seed message built from the current state. A missing element
    /// is reported as [`ScriptError::ElementMissing`] and nothing is installed.
    pub fn watch(
        &mut self,
        page: &mut dyn Page,
        attributes: &[&str],
        selector: &str,
        event: AttributeEvent,
        extractor: Option<Extractor>,
    ) -> Result<OutboundMessage> {
        let element = page.query(selector)?.ok_or_else(|| ScriptError::ElementMissing(selector.to_string()))?;
        let extractor = extractor.unwrap_or_else(raw_attribute);

        let hook = page.install(Hook::Attributes {
            selector: selector.to_string(),
            attributes: attributes.iter().map(|a| a.to_string()).collect(),
        })?;

        let seed = extractor(&element, attributes.first().copied().unwrap_or_default(), &*page);
        self.watches.push(AttributeWatch { hook, event, extractor });
        Ok(event.message(seed))
    }

    /// Message for an observed change, if `hook` belongs to an attribute watch
    pub fn on_change(
        &self,
        hook: HookId,
        element: &ElementNode,
        attribute: &str,
        page: &dyn Page,
    ) -> Option<OutboundMessage> {
        let watch = self.watches.iter().find(|w| w.hook == hook)?;
        Some(watch.event.message((watch.extractor)(element, attribute, page)))
    }

    pub fn hooks(&self) -> impl Iterator<Item = HookId> + '_ {
        self.watches.iter().map(|w| w.hook)
    }

    pub fn len(&self) -> usize {
        self.watches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.watches.is_empty()
    }

    /// Forget every registration; the hooks must be uninstalled by the caller
    pub fn clear(&mut self) {
        self.watches.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page::{MemoryPage, PageEvent};
    use serde_json::json;

    fn page() -> MemoryPage {
        let root = ElementNode::new("body")
            .with_child(ElementNode::new("div").with_attribute("id", "vslider").with_attribute("aria-valuenow", "70"));
        MemoryPage::new(root, "#/now")
    }

    #[test]
    fn test_seed_uses_current_value() {
        let mut page = page();
        let mut watchers = AttributeWatchers::new();
        let seed = watchers.watch(&mut page, &["aria-valuenow"], "#vslider", AttributeEvent::Volume, None).unwrap();

        assert_eq!(seed, OutboundMessage::Volume(json!("70")));
        assert_eq!(watchers.len(), 1);
        assert!(page.poll_events().unwrap().is_empty());
    }

    #[test]
    fn test_change_is_extracted() {
        let mut page = page();
        let mut watchers = AttributeWatchers::new();
        watchers.watch(&mut page, &["aria-valuenow"], "#vslider", AttributeEvent::Volume, None).unwrap();

        page.set_attribute("#vslider", "aria-valuenow", "35").unwrap();
        let events = page.poll_events().unwrap();
        let PageEvent::AttributeChanged { hook, element, attribute } = &events[0] else {
            panic!("expected attribute change");
        };
        assert_eq!(
            watchers.on_change(*hook, element, attribute, &page),
            Some(OutboundMessage::Volume(json!("35")))
        );
        assert_eq!(watchers.on_change(HookId(999), element, attribute, &page), None);
    }

    #[test]
    fn test_missing_element_installs_nothing() {
        let mut page = page();
        let mut watchers = AttributeWatchers::new();
        let result = watchers.watch(&mut page, &["value"], "#repeat", AttributeEvent::Repeat, None);

        assert!(matches!(result, Err(ScriptError::ElementMissing(_))));
        assert!(watchers.is_empty());
        assert_eq!(page.hook_count(), 0);
    }

    #[test]
    fn test_custom_extractor() {
        let mut page = page();
        let mut watchers = AttributeWatchers::new();
        let extractor: Extractor = Box::new(|el, _, _| json!(el.attr("aria-valuenow").map(|v| v.len())));
        let seed = watchers
            .watch(&mut page, &["aria-valuenow"], "#vslider", AttributeEvent::Volume, Some(extractor))
            .unwrap();
        assert_eq!(seed, OutboundMessage::Volume(json!(2)));
    }
}
