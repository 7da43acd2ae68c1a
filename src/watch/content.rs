use crate::error::Result;
use crate::page::{Hook, HookId, Page};
use std::time::{Duration, Instant};

struct ContentWatch<K> {
    hook: HookId,
    key: K,
    settle: Duration,
    deadline: Option<Instant>,
    burst_start: Option<Instant>,
}

/// Debounced subtree watch registrations
///
/// Each mutation pushes the registration's deadline out to `now + settle`. A
/// registration fires once when its deadline passes without further mutations.
/// A burst that never quiets down still fires `ceiling` after it began.
pub struct ContentWatchers<K> {
    watches: Vec<ContentWatch<K>>,
    ceiling: Duration,
}

impl<K: Copy> ContentWatchers<K> {
    pub fn new(ceiling: Duration) -> Self {
        Self { watches: Vec::new(), ceiling }
    }

    /// Observe the subtree(s) at `selector`; the caller runs the task once right away to seed
    pub fn watch(&mut self, page: &mut dyn Page, key: K, selector: &str, settle: Duration) -> Result<HookId> {
        let hook = page.install(Hook::Subtree { selector: selector.to_string() })?;
        self.watches.push(ContentWatch { hook, key, settle, deadline: None, burst_start: None });
        Ok(hook)
    }

    /// Record a mutation; returns the key when the registration fires without settling
    pub fn on_mutation(&mut self, hook: HookId, now: Instant) -> Option<K> {
        let ceiling = self.ceiling;
        let watch = self.watches.iter_mut().find(|w| w.hook == hook)?;

        if watch.settle.is_zero() {
            return Some(watch.key);
        }

        let burst_start = *watch.burst_start.get_or_insert(now);
        let deadline = (now + watch.settle).min(burst_start + ceiling.max(watch.settle));
        watch.deadline = Some(deadline);
        None
    }

    /// Earliest pending deadline
    pub fn next_deadline(&self) -> Option<Instant> {
        self.watches.iter().filter_map(|w| w.deadline).min()
    }

    /// Keys of every registration whose deadline has passed, in registration order
    pub fn fire_due(&mut self, now: Instant) -> Vec<K> {
        let mut due = Vec::new();
        for watch in &mut self.watches {
            if watch.deadline.is_some_and(|d| d <= now) {
                watch.deadline = None;
                watch.burst_start = None;
                due.push(watch.key);
            }
        }
        due
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

    /// Forget every registration and pending deadline
    pub fn clear(&mut self) {
        self.watches.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::ElementNode;
    use crate::page::MemoryPage;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    fn setup(settle: Duration) -> (MemoryPage, ContentWatchers<u8>, HookId) {
        let mut page = MemoryPage::new(
            ElementNode::new("body").with_child(ElementNode::new("div").with_attribute("id", "main")),
            "#/now",
        );
        let mut watchers = ContentWatchers::new(ms(5000));
        let hook = watchers.watch(&mut page, 7, "#main", settle).unwrap();
        (page, watchers, hook)
    }

    #[test]
    fn test_burst_fires_once_after_settle() {
        let (_page, mut watchers, hook) = setup(ms(500));
        let t0 = Instant::now();

        for i in 0..5 {
            assert_eq!(watchers.on_mutation(hook, t0 + ms(i * 100)), None);
        }
        let last = t0 + ms(400);

        assert!(watchers.fire_due(last + ms(499)).is_empty());
        assert_eq!(watchers.next_deadline(), Some(last + ms(500)));
        assert_eq!(watchers.fire_due(last + ms(500)), vec![7]);
        assert!(watchers.fire_due(last + ms(2000)).is_empty());
        assert_eq!(watchers.next_deadline(), None);
    }

    #[test]
    fn test_zero_settle_fires_every_mutation() {
        let (_page, mut watchers, hook) = setup(Duration::ZERO);
        let t0 = Instant::now();
        assert_eq!(watchers.on_mutation(hook, t0), Some(7));
        assert_eq!(watchers.on_mutation(hook, t0), Some(7));
        assert_eq!(watchers.next_deadline(), None);
    }

    #[test]
    fn test_continuous_mutation_cannot_starve() {
        let (_page, mut watchers, hook) = setup(ms(500));
        let t0 = Instant::now();
        let mut fired = Vec::new();

        for i in 0..100 {
            let now = t0 + ms(i * 100);
            fired.extend(watchers.fire_due(now).into_iter().map(|_| now));
            watchers.on_mutation(hook, now);
        }

        assert_eq!(fired.first().copied(), Some(t0 + ms(5000)));
    }

    #[test]
    fn test_unknown_hook_ignored() {
        let (_page, mut watchers, _) = setup(ms(500));
        assert_eq!(watchers.on_mutation(HookId(42), Instant::now()), None);
        assert_eq!(watchers.next_deadline(), None);
    }

    #[test]
    fn test_missing_target() {
        let mut page = MemoryPage::new(ElementNode::new("body"), "#/now");
        let mut watchers: ContentWatchers<u8> = ContentWatchers::new(ms(5000));
        assert!(watchers.watch(&mut page, 1, "#main", ms(500)).is_err());
        assert!(watchers.is_empty());
    }
}
