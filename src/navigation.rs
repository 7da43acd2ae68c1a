//! Driving the page to a view and resuming once it has rendered
//!
//! The page only tells us a view is ready through the main-view content watch,
//! so a request is parked as a [`NavState`] until that signal arrives and the
//! route matches. At most one request is outstanding; a new request replaces
//! the pending one.

use crate::error::Result;
use crate::page::Page;
use crate::protocol::{PageCommand, Route};
use log::{debug, warn};
use serde_json::json;

/// What to do once the requested view is shown
#[derive(Debug, Clone, PartialEq)]
pub enum Continuation {
    /// Extract the list shown for `link` and post it
    NavigationList { link: String, omit_unknown_albums: bool },
    /// Start playback of the list at `link`
    StartPlaylist { link: Route },
}

/// A continuation ready to run; `error` is set when the view was unreachable
#[derive(Debug, Clone, PartialEq)]
pub struct Completion {
    pub continuation: Continuation,
    pub error: bool,
}

impl Completion {
    fn ok(continuation: Continuation) -> Self {
        Self { continuation, error: false }
    }

    fn failed(continuation: Continuation) -> Self {
        Self { continuation, error: true }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum NavState {
    Idle,
    /// Waiting for the main view; with a guard, only while the hash equals it
    Navigating { target: Route, guard: Option<String>, continuation: Continuation },
    /// A card was not on screen; waiting for the fallback listing to retry the click
    Searching { fallback: Route, target: Route, continuation: Continuation },
}

pub struct Navigator {
    state: NavState,
    fallback: Route,
    card_guard: String,
}

impl Navigator {
    pub fn new(fallback: Route, card_guard: impl Into<String>) -> Self {
        Self { state: NavState::Idle, fallback, card_guard: card_guard.into() }
    }

    pub fn state(&self) -> &NavState {
        &self.state
    }

    pub fn is_idle(&self) -> bool {
        self.state == NavState::Idle
    }

    /// Drop any pending request without running it
    pub fn reset(&mut self) {
        self.state = NavState::Idle;
    }

    /// Go to `route`, then run `continuation`
    ///
    /// Returns the completion right away when the page already shows `route` or
    /// when the route turns out to be unreachable; otherwise the request is parked
    /// and completes from [`Navigator::on_main_loaded`].
    pub fn select_and_execute(
        &mut self,
        page: &mut dyn Page,
        route: Route,
        continuation: Continuation,
    ) -> Option<Completion> {
        match self.try_select(page, route, continuation.clone()) {
            Ok(completion) => completion,
            Err(e) => {
                warn!("Navigation failed: {}", e);
                self.state = NavState::Idle;
                Some(Completion::failed(continuation))
            }
        }
    }

    fn try_select(&mut self, page: &mut dyn Page, route: Route, continuation: Continuation) -> Result<Option<Completion>> {
        let current = page.location_hash()?;
        if current == route.hash() {
            return Ok(Some(Completion::ok(continuation)));
        }

        if let NavState::Navigating { target, .. } | NavState::Searching { target, .. } = &self.state {
            debug!("Request for {} replaces pending navigation to {}", route, target);
        }

        let Some(card_id) = route.card_id().map(str::to_string) else {
            self.state = NavState::Navigating { target: route.clone(), guard: None, continuation };
            page.set_location_hash(&format!("/{}", route))?;
            return Ok(None);
        };

        if self.click_card(page, &card_id)? {
            self.state = NavState::Navigating { target: route, guard: Some(self.card_guard.clone()), continuation };
            return Ok(None);
        }

        if current == self.fallback.hash() {
            // already on the fallback listing and the card is not there either
            self.state = NavState::Idle;
            return Ok(Some(Completion::failed(continuation)));
        }

        debug!("Card {} not on screen, searching {}", card_id, self.fallback);
        self.state = NavState::Searching { fallback: self.fallback.clone(), target: route, continuation };
        page.set_location_hash(&format!("/{}", self.fallback))?;
        Ok(None)
    }

    fn click_card(&self, page: &mut dyn Page, card_id: &str) -> Result<bool> {
        let selector = format!(".card[data-id='{}'][data-type='st']", card_id);
        if page.query(&selector)?.is_none() {
            return Ok(false);
        }
        PageCommand::new("clickCard", Some(json!({ "id": card_id }))).send(page)?;
        Ok(true)
    }

    /// The main view settled; resume the pending request if it applies to the current page
    pub fn on_main_loaded(&mut self, page: &mut dyn Page) -> Option<Completion> {
        match std::mem::replace(&mut self.state, NavState::Idle) {
            NavState::Idle => None,
            NavState::Navigating { target, guard: Some(guard), continuation } => match page.location_hash() {
                Ok(hash) if hash == guard => Some(Completion::ok(continuation)),
                Ok(_) => {
                    // wrong page, keep waiting
                    self.state = NavState::Navigating { target, guard: Some(guard), continuation };
                    None
                }
                Err(e) => {
                    warn!("Failed to read location: {}", e);
                    Some(Completion::failed(continuation))
                }
            },
            NavState::Navigating { continuation, .. } => Some(Completion::ok(continuation)),
            NavState::Searching { fallback, target, continuation } => {
                let card_id = target.card_id().unwrap_or_default().to_string();
                match self.click_card(page, &card_id) {
                    Ok(true) => {
                        self.state =
                            NavState::Navigating { target, guard: Some(self.card_guard.clone()), continuation };
                        None
                    }
                    Ok(false) => {
                        debug!("Card {} not found on {} either", card_id, fallback);
                        Some(Completion::failed(continuation))
                    }
                    Err(e) => {
                        warn!("Card lookup failed: {}", e);
                        Some(Completion::failed(continuation))
                    }
                }
            }
        }
    }

    /// The location hash changed; a guarded request for another page is abandoned
    pub fn on_route_changed(&mut self, hash: &str) {
        if let NavState::Navigating { target, guard: Some(guard), .. } = &self.state {
            if guard != hash {
                debug!("Route changed to {} while waiting for {} ({}), dropping request", hash, guard, target);
                self.state = NavState::Idle;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::ElementNode;
    use crate::page::MemoryPage;

    fn station(id: &str) -> ElementNode {
        ElementNode::new("div").with_attribute("class", "card").with_attribute("data-type", "st").with_attribute("data-id", id)
    }

    fn page_with(cards: Vec<ElementNode>, hash: &str) -> MemoryPage {
        let root = ElementNode::new("body").with_child(ElementNode::new("div").with_attribute("id", "main").with_children(cards));
        MemoryPage::new(root, hash)
    }

    fn navigator() -> Navigator {
        Navigator::new(Route::new("rd"), "#/ap/queue")
    }

    fn list(link: &str) -> Continuation {
        Continuation::NavigationList { link: link.to_string(), omit_unknown_albums: false }
    }

    #[test]
    fn test_current_route_completes_immediately() {
        let mut page = page_with(vec![], "#/rd");
        let mut nav = navigator();

        let done = nav.select_and_execute(&mut page, Route::new("rd"), list("rd"));
        assert_eq!(done, Some(Completion::ok(list("rd"))));
        assert!(nav.is_idle());
        assert!(page.hash_writes().is_empty());
        assert!(page.posted_messages().is_empty());
    }

    #[test]
    fn test_hash_route_waits_for_main_view() {
        let mut page = page_with(vec![], "#/now");
        let mut nav = navigator();

        assert_eq!(nav.select_and_execute(&mut page, Route::new("albums"), list("albums")), None);
        assert_eq!(page.hash_writes(), ["/albums"]);
        assert!(matches!(nav.state(), NavState::Navigating { guard: None, .. }));

        nav.on_route_changed("#/albums");
        assert_eq!(nav.on_main_loaded(&mut page), Some(Completion::ok(list("albums"))));
        assert!(nav.is_idle());
        assert_eq!(nav.on_main_loaded(&mut page), None);
    }

    #[test]
    fn test_visible_card_is_clicked_and_guarded() {
        let mut page = page_with(vec![station("42")], "#/rd");
        let mut nav = navigator();

        assert_eq!(nav.select_and_execute(&mut page, Route::new("st/42"), list("st/42")), None);
        assert_eq!(page.posted_messages()[0]["command"], "clickCard");
        assert_eq!(page.posted_messages()[0]["options"]["id"], "42");

        // main view settles before the hash moves: not our page yet
        assert_eq!(nav.on_main_loaded(&mut page), None);

        page.navigate("#/ap/queue");
        nav.on_route_changed("#/ap/queue");
        assert_eq!(nav.on_main_loaded(&mut page), Some(Completion::ok(list("st/42"))));
    }

    #[test]
    fn test_card_found_on_fallback() {
        let mut page = page_with(vec![], "#/now");
        let mut nav = navigator();

        assert_eq!(nav.select_and_execute(&mut page, Route::new("st/42"), list("st/42")), None);
        assert_eq!(page.hash_writes(), ["/rd"]);
        assert!(matches!(nav.state(), NavState::Searching { .. }));

        page.set_children("#main", vec![station("42")]).unwrap();
        assert_eq!(nav.on_main_loaded(&mut page), None);
        assert!(matches!(nav.state(), NavState::Navigating { guard: Some(_), .. }));
        assert_eq!(page.posted_messages().len(), 1);
    }

    #[test]
    fn test_card_missing_everywhere_fails_once() {
        let mut page = page_with(vec![], "#/now");
        let mut nav = navigator();

        assert_eq!(nav.select_and_execute(&mut page, Route::new("st/42"), list("st/42")), None);
        assert_eq!(nav.on_main_loaded(&mut page), Some(Completion::failed(list("st/42"))));
        assert!(nav.is_idle());
        assert_eq!(nav.on_main_loaded(&mut page), None);
    }

    #[test]
    fn test_card_missing_while_on_fallback_fails_immediately() {
        let mut page = page_with(vec![], "#/rd");
        let mut nav = navigator();

        let done = nav.select_and_execute(&mut page, Route::new("st/42"), list("st/42"));
        assert_eq!(done, Some(Completion::failed(list("st/42"))));
        assert!(nav.is_idle());
        assert!(page.hash_writes().is_empty());
    }

    #[test]
    fn test_route_change_drops_guarded_request() {
        let mut page = page_with(vec![station("42")], "#/rd");
        let mut nav = navigator();

        nav.select_and_execute(&mut page, Route::new("st/42"), list("st/42"));
        nav.on_route_changed("#/albums");
        assert!(nav.is_idle());

        page.navigate("#/ap/queue");
        assert_eq!(nav.on_main_loaded(&mut page), None);
    }

    #[test]
    fn test_new_request_replaces_pending() {
        let mut page = page_with(vec![], "#/now");
        let mut nav = navigator();

        nav.select_and_execute(&mut page, Route::new("albums"), list("albums"));
        nav.select_and_execute(&mut page, Route::new("artists"), list("artists"));

        assert_eq!(nav.on_main_loaded(&mut page), Some(Completion::ok(list("artists"))));
        assert_eq!(nav.on_main_loaded(&mut page), None);
    }
}
