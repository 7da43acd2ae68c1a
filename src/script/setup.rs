use super::{ContentScript, ContentTask};
use crate::dom::ElementNode;
use crate::page::{Decoration, Hook, HookId, Page};
use crate::protocol::{AttributeEvent, OutboundMessage};
use crate::scrape::{self, parse_rating};
use crate::watch::Extractor;
use log::{info, warn};
use serde_json::{Value, json};
use std::time::Duration;

const SONG_INFO: &str = "#time_container_duration, #playerSongInfo";
pub(super) const POSITION: &str = "#time_container_current";
const MAIN: &str = "#main";
const PLAY_PAUSE: &str = "#player > div.player-middle > button[data-id='play-pause']";
const REPEAT: &str = "#player > div.player-middle > button[data-id='repeat']";
const SHUFFLE: &str = "#player > div.player-middle > button[data-id='shuffle']";
const RATING_STARS: &str = "#player-right-wrapper > .player-rating-container ul.rating-container li";
const SELECTED_RATING: &str = "#player-right-wrapper > .player-rating-container ul.rating-container li.selected";
const VOLUME: &str = "#vslider";
const LIST_ROOT: &str = "#main";
const LIST_RATING_CELL: &str = ".song-row td[data-col='rating']";
const BANNER_ICON: &str = ".music-banner-icon";

/// Null while the button is disabled, else whether it shows the pause state
fn playing_state() -> Extractor {
    Box::new(|el: &ElementNode, _: &str, _: &dyn Page| {
        if el.is_disabled() { Value::Null } else { Value::Bool(el.has_class("playing")) }
    })
}

/// Rating of the selected star, wherever in the list the change happened
fn selected_rating() -> Extractor {
    Box::new(|_: &ElementNode, _: &str, page: &dyn Page| {
        let selected = page.query(SELECTED_RATING).unwrap_or_else(|e| {
            warn!("Failed to read song rating: {}", e);
            None
        });
        json!(parse_rating(selected.as_ref().and_then(|el| el.data("rating"))))
    })
}

impl<P: Page> ContentScript<P> {
    /// Install every watcher and listener and post the initial snapshots
    pub(super) fn setup(&mut self) {
        info!("Connected, installing watchers");
        self.set_up = true;

        // a rating mode change reloads the whole page, so it is read once
        match scrape::rating_mode(&self.page) {
            Ok(mode) => self.post(OutboundMessage::RatingMode(mode)),
            Err(e) => self.report(e),
        }

        self.watch_content(ContentTask::SongInfo, SONG_INFO, self.config.song_settle);
        self.watch_content(ContentTask::Position, POSITION, self.config.position_settle);
        self.watch_content(ContentTask::MainLoaded, MAIN, self.config.main_settle);

        self.watch_attribute(&["class", "disabled"], PLAY_PAUSE, AttributeEvent::Playing, Some(playing_state()));
        self.watch_attribute(&["value"], REPEAT, AttributeEvent::Repeat, None);
        self.watch_attribute(&["value"], SHUFFLE, AttributeEvent::Shuffle, None);
        self.watch_attribute(&["class"], RATING_STARS, AttributeEvent::SongRating, Some(selected_rating()));
        self.watch_attribute(&["aria-valuenow"], VOLUME, AttributeEvent::Volume, None);

        self.listeners.delegated =
            self.listen(Hook::Delegated { root: LIST_ROOT.to_string(), target: LIST_RATING_CELL.to_string() });
        self.listeners.hash_change = self.listen(Hook::HashChange);

        let injected = self.config.injected_script_url.clone();
        if let Err(e) = self.page.inject_script(&injected) {
            warn!("Failed to inject {}: {}", injected, e);
        }
        self.listeners.messages = self.listen(Hook::WindowMessages);

        let decoration = Decoration {
            background_url: self.config.connected_icon_url.clone(),
            title: self.config.connected_title.clone(),
        };
        self.listeners.decoration = self.listen(Hook::Decorate { selector: BANNER_ICON.to_string(), decoration });

        match scrape::quick_links(&self.page) {
            Ok(links) => self.post(OutboundMessage::QuickLinks(links)),
            Err(e) => self.report(e),
        }
    }

    /// Register a content watch and run its task once to seed
    fn watch_content(&mut self, task: ContentTask, selector: &str, settle: Duration) {
        match self.content.watch(&mut self.page, task, selector, settle) {
            Ok(_) => self.run_task(task),
            Err(e) => self.report(e),
        }
    }

    fn watch_attribute(&mut self, attributes: &[&str], selector: &str, event: AttributeEvent, extractor: Option<Extractor>) {
        match self.attributes.watch(&mut self.page, attributes, selector, event, extractor) {
            Ok(seed) => self.post(seed),
            Err(e) => self.report(e),
        }
    }

    fn listen(&mut self, hook: Hook) -> Option<HookId> {
        match self.page.install(hook) {
            Ok(id) => Some(id),
            Err(e) => {
                self.report(e);
                None
            }
        }
    }
}
