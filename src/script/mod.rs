//! The content script session
//!
//! [`ContentScript`] owns everything that lives for one connection to the
//! background process: the channel, the watch registrations, the pending
//! navigation and the rating shadow list. It is driven from outside:
//!
//! - [`ContentScript::handle_port_message`] for every background message
//! - [`ContentScript::pump`] whenever the page may have produced events, and
//!   again when [`ContentScript::next_deadline`] passes
//! - [`ContentScript::handle_port_disconnect`] when the background goes away
//!
//! Nothing here returns an error. Failures are logged or turned into an
//! error-tagged response, and the session keeps running.

mod cleanup;
mod setup;

use crate::config::ScriptConfig;
use crate::dom::ElementNode;
use crate::error::ScriptError;
use crate::navigation::{Completion, Continuation, Navigator};
use crate::page::{Page, PageEvent};
use crate::protocol::{
    ChannelSession, InboundMessage, InjectedMessage, ListRating, MY_PLAYLISTS_LINK, NavigationListResponse,
    OutboundMessage, PageCommand, Route, ToBackground,
};
use crate::scrape::{self, ListType, NavigationList};
use crate::watch::{AttributeWatchers, ContentWatchers};
use cleanup::Listeners;
use log::{debug, error, info, warn};
use serde_json::Value;
use std::time::Instant;
use tokio::sync::mpsc::UnboundedSender;

/// Callbacks run by the debounced content watchers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentTask {
    SongInfo,
    Position,
    MainLoaded,
}

pub struct ContentScript<P> {
    page: P,
    config: ScriptConfig,
    session: Option<ChannelSession>,
    attributes: AttributeWatchers,
    content: ContentWatchers<ContentTask>,
    navigator: Navigator,
    /// Last known rating per row of the displayed playlist; `None` until a playlist was extracted
    list_ratings: Option<Vec<Option<i32>>>,
    listeners: Listeners,
    set_up: bool,
    cleaned_up: bool,
}

impl<P: Page> ContentScript<P> {
    /// Open the background channel for `page`; watchers are installed once the background confirms
    pub fn connect(page: P, config: ScriptConfig, tx: UnboundedSender<ToBackground>) -> Self {
        let session = ChannelSession::new(config.port_name.clone(), tx);
        info!("Opened channel '{}'", session.name());

        Self {
            navigator: Navigator::new(Route::new(config.fallback_route.clone()), config.card_guard_hash.clone()),
            content: ContentWatchers::new(config.settle_ceiling),
            attributes: AttributeWatchers::new(),
            session: Some(session),
            page,
            config,
            list_ratings: None,
            listeners: Listeners::default(),
            set_up: false,
            cleaned_up: false,
        }
    }

    pub fn page(&self) -> &P {
        &self.page
    }

    pub fn page_mut(&mut self) -> &mut P {
        &mut self.page
    }

    pub fn config(&self) -> &ScriptConfig {
        &self.config
    }

    pub fn navigator(&self) -> &Navigator {
        &self.navigator
    }

    /// Whether the channel is still open
    pub fn is_connected(&self) -> bool {
        self.session.is_some()
    }

    /// Whether the one-time setup ran
    pub fn is_set_up(&self) -> bool {
        self.set_up
    }

    pub fn list_ratings(&self) -> Option<&[Option<i32>]> {
        self.list_ratings.as_deref()
    }

    /// Earliest settle deadline the driver must wake up for
    pub fn next_deadline(&self) -> Option<Instant> {
        self.content.next_deadline()
    }

    /// Dispatch a message from the background process
    pub fn handle_port_message(&mut self, message: InboundMessage) {
        if self.session.is_none() {
            debug!("Channel closed, ignoring {:?}", message);
            return;
        }

        match message {
            InboundMessage::Connected => {
                if self.set_up {
                    warn!("Duplicate 'connected', watchers are already installed");
                } else {
                    self.setup();
                }
            }
            InboundMessage::AlreadyConnected => {
                info!("Another script already owns this page, closing the channel");
                if let Some(session) = self.session.take() {
                    session.disconnect();
                }
            }
            InboundMessage::Execute { command, options } => self.send_command(&command, options),
            InboundMessage::GetNavigationList { link, omit_unknown_albums } => {
                if link == MY_PLAYLISTS_LINK {
                    self.send_my_playlists();
                } else {
                    let route = Route::new(link.clone());
                    self.select_and_execute(route, Continuation::NavigationList { link, omit_unknown_albums });
                }
            }
            InboundMessage::StartPlaylist { link } => {
                let route = Route::new(link);
                self.select_and_execute(route.clone(), Continuation::StartPlaylist { link: route });
            }
        }
    }

    /// The background closed the channel
    pub fn handle_port_disconnect(&mut self) {
        info!("Background disconnected");
        self.cleanup();
    }

    /// Drain page events, then fire due settle timers
    ///
    /// Timers only fire after the queue is empty, so a mutation that arrived
    /// since the last call pushes its deadline back before it can expire.
    pub fn pump(&mut self, now: Instant) {
        let events = match self.page.poll_events() {
            Ok(events) => events,
            Err(ScriptError::PageUnloaded) => {
                self.page_unloaded();
                return;
            }
            Err(e) => {
                warn!("Failed to read page events: {}", e);
                Vec::new()
            }
        };

        for event in events {
            if self.cleaned_up {
                break;
            }
            self.dispatch(event, now);
        }
        self.fire_due(now);
    }

    fn fire_due(&mut self, now: Instant) {
        for task in self.content.fire_due(now) {
            self.run_task(task);
        }
    }

    fn dispatch(&mut self, event: PageEvent, now: Instant) {
        match event {
            PageEvent::AttributeChanged { hook, element, attribute } => {
                if let Some(message) = self.attributes.on_change(hook, &element, &attribute, &self.page) {
                    self.post(message);
                }
            }
            PageEvent::SubtreeChanged { hook } => {
                if let Some(task) = self.content.on_mutation(hook, now) {
                    self.run_task(task);
                }
            }
            PageEvent::DelegatedChanged { hook, element, row_index } if self.listeners.delegated == Some(hook) => {
                self.rating_cell_changed(row_index, &element);
            }
            PageEvent::HashChanged { hook, hash } if self.listeners.hash_change == Some(hook) => {
                self.list_ratings = None;
                self.navigator.on_route_changed(&hash);
            }
            PageEvent::WindowMessage { hook, same_source, data } if self.listeners.messages == Some(hook) => {
                self.on_window_message(same_source, &data);
            }
            PageEvent::DecorationClicked { hook } if self.listeners.decoration == Some(hook) => {
                info!("Disconnect requested from the page");
                if let Some(session) = self.session.take() {
                    session.disconnect();
                }
                self.cleanup();
            }
            other => debug!("Ignoring event from {}", other.hook()),
        }
    }

    fn run_task(&mut self, task: ContentTask) {
        match task {
            ContentTask::SongInfo => match scrape::song_info(&self.page) {
                Ok(info) => self.post(OutboundMessage::SongInfo(info)),
                Err(e) => warn!("Failed to read song info: {}", e),
            },
            ContentTask::Position => match self.page.query(setup::POSITION) {
                Ok(position) => {
                    let text = position.as_ref().map(ElementNode::text).unwrap_or_default();
                    self.post(OutboundMessage::SongPosition(text));
                }
                Err(e) => warn!("Failed to read song position: {}", e),
            },
            ContentTask::MainLoaded => {
                if let Some(completion) = self.navigator.on_main_loaded(&mut self.page) {
                    self.complete(completion);
                }
            }
        }
    }

    fn select_and_execute(&mut self, route: Route, continuation: Continuation) {
        if let Some(completion) = self.navigator.select_and_execute(&mut self.page, route, continuation) {
            self.complete(completion);
        }
    }

    fn complete(&mut self, completion: Completion) {
        match completion.continuation {
            Continuation::NavigationList { link, omit_unknown_albums } => {
                let response = self.navigation_list(link, omit_unknown_albums, completion.error);
                self.post(OutboundMessage::NavigationList(response));
            }
            Continuation::StartPlaylist { link } => {
                if completion.error {
                    warn!("Could not open {}, not starting playback", link);
                } else if !link.auto_starts() {
                    self.send_command("startPlaylist", None);
                }
            }
        }
    }

    /// Response for a navigation that ended on the current page
    fn navigation_list(&mut self, link: String, omit_unknown_albums: bool, error: bool) -> NavigationListResponse {
        let hash = self.page.location_hash().unwrap_or_else(|e| {
            warn!("Failed to read location: {}", e);
            String::new()
        });
        let mut response =
            NavigationListResponse { link, list: NavigationList::Empty, list_type: None, control_link: None, error };

        if !error {
            let wanted = ListType::of_route(&response.link);
            // a broken link redirects elsewhere, e.g. an unknown album lands on the album overview
            if wanted == ListType::of_route(Route::from_hash(&hash).as_str()) {
                match scrape::extract_list(&self.page, wanted, omit_unknown_albums) {
                    Ok(list) => {
                        if let NavigationList::Playlist(songs) = &list {
                            self.list_ratings = Some(songs.iter().map(|song| Some(song.rating)).collect());
                        }
                        response.list_type = Some(wanted);
                        response.list = list;
                    }
                    Err(e) => {
                        warn!("Failed to extract {:?} list: {}", wanted, e);
                        response.error = true;
                    }
                }
            } else {
                debug!("Wanted {:?} for {} but landed on {}", wanted, response.link, hash);
                response.error = true;
            }
        }

        response.control_link = Some(hash);
        response
    }

    fn send_my_playlists(&mut self) {
        match scrape::my_playlists(&self.page) {
            Ok(playlists) => self.post(OutboundMessage::NavigationList(NavigationListResponse {
                link: MY_PLAYLISTS_LINK.to_string(),
                list: NavigationList::MyPlaylists(playlists),
                list_type: Some(ListType::PlaylistsList),
                control_link: None,
                error: false,
            })),
            Err(e) => warn!("Failed to read sidebar playlists: {}", e),
        }
    }

    /// Compare a list row's rating against the shadow list, reporting genuine changes
    fn rating_cell_changed(&mut self, index: usize, cell: &ElementNode) {
        let rating = scrape::parse_rating(cell.data("rating"));
        {
            let Some(ratings) = self.list_ratings.as_mut() else { return };
            if ratings.get(index).copied().flatten() == Some(rating) {
                return;
            }
            if ratings.len() <= index {
                ratings.resize(index + 1, None);
            }
            ratings[index] = Some(rating);
        }

        let control_link = self.page.location_hash().unwrap_or_default();
        self.post(OutboundMessage::ListRating(ListRating { index, rating, control_link }));
    }

    fn on_window_message(&mut self, same_source: bool, data: &Value) {
        let Some(InjectedMessage::PlaylistSongRated { index }) = InjectedMessage::from_window(same_source, data) else {
            return;
        };

        let cell = match self.page.query_all("#main .song-row") {
            Ok(rows) => rows.get(index).map(|row| row.find("td[data-col='rating']").map(|c| c.cloned())),
            Err(e) => {
                warn!("Failed to read list rows: {}", e);
                return;
            }
        };
        match cell {
            Some(Ok(Some(cell))) => self.rating_cell_changed(index, &cell),
            Some(Ok(None)) => debug!("Row {} has no rating cell", index),
            Some(Err(e)) => warn!("Failed to read rating cell: {}", e),
            None => debug!("Rated row {} is not displayed", index),
        }
    }

    /// Post to the background; silently dropped once the channel is gone
    fn post(&self, message: OutboundMessage) {
        if let Some(session) = &self.session {
            let kind = message.kind();
            if let Err(e) = session.post(message) {
                warn!("Failed to post {}: {}", kind, e);
            }
        }
    }

    fn send_command(&mut self, command: &str, options: Option<Value>) {
        if let Err(e) = PageCommand::new(command, options).send(&mut self.page) {
            warn!("Failed to send '{}' to the page: {}", command, e);
        }
    }

    fn report(&self, err: ScriptError) {
        match err {
            ScriptError::ElementMissing(_) => error!("{}", err),
            other => warn!("{}", other),
        }
    }
}
