//! Messages exchanged with the background process and with the page counterpart
//!
//! Both boundaries carry loosely typed JSON; everything is decoded into closed
//! enums here before the script acts on it.

use crate::error::{Result, ScriptError};
use crate::page::Page;
use crate::scrape::{ListType, NavigationList, QuickLinks, RatingMode, SongInfo};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use tokio::sync::mpsc::UnboundedSender;

/// Marker on window messages sent by this script
pub const PAGE_COMMAND_MARKER: &str = "FROM_PRIMEPLAYER";

/// Marker on window messages sent by the injected counterpart
pub const INJECTED_MARKER: &str = "FROM_PRIMEPLAYER_INJECTED";

/// Link the background uses for the sidebar playlist listing
pub const MY_PLAYLISTS_LINK: &str = "myPlaylists";

/// Opaque view identifier as used in the location hash (`#/<route>`)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Route(String);

impl Route {
    pub fn new(route: impl Into<String>) -> Self {
        Self(route.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Location hash showing this route
    pub fn hash(&self) -> String {
        format!("#/{}", self.0)
    }

    /// Route from a location hash; `#/rd` gives `rd`
    pub fn from_hash(hash: &str) -> Self {
        let route = hash.strip_prefix('#').unwrap_or(hash);
        Self(route.strip_prefix('/').unwrap_or(route).to_string())
    }

    /// Station cards cannot be reached by hash and must be clicked; yields the card id
    pub fn card_id(&self) -> Option<&str> {
        self.0.strip_prefix("st/")
    }

    /// Instant mixes and stations start playing on their own once opened
    pub fn auto_starts(&self) -> bool {
        self.0.starts_with("im/") || self.0.starts_with("st/")
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Messages from the background process
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum InboundMessage {
    Connected,
    AlreadyConnected,
    Execute {
        command: String,
        #[serde(default)]
        options: Option<Value>,
    },
    #[serde(rename_all = "camelCase")]
    GetNavigationList {
        link: String,
        #[serde(default)]
        omit_unknown_albums: bool,
    },
    StartPlaylist {
        link: String,
    },
}

impl InboundMessage {
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| ScriptError::Protocol(format!("bad inbound message: {}", e)))
    }
}

/// Payload of `player-listrating`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListRating {
    pub index: usize,
    pub rating: i32,
    pub control_link: String,
}

/// Payload of `player-navigationList`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NavigationListResponse {
    pub link: String,
    pub list: NavigationList,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub list_type: Option<ListType>,
    /// Hash actually reached; absent for the locally served sidebar listing
    #[serde(skip_serializing_if = "Option::is_none")]
    pub control_link: Option<String>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub error: bool,
}

/// Messages to the background process, serialized as `{type, value}`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "value")]
pub enum OutboundMessage {
    #[serde(rename = "player-quicklinks")]
    QuickLinks(QuickLinks),
    #[serde(rename = "player-ratingMode")]
    RatingMode(Option<RatingMode>),
    #[serde(rename = "song-info")]
    SongInfo(Option<SongInfo>),
    #[serde(rename = "song-position")]
    SongPosition(String),
    #[serde(rename = "player-playing")]
    Playing(Value),
    #[serde(rename = "player-repeat")]
    Repeat(Value),
    #[serde(rename = "player-shuffle")]
    Shuffle(Value),
    #[serde(rename = "song-rating")]
    SongRating(Value),
    #[serde(rename = "player-volume")]
    Volume(Value),
    #[serde(rename = "player-listrating")]
    ListRating(ListRating),
    #[serde(rename = "player-navigationList")]
    NavigationList(NavigationListResponse),
}

impl OutboundMessage {
    /// The `type` tag as sent on the wire
    pub fn kind(&self) -> &'static str {
        match self {
            OutboundMessage::QuickLinks(_) => "player-quicklinks",
            OutboundMessage::RatingMode(_) => "player-ratingMode",
            OutboundMessage::SongInfo(_) => "song-info",
            OutboundMessage::SongPosition(_) => "song-position",
            OutboundMessage::Playing(_) => "player-playing",
            OutboundMessage::Repeat(_) => "player-repeat",
            OutboundMessage::Shuffle(_) => "player-shuffle",
            OutboundMessage::SongRating(_) => "song-rating",
            OutboundMessage::Volume(_) => "player-volume",
            OutboundMessage::ListRating(_) => "player-listrating",
            OutboundMessage::NavigationList(_) => "player-navigationList",
        }
    }
}

/// Events produced by attribute watchers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeEvent {
    Playing,
    Repeat,
    Shuffle,
    SongRating,
    Volume,
}

impl AttributeEvent {
    pub fn message(self, value: Value) -> OutboundMessage {
        match self {
            AttributeEvent::Playing => OutboundMessage::Playing(value),
            AttributeEvent::Repeat => OutboundMessage::Repeat(value),
            AttributeEvent::Shuffle => OutboundMessage::Shuffle(value),
            AttributeEvent::SongRating => OutboundMessage::SongRating(value),
            AttributeEvent::Volume => OutboundMessage::Volume(value),
        }
    }
}

/// What travels from the script to the background driver
#[derive(Debug, Clone, PartialEq)]
pub enum ToBackground {
    Message(OutboundMessage),
    /// The script closed the channel from its side
    Disconnect,
}

/// The persistent connection to the background process
#[derive(Debug)]
pub struct ChannelSession {
    name: String,
    tx: UnboundedSender<ToBackground>,
}

impl ChannelSession {
    pub fn new(name: impl Into<String>, tx: UnboundedSender<ToBackground>) -> Self {
        Self { name: name.into(), tx }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn post(&self, message: OutboundMessage) -> Result<()> {
        self.tx.send(ToBackground::Message(message)).map_err(|_| ScriptError::ChannelClosed)
    }

    /// Close from this side; consumes the session
    pub fn disconnect(self) {
        // the receiver may already be gone, which is the same outcome
        let _ = self.tx.send(ToBackground::Disconnect);
    }
}

/// Command envelope posted into the page for the injected counterpart
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageCommand {
    #[serde(rename = "type")]
    pub marker: &'static str,
    pub command: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<Value>,
}

impl PageCommand {
    pub fn new(command: impl Into<String>, options: Option<Value>) -> Self {
        Self { marker: PAGE_COMMAND_MARKER, command: command.into(), options }
    }

    /// Post the command on the page's window bus
    pub fn send(&self, page: &mut dyn Page) -> Result<()> {
        page.post_message(&serde_json::to_value(self)?)
    }
}

/// Messages from the injected counterpart
#[derive(Debug, Clone, PartialEq)]
pub enum InjectedMessage {
    /// A song in the displayed list was rated; `index` is its row
    PlaylistSongRated { index: usize },
}

#[derive(Deserialize)]
struct InjectedEnvelope {
    #[serde(rename = "type")]
    marker: String,
    msg: String,
    #[serde(default)]
    index: Option<usize>,
}

impl InjectedMessage {
    /// Validate a window message; anything not from our counterpart is ignored
    pub fn from_window(same_source: bool, data: &Value) -> Option<Self> {
        if !same_source {
            return None;
        }
        let envelope = InjectedEnvelope::deserialize(data).ok()?;
        if envelope.marker != INJECTED_MARKER {
            return None;
        }
        match envelope.msg.as_str() {
            "playlistSongRated" => envelope.index.map(|index| InjectedMessage::PlaylistSongRated { index }),
            other => {
                log::debug!("Ignoring unknown injected message '{}'", other);
                None
            }
        }
    }
}
