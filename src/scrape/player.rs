use crate::dom::ElementNode;
use crate::error::Result;
use crate::page::Page;
use crate::scrape::{link_of, parse_cover};
use indexmap::IndexMap;
use serde::Serialize;

const RATING_CONTAINER: &str = "#player-right-wrapper > div.player-rating-container > ul.rating-container";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RatingMode {
    Thumbs,
    Star,
}

/// Currently loaded song
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SongInfo {
    pub duration: String,
    pub title: String,
    pub artist: String,
    pub artist_link: Option<String>,
    pub album: String,
    pub album_link: Option<String>,
    pub cover: Option<String>,
}

/// Localized labels of the fixed navigation entries
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct QuickLinkTexts {
    pub now: String,
    pub rd: String,
    pub artists: String,
    pub albums: String,
    pub genres: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuickLinks {
    pub texts: QuickLinkTexts,
    /// Auto playlist link to title, in sidebar order
    pub auto_playlists: IndexMap<String, String>,
}

/// Whether the player rates with thumbs or stars
pub fn rating_mode(page: &dyn Page) -> Result<Option<RatingMode>> {
    let Some(container) = page.query(RATING_CONTAINER)? else {
        return Ok(None);
    };
    if container.has_class("thumbs") {
        Ok(Some(RatingMode::Thumbs))
    } else if container.has_class("stars") {
        Ok(Some(RatingMode::Star))
    } else {
        Ok(None)
    }
}

fn text_of(page: &dyn Page, selector: &str) -> Result<String> {
    Ok(page.query(selector)?.map(|el| el.text()).unwrap_or_default())
}

/// Song info, or `None` while no song is loaded
pub fn song_info(page: &dyn Page) -> Result<Option<SongInfo>> {
    let Some(info) = page.query("#playerSongInfo")? else {
        return Ok(None);
    };
    if info.find("div")?.is_none() {
        return Ok(None);
    }

    let artist = page.query("#player-artist")?;
    let album = info.find(".player-album")?;

    Ok(Some(SongInfo {
        duration: text_of(page, "#time_container_duration")?,
        title: text_of(page, "#playerSongTitle")?,
        artist: artist.as_ref().map(ElementNode::text).unwrap_or_default(),
        artist_link: artist.as_ref().and_then(link_of),
        album: album.map(ElementNode::text).unwrap_or_default(),
        album_link: album.and_then(link_of),
        cover: parse_cover(page.query("#playingAlbumArt")?.as_ref()),
    }))
}

fn child_text(parent: Option<&ElementNode>, selector: &str) -> Result<String> {
    match parent {
        Some(parent) => Ok(parent.children_matching(selector)?.first().map(|el| el.text()).unwrap_or_default()),
        None => Ok(String::new()),
    }
}

/// Labels of the fixed navigation targets plus the auto playlists
pub fn quick_links(page: &dyn Page) -> Result<QuickLinks> {
    let nav = page.query("#nav_collections")?;
    let tabs = page.query("#browse-tabs")?;

    let texts = QuickLinkTexts {
        now: child_text(nav.as_ref(), "li[data-type='now']")?,
        rd: child_text(nav.as_ref(), "li[data-type='rd']")?,
        artists: child_text(tabs.as_ref(), "div[data-type='artists']")?,
        albums: child_text(tabs.as_ref(), "div[data-type='albums']")?,
        genres: child_text(tabs.as_ref(), "div[data-type='genres']")?,
    };

    let mut auto_playlists = IndexMap::new();
    if let Some(list) = page.query("#auto-playlists")? {
        for entry in list.children_matching("li")? {
            let Some(link) = link_of(entry) else { continue };
            let title = entry.find("div.tooltip")?.map(ElementNode::text).unwrap_or_default();
            auto_playlists.insert(link, title);
        }
    }

    Ok(QuickLinks { texts, auto_playlists })
}
