use crate::dom::ElementNode;
use crate::error::Result;
use crate::page::Page;
use crate::scrape::{for_hash, link_of, parse_cover, parse_rating};
use serde::{Serialize, Serializer};

/// Shape of the list shown for a route
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ListType {
    PlaylistsList,
    Playlist,
    AlbumContainers,
}

impl ListType {
    /// Classify a route by its first segment
    pub fn of_route(route: &str) -> Self {
        let family = route.split('/').next().unwrap_or_default();
        match family {
            "artists" | "genres" => ListType::AlbumContainers,
            "now" | "albums" | "rd" | "ar" | "sar" | "tg" => ListType::PlaylistsList,
            _ => ListType::Playlist,
        }
    }
}

/// Card in a grid of playlists, albums or stations
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistCard {
    pub cover: Option<String>,
    pub title: String,
    pub title_link: Option<String>,
    pub sub_title: String,
    pub sub_title_link: Option<String>,
}

/// Row of a song table
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistSong {
    pub cover: Option<String>,
    pub title: String,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub current: bool,
    pub artist: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artist_link: Option<String>,
    pub album: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub album_link: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,
    pub rating: i32,
}

/// Artist or genre tile
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlbumContainer {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cover: Option<String>,
    pub title: String,
    pub link: Option<String>,
}

/// Entry of the sidebar playlist listing
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SidebarPlaylist {
    pub title: String,
    pub title_link: Option<String>,
}

/// An extracted list; serializes as a plain JSON array
#[derive(Debug, Clone, PartialEq)]
pub enum NavigationList {
    Empty,
    PlaylistsList(Vec<PlaylistCard>),
    Playlist(Vec<PlaylistSong>),
    AlbumContainers(Vec<AlbumContainer>),
    MyPlaylists(Vec<SidebarPlaylist>),
}

impl NavigationList {
    pub fn len(&self) -> usize {
        match self {
            NavigationList::Empty => 0,
            NavigationList::PlaylistsList(items) => items.len(),
            NavigationList::Playlist(items) => items.len(),
            NavigationList::AlbumContainers(items) => items.len(),
            NavigationList::MyPlaylists(items) => items.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Serialize for NavigationList {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            NavigationList::Empty => serializer.collect_seq(std::iter::empty::<()>()),
            NavigationList::PlaylistsList(items) => items.serialize(serializer),
            NavigationList::Playlist(items) => items.serialize(serializer),
            NavigationList::AlbumContainers(items) => items.serialize(serializer),
            NavigationList::MyPlaylists(items) => items.serialize(serializer),
        }
    }
}

fn text_in(el: &ElementNode, selector: &str) -> Result<String> {
    Ok(el.find(selector)?.map(ElementNode::text).unwrap_or_default())
}

/// Sidebar listing of the user's playlists
pub fn my_playlists(page: &dyn Page) -> Result<Vec<SidebarPlaylist>> {
    let Some(list) = page.query("#playlists")? else {
        return Ok(Vec::new());
    };
    list.children_matching("li")?
        .into_iter()
        .map(|entry| Ok(SidebarPlaylist { title: text_in(entry, ".tooltip")?, title_link: link_of(entry) }))
        .collect()
}

fn playlists_list(page: &dyn Page, omit_unknown_albums: bool) -> Result<Vec<PlaylistCard>> {
    let mut cards = Vec::new();
    for card in page.query_all(".card")? {
        // albums without a real id end in '/'
        if omit_unknown_albums && card.data("id").unwrap_or_default().ends_with('/') {
            continue;
        }
        let sub_title = card.find(".sub-title")?;
        cards.push(PlaylistCard {
            cover: parse_cover(card.find(".image-wrapper img")?),
            title: text_in(&card, ".title")?,
            title_link: link_of(&card),
            sub_title: sub_title.map(ElementNode::text).unwrap_or_default(),
            sub_title_link: sub_title.and_then(link_of),
        });
    }
    Ok(cards)
}

/// Durations look like `3:15` or `1:02:03`; other pages show placeholders there
fn is_duration(text: &str) -> bool {
    let mut groups = text.split(':');
    let Some(first) = groups.next() else { return false };
    let digits = |s: &str| s.chars().all(|c| c.is_ascii_digit());
    (1..=2).contains(&first.len()) && digits(first) && groups.all(|g| g.len() == 2 && digits(g))
}

fn playlist(page: &dyn Page) -> Result<Vec<PlaylistSong>> {
    let mut songs = Vec::new();
    for row in page.query_all(".song-row")? {
        let title = row.find("td[data-col='title'] .content")?;
        let artist = text_in(&row, "td[data-col='artist'] .content")?;
        let album_cell = row.find("td[data-col='album']")?;
        let album = match album_cell {
            Some(cell) => text_in(cell, ".content")?,
            None => String::new(),
        };
        let duration = row.find("td[data-col='duration']")?.map(ElementNode::text).unwrap_or_default();
        let rating = row.find("td[data-col='rating']")?.and_then(|cell| cell.data("rating"));

        songs.push(PlaylistSong {
            cover: match title {
                Some(title) => parse_cover(title.find("img")?),
                None => None,
            },
            title: title.map(ElementNode::text).unwrap_or_default(),
            current: row.find(".song-indicator")?.is_some(),
            artist_link: (!artist.is_empty()).then(|| format!("ar/{}", for_hash(&artist))),
            artist,
            album_link: (!album.is_empty()).then(|| {
                let album_artist = album_cell.and_then(|cell| cell.data("album-artist")).unwrap_or_default();
                format!("al/{}/{}", for_hash(album_artist), for_hash(&album))
            }),
            album,
            duration: is_duration(&duration).then_some(duration),
            rating: parse_rating(rating),
        });
    }
    Ok(songs)
}

fn album_containers(page: &dyn Page) -> Result<Vec<AlbumContainer>> {
    let mut items = Vec::new();
    for card in page.query_all(".card")? {
        let img = card.find(".image-inner-wrapper img")?;
        let is_placeholder = img.and_then(|img| img.attr("src")).is_some_and(|src| src.contains("/default_artist.png"));
        items.push(AlbumContainer {
            cover: if is_placeholder { None } else { parse_cover(img) },
            title: text_in(&card, ".details .title")?,
            link: link_of(&card),
        });
    }
    Ok(items)
}

/// Extract the list currently shown on the page as `list_type`
pub fn extract_list(page: &dyn Page, list_type: ListType, omit_unknown_albums: bool) -> Result<NavigationList> {
    Ok(match list_type {
        ListType::PlaylistsList => NavigationList::PlaylistsList(playlists_list(page, omit_unknown_albums)?),
        ListType::Playlist => NavigationList::Playlist(playlist(page)?),
        ListType::AlbumContainers => NavigationList::AlbumContainers(album_containers(page)?),
    })
}
