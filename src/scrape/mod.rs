//! Reading player state and listings out of the page markup
//!
//! These are plain functions over [`Page`] snapshots. They know the player's
//! markup and nothing else; a missing optional element yields an empty or null
//! field rather than an error.

pub mod lists;
pub mod player;

pub use lists::{
    AlbumContainer, ListType, NavigationList, PlaylistCard, PlaylistSong, SidebarPlaylist, extract_list, my_playlists,
};
pub use player::{QuickLinkTexts, QuickLinks, RatingMode, SongInfo, quick_links, rating_mode, song_info};

use crate::dom::ElementNode;

/// Cover image URL of an `img`, with protocol-relative URLs made absolute
pub fn parse_cover(img: Option<&ElementNode>) -> Option<String> {
    let src = img?.attr("src")?;
    if src.starts_with("//") {
        Some(format!("https:{}", src))
    } else {
        Some(src.to_string())
    }
}

/// Numeric rating, or -1 when absent or not a number
pub fn parse_rating(rating: Option<&str>) -> i32 {
    rating
        .and_then(|r| {
            let r = r.trim();
            let end = r
                .char_indices()
                .find(|&(i, c)| !(c.is_ascii_digit() || (i == 0 && c == '-')))
                .map_or(r.len(), |(i, _)| i);
            r[..end].parse::<i32>().ok()
        })
        .unwrap_or(-1)
}

/// Route link built from `data-type` and `data-id`
pub fn link_of(el: &ElementNode) -> Option<String> {
    let id = el.data("id").filter(|id| !id.is_empty())?;
    Some(format!("{}/{}", el.data("type").unwrap_or_default(), id))
}

/// Encode text for use inside a route, spaces as `+`
pub fn for_hash(text: &str) -> String {
    urlencoding::encode(text).replace("%20", "+")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_cover() {
        let img = ElementNode::new("img").with_attribute("src", "//lh3.example.com/cover=s130");
        assert_eq!(parse_cover(Some(&img)).as_deref(), Some("https://lh3.example.com/cover=s130"));

        let absolute = ElementNode::new("img").with_attribute("src", "https://x/y.png");
        assert_eq!(parse_cover(Some(&absolute)).as_deref(), Some("https://x/y.png"));

        assert_eq!(parse_cover(Some(&ElementNode::new("img"))), None);
        assert_eq!(parse_cover(None), None);
    }

    #[test]
    fn test_parse_rating() {
        assert_eq!(parse_rating(Some("5")), 5);
        assert_eq!(parse_rating(Some("0")), 0);
        assert_eq!(parse_rating(Some("3 stars")), 3);
        assert_eq!(parse_rating(Some("-1")), -1);
        assert_eq!(parse_rating(Some("")), -1);
        assert_eq!(parse_rating(Some("none")), -1);
        assert_eq!(parse_rating(None), -1);
    }

    #[test]
    fn test_link_of() {
        let artist = ElementNode::new("div").with_attribute("data-type", "ar").with_attribute("data-id", "A123");
        assert_eq!(link_of(&artist).as_deref(), Some("ar/A123"));
        assert_eq!(link_of(&ElementNode::new("div").with_attribute("data-type", "ar")), None);
    }

    #[test]
    fn test_for_hash() {
        assert_eq!(for_hash("Daft Punk"), "Daft+Punk");
        assert_eq!(for_hash("AC/DC"), "AC%2FDC");
    }
}
