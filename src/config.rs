use std::time::Duration;

/// Options controlling the content script
#[derive(Debug, Clone, PartialEq)]
pub struct ScriptConfig {
    /// Name announced when opening the background channel
    pub port_name: String,

    /// Settle delay for the song info area
    pub song_settle: Duration,

    /// Settle delay for the current-position display (zero fires on every mutation)
    pub position_settle: Duration,

    /// Settle delay for the main view, used as the "view ready" signal
    pub main_settle: Duration,

    /// Upper bound on how long a single mutation burst may postpone a settle callback
    pub settle_ceiling: Duration,

    /// Listing route searched when a card route is not clickable from the current view
    pub fallback_route: String,

    /// Hash the page lands on after a card was clicked
    pub card_guard_hash: String,

    /// URL of the counterpart script injected into the page
    pub injected_script_url: String,

    /// Background image used to mark the tab as connected
    pub connected_icon_url: String,

    /// Tooltip shown on the connected icon
    pub connected_title: String,
}

impl Default for ScriptConfig {
    fn default() -> Self {
        Self {
            port_name: "googlemusic".to_string(),
            song_settle: Duration::from_millis(500),
            position_settle: Duration::ZERO,
            main_settle: Duration::from_millis(500),
            settle_ceiling: Duration::from_secs(5),
            fallback_route: "rd".to_string(),
            card_guard_hash: "#/ap/queue".to_string(),
            injected_script_url: "js/injected.js".to_string(),
            connected_icon_url: "img/icon-tabconnected.png".to_string(),
            connected_title: "connected".to_string(),
        }
    }
}

impl ScriptConfig {
    /// Create config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method: set the channel name
    pub fn port_name(mut self, name: impl Into<String>) -> Self {
        self.port_name = name.into();
        self
    }

    /// Builder method: set the song and main view settle delay
    pub fn settle(mut self, delay: Duration) -> Self {
        self.song_settle = delay;
        self.main_settle = delay;
        self
    }

    /// Builder method: set the settle ceiling
    pub fn settle_ceiling(mut self, ceiling: Duration) -> Self {
        self.settle_ceiling = ceiling;
        self
    }

    /// Builder method: set the fallback listing route
    pub fn fallback_route(mut self, route: impl Into<String>) -> Self {
        self.fallback_route = route.into();
        self
    }

    /// Builder method: set the extension base URL used for injected assets
    pub fn extension_base(mut self, base: &str) -> Self {
        let base = base.trim_end_matches('/');
        self.injected_script_url = format!("{}/js/injected.js", base);
        self.connected_icon_url = format!("{}/img/icon-tabconnected.png", base);
        self
    }

    /// Builder method: set the connected tooltip
    pub fn connected_title(mut self, title: impl Into<String>) -> Self {
        self.connected_title = title.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ScriptConfig::default();
        assert_eq!(config.port_name, "googlemusic");
        assert_eq!(config.song_settle, Duration::from_millis(500));
        assert_eq!(config.position_settle, Duration::ZERO);
        assert_eq!(config.fallback_route, "rd");
        assert_eq!(config.card_guard_hash, "#/ap/queue");
    }

    #[test]
    fn test_builder() {
        let config = ScriptConfig::new()
            .settle(Duration::from_millis(200))
            .extension_base("chrome-extension://abc/")
            .connected_title("verbunden");

        assert_eq!(config.song_settle, Duration::from_millis(200));
        assert_eq!(config.main_settle, Duration::from_millis(200));
        assert_eq!(config.injected_script_url, "chrome-extension://abc/js/injected.js");
        assert_eq!(config.connected_icon_url, "chrome-extension://abc/img/icon-tabconnected.png");
        assert_eq!(config.connected_title, "verbunden");
    }
}
