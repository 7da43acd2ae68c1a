//! Chrome hosting the player tab

pub mod config;
pub mod session;

pub use config::{ConnectionOptions, LaunchOptions};
pub use session::BrowserSession;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_launch_defaults() {
        let opts = LaunchOptions::default();
        assert!(!opts.headless);
        assert!(opts.sandbox);
        assert!(opts.user_data_dir.is_none());
    }

    #[test]
    fn test_profile_and_binary() {
        let opts = LaunchOptions::new().chrome_path("/usr/bin/chromium").user_data_dir("/tmp/primeplayer").sandbox(false);
        assert_eq!(opts.chrome_path.as_deref(), Some(std::path::Path::new("/usr/bin/chromium")));
        assert_eq!(opts.user_data_dir.as_deref(), Some(std::path::Path::new("/tmp/primeplayer")));
        assert!(!opts.sandbox);
    }

    #[test]
    fn test_connection_keeps_idle_sessions() {
        assert_eq!(ConnectionOptions::new("ws://127.0.0.1:9222/devtools/browser/x").timeout, 86_400_000);
    }
}
