use crate::browser::config::{ConnectionOptions, LaunchOptions};
use crate::error::{Result, ScriptError};
use crate::page::CdpPage;
use headless_chrome::{Browser, Tab};
use std::{ffi::OsStr, sync::Arc, time::Duration};

/// The Chrome instance hosting the player tab
pub struct BrowserSession {
    browser: Browser,
}

impl BrowserSession {
    /// Launch a new browser instance with the given options
    pub fn launch(options: LaunchOptions) -> Result<Self> {
        let mut launch_opts = headless_chrome::LaunchOptions::default();

        // The player refuses to run in an automation-flagged browser
        launch_opts.ignore_default_args.push(OsStr::new("--enable-automation"));
        launch_opts.args.push(OsStr::new("--disable-blink-features=AutomationControlled"));

        // Sessions last as long as the background keeps the channel open
        launch_opts.idle_browser_timeout = Duration::from_secs(60 * 60 * 24);

        launch_opts.headless = options.headless;
        launch_opts.window_size = Some((options.window_width, options.window_height));

        if let Some(path) = options.chrome_path {
            launch_opts.path = Some(path);
        }

        // A persistent profile keeps the player login
        if let Some(dir) = options.user_data_dir {
            launch_opts.user_data_dir = Some(dir);
        }

        launch_opts.sandbox = options.sandbox;

        let browser = Browser::new(launch_opts).map_err(|e| ScriptError::LaunchFailed(e.to_string()))?;

        Ok(Self { browser })
    }

    /// Connect to an existing browser instance via WebSocket
    pub fn connect(options: ConnectionOptions) -> Result<Self> {
        let browser = Browser::connect_with_timeout(options.ws_url, Duration::from_millis(options.timeout))
            .map_err(|e| ScriptError::ConnectionFailed(e.to_string()))?;

        Ok(Self { browser })
    }

    /// Get all tabs
    pub fn get_tabs(&self) -> Result<Vec<Arc<Tab>>> {
        let tabs = self
            .browser
            .get_tabs()
            .lock()
            .map_err(|e| ScriptError::TabOperationFailed(format!("Failed to get tabs: {}", e)))?
            .clone();

        Ok(tabs)
    }

    /// First tab whose URL starts with `prefix`
    pub fn find_tab(&self, prefix: &str) -> Result<Option<Arc<Tab>>> {
        Ok(self.get_tabs()?.into_iter().find(|tab| tab.get_url().starts_with(prefix)))
    }

    /// Open `url` in a new tab and wait for it to load
    pub fn open_tab(&self, url: &str) -> Result<Arc<Tab>> {
        let tab = self
            .browser
            .new_tab()
            .map_err(|e| ScriptError::TabOperationFailed(format!("Failed to create tab: {}", e)))?;

        tab.navigate_to(url)
            .map_err(|e| ScriptError::TabOperationFailed(format!("Failed to navigate to {}: {}", url, e)))?
            .wait_until_navigated()
            .map_err(|e| ScriptError::TabOperationFailed(format!("Navigation timeout: {}", e)))?;

        Ok(tab)
    }

    /// Attach to the tab already showing `url`, opening one if there is none
    pub fn attach_page(&self, url: &str) -> Result<CdpPage> {
        let tab = match self.find_tab(url)? {
            Some(tab) => {
                log::info!("Attaching to open tab {}", tab.get_url());
                tab
            }
            None => {
                log::info!("No tab shows {}, opening one", url);
                self.open_tab(url)?
            }
        };
        CdpPage::attach(tab)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_launch_options_builder() {
        let opts = LaunchOptions::new().headless(true).window_size(800, 600);

        assert!(opts.headless);
        assert_eq!(opts.window_width, 800);
        assert_eq!(opts.window_height, 600);
    }

    #[test]
    fn test_connection_options() {
        let opts = ConnectionOptions::new("ws://localhost:9222").timeout(5000);

        assert_eq!(opts.ws_url, "ws://localhost:9222");
        assert_eq!(opts.timeout, 5000);
    }

    // Integration tests (require Chrome to be installed)
    #[test]
    #[ignore] // Ignore by default, run with: cargo test -- --ignored
    fn test_launch_browser() {
        let result = BrowserSession::launch(LaunchOptions::new().headless(true));
        assert!(result.is_ok());
    }

    #[test]
    #[ignore]
    fn test_find_or_open_tab() {
        let session = BrowserSession::launch(LaunchOptions::new().headless(true)).expect("Failed to launch browser");

        let url = "data:text/html,<html><body><div id='main'></div></body></html>";
        assert!(session.find_tab(url).expect("Failed to list tabs").is_none());

        session.open_tab(url).expect("Failed to open tab");
        assert!(session.find_tab("data:text/html").expect("Failed to list tabs").is_some());
    }
}
