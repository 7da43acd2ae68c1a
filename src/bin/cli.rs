//! PrimePlayer content script driver
//!
//! Attaches the content script to the player tab of a Chrome instance and
//! speaks the background channel as newline-delimited JSON: inbound messages
//! on stdin, outbound messages on stdout. Logs go to stderr (`RUST_LOG`).

use anyhow::Context;
use clap::Parser;
use log::{info, warn};
use primeplayer_content::{
    BrowserSession, ConnectionOptions, ContentScript, InboundMessage, LaunchOptions, ScriptConfig, ToBackground,
};
use serde_json::json;
use std::time::{Duration, Instant};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::sync::mpsc::unbounded_channel;

#[derive(Parser)]
#[command(name = "primeplayer-content")]
#[command(version)]
#[command(about = "Relay Google Play Music player state over stdio", long_about = None)]
struct Cli {
    /// Launch browser in headless mode (default: headed, the player needs a login)
    #[arg(long)]
    headless: bool,

    /// Path to custom browser executable
    #[arg(long, value_name = "PATH")]
    executable_path: Option<String>,

    /// WebSocket endpoint URL for remote browser connection
    #[arg(long, value_name = "URL")]
    ws_endpoint: Option<String>,

    /// Persistent browser profile directory
    #[arg(long, value_name = "DIR")]
    user_data_dir: Option<String>,

    /// Disable the Chrome sandbox
    #[arg(long)]
    no_sandbox: bool,

    /// Player URL; an open tab starting with it is reused
    #[arg(long, default_value = "https://play.google.com/music/listen")]
    url: String,

    /// Base URL of the extension assets (injected script, connected icon)
    #[arg(long, value_name = "URL")]
    extension_base: Option<String>,

    /// Settle delay for the song info and main view watchers, in milliseconds
    #[arg(long, default_value = "500")]
    settle_ms: u64,

    /// Page event polling interval, in milliseconds
    #[arg(long, default_value = "100")]
    poll_ms: u64,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let session = match cli.ws_endpoint {
        Some(ref endpoint) => {
            info!("Connecting to {}", endpoint);
            BrowserSession::connect(ConnectionOptions::new(endpoint.clone()))?
        }
        None => {
            let mut options = LaunchOptions::new().headless(cli.headless).sandbox(!cli.no_sandbox);
            if let Some(ref path) = cli.executable_path {
                options = options.chrome_path(path);
            }
            if let Some(ref dir) = cli.user_data_dir {
                options = options.user_data_dir(dir);
            }
            info!("Launching browser ({})", if options.headless { "headless" } else { "headed" });
            BrowserSession::launch(options)?
        }
    };

    let page = session.attach_page(&cli.url).context("Failed to attach to the player tab")?;

    let mut config = ScriptConfig::new().settle(Duration::from_millis(cli.settle_ms));
    if let Some(ref base) = cli.extension_base {
        config = config.extension_base(base);
    }

    let mut stdout = tokio::io::stdout();
    let (tx, mut rx) = unbounded_channel();
    let mut script = ContentScript::connect(page, config, tx);

    let hello = json!({ "type": "connect", "name": script.config().port_name });
    stdout.write_all(format!("{}\n", hello).as_bytes()).await?;
    stdout.flush().await?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut poll = tokio::time::interval(Duration::from_millis(cli.poll_ms.max(1)));

    loop {
        let wake = match script.next_deadline() {
            Some(deadline) => tokio::time::Instant::from_std(deadline),
            None => tokio::time::Instant::now() + Duration::from_secs(3600),
        };

        tokio::select! {
            line = lines.next_line() => match line.context("Failed to read stdin")? {
                Some(line) if line.trim().is_empty() => {}
                Some(line) => match InboundMessage::from_json(&line) {
                    Ok(message) => script.handle_port_message(message),
                    Err(e) => warn!("{}", e),
                },
                None => script.handle_port_disconnect(),
            },
            _ = poll.tick() => script.pump(Instant::now()),
            _ = tokio::time::sleep_until(wake) => script.pump(Instant::now()),
        }

        while let Ok(outgoing) = rx.try_recv() {
            let line = match outgoing {
                ToBackground::Message(message) => serde_json::to_string(&message)?,
                ToBackground::Disconnect => json!({ "type": "disconnect" }).to_string(),
            };
            stdout.write_all(line.as_bytes()).await?;
            stdout.write_all(b"\n").await?;
        }
        stdout.flush().await?;

        if !script.is_connected() {
            break;
        }
    }

    if script.is_set_up() {
        script.cleanup();
    }
    info!("Channel closed, exiting");
    Ok(())
}
