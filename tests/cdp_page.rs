use primeplayer_content::page::{Decoration, Hook};
use primeplayer_content::{BrowserSession, LaunchOptions, Page, PageEvent, ScriptError};

const PLAYER: &str = "data:text/html,<html><head></head><body>\
    <div id='vslider' aria-valuenow='70'></div>\
    <div class='music-banner-icon'></div>\
    <div id='main'><table><tbody><tr class='song-row'><td data-col='rating' data-rating='0'></td></tr></tbody></table></div>\
    </body></html>";

#[test]
#[ignore] // Requires Chrome to be installed
fn test_query_and_attribute_hook() {
    let session = BrowserSession::launch(LaunchOptions::new().headless(true)).expect("Failed to launch browser");
    let mut page = session.attach_page(PLAYER).expect("Failed to attach");

    let slider = page.query("#vslider").expect("Query failed").expect("Slider missing");
    assert_eq!(slider.attr("aria-valuenow"), Some("70"));

    let hook = page
        .install(Hook::Attributes { selector: "#vslider".into(), attributes: vec!["aria-valuenow".into()] })
        .expect("Failed to install hook");

    page.tab()
        .evaluate("document.getElementById('vslider').setAttribute('aria-valuenow', '35')", false)
        .expect("Failed to mutate");

    let events = page.poll_events().expect("Failed to drain events");
    assert!(matches!(&events[..], [PageEvent::AttributeChanged { hook: h, element, .. }]
        if *h == hook && element.attr("aria-valuenow") == Some("35")));

    page.uninstall(hook).expect("Failed to uninstall");
    assert!(page.uninstall(hook).is_err());
}

#[test]
#[ignore]
fn test_delegated_row_index_and_decoration() {
    let session = BrowserSession::launch(LaunchOptions::new().headless(true)).expect("Failed to launch browser");
    let mut page = session.attach_page(PLAYER).expect("Failed to attach");

    page.install(Hook::Delegated { root: "#main".into(), target: ".song-row td[data-col='rating']".into() })
        .expect("Failed to install delegated hook");
    page.tab()
        .evaluate("document.querySelector(\"td[data-col='rating']\").setAttribute('data-rating', '5')", false)
        .expect("Failed to mutate");

    let events = page.poll_events().expect("Failed to drain events");
    assert!(matches!(&events[..], [PageEvent::DelegatedChanged { row_index: 0, element, .. }]
        if element.data("rating") == Some("5")));

    let decoration = Decoration { background_url: "icon.png".into(), title: "connected".into() };
    let hook = page
        .install(Hook::Decorate { selector: ".music-banner-icon".into(), decoration })
        .expect("Failed to decorate");
    let icon = page.query(".music-banner-icon").unwrap().unwrap();
    assert_eq!(icon.attr("title"), Some("connected"));

    page.uninstall(hook).expect("Failed to uninstall");
    let icon = page.query(".music-banner-icon").unwrap().unwrap();
    assert_eq!(icon.attr("title"), None);
}

#[test]
#[ignore]
fn test_missing_element_is_reported() {
    let session = BrowserSession::launch(LaunchOptions::new().headless(true)).expect("Failed to launch browser");
    let mut page = session.attach_page(PLAYER).expect("Failed to attach");

    let result = page.install(Hook::Subtree { selector: "#playerSongInfo".into() });
    assert!(matches!(result, Err(ScriptError::ElementMissing(_))));
}

#[test]
#[ignore]
fn test_reload_is_reported_as_unloaded() {
    let session = BrowserSession::launch(LaunchOptions::new().headless(true)).expect("Failed to launch browser");
    let mut page = session.attach_page(PLAYER).expect("Failed to attach");
    page.install(Hook::HashChange).expect("Failed to install hook");
    assert!(page.poll_events().expect("Failed to drain events").is_empty());

    page.tab().reload(false, None).expect("Failed to reload");
    page.tab().wait_until_navigated().expect("Reload did not finish");

    assert!(matches!(page.poll_events(), Err(ScriptError::PageUnloaded)));
}
