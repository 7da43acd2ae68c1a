use super::ContentScript;
use crate::page::{HookId, Page};
use log::{debug, info, warn};

/// Hooks installed directly by the session rather than through a watcher
#[derive(Debug, Default)]
pub(super) struct Listeners {
    pub delegated: Option<HookId>,
    pub hash_change: Option<HookId>,
    pub messages: Option<HookId>,
    pub decoration: Option<HookId>,
}

impl Listeners {
    fn take_all(&mut self) -> Vec<HookId> {
        [self.delegated.take(), self.hash_change.take(), self.messages.take(), self.decoration.take()]
            .into_iter()
            .flatten()
            .collect()
    }
}

impl<P: Page> ContentScript<P> {
    /// Revert everything the session installed on the page and drop the channel
    ///
    /// Runs once; later calls are no-ops, so both sides closing the channel end
    /// up in the same state.
    pub fn cleanup(&mut self) {
        if self.cleaned_up {
            debug!("Already cleaned up");
            return;
        }
        self.cleaned_up = true;
        info!("Cleaning up");

        // the counterpart is only injected by setup
        if self.set_up {
            self.send_command("cleanup", None);
        }

        let hooks: Vec<HookId> =
            self.attributes.hooks().chain(self.content.hooks()).chain(self.listeners.take_all()).collect();
        for hook in hooks {
            if let Err(e) = self.page.uninstall(hook) {
                warn!("Failed to remove {}: {}", hook, e);
            }
        }

        self.release_state();
    }

    /// The document was replaced; our hooks went with it, so only the channel is left to close
    pub(super) fn page_unloaded(&mut self) {
        if self.cleaned_up {
            return;
        }
        self.cleaned_up = true;
        info!("Page unloaded, closing the channel");

        if let Some(session) = self.session.take() {
            session.disconnect();
        }
        self.listeners = Listeners::default();
        self.release_state();
    }

    fn release_state(&mut self) {
        self.attributes.clear();
        self.content.clear();
        self.navigator.reset();
        self.list_ratings = None;
        self.session = None;
    }

    pub fn is_cleaned_up(&self) -> bool {
        self.cleaned_up
    }
}
