use projecttracker_application::Navigator;
use tokio::sync::watch;
use tracing::info;

/// Navigator that publishes redirect targets on a watch channel.
///
/// Hosts without a router subscribe and react to the latest location.
#[derive(Debug)]
pub struct WatchNavigator {
    sender: watch::Sender<Option<String>>,
}

impl Default for WatchNavigator {
    fn default() -> Self {
        Self::new()
    }
}

impl WatchNavigator {
    /// Creates a navigator with no pending redirect.
    #[must_use]
    pub fn new() -> Self {
        let (sender, _) = watch::channel(None);
        Self { sender }
    }

    /// Subscribes to redirect targets.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Option<String>> {
        self.sender.subscribe()
    }

    /// Returns the most recent redirect target.
    #[must_use]
    pub fn current(&self) -> Option<String> {
        self.sender.borrow().clone()
    }
}

impl Navigator for WatchNavigator {
    fn redirect(&self, location: &str) {
        info!(location, "navigation requested");
        self.sender.send_replace(Some(location.to_owned()));
    }
}
