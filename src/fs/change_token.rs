use tokio::sync::watch;

/// One-shot change signal handed out by [`FileProvider::watch`].
///
/// Cloneable; every clone observes the same underlying signal. Fired at
/// most once per registration - consumers re-register after a fire.
///
/// [`FileProvider::watch`]: crate::FileProvider::watch
#[derive(Debug, Clone)]
pub struct ChangeToken {
    rx: watch::Receiver<bool>,
}

impl ChangeToken {
    /// A token that never fires. Used for sources without change
    /// detection (missing files, providers without watch support).
    pub fn never() -> Self {
        let (_tx, rx) = watch::channel(false);
        Self { rx }
    }

    /// Non-blocking check of the fired flag.
    pub fn has_changed(&self) -> bool {
        *self.rx.borrow()
    }

    /// Waits until the token fires. Returns immediately if it already
    /// has, or if the notifier side was dropped without firing.
    pub async fn changed(&mut self) {
        loop {
            if *self.rx.borrow_and_update() {
                return;
            }
            if self.rx.changed().await.is_err() {
                // Notifier dropped; nothing will ever fire.
                return;
            }
        }
    }
}

/// Producer side of a [`ChangeToken`]. Owned by the file provider.
#[derive(Debug)]
pub struct ChangeNotifier {
    tx: watch::Sender<bool>,
}

impl ChangeNotifier {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx }
    }

    pub fn token(&self) -> ChangeToken {
        ChangeToken {
            rx: self.tx.subscribe(),
        }
    }

    /// Fires every outstanding token for this registration.
    pub fn notify(&self) {
        let _ = self.tx.send(true);
    }
}

impl Default for ChangeNotifier {
    fn default() -> Self {
        Self::new()
    }
}
