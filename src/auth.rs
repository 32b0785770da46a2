//! Push-based identity source.
//!
//! The authentication provider publishes the current [`User`] (or `None`) on a
//! watch channel; the store follows it through
//! [`TaskStore::follow_auth`](crate::store::TaskStore::follow_auth).

use log::info;
use tokio::sync::watch;

use crate::entities::User;

pub struct AuthSession {
    tx: watch::Sender<Option<User>>,
}

impl Default for AuthSession {
    fn default() -> Self {
        Self::new()
    }
}

impl AuthSession {
    /// Create a signed-out session
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(None);
        Self { tx }
    }

    pub fn sign_in(&self, user: User) {
        info!("🔑 Signed in as {}", user.uid);
        self.tx.send_replace(Some(user));
    }

    pub fn sign_out(&self) {
        if self.tx.send_replace(None).is_some() {
            info!("🔒 Signed out");
        }
    }

    pub fn current(&self) -> Option<User> {
        self.tx.borrow().clone()
    }

    /// Receiver notified on every identity change
    pub fn subscribe(&self) -> watch::Receiver<Option<User>> {
        self.tx.subscribe()
    }
}
