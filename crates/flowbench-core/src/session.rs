use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::LinkError;
use crate::link::DeviceLink;

/// Connection state of one controller's session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionState {
    /// No link held, commands are rejected
    Disconnected,
    /// A link is open and commands may be issued
    Connected,
}

impl SessionState {
    /// Check if a link is currently held
    pub fn is_connected(&self) -> bool {
        matches!(self, Self::Connected)
    }

    /// Check if device commands may be issued in this state
    pub fn accepts_commands(&self) -> bool {
        matches!(self, Self::Connected)
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::Disconnected
    }
}

/// Holds the currently open link of a controller, if any.
///
/// The session owns the link lifecycle: [`open`](Session::open) replaces
/// whatever was held before, [`shutdown`](Session::shutdown) always leaves the
/// session empty. Command failures never change what is held; only explicit
/// open and shutdown calls do.
pub struct Session<L: DeviceLink + ?Sized> {
    link: Option<Box<L>>,
}

impl<L: DeviceLink + ?Sized> Session<L> {
    pub fn new() -> Self {
        Self { link: None }
    }

    pub fn state(&self) -> SessionState {
        if self.link.is_some() {
            SessionState::Connected
        } else {
            SessionState::Disconnected
        }
    }

    pub fn is_connected(&self) -> bool {
        self.link.is_some()
    }

    /// Connect `link` and hold it, releasing any previous link first.
    ///
    /// On connect failure the session ends up empty, even if it held an open
    /// link before the call.
    pub async fn open(&mut self, mut link: Box<L>) -> Result<&mut L, LinkError> {
        if let Some(mut previous) = self.link.take() {
            info!(port = %previous.params().port, "Replacing open session");
            previous.close().await;
        }
        link.connect().await?;
        Ok(&mut **self.link.insert(link))
    }

    /// Release the held link, if any. Safe to call when already empty.
    pub async fn shutdown(&mut self) {
        match self.link.take() {
            Some(mut link) => link.close().await,
            None => debug!("Shutdown requested with no open session"),
        }
    }

    /// The held link, for issuing commands
    pub fn link_mut(&mut self) -> Option<&mut L> {
        self.link.as_deref_mut()
    }
}

impl<L: DeviceLink + ?Sized> Default for Session<L> {
    fn default() -> Self {
        Self::new()
    }
}
