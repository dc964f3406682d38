use std::sync::Arc;
use tracing::{info, warn};

use crate::error::{LinkError, RelayError};
use crate::link::{SwitchLink, SwitchLinkFactory};
use crate::params::ConnectionParams;
use crate::session::{Session, SessionState};

/// Controls the power relay.
///
/// Unlike the flow regulator, the relay couples connection and energizing:
/// `turn_on` both opens the link and closes the contact, `turn_off` opens the
/// contact and then releases the link. A relay that cannot be switched off
/// stays connected so the operator can retry.
pub struct RelayController {
    links: Arc<dyn SwitchLinkFactory>,
    session: Session<dyn SwitchLink>,
    last_error: Option<LinkError>,
}

impl RelayController {
    pub fn new(links: Arc<dyn SwitchLinkFactory>) -> Self {
        Self {
            links,
            session: Session::new(),
            last_error: None,
        }
    }

    /// Connect to the relay on `params` and energize it.
    ///
    /// `ConnectFailed` means the device was never reached; `TurnOnFailed`
    /// means the link came up but the switch command was rejected, in which
    /// case the link is closed again and the controller stays disconnected.
    pub async fn turn_on(&mut self, params: ConnectionParams) -> Result<(), RelayError> {
        info!(port = %params.port, slave_id = params.slave_id, "Connecting relay");
        let link = match self.session.open(self.links.switch_link(params)).await {
            Ok(link) => link,
            Err(e) => {
                warn!("Relay connect failed: {}", e);
                self.last_error = Some(e.clone());
                return Err(RelayError::ConnectFailed(e));
            }
        };
        match link.switch_on().await {
            Ok(()) => Ok(()),
            Err(e) => {
                warn!("Relay refused the on command: {}", e);
                self.last_error = Some(e.clone());
                self.session.shutdown().await;
                Err(RelayError::TurnOnFailed(e))
            }
        }
    }

    /// De-energize the relay and close the link.
    ///
    /// If the off command fails the link is kept open and the controller
    /// stays connected, so a retry does not have to re-establish the session.
    pub async fn turn_off(&mut self) -> Result<(), RelayError> {
        let link = match self.session.link_mut() {
            Some(link) => link,
            None => return Err(RelayError::NotConnected),
        };
        match link.switch_off().await {
            Ok(()) => {
                info!("Disconnecting relay");
                self.session.shutdown().await;
                Ok(())
            }
            Err(e) => {
                warn!("Relay refused the off command: {}", e);
                self.last_error = Some(e.clone());
                Err(RelayError::TurnOffFailed(e))
            }
        }
    }

    pub fn state(&self) -> SessionState {
        self.session.state()
    }

    pub fn is_connected(&self) -> bool {
        self.session.is_connected()
    }

    pub fn is_disconnected(&self) -> bool {
        !self.session.is_connected()
    }

    /// The most recent link failure seen by this controller, if any.
    pub fn last_error(&self) -> Option<&LinkError> {
        self.last_error.as_ref()
    }
}
