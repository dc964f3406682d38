use std::sync::Arc;
use tracing::{info, warn};

use crate::error::{LinkError, RrgError};
use crate::link::{FlowLink, FlowLinkFactory};
use crate::params::ConnectionParams;
use crate::session::{Session, SessionState};

/// Controls the RRG gas flow regulator.
///
/// Every method returns a variant of [`RrgError`] on failure; link-level
/// errors never escape unwrapped and nothing here panics. That makes the
/// controller safe to drive from a control loop without a surrounding
/// failure handler.
pub struct RrgController {
    links: Arc<dyn FlowLinkFactory>,
    session: Session<dyn FlowLink>,
    last_error: Option<LinkError>,
}

impl RrgController {
    pub fn new(links: Arc<dyn FlowLinkFactory>) -> Self {
        Self {
            links,
            session: Session::new(),
            last_error: None,
        }
    }

    /// Open a connection to the regulator on `params`.
    ///
    /// If a connection is already open it is closed first and replaced, so a
    /// failure always leaves the controller disconnected.
    pub async fn turn_on(&mut self, params: ConnectionParams) -> Result<(), RrgError> {
        info!(port = %params.port, slave_id = params.slave_id, "Connecting flow regulator");
        match self.session.open(self.links.flow_link(params)).await {
            Ok(_) => Ok(()),
            Err(e) => {
                warn!("Flow regulator connect failed: {}", e);
                self.last_error = Some(e.clone());
                Err(RrgError::ConnectFailed(e))
            }
        }
    }

    /// Close the connection. The close itself cannot fail.
    pub async fn turn_off(&mut self) -> Result<(), RrgError> {
        if !self.session.is_connected() {
            return Err(RrgError::NotConnected);
        }
        info!("Disconnecting flow regulator");
        self.session.shutdown().await;
        Ok(())
    }

    /// Write a new flow setpoint in SCCM.
    pub async fn set_flow(&mut self, sccm: f64) -> Result<(), RrgError> {
        let link = match self.session.link_mut() {
            Some(link) => link,
            None => return Err(RrgError::NotConnected),
        };
        match link.set_flow(sccm).await {
            Ok(()) => Ok(()),
            Err(e) => {
                warn!(sccm, "Setpoint write failed: {}", e);
                self.last_error = Some(e.clone());
                Err(RrgError::SetFlowFailed(e))
            }
        }
    }

    /// Read the current flow in SCCM.
    pub async fn get_flow(&mut self) -> Result<f64, RrgError> {
        let link = match self.session.link_mut() {
            Some(link) => link,
            None => return Err(RrgError::NotConnected),
        };
        match link.get_flow().await {
            Ok(flow) => Ok(flow),
            Err(e) => {
                warn!("Flow read failed: {}", e);
                self.last_error = Some(e.clone());
                Err(RrgError::GetFlowFailed(e))
            }
        }
    }

    /// Select the gas calibration table the regulator should use.
    pub async fn set_gas(&mut self, gas_id: u16) -> Result<(), RrgError> {
        let link = match self.session.link_mut() {
            Some(link) => link,
            None => return Err(RrgError::NotConnected),
        };
        match link.set_gas(gas_id).await {
            Ok(()) => Ok(()),
            Err(e) => {
                warn!(gas_id, "Gas select failed: {}", e);
                self.last_error = Some(e.clone());
                Err(RrgError::SetGasFailed(e))
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
    ///
    /// Kept across disconnects so the cause of a failed `turn_on` can still
    /// be inspected afterwards.
    pub fn last_error(&self) -> Option<&LinkError> {
        self.last_error.as_ref()
    }
}
