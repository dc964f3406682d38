use async_trait::async_trait;

use crate::error::LinkError;
use crate::params::ConnectionParams;

/// One communication session with a bench device.
///
/// A link is created with its connection parameters (no I/O happens at
/// construction), opened once with [`connect`](DeviceLink::connect), used for
/// zero or more commands, and released with [`close`](DeviceLink::close).
/// Links are never reused after `close`; a fresh link is constructed for a
/// new connection.
#[async_trait]
pub trait DeviceLink: Send {
    /// Establish the underlying session.
    ///
    /// On failure the link holds no resources and must not be used further.
    async fn connect(&mut self) -> Result<(), LinkError>;

    /// Release the session.
    ///
    /// Idempotent: closing an already-closed link is a logged no-op, never an
    /// error. Close cannot fail.
    async fn close(&mut self);

    /// Whether a session is currently held.
    fn is_open(&self) -> bool;

    /// The parameters this link was created with.
    fn params(&self) -> &ConnectionParams;
}

/// Command set of the gas flow regulator.
#[async_trait]
pub trait FlowLink: DeviceLink {
    /// Write a new flow setpoint in SCCM.
    ///
    /// The value is transferred as two 16-bit registers; on failure the
    /// hardware may have applied it partially.
    async fn set_flow(&mut self, sccm: f64) -> Result<(), LinkError>;

    /// Read the current flow in SCCM.
    async fn get_flow(&mut self) -> Result<f64, LinkError>;

    /// Select a gas calibration table by its index (e.g. 7 for helium).
    async fn set_gas(&mut self, gas_id: u16) -> Result<(), LinkError>;
}

/// Command set of the power relay.
#[async_trait]
pub trait SwitchLink: DeviceLink {
    async fn switch_on(&mut self) -> Result<(), LinkError>;

    async fn switch_off(&mut self) -> Result<(), LinkError>;
}

/// Produces unconnected flow-regulator links.
///
/// Construction performs no I/O; the controller decides when to connect.
/// The production factory is built once at startup and handed to each
/// controller, so there is no ambient global binding anywhere.
#[cfg_attr(test, mockall::automock)]
pub trait FlowLinkFactory: Send + Sync {
    fn flow_link(&self, params: ConnectionParams) -> Box<dyn FlowLink>;
}

/// Produces unconnected relay links.
#[cfg_attr(test, mockall::automock)]
pub trait SwitchLinkFactory: Send + Sync {
    fn switch_link(&self, params: ConnectionParams) -> Box<dyn SwitchLink>;
}
