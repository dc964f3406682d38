use thiserror::Error;

/// Link-level failures.
///
/// Every variant is an expected runtime outcome of talking to hardware over
/// an unreliable serial line, not a program defect; links report them as
/// values and never panic. `Clone + PartialEq` so controllers can keep the
/// most recent failure around and tests can compare outcomes directly.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LinkError {
    #[error("failed to open serial port {port}: {detail}")]
    PortOpen { port: String, detail: String },

    #[error("MODBUS exception: {0}")]
    Exception(String),

    #[error("MODBUS transport error: {0}")]
    Transport(String),

    #[error("no response within {0} ms")]
    Timeout(u64),

    #[error("link is closed")]
    Closed,
}

/// Failure vocabulary of the flow-regulator controller.
///
/// A closed set: callers can match exhaustively, and nothing from the link
/// layer leaks through in any other shape. Variants other than
/// `NotConnected` carry the link failure that caused them.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RrgError {
    #[error("flow regulator is not connected")]
    NotConnected,

    #[error("failed to connect to the flow regulator: {0}")]
    ConnectFailed(LinkError),

    #[error("failed to write flow setpoint: {0}")]
    SetFlowFailed(LinkError),

    #[error("failed to read flow: {0}")]
    GetFlowFailed(LinkError),

    #[error("failed to select gas table: {0}")]
    SetGasFailed(LinkError),
}

/// Failure vocabulary of the relay controller.
///
/// `TurnOnFailed` is distinct from `ConnectFailed` on purpose: it means the
/// serial link came up but the device refused the switch command, which is
/// diagnosed differently from never reaching the device at all.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RelayError {
    #[error("relay is not connected")]
    NotConnected,

    #[error("failed to connect to the relay: {0}")]
    ConnectFailed(LinkError),

    #[error("failed to turn the relay on: {0}")]
    TurnOnFailed(LinkError),

    #[error("failed to turn the relay off: {0}")]
    TurnOffFailed(LinkError),
}
