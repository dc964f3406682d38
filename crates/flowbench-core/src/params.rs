use serde::{Deserialize, Serialize};

/// Serial/MODBUS parameters for one connection attempt.
///
/// Built once per `turn_on` call and never mutated afterwards; a fresh value
/// is constructed for every new attempt. Serial framing is not part of the
/// parameters because both bench devices speak fixed 8N1.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionParams {
    /// Serial port identifier (e.g. "/dev/ttyUSB0" or "COM3").
    pub port: String,
    /// Baud rate for the serial line.
    pub baud_rate: u32,
    /// MODBUS slave id of the target device on the shared line.
    pub slave_id: u8,
    /// Response timeout in milliseconds for every request on this connection.
    pub timeout_ms: u64,
}

impl ConnectionParams {
    pub fn new(port: impl Into<String>, baud_rate: u32, slave_id: u8, timeout_ms: u64) -> Self {
        Self {
            port: port.into(),
            baud_rate,
            slave_id,
            timeout_ms,
        }
    }
}

impl std::fmt::Display for ConnectionParams {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}@{} (slave {}, timeout {} ms)",
            self.port, self.baud_rate, self.slave_id, self.timeout_ms
        )
    }
}
