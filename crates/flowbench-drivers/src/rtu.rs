use std::future::Future;
use std::time::Duration;

use tokio_modbus::client::Context;
use tokio_modbus::prelude::*;
use tokio_serial::SerialStream;

use flowbench_core::{ConnectionParams, LinkError};

/// Open the serial port from `params` and attach a MODBUS-RTU client.
///
/// Framing is fixed 8N1 for both device families.
pub(crate) fn open_context(params: &ConnectionParams) -> Result<Context, LinkError> {
    // Normalize port name for Windows
    let port_name = if cfg!(target_os = "windows") && !params.port.starts_with(r"\\.\") {
        format!(r"\\.\{}", params.port)
    } else {
        params.port.clone()
    };

    let builder = tokio_serial::new(&port_name, params.baud_rate)
        .data_bits(tokio_serial::DataBits::Eight)
        .parity(tokio_serial::Parity::None)
        .stop_bits(tokio_serial::StopBits::One)
        .timeout(Duration::from_millis(params.timeout_ms));

    let port = SerialStream::open(&builder).map_err(|e| {
        tracing::error!("Failed to open serial port {}: {}", port_name, e);
        LinkError::PortOpen {
            port: port_name.clone(),
            detail: e.to_string(),
        }
    })?;

    Ok(tokio_modbus::client::rtu::attach_slave(
        port,
        Slave(params.slave_id),
    ))
}

/// Run one MODBUS transaction with the configured response timeout.
///
/// The transaction future resolves to the nested transport/exception result
/// the client returns; both failure layers and an elapsed timeout are
/// collapsed into a single `LinkError`.
pub(crate) async fn request<T, F>(timeout_ms: u64, transaction: F) -> Result<T, LinkError>
where
    F: Future<Output = Result<Result<T, tokio_modbus::Exception>, tokio_modbus::Error>>,
{
    let result = tokio::time::timeout(Duration::from_millis(timeout_ms), transaction).await;

    match result {
        Ok(outcome) => match outcome {
            Ok(inner) => match inner {
                Ok(value) => Ok(value),
                Err(exception) => Err(LinkError::Exception(exception.to_string())),
            },
            Err(e) => Err(LinkError::Transport(e.to_string())),
        },
        Err(_) => Err(LinkError::Timeout(timeout_ms)),
    }
}
