use async_trait::async_trait;
use tokio_modbus::client::Context;
use tokio_modbus::prelude::*;
use tracing::{debug, info, warn};

use flowbench_core::{ConnectionParams, DeviceLink, FlowLink, LinkError};

use crate::registers::{self, RRG_FLOW, RRG_GAS, RRG_SETPOINT_HI, RRG_SETPOINT_LO};
use crate::rtu;

/// MODBUS-RTU link to an RRG-series gas flow regulator.
pub struct RrgLink {
    params: ConnectionParams,
    context: Option<Context>,
}

impl RrgLink {
    pub fn new(params: ConnectionParams) -> Self {
        Self {
            params,
            context: None,
        }
    }
}

#[async_trait]
impl DeviceLink for RrgLink {
    async fn connect(&mut self) -> Result<(), LinkError> {
        let context = rtu::open_context(&self.params)?;
        info!(port = %self.params.port, slave_id = self.params.slave_id, "Flow regulator port opened");
        self.context = Some(context);
        Ok(())
    }

    async fn close(&mut self) {
        // Dropping the context closes the port.
        match self.context.take() {
            Some(_) => info!(port = %self.params.port, "Flow regulator port closed"),
            None => warn!(port = %self.params.port, "Close on an already-closed link"),
        }
    }

    fn is_open(&self) -> bool {
        self.context.is_some()
    }

    fn params(&self) -> &ConnectionParams {
        &self.params
    }
}

#[async_trait]
impl FlowLink for RrgLink {
    async fn set_flow(&mut self, sccm: f64) -> Result<(), LinkError> {
        let timeout_ms = self.params.timeout_ms;
        let (hi, lo) = registers::encode_setpoint(sccm);
        debug!(sccm, hi, lo, "Writing setpoint registers");
        let ctx = self.context.as_mut().ok_or(LinkError::Closed)?;
        // The regulator wants the two words as separate single-register
        // writes, high word first. The pair is not atomic on the wire.
        rtu::request(timeout_ms, ctx.write_single_register(RRG_SETPOINT_HI, hi)).await?;
        rtu::request(timeout_ms, ctx.write_single_register(RRG_SETPOINT_LO, lo)).await?;
        Ok(())
    }

    async fn get_flow(&mut self) -> Result<f64, LinkError> {
        let timeout_ms = self.params.timeout_ms;
        let ctx = self.context.as_mut().ok_or(LinkError::Closed)?;
        let words = rtu::request(timeout_ms, ctx.read_holding_registers(RRG_FLOW, 2)).await?;
        if words.len() < 2 {
            return Err(LinkError::Transport(format!(
                "short register read: expected 2 words, got {}",
                words.len()
            )));
        }
        let flow = registers::decode_flow(words[0], words[1]);
        debug!(flow, "Flow registers read");
        Ok(flow)
    }

    async fn set_gas(&mut self, gas_id: u16) -> Result<(), LinkError> {
        let timeout_ms = self.params.timeout_ms;
        debug!(gas_id, "Selecting gas table");
        let ctx = self.context.as_mut().ok_or(LinkError::Closed)?;
        rtu::request(timeout_ms, ctx.write_single_register(RRG_GAS, gas_id)).await?;
        Ok(())
    }
}
