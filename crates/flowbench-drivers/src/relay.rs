use async_trait::async_trait;
use tokio_modbus::client::Context;
use tokio_modbus::prelude::*;
use tracing::{debug, info, warn};

use flowbench_core::{ConnectionParams, DeviceLink, LinkError, SwitchLink};

use crate::registers::RELAY_SWITCH;
use crate::rtu;

/// MODBUS-RTU link to the bench power relay.
pub struct RelayLink {
    params: ConnectionParams,
    context: Option<Context>,
}

impl RelayLink {
    pub fn new(params: ConnectionParams) -> Self {
        Self {
            params,
            context: None,
        }
    }

    async fn write_switch(&mut self, value: u16) -> Result<(), LinkError> {
        let timeout_ms = self.params.timeout_ms;
        debug!(value, "Writing relay register");
        let ctx = self.context.as_mut().ok_or(LinkError::Closed)?;
        rtu::request(timeout_ms, ctx.write_single_register(RELAY_SWITCH, value)).await
    }
}

#[async_trait]
impl DeviceLink for RelayLink {
    async fn connect(&mut self) -> Result<(), LinkError> {
        let context = rtu::open_context(&self.params)?;
        info!(port = %self.params.port, slave_id = self.params.slave_id, "Relay port opened");
        self.context = Some(context);
        Ok(())
    }

    async fn close(&mut self) {
        match self.context.take() {
            Some(_) => info!(port = %self.params.port, "Relay port closed"),
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
impl SwitchLink for RelayLink {
    async fn switch_on(&mut self) -> Result<(), LinkError> {
        self.write_switch(1).await
    }

    async fn switch_off(&mut self) -> Result<(), LinkError> {
        self.write_switch(0).await
    }
}
