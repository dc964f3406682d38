use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tracing::{info, warn};

use flowbench_core::{
    ConnectionParams, DeviceLink, FlowLink, FlowLinkFactory, LinkError, SwitchLink,
    SwitchLinkFactory,
};

use crate::registers;

/// Fault injection switches for the simulated bench.
#[derive(Debug, Default, Clone)]
pub struct SimFaults {
    pub fail_set_flow: bool,
    pub fail_get_flow: bool,
    pub fail_set_gas: bool,
    pub fail_switch: bool,
}

struct SimState {
    flow_sccm: f64,
    gas_id: u16,
    relay_on: bool,
    faults: SimFaults,
}

/// In-memory stand-in for the gas line.
///
/// The bench answers on a single slave id; any other address behaves like a
/// silent device and the connect times out. The stored setpoint is routed
/// through the register encoding before it is reported back as the live flow,
/// so readings carry the same milli-SCCM quantization as real hardware.
pub struct SimBench {
    slave_id: u8,
    state: Mutex<SimState>,
}

impl SimBench {
    pub fn new(slave_id: u8) -> Arc<Self> {
        Arc::new(Self {
            slave_id,
            state: Mutex::new(SimState {
                flow_sccm: 0.0,
                gas_id: 0,
                relay_on: false,
                faults: SimFaults::default(),
            }),
        })
    }

    pub fn set_faults(&self, faults: SimFaults) {
        self.state.lock().unwrap().faults = faults;
    }

    pub fn flow_sccm(&self) -> f64 {
        self.state.lock().unwrap().flow_sccm
    }

    pub fn gas_id(&self) -> u16 {
        self.state.lock().unwrap().gas_id
    }

    pub fn relay_on(&self) -> bool {
        self.state.lock().unwrap().relay_on
    }

    fn accepts(&self, params: &ConnectionParams) -> Result<(), LinkError> {
        if params.slave_id != self.slave_id {
            // A wrong address on a real line is silence, not a rejection.
            warn!(
                slave_id = params.slave_id,
                "No simulated device at this address"
            );
            return Err(LinkError::Timeout(params.timeout_ms));
        }
        Ok(())
    }
}

/// Simulated counterpart of the flow regulator link.
pub struct SimFlowLink {
    params: ConnectionParams,
    bench: Arc<SimBench>,
    open: bool,
}

#[async_trait]
impl DeviceLink for SimFlowLink {
    async fn connect(&mut self) -> Result<(), LinkError> {
        self.bench.accepts(&self.params)?;
        info!(port = %self.params.port, "Simulated flow regulator connected");
        self.open = true;
        Ok(())
    }

    async fn close(&mut self) {
        if self.open {
            info!(port = %self.params.port, "Simulated flow regulator closed");
        } else {
            warn!(port = %self.params.port, "Close on an already-closed link");
        }
        self.open = false;
    }

    fn is_open(&self) -> bool {
        self.open
    }

    fn params(&self) -> &ConnectionParams {
        &self.params
    }
}

#[async_trait]
impl FlowLink for SimFlowLink {
    async fn set_flow(&mut self, sccm: f64) -> Result<(), LinkError> {
        if !self.open {
            return Err(LinkError::Closed);
        }
        let mut state = self.bench.state.lock().unwrap();
        if state.faults.fail_set_flow {
            return Err(LinkError::Timeout(self.params.timeout_ms));
        }
        let (hi, lo) = registers::encode_setpoint(sccm);
        state.flow_sccm = registers::decode_flow(hi, lo);
        Ok(())
    }

    async fn get_flow(&mut self) -> Result<f64, LinkError> {
        if !self.open {
            return Err(LinkError::Closed);
        }
        let state = self.bench.state.lock().unwrap();
        if state.faults.fail_get_flow {
            return Err(LinkError::Timeout(self.params.timeout_ms));
        }
        Ok(state.flow_sccm)
    }

    async fn set_gas(&mut self, gas_id: u16) -> Result<(), LinkError> {
        if !self.open {
            return Err(LinkError::Closed);
        }
        let mut state = self.bench.state.lock().unwrap();
        if state.faults.fail_set_gas {
            return Err(LinkError::Timeout(self.params.timeout_ms));
        }
        state.gas_id = gas_id;
        Ok(())
    }
}

/// Simulated counterpart of the relay link.
pub struct SimSwitchLink {
    params: ConnectionParams,
    bench: Arc<SimBench>,
    open: bool,
}

impl SimSwitchLink {
    fn write_switch(&mut self, on: bool) -> Result<(), LinkError> {
        if !self.open {
            return Err(LinkError::Closed);
        }
        let mut state = self.bench.state.lock().unwrap();
        if state.faults.fail_switch {
            return Err(LinkError::Timeout(self.params.timeout_ms));
        }
        state.relay_on = on;
        Ok(())
    }
}

#[async_trait]
impl DeviceLink for SimSwitchLink {
    async fn connect(&mut self) -> Result<(), LinkError> {
        self.bench.accepts(&self.params)?;
        info!(port = %self.params.port, "Simulated relay connected");
        self.open = true;
        Ok(())
    }

    async fn close(&mut self) {
        if self.open {
            info!(port = %self.params.port, "Simulated relay closed");
        } else {
            warn!(port = %self.params.port, "Close on an already-closed link");
        }
        self.open = false;
    }

    fn is_open(&self) -> bool {
        self.open
    }

    fn params(&self) -> &ConnectionParams {
        &self.params
    }
}

#[async_trait]
impl SwitchLink for SimSwitchLink {
    async fn switch_on(&mut self) -> Result<(), LinkError> {
        self.write_switch(true)
    }

    async fn switch_off(&mut self) -> Result<(), LinkError> {
        self.write_switch(false)
    }
}

/// Produces links against one simulated bench.
pub struct SimLinkFactory {
    bench: Arc<SimBench>,
}

impl SimLinkFactory {
    pub fn new(bench: Arc<SimBench>) -> Self {
        Self { bench }
    }
}

impl FlowLinkFactory for SimLinkFactory {
    fn flow_link(&self, params: ConnectionParams) -> Box<dyn FlowLink> {
        Box::new(SimFlowLink {
            params,
            bench: self.bench.clone(),
            open: false,
        })
    }
}

impl SwitchLinkFactory for SimLinkFactory {
    fn switch_link(&self, params: ConnectionParams) -> Box<dyn SwitchLink> {
        Box::new(SimSwitchLink {
            params,
            bench: self.bench.clone(),
            open: false,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(slave_id: u8) -> ConnectionParams {
        ConnectionParams::new("/dev/ttyUSB0", 38400, slave_id, 50)
    }

    #[tokio::test]
    async fn test_wrong_slave_id_behaves_like_silence() {
        let bench = SimBench::new(1);
        let factory = SimLinkFactory::new(bench);

        let mut link = factory.flow_link(params(2));
        assert_eq!(link.connect().await, Err(LinkError::Timeout(50)));
        assert!(!link.is_open());
    }

    #[tokio::test]
    async fn test_commands_on_closed_link_are_errors() {
        let bench = SimBench::new(1);
        let factory = SimLinkFactory::new(bench);

        let mut link = factory.flow_link(params(1));
        assert_eq!(link.set_flow(1.0).await, Err(LinkError::Closed));
        assert_eq!(link.get_flow().await, Err(LinkError::Closed));
        assert_eq!(link.set_gas(7).await, Err(LinkError::Closed));
    }

    #[tokio::test]
    async fn test_bench_state_follows_commands() {
        let bench = SimBench::new(1);
        let factory = SimLinkFactory::new(bench.clone());

        let mut link = factory.flow_link(params(1));
        link.connect().await.unwrap();
        link.set_gas(7).await.unwrap();
        link.set_flow(12.5).await.unwrap();

        assert_eq!(bench.gas_id(), 7);
        assert_eq!(bench.flow_sccm(), 12.5);
        assert_eq!(link.get_flow().await.unwrap(), 12.5);
    }

    #[tokio::test]
    async fn test_fault_flags_force_command_failures() {
        let bench = SimBench::new(6);
        bench.set_faults(SimFaults {
            fail_switch: true,
            ..SimFaults::default()
        });
        let factory = SimLinkFactory::new(bench.clone());

        let mut link = factory.switch_link(ConnectionParams::new("/dev/ttyUSB1", 115200, 6, 10));
        link.connect().await.unwrap();
        assert_eq!(link.switch_on().await, Err(LinkError::Timeout(10)));
        assert!(!bench.relay_on());
    }
}
