//! Hardware access for the flowbench control core.
//!
//! This crate provides:
//! - MODBUS-RTU links for the two device families (`RrgLink`, `RelayLink`)
//! - The normative register map and its scaling math (`registers`)
//! - A simulated bench for tests and demos (`SimBench`)
//! - Config loading and serial port enumeration for embedding applications

pub mod config;
pub mod ports;
pub mod registers;
mod relay;
mod rrg;
mod rtu;
pub mod sim;

pub use config::{BenchConfig, RelayConfig, RrgConfig};
pub use ports::{PortInfo, list_ports};
pub use relay::RelayLink;
pub use rrg::RrgLink;
pub use sim::{SimBench, SimFaults, SimFlowLink, SimLinkFactory, SimSwitchLink};

use flowbench_core::{ConnectionParams, FlowLink, FlowLinkFactory, SwitchLink, SwitchLinkFactory};

/// Production factory handing out MODBUS-RTU links.
///
/// Built once at process start and passed to each controller; every link it
/// produces owns its serial port exclusively.
pub struct RtuLinkFactory;

impl FlowLinkFactory for RtuLinkFactory {
    fn flow_link(&self, params: ConnectionParams) -> Box<dyn FlowLink> {
        Box::new(RrgLink::new(params))
    }
}

impl SwitchLinkFactory for RtuLinkFactory {
    fn switch_link(&self, params: ConnectionParams) -> Box<dyn SwitchLink> {
        Box::new(RelayLink::new(params))
    }
}
