//! Control core for the gas-line bench - pure logic with no I/O dependencies
//!
//! This crate contains:
//! - Link traits (`DeviceLink`, `FlowLink`, `SwitchLink`) and their factories
//! - Value objects (`ConnectionParams`, `SessionState`)
//! - The shared connection lifecycle (`Session`)
//! - The two device controllers (`RrgController`, `RelayController`) and
//!   their closed error taxonomies
//!
//! Principles:
//! - No dependency on serial or MODBUS crates; the link traits are the seam
//! - Every failure a controller can report is a named variant, never a panic
//! - Testable in isolation with substitute links

pub mod controller;
pub mod error;
pub mod link;
pub mod params;
pub mod session;

// Re-export commonly used types
pub use controller::{RelayController, RrgController};
pub use error::{LinkError, RelayError, RrgError};
pub use link::{DeviceLink, FlowLink, FlowLinkFactory, SwitchLink, SwitchLinkFactory};
pub use params::ConnectionParams;
pub use session::SessionState;
