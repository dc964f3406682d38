mod relay;
mod rrg;

pub use relay::RelayController;
pub use rrg::RrgController;
