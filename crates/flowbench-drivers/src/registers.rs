//! Register map of the bench devices.
//!
//! Addresses and scaling come from the vendor protocol of the RRG-series
//! regulator and the relay block. They are normative and shared by the RTU
//! links and the simulator.

/// Holding register for the high word of the flow setpoint.
pub const RRG_SETPOINT_HI: u16 = 2053;
/// Holding register for the low word of the flow setpoint.
pub const RRG_SETPOINT_LO: u16 = 2054;
/// First of the two holding registers carrying the measured flow.
pub const RRG_FLOW: u16 = 2103;
/// Holding register selecting the gas calibration table.
pub const RRG_GAS: u16 = 2100;
/// Holding register driving the relay contact (1 = closed, 0 = open).
pub const RELAY_SWITCH: u16 = 512;

/// Scale a setpoint in SCCM into the (high, low) register pair.
///
/// The device expects the value multiplied by 1000, truncated to an integer
/// and split into two 16-bit words, written high word first.
pub fn encode_setpoint(sccm: f64) -> (u16, u16) {
    let raw = (sccm * 1000.0) as u32;
    (((raw >> 16) & 0xFFFF) as u16, (raw & 0xFFFF) as u16)
}

/// Decode the measured flow from the register pair at [`RRG_FLOW`].
pub fn decode_flow(hi: u16, lo: u16) -> f64 {
    (((hi as u32) << 16) | lo as u32) as f64 / 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_setpoint_fits_low_word() {
        assert_eq!(encode_setpoint(12.5), (0, 12500));
    }

    #[test]
    fn test_setpoint_spills_into_high_word() {
        assert_eq!(encode_setpoint(70.0), (1, 4464));
    }

    #[test]
    fn test_zero_setpoint() {
        assert_eq!(encode_setpoint(0.0), (0, 0));
    }

    #[test]
    fn test_sub_milli_sccm_precision_is_truncated() {
        assert_eq!(encode_setpoint(0.0009), (0, 0));
    }

    #[test]
    fn test_flow_decodes_register_pair() {
        assert_eq!(decode_flow(0, 12500), 12.5);
        assert_eq!(decode_flow(1, 4464), 70.0);
    }

    #[test]
    fn test_setpoint_survives_the_register_trip() {
        let (hi, lo) = encode_setpoint(96.0);
        assert_eq!(decode_flow(hi, lo), 96.0);
    }
}
