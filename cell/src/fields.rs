use std::io;
use std::io::Write;

use bitvec::slice::BitSlice;
use bitvec::vec::BitVec;
use jzon::JsonValue;
use serde::{Deserialize, Deserializer, Serialize};

// Chain bit offsets of the latched fields. Bit 0 is the least significant
// chain bit, the one most recently shifted in. Widening the chain beyond
// CONFIG_BITS leaves the extra upper bits as pass-through padding.
pub const MGMT_ENABLE_BIT: usize = 0;
pub const OUTPUT_ENABLE_B_BIT: usize = 1;
pub const HOLDOVER_BIT: usize = 2;
pub const INPUT_DISABLE_BIT: usize = 3;
pub const MODE_SELECT_BIT: usize = 4;
pub const ANALOG_ENABLE_BIT: usize = 5;
pub const ANALOG_SELECT_BIT: usize = 6;
pub const ANALOG_POLARITY_BIT: usize = 7;
pub const SLOW_SLEW_BIT: usize = 8;
pub const TRIP_SELECT_BIT: usize = 9;
/// Least significant of the three drive mode bits; offset 12 is the field's
/// most significant bit.
pub const DRIVE_MODE_BIT0: usize = 10;
/// Total bits occupied by the declared field layout.
pub const CONFIG_BITS: usize = 13;

/// The 3-bit pad driver mode code.
///
/// The code is forwarded to the pad electronics as-is; the cell attaches no
/// meaning to it beyond the all-zero input-only encoding used as the
/// power-on default.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize)]
pub struct DriveMode(u8);

impl DriveMode {
    /// The input-only encoding: the pad's output stage is disabled.
    pub const INPUT_ONLY: DriveMode = DriveMode(0);

    /// Constructs a drive mode from a raw code, masked to 3 bits.
    pub fn new(code: u8) -> Self {
        DriveMode(code & 7)
    }

    pub fn code(self) -> u8 {
        self.0
    }
}

impl Default for DriveMode {
    fn default() -> Self {
        DriveMode::INPUT_ONLY
    }
}

impl std::fmt::Display for DriveMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:03b}", self.0)
    }
}

impl<'de> Deserialize<'de> for DriveMode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        u8::deserialize(deserializer).map(DriveMode::new)
    }
}

/// One cell's latched configuration fields.
///
/// Every field is backed by a latch in [`crate::latch::ConfigLatch`] and is
/// never read live from the shift chain. `mgmt_enable` feeds the pad
/// arbiter; `output_enable_b` is latched and readable but takes no part in
/// arbitration; the rest are forwarded to the pad electronics
/// unconditionally.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfigFields {
    pub mgmt_enable: bool,
    pub output_enable_b: bool,
    pub holdover: bool,
    pub input_disable: bool,
    pub mode_select: bool,
    pub analog_enable: bool,
    pub analog_select: bool,
    pub analog_polarity: bool,
    pub slow_slew: bool,
    pub trip_select: bool,
    pub drive_mode: DriveMode,
}

impl Default for ConfigFields {
    /// The power-on field values: the management controller owns the pad
    /// and the driver is input-only. Applied on every reset-to-defaults
    /// edge unless overridden at instantiation.
    fn default() -> Self {
        ConfigFields {
            mgmt_enable: true,
            output_enable_b: false,
            holdover: false,
            input_disable: false,
            mode_select: false,
            analog_enable: false,
            analog_select: false,
            analog_polarity: false,
            slow_slew: false,
            trip_select: false,
            drive_mode: DriveMode::INPUT_ONLY,
        }
    }
}

impl ConfigFields {
    /// Decodes the field values from a chain image. Offsets above the
    /// declared layout are ignored.
    pub fn decode(bits: &BitSlice) -> Self {
        ConfigFields {
            mgmt_enable: bits[MGMT_ENABLE_BIT],
            output_enable_b: bits[OUTPUT_ENABLE_B_BIT],
            holdover: bits[HOLDOVER_BIT],
            input_disable: bits[INPUT_DISABLE_BIT],
            mode_select: bits[MODE_SELECT_BIT],
            analog_enable: bits[ANALOG_ENABLE_BIT],
            analog_select: bits[ANALOG_SELECT_BIT],
            analog_polarity: bits[ANALOG_POLARITY_BIT],
            slow_slew: bits[SLOW_SLEW_BIT],
            trip_select: bits[TRIP_SELECT_BIT],
            drive_mode: DriveMode::new(
                u8::from(bits[DRIVE_MODE_BIT0])
                    | u8::from(bits[DRIVE_MODE_BIT0 + 1]) << 1
                    | u8::from(bits[DRIVE_MODE_BIT0 + 2]) << 2,
            ),
        }
    }

    /// Encodes the chain image that would commit to these field values;
    /// bits above the declared layout are zero padding. This is the
    /// controller-side view, used to position data in the chain.
    ///
    /// Panics if `width` does not cover the declared layout.
    pub fn encode(&self, width: usize) -> BitVec {
        assert!(width >= CONFIG_BITS);
        let mut bits = BitVec::repeat(false, width);
        bits.set(MGMT_ENABLE_BIT, self.mgmt_enable);
        bits.set(OUTPUT_ENABLE_B_BIT, self.output_enable_b);
        bits.set(HOLDOVER_BIT, self.holdover);
        bits.set(INPUT_DISABLE_BIT, self.input_disable);
        bits.set(MODE_SELECT_BIT, self.mode_select);
        bits.set(ANALOG_ENABLE_BIT, self.analog_enable);
        bits.set(ANALOG_SELECT_BIT, self.analog_select);
        bits.set(ANALOG_POLARITY_BIT, self.analog_polarity);
        bits.set(SLOW_SLEW_BIT, self.slow_slew);
        bits.set(TRIP_SELECT_BIT, self.trip_select);
        bits.set(DRIVE_MODE_BIT0, self.drive_mode.code() & 1 != 0);
        bits.set(DRIVE_MODE_BIT0 + 1, self.drive_mode.code() & 2 != 0);
        bits.set(DRIVE_MODE_BIT0 + 2, self.drive_mode.code() & 4 != 0);
        bits
    }

    /// Dumps a human-readable listing of the field values to the given
    /// `writer` object.
    pub fn dump(&self, writer: &mut dyn Write) -> Result<(), io::Error> {
        writeln!(
            writer,
            "pad owner: {}",
            if self.mgmt_enable {
                "management controller"
            } else {
                "user logic"
            }
        )?;
        writeln!(
            writer,
            "output enable (active low): {}",
            u32::from(self.output_enable_b)
        )?;
        writeln!(
            writer,
            "holdover: {}",
            if self.holdover { "yes" } else { "no" }
        )?;
        writeln!(
            writer,
            "input buffer: {}",
            if self.input_disable {
                "disabled"
            } else {
                "enabled"
            }
        )?;
        writeln!(writer, "mode select: {}", u32::from(self.mode_select))?;
        writeln!(
            writer,
            "analog path: {}",
            if self.analog_enable {
                "enabled"
            } else {
                "disabled"
            }
        )?;
        writeln!(writer, "analog select: {}", u32::from(self.analog_select))?;
        writeln!(
            writer,
            "analog polarity: {}",
            u32::from(self.analog_polarity)
        )?;
        writeln!(
            writer,
            "slew rate: {}",
            if self.slow_slew { "slow" } else { "fast" }
        )?;
        writeln!(writer, "trip select: {}", u32::from(self.trip_select))?;
        writeln!(writer, "drive mode: {}", self.drive_mode)?;
        Ok(())
    }

    pub fn to_json(&self) -> JsonValue {
        jzon::object! {
            mgmt_enable: self.mgmt_enable,
            output_enable_b: self.output_enable_b,
            holdover: self.holdover,
            input_disable: self.input_disable,
            mode_select: self.mode_select,
            analog_enable: self.analog_enable,
            analog_select: self.analog_select,
            analog_polarity: self.analog_polarity,
            slow_slew: self.slow_slew,
            trip_select: self.trip_select,
            drive_mode: self.drive_mode.code(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_reads_declared_offsets() {
        let mut bits = BitVec::repeat(false, CONFIG_BITS);
        bits.set(MGMT_ENABLE_BIT, true);
        bits.set(SLOW_SLEW_BIT, true);
        bits.set(DRIVE_MODE_BIT0 + 2, true);
        let fields = ConfigFields::decode(&bits);
        assert!(fields.mgmt_enable);
        assert!(fields.slow_slew);
        assert!(!fields.holdover);
        assert_eq!(fields.drive_mode, DriveMode::new(0b100));
    }

    #[test]
    fn encode_is_the_inverse_of_decode() {
        let fields = ConfigFields {
            mgmt_enable: true,
            output_enable_b: true,
            analog_select: true,
            drive_mode: DriveMode::new(0b101),
            ..ConfigFields::default()
        };
        let bits = fields.encode(CONFIG_BITS);
        assert_eq!(ConfigFields::decode(&bits), fields);
    }

    #[test]
    fn encode_pads_wide_chains_with_zeros() {
        let bits = ConfigFields::default().encode(16);
        assert_eq!(bits.len(), 16);
        assert!(!bits[13] && !bits[14] && !bits[15]);
        assert_eq!(ConfigFields::decode(&bits), ConfigFields::default());
    }

    #[test]
    fn drive_mode_is_masked_to_three_bits() {
        assert_eq!(DriveMode::new(0b1111_1100).code(), 0b100);
        assert_eq!(DriveMode::default(), DriveMode::INPUT_ONLY);
    }

    #[test]
    fn power_on_defaults() {
        let fields = ConfigFields::default();
        assert!(fields.mgmt_enable);
        assert!(!fields.output_enable_b);
        assert_eq!(fields.drive_mode, DriveMode::INPUT_ONLY);
        // every single-bit field other than mgmt_enable defaults to 0
        assert_eq!(fields.encode(CONFIG_BITS).count_ones(), 1);
    }
}
