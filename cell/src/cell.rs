use bitvec::slice::BitSlice;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::arbiter::{ArbiterInputs, ArbiterOutputs, arbitrate};
use crate::chain::ShiftChain;
use crate::fields::{CONFIG_BITS, ConfigFields};
use crate::latch::ConfigLatch;
use crate::phase::ControlPhase;

/// Instantiation-time options, fixed for the life of a cell.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CellConfig {
    /// Chain width in bits. Must cover the declared field layout; extra
    /// upper bits are padding shifted through the cell.
    pub width: usize,
    /// Field values applied on every reset-to-defaults edge.
    pub defaults: ConfigFields,
}

impl Default for CellConfig {
    fn default() -> Self {
        Self {
            width: CONFIG_BITS,
            defaults: ConfigFields::default(),
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    WidthTooSmall { width: usize, min: usize },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::WidthTooSmall { width, min } => {
                write!(f, "chain width {width} does not cover the {min}-bit field layout")
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// One I/O cell: shift chain, latched configuration, and pad arbitration,
/// driven by the two shared control lines.
///
/// The cell is purely reactive. Levels are presented with
/// [`PadCell::set_serial_in`] and [`PadCell::set_control`]; everything the
/// cell does happens inside `set_control` as a reaction to the transition it
/// describes. Each cell owns its chain and latch bank outright; a real
/// deployment instantiates one cell per pad and daisy-chains their serial
/// ports externally.
#[derive(Debug, Clone)]
pub struct PadCell {
    chain: ShiftChain,
    latch: ConfigLatch,
    serial_in: bool,
    reset_active: bool,
    clock: bool,
}

impl PadCell {
    pub fn new(config: CellConfig) -> Result<Self, ConfigError> {
        if config.width < CONFIG_BITS {
            return Err(ConfigError::WidthTooSmall {
                width: config.width,
                min: CONFIG_BITS,
            });
        }
        Ok(Self {
            chain: ShiftChain::new(config.width),
            latch: ConfigLatch::new(config.defaults),
            serial_in: false,
            reset_active: false,
            clock: false,
        })
    }

    /// Presents a level on the serial data input. Sampled by the chain on
    /// qualifying clock edges.
    pub fn set_serial_in(&mut self, bit: bool) {
        self.serial_in = bit;
    }

    /// The serial data output towards the next cell; always the chain's
    /// current most significant bit.
    pub fn serial_out(&self) -> bool {
        self.chain.serial_out()
    }

    /// The phase currently selected by the control line levels.
    pub fn phase(&self) -> ControlPhase {
        ControlPhase::decode(self.reset_active, self.clock)
    }

    /// The latched configuration fields, stable between commit/reset edges
    /// and readable at all times.
    pub fn fields(&self) -> &ConfigFields {
        self.latch.fields()
    }

    pub fn chain_bits(&self) -> &BitSlice {
        self.chain.bits()
    }

    pub fn chain_width(&self) -> usize {
        self.chain.width()
    }

    /// Applies one transition of the two control lines. A single call may
    /// change both lines at once; the cell decodes the transition as a
    /// whole, so a chain advance and a latch commit triggered together both
    /// observe the pre-transition chain content.
    ///
    /// The chain advances on every rising clock transition outside the
    /// reset phase, including the one that enters commit-load. The chain
    /// clears and the latches reload their defaults on every transition
    /// into the reset phase, whether the reset line rose with the clock low
    /// or the clock fell with the reset line held high. The latter is the
    /// protocol hazard a controller must sequence around: lowering the
    /// clock before releasing the reset line wipes a just-committed
    /// configuration, and the cell cannot tell that apart from an intended
    /// repeated reset.
    pub fn set_control(&mut self, reset_active: bool, clock: bool) {
        let prev_phase = self.phase();
        let phase = ControlPhase::decode(reset_active, clock);
        let clock_rising = clock && !self.clock;

        // Sample before mutating: a commit coincident with a shift latches
        // the chain as it was before this transition.
        let snapshot = (phase == ControlPhase::CommitLoad && prev_phase != ControlPhase::CommitLoad)
            .then(|| self.chain.snapshot());

        if clock_rising && phase != ControlPhase::ResetDefaults {
            let evicted = self.chain.advance(self.serial_in);
            trace!(
                "shift: in={} out={}",
                u32::from(self.serial_in),
                u32::from(evicted)
            );
        }
        if let Some(snapshot) = snapshot {
            self.latch.commit(&snapshot);
            debug!("commit: {:?}", self.latch.fields());
        }
        if phase == ControlPhase::ResetDefaults && prev_phase != ControlPhase::ResetDefaults {
            self.chain.clear();
            self.latch.reset_to_defaults();
            debug!("reset to defaults");
        }

        self.reset_active = reset_active;
        self.clock = clock;
    }

    /// Evaluates the pad arbiter against the current latched `mgmt_enable`.
    pub fn arbitrate(&self, inputs: ArbiterInputs) -> ArbiterOutputs {
        arbitrate(self.latch.fields().mgmt_enable, inputs)
    }

    /// One full clock pulse in the shift phase.
    pub fn shift_bit(&mut self, bit: bool) {
        self.set_serial_in(bit);
        self.set_control(false, true);
        self.set_control(false, false);
    }

    /// Shifts a full chain image in (most significant bit first, so the
    /// first bit presented travels to the top of the chain) and commits it.
    ///
    /// The clock is held high through the final shift and the commit is
    /// entered on the reset line alone, then the lines return to the idle
    /// shift phase with the reset line released first. Releasing them in
    /// the other order would take the falling clock into the reset phase
    /// and wipe the configuration that was just committed.
    ///
    /// Panics if the image width does not match the chain.
    pub fn load(&mut self, pattern: &BitSlice) {
        assert_eq!(pattern.len(), self.chain.width());
        self.set_control(false, false);
        for i in (1..pattern.len()).rev() {
            self.shift_bit(pattern[i]);
        }
        self.set_serial_in(pattern[0]);
        self.set_control(false, true);
        self.set_control(true, true);
        self.set_control(false, true);
        self.set_control(false, false);
    }

    /// Pulses the reset line with the clock low, restoring the defaults and
    /// clearing the chain.
    pub fn reset(&mut self) {
        self.set_control(true, false);
        self.set_control(false, false);
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn width_must_cover_the_field_layout() {
        let config = CellConfig {
            width: 8,
            ..CellConfig::default()
        };
        assert_matches!(
            PadCell::new(config),
            Err(ConfigError::WidthTooSmall { width: 8, min: 13 })
        );
        assert!(PadCell::new(CellConfig::default()).is_ok());
    }

    #[test]
    fn starts_idle_in_shift_phase_with_defaults() {
        let cell = PadCell::new(CellConfig::default()).unwrap();
        assert_eq!(cell.phase(), ControlPhase::Shift);
        assert!(cell.chain_bits().not_any());
        assert_eq!(*cell.fields(), ConfigFields::default());
    }

    #[test]
    fn clock_level_alone_does_not_mutate() {
        let mut cell = PadCell::new(CellConfig::default()).unwrap();
        cell.set_serial_in(true);
        cell.set_control(false, true);
        let after_edge = cell.chain.snapshot();
        // holding the level, or repeating it, is not an edge
        cell.set_control(false, true);
        assert_eq!(cell.chain.snapshot(), after_edge);
        cell.set_control(false, false);
        assert_eq!(cell.chain.snapshot(), after_edge);
    }

    #[test]
    fn entering_commit_on_the_reset_line_does_not_shift() {
        let mut cell = PadCell::new(CellConfig::default()).unwrap();
        cell.set_serial_in(true);
        cell.set_control(false, true);
        let after_shift = cell.chain.snapshot();
        cell.set_control(true, true);
        assert_eq!(cell.chain.snapshot(), after_shift);
        assert_eq!(cell.phase(), ControlPhase::CommitLoad);
    }
}
