use serde::{Deserialize, Serialize};

/// One of the three mutually exclusive control phases encoded on the two
/// control lines shared by every cell in the chain.
///
/// The encoding spends no dedicated load strobe: `reset_active` low means
/// the chain is shifting (the clock value is irrelevant at that level, the
/// shift itself happens on the clock's rising transition), and `reset_active`
/// high selects between commit (clock high) and reset-to-defaults (clock
/// low). The phase is a pure function of the instantaneous line levels;
/// [`crate::cell::PadCell`] derives the edge events from phase transitions.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum ControlPhase {
    Shift,
    CommitLoad,
    ResetDefaults,
}

impl ControlPhase {
    /// Decodes the instantaneous control line levels.
    pub fn decode(reset_active: bool, clock: bool) -> Self {
        match (reset_active, clock) {
            (false, _) => ControlPhase::Shift,
            (true, true) => ControlPhase::CommitLoad,
            (true, false) => ControlPhase::ResetDefaults,
        }
    }
}

impl std::fmt::Display for ControlPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ControlPhase::Shift => write!(f, "SHIFT"),
            ControlPhase::CommitLoad => write!(f, "COMMIT_LOAD"),
            ControlPhase::ResetDefaults => write!(f, "RESET_DEFAULTS"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_truth_table() {
        assert_eq!(ControlPhase::decode(false, false), ControlPhase::Shift);
        assert_eq!(ControlPhase::decode(false, true), ControlPhase::Shift);
        assert_eq!(
            ControlPhase::decode(true, false),
            ControlPhase::ResetDefaults
        );
        assert_eq!(ControlPhase::decode(true, true), ControlPhase::CommitLoad);
    }

    #[test]
    fn exactly_one_phase_per_level_pair() {
        for reset_active in [false, true] {
            for clock in [false, true] {
                let phase = ControlPhase::decode(reset_active, clock);
                let matches = [
                    ControlPhase::Shift,
                    ControlPhase::CommitLoad,
                    ControlPhase::ResetDefaults,
                ]
                .into_iter()
                .filter(|&p| p == phase)
                .count();
                assert_eq!(matches, 1);
            }
        }
    }
}
