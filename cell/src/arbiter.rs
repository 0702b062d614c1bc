use jzon::JsonValue;

/// Levels presented to the arbiter by the two access domains and the pad.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Default)]
pub struct ArbiterInputs {
    pub mgmt_out: bool,
    pub mgmt_oe_b: bool,
    pub user_out: bool,
    pub user_oe_b: bool,
    pub pad_in: bool,
}

/// Levels driven back out to the pad and the two access domains.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct ArbiterOutputs {
    pub pad_out: bool,
    /// Active low, like both domain-side output enables.
    pub pad_oe_b: bool,
    pub mgmt_in: bool,
    pub user_in: bool,
}

/// Routes the pad to whichever domain owns it.
///
/// With `mgmt_enable` set the management controller drives the pad and sees
/// its input; otherwise user logic does. The domain that does not own the
/// pad sees a constant low on its input path, so it never observes a
/// foreign driver's levels as pad data. Total over every input combination;
/// no state, re-evaluated on every signal change.
pub fn arbitrate(mgmt_enable: bool, inputs: ArbiterInputs) -> ArbiterOutputs {
    ArbiterOutputs {
        pad_out: if mgmt_enable {
            inputs.mgmt_out
        } else {
            inputs.user_out
        },
        pad_oe_b: if mgmt_enable {
            inputs.mgmt_oe_b
        } else {
            inputs.user_oe_b
        },
        mgmt_in: if mgmt_enable { inputs.pad_in } else { false },
        user_in: if mgmt_enable { false } else { inputs.pad_in },
    }
}

impl ArbiterOutputs {
    pub fn to_json(&self) -> JsonValue {
        jzon::object! {
            pad_out: self.pad_out,
            pad_oe_b: self.pad_oe_b,
            mgmt_in: self.mgmt_in,
            user_in: self.user_in,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn management_owns_the_pad() {
        for pad_in in [false, true] {
            for user_out in [false, true] {
                let out = arbitrate(
                    true,
                    ArbiterInputs {
                        mgmt_out: true,
                        mgmt_oe_b: false,
                        user_out,
                        user_oe_b: true,
                        pad_in,
                    },
                );
                assert!(out.pad_out);
                assert!(!out.pad_oe_b);
                assert_eq!(out.mgmt_in, pad_in);
                assert!(!out.user_in);
            }
        }
    }

    #[test]
    fn user_owns_the_pad() {
        for pad_in in [false, true] {
            for mgmt_out in [false, true] {
                let out = arbitrate(
                    false,
                    ArbiterInputs {
                        mgmt_out,
                        mgmt_oe_b: false,
                        user_out: true,
                        user_oe_b: true,
                        pad_in,
                    },
                );
                assert!(out.pad_out);
                assert!(out.pad_oe_b);
                assert_eq!(out.user_in, pad_in);
                assert!(!out.mgmt_in);
            }
        }
    }
}
