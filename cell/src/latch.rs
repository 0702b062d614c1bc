use bitvec::slice::BitSlice;

use crate::fields::ConfigFields;

/// The latch bank holding one cell's committed configuration.
///
/// Fields hold their last committed value indefinitely, including while the
/// chain content is in flux during shift operation, and are readable at all
/// times. A cell starts out at its declared defaults.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct ConfigLatch {
    fields: ConfigFields,
    defaults: ConfigFields,
}

impl ConfigLatch {
    pub fn new(defaults: ConfigFields) -> Self {
        Self {
            fields: defaults,
            defaults,
        }
    }

    /// Overwrites every field from the given chain image. On a transition
    /// where a commit coincides with a chain advance the caller must pass a
    /// snapshot taken before the advance.
    pub fn commit(&mut self, chain: &BitSlice) {
        self.fields = ConfigFields::decode(chain);
    }

    /// Restores every field to its declared default.
    pub fn reset_to_defaults(&mut self) {
        self.fields = self.defaults;
    }

    pub fn fields(&self) -> &ConfigFields {
        &self.fields
    }

    pub fn defaults(&self) -> &ConfigFields {
        &self.defaults
    }
}

#[cfg(test)]
mod tests {
    use crate::fields::{CONFIG_BITS, DriveMode, MGMT_ENABLE_BIT, TRIP_SELECT_BIT};

    use super::*;

    #[test]
    fn starts_at_defaults() {
        let defaults = ConfigFields {
            trip_select: true,
            ..ConfigFields::default()
        };
        let latch = ConfigLatch::new(defaults);
        assert_eq!(*latch.fields(), defaults);
    }

    #[test]
    fn commit_overwrites_wholesale() {
        let mut latch = ConfigLatch::new(ConfigFields::default());
        let mut image = ConfigFields::default().encode(CONFIG_BITS);
        image.set(MGMT_ENABLE_BIT, false);
        image.set(TRIP_SELECT_BIT, true);
        latch.commit(&image);
        assert!(!latch.fields().mgmt_enable);
        assert!(latch.fields().trip_select);
        assert_eq!(latch.fields().drive_mode, DriveMode::INPUT_ONLY);
    }

    #[test]
    fn reset_restores_declared_defaults() {
        let defaults = ConfigFields {
            slow_slew: true,
            ..ConfigFields::default()
        };
        let mut latch = ConfigLatch::new(defaults);
        let image = ConfigFields {
            mgmt_enable: false,
            holdover: true,
            ..ConfigFields::default()
        }
        .encode(CONFIG_BITS);
        latch.commit(&image);
        latch.reset_to_defaults();
        assert_eq!(*latch.fields(), defaults);
    }
}
