//! Model of a serially-configured I/O pad cell.
//!
//! Each cell sits between a management controller, a user-logic domain, and
//! one physical pad. Configuration arrives over a bit-serial chain shared
//! by every cell on the periphery: two control lines encode three phases
//! (shift, commit-load, reset-to-defaults), a fixed-width shift register
//! carries the bits, and a latch bank holds the decoded fields between
//! commits. A combinational arbiter routes pad I/O to whichever domain
//! currently owns the pad.
//!
//! The companion controller that drives the control lines, the pad
//! electronics that consume the latched fields, and the composition of many
//! cells into a ring are all external to this crate; the model covers one
//! cell and its boundary signals.

pub mod arbiter;
pub mod cell;
pub mod chain;
pub mod fields;
pub mod latch;
pub mod phase;

pub use arbiter::{ArbiterInputs, ArbiterOutputs, arbitrate};
pub use cell::{CellConfig, ConfigError, PadCell};
pub use chain::{PatternError, ShiftChain, parse_chain_image};
pub use fields::{CONFIG_BITS, ConfigFields, DriveMode};
pub use latch::ConfigLatch;
pub use phase::ControlPhase;
