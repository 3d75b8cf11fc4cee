//! Executable semantics for table primitives and generated modules.
//!
//! [`reference`] answers "what does the table say" for one event, and
//! [`kernel`] runs a generated [`udpsynth_core::ModuleDesc`] under
//! event-driven delta-cycle scheduling. Tests compare the two.

pub mod kernel;
pub mod reference;

pub use kernel::{Pass, SimError, Simulator, evaluate_combinational};
pub use reference::{Step, lookup_combinational, step_sequential};
