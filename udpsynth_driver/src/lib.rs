//! Batch conversion of primitive libraries.
//!
//! This crate finds the primitive definitions in Verilog sources, converts
//! them (in parallel when configured), splices the generated modules back
//! into the text and records the outcome of every primitive.

pub mod driver;
pub mod key;
pub mod library;
pub mod report;

pub use driver::{Driver, DriverError, LibraryOutcome};
pub use key::ConversionKey;
pub use library::{PrimitiveBlock, scan_library};
pub use report::{ConversionRecord, Status, write_report, write_report_to};
