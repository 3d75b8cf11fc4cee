//! Common types shared across the udpsynth workspace.
//!
//! This crate provides the table-primitive data model (logic values, table
//! symbols, rows and primitive definitions), the structured conversion errors,
//! and the configuration consumed by the synthesis and emission stages.

mod config;
mod error;
mod logic;
mod primitive;
mod symbol;

pub use crate::config::*;
pub use crate::error::*;
pub use crate::logic::*;
pub use crate::primitive::*;
pub use crate::symbol::*;
