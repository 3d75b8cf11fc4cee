//! Table-primitive to behavioral Verilog conversion.
//!
//! The pipeline is [`parse_primitive`] → [`reduce`] → [`synthesize`] →
//! [`compose`] for sequential tables, or [`compile_combinational`] for
//! combinational ones, followed by [`emit`]. [`compile`] and [`convert`] run
//! the whole chain for one primitive.

pub mod comb;
pub mod compose;
pub mod emit;
pub mod ir;
pub mod names;
pub mod parser;
pub mod reduce;
pub mod synth;

pub use comb::{compile_combinational, validate_combinational};
pub use compose::compose;
pub use emit::{VerilogModule, emit};
pub use ir::*;
pub use parser::parse_primitive;
pub use reduce::{classify, level_feedback, reduce};
pub use synth::{Column, ColumnMatch, DetectorSpec, OutputValue, Trigger, synthesize};

use tracing::{info, warn};
use udpsynth_common::{Config, PrimitiveDef, PrimitiveKind, Result, TableWarning};

/// The result of converting one primitive.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Conversion {
    /// Structured form of the generated module.
    pub module: ModuleDesc,
    /// Rendered module text.
    pub text: String,
    /// Non-fatal findings about the table.
    pub warnings: Vec<TableWarning>,
    /// Combinational or sequential.
    pub kind: PrimitiveKind,
    /// Rows the generated module implements.
    pub retained_rows: usize,
}

impl Conversion {
    /// Name of the converted primitive.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.module.name
    }
}

/// Builds the module description for a parsed primitive.
///
/// Returns the description, the number of rows it implements and any
/// warnings about the table.
///
/// # Errors
///
/// Returns [`udpsynth_common::ConvertError::AmbiguousTable`] when a
/// sequential table's rows conflict.
pub fn compile(
    def: &PrimitiveDef,
    config: &Config,
) -> Result<(ModuleDesc, usize, Vec<TableWarning>)> {
    let (body, retained, warnings) = match classify(def) {
        PrimitiveKind::Combinational => (
            ModuleBody::Combinational(compile_combinational(def)),
            def.rows().len(),
            validate_combinational(def, &config.synth),
        ),
        PrimitiveKind::Sequential => {
            let reduced = reduce(def, &config.synth)?;
            let specs = synthesize(&reduced);
            (
                ModuleBody::Sequential(compose(&reduced, &specs)),
                reduced.rows().len(),
                level_feedback(&reduced),
            )
        }
    };
    for warning in &warnings {
        warn!("{}: {}", def.name(), warning);
    }
    let module = ModuleDesc {
        name: def.name().to_string(),
        ports: def.ports().to_vec(),
        source_rows: def.rows().len(),
        body,
    };
    Ok((module, retained, warnings))
}

/// Parses, compiles and renders one primitive definition.
///
/// # Errors
///
/// Returns the first parse or ambiguity error.
pub fn convert(text: &str, config: &Config) -> Result<Conversion> {
    let def = parse_primitive(text)?;
    let kind = def.kind();
    let (module, retained_rows, warnings) = compile(&def, config)?;
    let text = emit(&module, &config.emit);
    info!(
        "converted {} primitive `{}` ({} of {} rows)",
        kind,
        def.name(),
        retained_rows,
        def.rows().len()
    );
    Ok(Conversion {
        module,
        text,
        warnings,
        kind,
        retained_rows,
    })
}
