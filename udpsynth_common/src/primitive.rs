//! Parsed primitive definitions.

use std::fmt;

use contracts::*;
use serde::{Deserialize, Serialize};

use crate::error::SourceLocation;
use crate::logic::Logic;
use crate::symbol::Symbol;

/// Direction of a primitive port.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PortDirection {
    /// Driven from outside the primitive.
    Input,
    /// Driven by the primitive.
    Output,
}

impl PortDirection {
    /// Verilog declaration keyword.
    #[must_use]
    pub const fn keyword(self) -> &'static str {
        match self {
            Self::Input => "input",
            Self::Output => "output",
        }
    }
}

impl fmt::Display for PortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.keyword())
    }
}

/// A named port and its direction.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PortDecl {
    /// Port identifier.
    pub name: String,
    /// Port direction.
    pub direction: PortDirection,
}

impl PortDecl {
    /// Creates an input port.
    pub fn input(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            direction: PortDirection::Input,
        }
    }

    /// Creates an output port.
    pub fn output(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            direction: PortDirection::Output,
        }
    }
}

/// Whether a table has a state column.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PrimitiveKind {
    /// Output is a function of the inputs only.
    Combinational,
    /// Output is retained state updated by level or edge rows.
    Sequential,
}

impl PrimitiveKind {
    /// Classifies a table by the presence of a state column.
    #[must_use]
    pub const fn from_state_column(has_state: bool) -> Self {
        if has_state {
            Self::Sequential
        } else {
            Self::Combinational
        }
    }

    /// Returns true for sequential tables.
    #[must_use]
    pub const fn is_sequential(self) -> bool {
        matches!(self, Self::Sequential)
    }
}

impl fmt::Display for PrimitiveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Combinational => write!(f, "combinational"),
            Self::Sequential => write!(f, "sequential"),
        }
    }
}

/// One table row.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Row {
    /// Position in the source table. Stable across reduction, used as the
    /// detector id and as the tie-break order.
    pub index: usize,
    /// One symbol per input port, in port order.
    pub inputs: Vec<Symbol>,
    /// Current-state symbol; present exactly for sequential tables.
    pub state: Option<Symbol>,
    /// Output or next-state symbol.
    pub output: Symbol,
    /// Where the row starts in the source text.
    pub location: SourceLocation,
}

impl Row {
    /// The input column holding the row's edge symbol, if any.
    #[must_use]
    pub fn edge_column(&self) -> Option<usize> {
        self.inputs.iter().position(|s| s.is_edge())
    }

    /// Returns true if the row's next state always equals its current state:
    /// either `-`, or a concrete value equal to the state symbol.
    #[must_use]
    pub fn is_state_preserving(&self) -> bool {
        match (self.state, self.output) {
            (Some(_), Symbol::NoChange) => true,
            (Some(state), out @ (Symbol::Zero | Symbol::One | Symbol::Unknown)) => state == out,
            _ => false,
        }
    }

    /// Number of table columns in the row.
    #[must_use]
    pub fn column_count(&self) -> usize {
        self.inputs.len() + usize::from(self.state.is_some()) + 1
    }
}

impl fmt::Display for Row {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, symbol) in self.inputs.iter().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            write!(f, "{symbol}")?;
        }
        if let Some(state) = self.state {
            write!(f, " : {state}")?;
        }
        write!(f, " : {}", self.output)
    }
}

/// A parsed table primitive. Immutable once built; later stages derive new
/// definitions rather than editing one.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct PrimitiveDef {
    name: String,
    ports: Vec<PortDecl>,
    kind: PrimitiveKind,
    initial: Option<Logic>,
    rows: Vec<Row>,
}

impl PrimitiveDef {
    /// Creates a definition. The output port must come first, followed by
    /// at least one input, and every row must have one symbol per input.
    #[debug_requires(ports.first().is_some_and(|p| p.direction == PortDirection::Output))]
    #[debug_requires(ports.len() >= 2)]
    #[debug_requires(ports.iter().skip(1).all(|p| p.direction == PortDirection::Input))]
    #[debug_requires(rows.iter().all(|r| r.inputs.len() == ports.len() - 1))]
    #[debug_requires(rows.iter().all(|r| r.state.is_some() == kind.is_sequential()))]
    pub fn new(
        name: impl Into<String>,
        ports: Vec<PortDecl>,
        kind: PrimitiveKind,
        initial: Option<Logic>,
        rows: Vec<Row>,
    ) -> Self {
        Self {
            name: name.into(),
            ports,
            kind,
            initial,
            rows,
        }
    }

    /// Primitive name; also the name of the generated module.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// All ports in declaration order, output first.
    #[must_use]
    pub fn ports(&self) -> &[PortDecl] {
        &self.ports
    }

    /// The single output port.
    #[must_use]
    pub fn output(&self) -> &PortDecl {
        &self.ports[0]
    }

    /// Input ports in column order.
    #[must_use]
    pub fn inputs(&self) -> &[PortDecl] {
        &self.ports[1..]
    }

    /// Name of the input in table column `column`.
    #[must_use]
    pub fn input_name(&self, column: usize) -> &str {
        &self.ports[column + 1].name
    }

    /// Combinational or sequential.
    #[must_use]
    pub const fn kind(&self) -> PrimitiveKind {
        self.kind
    }

    /// Power-up value of the state, if the source declared one.
    #[must_use]
    pub const fn initial(&self) -> Option<Logic> {
        self.initial
    }

    /// Table rows in source order.
    #[must_use]
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    /// Looks up a row by its source index.
    #[must_use]
    pub fn row(&self, index: usize) -> Option<&Row> {
        self.rows.iter().find(|r| r.index == index)
    }

    /// A copy of this definition holding only `rows`.
    #[must_use]
    pub fn with_rows(&self, rows: Vec<Row>) -> Self {
        Self {
            rows,
            ..self.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(inputs: &[Symbol], state: Option<Symbol>, output: Symbol) -> Row {
        Row {
            index: 0,
            inputs: inputs.to_vec(),
            state,
            output,
            location: SourceLocation::default(),
        }
    }

    #[test]
    fn test_state_preserving_rows() {
        use Symbol::*;
        assert!(row(&[One], Some(DontCare), NoChange).is_state_preserving());
        assert!(row(&[One], Some(Zero), Zero).is_state_preserving());
        assert!(row(&[One], Some(Unknown), Unknown).is_state_preserving());
        assert!(!row(&[One], Some(DontCare), Zero).is_state_preserving());
        assert!(!row(&[One], Some(Binary), One).is_state_preserving());
        assert!(!row(&[One], None, One).is_state_preserving());
    }

    #[test]
    fn test_row_display() {
        use Symbol::*;
        let r = row(&[Zero, FallingEdge], Some(DontCare), Zero);
        assert_eq!(r.to_string(), "0 f : ? : 0");
        assert_eq!(r.edge_column(), Some(1));
        assert_eq!(r.column_count(), 4);
    }
}
