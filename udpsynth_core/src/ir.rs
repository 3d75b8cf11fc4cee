//! Module description: the structured form of a generated behavioral module.
//!
//! Every semantic decision (names, guards, branch order, sensitivity) is made
//! while building these values. The emitter only renders them and the
//! simulator only interprets them.

use udpsynth_common::{LevelSet, Logic, Polarity, PortDecl, TransitionSet};

/// A generated module that replaces one primitive.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ModuleDesc {
    /// Module name; the primitive's name.
    pub name: String,
    /// Ports in the primitive's header order, output first.
    pub ports: Vec<PortDecl>,
    /// The row count of the source table, for the header comment.
    pub source_rows: usize,
    /// Body of the module.
    pub body: ModuleBody,
}

impl ModuleDesc {
    /// The output port name.
    #[must_use]
    pub fn output(&self) -> &str {
        self.ports.first().map_or("", |p| p.name.as_str())
    }

    /// Input port names in column order.
    pub fn inputs(&self) -> impl Iterator<Item = &str> {
        self.ports.iter().skip(1).map(|p| p.name.as_str())
    }

    /// Number of statements that assign the output port.
    #[must_use]
    pub fn output_write_sites(&self) -> usize {
        match &self.body {
            ModuleBody::Combinational(comb) => comb.branches.len() + 1,
            ModuleBody::Sequential(seq) => seq.output.branches.len(),
        }
    }
}

/// The two shapes a generated module takes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ModuleBody {
    /// A single priority chain over the inputs.
    Combinational(CombProcedure),
    /// Detectors feeding one output procedure.
    Sequential(SeqBody),
}

/// One signal compared against the values a table symbol accepts.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct SignalTest {
    /// Signal being tested.
    pub signal: String,
    /// Values that satisfy the test. Never empty and never every value.
    pub values: LevelSet,
}

impl SignalTest {
    /// Creates a test.
    pub fn new(signal: impl Into<String>, values: LevelSet) -> Self {
        Self {
            signal: signal.into(),
            values,
        }
    }

    /// Returns true if `value` satisfies the test.
    #[must_use]
    pub const fn accepts(&self, value: Logic) -> bool {
        self.values.contains(value)
    }
}

/// A conjunction of signal tests. Empty means always true.
pub type Guard = Vec<SignalTest>;

// ---------------------------------------------------------------------------
// Combinational
// ---------------------------------------------------------------------------

/// `always @(inputs)` with an `if / else if` chain.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CombProcedure {
    /// Output port.
    pub output: String,
    /// Every input port.
    pub sensitivity: Vec<String>,
    /// Branches in row order; the first matching one wins.
    pub branches: Vec<CombBranch>,
    /// Value driven when no branch matches.
    pub default: Logic,
}

/// One row of a combinational table.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CombBranch {
    /// Source row index.
    pub row: usize,
    /// Source row text, for comments.
    pub source: String,
    /// Input tests.
    pub guard: Guard,
    /// Value driven when the guard holds.
    pub value: Logic,
}

// ---------------------------------------------------------------------------
// Sequential
// ---------------------------------------------------------------------------

/// Registers, detector blocks and the output procedure of a sequential module.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SeqBody {
    /// Power-up value of the output, if the primitive declared one. It is
    /// rendered as the output's declaration initializer.
    pub initial: Option<Logic>,
    /// Previous-value registers, one per edge input that needs one.
    pub histories: Vec<HistoryReg>,
    /// One block per edge detector, in detector order.
    pub edge_detectors: Vec<EdgeDetector>,
    /// The single procedure writing the output.
    pub output: OutputProcedure,
}

impl SeqBody {
    /// Looks up an edge detector by its register name.
    #[must_use]
    pub fn edge_detector(&self, name: &str) -> Option<&EdgeDetector> {
        self.edge_detectors.iter().find(|d| d.name == name)
    }
}

/// `always @(input) reg <= input;`
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HistoryReg {
    /// Input being tracked.
    pub input: String,
    /// Register holding the input's previous value.
    pub reg: String,
}

/// `always @(posedge|negedge input)` block that sets a one-shot register.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EdgeDetector {
    /// Detector register.
    pub name: String,
    /// Source row index.
    pub row: usize,
    /// Source row text, for comments.
    pub source: String,
    /// Input whose change is observed.
    pub input: String,
    /// Event control keyword.
    pub polarity: Polarity,
    /// Accepted changes; a subset of `polarity`'s changes.
    pub transitions: TransitionSet,
    /// History register to consult when `transitions` is not the whole
    /// polarity.
    pub history: Option<String>,
    /// Tests on the other inputs at the instant of the change.
    pub guard: Guard,
}

/// A level detector evaluated inside the output procedure.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LevelDetector {
    /// Detector register.
    pub name: String,
    /// Source row index.
    pub row: usize,
    /// Source row text, for comments.
    pub source: String,
    /// Input tests.
    pub guard: Guard,
}

/// One entry of an output procedure's sensitivity list.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Sensitivity {
    /// Any change of the signal.
    Any(String),
    /// A `posedge`/`negedge` of the signal.
    Edge(Polarity, String),
}

/// The procedure that owns the output port.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OutputProcedure {
    /// Output port.
    pub output: String,
    /// Every input, then `posedge` of every edge detector.
    pub sensitivity: Vec<Sensitivity>,
    /// Register holding the output value at procedure entry.
    pub snapshot: String,
    /// Level detectors, assigned before any branch runs.
    pub level_detectors: Vec<LevelDetector>,
    /// Branches in row order, rising before falling.
    pub branches: Vec<OutputBranch>,
}

/// What a branch assigns to the output.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BranchValue {
    /// A constant.
    Drive(Logic),
    /// The value the output has so far in this pass, so a hold never undoes
    /// an earlier branch.
    Hold,
}

/// Which detector a branch reads.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BranchKind {
    /// A level detector; nothing to clear.
    Level,
    /// An edge detector, cleared after it is consumed.
    Edge,
}

/// `if (detector && state guard) output = value;`
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OutputBranch {
    /// Source row index.
    pub row: usize,
    /// Detector register read by the branch.
    pub detector: String,
    /// Level or edge.
    pub kind: BranchKind,
    /// Accepted snapshot values, when the row restricts the state.
    pub state_guard: Option<LevelSet>,
    /// Assigned value.
    pub value: BranchValue,
}

impl OutputBranch {
    /// Returns true if the snapshot value satisfies the state guard.
    #[must_use]
    pub fn accepts_state(&self, state: Logic) -> bool {
        self.state_guard.is_none_or(|set| set.contains(state))
    }
}
