//! Detector specifications for the rows of a reduced sequential table.

use std::fmt;

use tracing::trace;
use udpsynth_common::{LevelSet, Logic, Polarity, PrimitiveDef, Row, Symbol, TransitionSet};

/// A table column a detector constrains.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Column {
    /// Input column, by position.
    Input(usize),
    /// The current-state column.
    State,
}

/// One constrained column and the values it accepts.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ColumnMatch {
    /// Constrained column.
    pub column: Column,
    /// Accepted values; never every value.
    pub values: LevelSet,
}

/// When a detector fires.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Trigger {
    /// Whenever the matched columns hold their values.
    Level,
    /// On a change of `edge_input` that is one of `transitions`, all of
    /// which have `polarity`.
    Edge {
        /// Input column whose change fires the detector.
        edge_input: usize,
        /// Event control that observes the change.
        polarity: Polarity,
        /// Accepted changes.
        transitions: TransitionSet,
    },
}

/// What a fired detector does to the output.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OutputValue {
    /// Assign a value.
    Value(Logic),
    /// Keep the current state.
    Hold,
}

impl fmt::Display for OutputValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Value(v) => write!(f, "{v}"),
            Self::Hold => write!(f, "-"),
        }
    }
}

/// One detector derived from one table row.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct DetectorSpec {
    /// Index of the source row.
    pub id: usize,
    /// Level or edge trigger.
    pub trigger: Trigger,
    /// Constrained non-edge columns, inputs in column order, then the state.
    pub match_inputs: Vec<ColumnMatch>,
    /// Effect on the output.
    pub output: OutputValue,
}

impl DetectorSpec {
    /// Returns true for edge-triggered detectors.
    #[must_use]
    pub const fn is_edge(&self) -> bool {
        matches!(self.trigger, Trigger::Edge { .. })
    }

    /// Input constraints as (column, values) pairs.
    pub fn input_matches(&self) -> impl Iterator<Item = (usize, LevelSet)> + '_ {
        self.match_inputs.iter().filter_map(|m| match m.column {
            Column::Input(i) => Some((i, m.values)),
            Column::State => None,
        })
    }

    /// The state constraint, if the row restricts the state.
    #[must_use]
    pub fn state_match(&self) -> Option<LevelSet> {
        self.match_inputs
            .iter()
            .find(|m| m.column == Column::State)
            .map(|m| m.values)
    }
}

/// Builds the detectors for every row of `def`, in row order. Edge rows whose
/// transitions span both polarities produce a rising then a falling detector.
#[must_use]
pub fn synthesize(def: &PrimitiveDef) -> Vec<DetectorSpec> {
    let specs: Vec<DetectorSpec> = def.rows().iter().flat_map(row_detectors).collect();
    trace!("{}: {} detectors from {} rows", def.name(), specs.len(), def.rows().len());
    specs
}

fn row_detectors(row: &Row) -> Vec<DetectorSpec> {
    let mut match_inputs: Vec<ColumnMatch> = row
        .inputs
        .iter()
        .enumerate()
        .filter_map(|(i, symbol)| {
            symbol
                .level_set()
                .filter(|set| *set != LevelSet::ALL)
                .map(|values| ColumnMatch {
                    column: Column::Input(i),
                    values,
                })
        })
        .collect();
    if let Some(values) = row
        .state
        .and_then(Symbol::level_set)
        .filter(|set| *set != LevelSet::ALL)
    {
        match_inputs.push(ColumnMatch {
            column: Column::State,
            values,
        });
    }

    let output = row
        .output
        .output_value()
        .map_or(OutputValue::Hold, OutputValue::Value);

    let Some(edge_input) = row.edge_column() else {
        return vec![DetectorSpec {
            id: row.index,
            trigger: Trigger::Level,
            match_inputs,
            output,
        }];
    };
    let transitions = row.inputs[edge_input]
        .transitions()
        .unwrap_or(TransitionSet::EMPTY);

    Polarity::BOTH
        .into_iter()
        .filter_map(|polarity| {
            let half = transitions.half(polarity);
            (!half.is_empty()).then(|| DetectorSpec {
                id: row.index,
                trigger: Trigger::Edge {
                    edge_input,
                    polarity,
                    transitions: half,
                },
                match_inputs: match_inputs.clone(),
                output,
            })
        })
        .collect()
}
