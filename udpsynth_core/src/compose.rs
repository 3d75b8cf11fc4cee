//! Output composition: detector specs to a sequential module body.
//!
//! The body has exactly one procedure writing the output. Edge detectors are
//! separate `posedge`/`negedge` blocks that raise a one-shot register; the
//! output procedure consumes the register and schedules its clear with a
//! non-blocking assignment, so each fired detector is seen by one pass only.

use contracts::*;
use indexmap::IndexMap;
use tracing::debug;
use udpsynth_common::{Polarity, PrimitiveDef};

use crate::ir::{
    BranchKind, BranchValue, EdgeDetector, Guard, HistoryReg, LevelDetector, OutputBranch,
    OutputProcedure, SeqBody, Sensitivity, SignalTest,
};
use crate::names::Namer;
use crate::synth::{DetectorSpec, OutputValue, Trigger};

/// Composes the module body for `def` from its detector specs.
///
/// `specs` must be ordered by row, as [`crate::synth::synthesize`] returns them.
#[debug_requires(specs.windows(2).all(|w| w[0].id <= w[1].id))]
#[debug_ensures(ret.output.branches.len() == specs.len())]
pub fn compose(def: &PrimitiveDef, specs: &[DetectorSpec]) -> SeqBody {
    let mut namer = Namer::new(def.ports().iter().map(|p| p.name.as_str()));
    let snapshot = namer.fresh("state");
    let mut histories: IndexMap<usize, HistoryReg> = IndexMap::new();
    let mut edge_detectors = Vec::new();
    let mut level_detectors = Vec::new();
    let mut branches = Vec::with_capacity(specs.len());

    for spec in specs {
        let source = def.row(spec.id).map(ToString::to_string).unwrap_or_default();
        let guard: Guard = spec
            .input_matches()
            .map(|(column, values)| SignalTest::new(def.input_name(column), values))
            .collect();

        let (detector, kind) = match spec.trigger {
            Trigger::Level => {
                let name = namer.fresh(&format!("lv_{}", spec.id));
                level_detectors.push(LevelDetector {
                    name: name.clone(),
                    row: spec.id,
                    source,
                    guard,
                });
                (name, BranchKind::Level)
            }
            Trigger::Edge {
                edge_input,
                polarity,
                transitions,
            } => {
                let input = def.input_name(edge_input).to_string();
                let history = (!transitions.is_whole(polarity)).then(|| {
                    histories
                        .entry(edge_input)
                        .or_insert_with(|| HistoryReg {
                            input: input.clone(),
                            reg: namer.fresh(&format!("{input}_prev")),
                        })
                        .reg
                        .clone()
                });
                let name = namer.fresh(&format!("ev_{}_{}", spec.id, polarity.suffix()));
                edge_detectors.push(EdgeDetector {
                    name: name.clone(),
                    row: spec.id,
                    source,
                    input,
                    polarity,
                    transitions,
                    history,
                    guard,
                });
                (name, BranchKind::Edge)
            }
        };

        branches.push(OutputBranch {
            row: spec.id,
            detector,
            kind,
            state_guard: spec.state_match(),
            value: match spec.output {
                OutputValue::Value(v) => BranchValue::Drive(v),
                OutputValue::Hold => BranchValue::Hold,
            },
        });
    }

    let sensitivity = def
        .inputs()
        .iter()
        .map(|p| Sensitivity::Any(p.name.clone()))
        .chain(
            edge_detectors
                .iter()
                .map(|d| Sensitivity::Edge(Polarity::Rising, d.name.clone())),
        )
        .collect();

    debug!(
        "{}: composed {} level and {} edge detectors, {} history registers",
        def.name(),
        level_detectors.len(),
        edge_detectors.len(),
        histories.len()
    );

    SeqBody {
        initial: def.initial(),
        histories: histories.into_values().collect(),
        edge_detectors,
        output: OutputProcedure {
            output: def.output().name.clone(),
            sensitivity,
            snapshot,
            level_detectors,
            branches,
        },
    }
}
