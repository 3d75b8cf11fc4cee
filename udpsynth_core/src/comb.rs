//! Combinational tables: a priority chain, plus advisory checks.

use itertools::Itertools;
use tracing::debug;
use udpsynth_common::{LevelSet, Logic, PrimitiveDef, Row, SynthConfig, TableWarning};

use crate::ir::{CombBranch, CombProcedure, SignalTest};

/// Compiles a combinational table to one `if / else if` chain in row order
/// with a final `x` default.
#[must_use]
pub fn compile_combinational(def: &PrimitiveDef) -> CombProcedure {
    let branches = def
        .rows()
        .iter()
        .map(|row| CombBranch {
            row: row.index,
            source: row.to_string(),
            guard: row
                .inputs
                .iter()
                .enumerate()
                .filter_map(|(i, symbol)| {
                    symbol
                        .level_set()
                        .filter(|set| *set != LevelSet::ALL)
                        .map(|values| SignalTest::new(def.input_name(i), values))
                })
                .collect(),
            value: row.output.output_value().unwrap_or(Logic::X),
        })
        .collect();

    CombProcedure {
        output: def.output().name.clone(),
        sensitivity: def.inputs().iter().map(|p| p.name.clone()).collect(),
        branches,
        default: Logic::X,
    }
}

/// True if `row` accepts the input vector.
fn row_matches(row: &Row, inputs: &[Logic]) -> bool {
    row.inputs
        .iter()
        .zip(inputs)
        .all(|(symbol, value)| symbol.matches(*value))
}

/// Reports rows that overlap with different outputs and input vectors no row
/// covers. Neither stops the conversion: the first matching row wins and
/// uncovered vectors drive `x`.
#[must_use]
pub fn validate_combinational(def: &PrimitiveDef, config: &SynthConfig) -> Vec<TableWarning> {
    let mut warnings: Vec<TableWarning> = def
        .rows()
        .iter()
        .tuple_combinations()
        .filter(|(a, b)| {
            a.output.output_value() != b.output.output_value()
                && a.inputs.iter().zip(&b.inputs).all(|(x, y)| {
                    x.level_set()
                        .zip(y.level_set())
                        .is_some_and(|(x, y)| !x.intersect(y).is_empty())
                })
        })
        .map(|(a, b)| TableWarning::ConflictingRows {
            first: a.index,
            second: b.index,
        })
        .collect();

    if config.check_completeness {
        let width = def.inputs().len();
        let vectors = u32::try_from(width)
            .ok()
            .and_then(|w| 3usize.checked_pow(w))
            .unwrap_or(usize::MAX);
        if vectors > config.completeness_limit {
            warnings.push(TableWarning::CompletenessSkipped { vectors });
        } else {
            let uncovered = (0..width)
                .map(|_| Logic::ALL)
                .multi_cartesian_product()
                .filter(|vector| !def.rows().iter().any(|row| row_matches(row, vector)))
                .count();
            debug!("{}: {} of {} input vectors uncovered", def.name(), uncovered, vectors);
            if uncovered > 0 {
                warnings.push(TableWarning::Incomplete {
                    uncovered,
                    checked: vectors,
                });
            }
        }
    }
    warnings
}
