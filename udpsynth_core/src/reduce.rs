//! Table classification, row reduction and the ambiguity check.
//!
//! Generated sequential modules leave the output alone when no detector
//! fires, and a hold branch never writes, so rows whose next state equals
//! their current state carry no information and can be dropped. The
//! pairwise overlap test rejects retained rows that disagree on an event,
//! and holds that disagree with a driving row of the same trigger kind.

use contracts::*;
use itertools::Itertools;
use tracing::{debug, trace};
use udpsynth_common::{
    ConvertError, LevelSet, Logic, OverlapPolicy, PrimitiveDef, PrimitiveKind, Result, Row, RowRef,
    Symbol, SynthConfig, TableWarning,
};

/// How a row is triggered.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RowClass {
    /// No edge symbol: fires on the current input values.
    Level,
    /// One edge symbol in `column`.
    Edge {
        /// Input column holding the edge.
        column: usize,
    },
}

impl RowClass {
    /// Classifies a row by its edge column.
    #[must_use]
    pub fn of(row: &Row) -> Self {
        row.edge_column()
            .map_or(Self::Level, |column| Self::Edge { column })
    }
}

/// A table is sequential exactly when its rows carry a state column.
#[must_use]
pub fn classify(def: &PrimitiveDef) -> PrimitiveKind {
    PrimitiveKind::from_state_column(def.rows().iter().any(|r| r.state.is_some()))
}

/// Checks a sequential table for ambiguity and, if `config.reduce` is set,
/// drops its state-preserving rows. Combinational tables are returned as is.
///
/// Running it again on its own output returns the same definition.
///
/// # Errors
///
/// Returns [`ConvertError::AmbiguousTable`] for the first conflicting pair in
/// table order.
#[debug_ensures(ret.as_ref().map_or(true, |d| d.rows().len() <= def.rows().len()))]
#[debug_ensures(ret.as_ref().map_or(true, |d| !config.reduce || d.rows().iter().all(|r| !r.is_state_preserving())))]
pub fn reduce(def: &PrimitiveDef, config: &SynthConfig) -> Result<PrimitiveDef> {
    if classify(def) == PrimitiveKind::Combinational {
        return Ok(def.clone());
    }
    check_ambiguity(def, config.overlap)?;
    if !config.reduce {
        return Ok(def.clone());
    }

    let retained: Vec<Row> = def
        .rows()
        .iter()
        .filter(|row| {
            let keep = !row.is_state_preserving();
            if !keep {
                trace!("{}: dropping state-preserving row #{} `{}`", def.name(), row.index, row);
            }
            keep
        })
        .cloned()
        .collect();
    debug!(
        "{}: {} of {} rows retained after reduction",
        def.name(),
        retained.len(),
        def.rows().len()
    );
    Ok(def.with_rows(retained))
}

/// The state values two rows can both fire on, if their triggers overlap.
///
/// Two level rows overlap when every pair of input cells intersects. Two
/// edge rows must also have their edge on the same input, with intersecting
/// transition sets. A level row and an edge row overlap when the level row
/// holds right after one of the edge's changes, so the level cell in the edge
/// column is compared with the values the change ends on. Edges on different
/// inputs never fire together. In every case the state cells must intersect
/// too.
#[must_use]
pub fn overlap(a: &Row, b: &Row) -> Option<LevelSet> {
    let different_edges = matches!(
        (RowClass::of(a), RowClass::of(b)),
        (RowClass::Edge { column: x }, RowClass::Edge { column: y }) if x != y
    );
    if different_edges {
        return None;
    }
    let inputs_meet = a
        .inputs
        .iter()
        .zip(&b.inputs)
        .all(|(x, y)| cells_meet(*x, *y));
    if !inputs_meet {
        return None;
    }
    let states = state_set(a).intersect(state_set(b));
    (!states.is_empty()).then_some(states)
}

fn cells_meet(x: Symbol, y: Symbol) -> bool {
    match (x.level_set(), y.level_set(), x.transitions(), y.transitions()) {
        (Some(x), Some(y), _, _) => !x.intersect(y).is_empty(),
        (_, _, Some(x), Some(y)) => !x.intersect(y).is_empty(),
        (Some(level), _, _, Some(edge)) | (_, Some(level), Some(edge), _) => {
            !level.intersect(edge.targets()).is_empty()
        }
        _ => false,
    }
}

fn state_set(row: &Row) -> LevelSet {
    row.state
        .and_then(|s| s.level_set())
        .unwrap_or(LevelSet::ALL)
}

/// The value a row drives, or `None` for a row that keeps the state.
fn driven(row: &Row) -> Option<Logic> {
    if row.is_state_preserving() {
        None
    } else {
        row.output.output_value()
    }
}

fn check_ambiguity(def: &PrimitiveDef, policy: OverlapPolicy) -> Result<()> {
    for (a, b) in def.rows().iter().tuple_combinations() {
        let Some(states) = overlap(a, b) else {
            continue;
        };
        // hold branches never write, so a hold only disagrees with a row
        // firing through the same kind of trigger
        let same_trigger = RowClass::of(a) == RowClass::of(b);
        let details = match (driven(a), driven(b)) {
            (Some(v), Some(w)) if v != w => Some(format!(
                "row #{} drives {} and row #{} drives {}",
                a.index, v, b.index, w
            )),
            (Some(v), Some(_)) if policy == OverlapPolicy::RejectAny => Some(format!(
                "rows #{} and #{} both drive {} on the same event",
                a.index, b.index, v
            )),
            (None, Some(v)) | (Some(v), None) if same_trigger => {
                states.iter().find(|s| *s != v).map(|s| {
                    let (hold, drive) = if driven(a).is_none() { (a, b) } else { (b, a) };
                    format!(
                        "row #{} keeps state {} but row #{} drives {}",
                        hold.index, s, drive.index, v
                    )
                })
            }
            _ => None,
        };
        if let Some(details) = details {
            return Err(ConvertError::AmbiguousTable {
                primitive: def.name().to_string(),
                first: RowRef {
                    index: a.index,
                    location: a.location,
                },
                second: RowRef {
                    index: b.index,
                    location: b.location,
                },
                details,
            });
        }
    }
    Ok(())
}

/// Finds pairs of retained level rows where one row's result re-enables the
/// other, so the table would flip between their outputs if it were
/// re-evaluated after every state change.
#[must_use]
pub fn level_feedback(def: &PrimitiveDef) -> Vec<TableWarning> {
    let level_rows = def
        .rows()
        .iter()
        .filter(|r| r.state.is_some() && RowClass::of(r) == RowClass::Level)
        .filter_map(|r| driven(r).map(|v| (r, v)));

    level_rows
        .tuple_combinations()
        .filter(|((a, va), (b, vb))| {
            let inputs_meet = a.inputs.iter().zip(&b.inputs).all(|(x, y)| {
                x.level_set()
                    .zip(y.level_set())
                    .is_some_and(|(x, y)| !x.intersect(y).is_empty())
            });
            inputs_meet
                && va != vb
                && (state_set(b).contains(*va) || state_set(a).contains(*vb))
        })
        .map(|((a, _), (b, _))| TableWarning::LevelFeedback {
            first: a.index,
            second: b.index,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_primitive;

    fn seq(rows: &str) -> PrimitiveDef {
        parse_primitive(&format!(
            "primitive t(q, a, b); output q; reg q; input a, b; table {rows} endtable endprimitive"
        ))
        .expect("fixture parses")
    }

    #[test]
    fn test_drops_state_preserving_rows() {
        let def = seq("1 0 : ? : 1 ; 0 0 : ? : - ; 1 1 : 0 : 0 ; 0 r : 1 : 0 ;");
        let reduced = reduce(&def, &SynthConfig::default()).unwrap();
        let kept: Vec<_> = reduced.rows().iter().map(|r| r.index).collect();
        assert_eq!(kept, [0, 3]);
    }

    #[test]
    fn test_reduce_disabled_keeps_rows() {
        let def = seq("1 0 : ? : 1 ; 0 0 : ? : - ;");
        let reduced = reduce(&def, &SynthConfig::default().with_reduce(false)).unwrap();
        assert_eq!(reduced.rows().len(), 2);
    }

    #[test]
    fn test_combinational_is_untouched() {
        let def = parse_primitive(
            "primitive t(q, a); output q; input a; table 0 : 1 ; 1 : 0 ; endtable endprimitive",
        )
        .unwrap();
        assert_eq!(classify(&def), PrimitiveKind::Combinational);
        assert_eq!(reduce(&def, &SynthConfig::default()).unwrap(), def);
    }

    #[test]
    fn test_conflicting_level_rows_rejected() {
        let def = seq("1 ? : ? : 1 ; ? 0 : ? : 0 ;");
        match reduce(&def, &SynthConfig::default()) {
            Err(ConvertError::AmbiguousTable { first, second, .. }) => {
                assert_eq!((first.index, second.index), (0, 1));
            }
            other => panic!("expected AmbiguousTable, got {other:?}"),
        }
    }

    #[test]
    fn test_agreeing_overlap_depends_on_policy() {
        let def = seq("1 ? : ? : 1 ; ? 0 : ? : 1 ;");
        assert!(reduce(&def, &SynthConfig::default()).is_ok());
        let strict = SynthConfig::default().with_overlap(OverlapPolicy::RejectAny);
        assert!(matches!(
            reduce(&def, &strict),
            Err(ConvertError::AmbiguousTable { .. })
        ));
    }

    #[test]
    fn test_hold_row_conflicts_with_driving_row() {
        // row 1 keeps q when a=1, b=0 but row 0 sets it to 1 from any state
        let def = seq("1 ? : ? : 1 ; 1 0 : ? : - ;");
        assert!(matches!(
            reduce(&def, &SynthConfig::default()),
            Err(ConvertError::AmbiguousTable { .. })
        ));
        // restricted to q = 1 the hold agrees with the drive
        let def = seq("1 ? : ? : 1 ; 1 0 : 1 : - ;");
        assert!(reduce(&def, &SynthConfig::default()).is_ok());
    }

    #[test]
    fn test_edges_on_different_inputs_not_compared() {
        let def = seq("r ? : ? : 1 ; ? f : ? : 0 ;");
        assert!(reduce(&def, &SynthConfig::default()).is_ok());
        let def = seq("r ? : ? : 1 ; p 0 : ? : 0 ;");
        assert!(reduce(&def, &SynthConfig::default()).is_err());
        let def = seq("r ? : ? : 1 ; (x1) 0 : ? : 0 ;");
        assert!(reduce(&def, &SynthConfig::default()).is_ok());
    }

    #[test]
    fn test_level_and_edge_rows_compared_after_the_edge() {
        // `1 ?` still holds once `b` has risen
        let def = seq("1 ? : ? : 1 ; 1 r : ? : 0 ;");
        match reduce(&def, &SynthConfig::default()) {
            Err(ConvertError::AmbiguousTable { first, second, .. }) => {
                assert_eq!((first.index, second.index), (0, 1));
            }
            other => panic!("expected AmbiguousTable, got {other:?}"),
        }
        // `? 1` never holds right after `b` falls
        let def = seq("? 1 : ? : 1 ; ? f : ? : 0 ;");
        assert!(reduce(&def, &SynthConfig::default()).is_ok());
        let def = seq("0 ? : ? : 1 ; 1 r : ? : 0 ;");
        assert!(reduce(&def, &SynthConfig::default()).is_ok());
    }

    #[test]
    fn test_level_hold_does_not_block_edge() {
        let def = seq("0 f : ? : 0 ; 0 0 : ? : - ;");
        let config = SynthConfig::default().with_reduce(false);
        assert_eq!(reduce(&def, &config).unwrap().rows().len(), 2);
        assert_eq!(overlap(&def.rows()[0], &def.rows()[1]), Some(LevelSet::ALL));
    }

    #[test]
    fn test_disjoint_state_sets_do_not_overlap() {
        let def = seq("1 1 : 0 : 1 ; 1 1 : 1 : 0 ;");
        assert!(reduce(&def, &SynthConfig::default()).is_ok());
        assert_eq!(
            level_feedback(&def),
            [TableWarning::LevelFeedback { first: 0, second: 1 }]
        );
    }

    #[test]
    fn test_reduce_is_idempotent() {
        let def = seq("1 0 : ? : 1 ; 0 1 : ? : 0 ; 0 0 : ? : - ; 1 1 : x : x ; (01) 0 : 0 : 0 ;");
        let once = reduce(&def, &SynthConfig::default()).unwrap();
        let twice = reduce(&once, &SynthConfig::default()).unwrap();
        assert_eq!(once, twice);
    }
}
