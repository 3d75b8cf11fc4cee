//! Direct table lookup, with no synthesis involved.

use contracts::*;
use udpsynth_common::{Logic, PrimitiveDef, Row, Symbol, Transition};

/// What a sequential table says about one input event.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Step {
    /// The next state. Equal to the current state when no row matches.
    Next(Logic),
    /// Several rows match and disagree.
    Conflict {
        /// The disagreeing rows, in table order.
        rows: Vec<usize>,
    },
}

/// Output of a combinational table: the first matching row, or `x`.
#[must_use]
pub fn lookup_combinational(def: &PrimitiveDef, inputs: &[Logic]) -> Logic {
    def.rows()
        .iter()
        .find(|row| levels_match(row, inputs, None))
        .and_then(|row| row.output.output_value())
        .unwrap_or(Logic::X)
}

/// Next state of a sequential table when the inputs go from `old` to `new`
/// while the state is `state`.
///
/// At most one input may change. Level rows are matched against `new`; an
/// edge row matches when its edge column is the one that changed, the change
/// is one of its transitions, and its other columns match `new`.
#[debug_requires(old.len() == new.len())]
#[debug_requires(old.iter().zip(new).filter(|(a, b)| a != b).count() <= 1)]
#[must_use]
pub fn step_sequential(def: &PrimitiveDef, state: Logic, old: &[Logic], new: &[Logic]) -> Step {
    let changed = old
        .iter()
        .zip(new)
        .position(|(a, b)| a != b)
        .and_then(|column| Transition::new(old[column], new[column]).map(|t| (column, t)));

    let candidates: Vec<(usize, Logic)> = def
        .rows()
        .iter()
        .filter(|row| row.state.is_none_or(|s| s.matches(state)))
        .filter(|row| match row.edge_column() {
            None => levels_match(row, new, None),
            Some(edge) => changed.is_some_and(|(column, transition)| {
                column == edge
                    && row.inputs[edge]
                        .transitions()
                        .is_some_and(|set| set.contains(transition))
                    && levels_match(row, new, Some(edge))
            }),
        })
        .map(|row| {
            let value = match row.output {
                Symbol::NoChange => state,
                other => other.output_value().unwrap_or(Logic::X),
            };
            (row.index, value)
        })
        .collect();

    match candidates.first() {
        None => Step::Next(state),
        Some((_, first)) if candidates.iter().all(|(_, v)| v == first) => Step::Next(*first),
        Some(_) => Step::Conflict {
            rows: candidates.into_iter().map(|(index, _)| index).collect(),
        },
    }
}

fn levels_match(row: &Row, values: &[Logic], skip: Option<usize>) -> bool {
    row.inputs
        .iter()
        .zip(values)
        .enumerate()
        .all(|(i, (symbol, value))| Some(i) == skip || symbol.matches(*value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use udpsynth_core::parse_primitive;
    use Logic::{One, X, Zero};

    #[test]
    fn test_sr_latch_lookup() {
        let def = parse_primitive(
            "primitive srff(q, s, r); output q; reg q; input s, r;
             table 1 0 : ? : 1 ; 0 f : ? : 0 ; 1 1 : ? : 0 ; endtable endprimitive",
        )
        .unwrap();
        assert_eq!(step_sequential(&def, Zero, &[Zero, Zero], &[One, Zero]), Step::Next(One));
        assert_eq!(step_sequential(&def, One, &[Zero, One], &[Zero, Zero]), Step::Next(Zero));
        assert_eq!(step_sequential(&def, One, &[Zero, X], &[Zero, Zero]), Step::Next(One));
        assert_eq!(step_sequential(&def, X, &[One, Zero], &[One, One]), Step::Next(Zero));
        assert_eq!(step_sequential(&def, One, &[Zero, Zero], &[Zero, One]), Step::Next(One));
    }

    #[test]
    fn test_conflict_reported() {
        let def = parse_primitive(
            "primitive t(q, a); output q; reg q; input a;
             table 1 : ? : 1 ; ? : 0 : 0 ; endtable endprimitive",
        )
        .unwrap();
        assert_eq!(
            step_sequential(&def, Zero, &[Zero], &[One]),
            Step::Conflict { rows: vec![0, 1] }
        );
    }

    #[test]
    fn test_combinational_default_is_unknown() {
        let def = parse_primitive(
            "primitive t(y, a, b); output y; input a, b; table 0 ? : 1 ; 1 1 : 0 ; endtable endprimitive",
        )
        .unwrap();
        assert_eq!(lookup_combinational(&def, &[Zero, X]), One);
        assert_eq!(lookup_combinational(&def, &[One, One]), Zero);
        assert_eq!(lookup_combinational(&def, &[One, Zero]), X);
    }
}
