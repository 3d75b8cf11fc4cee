//! Table-cell symbols.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::logic::{LevelSet, Logic, TransitionSet};

/// Which column of a table row a symbol occupies.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ColumnRole {
    /// One of the input columns.
    Input,
    /// The current-state column of a sequential table.
    State,
    /// The output (combinational) or next-state (sequential) column.
    Output,
}

impl fmt::Display for ColumnRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Input => write!(f, "input column"),
            Self::State => write!(f, "state column"),
            Self::Output => write!(f, "output column"),
        }
    }
}

/// A single table cell.
///
/// Level symbols describe a value held at the evaluation instant, edge
/// symbols a change of one input, and [`Symbol::NoChange`] a next state equal
/// to the current one.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Symbol {
    /// `0`
    Zero,
    /// `1`
    One,
    /// `x`: matches only an unknown value.
    Unknown,
    /// `?`: any of `0`, `1`, `x`.
    DontCare,
    /// `b`: `0` or `1`.
    Binary,
    /// `r`, `(01)`
    RisingEdge,
    /// `f`, `(10)`
    FallingEdge,
    /// `p`: `(01)`, `(0x)`, `(x1)`.
    PotentialRising,
    /// `n`: `(10)`, `(1x)`, `(x0)`.
    PotentialFalling,
    /// `(?v)`: any change ending at the known value `v`.
    AnyEdgeToKnown(Logic),
    /// `(v?)`: any change starting at the known value `v`.
    AnyEdgeFromKnown(Logic),
    /// `*`, `(??)`
    AnyEdge,
    /// Any other `(vw)` pair, kept as its two level sets.
    Transition(LevelSet, LevelSet),
    /// `-`
    NoChange,
}

impl Symbol {
    /// Parses a single-character symbol.
    #[must_use]
    pub const fn from_char(c: char) -> Option<Self> {
        Some(match c {
            '0' => Self::Zero,
            '1' => Self::One,
            'x' | 'X' => Self::Unknown,
            '?' => Self::DontCare,
            'b' | 'B' => Self::Binary,
            'r' | 'R' => Self::RisingEdge,
            'f' | 'F' => Self::FallingEdge,
            'p' | 'P' => Self::PotentialRising,
            'n' | 'N' => Self::PotentialFalling,
            '*' => Self::AnyEdge,
            '-' => Self::NoChange,
            _ => return None,
        })
    }

    /// Parses the inside of a parenthesised `(vw)` edge, normalising it to the
    /// named edge symbols where one exists.
    ///
    /// Returns `None` if either character is not a level character or if the
    /// pair describes no change at all, e.g. `(00)`.
    #[must_use]
    pub fn from_pair(from: char, to: char) -> Option<Self> {
        let from = Self::from_char(from)?.level_set()?;
        let to = Self::from_char(to)?.level_set()?;
        if TransitionSet::between(from, to).is_empty() {
            return None;
        }
        let symbol = match (from.single(), to.single()) {
            (Some(Logic::Zero), Some(Logic::One)) => Self::RisingEdge,
            (Some(Logic::One), Some(Logic::Zero)) => Self::FallingEdge,
            (None, Some(v)) if from == LevelSet::ALL && v.is_known() => Self::AnyEdgeToKnown(v),
            (Some(v), None) if to == LevelSet::ALL && v.is_known() => Self::AnyEdgeFromKnown(v),
            _ if from == LevelSet::ALL && to == LevelSet::ALL => Self::AnyEdge,
            _ => Self::Transition(from, to),
        };
        Some(symbol)
    }

    /// The values a level symbol matches, or `None` for edges and `-`.
    #[must_use]
    pub const fn level_set(self) -> Option<LevelSet> {
        match self {
            Self::Zero => Some(LevelSet::ZERO),
            Self::One => Some(LevelSet::ONE),
            Self::Unknown => Some(LevelSet::X),
            Self::DontCare => Some(LevelSet::ALL),
            Self::Binary => Some(LevelSet::BINARY),
            _ => None,
        }
    }

    /// The changes an edge symbol matches, or `None` for level symbols and `-`.
    #[must_use]
    pub fn transitions(self) -> Option<TransitionSet> {
        let set = match self {
            Self::RisingEdge => TransitionSet::between(LevelSet::ZERO, LevelSet::ONE),
            Self::FallingEdge => TransitionSet::between(LevelSet::ONE, LevelSet::ZERO),
            Self::PotentialRising => TransitionSet::RISING,
            Self::PotentialFalling => TransitionSet::FALLING,
            Self::AnyEdgeToKnown(v) => TransitionSet::between(LevelSet::ALL, LevelSet::of(v)),
            Self::AnyEdgeFromKnown(v) => TransitionSet::between(LevelSet::of(v), LevelSet::ALL),
            Self::AnyEdge => TransitionSet::ALL,
            Self::Transition(from, to) => TransitionSet::between(from, to),
            _ => return None,
        };
        Some(set)
    }

    /// Returns true for symbols that describe a change of one input.
    #[must_use]
    pub const fn is_edge(self) -> bool {
        matches!(
            self,
            Self::RisingEdge
                | Self::FallingEdge
                | Self::PotentialRising
                | Self::PotentialFalling
                | Self::AnyEdgeToKnown(_)
                | Self::AnyEdgeFromKnown(_)
                | Self::AnyEdge
                | Self::Transition(..)
        )
    }

    /// Returns true for symbols that match every value.
    #[must_use]
    pub const fn is_dont_care(self) -> bool {
        matches!(self, Self::DontCare)
    }

    /// Returns true if a level symbol matches `value`.
    #[must_use]
    pub fn matches(self, value: Logic) -> bool {
        self.level_set().is_some_and(|set| set.contains(value))
    }

    /// The value an output cell drives. `?` drives unknown; `-` has no value
    /// of its own.
    #[must_use]
    pub const fn output_value(self) -> Option<Logic> {
        match self {
            Self::Zero => Some(Logic::Zero),
            Self::One => Some(Logic::One),
            Self::Unknown | Self::DontCare => Some(Logic::X),
            _ => None,
        }
    }

    /// Returns true if the symbol may appear in a column of the given role.
    ///
    /// `sequential` only matters for the output column, where `-` is legal
    /// exactly when the table has a state column.
    #[must_use]
    pub const fn is_valid_in(self, role: ColumnRole, sequential: bool) -> bool {
        match role {
            ColumnRole::Input => !matches!(self, Self::NoChange),
            ColumnRole::State => matches!(
                self,
                Self::Zero | Self::One | Self::Unknown | Self::DontCare | Self::Binary
            ),
            ColumnRole::Output => match self {
                Self::Zero | Self::One | Self::Unknown | Self::DontCare => true,
                Self::NoChange => sequential,
                _ => false,
            },
        }
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Zero => write!(f, "0"),
            Self::One => write!(f, "1"),
            Self::Unknown => write!(f, "x"),
            Self::DontCare => write!(f, "?"),
            Self::Binary => write!(f, "b"),
            Self::RisingEdge => write!(f, "r"),
            Self::FallingEdge => write!(f, "f"),
            Self::PotentialRising => write!(f, "p"),
            Self::PotentialFalling => write!(f, "n"),
            Self::AnyEdgeToKnown(v) => write!(f, "(?{v})"),
            Self::AnyEdgeFromKnown(v) => write!(f, "({v}?)"),
            Self::AnyEdge => write!(f, "*"),
            Self::Transition(from, to) => write!(
                f,
                "({}{})",
                from.table_char().unwrap_or('?'),
                to.table_char().unwrap_or('?')
            ),
            Self::NoChange => write!(f, "-"),
        }
    }
}
