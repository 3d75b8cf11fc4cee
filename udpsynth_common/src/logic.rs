//! Three-valued logic as observed by a table primitive.
//!
//! Table primitives see every wire as `0`, `1` or unknown (high impedance is
//! folded into unknown). [`LevelSet`] and [`TransitionSet`] are small bit sets
//! over those values and over the six single-wire value changes; every overlap
//! test the reducer performs is an intersection of these sets.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A wire value as seen by a table primitive.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Logic {
    /// Logic low.
    Zero,
    /// Logic high.
    One,
    /// Unknown (also stands in for high impedance).
    X,
}

impl Logic {
    /// Every value, in table order.
    pub const ALL: [Self; 3] = [Self::Zero, Self::One, Self::X];

    /// Parses a single value character (`0`, `1`, `x`, `z`).
    #[must_use]
    pub const fn from_char(c: char) -> Option<Self> {
        match c {
            '0' => Some(Self::Zero),
            '1' => Some(Self::One),
            'x' | 'X' | 'z' | 'Z' => Some(Self::X),
            _ => None,
        }
    }

    /// The character used in tables and value dumps.
    #[must_use]
    pub const fn as_char(self) -> char {
        match self {
            Self::Zero => '0',
            Self::One => '1',
            Self::X => 'x',
        }
    }

    /// Sized Verilog literal for this value.
    #[must_use]
    pub const fn verilog(self) -> &'static str {
        match self {
            Self::Zero => "1'b0",
            Self::One => "1'b1",
            Self::X => "1'bx",
        }
    }

    /// Returns true for `0` and `1`.
    #[must_use]
    pub const fn is_known(self) -> bool {
        !matches!(self, Self::X)
    }

    const fn mask(self) -> u8 {
        match self {
            Self::Zero => 0b001,
            Self::One => 0b010,
            Self::X => 0b100,
        }
    }
}

impl fmt::Display for Logic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

/// A set of [`Logic`] values.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub struct LevelSet(u8);

impl LevelSet {
    /// No value.
    pub const EMPTY: Self = Self(0);
    /// `{0}`.
    pub const ZERO: Self = Self(0b001);
    /// `{1}`.
    pub const ONE: Self = Self(0b010);
    /// `{x}`.
    pub const X: Self = Self(0b100);
    /// `{0, 1}`.
    pub const BINARY: Self = Self(0b011);
    /// `{0, 1, x}`.
    pub const ALL: Self = Self(0b111);

    /// The singleton set holding `value`.
    #[must_use]
    pub const fn of(value: Logic) -> Self {
        Self(value.mask())
    }

    /// Returns true if `value` is a member.
    #[must_use]
    pub const fn contains(self, value: Logic) -> bool {
        self.0 & value.mask() != 0
    }

    /// Set intersection.
    #[must_use]
    pub const fn intersect(self, other: Self) -> Self {
        Self(self.0 & other.0)
    }

    /// Returns true if the set has no members.
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Returns true if every member of `self` is in `other`.
    #[must_use]
    pub const fn is_subset(self, other: Self) -> bool {
        self.0 & !other.0 == 0
    }

    /// Number of members.
    #[must_use]
    pub const fn len(self) -> usize {
        self.0.count_ones() as usize
    }

    /// The only member, if the set is a singleton.
    #[must_use]
    pub fn single(self) -> Option<Logic> {
        let mut it = self.iter();
        match (it.next(), it.next()) {
            (Some(v), None) => Some(v),
            _ => None,
        }
    }

    /// Members in table order.
    pub fn iter(self) -> impl Iterator<Item = Logic> {
        Logic::ALL.into_iter().filter(move |v| self.contains(*v))
    }

    /// The table character denoting this set, if there is one.
    #[must_use]
    pub const fn table_char(self) -> Option<char> {
        match self.0 {
            0b001 => Some('0'),
            0b010 => Some('1'),
            0b100 => Some('x'),
            0b011 => Some('b'),
            0b111 => Some('?'),
            _ => None,
        }
    }
}

/// Direction of a value change, as the `posedge`/`negedge` event controls see it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Polarity {
    /// `0→1`, `0→x`, `x→1`.
    Rising,
    /// `1→0`, `1→x`, `x→0`.
    Falling,
}

impl Polarity {
    /// Both polarities, rising first.
    pub const BOTH: [Self; 2] = [Self::Rising, Self::Falling];

    /// Event-control keyword.
    #[must_use]
    pub const fn keyword(self) -> &'static str {
        match self {
            Self::Rising => "posedge",
            Self::Falling => "negedge",
        }
    }

    /// Short suffix used in generated signal names.
    #[must_use]
    pub const fn suffix(self) -> &'static str {
        match self {
            Self::Rising => "pos",
            Self::Falling => "neg",
        }
    }
}

impl fmt::Display for Polarity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Rising => write!(f, "rising"),
            Self::Falling => write!(f, "falling"),
        }
    }
}

/// A change of one wire from one value to a different one.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Transition {
    /// Value before the change.
    pub from: Logic,
    /// Value after the change.
    pub to: Logic,
}

impl Transition {
    /// The six possible changes: rising ones first.
    pub const ALL: [Self; 6] = [
        Self { from: Logic::Zero, to: Logic::One },
        Self { from: Logic::Zero, to: Logic::X },
        Self { from: Logic::X, to: Logic::One },
        Self { from: Logic::One, to: Logic::Zero },
        Self { from: Logic::One, to: Logic::X },
        Self { from: Logic::X, to: Logic::Zero },
    ];

    /// Creates a transition, or `None` if the values are equal.
    #[must_use]
    pub fn new(from: Logic, to: Logic) -> Option<Self> {
        (from != to).then_some(Self { from, to })
    }

    /// Which event control observes this change.
    #[must_use]
    pub const fn polarity(self) -> Polarity {
        match (self.from, self.to) {
            (Logic::Zero, _) | (_, Logic::One) => Polarity::Rising,
            _ => Polarity::Falling,
        }
    }

    const fn mask(self) -> u8 {
        match (self.from, self.to) {
            (Logic::Zero, Logic::One) => 1 << 0,
            (Logic::Zero, Logic::X) => 1 << 1,
            (Logic::X, Logic::One) => 1 << 2,
            (Logic::One, Logic::Zero) => 1 << 3,
            (Logic::One, Logic::X) => 1 << 4,
            (Logic::X, Logic::Zero) => 1 << 5,
            _ => 0,
        }
    }
}

impl fmt::Display for Transition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}{})", self.from, self.to)
    }
}

/// A set of [`Transition`]s.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub struct TransitionSet(u8);

impl TransitionSet {
    /// No change.
    pub const EMPTY: Self = Self(0);
    /// Every change a `posedge` control reacts to.
    pub const RISING: Self = Self(0b000_111);
    /// Every change a `negedge` control reacts to.
    pub const FALLING: Self = Self(0b111_000);
    /// Any change at all.
    pub const ALL: Self = Self(0b111_111);

    /// Singleton set.
    #[must_use]
    pub const fn of(transition: Transition) -> Self {
        Self(transition.mask())
    }

    /// Every change from a member of `from` to a different member of `to`.
    #[must_use]
    pub fn between(from: LevelSet, to: LevelSet) -> Self {
        Transition::ALL
            .into_iter()
            .filter(|t| from.contains(t.from) && to.contains(t.to))
            .fold(Self::EMPTY, |acc, t| acc.union(Self::of(t)))
    }

    /// The changes of one polarity.
    #[must_use]
    pub const fn polarity(polarity: Polarity) -> Self {
        match polarity {
            Polarity::Rising => Self::RISING,
            Polarity::Falling => Self::FALLING,
        }
    }

    /// Returns true if `transition` is a member.
    #[must_use]
    pub const fn contains(self, transition: Transition) -> bool {
        self.0 & transition.mask() != 0
    }

    /// Set union.
    #[must_use]
    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    /// Set intersection.
    #[must_use]
    pub const fn intersect(self, other: Self) -> Self {
        Self(self.0 & other.0)
    }

    /// Returns true if the set has no members.
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// The members observed by `polarity`.
    #[must_use]
    pub const fn half(self, polarity: Polarity) -> Self {
        self.intersect(Self::polarity(polarity))
    }

    /// Returns true if the set is exactly every change of `polarity`, so an
    /// event control alone decides membership.
    #[must_use]
    pub const fn is_whole(self, polarity: Polarity) -> bool {
        self.0 == Self::polarity(polarity).0
    }

    /// Values the input holds after one of the changes.
    #[must_use]
    pub fn targets(self) -> LevelSet {
        self.iter()
            .fold(LevelSet::EMPTY, |acc, t| LevelSet(acc.0 | LevelSet::of(t.to).0))
    }

    /// Members in [`Transition::ALL`] order.
    pub fn iter(self) -> impl Iterator<Item = Transition> {
        Transition::ALL.into_iter().filter(move |t| self.contains(*t))
    }
}

impl fmt::Display for TransitionSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, t) in self.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{t}")?;
        }
        write!(f, "}}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transition_polarity_matches_event_controls() {
        for t in Transition::ALL {
            let rising = TransitionSet::RISING.contains(t);
            assert_eq!(rising, t.polarity() == Polarity::Rising, "{t}");
        }
    }

    #[test]
    fn test_between_excludes_identity() {
        let set = TransitionSet::between(LevelSet::ALL, LevelSet::ALL);
        assert_eq!(set, TransitionSet::ALL);
        assert!(TransitionSet::between(LevelSet::X, LevelSet::X).is_empty());
    }

    #[test]
    fn test_level_set_single() {
        assert_eq!(LevelSet::ONE.single(), Some(Logic::One));
        assert_eq!(LevelSet::BINARY.single(), None);
        assert_eq!(LevelSet::BINARY.len(), 2);
        assert!(LevelSet::ZERO.is_subset(LevelSet::BINARY));
        assert!(!LevelSet::X.is_subset(LevelSet::BINARY));
    }

    #[test]
    fn test_half_and_whole() {
        let any = TransitionSet::ALL;
        assert!(any.half(Polarity::Rising).is_whole(Polarity::Rising));
        let strict = TransitionSet::of(Transition::ALL[0]);
        assert!(!strict.is_whole(Polarity::Rising));
        assert!(strict.half(Polarity::Falling).is_empty());
    }

    #[test]
    fn test_targets() {
        assert_eq!(TransitionSet::FALLING.targets(), LevelSet(0b101));
        assert_eq!(TransitionSet::EMPTY.targets(), LevelSet::EMPTY);
        let to_one = TransitionSet::between(LevelSet::ALL, LevelSet::ONE);
        assert_eq!(to_one.targets(), LevelSet::ONE);
    }
}
