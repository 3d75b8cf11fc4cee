//! Structured conversion errors and non-fatal table warnings.
//!
//! Every failure is local to one primitive: the caller decides whether a
//! batch stops or skips the primitive and reports it.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::symbol::ColumnRole;

/// A 1-based line/column position in primitive source text.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SourceLocation {
    /// 1-based line.
    pub line: usize,
    /// 1-based column, counted in characters.
    pub column: usize,
}

impl SourceLocation {
    /// Creates a location.
    #[must_use]
    pub const fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }

    /// The same position, moved down by `lines` (used when a primitive was
    /// cut out of a larger file).
    #[must_use]
    pub const fn offset_lines(self, lines: usize) -> Self {
        Self {
            line: self.line + lines,
            column: self.column,
        }
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}, column {}", self.line, self.column)
    }
}

/// A reference to a table row in error messages.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RowRef {
    /// Row index within the table.
    pub index: usize,
    /// Where the row starts.
    pub location: SourceLocation,
}

impl fmt::Display for RowRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{} ({})", self.index, self.location)
    }
}

/// Errors that stop the conversion of one primitive.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConvertError {
    /// Structural parse failure: bad header, unterminated table, bad
    /// declarations, more than one edge in a row.
    #[error("{primitive}: malformed primitive at {location}: {details}")]
    MalformedPrimitive {
        /// Primitive name, or `<unknown>` if the header did not parse.
        primitive: String,
        /// Where the problem was found.
        location: SourceLocation,
        /// Human-readable description.
        details: String,
    },

    /// A table cell that is unknown or illegal in its column.
    #[error("{primitive}: invalid symbol `{symbol}` in {role} at {location}")]
    InvalidSymbol {
        /// Primitive name.
        primitive: String,
        /// Position of the offending cell.
        location: SourceLocation,
        /// The offending text.
        symbol: String,
        /// The column the cell occupies.
        role: ColumnRole,
        /// Index of the row holding the cell.
        row: usize,
    },

    /// Two retained rows can fire on the same input event with different
    /// results.
    #[error("{primitive}: rows {first} and {second} overlap with conflicting outputs: {details}")]
    AmbiguousTable {
        /// Primitive name.
        primitive: String,
        /// The earlier of the two rows.
        first: RowRef,
        /// The later of the two rows.
        second: RowRef,
        /// Which outputs conflict.
        details: String,
    },

    /// A row's column count disagrees with the port declaration.
    #[error("{primitive}: row #{row} at {location} has {found} columns, expected {expected}")]
    PortArityMismatch {
        /// Primitive name.
        primitive: String,
        /// Where the row starts.
        location: SourceLocation,
        /// Index of the row.
        row: usize,
        /// Inputs + state (if sequential) + output.
        expected: usize,
        /// Columns actually present.
        found: usize,
    },
}

impl ConvertError {
    /// Create a malformed-primitive error.
    pub fn malformed(
        primitive: impl Into<String>,
        location: SourceLocation,
        details: impl Into<String>,
    ) -> Self {
        Self::MalformedPrimitive {
            primitive: primitive.into(),
            location,
            details: details.into(),
        }
    }

    /// Name of the primitive the error belongs to.
    #[must_use]
    pub fn primitive(&self) -> &str {
        match self {
            Self::MalformedPrimitive { primitive, .. }
            | Self::InvalidSymbol { primitive, .. }
            | Self::AmbiguousTable { primitive, .. }
            | Self::PortArityMismatch { primitive, .. } => primitive,
        }
    }

    /// Where in the source the error points.
    #[must_use]
    pub const fn location(&self) -> SourceLocation {
        match self {
            Self::MalformedPrimitive { location, .. }
            | Self::InvalidSymbol { location, .. }
            | Self::PortArityMismatch { location, .. } => *location,
            Self::AmbiguousTable { second, .. } => second.location,
        }
    }

    /// Index of the offending row, where one exists.
    #[must_use]
    pub const fn row(&self) -> Option<usize> {
        match self {
            Self::MalformedPrimitive { .. } => None,
            Self::InvalidSymbol { row, .. } | Self::PortArityMismatch { row, .. } => Some(*row),
            Self::AmbiguousTable { second, .. } => Some(second.index),
        }
    }

    /// Stable name of the error kind, for reports.
    #[must_use]
    pub const fn kind_name(&self) -> &'static str {
        match self {
            Self::MalformedPrimitive { .. } => "MalformedPrimitive",
            Self::InvalidSymbol { .. } => "InvalidSymbol",
            Self::AmbiguousTable { .. } => "AmbiguousTable",
            Self::PortArityMismatch { .. } => "PortArityMismatch",
        }
    }

    /// The same error with every location moved down by `lines`.
    #[must_use]
    pub fn offset_lines(self, lines: usize) -> Self {
        match self {
            Self::MalformedPrimitive {
                primitive,
                location,
                details,
            } => Self::MalformedPrimitive {
                primitive,
                location: location.offset_lines(lines),
                details,
            },
            Self::InvalidSymbol {
                primitive,
                location,
                symbol,
                role,
                row,
            } => Self::InvalidSymbol {
                primitive,
                location: location.offset_lines(lines),
                symbol,
                role,
                row,
            },
            Self::AmbiguousTable {
                primitive,
                first,
                second,
                details,
            } => Self::AmbiguousTable {
                primitive,
                first: RowRef {
                    location: first.location.offset_lines(lines),
                    ..first
                },
                second: RowRef {
                    location: second.location.offset_lines(lines),
                    ..second
                },
                details,
            },
            Self::PortArityMismatch {
                primitive,
                location,
                row,
                expected,
                found,
            } => Self::PortArityMismatch {
                primitive,
                location: location.offset_lines(lines),
                row,
                expected,
                found,
            },
        }
    }
}

/// Result alias for conversion stages.
pub type Result<T> = std::result::Result<T, ConvertError>;

/// Findings that do not stop a conversion but deserve a look.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableWarning {
    /// Two combinational rows match a common input vector with different outputs;
    /// the earlier row wins in the generated branch chain.
    ConflictingRows {
        /// Earlier row index.
        first: usize,
        /// Later row index.
        second: usize,
    },
    /// Some input vectors match no combinational row and will drive `x`.
    Incomplete {
        /// Vectors not covered by any row.
        uncovered: usize,
        /// Vectors enumerated.
        checked: usize,
    },
    /// The completeness check was skipped because the input space is larger
    /// than the configured limit.
    CompletenessSkipped {
        /// Size of the input space.
        vectors: usize,
    },
    /// Two level rows feed each other through the state column and toggle on
    /// every evaluation.
    LevelFeedback {
        /// Earlier row index.
        first: usize,
        /// Later row index.
        second: usize,
    },
}

impl fmt::Display for TableWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConflictingRows { first, second } => write!(
                f,
                "rows #{first} and #{second} overlap with different outputs; #{first} takes priority"
            ),
            Self::Incomplete { uncovered, checked } => write!(
                f,
                "{uncovered} of {checked} input vectors match no row and drive x"
            ),
            Self::CompletenessSkipped { vectors } => {
                write!(f, "completeness not checked over {vectors} input vectors")
            }
            Self::LevelFeedback { first, second } => write!(
                f,
                "level rows #{first} and #{second} feed each other through the state column"
            ),
        }
    }
}
