//! Registry keys for converted primitives.
//!
//! A `ConversionKey` identifies a conversion by the primitive's name and its
//! exact source text, so two libraries defining the same name differently
//! never share a cached module.

use contracts::*;

/// Unique identifier for a converted primitive.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ConversionKey {
    /// Name following the `primitive` keyword
    pub name: String,
    /// Source text of the whole `primitive ... endprimitive` block
    pub source: String,
}

impl ConversionKey {
    /// Creates a new key.
    #[requires(!name.as_ref().is_empty())]
    pub fn new<N, S>(name: N, source: S) -> Self
    where
        N: AsRef<str> + Into<String>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            source: source.into(),
        }
    }

    /// Returns the primitive name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}
