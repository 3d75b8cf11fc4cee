//! Conversion configuration.
//!
//! All knobs have defaults matching the documented behavior; the CLI can load
//! a `Config` from JSON, and library callers use the `with_*` builders.

use serde::{Deserialize, Serialize};

/// How the reducer treats retained rows whose triggers overlap.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OverlapPolicy {
    /// Reject overlaps only when the rows disagree on the result.
    #[default]
    RejectConflicting,
    /// Reject every overlap between retained rows, even when they agree.
    RejectAny,
}

/// Options for the classifier, reducer and synthesizer.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct SynthConfig {
    /// Drop state-preserving rows before synthesis.
    pub reduce: bool,
    /// Overlap handling for retained rows.
    pub overlap: OverlapPolicy,
    /// Enumerate combinational input vectors to report uncovered ones.
    pub check_completeness: bool,
    /// Largest input space (`3^inputs`) the completeness check enumerates.
    pub completeness_limit: usize,
}

impl Default for SynthConfig {
    fn default() -> Self {
        Self {
            reduce: true,
            overlap: OverlapPolicy::default(),
            check_completeness: true,
            completeness_limit: 59_049,
        }
    }
}

impl SynthConfig {
    /// Creates the default synthesis options.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Enables or disables row reduction.
    #[must_use]
    pub const fn with_reduce(mut self, reduce: bool) -> Self {
        self.reduce = reduce;
        self
    }

    /// Sets the overlap policy.
    #[must_use]
    pub const fn with_overlap(mut self, overlap: OverlapPolicy) -> Self {
        self.overlap = overlap;
        self
    }

    /// Enables or disables the combinational completeness check.
    #[must_use]
    pub const fn with_completeness(mut self, check: bool, limit: usize) -> Self {
        self.check_completeness = check;
        self.completeness_limit = limit;
        self
    }
}

/// Options for rendering generated modules.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct EmitConfig {
    /// Spaces per indentation level.
    pub indent: usize,
    /// Emit the source row above each detector and branch.
    pub row_comments: bool,
    /// Emit a one-line comment above the module header.
    pub header_comment: bool,
}

impl Default for EmitConfig {
    fn default() -> Self {
        Self {
            indent: 2,
            row_comments: true,
            header_comment: true,
        }
    }
}

impl EmitConfig {
    /// Creates the default emission options.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the indentation width.
    #[must_use]
    pub const fn with_indent(mut self, indent: usize) -> Self {
        self.indent = indent;
        self
    }

    /// Enables or disables per-row comments.
    #[must_use]
    pub const fn with_row_comments(mut self, row_comments: bool) -> Self {
        self.row_comments = row_comments;
        self
    }

    /// Enables or disables the header comment.
    #[must_use]
    pub const fn with_header_comment(mut self, header_comment: bool) -> Self {
        self.header_comment = header_comment;
        self
    }
}

/// Top-level configuration for a conversion run.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Synthesis options.
    pub synth: SynthConfig,
    /// Emission options.
    pub emit: EmitConfig,
    /// Convert the primitives of a library on the rayon pool.
    pub parallel: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            synth: SynthConfig::default(),
            emit: EmitConfig::default(),
            parallel: true,
        }
    }
}

impl Config {
    /// Creates the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the synthesis options.
    #[must_use]
    pub fn with_synth(mut self, synth: SynthConfig) -> Self {
        self.synth = synth;
        self
    }

    /// Replaces the emission options.
    #[must_use]
    pub fn with_emit(mut self, emit: EmitConfig) -> Self {
        self.emit = emit;
        self
    }

    /// Enables or disables parallel batch conversion.
    #[must_use]
    pub const fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Parses a configuration from JSON. Missing fields take their defaults.
    ///
    /// # Errors
    ///
    /// Returns the underlying `serde_json` error for malformed input.
    pub fn from_json_str(text: &str) -> Result<Self, serde_json::Error> {
        let config: Self = serde_json::from_str(text)?;
        tracing::debug!("loaded config: {:?}", config);
        Ok(config)
    }

    /// Serializes the configuration as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns the underlying `serde_json` error.
    pub fn to_json_string(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
