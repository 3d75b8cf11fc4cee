use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::{Arc, PoisonError, RwLock};

use rayon::prelude::*;
use thiserror::Error;
use tracing::{debug, info, warn};
use udpsynth_common::{Config, ConvertError};
use udpsynth_core::{Conversion, convert};

use crate::key::ConversionKey;
use crate::library::{PrimitiveBlock, scan_library};
use crate::report::ConversionRecord;

#[derive(Debug, Error)]
pub enum DriverError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Report error: {0}")]
    Csv(#[from] csv::Error),
    #[error("Config error: {0}")]
    Config(#[from] serde_json::Error),
    #[error("Library scan error: {0}")]
    Scan(#[from] regex::Error),
    #[error("{file}: {error}")]
    Conversion {
        file: String,
        #[source]
        error: ConvertError,
    },
}

/// A converted library: rewritten text and one record per primitive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LibraryOutcome {
    /// The library with every converted primitive replaced by its module.
    pub text: String,
    /// One record per primitive, in source order.
    pub records: Vec<ConversionRecord>,
}

impl LibraryOutcome {
    /// Number of primitives that failed to convert.
    #[must_use]
    pub fn failures(&self) -> usize {
        self.records.iter().filter(|r| !r.is_converted()).count()
    }
}

#[derive(Debug, Clone)]
pub struct Driver {
    registry: Arc<RwLock<HashMap<ConversionKey, Arc<Conversion>>>>,
    config: Config,
    fail_fast: bool,
}

impl Driver {
    pub fn new(config: Config) -> Self {
        Self {
            registry: Arc::new(RwLock::new(HashMap::new())),
            config,
            fail_fast: false,
        }
    }

    /// Make a failing primitive fail the whole library instead of being
    /// recorded and skipped
    #[must_use]
    pub fn with_fail_fast(mut self, fail_fast: bool) -> Self {
        self.fail_fast = fail_fast;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Convert one primitive definition, reusing an earlier conversion of
    /// the same text
    pub fn convert_primitive(&self, name: &str, source: &str) -> Result<Arc<Conversion>, ConvertError> {
        let key = ConversionKey::new(name, source);
        if let Some(conversion) = self.get_conversion(&key) {
            debug!("{}: reusing cached conversion", name);
            return Ok(conversion);
        }

        let conversion = Arc::new(convert(source, &self.config)?);
        {
            let mut registry = self.registry.write().unwrap_or_else(PoisonError::into_inner);
            registry.insert(key, conversion.clone());
        }
        Ok(conversion)
    }

    /// Get a conversion from the registry (returns None if not converted yet)
    pub fn get_conversion(&self, key: &ConversionKey) -> Option<Arc<Conversion>> {
        let registry = self.registry.read().unwrap_or_else(PoisonError::into_inner);
        registry.get(key).cloned()
    }

    /// Get every successful conversion so far
    pub fn get_all_conversions(&self) -> HashMap<ConversionKey, Arc<Conversion>> {
        let registry = self.registry.read().unwrap_or_else(PoisonError::into_inner);
        registry.clone()
    }

    /// Convert every primitive in a library text. `file` labels the records.
    ///
    /// Failed primitives are left verbatim and recorded, unless the driver
    /// was built with [`Driver::with_fail_fast`], in which case the first
    /// failure in source order is returned.
    pub fn convert_source(&self, file: &str, text: &str) -> Result<LibraryOutcome, DriverError> {
        let blocks = scan_library(text)?;
        let convert_block = |block: &PrimitiveBlock| {
            self.convert_primitive(&block.name, block.source(text))
                .map_err(|e| e.offset_lines(block.line - 1))
        };
        let results: Vec<Result<Arc<Conversion>, ConvertError>> = if self.config.parallel {
            blocks.par_iter().map(convert_block).collect()
        } else {
            blocks.iter().map(convert_block).collect()
        };

        if let Some(error) = results
            .iter()
            .find_map(|r| r.as_ref().err())
            .filter(|_| self.fail_fast)
        {
            return Err(DriverError::Conversion {
                file: file.to_string(),
                error: error.clone(),
            });
        }

        let mut rewritten = String::with_capacity(text.len());
        let mut records = Vec::with_capacity(blocks.len());
        let mut copied = 0;
        for (block, result) in blocks.iter().zip(results) {
            rewritten.push_str(&text[copied..block.span.start]);
            match result {
                Ok(conversion) => {
                    rewritten.push_str(conversion.text.trim_end_matches('\n'));
                    records.push(ConversionRecord::converted(file, block.line, &conversion));
                }
                Err(error) => {
                    warn!("{}: {}", file, error);
                    rewritten.push_str(block.source(text));
                    records.push(ConversionRecord::failed(file, &block.name, block.line, &error));
                }
            }
            copied = block.span.end;
        }
        rewritten.push_str(&text[copied..]);

        let outcome = LibraryOutcome {
            text: rewritten,
            records,
        };
        info!(
            "{}: converted {} of {} primitives",
            file,
            outcome.records.len() - outcome.failures(),
            outcome.records.len()
        );
        Ok(outcome)
    }

    /// Convert a library file and write the result to `output`, creating its
    /// parent directories.
    pub fn convert_file<P: AsRef<Path>, Q: AsRef<Path>>(
        &self,
        input: P,
        output: Q,
    ) -> Result<LibraryOutcome, DriverError> {
        let input = input.as_ref();
        let output = output.as_ref();
        let text = fs::read_to_string(input)?;
        let outcome = self.convert_source(&input.display().to_string(), &text)?;

        if let Some(parent) = output.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(output, &outcome.text)?;
        debug!("{} -> {}", input.display(), output.display());
        Ok(outcome)
    }
}
