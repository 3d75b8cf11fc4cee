use std::fs;
use std::path::{Path, PathBuf};

use clap::Parser;
use udpsynth_common::{Config, OverlapPolicy};
use udpsynth_driver::DriverError;
use walkdir::WalkDir;

/// udpsynth - Convert table primitives to behavioral Verilog
#[derive(Parser, Debug)]
#[command(name = "udpsynth")]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Library files, or directories to search for them
    #[arg(required = true)]
    pub inputs: Vec<PathBuf>,

    /// Write converted files here, mirroring directory inputs; print to
    /// stdout when absent
    #[arg(short = 'o', long)]
    pub out_dir: Option<PathBuf>,

    /// JSON configuration file; flags below override it
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Write a CSV record of every primitive here
    #[arg(long)]
    pub report: Option<PathBuf>,

    /// Reject overlapping sequential rows even when they agree
    #[arg(long, default_value_t = false)]
    pub strict_overlap: bool,
    /// Keep state-preserving rows as explicit branches
    #[arg(long, default_value_t = false)]
    pub no_reduce: bool,
    /// Omit row and header comments from generated modules
    #[arg(long, default_value_t = false)]
    pub no_comments: bool,
    /// Convert the primitives of a file one at a time
    #[arg(long, default_value_t = false)]
    pub no_parallel: bool,
    /// Stop at the first primitive that fails to convert
    #[arg(long, default_value_t = false)]
    pub fail_fast: bool,

    /// File extension searched for in directory inputs
    #[arg(long, default_value = "v")]
    pub extension: String,
}

/// One file to convert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputFile {
    /// Where to read it.
    pub path: PathBuf,
    /// Output path relative to the output directory.
    pub relative: PathBuf,
}

impl Args {
    /// Convert command-line arguments into internal configuration
    pub fn to_config(&self) -> Result<Config, DriverError> {
        let mut config = match &self.config {
            Some(path) => Config::from_json_str(&fs::read_to_string(path)?)?,
            None => Config::default(),
        };
        if self.strict_overlap {
            config.synth.overlap = OverlapPolicy::RejectAny;
        }
        if self.no_reduce {
            config.synth.reduce = false;
        }
        if self.no_comments {
            config.emit.row_comments = false;
            config.emit.header_comment = false;
        }
        if self.no_parallel {
            config.parallel = false;
        }
        Ok(config)
    }

    /// Expand directory inputs into the matching files below them, sorted
    /// by path.
    pub fn input_files(&self) -> Result<Vec<InputFile>, walkdir::Error> {
        let mut files = Vec::new();
        for input in &self.inputs {
            if !input.is_dir() {
                let relative = input.file_name().map_or_else(|| input.clone(), PathBuf::from);
                files.push(InputFile {
                    path: input.clone(),
                    relative,
                });
                continue;
            }
            for entry in WalkDir::new(input).sort_by_file_name() {
                let entry = entry?;
                if entry.file_type().is_file() && self.has_extension(entry.path()) {
                    let relative = entry
                        .path()
                        .strip_prefix(input)
                        .map_or_else(|_| entry.path().to_path_buf(), Path::to_path_buf);
                    files.push(InputFile {
                        path: entry.path().to_path_buf(),
                        relative,
                    });
                }
            }
        }
        Ok(files)
    }

    fn has_extension(&self, path: &Path) -> bool {
        path.extension()
            .is_some_and(|ext| ext.to_string_lossy() == self.extension.trim_start_matches('.'))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_flags_override_config_file() {
        let tmp = tempdir().unwrap();
        let config_path = tmp.path().join("config.json");
        fs::write(&config_path, r#"{ "synth": { "reduce": true }, "emit": { "indent": 4 } }"#).unwrap();

        let args = Args::try_parse_from([
            "udpsynth",
            "cells.v",
            "--config",
            config_path.to_str().unwrap(),
            "--no-reduce",
            "--strict-overlap",
            "--no-comments",
        ])
        .unwrap();
        let config = args.to_config().unwrap();
        assert!(!config.synth.reduce);
        assert_eq!(config.synth.overlap, OverlapPolicy::RejectAny);
        assert_eq!(config.emit.indent, 4);
        assert!(!config.emit.row_comments);
        assert!(config.parallel);
    }

    #[test]
    fn test_directory_inputs_are_filtered_and_sorted() {
        let tmp = tempdir().unwrap();
        fs::create_dir_all(tmp.path().join("lib/sub")).unwrap();
        fs::write(tmp.path().join("lib/b.v"), "").unwrap();
        fs::write(tmp.path().join("lib/a.v"), "").unwrap();
        fs::write(tmp.path().join("lib/notes.txt"), "").unwrap();
        fs::write(tmp.path().join("lib/sub/c.v"), "").unwrap();

        let dir = tmp.path().join("lib");
        let args = Args::try_parse_from(["udpsynth", dir.to_str().unwrap()]).unwrap();
        let relative: Vec<PathBuf> = args.input_files().unwrap().into_iter().map(|f| f.relative).collect();
        assert_eq!(
            relative,
            [PathBuf::from("a.v"), PathBuf::from("b.v"), PathBuf::from("sub/c.v")]
        );
    }

    #[test]
    fn test_inputs_are_required() {
        assert!(Args::try_parse_from(["udpsynth"]).is_err());
    }
}
