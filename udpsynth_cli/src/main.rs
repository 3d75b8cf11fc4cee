//! udpsynth CLI
//!
//! Entry point for the udpsynth command-line tool. Finds the table primitives
//! in Verilog libraries and replaces each one with an equivalent behavioral
//! module.

#[global_allocator]
/// Global allocator using jemalloc for better performance in parallel workloads.
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

mod args;

use clap::Parser;
use tracing::{info, warn};
use udpsynth_driver::{Driver, write_report};

use args::Args;

/// Runs a batch conversion.
///
/// This function:
/// 1. Initializes logging
/// 2. Parses command-line arguments and loads the configuration
/// 3. Converts every input file, writing or printing the result
/// 4. Writes the optional CSV report
/// 5. Fails if any primitive could not be converted
fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_thread_ids(true)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let config = args.to_config()?;
    let driver = Driver::new(config).with_fail_fast(args.fail_fast);
    let files = args.input_files()?;
    info!("Converting {} files", files.len());

    let mut records = Vec::new();
    for file in &files {
        let outcome = match &args.out_dir {
            Some(out_dir) => driver.convert_file(&file.path, out_dir.join(&file.relative))?,
            None => {
                let text = std::fs::read_to_string(&file.path)?;
                let outcome = driver.convert_source(&file.path.display().to_string(), &text)?;
                print!("{}", outcome.text);
                outcome
            }
        };
        records.extend(outcome.records);
    }

    if let Some(report) = &args.report {
        write_report(&records, report)?;
    }

    let failed = records.iter().filter(|r| !r.is_converted()).count();
    info!("Converted {} of {} primitives", records.len() - failed, records.len());
    if failed > 0 {
        warn!("{} primitives were left unconverted", failed);
        return Err(format!("{failed} of {} primitives failed to convert", records.len()).into());
    }
    Ok(())
}
