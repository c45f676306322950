//! # unilog - Operator Entry Point
//!
//! Applies configuration commands to the process-wide log system, emits
//! synthetic messages through it and optionally prints the resulting
//! configuration. Useful to try out selections, decorators and rotation
//! settings before putting them into a program.
//!
//! ## Order of operations
//!
//! 1. **Initialize diagnostics**: `tracing` for the subsystem's own warnings
//! 2. **Register tag-sets**: every tag combination named by `--emit`
//! 3. **Configure**: the options file, then each `-x` command
//! 4. **Emit**: the `--emit` messages, `--repeat` times
//! 5. **Rotate / describe**, then flush and stop the async writer

use anyhow::{Context, Result};
use clap::Parser;
use std::fs;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;
use unilog::{cli::Args, diagnostics::ColorizedFormatter, LogOptions, LogSystem, Tag};

fn main() -> Result<()> {
    let args = Args::parse();

    // RUST_LOG controls the subsystem's own diagnostics, e.g. RUST_LOG=unilog=debug
    let filter = if args.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env()
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .event_format(ColorizedFormatter)
        .init();

    debug!("Configuration: {:?}", args);

    let system = LogSystem::global();
    let configuration = system.configuration();

    let manifest: Vec<&[Tag]> = args.emit.iter().map(|e| e.tags.as_slice()).collect();
    configuration.register_tag_sets(&manifest)?;

    if let Some(path) = &args.options_file {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read options file {:?}", path))?;
        let options = LogOptions::from_json(&text)
            .with_context(|| format!("Failed to parse options file {:?}", path))?;
        system.apply_options(&options)?;
    }

    for command in &args.commands {
        configuration
            .parse_command(command)
            .with_context(|| format!("Invalid log configuration '{}'", command))?;
    }

    if let Some(async_config) = args.async_config() {
        system.enable_async(&async_config)?;
    }

    for _ in 0..args.repeat {
        for emit in &args.emit {
            system.logger(&emit.tags)?.log(emit.level, &emit.message);
        }
    }

    if args.rotate {
        info!("Rotating all file outputs");
        configuration.rotate_all_outputs();
    }

    // Stops the drain thread after writing out the queue; no-op in sync mode.
    system.disable_async();

    if args.describe {
        print!("{}", configuration.describe());
    }

    Ok(())
}
