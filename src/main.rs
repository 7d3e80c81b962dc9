// src/main.rs
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Command-line entry point: `--produce` writes the data set, `--verify` checks it

use std::process::ExitCode;
use std::time::Instant;

use anyhow::Context;
use clap::Parser;

use blr_datagen::constants::*;
use blr_datagen::{
    Cancellation, ConfigError, ProduceError, Producer, RunConfig, Verifier, VerifyError,
};

const EXIT_VERIFY_FAILED: u8 = 1;
const EXIT_INVALID_VALUE: u8 = 2;
const EXIT_BAD_PATH: u8 = 3;
const EXIT_WRITE_FAILED: u8 = 4;
const EXIT_INTERRUPTED: u8 = 130;

#[derive(Parser, Debug)]
#[command(name = "blr-datagen")]
#[command(about = "Generate deterministic data files at a controlled write rate, or verify them")]
struct Cli {
    /// Write the data set
    #[arg(long)]
    produce: bool,
    /// Verify a previously written data set
    #[arg(long)]
    verify: bool,
    /// Path to read/write files to/from (empty means the current directory)
    #[arg(long, default_value = "")]
    path: String,
    /// Number of file writers to use in parallel
    #[arg(long = "num_writers", default_value_t = DEFAULT_NUM_WRITERS)]
    num_writers: usize,
    /// Total data size in GB
    #[arg(long = "data_size", default_value_t = DEFAULT_DATA_SIZE_GB)]
    data_size: f64,
    /// File size in MB
    #[arg(long = "max_file_size", default_value_t = DEFAULT_MAX_FILE_SIZE_MB)]
    max_file_size: u64,
    /// Aggregate file write speed in MB/s
    #[arg(long = "write_speed", default_value_t = DEFAULT_WRITE_SPEED_MBPS)]
    write_speed: f64,
    /// Seed for the generated content
    #[arg(long, default_value_t = DEFAULT_SEED)]
    seed: u64,
}

fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();
    let start = Instant::now();

    let config = match RunConfig::new(
        cli.path,
        cli.data_size,
        cli.max_file_size,
        cli.write_speed,
        cli.num_writers,
        cli.seed,
    )
    .and_then(|config| config.check_path().map(|()| config))
    {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("{}", e);
            return ExitCode::from(config_exit_code(&e));
        }
    };

    let code = if cli.produce {
        produce(config)
    } else if cli.verify {
        verify(config)
    } else {
        tracing::warn!("Neither --produce nor --verify given, nothing to do");
        Ok(())
    };

    if let Err(e) = code {
        tracing::error!("{:#}", e);
        return ExitCode::from(run_exit_code(&e));
    }

    println!("Time elapsed: {}", start.elapsed().as_secs_f64());
    ExitCode::SUCCESS
}

fn produce(config: RunConfig) -> anyhow::Result<()> {
    let cancel = Cancellation::new();
    let handler_cancel = cancel.clone();
    if let Err(e) = ctrlc::set_handler(move || {
        // A second interrupt does not wait for writers to wind down
        if handler_cancel.is_cancelled() {
            std::process::exit(i32::from(EXIT_INTERRUPTED));
        }
        tracing::warn!("Interrupt received, stopping writers");
        handler_cancel.cancel();
    }) {
        tracing::warn!("Failed to install interrupt handler: {}", e);
    }

    let report = Producer::new(config)
        .with_cancellation(cancel)
        .run()
        .context("production failed")?;

    println!(
        "The average write speed achieved was {} GB/s ({:.3} MB/s)",
        report.throughput_gbps(),
        report.throughput_mbps()
    );
    Ok(())
}

fn verify(config: RunConfig) -> anyhow::Result<()> {
    let report = Verifier::new(config).run().context("verification failed")?;
    tracing::debug!("{} files verified", report.files_checked);
    println!("All files' checksum has been verified");
    Ok(())
}

fn config_exit_code(e: &ConfigError) -> u8 {
    if e.is_path_error() {
        EXIT_BAD_PATH
    } else {
        EXIT_INVALID_VALUE
    }
}

fn run_exit_code(e: &anyhow::Error) -> u8 {
    if e.downcast_ref::<VerifyError>().is_some() {
        return EXIT_VERIFY_FAILED;
    }
    match e.downcast_ref::<ProduceError>() {
        Some(ProduceError::Interrupted) => EXIT_INTERRUPTED,
        Some(ProduceError::Config(e)) => config_exit_code(e),
        _ => EXIT_WRITE_FAILED,
    }
}
