use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use derive_getters::Getters;

#[derive(Parser, Debug, Getters)]
#[command(name = "noise-maker")]
#[command(about = "Generate fake access logs for exercising log-analyzer", long_about = None)]
pub struct CliArgs {
    #[arg(long, value_enum, default_value_t = LogFormat::Common)]
    format: LogFormat,

    #[arg(long, default_value_t = 1000)]
    count: usize,

    /// Fixed RNG seed for reproducible output
    #[arg(long)]
    seed: Option<u64>,

    /// Share of lines deliberately truncated so they fail to parse
    #[arg(long, default_value_t = 0.0, value_parser = parse_ratio)]
    malformed_ratio: f64,

    #[arg(long)]
    output: Option<PathBuf>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Common,
    Combined,
    Nginx,
}

fn parse_ratio(value: &str) -> Result<f64, String> {
    let ratio: f64 = value.parse().map_err(|e| format!("{e}"))?;
    if (0.0..=1.0).contains(&ratio) {
        Ok(ratio)
    } else {
        Err(format!("must be between 0 and 1, got {value}"))
    }
}
