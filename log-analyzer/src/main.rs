use std::{
    fs,
    io::{self, Write},
    path::{Path, PathBuf},
    process::ExitCode,
};

use clap::{Parser, Subcommand, ValueEnum};
use log_analyzer::{
    AnalyzerConfig, AnalyzerError, ConfigError, Grammar, PatternLibrary, Summary,
    ingest::{Input, analyze_inputs, merge_shards},
    render, suspicious_sources,
};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Parse access logs and print a traffic report
    Analyze(AnalyzeArgs),
    /// Check that a whole value conforms to a field rule
    Validate { field: String, value: String },
    /// Print every occurrence of a field rule inside some text
    Extract { field: String, text: String },
    /// List the known field rules
    Fields,
}

#[derive(clap::Args, Debug)]
struct AnalyzeArgs {
    /// Log files; none or `-` reads stdin
    inputs: Vec<PathBuf>,

    #[arg(long, value_enum)]
    grammar: Option<Grammar>,

    /// Share of requests above which a source is flagged
    #[arg(long)]
    threshold: Option<f64>,

    /// Rows per top-N section
    #[arg(long)]
    top: Option<usize>,

    /// TOML file with defaults; flags override it
    #[arg(long)]
    config: Option<PathBuf>,

    /// Write the report here instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    output_format: OutputFormat,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

impl AnalyzeArgs {
    fn config(&self) -> Result<AnalyzerConfig, ConfigError> {
        let mut config = match &self.config {
            Some(path) => AnalyzerConfig::load(path)?,
            None => AnalyzerConfig::default(),
        };
        if let Some(grammar) = self.grammar {
            config.grammar = grammar;
        }
        if let Some(threshold) = self.threshold {
            config.threshold = threshold;
        }
        if let Some(top) = self.top {
            config.top_n = top;
        }
        config.validate()?;
        Ok(config)
    }

    fn inputs(&self) -> Vec<Input> {
        if self.inputs.is_empty() {
            return vec![Input::Stdin];
        }
        self.inputs.iter().map(|p| Input::from(p.as_path())).collect()
    }
}

fn main() -> ExitCode {
    init_tracing();
    let args = Args::parse();
    let outcome = match args.command {
        Command::Analyze(args) => analyze(&args),
        Command::Validate { field, value } => validate(&field, &value),
        Command::Extract { field, text } => extract(&field, &text),
        Command::Fields => fields(),
    };
    outcome.unwrap_or_else(|e| {
        error!("{e}");
        ExitCode::FAILURE
    })
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn analyze(args: &AnalyzeArgs) -> Result<ExitCode, AnalyzerError> {
    let config = args.config()?;
    let shards = analyze_inputs(args.inputs(), &config)?;

    for shard in &shards {
        if shard.rejects.count() > 0 {
            info!(
                input = %shard.input,
                unparsed = shard.rejects.count(),
                first_lines = ?shard.rejects.line_numbers(),
                "skipped lines that did not match the grammar"
            );
        }
    }
    let aggregate = merge_shards(&shards);
    let unparsed: u64 = shards.iter().map(|shard| shard.rejects.count()).sum();
    let options = config.report_options();

    for (source, count) in suspicious_sources(&aggregate, options.threshold) {
        let share = count as f64 / aggregate.total() as f64;
        warn!(%source, count, share = %format!("{:.1}%", share * 100.0), "suspicious source");
    }

    let body = match args.output_format {
        OutputFormat::Text => render(&aggregate, &options),
        OutputFormat::Json => {
            let mut json = Summary::new(&aggregate, unparsed, &options).to_json()?;
            json.push('\n');
            json
        }
    };
    write_output(args.output.as_deref(), &body)?;
    Ok(ExitCode::SUCCESS)
}

fn write_output(path: Option<&Path>, body: &str) -> Result<(), AnalyzerError> {
    match path {
        Some(path) => fs::write(path, body).map_err(|source| AnalyzerError::Output {
            path: path.to_path_buf(),
            source,
        }),
        None => io::stdout()
            .lock()
            .write_all(body.as_bytes())
            .map_err(AnalyzerError::Stdout),
    }
}

fn validate(field: &str, value: &str) -> Result<ExitCode, AnalyzerError> {
    let validation = PatternLibrary::standard().validate(field, value);
    write_output(None, &format!("{validation}\n"))?;
    Ok(if validation.is_valid() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn extract(field: &str, text: &str) -> Result<ExitCode, AnalyzerError> {
    let Some(found) = PatternLibrary::standard().extract(field, text) else {
        warn!(field, "unknown field type");
        return Ok(ExitCode::FAILURE);
    };
    let body: String = found.iter().map(|m| format!("{m}\n")).collect();
    write_output(None, &body)?;
    Ok(ExitCode::SUCCESS)
}

fn fields() -> Result<ExitCode, AnalyzerError> {
    let body: String = PatternLibrary::standard()
        .fields()
        .map(|name| format!("{name}\n"))
        .collect();
    write_output(None, &body)?;
    Ok(ExitCode::SUCCESS)
}
