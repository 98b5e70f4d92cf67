use std::{io, path::PathBuf};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("malformed config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Error)]
pub enum AnalyzerError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("cannot read {input}: {source}")]
    Input {
        input: String,
        #[source]
        source: io::Error,
    },
    #[error("stdin can be listed as an input only once")]
    RepeatedStdin,
    #[error("cannot write report to {path}: {source}")]
    Output {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("cannot write report: {0}")]
    Stdout(#[source] io::Error),
    #[error("cannot encode summary: {0}")]
    Json(#[from] serde_json::Error),
}
