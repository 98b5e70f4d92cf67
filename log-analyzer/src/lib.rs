//! Access-log analysis: anchored field validation, grammar-driven line
//! parsing, frequency aggregation and plain-text reporting.

pub mod analytics;
pub mod config;
pub mod error;
pub mod ingest;
pub mod invariants;
pub mod models;
pub mod parser;
pub mod patterns;
pub mod report;

pub use analytics::{Aggregate, suspicious_sources};
pub use config::AnalyzerConfig;
pub use error::{AnalyzerError, ConfigError};
pub use models::{Client, LogRecord, Request};
pub use parser::{Grammar, RecordStream, Rejects, parse_line, process_stream};
pub use patterns::{PatternLibrary, Validation, validate};
pub use report::{Report, ReportOptions, Summary, render};
