use std::{fs, path::Path};

use serde::Deserialize;

use crate::{error::ConfigError, parser::Grammar, report::ReportOptions};

const DEFAULT_THRESHOLD: f64 = 0.05;
const DEFAULT_TOP_N: usize = 10;
const DEFAULT_REJECT_SAMPLES: usize = 20;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AnalyzerConfig {
    pub grammar: Grammar,
    /// Share of all parsed requests above which a source is suspicious.
    pub threshold: f64,
    pub top_n: usize,
    pub reject_samples: usize,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            grammar: Grammar::default(),
            threshold: DEFAULT_THRESHOLD,
            top_n: DEFAULT_TOP_N,
            reject_samples: DEFAULT_REJECT_SAMPLES,
        }
    }
}

impl AnalyzerConfig {
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.threshold) {
            return Err(ConfigError::Invalid(format!(
                "threshold must be within 0..=1, got {}",
                self.threshold
            )));
        }
        if self.top_n == 0 {
            return Err(ConfigError::Invalid("top_n must be > 0".into()));
        }
        Ok(())
    }

    pub fn report_options(&self) -> ReportOptions {
        ReportOptions {
            top_n: self.top_n,
            threshold: self.threshold,
        }
    }
}
