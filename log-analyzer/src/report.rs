use std::fmt;

use num_format::{Locale, ToFormattedString};
use serde::Serialize;

use crate::analytics::{Aggregate, suspicious_sources};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReportOptions {
    pub top_n: usize,
    pub threshold: f64,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self {
            top_n: 10,
            threshold: 0.05,
        }
    }
}

pub struct Report<'a> {
    aggregate: &'a Aggregate,
    options: ReportOptions,
}

impl<'a> Report<'a> {
    pub fn new(aggregate: &'a Aggregate, options: ReportOptions) -> Self {
        Self { aggregate, options }
    }
}

fn count(n: u64) -> String {
    n.to_formatted_string(&Locale::en)
}

/// Share of `total` in percent, rounded half away from zero to one decimal.
fn percent(part: u64, total: u64) -> f64 {
    (part as f64 / total as f64 * 1000.0).round() / 10.0
}

impl fmt::Display for Report<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let total = self.aggregate.total();
        let top_n = self.options.top_n;
        writeln!(f, "Total requests: {}", count(total))?;

        writeln!(f)?;
        writeln!(f, "Status codes:")?;
        if total > 0 {
            for (code, n) in self.aggregate.status_counts() {
                writeln!(f, "  {code}: {} ({:.1}%)", count(n), percent(n, total))?;
            }
        }

        writeln!(f)?;
        writeln!(f, "Top {top_n} source addresses:")?;
        for (source, n) in self.aggregate.top_sources(top_n) {
            writeln!(f, "  {source}: {}", count(n))?;
        }

        writeln!(f)?;
        writeln!(f, "Top {top_n} requested paths:")?;
        for (path, n) in self.aggregate.top_paths(top_n) {
            writeln!(f, "  {path}: {}", count(n))?;
        }
        Ok(())
    }
}

pub fn render(aggregate: &Aggregate, options: &ReportOptions) -> String {
    Report::new(aggregate, *options).to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusRow {
    pub code: u16,
    pub count: u64,
    pub percent: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Ranked {
    pub value: String,
    pub count: u64,
}

impl From<(String, u64)> for Ranked {
    fn from((value, count): (String, u64)) -> Self {
        Self { value, count }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub total: u64,
    pub unparsed: u64,
    pub bytes_served: u64,
    pub statuses: Vec<StatusRow>,
    pub top_sources: Vec<Ranked>,
    pub top_paths: Vec<Ranked>,
    pub suspicious_sources: Vec<Ranked>,
}

impl Summary {
    pub fn new(aggregate: &Aggregate, unparsed: u64, options: &ReportOptions) -> Self {
        let total = aggregate.total();
        let statuses = if total == 0 {
            Vec::new()
        } else {
            aggregate
                .status_counts()
                .into_iter()
                .map(|(code, n)| StatusRow {
                    code: code.as_u16(),
                    count: n,
                    percent: percent(n, total),
                })
                .collect()
        };
        Self {
            total,
            unparsed,
            bytes_served: aggregate.bytes_served(),
            statuses,
            top_sources: ranked(aggregate.top_sources(options.top_n)),
            top_paths: ranked(aggregate.top_paths(options.top_n)),
            suspicious_sources: ranked(suspicious_sources(aggregate, options.threshold)),
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

fn ranked(entries: Vec<(String, u64)>) -> Vec<Ranked> {
    entries.into_iter().map(Ranked::from).collect()
}
