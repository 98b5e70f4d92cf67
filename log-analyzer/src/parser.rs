use std::{
    iter::{Enumerate, FusedIterator},
    sync::LazyLock,
};

use clap::ValueEnum;
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    analytics::Aggregate,
    models::{Client, LogRecord, Request},
};

const DEFAULT_REJECT_SAMPLES: usize = 20;

// host ident authuser [date] "request" status bytes
// 127.0.0.1 - frank [10/Oct/2000:13:55:36 -0700] "GET /apache_pb.gif HTTP/1.0" 200 2326
const APACHE_HEAD: &str = concat!(
    r"^(?P<source>\S+) (?P<ident>\S+) (?P<user>\S+) \[(?P<timestamp>[^\]]+)\] ",
    r#""(?P<method>[^"\s]+) (?P<path>[^"\s]+) (?P<protocol>[^"\s]+)" "#,
    r"(?P<status>\S+) (?P<size>\S+)",
);

const CLIENT_TAIL: &str = r#" "(?P<referrer>[^"]*)" "(?P<agent>[^"]*)"$"#;

// $remote_addr - $remote_user [$time_local] "$request" $status $body_bytes_sent "$http_referer" "$http_user_agent"
const NGINX_PATTERN: &str = concat!(
    r"^(?P<source>\S+) - (?P<user>\S+) \[(?P<timestamp>[^\]]+)\] ",
    r#""(?P<method>[^"\s]+) (?P<path>[^"\s]+) (?P<protocol>[^"\s]+)" "#,
    r"(?P<status>\S+) (?P<size>[0-9]+)",
    r#" "(?P<referrer>[^"]*)" "(?P<agent>[^"]*)"$"#,
);

static COMMON: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&format!("{APACHE_HEAD}$")).expect("common grammar compiles"));
static COMBINED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!("{APACHE_HEAD}{CLIENT_TAIL}")).expect("combined grammar compiles")
});
static NGINX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(NGINX_PATTERN).expect("nginx grammar compiles"));

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, ValueEnum, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Grammar {
    /// Apache/NCSA common log format.
    #[default]
    Common,
    /// Common format followed by quoted referrer and user-agent.
    Combined,
    /// nginx default `combined` log_format.
    Nginx,
}

impl Grammar {
    fn pattern(self) -> &'static Regex {
        match self {
            Self::Common => &COMMON,
            Self::Combined => &COMBINED,
            Self::Nginx => &NGINX,
        }
    }
}

/// Parses one line under `grammar`. The whole line must conform; anything
/// else is `None`. A trailing line terminator is ignored.
pub fn parse_line(line: &str, grammar: Grammar) -> Option<LogRecord> {
    let line = line.trim_end_matches(['\n', '\r']);
    let caps = grammar.pattern().captures(line)?;
    let request = request_from(&caps);
    Some(match grammar {
        Grammar::Common => LogRecord::Common(request),
        Grammar::Combined => LogRecord::Combined {
            request,
            client: client_from(&caps),
        },
        Grammar::Nginx => LogRecord::Nginx {
            request,
            client: client_from(&caps),
        },
    })
}

fn field<'h>(caps: &Captures<'h>, name: &str) -> &'h str {
    caps.name(name).map_or("", |m| m.as_str())
}

fn unless_dash(value: &str) -> Option<String> {
    (value != "-").then(|| value.to_string())
}

fn request_from(caps: &Captures<'_>) -> Request {
    Request {
        source: field(caps, "source").into(),
        user: unless_dash(field(caps, "user")),
        timestamp: field(caps, "timestamp").to_string(),
        method: field(caps, "method").to_string(),
        path: field(caps, "path").into(),
        protocol: field(caps, "protocol").to_string(),
        status: field(caps, "status").parse().ok(),
        size: field(caps, "size").parse().ok(),
    }
}

fn client_from(caps: &Captures<'_>) -> Client {
    Client {
        referrer: unless_dash(field(caps, "referrer")),
        user_agent: field(caps, "agent").to_string(),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rejects {
    count: u64,
    line_numbers: Vec<usize>,
    sample_limit: usize,
}

impl Default for Rejects {
    fn default() -> Self {
        Self::with_sample_limit(DEFAULT_REJECT_SAMPLES)
    }
}

impl Rejects {
    /// Keeps the line numbers of at most `sample_limit` rejected lines.
    pub fn with_sample_limit(sample_limit: usize) -> Self {
        Self {
            count: 0,
            line_numbers: Vec::new(),
            sample_limit,
        }
    }

    pub fn record(&mut self, line_number: usize) {
        self.count += 1;
        if self.line_numbers.len() < self.sample_limit {
            self.line_numbers.push(line_number);
        }
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn line_numbers(&self) -> &[usize] {
        &self.line_numbers
    }
}

/// Lazy, single-pass sequence of parsed records.
///
/// Statistics accumulate as a side effect of consumption: every record is
/// folded into the aggregate just before it is yielded, and every rejected
/// line is recorded in the caller's [`Rejects`]. Dropping the stream early
/// leaves both reflecting only the lines consumed so far.
pub struct RecordStream<'a, I> {
    lines: Enumerate<I>,
    grammar: Grammar,
    aggregate: &'a mut Aggregate,
    rejects: &'a mut Rejects,
}

impl<I, S> Iterator for RecordStream<'_, I>
where
    I: Iterator<Item = S>,
    S: AsRef<str>,
{
    type Item = LogRecord;

    fn next(&mut self) -> Option<Self::Item> {
        for (index, line) in self.lines.by_ref() {
            match parse_line(line.as_ref(), self.grammar) {
                Some(record) => {
                    self.aggregate.record(&record);
                    return Some(record);
                }
                None => {
                    let line_number = index + 1;
                    debug!(line_number, grammar = ?self.grammar, "skipping unparsed line");
                    self.rejects.record(line_number);
                }
            }
        }
        None
    }
}

impl<I, S> FusedIterator for RecordStream<'_, I>
where
    I: FusedIterator<Item = S>,
    S: AsRef<str>,
{
}

pub fn process_stream<'a, I, S>(
    lines: I,
    grammar: Grammar,
    aggregate: &'a mut Aggregate,
    rejects: &'a mut Rejects,
) -> RecordStream<'a, I::IntoIter>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    RecordStream {
        lines: lines.into_iter().enumerate(),
        grammar,
        aggregate,
        rejects,
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::invariants::ResponseSize;
    use asserting::prelude::*;
    use chrono::{FixedOffset, TimeZone};

    const COMMON_LINE: &str =
        r#"127.0.0.1 - - [10/Oct/2023:13:55:36 +0000] "GET /index.html HTTP/1.1" 200 2326"#;
    const COMBINED_LINE: &str = r#"10.1.2.3 - frank [10/Oct/2023:13:55:36 -0700] "POST /login HTTP/1.1" 302 - "https://example.com/" "Mozilla/5.0 (X11; Linux x86_64)""#;
    const NGINX_SAMPLE: &str = r#"192.168.1.1 - - [08/Feb/2024:10:30:00 +0000] "GET /api/users HTTP/2.0" 200 1234 "-" "curl/8.5.0""#;

    #[test]
    fn parse_common_line() {
        let record = parse_line(COMMON_LINE, Grammar::Common).expect("common line parses");
        let request = record.request();
        assert_eq!(request.source.as_str(), "127.0.0.1");
        assert_eq!(request.method, "GET");
        assert_eq!(request.path.as_str(), "/index.html");
        assert_eq!(request.protocol, "HTTP/1.1");
        assert_eq!(request.status.map(|s| s.as_u16()), Some(200));
        assert_eq!(request.size, Some(ResponseSize::Bytes(2326)));
        assert_eq!(request.user, None);
        assert_that!(record.client().is_none()).is_true();
        assert_that!(record.grammar()).is_equal_to(Grammar::Common);
    }

    #[test]
    fn parse_combined_line() {
        let record = parse_line(COMBINED_LINE, Grammar::Combined).expect("combined line parses");
        let request = record.request();
        assert_eq!(request.user.as_deref(), Some("frank"));
        assert_eq!(request.status.map(|s| s.as_u16()), Some(302));
        assert_eq!(request.size, Some(ResponseSize::Unknown));
        let client = record.client().expect("combined carries client fields");
        assert_eq!(client.referrer.as_deref(), Some("https://example.com/"));
        assert_eq!(client.user_agent, "Mozilla/5.0 (X11; Linux x86_64)");
    }

    #[test]
    fn parse_nginx_line() {
        let record = parse_line(NGINX_SAMPLE, Grammar::Nginx).expect("nginx line parses");
        assert!(matches!(record, LogRecord::Nginx { .. }));
        let client = record.client().expect("nginx carries client fields");
        assert_eq!(client.referrer, None);
        assert_eq!(client.user_agent, "curl/8.5.0");
        assert_eq!(record.request().protocol, "HTTP/2.0");
    }

    #[test]
    fn nginx_requires_numeric_size() {
        let line = NGINX_SAMPLE.replace(" 1234 ", " - ");
        assert_that!(parse_line(&line, Grammar::Nginx)).is_none();
        assert_that!(parse_line(&line, Grammar::Combined)).is_some();
    }

    #[test]
    fn whole_line_must_match() {
        // Trailing client fields are not part of the common grammar.
        assert_that!(parse_line(COMBINED_LINE, Grammar::Common)).is_none();
        assert_that!(parse_line(COMMON_LINE, Grammar::Combined)).is_none();
        assert_that!(parse_line(&COMMON_LINE[..40], Grammar::Common)).is_none();
        assert_that!(parse_line(&format!("junk {COMMON_LINE}"), Grammar::Common)).is_none();
        assert_that!(parse_line("", Grammar::Common)).is_none();
    }

    #[test]
    fn line_terminators_are_ignored() {
        assert_that!(parse_line(&format!("{COMMON_LINE}\r\n"), Grammar::Common)).is_some();
    }

    #[test]
    fn garbled_numbers_are_absent() {
        let line = COMMON_LINE.replace(" 200 2326", " 20x lots");
        let record = parse_line(&line, Grammar::Common).expect("shape still matches");
        assert_eq!(record.request().status, None);
        assert_eq!(record.request().size, None);
    }

    #[test]
    fn timestamp_parses_with_offset() {
        let record = parse_line(COMBINED_LINE, Grammar::Combined).expect("combined line parses");
        let expected = FixedOffset::west_opt(7 * 3600)
            .unwrap()
            .with_ymd_and_hms(2023, 10, 10, 13, 55, 36)
            .unwrap();
        assert_eq!(record.request().time(), Some(expected));
    }

    #[test]
    fn stream_counts_rejects_by_line_number() {
        let lines = [COMMON_LINE, "not a log line", COMMON_LINE, ""];
        let mut aggregate = Aggregate::default();
        let mut rejects = Rejects::default();
        let records: Vec<_> =
            process_stream(lines, Grammar::Common, &mut aggregate, &mut rejects).collect();

        assert_eq!(records.len(), 2);
        assert_eq!(aggregate.total(), 2);
        assert_eq!(rejects.count(), 2);
        assert_eq!(rejects.line_numbers(), &[2, 4]);
    }

    #[test]
    fn stream_accumulates_only_what_is_consumed() {
        let lines = vec![COMMON_LINE.to_string(); 5];
        let mut aggregate = Aggregate::default();
        let mut rejects = Rejects::default();
        let taken = process_stream(&lines, Grammar::Common, &mut aggregate, &mut rejects)
            .take(2)
            .count();

        assert_eq!(taken, 2);
        assert_eq!(aggregate.total(), 2);
    }

    #[test]
    fn reject_samples_are_capped() {
        let mut rejects = Rejects::with_sample_limit(2);
        for n in 1..=5 {
            rejects.record(n);
        }
        assert_eq!(rejects.count(), 5);
        assert_eq!(rejects.line_numbers(), &[1, 2]);
    }
}
