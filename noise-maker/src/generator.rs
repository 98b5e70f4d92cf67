use chrono::{DateTime, FixedOffset};
use rand::{Rng, seq::IndexedRandom};

use crate::args::LogFormat;

const METHODS: [(&str, u8); 4] = [("GET", 6), ("POST", 2), ("PUT", 1), ("DELETE", 1)];
const PATHS: [(&str, u8); 7] = [
    ("/", 10),
    ("/index.html", 20),
    ("/login", 10),
    ("/api/users", 50),
    ("/admin", 5),
    ("/static/app.js", 20),
    ("/favicon.ico", 10),
];
const STATUS: [(u16, u8); 7] = [
    (200, 60),
    (201, 5),
    (301, 5),
    (304, 10),
    (403, 5),
    (404, 15),
    (500, 2),
];
const REFERRERS: [(&str, u8); 3] = [
    ("-", 10),
    ("https://example.com/", 5),
    ("https://www.google.com/", 3),
];
const AGENTS: [(&str, u8); 4] = [
    ("Mozilla/5.0 (X11; Linux x86_64; rv:128.0) Gecko/20100101 Firefox/128.0", 10),
    ("Mozilla/5.0 (Macintosh; Intel Mac OS X 14_5) AppleWebKit/605.1.15", 8),
    ("curl/8.5.0", 3),
    ("Googlebot/2.1 (+http://www.google.com/bot.html)", 2),
];
const TIMESTAMP_FORMAT: &str = "%d/%b/%Y:%H:%M:%S %z";

fn pick<T: Copy, R: Rng + ?Sized>(rng: &mut R, table: &[(T, u8)]) -> T {
    table
        .choose_weighted(rng, |(_, w)| *w)
        .map(|(value, _)| *value)
        .unwrap_or(table[0].0)
}

fn request_line<R: Rng + ?Sized>(rng: &mut R, moment: DateTime<FixedOffset>) -> (String, String) {
    let ip = format!(
        "192.168.{}.{}",
        rng.random_range(0..4),
        rng.random_range(1..255)
    );
    let timestamp = moment.format(TIMESTAMP_FORMAT);
    let method = pick(rng, &METHODS);
    let path = pick(rng, &PATHS);
    (ip, format!("[{timestamp}] \"{method} {path} HTTP/1.1\""))
}

pub fn generate_common_log<R: Rng + ?Sized>(rng: &mut R, moment: DateTime<FixedOffset>) -> String {
    let (ip, request) = request_line(rng, moment);
    let status = pick(rng, &STATUS);
    let size = rng.random_range(100..5000);
    format!("{ip} - - {request} {status} {size}")
}

pub fn generate_combined_log<R: Rng + ?Sized>(
    rng: &mut R,
    moment: DateTime<FixedOffset>,
) -> String {
    let (ip, request) = request_line(rng, moment);
    let user = if rng.random_bool(0.1) { "frank" } else { "-" };
    let status = pick(rng, &STATUS);
    let size = if rng.random_bool(0.05) {
        "-".to_string()
    } else {
        rng.random_range(100..5000).to_string()
    };
    let referrer = pick(rng, &REFERRERS);
    let agent = pick(rng, &AGENTS);
    format!("{ip} - {user} {request} {status} {size} \"{referrer}\" \"{agent}\"")
}

pub fn generate_nginx_log<R: Rng + ?Sized>(rng: &mut R, moment: DateTime<FixedOffset>) -> String {
    let (ip, request) = request_line(rng, moment);
    let status = pick(rng, &STATUS);
    let size = rng.random_range(0..5000);
    let referrer = pick(rng, &REFERRERS);
    let agent = pick(rng, &AGENTS);
    format!("{ip} - - {request} {status} {size} \"{referrer}\" \"{agent}\"")
}

pub fn generate_log<R: Rng + ?Sized>(
    rng: &mut R,
    format: LogFormat,
    moment: DateTime<FixedOffset>,
) -> String {
    match format {
        LogFormat::Common => generate_common_log(rng, moment),
        LogFormat::Combined => generate_combined_log(rng, moment),
        LogFormat::Nginx => generate_nginx_log(rng, moment),
    }
}

/// Cuts a well-formed line short so no grammar accepts it.
pub fn truncate_line<R: Rng + ?Sized>(rng: &mut R, line: &str) -> String {
    let cut = line.find('"').unwrap_or(line.len());
    line[..rng.random_range(0..cut.max(1))].to_string()
}
