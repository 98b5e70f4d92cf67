use std::io::{self, Write};

use chrono::{DateTime, Duration, FixedOffset, Local, TimeZone};
use rand::{Rng, SeedableRng, rngs::StdRng};

use crate::args::LogFormat;
use crate::generator::{generate_log, truncate_line};

#[derive(Debug, Clone, Copy)]
pub struct StreamOptions {
    pub format: LogFormat,
    pub count: usize,
    pub seed: Option<u64>,
    pub malformed_ratio: f64,
}

fn start_time(seed: Option<u64>) -> DateTime<FixedOffset> {
    // Seeded runs start at a fixed instant so output is byte-for-byte stable.
    match seed {
        Some(_) => FixedOffset::east_opt(0)
            .and_then(|utc| utc.with_ymd_and_hms(2023, 10, 10, 13, 55, 36).single())
            .unwrap_or_else(|| Local::now().fixed_offset()),
        None => Local::now().fixed_offset(),
    }
}

pub fn write_log_stream<W: Write>(options: StreamOptions, out: &mut W) -> io::Result<()> {
    let mut rng = match options.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };
    let malformed_ratio = if options.malformed_ratio.is_nan() {
        0.0
    } else {
        options.malformed_ratio.clamp(0.0, 1.0)
    };
    let mut moment = start_time(options.seed);

    for _ in 0..options.count {
        let line = generate_log(&mut rng, options.format, moment);
        let line = if rng.random_bool(malformed_ratio) {
            truncate_line(&mut rng, &line)
        } else {
            line
        };
        writeln!(out, "{line}")?;
        moment += Duration::milliseconds(rng.random_range(0..2000));
    }
    out.flush()
}
