mod args;
mod generator;
mod stream;

use std::{
    fs::File,
    io::{self, BufWriter},
};

use args::CliArgs;
use clap::Parser;
use stream::{StreamOptions, write_log_stream};

fn main() -> io::Result<()> {
    let args = CliArgs::parse();
    let options = StreamOptions {
        format: *args.format(),
        count: *args.count(),
        seed: *args.seed(),
        malformed_ratio: *args.malformed_ratio(),
    };

    match args.output() {
        Some(path) => write_log_stream(options, &mut BufWriter::new(File::create(path)?)),
        None => write_log_stream(options, &mut BufWriter::new(io::stdout().lock())),
    }
}
