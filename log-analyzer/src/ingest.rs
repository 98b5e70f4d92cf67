use std::{
    fmt,
    fs::File,
    io::{self, BufRead, BufReader},
    path::{Path, PathBuf},
    thread,
};

use tracing::{debug, info};

use crate::{
    analytics::Aggregate,
    config::AnalyzerConfig,
    error::AnalyzerError,
    parser::{Rejects, process_stream},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    Stdin,
    File(PathBuf),
}

impl From<&Path> for Input {
    fn from(path: &Path) -> Self {
        if path == Path::new("-") {
            Self::Stdin
        } else {
            Self::File(path.to_path_buf())
        }
    }
}

impl fmt::Display for Input {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stdin => f.write_str("<stdin>"),
            Self::File(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Lines of a reader with invalid UTF-8 replaced rather than rejected, so a
/// stray byte costs one line instead of the whole input.
pub struct LossyLines<R> {
    reader: R,
    buf: Vec<u8>,
}

impl<R: BufRead> LossyLines<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            buf: Vec::new(),
        }
    }
}

impl<R: BufRead> Iterator for LossyLines<R> {
    type Item = io::Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        self.buf.clear();
        match self.reader.read_until(b'\n', &mut self.buf) {
            Ok(0) => None,
            Ok(_) => {
                let line = String::from_utf8_lossy(&self.buf);
                Some(Ok(line.trim_end_matches(['\n', '\r']).to_string()))
            }
            Err(e) => Some(Err(e)),
        }
    }
}

#[derive(Debug)]
pub struct Shard {
    pub input: Input,
    pub aggregate: Aggregate,
    pub rejects: Rejects,
}

/// Streams every line of `reader` into a fresh shard. A read error ends the
/// input and is returned; malformed lines never do.
pub fn analyze_reader<R: BufRead>(
    input: Input,
    reader: R,
    config: &AnalyzerConfig,
) -> Result<Shard, AnalyzerError> {
    let mut aggregate = Aggregate::default();
    let mut rejects = Rejects::with_sample_limit(config.reject_samples);
    let mut failure = None;

    let lines = LossyLines::new(reader).map_while(|line| line.map_err(|e| failure = Some(e)).ok());
    let parsed = process_stream(lines, config.grammar, &mut aggregate, &mut rejects).count();

    if let Some(source) = failure {
        return Err(AnalyzerError::Input {
            input: input.to_string(),
            source,
        });
    }
    debug!(%input, parsed, unparsed = rejects.count(), "input finished");
    Ok(Shard {
        input,
        aggregate,
        rejects,
    })
}

pub fn analyze_input(input: Input, config: &AnalyzerConfig) -> Result<Shard, AnalyzerError> {
    info!(%input, grammar = ?config.grammar, "analyzing");
    match &input {
        Input::Stdin => {
            let stdin = io::stdin().lock();
            analyze_reader(input, stdin, config)
        }
        Input::File(path) => {
            let file = File::open(path).map_err(|source| AnalyzerError::Input {
                input: input.to_string(),
                source,
            })?;
            analyze_reader(input, BufReader::new(file), config)
        }
    }
}

/// Analyses each input on its own thread with its own aggregate. Shards come
/// back in input order. Stdin may appear at most once.
pub fn analyze_inputs(
    inputs: Vec<Input>,
    config: &AnalyzerConfig,
) -> Result<Vec<Shard>, AnalyzerError> {
    if inputs.iter().filter(|input| **input == Input::Stdin).count() > 1 {
        return Err(AnalyzerError::RepeatedStdin);
    }
    if inputs.len() <= 1 {
        return inputs
            .into_iter()
            .map(|input| analyze_input(input, config))
            .collect();
    }
    thread::scope(|scope| {
        let handles: Vec<_> = inputs
            .into_iter()
            .map(|input| scope.spawn(move || analyze_input(input, config)))
            .collect();
        handles
            .into_iter()
            .map(|handle| {
                handle
                    .join()
                    .unwrap_or_else(|panic| std::panic::resume_unwind(panic))
            })
            .collect()
    })
}

pub fn merge_shards(shards: &[Shard]) -> Aggregate {
    shards
        .iter()
        .fold(Aggregate::default(), |mut merged, shard| {
            merged.merge(&shard.aggregate);
            merged
        })
}
