//! Headless runs behind the command-line subcommands.

use std::fs::{self, File};
use std::io::{self, BufRead, Write};
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::info;

use crate::engine::{SoundEngine, SoundSystem};
use crate::errors::RequestError;
use crate::orchestrator::{self, Generation, GenerationRequest};
use crate::render::{self, RenderError};
use crate::transcript_io::{self, Transcript, TranscriptError};
use crate::types::{RepartitionPolicy, TransformationResult, Word};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Aligned columns, colored on a terminal
    #[default]
    Text,
    /// Final forms only, one per line
    Plain,
    /// The table as comma-separated values
    Csv,
    /// An HTML table with change highlighting
    Html,
    /// A transcript that `render` can read back
    Json,
}

#[derive(Debug, Error)]
pub enum BatchError {
    #[error("Failed to access {path:?}: {source}")]
    Io { path: PathBuf, source: io::Error },

    #[error("Failed to write output: {0}")]
    Output(#[source] io::Error),

    #[error(transparent)]
    Request(#[from] RequestError),

    #[error(transparent)]
    Transcript(#[from] TranscriptError),

    #[error(transparent)]
    Render(#[from] RenderError),
}

#[derive(Debug, Clone)]
pub struct WordsArgs {
    pub rules: PathBuf,
    pub numbers: NonZeroUsize,
    pub repartition: RepartitionPolicy,
    pub skip_transformation: bool,
    pub format: OutputFormat,
    pub output: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct SoundsArgs {
    pub rules: PathBuf,
    pub input: Option<PathBuf>,
    pub format: OutputFormat,
    pub output: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct RenderArgs {
    pub rules: PathBuf,
    pub transcript: PathBuf,
    pub format: OutputFormat,
    pub output: Option<PathBuf>,
}

/// Generate words, apply the rules, print the table.
pub fn run_words<E: SoundEngine>(engine: &E, args: &WordsArgs) -> Result<(), BatchError> {
    let rules_source = read_file(&args.rules)?;
    let generation = if args.skip_transformation {
        let mut system = engine.acquire(&rules_source).map_err(RequestError::from)?;
        let words = system
            .generate_words(args.numbers, args.repartition)
            .map_err(RequestError::from)?;
        let result = TransformationResult::untouched(&words);
        let table = orchestrator::tabulate(&*system, &words, &result)?;
        Generation {
            words,
            result,
            table,
        }
    } else {
        let request = GenerationRequest {
            rules_source,
            word_count: args.numbers,
            policy: args.repartition,
        };
        orchestrator::run_request(engine, &request)?
    };
    info!(words = generation.words.len(), "generation finished");
    emit(&generation, args.format, args.output.as_deref())
}

/// Apply the rules to words read one per line.
pub fn run_sounds<E: SoundEngine>(engine: &E, args: &SoundsArgs) -> Result<(), BatchError> {
    let rules_source = read_file(&args.rules)?;
    let words = match &args.input {
        Some(path) => {
            let file = File::open(path).map_err(|source| BatchError::Io {
                path: path.clone(),
                source,
            })?;
            read_words(io::BufReader::new(file)).map_err(|source| BatchError::Io {
                path: path.clone(),
                source,
            })?
        }
        None => read_words(io::stdin().lock()).map_err(|source| BatchError::Io {
            path: PathBuf::from("<stdin>"),
            source,
        })?,
    };
    info!(words = words.len(), "words read");
    let generation = orchestrator::run_on_words(engine, &rules_source, &words)?;
    emit(&generation, args.format, args.output.as_deref())
}

/// Rebuild the table of a saved transcript. The rules are only used for IPA.
pub fn run_render<E: SoundEngine>(engine: &E, args: &RenderArgs) -> Result<(), BatchError> {
    let rules_source = read_file(&args.rules)?;
    let transcript = transcript_io::load_transcript(&args.transcript)?;
    let system = engine.acquire(&rules_source).map_err(RequestError::from)?;
    let table = orchestrator::tabulate(&*system, &transcript.words, &transcript.result)?;
    drop(system);
    let generation = Generation {
        words: transcript.words,
        result: transcript.result,
        table,
    };
    emit(&generation, args.format, args.output.as_deref())
}

/// Blank lines are skipped; surrounding whitespace is trimmed.
pub fn read_words<R: BufRead>(reader: R) -> io::Result<Vec<Word>> {
    let mut words = Vec::new();
    for line in reader.lines() {
        let line = line?;
        let word = line.trim();
        if !word.is_empty() {
            words.push(word.to_string());
        }
    }
    Ok(words)
}

pub fn format_generation(generation: &Generation, format: OutputFormat) -> Result<String, BatchError> {
    match format {
        OutputFormat::Text => Ok(render::to_text(&generation.table)),
        OutputFormat::Plain => Ok(render::to_plain(&generation.result.output)),
        OutputFormat::Csv => Ok(render::to_csv(&generation.table)?),
        OutputFormat::Html => Ok(render::to_html(&generation.table)),
        OutputFormat::Json => {
            let transcript = Transcript {
                words: generation.words.clone(),
                result: generation.result.clone(),
            };
            let mut json = transcript_io::to_json(&transcript)?;
            json.push('\n');
            Ok(json)
        }
    }
}

fn emit(generation: &Generation, format: OutputFormat, output: Option<&Path>) -> Result<(), BatchError> {
    if format == OutputFormat::Text && output.is_none() {
        return render::to_table(&generation.table)
            .print_tty(false)
            .map(|_| ())
            .map_err(BatchError::Output);
    }
    let rendered = format_generation(generation, format)?;
    match output {
        Some(path) => {
            fs::write(path, rendered).map_err(|source| BatchError::Io {
                path: path.to_path_buf(),
                source,
            })?;
            info!("Wrote into: {}", path.display());
            Ok(())
        }
        None => io::stdout()
            .lock()
            .write_all(rendered.as_bytes())
            .map_err(BatchError::Output),
    }
}

fn read_file(path: &Path) -> Result<String, BatchError> {
    fs::read_to_string(path).map_err(|source| BatchError::Io {
        path: path.to_path_buf(),
        source,
    })
}
