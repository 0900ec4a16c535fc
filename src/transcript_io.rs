use serde::Serialize;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::engine::wire;
use crate::errors::EngineError;
use crate::types::{TransformationResult, Word};

/// The generated words together with what the rules did to them.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct Transcript {
    pub words: Vec<Word>,
    #[serde(flatten)]
    pub result: TransformationResult,
}

#[derive(Debug, Error)]
pub enum TranscriptError {
    #[error("Failed to access transcript {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to read transcript JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Transcript has no 'words' list")]
    MissingWords,

    #[error(transparent)]
    Engine(#[from] EngineError),
}

pub fn to_json(transcript: &Transcript) -> Result<String, TranscriptError> {
    Ok(serde_json::to_string_pretty(transcript)?)
}

/// Accepts steps as `{"rule", "words"}` records or `[rule, words]` pairs.
pub fn from_json(json: &str) -> Result<Transcript, TranscriptError> {
    let value: serde_json::Value = serde_json::from_str(json)?;
    parse_value(value)
}

fn parse_value(mut value: serde_json::Value) -> Result<Transcript, TranscriptError> {
    let words = value
        .as_object_mut()
        .and_then(|object| object.remove("words"))
        .ok_or(TranscriptError::MissingWords)?;
    let words: Vec<Word> = serde_json::from_value(words)?;
    let result = wire::transformation_from_value(value)?;
    Ok(Transcript { words, result })
}

/// Saves a transcript as pretty JSON.
pub fn save_transcript(transcript: &Transcript, file_path: &Path) -> Result<(), TranscriptError> {
    let file = File::create(file_path).map_err(|source| TranscriptError::Io {
        path: file_path.to_path_buf(),
        source,
    })?;
    let writer = BufWriter::new(file);
    serde_json::to_writer_pretty(writer, transcript)?;
    Ok(())
}

pub fn load_transcript(file_path: &Path) -> Result<Transcript, TranscriptError> {
    let file = File::open(file_path).map_err(|source| TranscriptError::Io {
        path: file_path.to_path_buf(),
        source,
    })?;
    let value: serde_json::Value = serde_json::from_reader(BufReader::new(file))?;
    parse_value(value)
}
