//! Reading, validating and generating the pack file: one non-negative
//! integer per line, exactly `8n` lines for `n` players.

use crate::game::setup::CARDS_PER_PLAYER;
use crate::model::card::Card;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PackError {
    #[error("number of players must be greater than 0 (got {0})")]
    PlayerCount(i64),
    #[error("pack file is empty; expected {expected} lines")]
    Empty { expected: usize },
    #[error("pack file has {actual} lines; expected {expected}")]
    LineCount { actual: usize, expected: usize },
    #[error("line {line} is blank")]
    Blank { line: usize },
    #[error("line {line} is not a valid integer: \"{text}\"")]
    NotInteger { line: usize, text: String },
    #[error("line {line} is negative ({value})")]
    Negative { line: usize, value: i64 },
    #[error("failed to read pack {path:?}: {source}")]
    Io {
        #[source]
        source: io::Error,
        path: PathBuf,
    },
}

impl PackError {
    /// One-based line the problem was found on, when there is one.
    pub fn line(&self) -> Option<usize> {
        match self {
            PackError::Blank { line }
            | PackError::NotInteger { line, .. }
            | PackError::Negative { line, .. } => Some(*line),
            _ => None,
        }
    }
}

pub fn validate_player_count(players: i64) -> Result<usize, PackError> {
    if players <= 0 {
        return Err(PackError::PlayerCount(players));
    }
    usize::try_from(players).map_err(|_| PackError::PlayerCount(players))
}

pub fn expected_lines(players: usize) -> usize {
    players * CARDS_PER_PLAYER
}

pub fn validate_line_count(actual: usize, players: usize) -> Result<(), PackError> {
    let expected = expected_lines(players);
    if actual == 0 {
        return Err(PackError::Empty { expected });
    }
    if actual != expected {
        return Err(PackError::LineCount { actual, expected });
    }
    Ok(())
}

pub fn parse_line(raw: &str, line: usize) -> Result<u32, PackError> {
    let text = raw.trim();
    if text.is_empty() {
        return Err(PackError::Blank { line });
    }
    match text.parse::<i64>() {
        Ok(value) if value < 0 => Err(PackError::Negative { line, value }),
        Ok(value) => u32::try_from(value).map_err(|_| PackError::NotInteger {
            line,
            text: text.to_string(),
        }),
        Err(_) => Err(PackError::NotInteger {
            line,
            text: text.to_string(),
        }),
    }
}

/// Parses pack text already in memory. Every line counts, including blank
/// ones.
pub fn parse(text: &str, players: usize) -> Result<Vec<u32>, PackError> {
    let values = text
        .lines()
        .enumerate()
        .map(|(index, raw)| parse_line(raw, index + 1))
        .collect::<Result<Vec<_>, _>>()?;
    validate_line_count(values.len(), players)?;
    Ok(values)
}

pub fn load(path: impl AsRef<Path>, players: usize) -> Result<Vec<u32>, PackError> {
    let path = path.as_ref();
    let text = fs::read_to_string(path).map_err(|source| PackError::Io {
        source,
        path: path.to_path_buf(),
    })?;
    parse(&text, players)
}

/// Builds a winnable pack: eight copies of every denomination `1..=players`,
/// shuffled deterministically from `seed`.
pub fn generate(players: usize, seed: u64) -> Vec<u32> {
    let mut values: Vec<u32> = (1..=players as u32)
        .flat_map(|value| std::iter::repeat_n(value, CARDS_PER_PLAYER))
        .collect();
    let mut rng = StdRng::seed_from_u64(seed);
    values.shuffle(&mut rng);
    values
}

pub fn write(path: impl AsRef<Path>, values: &[u32]) -> io::Result<()> {
    let path = path.as_ref();
    if let Some(dir) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
        fs::create_dir_all(dir)?;
    }
    let mut writer = BufWriter::new(File::create(path)?);
    for value in values {
        writeln!(writer, "{value}")?;
    }
    writer.flush()
}

pub fn to_cards(values: &[u32]) -> Vec<Card> {
    values.iter().copied().map(Card::new).collect()
}
