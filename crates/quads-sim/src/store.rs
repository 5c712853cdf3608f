//! Destinations for the per-player and per-deck output files.

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;
use quads_core::game::event::{DeckReport, PlayerEvent};
use quads_core::model::player::{DeckId, PlayerId};

/// Ordered line log owned by exactly one player agent.
pub trait PlayerLog: Send {
    fn record(&mut self, event: &PlayerEvent) -> io::Result<()>;
    fn close(&mut self) -> io::Result<()>;
}

pub trait OutputStore: Send + Sync {
    fn open_player(&self, player: PlayerId) -> io::Result<Box<dyn PlayerLog>>;
    fn write_deck(&self, report: &DeckReport) -> io::Result<()>;
}

pub fn player_file_name(player: PlayerId) -> String {
    format!("player{player}_output.txt")
}

pub fn deck_file_name(deck: DeckId) -> String {
    format!("deck{deck}_output.txt")
}

/// Writes one text file per player and per deck into a directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Creates `dir` if it does not exist yet.
    pub fn new(dir: impl Into<PathBuf>) -> io::Result<Self> {
        let dir = dir.into();
        if !dir.as_os_str().is_empty() {
            fs::create_dir_all(&dir)?;
        }
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl OutputStore for FileStore {
    fn open_player(&self, player: PlayerId) -> io::Result<Box<dyn PlayerLog>> {
        let path = self.dir.join(player_file_name(player));
        let writer = BufWriter::new(File::create(&path)?);
        Ok(Box::new(FilePlayerLog { writer }))
    }

    fn write_deck(&self, report: &DeckReport) -> io::Result<()> {
        let path = self.dir.join(deck_file_name(report.deck));
        let mut writer = BufWriter::new(File::create(path)?);
        writeln!(writer, "{report}")?;
        writer.flush()
    }
}

struct FilePlayerLog {
    writer: BufWriter<File>,
}

impl PlayerLog for FilePlayerLog {
    // Flushed per line so a failed run still leaves everything up to the
    // failure on disk.
    fn record(&mut self, event: &PlayerEvent) -> io::Result<()> {
        writeln!(self.writer, "{event}")?;
        self.writer.flush()
    }

    fn close(&mut self) -> io::Result<()> {
        self.writer.flush()
    }
}

/// Keeps every output file as a list of lines, keyed by file name.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    files: Arc<Mutex<BTreeMap<String, Vec<String>>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self, file_name: &str) -> Vec<String> {
        self.files
            .lock()
            .get(file_name)
            .cloned()
            .unwrap_or_default()
    }

    pub fn player_lines(&self, player: PlayerId) -> Vec<String> {
        self.lines(&player_file_name(player))
    }

    pub fn deck_line(&self, deck: DeckId) -> Option<String> {
        self.lines(&deck_file_name(deck)).into_iter().next()
    }

    pub fn file_names(&self) -> Vec<String> {
        self.files.lock().keys().cloned().collect()
    }
}

impl OutputStore for MemoryStore {
    fn open_player(&self, player: PlayerId) -> io::Result<Box<dyn PlayerLog>> {
        let name = player_file_name(player);
        self.files.lock().insert(name.clone(), Vec::new());
        Ok(Box::new(MemoryPlayerLog {
            name,
            files: Arc::clone(&self.files),
        }))
    }

    fn write_deck(&self, report: &DeckReport) -> io::Result<()> {
        self.files
            .lock()
            .insert(deck_file_name(report.deck), vec![report.to_string()]);
        Ok(())
    }
}

struct MemoryPlayerLog {
    name: String,
    files: Arc<Mutex<BTreeMap<String, Vec<String>>>>,
}

impl PlayerLog for MemoryPlayerLog {
    fn record(&mut self, event: &PlayerEvent) -> io::Result<()> {
        self.files
            .lock()
            .entry(self.name.clone())
            .or_default()
            .push(event.to_string());
        Ok(())
    }

    fn close(&mut self) -> io::Result<()> {
        Ok(())
    }
}
