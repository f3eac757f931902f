//! JSONL (JSON Lines) storage.
//!
//! Each line is a valid JSON object representing one entity. The tournament
//! store keeps one full tournament snapshot per line.

use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::{StorageConfig, StorageError, TournamentStore};
use crate::models::{Tournament, TournamentId};

/// JSONL file writer.
pub struct JsonlWriter<T> {
    path: PathBuf,
    _marker: PhantomData<T>,
}

impl<T: Serialize> JsonlWriter<T> {
    /// Create a new JSONL writer for the given path.
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            _marker: PhantomData,
        }
    }

    /// Ensure the parent directory exists.
    fn ensure_dir(&self) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        Ok(())
    }

    /// Append a single entity to the file.
    pub fn append(&self, entity: &T) -> Result<(), StorageError> {
        self.ensure_dir()?;

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;

        let mut writer = BufWriter::new(file);
        let json = serde_json::to_string(entity)?;
        writeln!(writer, "{}", json)?;
        writer.flush()?;

        debug!("Appended entity to {:?}", self.path);
        Ok(())
    }

    /// Write entities, replacing the entire file.
    pub fn write_all(&self, entities: &[T]) -> Result<usize, StorageError> {
        let lines = entities
            .iter()
            .map(serde_json::to_string)
            .collect::<Result<Vec<_>, _>>()?;
        self.write_lines(&lines)
    }

    /// Write pre-serialized lines, replacing the entire file.
    ///
    /// Lines go to a sibling temp file which is then renamed over the
    /// target, so readers never see a half-written file.
    pub fn write_lines(&self, lines: &[String]) -> Result<usize, StorageError> {
        self.ensure_dir()?;

        let tmp_path = self.path.with_extension("jsonl.tmp");
        let file = File::create(&tmp_path)?;
        let mut writer = BufWriter::new(file);

        for line in lines {
            writeln!(writer, "{}", line)?;
        }

        writer.flush()?;
        drop(writer);
        fs::rename(&tmp_path, &self.path)?;
        info!("Wrote {} lines to {:?}", lines.len(), self.path);

        Ok(lines.len())
    }
}

/// JSONL file reader.
pub struct JsonlReader<T> {
    path: PathBuf,
    _marker: PhantomData<T>,
}

impl<T: DeserializeOwned> JsonlReader<T> {
    /// Create a new JSONL reader for the given path.
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            _marker: PhantomData,
        }
    }

    /// Check if the file exists.
    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Raw non-blank lines, parseable or not.
    pub fn read_lines(&self) -> Result<Vec<String>, StorageError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let file = File::open(&self.path)?;
        let mut lines = Vec::new();
        for line in BufReader::new(file).lines() {
            let line = line?;
            if !line.trim().is_empty() {
                lines.push(line);
            }
        }
        Ok(lines)
    }

    /// Read all entities from the file, skipping lines that fail to parse.
    pub fn read_all(&self) -> Result<Vec<T>, StorageError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let file = File::open(&self.path)?;
        let reader = BufReader::new(file);
        let mut entities = Vec::new();

        for (idx, line) in reader.lines().enumerate() {
            let line = line?;

            if line.trim().is_empty() {
                continue;
            }

            match serde_json::from_str(&line) {
                Ok(entity) => entities.push(entity),
                Err(e) => {
                    warn!("Failed to parse line {} in {:?}: {}", idx + 1, self.path, e);
                }
            }
        }

        debug!("Read {} entities from {:?}", entities.len(), self.path);
        Ok(entities)
    }

    /// Read entities matching a predicate.
    pub fn read_where<F>(&self, predicate: F) -> Result<Vec<T>, StorageError>
    where
        F: Fn(&T) -> bool,
    {
        let all = self.read_all()?;
        Ok(all.into_iter().filter(predicate).collect())
    }
}

/// Tournament store backed by a single JSONL file.
pub struct JsonlStore {
    path: PathBuf,
}

impl JsonlStore {
    pub fn new(config: &StorageConfig) -> Self {
        Self::at(config.tournaments_path())
    }

    /// Use an explicit file path.
    pub fn at(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn reader(&self) -> JsonlReader<Tournament> {
        JsonlReader::new(self.path.clone())
    }

    fn writer(&self) -> JsonlWriter<Tournament> {
        JsonlWriter::new(self.path.clone())
    }

    /// Tournaments matching a predicate, e.g. a status filter.
    pub fn list_where<F>(&self, predicate: F) -> Result<Vec<Tournament>, StorageError>
    where
        F: Fn(&Tournament) -> bool,
    {
        self.reader().read_where(predicate)
    }
}

/// Id of a stored line, readable even when the rest of the line is not.
fn line_id(line: &str) -> Option<TournamentId> {
    #[derive(Deserialize)]
    struct IdOnly {
        id: TournamentId,
    }

    serde_json::from_str::<IdOnly>(line).ok().map(|row| row.id)
}

impl TournamentStore for JsonlStore {
    fn load(&self, id: &TournamentId) -> Result<Tournament, StorageError> {
        self.reader()
            .read_where(|t| t.id == *id)?
            .into_iter()
            .next()
            .ok_or_else(|| StorageError::NotFound(id.clone()))
    }

    /// Lines that do not parse as tournaments are written back untouched.
    fn save(&mut self, tournament: &Tournament) -> Result<(), StorageError> {
        let mut lines = self.reader().read_lines()?;
        let json = serde_json::to_string(tournament)?;
        match lines
            .iter_mut()
            .find(|line| line_id(line).as_ref() == Some(&tournament.id))
        {
            Some(line) => {
                *line = json;
                self.writer().write_lines(&lines)?;
            }
            None => self.writer().append(tournament)?,
        }
        debug!("Saved tournament {}", tournament.id);
        Ok(())
    }

    fn delete(&mut self, id: &TournamentId) -> Result<(), StorageError> {
        let mut lines = self.reader().read_lines()?;
        let before = lines.len();
        lines.retain(|line| line_id(line).as_ref() != Some(id));
        if lines.len() == before {
            return Err(StorageError::NotFound(id.clone()));
        }
        self.writer().write_lines(&lines)?;
        info!("Deleted tournament {}", id);
        Ok(())
    }

    fn list(&self) -> Result<Vec<Tournament>, StorageError> {
        self.reader().read_all()
    }
}
