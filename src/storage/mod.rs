//! Tournament persistence.
//!
//! The core never touches disk; hosts load a whole [`Tournament`], run
//! operations on it and save the snapshot back through a
//! [`TournamentStore`]:
//! - [`JsonlStore`]: one tournament per line in `tournaments.jsonl`
//! - [`MemoryStore`]: in-process, for tests and embedding
//! - [`export_json`] / [`import_json`]: single-tournament documents

mod document;
mod jsonl;

pub use document::*;
pub use jsonl::*;

use std::path::PathBuf;
use thiserror::Error;

use crate::models::{Tournament, TournamentId};

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Tournament not found: {0}")]
    NotFound(TournamentId),

    #[error("Invalid tournament document: {0}")]
    InvalidDocument(String),
}

/// Configuration for storage paths.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub data_dir: PathBuf,
}

impl StorageConfig {
    pub fn new(data_dir: PathBuf) -> Self {
        Self { data_dir }
    }

    pub fn tournaments_path(&self) -> PathBuf {
        self.data_dir.join("tournaments.jsonl")
    }

    /// Default destination for exported documents.
    pub fn exports_dir(&self) -> PathBuf {
        self.data_dir.join("exports")
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self::new(PathBuf::from("./data"))
    }
}

/// Whole-aggregate snapshot storage.
pub trait TournamentStore {
    fn load(&self, id: &TournamentId) -> Result<Tournament, StorageError>;

    /// Insert or replace by id.
    fn save(&mut self, tournament: &Tournament) -> Result<(), StorageError>;

    fn delete(&mut self, id: &TournamentId) -> Result<(), StorageError>;

    /// All stored tournaments, oldest first.
    fn list(&self) -> Result<Vec<Tournament>, StorageError>;

    fn ids(&self) -> Result<Vec<TournamentId>, StorageError> {
        Ok(self.list()?.into_iter().map(|t| t.id).collect())
    }
}

/// Keeps snapshots in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    tournaments: Vec<Tournament>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TournamentStore for MemoryStore {
    fn load(&self, id: &TournamentId) -> Result<Tournament, StorageError> {
        self.tournaments
            .iter()
            .find(|t| t.id == *id)
            .cloned()
            .ok_or_else(|| StorageError::NotFound(id.clone()))
    }

    fn save(&mut self, tournament: &Tournament) -> Result<(), StorageError> {
        upsert(&mut self.tournaments, tournament);
        Ok(())
    }

    fn delete(&mut self, id: &TournamentId) -> Result<(), StorageError> {
        remove(&mut self.tournaments, id)
    }

    fn list(&self) -> Result<Vec<Tournament>, StorageError> {
        Ok(self.tournaments.clone())
    }
}

fn upsert(tournaments: &mut Vec<Tournament>, tournament: &Tournament) {
    match tournaments.iter_mut().find(|t| t.id == tournament.id) {
        Some(existing) => *existing = tournament.clone(),
        None => tournaments.push(tournament.clone()),
    }
}

fn remove(tournaments: &mut Vec<Tournament>, id: &TournamentId) -> Result<(), StorageError> {
    let before = tournaments.len();
    tournaments.retain(|t| t.id != *id);
    if tournaments.len() == before {
        return Err(StorageError::NotFound(id.clone()));
    }
    Ok(())
}
