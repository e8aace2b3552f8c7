//! Word pack service: the supplier of prompts.
//!
//! DESIGN
//! ======
//! Rounds only ever need `get_pack(name)`, expressed by the `WordPackSource`
//! trait. `PackStore` is the in-memory implementation: seeded from `*.json`
//! files (`{"name": ..., "words": [...]}`) at startup and mutated by the pack
//! REST routes. Mutations are not written back to disk.
//!
//! ERROR HANDLING
//! ==============
//! The active word list is resolved once at startup. A missing or empty pack
//! is fatal there; the REST layer maps the same errors to HTTP statuses.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

// =============================================================================
// TYPES
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum PackError {
    #[error("pack not found: {0}")]
    NotFound(String),
    #[error("pack with this name already exists: {0}")]
    AlreadyExists(String),
    #[error("invalid word")]
    InvalidWord,
    #[error("invalid pack name")]
    InvalidName,
    #[error("pack has no words: {0}")]
    Empty(String),
    #[error("failed to read {path}: {source}")]
    Io { path: PathBuf, source: std::io::Error },
    #[error("failed to parse {path}: {source}")]
    Json { path: PathBuf, source: serde_json::Error },
}

/// A named list of candidate prompts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordPack {
    pub name: String,
    #[serde(default)]
    pub words: Vec<String>,
}

/// Anything that can hand out a word pack by name.
pub trait WordPackSource {
    /// Look up a pack.
    ///
    /// # Errors
    ///
    /// Returns `PackError::NotFound` if no pack has that name.
    fn get_pack(&self, name: &str) -> Result<WordPack, PackError>;
}

// =============================================================================
// STORE
// =============================================================================

/// In-memory pack collection keyed by name.
#[derive(Debug, Default)]
pub struct PackStore {
    packs: BTreeMap<String, WordPack>,
}

impl WordPackSource for PackStore {
    fn get_pack(&self, name: &str) -> Result<WordPack, PackError> {
        self.packs
            .get(name)
            .cloned()
            .ok_or_else(|| PackError::NotFound(name.to_string()))
    }
}

impl PackStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a store from every `*.json` file in `dir`.
    ///
    /// A missing directory yields an empty store. Files without a name are
    /// skipped with a warning.
    ///
    /// # Errors
    ///
    /// Returns an error if a pack file cannot be read or parsed.
    pub fn load_dir(dir: &Path) -> Result<Self, PackError> {
        let mut store = Self::new();
        if !dir.is_dir() {
            warn!(dir = %dir.display(), "pack directory not found, starting with no packs");
            return Ok(store);
        }

        let entries = std::fs::read_dir(dir).map_err(|source| PackError::Io { path: dir.to_path_buf(), source })?;
        let mut paths: Vec<PathBuf> = entries
            .filter_map(Result::ok)
            .map(|entry| entry.path())
            .filter(|path| path.extension().is_some_and(|ext| ext == "json"))
            .collect();
        paths.sort();

        for path in paths {
            let raw = std::fs::read_to_string(&path).map_err(|source| PackError::Io { path: path.clone(), source })?;
            let pack: WordPack = serde_json::from_str(&raw).map_err(|source| PackError::Json { path: path.clone(), source })?;
            if pack.name.trim().is_empty() {
                warn!(path = %path.display(), "pack file has no name, skipping");
                continue;
            }
            info!(pack = %pack.name, words = pack.words.len(), "imported word pack");
            store.packs.insert(pack.name.clone(), pack);
        }

        Ok(store)
    }

    /// All packs, ordered by name.
    #[must_use]
    pub fn all(&self) -> Vec<WordPack> {
        self.packs.values().cloned().collect()
    }

    /// Create a pack.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is blank or already taken.
    pub fn create(&mut self, name: &str, words: Vec<String>) -> Result<(), PackError> {
        if name.trim().is_empty() {
            return Err(PackError::InvalidName);
        }
        if self.packs.contains_key(name) {
            return Err(PackError::AlreadyExists(name.to_string()));
        }
        self.packs
            .insert(name.to_string(), WordPack { name: name.to_string(), words });
        Ok(())
    }

    /// Delete a pack.
    ///
    /// # Errors
    ///
    /// Returns `PackError::NotFound` if no pack has that name.
    pub fn delete(&mut self, name: &str) -> Result<(), PackError> {
        self.packs
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| PackError::NotFound(name.to_string()))
    }

    /// Add a word to a pack. Adding a word that is already present is a no-op.
    ///
    /// # Errors
    ///
    /// Returns an error if the pack is missing or the word is blank.
    pub fn add_word(&mut self, name: &str, word: &str) -> Result<(), PackError> {
        let pack = self
            .packs
            .get_mut(name)
            .ok_or_else(|| PackError::NotFound(name.to_string()))?;
        if word.trim().is_empty() {
            return Err(PackError::InvalidWord);
        }
        if !pack.words.iter().any(|w| w == word) {
            pack.words.push(word.to_string());
        }
        Ok(())
    }

    /// Remove every occurrence of a word from a pack.
    ///
    /// # Errors
    ///
    /// Returns `PackError::NotFound` if no pack has that name.
    pub fn delete_word(&mut self, name: &str, word: &str) -> Result<(), PackError> {
        let pack = self
            .packs
            .get_mut(name)
            .ok_or_else(|| PackError::NotFound(name.to_string()))?;
        pack.words.retain(|w| w != word);
        Ok(())
    }
}

/// Resolve the word list every round draws from.
///
/// # Errors
///
/// Returns an error if the pack is unknown or contains no usable words.
pub fn active_words(source: &impl WordPackSource, name: &str) -> Result<Vec<String>, PackError> {
    let pack = source.get_pack(name)?;
    let words: Vec<String> = pack
        .words
        .into_iter()
        .map(|w| w.trim().to_string())
        .filter(|w| !w.is_empty())
        .collect();
    if words.is_empty() {
        return Err(PackError::Empty(name.to_string()));
    }
    Ok(words)
}

#[cfg(test)]
#[path = "packs_test.rs"]
mod tests;
