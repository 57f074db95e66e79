//! Flat index from bare file name to resolved path.

use std::{
    collections::HashMap,
    path::{Path, PathBuf},
};

use corelib::AssetError;

use crate::LOG_TARGET;

/// Bare file name → resolved path. Names are unique: the first file seen
/// under a given name is kept and later duplicates are recorded as conflicts.
#[derive(Debug, Default)]
pub struct NameIndex {
    files: HashMap<String, PathBuf>,
    conflicts: Vec<AssetError>,
}

impl NameIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a file. Hidden (`.`-prefixed) and empty names are ignored.
    /// Returns `true` if the file was indexed.
    pub fn insert(&mut self, name: &str, path: impl Into<PathBuf>) -> bool {
        if name.is_empty() || name.starts_with('.') {
            return false;
        }
        let path = path.into();
        if let Some(kept) = self.files.get(name) {
            let conflict = AssetError::NameConflict {
                name: name.to_string(),
                kept: kept.clone(),
                ignored: path,
            };
            log::error!(target: LOG_TARGET, "{}", conflict);
            self.conflicts.push(conflict);
            return false;
        }
        self.files.insert(name.to_string(), path);
        true
    }

    pub fn get(&self, name: &str) -> Option<&Path> {
        self.files.get(name).map(PathBuf::as_path)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.files.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Duplicate names rejected while building the index.
    pub fn conflicts(&self) -> &[AssetError] {
        &self.conflicts
    }

    /// Indexed names in sorted order.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.files.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}
