//! Durable cassette storage, one YAML file per cassette name

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::cassette::Cassette;
use crate::{Result, TapedeckError};

/// File extension for cassette files
pub const CASSETTE_EXTENSION: &str = "yaml";

/// Loads and saves cassettes keyed by name
///
/// The scope model guarantees a single writer per cassette name for the
/// duration of a scope; no concurrent-write reconciliation is attempted.
#[derive(Debug, Clone)]
pub struct CassetteStore {
    dir: PathBuf,
}

impl CassetteStore {
    /// Create a store rooted at the given directory
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Directory holding the cassette files
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the file backing a cassette name
    ///
    /// # Errors
    ///
    /// Returns error if the name is empty or contains path separators
    pub fn path(&self, name: &str) -> Result<PathBuf> {
        validate_name(name)?;
        Ok(self.dir.join(format!("{name}.{CASSETTE_EXTENSION}")))
    }

    /// Load a cassette by name
    ///
    /// Returns `None` when no file exists for the name; a missing
    /// cassette selects recording mode rather than failing.
    ///
    /// # Errors
    ///
    /// Returns error if the file exists but cannot be read or parsed
    pub fn load(&self, name: &str) -> Result<Option<Cassette>> {
        let path = self.path(name)?;

        if !path.exists() {
            debug!("Cassette not found: {} ({})", name, path.display());
            return Ok(None);
        }

        let content = std::fs::read_to_string(&path)?;
        let cassette: Cassette = serde_yaml::from_str(&content).map_err(|e| {
            TapedeckError::InvalidFormat(format!("{}: {e}", path.display()))
        })?;

        debug!(
            "Loaded cassette '{}': {} interactions",
            name,
            cassette.interactions.len()
        );

        Ok(Some(cassette))
    }

    /// Save a cassette to its file
    ///
    /// Skips the write when the file already holds identical content, so
    /// an unchanged cassette is never rewritten.
    ///
    /// # Errors
    ///
    /// Returns error if the directory cannot be created or the file
    /// cannot be written
    pub fn save(&self, cassette: &Cassette) -> Result<()> {
        let path = self.path(&cassette.name)?;

        let yaml = serde_yaml::to_string(cassette)
            .map_err(|e| TapedeckError::InvalidFormat(e.to_string()))?;

        if path.exists() {
            let existing = std::fs::read_to_string(&path)?;
            if existing == yaml {
                debug!("Cassette '{}' unchanged, skipping save", cassette.name);
                return Ok(());
            }
        }

        std::fs::create_dir_all(&self.dir)?;
        std::fs::write(&path, yaml)?;

        info!(
            "Saved cassette '{}': {} interactions",
            cassette.name,
            cassette.interactions.len()
        );

        Ok(())
    }

    /// List the cassette names present in the store directory
    ///
    /// # Errors
    ///
    /// Returns error if the directory cannot be read
    pub fn list(&self) -> Result<Vec<String>> {
        if !self.dir.exists() {
            return Ok(Vec::new());
        }

        let mut names = Vec::new();
        for entry in std::fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.extension().and_then(|s| s.to_str()) == Some(CASSETTE_EXTENSION) {
                if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                    names.push(stem.to_string());
                }
            }
        }
        names.sort();
        Ok(names)
    }
}

/// Validate a cassette name
///
/// # Errors
///
/// Returns error if the name is empty or would escape the store directory
fn validate_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(TapedeckError::InvalidCassetteName(
            "name cannot be empty".to_string(),
        ));
    }

    if name.contains(['/', '\\']) || name == "." || name == ".." {
        return Err(TapedeckError::InvalidCassetteName(name.to_string()));
    }

    Ok(())
}
