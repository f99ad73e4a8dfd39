//! In-place edits of the user's config file.
//!
//! `shotwire config` changes single settings. Everything else in the file
//! (comments, unknown keys, values the lenient loader would reject) is
//! written back as it was read.

use anyhow::{Context, Result, anyhow};
use log::info;
use std::fs;
use std::path::{Path, PathBuf};
use toml_edit::{DocumentMut, Item, Value};

#[derive(Debug)]
pub struct ConfigDocument {
    path: PathBuf,
    doc: DocumentMut,
}

impl ConfigDocument {
    /// Reads `path`; a missing file starts an empty document.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or is not valid TOML.
    pub fn open(path: &Path) -> Result<Self> {
        let text = if path.exists() {
            fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?
        } else {
            String::new()
        };
        let doc = text
            .parse::<DocumentMut>()
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        Ok(Self {
            path: path.to_path_buf(),
            doc,
        })
    }

    /// Sets `[section] key = value`, creating the section if needed.
    pub fn set(&mut self, section: &str, key: &str, value: impl Into<Value>) -> Result<()> {
        let table = self
            .doc
            .entry(section)
            .or_insert(toml_edit::table())
            .as_table_like_mut()
            .ok_or_else(|| anyhow!("'{section}' must be a table"))?;
        table.insert(key, Item::Value(value.into()));
        Ok(())
    }

    /// Writes the document back, creating the config directory if needed.
    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).context("Failed to create config directory")?;
        }
        fs::write(&self.path, self.doc.to_string())
            .with_context(|| format!("Failed to write config to {}", self.path.display()))?;
        info!("Saved config to {}", self.path.display());
        Ok(())
    }
}
