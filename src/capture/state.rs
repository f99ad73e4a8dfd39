//! Persisted capture state shared between invocations.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::capture::region::Region;
use crate::util::Rect;

const LAST_REGION_FILE: &str = "last_region";

/// Remembers the most recent selection so `gui --last-region true` can repeat it.
#[derive(Debug, Clone)]
pub struct LastRegionStore {
    path: PathBuf,
}

impl LastRegionStore {
    pub fn new(cache_dir: PathBuf) -> Self {
        Self {
            path: cache_dir.join(LAST_REGION_FILE),
        }
    }

    /// Store under `$XDG_CACHE_HOME/shotwire`.
    pub fn user_default() -> Self {
        let cache_dir = dirs::cache_dir()
            .unwrap_or_else(std::env::temp_dir)
            .join("shotwire");
        Self::new(cache_dir)
    }

    /// Returns the stored rectangle, or `None` if nothing usable was recorded.
    pub fn load(&self) -> Option<Rect> {
        let text = fs::read_to_string(&self.path).ok()?;
        match text.trim().parse::<Region>() {
            Ok(Region::Rect(rect)) => Some(rect),
            _ => {
                log::warn!(
                    "Ignoring malformed last region in {}",
                    self.path.display()
                );
                None
            }
        }
    }

    pub fn store(&self, rect: Rect) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        fs::write(&self.path, format!("{rect}\n"))
            .with_context(|| format!("Failed to write {}", self.path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn stores_and_loads_region() {
        let temp = TempDir::new().unwrap();
        let store = LastRegionStore::new(temp.path().join("cache"));
        assert_eq!(store.load(), None);

        let rect = Rect::new(-5, 10, 640, 480).unwrap();
        store.store(rect).unwrap();
        assert_eq!(store.load(), Some(rect));
    }

    #[test]
    fn malformed_file_yields_none() {
        let temp = TempDir::new().unwrap();
        let store = LastRegionStore::new(temp.path().to_path_buf());
        fs::write(temp.path().join(LAST_REGION_FILE), "all").unwrap();
        assert_eq!(store.load(), None);
    }
}
