//! Capability document lookup
//!
//! Finds plain-text documents by file name under a search directory. The
//! feasibility gate reads the capability document through here once per
//! assessment and treats it as opaque text.

use std::path::{Path, PathBuf};

use eyre::{Context, Result, eyre};
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::config::CapabilitiesConfig;
use crate::prompts::embedded;

/// Reads documents relative to a root directory
#[derive(Debug, Clone)]
pub struct DocumentReader {
    root: PathBuf,
}

impl DocumentReader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        debug!(?root, "DocumentReader::new: called");
        Self { root }
    }

    fn search_dir(&self, subdir: &Path) -> PathBuf {
        if subdir.as_os_str().is_empty() {
            self.root.clone()
        } else {
            self.root.join(subdir)
        }
    }

    /// Find the first file named `file_name` anywhere below `subdir`
    pub fn find_file_path(&self, file_name: &str, subdir: impl AsRef<Path>) -> Result<PathBuf> {
        let search_dir = self.search_dir(subdir.as_ref());
        debug!(%file_name, ?search_dir, "DocumentReader::find_file_path: called");

        WalkDir::new(&search_dir)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .find(|e| e.file_name().to_str() == Some(file_name))
            .map(|e| e.path().to_path_buf())
            .ok_or_else(|| eyre!("{} was not found under {}", file_name, search_dir.display()))
    }

    /// Read a document as UTF-8 text
    pub fn read_file(&self, file_name: &str, subdir: impl AsRef<Path>) -> Result<String> {
        debug!(%file_name, "DocumentReader::read_file: called");
        let path = self.find_file_path(file_name, subdir)?;
        std::fs::read_to_string(&path).context(format!("Failed to read {}", path.display()))
    }

    /// Read the capability document, falling back to the built-in one
    pub fn capabilities(&self, config: &CapabilitiesConfig) -> String {
        debug!(file = %config.file, dir = ?config.dir, "DocumentReader::capabilities: called");
        match self.read_file(&config.file, &config.dir) {
            Ok(text) => text,
            Err(e) => {
                warn!(error = %e, "Capability document unavailable, using built-in default");
                embedded::ABILITIES.to_string()
            }
        }
    }
}
