/// # Journal - the `modifications.json` file
///
/// Remembers, per edited app, the content it had before the first edit
/// (`original`) and the content as of the last save (`modified`):
///
/// ```text
/// {
///   "570": {
///     "original": { "appinfo": { ... } },
///     "modified": { "appinfo": { ... } }
///   }
/// }
/// ```
///
/// Strings that were not valid UTF-8 in the cache carry a trailing `\u0006`
/// marker and 8-byte integers are written as `{"$int64": n}`, so a tree read
/// back from the journal re-encodes to the same bytes.
///
/// The file is rewritten atomically on every save.
use anyhow::{Context, Result};
use keyvalues::ContentTree;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::persist::write_atomic;

/// Before/after content of one edited app.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalEntry {
    pub original: ContentTree,
    pub modified: ContentTree,
}

/// In-memory copy of the journal file, keyed by appid.
#[derive(Debug, Clone)]
pub struct Journal {
    path: PathBuf,
    entries: BTreeMap<u32, JournalEntry>,
}

impl Journal {
    /// Loads the journal at `path`, or starts an empty one if the file does
    /// not exist or is blank.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but is not a valid journal.
    pub fn load_or_create(path: &Path) -> Result<Self> {
        let entries = if path.exists() {
            let text = fs::read_to_string(path)
                .with_context(|| format!("failed to read journal at {}", path.display()))?;
            if text.trim().is_empty() {
                BTreeMap::new()
            } else {
                serde_json::from_str(&text)
                    .with_context(|| format!("failed to parse journal at {}", path.display()))?
            }
        } else {
            BTreeMap::new()
        };
        debug!(path = %path.display(), entries = entries.len(), "loaded journal");
        Ok(Self {
            path: path.to_path_buf(),
            entries,
        })
    }

    /// Writes the journal, creating its directory if needed.
    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).with_context(|| {
                format!("failed to create config dir {}", parent.display())
            })?;
        }
        let json = serde_json::to_vec_pretty(&self.entries)?;
        write_atomic(&self.path, &json)
            .with_context(|| format!("failed to write journal at {}", self.path.display()))?;
        debug!(path = %self.path.display(), entries = self.entries.len(), "saved journal");
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, appid: u32) -> bool {
        self.entries.contains_key(&appid)
    }

    pub fn get(&self, appid: u32) -> Option<&JournalEntry> {
        self.entries.get(&appid)
    }

    /// Journaled appids in ascending order.
    pub fn ids(&self) -> Vec<u32> {
        self.entries.keys().copied().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (u32, &JournalEntry)> {
        self.entries.iter().map(|(id, e)| (*id, e))
    }

    /// Records `content` as the app's original if it has no entry yet.
    /// Returns `true` if a new entry was created.
    pub fn snapshot(&mut self, appid: u32, content: &ContentTree) -> bool {
        if self.entries.contains_key(&appid) {
            return false;
        }
        self.entries.insert(
            appid,
            JournalEntry {
                original: content.clone(),
                modified: content.clone(),
            },
        );
        true
    }

    /// Replaces the `modified` tree of an existing entry.
    pub fn set_modified(&mut self, appid: u32, content: &ContentTree) {
        if let Some(entry) = self.entries.get_mut(&appid) {
            entry.modified = content.clone();
        }
    }

    pub fn remove(&mut self, appid: u32) -> Option<JournalEntry> {
        self.entries.remove(&appid)
    }
}
