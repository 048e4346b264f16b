//! # Editor - load, mutate and save one appinfo.vdf
//!
//! Ties the [`appinfo`] codec to the files a user actually edits: the binary
//! cache itself and the JSON modification journal kept next to the editor's
//! config.
//!
//! ## Pipeline
//!
//! ```text
//! appinfo.vdf ──read──> AppinfoBuffer ──decode──> Appinfo (records)
//!                            ^                        │
//!                            │ splice                 │ read.rs / write.rs
//!                            │                        v
//!                       persist.rs <────────── dirty records
//!                            │
//!                            ├──> modifications.json   (journal.rs)
//!                            └──> appinfo.vdf          (tmp + fsync + rename)
//! ```
//!
//! ## Module Responsibilities
//!
//! | Module        | Purpose                                                 |
//! |---------------|---------------------------------------------------------|
//! | [`lib.rs`]    | `Editor` struct, constructors, accessors                |
//! | [`read`]      | Field getters (`name`, release dates, launch menu, ...) |
//! | [`write`]     | Field setters, launch menu edits, revert/apply/export   |
//! | [`journal`]   | `modifications.json`: per-app original/modified trees   |
//! | [`persist`]   | `save()` and the atomic file write                      |
//! | [`library`]   | `libraryfolders.vdf`: which apps are installed          |
//!
//! ## Journal
//!
//! The first edit of an app snapshots its content as `original`. Every save
//! stores the current content as `modified`, so a later run can re-apply the
//! edits after Steam rewrites its cache ([`Editor::apply_journal`]) or undo
//! them ([`Editor::revert`]).
mod journal;
mod library;
mod persist;
mod read;
mod write;

use anyhow::{Context, Result};
use appinfo::{AppRecord, Appinfo, AppinfoBuffer, AppinfoError, FormatVersion};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

pub use journal::{Journal, JournalEntry};
pub use library::{Library, SteamLibraries};
pub use persist::write_atomic;
pub use write::Direction;

/// Path of the name field inside an app's content.
pub const NAME_PATH: &[&str] = &["appinfo", "common", "name"];
pub const SORTAS_PATH: &[&str] = &["appinfo", "common", "sortas"];
pub const TYPE_PATH: &[&str] = &["appinfo", "common", "type"];
pub const STEAM_RELEASE_PATH: &[&str] = &["appinfo", "common", "steam_release_date"];
pub const ORIGINAL_RELEASE_PATH: &[&str] = &["appinfo", "common", "original_release_date"];
pub const LAUNCH_PATH: &[&str] = &["appinfo", "config", "launch"];

/// An open appinfo.vdf plus its modification journal.
pub struct Editor {
    pub(crate) appinfo_path: PathBuf,
    pub(crate) buffer: AppinfoBuffer,
    pub(crate) appinfo: Appinfo,
    pub(crate) journal: Journal,
    /// Apps changed since the last save, in the order they were first touched.
    pub(crate) dirty: Vec<u32>,
}

impl std::fmt::Debug for Editor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Editor")
            .field("appinfo_path", &self.appinfo_path)
            .field("version", &self.appinfo.version)
            .field("loaded_apps", &self.appinfo.len())
            .field("file_bytes", &self.buffer.as_bytes().len())
            .field("journaled_apps", &self.journal.len())
            .field("dirty_apps", &self.dirty)
            .finish()
    }
}

impl Editor {
    /// Loads every record of `appinfo_path` and the journal at
    /// `modifications_path` (an absent journal is treated as empty).
    pub fn open<P1: AsRef<Path>, P2: AsRef<Path>>(
        appinfo_path: P1,
        modifications_path: P2,
    ) -> Result<Self> {
        let (appinfo_path, buffer) = Self::load_buffer(appinfo_path.as_ref())?;
        let appinfo = buffer
            .decode_all()
            .with_context(|| format!("failed to decode {}", appinfo_path.display()))?;
        Self::assemble(appinfo_path, buffer, appinfo, modifications_path.as_ref())
    }

    /// Loads only the records for `appids`. Any id missing from the file is
    /// an error.
    pub fn open_selected<P1, P2, I>(appinfo_path: P1, modifications_path: P2, appids: I) -> Result<Self>
    where
        P1: AsRef<Path>,
        P2: AsRef<Path>,
        I: IntoIterator<Item = u32>,
    {
        let (appinfo_path, buffer) = Self::load_buffer(appinfo_path.as_ref())?;
        let appinfo = buffer
            .decode_selected(appids)
            .with_context(|| format!("failed to decode {}", appinfo_path.display()))?;
        Self::assemble(appinfo_path, buffer, appinfo, modifications_path.as_ref())
    }

    /// Loads only the apps named in the journal. Journaled apps that are no
    /// longer in the cache are skipped with a warning.
    pub fn open_journaled<P1: AsRef<Path>, P2: AsRef<Path>>(
        appinfo_path: P1,
        modifications_path: P2,
    ) -> Result<Self> {
        let journal = Journal::load_or_create(modifications_path.as_ref())?;
        let (appinfo_path, buffer) = Self::load_buffer(appinfo_path.as_ref())?;

        let mut appinfo = buffer.decode_selected(std::iter::empty::<u32>())?;
        for appid in journal.ids() {
            match buffer.decode_selected([appid]) {
                Ok(mut found) => {
                    if let Some(record) = found.apps.swap_remove(&appid) {
                        appinfo.insert(record);
                    }
                }
                Err(AppinfoError::RecordNotFound { .. }) => {
                    warn!(appid, "journaled app is missing from the cache, skipping");
                }
                Err(e) => {
                    return Err(e).with_context(|| {
                        format!("failed to decode app {} in {}", appid, appinfo_path.display())
                    })
                }
            }
        }

        info!(
            path = %appinfo_path.display(),
            journaled = journal.len(),
            loaded = appinfo.len(),
            "opened journaled apps"
        );
        Ok(Self {
            appinfo_path,
            buffer,
            appinfo,
            journal,
            dirty: Vec::new(),
        })
    }

    fn load_buffer(path: &Path) -> Result<(PathBuf, AppinfoBuffer)> {
        let buffer = AppinfoBuffer::load(path)
            .with_context(|| format!("failed to open appinfo at {}", path.display()))?;
        Ok((path.to_path_buf(), buffer))
    }

    fn assemble(
        appinfo_path: PathBuf,
        buffer: AppinfoBuffer,
        appinfo: Appinfo,
        modifications_path: &Path,
    ) -> Result<Self> {
        let journal = Journal::load_or_create(modifications_path)?;
        info!(
            path = %appinfo_path.display(),
            version = ?appinfo.version,
            apps = appinfo.len(),
            journaled = journal.len(),
            "opened appinfo"
        );
        Ok(Self {
            appinfo_path,
            buffer,
            appinfo,
            journal,
            dirty: Vec::new(),
        })
    }

    #[must_use]
    pub fn appinfo_path(&self) -> &Path {
        &self.appinfo_path
    }

    #[must_use]
    pub fn version(&self) -> FormatVersion {
        self.appinfo.version
    }

    /// Loaded app ids in file order.
    pub fn app_ids(&self) -> Vec<u32> {
        self.appinfo.apps.keys().copied().collect()
    }

    #[must_use]
    pub fn app_count(&self) -> usize {
        self.appinfo.len()
    }

    pub fn app(&self, appid: u32) -> Option<&AppRecord> {
        self.appinfo.get(appid)
    }

    pub fn journal(&self) -> &Journal {
        &self.journal
    }

    /// Apps with unsaved changes.
    pub fn dirty_apps(&self) -> &[u32] {
        &self.dirty
    }

    #[must_use]
    pub fn is_dirty(&self) -> bool {
        !self.dirty.is_empty()
    }
}

#[cfg(test)]
mod tests;
