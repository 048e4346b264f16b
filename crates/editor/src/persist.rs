/// Save path: splices every dirty record back into the buffer, then writes
/// the journal and the cache file.
use anyhow::{Context, Result};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;
use tracing::{debug, info};

use crate::Editor;

impl Editor {
    /// Persists all pending edits and returns how many records were spliced.
    ///
    /// The journal is written first so the edits survive even if the cache
    /// write fails. Records are spliced one at a time; if one fails, those
    /// before it stay applied to the in-memory buffer but nothing reaches
    /// the cache file.
    pub fn save(&mut self) -> Result<usize> {
        for (appid, record) in &self.appinfo.apps {
            self.journal.set_modified(*appid, &record.content);
        }
        self.journal.save()?;

        let mut spliced = 0;
        for &appid in &self.dirty {
            let record = self
                .appinfo
                .get_mut(appid)
                .ok_or_else(|| anyhow::anyhow!("app {} is not loaded", appid))?;
            let splice = self
                .buffer
                .update(record)
                .with_context(|| format!("failed to encode app {}", appid))?;
            debug!(appid, ?splice, "record spliced");
            spliced += 1;
        }

        write_atomic(&self.appinfo_path, self.buffer.as_bytes())
            .with_context(|| format!("failed to write {}", self.appinfo_path.display()))?;

        info!(
            path = %self.appinfo_path.display(),
            records = spliced,
            bytes = self.buffer.as_bytes().len(),
            "saved appinfo"
        );
        self.dirty.clear();
        Ok(spliced)
    }
}

/// Replaces `path` with `bytes` crash-safely: writes `<path>.tmp`, fsyncs it,
/// renames it over `path`, then fsyncs the parent directory.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let mut tmp_name = path.as_os_str().to_owned();
    tmp_name.push(".tmp");
    let tmp_path = Path::new(&tmp_name);

    {
        let mut f = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(tmp_path)
            .with_context(|| format!("failed to create {}", tmp_path.display()))?;
        f.write_all(bytes)?;
        f.flush()?;
        f.sync_all()?;
    }

    if let Err(e) = fs::rename(tmp_path, path) {
        let _ = fs::remove_file(tmp_path);
        return Err(e).with_context(|| format!("failed to move {} into place", tmp_path.display()));
    }

    // On ext4/XFS the rename is only durable once the directory is synced.
    if let Some(parent) = path.parent() {
        if let Ok(dir) = fs::File::open(parent) {
            let _ = dir.sync_all();
        }
    }

    Ok(())
}
