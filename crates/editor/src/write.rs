/// Write path: every mutation goes through [`Editor::touch`], which journals
/// the app's original content on first use and marks the app dirty.
///
/// Nothing here touches the disk; see `persist.rs`.
use anyhow::{bail, ensure, Result};
use keyvalues::{ContentTree, Value};
use tracing::{debug, warn};

use crate::{
    Editor, LAUNCH_PATH, NAME_PATH, ORIGINAL_RELEASE_PATH, SORTAS_PATH, STEAM_RELEASE_PATH,
};

/// Which neighbour a launch option swaps with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
}

impl Editor {
    /// Mutable content of a loaded app, journaled and marked dirty.
    pub(crate) fn touch(&mut self, appid: u32) -> Result<&mut ContentTree> {
        let record = self
            .appinfo
            .get_mut(appid)
            .ok_or_else(|| anyhow::anyhow!("app {} is not loaded", appid))?;
        if self.journal.snapshot(appid, &record.content) {
            debug!(appid, "journaled original content");
        }
        if !self.dirty.contains(&appid) {
            self.dirty.push(appid);
        }
        Ok(&mut record.content)
    }

    /// Stores `value` at `path`, creating intermediate dicts. Returns the
    /// previous value.
    pub fn set(&mut self, appid: u32, path: &[&str], value: impl Into<Value>) -> Result<Option<Value>> {
        ensure!(!path.is_empty(), "path must not be empty");
        Ok(self.touch(appid)?.set_path(path, value))
    }

    pub fn set_name(&mut self, appid: u32, name: &str) -> Result<()> {
        self.set(appid, NAME_PATH, name)?;
        Ok(())
    }

    pub fn set_sortas(&mut self, appid: u32, sortas: &str) -> Result<()> {
        self.set(appid, SORTAS_PATH, sortas)?;
        Ok(())
    }

    /// Timestamps are stored as 4-byte ints; the bit pattern is kept as is.
    pub fn set_steam_release_date(&mut self, appid: u32, timestamp: u32) -> Result<()> {
        self.set(appid, STEAM_RELEASE_PATH, Value::Int32(timestamp as i32))?;
        Ok(())
    }

    pub fn set_original_release_date(&mut self, appid: u32, timestamp: u32) -> Result<()> {
        self.set(appid, ORIGINAL_RELEASE_PATH, Value::Int32(timestamp as i32))?;
        Ok(())
    }

    /// Replaces the whole `config/launch` dict.
    pub fn set_launch_menu(&mut self, appid: u32, menu: ContentTree) -> Result<()> {
        self.set(appid, LAUNCH_PATH, menu)?;
        Ok(())
    }

    /// Appends an empty launch option and returns its key.
    pub fn add_launch_option(&mut self, appid: u32) -> Result<String> {
        let menu = launch_menu_mut(self.touch(appid)?);
        let key = menu.len().to_string();
        menu.insert(key.as_str(), ContentTree::new());
        Ok(key)
    }

    /// Removes launch option `key` and renumbers the rest from `0`.
    pub fn delete_launch_option(&mut self, appid: u32, key: &str) -> Result<()> {
        ensure!(
            self.launch_menu(appid).map_or(false, |m| m.contains_key(key)),
            "app {} has no launch option {}",
            appid,
            key
        );
        let menu = launch_menu_mut(self.touch(appid)?);
        let remaining: Vec<Value> = menu
            .iter()
            .filter(|(k, _)| k.as_str() != key)
            .map(|(_, v)| v.clone())
            .collect();
        *menu = remaining
            .into_iter()
            .enumerate()
            .map(|(i, v)| (i.to_string(), v))
            .collect();
        Ok(())
    }

    /// Swaps launch option `key` with its numeric neighbour. Returns `false`
    /// (and changes nothing) if there is no neighbour in that direction.
    pub fn move_launch_option(&mut self, appid: u32, key: &str, direction: Direction) -> Result<bool> {
        let n: u32 = match key.parse() {
            Ok(n) => n,
            Err(_) => bail!("launch option key {:?} is not a number", key),
        };
        let neighbour = match direction {
            Direction::Up => n.checked_sub(1),
            Direction::Down => n.checked_add(1),
        }
        .map(|m| m.to_string());

        let Some(menu) = self.launch_menu(appid) else {
            bail!("app {} has no launch menu", appid);
        };
        ensure!(menu.contains_key(key), "app {} has no launch option {}", appid, key);
        let Some(neighbour) = neighbour.filter(|m| menu.contains_key(m)) else {
            return Ok(false);
        };

        let menu = launch_menu_mut(self.touch(appid)?);
        if let (Some(this), Some(other)) = (
            menu.get(key).cloned(),
            menu.get(neighbour.as_str()).cloned(),
        ) {
            menu.insert(key, other);
            menu.insert(neighbour.as_str(), this);
        }
        Ok(true)
    }

    /// Restores the app's journaled original content and drops its journal
    /// entry. Takes effect on disk at the next [`save`](Editor::save).
    pub fn revert(&mut self, appid: u32) -> Result<()> {
        ensure!(self.appinfo.get(appid).is_some(), "app {} is not loaded", appid);
        let Some(entry) = self.journal.remove(appid) else {
            bail!("app {} has no modifications to revert", appid);
        };
        if let Some(record) = self.appinfo.get_mut(appid) {
            record.content = entry.original;
        }
        if !self.dirty.contains(&appid) {
            self.dirty.push(appid);
        }
        debug!(appid, "reverted to original content");
        Ok(())
    }

    /// Overwrites every loaded journaled app with its `modified` tree.
    /// Returns how many apps were patched.
    pub fn apply_journal(&mut self) -> usize {
        let mut applied = 0;
        for (appid, entry) in self.journal.iter() {
            let Some(record) = self.appinfo.get_mut(appid) else {
                warn!(appid, "journaled app is not loaded, not applying");
                continue;
            };
            record.content = entry.modified.clone();
            if !self.dirty.contains(&appid) {
                self.dirty.push(appid);
            }
            applied += 1;
        }
        debug!(applied, "applied journal");
        applied
    }

    /// Journals the current content of `appids` and writes the journal. Apps
    /// already journaled keep their original snapshot.
    pub fn export(&mut self, appids: &[u32]) -> Result<()> {
        for &appid in appids {
            let Some(record) = self.appinfo.get(appid) else {
                bail!("app {} is not loaded", appid);
            };
            self.journal.snapshot(appid, &record.content);
            self.journal.set_modified(appid, &record.content);
        }
        self.journal.save()
    }
}

/// `appinfo/config/launch`, created on demand.
fn launch_menu_mut(content: &mut ContentTree) -> &mut ContentTree {
    content
        .dict_entry(LAUNCH_PATH[0])
        .dict_entry(LAUNCH_PATH[1])
        .dict_entry(LAUNCH_PATH[2])
}
