/// Read path: typed getters over a loaded app's content.
///
/// Every getter returns `None` when the app is not loaded or the field is
/// absent; none of them fail.
use keyvalues::{ContentTree, Value};

use crate::{
    Editor, LAUNCH_PATH, NAME_PATH, ORIGINAL_RELEASE_PATH, SORTAS_PATH, STEAM_RELEASE_PATH,
    TYPE_PATH,
};

impl Editor {
    /// Value at `path` inside the app's content.
    pub fn get(&self, appid: u32, path: &[&str]) -> Option<&Value> {
        self.appinfo.get(appid)?.content.get_path(path)
    }

    pub fn name(&self, appid: u32) -> Option<&str> {
        self.get(appid, NAME_PATH)?.as_str()
    }

    pub fn sortas(&self, appid: u32) -> Option<&str> {
        self.get(appid, SORTAS_PATH)?.as_str()
    }

    /// `common/type`, e.g. `Game`, `Tool`, `DLC`.
    pub fn app_type(&self, appid: u32) -> Option<&str> {
        self.get(appid, TYPE_PATH)?.as_str()
    }

    /// Unix timestamp from `common/steam_release_date`.
    pub fn steam_release_date(&self, appid: u32) -> Option<u32> {
        self.get(appid, STEAM_RELEASE_PATH).and_then(timestamp)
    }

    /// Unix timestamp from `common/original_release_date`.
    pub fn original_release_date(&self, appid: u32) -> Option<u32> {
        self.get(appid, ORIGINAL_RELEASE_PATH).and_then(timestamp)
    }

    /// The `config/launch` dict: one numbered entry per launch option.
    pub fn launch_menu(&self, appid: u32) -> Option<&ContentTree> {
        self.get(appid, LAUNCH_PATH)?.as_dict()
    }

    /// Whether the app has edits that are journaled or not yet saved.
    pub fn is_modified(&self, appid: u32) -> bool {
        self.journal.contains(appid) || self.dirty.contains(&appid)
    }
}

/// Timestamps are usually 4-byte ints but older entries store them as text.
fn timestamp(value: &Value) -> Option<u32> {
    match value {
        Value::Int32(n) => Some(*n as u32),
        Value::Int64(n) => u32::try_from(*n).ok(),
        Value::Str(s) => s.as_str().trim().parse().ok(),
        Value::Dict(_) => None,
    }
}
