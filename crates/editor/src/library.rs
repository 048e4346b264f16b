/// Steam library folders, as listed in `steamapps/libraryfolders.vdf`.
///
/// Only answers which library an app is installed in; resolving install
/// directories from app manifests is left to callers.
use anyhow::{Context, Result};
use keyvalues::{ContentTree, Value};
use std::path::{Path, PathBuf};
use tracing::debug;

/// One entry of `libraryfolders.vdf`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Library {
    /// The entry's key, `"0"` for the main Steam directory.
    pub id: String,
    pub path: PathBuf,
    /// Apps installed in this library, in file order.
    pub apps: Vec<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SteamLibraries {
    pub libraries: Vec<Library>,
}

impl SteamLibraries {
    pub fn load(path: &Path) -> Result<Self> {
        let tree = textvdf::load(path)
            .with_context(|| format!("failed to read library folders at {}", path.display()))?;
        let libraries = Self::from_tree(&tree);
        debug!(path = %path.display(), libraries = libraries.libraries.len(), "loaded library folders");
        Ok(libraries)
    }

    /// Accepts both the current layout (one dict per library with `path` and
    /// `apps`) and the legacy `LibraryFolders` layout (`"1" "D:\\Games"`).
    /// Non-numeric keys such as `ContentStatsID` are skipped.
    pub fn from_tree(tree: &ContentTree) -> Self {
        let root = tree
            .iter()
            .find(|(k, _)| k.as_str().eq_ignore_ascii_case("libraryfolders"))
            .and_then(|(_, v)| v.as_dict());
        let Some(root) = root else {
            return Self::default();
        };

        let libraries = root
            .iter()
            .filter(|(id, _)| id.as_str().parse::<u32>().is_ok())
            .filter_map(|(id, value)| {
                let (path, apps) = match value {
                    Value::Str(path) => (path.as_str(), Vec::new()),
                    Value::Dict(entry) => {
                        let path = entry.get("path")?.as_str()?;
                        let apps = entry
                            .get("apps")
                            .and_then(Value::as_dict)
                            .map(|apps| apps.keys().filter_map(|k| k.as_str().parse().ok()).collect())
                            .unwrap_or_default();
                        (path, apps)
                    }
                    _ => return None,
                };
                Some(Library {
                    id: id.as_str().to_string(),
                    path: PathBuf::from(path),
                    apps,
                })
            })
            .collect();
        Self { libraries }
    }

    pub fn is_app_installed(&self, appid: u32) -> bool {
        self.library_of(appid).is_some()
    }

    pub fn library_of(&self, appid: u32) -> Option<&Library> {
        self.libraries.iter().find(|l| l.apps.contains(&appid))
    }
}
