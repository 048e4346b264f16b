use crate::*;
use anyhow::Result;
use std::fs;
use std::path::PathBuf;
use tempfile::tempdir;

const CURRENT: &str = r#""libraryfolders"
{
	"0"
	{
		"path"		"/home/user/.local/share/Steam"
		"label"		""
		"apps"
		{
			"10"		"123456"
			"440"		"654321"
		}
	}
	"1"
	{
		"path"		"/mnt/games"
		"apps"
		{
			"570"		"1"
		}
	}
}
"#;

const LEGACY: &str = r#""LibraryFolders"
{
	"TimeNextStatsReport"		"1561832278"
	"ContentStatsID"		"-5448400925596747010"
	"1"		"D:\\SteamLibrary"
}
"#;

#[test]
fn current_layout() -> Result<()> {
    let tree = textvdf::parse(CURRENT)?;
    let libs = SteamLibraries::from_tree(&tree);

    assert_eq!(libs.libraries.len(), 2);
    assert_eq!(libs.libraries[0].id, "0");
    assert_eq!(libs.libraries[0].path, PathBuf::from("/home/user/.local/share/Steam"));
    assert_eq!(libs.libraries[0].apps, vec![10, 440]);
    assert!(libs.is_app_installed(570));
    assert_eq!(libs.library_of(570).unwrap().path, PathBuf::from("/mnt/games"));
    assert!(!libs.is_app_installed(20));
    Ok(())
}

#[test]
fn legacy_layout_skips_stats_keys() -> Result<()> {
    let tree = textvdf::parse(LEGACY)?;
    let libs = SteamLibraries::from_tree(&tree);

    assert_eq!(libs.libraries.len(), 1);
    assert_eq!(libs.libraries[0].path, PathBuf::from("D:\\SteamLibrary"));
    assert!(libs.libraries[0].apps.is_empty());
    Ok(())
}

#[test]
fn unrelated_file_has_no_libraries() -> Result<()> {
    let tree = textvdf::parse("\"AppState\"\n{\n\t\"appid\"\t\t\"10\"\n}\n")?;
    assert!(SteamLibraries::from_tree(&tree).libraries.is_empty());
    Ok(())
}

#[test]
fn load_from_disk() -> Result<()> {
    let dir = tempdir()?;
    let path = dir.path().join("libraryfolders.vdf");
    fs::write(&path, CURRENT)?;
    let libs = SteamLibraries::load(&path)?;
    assert!(libs.is_app_installed(10));

    let err = SteamLibraries::load(&dir.path().join("missing.vdf")).unwrap_err();
    assert!(err.to_string().contains("failed to read library folders"));
    Ok(())
}
