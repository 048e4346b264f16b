mod library_tests;

use anyhow::Result;
use appinfo::{encode, AppHeader, AppRecord, Appinfo, FormatVersion};
use keyvalues::ContentTree;
use std::fs;
use std::path::{Path, PathBuf};

pub(crate) struct Fixture {
    pub appinfo_path: PathBuf,
    pub modifications_path: PathBuf,
}

pub(crate) fn launch_option(executable: &str, description: &str) -> ContentTree {
    let mut option = ContentTree::new();
    option.insert("executable", executable);
    option.insert("description", description);
    option.insert("type", "default");
    option
}

pub(crate) fn sample_record(appid: u32, name: &str) -> AppRecord {
    let mut content = ContentTree::new();
    content.set_path(&["appinfo", "appid"], appid as i32);
    content.set_path(&["appinfo", "common", "name"], name);
    content.set_path(&["appinfo", "common", "type"], "Game");
    content.set_path(&["appinfo", "common", "steam_release_date"], 1_000_000_000);
    content.set_path(&["appinfo", "config", "installdir"], name);
    let header = AppHeader {
        appid,
        state: 2,
        change_number: 1000 + appid,
        ..AppHeader::default()
    };
    AppRecord::new(header, content)
}

/// Apps 10, 20 and 440. App 10 has two launch options, app 440 has a
/// sort name and an original release date stored as text.
pub(crate) fn sample_appinfo(version: FormatVersion) -> Appinfo {
    let mut appinfo = Appinfo::new(version);

    let mut cs = sample_record(10, "Counter-Strike");
    cs.content
        .set_path(&["appinfo", "config", "launch", "0"], launch_option("hl.exe", "Play"));
    cs.content.set_path(
        &["appinfo", "config", "launch", "1"],
        launch_option("hl.exe", "Safe Mode"),
    );
    appinfo.insert(cs);

    let mut tfc = sample_record(20, "Team Fortress Classic");
    tfc.content.remove("appinfo");
    tfc.content.set_path(&["appinfo", "appid"], 20);
    appinfo.insert(tfc);

    let mut tf2 = sample_record(440, "Team Fortress 2");
    tf2.content
        .set_path(&["appinfo", "common", "sortas"], "Team Fortress Two");
    tf2.content
        .set_path(&["appinfo", "common", "original_release_date"], "1191456000");
    appinfo.insert(tf2);

    appinfo
}

pub(crate) fn write_fixture(dir: &Path, version: FormatVersion) -> Result<Fixture> {
    let appinfo_path = dir.join("steam").join("appcache").join("appinfo.vdf");
    fs::create_dir_all(appinfo_path.parent().unwrap())?;
    fs::write(&appinfo_path, encode(&mut sample_appinfo(version))?)?;
    Ok(Fixture {
        appinfo_path,
        modifications_path: dir.join("config").join("modifications.json"),
    })
}
