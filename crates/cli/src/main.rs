//! # steammeta - Steam metadata editor shell
//!
//! A REPL over one `appinfo.vdf`. Reads commands from stdin, applies them to
//! the loaded apps, and prints results to stdout. Logs go to stderr. Works
//! interactively or with commands piped in.
//!
//! ## Configuration
//!
//! ```text
//! STEAMMETA_STEAM_PATH   Steam install directory        (default: per OS)
//! STEAMMETA_CONFIG_DIR   holds modifications.json       (default: per OS)
//! STEAMMETA_SILENT       re-apply journal, save, exit   (default: "false")
//! STEAMMETA_EXPORT       journal these app ids, exit    (e.g. "10,440")
//! STEAMMETA_LOG          tracing filter                 (default: "warn")
//! ```
//!
//! ## Example
//!
//! ```text
//! $ STEAMMETA_STEAM_PATH=~/.steam/steam steammeta
//! loaded 31337 apps from /home/user/.steam/steam/appcache/appinfo.vdf (V2)
//! > NAME 440 Hat Simulator
//! OK
//! > SAVE
//! OK (1 records written)
//! > EXIT
//! bye
//! ```
//!
//! Silent mode is meant to run after Steam has rewritten its cache: it loads
//! only the apps named in the journal, re-applies their saved content and
//! writes the file back.

mod shell;

use anyhow::{bail, Context, Result};
use config::Config;
use editor::{Editor, SteamLibraries};
use shell::{Flow, Shell};
use std::io::{self, BufRead, Write};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

fn init_logging(filter: &str) {
    let filter = EnvFilter::try_new(filter)
        .unwrap_or_else(|_| EnvFilter::new(config::DEFAULT_LOG_FILTER));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    let config = Config::from_env();
    init_logging(&config.log_filter);

    if !config.verify_steam_path() {
        bail!(
            "no appinfo.vdf found under {} (set {})",
            config.steam_path.display(),
            config::ENV_STEAM_PATH
        );
    }

    if config.silent {
        return silent_patch(&config);
    }
    if config.export.is_some() {
        return export_apps(&config);
    }

    let editor = Editor::open(config.appinfo_path(), config.modifications_path())?;
    let libraries = match SteamLibraries::load(&config.libraryfolders_path()) {
        Ok(libs) => Some(libs),
        Err(e) => {
            warn!("library folders unavailable: {:#}", e);
            None
        }
    };

    println!(
        "loaded {} apps from {} ({:?})",
        editor.app_count(),
        editor.appinfo_path().display(),
        editor.version()
    );
    println!("Type HELP for commands.");

    let mut shell = Shell::new(editor, libraries);
    let stdout = io::stdout();
    let mut out = stdout.lock();
    write!(out, "> ")?;
    out.flush()?;

    for line in io::stdin().lock().lines() {
        let line = line?;
        if shell.execute(&line, &mut out)? == Flow::Exit {
            return Ok(());
        }
        write!(out, "> ")?;
        out.flush()?;
    }

    Ok(())
}

/// Loads only journaled apps, re-applies them and saves.
fn silent_patch(config: &Config) -> Result<()> {
    let mut editor = Editor::open_journaled(config.appinfo_path(), config.modifications_path())?;
    let applied = editor.apply_journal();
    if applied == 0 {
        info!("journal is empty, nothing to patch");
        println!("nothing to patch");
        return Ok(());
    }
    let written = editor.save()?;
    println!("patched {} apps ({} records written)", applied, written);
    Ok(())
}

/// Journals the current content of the `STEAMMETA_EXPORT` apps and exits.
fn export_apps(config: &Config) -> Result<()> {
    let ids = config
        .export_ids()
        .with_context(|| format!("invalid app id in {}", config::ENV_EXPORT))?;
    if ids.is_empty() {
        bail!("{} lists no app ids", config::ENV_EXPORT);
    }
    let mut editor = Editor::open_selected(
        config.appinfo_path(),
        config.modifications_path(),
        ids.iter().copied(),
    )?;
    editor.export(&ids)?;
    info!(apps = ids.len(), "exported apps to journal");
    println!("exported {} apps", ids.len());
    Ok(())
}
