//! Command dispatch for the interactive shell.
//!
//! Each input line is one command; its output goes to the given writer so
//! the shell can be driven from tests as well as from stdin.

use anyhow::{bail, Context, Result};
use editor::{Direction, Editor, SteamLibraries};
use keyvalues::Value;
use std::io::Write;

pub const HELP: &str = "\
Commands:
  APPS                              list loaded apps (* = modified, + = installed)
  SHOW id                           print an app's header and content
  GET id path                       print one value, path like appinfo/common/name
  NAME id value                     set the display name
  SORTAS id value                   set the sort name
  RELEASE id steam|original ts      set a release date (unix seconds)
  SET id path value                 set a string value
  SETINT id path n                  set a 4-byte integer value
  LAUNCH id                         list launch options
  LAUNCHADD id                      append an empty launch option
  LAUNCHDEL id n                    delete launch option n
  LAUNCHMOVE id n up|down           swap launch option n with its neighbour
  LIBRARIES                         list Steam library folders
  REVERT id                         restore an app's original content
  EXPORT id...                      journal the current content of apps
  SAVE                              write appinfo.vdf and the journal
  HELP                              show this text
  EXIT / QUIT                       leave (unsaved edits are lost)";

/// What the loop should do after a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Exit,
}

pub struct Shell {
    pub editor: Editor,
    pub libraries: Option<SteamLibraries>,
}

impl Shell {
    pub fn new(editor: Editor, libraries: Option<SteamLibraries>) -> Self {
        Self { editor, libraries }
    }

    /// Runs one input line, printing results (or `ERR ...`) to `out`.
    pub fn execute<W: Write>(&mut self, line: &str, out: &mut W) -> Result<Flow> {
        let mut parts = line.split_whitespace();
        let Some(cmd) = parts.next() else {
            return Ok(Flow::Continue);
        };
        let args: Vec<&str> = parts.collect();

        match self.dispatch(&cmd.to_uppercase(), &args, out) {
            Ok(flow) => Ok(flow),
            Err(e) => {
                writeln!(out, "ERR {:#}", e)?;
                Ok(Flow::Continue)
            }
        }
    }

    fn dispatch<W: Write>(&mut self, cmd: &str, args: &[&str], out: &mut W) -> Result<Flow> {
        match cmd {
            "APPS" => self.apps(out)?,
            "SHOW" => {
                let appid = appid_arg(args, "SHOW id")?;
                self.show(appid, out)?;
            }
            "GET" => {
                let appid = appid_arg(args, "GET id path")?;
                let path = path_arg(&args[1..], "GET id path")?;
                match self.editor.get(appid, &path) {
                    Some(value) => writeln!(out, "{}", format_value(value))?,
                    None => writeln!(out, "(nil)")?,
                }
            }
            "NAME" | "SORTAS" => {
                let usage = if cmd == "NAME" { "NAME id value" } else { "SORTAS id value" };
                let appid = appid_arg(args, usage)?;
                let value = rest_arg(&args[1..], usage)?;
                if cmd == "NAME" {
                    self.editor.set_name(appid, &value)?;
                } else {
                    self.editor.set_sortas(appid, &value)?;
                }
                writeln!(out, "OK")?;
            }
            "RELEASE" => {
                const USAGE: &str = "RELEASE id steam|original unix_ts";
                let appid = appid_arg(args, USAGE)?;
                let (Some(which), Some(ts)) = (args.get(1), args.get(2)) else {
                    bail!("usage: {}", USAGE);
                };
                let ts: u32 = ts
                    .parse()
                    .with_context(|| format!("invalid timestamp {:?}", ts))?;
                match which.to_lowercase().as_str() {
                    "steam" => self.editor.set_steam_release_date(appid, ts)?,
                    "original" => self.editor.set_original_release_date(appid, ts)?,
                    _ => bail!("usage: {}", USAGE),
                }
                writeln!(out, "OK")?;
            }
            "SET" => {
                const USAGE: &str = "SET id path value";
                let appid = appid_arg(args, USAGE)?;
                let path = path_arg(args.get(1..2).unwrap_or_default(), USAGE)?;
                let value = rest_arg(args.get(2..).unwrap_or_default(), USAGE)?;
                self.editor.set(appid, &path, value.as_str())?;
                writeln!(out, "OK")?;
            }
            "SETINT" => {
                const USAGE: &str = "SETINT id path n";
                let appid = appid_arg(args, USAGE)?;
                let path = path_arg(args.get(1..2).unwrap_or_default(), USAGE)?;
                let Some(n) = args.get(2) else {
                    bail!("usage: {}", USAGE);
                };
                let n: i32 = n.parse().with_context(|| format!("invalid integer {:?}", n))?;
                self.editor.set(appid, &path, n)?;
                writeln!(out, "OK")?;
            }
            "LAUNCH" => {
                let appid = appid_arg(args, "LAUNCH id")?;
                self.launch(appid, out)?;
            }
            "LAUNCHADD" => {
                let appid = appid_arg(args, "LAUNCHADD id")?;
                let key = self.editor.add_launch_option(appid)?;
                writeln!(out, "OK (option {})", key)?;
            }
            "LAUNCHDEL" => {
                let appid = appid_arg(args, "LAUNCHDEL id n")?;
                let Some(key) = args.get(1) else {
                    bail!("usage: LAUNCHDEL id n");
                };
                self.editor.delete_launch_option(appid, key)?;
                writeln!(out, "OK")?;
            }
            "LAUNCHMOVE" => {
                const USAGE: &str = "LAUNCHMOVE id n up|down";
                let appid = appid_arg(args, USAGE)?;
                let (Some(key), Some(dir)) = (args.get(1), args.get(2)) else {
                    bail!("usage: {}", USAGE);
                };
                let direction = match dir.to_lowercase().as_str() {
                    "up" => Direction::Up,
                    "down" => Direction::Down,
                    _ => bail!("usage: {}", USAGE),
                };
                if self.editor.move_launch_option(appid, key, direction)? {
                    writeln!(out, "OK")?;
                } else {
                    writeln!(out, "(unchanged)")?;
                }
            }
            "LIBRARIES" => match &self.libraries {
                Some(libs) if !libs.libraries.is_empty() => {
                    for lib in &libs.libraries {
                        writeln!(
                            out,
                            "{}\t{}\t({} apps)",
                            lib.id,
                            lib.path.display(),
                            lib.apps.len()
                        )?;
                    }
                }
                _ => writeln!(out, "(no libraries)")?,
            },
            "REVERT" => {
                let appid = appid_arg(args, "REVERT id")?;
                self.editor.revert(appid)?;
                writeln!(out, "OK")?;
            }
            "EXPORT" => {
                if args.is_empty() {
                    bail!("usage: EXPORT id...");
                }
                let ids = args
                    .iter()
                    .map(|a| parse_appid(a))
                    .collect::<Result<Vec<_>>>()?;
                self.editor.export(&ids)?;
                writeln!(out, "OK ({} apps journaled)", ids.len())?;
            }
            "SAVE" => {
                let written = self.editor.save()?;
                writeln!(out, "OK ({} records written)", written)?;
            }
            "HELP" => writeln!(out, "{}", HELP)?,
            "EXIT" | "QUIT" => {
                if self.editor.is_dirty() {
                    writeln!(
                        out,
                        "discarding unsaved changes to {} apps",
                        self.editor.dirty_apps().len()
                    )?;
                }
                writeln!(out, "bye")?;
                return Ok(Flow::Exit);
            }
            other => writeln!(out, "unknown command: {}", other)?,
        }
        Ok(Flow::Continue)
    }

    fn apps<W: Write>(&self, out: &mut W) -> Result<()> {
        for appid in self.editor.app_ids() {
            let modified = if self.editor.is_modified(appid) { "*" } else { "" };
            let installed = self
                .libraries
                .as_ref()
                .map_or(false, |l| l.is_app_installed(appid));
            writeln!(
                out,
                "{}{}{}\t{}",
                appid,
                modified,
                if installed { "+" } else { "" },
                self.editor.name(appid).unwrap_or("(no name)")
            )?;
        }
        writeln!(out, "({} apps)", self.editor.app_count())?;
        Ok(())
    }

    fn show<W: Write>(&self, appid: u32, out: &mut W) -> Result<()> {
        let Some(record) = self.editor.app(appid) else {
            bail!("app {} is not loaded", appid);
        };
        let h = &record.header;
        writeln!(
            out,
            "appid={} size={} state={} last_update={} access_token={} change_number={}",
            h.appid, h.size, h.state, h.last_update, h.access_token, h.change_number
        )?;
        writeln!(out, "checksum_text={}", hex(&h.checksum_text))?;
        writeln!(out, "checksum_binary={}", hex(&h.checksum_binary))?;
        write!(out, "{}", textvdf::render_string(&record.content))?;
        Ok(())
    }

    fn launch<W: Write>(&self, appid: u32, out: &mut W) -> Result<()> {
        let menu = match self.editor.launch_menu(appid) {
            Some(menu) if !menu.is_empty() => menu,
            _ => {
                writeln!(out, "(no launch options)")?;
                return Ok(());
            }
        };
        for (key, option) in menu {
            let field = |name: &str| {
                option
                    .as_dict()
                    .and_then(|o| o.get(name))
                    .map(format_value)
                    .unwrap_or_default()
            };
            writeln!(
                out,
                "{}: {} -> {} {}",
                key,
                field("description"),
                field("executable"),
                field("arguments")
            )?;
        }
        Ok(())
    }
}

fn parse_appid(arg: &str) -> Result<u32> {
    arg.parse()
        .with_context(|| format!("invalid app id {:?}", arg))
}

fn appid_arg(args: &[&str], usage: &str) -> Result<u32> {
    match args.first() {
        Some(arg) => parse_appid(arg),
        None => bail!("usage: {}", usage),
    }
}

/// Path segments from slash-separated tokens: `appinfo/common name` and
/// `appinfo common/name` both give `["appinfo", "common", "name"]`.
fn path_arg<'a>(args: &[&'a str], usage: &str) -> Result<Vec<&'a str>> {
    let path: Vec<&str> = args
        .iter()
        .flat_map(|&a| a.split('/'))
        .filter(|s| !s.is_empty())
        .collect();
    if path.is_empty() {
        bail!("usage: {}", usage);
    }
    Ok(path)
}

fn rest_arg(args: &[&str], usage: &str) -> Result<String> {
    if args.is_empty() {
        bail!("usage: {}", usage);
    }
    Ok(args.join(" "))
}

fn format_value(value: &Value) -> String {
    match value {
        Value::Str(s) => s.as_str().to_string(),
        Value::Int32(n) => n.to_string(),
        Value::Int64(n) => n.to_string(),
        Value::Dict(d) => textvdf::render_string(d).trim_end().to_string(),
    }
}

fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}
