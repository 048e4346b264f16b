//! # TextVDF - plaintext Valve Data Format
//!
//! The brace-nested text variant of VDF used by `libraryfolders.vdf` and
//! `appmanifest_*.acf`, and the canonical rendering Steam hashes to produce
//! the text checksum of an appinfo record.
//!
//! ```text
//! "libraryfolders"
//! {
//!     "0"
//!     {
//!         "path"      "/home/user/.local/share/Steam"
//!     }
//! }
//! ```
//!
//! Nesting is one tab per level, leaves are `"key"\t\t"value"`, and
//! backslashes are doubled.

mod parser;
mod render;

use std::path::Path;

pub use parser::{parse, TextVdfDecodeError};
pub use render::{render, render_string};

/// Errors from [`load`].
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Decode(#[from] TextVdfDecodeError),
}

/// Reads and parses a text VDF file.
pub fn load<P: AsRef<Path>>(path: P) -> Result<keyvalues::ContentTree, LoadError> {
    let text = std::fs::read_to_string(path)?;
    Ok(parse(&text)?)
}
