use serde::{Deserialize, Serialize, Serializer};
use std::borrow::Borrow;
use std::fmt;
use std::hash::{Hash, Hasher};

/// Marker appended to Latin‑1 sourced strings in their JSON form.
const LATIN1_MARKER: char = '\u{6}';

/// Byte encoding a [`VdfString`] was decoded from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Encoding {
    #[default]
    Utf8,
    /// The source bytes were not valid UTF-8 and were read one byte per char.
    Latin1,
}

/// A key or string value from an appinfo tree.
///
/// Steam stores some localized strings as raw ISO-8859-1 bytes. Those are
/// decoded as Latin‑1 and remember it, so [`to_bytes`](VdfString::to_bytes)
/// gives back the exact bytes that were read.
///
/// Equality and hashing only look at the text, which lets a
/// [`ContentTree`](crate::ContentTree) be indexed with a plain `&str`.
#[derive(Clone, Default, Deserialize)]
#[serde(from = "MarkedString")]
pub struct VdfString {
    text: String,
    encoding: Encoding,
}

impl VdfString {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            encoding: Encoding::Utf8,
        }
    }

    /// Decodes raw bytes, falling back to Latin‑1 when they are not UTF-8.
    pub fn decode(bytes: &[u8]) -> Self {
        match std::str::from_utf8(bytes) {
            Ok(s) => Self::new(s),
            Err(_) => Self {
                text: bytes.iter().map(|&b| b as char).collect(),
                encoding: Encoding::Latin1,
            },
        }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn encoding(&self) -> Encoding {
        self.encoding
    }

    pub fn is_latin1(&self) -> bool {
        self.encoding == Encoding::Latin1
    }

    /// Re-encodes the string into the byte sequence it came from.
    pub fn to_bytes(&self) -> Vec<u8> {
        match self.encoding {
            Encoding::Utf8 => self.text.as_bytes().to_vec(),
            // every char of a Latin‑1 string is <= U+00FF
            Encoding::Latin1 => self.text.chars().map(|c| c as u32 as u8).collect(),
        }
    }
}

impl PartialEq for VdfString {
    fn eq(&self, other: &Self) -> bool {
        self.text == other.text
    }
}

impl Eq for VdfString {}

impl Hash for VdfString {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.text.hash(state);
    }
}

impl Borrow<str> for VdfString {
    fn borrow(&self) -> &str {
        &self.text
    }
}

impl PartialEq<str> for VdfString {
    fn eq(&self, other: &str) -> bool {
        self.text == other
    }
}

impl PartialEq<&str> for VdfString {
    fn eq(&self, other: &&str) -> bool {
        self.text == *other
    }
}

impl From<&str> for VdfString {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for VdfString {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl fmt::Debug for VdfString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.encoding {
            Encoding::Utf8 => write!(f, "{:?}", self.text),
            Encoding::Latin1 => write!(f, "latin1:{:?}", self.text),
        }
    }
}

impl fmt::Display for VdfString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

impl Serialize for VdfString {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.encoding {
            Encoding::Utf8 => serializer.serialize_str(&self.text),
            Encoding::Latin1 => {
                let mut marked = String::with_capacity(self.text.len() + 1);
                marked.push_str(&self.text);
                marked.push(LATIN1_MARKER);
                serializer.serialize_str(&marked)
            }
        }
    }
}

#[derive(Deserialize)]
struct MarkedString(String);

impl From<MarkedString> for VdfString {
    fn from(MarkedString(mut text): MarkedString) -> Self {
        if text.ends_with(LATIN1_MARKER) {
            text.pop();
            Self {
                text,
                encoding: Encoding::Latin1,
            }
        } else {
            Self::new(text)
        }
    }
}
