//! Best-effort text decoding for uploaded subtitle bytes.
//!
//! UTF-8 is tried first. When the result contains U+FFFD the bytes are
//! decoded again as Latin-1 and as Windows-1252 and one of those is picked:
//! Windows-1252 if Latin-1 still has replacement characters and Windows-1252
//! has none, otherwise Latin-1 if it has none, otherwise the UTF-8 text is kept
//! as is. This is a heuristic; it picks a clean decode, not a correct one.
//!
//! Labels go through the WHATWG encoding registry, where `iso-8859-1` names
//! Windows-1252. Both fallbacks therefore behave the way a browser
//! `TextDecoder` does for those labels.

use encoding_rs::{Encoding, UTF_8, WINDOWS_1252};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, trace};

const REPLACEMENT: char = '\u{FFFD}';

/// The decoding that produced the text handed to the parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TextEncoding {
    Utf8,
    Latin1,
    Windows1252,
}

impl TextEncoding {
    /// WHATWG label used to look the decoder up.
    pub fn label(self) -> &'static str {
        match self {
            TextEncoding::Utf8 => "utf-8",
            TextEncoding::Latin1 => "iso-8859-1",
            TextEncoding::Windows1252 => "windows-1252",
        }
    }

    fn encoding(self) -> &'static Encoding {
        Encoding::for_label(self.label().as_bytes()).unwrap_or(WINDOWS_1252)
    }
}

impl fmt::Display for TextEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Decoded text plus the encoding that was chosen for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decoded {
    pub text: String,
    pub encoding: TextEncoding,
    /// The chosen text still contains replacement characters.
    pub lossy: bool,
}

/// Decode `bytes` using the UTF-8 / Latin-1 / Windows-1252 fallback.
/// A leading UTF-8 byte-order mark is dropped.
pub fn decode(bytes: &[u8]) -> Decoded {
    trace!("decode(len={})", bytes.len());
    let (utf8, _) = UTF_8.decode_with_bom_removal(bytes);
    if !utf8.contains(REPLACEMENT) {
        return Decoded {
            text: utf8.into_owned(),
            encoding: TextEncoding::Utf8,
            lossy: false,
        };
    }

    let latin1 = decode_as(TextEncoding::Latin1, bytes);
    let windows1252 = decode_as(TextEncoding::Windows1252, bytes);
    let latin1_dirty = latin1.contains(REPLACEMENT);
    let windows1252_dirty = windows1252.contains(REPLACEMENT);
    let chosen = if latin1_dirty && !windows1252_dirty {
        Decoded {
            text: windows1252,
            encoding: TextEncoding::Windows1252,
            lossy: false,
        }
    } else if !latin1_dirty {
        Decoded {
            text: latin1,
            encoding: TextEncoding::Latin1,
            lossy: false,
        }
    } else {
        Decoded {
            text: utf8.into_owned(),
            encoding: TextEncoding::Utf8,
            lossy: true,
        }
    };
    debug!(
        "utf-8 decode had replacement characters, using {}",
        chosen.encoding
    );
    chosen
}

fn decode_as(encoding: TextEncoding, bytes: &[u8]) -> String {
    let (text, _) = encoding.encoding().decode_without_bom_handling(bytes);
    text.into_owned()
}
