//! Error types shared by the subtitle codec, parser and file helpers.

use thiserror::Error;

/// A time code that is not of the form `HH:MM:SS,mmm`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid time code {text:?}: {reason}")]
pub struct TimeCodeError {
    pub text: String,
    pub reason: &'static str,
}

impl TimeCodeError {
    pub(crate) fn new(text: &str, reason: &'static str) -> Self {
        Self {
            text: text.to_string(),
            reason,
        }
    }
}

/// What is wrong with a single SRT block.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BlockFault {
    /// The block has an id line but nothing after it.
    #[error("missing time line")]
    MissingTimeLine,

    /// The first line is not an integer sequence number.
    #[error("invalid sequence number {0:?}")]
    InvalidId(String),

    /// The time line has no ` --> ` separator.
    #[error("missing ' --> ' separator")]
    MissingSeparator,

    /// One side of the time line failed to parse.
    #[error(transparent)]
    InvalidTimeCode(#[from] TimeCodeError),
}

/// A malformed block, located by its 1-based position in the file.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("block {block}: {fault}")]
pub struct BlockError {
    pub block: usize,
    pub fault: BlockFault,
}

/// Strict parsing stops at the first malformed block.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("malformed SRT input: {0}")]
    Malformed(#[from] BlockError),
}

/// Rejections raised by the file helpers before any bytes are parsed.
#[derive(Error, Debug)]
pub enum FileError {
    #[error("not an SRT file: {0}")]
    NotSrt(String),

    #[error("unsupported video file: {0}")]
    UnsupportedVideo(String),

    #[error("nothing to export: {0}")]
    NothingToExport(&'static str),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Invalid configuration value read from the environment.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid value {value:?} for {key}")]
pub struct ConfigError {
    pub key: &'static str,
    pub value: String,
}
