//! This module is responsible for SRT parsing and serialization.
//! It reads raw uploaded bytes into subtitles and writes them back as SRT text.

pub mod encoding;
pub mod timecode;

pub use encoding::{decode, Decoded, TextEncoding};
pub use timecode::{format_time_code, parse_time_code};

use crate::error::{BlockError, BlockFault, ParseError};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;
use tracing::{debug, trace, warn};

/// A single subtitle entry (id, time range, caption text).
///
/// `id` is the sequence number read from the source file. It is the key for
/// edits and deletes and is never recomputed; only serialization renumbers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subtitle {
    pub id: u32,
    pub start_ms: u64,
    pub end_ms: u64,
    /// Caption text, lines joined with `\n`.
    pub text: String,
}

impl Subtitle {
    /// Whether `time_ms` lies within `[start_ms, end_ms]`.
    pub fn contains(&self, time_ms: i64) -> bool {
        let start = i64::try_from(self.start_ms).unwrap_or(i64::MAX);
        let end = i64::try_from(self.end_ms).unwrap_or(i64::MAX);
        start <= time_ms && time_ms <= end
    }

    /// Whether the subtitle starts strictly after `time_ms`.
    pub fn starts_after(&self, time_ms: i64) -> bool {
        i64::try_from(self.start_ms).map_or(true, |start| start > time_ms)
    }
}

/// How malformed blocks are handled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParsePolicy {
    /// Skip malformed blocks, keep the rest and report what was skipped.
    #[default]
    Lenient,
    /// Fail the whole parse on the first malformed block.
    Strict,
}

/// Result of a successful parse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseReport {
    /// Subtitles in file order.
    pub subtitles: Vec<Subtitle>,
    pub encoding: TextEncoding,
    /// The decoded text still contains replacement characters.
    pub lossy: bool,
    pub policy: ParsePolicy,
    /// Blocks dropped under [`ParsePolicy::Lenient`]; empty when strict.
    pub skipped: Vec<BlockError>,
}

/// Decode raw bytes and parse them as SRT.
pub fn parse_srt(bytes: &[u8], policy: ParsePolicy) -> Result<ParseReport, ParseError> {
    trace!("parse_srt(len={}, policy={:?})", bytes.len(), policy);
    let decoded = decode(bytes);
    let (subtitles, skipped) = parse_text(&decoded.text, policy)?;
    Ok(ParseReport {
        subtitles,
        encoding: decoded.encoding,
        lossy: decoded.lossy,
        policy,
        skipped,
    })
}

/// Parse already decoded SRT text.
/// Blocks keep file order; nothing is sorted by time here.
pub fn parse_text(
    input: &str,
    policy: ParsePolicy,
) -> Result<(Vec<Subtitle>, Vec<BlockError>), ParseError> {
    let input = input.trim_start_matches('\u{FEFF}').trim();
    if input.is_empty() {
        return Ok((Vec::new(), Vec::new()));
    }
    let mut subtitles = Vec::new();
    let mut skipped = Vec::new();
    for (i, block) in block_separator().split(input).enumerate() {
        match parse_block(block) {
            Ok(sub) => subtitles.push(sub),
            Err(fault) => {
                let err = BlockError {
                    block: i + 1,
                    fault,
                };
                match policy {
                    ParsePolicy::Strict => return Err(err.into()),
                    ParsePolicy::Lenient => {
                        warn!("skipping {}", err);
                        skipped.push(err);
                    }
                }
            }
        }
    }
    debug!(
        "parsed {} subtitles, skipped {} blocks",
        subtitles.len(),
        skipped.len()
    );
    Ok((subtitles, skipped))
}

/// Blank-line boundaries, tolerating whitespace on the blank lines.
fn block_separator() -> &'static Regex {
    static SEPARATOR: OnceLock<Regex> = OnceLock::new();
    SEPARATOR.get_or_init(|| Regex::new(r"\n\s*\n").expect("block separator pattern is valid"))
}

fn parse_block(block: &str) -> Result<Subtitle, BlockFault> {
    let mut lines = block.trim().lines();
    let id_line = lines.next().unwrap_or_default().trim();
    let id = id_line
        .parse::<u32>()
        .map_err(|_| BlockFault::InvalidId(id_line.to_string()))?;
    let time_line = lines.next().ok_or(BlockFault::MissingTimeLine)?;
    let (start, end) = time_line
        .trim()
        .split_once(" --> ")
        .ok_or(BlockFault::MissingSeparator)?;
    let start_ms = parse_time_code(start.trim())?;
    let end_ms = parse_time_code(end.trim())?;
    let text = lines.collect::<Vec<_>>().join("\n");
    Ok(Subtitle {
        id,
        start_ms,
        end_ms,
        text,
    })
}

/// Format subtitles back to SRT text.
///
/// A copy is sorted by start time (stable, so ties keep their order) and
/// renumbered from 1. Blocks are separated by one blank line with no trailing
/// newline after the last block.
pub fn format(subtitles: &[Subtitle]) -> String {
    trace!("format(count={})", subtitles.len());
    let mut sorted: Vec<&Subtitle> = subtitles.iter().collect();
    sorted.sort_by_key(|s| s.start_ms);
    sorted
        .iter()
        .enumerate()
        .map(|(i, sub)| {
            format!(
                "{}\n{} --> {}\n{}",
                i + 1,
                format_time_code(sub.start_ms),
                format_time_code(sub.end_ms),
                sub.text
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}
