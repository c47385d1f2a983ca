//! Video helpers for pairing subtitles with a video file.

use crate::error::FileError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::trace;

/// Container formats the media collaborator is expected to play.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VideoFormat {
    Mp4,
    Webm,
    Ogg,
    Matroska,
}

impl VideoFormat {
    pub const ALL: [VideoFormat; 4] = [
        VideoFormat::Mp4,
        VideoFormat::Webm,
        VideoFormat::Ogg,
        VideoFormat::Matroska,
    ];

    /// Detect the format from a file name's extension (case-insensitive).
    pub fn from_path(path: &Path) -> Result<Self, FileError> {
        trace!("VideoFormat::from_path(path={})", path.display());
        let ext = path
            .extension()
            .map(|e| e.to_string_lossy().to_ascii_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "mp4" | "m4v" => Ok(VideoFormat::Mp4),
            "webm" => Ok(VideoFormat::Webm),
            "ogg" | "ogv" => Ok(VideoFormat::Ogg),
            "mkv" => Ok(VideoFormat::Matroska),
            _ => Err(FileError::UnsupportedVideo(path.display().to_string())),
        }
    }

    /// Bare MIME type without codec parameters.
    pub fn mime_type(self) -> &'static str {
        match self {
            VideoFormat::Mp4 => "video/mp4",
            VideoFormat::Webm => "video/webm",
            VideoFormat::Ogg => "video/ogg",
            VideoFormat::Matroska => "video/x-matroska",
        }
    }

    /// Codec-qualified MIME types to probe, most specific first. The bare
    /// type is always the last candidate.
    pub fn mime_candidates(self) -> &'static [&'static str] {
        match self {
            VideoFormat::Mp4 => &[
                r#"video/mp4; codecs="avc1.42E01E,mp4a.40.2""#,
                r#"video/mp4; codecs="avc1.4D401E,mp4a.40.2""#,
                r#"video/mp4; codecs="avc1.58A01E,mp4a.40.2""#,
                r#"video/mp4; codecs="avc1.64001E,mp4a.40.2""#,
                "video/mp4",
            ],
            VideoFormat::Webm => &[
                r#"video/webm; codecs="vp8,vorbis""#,
                r#"video/webm; codecs="vp9,opus""#,
                r#"video/webm; codecs="vp8,opus""#,
                "video/webm",
            ],
            VideoFormat::Ogg => &[r#"video/ogg; codecs="theora,vorbis""#, "video/ogg"],
            VideoFormat::Matroska => &[
                r#"video/x-matroska; codecs="avc1.4D401E,mp4a.40.2""#,
                r#"video/x-matroska; codecs="avc1.64001E,mp4a.40.2""#,
                r#"video/x-matroska; codecs="vp8,vorbis""#,
                r#"video/x-matroska; codecs="vp9,opus""#,
                "video/x-matroska",
            ],
        }
    }
}

/// Whether `path` names an SRT file (case-insensitive extension).
pub fn is_srt(path: &Path) -> bool {
    path.extension()
        .map(|e| e.eq_ignore_ascii_case("srt"))
        .unwrap_or(false)
}

/// Name of the exported subtitle file for a video file name.
///
/// The basename is everything before the last `.`; when that is empty (no
/// dot, or a leading dot only) the whole name is used.
pub fn srt_file_name(video_name: &str) -> String {
    let base = match video_name.rfind('.') {
        Some(i) if i > 0 => &video_name[..i],
        _ => video_name,
    };
    format!("{base}.srt")
}
