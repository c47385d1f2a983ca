//! Reading subtitle files into a session and writing exports next to a video.

use crate::error::FileError;
use crate::session::{LoadSummary, Session};
use crate::video;
use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, trace};

/// Read an `.srt` file and load it into `session`, replacing what was there.
pub fn load_subtitle_file(session: &mut Session, path: &Path) -> Result<LoadSummary> {
    trace!("load_subtitle_file path={}", path.display());
    if !video::is_srt(path) {
        return Err(FileError::NotSrt(path.display().to_string()).into());
    }
    let bytes = fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    let name = path
        .file_name()
        .unwrap_or_default()
        .to_string_lossy()
        .to_string();
    let summary = session
        .load_bytes(&name, &bytes)
        .with_context(|| format!("parsing {}", path.display()))?;
    info!(
        "loaded {} subtitles from {} ({})",
        summary.count,
        path.display(),
        summary.encoding
    );
    Ok(summary)
}

/// Write the session's subtitles to `<video-basename>.srt` inside `dir`.
pub fn export_subtitles(session: &Session, dir: &Path) -> Result<PathBuf> {
    trace!("export_subtitles dir={}", dir.display());
    if session.subtitles().is_empty() {
        return Err(FileError::NothingToExport("no subtitles loaded").into());
    }
    let name = session
        .export_file_name()
        .ok_or(FileError::NothingToExport("no video loaded"))?;
    let out_path = dir.join(name);
    fs::write(&out_path, session.export())
        .with_context(|| format!("writing {}", out_path.display()))?;
    info!("wrote {}", out_path.display());
    Ok(out_path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const EXAMPLE: &str = "2\n00:00:03,000 --> 00:00:04,000\nSecond line\n\n1\n00:00:01,000 --> 00:00:02,500\nHello world\n";

    #[test]
    fn loads_then_exports_next_to_video() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("orig.srt");
        fs::write(&path, EXAMPLE).unwrap();

        let mut session = Session::default();
        let summary = load_subtitle_file(&mut session, &path).unwrap();
        assert_eq!(summary.count, 2);
        assert_eq!(session.subtitle_file(), Some("orig.srt"));

        session.set_video("trip.final.mp4");
        session.shift(500);
        let out = export_subtitles(&session, dir.path()).unwrap();
        assert_eq!(out, dir.path().join("trip.final.srt"));
        let written = fs::read_to_string(out).unwrap();
        assert_eq!(
            written,
            "1\n00:00:01,500 --> 00:00:03,000\nHello world\n\n2\n00:00:03,500 --> 00:00:04,500\nSecond line"
        );
    }

    #[test]
    fn reads_latin1_files() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("es.srt");
        fs::write(&path, b"1\n00:00:00,000 --> 00:00:01,000\nCanci\xF3n\n").unwrap();
        let mut session = Session::default();
        load_subtitle_file(&mut session, &path).unwrap();
        assert_eq!(session.subtitles()[0].text, "Canción");
    }

    #[test]
    fn rejects_non_srt_names() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        fs::write(&path, EXAMPLE).unwrap();
        let mut session = Session::default();
        let err = load_subtitle_file(&mut session, &path).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<FileError>(),
            Some(FileError::NotSrt(_))
        ));
        assert!(session.subtitles().is_empty());
    }

    #[test]
    fn export_needs_subtitles_and_video() {
        let dir = tempdir().unwrap();
        let mut session = Session::default();
        assert!(export_subtitles(&session, dir.path()).is_err());
        session.load_bytes("a.srt", EXAMPLE.as_bytes()).unwrap();
        let err = export_subtitles(&session, dir.path()).unwrap_err();
        assert!(err.to_string().contains("no video"));
    }
}
