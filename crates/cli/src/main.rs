//! Binary entry point for the subtitle sync tool.

mod media;

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use media::SimulatedMedia;
use std::path::{Path, PathBuf};
use std::time::Duration;
use subsync_core::playback::Player;
use subsync_core::srt::{format_time_code, parse_time_code};
use subsync_core::{video, ParsePolicy, Session, SyncConfig};
use tracing::{info, trace, warn};
use tracing_subscriber::EnvFilter;

/// Command line options for the binary.
#[derive(Parser)]
#[command(about = "Inspect, retime and preview SRT subtitles")]
struct Cli {
    /// Enable verbose debug and trace logs.
    #[arg(long, global = true)]
    debug: bool,

    /// Fail on the first malformed block instead of skipping it.
    #[arg(long, global = true)]
    strict: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List the parsed subtitles.
    Inspect {
        input: PathBuf,

        /// Print the session snapshot as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Show the current and next subtitle at a point in time.
    Locate {
        input: PathBuf,

        /// Milliseconds or HH:MM:SS,mmm.
        #[arg(long, value_parser = parse_time, allow_hyphen_values = true)]
        at: i64,

        /// Shift all subtitles by this many milliseconds first.
        #[arg(long, allow_hyphen_values = true)]
        shift: Option<i64>,
    },

    /// Edit subtitles and write the result as SRT.
    Rewrite {
        input: PathBuf,

        /// Shift all subtitles by this many milliseconds (repeatable, applied in order).
        #[arg(long, allow_hyphen_values = true)]
        shift: Vec<i64>,

        /// Undo all shifts again after applying them.
        #[arg(long)]
        reset: bool,

        /// Delete every subtitle with this id (repeatable).
        #[arg(long)]
        delete: Vec<u32>,

        /// Replace a subtitle's text, as `<id>=<text>`; `\n` starts a new line.
        #[arg(long, value_parser = parse_edit)]
        edit: Vec<(u32, String)>,

        /// Video file the subtitles belong to; names the output `<video>.srt`.
        #[arg(long)]
        video: Option<String>,

        /// Output file. Defaults to stdout unless `--video` is given.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Play the subtitles against a simulated clock.
    Play {
        input: PathBuf,

        /// Start position, milliseconds or HH:MM:SS,mmm.
        #[arg(long, value_parser = parse_time, default_value = "0")]
        from: i64,

        /// Stop position. Defaults to the end of the last subtitle.
        #[arg(long, value_parser = parse_time)]
        until: Option<i64>,

        /// Shift all subtitles by this many milliseconds first.
        #[arg(long, allow_hyphen_values = true)]
        shift: Option<i64>,
    },
}

/// Application entry point which parses CLI args and performs actions.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let filter = if cli.debug {
        EnvFilter::default()
            .add_directive("subsync=trace".parse()?)
            .add_directive("subsync_core=trace".parse()?)
            .add_directive("info".parse()?)
    } else {
        EnvFilter::default()
            .add_directive("subsync=info".parse()?)
            .add_directive("subsync_core=info".parse()?)
            .add_directive("warn".parse()?)
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let mut config = SyncConfig::from_env()?;
    if cli.strict {
        config.parse_policy = ParsePolicy::Strict;
    }
    let mut session = Session::new(config);

    match cli.command {
        Command::Inspect { input, json } => {
            load(&mut session, &input).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&session.snapshot())?);
            } else {
                for sub in session.subtitles() {
                    println!("{}", describe(sub));
                }
            }
        }
        Command::Locate { input, at, shift } => {
            load(&mut session, &input).await?;
            if let Some(delta) = shift {
                session.shift(delta);
            }
            session.advance_clock(at);
            let located = session.located();
            println!(
                "current: {}",
                located.current.map(describe).unwrap_or_else(|| "-".into())
            );
            println!(
                "next:    {}",
                located.next.map(describe).unwrap_or_else(|| "-".into())
            );
        }
        Command::Rewrite {
            input,
            shift,
            reset,
            delete,
            edit,
            video,
            output,
        } => {
            load(&mut session, &input).await?;
            rewrite(&mut session, &shift, reset, &delete, &edit);
            let target = match (output, video) {
                (Some(path), _) => Some(path),
                (None, Some(video)) => {
                    session.set_video(&video);
                    let name = session
                        .export_file_name()
                        .ok_or_else(|| anyhow!("no subtitles left to export"))?;
                    Some(input.with_file_name(name))
                }
                (None, None) => None,
            };
            match target {
                Some(path) => {
                    tokio::fs::write(&path, session.export())
                        .await
                        .with_context(|| format!("writing {}", path.display()))?;
                    info!("wrote {}", path.display());
                }
                None => println!("{}", String::from_utf8_lossy(&session.export())),
            }
        }
        Command::Play {
            input,
            from,
            until,
            shift,
        } => {
            load(&mut session, &input).await?;
            if let Some(delta) = shift {
                session.shift(delta);
            }
            play(&mut session, &input, from, until).await?;
        }
    }
    Ok(())
}

/// Read an SRT file and load it into the session.
async fn load(session: &mut Session, path: &Path) -> Result<()> {
    trace!("load path={}", path.display());
    if !video::is_srt(path) {
        return Err(anyhow!("not an SRT file: {}", path.display()));
    }
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("reading {}", path.display()))?;
    let name = path
        .file_name()
        .unwrap_or_default()
        .to_string_lossy()
        .to_string();
    let summary = session
        .load_bytes(&name, &bytes)
        .with_context(|| format!("parsing {}", path.display()))?;
    for skipped in &summary.skipped {
        warn!("skipped {}", skipped);
    }
    if summary.lossy_decode {
        warn!("{} still has undecodable bytes", name);
    }
    info!(
        "{} subtitles from {} ({}, {:?} parsing)",
        summary.count, name, summary.encoding, summary.policy
    );
    Ok(())
}

/// Apply the `rewrite` edits in a fixed order: shifts, reset, deletes, edits.
fn rewrite(
    session: &mut Session,
    shifts: &[i64],
    reset: bool,
    delete: &[u32],
    edit: &[(u32, String)],
) {
    for &delta in shifts.iter().filter(|&&d| d != 0) {
        let summary = session.shift(delta);
        if summary.clamped > 0 {
            warn!(
                "{} times clamped at 0 by a {} ms shift",
                summary.clamped, delta
            );
        }
    }
    if reset {
        session.shift(0);
        if session.is_lossy() {
            warn!("reset could not restore times that were clamped at 0");
        }
    }
    for &id in delete {
        if session.delete_by_id(id) == 0 {
            warn!("no subtitle with id {}", id);
        }
    }
    for (id, text) in edit {
        if session.edit_text_by_id(*id, text) == 0 {
            warn!("no subtitle with id {}", id);
        }
    }
}

/// Play from `from` to `until`, printing every change of the current subtitle.
async fn play(session: &mut Session, input: &Path, from: i64, until: Option<i64>) -> Result<()> {
    let end = until
        .or_else(|| {
            session
                .subtitles()
                .iter()
                .map(|s| i64::try_from(s.end_ms).unwrap_or(i64::MAX))
                .max()
        })
        .ok_or_else(|| anyhow!("nothing to play"))?;
    let mut player = Player::new(SimulatedMedia::new(end));
    session.set_video(&input.display().to_string());
    player.toggle_play(session).await?;
    player.on_loaded(session).await?;
    player.seek(session, from);

    let tick = Duration::from_millis(session.config().tick_interval_ms);
    let mut interval = tokio::time::interval(tick);
    let mut shown: Option<u32> = None;
    let mut first = true;
    loop {
        interval.tick().await;
        player.on_time_update(session);
        let current = session.current().map(|s| s.id);
        if first || current != shown {
            let stamp = format_time_code(u64::try_from(session.current_time()).unwrap_or(0));
            match session.current() {
                Some(sub) => println!("[{stamp}] {}", sub.text.replace('\n', " / ")),
                None => {
                    let next = session
                        .next()
                        .map(|s| format!("next at {}", format_time_code(s.start_ms)))
                        .unwrap_or_else(|| "no more subtitles".into());
                    println!("[{stamp}] -- ({next})");
                }
            }
            shown = current;
            first = false;
        }
        if player.media().is_finished() {
            break;
        }
    }
    player.stop(session);
    Ok(())
}

fn describe(sub: &subsync_core::Subtitle) -> String {
    format!(
        "#{} {} --> {} {}",
        sub.id,
        format_time_code(sub.start_ms),
        format_time_code(sub.end_ms),
        sub.text.replace('\n', " / ")
    )
}

/// Accept plain milliseconds or an SRT time code.
fn parse_time(value: &str) -> Result<i64, String> {
    if let Ok(ms) = value.parse::<i64>() {
        return Ok(ms);
    }
    parse_time_code(value)
        .map_err(|e| e.to_string())
        .and_then(|ms| i64::try_from(ms).map_err(|e| e.to_string()))
}

fn parse_edit(value: &str) -> Result<(u32, String), String> {
    let (id, text) = value
        .split_once('=')
        .ok_or_else(|| format!("expected <id>=<text>, got {value:?}"))?;
    let id = id
        .trim()
        .parse::<u32>()
        .map_err(|_| format!("invalid subtitle id {id:?}"))?;
    Ok((id, text.replace("\\n", "\n")))
}
