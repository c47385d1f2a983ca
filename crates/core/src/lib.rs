//! Subtitle timing and playback synchronization for an SRT editing session.
//!
//! The pieces, leaf first: [`srt`] decodes, parses and serializes SRT text,
//! [`timing`] shifts whole sequences, [`sync`] matches subtitles against the
//! playback clock, and [`session::Session`] owns the state and mediates every
//! mutation. [`playback`] drives an external media element against a session.

pub mod config;
pub mod error;
pub mod files;
pub mod playback;
pub mod session;
pub mod srt;
pub mod sync;
pub mod timing;
pub mod video;

pub use config::SyncConfig;
pub use session::Session;
pub use srt::{ParsePolicy, Subtitle};
