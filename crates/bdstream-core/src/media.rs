//! Media-domain enums and disc-clock helpers.
//!
//! Blu-ray navigation runs on a 90 kHz clock; every timestamp and duration
//! that crosses the engine boundary is expressed in [`Ticks`].

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Disc clock frequency.
pub const TICKS_PER_SECOND: u64 = 90_000;

/// A timestamp or duration on the 90 kHz disc clock.
pub type Ticks = u64;

/// Convert ticks to whole seconds, rounding down.
pub fn ticks_to_secs(ticks: Ticks) -> u64 {
    ticks / TICKS_PER_SECOND
}

/// Convert ticks to a [`Duration`].
pub fn ticks_to_duration(ticks: Ticks) -> Duration {
    let secs = ticks / TICKS_PER_SECOND;
    let rem = ticks % TICKS_PER_SECOND;
    Duration::new(secs, (rem * 1_000_000_000 / TICKS_PER_SECOND) as u32)
}

/// Convert whole seconds to ticks.
pub fn secs_to_ticks(secs: u64) -> Ticks {
    secs.saturating_mul(TICKS_PER_SECOND)
}

/// Format ticks as `H:MM:SS`.
pub fn format_ticks(ticks: Ticks) -> String {
    let total = ticks_to_secs(ticks);
    format!("{}:{:02}:{:02}", total / 3600, (total / 60) % 60, total % 60)
}

// ---------------------------------------------------------------------------
// StreamKind
// ---------------------------------------------------------------------------

/// Selectable elementary-stream categories within a playlist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StreamKind {
    /// Primary audio.
    Audio,
    /// Interactive graphics (menu buttons).
    Interactive,
    /// Presentation graphics or text subtitles.
    Subtitle,
    SecondaryAudio,
    SecondaryVideo,
}

impl fmt::Display for StreamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Audio => write!(f, "audio"),
            Self::Interactive => write!(f, "interactive"),
            Self::Subtitle => write!(f, "subtitle"),
            Self::SecondaryAudio => write!(f, "secondary_audio"),
            Self::SecondaryVideo => write!(f, "secondary_video"),
        }
    }
}

// ---------------------------------------------------------------------------
// VideoRate
// ---------------------------------------------------------------------------

/// Frame rates a Blu-ray video stream may declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VideoRate {
    #[serde(rename = "23.976")]
    Film,
    #[serde(rename = "24")]
    Fps24,
    #[serde(rename = "25")]
    Fps25,
    #[serde(rename = "29.97")]
    Ntsc,
    #[serde(rename = "50")]
    Fps50,
    #[serde(rename = "59.94")]
    NtscDouble,
}

impl VideoRate {
    /// Frames per second.
    pub fn fps(self) -> f64 {
        match self {
            Self::Film => 24000.0 / 1001.0,
            Self::Fps24 => 24.0,
            Self::Fps25 => 25.0,
            Self::Ntsc => 30000.0 / 1001.0,
            Self::Fps50 => 50.0,
            Self::NtscDouble => 60000.0 / 1001.0,
        }
    }
}

impl fmt::Display for VideoRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Film => write!(f, "23.976"),
            Self::Fps24 => write!(f, "24"),
            Self::Fps25 => write!(f, "25"),
            Self::Ntsc => write!(f, "29.97"),
            Self::Fps50 => write!(f, "50"),
            Self::NtscDouble => write!(f, "59.94"),
        }
    }
}
