//! The navigation engine boundary.
//!
//! A [`NavigationEngine`] is the black-box disc library the session drives:
//! it opens a disc structure, reports titles and playlists, serves the
//! multiplexed stream in blocks and emits [`PendingEvent`]s as a side
//! effect of reads, seeks and navigation requests. The session never parses
//! disc formats itself.
//!
//! Engines are single-thread affine. [`crate::BdBuffer`] owns its engine and
//! only touches it through `&mut self`, so every call originates on the
//! thread that drives reads.

use std::io;
use std::path::Path;

use bdstream_core::{StreamKind, Ticks, VideoRate};
use serde::{Deserialize, Serialize};

use crate::overlay::{ArgbOverlayCommand, OverlayCommand};

/// Size of one aligned unit of the Blu-ray transport stream.
pub const BD_BLOCK_SIZE: usize = 6144;

// ---------------------------------------------------------------------------
// Disc and title metadata
// ---------------------------------------------------------------------------

/// Disc-level facts reported by the engine right after open.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiscInfo {
    /// The path holds a Blu-ray directory structure.
    pub bluray_detected: bool,
    /// Title from the disc's metadata, if authored.
    pub disc_name: Option<String>,
    /// UDF volume identifier.
    pub volume_id: Option<String>,
    /// 20-byte disc identifier (AACS disc id or equivalent).
    pub disc_id: Option<[u8; 20]>,
    pub top_menu_supported: bool,
    pub first_play_supported: bool,
    pub aacs_detected: bool,
    pub aacs_handled: bool,
    pub bdplus_detected: bool,
    pub bdplus_handled: bool,
}

/// One chapter mark within a title.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChapterInfo {
    /// Chapter start on the title timeline.
    pub start: Ticks,
    pub duration: Ticks,
    /// Byte offset of the chapter within the title stream.
    #[serde(default)]
    pub offset: u64,
}

/// One elementary stream of a clip.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamInfo {
    /// Transport stream packet id.
    pub pid: u16,
    /// ISO 639-2 language code; empty for video.
    #[serde(default)]
    pub language: String,
    #[serde(default)]
    pub rate: Option<VideoRate>,
}

/// Streams of one play item.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClipInfo {
    pub video_streams: Vec<StreamInfo>,
    pub audio_streams: Vec<StreamInfo>,
    pub pg_streams: Vec<StreamInfo>,
    pub ig_streams: Vec<StreamInfo>,
    pub sec_audio_streams: Vec<StreamInfo>,
    pub sec_video_streams: Vec<StreamInfo>,
}

impl ClipInfo {
    fn all_streams(&self) -> impl Iterator<Item = &StreamInfo> {
        self.video_streams
            .iter()
            .chain(&self.audio_streams)
            .chain(&self.pg_streams)
            .chain(&self.ig_streams)
            .chain(&self.sec_audio_streams)
            .chain(&self.sec_video_streams)
    }
}

/// Metadata for a title or playlist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TitleInfo {
    /// Title index (position in the engine's title list).
    pub index: u32,
    /// Playlist number (`NNNNN.mpls`).
    pub playlist: u32,
    pub duration: Ticks,
    #[serde(default = "default_angle_count")]
    pub angle_count: u32,
    #[serde(default)]
    pub chapters: Vec<ChapterInfo>,
    #[serde(default)]
    pub clips: Vec<ClipInfo>,
}

fn default_angle_count() -> u32 {
    1
}

impl TitleInfo {
    /// Stream table of the first play item.
    pub fn primary_clip(&self) -> Option<&ClipInfo> {
        self.clips.first()
    }

    /// Frame rate of the primary video stream.
    pub fn frame_rate(&self) -> Option<f64> {
        self.primary_clip()?
            .video_streams
            .first()?
            .rate
            .map(VideoRate::fps)
    }

    /// Look up any stream of the first play item by packet id.
    pub fn find_stream(&self, pid: u16) -> Option<&StreamInfo> {
        self.primary_clip()?.all_streams().find(|s| s.pid == pid)
    }
}

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

/// Player registers the engine consults for language and region decisions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlayerSetting {
    AudioLanguage(String),
    SubtitleLanguage(String),
    MenuLanguage(String),
    Country(String),
    Region(u32),
    ParentalLevel(u32),
}

/// Remote-control keys forwarded to menu navigation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavKey {
    Up,
    Down,
    Left,
    Right,
    Enter,
    Popup,
    Digit(u8),
}

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

/// How long a still frame holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StillDuration {
    Seconds(u32),
    /// Hold until the player explicitly skips.
    Infinite,
}

impl StillDuration {
    /// Engines report still time in seconds with zero meaning "forever".
    pub fn from_secs(secs: u32) -> Self {
        if secs == 0 {
            StillDuration::Infinite
        } else {
            StillDuration::Seconds(secs)
        }
    }
}

/// An event emitted by the engine during a read, seek or navigation call.
#[derive(Debug, Clone, PartialEq)]
pub enum PendingEvent {
    None,
    /// The engine hit an unrecoverable navigation problem.
    NavigationError(String),
    /// A block could not be read from the medium.
    ReadError(String),
    TitleChanged(u32),
    PlaylistStarted(u32),
    PlayItemChanged(u32),
    /// One-based chapter number.
    ChapterChanged(u32),
    AngleChanged(u32),
    /// The current title has no more data.
    EndOfStream,
    PlaylistStopped,
    StillFrameEntered(StillDuration),
    StillFrameCleared,
    /// Popup menu availability changed.
    MenuPopup(bool),
    /// An interactive menu became active or inactive.
    MenuActive(bool),
    MenuOverlayUpdate(OverlayCommand),
    ArgbOverlayUpdate(ArgbOverlayCommand),
    StreamChanged { kind: StreamKind, number: u32 },
    StreamEnabled { kind: StreamKind, enabled: bool },
    SecondaryVideoFullscreen(bool),
    Seek,
    /// The stream timeline jumped; the payload is the new skew between the
    /// disc clock and decoder timestamps.
    Discontinuity(i64),
    Idle,
}

impl PendingEvent {
    /// Short name used in logs and as the retained "last event".
    pub fn name(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::NavigationError(_) => "navigation_error",
            Self::ReadError(_) => "read_error",
            Self::TitleChanged(_) => "title_changed",
            Self::PlaylistStarted(_) => "playlist_started",
            Self::PlayItemChanged(_) => "playitem_changed",
            Self::ChapterChanged(_) => "chapter_changed",
            Self::AngleChanged(_) => "angle_changed",
            Self::EndOfStream => "end_of_stream",
            Self::PlaylistStopped => "playlist_stopped",
            Self::StillFrameEntered(_) => "still_frame_entered",
            Self::StillFrameCleared => "still_frame_cleared",
            Self::MenuPopup(_) => "menu_popup",
            Self::MenuActive(_) => "menu_active",
            Self::MenuOverlayUpdate(_) => "menu_overlay_update",
            Self::ArgbOverlayUpdate(_) => "argb_overlay_update",
            Self::StreamChanged { .. } => "stream_changed",
            Self::StreamEnabled { .. } => "stream_enabled",
            Self::SecondaryVideoFullscreen(_) => "secondary_video_fullscreen",
            Self::Seek => "seek",
            Self::Discontinuity(_) => "discontinuity",
            Self::Idle => "idle",
        }
    }
}

// ---------------------------------------------------------------------------
// Engine traits
// ---------------------------------------------------------------------------

/// Why an engine could not be opened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OpenFailure {
    /// The medium is not ready yet (drive spinning up, mount pending).
    /// Worth retrying.
    NotReady(String),
    /// The path is not a usable disc structure.
    Invalid(String),
}

/// Opens engines by path.
pub trait EngineProvider {
    fn open(&self, path: &Path) -> Result<Box<dyn NavigationEngine>, OpenFailure>;
}

/// The fixed capability surface of a disc navigation library.
///
/// Boolean returns report whether the engine accepted a request; the
/// resulting state change is announced later through [`poll_event`].
///
/// [`poll_event`]: NavigationEngine::poll_event
pub trait NavigationEngine: Send {
    fn disc_info(&self) -> DiscInfo;

    /// Number of playable titles.
    fn title_count(&mut self) -> u32;

    /// Main title as declared by the disc, if any.
    fn main_title(&self) -> Option<u32>;

    fn title_info(&mut self, title: u32, angle: u32) -> Option<TitleInfo>;

    fn playlist_info(&mut self, playlist: u32, angle: u32) -> Option<TitleInfo>;

    /// Raw contents of a file on the disc, relative to the disc root.
    fn read_disc_file(&mut self, path: &str) -> Option<Vec<u8>>;

    fn set_player_setting(&mut self, setting: &PlayerSetting) -> bool;

    /// Start menu navigation from the first-play object.
    fn play(&mut self) -> bool;

    /// Jump to the top menu.
    fn menu_call(&mut self, pts: i64) -> bool;

    fn select_title(&mut self, title: u32) -> bool;

    fn select_playlist(&mut self, playlist: u32) -> bool;

    fn select_angle(&mut self, angle: u32) -> bool;

    fn select_stream(&mut self, kind: StreamKind, number: u32, enable: bool) -> bool;

    /// Read up to `buf.len()` bytes of the current title. `Ok(0)` means
    /// nothing is available right now (end of title or a still frame);
    /// inspect the queued events to tell which.
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize>;

    /// Seek to an absolute byte position; returns the new position.
    fn seek(&mut self, position: u64) -> Option<u64>;

    /// Seek to a zero-based chapter; returns the new byte position.
    fn seek_chapter(&mut self, chapter: u32) -> Option<u64>;

    /// Current byte position within the title.
    fn tell(&self) -> u64;

    /// Current position on the title timeline.
    fn tell_time(&self) -> Ticks;

    /// Size of the current title stream in bytes.
    fn title_size(&self) -> u64;

    /// Zero-based chapter at the current position.
    fn current_chapter(&self) -> u32;

    fn user_input(&mut self, pts: i64, key: NavKey) -> bool;

    fn mouse_select(&mut self, pts: i64, x: u16, y: u16) -> bool;

    /// Release the current still frame.
    fn skip_still(&mut self) -> bool;

    /// Next queued event, in emission order.
    fn poll_event(&mut self) -> Option<PendingEvent>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_title() -> TitleInfo {
        TitleInfo {
            index: 0,
            playlist: 800,
            duration: 90_000 * 60,
            angle_count: 1,
            chapters: vec![],
            clips: vec![ClipInfo {
                video_streams: vec![StreamInfo {
                    pid: 0x1011,
                    language: String::new(),
                    rate: Some(VideoRate::Film),
                }],
                audio_streams: vec![StreamInfo {
                    pid: 0x1100,
                    language: "eng".into(),
                    rate: None,
                }],
                pg_streams: vec![StreamInfo {
                    pid: 0x1200,
                    language: "fra".into(),
                    rate: None,
                }],
                ..ClipInfo::default()
            }],
        }
    }

    #[test]
    fn still_duration_zero_is_infinite() {
        assert_eq!(StillDuration::from_secs(0), StillDuration::Infinite);
        assert_eq!(StillDuration::from_secs(5), StillDuration::Seconds(5));
    }

    #[test]
    fn find_stream_searches_every_table() {
        let title = sample_title();
        assert_eq!(title.find_stream(0x1200).unwrap().language, "fra");
        assert!(title.find_stream(0x1011).is_some());
        assert!(title.find_stream(0x1300).is_none());
    }

    #[test]
    fn frame_rate_comes_from_first_video_stream() {
        let rate = sample_title().frame_rate().unwrap();
        assert!((rate - 23.976).abs() < 0.001);

        let mut bare = sample_title();
        bare.clips.clear();
        assert!(bare.frame_rate().is_none());
    }

    #[test]
    fn title_info_deserializes_with_defaults() {
        let info: TitleInfo =
            serde_json::from_str(r#"{"index": 2, "playlist": 1, "duration": 900}"#).unwrap();
        assert_eq!(info.angle_count, 1);
        assert!(info.chapters.is_empty());
    }

    #[test]
    fn event_names_are_stable() {
        assert_eq!(PendingEvent::TitleChanged(1).name(), "title_changed");
        assert_eq!(
            PendingEvent::StillFrameEntered(StillDuration::Infinite).name(),
            "still_frame_entered"
        );
    }
}
