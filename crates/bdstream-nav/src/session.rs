//! Disc session state shared between the reader and UI threads.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use bdstream_core::{format_ticks, StreamKind, Ticks};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::engine::{StillDuration, TitleInfo};
use crate::overlay::OverlayBuffer;
use crate::wait::WaitGate;

/// What the reader does on its next read attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProcessState {
    #[default]
    Normal,
    /// A read or navigation error occurred; retry once from the last good
    /// position.
    Reprocess,
    /// Block until the wait condition is released.
    Wait,
}

/// Why the reader is blocked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitReason {
    StillFrame(StillDuration),
    /// Let the decoder drain across a play-item boundary.
    PlayerDrain,
}

/// Disc name and serial, plus whether the disc opened cleanly.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiscIdentity {
    pub name: String,
    pub serial: String,
    pub valid: bool,
}

/// Stream numbers currently selected for playback.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamSelection {
    pub audio: u32,
    pub interactive: u32,
    pub subtitle: u32,
    pub secondary_audio: u32,
    pub secondary_video: u32,
    pub subtitle_enabled: bool,
    pub secondary_audio_enabled: bool,
    pub secondary_video_enabled: bool,
    pub secondary_video_fullscreen: bool,
}

impl StreamSelection {
    pub fn number(&self, kind: StreamKind) -> u32 {
        match kind {
            StreamKind::Audio => self.audio,
            StreamKind::Interactive => self.interactive,
            StreamKind::Subtitle => self.subtitle,
            StreamKind::SecondaryAudio => self.secondary_audio,
            StreamKind::SecondaryVideo => self.secondary_video,
        }
    }

    pub fn set(&mut self, kind: StreamKind, number: u32) {
        match kind {
            StreamKind::Audio => self.audio = number,
            StreamKind::Interactive => self.interactive = number,
            StreamKind::Subtitle => self.subtitle = number,
            StreamKind::SecondaryAudio => self.secondary_audio = number,
            StreamKind::SecondaryVideo => self.secondary_video = number,
        }
    }

    /// Enable flag for kinds that can be switched off; primary audio and
    /// interactive graphics are always on.
    pub fn enabled(&self, kind: StreamKind) -> bool {
        match kind {
            StreamKind::Audio | StreamKind::Interactive => true,
            StreamKind::Subtitle => self.subtitle_enabled,
            StreamKind::SecondaryAudio => self.secondary_audio_enabled,
            StreamKind::SecondaryVideo => self.secondary_video_enabled,
        }
    }

    pub fn set_enabled(&mut self, kind: StreamKind, enabled: bool) {
        match kind {
            StreamKind::Audio | StreamKind::Interactive => {}
            StreamKind::Subtitle => self.subtitle_enabled = enabled,
            StreamKind::SecondaryAudio => self.secondary_audio_enabled = enabled,
            StreamKind::SecondaryVideo => self.secondary_video_enabled = enabled,
        }
    }
}

/// Mutable navigation state. Guarded by one coarse lock; only the reader
/// thread writes it.
#[derive(Debug, Clone, Default)]
pub struct SessionState {
    pub identity: DiscIdentity,
    pub last_error: Option<String>,

    pub hdmv_navigation: bool,
    pub top_menu_supported: bool,
    pub first_play_supported: bool,

    pub num_titles: u32,
    pub main_title: u32,
    /// `None` while outside the title list (top menu, first play).
    pub current_title: Option<u32>,
    pub current_playlist: u32,
    pub current_playitem: u32,
    /// Zero-based.
    pub current_chapter: u32,
    pub current_angle: u32,
    pub angle_count: u32,
    pub streams: StreamSelection,
    pub title_info: Option<Arc<TitleInfo>>,

    pub title_length: Ticks,
    pub current_time: Ticks,
    /// Bytes handed to the player since open.
    pub total_read_position: u64,
    /// Skew between the disc clock and decoder timestamps.
    pub time_diff: i64,

    /// Edge-triggered; cleared by the first poll.
    pub title_changed: bool,
    /// Bumped on every title or playlist change.
    pub title_generation: u64,
    pub in_menu: bool,
    pub popup_available: bool,
    pub end_of_title: bool,

    pub process_state: ProcessState,
    pub wait_reason: Option<WaitReason>,
    pub wait_since: Option<Instant>,
    pub ignore_wait_states: bool,

    pub last_event: &'static str,
}

impl SessionState {
    pub fn num_chapters(&self) -> u32 {
        self.title_info
            .as_ref()
            .map_or(0, |info| info.chapters.len() as u32)
    }

    pub fn chapter_start_time(&self, chapter: u32) -> Option<Ticks> {
        self.title_info
            .as_ref()?
            .chapters
            .get(chapter as usize)
            .map(|c| c.start)
    }

    /// Clamp a zero-based chapter into the known chapter range.
    pub fn clamp_chapter(&self, chapter: u32) -> u32 {
        match self.num_chapters() {
            0 => chapter,
            n => chapter.min(n - 1),
        }
    }

    pub fn is_in_still_frame(&self) -> bool {
        self.process_state == ProcessState::Wait
            && matches!(self.wait_reason, Some(WaitReason::StillFrame(_)))
    }

    pub fn waiting_for_player(&self) -> bool {
        self.process_state == ProcessState::Wait
            && self.wait_reason == Some(WaitReason::PlayerDrain)
    }

    pub fn enter_wait(&mut self, reason: WaitReason) {
        self.process_state = ProcessState::Wait;
        self.wait_reason = Some(reason);
        self.wait_since = Some(Instant::now());
    }

    pub fn clear_wait(&mut self) {
        if self.process_state == ProcessState::Wait {
            self.process_state = ProcessState::Normal;
        }
        self.wait_reason = None;
        self.wait_since = None;
    }

    /// Human-readable position, e.g. `Title 2/3, chapter 4/12 (0:14:03 / 1:52:10)`.
    pub fn describe_position(&self) -> String {
        match self.current_title {
            Some(title) => format!(
                "Title {}/{}, chapter {}/{} ({} / {})",
                title + 1,
                self.num_titles,
                self.current_chapter + 1,
                self.num_chapters().max(1),
                format_ticks(self.current_time),
                format_ticks(self.title_length),
            ),
            None if self.in_menu => "Menu".to_string(),
            None => format!("Playlist {:05}", self.current_playlist),
        }
    }
}

// ---------------------------------------------------------------------------
// Metadata cache
// ---------------------------------------------------------------------------

/// Title or playlist metadata keyed by number.
///
/// Fetches happen outside the lock; the first insert for a key wins so every
/// caller observes the same `Arc`.
#[derive(Default)]
pub struct InfoCache {
    entries: Mutex<HashMap<u32, Arc<TitleInfo>>>,
}

impl InfoCache {
    pub fn get(&self, key: u32) -> Option<Arc<TitleInfo>> {
        self.entries.lock().get(&key).cloned()
    }

    /// Insert `info` unless another caller got there first; returns the
    /// cached entry either way.
    pub fn insert_if_absent(&self, key: u32, info: TitleInfo) -> Arc<TitleInfo> {
        Arc::clone(
            self.entries
                .lock()
                .entry(key)
                .or_insert_with(|| Arc::new(info)),
        )
    }

    pub fn invalidate(&self, key: u32) {
        self.entries.lock().remove(&key);
    }

    pub fn clear(&self) {
        self.entries.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

/// Everything both threads can reach.
pub(crate) struct Shared {
    pub state: Mutex<SessionState>,
    pub titles: InfoCache,
    pub playlists: InfoCache,
    pub overlays: OverlayBuffer,
    pub gate: WaitGate,
}

impl Shared {
    pub fn new(state: SessionState) -> Self {
        Self {
            state: Mutex::new(state),
            titles: InfoCache::default(),
            playlists: InfoCache::default(),
            overlays: OverlayBuffer::new(),
            gate: WaitGate::new(),
        }
    }
}
