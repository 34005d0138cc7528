//! A deterministic in-process navigation engine driven by a JSON disc
//! description.
//!
//! The description lists titles with chapters, stream tables and a
//! synthetic payload, plus optional still frames, injected read faults and
//! a first-play menu. Payload byte `i` of a title is
//! `seed + (i % 251)` (wrapping), so readers can verify exactly which
//! bytes they received.

use std::collections::VecDeque;
use std::io;
use std::path::Path;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use bdstream_core::{secs_to_ticks, StreamKind, Ticks};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::engine::{
    ChapterInfo, ClipInfo, DiscInfo, EngineProvider, NavKey, NavigationEngine, OpenFailure,
    PendingEvent, PlayerSetting, StillDuration, TitleInfo,
};
use crate::overlay::{OverlayOp, OverlayPlaneId, OverlayUpdate, PalettedBitmap};

/// Title number the engine reports while running the first-play object.
pub const FIRST_PLAY_TITLE: u32 = 0xFFFF;
/// Title number the engine reports while in the top menu.
pub const TOP_MENU_TITLE: u32 = 0xFFFE;

// ---------------------------------------------------------------------------
// Disc description
// ---------------------------------------------------------------------------

/// A complete scripted disc.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScriptedDisc {
    #[serde(default = "default_true")]
    pub bluray: bool,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub volume_id: Option<String>,
    /// 40 hex digits.
    #[serde(default)]
    pub disc_id: Option<String>,
    #[serde(default)]
    pub top_menu: bool,
    #[serde(default)]
    pub encryption: Encryption,
    /// Main title as authored on the disc.
    #[serde(default)]
    pub main_title: Option<u32>,
    /// Contents served for `BDMV/index.bdmv`.
    #[serde(default)]
    pub index_bdmv: Option<String>,
    pub titles: Vec<ScriptedTitle>,
    #[serde(default)]
    pub menu: Option<ScriptedMenu>,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Encryption {
    pub aacs: bool,
    pub aacs_handled: bool,
    pub bdplus: bool,
    pub bdplus_handled: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScriptedTitle {
    pub playlist: u32,
    pub duration_secs: u64,
    /// Chapter start times in seconds.
    #[serde(default)]
    pub chapters: Vec<u64>,
    #[serde(default = "default_angles")]
    pub angles: u32,
    #[serde(default)]
    pub clips: Vec<ClipInfo>,
    pub payload: Payload,
    /// Byte offsets where a new play item begins.
    #[serde(default)]
    pub playitem_boundaries: Vec<u64>,
    #[serde(default)]
    pub still: Option<StillPoint>,
    #[serde(default)]
    pub faults: Vec<Fault>,
    /// Decoder timestamp skew announced when the title starts.
    #[serde(default)]
    pub timestamp_offset: Option<i64>,
    /// Reject every seek within this title.
    #[serde(default)]
    pub refuse_seeks: bool,
}

fn default_angles() -> u32 {
    1
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Payload {
    pub size: u64,
    #[serde(default)]
    pub seed: u8,
}

impl Payload {
    pub fn byte_at(&self, offset: u64) -> u8 {
        self.seed.wrapping_add((offset % 251) as u8)
    }
}

/// A still frame held when the read position reaches `at`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct StillPoint {
    pub at: u64,
    /// 0 holds until skipped.
    #[serde(default)]
    pub seconds: u32,
    /// Report a navigation error when the still is released.
    #[serde(default)]
    pub error_on_release: bool,
}

/// Reads starting at `at` fail `count` times.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Fault {
    pub at: u64,
    #[serde(default = "default_fault_count")]
    pub count: u32,
}

fn default_fault_count() -> u32 {
    1
}

/// A first-play menu showing one button that starts `enter_title`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScriptedMenu {
    pub playlist: u32,
    pub enter_title: u32,
    #[serde(default)]
    pub button: Option<MenuButton>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MenuButton {
    pub x: u16,
    pub y: u16,
    pub bitmap: PalettedBitmap,
}

impl MenuButton {
    fn contains(&self, x: u16, y: u16) -> bool {
        x >= self.x
            && y >= self.y
            && u32::from(x) < u32::from(self.x) + u32::from(self.bitmap.width)
            && u32::from(y) < u32::from(self.y) + u32::from(self.bitmap.height)
    }
}

impl ScriptedDisc {
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    fn disc_id_bytes(&self) -> Option<[u8; 20]> {
        let raw = hex::decode(self.disc_id.as_deref()?).ok()?;
        raw.try_into().ok()
    }

    fn title_info(&self, index: u32) -> Option<TitleInfo> {
        let title = self.titles.get(index as usize)?;
        let duration = secs_to_ticks(title.duration_secs);
        let size = title.payload.size;
        let chapters = title
            .chapters
            .iter()
            .enumerate()
            .map(|(i, &start)| {
                let end = title
                    .chapters
                    .get(i + 1)
                    .copied()
                    .unwrap_or(title.duration_secs);
                ChapterInfo {
                    start: secs_to_ticks(start),
                    duration: secs_to_ticks(end.saturating_sub(start)),
                    offset: offset_for(start, title.duration_secs, size),
                }
            })
            .collect();

        Some(TitleInfo {
            index,
            playlist: title.playlist,
            duration,
            angle_count: title.angles.max(1),
            chapters,
            clips: title.clips.clone(),
        })
    }

    fn title_for_playlist(&self, playlist: u32) -> Option<u32> {
        self.titles
            .iter()
            .position(|t| t.playlist == playlist)
            .map(|i| i as u32)
    }
}

fn offset_for(secs: u64, duration_secs: u64, size: u64) -> u64 {
    if duration_secs == 0 {
        return 0;
    }
    (u128::from(secs) * u128::from(size) / u128::from(duration_secs)) as u64
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// Inputs the engine received, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineInput {
    Setting(PlayerSetting),
    Key(NavKey),
    Mouse { x: u16, y: u16 },
    MenuCall,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Location {
    Idle,
    Menu,
    Title(u32),
}

pub struct ScriptedEngine {
    disc: Arc<ScriptedDisc>,
    location: Location,
    pos: u64,
    angle: u32,
    still_active: bool,
    still_done: bool,
    end_reported: bool,
    /// Remaining failures per (title, fault index).
    faults: Vec<Vec<u32>>,
    events: VecDeque<PendingEvent>,
    inputs: Arc<Mutex<Vec<EngineInput>>>,
}

impl ScriptedEngine {
    pub fn new(disc: Arc<ScriptedDisc>, inputs: Arc<Mutex<Vec<EngineInput>>>) -> Self {
        let faults = disc
            .titles
            .iter()
            .map(|t| t.faults.iter().map(|f| f.count).collect())
            .collect();
        Self {
            disc,
            location: Location::Idle,
            pos: 0,
            angle: 0,
            still_active: false,
            still_done: false,
            end_reported: false,
            faults,
            events: VecDeque::new(),
            inputs,
        }
    }

    /// Angle last selected within the current title.
    pub fn angle(&self) -> u32 {
        self.angle
    }

    fn current(&self) -> Option<(u32, &ScriptedTitle)> {
        match self.location {
            Location::Title(t) => self.disc.titles.get(t as usize).map(|title| (t, title)),
            _ => None,
        }
    }

    fn chapter_at(&self, pos: u64) -> u32 {
        let Some((_, title)) = self.current() else {
            return 0;
        };
        title
            .chapters
            .iter()
            .rposition(|&start| offset_for(start, title.duration_secs, title.payload.size) <= pos)
            .map_or(0, |i| i as u32)
    }

    fn playitem_at(&self, pos: u64) -> u32 {
        self.current().map_or(0, |(_, title)| {
            title.playitem_boundaries.iter().filter(|&&b| b <= pos).count() as u32
        })
    }

    fn enter_title(&mut self, index: u32) {
        let leaving_menu = self.location == Location::Menu;
        self.location = Location::Title(index);
        self.pos = 0;
        self.angle = 0;
        self.still_active = false;
        self.still_done = false;
        self.end_reported = false;

        let title = &self.disc.titles[index as usize];
        let (playlist, offset) = (title.playlist, title.timestamp_offset);
        if leaving_menu {
            self.events.push_back(PendingEvent::MenuActive(false));
        }
        self.events.push_back(PendingEvent::TitleChanged(index));
        self.events.push_back(PendingEvent::PlaylistStarted(playlist));
        self.events.push_back(PendingEvent::ChapterChanged(1));
        if let Some(offset) = offset {
            self.events.push_back(PendingEvent::Discontinuity(offset));
        }
    }

    fn enter_menu(&mut self, title_number: u32) -> bool {
        let Some(menu) = self.disc.menu.clone() else {
            return false;
        };
        self.location = Location::Menu;
        self.pos = 0;
        self.still_active = false;
        self.still_done = false;
        self.end_reported = false;

        self.events.push_back(PendingEvent::TitleChanged(title_number));
        self.events.push_back(PendingEvent::PlaylistStarted(menu.playlist));
        self.events.push_back(PendingEvent::MenuActive(true));
        self.events.push_back(PendingEvent::MenuPopup(false));
        if let Some(button) = menu.button {
            self.events
                .push_back(PendingEvent::MenuOverlayUpdate(OverlayUpdate {
                    plane: OverlayPlaneId::Graphics,
                    pts: 0,
                    op: OverlayOp::Draw {
                        x: button.x,
                        y: button.y,
                        bitmap: button.bitmap,
                    },
                }));
        }
        true
    }

    fn activate_menu_button(&mut self, pts: i64) {
        let Some(menu) = self.disc.menu.clone() else {
            return;
        };
        if menu.enter_title as usize >= self.disc.titles.len() {
            return;
        }
        self.events
            .push_back(PendingEvent::MenuOverlayUpdate(OverlayUpdate {
                plane: OverlayPlaneId::Graphics,
                pts,
                op: OverlayOp::Close,
            }));
        self.enter_title(menu.enter_title);
    }

    fn log(&self, input: EngineInput) {
        self.inputs.lock().push(input);
    }

    fn menu_read(&mut self) -> io::Result<usize> {
        if !self.still_active && !self.still_done {
            self.still_active = true;
            self.events
                .push_back(PendingEvent::StillFrameEntered(StillDuration::Infinite));
        }
        Ok(0)
    }
}

impl NavigationEngine for ScriptedEngine {
    fn disc_info(&self) -> DiscInfo {
        DiscInfo {
            bluray_detected: self.disc.bluray,
            disc_name: self.disc.name.clone(),
            volume_id: self.disc.volume_id.clone(),
            disc_id: self.disc.disc_id_bytes(),
            top_menu_supported: self.disc.top_menu && self.disc.menu.is_some(),
            first_play_supported: self.disc.menu.is_some(),
            aacs_detected: self.disc.encryption.aacs,
            aacs_handled: self.disc.encryption.aacs_handled,
            bdplus_detected: self.disc.encryption.bdplus,
            bdplus_handled: self.disc.encryption.bdplus_handled,
        }
    }

    fn title_count(&mut self) -> u32 {
        self.disc.titles.len() as u32
    }

    fn main_title(&self) -> Option<u32> {
        self.disc.main_title
    }

    fn title_info(&mut self, title: u32, angle: u32) -> Option<TitleInfo> {
        let info = self.disc.title_info(title)?;
        (angle < info.angle_count).then_some(info)
    }

    fn playlist_info(&mut self, playlist: u32, angle: u32) -> Option<TitleInfo> {
        if let Some(title) = self.disc.title_for_playlist(playlist) {
            return self.title_info(title, angle);
        }
        let menu = self.disc.menu.as_ref().filter(|m| m.playlist == playlist)?;
        Some(TitleInfo {
            index: FIRST_PLAY_TITLE,
            playlist: menu.playlist,
            duration: 0,
            angle_count: 1,
            chapters: vec![],
            clips: vec![],
        })
    }

    fn read_disc_file(&mut self, path: &str) -> Option<Vec<u8>> {
        match path {
            "BDMV/index.bdmv" => self.disc.index_bdmv.as_ref().map(|s| s.as_bytes().to_vec()),
            _ => None,
        }
    }

    fn set_player_setting(&mut self, setting: &PlayerSetting) -> bool {
        self.log(EngineInput::Setting(setting.clone()));
        true
    }

    fn play(&mut self) -> bool {
        self.enter_menu(FIRST_PLAY_TITLE)
    }

    fn menu_call(&mut self, _pts: i64) -> bool {
        self.log(EngineInput::MenuCall);
        self.disc.top_menu && self.enter_menu(TOP_MENU_TITLE)
    }

    fn select_title(&mut self, title: u32) -> bool {
        if title as usize >= self.disc.titles.len() {
            return false;
        }
        self.enter_title(title);
        true
    }

    fn select_playlist(&mut self, playlist: u32) -> bool {
        if let Some(title) = self.disc.title_for_playlist(playlist) {
            self.enter_title(title);
            return true;
        }
        match &self.disc.menu {
            Some(menu) if menu.playlist == playlist => self.enter_menu(TOP_MENU_TITLE),
            _ => false,
        }
    }

    fn select_angle(&mut self, angle: u32) -> bool {
        let Some((_, title)) = self.current() else {
            return false;
        };
        if angle >= title.angles.max(1) {
            return false;
        }
        self.angle = angle;
        self.events.push_back(PendingEvent::AngleChanged(angle));
        true
    }

    fn select_stream(&mut self, kind: StreamKind, number: u32, enable: bool) -> bool {
        self.events
            .push_back(PendingEvent::StreamChanged { kind, number });
        if matches!(
            kind,
            StreamKind::Subtitle | StreamKind::SecondaryAudio | StreamKind::SecondaryVideo
        ) {
            self.events.push_back(PendingEvent::StreamEnabled {
                kind,
                enabled: enable,
            });
        }
        true
    }

    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.location == Location::Menu {
            return self.menu_read();
        }
        let Location::Title(index) = self.location else {
            return Ok(0);
        };
        let disc = Arc::clone(&self.disc);
        let Some(title) = disc.titles.get(index as usize) else {
            return Ok(0);
        };
        let size = title.payload.size;

        if self.pos >= size {
            if !self.end_reported {
                self.end_reported = true;
                self.events.push_back(PendingEvent::EndOfStream);
            }
            return Ok(0);
        }

        let mut end = (self.pos + buf.len() as u64).min(size);
        if let Some(still) = title.still.filter(|_| !self.still_done) {
            if self.pos == still.at {
                if !self.still_active {
                    self.still_active = true;
                    self.events.push_back(PendingEvent::StillFrameEntered(
                        StillDuration::from_secs(still.seconds),
                    ));
                }
                return Ok(0);
            }
            if self.pos < still.at {
                end = end.min(still.at);
            }
        }

        let remaining = &mut self.faults[index as usize];
        for (fault, left) in title.faults.iter().zip(remaining.iter_mut()) {
            if *left == 0 {
                continue;
            }
            if fault.at == self.pos {
                *left -= 1;
                return Err(io::Error::other(format!("scripted read fault at byte {}", self.pos)));
            }
            if fault.at > self.pos {
                end = end.min(fault.at);
            }
        }

        let chapter_before = self.chapter_at(self.pos);
        let playitem_before = self.playitem_at(self.pos);
        let n = (end - self.pos) as usize;
        for (i, byte) in buf[..n].iter_mut().enumerate() {
            *byte = title.payload.byte_at(self.pos + i as u64);
        }
        self.pos = end;

        let playitem = self.playitem_at(self.pos);
        if playitem != playitem_before {
            self.events.push_back(PendingEvent::PlayItemChanged(playitem));
        }
        let chapter = self.chapter_at(self.pos);
        if chapter != chapter_before {
            self.events.push_back(PendingEvent::ChapterChanged(chapter + 1));
        }
        Ok(n)
    }

    fn seek(&mut self, position: u64) -> Option<u64> {
        let (_, title) = self.current()?;
        if title.refuse_seeks || position > title.payload.size {
            return None;
        }
        let chapter_before = self.chapter_at(self.pos);
        self.pos = position;
        self.still_active = false;
        self.end_reported = false;
        self.events.push_back(PendingEvent::Seek);
        let chapter = self.chapter_at(position);
        if chapter != chapter_before {
            self.events.push_back(PendingEvent::ChapterChanged(chapter + 1));
        }
        Some(position)
    }

    fn seek_chapter(&mut self, chapter: u32) -> Option<u64> {
        let (_, title) = self.current()?;
        let start = *title.chapters.get(chapter as usize)?;
        let offset = offset_for(start, title.duration_secs, title.payload.size);
        self.seek(offset)
    }

    fn tell(&self) -> u64 {
        self.pos
    }

    fn tell_time(&self) -> Ticks {
        match self.current() {
            Some((_, title)) if title.payload.size > 0 => {
                let duration = secs_to_ticks(title.duration_secs);
                (u128::from(self.pos) * u128::from(duration) / u128::from(title.payload.size))
                    as Ticks
            }
            _ => 0,
        }
    }

    fn title_size(&self) -> u64 {
        self.current().map_or(0, |(_, title)| title.payload.size)
    }

    fn current_chapter(&self) -> u32 {
        self.chapter_at(self.pos)
    }

    fn user_input(&mut self, pts: i64, key: NavKey) -> bool {
        self.log(EngineInput::Key(key));
        match (self.location, key) {
            (Location::Menu, NavKey::Enter) => self.activate_menu_button(pts),
            (Location::Title(_), NavKey::Popup) => {
                self.events.push_back(PendingEvent::MenuPopup(false));
            }
            _ => {}
        }
        true
    }

    fn mouse_select(&mut self, pts: i64, x: u16, y: u16) -> bool {
        self.log(EngineInput::Mouse { x, y });
        let hit = self.location == Location::Menu
            && self
                .disc
                .menu
                .as_ref()
                .and_then(|m| m.button.as_ref())
                .is_some_and(|b| b.contains(x, y));
        if hit {
            self.activate_menu_button(pts);
        }
        hit
    }

    fn skip_still(&mut self) -> bool {
        if !self.still_active {
            return false;
        }
        self.still_active = false;
        self.still_done = true;
        self.events.push_back(PendingEvent::StillFrameCleared);
        if self
            .current()
            .and_then(|(_, title)| title.still)
            .is_some_and(|still| still.error_on_release)
        {
            self.events.push_back(PendingEvent::NavigationError(
                "scripted error on still release".into(),
            ));
        }
        true
    }

    fn poll_event(&mut self) -> Option<PendingEvent> {
        self.events.pop_front()
    }
}

// ---------------------------------------------------------------------------
// Provider
// ---------------------------------------------------------------------------

/// Opens [`ScriptedEngine`]s, either over a fixed disc or by reading the
/// opened path as a JSON disc description.
#[derive(Default)]
pub struct ScriptedProvider {
    disc: Option<Arc<ScriptedDisc>>,
    not_ready: AtomicU32,
    attempts: AtomicU32,
    inputs: Arc<Mutex<Vec<EngineInput>>>,
}

impl ScriptedProvider {
    pub fn new(disc: ScriptedDisc) -> Self {
        Self {
            disc: Some(Arc::new(disc)),
            ..Self::default()
        }
    }

    /// Report the medium as not ready for the first `attempts` opens.
    pub fn with_not_ready_attempts(self, attempts: u32) -> Self {
        self.not_ready.store(attempts, Ordering::SeqCst);
        self
    }

    /// Number of open calls so far.
    pub fn open_attempts(&self) -> u32 {
        self.attempts.load(Ordering::SeqCst)
    }

    /// Everything sent to engines opened by this provider.
    pub fn inputs(&self) -> Vec<EngineInput> {
        self.inputs.lock().clone()
    }

    fn load(&self, path: &Path) -> Result<Arc<ScriptedDisc>, OpenFailure> {
        if let Some(disc) = &self.disc {
            return Ok(Arc::clone(disc));
        }
        let json = std::fs::read_to_string(path)
            .map_err(|e| OpenFailure::Invalid(format!("cannot read disc description: {e}")))?;
        ScriptedDisc::from_json(&json)
            .map(Arc::new)
            .map_err(|e| OpenFailure::Invalid(format!("bad disc description: {e}")))
    }
}

impl EngineProvider for ScriptedProvider {
    fn open(&self, path: &Path) -> Result<Box<dyn NavigationEngine>, OpenFailure> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        let pending = self.not_ready.load(Ordering::SeqCst);
        if pending > 0 {
            self.not_ready.store(pending - 1, Ordering::SeqCst);
            return Err(OpenFailure::NotReady("medium not ready".into()));
        }
        let disc = self.load(path)?;
        Ok(Box::new(ScriptedEngine::new(disc, Arc::clone(&self.inputs))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn disc() -> ScriptedDisc {
        ScriptedDisc::from_json(
            r#"{
                "name": "TEST",
                "titles": [
                    {"playlist": 800, "duration_secs": 100, "chapters": [0, 50],
                     "payload": {"size": 1000, "seed": 7},
                     "faults": [{"at": 500}]},
                    {"playlist": 801, "duration_secs": 10,
                     "payload": {"size": 100},
                     "still": {"at": 40, "seconds": 0}}
                ]
            }"#,
        )
        .unwrap()
    }

    fn engine() -> ScriptedEngine {
        ScriptedEngine::new(Arc::new(disc()), Arc::default())
    }

    fn drain(engine: &mut ScriptedEngine) -> Vec<PendingEvent> {
        std::iter::from_fn(|| engine.poll_event()).collect()
    }

    #[test]
    fn select_title_emits_title_and_playlist() {
        let mut engine = engine();
        assert!(engine.select_title(1));
        let events = drain(&mut engine);
        assert_eq!(
            events,
            vec![
                PendingEvent::TitleChanged(1),
                PendingEvent::PlaylistStarted(801),
                PendingEvent::ChapterChanged(1),
            ]
        );
        assert!(!engine.select_title(2));
    }

    #[test]
    fn payload_is_deterministic() {
        let mut engine = engine();
        engine.select_title(0);
        let mut buf = [0u8; 4];
        assert_eq!(engine.read(&mut buf).unwrap(), 4);
        assert_eq!(buf, [7, 8, 9, 10]);
    }

    #[test]
    fn reads_stop_at_still_and_fault_points() {
        let mut engine = engine();
        engine.select_title(1);
        drain(&mut engine);

        let mut buf = [0u8; 64];
        assert_eq!(engine.read(&mut buf).unwrap(), 40);
        assert_eq!(engine.read(&mut buf).unwrap(), 0);
        assert_eq!(
            drain(&mut engine),
            vec![PendingEvent::StillFrameEntered(StillDuration::Infinite)]
        );
        assert!(engine.skip_still());
        assert_eq!(engine.read(&mut buf).unwrap(), 60);

        engine.select_title(0);
        engine.seek(490);
        assert_eq!(engine.read(&mut buf).unwrap(), 10);
        assert!(engine.read(&mut buf).is_err());
        assert_eq!(engine.read(&mut buf).unwrap(), 64);
    }

    #[test]
    fn chapter_events_follow_reads() {
        let mut engine = engine();
        engine.select_title(0);
        drain(&mut engine);
        engine.seek(480);
        drain(&mut engine);

        let mut buf = [0u8; 10];
        engine.read(&mut buf).unwrap();
        engine.faults[0][0] = 0;
        engine.read(&mut buf).unwrap();
        assert!(drain(&mut engine).contains(&PendingEvent::ChapterChanged(2)));
        assert_eq!(engine.current_chapter(), 1);
    }

    #[test]
    fn title_info_derives_chapter_offsets() {
        let info = disc().title_info(0).unwrap();
        assert_eq!(info.duration, 100 * 90_000);
        assert_eq!(info.chapters[1].offset, 500);
        assert_eq!(info.chapters[1].duration, 50 * 90_000);
    }

    #[test]
    fn provider_reports_not_ready_then_opens() {
        let provider = ScriptedProvider::new(disc()).with_not_ready_attempts(1);
        assert!(matches!(
            provider.open(Path::new("disc")),
            Err(OpenFailure::NotReady(_))
        ));
        assert!(provider.open(Path::new("disc")).is_ok());
        assert_eq!(provider.open_attempts(), 2);
    }

    #[test]
    fn provider_reads_description_from_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("disc.json");
        std::fs::write(&path, serde_json::to_string(&disc()).unwrap()).unwrap();

        let mut engine = ScriptedProvider::default().open(&path).unwrap();
        assert_eq!(engine.title_count(), 2);

        let missing = ScriptedProvider::default().open(&dir.path().join("none.json"));
        assert!(matches!(missing, Err(OpenFailure::Invalid(_))));
    }

    #[test]
    fn disc_id_parses_from_hex() {
        let mut disc = disc();
        disc.disc_id = Some("00".repeat(19) + "ff");
        let id = disc.disc_id_bytes().unwrap();
        assert_eq!(id[19], 0xff);

        disc.disc_id = Some("abc".into());
        assert!(disc.disc_id_bytes().is_none());
    }
}
