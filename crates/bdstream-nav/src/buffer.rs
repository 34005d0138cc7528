//! Reader-side disc session: open, read, seek and navigation requests.

use std::io::SeekFrom;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use bdstream_core::{secs_to_ticks, Error, NavConfig, Result, SessionId, StreamKind, Ticks};
use bytes::BytesMut;
use sha2::{Digest, Sha256};

use crate::engine::{
    DiscInfo, EngineProvider, NavigationEngine, OpenFailure, PlayerSetting, StillDuration,
    TitleInfo, BD_BLOCK_SIZE,
};
use crate::handle::BdHandle;
use crate::session::{DiscIdentity, ProcessState, SessionState, Shared, WaitReason};
use crate::wait::WaitOutcome;

/// An open disc, driven from the thread that feeds the decoder.
///
/// `BdBuffer` owns the navigation engine; every engine call goes through
/// `&mut self`. Other threads observe and signal the session through a
/// [`BdHandle`].
pub struct BdBuffer {
    pub(crate) engine: Option<Box<dyn NavigationEngine>>,
    pub(crate) shared: Arc<Shared>,
    pub(crate) config: NavConfig,
    pub(crate) session_id: SessionId,
    path: PathBuf,
    /// Bytes read before a wait began, delivered once it clears.
    pub(crate) pending: BytesMut,
    /// Set once a read has failed past its retry; later reads fail fast.
    fatal: Option<String>,
}

impl BdBuffer {
    /// Open the disc at `path`, retrying up to `retries` extra times while
    /// the engine reports the medium as not ready.
    pub fn open(
        path: impl AsRef<Path>,
        retries: u32,
        provider: &dyn EngineProvider,
        config: NavConfig,
    ) -> Result<Self> {
        let path = path.as_ref();
        let session_id = SessionId::new();
        let disc_path = path.display().to_string();

        let mut attempt = 0;
        let mut engine = loop {
            match provider.open(path) {
                Ok(engine) => break engine,
                Err(OpenFailure::NotReady(reason)) if attempt < retries => {
                    attempt += 1;
                    tracing::warn!(
                        session = %session_id,
                        attempt,
                        retries,
                        "Disc at {disc_path} not ready ({reason}); retrying"
                    );
                    std::thread::sleep(config.open.retry_delay());
                }
                Err(OpenFailure::NotReady(reason)) | Err(OpenFailure::Invalid(reason)) => {
                    return Err(Error::open(&disc_path, reason));
                }
            }
        };

        let info = engine.disc_info();
        check_disc(&info).map_err(|reason| Error::open(&disc_path, reason))?;
        apply_player_settings(engine.as_mut(), &config);

        let num_titles = engine.title_count();
        if num_titles == 0 && !info.first_play_supported {
            return Err(Error::open(&disc_path, "disc has no titles and no first-play object"));
        }

        let identity = resolve_identity(engine.as_mut(), &info, path);
        let state = SessionState {
            identity,
            top_menu_supported: info.top_menu_supported,
            first_play_supported: info.first_play_supported,
            num_titles,
            angle_count: 1,
            ignore_wait_states: config.navigation.ignore_wait_states,
            ..SessionState::default()
        };

        let mut buffer = Self {
            engine: Some(engine),
            shared: Arc::new(Shared::new(state)),
            config,
            session_id,
            path: path.to_path_buf(),
            pending: BytesMut::new(),
            fatal: None,
        };

        let main_title = buffer.pick_main_title();
        buffer.shared.state.lock().main_title = main_title;

        if buffer.config.navigation.try_menus && info.first_play_supported {
            if !buffer.engine_mut()?.play() {
                return Err(Error::open(&disc_path, "engine refused to start menu navigation"));
            }
            buffer.shared.state.lock().hdmv_navigation = true;
        } else if !buffer.engine_mut()?.select_title(main_title) {
            return Err(Error::open(&disc_path, format!("cannot start title {main_title}")));
        }
        buffer.handle_events();

        {
            let state = buffer.shared.state.lock();
            tracing::info!(
                session = %buffer.session_id,
                name = %state.identity.name,
                serial = %state.identity.serial,
                titles = num_titles,
                main_title,
                hdmv = state.hdmv_navigation,
                "Opened disc {disc_path}"
            );
        }
        Ok(buffer)
    }

    /// A cloneable handle for the UI thread.
    pub fn handle(&self) -> BdHandle {
        BdHandle::new(Arc::clone(&self.shared))
    }

    pub fn session_id(&self) -> SessionId {
        self.session_id
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn config(&self) -> &NavConfig {
        &self.config
    }

    pub(crate) fn engine_mut(&mut self) -> Result<&mut Box<dyn NavigationEngine>> {
        self.engine.as_mut().ok_or(Error::Closed)
    }

    fn ensure_open(&mut self) -> Result<()> {
        if self.engine.is_none() {
            return Err(Error::Closed);
        }
        if self.shared.gate.is_closed() {
            self.close();
            return Err(Error::Closed);
        }
        Ok(())
    }

    /// Release the engine, drop caches and overlays and wake any blocked
    /// reader. Safe to call more than once.
    pub fn close(&mut self) {
        let Some(engine) = self.engine.take() else {
            return;
        };
        drop(engine);

        self.shared.gate.close();
        self.shared.titles.clear();
        self.shared.playlists.clear();
        self.shared.overlays.clear_all();
        self.pending.clear();
        {
            let mut state = self.shared.state.lock();
            state.clear_wait();
            state.process_state = ProcessState::Normal;
            state.title_info = None;
        }
        tracing::info!(session = %self.session_id, "Closed disc session");
    }

    pub fn is_open(&self) -> bool {
        self.engine.is_some()
    }

    // -----------------------------------------------------------------------
    // Metadata
    // -----------------------------------------------------------------------

    /// Metadata for `title`; repeated calls return the same `Arc`.
    pub fn get_title_info(&mut self, title: u32) -> Result<Arc<TitleInfo>> {
        let (num_titles, current, angle) = {
            let state = self.shared.state.lock();
            (state.num_titles, state.current_title, state.current_angle)
        };
        if title >= num_titles {
            return Err(Error::not_found("title", title));
        }
        if let Some(info) = self.shared.titles.get(title) {
            return Ok(info);
        }

        let angle = if current == Some(title) { angle } else { 0 };
        let info = self
            .engine_mut()?
            .title_info(title, angle)
            .ok_or_else(|| Error::not_found("title info", title))?;
        Ok(self.shared.titles.insert_if_absent(title, info))
    }

    /// Metadata for playlist `playlist` (`NNNNN.mpls`).
    pub fn get_playlist_info(&mut self, playlist: u32) -> Result<Arc<TitleInfo>> {
        if let Some(info) = self.shared.playlists.get(playlist) {
            return Ok(info);
        }
        let info = self
            .engine_mut()?
            .playlist_info(playlist, 0)
            .ok_or_else(|| Error::not_found("playlist", playlist))?;
        Ok(self.shared.playlists.insert_if_absent(playlist, info))
    }

    /// Drop the cached entry for `title` and fetch it again at `angle`.
    pub(crate) fn reload_title_info(&mut self, title: u32, angle: u32) -> Option<Arc<TitleInfo>> {
        self.shared.titles.invalidate(title);
        let info = self.engine.as_mut()?.title_info(title, angle)?;
        Some(self.shared.titles.insert_if_absent(title, info))
    }

    /// Duration of `title` in ticks, 0 when unknown.
    pub fn title_duration(&mut self, title: u32) -> Ticks {
        self.get_title_info(title).map_or(0, |info| info.duration)
    }

    fn pick_main_title(&mut self) -> u32 {
        let num_titles = self.shared.state.lock().num_titles;
        let declared = self.engine.as_ref().and_then(|e| e.main_title());
        if let Some(title) = declared.filter(|&t| t < num_titles) {
            return title;
        }

        let min = secs_to_ticks(self.config.navigation.min_title_length_secs);
        let mut best: Option<(u32, Ticks)> = None;
        for title in 0..num_titles {
            let Ok(info) = self.get_title_info(title) else {
                continue;
            };
            if info.duration >= min && best.map_or(true, |(_, longest)| info.duration > longest) {
                best = Some((title, info.duration));
            }
        }
        best.map_or(0, |(title, _)| title)
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    pub fn num_titles(&self) -> u32 {
        self.shared.state.lock().num_titles
    }

    pub fn main_title(&self) -> u32 {
        self.shared.state.lock().main_title
    }

    pub fn current_title(&self) -> Option<u32> {
        self.shared.state.lock().current_title
    }

    pub fn current_playlist(&self) -> u32 {
        self.shared.state.lock().current_playlist
    }

    pub fn current_angle(&self) -> u32 {
        self.shared.state.lock().current_angle
    }

    pub fn num_angles(&self) -> u32 {
        self.shared.state.lock().angle_count
    }

    pub fn current_chapter(&self) -> u32 {
        self.shared.state.lock().current_chapter
    }

    pub fn num_chapters(&self) -> u32 {
        self.shared.state.lock().num_chapters()
    }

    pub fn chapter_start_time(&self, chapter: u32) -> Option<Ticks> {
        self.shared.state.lock().chapter_start_time(chapter)
    }

    /// Frame number a chapter starts on, from the primary video frame rate.
    pub fn chapter_start_frame(&self, chapter: u32) -> Option<u64> {
        let start = self.chapter_start_time(chapter)?;
        let fps = self.frame_rate()?;
        Some((start as f64 / bdstream_core::TICKS_PER_SECOND as f64 * fps).round() as u64)
    }

    pub fn frame_rate(&self) -> Option<f64> {
        self.shared.state.lock().title_info.as_ref()?.frame_rate()
    }

    pub fn current_time(&self) -> Ticks {
        self.shared.state.lock().current_time
    }

    pub fn total_time_of_title(&self) -> Ticks {
        self.shared.state.lock().title_length
    }

    /// Size in bytes of the current title stream.
    pub fn title_size(&self) -> u64 {
        self.engine.as_ref().map_or(0, |e| e.title_size())
    }

    /// Byte position of the next byte the player will receive.
    pub fn read_position(&self) -> u64 {
        self.engine
            .as_ref()
            .map_or(0, |e| e.tell().saturating_sub(self.pending.len() as u64))
    }

    pub fn total_read_position(&self) -> u64 {
        self.shared.state.lock().total_read_position
    }

    /// Language of the audio stream with packet id `pid`.
    pub fn audio_language(&self, pid: u16) -> Option<String> {
        let state = self.shared.state.lock();
        let clip = state.title_info.as_ref()?.primary_clip()?;
        clip.audio_streams
            .iter()
            .find(|s| s.pid == pid)
            .map(|s| s.language.clone())
    }

    /// Language of the subtitle stream with packet id `pid`.
    pub fn subtitle_language(&self, pid: u16) -> Option<String> {
        let state = self.shared.state.lock();
        let clip = state.title_info.as_ref()?.primary_clip()?;
        clip.pg_streams
            .iter()
            .find(|s| s.pid == pid)
            .map(|s| s.language.clone())
    }

    pub fn is_valid_stream(&self, pid: u16) -> bool {
        self.shared
            .state
            .lock()
            .title_info
            .as_ref()
            .is_some_and(|info| info.find_stream(pid).is_some())
    }

    pub fn name_and_serial(&self) -> (String, String) {
        let state = self.shared.state.lock();
        (state.identity.name.clone(), state.identity.serial.clone())
    }

    pub fn describe_position(&self) -> String {
        self.shared.state.lock().describe_position()
    }

    pub fn is_hdmv_navigation(&self) -> bool {
        self.shared.state.lock().hdmv_navigation
    }

    pub fn is_in_menu(&self) -> bool {
        self.shared.state.lock().in_menu
    }

    pub fn is_in_still_frame(&self) -> bool {
        self.shared.state.lock().is_in_still_frame()
    }

    pub fn process_state(&self) -> ProcessState {
        self.shared.state.lock().process_state
    }

    /// Pull the playback clock and chapter from the engine.
    pub fn progress_update(&mut self) {
        let Some(engine) = self.engine.as_ref() else {
            return;
        };
        let time = engine.tell_time();
        let chapter = engine.current_chapter();
        let mut state = self.shared.state.lock();
        state.current_time = time;
        state.current_chapter = state.clamp_chapter(chapter);
    }

    /// Map a decoder timestamp back onto the disc clock.
    pub fn adjust_timestamp(&self, timestamp: i64) -> i64 {
        let diff = self.shared.state.lock().time_diff;
        if timestamp >= diff {
            timestamp - diff
        } else {
            timestamp
        }
    }

    // -----------------------------------------------------------------------
    // Reading
    // -----------------------------------------------------------------------

    /// Fill `buf` with stream data. Blocks while the disc holds a still
    /// frame; returns 0 only at the end of the current title.
    pub fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        self.ensure_open()?;
        if let Some(reason) = &self.fatal {
            return Err(Error::Io(reason.clone()));
        }
        if buf.is_empty() {
            return Ok(0);
        }

        let mut retried = false;
        // Start of the undelivered stream: stashed bytes sit before the
        // engine position.
        let mut origin = self
            .engine_mut()?
            .tell()
            .saturating_sub(self.pending.len() as u64);
        loop {
            self.handle_events();
            match self.process_state() {
                ProcessState::Wait => {
                    self.wait_for_release()?;
                    continue;
                }
                ProcessState::Reprocess => {
                    let reason = self
                        .shared
                        .state
                        .lock()
                        .last_error
                        .clone()
                        .unwrap_or_else(|| "read failed".to_string());
                    if retried {
                        tracing::error!(session = %self.session_id, "Read failed after retry: {reason}");
                        self.fatal = Some(reason.clone());
                        return Err(Error::Io(reason));
                    }
                    retried = true;
                    tracing::warn!(
                        session = %self.session_id,
                        position = origin,
                        "Retrying read after error: {reason}"
                    );
                    // The re-read covers anything still stashed.
                    self.pending.clear();
                    if self.engine_mut()?.seek(origin).is_none() {
                        let reason = format!("engine refused to seek back to {origin} after: {reason}");
                        tracing::error!(session = %self.session_id, position = origin, "{reason}");
                        self.fatal = Some(reason.clone());
                        return Err(Error::Io(reason));
                    }
                    self.shared.state.lock().process_state = ProcessState::Normal;
                    continue;
                }
                ProcessState::Normal => {}
            }

            if !self.pending.is_empty() {
                let n = self.pending.len().min(buf.len());
                buf[..n].copy_from_slice(&self.pending.split_to(n));
                self.account(n);
                return Ok(n);
            }

            origin = self.engine_mut()?.tell();
            let generation = self.shared.state.lock().title_generation;
            let filled = self.read_blocks(buf);

            match self.process_state() {
                ProcessState::Normal if filled > 0 => {
                    self.account(filled);
                    return Ok(filled);
                }
                ProcessState::Normal => {
                    if self.shared.state.lock().title_generation != generation {
                        continue;
                    }
                    self.shared.state.lock().end_of_title = true;
                    tracing::debug!(session = %self.session_id, "End of title");
                    return Ok(0);
                }
                ProcessState::Wait => {
                    self.pending.extend_from_slice(&buf[..filled]);
                }
                ProcessState::Reprocess => {
                    tracing::debug!(session = %self.session_id, discarded = filled, "Dropping data from failed read");
                }
            }
        }
    }

    /// Read whole blocks until `buf` is full, the engine runs dry, or an
    /// event changes the process state.
    fn read_blocks(&mut self, buf: &mut [u8]) -> usize {
        let mut filled = 0;
        while filled < buf.len() {
            let want = (buf.len() - filled).min(BD_BLOCK_SIZE);
            let Some(engine) = self.engine.as_mut() else {
                break;
            };
            let n = match engine.read(&mut buf[filled..filled + want]) {
                Ok(n) => n,
                Err(e) => {
                    self.record_error(format!("read failed: {e}"));
                    break;
                }
            };
            filled += n;
            self.handle_events();
            if n < want || self.process_state() != ProcessState::Normal {
                break;
            }
        }
        filled
    }

    fn account(&mut self, delivered: usize) {
        let time = self.engine.as_ref().map(|e| e.tell_time());
        let mut state = self.shared.state.lock();
        state.total_read_position += delivered as u64;
        state.end_of_title = false;
        if let Some(time) = time {
            state.current_time = time;
        }
    }

    pub(crate) fn record_error(&self, message: String) {
        tracing::warn!(session = %self.session_id, "{message}");
        let mut state = self.shared.state.lock();
        state.last_error = Some(message);
        state.wait_reason = None;
        state.wait_since = None;
        state.process_state = ProcessState::Reprocess;
    }

    fn wait_for_release(&mut self) -> Result<()> {
        let poll = self.config.playback.wait_poll_interval();
        loop {
            let (reason, since, ignore) = {
                let state = self.shared.state.lock();
                (state.wait_reason, state.wait_since, state.ignore_wait_states)
            };
            let reason = match reason {
                None => break,
                Some(WaitReason::PlayerDrain) if ignore => break,
                Some(reason) => reason,
            };

            let timeout = match reason {
                WaitReason::StillFrame(StillDuration::Seconds(secs)) => {
                    let hold = Duration::from_secs(u64::from(secs));
                    let elapsed = since.map_or(Duration::ZERO, |t| t.elapsed());
                    if elapsed >= hold {
                        tracing::debug!(session = %self.session_id, secs, "Still frame elapsed");
                        break;
                    }
                    (hold - elapsed).min(poll)
                }
                _ => poll,
            };

            match self.shared.gate.wait(timeout) {
                WaitOutcome::Released => break,
                WaitOutcome::TimedOut => {}
                WaitOutcome::Closed => {
                    self.close();
                    return Err(Error::Closed);
                }
            }
        }
        self.end_wait();
        Ok(())
    }

    /// Leave the current wait, releasing the engine's still frame if any.
    fn end_wait(&mut self) {
        let still = self.shared.state.lock().is_in_still_frame();
        if still {
            if let Some(engine) = self.engine.as_mut() {
                engine.skip_still();
            }
        }
        self.shared.state.lock().clear_wait();
        self.handle_events();
    }

    /// Release a wait from the reader side.
    pub fn unblock_reading(&mut self) {
        if self.process_state() == ProcessState::Wait {
            tracing::debug!(session = %self.session_id, "Unblocking reader");
            self.end_wait();
        }
    }

    /// Skip player-drain waits instead of blocking on them.
    pub fn ignore_wait_states(&mut self, ignore: bool) {
        let mut state = self.shared.state.lock();
        state.ignore_wait_states = ignore;
        if ignore && state.waiting_for_player() {
            state.clear_wait();
        }
    }

    // -----------------------------------------------------------------------
    // Seeking
    // -----------------------------------------------------------------------

    /// Move within the current title; returns the new byte position.
    pub fn seek(&mut self, pos: SeekFrom) -> Result<u64> {
        self.ensure_open()?;
        let size = self.title_size();
        let current = self.read_position();
        let target = match pos {
            SeekFrom::Start(n) => i128::from(n),
            SeekFrom::Current(delta) => i128::from(current) + i128::from(delta),
            SeekFrom::End(delta) => i128::from(size) + i128::from(delta),
        };
        if target < 0 || target > i128::from(size) {
            return Err(Error::Seek(format!(
                "position {target} outside title of {size} bytes"
            )));
        }

        let target = target as u64;
        let landed = self
            .engine_mut()?
            .seek(target)
            .ok_or_else(|| Error::Seek(format!("engine rejected seek to {target}")))?;
        self.pending.clear();
        self.handle_events();

        let time = self.engine.as_ref().map_or(0, |e| e.tell_time());
        let mut state = self.shared.state.lock();
        state.clear_wait();
        state.process_state = ProcessState::Normal;
        state.end_of_title = false;
        state.current_time = time;
        tracing::debug!(session = %self.session_id, target, landed, "Seek");
        Ok(landed)
    }

    /// Jump to the start of `chapter` (0-based) in the current title.
    pub fn seek_chapter(&mut self, chapter: u32) -> Result<u64> {
        self.ensure_open()?;
        if chapter >= self.num_chapters() {
            return Err(Error::not_found("chapter", chapter));
        }
        let landed = self
            .engine_mut()?
            .seek_chapter(chapter)
            .ok_or_else(|| Error::Seek(format!("engine rejected chapter {chapter}")))?;
        self.pending.clear();
        self.handle_events();

        let time = self.engine.as_ref().map_or(0, |e| e.tell_time());
        let mut state = self.shared.state.lock();
        state.clear_wait();
        state.process_state = ProcessState::Normal;
        state.end_of_title = false;
        state.current_chapter = chapter;
        state.current_time = time;
        tracing::debug!(session = %self.session_id, chapter, landed, "Chapter seek");
        Ok(landed)
    }

    /// Restart playback: menus from first play, otherwise the current title
    /// from byte 0.
    pub fn start_from_beginning(&mut self) -> Result<()> {
        self.ensure_open()?;
        let (hdmv, first_play) = {
            let state = self.shared.state.lock();
            (state.hdmv_navigation, state.first_play_supported)
        };
        if hdmv && first_play {
            if !self.engine_mut()?.play() {
                return Err(Error::navigation("engine refused to restart menu navigation"));
            }
            self.pending.clear();
            self.handle_events();
            Ok(())
        } else {
            self.seek(SeekFrom::Start(0)).map(|_| ())
        }
    }

    // -----------------------------------------------------------------------
    // Navigation requests
    // -----------------------------------------------------------------------

    pub fn switch_title(&mut self, title: u32) -> Result<()> {
        self.ensure_open()?;
        let num_titles = self.num_titles();
        if title >= num_titles {
            return Err(Error::not_found("title", title));
        }
        if !self.engine_mut()?.select_title(title) {
            return Err(Error::navigation(format!("engine rejected title {title}")));
        }
        tracing::info!(session = %self.session_id, title, "Switching title");
        self.pending.clear();
        self.handle_events();
        Ok(())
    }

    pub fn switch_playlist(&mut self, playlist: u32) -> Result<()> {
        self.ensure_open()?;
        self.get_playlist_info(playlist)?;
        if !self.engine_mut()?.select_playlist(playlist) {
            return Err(Error::navigation(format!("engine rejected playlist {playlist}")));
        }
        tracing::info!(session = %self.session_id, playlist, "Switching playlist");
        self.pending.clear();
        self.handle_events();
        Ok(())
    }

    pub fn switch_angle(&mut self, angle: u32) -> Result<()> {
        self.ensure_open()?;
        let angles = self.num_angles();
        if angle >= angles {
            return Err(Error::not_found("angle", angle));
        }
        if !self.engine_mut()?.select_angle(angle) {
            return Err(Error::navigation(format!("engine rejected angle {angle}")));
        }
        tracing::debug!(session = %self.session_id, angle, "Switching angle");
        self.handle_events();
        Ok(())
    }

    /// Select stream `number` of `kind`, switching it on or off where the
    /// kind supports that.
    pub fn select_stream(&mut self, kind: StreamKind, number: u32, enable: bool) -> Result<()> {
        self.ensure_open()?;
        if !self.engine_mut()?.select_stream(kind, number, enable) {
            return Err(Error::navigation(format!("engine rejected {kind} stream {number}")));
        }
        self.handle_events();
        Ok(())
    }
}

impl Drop for BdBuffer {
    fn drop(&mut self) {
        self.close();
    }
}

fn check_disc(info: &DiscInfo) -> std::result::Result<(), &'static str> {
    if !info.bluray_detected {
        return Err("not a Blu-ray disc structure");
    }
    if info.aacs_detected && !info.aacs_handled {
        return Err("disc is AACS encrypted and cannot be decrypted");
    }
    if info.bdplus_detected && !info.bdplus_handled {
        return Err("disc is BD+ encrypted and cannot be decrypted");
    }
    Ok(())
}

fn apply_player_settings(engine: &mut dyn NavigationEngine, config: &NavConfig) {
    let player = &config.player;
    let mut settings = vec![
        PlayerSetting::AudioLanguage(player.audio_language.clone()),
        PlayerSetting::SubtitleLanguage(player.subtitle_language.clone()),
        PlayerSetting::MenuLanguage(player.menu_language.clone()),
        PlayerSetting::Country(player.country.clone()),
        PlayerSetting::ParentalLevel(player.parental_level),
    ];
    match player.region_code() {
        Some(region) => settings.push(PlayerSetting::Region(region)),
        None => tracing::warn!("Ignoring unknown player region '{}'", player.region),
    }

    for setting in &settings {
        if !engine.set_player_setting(setting) {
            tracing::warn!(?setting, "Engine rejected player setting");
        }
    }
}

/// Name from disc metadata, the volume id, or the path; serial from the
/// disc id, or a digest of the disc index.
fn resolve_identity(engine: &mut dyn NavigationEngine, info: &DiscInfo, path: &Path) -> DiscIdentity {
    let name = info
        .disc_name
        .clone()
        .filter(|n| !n.is_empty())
        .or_else(|| info.volume_id.clone().filter(|v| !v.is_empty()))
        .or_else(|| path.file_stem().map(|s| s.to_string_lossy().into_owned()))
        .unwrap_or_default();

    let serial = match info.disc_id {
        Some(id) => hex::encode(id),
        None => engine
            .read_disc_file("BDMV/index.bdmv")
            .map(|index| {
                let mut digest = hex::encode(Sha256::digest(&index));
                digest.truncate(40);
                digest
            })
            .unwrap_or_default(),
    };

    DiscIdentity {
        name,
        serial,
        valid: true,
    }
}
