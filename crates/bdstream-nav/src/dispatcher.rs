//! Applies engine events to session and overlay state.
//!
//! Events are drained in emission order before every read attempt, after
//! every block read and after each navigation request. This is the only
//! place session navigation state changes in response to the engine.

use std::sync::Arc;

use crate::buffer::BdBuffer;
use crate::engine::{PendingEvent, TitleInfo};
use crate::session::{ProcessState, WaitReason};

impl BdBuffer {
    /// Drain and apply every queued engine event.
    pub(crate) fn handle_events(&mut self) {
        loop {
            let Some(engine) = self.engine.as_mut() else {
                return;
            };
            let Some(event) = engine.poll_event() else {
                return;
            };
            self.handle_event(event);
        }
    }

    fn handle_event(&mut self, event: PendingEvent) {
        let name = event.name();
        if !matches!(event, PendingEvent::Idle | PendingEvent::None) {
            tracing::debug!(session = %self.session_id, event = name, "Navigation event");
        }

        match event {
            PendingEvent::None | PendingEvent::Idle | PendingEvent::Seek => {}

            PendingEvent::NavigationError(message) => {
                self.record_error(format!("navigation error: {message}"));
            }
            PendingEvent::ReadError(message) => {
                self.record_error(format!("read error: {message}"));
            }

            PendingEvent::TitleChanged(title) => self.on_title_changed(title),
            PendingEvent::PlaylistStarted(playlist) => self.on_playlist_started(playlist),

            PendingEvent::PlayItemChanged(item) => {
                let mut state = self.shared.state.lock();
                state.current_playitem = item;
                drop(state);
                self.request_player_drain();
            }

            PendingEvent::ChapterChanged(chapter) => {
                let mut state = self.shared.state.lock();
                let chapter = state.clamp_chapter(chapter.saturating_sub(1));
                state.current_chapter = chapter;
            }

            PendingEvent::AngleChanged(angle) => {
                let title = self.shared.state.lock().current_title;
                let info = title.and_then(|t| self.reload_title_info(t, angle));
                let mut state = self.shared.state.lock();
                state.current_angle = angle;
                if let Some(info) = info {
                    state.title_info = Some(info);
                }
            }

            PendingEvent::EndOfStream => {
                self.shared.state.lock().end_of_title = true;
            }
            PendingEvent::PlaylistStopped => {
                self.shared.overlays.clear_all();
                self.shared.state.lock().end_of_title = true;
            }

            PendingEvent::StillFrameEntered(duration) => {
                let mut state = self.shared.state.lock();
                let reason = WaitReason::StillFrame(duration);
                if state.process_state == ProcessState::Wait && state.wait_reason == Some(reason) {
                    tracing::trace!(session = %self.session_id, "Ignoring repeated still frame");
                } else {
                    self.shared.gate.arm();
                    state.enter_wait(reason);
                    tracing::debug!(session = %self.session_id, ?duration, "Entered still frame");
                }
            }
            PendingEvent::StillFrameCleared => {
                let mut state = self.shared.state.lock();
                if state.is_in_still_frame() {
                    state.clear_wait();
                }
            }

            PendingEvent::MenuPopup(available) => {
                self.shared.state.lock().popup_available = available;
            }
            PendingEvent::MenuActive(active) => {
                self.shared.state.lock().in_menu = active;
            }

            PendingEvent::MenuOverlayUpdate(command) => {
                self.shared.overlays.submit_paletted(&command);
            }
            PendingEvent::ArgbOverlayUpdate(command) => {
                self.shared.overlays.submit_argb(&command);
            }

            PendingEvent::StreamChanged { kind, number } => {
                self.shared.state.lock().streams.set(kind, number);
            }
            PendingEvent::StreamEnabled { kind, enabled } => {
                self.shared.state.lock().streams.set_enabled(kind, enabled);
            }
            PendingEvent::SecondaryVideoFullscreen(fullscreen) => {
                self.shared.state.lock().streams.secondary_video_fullscreen = fullscreen;
            }

            PendingEvent::Discontinuity(offset) => {
                self.shared.state.lock().time_diff = offset;
            }
        }

        self.shared.state.lock().last_event = name;
    }

    fn on_title_changed(&mut self, title: u32) {
        let num_titles = self.shared.state.lock().num_titles;
        let current = (title < num_titles).then_some(title);
        let info = current.and_then(|t| self.reload_title_info(t, 0));
        self.shared.overlays.clear_all();

        let mut state = self.shared.state.lock();
        state.current_title = current;
        state.current_angle = 0;
        state.angle_count = info.as_ref().map_or(1, |i| i.angle_count.max(1));
        state.title_length = info.as_ref().map_or(0, |i| i.duration);
        state.title_info = info;
        reset_position(&mut state);
        if state.is_in_still_frame() {
            state.clear_wait();
        }
        tracing::info!(session = %self.session_id, title = ?current, "Title changed");
    }

    fn on_playlist_started(&mut self, playlist: u32) {
        let current = self.shared.state.lock().title_info.clone();
        let info: Option<Arc<TitleInfo>> = match current {
            Some(info) if info.playlist == playlist => Some(info),
            _ => self.get_playlist_info(playlist).ok(),
        };
        self.shared.overlays.clear_all();

        {
            let mut state = self.shared.state.lock();
            state.current_playlist = playlist;
            state.current_playitem = 0;
            if let Some(info) = info {
                state.title_length = info.duration;
                state.angle_count = info.angle_count.max(1);
                state.title_info = Some(info);
            }
            reset_position(&mut state);
        }
        tracing::debug!(session = %self.session_id, playlist, "Playlist started");
        self.request_player_drain();
    }

    /// Hold the reader at a play-item boundary unless wait states are
    /// ignored.
    fn request_player_drain(&mut self) {
        let mut state = self.shared.state.lock();
        if state.ignore_wait_states || state.process_state != ProcessState::Normal {
            return;
        }
        self.shared.gate.arm();
        state.enter_wait(WaitReason::PlayerDrain);
    }
}

fn reset_position(state: &mut crate::session::SessionState) {
    state.current_chapter = 0;
    state.current_time = 0;
    state.end_of_title = false;
    state.title_changed = true;
    state.title_generation += 1;
}
