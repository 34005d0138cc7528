//! UI-thread view of an open disc session.

use std::sync::Arc;

use bdstream_core::Ticks;

use crate::overlay::OverlaySnapshot;
use crate::session::{ProcessState, SessionState, Shared, StreamSelection, WaitReason};

/// Cloneable, thread-safe accessor for a [`crate::BdBuffer`]'s state.
///
/// A handle never touches the navigation engine; it only reads session
/// state, takes overlay snapshots and signals the reader.
#[derive(Clone)]
pub struct BdHandle {
    pub(crate) shared: Arc<Shared>,
}

impl BdHandle {
    pub(crate) fn new(shared: Arc<Shared>) -> Self {
        Self { shared }
    }

    fn with_state<T>(&self, f: impl FnOnce(&SessionState) -> T) -> T {
        f(&self.shared.state.lock())
    }

    /// Whether the title or playlist changed since the last call. Returns
    /// true once per change; several changes between polls collapse into
    /// one.
    pub fn title_changed(&self) -> bool {
        std::mem::take(&mut self.shared.state.lock().title_changed)
    }

    pub fn num_titles(&self) -> u32 {
        self.with_state(|s| s.num_titles)
    }

    pub fn current_title(&self) -> Option<u32> {
        self.with_state(|s| s.current_title)
    }

    pub fn current_playlist(&self) -> u32 {
        self.with_state(|s| s.current_playlist)
    }

    pub fn current_chapter(&self) -> u32 {
        self.with_state(|s| s.current_chapter)
    }

    pub fn num_chapters(&self) -> u32 {
        self.with_state(SessionState::num_chapters)
    }

    pub fn chapter_start_time(&self, chapter: u32) -> Option<Ticks> {
        self.with_state(|s| s.chapter_start_time(chapter))
    }

    pub fn current_angle(&self) -> u32 {
        self.with_state(|s| s.current_angle)
    }

    pub fn num_angles(&self) -> u32 {
        self.with_state(|s| s.angle_count)
    }

    pub fn current_time(&self) -> Ticks {
        self.with_state(|s| s.current_time)
    }

    pub fn total_time_of_title(&self) -> Ticks {
        self.with_state(|s| s.title_length)
    }

    pub fn total_read_position(&self) -> u64 {
        self.with_state(|s| s.total_read_position)
    }

    pub fn streams(&self) -> StreamSelection {
        self.with_state(|s| s.streams.clone())
    }

    pub fn is_hdmv_navigation(&self) -> bool {
        self.with_state(|s| s.hdmv_navigation)
    }

    pub fn is_in_menu(&self) -> bool {
        self.with_state(|s| s.in_menu)
    }

    pub fn is_popup_available(&self) -> bool {
        self.with_state(|s| s.popup_available)
    }

    pub fn is_in_still_frame(&self) -> bool {
        self.with_state(SessionState::is_in_still_frame)
    }

    pub fn is_reading_blocked(&self) -> bool {
        self.with_state(|s| s.process_state == ProcessState::Wait)
    }

    /// Why the reader is blocked, if it is.
    pub fn wait_reason(&self) -> Option<WaitReason> {
        self.with_state(|s| {
            if s.process_state == ProcessState::Wait {
                s.wait_reason
            } else {
                None
            }
        })
    }

    pub fn waiting_for_player(&self) -> bool {
        self.with_state(SessionState::waiting_for_player)
    }

    pub fn is_end_of_title(&self) -> bool {
        self.with_state(|s| s.end_of_title)
    }

    pub fn last_error(&self) -> Option<String> {
        self.with_state(|s| s.last_error.clone())
    }

    /// Kind of the most recently dispatched engine event.
    pub fn last_event(&self) -> &'static str {
        self.with_state(|s| s.last_event)
    }

    /// `(name, serial)`; the serial is empty when the disc has no id.
    pub fn name_and_serial(&self) -> (String, String) {
        self.with_state(|s| (s.identity.name.clone(), s.identity.serial.clone()))
    }

    pub fn describe_position(&self) -> String {
        self.with_state(SessionState::describe_position)
    }

    /// Snapshot of the overlay planes for drawing.
    pub fn take_snapshot_for_render(&self) -> OverlaySnapshot {
        self.shared.overlays.take_snapshot_for_render()
    }

    /// Release a blocked reader (still frame or player drain).
    pub fn skip_wait(&self) {
        tracing::debug!("wait released by player");
        self.shared.gate.release();
    }

    /// Ask the session to shut down. A blocked reader wakes and fails with
    /// `Closed`; the engine is released by the reader thread.
    pub fn close(&self) {
        self.shared.gate.close();
    }

    pub fn is_closed(&self) -> bool {
        self.shared.gate.is_closed()
    }
}
