//! Resume tokens: capture and restore the navigation position.

use bdstream_core::{Error, Result, StreamKind, Ticks};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::buffer::BdBuffer;
use crate::session::{ProcessState, StreamSelection};

/// Token format version.
pub const SNAPSHOT_VERSION: u32 = 1;

/// Serialized navigation position of a disc session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateSnapshot {
    pub version: u32,
    pub disc_serial: String,
    pub num_titles: u32,
    pub title: Option<u32>,
    pub playlist: u32,
    pub playitem: u32,
    pub chapter: u32,
    pub angle: u32,
    pub time: Ticks,
    pub streams: StreamSelection,
    pub captured_at: DateTime<Utc>,
}

impl StateSnapshot {
    pub fn to_token(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| Error::InvalidState(format!("cannot encode snapshot: {e}")))
    }

    pub fn from_token(token: &str) -> Result<Self> {
        let snapshot: Self = serde_json::from_str(token)
            .map_err(|e| Error::InvalidState(format!("malformed snapshot token: {e}")))?;
        if snapshot.version != SNAPSHOT_VERSION {
            return Err(Error::InvalidState(format!(
                "unsupported snapshot version {} (expected {SNAPSHOT_VERSION})",
                snapshot.version
            )));
        }
        Ok(snapshot)
    }
}

const RESTORED_STREAMS: [StreamKind; 5] = [
    StreamKind::Audio,
    StreamKind::Interactive,
    StreamKind::Subtitle,
    StreamKind::SecondaryAudio,
    StreamKind::SecondaryVideo,
];

impl BdBuffer {
    /// Capture the current position. Does not touch the engine.
    pub fn snapshot(&self) -> Result<String> {
        let state = self.shared.state.lock();
        StateSnapshot {
            version: SNAPSHOT_VERSION,
            disc_serial: state.identity.serial.clone(),
            num_titles: state.num_titles,
            title: state.current_title,
            playlist: state.current_playlist,
            playitem: state.current_playitem,
            chapter: state.current_chapter,
            angle: state.current_angle,
            time: state.current_time,
            streams: state.streams.clone(),
            captured_at: Utc::now(),
        }
        .to_token()
    }

    /// Return to the position captured in `token`.
    ///
    /// The token is fully validated against the open disc first; a token
    /// that does not fit leaves the session untouched.
    pub fn restore(&mut self, token: &str) -> Result<()> {
        let snapshot = StateSnapshot::from_token(token)?;
        self.validate_snapshot(&snapshot)?;

        let engine = self.engine_mut()?;
        let selected = match snapshot.title {
            Some(title) => engine.select_title(title),
            None => engine.select_playlist(snapshot.playlist),
        };
        if !selected {
            return Err(Error::navigation("engine rejected restored title"));
        }
        self.handle_events();

        if snapshot.angle != 0 && !self.engine_mut()?.select_angle(snapshot.angle) {
            return Err(Error::navigation(format!(
                "engine rejected restored angle {}",
                snapshot.angle
            )));
        }
        if snapshot.chapter != 0 && self.engine_mut()?.seek_chapter(snapshot.chapter).is_none() {
            return Err(Error::navigation(format!(
                "engine rejected restored chapter {}",
                snapshot.chapter
            )));
        }
        for kind in RESTORED_STREAMS {
            let number = snapshot.streams.number(kind);
            if number == 0 {
                continue;
            }
            let enabled = snapshot.streams.enabled(kind);
            if !self.engine_mut()?.select_stream(kind, number, enabled) {
                tracing::warn!(session = %self.session_id, %kind, number, "Engine rejected restored stream");
            }
        }
        self.handle_events();

        self.shared.overlays.clear_all();
        self.pending.clear();
        let time = self.engine.as_ref().map_or(0, |e| e.tell_time());
        let mut state = self.shared.state.lock();
        state.clear_wait();
        state.process_state = ProcessState::Normal;
        state.current_chapter = state.clamp_chapter(snapshot.chapter);
        state.current_angle = snapshot.angle;
        state.current_time = time;
        tracing::info!(
            session = %self.session_id,
            title = ?snapshot.title,
            playlist = snapshot.playlist,
            chapter = snapshot.chapter,
            "Restored position"
        );
        Ok(())
    }

    fn validate_snapshot(&mut self, snapshot: &StateSnapshot) -> Result<()> {
        let (num_titles, serial) = {
            let state = self.shared.state.lock();
            (state.num_titles, state.identity.serial.clone())
        };
        if snapshot.num_titles != num_titles {
            return Err(Error::InvalidState(format!(
                "snapshot is for a disc with {} titles, this disc has {num_titles}",
                snapshot.num_titles
            )));
        }
        if snapshot.disc_serial != serial {
            return Err(Error::InvalidState("snapshot is for a different disc".into()));
        }

        let info = match snapshot.title {
            Some(title) if title >= num_titles => {
                return Err(Error::InvalidState(format!("title {title} out of range")));
            }
            Some(title) => self.get_title_info(title),
            None => self.get_playlist_info(snapshot.playlist),
        }
        .map_err(|e| Error::InvalidState(format!("snapshot position unavailable: {e}")))?;

        if snapshot.title.is_some() && info.playlist != snapshot.playlist {
            return Err(Error::InvalidState(format!(
                "playlist {} does not belong to title {}",
                snapshot.playlist, info.index
            )));
        }
        if !info.chapters.is_empty() && snapshot.chapter as usize >= info.chapters.len() {
            return Err(Error::InvalidState(format!(
                "chapter {} out of range",
                snapshot.chapter
            )));
        }
        if snapshot.angle >= info.angle_count.max(1) {
            return Err(Error::InvalidState(format!("angle {} out of range", snapshot.angle)));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> StateSnapshot {
        StateSnapshot {
            version: SNAPSHOT_VERSION,
            disc_serial: "ab".repeat(20),
            num_titles: 3,
            title: Some(1),
            playlist: 801,
            playitem: 0,
            chapter: 2,
            angle: 0,
            time: 90_000,
            streams: StreamSelection::default(),
            captured_at: Utc::now(),
        }
    }

    #[test]
    fn token_round_trips() {
        let snapshot = sample();
        let token = snapshot.to_token().unwrap();
        assert_eq!(StateSnapshot::from_token(&token).unwrap(), snapshot);
    }

    #[test]
    fn rejects_malformed_token() {
        let err = StateSnapshot::from_token("not a token").unwrap_err();
        assert!(matches!(err, Error::InvalidState(_)));
    }

    #[test]
    fn rejects_other_version() {
        let mut snapshot = sample();
        snapshot.version = 99;
        let token = serde_json::to_string(&snapshot).unwrap();
        let err = StateSnapshot::from_token(&token).unwrap_err();
        assert!(err.to_string().contains("version 99"));
    }
}
