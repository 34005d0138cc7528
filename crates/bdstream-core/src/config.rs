//! Navigation configuration types.
//!
//! The top-level [`NavConfig`] is deserialized from JSON and carries the
//! open, navigation, playback and player-setting sections. Every section
//! defaults sensibly so a completely empty `{}` file is valid.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::error::Result;
use crate::Error;

// ---------------------------------------------------------------------------
// Top-level NavConfig
// ---------------------------------------------------------------------------

/// Root navigation configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NavConfig {
    pub open: OpenConfig,
    pub navigation: NavigationConfig,
    pub playback: PlaybackConfig,
    pub player: PlayerConfig,
}

impl NavConfig {
    /// Deserialize a `NavConfig` from a JSON string.
    pub fn from_json(json_str: &str) -> Result<Self> {
        serde_json::from_str(json_str).map_err(|e| Error::Config(format!("config parse error: {e}")))
    }

    /// Load configuration from a file path, falling back to defaults if the
    /// path is `None` or the file does not exist.
    pub fn load_or_default(path: Option<&Path>) -> Self {
        let Some(path) = path else {
            return Self::default();
        };

        match std::fs::read_to_string(path) {
            Ok(contents) => Self::from_json(&contents).unwrap_or_else(|e| {
                tracing::warn!("Failed to parse config file {}: {e}", path.display());
                Self::default()
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!("No config file at {}; using defaults", path.display());
                Self::default()
            }
            Err(e) => {
                tracing::warn!("Failed to read config file {}: {e}", path.display());
                Self::default()
            }
        }
    }

    /// Return a list of validation warnings (non-fatal issues).
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        if self.playback.wait_poll_interval_ms == 0 {
            warnings.push(
                "playback.wait_poll_interval_ms is 0; waits will wake continuously".into(),
            );
        }

        if self.open.retries == 0 && self.open.retry_delay_ms > 0 {
            warnings.push("open.retry_delay_ms is set but open.retries is 0".into());
        }

        for (field, code) in [
            ("player.audio_language", &self.player.audio_language),
            ("player.subtitle_language", &self.player.subtitle_language),
            ("player.menu_language", &self.player.menu_language),
        ] {
            if !is_iso639_2(code) {
                warnings.push(format!(
                    "{field} '{code}' is not a three-letter ISO 639-2 code"
                ));
            }
        }

        if self.player.country.len() != 2 || !self.player.country.is_ascii() {
            warnings.push(format!(
                "player.country '{}' is not a two-letter ISO 3166 code",
                self.player.country
            ));
        }

        if self.player.region_code().is_none() {
            warnings.push(format!(
                "player.region '{}' is not a recognized region (valid: A, B, C)",
                self.player.region
            ));
        }

        if self.player.parental_level > 99 {
            warnings.push(format!(
                "player.parental_level {} exceeds the maximum of 99",
                self.player.parental_level
            ));
        }

        warnings
    }
}

fn is_iso639_2(code: &str) -> bool {
    code.len() == 3 && code.bytes().all(|b| b.is_ascii_lowercase())
}

// ---------------------------------------------------------------------------
// Sub-configs
// ---------------------------------------------------------------------------

/// Disc open settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OpenConfig {
    /// Extra attempts after a transient open failure.
    pub retries: u32,
    pub retry_delay_ms: u64,
}

impl OpenConfig {
    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }
}

impl Default for OpenConfig {
    fn default() -> Self {
        Self {
            retries: 3,
            retry_delay_ms: 250,
        }
    }
}

/// Title selection and menu settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NavigationConfig {
    /// Start menu-driven (HDMV) navigation when the disc has a first-play object.
    pub try_menus: bool,
    /// Titles shorter than this are never picked as the main title.
    pub min_title_length_secs: u64,
    /// Skip player-drain waits instead of blocking the reader. Still frames
    /// are always honoured.
    pub ignore_wait_states: bool,
}

impl Default for NavigationConfig {
    fn default() -> Self {
        Self {
            try_menus: true,
            min_title_length_secs: 120,
            ignore_wait_states: true,
        }
    }
}

/// Reader-side playback settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackConfig {
    /// How often a blocked reader wakes to re-check its wait condition.
    pub wait_poll_interval_ms: u64,
}

impl PlaybackConfig {
    pub fn wait_poll_interval(&self) -> Duration {
        Duration::from_millis(self.wait_poll_interval_ms.max(1))
    }
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            wait_poll_interval_ms: 100,
        }
    }
}

/// Player settings handed to the navigation engine at open time.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    pub audio_language: String,
    pub subtitle_language: String,
    pub menu_language: String,
    pub country: String,
    pub region: String,
    pub parental_level: u32,
}

impl PlayerConfig {
    /// Region letter as the bitmask the engine expects (A=1, B=2, C=4).
    pub fn region_code(&self) -> Option<u32> {
        match self.region.to_ascii_uppercase().as_str() {
            "A" => Some(1),
            "B" => Some(2),
            "C" => Some(4),
            _ => None,
        }
    }
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            audio_language: default_language(),
            subtitle_language: default_language(),
            menu_language: default_language(),
            country: "us".into(),
            region: "A".into(),
            parental_level: 99,
        }
    }
}

fn default_language() -> String {
    "eng".into()
}
