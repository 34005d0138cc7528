//! Shared fixtures for bdstream-nav integration tests.
//!
//! Discs are built from JSON descriptions and served by the scripted engine,
//! so every test sees deterministic payloads and event sequences.

#![allow(dead_code)]

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use bdstream_core::NavConfig;
use bdstream_nav::scripted::{ScriptedDisc, ScriptedProvider};
use bdstream_nav::{BdBuffer, BdHandle};
use serde_json::json;

/// Disc id used by [`three_title_disc`].
pub const DISC_ID: &str = "0123456789abcdef0123456789abcdef01234567";

/// Config tuned for fast tests: no menus, short delays.
pub fn test_config() -> NavConfig {
    let mut config = NavConfig::default();
    config.navigation.try_menus = false;
    config.open.retry_delay_ms = 1;
    config.playback.wait_poll_interval_ms = 5;
    config
}

/// Three titles: a feature with chapters, an extra, and a still-frame-only
/// menu loop at index 2.
pub fn three_title_disc() -> ScriptedDisc {
    serde_json::from_value(json!({
        "name": "TEST_DISC",
        "volume_id": "TEST_VOLUME",
        "disc_id": DISC_ID,
        "top_menu": true,
        "titles": [
            {
                "playlist": 800,
                "duration_secs": 600,
                "chapters": [0, 200, 400],
                "angles": 2,
                "payload": {"size": 60000, "seed": 1},
                "clips": [{
                    "video_streams": [{"pid": 4113, "rate": "23.976"}],
                    "audio_streams": [
                        {"pid": 4352, "language": "eng"},
                        {"pid": 4353, "language": "deu"}
                    ],
                    "pg_streams": [{"pid": 4608, "language": "fra"}]
                }]
            },
            {
                "playlist": 801,
                "duration_secs": 60,
                "payload": {"size": 12288, "seed": 50},
                "timestamp_offset": 90000
            },
            {
                "playlist": 802,
                "duration_secs": 30,
                "payload": {"size": 6144, "seed": 99},
                "still": {"at": 0, "seconds": 0}
            }
        ]
    }))
    .expect("valid disc description")
}

/// Two titles, so snapshots from [`three_title_disc`] do not fit.
pub fn two_title_disc() -> ScriptedDisc {
    serde_json::from_value(json!({
        "name": "OTHER_DISC",
        "titles": [
            {"playlist": 1, "duration_secs": 300, "payload": {"size": 6144}},
            {"playlist": 2, "duration_secs": 300, "payload": {"size": 6144}}
        ]
    }))
    .expect("valid disc description")
}

/// A disc that opens on a first-play menu with one button entering title 0.
pub fn menu_disc() -> ScriptedDisc {
    serde_json::from_value(json!({
        "name": "MENU_DISC",
        "top_menu": true,
        "titles": [
            {"playlist": 10, "duration_secs": 900, "payload": {"size": 18432, "seed": 3}},
            {"playlist": 11, "duration_secs": 30, "payload": {"size": 6144}}
        ],
        "menu": {
            "playlist": 99,
            "enter_title": 0,
            "button": {
                "x": 100,
                "y": 50,
                "bitmap": {
                    "width": 4,
                    "height": 2,
                    "runs": [
                        {"len": 4, "color": 1}, {"len": 0, "color": 0},
                        {"len": 4, "color": 1}, {"len": 0, "color": 0}
                    ],
                    "palette": [
                        {"y": 16, "cr": 128, "cb": 128, "alpha": 0},
                        {"y": 235, "cr": 128, "cb": 128, "alpha": 255}
                    ]
                }
            }
        }
    }))
    .expect("valid disc description")
}

/// An open session plus the provider that opened it.
pub struct TestSession {
    pub buffer: BdBuffer,
    pub provider: Arc<ScriptedProvider>,
}

impl TestSession {
    pub fn open(disc: ScriptedDisc) -> Self {
        Self::open_with(disc, test_config())
    }

    pub fn open_with(disc: ScriptedDisc, config: NavConfig) -> Self {
        let provider = Arc::new(ScriptedProvider::new(disc));
        let buffer = BdBuffer::open("test-disc", 0, provider.as_ref(), config)
            .expect("failed to open scripted disc");
        Self { buffer, provider }
    }

    pub fn handle(&self) -> BdHandle {
        self.buffer.handle()
    }

    /// Read until the end of the current title.
    pub fn read_to_end(&mut self) -> Vec<u8> {
        let mut out = Vec::new();
        let mut buf = vec![0u8; 8192];
        loop {
            let n = self.buffer.read(&mut buf).expect("read failed");
            if n == 0 {
                return out;
            }
            out.extend_from_slice(&buf[..n]);
        }
    }
}

/// Expected payload bytes `[start, start + len)` for a title seed.
pub fn expected_payload(seed: u8, start: u64, len: usize) -> Vec<u8> {
    (start..start + len as u64)
        .map(|i| seed.wrapping_add((i % 251) as u8))
        .collect()
}

/// Poll `condition` until it holds or `timeout` passes.
pub fn wait_until(timeout: Duration, mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        thread::sleep(Duration::from_millis(2));
    }
    condition()
}
