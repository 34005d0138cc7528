//! Disc summaries for the `info` command.

use bdstream_core::{format_ticks, secs_to_ticks, ticks_to_secs};
use bdstream_nav::engine::StreamInfo;
use bdstream_nav::{BdBuffer, TitleInfo};
use serde::Serialize;
use std::fmt::Write as _;

/// Everything `bdstream info` prints about a disc.
#[derive(Debug, Clone, Serialize)]
pub struct DiscReport {
    pub name: String,
    pub serial: String,
    pub num_titles: u32,
    pub main_title: u32,
    pub hdmv_navigation: bool,
    pub titles: Vec<TitleSummary>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TitleSummary {
    pub index: u32,
    pub playlist: u32,
    pub duration_secs: u64,
    pub chapters: usize,
    pub angles: u32,
    pub audio_languages: Vec<String>,
    pub subtitle_languages: Vec<String>,
}

impl TitleSummary {
    fn from_info(info: &TitleInfo) -> Self {
        let languages = |streams: Option<&Vec<StreamInfo>>| -> Vec<String> {
            streams
                .map(|s| s.iter().map(|s| s.language.clone()).collect())
                .unwrap_or_default()
        };
        let clip = info.primary_clip();
        Self {
            index: info.index,
            playlist: info.playlist,
            duration_secs: ticks_to_secs(info.duration),
            chapters: info.chapters.len(),
            angles: info.angle_count,
            audio_languages: languages(clip.map(|c| &c.audio_streams)),
            subtitle_languages: languages(clip.map(|c| &c.pg_streams)),
        }
    }
}

impl DiscReport {
    /// Collect a report from an open session. Titles whose metadata cannot
    /// be read are left out.
    pub fn collect(buffer: &mut BdBuffer) -> Self {
        let (name, serial) = buffer.name_and_serial();
        let num_titles = buffer.num_titles();
        let titles = (0..num_titles)
            .filter_map(|t| buffer.get_title_info(t).ok())
            .map(|info| TitleSummary::from_info(&info))
            .collect();

        Self {
            name,
            serial,
            num_titles,
            main_title: buffer.main_title(),
            hdmv_navigation: buffer.is_hdmv_navigation(),
            titles,
        }
    }

    /// Human-readable rendering.
    pub fn render_text(&self) -> String {
        let mut out = String::new();
        let name = if self.name.is_empty() {
            "(unnamed)"
        } else {
            &self.name
        };
        let _ = writeln!(out, "Disc: {name}");
        let _ = writeln!(out, "Serial: {}", self.serial);
        let _ = writeln!(
            out,
            "Navigation: {}",
            if self.hdmv_navigation {
                "menus"
            } else {
                "titles"
            }
        );
        let _ = writeln!(out, "\nTitles: {}", self.num_titles);

        for title in &self.titles {
            let marker = if title.index == self.main_title {
                " (main)"
            } else {
                ""
            };
            let _ = write!(
                out,
                "  [{}] {:05}.mpls {}, {} chapters",
                title.index,
                title.playlist,
                format_ticks(secs_to_ticks(title.duration_secs)),
                title.chapters
            );
            if title.angles > 1 {
                let _ = write!(out, ", {} angles", title.angles);
            }
            let _ = writeln!(out, "{marker}");
            if !title.audio_languages.is_empty() {
                let _ = writeln!(out, "      audio: {}", title.audio_languages.join(", "));
            }
            if !title.subtitle_languages.is_empty() {
                let _ = writeln!(
                    out,
                    "      subtitles: {}",
                    title.subtitle_languages.join(", ")
                );
            }
        }

        out
    }
}
