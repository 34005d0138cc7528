//! Menu and subtitle overlay planes.
//!
//! The navigation engine describes on-screen graphics as a stream of plane
//! updates: a draw replaces a plane's bitmap, a wipe clears a rectangle in
//! place, a clear blanks the whole plane and a close destroys it. The
//! [`OverlayBuffer`] applies those updates under its own lock and hands the
//! renderer immutable [`OverlaySnapshot`]s, so drawing never holds the lock
//! and never blocks navigation.

use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

/// On-screen graphics layers a disc can address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OverlayPlaneId {
    /// Presentation graphics (bitmap subtitles).
    Subtitle,
    /// Interactive graphics (menu buttons).
    Graphics,
}

impl OverlayPlaneId {
    pub const ALL: [OverlayPlaneId; 2] = [OverlayPlaneId::Subtitle, OverlayPlaneId::Graphics];
}

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

/// A palette entry in the disc's native YCrCb colour space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaletteEntry {
    pub y: u8,
    pub cr: u8,
    pub cb: u8,
    /// Opacity, 0 = fully transparent.
    pub alpha: u8,
}

impl PaletteEntry {
    /// Convert to a packed ARGB pixel using the BT.601 coefficients.
    pub fn to_argb(self) -> u32 {
        let y = f32::from(self.y);
        let cr = f32::from(self.cr) - 128.0;
        let cb = f32::from(self.cb) - 128.0;

        let clamp = |v: f32| v.round().clamp(0.0, 255.0) as u32;
        let r = clamp(y + 1.402 * cr);
        let g = clamp(y - 0.34414 * cb - 0.71414 * cr);
        let b = clamp(y + 1.772 * cb);

        (u32::from(self.alpha) << 24) | (r << 16) | (g << 8) | b
    }
}

/// One run of a run-length encoded bitmap. A zero-length run ends the
/// current line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RleRun {
    pub len: u16,
    pub color: u8,
}

/// A paletted, run-length encoded bitmap.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PalettedBitmap {
    pub width: u16,
    pub height: u16,
    pub runs: Vec<RleRun>,
    pub palette: Vec<PaletteEntry>,
}

impl PalettedBitmap {
    fn decode(&self) -> OverlayImage {
        let mut image = OverlayImage::blank(self.width, self.height);
        let width = usize::from(self.width);
        let palette: Vec<u32> = self.palette.iter().map(|p| p.to_argb()).collect();

        let (mut row, mut col) = (0usize, 0usize);
        for run in &self.runs {
            if run.len == 0 {
                row += 1;
                col = 0;
                continue;
            }
            if row >= usize::from(self.height) {
                break;
            }
            let argb = palette.get(usize::from(run.color)).copied().unwrap_or(0);
            let end = (col + usize::from(run.len)).min(width);
            let base = row * width;
            image.pixels[base + col..base + end].fill(argb);
            col = end;
        }
        image
    }
}

/// An already-coloured bitmap.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArgbBitmap {
    pub width: u16,
    pub height: u16,
    /// Row-major packed ARGB pixels; missing pixels are transparent.
    pub pixels: Vec<u32>,
}

impl ArgbBitmap {
    fn decode(&self) -> OverlayImage {
        let mut image = OverlayImage::blank(self.width, self.height);
        let n = image.pixels.len().min(self.pixels.len());
        image.pixels[..n].copy_from_slice(&self.pixels[..n]);
        image
    }
}

/// A rectangle in screen coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rect {
    pub x: u16,
    pub y: u16,
    pub width: u16,
    pub height: u16,
}

/// The operation carried by an overlay update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum OverlayOp<B> {
    /// Replace the plane with `bitmap` placed at (`x`, `y`).
    Draw { x: u16, y: u16, bitmap: B },
    /// Make a screen rectangle of the plane transparent.
    Wipe(Rect),
    /// Make the whole plane transparent.
    Clear,
    /// Destroy the plane.
    Close,
}

/// A plane update addressed to one overlay plane.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverlayUpdate<B> {
    pub plane: OverlayPlaneId,
    /// Presentation timestamp (90 kHz) the update belongs to.
    pub pts: i64,
    pub op: OverlayOp<B>,
}

/// Paletted plane update (presentation and interactive graphics).
pub type OverlayCommand = OverlayUpdate<PalettedBitmap>;

/// Direct-colour plane update (BD-J style graphics).
pub type ArgbOverlayCommand = OverlayUpdate<ArgbBitmap>;

// ---------------------------------------------------------------------------
// Planes
// ---------------------------------------------------------------------------

/// A decoded ARGB image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverlayImage {
    pub width: u16,
    pub height: u16,
    pub pixels: Vec<u32>,
}

impl OverlayImage {
    fn blank(width: u16, height: u16) -> Self {
        Self {
            width,
            height,
            pixels: vec![0; usize::from(width) * usize::from(height)],
        }
    }

    pub fn pixel(&self, x: u16, y: u16) -> Option<u32> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.pixels
            .get(usize::from(y) * usize::from(self.width) + usize::from(x))
            .copied()
    }

    /// Whether every pixel is transparent.
    pub fn is_transparent(&self) -> bool {
        self.pixels.iter().all(|&p| p >> 24 == 0)
    }
}

/// The current content of one plane.
#[derive(Debug, Clone, PartialEq)]
pub struct OverlayPlane {
    pub image: Arc<OverlayImage>,
    pub pts: i64,
    pub x: u16,
    pub y: u16,
}

impl OverlayPlane {
    /// Make the screen rectangle transparent, copying the image first if a
    /// snapshot still shares it.
    fn wipe(&mut self, rect: Rect) {
        let left = u32::from(rect.x).saturating_sub(u32::from(self.x));
        let top = u32::from(rect.y).saturating_sub(u32::from(self.y));
        let right = (u32::from(rect.x) + u32::from(rect.width))
            .saturating_sub(u32::from(self.x))
            .min(u32::from(self.image.width));
        let bottom = (u32::from(rect.y) + u32::from(rect.height))
            .saturating_sub(u32::from(self.y))
            .min(u32::from(self.image.height));
        if left >= right || top >= bottom {
            return;
        }

        let image = Arc::make_mut(&mut self.image);
        let width = image.width as usize;
        for row in top as usize..bottom as usize {
            image.pixels[row * width + left as usize..row * width + right as usize].fill(0);
        }
    }

    fn clear(&mut self) {
        let image = Arc::make_mut(&mut self.image);
        image.pixels.fill(0);
    }
}

/// An immutable view of all planes at one instant.
#[derive(Debug, Clone, Default)]
pub struct OverlaySnapshot {
    /// Bumped on every change; renderers may skip redraws when unchanged.
    pub generation: u64,
    subtitle: Option<OverlayPlane>,
    graphics: Option<OverlayPlane>,
}

impl OverlaySnapshot {
    pub fn plane(&self, id: OverlayPlaneId) -> Option<&OverlayPlane> {
        match id {
            OverlayPlaneId::Subtitle => self.subtitle.as_ref(),
            OverlayPlaneId::Graphics => self.graphics.as_ref(),
        }
    }

    /// Planes in compositing order (subtitles below menus).
    pub fn planes(&self) -> impl Iterator<Item = (OverlayPlaneId, &OverlayPlane)> {
        OverlayPlaneId::ALL
            .into_iter()
            .filter_map(move |id| self.plane(id).map(|p| (id, p)))
    }

    pub fn is_empty(&self) -> bool {
        self.subtitle.is_none() && self.graphics.is_none()
    }
}

#[derive(Default)]
struct PlaneSet {
    generation: u64,
    subtitle: Option<OverlayPlane>,
    graphics: Option<OverlayPlane>,
}

impl PlaneSet {
    fn slot(&mut self, id: OverlayPlaneId) -> &mut Option<OverlayPlane> {
        match id {
            OverlayPlaneId::Subtitle => &mut self.subtitle,
            OverlayPlaneId::Graphics => &mut self.graphics,
        }
    }

    fn apply<B>(&mut self, update: &OverlayUpdate<B>, decode: impl FnOnce(&B) -> OverlayImage) {
        let slot = self.slot(update.plane);
        let changed = match &update.op {
            OverlayOp::Draw { x, y, bitmap } => {
                *slot = Some(OverlayPlane {
                    image: Arc::new(decode(bitmap)),
                    pts: update.pts,
                    x: *x,
                    y: *y,
                });
                true
            }
            OverlayOp::Wipe(rect) => match slot {
                Some(plane) => {
                    plane.wipe(*rect);
                    plane.pts = update.pts;
                    true
                }
                None => false,
            },
            OverlayOp::Clear => match slot {
                Some(plane) => {
                    plane.clear();
                    plane.pts = update.pts;
                    true
                }
                None => false,
            },
            OverlayOp::Close => slot.take().is_some(),
        };
        if changed {
            self.generation += 1;
        }
    }
}

/// Thread-safe holder of the overlay planes.
#[derive(Default)]
pub struct OverlayBuffer {
    planes: Mutex<PlaneSet>,
}

impl OverlayBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply a paletted plane update.
    pub fn submit_paletted(&self, command: &OverlayCommand) {
        tracing::trace!(plane = ?command.plane, pts = command.pts, "paletted overlay update");
        self.planes.lock().apply(command, PalettedBitmap::decode);
    }

    /// Apply a direct-colour plane update.
    pub fn submit_argb(&self, command: &ArgbOverlayCommand) {
        tracing::trace!(plane = ?command.plane, pts = command.pts, "argb overlay update");
        self.planes.lock().apply(command, ArgbBitmap::decode);
    }

    /// Remove every plane.
    pub fn clear_all(&self) {
        let mut planes = self.planes.lock();
        if planes.subtitle.is_some() || planes.graphics.is_some() {
            planes.subtitle = None;
            planes.graphics = None;
            planes.generation += 1;
        }
    }

    /// Consistent view of all planes for the renderer.
    pub fn take_snapshot_for_render(&self) -> OverlaySnapshot {
        let planes = self.planes.lock();
        OverlaySnapshot {
            generation: planes.generation,
            subtitle: planes.subtitle.clone(),
            graphics: planes.graphics.clone(),
        }
    }

    pub fn is_empty(&self) -> bool {
        let planes = self.planes.lock();
        planes.subtitle.is_none() && planes.graphics.is_none()
    }
}
