//! Pixel rectangles, detector boxes and the mapping between detector and
//! image frames.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Width/height pair of an image or of a model's inference frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FrameSize {
    pub width: usize,
    pub height: usize,
}

impl FrameSize {
    #[inline]
    pub const fn new(width: usize, height: usize) -> Self {
        Self { width, height }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    #[inline]
    pub fn area(&self) -> usize {
        self.width * self.height
    }
}

impl fmt::Display for FrameSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Axis-aligned integer rectangle `(x, y, w, h)`; covers `[x, x+w) × [y, y+h)`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PixelRect {
    pub x: usize,
    pub y: usize,
    pub width: usize,
    pub height: usize,
}

impl PixelRect {
    #[inline]
    pub const fn new(x: usize, y: usize, width: usize, height: usize) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    #[inline]
    pub fn right(&self) -> usize {
        self.x + self.width
    }

    #[inline]
    pub fn bottom(&self) -> usize {
        self.y + self.height
    }

    #[inline]
    pub fn area(&self) -> usize {
        self.width * self.height
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    #[inline]
    pub fn contains(&self, x: usize, y: usize) -> bool {
        x >= self.x && x < self.right() && y >= self.y && y < self.bottom()
    }

    /// Intersection with a `bounds`-sized frame anchored at the origin.
    pub fn clip_to(&self, bounds: FrameSize) -> Option<PixelRect> {
        let right = self.right().min(bounds.width);
        let bottom = self.bottom().min(bounds.height);
        if self.x >= right || self.y >= bottom {
            return None;
        }
        Some(PixelRect::new(self.x, self.y, right - self.x, bottom - self.y))
    }
}

/// Corner-form box `(x1, y1) - (x2, y2)` in floating point pixel units.
///
/// Serialised as `[x1, y1, x2, y2]`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f32; 4]", into = "[f32; 4]")]
pub struct DetectionBox {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
}

impl From<[f32; 4]> for DetectionBox {
    fn from([x1, y1, x2, y2]: [f32; 4]) -> Self {
        Self { x1, y1, x2, y2 }
    }
}

impl From<DetectionBox> for [f32; 4] {
    fn from(b: DetectionBox) -> Self {
        [b.x1, b.y1, b.x2, b.y2]
    }
}

impl fmt::Display for DetectionBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{:.1}, {:.1}, {:.1}, {:.1}]",
            self.x1, self.y1, self.x2, self.y2
        )
    }
}

impl DetectionBox {
    #[inline]
    pub const fn new(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        Self { x1, y1, x2, y2 }
    }

    /// Round to whole pixels and clamp into `bounds`.
    ///
    /// Returns `None` when nothing of the box survives.
    pub fn to_pixel_rect(&self, bounds: FrameSize) -> Option<PixelRect> {
        let clamp = |v: f32, max: usize| -> usize {
            if !v.is_finite() {
                return 0;
            }
            v.round().clamp(0.0, max as f32) as usize
        };
        let x1 = clamp(self.x1.min(self.x2), bounds.width);
        let x2 = clamp(self.x1.max(self.x2), bounds.width);
        let y1 = clamp(self.y1.min(self.y2), bounds.height);
        let y2 = clamp(self.y1.max(self.y2), bounds.height);
        if x2 <= x1 || y2 <= y1 {
            return None;
        }
        Some(PixelRect::new(x1, y1, x2 - x1, y2 - y1))
    }
}

/// Map a box from a detector's inference frame back into the original image.
///
/// The detector is assumed to have letterboxed the image: scaled it by a
/// single gain (aspect preserved) and centred it with padding. An empty
/// `inference` frame means the box is already in image coordinates.
pub fn scale_box_to_frame(
    bbox: DetectionBox,
    inference: FrameSize,
    image: FrameSize,
) -> DetectionBox {
    if inference.is_empty() || image.is_empty() || inference == image {
        return bbox;
    }

    let gain = (inference.height as f32 / image.height as f32)
        .min(inference.width as f32 / image.width as f32);
    let pad_x = (inference.width as f32 - image.width as f32 * gain) / 2.0;
    let pad_y = (inference.height as f32 - image.height as f32 * gain) / 2.0;

    let max_x = image.width as f32;
    let max_y = image.height as f32;
    DetectionBox {
        x1: ((bbox.x1 - pad_x) / gain).clamp(0.0, max_x),
        y1: ((bbox.y1 - pad_y) / gain).clamp(0.0, max_y),
        x2: ((bbox.x2 - pad_x) / gain).clamp(0.0, max_x),
        y2: ((bbox.y2 - pad_y) / gain).clamp(0.0, max_y),
    }
}
