//! Per-instance boolean masks.

use crate::geometry::{FrameSize, PixelRect};
use crate::image::{RgbImage, RgbImageView};

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum MaskError {
    #[error("mask buffer length {got} does not match {size} ({expected} pixels)")]
    InvalidLength {
        size: FrameSize,
        expected: usize,
        got: usize,
    },
    #[error("run-length counts cover {got} pixels, expected {expected}")]
    InvalidRle { expected: usize, got: usize },
    #[error("run-length mask {width}x{height} overflows the pixel count")]
    RleOverflow { width: usize, height: usize },
    #[error("mask is {mask}, image is {image}")]
    SizeMismatch { mask: FrameSize, image: FrameSize },
}

/// Row-major boolean raster; `true` marks pixels that belong to the instance.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BinaryMask {
    pub width: usize,
    pub height: usize,
    pub data: Vec<bool>,
}

impl BinaryMask {
    /// Empty (all-`false`) mask.
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            data: vec![false; width * height],
        }
    }

    pub fn from_raw(width: usize, height: usize, data: Vec<bool>) -> Result<Self, MaskError> {
        let expected = width.checked_mul(height).unwrap_or(usize::MAX);
        if data.len() != expected {
            return Err(MaskError::InvalidLength {
                size: FrameSize::new(width, height),
                expected,
                got: data.len(),
            });
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Decode an uncompressed row-major run-length encoding.
    ///
    /// Runs alternate starting with `false`; a leading zero-length run is
    /// how a mask that starts with a foreground pixel is expressed.
    pub fn from_rle(width: usize, height: usize, counts: &[usize]) -> Result<Self, MaskError> {
        let overflow = || MaskError::RleOverflow { width, height };
        let expected = width.checked_mul(height).ok_or_else(overflow)?;
        let got = counts
            .iter()
            .try_fold(0usize, |acc, &run| acc.checked_add(run))
            .ok_or_else(overflow)?;
        if got != expected {
            return Err(MaskError::InvalidRle { expected, got });
        }
        let mut data = Vec::with_capacity(expected);
        let mut value = false;
        for &run in counts {
            data.extend(std::iter::repeat(value).take(run));
            value = !value;
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Mask that is `true` exactly inside `rect` (clipped to the mask).
    pub fn from_rect(width: usize, height: usize, rect: &PixelRect) -> Self {
        let mut mask = Self::new(width, height);
        if let Some(r) = rect.clip_to(mask.size()) {
            for y in r.y..r.bottom() {
                mask.data[y * width + r.x..y * width + r.right()].fill(true);
            }
        }
        mask
    }

    #[inline]
    pub fn size(&self) -> FrameSize {
        FrameSize::new(self.width, self.height)
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> bool {
        self.data[y * self.width + x]
    }

    #[inline]
    pub fn set(&mut self, x: usize, y: usize, value: bool) {
        self.data[y * self.width + x] = value;
    }

    pub fn count(&self) -> usize {
        self.data.iter().filter(|&&v| v).count()
    }

    /// Minimum upright rectangle enclosing every `true` pixel.
    pub fn bounding_rect(&self) -> Option<PixelRect> {
        let mut min_x = usize::MAX;
        let mut min_y = usize::MAX;
        let mut max_x = 0usize;
        let mut max_y = 0usize;
        let mut any = false;

        for y in 0..self.height {
            let row = &self.data[y * self.width..(y + 1) * self.width];
            let Some(first) = row.iter().position(|&v| v) else {
                continue;
            };
            let last = row.iter().rposition(|&v| v).unwrap_or(first);
            any = true;
            min_x = min_x.min(first);
            max_x = max_x.max(last);
            min_y = min_y.min(y);
            max_y = max_y.max(y);
        }

        any.then(|| PixelRect::new(min_x, min_y, max_x - min_x + 1, max_y - min_y + 1))
    }

    /// Copy of `image` with every pixel outside the mask set to `[0, 0, 0]`.
    pub fn apply_to(&self, image: &RgbImageView<'_>) -> Result<RgbImage, MaskError> {
        if self.size() != image.size() {
            return Err(MaskError::SizeMismatch {
                mask: self.size(),
                image: image.size(),
            });
        }
        let mut out = RgbImage::new(image.width, image.height);
        for (i, &keep) in self.data.iter().enumerate() {
            if keep {
                out.data[3 * i..3 * i + 3].copy_from_slice(&image.data[3 * i..3 * i + 3]);
            }
        }
        Ok(out)
    }
}
