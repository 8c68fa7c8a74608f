//! Rectangular-element morphology on 8-bit planes.
//!
//! The structuring element is anchored at `(kw / 2, kh / 2)`. Pixels outside
//! the image never take part in the min/max, so borders neither erode nor
//! dilate. A rectangle is separable: one horizontal and one vertical pass.

use crate::image::{GrayImage, GrayImageView, RgbImage, RgbImageView};

#[derive(Clone, Copy)]
enum Extremum {
    Min,
    Max,
}

impl Extremum {
    #[inline]
    fn pick(self, a: u8, b: u8) -> u8 {
        match self {
            Extremum::Min => a.min(b),
            Extremum::Max => a.max(b),
        }
    }
}

fn filter_axis(
    src: &[u8],
    width: usize,
    height: usize,
    k: usize,
    horizontal: bool,
    op: Extremum,
) -> Vec<u8> {
    if k <= 1 {
        return src.to_vec();
    }
    let before = k / 2;
    let after = k - 1 - before;
    let mut out = vec![0u8; src.len()];

    for y in 0..height {
        for x in 0..width {
            let (lo, hi, len) = if horizontal {
                (x.saturating_sub(before), (x + after).min(width - 1), width)
            } else {
                (y.saturating_sub(before), (y + after).min(height - 1), height)
            };
            debug_assert!(hi < len);
            let mut acc = src[y * width + x];
            for t in lo..=hi {
                let v = if horizontal {
                    src[y * width + t]
                } else {
                    src[t * width + x]
                };
                acc = op.pick(acc, v);
            }
            out[y * width + x] = acc;
        }
    }
    out
}

fn filter_rect(src: &GrayImageView<'_>, kw: usize, kh: usize, op: Extremum) -> GrayImage {
    if src.width == 0 || src.height == 0 {
        return GrayImage::new(src.width, src.height);
    }
    let rows = filter_axis(src.data, src.width, src.height, kw, true, op);
    let data = filter_axis(&rows, src.width, src.height, kh, false, op);
    GrayImage {
        width: src.width,
        height: src.height,
        data,
    }
}

/// Minimum over a `kw × kh` window.
pub fn erode_rect(src: &GrayImageView<'_>, kw: usize, kh: usize) -> GrayImage {
    filter_rect(src, kw, kh, Extremum::Min)
}

/// Maximum over a `kw × kh` window.
pub fn dilate_rect(src: &GrayImageView<'_>, kw: usize, kh: usize) -> GrayImage {
    filter_rect(src, kw, kh, Extremum::Max)
}

/// Opening: erosion followed by dilation with the same element.
pub fn open_rect(src: &GrayImageView<'_>, kw: usize, kh: usize) -> GrayImage {
    let eroded = erode_rect(src, kw, kh);
    dilate_rect(&eroded.view(), kw, kh)
}

/// Opening applied to each RGB channel independently.
pub fn open_rect_rgb(src: &RgbImageView<'_>, kw: usize, kh: usize) -> RgbImage {
    let n = src.width * src.height;
    let mut out = RgbImage::new(src.width, src.height);
    let mut plane = vec![0u8; n];
    for c in 0..RgbImage::CHANNELS {
        for (i, p) in plane.iter_mut().enumerate() {
            *p = src.data[3 * i + c];
        }
        let view = GrayImageView {
            width: src.width,
            height: src.height,
            data: &plane,
        };
        let opened = open_rect(&view, kw, kh);
        for (i, &v) in opened.data.iter().enumerate() {
            out.data[3 * i + c] = v;
        }
    }
    out
}
