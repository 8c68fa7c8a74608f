//! Binarization helpers.

use crate::image::{GrayImage, GrayImageView};

/// `255` where `v >= threshold`, `0` elsewhere.
///
/// The threshold is compared in floating point so fractional cut-offs such as
/// `0.7 * 255` behave as expected.
pub fn binarize_at_least(src: &GrayImageView<'_>, threshold: f32) -> GrayImage {
    let data = src
        .data
        .iter()
        .map(|&v| if v as f32 >= threshold { 255 } else { 0 })
        .collect();
    GrayImage {
        width: src.width,
        height: src.height,
        data,
    }
}

/// Number of pixels with `v >= threshold`.
pub fn count_at_least(src: &GrayImageView<'_>, threshold: f32) -> usize {
    src.data.iter().filter(|&&v| v as f32 >= threshold).count()
}
