//! Core raster types and utilities for dental plaque analysis.
//!
//! This crate is intentionally small and purely numeric. It does *not*
//! depend on any image codec, model runtime or storage backend: callers
//! adapt their buffers into the lightweight views defined here.

mod color;
mod geometry;
mod image;
mod logger;
mod mask;
mod morphology;
mod threshold;

pub use color::{flatten_value, hsv_to_rgb, rgb_to_hsv};
pub use geometry::{scale_box_to_frame, DetectionBox, FrameSize, PixelRect};
pub use image::{
    resize_bilinear, rgb_to_gray, sample_bilinear_rgb, GrayImage, GrayImageView, RgbImage,
    RgbImageView,
};
pub use mask::{BinaryMask, MaskError};
pub use morphology::{dilate_rect, erode_rect, open_rect, open_rect_rgb};
pub use threshold::{binarize_at_least, count_at_least};

#[cfg(feature = "tracing")]
pub use logger::init_tracing;

pub use logger::{default_directive, init_with_level, level_from_verbosity};
