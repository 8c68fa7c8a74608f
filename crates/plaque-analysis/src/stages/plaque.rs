//! Per-tooth plaque classification.
//!
//! A crop is normalised to full brightness in HSV space so that only hue and
//! saturation decide its grey level. It is then opened with a rectangular
//! element, which absorbs small clean specks inside a stain, converted to
//! grey and binarized. Plaque comes out black, clean enamel white.

use crate::params::AnalysisParams;
use plaque_core::{
    binarize_at_least, count_at_least, flatten_value, open_rect_rgb, rgb_to_gray, GrayImage,
    RgbImageView,
};
use serde::{Deserialize, Serialize};

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Pixel counts for one tooth, taken from its resized crop.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaqueMeasurement {
    /// Pixels that belong to the tooth (grey level at or above the area threshold).
    pub tooth_area: u64,
    /// Pixels classified as plaque.
    pub black_pixel_count: u64,
    pub total_pixels: u64,
}

/// Output of [`PlaqueQuantifier::measure`].
#[derive(Clone, Debug)]
pub struct ToothPlaque {
    pub measurement: PlaqueMeasurement,
    /// Plaque mask of the unscaled crop; pasted into the composite.
    pub mask: GrayImage,
    /// Plaque mask of the resized crop; the counts come from this one.
    pub resized_mask: GrayImage,
}

#[derive(Clone, Debug)]
pub struct PlaqueQuantifier {
    kernel: usize,
    plaque_threshold: f32,
    area_threshold: f32,
}

impl PlaqueQuantifier {
    pub fn new(params: &AnalysisParams) -> Self {
        Self {
            kernel: params.morph_kernel,
            plaque_threshold: params.plaque_threshold(),
            area_threshold: params.tooth_area_threshold as f32,
        }
    }

    /// `255` for clean pixels, `0` for plaque.
    pub fn plaque_mask(&self, image: &RgbImageView<'_>) -> GrayImage {
        let flat = flatten_value(image);
        let opened = open_rect_rgb(&flat.view(), self.kernel, self.kernel);
        let gray = rgb_to_gray(&opened.view());
        binarize_at_least(&gray.view(), self.plaque_threshold)
    }

    /// Classify both crops of one tooth and count pixels on the resized one.
    #[cfg_attr(
        feature = "tracing",
        instrument(level = "debug", skip_all, fields(w = crop.width, h = crop.height))
    )]
    pub fn measure(&self, crop: &RgbImageView<'_>, resized: &RgbImageView<'_>) -> ToothPlaque {
        let mask = self.plaque_mask(crop);
        let resized_mask = self.plaque_mask(resized);

        let total = resized_mask.pixel_count() as u64;
        let white = resized_mask.count_nonzero() as u64;
        let area = count_at_least(&rgb_to_gray(resized).view(), self.area_threshold) as u64;

        ToothPlaque {
            measurement: PlaqueMeasurement {
                tooth_area: area,
                black_pixel_count: total - white,
                total_pixels: total,
            },
            mask,
            resized_mask,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use plaque_core::{rgb_to_hsv, RgbImage};

    fn quantifier() -> PlaqueQuantifier {
        PlaqueQuantifier::new(&AnalysisParams::default())
    }

    #[test]
    fn white_enamel_is_clean() {
        let img = RgbImage::from_pixel(12, 12, [230, 230, 225]);
        let out = quantifier().measure(&img.view(), &img.view());
        assert_eq!(out.measurement.black_pixel_count, 0);
        assert_eq!(out.measurement.tooth_area, 144);
        assert_eq!(out.measurement.total_pixels, 144);
        assert_eq!(out.mask.count_nonzero(), 144);
    }

    #[test]
    fn saturated_stain_is_plaque_regardless_of_brightness() {
        // Dark and light magenta share a hue; both flatten to the same colour.
        let dark = RgbImage::from_pixel(10, 10, [90, 0, 90]);
        let light = RgbImage::from_pixel(10, 10, [200, 0, 200]);
        let q = quantifier();
        assert_eq!(q.plaque_mask(&dark.view()), q.plaque_mask(&light.view()));
        assert_eq!(rgb_to_hsv([200, 0, 200])[1], 255);

        let out = q.measure(&dark.view(), &dark.view());
        assert_eq!(out.measurement.black_pixel_count, 100);
        assert_eq!(out.measurement.tooth_area, 100);
    }

    #[test]
    fn masked_background_counts_as_plaque_but_not_area() {
        // Black background flattens to white (hue 0, saturation 0).
        let mut img = RgbImage::new(20, 20);
        for y in 5..15 {
            for x in 5..15 {
                img.put_pixel(x, y, [120, 0, 120]);
            }
        }
        let out = quantifier().measure(&img.view(), &img.view());
        assert_eq!(out.measurement.tooth_area, 100);
        assert_eq!(out.measurement.black_pixel_count, 100);
    }

    #[test]
    fn clean_specks_inside_plaque_are_absorbed() {
        let mut img = RgbImage::from_pixel(15, 15, [150, 0, 150]);
        img.put_pixel(7, 7, [240, 240, 240]);
        let q = quantifier();
        assert_eq!(q.plaque_mask(&img.view()).count_nonzero(), 0);
        let out = q.measure(&img.view(), &img.view());
        assert_eq!(out.measurement.black_pixel_count, 225);
    }

    #[test]
    fn counts_respect_invariant() {
        let mut img = RgbImage::new(9, 9);
        for y in 0..9 {
            for x in 0..9 {
                img.put_pixel(x, y, [(x * 28) as u8, (y * 28) as u8, 60]);
            }
        }
        let m = quantifier().measure(&img.view(), &img.view()).measurement;
        assert!(m.black_pixel_count <= m.total_pixels);
        assert!(m.tooth_area <= m.total_pixels);
    }
}
