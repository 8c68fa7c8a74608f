use crate::codec::save_gray;
use crate::error::AnalysisError;
use crate::session::AnalysisSession;
use crate::stages::plaque::PlaqueMeasurement;
use crate::store::BlobStore;
use plaque_core::{FrameSize, GrayImage, GrayImageView, PixelRect};
use std::path::PathBuf;

/// Whole-mouth totals plus the composite plaque mask.
#[derive(Clone, Debug)]
pub struct AggregateResult {
    pub total_teeth_area: u64,
    pub total_black_pixels: u64,
    /// `total_black_pixels / total_teeth_area * 100`, unrounded.
    pub percentage: f64,
    pub teeth: usize,
    /// Range-image-sized canvas; white except where tooth masks were pasted.
    pub composite: GrayImage,
}

impl AggregateResult {
    /// Percentage rounded to two decimals.
    pub fn rounded_percentage(&self) -> f64 {
        (self.percentage * 100.0).round() / 100.0
    }

    pub fn within_bounds(&self) -> bool {
        (0.0..=100.0).contains(&self.percentage)
    }
}

/// Accumulates per-tooth results in instance order.
#[derive(Clone, Debug)]
pub struct ResultAggregator {
    canvas: GrayImage,
    total_teeth_area: u64,
    total_black_pixels: u64,
    teeth: usize,
}

impl ResultAggregator {
    /// Start from an all-white canvas of the range image's size.
    pub fn new(range_size: FrameSize) -> Self {
        Self {
            canvas: GrayImage::filled(range_size.width, range_size.height, 255),
            total_teeth_area: 0,
            total_black_pixels: 0,
            teeth: 0,
        }
    }

    /// Paste `mask` at `rect` and add the tooth's counts.
    ///
    /// Only `[x, x+w) × [y, y+h)` is written, clipped to the canvas; later
    /// teeth overwrite earlier ones where rectangles overlap.
    pub fn add(&mut self, rect: &PixelRect, mask: &GrayImageView<'_>, m: &PlaqueMeasurement) {
        self.paste(rect, mask);
        self.total_teeth_area += m.tooth_area;
        self.total_black_pixels += m.black_pixel_count;
        self.teeth += 1;
    }

    fn paste(&mut self, rect: &PixelRect, mask: &GrayImageView<'_>) {
        let Some(clip) = rect.clip_to(self.canvas.size()) else {
            return;
        };
        let x_end = clip.right().min(rect.x + mask.width);
        let y_end = clip.bottom().min(rect.y + mask.height);
        for y in clip.y..y_end {
            let src_row = (y - rect.y) * mask.width;
            for x in clip.x..x_end {
                let v = mask.data[src_row + (x - rect.x)];
                self.canvas.set(x, y, v);
            }
        }
    }

    #[inline]
    pub fn teeth(&self) -> usize {
        self.teeth
    }

    pub fn finish(self) -> Result<AggregateResult, AnalysisError> {
        if self.total_teeth_area == 0 {
            return Err(AnalysisError::DivisionByZero {
                teeth: self.teeth,
                total_black_pixels: self.total_black_pixels,
            });
        }
        let percentage =
            self.total_black_pixels as f64 / self.total_teeth_area as f64 * 100.0;
        if !(0.0..=100.0).contains(&percentage) {
            log::warn!(
                "plaque percentage {percentage:.2} outside [0, 100] ({} plaque / {} area)",
                self.total_black_pixels,
                self.total_teeth_area
            );
        }
        Ok(AggregateResult {
            total_teeth_area: self.total_teeth_area,
            total_black_pixels: self.total_black_pixels,
            percentage,
            teeth: self.teeth,
            composite: self.canvas,
        })
    }
}

/// One-shot form of [`ResultAggregator`].
///
/// Every mask is pasted and every measurement summed; the two slices are not
/// required to pair up.
pub fn aggregate(
    range_size: FrameSize,
    masks: &[(PixelRect, GrayImage)],
    measurements: &[PlaqueMeasurement],
) -> Result<AggregateResult, AnalysisError> {
    let mut agg = ResultAggregator::new(range_size);
    for (rect, mask) in masks {
        agg.paste(rect, &mask.view());
    }
    for m in measurements {
        agg.total_teeth_area += m.tooth_area;
        agg.total_black_pixels += m.black_pixel_count;
        agg.teeth += 1;
    }
    agg.finish()
}

/// Write the composite to the session's `teeth_range_detect.png`.
pub(crate) fn persist_composite(
    store: &dyn BlobStore,
    session: &AnalysisSession,
    result: &AggregateResult,
) -> Result<PathBuf, AnalysisError> {
    let path = session.composite_image();
    save_gray(store, &path, &result.composite)?;
    Ok(path)
}
