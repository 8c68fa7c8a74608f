use crate::codec::{load_rgb, save_rgb};
use crate::error::AnalysisError;
use crate::model::ObjectLocator;
use crate::params::AnalysisParams;
use crate::session::AnalysisSession;
use crate::store::BlobStore;
use plaque_core::{scale_box_to_frame, FrameSize, PixelRect, RgbImage};
use std::path::PathBuf;

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Cropped tooth row.
#[derive(Clone, Debug)]
pub struct ToothRangeResult {
    pub image: RgbImage,
    /// Crop window in original-photo pixels.
    pub crop: PixelRect,
    /// Confidence of the detection that was used.
    pub confidence: f32,
    pub path: PathBuf,
}

impl ToothRangeResult {
    #[inline]
    pub fn size(&self) -> FrameSize {
        self.image.size()
    }

    #[inline]
    pub fn channels(&self) -> usize {
        RgbImage::CHANNELS
    }
}

/// Stage 1: find the row of teeth and crop it from the full-resolution photo.
pub struct ToothRangeLocator<'a> {
    locator: &'a dyn ObjectLocator,
    store: &'a dyn BlobStore,
    params: &'a AnalysisParams,
}

impl<'a> ToothRangeLocator<'a> {
    pub fn new(
        locator: &'a dyn ObjectLocator,
        store: &'a dyn BlobStore,
        params: &'a AnalysisParams,
    ) -> Self {
        Self {
            locator,
            store,
            params,
        }
    }

    /// Locate the tooth row and persist it as the session's range image.
    ///
    /// Only the single highest-confidence detection is used; nothing is
    /// written when the locator finds nothing.
    #[cfg_attr(
        feature = "tracing",
        instrument(level = "info", skip(self, session), fields(root = %session.root().display()))
    )]
    pub fn locate(&self, session: &AnalysisSession) -> Result<ToothRangeResult, AnalysisError> {
        let photo = load_rgb(self.store, &session.original_image())?;
        log::debug!("original photo {}", photo.size());

        let output = self
            .locator
            .detect(&photo.view())
            .map_err(|source| AnalysisError::ExternalModel {
                model: "object locator",
                source,
            })?;
        log::debug!(
            "locator returned {} detection(s) in frame {}",
            output.detections.len(),
            output.frame
        );

        let best = output
            .best(self.params.min_confidence)
            .ok_or(AnalysisError::NoDetection)?;

        let bbox = scale_box_to_frame(best.bbox, output.frame, photo.size());
        let crop = bbox
            .to_pixel_rect(photo.size())
            .ok_or(AnalysisError::DegenerateRange { bbox })?;

        let image = photo.crop(&crop);
        let path = session.range_image();
        save_rgb(self.store, &path, &image)?;
        log::info!(
            "tooth range {}x{} at ({}, {}) conf={:.2}",
            crop.width,
            crop.height,
            crop.x,
            crop.y,
            best.confidence
        );

        Ok(ToothRangeResult {
            image,
            crop,
            confidence: best.confidence,
            path,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{encode_rgb_png, load_rgb};
    use crate::error::ModelError;
    use crate::model::{Detection, LocatorOutput};
    use crate::store::MemoryBlobStore;
    use plaque_core::RgbImageView;

    struct FixedLocator(LocatorOutput);

    impl ObjectLocator for FixedLocator {
        fn detect(&self, _image: &RgbImageView<'_>) -> Result<LocatorOutput, ModelError> {
            Ok(self.0.clone())
        }
    }

    fn session_with_photo(store: &MemoryBlobStore, photo: &RgbImage) -> AnalysisSession {
        let session = AnalysisSession::new("/session");
        store
            .write(&session.original_image(), &encode_rgb_png(photo).expect("encode"))
            .expect("write");
        session
    }

    fn photo() -> RgbImage {
        let mut img = RgbImage::new(200, 100);
        for y in 0..100 {
            for x in 0..200 {
                img.put_pixel(x, y, [x as u8, y as u8, 0]);
            }
        }
        img
    }

    fn det(bbox: [f32; 4], confidence: f32) -> Detection {
        Detection {
            bbox: bbox.into(),
            confidence,
            class_label: "teeth".into(),
        }
    }

    #[test]
    fn crops_highest_confidence_box_at_full_resolution() {
        let store = MemoryBlobStore::new();
        let session = session_with_photo(&store, &photo());
        // Photo letterboxed to 100x100: gain 0.5, 25 px vertical padding.
        let locator = FixedLocator(LocatorOutput {
            frame: FrameSize::new(100, 100),
            detections: vec![
                det([0.0, 25.0, 10.0, 35.0], 0.6),
                det([20.0, 35.0, 60.0, 55.0], 0.9),
            ],
        });
        let params = AnalysisParams::default();

        let range = ToothRangeLocator::new(&locator, &store, &params)
            .locate(&session)
            .expect("locate");

        assert_eq!(range.crop, PixelRect::new(40, 20, 80, 40));
        assert_eq!(range.size(), FrameSize::new(80, 40));
        assert_eq!(range.image.pixel(0, 0), [40, 20, 0]);
        let stored = load_rgb(&store, &session.range_image()).expect("stored range");
        assert_eq!(stored, range.image);
    }

    #[test]
    fn no_detection_writes_nothing() {
        let store = MemoryBlobStore::new();
        let session = session_with_photo(&store, &photo());
        let locator = FixedLocator(LocatorOutput::in_image_frame(vec![det(
            [0.0, 0.0, 50.0, 50.0],
            0.2,
        )]));
        let params = AnalysisParams::default();

        let err = ToothRangeLocator::new(&locator, &store, &params)
            .locate(&session)
            .unwrap_err();

        assert!(matches!(err, AnalysisError::NoDetection));
        assert!(!store.exists(&session.range_image()));
    }

    #[test]
    fn box_outside_photo_is_degenerate() {
        let store = MemoryBlobStore::new();
        let session = session_with_photo(&store, &photo());
        let locator = FixedLocator(LocatorOutput::in_image_frame(vec![det(
            [300.0, 10.0, 400.0, 20.0],
            0.9,
        )]));
        let params = AnalysisParams::default();

        let err = ToothRangeLocator::new(&locator, &store, &params)
            .locate(&session)
            .unwrap_err();
        assert!(matches!(err, AnalysisError::DegenerateRange { .. }));
    }

    #[test]
    fn missing_photo_is_a_decode_error() {
        let store = MemoryBlobStore::new();
        let locator = FixedLocator(LocatorOutput::default());
        let params = AnalysisParams::default();
        let err = ToothRangeLocator::new(&locator, &store, &params)
            .locate(&AnalysisSession::new("/empty"))
            .unwrap_err();
        assert!(matches!(err, AnalysisError::ImageDecode { .. }));
    }
}
