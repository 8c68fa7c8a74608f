use crate::codec::{load_rgb, save_rgb};
use crate::error::AnalysisError;
use crate::model::InstanceSegmenter;
use crate::params::AnalysisParams;
use crate::session::AnalysisSession;
use crate::store::BlobStore;
use plaque_core::{resize_bilinear, BinaryMask, FrameSize, PixelRect, RgbImage};
use std::path::PathBuf;

#[cfg(feature = "tracing")]
use tracing::instrument;

/// One segmented tooth.
#[derive(Clone, Debug)]
pub struct ToothInstance {
    /// Position in the segmenter's output.
    pub index: usize,
    /// Bounding rectangle of the mask in range-image coordinates.
    pub rect: PixelRect,
    pub mask: BinaryMask,
    /// Masked range image cropped to `rect`.
    pub crop: RgbImage,
    /// `crop` resized to the square target size.
    pub resized: RgbImage,
    pub path: PathBuf,
}

#[derive(Clone, Debug)]
pub struct SegmentedTeeth {
    /// Size of the range image; the composite canvas uses it.
    pub range_size: FrameSize,
    pub channels: usize,
    pub instances: Vec<ToothInstance>,
}

impl SegmentedTeeth {
    #[inline]
    pub fn len(&self) -> usize {
        self.instances.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }
}

/// Stage 2: split the tooth row into per-tooth crops.
pub struct ToothSegmenter<'a> {
    segmenter: &'a dyn InstanceSegmenter,
    store: &'a dyn BlobStore,
    params: &'a AnalysisParams,
}

impl<'a> ToothSegmenter<'a> {
    pub fn new(
        segmenter: &'a dyn InstanceSegmenter,
        store: &'a dyn BlobStore,
        params: &'a AnalysisParams,
    ) -> Self {
        Self {
            segmenter,
            store,
            params,
        }
    }

    /// Segment the stored range image; masks keep the model's order.
    #[cfg_attr(
        feature = "tracing",
        instrument(level = "info", skip(self, session), fields(root = %session.root().display()))
    )]
    pub fn segment(&self, session: &AnalysisSession) -> Result<SegmentedTeeth, AnalysisError> {
        let range = load_rgb(self.store, &session.range_image())?;
        let view = range.view();

        let masks =
            self.segmenter
                .predict(&view)
                .map_err(|source| AnalysisError::ExternalModel {
                    model: "instance segmenter",
                    source,
                })?;
        if masks.is_empty() {
            log::warn!("segmenter found no teeth in {}", range.size());
        }

        let target = self.params.tooth_target_size;
        let mut instances = Vec::with_capacity(masks.len());
        for (index, mask) in masks.into_iter().enumerate() {
            let masked = mask.apply_to(&view).map_err(|_| AnalysisError::MaskSizeMismatch {
                index,
                mask: mask.size(),
                image: range.size(),
            })?;
            let rect = mask
                .bounding_rect()
                .ok_or(AnalysisError::EmptyMask { index })?;
            let crop = masked.crop(&rect);
            let resized = resize_bilinear(&crop.view(), target, target);

            let path = session.tooth_crop(index);
            save_rgb(self.store, &path, &crop)?;
            log::debug!(
                "tooth {index}: rect=({}, {}, {}, {}) pixels={}",
                rect.x,
                rect.y,
                rect.width,
                rect.height,
                mask.count()
            );

            instances.push(ToothInstance {
                index,
                rect,
                mask,
                crop,
                resized,
                path,
            });
        }
        log::info!("segmented {} teeth", instances.len());

        Ok(SegmentedTeeth {
            range_size: range.size(),
            channels: RgbImage::CHANNELS,
            instances,
        })
    }
}
