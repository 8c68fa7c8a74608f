//! PNG encode/decode between `image` buffers and the core raster types.
//!
//! Every artifact is stored as PNG so re-reading it is lossless.

use crate::error::AnalysisError;
use crate::store::BlobStore;
use image::codecs::png::PngEncoder;
use image::{
    DynamicImage, ExtendedColorType, ImageDecoder, ImageEncoder, ImageError, ImageReader,
};
use plaque_core::{GrayImage, RgbImage};
use std::io::Cursor;
use std::path::Path;

/// Decode with the EXIF orientation applied, so phone photos come out upright.
fn decode_upright(bytes: &[u8]) -> Result<DynamicImage, ImageError> {
    let mut decoder = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()?
        .into_decoder()?;
    let orientation = decoder.orientation()?;
    let mut img = DynamicImage::from_decoder(decoder)?;
    img.apply_orientation(orientation);
    Ok(img)
}

/// Decode any supported raster format into an RGB buffer.
pub fn decode_rgb(bytes: &[u8]) -> Result<RgbImage, ImageError> {
    let img = decode_upright(bytes)?.to_rgb8();
    let (w, h) = img.dimensions();
    Ok(RgbImage {
        width: w as usize,
        height: h as usize,
        data: img.into_raw(),
    })
}

fn decode_gray(bytes: &[u8]) -> Result<GrayImage, ImageError> {
    let img = decode_upright(bytes)?.to_luma8();
    let (w, h) = img.dimensions();
    Ok(GrayImage {
        width: w as usize,
        height: h as usize,
        data: img.into_raw(),
    })
}

fn encode_png(
    data: &[u8],
    width: usize,
    height: usize,
    color: ExtendedColorType,
) -> Result<Vec<u8>, ImageError> {
    let mut buf = Vec::new();
    PngEncoder::new(&mut buf).write_image(data, width as u32, height as u32, color)?;
    Ok(buf)
}

pub fn encode_rgb_png(img: &RgbImage) -> Result<Vec<u8>, ImageError> {
    encode_png(&img.data, img.width, img.height, ExtendedColorType::Rgb8)
}

pub fn encode_gray_png(img: &GrayImage) -> Result<Vec<u8>, ImageError> {
    encode_png(&img.data, img.width, img.height, ExtendedColorType::L8)
}

/// Read and decode an RGB image; a missing or unreadable blob is a decode failure.
pub fn load_rgb(store: &dyn BlobStore, path: &Path) -> Result<RgbImage, AnalysisError> {
    let bytes = store.read(path).map_err(|e| AnalysisError::ImageDecode {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    decode_rgb(&bytes).map_err(|e| AnalysisError::ImageDecode {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

pub fn load_gray(store: &dyn BlobStore, path: &Path) -> Result<GrayImage, AnalysisError> {
    let bytes = store.read(path).map_err(|e| AnalysisError::ImageDecode {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    decode_gray(&bytes).map_err(|e| AnalysisError::ImageDecode {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

pub(crate) fn save_rgb(
    store: &dyn BlobStore,
    path: &Path,
    img: &RgbImage,
) -> Result<(), AnalysisError> {
    let bytes = encode_rgb_png(img).map_err(|e| AnalysisError::ImageEncode {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    store.write(path, &bytes)?;
    Ok(())
}

pub(crate) fn save_gray(
    store: &dyn BlobStore,
    path: &Path,
    img: &GrayImage,
) -> Result<(), AnalysisError> {
    let bytes = encode_gray_png(img).map_err(|e| AnalysisError::ImageEncode {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    store.write(path, &bytes)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryBlobStore;
    use image::codecs::jpeg::JpegEncoder;

    #[test]
    fn png_round_trip_is_lossless() {
        let mut img = RgbImage::new(3, 2);
        img.put_pixel(0, 0, [1, 2, 3]);
        img.put_pixel(2, 1, [250, 128, 7]);
        let back = decode_rgb(&encode_rgb_png(&img).expect("encode")).expect("decode");
        assert_eq!(back, img);
    }

    /// Baseline JPEG with an APP1 segment carrying EXIF orientation `value`.
    fn jpeg_with_orientation(img: &RgbImage, value: u8) -> Vec<u8> {
        let mut jpeg = Vec::new();
        JpegEncoder::new_with_quality(&mut jpeg, 95)
            .write_image(
                &img.data,
                img.width as u32,
                img.height as u32,
                ExtendedColorType::Rgb8,
            )
            .expect("encode jpeg");

        let mut tiff = vec![b'M', b'M', 0, 42, 0, 0, 0, 8];
        tiff.extend_from_slice(&[0, 1]);
        tiff.extend_from_slice(&[0x01, 0x12, 0, 3, 0, 0, 0, 1, 0, value, 0, 0]);
        tiff.extend_from_slice(&[0, 0, 0, 0]);
        let mut app1 = b"Exif\0\0".to_vec();
        app1.extend_from_slice(&tiff);
        let len = (app1.len() + 2) as u16;

        let mut out = jpeg[..2].to_vec();
        out.extend_from_slice(&[0xFF, 0xE1]);
        out.extend_from_slice(&len.to_be_bytes());
        out.extend_from_slice(&app1);
        out.extend_from_slice(&jpeg[2..]);
        out
    }

    #[test]
    fn exif_rotation_is_applied_on_decode() {
        // Dark left half, bright right half.
        let mut img = RgbImage::from_pixel(32, 16, [235, 235, 235]);
        for y in 0..16 {
            for x in 0..16 {
                img.put_pixel(x, y, [15, 15, 15]);
            }
        }
        let upright = decode_rgb(&jpeg_with_orientation(&img, 6)).expect("decode");

        // Orientation 6 is a quarter turn clockwise: the left half ends up on top.
        assert_eq!((upright.width, upright.height), (16, 32));
        assert!(upright.pixel(8, 4)[0] < 80, "{:?}", upright.pixel(8, 4));
        assert!(upright.pixel(8, 28)[0] > 170, "{:?}", upright.pixel(8, 28));
    }

    #[test]
    fn gray_round_trip_through_store() {
        let store = MemoryBlobStore::new();
        let path = Path::new("/s/mask.png");
        let img = GrayImage::from_raw(2, 2, vec![0, 255, 255, 0]).expect("valid buffer");
        save_gray(&store, path, &img).expect("save");
        assert_eq!(load_gray(&store, path).expect("load"), img);
    }

    #[test]
    fn missing_blob_is_a_decode_error() {
        let store = MemoryBlobStore::new();
        let err = load_rgb(&store, Path::new("/s/original_image.png")).unwrap_err();
        assert_eq!(err.kind(), "image_decode");
    }

    #[test]
    fn garbage_bytes_are_a_decode_error() {
        let store = MemoryBlobStore::new();
        let path = Path::new("/s/original_image.png");
        store.write(path, b"definitely not a png").expect("write");
        let err = load_rgb(&store, path).unwrap_err();
        assert!(matches!(err, AnalysisError::ImageDecode { .. }));
    }
}
