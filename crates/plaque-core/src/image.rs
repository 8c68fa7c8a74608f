use crate::geometry::{FrameSize, PixelRect};

#[derive(Clone, Copy, Debug)]
pub struct GrayImageView<'a> {
    pub width: usize,
    pub height: usize,
    pub data: &'a [u8], // row-major, len = w*h
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GrayImage {
    pub width: usize,
    pub height: usize,
    pub data: Vec<u8>,
}

impl GrayImage {
    /// All-black image.
    pub fn new(width: usize, height: usize) -> Self {
        Self::filled(width, height, 0)
    }

    pub fn filled(width: usize, height: usize, value: u8) -> Self {
        Self {
            width,
            height,
            data: vec![value; width * height],
        }
    }

    pub fn from_raw(width: usize, height: usize, data: Vec<u8>) -> Option<Self> {
        (data.len() == width.checked_mul(height)?).then_some(Self {
            width,
            height,
            data,
        })
    }

    #[inline]
    pub fn view(&self) -> GrayImageView<'_> {
        GrayImageView {
            width: self.width,
            height: self.height,
            data: &self.data,
        }
    }

    #[inline]
    pub fn size(&self) -> FrameSize {
        FrameSize::new(self.width, self.height)
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> u8 {
        self.data[y * self.width + x]
    }

    #[inline]
    pub fn set(&mut self, x: usize, y: usize, value: u8) {
        self.data[y * self.width + x] = value;
    }

    #[inline]
    pub fn pixel_count(&self) -> usize {
        self.data.len()
    }

    pub fn count_nonzero(&self) -> usize {
        self.data.iter().filter(|&&v| v != 0).count()
    }
}

/// Borrowed interleaved RGB buffer.
#[derive(Clone, Copy, Debug)]
pub struct RgbImageView<'a> {
    pub width: usize,
    pub height: usize,
    pub data: &'a [u8], // row-major [r, g, b], len = 3*w*h
}

impl RgbImageView<'_> {
    #[inline]
    pub fn pixel(&self, x: usize, y: usize) -> [u8; 3] {
        let i = 3 * (y * self.width + x);
        [self.data[i], self.data[i + 1], self.data[i + 2]]
    }

    #[inline]
    pub fn size(&self) -> FrameSize {
        FrameSize::new(self.width, self.height)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RgbImage {
    pub width: usize,
    pub height: usize,
    pub data: Vec<u8>,
}

impl RgbImage {
    pub const CHANNELS: usize = 3;

    /// All-black image.
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            data: vec![0; Self::CHANNELS * width * height],
        }
    }

    pub fn from_pixel(width: usize, height: usize, rgb: [u8; 3]) -> Self {
        let mut data = Vec::with_capacity(Self::CHANNELS * width * height);
        for _ in 0..width * height {
            data.extend_from_slice(&rgb);
        }
        Self {
            width,
            height,
            data,
        }
    }

    pub fn from_raw(width: usize, height: usize, data: Vec<u8>) -> Option<Self> {
        let expected = width.checked_mul(height)?.checked_mul(Self::CHANNELS)?;
        (data.len() == expected).then_some(Self {
            width,
            height,
            data,
        })
    }

    #[inline]
    pub fn view(&self) -> RgbImageView<'_> {
        RgbImageView {
            width: self.width,
            height: self.height,
            data: &self.data,
        }
    }

    #[inline]
    pub fn size(&self) -> FrameSize {
        FrameSize::new(self.width, self.height)
    }

    #[inline]
    pub fn pixel(&self, x: usize, y: usize) -> [u8; 3] {
        self.view().pixel(x, y)
    }

    #[inline]
    pub fn put_pixel(&mut self, x: usize, y: usize, rgb: [u8; 3]) {
        let i = Self::CHANNELS * (y * self.width + x);
        self.data[i..i + 3].copy_from_slice(&rgb);
    }

    /// Copy out `rect`, clipped to the image bounds.
    pub fn crop(&self, rect: &PixelRect) -> RgbImage {
        let Some(rect) = rect.clip_to(self.size()) else {
            return RgbImage::new(0, 0);
        };
        let mut data = Vec::with_capacity(Self::CHANNELS * rect.width * rect.height);
        for y in rect.y..rect.bottom() {
            let start = Self::CHANNELS * (y * self.width + rect.x);
            data.extend_from_slice(&self.data[start..start + Self::CHANNELS * rect.width]);
        }
        RgbImage {
            width: rect.width,
            height: rect.height,
            data,
        }
    }
}

#[inline]
fn get_rgb_clamped(src: &RgbImageView<'_>, x: i32, y: i32) -> [u8; 3] {
    let x = x.clamp(0, src.width as i32 - 1) as usize;
    let y = y.clamp(0, src.height as i32 - 1) as usize;
    src.pixel(x, y)
}

/// Bilinear sample with edge replication.
#[inline]
pub fn sample_bilinear_rgb(src: &RgbImageView<'_>, x: f32, y: f32) -> [f32; 3] {
    let x0 = x.floor() as i32;
    let y0 = y.floor() as i32;
    let fx = x - x0 as f32;
    let fy = y - y0 as f32;

    let p00 = get_rgb_clamped(src, x0, y0);
    let p10 = get_rgb_clamped(src, x0 + 1, y0);
    let p01 = get_rgb_clamped(src, x0, y0 + 1);
    let p11 = get_rgb_clamped(src, x0 + 1, y0 + 1);

    let mut out = [0.0f32; 3];
    for c in 0..3 {
        let a = p00[c] as f32 + fx * (p10[c] as f32 - p00[c] as f32);
        let b = p01[c] as f32 + fx * (p11[c] as f32 - p01[c] as f32);
        out[c] = a + fy * (b - a);
    }
    out
}

/// Direct (aspect-distorting) bilinear resize.
///
/// Pixel centres are aligned (`src = (dst + 0.5) * scale - 0.5`) and
/// coordinates past the border are clamped to the edge pixel.
pub fn resize_bilinear(src: &RgbImageView<'_>, width: usize, height: usize) -> RgbImage {
    let mut out = RgbImage::new(width, height);
    if src.width == 0 || src.height == 0 || width == 0 || height == 0 {
        return out;
    }

    let scale_x = src.width as f32 / width as f32;
    let scale_y = src.height as f32 / height as f32;
    let max_x = (src.width - 1) as f32;
    let max_y = (src.height - 1) as f32;

    for y in 0..height {
        let sy = ((y as f32 + 0.5) * scale_y - 0.5).clamp(0.0, max_y);
        for x in 0..width {
            let sx = ((x as f32 + 0.5) * scale_x - 0.5).clamp(0.0, max_x);
            let v = sample_bilinear_rgb(src, sx, sy);
            out.put_pixel(
                x,
                y,
                [
                    v[0].round().clamp(0.0, 255.0) as u8,
                    v[1].round().clamp(0.0, 255.0) as u8,
                    v[2].round().clamp(0.0, 255.0) as u8,
                ],
            );
        }
    }
    out
}

// BT.601 luma in 14-bit fixed point.
const R2Y: u32 = 4899;
const G2Y: u32 = 9617;
const B2Y: u32 = 1868;
const GRAY_SHIFT: u32 = 14;

/// Greyscale intensity (BT.601 weights, rounded).
pub fn rgb_to_gray(src: &RgbImageView<'_>) -> GrayImage {
    let data = src
        .data
        .chunks_exact(3)
        .map(|p| {
            let y = p[0] as u32 * R2Y + p[1] as u32 * G2Y + p[2] as u32 * B2Y;
            ((y + (1 << (GRAY_SHIFT - 1))) >> GRAY_SHIFT) as u8
        })
        .collect();
    GrayImage {
        width: src.width,
        height: src.height,
        data,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gradient(width: usize, height: usize) -> RgbImage {
        let mut img = RgbImage::new(width, height);
        for y in 0..height {
            for x in 0..width {
                img.put_pixel(x, y, [(x * 10) as u8, (y * 10) as u8, 7]);
            }
        }
        img
    }

    #[test]
    fn gray_of_pure_channels_matches_bt601() {
        let img = RgbImage::from_raw(
            4,
            1,
            vec![255, 0, 0, 0, 255, 0, 0, 0, 255, 255, 255, 255],
        )
        .expect("valid buffer");
        let gray = rgb_to_gray(&img.view());
        assert_eq!(gray.data, vec![76, 150, 29, 255]);
    }

    #[test]
    fn crop_copies_requested_window() {
        let img = gradient(6, 5);
        let crop = img.crop(&PixelRect::new(2, 1, 3, 2));
        assert_eq!((crop.width, crop.height), (3, 2));
        assert_eq!(crop.pixel(0, 0), img.pixel(2, 1));
        assert_eq!(crop.pixel(2, 1), img.pixel(4, 2));
    }

    #[test]
    fn crop_is_clipped_to_bounds() {
        let img = gradient(4, 4);
        let crop = img.crop(&PixelRect::new(2, 2, 10, 10));
        assert_eq!((crop.width, crop.height), (2, 2));
        assert_eq!(crop.pixel(1, 1), img.pixel(3, 3));
    }

    #[test]
    fn resize_of_uniform_image_stays_uniform() {
        let img = RgbImage::from_pixel(3, 7, [12, 200, 90]);
        let out = resize_bilinear(&img.view(), 16, 5);
        assert_eq!((out.width, out.height), (16, 5));
        assert!(out.data.chunks_exact(3).all(|p| p == [12, 200, 90]));
    }

    #[test]
    fn resize_to_same_size_is_identity() {
        let img = gradient(5, 4);
        let out = resize_bilinear(&img.view(), 5, 4);
        assert_eq!(out, img);
    }

    #[test]
    fn upscale_interpolates_between_neighbours() {
        let img = RgbImage::from_raw(2, 1, vec![0, 0, 0, 100, 100, 100]).expect("valid buffer");
        let out = resize_bilinear(&img.view(), 4, 1);
        let reds: Vec<u8> = out.data.chunks_exact(3).map(|p| p[0]).collect();
        assert_eq!(reds, vec![0, 25, 75, 100]);
    }
}
