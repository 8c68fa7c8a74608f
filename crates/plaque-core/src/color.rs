//! 8-bit HSV conversion and brightness flattening.
//!
//! Hue is stored halved (`[0, 180)`), saturation and value span `[0, 255]`.

use crate::image::{RgbImage, RgbImageView};

/// Convert one RGB pixel to 8-bit HSV.
pub fn rgb_to_hsv(rgb: [u8; 3]) -> [u8; 3] {
    let [r, g, b] = rgb.map(i32::from);
    let v = r.max(g).max(b);
    let vmin = r.min(g).min(b);
    let diff = v - vmin;

    let s = if v == 0 {
        0.0
    } else {
        255.0 * diff as f32 / v as f32
    };

    let h = if diff == 0 {
        0.0
    } else {
        let d = diff as f32;
        let deg = if v == r {
            60.0 * (g - b) as f32 / d
        } else if v == g {
            120.0 + 60.0 * (b - r) as f32 / d
        } else {
            240.0 + 60.0 * (r - g) as f32 / d
        };
        if deg < 0.0 {
            deg + 360.0
        } else {
            deg
        }
    };

    let mut h = (h / 2.0).round() as i32;
    if h >= 180 {
        h -= 180;
    }
    [h as u8, s.round().clamp(0.0, 255.0) as u8, v as u8]
}

/// Convert one 8-bit HSV pixel back to RGB.
pub fn hsv_to_rgb(hsv: [u8; 3]) -> [u8; 3] {
    let s = hsv[1] as f32 / 255.0;
    let v = hsv[2] as f32 / 255.0;
    let to_u8 = |c: f32| (c * 255.0).round().clamp(0.0, 255.0) as u8;

    if s == 0.0 {
        let c = to_u8(v);
        return [c, c, c];
    }

    let h = (hsv[0] as f32 * 2.0) / 60.0;
    let sector = h.floor();
    let frac = h - sector;
    let sector = (sector as i32).rem_euclid(6);

    let p = v * (1.0 - s);
    let q = v * (1.0 - s * frac);
    let t = v * (1.0 - s * (1.0 - frac));

    let (r, g, b) = match sector {
        0 => (v, t, p),
        1 => (q, v, p),
        2 => (p, v, t),
        3 => (p, q, v),
        4 => (t, p, v),
        _ => (v, p, q),
    };
    [to_u8(r), to_u8(g), to_u8(b)]
}

/// Round-trip every pixel through HSV with the value channel forced to 255.
///
/// Only hue and saturation survive, which removes lighting and shadow
/// variation. All-black pixels (masked background) become white.
pub fn flatten_value(src: &RgbImageView<'_>) -> RgbImage {
    let mut data = Vec::with_capacity(src.data.len());
    for p in src.data.chunks_exact(3) {
        let [h, s, _] = rgb_to_hsv([p[0], p[1], p[2]]);
        data.extend_from_slice(&hsv_to_rgb([h, s, 255]));
    }
    RgbImage {
        width: src.width,
        height: src.height,
        data,
    }
}
