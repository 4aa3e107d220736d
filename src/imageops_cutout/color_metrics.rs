//! Color distances and color-space conversions
//!
//! Every function here is a pure, total function over 8-bit RGB input.
//! The perceptual distance weights green highest and red lowest, roughly
//! following the eye's sensitivity, and is the metric used for cluster
//! assignment and region confidence. The plain Euclidean distance is only
//! used for convergence checks.

use image::Rgb;

/// CIE L*a*b* color (D65 white point)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Lab {
    pub l: f64,
    pub a: f64,
    pub b: f64,
}

/// Full-range BT.601 YCbCr color, chroma centered on 128
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct YCbCr {
    pub y: f64,
    pub cb: f64,
    pub cr: f64,
}

/// HSV color: hue in degrees `[0, 360)`, saturation and value in `[0, 1]`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hsv {
    pub h: f64,
    pub s: f64,
    pub v: f64,
}

/// Largest possible [`perceptual_distance`] (black to white).
pub const MAX_PERCEPTUAL_DISTANCE: f64 = 765.0;

const RED_WEIGHT: f64 = 2.0;
const GREEN_WEIGHT: f64 = 4.0;
const BLUE_WEIGHT: f64 = 3.0;

#[inline]
fn channels_f64(color: Rgb<u8>) -> [f64; 3] {
    let Rgb([r, g, b]) = color;
    [f64::from(r), f64::from(g), f64::from(b)]
}

/// Euclidean distance in RGB space.
#[inline]
pub fn distance(a: Rgb<u8>, b: Rgb<u8>) -> f64 {
    distance_f64(&channels_f64(a), &channels_f64(b))
}

/// Perceptually weighted distance `sqrt(2ΔR² + 4ΔG² + 3ΔB²)`.
#[inline]
pub fn perceptual_distance(a: Rgb<u8>, b: Rgb<u8>) -> f64 {
    perceptual_distance_f64(&channels_f64(a), &channels_f64(b))
}

#[inline]
pub(crate) fn distance_f64(a: &[f64; 3], b: &[f64; 3]) -> f64 {
    let dr = a[0] - b[0];
    let dg = a[1] - b[1];
    let db = a[2] - b[2];
    dr.mul_add(dr, dg.mul_add(dg, db * db)).sqrt()
}

#[inline]
pub(crate) fn perceptual_distance_f64(a: &[f64; 3], b: &[f64; 3]) -> f64 {
    let dr = a[0] - b[0];
    let dg = a[1] - b[1];
    let db = a[2] - b[2];
    (RED_WEIGHT * dr * dr + GREEN_WEIGHT * dg * dg + BLUE_WEIGHT * db * db).sqrt()
}

/// Mean of the three channels, in `[0, 255]`.
#[inline]
pub fn brightness(color: Rgb<u8>) -> f64 {
    let [r, g, b] = channels_f64(color);
    (r + g + b) / 3.0
}

/// Difference between the largest and smallest channel, in `[0, 255]`.
#[inline]
pub fn channel_spread(color: Rgb<u8>) -> u8 {
    let Rgb([r, g, b]) = color;
    r.max(g).max(b) - r.min(g).min(b)
}

/// Rec. 601 luma, in `[0, 255]`.
#[inline]
pub fn luma(color: Rgb<u8>) -> f32 {
    let Rgb([r, g, b]) = color;
    0.299f32.mul_add(
        f32::from(r),
        0.587f32.mul_add(f32::from(g), 0.114 * f32::from(b)),
    )
}

/// Converts sRGB to CIE L*a*b* under D65.
pub fn to_lab(color: Rgb<u8>) -> Lab {
    const XN: f64 = 0.950_47;
    const YN: f64 = 1.0;
    const ZN: f64 = 1.088_83;

    let [r, g, b] = channels_f64(color).map(|c| srgb_to_linear(c / 255.0));

    let x = 0.412_4 * r + 0.357_6 * g + 0.180_5 * b;
    let y = 0.212_6 * r + 0.715_2 * g + 0.072_2 * b;
    let z = 0.019_3 * r + 0.119_2 * g + 0.950_5 * b;

    let fx = lab_f(x / XN);
    let fy = lab_f(y / YN);
    let fz = lab_f(z / ZN);

    Lab {
        l: 116.0f64.mul_add(fy, -16.0),
        a: 500.0 * (fx - fy),
        b: 200.0 * (fy - fz),
    }
}

#[inline]
fn srgb_to_linear(c: f64) -> f64 {
    if c <= 0.040_45 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

#[inline]
fn lab_f(t: f64) -> f64 {
    if t > 0.008_856 {
        t.cbrt()
    } else {
        7.787f64.mul_add(t, 16.0 / 116.0)
    }
}

/// Converts RGB to full-range BT.601 YCbCr.
pub fn to_ycbcr(color: Rgb<u8>) -> YCbCr {
    let [r, g, b] = channels_f64(color);
    YCbCr {
        y: 0.299 * r + 0.587 * g + 0.114 * b,
        cb: 128.0 - 0.168_736 * r - 0.331_264 * g + 0.5 * b,
        cr: 128.0 + 0.5 * r - 0.418_688 * g - 0.081_312 * b,
    }
}

/// Converts RGB to HSV.
pub fn to_hsv(color: Rgb<u8>) -> Hsv {
    let [r, g, b] = channels_f64(color);
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let delta = max - min;

    let hue = if delta == 0.0 {
        0.0
    } else if max == r {
        60.0 * ((g - b) / delta).rem_euclid(6.0)
    } else if max == g {
        60.0 * ((b - r) / delta + 2.0)
    } else {
        60.0 * ((r - g) / delta + 4.0)
    };

    Hsv {
        h: hue.rem_euclid(360.0),
        s: if max == 0.0 { 0.0 } else { delta / max },
        v: max / 255.0,
    }
}
