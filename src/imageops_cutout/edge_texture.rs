use crate::imageops_cutout::confidence_mask::ConfidenceMask;
use crate::imageops_cutout::context::ImageContext;

const EDGE_SCALES: [i64; 3] = [1, 2, 3];
const EDGE_NORMALIZER: f32 = 100.0;

const UNIFORM_TEXTURE: f32 = 0.1;
const COMPLEX_TEXTURE: f32 = 0.7;

/// Neighbor offsets clockwise from the top-left.
const LBP_NEIGHBORS: [(i64, i64); 8] = [
    (-1, -1),
    (0, -1),
    (1, -1),
    (1, 0),
    (1, 1),
    (0, 1),
    (-1, 1),
    (-1, 0),
];

/// Sobel gradient magnitude of the luma plane at neighbor offset `scale`.
///
/// Out-of-range taps replicate the nearest edge pixel.
pub fn sobel_magnitude(ctx: &ImageContext, x: u32, y: u32, scale: i64) -> f32 {
    let (x, y) = (i64::from(x), i64::from(y));
    let l = |dx: i64, dy: i64| ctx.luma_clamped(x + dx * scale, y + dy * scale);

    let gx = (l(1, -1) + 2.0 * l(1, 0) + l(1, 1)) - (l(-1, -1) + 2.0 * l(-1, 0) + l(-1, 1));
    let gy = (l(-1, 1) + 2.0 * l(0, 1) + l(1, 1)) - (l(-1, -1) + 2.0 * l(0, -1) + l(1, -1));
    gx.hypot(gy)
}

/// Edge strength as the strongest Sobel response over offsets 1, 2 and 3,
/// scaled so that a magnitude of 100 or more saturates at 1.
pub fn multi_scale_edges(ctx: &ImageContext) -> ConfidenceMask {
    let mask = ConfidenceMask::from_fn(ctx.width(), ctx.height(), |x, y| {
        let strongest = EDGE_SCALES
            .iter()
            .map(|&s| sobel_magnitude(ctx, x, y, s))
            .fold(0.0, f32::max);
        (strongest / EDGE_NORMALIZER).min(1.0)
    });
    log::debug!("edge mask mean {:.3}", mask.mean());
    mask
}

/// 8-neighbor local binary pattern code of a pixel.
///
/// Bit `i` is set when neighbor `i` (clockwise from the top-left) is at
/// least as bright as the center.
pub fn lbp_code(ctx: &ImageContext, x: u32, y: u32) -> u8 {
    let (x, y) = (i64::from(x), i64::from(y));
    let center = ctx.luma_clamped(x, y);
    LBP_NEIGHBORS
        .iter()
        .enumerate()
        .fold(0u8, |code, (bit, &(dx, dy))| {
            if ctx.luma_clamped(x + dx, y + dy) >= center {
                code | (1 << bit)
            } else {
                code
            }
        })
}

/// Whether an LBP code is one of the contiguous run codes of a flat or
/// smoothly shaded area.
#[inline]
pub const fn is_uniform_code(code: u8) -> bool {
    matches!(code, 0 | 1 | 3 | 7 | 15 | 31 | 63 | 127 | 255)
}

/// Texture complexity: 0.1 for uniform LBP codes, 0.7 for everything else.
pub fn lbp_texture(ctx: &ImageContext) -> ConfidenceMask {
    let mask = ConfidenceMask::from_fn(ctx.width(), ctx.height(), |x, y| {
        if is_uniform_code(lbp_code(ctx, x, y)) {
            UNIFORM_TEXTURE
        } else {
            COMPLEX_TEXTURE
        }
    });
    log::debug!("texture mask mean {:.3}", mask.mean());
    mask
}
