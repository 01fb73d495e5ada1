//! Separable gaussian blur over premultiplied RGBA8. Weights are
//! fixed-point Q16 so repeated blurs of the same surface are exactly
//! reproducible across platforms. Sigma is derived from the pixel radius
//! with the same ratio the editor's blur-mask filter uses.

use crate::error::{PhotoflatError, PhotoflatResult};

const Q16_ONE: i64 = 1 << 16;

/// Quantized 1-D gaussian, symmetric around the center tap.
struct Kernel {
    weights: Vec<u32>,
}

impl Kernel {
    /// `None` when the radius rounds to zero (blur is an identity).
    fn for_radius(radius_px: f64) -> PhotoflatResult<Option<Self>> {
        let radius = radius_px.max(0.0).round() as i32;
        if radius == 0 {
            return Ok(None);
        }
        let sigma = (radius_px * 0.5).max(0.5);

        let denom = 2.0 * sigma * sigma;
        let raw: Vec<f64> = (-radius..=radius)
            .map(|i| {
                let x = f64::from(i);
                (-x * x / denom).exp()
            })
            .collect();
        let sum: f64 = raw.iter().sum();
        if !sum.is_finite() || sum <= 0.0 {
            return Err(PhotoflatError::evaluation("gaussian kernel sum is zero"));
        }

        let mut weights: Vec<u32> = raw
            .iter()
            .map(|w| ((w / sum * Q16_ONE as f64).round() as i64).clamp(0, Q16_ONE) as u32)
            .collect();

        // Push the quantization residue into the center tap so the taps
        // sum to exactly one and flat regions stay untouched.
        let acc: i64 = weights.iter().map(|&w| i64::from(w)).sum();
        let mid = weights.len() / 2;
        weights[mid] = (i64::from(weights[mid]) + Q16_ONE - acc).clamp(0, Q16_ONE) as u32;

        Ok(Some(Self { weights }))
    }

    fn radius(&self) -> i32 {
        (self.weights.len() / 2) as i32
    }
}

/// Blur `src` (width*height premultiplied RGBA8) by a pixel radius.
/// Radius zero returns a plain copy.
pub(crate) fn blur_premul(
    src: &[u8],
    width: u32,
    height: u32,
    radius_px: f64,
) -> PhotoflatResult<Vec<u8>> {
    let expected_len = (width as usize)
        .checked_mul(height as usize)
        .and_then(|v| v.checked_mul(4))
        .ok_or_else(|| PhotoflatError::evaluation("blur buffer size overflow"))?;
    if src.len() != expected_len {
        return Err(PhotoflatError::evaluation(
            "blur_premul expects src matching width*height*4",
        ));
    }

    let Some(kernel) = Kernel::for_radius(radius_px)? else {
        return Ok(src.to_vec());
    };

    let w = width as usize;
    let h = height as usize;
    let mut tmp = vec![0u8; expected_len];
    let mut out = vec![0u8; expected_len];

    // Rows: lines run along x, consecutive pixels 4 bytes apart.
    blur_lines(src, &mut tmp, h, w, w * 4, 4, &kernel);
    // Columns: lines run along y, consecutive pixels one row apart.
    blur_lines(&tmp, &mut out, w, h, 4, w * 4, &kernel);
    Ok(out)
}

/// One separable pass over `line_count` lines of `line_len` pixels each.
/// `line_stride`/`pixel_stride` are byte offsets between lines and between
/// pixels within a line. Edge taps clamp to the line ends.
fn blur_lines(
    src: &[u8],
    dst: &mut [u8],
    line_count: usize,
    line_len: usize,
    line_stride: usize,
    pixel_stride: usize,
    kernel: &Kernel,
) {
    let radius = kernel.radius();
    for line in 0..line_count {
        let base = line * line_stride;
        for pos in 0..line_len {
            let mut acc = [0u64; 4];
            for (tap, &weight) in kernel.weights.iter().enumerate() {
                let offset = tap as i32 - radius;
                let sample = (pos as i32 + offset).clamp(0, line_len as i32 - 1) as usize;
                let idx = base + sample * pixel_stride;
                for (a, &s) in acc.iter_mut().zip(&src[idx..idx + 4]) {
                    *a += u64::from(weight) * u64::from(s);
                }
            }
            let idx = base + pos * pixel_stride;
            for (d, &a) in dst[idx..idx + 4].iter_mut().zip(&acc) {
                *d = (((a + (Q16_ONE as u64 / 2)) >> 16).min(255)) as u8;
            }
        }
    }
}
