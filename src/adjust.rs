//! Global color adjustment stage: one combined 4x5 color matrix applied to
//! the base raster, with a required identity fast path.

use std::sync::Arc;

use crate::{core::Raster, error::PhotoflatResult, model::EditorState};

/// 4x5 row-major color matrix acting on straight-alpha RGBA in [0, 255].
/// The fifth column is the additive offset.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct ColorMatrix {
    m: [f32; 20],
}

impl ColorMatrix {
    pub(crate) fn identity() -> Self {
        let mut m = [0.0f32; 20];
        m[0] = 1.0;
        m[6] = 1.0;
        m[12] = 1.0;
        m[18] = 1.0;
        Self { m }
    }

    /// `self` applied after `other` (matrix product with offset carry).
    pub(crate) fn then(self, other: ColorMatrix) -> Self {
        let a = &self.m;
        let b = &other.m;
        let mut out = [0.0f32; 20];
        for row in 0..4 {
            for col in 0..5 {
                let mut v = 0.0f32;
                for k in 0..4 {
                    v += a[row * 5 + k] * b[k * 5 + col];
                }
                if col == 4 {
                    v += a[row * 5 + 4];
                }
                out[row * 5 + col] = v;
            }
        }
        Self { m: out }
    }

    /// Additive brightness shift, `b` in [-1, 1] scaled to the 8-bit range.
    pub(crate) fn brightness(b: f32) -> Self {
        let mut m = Self::identity();
        let shift = b * 255.0;
        m.m[4] = shift;
        m.m[9] = shift;
        m.m[14] = shift;
        m
    }

    /// Contrast about mid-gray, factor 1.0 = neutral.
    pub(crate) fn contrast(c: f32) -> Self {
        let mut m = Self::identity();
        let offset = 127.5 * (1.0 - c);
        for row in 0..3 {
            m.m[row * 5 + row] = c;
            m.m[row * 5 + 4] = offset;
        }
        m
    }

    /// Luma-weighted desaturation/resaturation, factor 1.0 = neutral.
    pub(crate) fn saturation(s: f32) -> Self {
        const LR: f32 = 0.213;
        const LG: f32 = 0.715;
        const LB: f32 = 0.072;
        let inv = 1.0 - s;
        let mut m = Self::identity();
        m.m[0] = LR * inv + s;
        m.m[1] = LG * inv;
        m.m[2] = LB * inv;
        m.m[5] = LR * inv;
        m.m[6] = LG * inv + s;
        m.m[7] = LB * inv;
        m.m[10] = LR * inv;
        m.m[11] = LG * inv;
        m.m[12] = LB * inv + s;
        m
    }

    /// Hue rotation, degrees.
    pub(crate) fn hue_rotate(degrees: f32) -> Self {
        const LR: f32 = 0.213;
        const LG: f32 = 0.715;
        const LB: f32 = 0.072;
        let rad = degrees.to_radians();
        let cos = rad.cos();
        let sin = rad.sin();

        let mut m = Self::identity();
        m.m[0] = LR + cos * (1.0 - LR) + sin * (-LR);
        m.m[1] = LG + cos * (-LG) + sin * (-LG);
        m.m[2] = LB + cos * (-LB) + sin * (1.0 - LB);
        m.m[5] = LR + cos * (-LR) + sin * 0.143;
        m.m[6] = LG + cos * (1.0 - LG) + sin * 0.140;
        m.m[7] = LB + cos * (-LB) + sin * (-0.283);
        m.m[10] = LR + cos * (-LR) + sin * (-(1.0 - LR));
        m.m[11] = LG + cos * (-LG) + sin * LG;
        m.m[12] = LB + cos * (1.0 - LB) + sin * LB;
        m
    }

    /// Warm/cool shift: positive pushes red up and blue down.
    pub(crate) fn temperature(t: f32) -> Self {
        let mut m = Self::identity();
        let shift = t * crate::constants::TEMPERATURE_MAX_SHIFT;
        m.m[4] = shift;
        m.m[14] = -shift;
        m
    }

    /// Green/magenta shift on the green channel.
    pub(crate) fn tint(t: f32) -> Self {
        let mut m = Self::identity();
        m.m[9] = t * crate::constants::TINT_MAX_SHIFT;
        m
    }

    /// Apply to one straight-alpha pixel.
    pub(crate) fn apply(&self, px: [f32; 4]) -> [f32; 4] {
        let mut out = [0.0f32; 4];
        for (row, o) in out.iter_mut().enumerate() {
            let base = row * 5;
            *o = self.m[base] * px[0]
                + self.m[base + 1] * px[1]
                + self.m[base + 2] * px[2]
                + self.m[base + 3] * px[3]
                + self.m[base + 4];
        }
        out
    }
}

/// Combined adjustment matrix for a snapshot's six sliders. Brightness and
/// saturation match the interactive preview exactly; contrast, hue,
/// temperature and tint are composed into the same matrix.
pub(crate) fn adjustment_matrix(state: &EditorState) -> ColorMatrix {
    ColorMatrix::brightness(state.brightness)
        .then(ColorMatrix::contrast(state.contrast))
        .then(ColorMatrix::saturation(state.saturation))
        .then(ColorMatrix::hue_rotate(state.hue))
        .then(ColorMatrix::temperature(state.temperature))
        .then(ColorMatrix::tint(state.tint))
}

/// Apply global adjustments. Returns the input `Arc` itself when all gating
/// sliders are neutral; callers rely on pointer equality to detect the
/// skipped copy.
pub fn apply_adjustments(
    base: &Arc<Raster>,
    state: &EditorState,
) -> PhotoflatResult<Arc<Raster>> {
    if state.adjustments_are_neutral() {
        return Ok(Arc::clone(base));
    }

    let matrix = adjustment_matrix(state);
    let mut out = Vec::with_capacity(base.data().len());
    for px in base.data().chunks_exact(4) {
        let a = px[3];
        if a == 0 {
            out.extend_from_slice(&[0, 0, 0, 0]);
            continue;
        }
        // Straight-alpha transform, then re-premultiply.
        let af = f32::from(a);
        let straight = [
            f32::from(px[0]) * 255.0 / af,
            f32::from(px[1]) * 255.0 / af,
            f32::from(px[2]) * 255.0 / af,
            af,
        ];
        let adjusted = matrix.apply(straight);
        let out_a = adjusted[3].round().clamp(0.0, 255.0);
        for c in &adjusted[0..3] {
            let straight_c = c.clamp(0.0, 255.0);
            out.push(((straight_c * out_a / 255.0).round()) as u8);
        }
        out.push(out_a as u8);
    }

    Ok(Arc::new(Raster::from_premul_rgba8(
        base.width(),
        base.height(),
        out,
    )?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_matrix_is_noop() {
        let m = ColorMatrix::identity();
        assert_eq!(m.apply([10.0, 20.0, 30.0, 255.0]), [10.0, 20.0, 30.0, 255.0]);
    }

    #[test]
    fn neutral_sliders_compose_to_identity() {
        let m = adjustment_matrix(&EditorState::default());
        let px = [100.0, 150.0, 200.0, 255.0];
        let out = m.apply(px);
        for (a, b) in out.iter().zip(px.iter()) {
            assert!((a - b).abs() < 1e-3, "{out:?} vs {px:?}");
        }
    }

    #[test]
    fn brightness_shifts_all_channels() {
        let m = ColorMatrix::brightness(0.5);
        let out = m.apply([0.0, 0.0, 0.0, 255.0]);
        assert_eq!(out[0], 127.5);
        assert_eq!(out[1], 127.5);
        assert_eq!(out[2], 127.5);
        assert_eq!(out[3], 255.0);
    }

    #[test]
    fn saturation_zero_is_gray() {
        let m = ColorMatrix::saturation(0.0);
        let out = m.apply([255.0, 0.0, 0.0, 255.0]);
        assert!((out[0] - out[1]).abs() < 1e-3);
        assert!((out[1] - out[2]).abs() < 1e-3);
    }

    #[test]
    fn fast_path_returns_same_arc() {
        let base = Arc::new(Raster::new(2, 2).unwrap());
        let out = apply_adjustments(&base, &EditorState::default()).unwrap();
        assert!(Arc::ptr_eq(&base, &out));
    }

    #[test]
    fn non_neutral_returns_new_raster() {
        let mut base = Raster::new(1, 1).unwrap();
        base.data_mut().copy_from_slice(&[100, 100, 100, 255]);
        let base = Arc::new(base);

        let state = EditorState {
            brightness: 0.2,
            ..EditorState::default()
        };
        let out = apply_adjustments(&base, &state).unwrap();
        assert!(!Arc::ptr_eq(&base, &out));
        assert!(out.data()[0] > 100);
    }

    #[test]
    fn transparent_pixels_stay_transparent() {
        let base = Arc::new(Raster::new(1, 1).unwrap());
        let state = EditorState {
            brightness: 1.0,
            ..EditorState::default()
        };
        let out = apply_adjustments(&base, &state).unwrap();
        assert_eq!(out.data(), &[0, 0, 0, 0]);
    }
}
