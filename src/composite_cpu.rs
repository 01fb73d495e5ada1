//! CPU compositing of one premultiplied RGBA8 layer surface onto another,
//! with per-layer opacity and the full standard blend-mode set. Normal
//! blending stays on the integer fast path; the other operators run the
//! W3C compositing formulas in float.

use crate::{error::PhotoflatResult, model::LayerBlend};

/// `(c * f + 127) / 255` with the half-up rounding both passes rely on.
fn scale(c: u32, f: u32) -> u32 {
    (c * f + 127) / 255
}

/// Composite `src` onto `dst` in place with the given opacity and blend
/// mode. Buffers must be equal-length premultiplied RGBA8.
pub fn blend_in_place(
    dst: &mut [u8],
    src: &[u8],
    opacity: f32,
    mode: LayerBlend,
) -> PhotoflatResult<()> {
    if dst.len() != src.len() || !dst.len().is_multiple_of(4) {
        return Err(crate::PhotoflatError::evaluation(
            "blend_in_place expects equal-length rgba8 buffers",
        ));
    }

    match mode {
        LayerBlend::Normal => {
            let op = (opacity.clamp(0.0, 1.0) * 255.0).round() as u32;
            if op == 0 {
                return Ok(());
            }
            for (d, s) in dst.chunks_exact_mut(4).zip(src.chunks_exact(4)) {
                let sa = scale(u32::from(s[3]), op);
                if sa == 0 {
                    continue;
                }
                let keep = 255 - sa;
                for i in 0..3 {
                    let c = scale(u32::from(s[i]), op) + scale(u32::from(d[i]), keep);
                    d[i] = c.min(255) as u8;
                }
                d[3] = (sa + scale(u32::from(d[3]), keep)).min(255) as u8;
            }
        }
        LayerBlend::DestOut => {
            let op = opacity.clamp(0.0, 1.0);
            for (d, s) in dst.chunks_exact_mut(4).zip(src.chunks_exact(4)) {
                let sa = f32::from(s[3]) / 255.0 * op;
                let keep = 1.0 - sa;
                for c in d.iter_mut() {
                    *c = ((f32::from(*c) * keep).round()).clamp(0.0, 255.0) as u8;
                }
            }
        }
        _ => {
            for (d, s) in dst.chunks_exact_mut(4).zip(src.chunks_exact(4)) {
                let out = blend_px(
                    [d[0], d[1], d[2], d[3]],
                    [s[0], s[1], s[2], s[3]],
                    opacity,
                    mode,
                );
                d.copy_from_slice(&out);
            }
        }
    }
    Ok(())
}

fn blend_px(dst: [u8; 4], src: [u8; 4], opacity: f32, mode: LayerBlend) -> [u8; 4] {
    let ab = f32::from(dst[3]) / 255.0;
    let mut a_s = f32::from(src[3]) / 255.0 * opacity.clamp(0.0, 1.0);
    if a_s <= 0.0 {
        return dst;
    }
    a_s = a_s.min(1.0);

    let unpremul = |px: [u8; 4], a: f32| -> [f32; 3] {
        if a <= 0.0 {
            return [0.0; 3];
        }
        let inv = 1.0 / (255.0 * a);
        [
            (f32::from(px[0]) * inv).min(1.0),
            (f32::from(px[1]) * inv).min(1.0),
            (f32::from(px[2]) * inv).min(1.0),
        ]
    };

    let cb = unpremul(dst, ab);
    let cs = unpremul(src, f32::from(src[3]) / 255.0);

    let blended = match mode {
        LayerBlend::Hue | LayerBlend::Saturation | LayerBlend::Color | LayerBlend::Luminosity => {
            blend_nonseparable(cb, cs, mode)
        }
        _ => [
            blend_separable(cb[0], cs[0], mode),
            blend_separable(cb[1], cs[1], mode),
            blend_separable(cb[2], cs[2], mode),
        ],
    };

    // Mix toward the backdrop where it is transparent, then source-over.
    let ao = a_s + ab * (1.0 - a_s);
    let mut out = [0u8; 4];
    out[3] = ((ao * 255.0).round()).clamp(0.0, 255.0) as u8;
    for i in 0..3 {
        let cs_eff = (1.0 - ab) * cs[i] + ab * blended[i];
        let co = a_s * cs_eff + ab * cb[i] * (1.0 - a_s);
        out[i] = ((co * 255.0).round()).clamp(0.0, 255.0) as u8;
    }
    out
}

fn blend_separable(cb: f32, cs: f32, mode: LayerBlend) -> f32 {
    match mode {
        LayerBlend::Multiply => cb * cs,
        LayerBlend::Screen => cb + cs - cb * cs,
        LayerBlend::Overlay => blend_separable(cs, cb, LayerBlend::HardLight),
        LayerBlend::Darken => cb.min(cs),
        LayerBlend::Lighten => cb.max(cs),
        LayerBlend::ColorDodge => {
            if cb <= 0.0 {
                0.0
            } else if cs >= 1.0 {
                1.0
            } else {
                (cb / (1.0 - cs)).min(1.0)
            }
        }
        LayerBlend::ColorBurn => {
            if cb >= 1.0 {
                1.0
            } else if cs <= 0.0 {
                0.0
            } else {
                1.0 - ((1.0 - cb) / cs).min(1.0)
            }
        }
        LayerBlend::HardLight => {
            if cs <= 0.5 {
                cb * (2.0 * cs)
            } else {
                let s2 = 2.0 * cs - 1.0;
                cb + s2 - cb * s2
            }
        }
        LayerBlend::SoftLight => {
            if cs <= 0.5 {
                cb - (1.0 - 2.0 * cs) * cb * (1.0 - cb)
            } else {
                let d = if cb <= 0.25 {
                    ((16.0 * cb - 12.0) * cb + 4.0) * cb
                } else {
                    cb.sqrt()
                };
                cb + (2.0 * cs - 1.0) * (d - cb)
            }
        }
        LayerBlend::Difference => (cb - cs).abs(),
        LayerBlend::Exclusion => cb + cs - 2.0 * cb * cs,
        _ => cs,
    }
}

fn blend_nonseparable(cb: [f32; 3], cs: [f32; 3], mode: LayerBlend) -> [f32; 3] {
    match mode {
        LayerBlend::Hue => set_lum(set_sat(cs, sat(cb)), lum(cb)),
        LayerBlend::Saturation => set_lum(set_sat(cb, sat(cs)), lum(cb)),
        LayerBlend::Color => set_lum(cs, lum(cb)),
        LayerBlend::Luminosity => set_lum(cb, lum(cs)),
        _ => cs,
    }
}

fn lum(c: [f32; 3]) -> f32 {
    0.3 * c[0] + 0.59 * c[1] + 0.11 * c[2]
}

fn sat(c: [f32; 3]) -> f32 {
    c[0].max(c[1]).max(c[2]) - c[0].min(c[1]).min(c[2])
}

fn clip_color(c: [f32; 3]) -> [f32; 3] {
    let l = lum(c);
    let n = c[0].min(c[1]).min(c[2]);
    let x = c[0].max(c[1]).max(c[2]);
    let mut out = c;
    if n < 0.0 {
        for o in &mut out {
            *o = l + (*o - l) * l / (l - n);
        }
    }
    if x > 1.0 {
        for o in &mut out {
            *o = l + (*o - l) * (1.0 - l) / (x - l);
        }
    }
    out
}

fn set_lum(c: [f32; 3], l: f32) -> [f32; 3] {
    let d = l - lum(c);
    clip_color([c[0] + d, c[1] + d, c[2] + d])
}

fn set_sat(c: [f32; 3], s: f32) -> [f32; 3] {
    let mut idx = [0usize, 1, 2];
    idx.sort_by(|&a, &b| c[a].partial_cmp(&c[b]).unwrap_or(std::cmp::Ordering::Equal));
    let (min_i, mid_i, max_i) = (idx[0], idx[1], idx[2]);

    let mut out = [0.0f32; 3];
    if c[max_i] > c[min_i] {
        out[mid_i] = (c[mid_i] - c[min_i]) * s / (c[max_i] - c[min_i]);
        out[max_i] = s;
    }
    out
}
