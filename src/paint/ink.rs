//! Ink painter: freehand paths in six stroke styles plus the discrete
//! line/rectangle/circle drawing-tool shapes. All ink composites beneath
//! the positioned layers; the eraser's destination-out blend is resolved
//! by the composer, this module only rasterizes coverage.

use kurbo::{Affine, BezPath, Point};

use crate::{
    constants::{
        GLOW_PASS_ALPHAS, GLOW_PASS_WIDTH_RATIOS, NEON_CORE_WIDTH_RATIO, SPRAY_DOT_RATIO,
        SPRAY_JITTER_RATIO, SPRAY_STEP_RATIO,
    },
    core::{Rgba8, affine_to_cpu, bezpath_to_cpu},
    error::PhotoflatResult,
    model::{InkAction, InkPath, InkShape, InkShapeKind, InkStyle},
    paint::{LayerSurface, PaintEnv},
};

/// Polyline through the recorded points. A single recorded point becomes a
/// dot (degenerate segment; round caps make it visible).
pub(crate) fn freehand_path(points: &[(f64, f64)]) -> BezPath {
    let mut path = BezPath::new();
    let Some((&(x0, y0), rest)) = points.split_first() else {
        return path;
    };
    path.move_to((x0, y0));
    if rest.is_empty() {
        path.line_to((x0, y0));
    }
    for &(x, y) in rest {
        path.line_to((x, y));
    }
    path
}

pub(crate) fn ink_shape_path(shape: &InkShape) -> BezPath {
    use kurbo::Shape as _;

    let (x0, x1) = (shape.x0.min(shape.x1), shape.x0.max(shape.x1));
    let (y0, y1) = (shape.y0.min(shape.y1), shape.y0.max(shape.y1));
    match shape.kind {
        InkShapeKind::Line => {
            let mut path = BezPath::new();
            path.move_to((shape.x0, shape.y0));
            path.line_to((shape.x1, shape.y1));
            path
        }
        InkShapeKind::Rectangle => kurbo::Rect::new(x0, y0, x1, y1).to_path(0.1),
        InkShapeKind::Circle => kurbo::Ellipse::new(
            ((x0 + x1) / 2.0, (y0 + y1) / 2.0),
            ((x1 - x0) / 2.0, (y1 - y0) / 2.0),
            0.0,
        )
        .to_path(0.1),
    }
}

fn round_stroke(width: f64) -> vello_cpu::kurbo::Stroke {
    vello_cpu::kurbo::Stroke::new(width)
        .with_caps(vello_cpu::kurbo::Cap::Round)
        .with_join(vello_cpu::kurbo::Join::Round)
}

fn flat_stroke(width: f64) -> vello_cpu::kurbo::Stroke {
    vello_cpu::kurbo::Stroke::new(width)
        .with_caps(vello_cpu::kurbo::Cap::Butt)
        .with_join(vello_cpu::kurbo::Join::Round)
}

/// Splitmix64. Seeded from the action id so spray output is stable across
/// renders of the same document.
struct SplitMix64(u64);

impl SplitMix64 {
    fn new(seed: u64) -> Self {
        Self(seed)
    }

    fn next_u64(&mut self) -> u64 {
        self.0 = self.0.wrapping_add(0x9E37_79B9_7F4A_7C15);
        let mut z = self.0;
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
        z ^ (z >> 31)
    }

    /// Uniform in [-1, 1).
    fn next_signed(&mut self) -> f64 {
        let unit = (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64;
        unit * 2.0 - 1.0
    }
}

/// Stamp centers for the spray style: walk the polyline at a fixed
/// arc-length step and jitter each stamp perpendicular to the local
/// direction. Deterministic for a given id.
pub(crate) fn spray_stamps(points: &[(f64, f64)], stroke_width: f64, seed: u64) -> Vec<Point> {
    let step = stroke_width * SPRAY_STEP_RATIO;
    let jitter_max = stroke_width * SPRAY_JITTER_RATIO;
    if step <= 0.0 || points.is_empty() {
        return Vec::new();
    }

    let mut rng = SplitMix64::new(seed);
    let mut stamps = Vec::new();
    let mut carry = 0.0;

    if points.len() == 1 {
        let (x, y) = points[0];
        stamps.push(Point::new(x + rng.next_signed() * jitter_max, y));
        return stamps;
    }

    for pair in points.windows(2) {
        let (x0, y0) = pair[0];
        let (x1, y1) = pair[1];
        let seg = Point::new(x1, y1) - Point::new(x0, y0);
        let len = seg.hypot();
        if len <= f64::EPSILON {
            continue;
        }
        let dir = seg / len;
        let normal = kurbo::Vec2::new(-dir.y, dir.x);

        let mut dist = carry;
        while dist < len {
            let center = Point::new(x0, y0) + dir * dist + normal * (rng.next_signed() * jitter_max);
            stamps.push(center);
            dist += step;
        }
        carry = dist - len;
    }
    stamps
}

fn stroke_once(
    surf: &mut LayerSurface,
    path: &BezPath,
    color: Rgba8,
    stroke: vello_cpu::kurbo::Stroke,
) -> PhotoflatResult<()> {
    surf.draw(|ctx| {
        ctx.set_transform(affine_to_cpu(Affine::IDENTITY));
        ctx.set_paint(color.to_peniko());
        ctx.set_stroke(stroke);
        ctx.stroke_path(&bezpath_to_cpu(path));
        Ok(())
    })
}

fn paint_path(ink: &InkPath, surf: &mut LayerSurface) -> PhotoflatResult<()> {
    let path = freehand_path(&ink.points);
    if path.elements().is_empty() {
        return Ok(());
    }

    match ink.style {
        InkStyle::Plain | InkStyle::Eraser => {
            stroke_once(surf, &path, ink.color, round_stroke(ink.stroke_width))
        }
        InkStyle::Highlighter => {
            stroke_once(surf, &path, ink.color, flat_stroke(ink.stroke_width))
        }
        InkStyle::BlurredGlow => {
            // Two soft wide passes under one sharp core, wide-faint first.
            for (i, (&ratio, &alpha)) in GLOW_PASS_WIDTH_RATIOS
                .iter()
                .zip(GLOW_PASS_ALPHAS.iter())
                .enumerate()
            {
                let width = ink.stroke_width * ratio;
                let color = ink.color.with_alpha_mul(alpha);
                let last = i == GLOW_PASS_WIDTH_RATIOS.len() - 1;
                if last {
                    stroke_once(surf, &path, color, round_stroke(width))?;
                } else {
                    surf.draw_blurred(width / 2.0, |ctx| {
                        ctx.set_transform(affine_to_cpu(Affine::IDENTITY));
                        ctx.set_paint(color.to_peniko());
                        ctx.set_stroke(round_stroke(width));
                        ctx.stroke_path(&bezpath_to_cpu(&path));
                        Ok(())
                    })?;
                }
            }
            Ok(())
        }
        InkStyle::Neon => {
            // Blurred halo in the stroke color, then a white hot core.
            surf.draw_blurred(ink.stroke_width, |ctx| {
                ctx.set_transform(affine_to_cpu(Affine::IDENTITY));
                ctx.set_paint(ink.color.to_peniko());
                ctx.set_stroke(round_stroke(ink.stroke_width));
                ctx.stroke_path(&bezpath_to_cpu(&path));
                Ok(())
            })?;
            stroke_once(surf, &path, ink.color, round_stroke(ink.stroke_width))?;
            stroke_once(
                surf,
                &path,
                Rgba8::opaque(255, 255, 255),
                round_stroke(ink.stroke_width * NEON_CORE_WIDTH_RATIO),
            )
        }
        InkStyle::Spray => {
            use kurbo::Shape as _;

            let stamps = spray_stamps(&ink.points, ink.stroke_width, ink.id);
            let radius = ink.stroke_width * SPRAY_DOT_RATIO;
            surf.draw(|ctx| {
                ctx.set_transform(affine_to_cpu(Affine::IDENTITY));
                ctx.set_paint(ink.color.to_peniko());
                for center in &stamps {
                    let dot = kurbo::Circle::new(*center, radius).to_path(0.1);
                    ctx.fill_path(&bezpath_to_cpu(&dot));
                }
                Ok(())
            })
        }
    }
}

fn paint_shape_action(shape: &InkShape, surf: &mut LayerSurface) -> PhotoflatResult<()> {
    let path = ink_shape_path(shape);
    stroke_once(surf, &path, shape.color, round_stroke(shape.stroke_width))
}

pub(crate) fn paint_ink(
    action: &InkAction,
    surf: &mut LayerSurface,
    _env: &mut PaintEnv<'_>,
) -> PhotoflatResult<()> {
    match action {
        InkAction::Path(p) => paint_path(p, surf),
        InkAction::Shape(s) => paint_shape_action(s, surf),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn freehand_single_point_is_a_dot_segment() {
        let path = freehand_path(&[(5.0, 5.0)]);
        assert_eq!(path.elements().len(), 2);
    }

    #[test]
    fn freehand_empty_points_yields_empty_path() {
        assert!(freehand_path(&[]).elements().is_empty());
    }

    #[test]
    fn spray_is_deterministic_per_id() {
        let pts = vec![(0.0, 0.0), (100.0, 0.0)];
        let a = spray_stamps(&pts, 8.0, 42);
        let b = spray_stamps(&pts, 8.0, 42);
        assert_eq!(a, b);

        let c = spray_stamps(&pts, 8.0, 43);
        assert_ne!(a, c);
    }

    #[test]
    fn spray_step_spacing_follows_width() {
        let pts = vec![(0.0, 0.0), (90.0, 0.0)];
        let stamps = spray_stamps(&pts, 10.0, 1);
        // Step is width * 0.9 = 9 px over 90 px of arc length.
        assert_eq!(stamps.len(), 10);

        // Jitter is perpendicular only; x advances monotonically.
        for pair in stamps.windows(2) {
            assert!(pair[1].x > pair[0].x);
        }
        let jitter_max = 10.0 * SPRAY_JITTER_RATIO;
        for s in &stamps {
            assert!(s.y.abs() <= jitter_max + 1e-9);
        }
    }

    #[test]
    fn ink_rect_path_normalizes_corners() {
        use kurbo::Shape as _;

        let shape = InkShape {
            id: 1,
            kind: InkShapeKind::Rectangle,
            x0: 50.0,
            y0: 40.0,
            x1: 10.0,
            y1: 8.0,
            color: Rgba8::opaque(0, 0, 0),
            stroke_width: 2.0,
        };
        let bbox = ink_shape_path(&shape).bounding_box();
        assert!((bbox.x0 - 10.0).abs() < 1e-6);
        assert!((bbox.y0 - 8.0).abs() < 1e-6);
        assert!((bbox.x1 - 50.0).abs() < 1e-6);
        assert!((bbox.y1 - 40.0).abs() < 1e-6);
    }

    #[test]
    fn ink_circle_fits_bounding_box() {
        use kurbo::Shape as _;

        let shape = InkShape {
            id: 2,
            kind: InkShapeKind::Circle,
            x0: 0.0,
            y0: 0.0,
            x1: 40.0,
            y1: 20.0,
            color: Rgba8::opaque(0, 0, 0),
            stroke_width: 2.0,
        };
        let bbox = ink_shape_path(&shape).bounding_box();
        assert!((bbox.width() - 40.0).abs() < 1e-3);
        assert!((bbox.height() - 20.0).abs() < 1e-3);
    }
}
