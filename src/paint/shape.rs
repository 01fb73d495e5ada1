//! Shape layer painter: rigid-body transform identical to the interactive
//! canvas, per-kind path builders with fixed proportions, fill/stroke with
//! named dash styles and an optional blurred shadow.

use kurbo::{Affine, BezPath, Point, Shape as _};

use crate::{
    constants::{
        ARROW_SHAFT_LENGTH_FRACTION, ARROW_SHAFT_WIDTH_FRACTION, DASH_PATTERN_DASH_DOT,
        DASH_PATTERN_DASHED, DASH_PATTERN_DOTTED, DASH_PATTERN_LONG_DASH, STAR_INNER_RADIUS_RATIO,
    },
    core::{affine_to_cpu, bezpath_to_cpu},
    error::PhotoflatResult,
    model::{ShapeKind, ShapeLayer, StrokeStyle},
    paint::{LayerSurface, PaintEnv},
};

/// The composed shape matrix: translate to the layer position, rotate about
/// the *scaled* box center, then scale from the box's top-left origin. The
/// rotation pivot sits at the post-scale center, which keeps the shape's
/// apparent center fixed under combined rotate+scale.
pub(crate) fn shape_transform(
    x: f64,
    y: f64,
    rotation_deg: f64,
    scale: f64,
    width: f64,
    height: f64,
) -> Affine {
    let pivot = kurbo::Vec2::new(scale * width / 2.0, scale * height / 2.0);
    Affine::translate((x, y))
        * Affine::translate(pivot)
        * Affine::rotate(rotation_deg.to_radians())
        * Affine::translate(-pivot)
        * Affine::scale(scale)
}

/// Ten vertices alternating outer radius and `0.382 x outer`, starting at
/// the top of the box (golden-ratio five-point star).
pub(crate) fn star_vertices(width: f64, height: f64) -> Vec<Point> {
    let cx = width / 2.0;
    let cy = height / 2.0;
    let outer = width.min(height) / 2.0;
    let inner = outer * STAR_INNER_RADIUS_RATIO;

    (0..10)
        .map(|i| {
            let r = if i % 2 == 0 { outer } else { inner };
            let theta = -std::f64::consts::FRAC_PI_2 + (i as f64) * std::f64::consts::PI / 5.0;
            Point::new(cx + r * theta.cos(), cy + r * theta.sin())
        })
        .collect()
}

/// Five equally-spaced points on the inscribed circle, starting at the top.
pub(crate) fn pentagon_vertices(width: f64, height: f64) -> Vec<Point> {
    let cx = width / 2.0;
    let cy = height / 2.0;
    let r = width.min(height) / 2.0;

    (0..5)
        .map(|i| {
            let theta =
                -std::f64::consts::FRAC_PI_2 + (i as f64) * 2.0 * std::f64::consts::PI / 5.0;
            Point::new(cx + r * theta.cos(), cy + r * theta.sin())
        })
        .collect()
}

fn polygon_path(points: &[Point]) -> BezPath {
    let mut path = BezPath::new();
    if let Some((first, rest)) = points.split_first() {
        path.move_to(*first);
        for p in rest {
            path.line_to(*p);
        }
        path.close_path();
    }
    path
}

/// Local-space outline for a shape kind within its unscaled bounding box.
pub(crate) fn shape_path(kind: ShapeKind, width: f64, height: f64) -> BezPath {
    match kind {
        ShapeKind::Rectangle => kurbo::Rect::new(0.0, 0.0, width, height).to_path(0.1),
        ShapeKind::Circle => {
            let r = width.min(height) / 2.0;
            kurbo::Circle::new((width / 2.0, height / 2.0), r).to_path(0.1)
        }
        ShapeKind::Line => {
            let mut path = BezPath::new();
            path.move_to((0.0, height / 2.0));
            path.line_to((width, height / 2.0));
            path
        }
        ShapeKind::Triangle => polygon_path(&[
            Point::new(width / 2.0, 0.0),
            Point::new(width, height),
            Point::new(0.0, height),
        ]),
        ShapeKind::Arrow => {
            // Head spans the full width; the shaft is a fixed fraction of
            // the width and of the height.
            let head_base = height * ARROW_SHAFT_LENGTH_FRACTION;
            let shaft_half = width * ARROW_SHAFT_WIDTH_FRACTION / 2.0;
            let cx = width / 2.0;
            polygon_path(&[
                Point::new(cx, 0.0),
                Point::new(width, head_base),
                Point::new(cx + shaft_half, head_base),
                Point::new(cx + shaft_half, height),
                Point::new(cx - shaft_half, height),
                Point::new(cx - shaft_half, head_base),
                Point::new(0.0, head_base),
            ])
        }
        ShapeKind::Star => polygon_path(&star_vertices(width, height)),
        ShapeKind::Pentagon => polygon_path(&pentagon_vertices(width, height)),
    }
}

fn stroke_for(layer: &ShapeLayer) -> vello_cpu::kurbo::Stroke {
    let stroke = vello_cpu::kurbo::Stroke::new(layer.stroke_width);
    match layer.stroke_style {
        StrokeStyle::Solid => stroke,
        StrokeStyle::Dashed => stroke.with_dashes(0.0, DASH_PATTERN_DASHED),
        StrokeStyle::Dotted => stroke.with_dashes(0.0, DASH_PATTERN_DOTTED),
        StrokeStyle::LongDash => stroke.with_dashes(0.0, DASH_PATTERN_LONG_DASH),
        StrokeStyle::DashDot => stroke.with_dashes(0.0, DASH_PATTERN_DASH_DOT),
    }
}

pub(crate) fn paint_shape(
    layer: &ShapeLayer,
    surf: &mut LayerSurface,
    _env: &mut PaintEnv<'_>,
) -> PhotoflatResult<()> {
    let path = shape_path(layer.kind, layer.width, layer.height);
    let transform = shape_transform(
        layer.common.x,
        layer.common.y,
        layer.common.rotation,
        layer.common.scale,
        layer.width,
        layer.height,
    );
    // Lines are stroke-only regardless of the fill toggle.
    let filled = layer.filled && layer.kind != ShapeKind::Line;

    if let Some(shadow) = layer.shadow {
        let shadow_tr = Affine::translate((shadow.dx, shadow.dy)) * transform;
        surf.draw_blurred(shadow.blur_radius, |ctx| {
            ctx.set_transform(affine_to_cpu(shadow_tr));
            ctx.set_paint(shadow.color.to_peniko());
            let cpu_path = bezpath_to_cpu(&path);
            if filled {
                ctx.fill_path(&cpu_path);
            } else {
                ctx.set_stroke(stroke_for(layer));
                ctx.stroke_path(&cpu_path);
            }
            Ok(())
        })?;
    }

    surf.draw(|ctx| {
        ctx.set_transform(affine_to_cpu(transform));
        ctx.set_paint(layer.color.to_peniko());
        let cpu_path = bezpath_to_cpu(&path);
        if filled {
            ctx.fill_path(&cpu_path);
        } else {
            ctx.set_stroke(stroke_for(layer));
            ctx.stroke_path(&cpu_path);
        }
        Ok(())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn star_has_ten_alternating_vertices() {
        let verts = star_vertices(100.0, 100.0);
        assert_eq!(verts.len(), 10);

        let center = Point::new(50.0, 50.0);
        for (i, v) in verts.iter().enumerate() {
            let r = v.distance(center);
            let expected = if i % 2 == 0 { 50.0 } else { 50.0 * 0.382 };
            assert!((r - expected).abs() < 1e-9, "vertex {i}: {r} vs {expected}");
        }

        // Starts at the top.
        assert!((verts[0].x - 50.0).abs() < 1e-9);
        assert!((verts[0].y - 0.0).abs() < 1e-9);
    }

    #[test]
    fn pentagon_has_five_equidistant_vertices() {
        let verts = pentagon_vertices(80.0, 80.0);
        assert_eq!(verts.len(), 5);
        let center = Point::new(40.0, 40.0);
        for v in &verts {
            assert!((v.distance(center) - 40.0).abs() < 1e-9);
        }
        assert!((verts[0].y - 0.0).abs() < 1e-9);
    }

    #[test]
    fn arrow_respects_fixed_proportions() {
        let path = shape_path(ShapeKind::Arrow, 100.0, 200.0);
        let bbox = path.bounding_box();
        assert!((bbox.width() - 100.0).abs() < 1e-6);
        assert!((bbox.height() - 200.0).abs() < 1e-6);

        // Shaft edges sit at 40% total width, centered.
        let verts: Vec<Point> = path
            .elements()
            .iter()
            .filter_map(|el| match el {
                kurbo::PathEl::MoveTo(p) | kurbo::PathEl::LineTo(p) => Some(*p),
                _ => None,
            })
            .collect();
        assert!(verts.iter().any(|p| (p.x - 70.0).abs() < 1e-9));
        assert!(verts.iter().any(|p| (p.x - 30.0).abs() < 1e-9));
        assert!(verts.iter().any(|p| (p.y - 100.0).abs() < 1e-9));
    }

    #[test]
    fn rotation_full_circle_preserves_bounding_box() {
        let base = shape_path(ShapeKind::Rectangle, 60.0, 60.0);
        let identity_box =
            (shape_transform(10.0, 10.0, 0.0, 1.0, 60.0, 60.0) * base.clone()).bounding_box();

        for quarter in 1..=4 {
            let rotated = shape_transform(10.0, 10.0, f64::from(quarter) * 90.0, 1.0, 60.0, 60.0)
                * base.clone();
            let bbox = rotated.bounding_box();
            assert!((bbox.x0 - identity_box.x0).abs() < 1e-6, "quarter {quarter}");
            assert!((bbox.y0 - identity_box.y0).abs() < 1e-6);
            assert!((bbox.x1 - identity_box.x1).abs() < 1e-6);
            assert!((bbox.y1 - identity_box.y1).abs() < 1e-6);
        }
    }

    #[test]
    fn rotate_then_scale_keeps_apparent_center() {
        // The rotation pivot is the post-scale center, so the transformed
        // center must land there for any rotation.
        let (w, h, s) = (40.0, 20.0, 2.0);
        for deg in [0.0, 37.0, 90.0, 215.0] {
            let tr = shape_transform(5.0, 7.0, deg, s, w, h);
            let center = tr * Point::new(w / 2.0, h / 2.0);
            assert!((center.x - (5.0 + s * w / 2.0)).abs() < 1e-9, "deg {deg}");
            assert!((center.y - (7.0 + s * h / 2.0)).abs() < 1e-9, "deg {deg}");
        }
    }

    #[test]
    fn line_path_is_horizontal_midline() {
        let path = shape_path(ShapeKind::Line, 100.0, 40.0);
        let bbox = path.bounding_box();
        assert!((bbox.y0 - 20.0).abs() < 1e-9);
        assert!((bbox.y1 - 20.0).abs() < 1e-9);
        assert!((bbox.width() - 100.0).abs() < 1e-9);
    }
}
