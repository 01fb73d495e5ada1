//! Sticker layer painter.
//!
//! Stickers are authored at a fixed logical box size; the exported raster
//! must convert that box through the same density and render-scale factors
//! the interactive UI used so on-screen and exported footprints match.
//! Content resolution failures degrade to an empty content box while the
//! transform/border/shadow machinery still runs.

use std::sync::Arc;

use kurbo::Affine;

use crate::{
    constants::{STICKER_BASE_SIZE, STICKER_TEXT_FIT_FRACTION, STICKER_TEXT_FONT_SIZE},
    core::{Raster, Rgba8, affine_to_cpu, decode_image, raster_to_image_paint},
    error::PhotoflatResult,
    model::{StickerLayer, StickerSource, TextAlignment},
    paint::{LayerSurface, PaintEnv, fill_glyph_layout},
    text_layout::{TextBrushRgba8, TextLayoutEngine, TextSpec},
};

enum ResolvedContent {
    Raster(Arc<Raster>),
    Text(String),
    Empty,
}

/// Logical sticker box edge converted to raster pixels.
pub(crate) fn sticker_box_px(env: &PaintEnv<'_>) -> f64 {
    env.ui_px(STICKER_BASE_SIZE)
}

/// Resolution order: built-in library key, then literal text/emoji, then
/// image content. Failures are swallowed; the sticker keeps its box.
fn resolve_content(layer: &StickerLayer, env: &PaintEnv<'_>) -> ResolvedContent {
    match &layer.source {
        StickerSource::Builtin(key) => match env.stickers.and_then(|lib| lib.builtin(key)) {
            Some(raster) => ResolvedContent::Raster(raster),
            None => {
                tracing::warn!(
                    sticker = layer.common.id,
                    key = %key,
                    "builtin sticker not found; rendering empty content box"
                );
                ResolvedContent::Empty
            }
        },
        StickerSource::Text(s) if !s.is_empty() => ResolvedContent::Text(s.clone()),
        StickerSource::Text(_) => ResolvedContent::Empty,
        StickerSource::Image(raster) => ResolvedContent::Raster(Arc::clone(raster)),
        StickerSource::Encoded(bytes) => match decode_image(bytes) {
            Ok(raster) => ResolvedContent::Raster(Arc::new(raster)),
            Err(err) => {
                tracing::warn!(
                    sticker = layer.common.id,
                    %err,
                    "sticker image failed to decode; rendering empty content box"
                );
                ResolvedContent::Empty
            }
        },
    }
}

/// Box transform: translate to position, then rotate and scale about the
/// box center, with the horizontal flip folded into the x scale sign.
pub(crate) fn sticker_transform(layer: &StickerLayer, box_px: f64) -> Affine {
    let pivot = kurbo::Vec2::new(box_px / 2.0, box_px / 2.0);
    let flip = if layer.flip_horizontal { -1.0 } else { 1.0 };
    let sx = layer.common.scale * layer.scale_x * flip;
    let sy = layer.common.scale * layer.scale_y;

    Affine::translate((layer.common.x, layer.common.y))
        * Affine::translate(pivot)
        * Affine::rotate(layer.common.rotation.to_radians())
        * Affine::scale_non_uniform(sx, sy)
        * Affine::translate(-pivot)
}

/// Fit-scale for raw content into the logical box: images fill the box,
/// text occupies a reduced fraction, both preserving aspect ratio.
pub(crate) fn content_fit_scale(content_w: f64, content_h: f64, box_px: f64, is_text: bool) -> f64 {
    if content_w <= 0.0 || content_h <= 0.0 {
        return 0.0;
    }
    let target = if is_text {
        box_px * STICKER_TEXT_FIT_FRACTION
    } else {
        box_px
    };
    (target / content_w).min(target / content_h)
}

struct PreparedSticker {
    paint: Option<StickerPaint>,
    content_w: f64,
    content_h: f64,
}

enum StickerPaint {
    Image(vello_cpu::Image),
    Glyphs(parley::Layout<TextBrushRgba8>),
}

fn prepare(layer: &StickerLayer, env: &mut PaintEnv<'_>) -> PhotoflatResult<PreparedSticker> {
    match resolve_content(layer, env) {
        ResolvedContent::Raster(raster) => {
            let paint = raster_to_image_paint(&raster)?;
            Ok(PreparedSticker {
                content_w: f64::from(raster.width()),
                content_h: f64::from(raster.height()),
                paint: Some(StickerPaint::Image(paint)),
            })
        }
        ResolvedContent::Text(s) => {
            let spec = TextSpec {
                family: "sans-serif",
                size_px: STICKER_TEXT_FONT_SIZE,
                bold: false,
                italic: false,
                alignment: TextAlignment::Center,
                max_width_px: None,
            };
            let layout = env.text.layout(&s, &spec, TextBrushRgba8::from(Rgba8::opaque(255, 255, 255)))?;
            let metrics = TextLayoutEngine::measure(&layout);
            Ok(PreparedSticker {
                content_w: metrics.width,
                content_h: metrics.height,
                paint: Some(StickerPaint::Glyphs(layout)),
            })
        }
        ResolvedContent::Empty => Ok(PreparedSticker {
            paint: None,
            content_w: 0.0,
            content_h: 0.0,
        }),
    }
}

fn draw_content(
    ctx: &mut vello_cpu::RenderContext,
    prepared: &PreparedSticker,
    transform: Affine,
) -> PhotoflatResult<()> {
    match &prepared.paint {
        Some(StickerPaint::Image(image)) => {
            ctx.set_transform(affine_to_cpu(transform));
            ctx.set_paint(image.clone());
            ctx.fill_rect(&vello_cpu::kurbo::Rect::new(
                0.0,
                0.0,
                prepared.content_w,
                prepared.content_h,
            ));
            Ok(())
        }
        Some(StickerPaint::Glyphs(layout)) => fill_glyph_layout(ctx, layout, transform, None),
        None => Ok(()),
    }
}

pub(crate) fn paint_sticker(
    layer: &StickerLayer,
    surf: &mut LayerSurface,
    env: &mut PaintEnv<'_>,
) -> PhotoflatResult<()> {
    let box_px = sticker_box_px(env);
    let prepared = prepare(layer, env)?;
    let is_text = matches!(prepared.paint, Some(StickerPaint::Glyphs(_)));
    let fit = content_fit_scale(prepared.content_w, prepared.content_h, box_px, is_text);

    let box_tr = sticker_transform(layer, box_px);
    // Into the box center, fit-scale, then content centered at the origin.
    let content_tr = box_tr
        * Affine::translate((box_px / 2.0, box_px / 2.0))
        * Affine::scale(fit)
        * Affine::translate((-prepared.content_w / 2.0, -prepared.content_h / 2.0));

    if let Some(shadow) = layer.shadow
        && prepared.paint.is_some()
    {
        let mut silhouette = LayerSurface::new(surf.width(), surf.height())?;
        let offset_tr = Affine::translate((shadow.dx, shadow.dy)) * content_tr;
        silhouette.draw(|ctx| draw_content(ctx, &prepared, offset_tr))?;
        let shadow_premul = shadow.color.premultiplied();
        silhouette.map_pixels(|px| {
            let a = u16::from(px[3]);
            for c in 0..3 {
                px[c] = ((u16::from(shadow_premul[c]) * a + 127) / 255) as u8;
            }
            px[3] = ((u16::from(shadow_premul[3]) * a + 127) / 255) as u8;
        });
        silhouette.blur_in_place(shadow.blur_radius)?;
        crate::composite_cpu::blend_in_place(
            surf.data_mut(),
            silhouette.data(),
            1.0,
            crate::model::LayerBlend::Normal,
        )?;
    }

    if prepared.paint.is_some() {
        if layer.tint.is_some() {
            // Tint is a source-atop filter over the resolved content, so it
            // runs on the content's own pixels before they join the layer.
            let mut content = LayerSurface::new(surf.width(), surf.height())?;
            content.draw(|ctx| draw_content(ctx, &prepared, content_tr))?;
            if let Some(tint) = layer.tint {
                let ta = f32::from(tint.a) / 255.0;
                content.map_pixels(|px| {
                    let a = f32::from(px[3]);
                    for (c, t) in px[0..3].iter_mut().zip([tint.r, tint.g, tint.b]) {
                        let tinted = f32::from(t) * a / 255.0;
                        *c = (f32::from(*c) * (1.0 - ta) + tinted * ta).round().clamp(0.0, 255.0)
                            as u8;
                    }
                });
            }
            crate::composite_cpu::blend_in_place(
                surf.data_mut(),
                content.data(),
                1.0,
                crate::model::LayerBlend::Normal,
            )?;
        } else {
            surf.draw(|ctx| draw_content(ctx, &prepared, content_tr))?;
        }
    }

    // Border strokes the fitted content footprint in box space; the stroke
    // width itself does not pick up the fit-scale.
    if let Some(border) = layer.border
        && prepared.paint.is_some()
    {
        let half_w = prepared.content_w * fit / 2.0;
        let half_h = prepared.content_h * fit / 2.0;
        let border_tr = box_tr * Affine::translate((box_px / 2.0, box_px / 2.0));
        surf.draw(|ctx| {
            ctx.set_transform(affine_to_cpu(border_tr));
            ctx.set_paint(border.color.to_peniko());
            ctx.set_stroke(vello_cpu::kurbo::Stroke::new(border.width));
            ctx.stroke_rect(&vello_cpu::kurbo::Rect::new(-half_w, -half_h, half_w, half_h));
            Ok(())
        })?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use kurbo::Point;

    #[test]
    fn fit_scale_preserves_aspect_ratio() {
        // Wide image: width is the limiting axis.
        let fit = content_fit_scale(200.0, 100.0, 100.0, false);
        assert!((fit - 0.5).abs() < 1e-9);

        // Tall image: height limits.
        let fit = content_fit_scale(50.0, 200.0, 100.0, false);
        assert!((fit - 0.5).abs() < 1e-9);
    }

    #[test]
    fn text_content_targets_reduced_fraction() {
        let fit = content_fit_scale(100.0, 100.0, 100.0, true);
        assert!((fit - STICKER_TEXT_FIT_FRACTION).abs() < 1e-9);
    }

    #[test]
    fn zero_size_content_fits_to_zero() {
        assert_eq!(content_fit_scale(0.0, 0.0, 100.0, false), 0.0);
    }

    #[test]
    fn transform_rotates_about_box_center() {
        let layer = StickerLayer {
            common: crate::model::LayerCommon {
                x: 10.0,
                y: 10.0,
                rotation: 90.0,
                ..crate::model::LayerCommon::default()
            },
            ..StickerLayer::default()
        };
        let tr = sticker_transform(&layer, 100.0);
        let center = tr * Point::new(50.0, 50.0);
        assert!((center.x - 60.0).abs() < 1e-9);
        assert!((center.y - 60.0).abs() < 1e-9);
    }

    #[test]
    fn horizontal_flip_negates_x_scale_only() {
        let layer = StickerLayer {
            flip_horizontal: true,
            ..StickerLayer::default()
        };
        let tr = sticker_transform(&layer, 100.0);
        // A point right of center maps left of center, same y.
        let p = tr * Point::new(75.0, 50.0);
        assert!((p.x - 25.0).abs() < 1e-9);
        assert!((p.y - 50.0).abs() < 1e-9);
    }
}
