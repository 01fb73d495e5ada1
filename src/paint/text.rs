//! Text layer painter.
//!
//! The interactive editor wraps a text box in two rings: an optional
//! background-padding ring and a fixed handle-padding ring used for drag
//! affordances. Rotation and scale pivot about the *outer* box center.
//! This painter re-derives those boxes procedurally and then stacks the
//! effect phases in the editor's fixed order: background, glitch split,
//! shadow, neon glow, outline, main fill, blur, mirror reflection.

use kurbo::{Affine, Point, Shape as _};

use crate::{
    constants::{
        GLITCH_ALPHA, GLITCH_OFFSET, HANDLE_PADDING, TEXT_BACKGROUND_CORNER_RADIUS,
        TEXT_MIN_CONTENT_WIDTH,
    },
    core::{Rgba8, premul_bytes_to_pixmap},
    error::PhotoflatResult,
    model::{TextAlignment, TextLayer},
    paint::{LayerSurface, PaintEnv, fill_glyph_layout, stroke_glyph_layout},
    text_layout::{TextLayoutEngine, TextSpec},
};

/// Nested box sizes for one text layer, all in raster pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct TextBoxes {
    pub(crate) content_width: f64,
    pub(crate) content_height: f64,
    pub(crate) background_padding: f64,
    pub(crate) handle_padding: f64,
}

impl TextBoxes {
    /// Content box with the minimum-width floor applied, so empty or very
    /// thin text still reserves a selectable box.
    pub(crate) fn new(
        measured_width: f64,
        measured_height: f64,
        background_padding: f64,
        handle_padding: f64,
        min_content_width: f64,
    ) -> Self {
        Self {
            content_width: measured_width.max(min_content_width),
            content_height: measured_height.max(0.0),
            background_padding,
            handle_padding,
        }
    }

    /// Offset from the outer box origin to the content box origin.
    pub(crate) fn content_inset(self) -> f64 {
        self.background_padding + self.handle_padding
    }

    pub(crate) fn outer_width(self) -> f64 {
        self.content_width + 2.0 * self.content_inset()
    }

    pub(crate) fn outer_height(self) -> f64 {
        self.content_height + 2.0 * self.content_inset()
    }
}

/// Rigid transform of the outer box: translate to the layer position, then
/// rotate and scale about the outer box center, then an optional shear
/// standing in for the 3-D perspective tilt.
pub(crate) fn text_transform(layer: &TextLayer, boxes: TextBoxes) -> Affine {
    let pivot = kurbo::Vec2::new(boxes.outer_width() / 2.0, boxes.outer_height() / 2.0);
    let mut tr = Affine::translate((layer.common.x, layer.common.y))
        * Affine::translate(pivot)
        * Affine::rotate(layer.common.rotation.to_radians())
        * Affine::scale(layer.common.scale)
        * Affine::translate(-pivot);

    if layer.rotation_x != 0.0 || layer.rotation_y != 0.0 {
        let skew_x = layer.rotation_y.to_radians().tan();
        let skew_y = layer.rotation_x.to_radians().tan();
        tr = tr
            * Affine::translate(pivot)
            * Affine::skew(skew_x, skew_y)
            * Affine::translate(-pivot);
    }
    tr
}

/// Horizontal multi-stop gradient rendered as an image paint, sampled
/// across `width` pixels at unit height.
fn horizontal_gradient_image(
    colors: &[Rgba8],
    width: u32,
    height: u32,
) -> PhotoflatResult<vello_cpu::Image> {
    let w = width.max(1);
    let h = height.max(1);
    let mut bytes = vec![0u8; (w as usize) * (h as usize) * 4];
    let w1 = (w - 1).max(1) as f64;
    let segments = (colors.len() - 1).max(1) as f64;

    for x in 0..w {
        let t = (x as f64) / w1 * segments;
        let idx = (t.floor() as usize).min(colors.len() - 2);
        let frac = (t - idx as f64).clamp(0.0, 1.0) as f32;
        let a = colors[idx];
        let b = colors[idx + 1];
        let lerp = |ca: u8, cb: u8| -> u8 {
            (f32::from(ca) + (f32::from(cb) - f32::from(ca)) * frac)
                .round()
                .clamp(0.0, 255.0) as u8
        };
        let straight = Rgba8::new(lerp(a.r, b.r), lerp(a.g, b.g), lerp(a.b, b.b), lerp(a.a, b.a));
        let premul = straight.premultiplied();
        for y in 0..h {
            let i = ((y as usize) * (w as usize) + (x as usize)) * 4;
            bytes[i..i + 4].copy_from_slice(&premul);
        }
    }

    let pixmap = premul_bytes_to_pixmap(&bytes, w, h)?;
    Ok(vello_cpu::Image {
        image: vello_cpu::ImageSource::Pixmap(std::sync::Arc::new(pixmap)),
        sampler: vello_cpu::peniko::ImageSampler::default(),
    })
}

pub(crate) fn paint_text(
    layer: &TextLayer,
    surf: &mut LayerSurface,
    env: &mut PaintEnv<'_>,
) -> PhotoflatResult<()> {
    let spec = TextSpec {
        family: &layer.font_family,
        size_px: layer.font_size,
        bold: layer.bold,
        italic: layer.italic,
        alignment: layer.alignment,
        max_width_px: (layer.layer_width > 0.0).then_some(layer.layer_width as f32),
    };
    let mut layout = env.text.layout(&layer.text, &spec, layer.color.into())?;
    let measured = TextLayoutEngine::measure(&layout);

    let bg_padding = layer.background.map(|b| b.padding).unwrap_or(0.0);
    let boxes = TextBoxes::new(
        measured.width,
        measured.height,
        env.ui_px(bg_padding),
        env.ui_px(HANDLE_PADDING),
        env.ui_px(TEXT_MIN_CONTENT_WIDTH),
    );

    // Re-align within the floored content width so center/right/justify
    // react to the minimum-width box, not just the glyph extents.
    let align = match layer.alignment {
        TextAlignment::Left => parley::Alignment::Start,
        TextAlignment::Center => parley::Alignment::Center,
        TextAlignment::Right => parley::Alignment::End,
        TextAlignment::Justify => parley::Alignment::Justify,
    };
    layout.align(
        Some(boxes.content_width as f32),
        align,
        parley::AlignmentOptions::default(),
    );

    let tr = text_transform(layer, boxes);
    let inset = boxes.content_inset();
    let text_tr = tr * Affine::translate((inset, inset));

    // Phase 1: background fill, inset by the handle ring only.
    if let Some(bg) = layer.background {
        let rect = kurbo::Rect::new(
            env.ui_px(HANDLE_PADDING),
            env.ui_px(HANDLE_PADDING),
            boxes.outer_width() - env.ui_px(HANDLE_PADDING),
            boxes.outer_height() - env.ui_px(HANDLE_PADDING),
        );
        let radius = if bg.corner_radius > 0.0 {
            bg.corner_radius
        } else {
            env.ui_px(TEXT_BACKGROUND_CORNER_RADIUS)
        };
        surf.draw(|ctx| {
            ctx.set_transform(crate::core::affine_to_cpu(tr));
            ctx.set_paint(bg.color.with_alpha_mul(bg.opacity).to_peniko());
            ctx.fill_path(&crate::core::bezpath_to_cpu(
                &kurbo::RoundedRect::from_rect(rect, radius).to_path(0.1),
            ));
            Ok(())
        })?;
    }

    // Phases 2..6 accumulate on their own surface so the optional blur
    // affects the glyph stack but not the background.
    let mut glyphs = LayerSurface::new(surf.width(), surf.height())?;

    if layer.glitch {
        let red = Rgba8::opaque(255, 0, 60).with_alpha_mul(GLITCH_ALPHA);
        let cyan = Rgba8::opaque(0, 255, 230).with_alpha_mul(GLITCH_ALPHA);
        glyphs.draw(|ctx| {
            fill_glyph_layout(
                ctx,
                &layout,
                text_tr * Affine::translate((-GLITCH_OFFSET, 0.0)),
                Some(red.to_peniko().into()),
            )
        })?;
        glyphs.draw(|ctx| {
            fill_glyph_layout(
                ctx,
                &layout,
                text_tr * Affine::translate((GLITCH_OFFSET, 0.0)),
                Some(cyan.to_peniko().into()),
            )
        })?;
    }

    if let Some(shadow) = layer.shadow {
        glyphs.draw_blurred(shadow.blur_radius, |ctx| {
            fill_glyph_layout(
                ctx,
                &layout,
                text_tr * Affine::translate((shadow.dx, shadow.dy)),
                Some(shadow.color.to_peniko().into()),
            )
        })?;
    }

    if let Some(glow) = layer.glow {
        glyphs.draw_blurred(glow.radius, |ctx| {
            fill_glyph_layout(ctx, &layout, text_tr, Some(glow.color.to_peniko().into()))
        })?;
    }

    // Outline is a stroke-only duplicate and never carries the shadow.
    if let Some(outline) = layer.outline {
        glyphs.draw(|ctx| {
            stroke_glyph_layout(ctx, &layout, text_tr, outline.color.to_peniko(), outline.width)
        })?;
    }

    // Main fill: gradient spanning the layer width, or solid. A gradient
    // with fewer than two colors degrades to the solid primary color.
    let gradient_paint = match &layer.gradient {
        Some(colors) if colors.len() >= 2 => {
            let span = if layer.layer_width > 0.0 {
                layer.layer_width
            } else {
                boxes.content_width
            };
            Some(horizontal_gradient_image(colors, span.ceil().max(1.0) as u32, 1)?)
        }
        Some(_) => {
            tracing::warn!(layer = layer.common.id, "gradient needs >= 2 colors; using solid fill");
            None
        }
        None => None,
    };
    glyphs.draw(|ctx| {
        fill_glyph_layout(ctx, &layout, text_tr, gradient_paint.map(Into::into))
    })?;

    if let Some(radius) = layer.blur_radius
        && radius > 0.0
    {
        glyphs.blur_in_place(radius)?;
    }

    crate::composite_cpu::blend_in_place(
        surf.data_mut(),
        glyphs.data(),
        1.0,
        crate::model::LayerBlend::Normal,
    )?;

    // Phase 7: vertical mirror about the text bottom edge, faded toward
    // its far edge.
    if let Some(refl) = layer.reflection {
        let bottom = boxes.content_height;
        let mirror = text_tr
            * Affine::translate((0.0, 2.0 * bottom + refl.offset))
            * Affine::scale_non_uniform(1.0, -1.0);

        let mut mirrored = LayerSurface::new(surf.width(), surf.height())?;
        mirrored.draw(|ctx| fill_glyph_layout(ctx, &layout, mirror, None))?;

        // Fade runs from the reflected copy's near edge to its far edge,
        // measured along canvas rows.
        let band_local = [
            Point::new(0.0, bottom + refl.offset),
            Point::new(boxes.content_width, bottom + refl.offset),
            Point::new(0.0, bottom + refl.offset + boxes.content_height),
            Point::new(boxes.content_width, bottom + refl.offset + boxes.content_height),
        ];
        let ys: Vec<f64> = band_local.iter().map(|p| (text_tr * *p).y).collect();
        let y_min = ys.iter().cloned().fold(f64::INFINITY, f64::min);
        let y_max = ys.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        let span = (y_max - y_min).max(1.0);

        let width = mirrored.width() as usize;
        for (row, chunk) in mirrored.data_mut().chunks_exact_mut(width * 4).enumerate() {
            let t = ((row as f64 - y_min) / span).clamp(0.0, 1.0);
            let fade = (f64::from(refl.opacity) * (1.0 - t)) as f32;
            for px in chunk.chunks_exact_mut(4) {
                for c in px.iter_mut() {
                    *c = ((f32::from(*c) * fade).round()).clamp(0.0, 255.0) as u8;
                }
            }
        }

        crate::composite_cpu::blend_in_place(
            surf.data_mut(),
            mirrored.data(),
            1.0,
            crate::model::LayerBlend::Normal,
        )?;
    }

    Ok(())
}
