//! Per-kind layer painters and their shared scratch-surface machinery.
//!
//! Every painter rasterizes into its own transparent full-canvas
//! [`LayerSurface`]; the composer then blends that surface over the canvas
//! with the layer's opacity and blend mode. Painters that need soft
//! effects (shadows, glows, neon cores) stack blurred sub-phases onto
//! their own surface before the composer ever sees it.

pub(crate) mod ink;
pub(crate) mod shape;
pub(crate) mod sticker;
pub(crate) mod text;

use crate::{
    blur_cpu,
    composite_cpu,
    core::affine_to_cpu,
    error::{PhotoflatError, PhotoflatResult},
    render::StickerLibrary,
    text_layout::{TextBrushRgba8, TextLayoutEngine},
};

/// Everything a painter needs besides its layer: canvas geometry, the
/// UI-unit conversion factors, the sticker library and the text engine.
pub(crate) struct PaintEnv<'a> {
    pub(crate) canvas_width: u32,
    pub(crate) canvas_height: u32,
    /// Ratio between the interactive UI's on-screen scale and the raster's
    /// native pixel scale.
    pub(crate) render_scale: f64,
    /// Display density used to convert logical UI units to pixels.
    pub(crate) density: f64,
    pub(crate) stickers: Option<&'a dyn StickerLibrary>,
    pub(crate) text: TextLayoutEngine,
}

impl PaintEnv<'_> {
    /// Convert logical UI units (density-independent) to raster pixels.
    pub(crate) fn ui_px(&self, units: f64) -> f64 {
        units * self.density / self.render_scale.max(f64::MIN_POSITIVE)
    }
}

/// One transparent full-canvas scratch surface a painter accumulates into.
pub(crate) struct LayerSurface {
    width: u16,
    height: u16,
    pixmap: vello_cpu::Pixmap,
}

impl LayerSurface {
    pub(crate) fn new(width: u32, height: u32) -> PhotoflatResult<Self> {
        let w: u16 = width
            .try_into()
            .map_err(|_| PhotoflatError::evaluation("surface width exceeds u16"))?;
        let h: u16 = height
            .try_into()
            .map_err(|_| PhotoflatError::evaluation("surface height exceeds u16"))?;
        Ok(Self {
            width: w,
            height: h,
            pixmap: vello_cpu::Pixmap::new(w, h),
        })
    }

    pub(crate) fn width(&self) -> u32 {
        u32::from(self.width)
    }

    pub(crate) fn height(&self) -> u32 {
        u32::from(self.height)
    }

    pub(crate) fn data(&self) -> &[u8] {
        self.pixmap.data_as_u8_slice()
    }

    pub(crate) fn data_mut(&mut self) -> &mut [u8] {
        self.pixmap.data_as_u8_slice_mut()
    }

    /// Run one vector phase and composite it over the accumulated surface.
    pub(crate) fn draw(
        &mut self,
        f: impl FnOnce(&mut vello_cpu::RenderContext) -> PhotoflatResult<()>,
    ) -> PhotoflatResult<()> {
        let mut ctx = vello_cpu::RenderContext::new(self.width, self.height);
        f(&mut ctx)?;
        ctx.flush();
        ctx.render_to_pixmap(&mut self.pixmap);
        Ok(())
    }

    /// Run one vector phase into its own scratch pixmap, gaussian-blur the
    /// result, then composite it over the accumulated surface.
    pub(crate) fn draw_blurred(
        &mut self,
        blur_radius_px: f64,
        f: impl FnOnce(&mut vello_cpu::RenderContext) -> PhotoflatResult<()>,
    ) -> PhotoflatResult<()> {
        let mut scratch = vello_cpu::Pixmap::new(self.width, self.height);
        let mut ctx = vello_cpu::RenderContext::new(self.width, self.height);
        f(&mut ctx)?;
        ctx.flush();
        ctx.render_to_pixmap(&mut scratch);

        let blurred = blur_cpu::blur_premul(
            scratch.data_as_u8_slice(),
            self.width(),
            self.height(),
            blur_radius_px,
        )?;
        composite_cpu::blend_in_place(
            self.pixmap.data_as_u8_slice_mut(),
            &blurred,
            1.0,
            crate::model::LayerBlend::Normal,
        )
    }

    /// Blur everything painted so far.
    pub(crate) fn blur_in_place(&mut self, blur_radius_px: f64) -> PhotoflatResult<()> {
        let blurred = blur_cpu::blur_premul(
            self.pixmap.data_as_u8_slice(),
            self.width(),
            self.height(),
            blur_radius_px,
        )?;
        self.pixmap.data_as_u8_slice_mut().copy_from_slice(&blurred);
        Ok(())
    }

    /// Per-pixel post-pass over the accumulated premultiplied bytes.
    pub(crate) fn map_pixels(&mut self, mut f: impl FnMut(&mut [u8])) {
        for px in self.pixmap.data_as_u8_slice_mut().chunks_exact_mut(4) {
            f(px);
        }
    }
}

/// Paint every glyph run of a layout with its brush color, or with one
/// override paint for effect duplicates and gradient fills.
pub(crate) fn fill_glyph_layout(
    ctx: &mut vello_cpu::RenderContext,
    layout: &parley::Layout<TextBrushRgba8>,
    transform: kurbo::Affine,
    override_paint: Option<vello_cpu::PaintType>,
) -> PhotoflatResult<()> {
    ctx.set_transform(affine_to_cpu(transform));
    for line in layout.lines() {
        for item in line.items() {
            let parley::layout::PositionedLayoutItem::GlyphRun(run) = item else {
                continue;
            };

            let paint = override_paint.clone().unwrap_or_else(|| {
                let brush = run.style().brush;
                vello_cpu::peniko::Color::from_rgba8(brush.r, brush.g, brush.b, brush.a).into()
            });
            ctx.set_paint(paint);

            let font = run_font_data(&run);
            let glyphs = run.glyphs().map(|g| vello_cpu::Glyph {
                id: g.id,
                x: g.x,
                y: g.y,
            });
            ctx.glyph_run(&font)
                .font_size(run.run().font_size())
                .fill_glyphs(glyphs);
        }
    }
    Ok(())
}

/// Stroke-only duplicate of a layout's glyphs (text outline effect).
pub(crate) fn stroke_glyph_layout(
    ctx: &mut vello_cpu::RenderContext,
    layout: &parley::Layout<TextBrushRgba8>,
    transform: kurbo::Affine,
    color: vello_cpu::peniko::Color,
    stroke_width: f64,
) -> PhotoflatResult<()> {
    ctx.set_transform(affine_to_cpu(transform));
    ctx.set_stroke(vello_cpu::kurbo::Stroke::new(stroke_width));
    for line in layout.lines() {
        for item in line.items() {
            let parley::layout::PositionedLayoutItem::GlyphRun(run) = item else {
                continue;
            };

            ctx.set_paint(color);
            let font = run_font_data(&run);
            let glyphs = run.glyphs().map(|g| vello_cpu::Glyph {
                id: g.id,
                x: g.x,
                y: g.y,
            });
            ctx.glyph_run(&font)
                .font_size(run.run().font_size())
                .stroke_glyphs(glyphs);
        }
    }
    Ok(())
}

fn run_font_data(
    run: &parley::layout::GlyphRun<'_, TextBrushRgba8>,
) -> vello_cpu::peniko::FontData {
    let font = run.run().font();
    vello_cpu::peniko::FontData::new(
        vello_cpu::peniko::Blob::from(font.data.as_ref().to_vec()),
        font.index,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layer_surface_starts_transparent() {
        let surf = LayerSurface::new(4, 3).unwrap();
        assert!(surf.data().iter().all(|&b| b == 0));
        assert_eq!(surf.data().len(), 4 * 3 * 4);
    }

    #[test]
    fn layer_surface_rejects_oversize() {
        assert!(LayerSurface::new(70_000, 4).is_err());
    }

    #[test]
    fn draw_accumulates_phases() {
        let mut surf = LayerSurface::new(8, 8).unwrap();
        surf.draw(|ctx| {
            ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(255, 0, 0, 255));
            ctx.fill_rect(&vello_cpu::kurbo::Rect::new(0.0, 0.0, 4.0, 8.0));
            Ok(())
        })
        .unwrap();
        surf.draw(|ctx| {
            ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(0, 255, 0, 255));
            ctx.fill_rect(&vello_cpu::kurbo::Rect::new(4.0, 0.0, 8.0, 8.0));
            Ok(())
        })
        .unwrap();

        let left = &surf.data()[0..4];
        let right = &surf.data()[4 * 4..4 * 4 + 4];
        assert_eq!(left, &[255, 0, 0, 255]);
        assert_eq!(right, &[0, 255, 0, 255]);
    }

    #[test]
    fn map_pixels_visits_every_pixel() {
        let mut surf = LayerSurface::new(2, 2).unwrap();
        let mut n = 0;
        surf.map_pixels(|_| n += 1);
        assert_eq!(n, 4);
    }
}
