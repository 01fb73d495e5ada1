//! The single export entry point: adjust, compose, transform, crop.

use std::sync::Arc;

use crate::{
    adjust,
    compose,
    core::{IntRect, Raster},
    error::{PhotoflatError, PhotoflatResult},
    model::EditorState,
    paint::PaintEnv,
    text_layout::TextLayoutEngine,
    transform,
};

/// Resolver for built-in sticker keys. The host app owns the asset bundle;
/// the renderer only asks for pre-decoded premultiplied rasters.
pub trait StickerLibrary {
    fn builtin(&self, key: &str) -> Option<Arc<Raster>>;
}

/// Per-export parameters that are not part of the document itself.
pub struct RenderOptions<'a> {
    /// Final crop in post-transform canvas pixels. Unusable rectangles are
    /// skipped, never fatal.
    pub crop: Option<IntRect>,
    /// Ratio between the interactive preview's scale and this raster's
    /// native scale. Layer UI-unit sizes divide by this.
    pub render_scale: f64,
    /// Display density the document's logical units were authored against.
    pub target_density: f64,
    pub stickers: Option<&'a dyn StickerLibrary>,
}

impl Default for RenderOptions<'_> {
    fn default() -> Self {
        Self {
            crop: None,
            render_scale: 1.0,
            target_density: 1.0,
            stickers: None,
        }
    }
}

impl RenderOptions<'_> {
    fn validate(&self) -> PhotoflatResult<()> {
        if !self.render_scale.is_finite() || self.render_scale <= 0.0 {
            return Err(PhotoflatError::validation(
                "render_scale must be finite and > 0",
            ));
        }
        if !self.target_density.is_finite() || self.target_density <= 0.0 {
            return Err(PhotoflatError::validation(
                "target_density must be finite and > 0",
            ));
        }
        Ok(())
    }
}

fn has_layers(state: &EditorState) -> bool {
    !state.texts.is_empty()
        || !state.shapes.is_empty()
        || !state.stickers.is_empty()
        || !state.ink.is_empty()
}

/// Flatten one document snapshot into a single premultiplied raster.
///
/// Stage order is fixed: color adjustments on the base photo, layer
/// compositing, whole-canvas rotation/flip, crop. A fully-neutral document
/// returns the input allocation unchanged.
#[tracing::instrument(skip_all, fields(width = base.width(), height = base.height()))]
pub fn render(
    base: Arc<Raster>,
    state: &EditorState,
    opts: &RenderOptions<'_>,
) -> PhotoflatResult<Arc<Raster>> {
    state.validate()?;
    opts.validate()?;
    if base.width() == 0 || base.height() == 0 {
        return Err(PhotoflatError::validation("base raster is empty"));
    }

    let adjusted = adjust::apply_adjustments(&base, state)?;

    let composed = if has_layers(state) {
        let mut env = PaintEnv {
            canvas_width: adjusted.width(),
            canvas_height: adjusted.height(),
            render_scale: opts.render_scale,
            density: opts.target_density,
            stickers: opts.stickers,
            text: TextLayoutEngine::new(),
        };
        Arc::new(compose::compose_layers(&adjusted, state, &mut env)?)
    } else {
        adjusted
    };

    let transformed = transform::apply_global_transform(&composed, state);
    Ok(transform::apply_crop(&transformed, opts.crop))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn options_reject_bad_scale_factors() {
        let opts = RenderOptions {
            render_scale: 0.0,
            ..RenderOptions::default()
        };
        assert!(opts.validate().is_err());

        let opts = RenderOptions {
            target_density: f64::NAN,
            ..RenderOptions::default()
        };
        assert!(opts.validate().is_err());

        assert!(RenderOptions::default().validate().is_ok());
    }

    #[test]
    fn empty_base_is_a_hard_error() {
        let base = Arc::new(Raster::new(0, 4).unwrap());
        let err = render(base, &EditorState::default(), &RenderOptions::default());
        assert!(err.is_err());
    }
}
