//! Whole-canvas rotation/flip and the final crop. Both stages degrade
//! rather than fail: an unusable transform or crop leaves the incoming
//! raster untouched so the export always yields a picture.

use std::sync::Arc;

use kurbo::Affine;

use crate::{
    core::{IntRect, Raster, affine_to_cpu, pixmap_to_raster, raster_to_image_paint},
    error::{PhotoflatError, PhotoflatResult},
    model::EditorState,
};

/// Output extents of a canvas rotated by `angle_deg`: the axis-aligned
/// bounding box of the rotated rectangle. Flips never change extents.
pub(crate) fn rotated_extents(width: u32, height: u32, angle_deg: f64) -> (u32, u32) {
    let rad = angle_deg.to_radians();
    let (sin, cos) = (rad.sin().abs(), rad.cos().abs());
    let w = f64::from(width);
    let h = f64::from(height);
    let out_w = (w * cos + h * sin).round().max(1.0) as u32;
    let out_h = (w * sin + h * cos).round().max(1.0) as u32;
    (out_w, out_h)
}

fn is_identity(state: &EditorState) -> bool {
    state.rotation_angle == 0.0 && !state.flip_x && !state.flip_y
}

fn resample(src: &Raster, state: &EditorState) -> PhotoflatResult<Raster> {
    let (out_w, out_h) = rotated_extents(src.width(), src.height(), state.rotation_angle);
    let w16: u16 = out_w
        .try_into()
        .map_err(|_| PhotoflatError::evaluation("rotated width exceeds u16"))?;
    let h16: u16 = out_h
        .try_into()
        .map_err(|_| PhotoflatError::evaluation("rotated height exceeds u16"))?;

    let fx = if state.flip_x { -1.0 } else { 1.0 };
    let fy = if state.flip_y { -1.0 } else { 1.0 };
    let transform = Affine::translate((f64::from(out_w) / 2.0, f64::from(out_h) / 2.0))
        * Affine::rotate(state.rotation_angle.to_radians())
        * Affine::scale_non_uniform(fx, fy)
        * Affine::translate((
            -f64::from(src.width()) / 2.0,
            -f64::from(src.height()) / 2.0,
        ));

    let image = raster_to_image_paint(src)?;
    let mut ctx = vello_cpu::RenderContext::new(w16, h16);
    ctx.set_transform(affine_to_cpu(transform));
    ctx.set_paint(image);
    ctx.fill_rect(&vello_cpu::kurbo::Rect::new(
        0.0,
        0.0,
        f64::from(src.width()),
        f64::from(src.height()),
    ));
    ctx.flush();

    let mut pixmap = vello_cpu::Pixmap::new(w16, h16);
    ctx.render_to_pixmap(&mut pixmap);
    pixmap_to_raster(&pixmap)
}

/// Apply the document-wide rotation and flips. Identity settings hand the
/// input back unchanged; a resample failure degrades to the input.
pub(crate) fn apply_global_transform(src: &Arc<Raster>, state: &EditorState) -> Arc<Raster> {
    if is_identity(state) {
        return Arc::clone(src);
    }
    match resample(src, state) {
        Ok(out) => Arc::new(out),
        Err(err) => {
            tracing::warn!(%err, "global transform failed; keeping untransformed raster");
            Arc::clone(src)
        }
    }
}

/// Apply the optional crop. Empty or out-of-bounds rectangles are skipped
/// with a warning, not propagated as errors.
pub(crate) fn apply_crop(src: &Arc<Raster>, crop: Option<IntRect>) -> Arc<Raster> {
    let Some(rect) = crop else {
        return Arc::clone(src);
    };
    if let Err(err) = rect.validate_within(src.width(), src.height()) {
        tracing::warn!(?rect, %err, "crop rectangle unusable; exporting uncropped");
        return Arc::clone(src);
    }
    match src.crop_to(rect) {
        Ok(out) => Arc::new(out),
        Err(err) => {
            tracing::warn!(?rect, %err, "crop failed; exporting uncropped");
            Arc::clone(src)
        }
    }
}
