//! Flattens the document's layer stack onto the adjusted base raster.
//!
//! Each visible layer rasterizes into its own transparent scratch surface,
//! then blends over the canvas with the layer's opacity and blend mode.
//! Ink is pinned beneath every positioned layer. A layer whose painter
//! fails is skipped with a warning; the export must still produce output.

use crate::{
    core::Raster,
    error::PhotoflatResult,
    model::{EditorState, InkAction, InkStyle, LayerBlend, ShapeLayer, StickerLayer, TextLayer},
    paint::{self, LayerSurface, PaintEnv},
};

enum PaintItem<'a> {
    Ink(&'a InkAction),
    Text(&'a TextLayer),
    Shape(&'a ShapeLayer),
    Sticker(&'a StickerLayer),
}

impl PaintItem<'_> {
    /// Ink has no user-assignable z; it is pinned at zero and sorts beneath
    /// positioned layers with the same z via the kind rank.
    fn sort_key(&self) -> (i32, u8) {
        match self {
            PaintItem::Ink(_) => (0, 0),
            PaintItem::Text(t) => (t.common.z_index, 1),
            PaintItem::Shape(s) => (s.common.z_index, 2),
            PaintItem::Sticker(s) => (s.common.z_index, 3),
        }
    }

    fn visible(&self) -> bool {
        match self {
            PaintItem::Ink(_) => true,
            PaintItem::Text(t) => t.common.is_visible && t.common.opacity > 0.0,
            PaintItem::Shape(s) => s.common.is_visible && s.common.opacity > 0.0,
            PaintItem::Sticker(s) => s.common.is_visible && s.common.opacity > 0.0,
        }
    }

    fn opacity(&self) -> f32 {
        match self {
            PaintItem::Ink(_) => 1.0,
            PaintItem::Text(t) => t.common.opacity,
            PaintItem::Shape(s) => s.common.opacity,
            PaintItem::Sticker(s) => s.common.opacity,
        }
    }

    fn blend(&self) -> LayerBlend {
        match self {
            PaintItem::Ink(InkAction::Path(p)) => {
                if p.style == InkStyle::Eraser {
                    LayerBlend::DestOut
                } else {
                    p.blend
                }
            }
            PaintItem::Ink(InkAction::Shape(_)) => LayerBlend::Normal,
            PaintItem::Text(_) | PaintItem::Shape(_) => LayerBlend::Normal,
            PaintItem::Sticker(s) => s.blend,
        }
    }

    fn id(&self) -> u64 {
        match self {
            PaintItem::Ink(InkAction::Path(p)) => p.id,
            PaintItem::Ink(InkAction::Shape(s)) => s.id,
            PaintItem::Text(t) => t.common.id,
            PaintItem::Shape(s) => s.common.id,
            PaintItem::Sticker(s) => s.common.id,
        }
    }

    fn kind_name(&self) -> &'static str {
        match self {
            PaintItem::Ink(_) => "ink",
            PaintItem::Text(_) => "text",
            PaintItem::Shape(_) => "shape",
            PaintItem::Sticker(_) => "sticker",
        }
    }

    fn paint(&self, surf: &mut LayerSurface, env: &mut PaintEnv<'_>) -> PhotoflatResult<()> {
        match self {
            PaintItem::Ink(a) => paint::ink::paint_ink(a, surf, env),
            PaintItem::Text(t) => paint::text::paint_text(t, surf, env),
            PaintItem::Shape(s) => paint::shape::paint_shape(s, surf, env),
            PaintItem::Sticker(s) => paint::sticker::paint_sticker(s, surf, env),
        }
    }
}

/// Collect visible layers in paint order: ascending z, then the fixed
/// ink/text/shape/sticker rank, then insertion order within a collection.
fn flatten(state: &EditorState) -> Vec<PaintItem<'_>> {
    let mut items: Vec<PaintItem<'_>> = Vec::with_capacity(
        state.ink.len() + state.texts.len() + state.shapes.len() + state.stickers.len(),
    );
    items.extend(state.ink.iter().map(PaintItem::Ink));
    items.extend(state.texts.iter().map(PaintItem::Text));
    items.extend(state.shapes.iter().map(PaintItem::Shape));
    items.extend(state.stickers.iter().map(PaintItem::Sticker));
    items.retain(PaintItem::visible);
    items.sort_by_key(PaintItem::sort_key);
    items
}

/// Bake every visible layer into a copy of the adjusted base raster.
pub(crate) fn compose_layers(
    base: &Raster,
    state: &EditorState,
    env: &mut PaintEnv<'_>,
) -> PhotoflatResult<Raster> {
    let mut canvas = base.clone();
    let (width, height) = (canvas.width(), canvas.height());

    for item in flatten(state) {
        let mut surf = LayerSurface::new(width, height)?;
        if let Err(err) = item.paint(&mut surf, env) {
            tracing::warn!(
                kind = item.kind_name(),
                layer = item.id(),
                %err,
                "layer failed to rasterize; skipping"
            );
            continue;
        }
        crate::composite_cpu::blend_in_place(
            canvas.data_mut(),
            surf.data(),
            item.opacity(),
            item.blend(),
        )?;
    }
    Ok(canvas)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{InkPath, LayerCommon, ShapeKind};
    use crate::core::Rgba8;

    fn shape(id: u64, z: i32) -> ShapeLayer {
        ShapeLayer {
            common: LayerCommon {
                id,
                z_index: z,
                ..LayerCommon::default()
            },
            ..ShapeLayer::default()
        }
    }

    #[test]
    fn flatten_orders_by_z_then_kind() {
        let state = EditorState {
            shapes: vec![shape(10, 5), shape(11, -1)],
            texts: vec![TextLayer {
                common: LayerCommon {
                    id: 20,
                    z_index: 5,
                    ..LayerCommon::default()
                },
                text: "t".to_string(),
                ..TextLayer::default()
            }],
            ink: vec![InkAction::Path(InkPath {
                id: 30,
                points: vec![(0.0, 0.0), (1.0, 1.0)],
                color: Rgba8::opaque(0, 0, 0),
                stroke_width: 2.0,
                style: InkStyle::Plain,
                blend: LayerBlend::Normal,
            })],
            ..EditorState::default()
        };

        let order: Vec<u64> = flatten(&state).iter().map(PaintItem::id).collect();
        // Shape z=-1 first, then pinned ink at z=0, then text before shape
        // at the shared z=5.
        assert_eq!(order, vec![11, 30, 20, 10]);
    }

    #[test]
    fn flatten_skips_hidden_and_fully_transparent() {
        let mut hidden = shape(1, 0);
        hidden.common.is_visible = false;
        let mut clear = shape(2, 0);
        clear.common.opacity = 0.0;
        let state = EditorState {
            shapes: vec![hidden, clear, shape(3, 0)],
            ..EditorState::default()
        };
        let order: Vec<u64> = flatten(&state).iter().map(PaintItem::id).collect();
        assert_eq!(order, vec![3]);
    }

    #[test]
    fn eraser_maps_to_destination_out() {
        let action = InkAction::Path(InkPath {
            id: 1,
            points: vec![(0.0, 0.0)],
            color: Rgba8::opaque(0, 0, 0),
            stroke_width: 4.0,
            style: InkStyle::Eraser,
            blend: LayerBlend::Normal,
        });
        assert_eq!(PaintItem::Ink(&action).blend(), LayerBlend::DestOut);
    }

    #[test]
    fn equal_keys_keep_insertion_order() {
        let state = EditorState {
            shapes: vec![shape(1, 3), shape(2, 3), shape(3, 3)],
            ..EditorState::default()
        };
        let order: Vec<u64> = flatten(&state).iter().map(PaintItem::id).collect();
        assert_eq!(order, vec![1, 2, 3]);
    }
}
