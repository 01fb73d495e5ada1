use std::sync::Arc;

use photoflat::model::{
    InkAction, InkPath, InkStyle, LayerBlend, LayerCommon, ShapeKind, ShapeLayer, StickerLayer,
    StickerSource,
};
use photoflat::{EditorState, IntRect, Raster, RenderOptions, Rgba8, render};

fn solid(width: u32, height: u32, color: [u8; 4]) -> Arc<Raster> {
    let mut r = Raster::new(width, height).unwrap();
    for px in r.data_mut().chunks_exact_mut(4) {
        px.copy_from_slice(&color);
    }
    Arc::new(r)
}

fn px(r: &Raster, x: u32, y: u32) -> [u8; 4] {
    let idx = ((y * r.width() + x) * 4) as usize;
    let mut out = [0u8; 4];
    out.copy_from_slice(&r.data()[idx..idx + 4]);
    out
}

fn rect_layer(id: u64, z: i32, color: Rgba8) -> ShapeLayer {
    ShapeLayer {
        common: LayerCommon {
            id,
            z_index: z,
            ..LayerCommon::default()
        },
        kind: ShapeKind::Rectangle,
        width: 100.0,
        height: 100.0,
        filled: true,
        color,
        ..ShapeLayer::default()
    }
}

#[test]
fn neutral_document_returns_input_allocation() {
    let base = solid(16, 16, [40, 80, 120, 255]);
    let out = render(Arc::clone(&base), &EditorState::default(), &RenderOptions::default())
        .unwrap();
    assert!(Arc::ptr_eq(&base, &out));
}

#[test]
fn adjustment_only_document_changes_pixels() {
    let base = solid(8, 8, [100, 100, 100, 255]);
    let state = EditorState {
        brightness: 0.3,
        ..EditorState::default()
    };
    let out = render(Arc::clone(&base), &state, &RenderOptions::default()).unwrap();
    assert!(!Arc::ptr_eq(&base, &out));
    assert!(px(&out, 4, 4)[0] > 100);
}

#[test]
fn higher_z_paints_over_lower() {
    let base = solid(120, 120, [0, 0, 0, 255]);
    let red = Rgba8::opaque(255, 0, 0);
    let blue = Rgba8::opaque(0, 0, 255);

    let state = EditorState {
        shapes: vec![rect_layer(1, 1, red), rect_layer(2, 2, blue)],
        ..EditorState::default()
    };
    let out = render(Arc::clone(&base), &state, &RenderOptions::default()).unwrap();
    assert_eq!(px(&out, 50, 50), [0, 0, 255, 255]);

    // Reversed authoring order must not change the winner.
    let state = EditorState {
        shapes: vec![rect_layer(2, 2, blue), rect_layer(1, 1, red)],
        ..EditorState::default()
    };
    let out = render(Arc::clone(&base), &state, &RenderOptions::default()).unwrap();
    assert_eq!(px(&out, 50, 50), [0, 0, 255, 255]);

    // Swap the z assignments; the winner flips.
    let state = EditorState {
        shapes: vec![rect_layer(1, 2, red), rect_layer(2, 1, blue)],
        ..EditorState::default()
    };
    let out = render(base, &state, &RenderOptions::default()).unwrap();
    assert_eq!(px(&out, 50, 50), [255, 0, 0, 255]);
}

#[test]
fn z_ties_resolve_by_insertion_order() {
    let base = solid(120, 120, [0, 0, 0, 255]);
    let state = EditorState {
        shapes: vec![
            rect_layer(1, 3, Rgba8::opaque(255, 0, 0)),
            rect_layer(2, 3, Rgba8::opaque(0, 255, 0)),
        ],
        ..EditorState::default()
    };
    let out = render(base, &state, &RenderOptions::default()).unwrap();
    assert_eq!(px(&out, 50, 50), [0, 255, 0, 255]);
}

#[test]
fn invalid_crop_is_skipped_not_fatal() {
    let base = solid(32, 32, [10, 20, 30, 255]);
    let state = EditorState {
        shapes: vec![rect_layer(1, 1, Rgba8::opaque(200, 0, 0))],
        ..EditorState::default()
    };

    let uncropped = render(Arc::clone(&base), &state, &RenderOptions::default()).unwrap();
    let bad_crop = render(
        Arc::clone(&base),
        &state,
        &RenderOptions {
            crop: Some(IntRect::new(0, 0, 100, 100)),
            ..RenderOptions::default()
        },
    )
    .unwrap();

    assert_eq!(uncropped.data(), bad_crop.data());
    assert_eq!(bad_crop.width(), 32);
    assert_eq!(bad_crop.height(), 32);
}

#[test]
fn valid_crop_shrinks_output() {
    let base = solid(32, 32, [10, 20, 30, 255]);
    let out = render(
        base,
        &EditorState::default(),
        &RenderOptions {
            crop: Some(IntRect::new(4, 8, 20, 24)),
            ..RenderOptions::default()
        },
    )
    .unwrap();
    assert_eq!(out.width(), 16);
    assert_eq!(out.height(), 16);
    assert_eq!(px(&out, 0, 0), [10, 20, 30, 255]);
}

fn sticker_state(blend: LayerBlend) -> EditorState {
    let content = solid(10, 10, [200, 100, 50, 255]);
    EditorState {
        stickers: vec![StickerLayer {
            common: LayerCommon {
                id: 1,
                ..LayerCommon::default()
            },
            source: StickerSource::Image(content),
            blend,
            ..StickerLayer::default()
        }],
        ..EditorState::default()
    }
}

fn painted_width(r: &Raster, row: u32, background: [u8; 4]) -> u32 {
    let mut min = None;
    let mut max = None;
    for x in 0..r.width() {
        if px(r, x, row) != background {
            min.get_or_insert(x);
            max = Some(x);
        }
    }
    match (min, max) {
        (Some(a), Some(b)) => b - a + 1,
        _ => 0,
    }
}

#[test]
fn render_scale_halves_sticker_footprint() {
    let bg = [0u8, 0, 0, 255];
    let base = solid(200, 200, bg);
    let state = sticker_state(LayerBlend::Normal);

    let full = render(Arc::clone(&base), &state, &RenderOptions::default()).unwrap();
    let half = render(
        base,
        &state,
        &RenderOptions {
            render_scale: 2.0,
            ..RenderOptions::default()
        },
    )
    .unwrap();

    // The sticker box spans 100 logical units; at render scale 2 its pixel
    // footprint halves linearly.
    let w_full = painted_width(&full, 50, bg);
    let w_half = painted_width(&half, 25, bg);
    assert!((90..=110).contains(&w_full), "full footprint {w_full}");
    assert!((40..=60).contains(&w_half), "half footprint {w_half}");
}

#[test]
fn multiply_blend_over_white_keeps_sticker_color() {
    let base = solid(200, 200, [255, 255, 255, 255]);
    let state = sticker_state(LayerBlend::Multiply);
    let out = render(base, &state, &RenderOptions::default()).unwrap();

    // Multiply against a white destination reproduces the source color.
    let got = px(&out, 50, 50);
    assert!((got[0] as i32 - 200).abs() <= 2, "{got:?}");
    assert!((got[1] as i32 - 100).abs() <= 2, "{got:?}");
    assert!((got[2] as i32 - 50).abs() <= 2, "{got:?}");
    assert_eq!(got[3], 255);
}

#[test]
fn eraser_ink_clears_coverage() {
    let base = solid(64, 64, [90, 90, 90, 255]);
    let state = EditorState {
        ink: vec![InkAction::Path(InkPath {
            id: 1,
            points: vec![(10.0, 32.0), (54.0, 32.0)],
            color: Rgba8::opaque(0, 0, 0),
            stroke_width: 10.0,
            style: InkStyle::Eraser,
            blend: LayerBlend::Normal,
        })],
        ..EditorState::default()
    };
    let out = render(base, &state, &RenderOptions::default()).unwrap();
    assert_eq!(px(&out, 32, 32)[3], 0);
    assert_eq!(px(&out, 32, 5), [90, 90, 90, 255]);
}

#[test]
fn global_rotation_swaps_output_extents() {
    let base = solid(40, 20, [1, 2, 3, 255]);
    let state = EditorState {
        rotation_angle: 90.0,
        ..EditorState::default()
    };
    let out = render(base, &state, &RenderOptions::default()).unwrap();
    assert_eq!(out.width(), 20);
    assert_eq!(out.height(), 40);
}

#[test]
fn hidden_layers_leave_canvas_untouched() {
    let base = solid(120, 120, [5, 5, 5, 255]);
    let mut layer = rect_layer(1, 1, Rgba8::opaque(255, 0, 0));
    layer.common.is_visible = false;
    let state = EditorState {
        shapes: vec![layer],
        ..EditorState::default()
    };
    let out = render(base, &state, &RenderOptions::default()).unwrap();
    assert_eq!(px(&out, 50, 50), [5, 5, 5, 255]);
}

#[test]
fn validation_failure_is_a_hard_error() {
    let base = solid(8, 8, [0, 0, 0, 255]);
    let mut layer = rect_layer(1, 1, Rgba8::opaque(255, 0, 0));
    layer.common.opacity = 2.0;
    let state = EditorState {
        shapes: vec![layer],
        ..EditorState::default()
    };
    assert!(render(base, &state, &RenderOptions::default()).is_err());
}
