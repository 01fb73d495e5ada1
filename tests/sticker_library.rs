use std::sync::Arc;

use photoflat::model::{LayerCommon, StickerLayer, StickerSource};
use photoflat::{EditorState, Raster, RenderOptions, StickerLibrary, render};

struct MapLibrary(std::collections::BTreeMap<String, Arc<Raster>>);

impl StickerLibrary for MapLibrary {
    fn builtin(&self, key: &str) -> Option<Arc<Raster>> {
        self.0.get(key).cloned()
    }
}

fn solid(width: u32, height: u32, color: [u8; 4]) -> Arc<Raster> {
    let mut r = Raster::new(width, height).unwrap();
    for px in r.data_mut().chunks_exact_mut(4) {
        px.copy_from_slice(&color);
    }
    Arc::new(r)
}

fn builtin_state(key: &str) -> EditorState {
    EditorState {
        stickers: vec![StickerLayer {
            common: LayerCommon {
                id: 1,
                ..LayerCommon::default()
            },
            source: StickerSource::Builtin(key.to_string()),
            ..StickerLayer::default()
        }],
        ..EditorState::default()
    }
}

#[test]
fn builtin_key_resolves_through_library() {
    let mut map = std::collections::BTreeMap::new();
    map.insert("heart".to_string(), solid(8, 8, [255, 0, 0, 255]));
    let lib = MapLibrary(map);

    let base = solid(200, 200, [0, 0, 0, 255]);
    let out = render(
        base,
        &builtin_state("heart"),
        &RenderOptions {
            stickers: Some(&lib),
            ..RenderOptions::default()
        },
    )
    .unwrap();

    // Box center at (50, 50) for the default 100-unit box.
    let idx = ((50 * out.width() + 50) * 4) as usize;
    assert_eq!(&out.data()[idx..idx + 4], &[255, 0, 0, 255]);
}

#[test]
fn missing_builtin_degrades_to_empty_content() {
    let lib = MapLibrary(std::collections::BTreeMap::new());
    let base = solid(200, 200, [9, 9, 9, 255]);
    let out = render(
        Arc::clone(&base),
        &builtin_state("nope"),
        &RenderOptions {
            stickers: Some(&lib),
            ..RenderOptions::default()
        },
    )
    .unwrap();
    assert_eq!(out.data(), base.data());
}

#[test]
fn no_library_behaves_like_missing_key() {
    let base = solid(200, 200, [9, 9, 9, 255]);
    let out = render(
        Arc::clone(&base),
        &builtin_state("heart"),
        &RenderOptions::default(),
    )
    .unwrap();
    assert_eq!(out.data(), base.data());
}
