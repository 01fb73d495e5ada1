#![forbid(unsafe_code)]

//! Export renderer for layered photo edits: flattens a base photo, its
//! color adjustments and its text/shape/sticker/ink layers into one
//! premultiplied RGBA8 raster.

pub mod adjust;
mod blur_cpu;
mod compose;
mod composite_cpu;
pub mod constants;
pub mod core;
pub mod error;
pub mod model;
mod paint;
pub mod render;
mod text_layout;
mod transform;

pub use core::{IntRect, Raster, Rgba8, decode_image};
pub use error::{PhotoflatError, PhotoflatResult};
pub use model::EditorState;
pub use render::{RenderOptions, StickerLibrary, render};
