use std::sync::Arc;

use anyhow::Context;

use crate::error::{PhotoflatError, PhotoflatResult};

pub use kurbo::{Affine, BezPath, Point, Rect, Vec2};

/// A rectangular pixel grid in row-major premultiplied RGBA8.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Raster {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl Raster {
    pub fn new(width: u32, height: u32) -> PhotoflatResult<Self> {
        let len = (width as usize)
            .checked_mul(height as usize)
            .and_then(|v| v.checked_mul(4))
            .ok_or_else(|| PhotoflatError::validation("raster size overflow"))?;
        Ok(Self {
            width,
            height,
            data: vec![0u8; len],
        })
    }

    /// Wrap existing premultiplied RGBA8 bytes. Length must be width*height*4.
    pub fn from_premul_rgba8(width: u32, height: u32, data: Vec<u8>) -> PhotoflatResult<Self> {
        if data.len() != (width as usize) * (height as usize) * 4 {
            return Err(PhotoflatError::validation(
                "raster byte length must be width*height*4",
            ));
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    pub fn into_data(self) -> Vec<u8> {
        self.data
    }

    /// Copy out a sub-rectangle. Caller must pass a rect already validated
    /// against this raster's bounds.
    pub(crate) fn crop_to(&self, rect: IntRect) -> PhotoflatResult<Raster> {
        let w = rect.width() as usize;
        let h = rect.height() as usize;
        let mut out = Vec::with_capacity(w * h * 4);
        let stride = self.width as usize * 4;
        for row in 0..h {
            let y = rect.top as usize + row;
            let start = y * stride + rect.left as usize * 4;
            out.extend_from_slice(&self.data[start..start + w * 4]);
        }
        Raster::from_premul_rgba8(rect.width(), rect.height(), out)
    }
}

/// Straight (non-premultiplied) RGBA8 color as authored by the editor.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Rgba8 {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba8 {
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn opaque(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub fn with_alpha_mul(self, mul: f32) -> Self {
        let a = ((f32::from(self.a) * mul.clamp(0.0, 1.0)).round() as i32).clamp(0, 255) as u8;
        Self { a, ..self }
    }

    pub(crate) fn to_peniko(self) -> vello_cpu::peniko::Color {
        vello_cpu::peniko::Color::from_rgba8(self.r, self.g, self.b, self.a)
    }

    pub fn premultiplied(self) -> [u8; 4] {
        fn premul(c: u8, a: u8) -> u8 {
            ((u16::from(c) * u16::from(a) + 127) / 255) as u8
        }
        [
            premul(self.r, self.a),
            premul(self.g, self.a),
            premul(self.b, self.a),
            self.a,
        ]
    }
}

/// Integer crop rectangle in post-transform canvas pixels. Half-open on the
/// right/bottom edges.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct IntRect {
    pub left: u32,
    pub top: u32,
    pub right: u32,
    pub bottom: u32,
}

impl IntRect {
    pub fn new(left: u32, top: u32, right: u32, bottom: u32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    pub fn width(self) -> u32 {
        self.right.saturating_sub(self.left)
    }

    pub fn height(self) -> u32 {
        self.bottom.saturating_sub(self.top)
    }

    /// A crop is usable only when it is non-empty and lies fully inside the
    /// canvas. Invalid crops are skipped by the pipeline, not rejected as
    /// hard errors.
    pub fn validate_within(self, width: u32, height: u32) -> PhotoflatResult<()> {
        if self.left >= self.right || self.top >= self.bottom {
            return Err(PhotoflatError::validation("crop rectangle is empty"));
        }
        if self.right > width || self.bottom > height {
            return Err(PhotoflatError::validation(
                "crop rectangle exceeds canvas bounds",
            ));
        }
        Ok(())
    }
}

/// Decode an encoded image (png/jpeg/webp/...) into a premultiplied raster.
pub fn decode_image(bytes: &[u8]) -> PhotoflatResult<Raster> {
    let dyn_img = image::load_from_memory(bytes).context("decode image from memory")?;
    let rgba = dyn_img.to_rgba8();
    let (width, height) = rgba.dimensions();

    let mut data = rgba.into_raw();
    premultiply_rgba8_in_place(&mut data);
    Raster::from_premul_rgba8(width, height, data)
}

pub(crate) fn premultiply_rgba8_in_place(rgba: &mut [u8]) {
    for px in rgba.chunks_exact_mut(4) {
        let a = px[3] as u16;
        if a == 0 {
            px[0] = 0;
            px[1] = 0;
            px[2] = 0;
            continue;
        }
        px[0] = ((px[0] as u16 * a + 127) / 255) as u8;
        px[1] = ((px[1] as u16 * a + 127) / 255) as u8;
        px[2] = ((px[2] as u16 * a + 127) / 255) as u8;
    }
}

pub(crate) fn raster_to_pixmap(raster: &Raster) -> PhotoflatResult<vello_cpu::Pixmap> {
    premul_bytes_to_pixmap(raster.data(), raster.width(), raster.height())
}

pub(crate) fn premul_bytes_to_pixmap(
    rgba8_premul: &[u8],
    width: u32,
    height: u32,
) -> PhotoflatResult<vello_cpu::Pixmap> {
    let w: u16 = width
        .try_into()
        .map_err(|_| PhotoflatError::evaluation("raster width exceeds u16"))?;
    let h: u16 = height
        .try_into()
        .map_err(|_| PhotoflatError::evaluation("raster height exceeds u16"))?;
    if rgba8_premul.len() != width as usize * height as usize * 4 {
        return Err(PhotoflatError::evaluation("raster byte length mismatch"));
    }

    let mut may_have_opacities = false;
    let mut pixels = Vec::with_capacity(width as usize * height as usize);
    for px in rgba8_premul.chunks_exact(4) {
        let a = px[3];
        may_have_opacities |= a != 255;
        pixels.push(vello_cpu::peniko::color::PremulRgba8 {
            r: px[0],
            g: px[1],
            b: px[2],
            a,
        });
    }

    Ok(vello_cpu::Pixmap::from_parts_with_opacity(
        pixels,
        w,
        h,
        may_have_opacities,
    ))
}

pub(crate) fn pixmap_to_raster(pixmap: &vello_cpu::Pixmap) -> PhotoflatResult<Raster> {
    Raster::from_premul_rgba8(
        u32::from(pixmap.width()),
        u32::from(pixmap.height()),
        pixmap.data_as_u8_slice().to_vec(),
    )
}

pub(crate) fn raster_to_image_paint(raster: &Raster) -> PhotoflatResult<vello_cpu::Image> {
    let pixmap = raster_to_pixmap(raster)?;
    Ok(vello_cpu::Image {
        image: vello_cpu::ImageSource::Pixmap(Arc::new(pixmap)),
        sampler: vello_cpu::peniko::ImageSampler::default(),
    })
}

pub(crate) fn affine_to_cpu(a: Affine) -> vello_cpu::kurbo::Affine {
    vello_cpu::kurbo::Affine::new(a.as_coeffs())
}

pub(crate) fn bezpath_to_cpu(path: &BezPath) -> vello_cpu::kurbo::BezPath {
    use kurbo::PathEl;

    fn point_to_cpu(p: Point) -> vello_cpu::kurbo::Point {
        vello_cpu::kurbo::Point::new(p.x, p.y)
    }

    let mut out = vello_cpu::kurbo::BezPath::new();
    for &el in path.elements() {
        match el {
            PathEl::MoveTo(p) => out.move_to(point_to_cpu(p)),
            PathEl::LineTo(p) => out.line_to(point_to_cpu(p)),
            PathEl::QuadTo(p1, p2) => out.quad_to(point_to_cpu(p1), point_to_cpu(p2)),
            PathEl::CurveTo(p1, p2, p3) => {
                out.curve_to(point_to_cpu(p1), point_to_cpu(p2), point_to_cpu(p3));
            }
            PathEl::ClosePath => out.close_path(),
        }
    }
    out
}
