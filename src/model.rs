use std::sync::Arc;

use crate::{
    core::{Raster, Rgba8},
    error::{PhotoflatError, PhotoflatResult},
};

/// Immutable snapshot of the editable document. Produced and owned by the
/// surrounding editor; the renderer only reads it.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct EditorState {
    /// Additive brightness in [-1, 1]; 0 is neutral.
    pub brightness: f32,
    /// Multiplicative contrast factor; 1.0 is neutral.
    pub contrast: f32,
    /// Multiplicative saturation factor; 1.0 is neutral.
    pub saturation: f32,
    /// Hue rotation in degrees; 0 is neutral.
    pub hue: f32,
    /// Warm/cool shift in [-1, 1]; 0 is neutral.
    pub temperature: f32,
    /// Green/magenta shift in [-1, 1]; 0 is neutral.
    pub tint: f32,

    /// Whole-canvas rotation in degrees, applied after layers are baked in.
    pub rotation_angle: f64,
    pub flip_x: bool,
    pub flip_y: bool,

    pub texts: Vec<TextLayer>,
    pub shapes: Vec<ShapeLayer>,
    pub stickers: Vec<StickerLayer>,
    pub ink: Vec<InkAction>,
}

impl Default for EditorState {
    fn default() -> Self {
        Self {
            brightness: 0.0,
            contrast: 1.0,
            saturation: 1.0,
            hue: 0.0,
            temperature: 0.0,
            tint: 0.0,
            rotation_angle: 0.0,
            flip_x: false,
            flip_y: false,
            texts: Vec::new(),
            shapes: Vec::new(),
            stickers: Vec::new(),
            ink: Vec::new(),
        }
    }
}

/// Fields shared by every positioned layer variant.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct LayerCommon {
    pub id: u64,
    /// Top-left position in base-image pixel space.
    pub x: f64,
    pub y: f64,
    /// Uniform scale, >= 0.
    pub scale: f64,
    /// Rotation in degrees about the layer's pivot.
    pub rotation: f64,
    /// Paint-order key; lower paints first. Ties break by collection
    /// insertion order.
    pub z_index: i32,
    pub is_visible: bool,
    /// Layer opacity in [0, 1].
    pub opacity: f32,
}

impl Default for LayerCommon {
    fn default() -> Self {
        Self {
            id: 0,
            x: 0.0,
            y: 0.0,
            scale: 1.0,
            rotation: 0.0,
            z_index: 0,
            is_visible: true,
            opacity: 1.0,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum TextAlignment {
    #[default]
    Left,
    Center,
    Right,
    Justify,
}

#[derive(Clone, Copy, Debug, serde::Serialize, serde::Deserialize)]
pub struct TextOutline {
    pub color: Rgba8,
    pub width: f64,
}

#[derive(Clone, Copy, Debug, serde::Serialize, serde::Deserialize)]
pub struct TextShadow {
    pub blur_radius: f64,
    pub dx: f64,
    pub dy: f64,
    pub color: Rgba8,
}

#[derive(Clone, Copy, Debug, serde::Serialize, serde::Deserialize)]
pub struct NeonGlow {
    pub color: Rgba8,
    pub radius: f64,
}

#[derive(Clone, Copy, Debug, serde::Serialize, serde::Deserialize)]
pub struct TextBackground {
    pub color: Rgba8,
    pub opacity: f32,
    /// Padding ring between the content box and the background edge.
    pub padding: f64,
    pub corner_radius: f64,
}

#[derive(Clone, Copy, Debug, serde::Serialize, serde::Deserialize)]
pub struct MirrorReflection {
    pub opacity: f32,
    /// Extra gap between the text bottom edge and the reflected copy.
    pub offset: f64,
}

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct TextLayer {
    pub common: LayerCommon,
    pub text: String,
    pub font_family: String,
    pub font_size: f32,
    pub bold: bool,
    pub italic: bool,
    pub alignment: TextAlignment,
    pub color: Rgba8,
    /// Linear gradient fill spanning the layer width. Fewer than two colors
    /// degrades to a solid fill with `color`.
    pub gradient: Option<Vec<Rgba8>>,
    pub outline: Option<TextOutline>,
    pub shadow: Option<TextShadow>,
    pub glow: Option<NeonGlow>,
    /// RGB-split duplicate copies when set.
    pub glitch: bool,
    /// Soft blur applied to the finished text raster.
    pub blur_radius: Option<f64>,
    pub background: Option<TextBackground>,
    pub reflection: Option<MirrorReflection>,
    /// Perspective tilt approximated as shear, degrees.
    pub rotation_x: f64,
    pub rotation_y: f64,
    /// Layer-local width used for gradient span and wrapping/justify.
    pub layer_width: f64,
}

impl Default for TextLayer {
    fn default() -> Self {
        Self {
            common: LayerCommon::default(),
            text: String::new(),
            font_family: "sans-serif".to_string(),
            font_size: 24.0,
            bold: false,
            italic: false,
            alignment: TextAlignment::Left,
            color: Rgba8::opaque(255, 255, 255),
            gradient: None,
            outline: None,
            shadow: None,
            glow: None,
            glitch: false,
            blur_radius: None,
            background: None,
            reflection: None,
            rotation_x: 0.0,
            rotation_y: 0.0,
            layer_width: 0.0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum ShapeKind {
    Rectangle,
    Circle,
    Line,
    Triangle,
    Arrow,
    Star,
    Pentagon,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum StrokeStyle {
    #[default]
    Solid,
    Dashed,
    Dotted,
    LongDash,
    DashDot,
}

#[derive(Clone, Copy, Debug, serde::Serialize, serde::Deserialize)]
pub struct ShapeShadow {
    pub blur_radius: f64,
    pub dx: f64,
    pub dy: f64,
    pub color: Rgba8,
}

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct ShapeLayer {
    pub common: LayerCommon,
    pub kind: ShapeKind,
    /// Bounding box before scale and pivot are applied.
    pub width: f64,
    pub height: f64,
    pub filled: bool,
    pub stroke_width: f64,
    pub stroke_style: StrokeStyle,
    pub color: Rgba8,
    pub shadow: Option<ShapeShadow>,
}

impl Default for ShapeLayer {
    fn default() -> Self {
        Self {
            common: LayerCommon::default(),
            kind: ShapeKind::Rectangle,
            width: 100.0,
            height: 100.0,
            filled: true,
            stroke_width: 4.0,
            stroke_style: StrokeStyle::Solid,
            color: Rgba8::opaque(255, 255, 255),
            shadow: None,
        }
    }
}

/// Sticker content, in resolution order: a built-in library key, a literal
/// text/emoji string, or an image (pre-decoded raster or encoded bytes).
/// The first variant that resolves wins; failures degrade to empty content.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub enum StickerSource {
    Builtin(String),
    Text(String),
    Image(Arc<Raster>),
    Encoded(Vec<u8>),
}

#[derive(Clone, Copy, Debug, serde::Serialize, serde::Deserialize)]
pub struct StickerBorder {
    pub width: f64,
    pub color: Rgba8,
}

/// The full standard blend-mode set the sticker paint supports, plus the
/// destination-out operator the ink eraser uses.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum LayerBlend {
    #[default]
    Normal,
    Multiply,
    Screen,
    Overlay,
    Darken,
    Lighten,
    ColorDodge,
    ColorBurn,
    HardLight,
    SoftLight,
    Difference,
    Exclusion,
    Hue,
    Saturation,
    Color,
    Luminosity,
    DestOut,
}

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct StickerLayer {
    pub common: LayerCommon,
    pub source: StickerSource,
    pub flip_horizontal: bool,
    /// Independent axis scales on top of the uniform `common.scale`.
    pub scale_x: f64,
    pub scale_y: f64,
    pub border: Option<StickerBorder>,
    pub shadow: Option<ShapeShadow>,
    /// Source-atop color filter over the resolved content.
    pub tint: Option<Rgba8>,
    pub blend: LayerBlend,
}

impl Default for StickerLayer {
    fn default() -> Self {
        Self {
            common: LayerCommon::default(),
            source: StickerSource::Text(String::new()),
            flip_horizontal: false,
            scale_x: 1.0,
            scale_y: 1.0,
            border: None,
            shadow: None,
            tint: None,
            blend: LayerBlend::Normal,
        }
    }
}

/// Mutually-exclusive freehand stroke styles.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum InkStyle {
    #[default]
    Plain,
    BlurredGlow,
    Spray,
    Neon,
    Highlighter,
    Eraser,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum InkShapeKind {
    Line,
    Rectangle,
    Circle,
}

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct InkPath {
    pub id: u64,
    /// Ordered points in base-image pixel space.
    pub points: Vec<(f64, f64)>,
    pub color: Rgba8,
    pub stroke_width: f64,
    pub style: InkStyle,
    pub blend: LayerBlend,
}

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct InkShape {
    pub id: u64,
    pub kind: InkShapeKind,
    /// Absolute bounding coordinates; no pivot or scale logic applies.
    pub x0: f64,
    pub y0: f64,
    pub x1: f64,
    pub y1: f64,
    pub color: Rgba8,
    pub stroke_width: f64,
}

/// One drawing-tool action: a freehand path or a discrete shape primitive.
/// Ink always composites at z-index 0, beneath every other layer kind.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub enum InkAction {
    Path(InkPath),
    Shape(InkShape),
}

impl EditorState {
    /// Whether every gating color adjustment sits at its neutral default.
    /// Temperature/tint do not gate the fast path; the interactive editor
    /// keys it off the four primary sliders.
    pub fn adjustments_are_neutral(&self) -> bool {
        self.brightness == 0.0 && self.contrast == 1.0 && self.saturation == 1.0 && self.hue == 0.0
    }

    pub fn validate(&self) -> PhotoflatResult<()> {
        if !(-1.0..=1.0).contains(&self.brightness) {
            return Err(PhotoflatError::validation("brightness must be in [-1, 1]"));
        }
        if !(-1.0..=1.0).contains(&self.temperature) {
            return Err(PhotoflatError::validation("temperature must be in [-1, 1]"));
        }
        if !(-1.0..=1.0).contains(&self.tint) {
            return Err(PhotoflatError::validation("tint must be in [-1, 1]"));
        }
        if self.contrast < 0.0 || self.saturation < 0.0 {
            return Err(PhotoflatError::validation(
                "contrast and saturation factors must be >= 0",
            ));
        }

        for t in &self.texts {
            t.common.validate("text")?;
            if !t.font_size.is_finite() || t.font_size <= 0.0 {
                return Err(PhotoflatError::validation(format!(
                    "text layer {} font_size must be finite and > 0",
                    t.common.id
                )));
            }
        }
        for s in &self.shapes {
            s.common.validate("shape")?;
            if s.width < 0.0 || s.height < 0.0 {
                return Err(PhotoflatError::validation(format!(
                    "shape layer {} width/height must be >= 0",
                    s.common.id
                )));
            }
        }
        for s in &self.stickers {
            s.common.validate("sticker")?;
            if s.scale_x < 0.0 || s.scale_y < 0.0 {
                return Err(PhotoflatError::validation(format!(
                    "sticker layer {} scale_x/scale_y must be >= 0",
                    s.common.id
                )));
            }
        }
        for a in &self.ink {
            if let InkAction::Path(p) = a
                && p.stroke_width <= 0.0
            {
                return Err(PhotoflatError::validation(format!(
                    "ink path {} stroke_width must be > 0",
                    p.id
                )));
            }
        }
        Ok(())
    }
}

impl LayerCommon {
    fn validate(&self, kind: &str) -> PhotoflatResult<()> {
        if self.scale < 0.0 {
            return Err(PhotoflatError::validation(format!(
                "{kind} layer {} scale must be >= 0",
                self.id
            )));
        }
        if !(0.0..=1.0).contains(&self.opacity) {
            return Err(PhotoflatError::validation(format!(
                "{kind} layer {} opacity must be in [0, 1]",
                self.id
            )));
        }
        Ok(())
    }
}
