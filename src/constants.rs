//! The single table of UI layout constants shared by the interactive
//! preview and this export renderer. Box sizing in the app's editor is
//! computed by its layout engine; the renderer re-derives the same numbers
//! from these values, so they must not drift.

/// Margin reserved around text content for selection/drag handles,
/// in logical UI units. Counted into the outer box even though invisible.
pub const HANDLE_PADDING: f64 = 16.0;

/// Minimum text content width in logical UI units. Empty or very thin text
/// still reserves this much so the box stays selectable.
pub const TEXT_MIN_CONTENT_WIDTH: f64 = 48.0;

/// Default corner radius for the text background fill, logical units.
pub const TEXT_BACKGROUND_CORNER_RADIUS: f64 = 8.0;

/// Horizontal offset of the RGB-split glitch duplicates, in pixels.
pub const GLITCH_OFFSET: f64 = 3.0;

/// Alpha multiplier applied to each glitch duplicate.
pub const GLITCH_ALPHA: f32 = 0.55;

/// Every sticker is authored at this logical box size (the UI's default
/// "100 density-independent units" square).
pub const STICKER_BASE_SIZE: f64 = 100.0;

/// Text/emoji sticker content is fit-scaled to this fraction of the box to
/// emulate the smaller glyph-relative size the UI shows.
pub const STICKER_TEXT_FIT_FRACTION: f64 = 0.64;

/// Font size used to rasterize text sticker content before fit-scaling.
pub const STICKER_TEXT_FONT_SIZE: f32 = 64.0;

/// Inner radius of the 10-vertex star, as a fraction of the outer radius
/// (golden-ratio five-point star).
pub const STAR_INNER_RADIUS_RATIO: f64 = 0.382;

/// Arrow polygon proportions relative to the bounding box: the shaft spans
/// this fraction of the width and of the height; the head uses the rest.
pub const ARROW_SHAFT_WIDTH_FRACTION: f64 = 0.4;
pub const ARROW_SHAFT_LENGTH_FRACTION: f64 = 0.5;

/// On/off pixel lengths per named stroke dash style.
pub const DASH_PATTERN_DASHED: [f64; 2] = [12.0, 8.0];
pub const DASH_PATTERN_DOTTED: [f64; 2] = [2.0, 6.0];
pub const DASH_PATTERN_LONG_DASH: [f64; 2] = [24.0, 10.0];
pub const DASH_PATTERN_DASH_DOT: [f64; 4] = [12.0, 6.0, 2.0, 6.0];

/// Neon strokes paint a pure-white core at this fraction of the base width.
pub const NEON_CORE_WIDTH_RATIO: f64 = 1.0 / 3.0;

/// Width multipliers and alpha multipliers for the three concentric passes
/// of the blur/glow ink style, ordered wide-faint to narrow-dense.
pub const GLOW_PASS_WIDTH_RATIOS: [f64; 3] = [2.4, 1.6, 1.0];
pub const GLOW_PASS_ALPHAS: [f32; 3] = [0.25, 0.5, 1.0];

/// Arc-length step between spray stamps, as a multiple of the stroke width.
pub const SPRAY_STEP_RATIO: f64 = 0.9;

/// Maximum perpendicular jitter of a spray stamp, as a multiple of width.
pub const SPRAY_JITTER_RATIO: f64 = 1.4;

/// Dot radius of a single spray stamp, as a multiple of width.
pub const SPRAY_DOT_RATIO: f64 = 0.16;

/// Full-range channel shift (out of 255) applied by temperature and tint
/// at their +/-1 extremes.
pub const TEMPERATURE_MAX_SHIFT: f32 = 30.0;
pub const TINT_MAX_SHIFT: f32 = 30.0;
