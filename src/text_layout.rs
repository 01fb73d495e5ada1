//! Parley-backed shaping and layout for text layers and text stickers.

use crate::{
    core::Rgba8,
    error::{PhotoflatError, PhotoflatResult},
    model::TextAlignment,
};

/// RGBA8 brush color carried through Parley layout.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct TextBrushRgba8 {
    pub(crate) r: u8,
    pub(crate) g: u8,
    pub(crate) b: u8,
    pub(crate) a: u8,
}

impl From<Rgba8> for TextBrushRgba8 {
    fn from(c: Rgba8) -> Self {
        Self {
            r: c.r,
            g: c.g,
            b: c.b,
            a: c.a,
        }
    }
}

#[derive(Clone, Debug)]
pub(crate) struct TextSpec<'a> {
    pub(crate) family: &'a str,
    pub(crate) size_px: f32,
    pub(crate) bold: bool,
    pub(crate) italic: bool,
    pub(crate) alignment: TextAlignment,
    /// Wrap and align within this width when set.
    pub(crate) max_width_px: Option<f32>,
}

/// Measured extents of a finished layout. Height is taken from line
/// metrics (ascent + descent per line), matching how the interactive
/// text box sizes itself.
#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct TextMetrics {
    pub(crate) width: f64,
    pub(crate) height: f64,
}

/// Stateful helper owning the Parley font and layout contexts.
pub(crate) struct TextLayoutEngine {
    font_ctx: parley::FontContext,
    layout_ctx: parley::LayoutContext<TextBrushRgba8>,
}

impl Default for TextLayoutEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl TextLayoutEngine {
    pub(crate) fn new() -> Self {
        Self {
            font_ctx: parley::FontContext::default(),
            layout_ctx: parley::LayoutContext::new(),
        }
    }

    /// Shape and lay out text with a single uniform style.
    pub(crate) fn layout(
        &mut self,
        text: &str,
        spec: &TextSpec<'_>,
        brush: TextBrushRgba8,
    ) -> PhotoflatResult<parley::Layout<TextBrushRgba8>> {
        if !spec.size_px.is_finite() || spec.size_px <= 0.0 {
            return Err(PhotoflatError::validation(
                "text size_px must be finite and > 0",
            ));
        }

        let mut builder = self
            .layout_ctx
            .ranged_builder(&mut self.font_ctx, text, 1.0, true);
        builder.push_default(parley::style::StyleProperty::FontStack(
            parley::style::FontStack::Source(std::borrow::Cow::Owned(spec.family.to_string())),
        ));
        builder.push_default(parley::style::StyleProperty::FontSize(spec.size_px));
        builder.push_default(parley::style::StyleProperty::Brush(brush));
        if spec.bold {
            builder.push_default(parley::style::StyleProperty::FontWeight(
                parley::style::FontWeight::BOLD,
            ));
        }
        if spec.italic {
            builder.push_default(parley::style::StyleProperty::FontStyle(
                parley::style::FontStyle::Italic,
            ));
        }

        let mut layout: parley::Layout<TextBrushRgba8> = builder.build(text);
        layout.break_all_lines(spec.max_width_px);
        let alignment = match spec.alignment {
            TextAlignment::Left => parley::Alignment::Start,
            TextAlignment::Center => parley::Alignment::Center,
            TextAlignment::Right => parley::Alignment::End,
            TextAlignment::Justify => parley::Alignment::Justify,
        };
        layout.align(
            spec.max_width_px,
            alignment,
            parley::AlignmentOptions::default(),
        );

        Ok(layout)
    }

    pub(crate) fn measure(layout: &parley::Layout<TextBrushRgba8>) -> TextMetrics {
        let mut height = 0.0f64;
        for line in layout.lines() {
            let m = line.metrics();
            height += f64::from(m.ascent) + f64::from(m.descent);
        }
        TextMetrics {
            width: f64::from(layout.width()),
            height,
        }
    }
}
