//! Built-in rasterizer: layout, paint, then fill a pixel buffer.

use crate::rendering::layout::{layout_markup, GLYPH};
use crate::rendering::paint::{build_display_list, line_advance, PaintCommand};
use crate::rendering::{Canvas, RasterOptions, Rasterizer, Rgba, MAX_CANVAS_AREA, MAX_CANVAS_DIMENSION};
use crate::{Error, Result};

/// Stroke width of card borders, in logical px.
const BORDER: u32 = 1;

/// Deterministic glyph-grid rasterizer.
///
/// Each non-whitespace character becomes a filled cell slightly smaller than
/// its `GLYPH` box, so text shows up as ink blocks in the right places and
/// sizes without needing fonts.
#[derive(Debug, Clone, Default)]
pub struct BlockRasterizer;

impl BlockRasterizer {
    pub fn new() -> Self {
        BlockRasterizer
    }
}

impl Rasterizer for BlockRasterizer {
    fn render(&self, markup: &str, options: &RasterOptions) -> Result<Canvas> {
        if !(options.scale.is_finite() && options.scale > 0.0) {
            return Err(Error::RasterizationError(format!("invalid scale {}", options.scale)));
        }
        let layout = layout_markup(markup, options)
            .ok_or_else(|| Error::RasterizationError("markup has no element to render".into()))?;

        let s = options.scale;
        let width = (layout.frame.width as f32 * s).ceil() as u64;
        let height = (layout.height() as f32 * s).ceil() as u64;
        if width == 0 || height == 0 {
            return Err(Error::RasterizationError(format!("empty canvas {}x{}", width, height)));
        }
        if width > MAX_CANVAS_DIMENSION as u64
            || height > MAX_CANVAS_DIMENSION as u64
            || width * height > MAX_CANVAS_AREA
        {
            return Err(Error::RasterizationError(format!(
                "canvas {}x{} exceeds the maximum canvas size",
                width, height
            )));
        }

        let mut canvas = Canvas::new(width as u32, height as u32, Rgba::TRANSPARENT);
        let px = |v: i64| (v as f32 * s).round() as i64;

        for cmd in build_display_list(&layout) {
            match cmd {
                PaintCommand::SolidRect { x, y, width, height, rgba } => {
                    canvas.fill_rect(px(x as i64), px(y as i64), px(width as i64), px(height as i64), rgba);
                }
                PaintCommand::StrokeRect { x, y, width, height, rgba } => {
                    let (x, y, w, h, b) = (px(x as i64), px(y as i64), px(width as i64), px(height as i64), px(BORDER as i64).max(1));
                    canvas.fill_rect(x, y, w, b, rgba);
                    canvas.fill_rect(x, y + h - b, w, b, rgba);
                    canvas.fill_rect(x, y, b, h, rgba);
                    canvas.fill_rect(x + w - b, y, b, h, rgba);
                }
                PaintCommand::Text { x, y, lines, scale, rgba } => {
                    let cell = (GLYPH * scale) as i64;
                    let ink = cell - scale as i64 * 2;
                    for (row, line) in lines.iter().enumerate() {
                        let ly = y as i64 + row as i64 * line_advance(scale) as i64;
                        for (col, ch) in line.chars().enumerate() {
                            if ch.is_whitespace() {
                                continue;
                            }
                            let gx = x as i64 + col as i64 * cell;
                            canvas.fill_rect(px(gx + scale as i64), px(ly + scale as i64), px(ink), px(ink), rgba);
                        }
                    }
                }
            }
        }

        log::debug!("Rasterized {}x{} canvas ({} layout nodes)", canvas.width, canvas.height, layout.nodes.len());
        Ok(canvas)
    }
}
