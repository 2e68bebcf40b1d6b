//! Rasterization: turning a markup subtree into a pixel canvas.
//!
//! [`Rasterizer`] is the capability the exporters depend on. The built-in
//! [`raster::BlockRasterizer`] lays text out on a fixed glyph grid; it is
//! deterministic but not typographically faithful, so callers only rely on
//! canvas dimensions and coarse content, never exact pixels.

pub mod layout;
pub mod paint;
pub mod raster;

use crate::{Error, Result};
use base64::Engine as _;

pub use raster::BlockRasterizer;

pub const PNG_DATA_URL_PREFIX: &str = "data:image/png;base64,";

/// Browsers refuse canvases beyond these limits.
pub const MAX_CANVAS_DIMENSION: u32 = 32_767;
pub const MAX_CANVAS_AREA: u64 = 268_435_456;

/// An 8-bit RGBA colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgba(pub u8, pub u8, pub u8, pub u8);

impl Rgba {
    pub const TRANSPARENT: Rgba = Rgba(0, 0, 0, 0);

    /// Parse `#rgb` or `#rrggbb`. `transparent` maps to fully transparent.
    pub fn parse(value: &str) -> Option<Self> {
        let v = value.trim();
        if v.eq_ignore_ascii_case("transparent") {
            return Some(Self::TRANSPARENT);
        }
        let hex = v.strip_prefix('#')?;
        let channel = |s: &str| u8::from_str_radix(s, 16).ok();
        match hex.len() {
            3 => {
                let mut it = hex.chars().map(|c| channel(&format!("{}{}", c, c)));
                Some(Rgba(it.next()??, it.next()??, it.next()??, 255))
            }
            6 => Some(Rgba(
                channel(&hex[0..2])?,
                channel(&hex[2..4])?,
                channel(&hex[4..6])?,
                255,
            )),
            _ => None,
        }
    }

    /// Perceived luminance below the midpoint. Transparent counts as light.
    pub fn is_dark(&self) -> bool {
        if self.3 == 0 {
            return false;
        }
        let lum = 0.299 * self.0 as f32 + 0.587 * self.1 as f32 + 0.114 * self.2 as f32;
        lum < 128.0
    }

    /// Source-over blend of `self` on top of `dst`.
    pub fn over(self, dst: Rgba) -> Rgba {
        let a = self.3 as u32;
        if a == 255 {
            return self;
        }
        if a == 0 {
            return dst;
        }
        let inv = 255 - a;
        let mix = |s: u8, d: u8| ((s as u32 * a + d as u32 * inv) / 255) as u8;
        let out_a = (a + dst.3 as u32 * inv / 255).min(255) as u8;
        Rgba(mix(self.0, dst.0), mix(self.1, dst.1), mix(self.2, dst.2), out_a)
    }
}

/// Options understood by a rasterizer, mirroring a DOM-to-canvas option bag.
#[derive(Debug, Clone, PartialEq)]
pub struct RasterOptions {
    /// Device pixel multiplier applied to every logical dimension
    pub scale: f32,
    /// Whether cross-origin images may be loaded (kept for parity with browser backends)
    pub use_cors: bool,
    /// Canvas fill under the content; `None` leaves it transparent
    pub background: Option<Rgba>,
    /// Fixed frame width in logical px
    pub width: Option<u32>,
    /// Fixed frame height in logical px; content height when unset
    pub height: Option<u32>,
    /// Layout viewport width in logical px when no width is fixed
    pub window_width: Option<u32>,
}

impl Default for RasterOptions {
    fn default() -> Self {
        Self {
            scale: 2.0,
            use_cors: true,
            background: None,
            width: None,
            height: None,
            window_width: None,
        }
    }
}

/// A raster surface produced by a [`Rasterizer`].
#[derive(Debug, Clone, PartialEq)]
pub struct Canvas {
    pub width: u32,
    pub height: u32,
    pixels: Vec<u8>,
}

impl Canvas {
    pub fn new(width: u32, height: u32, fill: Rgba) -> Self {
        let mut pixels = Vec::with_capacity(width as usize * height as usize * 4);
        for _ in 0..(width as usize * height as usize) {
            pixels.extend_from_slice(&[fill.0, fill.1, fill.2, fill.3]);
        }
        Self { width, height, pixels }
    }

    /// RGBA bytes, row-major.
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgba> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = (y as usize * self.width as usize + x as usize) * 4;
        Some(Rgba(self.pixels[i], self.pixels[i + 1], self.pixels[i + 2], self.pixels[i + 3]))
    }

    /// Copy of rows `top..bottom`, clamped to the canvas.
    pub fn crop_rows(&self, top: u32, bottom: u32) -> Canvas {
        let bottom = bottom.min(self.height);
        let top = top.min(bottom);
        let stride = self.width as usize * 4;
        Self {
            width: self.width,
            height: bottom - top,
            pixels: self.pixels[top as usize * stride..bottom as usize * stride].to_vec(),
        }
    }

    /// Blend a rectangle onto the canvas, clipped to its bounds.
    pub fn fill_rect(&mut self, x: i64, y: i64, w: i64, h: i64, color: Rgba) {
        let x0 = x.max(0) as u32;
        let y0 = y.max(0) as u32;
        let x1 = (x + w).clamp(0, self.width as i64) as u32;
        let y1 = (y + h).clamp(0, self.height as i64) as u32;
        for py in y0..y1 {
            for px in x0..x1 {
                let i = (py as usize * self.width as usize + px as usize) * 4;
                let dst = Rgba(self.pixels[i], self.pixels[i + 1], self.pixels[i + 2], self.pixels[i + 3]);
                let out = color.over(dst);
                self.pixels[i..i + 4].copy_from_slice(&[out.0, out.1, out.2, out.3]);
            }
        }
    }

    /// Opaque RGB bytes with transparent areas composited onto `background`.
    pub fn to_rgb(&self, background: Rgba) -> Vec<u8> {
        let bg = Rgba(background.0, background.1, background.2, 255);
        let mut out = Vec::with_capacity(self.width as usize * self.height as usize * 3);
        for px in self.pixels.chunks_exact(4) {
            let c = Rgba(px[0], px[1], px[2], px[3]).over(bg);
            out.extend_from_slice(&[c.0, c.1, c.2]);
        }
        out
    }

    pub fn to_png(&self) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        {
            let mut encoder = png::Encoder::new(&mut buf, self.width, self.height);
            encoder.set_color(png::ColorType::Rgba);
            encoder.set_depth(png::BitDepth::Eight);
            let mut writer = encoder
                .write_header()
                .map_err(|e| Error::RasterizationError(format!("PNG header: {}", e)))?;
            writer
                .write_image_data(&self.pixels)
                .map_err(|e| Error::RasterizationError(format!("PNG data: {}", e)))?;
            writer
                .finish()
                .map_err(|e| Error::RasterizationError(format!("PNG finish: {}", e)))?;
        }
        Ok(buf)
    }

    pub fn to_data_url(&self) -> Result<String> {
        let png = self.to_png()?;
        Ok(format!(
            "{}{}",
            PNG_DATA_URL_PREFIX,
            base64::engine::general_purpose::STANDARD.encode(png)
        ))
    }
}

/// The DOM-to-canvas capability.
pub trait Rasterizer: Send + Sync {
    /// Rasterize `markup` (a single root element and its subtree).
    fn render(&self, markup: &str, options: &RasterOptions) -> Result<Canvas>;
}
