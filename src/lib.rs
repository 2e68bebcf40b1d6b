//! Explainer export pipeline
//!
//! Turns a rendered topic explanation into downloadable artifacts: a
//! standalone HTML snapshot, one full-height PNG, a paginated A4 PDF, and a
//! batch of 3:4 per-section image cards packaged as a ZIP archive.
//!
//! # Features
//!
//! - **Capability-based**: rasterization, PDF assembly and archiving are
//!   traits held in [`Capabilities`]; a missing capability is a reportable
//!   error, not a panic
//! - **Scoped mutation**: style overrides and off-screen staging containers
//!   are RAII guards, released on every exit path
//! - **Feature-gated backends**: `pdf` (printpdf) and `archive` (zip)
//!
//! # Example
//!
//! ```no_run
//! use explainer_export::{ExportConfig, HtmlCapture, Theme};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let exporter = explainer_export::new_exporter(ExportConfig::default())?;
//! let capture = HtmlCapture::parse(r#"<div><div class="text-center"><h1>Hi</h1></div>
//!     <div class="explanation-section-card"><p>One</p></div></div>"#)?;
//! let slices = exporter.create_slices(&capture, Theme::Light)?;
//! if let Some(zip) = exporter.package_slices(&slices, "Quantum Computing")? {
//!     println!("{} ({} bytes)", zip.filename, zip.bytes.len());
//! }
//! # Ok(())
//! # }
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;

pub mod error;
pub use error::{Error, Result};

pub mod capture;
pub mod document;
pub mod download;
pub mod export;
pub mod present;
pub mod rendering;

// Async-friendly export API (worker-thread backed)
pub mod async_api;

pub use async_api::ExportService;
pub use capture::{HtmlCapture, NodeHandle, RenderCapture};
pub use document::ExplanationDocument;
pub use export::archive::ArchiveBackend;
pub use export::pdf::PdfBackend;
pub use export::{slugify, Artifact, Exporter, FileNames, SliceImage};
pub use rendering::{Canvas, RasterOptions, Rasterizer, Rgba};

/// Light or dark page theme, read at export time and passed explicitly.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn is_dark(self) -> bool {
        self == Theme::Dark
    }

    /// Class placed on the document root (or a staging container).
    pub fn class(self) -> &'static str {
        match self {
            Theme::Light => "",
            Theme::Dark => "dark",
        }
    }
}

/// Configuration for the export pipeline
///
/// Defaults reproduce the live page: scale 2, 450×600 slices, A4 portrait
/// pages, the `text-center` header marker and the
/// `explanation-section-card` section marker.
///
/// # Examples
///
/// ```
/// let cfg = explainer_export::ExportConfig::default();
/// assert_eq!(cfg.slice_width * 4, cfg.slice_height * 3);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Device pixel multiplier for every rasterization
    pub scale: f32,
    /// Logical width of a slice card
    pub slice_width: u32,
    /// Logical height of a slice card (3:4 with `slice_width`)
    pub slice_height: u32,
    /// Layout viewport width for full-subtree rasterization
    pub window_width: u32,
    /// PDF page width in millimetres
    pub page_width_mm: f64,
    /// PDF page height in millimetres
    pub page_height_mm: f64,
    /// Selector of the header region cloned into the first slice
    pub header_selector: String,
    /// Selector of the repeated section cards
    pub section_selector: String,
    /// Canvas background in the light theme
    pub light_background: String,
    /// Canvas background in the dark theme
    pub dark_background: String,
    /// Forwarded to the rasterizer
    pub use_cors: bool,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            scale: 2.0,
            slice_width: 450,
            slice_height: 600,
            window_width: 896,
            page_width_mm: 210.0,
            page_height_mm: 297.0,
            header_selector: ".text-center".to_string(),
            section_selector: ".explanation-section-card".to_string(),
            light_background: "#fffdfa".to_string(),
            dark_background: "#1e293b".to_string(),
            use_cors: true,
        }
    }
}

impl ExportConfig {
    /// Load a JSON config; missing fields take their defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        let cfg: ExportConfig = serde_json::from_str(&raw)
            .map_err(|e| Error::ConfigError(format!("{}: {}", path.as_ref().display(), e)))?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.scale.is_finite() && self.scale > 0.0) {
            return Err(Error::ConfigError(format!("scale must be positive, got {}", self.scale)));
        }
        if self.slice_width == 0 || u64::from(self.slice_width) * 4 != u64::from(self.slice_height) * 3 {
            return Err(Error::ConfigError(format!(
                "slice frame {}x{} is not 3:4",
                self.slice_width, self.slice_height
            )));
        }
        if self.window_width == 0 {
            return Err(Error::ConfigError("window_width must be non-zero".into()));
        }
        if !(self.page_width_mm > 0.0 && self.page_height_mm > 0.0) {
            return Err(Error::ConfigError("page dimensions must be positive".into()));
        }
        if self.header_selector.trim().is_empty() || self.section_selector.trim().is_empty() {
            return Err(Error::ConfigError("marker selectors must not be empty".into()));
        }
        self.background(Theme::Light)?;
        self.background(Theme::Dark)?;
        Ok(())
    }

    /// Canvas background for `theme`.
    pub fn background(&self, theme: Theme) -> Result<Rgba> {
        let raw = match theme {
            Theme::Light => &self.light_background,
            Theme::Dark => &self.dark_background,
        };
        Rgba::parse(raw).ok_or_else(|| Error::ConfigError(format!("unparseable background colour {:?}", raw)))
    }

    /// The background colour string for `theme`, as written into markup.
    pub fn background_css(&self, theme: Theme) -> &str {
        match theme {
            Theme::Light => &self.light_background,
            Theme::Dark => &self.dark_background,
        }
    }
}

/// The external capabilities the exporters depend on.
///
/// Each is optional: exporters check for what they need before touching the
/// capture and fail with `Error::CapabilityUnavailable` when it is absent.
#[derive(Clone, Default)]
pub struct Capabilities {
    rasterizer: Option<Arc<dyn Rasterizer>>,
    pdf: Option<Arc<dyn PdfBackend>>,
    archive: Option<Arc<dyn ArchiveBackend>>,
}

impl Capabilities {
    /// No capabilities at all.
    pub fn none() -> Self {
        Self::default()
    }

    /// The built-in backends compiled into this crate.
    pub fn builtin() -> Self {
        let caps = Self::none().with_rasterizer(Arc::new(rendering::BlockRasterizer::new()));
        #[cfg(feature = "pdf")]
        let caps = caps.with_pdf(Arc::new(export::pdf::PrintPdfBackend::new()));
        #[cfg(feature = "archive")]
        let caps = caps.with_archive(Arc::new(export::archive::ZipArchiveBackend::new()));
        caps
    }

    pub fn with_rasterizer(mut self, r: Arc<dyn Rasterizer>) -> Self {
        self.rasterizer = Some(r);
        self
    }

    pub fn with_pdf(mut self, p: Arc<dyn PdfBackend>) -> Self {
        self.pdf = Some(p);
        self
    }

    pub fn with_archive(mut self, a: Arc<dyn ArchiveBackend>) -> Self {
        self.archive = Some(a);
        self
    }

    pub fn rasterizer(&self) -> Result<&dyn Rasterizer> {
        self.rasterizer.as_deref().ok_or_else(|| unavailable("rasterizer"))
    }

    pub fn pdf(&self) -> Result<&dyn PdfBackend> {
        self.pdf.as_deref().ok_or_else(|| unavailable("pdf"))
    }

    pub fn archive(&self) -> Result<&dyn ArchiveBackend> {
        self.archive.as_deref().ok_or_else(|| unavailable("archive"))
    }
}

fn unavailable(what: &str) -> Error {
    log::warn!("{} capability is not available", what);
    Error::CapabilityUnavailable(what.to_string())
}

/// Create an exporter over the built-in capabilities.
pub fn new_exporter(config: ExportConfig) -> Result<Exporter> {
    config.validate()?;
    Ok(Exporter::new(config, Capabilities::builtin()))
}
