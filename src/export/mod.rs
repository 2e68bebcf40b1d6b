//! The export components and the [`Exporter`] facade that wires them to a
//! configuration and a set of capabilities.
//!
//! Components are siblings: each borrows the capture for one call and shares
//! nothing with the others except the topic (for filenames) and the theme
//! (for backgrounds).

pub mod archive;
pub mod image;
pub mod pdf;
pub mod slices;
pub mod snapshot;
pub mod staging;

use crate::capture::RenderCapture;
use crate::document::ExplanationDocument;
use crate::download::DownloadSink;
use crate::{Capabilities, ExportConfig, Result, Theme};
use std::path::PathBuf;

pub use slices::SliceImage;

const FALLBACK_SLUG: &str = "explanation";

/// Filename stem for a topic: whitespace runs become a single `_`, leading
/// and trailing whitespace is dropped, letters are lowercased. Non-ASCII
/// characters pass through unchanged.
pub fn slugify(topic: &str) -> String {
    let slug = topic.split_whitespace().collect::<Vec<_>>().join("_").to_lowercase();
    if slug.is_empty() {
        FALLBACK_SLUG.to_string()
    } else {
        slug
    }
}

/// Every artifact filename derived from one topic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileNames {
    slug: String,
}

impl FileNames {
    pub fn new(topic: &str) -> Self {
        Self { slug: slugify(topic) }
    }

    pub fn slug(&self) -> &str {
        &self.slug
    }

    pub fn html(&self) -> String {
        format!("{}_explanation.html", self.slug)
    }

    pub fn full_png(&self) -> String {
        format!("{}_explanation_full.png", self.slug)
    }

    pub fn pdf(&self) -> String {
        format!("{}_explanation.pdf", self.slug)
    }

    pub fn zip(&self) -> String {
        format!("{}_explanation.zip", self.slug)
    }

    /// Name of slice `n` (1-indexed).
    pub fn part(&self, n: usize) -> String {
        format!("{}_part{}.png", self.slug, n)
    }
}

/// A produced file, ready to hand to a download sink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub filename: String,
    pub mime: &'static str,
    pub bytes: Vec<u8>,
}

/// Runs the export components against one configuration and capability set.
#[derive(Clone)]
pub struct Exporter {
    config: ExportConfig,
    capabilities: Capabilities,
}

impl Exporter {
    pub fn new(config: ExportConfig, capabilities: Capabilities) -> Self {
        Self { config, capabilities }
    }

    pub fn config(&self) -> &ExportConfig {
        &self.config
    }

    pub fn capabilities(&self) -> &Capabilities {
        &self.capabilities
    }

    /// Standalone HTML snapshot. `Ok(None)` when there is no document yet.
    pub fn export_html(
        &self,
        capture: &dyn RenderCapture,
        document: Option<&ExplanationDocument>,
        topic: &str,
        theme: Theme,
    ) -> Result<Option<Artifact>> {
        Ok(document.map(|doc| snapshot::export_html(capture, doc, topic, theme)))
    }

    /// The whole explanation as one PNG.
    pub fn export_image(&self, capture: &dyn RenderCapture, topic: &str, theme: Theme) -> Result<Artifact> {
        image::export_full_image(capture, &self.capabilities, &self.config, topic, theme)
    }

    /// The whole explanation as a paginated A4 PDF.
    pub fn export_pdf(&self, capture: &dyn RenderCapture, topic: &str, theme: Theme) -> Result<Artifact> {
        pdf::export_pdf(capture, &self.capabilities, &self.config, topic, theme)
    }

    /// One 3:4 image per section card, in document order.
    pub fn create_slices(&self, capture: &dyn RenderCapture, theme: Theme) -> Result<Vec<SliceImage>> {
        slices::create_slices(capture, &self.capabilities, &self.config, theme)
    }

    /// Bundle slices into a ZIP. `Ok(None)` for an empty batch or topic.
    pub fn package_slices(&self, slices: &[SliceImage], topic: &str) -> Result<Option<Artifact>> {
        archive::package_slices(&self.capabilities, slices, topic)
    }

    /// Each slice as its own PNG artifact, named `<slug>_part<N>.png`.
    pub fn slice_artifacts(&self, slices: &[SliceImage], topic: &str) -> Result<Vec<Artifact>> {
        let names = FileNames::new(topic);
        slices
            .iter()
            .enumerate()
            .map(|(i, s)| {
                Ok(Artifact {
                    filename: names.part(i + 1),
                    mime: "image/png",
                    bytes: s.decode()?,
                })
            })
            .collect()
    }

    /// Deliver every slice as its own file.
    pub fn download_slices(
        &self,
        slices: &[SliceImage],
        topic: &str,
        sink: &dyn DownloadSink,
    ) -> Result<Vec<PathBuf>> {
        self.slice_artifacts(slices, topic)?
            .iter()
            .map(|a| sink.deliver(a))
            .collect()
    }
}
