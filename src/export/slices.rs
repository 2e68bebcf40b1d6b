//! Per-section 3:4 image cards.

use crate::capture::RenderCapture;
use crate::export::staging::StagingContainer;
use crate::rendering::{RasterOptions, Rasterizer, PNG_DATA_URL_PREFIX};
use crate::{Capabilities, Error, ExportConfig, Result, Theme};
use base64::Engine as _;

/// One rasterized slice as a `data:image/png;base64,...` string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SliceImage(String);

impl SliceImage {
    pub fn from_data_url(url: impl Into<String>) -> Self {
        SliceImage(url.into())
    }

    pub fn from_canvas(canvas: &crate::rendering::Canvas) -> Result<Self> {
        Ok(SliceImage(canvas.to_data_url()?))
    }

    pub fn as_data_url(&self) -> &str {
        &self.0
    }

    /// Everything after the first comma of the data URL.
    pub fn payload(&self) -> &str {
        match self.0.split_once(',') {
            Some((_, data)) => data,
            None => &self.0,
        }
    }

    pub fn decode(&self) -> Result<Vec<u8>> {
        base64::engine::general_purpose::STANDARD
            .decode(self.payload())
            .map_err(|e| Error::PackagingError(format!("slice is not valid base64: {}", e)))
    }

    pub fn is_png(&self) -> bool {
        self.0.starts_with(PNG_DATA_URL_PREFIX)
    }
}

/// Rasterize every section card in document order, one at a time.
///
/// The header goes into the first slice only; later slices get extra top
/// padding instead. Any failure aborts the whole batch, and no staging
/// container outlives the call.
pub fn create_slices(
    capture: &dyn RenderCapture,
    capabilities: &Capabilities,
    config: &ExportConfig,
    theme: Theme,
) -> Result<Vec<SliceImage>> {
    let rasterizer = capabilities.rasterizer()?;

    let header = capture.find_header(&config.header_selector)?;
    let sections = capture.find_sections(&config.section_selector)?;
    if sections.is_empty() {
        log::warn!("no section cards matched {:?}", config.section_selector);
        return Err(Error::ContentNotFound(format!(
            "no elements match {:?}",
            config.section_selector
        )));
    }

    let options = RasterOptions {
        scale: config.scale,
        use_cors: config.use_cors,
        background: None,
        width: Some(config.slice_width),
        height: Some(config.slice_height),
        window_width: Some(config.slice_width),
    };

    let mut slices = Vec::with_capacity(sections.len());
    for (i, section) in sections.into_iter().enumerate() {
        let mut container = StagingContainer::new(config, theme);
        match (&header, i) {
            (Some(h), 0) => container.append(h.with_style("margin-bottom", "2rem")),
            _ => container.set_style("padding-top", "4rem"),
        }
        container.append(section);

        let slice = render_slice(capture, rasterizer, &container, &options).map_err(|e| {
            log::error!("Error creating slice {}: {}", i + 1, e);
            e
        })?;
        log::debug!("slice {} rendered", i + 1);
        slices.push(slice);
    }

    log::info!("created {} slices", slices.len());
    Ok(slices)
}

fn render_slice(
    capture: &dyn RenderCapture,
    rasterizer: &dyn Rasterizer,
    container: &StagingContainer,
    options: &RasterOptions,
) -> Result<SliceImage> {
    let attached = container.attach(capture);
    let canvas = rasterizer.render(attached.markup(), options)?;
    SliceImage::from_canvas(&canvas)
}
