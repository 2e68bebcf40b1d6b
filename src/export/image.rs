//! Single-image export of the whole explanation.

use crate::capture::{RenderCapture, StyleOverride};
use crate::export::{Artifact, FileNames};
use crate::rendering::{Canvas, RasterOptions, Rasterizer, Rgba};
use crate::{Capabilities, ExportConfig, Result, Theme};

/// Rasterize the entire root with its drop-shadow suppressed.
///
/// The shadow override lives only for the duration of the render call; the
/// root's original `style` attribute is back in place when this returns,
/// whether rendering succeeded or not.
pub(crate) fn rasterize_full(
    capture: &dyn RenderCapture,
    rasterizer: &dyn Rasterizer,
    config: &ExportConfig,
    background: Rgba,
) -> Result<Canvas> {
    let options = RasterOptions {
        scale: config.scale,
        use_cors: config.use_cors,
        background: Some(background),
        width: None,
        height: None,
        window_width: Some(config.window_width),
    };
    let _shadow = StyleOverride::apply(capture, "box-shadow", "none");
    rasterizer.render(&capture.serialize(), &options)
}

pub fn export_full_image(
    capture: &dyn RenderCapture,
    capabilities: &Capabilities,
    config: &ExportConfig,
    topic: &str,
    theme: Theme,
) -> Result<Artifact> {
    let rasterizer = capabilities.rasterizer()?;
    let background = config.background(theme)?;

    let canvas = rasterize_full(capture, rasterizer, config, background).map_err(|e| {
        log::error!("Error generating image: {}", e);
        e
    })?;
    let bytes = canvas.to_png()?;

    let filename = FileNames::new(topic).full_png();
    log::info!("Full image ready: {} ({}x{})", filename, canvas.width, canvas.height);
    Ok(Artifact { filename, mime: "image/png", bytes })
}
