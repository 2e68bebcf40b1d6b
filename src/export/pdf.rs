//! Paginated PDF export.
//!
//! The whole root is rasterized once and the same image is placed on every
//! page, shifted up by one page height per page, so each page shows the next
//! vertical window of the content.

use crate::capture::RenderCapture;
use crate::export::image::rasterize_full;
use crate::export::{Artifact, FileNames};
use crate::rendering::Canvas;
use crate::{Capabilities, ExportConfig, Result, Theme};

/// The PDF capability: creates documents of a fixed page size.
pub trait PdfBackend: Send + Sync {
    fn create(&self, title: &str, page_width_mm: f64, page_height_mm: f64) -> Result<Box<dyn PdfSurface>>;
}

/// A document under construction. Coordinates are millimetres from the top
/// left of the current page.
pub trait PdfSurface {
    fn add_image(&mut self, canvas: &Canvas, x_mm: f64, y_mm: f64, width_mm: f64, height_mm: f64) -> Result<()>;

    /// Start a new page and make it current.
    fn add_page(&mut self) -> Result<()>;

    fn save(self: Box<Self>) -> Result<Vec<u8>>;
}

/// How a canvas is laid over a stack of pages.
#[derive(Debug, Clone, PartialEq)]
pub struct Pagination {
    /// Canvas pixels per millimetre of page width
    pub ratio: f64,
    pub image_width_mm: f64,
    pub image_height_mm: f64,
    /// Vertical placement of the image on each page, first page first
    pub offsets_mm: Vec<f64>,
}

impl Pagination {
    pub fn pages(&self) -> usize {
        self.offsets_mm.len()
    }
}

/// Fit the canvas to the page width and work out one offset per page.
///
/// Always at least one page; a canvas exactly one page tall gets exactly one.
pub fn paginate(canvas_width: u32, canvas_height: u32, page_width_mm: f64, page_height_mm: f64) -> Pagination {
    let ratio = canvas_width as f64 / page_width_mm;
    let image_height_mm = if ratio > 0.0 { canvas_height as f64 / ratio } else { 0.0 };

    let mut offsets_mm = vec![0.0];
    let mut remaining = image_height_mm - page_height_mm;
    while remaining > 1e-9 {
        offsets_mm.push(-(offsets_mm.len() as f64 * page_height_mm));
        remaining -= page_height_mm;
    }

    Pagination { ratio, image_width_mm: page_width_mm, image_height_mm, offsets_mm }
}

pub fn export_pdf(
    capture: &dyn RenderCapture,
    capabilities: &Capabilities,
    config: &ExportConfig,
    topic: &str,
    theme: Theme,
) -> Result<Artifact> {
    let rasterizer = capabilities.rasterizer()?;
    let backend = capabilities.pdf()?;
    let background = config.background(theme)?;

    let canvas = rasterize_full(capture, rasterizer, config, background).map_err(|e| {
        log::error!("Error generating PDF: {}", e);
        e
    })?;

    let names = FileNames::new(topic);
    let layout = paginate(canvas.width, canvas.height, config.page_width_mm, config.page_height_mm);
    log::debug!(
        "PDF image {:.1}x{:.1}mm over {} page(s)",
        layout.image_width_mm,
        layout.image_height_mm,
        layout.pages()
    );

    let mut surface = backend.create(&names.pdf(), config.page_width_mm, config.page_height_mm)?;
    for (i, y) in layout.offsets_mm.iter().enumerate() {
        if i > 0 {
            surface.add_page()?;
        }
        surface.add_image(&canvas, 0.0, *y, layout.image_width_mm, layout.image_height_mm)?;
    }
    let bytes = surface.save()?;

    let filename = names.pdf();
    log::info!("PDF ready: {} ({} pages)", filename, layout.pages());
    Ok(Artifact { filename, mime: "application/pdf", bytes })
}

#[cfg(feature = "pdf")]
pub use printpdf_backend::PrintPdfBackend;

#[cfg(feature = "pdf")]
mod printpdf_backend {
    use super::{PdfBackend, PdfSurface};
    use crate::rendering::{Canvas, Rgba};
    use crate::{Error, Result};
    use printpdf::{
        ColorBits, ColorSpace, Image, ImageTransform, ImageXObject, Mm, PdfDocument, PdfDocumentReference,
        PdfLayerIndex, PdfPageIndex, Px,
    };

    const LAYER: &str = "Layer 1";

    /// PDF backend built on `printpdf`.
    #[derive(Debug, Clone, Default)]
    pub struct PrintPdfBackend;

    impl PrintPdfBackend {
        pub fn new() -> Self {
            PrintPdfBackend
        }
    }

    impl PdfBackend for PrintPdfBackend {
        fn create(&self, title: &str, page_width_mm: f64, page_height_mm: f64) -> Result<Box<dyn PdfSurface>> {
            let (width, height) = (Mm(page_width_mm as f32), Mm(page_height_mm as f32));
            let (doc, page, layer) = PdfDocument::new(title, width, height, LAYER);
            Ok(Box::new(PrintPdfSurface { doc, page, layer, width, height }))
        }
    }

    struct PrintPdfSurface {
        doc: PdfDocumentReference,
        page: PdfPageIndex,
        layer: PdfLayerIndex,
        width: Mm,
        height: Mm,
    }

    impl PdfSurface for PrintPdfSurface {
        fn add_image(&mut self, canvas: &Canvas, x_mm: f64, y_mm: f64, width_mm: f64, height_mm: f64) -> Result<()> {
            if canvas.width == 0 || width_mm <= 0.0 {
                return Err(Error::PdfError("cannot place an empty image".into()));
            }
            // Only the rows that land on this page are embedded.
            let page_height = self.height.0 as f64;
            let visible_top = y_mm.max(0.0);
            let visible_bottom = (y_mm + height_mm).min(page_height);
            if height_mm <= 0.0 || visible_bottom <= visible_top {
                return Ok(());
            }
            let px_per_mm = canvas.height as f64 / height_mm;
            let top_row = ((visible_top - y_mm) * px_per_mm).floor() as u32;
            let bottom_row = (((visible_bottom - y_mm) * px_per_mm).ceil() as u32).min(canvas.height);
            if bottom_row <= top_row {
                return Ok(());
            }
            let band = canvas.crop_rows(top_row, bottom_row);
            let band_y = y_mm + top_row as f64 / px_per_mm;
            let band_height = band.height as f64 / px_per_mm;

            let xobject = ImageXObject {
                width: Px(band.width as usize),
                height: Px(band.height as usize),
                color_space: ColorSpace::Rgb,
                bits_per_component: ColorBits::Bit8,
                interpolate: true,
                image_data: band.to_rgb(Rgba(255, 255, 255, 255)),
                image_filter: None,
                smask: None,
                clipping_bbox: None,
            };
            // PDF origin is bottom-left.
            let bottom = page_height - (band_y + band_height);
            let layer = self.doc.get_page(self.page).get_layer(self.layer);
            Image::from(xobject).add_to_layer(
                layer,
                ImageTransform {
                    translate_x: Some(Mm(x_mm as f32)),
                    translate_y: Some(Mm(bottom as f32)),
                    dpi: Some((canvas.width as f64 * 25.4 / width_mm) as f32),
                    ..Default::default()
                },
            );
            Ok(())
        }

        fn add_page(&mut self) -> Result<()> {
            let (page, layer) = self.doc.add_page(self.width, self.height, LAYER);
            self.page = page;
            self.layer = layer;
            Ok(())
        }

        fn save(self: Box<Self>) -> Result<Vec<u8>> {
            self.doc
                .save_to_bytes()
                .map_err(|e| Error::PdfError(format!("failed to serialize PDF: {}", e)))
        }
    }
}
