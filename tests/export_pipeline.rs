//! End-to-end tests of the export components over rendered markup.

use explainer_export::capture::RenderCapture;
use explainer_export::download::DirectorySink;
use explainer_export::export::pdf::{PdfBackend, PdfSurface};
use explainer_export::present::render_explanation;
use explainer_export::{
    Canvas, Capabilities, Error, ExplanationDocument, ExportConfig, Exporter, HtmlCapture, RasterOptions, Rasterizer,
    Result, Rgba, SliceImage, Theme,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

const STEPS: [(u8, &str); 7] = [
    (1, "INFO"),
    (2, "CAPACITY"),
    (3, "PROCESS"),
    (4, "TYPES"),
    (5, "LEARN"),
    (6, "TOOLS"),
    (7, "LIFE"),
];

fn document(sections: usize) -> ExplanationDocument {
    let sections: Vec<String> = STEPS
        .iter()
        .take(sections)
        .map(|(step, icon)| {
            format!(
                r#"{{"step": {}, "iconKey": "{}", "title": "第{}部分", "content": {{"bullets": [{{"text": "要点 {}"}}]}}}}"#,
                step, icon, step, step
            )
        })
        .collect();
    let raw = format!(
        r#"{{"mainTitle": "区块链是什么", "subtitle": "一份入门指南", "topicEmoji": "⛓️", "sections": [{}]}}"#,
        sections.join(",")
    );
    ExplanationDocument::from_response(&raw).expect("valid document")
}

fn capture_for(sections: usize) -> HtmlCapture {
    HtmlCapture::parse(&render_explanation(&document(sections))).expect("rendered markup")
}

/// Records every markup/options pair and renders a small solid canvas.
#[derive(Default)]
struct RecordingRasterizer {
    calls: Mutex<Vec<(String, RasterOptions)>>,
    fail_from: Option<usize>,
}

impl RecordingRasterizer {
    /// Fails call `n` (0-based) and every call after it.
    fn failing_from(n: usize) -> Self {
        Self { fail_from: Some(n), ..Default::default() }
    }

    fn markups(&self) -> Vec<String> {
        self.calls.lock().unwrap().iter().map(|(m, _)| m.clone()).collect()
    }
}

impl Rasterizer for RecordingRasterizer {
    fn render(&self, markup: &str, options: &RasterOptions) -> Result<Canvas> {
        let mut calls = self.calls.lock().unwrap();
        calls.push((markup.to_string(), options.clone()));
        if self.fail_from.is_some_and(|n| calls.len() > n) {
            return Err(Error::RasterizationError("simulated failure".into()));
        }
        let w = options.width.or(options.window_width).unwrap_or(100);
        let h = options.height.unwrap_or(w * 2);
        let fill = options.background.unwrap_or(Rgba(10, 20, 30, 255));
        Ok(Canvas::new(w, h, fill))
    }
}

#[derive(Default)]
struct PdfLog {
    pages: AtomicUsize,
    images: Mutex<Vec<(f64, f64)>>,
}

struct RecordingPdf(Arc<PdfLog>);

struct RecordingSurface(Arc<PdfLog>);

impl PdfBackend for RecordingPdf {
    fn create(&self, _title: &str, _w: f64, _h: f64) -> Result<Box<dyn PdfSurface>> {
        self.0.pages.store(1, Ordering::SeqCst);
        Ok(Box::new(RecordingSurface(self.0.clone())))
    }
}

impl PdfSurface for RecordingSurface {
    fn add_image(&mut self, _c: &Canvas, _x: f64, y: f64, _w: f64, h: f64) -> Result<()> {
        self.0.images.lock().unwrap().push((y, h));
        Ok(())
    }

    fn add_page(&mut self) -> Result<()> {
        self.0.pages.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn save(self: Box<Self>) -> Result<Vec<u8>> {
        Ok(b"%PDF-fake".to_vec())
    }
}

fn exporter_with(rasterizer: Arc<dyn Rasterizer>) -> Exporter {
    let caps = Capabilities::builtin()
        .with_rasterizer(rasterizer)
        .with_pdf(Arc::new(RecordingPdf(Arc::default())));
    Exporter::new(ExportConfig::default(), caps)
}

#[test]
fn one_slice_per_section_in_order() {
    for n in [1, 3, 7] {
        let cap = capture_for(n);
        let rec = Arc::new(RecordingRasterizer::default());
        let slices = exporter_with(rec.clone()).create_slices(&cap, Theme::Light).unwrap();
        assert_eq!(slices.len(), n);

        let markups = rec.markups();
        for (i, m) in markups.iter().enumerate() {
            assert!(m.contains(&format!("第{}部分", i + 1)), "slice {} out of order", i);
        }
    }
}

#[test]
fn header_appears_only_in_first_slice() {
    let cap = capture_for(3);
    let rec = Arc::new(RecordingRasterizer::default());
    exporter_with(rec.clone()).create_slices(&cap, Theme::Light).unwrap();

    let markups = rec.markups();
    assert!(markups[0].contains("区块链是什么"));
    assert!(markups[0].contains("margin-bottom: 2rem"));
    assert!(!markups[0].contains("padding-top: 4rem"));
    for m in &markups[1..] {
        assert!(!m.contains("区块链是什么"));
        assert!(m.contains("padding-top: 4rem"));
    }
}

#[test]
fn slice_frames_are_three_by_four_without_extra_background() {
    let cap = capture_for(2);
    let rec = Arc::new(RecordingRasterizer::default());
    exporter_with(rec.clone()).create_slices(&cap, Theme::Dark).unwrap();

    for (markup, options) in rec.calls.lock().unwrap().iter() {
        assert_eq!((options.width, options.height), (Some(450), Some(600)));
        assert_eq!(options.scale, 2.0);
        assert!(options.background.is_none());
        assert!(markup.starts_with("<div class=\"dark\""));
        assert!(markup.contains("background-color: #1e293b"));
    }
}

#[test]
fn builtin_rasterizer_slices_are_900_by_1200() {
    let cap = capture_for(2);
    let exporter = explainer_export::new_exporter(ExportConfig::default()).unwrap();
    let slices = exporter.create_slices(&cap, Theme::Light).unwrap();
    for slice in &slices {
        let png = slice.decode().unwrap();
        let decoder = png::Decoder::new(std::io::Cursor::new(png));
        let reader = decoder.read_info().unwrap();
        assert_eq!((reader.info().width, reader.info().height), (900, 1200));
    }
}

#[test]
fn cleanup_after_success_and_failure() {
    let cap = capture_for(4);
    let style_before = cap.root_style_attribute();

    let ok = exporter_with(Arc::new(RecordingRasterizer::default()));
    ok.create_slices(&cap, Theme::Light).unwrap();
    ok.export_image(&cap, "区块链", Theme::Light).unwrap();
    assert_eq!(cap.staged_count(), 0);
    assert_eq!(cap.root_style_attribute(), style_before);

    let bad = exporter_with(Arc::new(RecordingRasterizer::failing_from(0)));
    assert!(bad.export_image(&cap, "区块链", Theme::Light).is_err());
    assert!(bad.export_pdf(&cap, "区块链", Theme::Light).is_err());
    assert!(bad.create_slices(&cap, Theme::Light).is_err());
    assert_eq!(cap.staged_count(), 0);
    assert_eq!(cap.root_style_attribute(), style_before);
}

#[test]
fn full_image_suppresses_shadow_only_while_rendering() {
    let cap = capture_for(1);
    assert!(cap.root_style("box-shadow").is_some_and(|v| v != "none"));

    let rec = Arc::new(RecordingRasterizer::default());
    let artifact = exporter_with(rec.clone()).export_image(&cap, "区块链", Theme::Light).unwrap();
    assert_eq!(artifact.filename, "区块链_explanation_full.png");

    let calls = rec.calls.lock().unwrap();
    assert!(calls[0].0.contains("box-shadow: none"));
    assert_eq!(calls[0].1.background, Some(Rgba(255, 253, 250, 255)));
    assert_eq!(calls[0].1.window_width, Some(896));
    assert!(cap.root_style("box-shadow").is_some_and(|v| v != "none"));
}

#[test]
fn failure_mid_batch_yields_no_slices() {
    let cap = capture_for(5);
    let rec = Arc::new(RecordingRasterizer::failing_from(2));
    let err = exporter_with(rec.clone()).create_slices(&cap, Theme::Light).unwrap_err();
    assert!(matches!(err, Error::RasterizationError(_)));
    // Slices after the failing one are never attempted.
    assert_eq!(rec.calls.lock().unwrap().len(), 3);
    assert_eq!(cap.staged_count(), 0);
}

#[test]
fn missing_capabilities_fail_before_touching_the_subtree() {
    let cap = capture_for(2);
    let before = cap.root_style_attribute();
    let exporter = Exporter::new(ExportConfig::default(), Capabilities::none());

    for err in [
        exporter.export_image(&cap, "t", Theme::Light).unwrap_err(),
        exporter.export_pdf(&cap, "t", Theme::Light).unwrap_err(),
        exporter.create_slices(&cap, Theme::Light).unwrap_err(),
    ] {
        assert!(matches!(err, Error::CapabilityUnavailable(_)));
    }

    let rec = Arc::new(RecordingRasterizer::default());
    let no_pdf = Exporter::new(ExportConfig::default(), Capabilities::none().with_rasterizer(rec.clone()));
    assert!(matches!(
        no_pdf.export_pdf(&cap, "t", Theme::Light),
        Err(Error::CapabilityUnavailable(_))
    ));
    assert!(rec.calls.lock().unwrap().is_empty());
    assert_eq!(cap.root_style_attribute(), before);
}

#[test]
fn filenames_are_deterministic() {
    let cap = capture_for(1);
    let exporter = exporter_with(Arc::new(RecordingRasterizer::default()));
    let topic = "  Quantum  Computing ";
    let doc = document(1);

    let html = exporter.export_html(&cap, Some(&doc), topic, Theme::Light).unwrap().unwrap();
    assert_eq!(html.filename, "quantum_computing_explanation.html");
    assert_eq!(exporter.export_image(&cap, topic, Theme::Light).unwrap().filename, "quantum_computing_explanation_full.png");
    assert_eq!(exporter.export_pdf(&cap, topic, Theme::Light).unwrap().filename, "quantum_computing_explanation.pdf");
    assert!(exporter.export_html(&cap, None, topic, Theme::Light).unwrap().is_none());
}

#[test]
fn pdf_page_count_follows_image_height() {
    // 896 px wide at scale 1 and page width 210 mm: 1 mm = 896/210 px.
    for (height_px, pages) in [(1000u32, 1usize), (1267, 1), (1268, 2), (2600, 3)] {
        struct Fixed(u32);
        impl Rasterizer for Fixed {
            fn render(&self, _: &str, _: &RasterOptions) -> Result<Canvas> {
                Ok(Canvas::new(896, self.0, Rgba(255, 255, 255, 255)))
            }
        }
        let log = Arc::new(PdfLog::default());
        let caps = Capabilities::none()
            .with_rasterizer(Arc::new(Fixed(height_px)))
            .with_pdf(Arc::new(RecordingPdf(log.clone())));
        let exporter = Exporter::new(ExportConfig::default(), caps);
        let a = exporter.export_pdf(&capture_for(1), "t", Theme::Light).unwrap();
        assert_eq!(a.mime, "application/pdf");
        assert_eq!(log.pages.load(Ordering::SeqCst), pages, "height {}", height_px);

        let images = log.images.lock().unwrap();
        assert_eq!(images.len(), pages);
        for (k, (y, _)) in images.iter().enumerate() {
            assert!((y + k as f64 * 297.0).abs() < 1e-9);
        }
    }
}

#[cfg(feature = "archive")]
#[test]
fn archive_round_trips_slice_bytes() {
    use std::io::Read;

    let cap = capture_for(3);
    let exporter = explainer_export::new_exporter(ExportConfig::default()).unwrap();
    let slices = exporter.create_slices(&cap, Theme::Light).unwrap();
    let zip = exporter.package_slices(&slices, "区块链").unwrap().unwrap();

    let mut archive = zip::ZipArchive::new(std::io::Cursor::new(zip.bytes)).unwrap();
    assert_eq!(archive.len(), 3);
    for (i, slice) in slices.iter().enumerate() {
        let mut bytes = Vec::new();
        archive
            .by_name(&format!("区块链_part{}.png", i + 1))
            .unwrap()
            .read_to_end(&mut bytes)
            .unwrap();
        assert_eq!(bytes, slice.decode().unwrap());
    }
}

#[cfg(feature = "archive")]
#[test]
fn corrupt_slice_aborts_packaging() {
    let exporter = explainer_export::new_exporter(ExportConfig::default()).unwrap();
    let slices = vec![SliceImage::from_data_url("data:image/png;base64,not base64!")];
    let err = exporter.package_slices(&slices, "t").unwrap_err();
    assert!(matches!(err, Error::PackagingError(_)), "got {:?}", err);
}

#[test]
fn section_styles_with_data_urls_survive_slicing() {
    let markup = r#"<div class="explanation-root">
        <div class="text-center"><h1>Title</h1></div>
        <div class="explanation-section-card" style="background-image: url('data:image/png;base64,QUJD'); color: red"><h3>One</h3></div>
    </div>"#;
    let cap = HtmlCapture::parse(markup).unwrap();
    let rec = Arc::new(RecordingRasterizer::default());
    exporter_with(rec.clone()).create_slices(&cap, Theme::Light).unwrap();

    let m = &rec.markups()[0];
    assert!(m.contains("background-image: url(&#39;data:image/png;base64,QUJD&#39;)"), "{}", m);
    assert!(m.contains("color: red"), "{}", m);
}

#[cfg(all(feature = "pdf", feature = "archive"))]
#[test]
fn blockchain_topic_exports_everything() {
    let cap = capture_for(7);
    let exporter = explainer_export::new_exporter(ExportConfig::default()).unwrap();

    let slices = exporter.create_slices(&cap, Theme::Light).unwrap();
    assert_eq!(slices.len(), 7);
    let zip = exporter.package_slices(&slices, "区块链").unwrap().unwrap();
    assert_eq!(zip.filename, "区块链_explanation.zip");

    let pdf = exporter.export_pdf(&cap, "区块链", Theme::Dark).unwrap();
    assert!(pdf.bytes.starts_with(b"%PDF"));

    let tmp = tempfile::tempdir().unwrap();
    let sink = DirectorySink::new(tmp.path());
    let paths = exporter.download_slices(&slices, "区块链", &sink).unwrap();
    assert_eq!(paths.len(), 7);
    assert!(tmp.path().join("区块链_part7.png").exists());
    assert_eq!(cap.staged_count(), 0);
}
