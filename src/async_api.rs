use crate::capture::HtmlCapture;
use crate::document::ExplanationDocument;
use crate::export::{Artifact, Exporter, SliceImage};
use crate::present::render_explanation;
use crate::{Error, Result, Theme};
use std::sync::mpsc::{self, Sender};
use std::thread;
use tokio::sync::oneshot;

enum Command {
    Load(String, oneshot::Sender<Result<()>>),
    LoadDocument(Box<ExplanationDocument>, oneshot::Sender<Result<()>>),
    Html(String, Theme, oneshot::Sender<Result<Option<Artifact>>>),
    Image(String, Theme, oneshot::Sender<Result<Artifact>>),
    Pdf(String, Theme, oneshot::Sender<Result<Artifact>>),
    Slices(Theme, oneshot::Sender<Result<Vec<SliceImage>>>),
    Zip(String, Theme, oneshot::Sender<Result<Option<Artifact>>>),
    Package(Vec<SliceImage>, String, oneshot::Sender<Result<Option<Artifact>>>),
    Close(oneshot::Sender<Result<()>>),
}

/// State owned by the worker thread.
struct Worker {
    exporter: Exporter,
    capture: Option<HtmlCapture>,
    document: Option<ExplanationDocument>,
}

impl Worker {
    fn capture(&self) -> Result<&HtmlCapture> {
        self.capture
            .as_ref()
            .ok_or_else(|| Error::ContentNotFound("Explanation content reference is not available.".into()))
    }

    fn handle(&mut self, cmd: Command) -> bool {
        match cmd {
            Command::Load(markup, resp) => {
                let res = HtmlCapture::parse(&markup).map(|c| {
                    self.capture = Some(c);
                    self.document = None;
                });
                let _ = resp.send(res);
            }
            Command::LoadDocument(doc, resp) => {
                let res = HtmlCapture::parse(&render_explanation(&doc)).map(|c| {
                    self.capture = Some(c);
                    self.document = Some(*doc);
                });
                let _ = resp.send(res);
            }
            Command::Html(topic, theme, resp) => {
                let res = self
                    .capture()
                    .and_then(|c| self.exporter.export_html(c, self.document.as_ref(), &topic, theme));
                let _ = resp.send(res);
            }
            Command::Image(topic, theme, resp) => {
                let res = self.capture().and_then(|c| self.exporter.export_image(c, &topic, theme));
                let _ = resp.send(res);
            }
            Command::Pdf(topic, theme, resp) => {
                let res = self.capture().and_then(|c| self.exporter.export_pdf(c, &topic, theme));
                let _ = resp.send(res);
            }
            Command::Slices(theme, resp) => {
                let res = self.capture().and_then(|c| self.exporter.create_slices(c, theme));
                let _ = resp.send(res);
            }
            Command::Zip(topic, theme, resp) => {
                let res = self.capture().and_then(|c| {
                    let slices = self.exporter.create_slices(c, theme)?;
                    self.exporter.package_slices(&slices, &topic)
                });
                let _ = resp.send(res);
            }
            Command::Package(slices, topic, resp) => {
                let _ = resp.send(self.exporter.package_slices(&slices, &topic));
            }
            Command::Close(resp) => {
                let _ = resp.send(Ok(()));
                return false;
            }
        }
        true
    }
}

/// An async-friendly export surface backed by a dedicated worker thread.
///
/// The worker owns the exporter and the current capture, and runs one
/// command at a time, so concurrent callers never interleave mutations of
/// the same subtree. Each call is a suspension point for the caller.
#[derive(Clone)]
pub struct ExportService {
    cmd_tx: Sender<Command>,
}

impl ExportService {
    /// Spawn the worker thread that owns `exporter`.
    pub fn new(exporter: Exporter) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::channel::<Command>();

        thread::spawn(move || {
            let mut worker = Worker { exporter, capture: None, document: None };
            while let Ok(cmd) = cmd_rx.recv() {
                if !worker.handle(cmd) {
                    break;
                }
            }
            log::debug!("export worker stopped");
        });

        Self { cmd_tx }
    }

    async fn call<T>(&self, make: impl FnOnce(oneshot::Sender<Result<T>>) -> Command) -> Result<T> {
        let (tx, rx) = oneshot::channel();
        self.cmd_tx.send(make(tx)).map_err(|_| Error::WorkerStopped)?;
        rx.await.map_err(|_| Error::WorkerStopped)?
    }

    /// Replace the current capture with already-rendered markup.
    pub async fn load_markup(&self, markup: &str) -> Result<()> {
        let markup = markup.to_string();
        self.call(|tx| Command::Load(markup, tx)).await
    }

    /// Render `document` and make it the current capture.
    pub async fn load_document(&self, document: ExplanationDocument) -> Result<()> {
        self.call(|tx| Command::LoadDocument(Box::new(document), tx)).await
    }

    pub async fn export_html(&self, topic: &str, theme: Theme) -> Result<Option<Artifact>> {
        let topic = topic.to_string();
        self.call(|tx| Command::Html(topic, theme, tx)).await
    }

    pub async fn export_image(&self, topic: &str, theme: Theme) -> Result<Artifact> {
        let topic = topic.to_string();
        self.call(|tx| Command::Image(topic, theme, tx)).await
    }

    pub async fn export_pdf(&self, topic: &str, theme: Theme) -> Result<Artifact> {
        let topic = topic.to_string();
        self.call(|tx| Command::Pdf(topic, theme, tx)).await
    }

    pub async fn create_slices(&self, theme: Theme) -> Result<Vec<SliceImage>> {
        self.call(|tx| Command::Slices(theme, tx)).await
    }

    /// Slice the current capture and package the result in one step.
    pub async fn export_zip(&self, topic: &str, theme: Theme) -> Result<Option<Artifact>> {
        let topic = topic.to_string();
        self.call(|tx| Command::Zip(topic, theme, tx)).await
    }

    /// Package slices produced earlier without rasterizing again.
    pub async fn package_slices(&self, slices: Vec<SliceImage>, topic: &str) -> Result<Option<Artifact>> {
        let topic = topic.to_string();
        self.call(|tx| Command::Package(slices, topic, tx)).await
    }

    /// Stop the worker. Later calls on any clone fail with `WorkerStopped`.
    pub async fn close(self) -> Result<()> {
        self.call(Command::Close).await
    }
}
