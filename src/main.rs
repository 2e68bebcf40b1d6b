use anyhow::Context;
use clap::{Parser, ValueEnum};
use explainer_export::document::{ContentSource, JsonFileSource};
use explainer_export::download::{DirectorySink, DownloadSink};
use explainer_export::{Artifact, ExportConfig, ExportService, Theme};
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Html,
    Png,
    Pdf,
    Slices,
    Zip,
    All,
}

/// Export a generated explanation as HTML, PNG, PDF or sliced image cards.
#[derive(Debug, Parser)]
#[command(name = "explainer-export", version, about)]
struct Cli {
    /// JSON response holding the explanation document
    document: PathBuf,

    /// Topic the explanation was generated for; names the output files
    #[arg(short, long)]
    topic: String,

    #[arg(short, long, value_enum, default_value_t = Format::All)]
    format: Format,

    /// Render with the dark theme
    #[arg(long)]
    dark: bool,

    /// Output directory
    #[arg(short, long, default_value = ".")]
    out: PathBuf,

    /// JSON file overriding export settings
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// More logging (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = match &cli.config {
        Some(path) => ExportConfig::from_json_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => ExportConfig::default(),
    };
    let theme = if cli.dark { Theme::Dark } else { Theme::Light };

    let document = JsonFileSource::new(&cli.document).generate(&cli.topic)?;
    let exporter = explainer_export::new_exporter(config)?;
    let service = ExportService::new(exporter.clone());
    service.load_document(document).await?;

    let sink = DirectorySink::new(&cli.out);
    let mut artifacts: Vec<Artifact> = Vec::new();
    let wants = |f: Format| cli.format == f || cli.format == Format::All;

    if wants(Format::Html) {
        artifacts.extend(service.export_html(&cli.topic, theme).await?);
    }
    if wants(Format::Png) {
        artifacts.push(service.export_image(&cli.topic, theme).await?);
    }
    if wants(Format::Pdf) {
        artifacts.push(service.export_pdf(&cli.topic, theme).await?);
    }
    if wants(Format::Slices) || wants(Format::Zip) {
        let slices = service.create_slices(theme).await?;
        if wants(Format::Slices) {
            artifacts.extend(exporter.slice_artifacts(&slices, &cli.topic)?);
        }
        if wants(Format::Zip) {
            artifacts.extend(service.package_slices(slices, &cli.topic).await?);
        }
    }
    service.close().await?;

    for artifact in &artifacts {
        let path = sink.deliver(artifact)?;
        println!("{}", path.display());
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(err) = run(cli).await {
        log::error!("{:#}", err);
        match err.downcast_ref::<explainer_export::Error>() {
            Some(e) => eprintln!("{}", e.user_message()),
            None => eprintln!("error: {:#}", err),
        }
        std::process::exit(1);
    }
}
