//! Standalone HTML snapshot of the rendered explanation.

use crate::capture::RenderCapture;
use crate::document::ExplanationDocument;
use crate::export::{Artifact, FileNames};
use crate::present::escape_html;
use crate::Theme;

/// Styling framework the live page loads; the snapshot references the same one.
pub const STYLESHEET_SCRIPT: &str = "https://cdn.tailwindcss.com";

/// Wrap the root's markup in a minimal document that renders on its own.
///
/// Cannot fail: nothing is rasterized. The theme survives as the `<html>`
/// class so `dark:` variants apply when the file is opened standalone.
pub fn export_html(
    capture: &dyn RenderCapture,
    document: &ExplanationDocument,
    topic: &str,
    theme: Theme,
) -> Artifact {
    let content = capture.serialize();
    let html = format!(
        r#"<!DOCTYPE html>
<html lang="zh-CN" class="{class}">
  <head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{title}</title>
    <script src="{script}"></script>
  </head>
  <body class="bg-[#fffdfa] dark:bg-slate-900">
    <div class="min-h-screen font-sans text-slate-800 dark:text-slate-200 p-4 sm:p-6 md:p-8">
      {content}
    </div>
  </body>
</html>
"#,
        class = theme.class(),
        title = escape_html(&document.main_title),
        script = STYLESHEET_SCRIPT,
        content = content,
    );

    let filename = FileNames::new(topic).html();
    log::info!("HTML snapshot ready: {} ({} bytes)", filename, html.len());
    Artifact { filename, mime: "text/html", bytes: html.into_bytes() }
}
