//! Off-screen containers used to rasterize one section at a time.

use crate::capture::{NodeHandle, RenderCapture, StagingId, StyleDeclarations};
use crate::{ExportConfig, Theme};

/// A fixed-size card holding clones of the header and one section.
///
/// Built detached; [`StagingContainer::attach`] places it in the document
/// body and hands back a guard that removes it again.
#[derive(Debug, Clone)]
pub struct StagingContainer {
    class: &'static str,
    style: StyleDeclarations,
    children: Vec<NodeHandle>,
}

impl StagingContainer {
    pub fn new(config: &ExportConfig, theme: Theme) -> Self {
        let mut style = StyleDeclarations::default();
        let width = format!("{}px", config.slice_width);
        let height = format!("{}px", config.slice_height);
        for (prop, value) in [
            ("width", width.as_str()),
            ("height", height.as_str()),
            ("position", "absolute"),
            ("left", "-9999px"),
            ("top", "0"),
            ("margin", "0"),
            ("padding", "32px 24px"),
            ("box-sizing", "border-box"),
            ("font-family", "sans-serif"),
            ("display", "flex"),
            ("flex-direction", "column"),
            ("justify-content", "center"),
            ("background-color", config.background_css(theme)),
        ] {
            style.set(prop, Some(value));
        }
        Self { class: theme.class(), style, children: Vec::new() }
    }

    pub fn append(&mut self, node: NodeHandle) {
        self.children.push(node);
    }

    pub fn set_style(&mut self, property: &str, value: &str) {
        self.style.set(property, Some(value));
    }

    pub fn style(&self) -> &StyleDeclarations {
        &self.style
    }

    pub fn children(&self) -> &[NodeHandle] {
        &self.children
    }

    pub fn markup(&self) -> String {
        let mut out = String::from("<div");
        if !self.class.is_empty() {
            out.push_str(&format!(" class=\"{}\"", self.class));
        }
        out.push_str(&format!(" style=\"{}\">", self.style.to_attribute()));
        for child in &self.children {
            out.push_str(&child.outer_html());
        }
        out.push_str("</div>");
        out
    }

    /// Attach to the document body for as long as the guard lives.
    pub fn attach<'a>(&self, capture: &'a dyn RenderCapture) -> AttachedStaging<'a> {
        let markup = self.markup();
        let id = capture.attach_staging(markup.clone());
        log::debug!("attached staging container {:?}", id);
        AttachedStaging { capture, id, markup }
    }
}

/// A container currently in the document body. Dropping it detaches it.
pub struct AttachedStaging<'a> {
    capture: &'a dyn RenderCapture,
    id: StagingId,
    markup: String,
}

impl AttachedStaging<'_> {
    pub fn markup(&self) -> &str {
        &self.markup
    }
}

impl Drop for AttachedStaging<'_> {
    fn drop(&mut self) {
        if !self.capture.detach_staging(self.id) {
            log::warn!("staging container {:?} was already detached", self.id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::HtmlCapture;

    fn capture() -> HtmlCapture {
        HtmlCapture::parse(r#"<div><div class="explanation-section-card"><h3>One</h3></div></div>"#).unwrap()
    }

    #[test]
    fn container_carries_fixed_frame_and_theme() {
        let c = StagingContainer::new(&ExportConfig::default(), Theme::Dark);
        let markup = c.markup();
        assert!(markup.starts_with("<div class=\"dark\" style=\""));
        assert_eq!(c.style().get("width"), Some("450px"));
        assert_eq!(c.style().get("height"), Some("600px"));
        assert_eq!(c.style().get("left"), Some("-9999px"));
        assert_eq!(c.style().get("background-color"), Some("#1e293b"));
    }

    #[test]
    fn guard_detaches_on_drop() {
        let cap = capture();
        let section = cap.find_sections(".explanation-section-card").unwrap().remove(0);
        let mut c = StagingContainer::new(&ExportConfig::default(), Theme::Light);
        c.append(section);
        {
            let attached = c.attach(&cap);
            assert_eq!(cap.staged_count(), 1);
            assert!(attached.markup().contains("<h3>One</h3>"));
        }
        assert_eq!(cap.staged_count(), 0);
    }
}
