//! Borrowed view of the rendered explanation.
//!
//! Exporters never touch presentation internals. They see the rendered root
//! through [`RenderCapture`], which exposes serialization, the two structural
//! markers (header and section cards), the root's inline style, and the
//! document-body slots used to stage off-screen containers.

pub mod style;

use crate::present::escape_html;
use crate::{Error, Result};
use scraper::{ElementRef, Html, Selector};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

pub use style::{Edges, StyleDeclarations, StyleOverride};

/// Identifier of a container attached to the document body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StagingId(u64);

/// A detached deep clone of one element in the rendered subtree.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeHandle {
    tag: String,
    attrs: Vec<(String, String)>,
    style: StyleDeclarations,
    inner_html: String,
}

impl NodeHandle {
    pub fn from_element(el: ElementRef<'_>) -> Self {
        let value = el.value();
        let mut style = StyleDeclarations::default();
        let mut attrs = Vec::new();
        for (name, val) in value.attrs() {
            if name == "style" {
                style = StyleDeclarations::parse(val);
            } else {
                attrs.push((name.to_string(), val.to_string()));
            }
        }
        Self {
            tag: value.name().to_string(),
            attrs,
            style,
            inner_html: el.inner_html(),
        }
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs.iter().find(|(n, _)| n == name).map(|(_, v)| v.as_str())
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.attr("class")
            .map(|c| c.split_whitespace().any(|c| c == class))
            .unwrap_or(false)
    }

    pub fn style(&self) -> &StyleDeclarations {
        &self.style
    }

    pub fn inner_html(&self) -> &str {
        &self.inner_html
    }

    /// A copy of this clone with one extra inline style declaration.
    pub fn with_style(&self, property: &str, value: &str) -> Self {
        let mut clone = self.clone();
        clone.style.set(property, Some(value));
        clone
    }

    /// Visible text of the clone, whitespace-collapsed.
    pub fn text(&self) -> String {
        let fragment = Html::parse_fragment(&self.inner_html);
        let raw = fragment.root_element().text().collect::<String>();
        raw.split_whitespace().collect::<Vec<_>>().join(" ")
    }

    pub fn outer_html(&self) -> String {
        render_element(&self.tag, &self.attrs, &self.style, &self.inner_html)
    }
}

fn render_element(
    tag: &str,
    attrs: &[(String, String)],
    style: &StyleDeclarations,
    inner: &str,
) -> String {
    let mut out = format!("<{}", tag);
    for (name, value) in attrs {
        out.push_str(&format!(" {}=\"{}\"", name, escape_html(value)));
    }
    if !style.is_empty() {
        out.push_str(&format!(" style=\"{}\"", escape_html(&style.to_attribute())));
    }
    out.push('>');
    out.push_str(inner);
    out.push_str(&format!("</{}>", tag));
    out
}

fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| Error::ConfigError(format!("invalid selector {:?}: {:?}", css, e)))
}

/// Read access to the rendered explanation, plus the narrow set of mutations
/// the exporters are allowed to make.
///
/// Methods take `&self`; implementations use interior mutability because the
/// exporters only ever hold a shared borrow of the live subtree.
pub trait RenderCapture: Send + Sync {
    /// Full markup of the root, including its own wrapper and current style.
    fn serialize(&self) -> String;

    /// First descendant of the root matching `selector`.
    fn find_header(&self, selector: &str) -> Result<Option<NodeHandle>>;

    /// All descendants of the root matching `selector`, in document order.
    fn find_sections(&self, selector: &str) -> Result<Vec<NodeHandle>>;

    /// Raw `style` attribute of the root, if any.
    fn root_style_attribute(&self) -> Option<String>;

    /// Replace (or with `None`, remove) the root's `style` attribute verbatim.
    fn set_root_style_attribute(&self, value: Option<String>);

    /// Attach a container to the document body.
    fn attach_staging(&self, markup: String) -> StagingId;

    /// Remove a previously attached container. Returns false if it was not attached.
    fn detach_staging(&self, id: StagingId) -> bool;

    /// Number of containers currently attached to the body.
    fn staged_count(&self) -> usize;

    fn root_style(&self, property: &str) -> Option<String> {
        let attr = self.root_style_attribute()?;
        StyleDeclarations::parse(&attr).get(property).map(str::to_string)
    }

    fn set_root_style(&self, property: &str, value: Option<&str>) {
        let mut decls = self
            .root_style_attribute()
            .map(|a| StyleDeclarations::parse(&a))
            .unwrap_or_default();
        decls.set(property, value);
        let attr = if decls.is_empty() { None } else { Some(decls.to_attribute()) };
        self.set_root_style_attribute(attr);
    }
}

/// A [`RenderCapture`] over already-rendered markup.
///
/// The first element of the markup is the root. Descendant lookups re-parse
/// the root's inner markup with `scraper` on every call, so handles always
/// reflect the subtree as it is at export time.
pub struct HtmlCapture {
    tag: String,
    attrs: Vec<(String, String)>,
    style: Mutex<Option<String>>,
    inner_html: String,
    staged: Mutex<Vec<(StagingId, String)>>,
    next_id: AtomicU64,
}

impl HtmlCapture {
    pub fn parse(markup: &str) -> Result<Self> {
        let fragment = Html::parse_fragment(markup);
        let root = fragment
            .root_element()
            .children()
            .find_map(ElementRef::wrap)
            .ok_or_else(|| Error::ContentNotFound("rendered markup has no root element".into()))?;

        let value = root.value();
        let mut style = None;
        let mut attrs = Vec::new();
        for (name, val) in value.attrs() {
            if name == "style" {
                style = Some(val.to_string());
            } else {
                attrs.push((name.to_string(), val.to_string()));
            }
        }

        Ok(Self {
            tag: value.name().to_string(),
            attrs,
            style: Mutex::new(style),
            inner_html: root.inner_html(),
            staged: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(1),
        })
    }

    /// Markup of every container currently attached to the body.
    pub fn staged_markup(&self) -> Vec<String> {
        self.staged.lock().unwrap().iter().map(|(_, m)| m.clone()).collect()
    }

    fn select(&self, css: &str) -> Result<Vec<NodeHandle>> {
        let sel = selector(css)?;
        let fragment = Html::parse_fragment(&self.inner_html);
        Ok(fragment.select(&sel).map(NodeHandle::from_element).collect())
    }
}

impl RenderCapture for HtmlCapture {
    fn serialize(&self) -> String {
        let mut out = format!("<{}", self.tag);
        for (name, value) in &self.attrs {
            out.push_str(&format!(" {}=\"{}\"", name, escape_html(value)));
        }
        if let Some(style) = self.style.lock().unwrap().as_ref() {
            out.push_str(&format!(" style=\"{}\"", escape_html(style)));
        }
        out.push('>');
        out.push_str(&self.inner_html);
        out.push_str(&format!("</{}>", self.tag));
        out
    }

    fn find_header(&self, selector: &str) -> Result<Option<NodeHandle>> {
        Ok(self.select(selector)?.into_iter().next())
    }

    fn find_sections(&self, selector: &str) -> Result<Vec<NodeHandle>> {
        self.select(selector)
    }

    fn root_style_attribute(&self) -> Option<String> {
        self.style.lock().unwrap().clone()
    }

    fn set_root_style_attribute(&self, value: Option<String>) {
        *self.style.lock().unwrap() = value;
    }

    fn attach_staging(&self, markup: String) -> StagingId {
        let id = StagingId(self.next_id.fetch_add(1, Ordering::SeqCst));
        self.staged.lock().unwrap().push((id, markup));
        id
    }

    fn detach_staging(&self, id: StagingId) -> bool {
        let mut staged = self.staged.lock().unwrap();
        let before = staged.len();
        staged.retain(|(sid, _)| *sid != id);
        staged.len() != before
    }

    fn staged_count(&self) -> usize {
        self.staged.lock().unwrap().len()
    }
}
