//! Block layout on a fixed glyph grid.
//!
//! Every character occupies one `GLYPH`-sized cell (times the block's glyph
//! scale). Headings, paragraphs and list items become text blocks stacked
//! vertically; bordered containers become cards that inset their children.

use crate::capture::style::{parse_length, Edges, StyleDeclarations};
use crate::rendering::{RasterOptions, Rgba};
use scraper::{ElementRef, Html, Node};

pub const GLYPH: u32 = 8;
pub const LINE_GAP: u32 = 4;
const BLOCK_GAP: u32 = 6;
const CARD_INSET: u32 = 12;
const DEFAULT_WIDTH: u32 = 896;
const DEFAULT_PADDING: f32 = 16.0;

const INLINE_TAGS: &[&str] = &["span", "strong", "em", "b", "i", "a", "code", "small", "br"];
const SKIPPED_TAGS: &[&str] = &["script", "style", "svg", "head", "title", "template"];

#[derive(Debug, Clone, PartialEq)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementType {
    Title,
    Heading,
    Paragraph,
    ListItem,
    Card,
}

/// A positioned block. Cards carry no text.
#[derive(Debug, Clone)]
pub struct LayoutNode {
    pub rect: Rect,
    pub lines: Vec<String>,
    pub elem_type: ElementType,
    pub scale: u32,
}

/// The outer frame of a rasterization, resolved from the options and the
/// root element's inline style.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub width: u32,
    pub height: Option<u32>,
    pub padding: Edges,
    pub center: bool,
    pub background: Option<Rgba>,
    pub shadow: bool,
}

impl Frame {
    pub fn resolve(root: ElementRef<'_>, options: &RasterOptions) -> Self {
        let style = root
            .value()
            .attr("style")
            .map(StyleDeclarations::parse)
            .unwrap_or_default();
        let len = |p: &str| style.get(p).and_then(parse_length).map(|v| v.round() as u32);

        let width = options
            .width
            .or_else(|| len("width"))
            .or(options.window_width)
            .unwrap_or(DEFAULT_WIDTH);
        let height = options.height.or_else(|| len("height"));

        let mut padding = style
            .get("padding")
            .and_then(Edges::from_shorthand)
            .unwrap_or_else(|| Edges::uniform(DEFAULT_PADDING));
        if let Some(v) = style.get("padding-top").and_then(parse_length) {
            padding.top = v;
        }
        if let Some(v) = style.get("padding-bottom").and_then(parse_length) {
            padding.bottom = v;
        }

        let center = style.get("display") == Some("flex")
            && style.get("justify-content") == Some("center");
        let background = style
            .get("background-color")
            .and_then(Rgba::parse)
            .or(options.background);
        let shadow = style
            .get("box-shadow")
            .map(|v| !v.trim().eq_ignore_ascii_case("none"))
            .unwrap_or(false);

        Self { width, height, padding, center, background, shadow }
    }
}

/// Result of laying out one root element.
#[derive(Debug, Clone)]
pub struct Layout {
    pub frame: Frame,
    pub nodes: Vec<LayoutNode>,
    pub content_height: u32,
}

impl Layout {
    /// Frame height in logical px: fixed if the frame says so, otherwise
    /// padding plus content.
    pub fn height(&self) -> u32 {
        self.frame.height.unwrap_or_else(|| {
            (self.frame.padding.top + self.frame.padding.bottom).round() as u32 + self.content_height
        })
    }
}

struct Cursor {
    y: u32,
    nodes: Vec<LayoutNode>,
}

/// Lay out the first element of `markup`. Returns `None` if there is none.
pub fn layout_markup(markup: &str, options: &RasterOptions) -> Option<Layout> {
    let fragment = Html::parse_fragment(markup);
    let root = fragment.root_element().children().find_map(ElementRef::wrap)?;
    let frame = Frame::resolve(root, options);

    let left = frame.padding.left.round() as u32;
    let inner_width = frame
        .width
        .saturating_sub(left + frame.padding.right.round() as u32)
        .max(GLYPH);
    let top = frame.padding.top.round() as u32;

    let mut cursor = Cursor { y: top, nodes: Vec::new() };
    walk_children(root, left, inner_width, &mut cursor);
    let content_height = cursor.y - top;

    let mut nodes = cursor.nodes;
    if let (Some(h), true) = (frame.height, frame.center) {
        let available = h.saturating_sub((frame.padding.top + frame.padding.bottom).round() as u32);
        let offset = available.saturating_sub(content_height) / 2;
        for n in &mut nodes {
            n.rect.y += offset as i32;
        }
    }

    Some(Layout { frame, nodes, content_height })
}

fn walk_children(el: ElementRef<'_>, x: u32, width: u32, cursor: &mut Cursor) {
    for child in el.children().filter_map(ElementRef::wrap) {
        walk(child, x, width, cursor);
    }
}

fn walk(el: ElementRef<'_>, x: u32, width: u32, cursor: &mut Cursor) {
    let name = el.value().name();
    if SKIPPED_TAGS.contains(&name) {
        return;
    }
    let style = el
        .value()
        .attr("style")
        .map(StyleDeclarations::parse)
        .unwrap_or_default();
    let margin = |p: &str| style.get(p).and_then(parse_length).map(|v| v.round() as u32).unwrap_or(0);
    cursor.y += margin("margin-top");

    let text_kind = match name {
        "h1" => Some((ElementType::Title, 2)),
        "h2" | "h3" | "h4" | "h5" | "h6" => Some((ElementType::Heading, 1)),
        "p" => Some((ElementType::Paragraph, 1)),
        "li" => Some((ElementType::ListItem, 1)),
        _ if is_card(el) => None,
        _ if is_inline_only(el) => Some((ElementType::Paragraph, 1)),
        _ => None,
    };

    if let Some((kind, scale)) = text_kind {
        push_text(el, kind, scale, x, width, cursor);
    } else if is_card(el) {
        let start = cursor.y;
        let slot = cursor.nodes.len();
        cursor.y += CARD_INSET;
        walk_children(el, x + CARD_INSET, width.saturating_sub(CARD_INSET * 2).max(GLYPH), cursor);
        cursor.y += CARD_INSET;
        let card = LayoutNode {
            rect: Rect { x: x as i32, y: start as i32, width, height: cursor.y - start },
            lines: Vec::new(),
            elem_type: ElementType::Card,
            scale: 1,
        };
        // Cards paint beneath their children.
        cursor.nodes.insert(slot, card);
        cursor.y += BLOCK_GAP;
    } else {
        walk_children(el, x, width, cursor);
    }

    cursor.y += margin("margin-bottom");
}

fn push_text(el: ElementRef<'_>, kind: ElementType, scale: u32, x: u32, width: u32, cursor: &mut Cursor) {
    let text = el.text().collect::<String>();
    if text.trim().is_empty() {
        return;
    }
    let cell = GLYPH * scale;
    let per_line = (width / cell).max(1) as usize;
    let lines = wrap(&text, per_line);
    let height = lines.len() as u32 * (cell + LINE_GAP);
    cursor.nodes.push(LayoutNode {
        rect: Rect { x: x as i32, y: cursor.y as i32, width, height },
        lines,
        elem_type: kind,
        scale,
    });
    cursor.y += height + BLOCK_GAP;
}

fn is_card(el: ElementRef<'_>) -> bool {
    el.value()
        .classes()
        .any(|c| c == "border" || c.starts_with("border-l-"))
}

fn is_inline_only(el: ElementRef<'_>) -> bool {
    let mut has_text = false;
    for child in el.children() {
        match child.value() {
            Node::Text(t) => has_text |= !t.trim().is_empty(),
            Node::Element(e) => {
                if !INLINE_TAGS.contains(&e.name()) {
                    return false;
                }
                has_text = true;
            }
            _ => {}
        }
    }
    has_text
}

/// Greedy word wrap on a character grid. Words longer than a line (including
/// unspaced CJK runs) are split at the line width.
pub fn wrap(text: &str, per_line: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut cur = String::new();
    let mut cur_len = 0usize;
    for word in text.split_whitespace() {
        let mut chars: Vec<char> = word.chars().collect();
        while !chars.is_empty() {
            let needed = chars.len() + usize::from(cur_len > 0);
            if cur_len + needed <= per_line {
                if cur_len > 0 {
                    cur.push(' ');
                    cur_len += 1;
                }
                cur_len += chars.len();
                cur.extend(chars.drain(..));
            } else if cur_len > 0 {
                lines.push(std::mem::take(&mut cur));
                cur_len = 0;
            } else {
                let head: String = chars.drain(..per_line.min(chars.len())).collect();
                lines.push(head);
            }
        }
    }
    if !cur.is_empty() {
        lines.push(cur);
    }
    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_places_title_and_paragraphs() {
        let html = "<div><h1>Heading</h1><p>Hello world</p><p>More text</p></div>";
        let opts = RasterOptions { window_width: Some(200), ..Default::default() };
        let layout = layout_markup(html, &opts).unwrap();
        assert_eq!(layout.nodes[0].elem_type, ElementType::Title);
        assert_eq!(layout.nodes[0].scale, 2);
        assert_eq!(layout.nodes[1].elem_type, ElementType::Paragraph);
        assert!(layout.nodes[2].rect.y > layout.nodes[1].rect.y);
        assert_eq!(layout.frame.width, 200);
    }

    #[test]
    fn cards_precede_their_children() {
        let html = "<div><div class=\"border rounded\"><h3>Step</h3><p>Body</p></div></div>";
        let layout = layout_markup(html, &RasterOptions::default()).unwrap();
        assert_eq!(layout.nodes[0].elem_type, ElementType::Card);
        assert!(layout.nodes[1].rect.x > layout.nodes[0].rect.x);
        assert!(layout.nodes[0].rect.height > layout.nodes[1].rect.height);
    }

    #[test]
    fn fixed_frame_centers_content() {
        let html = "<div style=\"width: 450px; height: 600px; padding: 32px 24px; display: flex; justify-content: center\"><p>x</p></div>";
        let layout = layout_markup(html, &RasterOptions::default()).unwrap();
        assert_eq!(layout.height(), 600);
        assert_eq!(layout.frame.width, 450);
        assert!(layout.nodes[0].rect.y > 200);
    }

    #[test]
    fn inline_style_resolves_frame() {
        let html = "<div style=\"padding: 32px 24px; padding-top: 4rem; background-color: #1e293b; box-shadow: none\"><p>x</p></div>";
        let layout = layout_markup(html, &RasterOptions::default()).unwrap();
        assert_eq!(layout.frame.padding.top, 64.0);
        assert_eq!(layout.frame.padding.left, 24.0);
        assert_eq!(layout.frame.background, Rgba::parse("#1e293b"));
        assert!(!layout.frame.shadow);
    }

    #[test]
    fn wrap_breaks_long_runs() {
        assert_eq!(wrap("hello big world", 9), vec!["hello big", "world"]);
        assert_eq!(wrap("区块链是一本公共账本", 4), vec!["区块链是", "一本公共", "账本"]);
        assert_eq!(wrap("   ", 4), vec![String::new()]);
    }

    #[test]
    fn inline_children_stay_one_block() {
        let html = "<div><div class=\"chip\"><span>🔧</span> <span>模型</span></div></div>";
        let layout = layout_markup(html, &RasterOptions::default()).unwrap();
        assert_eq!(layout.nodes.len(), 1);
        assert_eq!(layout.nodes[0].lines, vec!["🔧 模型".to_string()]);
    }
}
