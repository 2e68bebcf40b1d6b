//! Paint commands derived from a [`Layout`].

use crate::rendering::layout::{ElementType, Layout, GLYPH, LINE_GAP};
use crate::rendering::Rgba;

/// Depth of the painted drop-shadow band, in logical px.
pub const SHADOW_DEPTH: u32 = 6;

#[derive(Debug, Clone, PartialEq)]
pub enum PaintCommand {
    SolidRect {
        x: i32,
        y: i32,
        width: u32,
        height: u32,
        rgba: Rgba,
    },
    StrokeRect {
        x: i32,
        y: i32,
        width: u32,
        height: u32,
        rgba: Rgba,
    },
    Text {
        x: i32,
        y: i32,
        lines: Vec<String>,
        scale: u32,
        rgba: Rgba,
    },
}

/// Ink colours chosen against the frame background.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Palette {
    pub ink: Rgba,
    pub accent: Rgba,
    pub border: Rgba,
    pub shadow: Rgba,
}

impl Palette {
    pub fn for_background(background: Option<Rgba>) -> Self {
        let dark = background.map(|b| b.is_dark()).unwrap_or(false);
        if dark {
            Self {
                ink: Rgba(226, 232, 240, 255),
                accent: Rgba(248, 113, 89, 255),
                border: Rgba(51, 65, 85, 255),
                shadow: Rgba(0, 0, 0, 90),
            }
        } else {
            Self {
                ink: Rgba(45, 51, 54, 255),
                accent: Rgba(225, 75, 48, 255),
                border: Rgba(226, 232, 240, 255),
                shadow: Rgba(0, 0, 0, 40),
            }
        }
    }
}

/// Build the display list, back to front: background, shadow, cards, text.
pub fn build_display_list(layout: &Layout) -> Vec<PaintCommand> {
    let frame = &layout.frame;
    let palette = Palette::for_background(frame.background);
    let height = layout.height();
    let mut cmds = Vec::new();

    if let Some(bg) = frame.background {
        cmds.push(PaintCommand::SolidRect { x: 0, y: 0, width: frame.width, height, rgba: bg });
    }
    if frame.shadow {
        cmds.push(PaintCommand::SolidRect {
            x: 0,
            y: height.saturating_sub(SHADOW_DEPTH) as i32,
            width: frame.width,
            height: SHADOW_DEPTH,
            rgba: palette.shadow,
        });
        cmds.push(PaintCommand::SolidRect {
            x: frame.width.saturating_sub(SHADOW_DEPTH) as i32,
            y: 0,
            width: SHADOW_DEPTH,
            height: height.saturating_sub(SHADOW_DEPTH),
            rgba: palette.shadow,
        });
    }

    for node in &layout.nodes {
        let r = &node.rect;
        match node.elem_type {
            ElementType::Card => cmds.push(PaintCommand::StrokeRect {
                x: r.x,
                y: r.y,
                width: r.width,
                height: r.height,
                rgba: palette.border,
            }),
            kind => {
                let rgba = match kind {
                    ElementType::Title | ElementType::Heading => palette.accent,
                    _ => palette.ink,
                };
                cmds.push(PaintCommand::Text {
                    x: r.x,
                    y: r.y,
                    lines: node.lines.clone(),
                    scale: node.scale,
                    rgba,
                });
            }
        }
    }
    cmds
}

/// Logical line advance for a text block at `scale`.
pub fn line_advance(scale: u32) -> u32 {
    GLYPH * scale + LINE_GAP
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rendering::layout::layout_markup;
    use crate::rendering::RasterOptions;

    #[test]
    fn shadow_only_when_declared() {
        let opts = RasterOptions { background: Rgba::parse("#fffdfa"), ..Default::default() };
        let with = layout_markup("<div style=\"box-shadow: 0 1px red\"><p>a</p></div>", &opts).unwrap();
        let without = layout_markup("<div style=\"box-shadow: none\"><p>a</p></div>", &opts).unwrap();
        assert_eq!(build_display_list(&with).len(), build_display_list(&without).len() + 2);
    }

    #[test]
    fn dark_background_uses_light_ink() {
        let p = Palette::for_background(Rgba::parse("#1e293b"));
        assert!(!p.ink.is_dark());
        let p = Palette::for_background(None);
        assert!(p.ink.is_dark());
    }

    #[test]
    fn background_then_shadow_then_card_then_text() {
        let opts = RasterOptions { background: Rgba::parse("#fffdfa"), ..Default::default() };
        let html = "<div style=\"box-shadow: 0 1px red\"><div class=\"border\"><h3>Step</h3></div></div>";
        let cmds = build_display_list(&layout_markup(html, &opts).unwrap());

        assert_eq!(cmds.len(), 5);
        assert!(matches!(cmds[0], PaintCommand::SolidRect { x: 0, y: 0, rgba, .. } if rgba == Rgba(255, 253, 250, 255)));
        assert!(matches!(cmds[1], PaintCommand::SolidRect { height: SHADOW_DEPTH, .. }));
        assert!(matches!(cmds[2], PaintCommand::SolidRect { width: SHADOW_DEPTH, .. }));
        assert!(matches!(cmds[3], PaintCommand::StrokeRect { .. }));
        match &cmds[4] {
            PaintCommand::Text { lines, rgba, .. } => {
                assert_eq!(lines, &vec!["Step".to_string()]);
                assert_eq!(*rgba, Palette::for_background(Rgba::parse("#fffdfa")).accent);
            }
            other => panic!("expected text last, got {:?}", other),
        }
    }
}
