//! Inline style declarations and the scoped root-style override.

use super::RenderCapture;
use cssparser::{
    AtRuleParser, CowRcStr, DeclarationParser, ParseError, Parser, ParserInput, ParserState,
    QualifiedRuleParser, RuleBodyItemParser, RuleBodyParser,
};

/// Ordered `property: value` pairs of an inline `style` attribute.
///
/// Order is preserved so that re-serializing an untouched declaration list
/// yields the same declarations in the same sequence.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StyleDeclarations {
    entries: Vec<(String, String)>,
}

impl StyleDeclarations {
    /// Parse attribute text. Malformed declarations are skipped; values
    /// keep their source text, so quoted strings and `url(...)` arguments
    /// containing `;` or `:` survive intact.
    pub fn parse(attr: &str) -> Self {
        let mut entries = Vec::new();
        let mut input = ParserInput::new(attr);
        let mut parser = Parser::new(&mut input);
        let mut decl_parser = InlineDeclarationParser { entries: &mut entries };
        for result in RuleBodyParser::new(&mut parser, &mut decl_parser) {
            let _ = result;
        }
        Self { entries }
    }

    pub fn get(&self, property: &str) -> Option<&str> {
        // Later declarations win, as in CSS.
        self.entries
            .iter()
            .rev()
            .find(|(p, _)| p.eq_ignore_ascii_case(property))
            .map(|(_, v)| v.as_str())
    }

    /// Set or (with `None`) remove a property.
    pub fn set(&mut self, property: &str, value: Option<&str>) {
        let property = property.to_ascii_lowercase();
        match value {
            Some(v) => {
                if let Some(slot) = self.entries.iter_mut().find(|(p, _)| *p == property) {
                    slot.1 = v.to_string();
                } else {
                    self.entries.push((property, v.to_string()));
                }
            }
            None => self.entries.retain(|(p, _)| *p != property),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Serialize back to attribute text (`a: b; c: d`).
    pub fn to_attribute(&self) -> String {
        self.entries
            .iter()
            .map(|(p, v)| format!("{}: {}", p, v))
            .collect::<Vec<_>>()
            .join("; ")
    }
}

struct InlineDeclarationParser<'a> {
    entries: &'a mut Vec<(String, String)>,
}

impl<'i> AtRuleParser<'i> for InlineDeclarationParser<'_> {
    type Prelude = ();
    type AtRule = ();
    type Error = ();

    fn parse_prelude<'t>(
        &mut self,
        _name: CowRcStr<'i>,
        input: &mut Parser<'i, 't>,
    ) -> Result<Self::Prelude, ParseError<'i, Self::Error>> {
        Err(input.new_custom_error(()))
    }
}

impl<'i> QualifiedRuleParser<'i> for InlineDeclarationParser<'_> {
    type Prelude = ();
    type QualifiedRule = ();
    type Error = ();

    fn parse_prelude<'t>(
        &mut self,
        input: &mut Parser<'i, 't>,
    ) -> Result<Self::Prelude, ParseError<'i, Self::Error>> {
        Err(input.new_custom_error(()))
    }
}

impl<'i> DeclarationParser<'i> for InlineDeclarationParser<'_> {
    type Declaration = ();
    type Error = ();

    fn parse_value<'t>(
        &mut self,
        name: CowRcStr<'i>,
        input: &mut Parser<'i, 't>,
        _start: &ParserState,
    ) -> Result<Self::Declaration, ParseError<'i, Self::Error>> {
        let start = input.position();
        while input.next().is_ok() {}
        let value = input.slice_from(start).trim();
        if value.is_empty() {
            return Err(input.new_custom_error(()));
        }
        self.entries.push((name.to_ascii_lowercase(), value.to_string()));
        Ok(())
    }
}

impl<'i> RuleBodyItemParser<'i, (), ()> for InlineDeclarationParser<'_> {
    fn parse_declarations(&self) -> bool {
        true
    }
    fn parse_qualified(&self) -> bool {
        false
    }
}

/// Parse a CSS length into logical pixels. Supports `px`, `rem`/`em`
/// (16px) and unitless zero.
pub fn parse_length(value: &str) -> Option<f32> {
    let v = value.trim();
    if let Some(n) = v.strip_suffix("px") {
        return n.trim().parse().ok();
    }
    if let Some(n) = v.strip_suffix("rem").or_else(|| v.strip_suffix("em")) {
        return n.trim().parse::<f32>().ok().map(|n| n * 16.0);
    }
    match v.parse::<f32>() {
        Ok(n) if n == 0.0 => Some(0.0),
        _ => None,
    }
}

/// Box edges in logical pixels.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Edges {
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
    pub left: f32,
}

impl Edges {
    pub fn uniform(v: f32) -> Self {
        Self { top: v, right: v, bottom: v, left: v }
    }

    /// Expand a 1-4 value shorthand such as `padding: 32px 24px`.
    pub fn from_shorthand(value: &str) -> Option<Self> {
        let parts = value
            .split_whitespace()
            .map(parse_length)
            .collect::<Option<Vec<f32>>>()?;
        match parts.as_slice() {
            [a] => Some(Self::uniform(*a)),
            [v, h] => Some(Self { top: *v, right: *h, bottom: *v, left: *h }),
            [t, h, b] => Some(Self { top: *t, right: *h, bottom: *b, left: *h }),
            [t, r, b, l] => Some(Self { top: *t, right: *r, bottom: *b, left: *l }),
            _ => None,
        }
    }
}

/// Temporarily overrides one style property on the capture's root.
///
/// The whole original `style` attribute is snapshotted and written back on
/// drop, so the root ends up byte-identical to its pre-override state on
/// every exit path, including early returns and panics.
pub struct StyleOverride<'a> {
    capture: &'a dyn RenderCapture,
    original: Option<String>,
}

impl<'a> StyleOverride<'a> {
    pub fn apply(capture: &'a dyn RenderCapture, property: &str, value: &str) -> Self {
        let original = capture.root_style_attribute();
        capture.set_root_style(property, Some(value));
        Self { capture, original }
    }
}

impl Drop for StyleOverride<'_> {
    fn drop(&mut self) {
        self.capture.set_root_style_attribute(self.original.take());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_get_set_roundtrip() {
        let mut s = StyleDeclarations::parse("width:450px; box-shadow: 0 1px 2px red ;");
        assert_eq!(s.get("width"), Some("450px"));
        assert_eq!(s.get("BOX-SHADOW"), Some("0 1px 2px red"));
        s.set("box-shadow", Some("none"));
        s.set("padding-top", Some("4rem"));
        assert_eq!(s.to_attribute(), "width: 450px; box-shadow: none; padding-top: 4rem");
        s.set("width", None);
        assert_eq!(s.get("width"), None);
    }

    #[test]
    fn url_arguments_keep_separators() {
        let attr = "background-image: url('data:image/png;base64,QUJD'); color: red; \
                    background: url(data:image/png;base64,REVG) no-repeat";
        let s = StyleDeclarations::parse(attr);
        assert_eq!(s.get("background-image"), Some("url('data:image/png;base64,QUJD')"));
        assert_eq!(s.get("color"), Some("red"));
        assert_eq!(s.get("background"), Some("url(data:image/png;base64,REVG) no-repeat"));
        assert_eq!(StyleDeclarations::parse(&s.to_attribute()), s);
    }

    #[test]
    fn malformed_declarations_are_skipped() {
        let s = StyleDeclarations::parse("garbage; width: 10px; : 3px; height:; font-family: \"a;b\"");
        assert_eq!(s.get("width"), Some("10px"));
        assert_eq!(s.get("height"), None);
        assert_eq!(s.get("font-family"), Some("\"a;b\""));
        assert_eq!(s.to_attribute(), "width: 10px; font-family: \"a;b\"");
    }

    #[test]
    fn lengths_and_shorthand() {
        assert_eq!(parse_length("32px"), Some(32.0));
        assert_eq!(parse_length("4rem"), Some(64.0));
        assert_eq!(parse_length("0"), Some(0.0));
        assert_eq!(parse_length("auto"), None);
        let e = Edges::from_shorthand("32px 24px").unwrap();
        assert_eq!((e.top, e.right, e.bottom, e.left), (32.0, 24.0, 32.0, 24.0));
        assert!(Edges::from_shorthand("1px 2px 3px 4px 5px").is_none());
    }
}
