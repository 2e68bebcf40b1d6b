//! Renders an [`ExplanationDocument`] into the markup the exporters capture.
//!
//! The output carries the two structural markers the export pipeline relies
//! on: a `text-center` header region and one `explanation-section-card` per
//! section. Tailwind classes match the live page so HTML snapshots style the
//! same way when opened standalone.

use crate::document::{
    BulletPoint, Example, ExplanationDocument, IconKey, NumberedStep, PowerCard, Section,
    SectionContent, ToolChip,
};

/// Shadow the live root carries; exporters suppress it while rasterizing.
pub const ROOT_SHADOW: &str = "0 10px 15px -3px rgba(0, 0, 0, 0.1)";

pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Escape text and turn `**bold**` runs into `<strong>`.
pub fn inline_markdown(text: &str) -> String {
    let mut out = String::new();
    let mut rest = text;
    while let Some(start) = rest.find("**") {
        let after = &rest[start + 2..];
        match after.find("**") {
            Some(end) => {
                out.push_str(&escape_html(&rest[..start]));
                out.push_str("<strong>");
                out.push_str(&escape_html(&after[..end]));
                out.push_str("</strong>");
                rest = &after[end + 2..];
            }
            None => break,
        }
    }
    out.push_str(&escape_html(rest));
    out
}

fn step_name(step: u8) -> String {
    match step {
        1 => "初识".to_string(),
        2 => "神通".to_string(),
        3 => "揭秘".to_string(),
        4 => "分身".to_string(),
        5 => "修炼".to_string(),
        6 => "利器".to_string(),
        7 => "身边".to_string(),
        n => format!("步骤 {}", n),
    }
}

fn icon_glyph(key: IconKey) -> &'static str {
    match key {
        IconKey::Info => "💡",
        IconKey::Capacity => "⚡",
        IconKey::Process => "⚙️",
        IconKey::Types => "🧩",
        IconKey::Learn => "📚",
        IconKey::Tools => "🛠️",
        IconKey::Life => "🌱",
    }
}

/// Render the full explanation: root wrapper, header, section cards.
pub fn render_explanation(doc: &ExplanationDocument) -> String {
    let mut out = format!(
        "<div class=\"max-w-4xl mx-auto my-8 p-4 md:p-8 bg-[#fffdfa] rounded-2xl shadow-lg\" style=\"box-shadow: {}\">",
        ROOT_SHADOW
    );
    out.push_str("<div class=\"text-center mb-8\">");
    out.push_str(&format!(
        "<h1 class=\"text-3xl md:text-4xl font-extrabold text-[#2d3336] tracking-tight\">{}{}</h1>",
        if doc.topic_emoji.is_empty() { String::new() } else { format!("{} ", escape_html(&doc.topic_emoji)) },
        inline_markdown(&doc.main_title)
    ));
    out.push_str(&format!(
        "<p class=\"mt-2 text-[#2d3336]\">{}</p>",
        inline_markdown(&doc.subtitle)
    ));
    out.push_str("</div>");
    for section in &doc.sections {
        out.push_str(&render_section(section));
    }
    out.push_str("</div>");
    out
}

fn render_section(section: &Section) -> String {
    let mut out = String::from(
        "<div class=\"explanation-section-card bg-white rounded-xl shadow-sm p-6 mb-6 border border-slate-200/80\">",
    );
    out.push_str(&format!(
        "<div class=\"flex items-center mb-4\"><span class=\"w-7 h-7 mr-3 text-[#e14b30]\">{}</span>\
         <h3 class=\"text-xl font-bold text-[#2d3336]\"><span class=\"text-[#e14b30]\">{}</span> | {}</h3></div>",
        icon_glyph(section.icon_key),
        step_name(section.step),
        inline_markdown(&section.title)
    ));
    if let Some(desc) = &section.description {
        out.push_str(&format!("<p class=\"text-[#2d3336] mb-5\">{}</p>", inline_markdown(desc)));
    }
    out.push_str(&render_content(&section.content));
    out.push_str("</div>");
    out
}

fn render_content(content: &SectionContent) -> String {
    if let Some(items) = &content.bullets {
        return render_bullets(items);
    }
    if let Some(items) = &content.power_cards {
        return render_power_cards(items, content.example.as_ref());
    }
    if let Some(items) = &content.numbered_steps {
        return render_steps(items);
    }
    if let (Some(items), Some(summary)) = (&content.tool_chips, &content.summary) {
        return render_chips(items, summary);
    }
    if let Some(items) = &content.final_list {
        return render_final_list(items);
    }
    String::new()
}

fn render_bullets(items: &[BulletPoint]) -> String {
    let lis: String = items
        .iter()
        .map(|b| format!("<li class=\"flex items-start\"><span class=\"text-[#2d3336]\">{}</span></li>", inline_markdown(&b.text)))
        .collect();
    format!("<ul class=\"space-y-3\">{}</ul>", lis)
}

fn render_power_cards(items: &[PowerCard], example: Option<&Example>) -> String {
    let cards: String = items
        .iter()
        .map(|c| {
            format!(
                "<div class=\"bg-[#fffdfa] rounded-lg p-4 text-center border\"><div class=\"text-3xl mb-2\">{}</div>\
                 <h4 class=\"font-bold text-[#2d3336]\">{}</h4><p class=\"text-sm text-[#2d3336] mt-1\">{}</p></div>",
                escape_html(&c.icon),
                inline_markdown(&c.title),
                inline_markdown(&c.description)
            )
        })
        .collect();
    let mut out = format!("<div><div class=\"grid grid-cols-1 md:grid-cols-3 gap-4\">{}</div>", cards);
    if let Some(ex) = example {
        out.push_str(&format!(
            "<div class=\"mt-6 bg-[#fef3f2] border-l-4 border-[#e14b30] p-4 rounded-r-lg\">\
             <p class=\"font-semibold text-[#b63c27]\">例如：</p>\
             <p class=\"text-[#b63c27] mt-1\">你说：“{}”</p>\
             <p class=\"text-[#b63c27] mt-2\">AI 会自动完成这一切：{}</p></div>",
            escape_html(&ex.trigger),
            inline_markdown(&ex.result)
        ));
    }
    out.push_str("</div>");
    out
}

fn render_steps(items: &[NumberedStep]) -> String {
    let steps: String = items
        .iter()
        .enumerate()
        .map(|(i, s)| {
            format!(
                "<div class=\"flex items-start\"><div class=\"flex-shrink-0 w-8 h-8 bg-[#fef3f2] text-[#e14b30] font-bold rounded-full\">{}</div>\
                 <div><h4 class=\"font-semibold text-[#2d3336]\">{}</h4><p class=\"text-[#2d3336]\">{}</p></div></div>",
                i + 1,
                inline_markdown(&s.title),
                inline_markdown(&s.description)
            )
        })
        .collect();
    format!("<div class=\"space-y-4\">{}</div>", steps)
}

fn render_chips(items: &[ToolChip], summary: &str) -> String {
    let chips: String = items
        .iter()
        .map(|c| {
            format!(
                "<div class=\"bg-[#fef3f2] border border-[#e14b30] rounded-full px-4 py-1.5 text-sm text-[#b63c27]\"><span>{}</span> <span>{}</span></div>",
                escape_html(&c.icon),
                inline_markdown(&c.name)
            )
        })
        .collect();
    format!(
        "<div><div class=\"flex flex-wrap gap-3 mb-4\">{}</div>\
         <div class=\"bg-[#fef3f2] border-l-4 border-[#e14b30] p-4 rounded-r-lg text-[#b63c27]\">{}</div></div>",
        chips,
        inline_markdown(summary)
    )
}

fn render_final_list(items: &[String]) -> String {
    let lis: String = items.iter().map(|s| format!("<li>{}</li>", inline_markdown(s))).collect();
    format!("<ul class=\"list-disc list-inside space-y-2 text-[#2d3336]\">{}</ul>", lis)
}
