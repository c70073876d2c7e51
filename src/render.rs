//! HTML output for a parsed document.
//!
//! Rendering is a pure function of the tree, so a tree the lookup engine
//! did not touch renders byte-for-byte the same as one it never saw.

use std::fmt::Write as _;

use crate::document::{Block, CalloutList, Document, Listing, Paragraph, Section, split_callouts};

/// `class="base role1 role2"`.
fn class_attr(base: &str, roles: &[String]) -> String {
    let mut class = base.to_string();
    for role in roles {
        class.push(' ');
        class.push_str(role);
    }
    return class;
}

/// Escape text for HTML element content and attribute values.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(ch),
        }
    }
    return out;
}

/// Render a whole document as a standalone HTML page.
pub fn render_document(document: &Document) -> String {
    let mut out = String::new();
    out.push_str("<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"UTF-8\">\n");
    if let Some(title) = &document.title {
        let _ = writeln!(out, "<title>{}</title>", escape_html(title));
    }
    out.push_str("</head>\n<body>\n");
    if let Some(title) = &document.title {
        let _ = writeln!(out, "<h1>{}</h1>", escape_html(title));
    }
    for block in &document.blocks {
        render_block(&mut out, block);
    }
    out.push_str("</body>\n</html>\n");
    return out;
}

fn render_block(out: &mut String, block: &Block) {
    match block {
        Block::CalloutList(list) => render_callout_list(out, list),
        Block::Listing(listing) => render_listing(out, listing),
        Block::Paragraph(para) => render_paragraph(out, para),
        Block::Section(section) => render_section(out, section),
    }
}

fn render_callout_list(out: &mut String, list: &CalloutList) {
    let _ = writeln!(out, "<div class=\"{}\">", class_attr("colist arabic", &list.roles));
    out.push_str("<ol>\n");
    for item in &list.items {
        let anchors: Vec<String> = match &list.scope {
            Some(scope) => callout_occurrences(list, item.number)
                .into_iter()
                .map(|occurrence| return scope.anchor(occurrence))
                .collect(),
            None => Vec::new(),
        };
        if anchors.is_empty() {
            let _ = writeln!(out, "<li><p>{}</p></li>", escape_html(&item.text));
        } else {
            let _ = writeln!(
                out,
                "<li data-coids=\"{}\"><p>{}</p></li>",
                anchors.join(" "),
                escape_html(&item.text)
            );
        }
    }
    out.push_str("</ol>\n</div>\n");
}

/// Occurrence numbers (1-based) of marker `number` in the explained listing.
fn callout_occurrences(list: &CalloutList, number: u32) -> Vec<usize> {
    return list
        .markers
        .iter()
        .enumerate()
        .filter(|(_, n)| return **n == number)
        .map(|(i, _)| return i.saturating_add(1))
        .collect();
}

fn render_listing(out: &mut String, listing: &Listing) {
    let _ = writeln!(out, "<div class=\"{}\">", class_attr("listingblock", &listing.roles));
    if let Some(title) = &listing.title {
        let _ = writeln!(out, "<div class=\"title\">{}</div>", escape_html(title));
    }
    out.push_str("<div class=\"content\">\n");
    match &listing.language {
        Some(lang) => {
            let lang = escape_html(lang);
            let _ = write!(out, "<pre class=\"highlight\"><code class=\"language-{lang}\" data-lang=\"{lang}\">");
        },
        None => out.push_str("<pre><code>"),
    }

    let mut occurrence = 0_usize;
    let mut lines = listing.source.split('\n').peekable();
    while let Some(line) = lines.next() {
        let (code, numbers) = split_callouts(line);
        out.push_str(&escape_html(code));
        for number in numbers {
            occurrence = occurrence.saturating_add(1);
            out.push(' ');
            if let Some(scope) = &listing.scope {
                let _ = write!(out, "<a id=\"{}\"></a>", scope.anchor(occurrence));
            }
            let _ = write!(out, "<b class=\"conum\">({number})</b>");
        }
        if lines.peek().is_some() {
            out.push('\n');
        }
    }
    out.push_str("</code></pre>\n</div>\n</div>\n");
}

fn render_paragraph(out: &mut String, para: &Paragraph) {
    let _ = writeln!(out, "<div class=\"{}\">", class_attr("paragraph", &para.roles));
    if let Some(title) = &para.title {
        let _ = writeln!(out, "<div class=\"title\">{}</div>", escape_html(title));
    }
    let _ = writeln!(out, "<p>{}</p>", escape_html(&para.text));
    out.push_str("</div>\n");
}

fn render_section(out: &mut String, section: &Section) {
    let level = section.level.saturating_add(1).min(6);
    let _ = writeln!(
        out,
        "<div class=\"{}\">\n<h{level}>{}</h{level}>\n</div>",
        class_attr(&format!("sect{}", section.level), &section.roles),
        escape_html(&section.title)
    );
}
