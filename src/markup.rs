//! Rich text markup builders
//!
//! The proposal document is a small HTML-like subset. These helpers are the
//! only place that knows the tag spelling; the terminal view in `ui::markup_view`
//! parses exactly what is produced here.

/// `<h3>` heading
pub fn heading(text: &str) -> String {
    format!("<h3>{}</h3>", text)
}

/// Hyperlink whose activation is reported back as the `id` user action
pub fn link(text: &str, id: &str) -> String {
    format!("<a href=\"{}\">{}</a>", id, text)
}

/// Paragraph
pub fn para(text: &str) -> String {
    format!("<p>{}</p>", text)
}

pub fn bold(text: &str) -> String {
    format!("<b>{}</b>", text)
}

/// Coloured text, e.g. `colorize(warning, "red")`
pub fn colorize(text: &str, color: &str) -> String {
    format!("<font color=\"{}\">{}</font>", color, text)
}

/// Bulleted list
pub fn list<S: AsRef<str>>(items: &[S]) -> String {
    let mut out = String::from("<ul>");
    for item in items {
        out.push_str("<li>");
        out.push_str(item.as_ref());
        out.push_str("</li>");
    }
    out.push_str("</ul>");
    out
}

/// `count` forced line breaks
pub fn newlines(count: usize) -> String {
    "<br>".repeat(count)
}

/// Whether a title already carries its own hyperlink
pub fn contains_link(text: &str) -> bool {
    text.contains("<a")
}
