//! Markup to terminal lines
//!
//! Understands the tag subset the proposal produces: `h3`, `p`, `br`, `b`,
//! `font color`, `a href`, `ul` and `li`. Unknown tags are dropped and tag
//! names are case-insensitive. Whitespace collapses like in HTML.

use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};

use crate::theme::{Styles, markup_color};

/// A hyperlink found in the document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkTarget {
    pub id: String,
    pub text: String,
    /// Line the link starts on
    pub line: usize,
}

#[derive(Debug, Clone, Default)]
pub struct RenderedDocument {
    pub lines: Vec<Line<'static>>,
    pub links: Vec<LinkTarget>,
}

impl RenderedDocument {
    /// Plain text of every line, for tests and logs
    pub fn plain_lines(&self) -> Vec<String> {
        self.lines
            .iter()
            .map(|line| line.spans.iter().map(|s| s.content.as_ref()).collect())
            .collect()
    }
}

#[derive(Default)]
struct Renderer {
    lines: Vec<Line<'static>>,
    current: Vec<Span<'static>>,
    links: Vec<LinkTarget>,
    bold: usize,
    heading: bool,
    colors: Vec<ratatui::style::Color>,
    link: Option<(String, String, usize)>,
}

impl Renderer {
    fn style(&self) -> Style {
        let mut style = if self.heading {
            Styles::heading()
        } else {
            Styles::text()
        };
        if let Some(color) = self.colors.last() {
            style = style.fg(*color);
        }
        if self.bold > 0 {
            style = style.add_modifier(Modifier::BOLD);
        }
        if self.link.is_some() {
            style = style.patch(Styles::link());
        }
        style
    }

    fn text(&mut self, raw: &str) {
        let decoded = decode_entities(raw);
        let mut text = String::with_capacity(decoded.len());
        let mut last_space = self.current_ends_with_space();
        for c in decoded.chars() {
            if c.is_whitespace() {
                if !last_space {
                    text.push(' ');
                    last_space = true;
                }
            } else {
                text.push(c);
                last_space = false;
            }
        }
        if text.is_empty() {
            return;
        }
        if let Some((_, link_text, _)) = self.link.as_mut() {
            link_text.push_str(&text);
        }
        let style = self.style();
        self.current.push(Span::styled(text, style));
    }

    fn current_ends_with_space(&self) -> bool {
        match self.current.last() {
            Some(span) => span.content.ends_with(' '),
            None => true,
        }
    }

    fn break_line(&mut self) {
        if !self.current.is_empty() {
            self.force_break();
        }
    }

    fn force_break(&mut self) {
        let spans = std::mem::take(&mut self.current);
        self.lines.push(Line::from(spans));
    }

    fn tag(&mut self, tag: &str) {
        let tag = tag.trim();
        let closing = tag.starts_with('/');
        let tag = tag.trim_start_matches('/');
        let (name, attrs) = match tag.find(char::is_whitespace) {
            Some(pos) => (&tag[..pos], &tag[pos..]),
            None => (tag, ""),
        };

        match (name.to_ascii_lowercase().as_str(), closing) {
            ("h1" | "h2" | "h3" | "h4", false) => {
                self.break_line();
                self.heading = true;
            }
            ("h1" | "h2" | "h3" | "h4", true) => {
                self.heading = false;
                self.break_line();
            }
            ("p" | "ul" | "div", _) => self.break_line(),
            ("br" | "br/", _) => self.force_break(),
            ("b" | "strong", false) => self.bold += 1,
            ("b" | "strong", true) => self.bold = self.bold.saturating_sub(1),
            ("font", false) => {
                let color = attribute(attrs, "color").map(|c| markup_color(&c));
                self.colors.push(color.unwrap_or(crate::theme::Colors::FG_PRIMARY));
            }
            ("font", true) => {
                self.colors.pop();
            }
            ("a", false) => {
                if let Some(id) = attribute(attrs, "href") {
                    self.link = Some((id, String::new(), self.lines.len()));
                }
            }
            ("a", true) => {
                if let Some((id, text, line)) = self.link.take() {
                    self.links.push(LinkTarget {
                        id,
                        text: text.trim().to_string(),
                        line,
                    });
                }
            }
            ("li", false) => {
                self.break_line();
                self.current.push(Span::styled("  • ", Styles::text_muted()));
            }
            ("li", true) => self.break_line(),
            _ => {}
        }
    }

    fn finish(mut self) -> RenderedDocument {
        self.break_line();
        RenderedDocument {
            lines: self.lines,
            links: self.links,
        }
    }
}

fn attribute(attrs: &str, name: &str) -> Option<String> {
    let lower = attrs.to_ascii_lowercase();
    let start = lower.find(&format!("{}=", name))? + name.len() + 1;
    let value = &attrs[start..];
    let quote = value.chars().next()?;
    if quote == '"' || quote == '\'' {
        let end = value[1..].find(quote)?;
        Some(value[1..=end].to_string())
    } else {
        Some(
            value
                .split(|c: char| c.is_whitespace())
                .next()
                .unwrap_or_default()
                .to_string(),
        )
    }
}

fn decode_entities(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&nbsp;", " ")
        .replace("&amp;", "&")
}

/// Render markup into styled lines and collect its links
pub fn render(markup: &str) -> RenderedDocument {
    let mut renderer = Renderer::default();
    let mut rest = markup;

    while let Some(start) = rest.find('<') {
        renderer.text(&rest[..start]);
        match rest[start..].find('>') {
            Some(end) => {
                renderer.tag(&rest[start + 1..start + end]);
                rest = &rest[start + end + 1..];
            }
            None => {
                rest = &rest[start..];
                break;
            }
        }
    }
    renderer.text(rest);

    renderer.finish()
}
