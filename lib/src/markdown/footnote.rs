use pulldown_cmark::{Event, Tag, TagEnd};
use rustc_hash::FxHashMap;

use super::Plugin;

/// The glyph linking a footnote definition back to its reference.
pub const RETURN_GLYPH: &str = "↩";

/// Renders footnotes with return links.
///
/// Footnotes are numbered in order of first appearance. Each reference gets
/// an `id="fnref:LABEL"` anchor, and each definition ends with a
/// [`RETURN_GLYPH`] link back to it.
#[derive(Default, Clone)]
pub struct FootnoteReturn {
    numbers: FxHashMap<String, usize>,
}

impl FootnoteReturn {
    fn number(&mut self, label: &str) -> usize {
        let next = self.numbers.len() + 1;
        *self.numbers.entry(label.to_string()).or_insert(next)
    }
}

struct Footnotes<'p, I> {
    plugin: &'p mut FootnoteReturn,
    open: Vec<String>,
    inner: I,
}

impl Plugin for FootnoteReturn {
    fn remap<'a, I>(&'a mut self, events: I) -> impl Iterator<Item = Event<'a>> + 'a
        where I: Iterator<Item = Event<'a>> + 'a
    {
        Footnotes { plugin: self, open: vec![], inner: events }
    }
}

fn escape_label(label: &str) -> String {
    label.replace('&', "&amp;").replace('"', "&quot;").replace('<', "&lt;")
}

impl<'a, I: Iterator<Item = Event<'a>>> Iterator for Footnotes<'_, I> {
    type Item = Event<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let html = match self.inner.next()? {
            Event::FootnoteReference(label) => {
                let n = self.plugin.number(&label);
                let label = escape_label(&label);
                format!("<sup class=\"footnote-ref\" id=\"fnref:{label}\">\
                    <a href=\"#fn:{label}\">{n}</a></sup>")
            }
            Event::Start(Tag::FootnoteDefinition(label)) => {
                let n = self.plugin.number(&label);
                let label = escape_label(&label);
                let html = format!("<div class=\"footnote-definition\" id=\"fn:{label}\">\
                    <sup class=\"footnote-definition-label\">{n}</sup>\n");
                self.open.push(label);
                html
            }
            Event::End(TagEnd::FootnoteDefinition) => {
                let label = self.open.pop().unwrap_or_default();
                format!("<a class=\"footnote-return\" href=\"#fnref:{label}\">{RETURN_GLYPH}</a></div>\n")
            }
            event => return Some(event),
        };

        Some(Event::Html(html.into()))
    }
}
