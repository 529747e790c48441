use std::collections::VecDeque;

use pulldown_cmark::{CowStr, Event, Tag, TagEnd};

use super::Plugin;

/// No intraword emphasis: an emphasis or strong span whose closing delimiter
/// is directly followed by a letter or digit is turned back into literal
/// text, so `foo*bar*baz` renders as written.
///
/// Underscores need no help here: CommonMark never lets `_` close inside a
/// word, so the delimiter restored is always `*`.
#[derive(Default, Clone)]
pub struct IntrawordEmphasis;

struct Iter<'a, I> {
    inner: I,
    /// Events held back while a span is open or its closer is undecided.
    buffer: Vec<Event<'a>>,
    /// Buffer indices of the open spans' start events.
    open: Vec<usize>,
    /// Buffer indices of the start and end of the span closed last.
    closed: Option<(usize, usize)>,
    ready: VecDeque<Event<'a>>,
}

impl Plugin for IntrawordEmphasis {
    fn remap<'a, I>(&'a mut self, events: I) -> impl Iterator<Item = Event<'a>> + 'a
        where I: Iterator<Item = Event<'a>> + 'a
    {
        Iter { inner: events, buffer: vec![], open: vec![], closed: None, ready: VecDeque::new() }
    }
}

fn delimiter<'a>(event: &Event<'_>) -> CowStr<'a> {
    match event {
        Event::Start(Tag::Strong) => CowStr::Borrowed("**"),
        _ => CowStr::Borrowed("*"),
    }
}

fn starts_word(event: &Event<'_>) -> bool {
    match event {
        Event::Text(text) => text.chars().next().is_some_and(char::is_alphanumeric),
        _ => false,
    }
}

impl<'a, I: Iterator<Item = Event<'a>>> Iterator for Iter<'a, I> {
    type Item = Event<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(event) = self.ready.pop_front() {
                return Some(event);
            }

            let event = self.inner.next();
            if let Some((start, end)) = self.closed.take() {
                if event.as_ref().is_some_and(starts_word) {
                    let literal = delimiter(&self.buffer[start]);
                    self.buffer[start] = Event::Text(literal.clone());
                    self.buffer[end] = Event::Text(literal);
                }
            }

            let Some(event) = event else {
                if self.buffer.is_empty() {
                    return None;
                }

                self.open.clear();
                self.ready.extend(self.buffer.drain(..));
                continue;
            };

            match event {
                Event::Start(Tag::Emphasis | Tag::Strong) => {
                    self.open.push(self.buffer.len());
                    self.buffer.push(event);
                }
                Event::End(TagEnd::Emphasis | TagEnd::Strong) if !self.open.is_empty() => {
                    let start = self.open.pop().unwrap_or_default();
                    self.closed = Some((start, self.buffer.len()));
                    self.buffer.push(event);
                }
                event if self.buffer.is_empty() => return Some(event),
                event => self.buffer.push(event),
            }

            if self.open.is_empty() && self.closed.is_none() {
                self.ready.extend(self.buffer.drain(..));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::markdown::render_markdown;

    #[test]
    fn intraword_stars_stay_literal() {
        assert_eq!(render_markdown("foo*bar*baz\n"), "<p>foo*bar*baz</p>\n");
        assert_eq!(render_markdown("foo**bar**baz\n"), "<p>foo**bar**baz</p>\n");
        assert_eq!(render_markdown("*a*b\n"), "<p>*a*b</p>\n");
    }

    #[test]
    fn underscores_stay_literal() {
        assert_eq!(render_markdown("snake_case_name\n"), "<p>snake_case_name</p>\n");
    }

    #[test]
    fn word_boundary_emphasis_still_works() {
        assert_eq!(render_markdown("a *b* c\n"), "<p>a <em>b</em> c</p>\n");
        assert_eq!(render_markdown("**bold**, *it*.\n"), "<p><strong>bold</strong>, <em>it</em>.</p>\n");
    }

    #[test]
    fn nested_spans() {
        let html = render_markdown("*outer **inner** end*\n");
        assert_eq!(html, "<p><em>outer <strong>inner</strong> end</em></p>\n");

        let html = render_markdown("*x **y**z*\n");
        assert_eq!(html, "<p><em>x **y**z</em></p>\n");
    }
}
