use std::collections::VecDeque;

use pulldown_cmark::{CowStr, Event, LinkType, Tag, TagEnd};

use super::Plugin;

/// Typographic fractions: a standalone `N/D` in text, numerator starting
/// with a nonzero digit, becomes `<sup>N</sup>&frasl;<sub>D</sub>`. The
/// Unicode fraction slash `⁄` is accepted in place of `/`.
///
/// Slash-separated runs such as dates (`1/23/2005`) are left alone, as are
/// code and the text of autolinks.
#[derive(Default, Clone)]
pub struct Fractions;

struct Iter<'a, I> {
    inner: I,
    autolinks: usize,
    stack: VecDeque<Event<'a>>,
}

impl Plugin for Fractions {
    fn remap<'a, I>(&'a mut self, events: I) -> impl Iterator<Item = Event<'a>> + 'a
        where I: Iterator<Item = Event<'a>> + 'a
    {
        Iter { inner: events, autolinks: 0, stack: VecDeque::new() }
    }
}

impl<'a, I: Iterator<Item = Event<'a>>> Iterator for Iter<'a, I> {
    type Item = Event<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(event) = self.stack.pop_front() {
            return Some(event);
        }

        let event = self.inner.next()?;
        match &event {
            Event::Start(Tag::Link { link_type: LinkType::Autolink, .. }) => self.autolinks += 1,
            Event::End(TagEnd::Link) if self.autolinks > 0 => self.autolinks -= 1,
            Event::Text(text) if self.autolinks == 0 => {
                let Some(segments) = split(text) else {
                    return Some(event);
                };

                self.stack.extend(segments.into_iter().map(Segment::into_event));
                return self.stack.pop_front();
            }
            _ => {}
        }

        Some(event)
    }
}

#[derive(Debug, PartialEq)]
enum Segment<'t> {
    Text(&'t str),
    Fraction(&'t str, &'t str),
}

impl Segment<'_> {
    fn into_event<'a>(self) -> Event<'a> {
        match self {
            Segment::Text(text) => Event::Text(CowStr::from(text.to_string())),
            Segment::Fraction(num, den) => {
                let html = format!("<sup>{num}</sup>&frasl;<sub>{den}</sub>");
                Event::InlineHtml(CowStr::from(html))
            }
        }
    }
}

const FRACTION_SLASH: &str = "\u{2044}";

/// `None` and the end of the text count as boundaries.
fn is_boundary(b: Option<u8>) -> bool {
    b.map_or(true, |b| b.is_ascii_whitespace() || b.is_ascii_punctuation())
}

/// Splits `text` around its fractions, or returns `None` if it has none.
fn split(text: &str) -> Option<Vec<Segment<'_>>> {
    let bytes = text.as_bytes();
    let mut segments = vec![];
    let mut copied = 0;
    let mut i = 0;
    while i < bytes.len() {
        let prev = i.checked_sub(1).map(|j| bytes[j]);
        let starts = matches!(bytes[i], b'1'..=b'9') && is_boundary(prev) && prev != Some(b'/');
        match starts.then(|| fraction_at(text, i)).flatten() {
            Some((num, den, end)) => {
                if copied < i {
                    segments.push(Segment::Text(&text[copied..i]));
                }

                segments.push(Segment::Fraction(num, den));
                copied = end;
                i = end;
            }
            None => i += 1,
        }
    }

    if segments.is_empty() {
        return None;
    }

    if copied < text.len() {
        segments.push(Segment::Text(&text[copied..]));
    }

    Some(segments)
}

/// Matches `digits (/|⁄) digits` at `start`, followed by a boundary other
/// than `/`. Returns the numerator, the denominator and the end offset.
fn fraction_at(text: &str, start: usize) -> Option<(&str, &str, usize)> {
    let digits = |from: usize| text[from..].bytes().take_while(u8::is_ascii_digit).count();

    let num_end = start + digits(start);
    let rest = &text[num_end..];
    let den_start = if rest.starts_with('/') {
        num_end + 1
    } else if rest.starts_with(FRACTION_SLASH) {
        num_end + FRACTION_SLASH.len()
    } else {
        return None;
    };

    let den_end = den_start + digits(den_start);
    let next = text.as_bytes().get(den_end).copied();
    if den_end == den_start || !is_boundary(next) || next == Some(b'/') {
        return None;
    }

    Some((&text[start..num_end], &text[den_start..den_end], den_end))
}

#[cfg(test)]
mod tests {
    use super::{split, Segment::*};
    use crate::markdown::render_markdown;

    #[test]
    fn standalone_fractions() {
        assert_eq!(split("add 1/2 cup"), Some(vec![Text("add "), Fraction("1", "2"), Text(" cup")]));
        assert_eq!(split("1/4, 3/4."), Some(vec![Fraction("1", "4"), Text(", "), Fraction("3", "4"), Text(".")]));
        assert_eq!(split("11/16"), Some(vec![Fraction("11", "16")]));
        assert_eq!(split("(5\u{2044}8)"), Some(vec![Text("("), Fraction("5", "8"), Text(")")]));
    }

    #[test]
    fn embedded_fractions_are_left_alone() {
        assert_eq!(split("1/23/2005"), None);
        assert_eq!(split("a1/2"), None);
        assert_eq!(split("a/1/2"), None);
        assert_eq!(split("0/5"), None);
        assert_eq!(split("1/2a"), None);
        assert_eq!(split("1/"), None);
        assert_eq!(split("no fractions"), None);
    }

    #[test]
    fn renders_as_markup() {
        let html = render_markdown("Take 1/2 of `1/2` & 7/8.\n");
        assert_eq!(html, "<p>Take <sup>1</sup>&frasl;<sub>2</sub> of <code>1/2</code> &amp; \
                          <sup>7</sup>&frasl;<sub>8</sub>.</p>\n");
    }
}
