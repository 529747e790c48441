use std::collections::VecDeque;

use pulldown_cmark::{CowStr, Event, LinkType, Tag, TagEnd};

use super::Plugin;

const SCHEMES: &[&str] = &["http://", "https://", "ftp://"];

/// Links bare URLs in text: anything starting with `http://`, `https://`,
/// `ftp://` or `www.` at a word boundary, up to the next whitespace or `<`.
/// Trailing punctuation and unbalanced closing parentheses are left out of
/// the link. `www.` links point at `http://`.
///
/// Text already inside a link or image, markdown or inline HTML, is left
/// alone.
#[derive(Default, Clone)]
pub struct Autolink;

struct Iter<'a, I> {
    inner: I,
    peeked: Option<Event<'a>>,
    links: usize,
    stack: VecDeque<Event<'a>>,
}

impl Plugin for Autolink {
    fn remap<'a, I>(&'a mut self, events: I) -> impl Iterator<Item = Event<'a>> + 'a
        where I: Iterator<Item = Event<'a>> + 'a
    {
        Iter { inner: events, peeked: None, links: 0, stack: VecDeque::new() }
    }
}

impl<'a, I: Iterator<Item = Event<'a>>> Iter<'a, I> {
    fn next_event(&mut self) -> Option<Event<'a>> {
        self.peeked.take().or_else(|| self.inner.next())
    }

    /// Merges the run of text events starting with `first`: the parser may
    /// split a URL at punctuation it treats specially.
    fn text_run(&mut self, first: CowStr<'a>) -> CowStr<'a> {
        let mut run: Option<String> = None;
        loop {
            match self.next_event() {
                Some(Event::Text(text)) => {
                    run.get_or_insert_with(|| first.to_string()).push_str(&text);
                }
                other => {
                    self.peeked = other;
                    break;
                }
            }
        }

        run.map_or(first, CowStr::from)
    }
}

fn opens_html_link(html: &str) -> bool {
    let html = html.as_bytes();
    html.len() > 2 && html[..2].eq_ignore_ascii_case(b"<a")
        && (html[2].is_ascii_whitespace() || html[2] == b'>')
}

fn closes_html_link(html: &str) -> bool {
    html.len() >= 4 && html.as_bytes()[..4].eq_ignore_ascii_case(b"</a>")
}

impl<'a, I: Iterator<Item = Event<'a>>> Iterator for Iter<'a, I> {
    type Item = Event<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(event) = self.stack.pop_front() {
            return Some(event);
        }

        let event = self.next_event()?;
        match event {
            Event::Start(Tag::Link { .. } | Tag::Image { .. }) => self.links += 1,
            Event::End(TagEnd::Link | TagEnd::Image) => self.links = self.links.saturating_sub(1),
            Event::InlineHtml(ref html) if opens_html_link(html) => self.links += 1,
            Event::InlineHtml(ref html) if closes_html_link(html) => {
                self.links = self.links.saturating_sub(1);
            }
            Event::Text(text) if self.links == 0 => {
                let text = self.text_run(text);
                let urls = find_urls(&text);
                if urls.is_empty() {
                    return Some(Event::Text(text));
                }

                let mut copied = 0;
                for (start, end) in urls {
                    if copied < start {
                        self.stack.push_back(Event::Text(text[copied..start].to_string().into()));
                    }

                    self.stack.extend(link(&text[start..end]));
                    copied = end;
                }

                if copied < text.len() {
                    self.stack.push_back(Event::Text(text[copied..].to_string().into()));
                }

                return self.stack.pop_front();
            }
            _ => {}
        }

        Some(event)
    }
}

fn link<'a>(url: &str) -> [Event<'a>; 3] {
    let dest_url = match has_prefix(url, "www.") {
        true => format!("http://{url}"),
        false => url.to_string(),
    };

    [
        Event::Start(Tag::Link {
            link_type: LinkType::Autolink,
            dest_url: dest_url.into(),
            title: CowStr::Borrowed(""),
            id: CowStr::Borrowed(""),
        }),
        Event::Text(url.to_string().into()),
        Event::End(TagEnd::Link),
    ]
}

fn has_prefix(text: &str, prefix: &str) -> bool {
    text.len() >= prefix.len()
        && text.as_bytes()[..prefix.len()].eq_ignore_ascii_case(prefix.as_bytes())
}

/// Byte ranges of the bare URLs in `text`, in order.
fn find_urls(text: &str) -> Vec<(usize, usize)> {
    let bytes = text.as_bytes();
    let mut urls = vec![];
    let mut i = 0;
    while i < bytes.len() {
        let at_boundary = i == 0 || !bytes[i - 1].is_ascii_alphanumeric();
        let prefix = SCHEMES.iter().copied().chain(["www."])
            .find(|prefix| has_prefix(&text[i..], prefix));

        match prefix.filter(|_| at_boundary).and_then(|p| url_end(text, i, p.len())) {
            Some(end) => {
                urls.push((i, end));
                i = end;
            }
            None => i += 1,
        }

        while !text.is_char_boundary(i) {
            i += 1;
        }
    }

    urls
}

/// The end of the URL starting at `start`, if anything follows its prefix.
fn url_end(text: &str, start: usize, prefix_len: usize) -> Option<usize> {
    let rest = &text[start..];
    let mut end = rest.find(|c: char| c.is_whitespace() || c == '<').unwrap_or(rest.len());

    loop {
        let url = &rest[..end];
        match url.chars().last() {
            Some('.' | ',' | ':' | ';' | '!' | '?' | '\'' | '"' | '*' | '_') => end -= 1,
            Some(')') if url.matches('(').count() < url.matches(')').count() => end -= 1,
            _ => break,
        }
    }

    if end <= prefix_len {
        return None;
    }

    let host = rest[prefix_len..end].chars().next()?;
    host.is_alphanumeric().then_some(start + end)
}
