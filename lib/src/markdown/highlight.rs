use std::borrow::Cow;
use std::fmt::Write;

use pulldown_cmark::{Event, Tag, CodeBlockKind, TagEnd};

use super::Plugin;

/// Replaces code blocks with `<highlight language="LANG">CODE</highlight>`
/// placeholders for a later syntax-coloring pass.
///
/// `LANG` is the first word of a fenced block's info string and empty for
/// indented blocks. `CODE` is the block's raw text, trailing whitespace
/// removed, not escaped.
#[derive(Default, Clone)]
pub struct Highlight;

struct CodeBlock {
    language: String,
    code: String,
}

pub struct Highlighter<I> {
    block: Option<CodeBlock>,
    inner: I,
}

impl Plugin for Highlight {
    fn remap<'a, I>(&'a mut self, events: I) -> impl Iterator<Item = Event<'a>> + 'a
        where I: Iterator<Item = Event<'a>> + 'a
    {
        Highlighter { block: None, inner: events }
    }
}

fn language(kind: &CodeBlockKind<'_>) -> String {
    match kind {
        CodeBlockKind::Fenced(info) => info.split_whitespace()
            .next()
            .unwrap_or_default()
            .to_string(),
        CodeBlockKind::Indented => String::new(),
    }
}

fn escape_attribute(value: &str) -> Cow<'_, str> {
    if !value.contains(&['&', '<', '>', '"'][..]) {
        return Cow::Borrowed(value);
    }

    let mut escaped = String::with_capacity(value.len() + 8);
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            c => escaped.push(c),
        }
    }

    Cow::Owned(escaped)
}

/// The trailing newline keeps the placeholder on its own line, like the
/// `</pre>` it replaces; consumers match on the element, not the whitespace.
#[allow(unused_must_use)]
fn highlight_tag(block: CodeBlock) -> String {
    let mut tag = String::with_capacity(block.code.len() + 40);
    write!(&mut tag, "<highlight language=\"{}\">", escape_attribute(&block.language));
    tag.push_str(block.code.trim_end());
    tag.push_str("</highlight>\n");
    tag
}

impl<'a, I: Iterator<Item = Event<'a>>> Iterator for Highlighter<I> {
    type Item = Event<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match self.inner.next()? {
                Event::Start(Tag::CodeBlock(kind)) => {
                    self.block = Some(CodeBlock { language: language(&kind), code: String::new() });
                }
                Event::Text(text) if self.block.is_some() => {
                    if let Some(block) = self.block.as_mut() {
                        block.code.push_str(&text);
                    }
                }
                Event::End(TagEnd::CodeBlock) if self.block.is_some() => {
                    let block = self.block.take()?;
                    return Some(Event::Html(highlight_tag(block).into()));
                }
                ev => return Some(ev),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::markdown::render_markdown;

    #[test]
    fn fenced_block_with_language() {
        let html = render_markdown("```php\n<?php echo 1; ?>\n```\n");
        assert_eq!(html, "<highlight language=\"php\"><?php echo 1; ?></highlight>\n");
    }

    #[test]
    fn info_string_uses_first_word() {
        let html = render_markdown("```rust ignore\nfn main() {}\n```\n");
        assert!(html.starts_with("<highlight language=\"rust\">fn main() {}</highlight>"));
    }

    #[test]
    fn fenced_block_without_language() {
        let html = render_markdown("```\nplain   \n\n\n```\n");
        assert_eq!(html, "<highlight language=\"\">plain</highlight>\n");
    }

    #[test]
    fn indented_block() {
        let html = render_markdown("Intro.\n\n    let x = 1;\n    let y = 2;\n");
        assert!(html.contains("<highlight language=\"\">let x = 1;\nlet y = 2;</highlight>"));
        assert!(!html.contains("<pre>"));
    }

    #[test]
    fn language_is_escaped() {
        let html = render_markdown("```c<&\"x\nint a;\n```\n");
        assert_eq!(html, "<highlight language=\"c&lt;&amp;&quot;x\">int a;</highlight>\n");
    }

    #[test]
    fn inline_code_is_untouched() {
        let html = render_markdown("Use `x` here.\n");
        assert!(html.contains("<code>x</code>"));
        assert!(!html.contains("<highlight"));
    }
}
