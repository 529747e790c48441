//! Markdown rendering and front matter handling.
//!
//! Markdown is rendered by [`pulldown_cmark`] with a fixed option set, the
//! parser's event stream flowing through a chain of [`Plugin`]s before being
//! written out as HTML. The chain is:
//!
//!   1. [`Highlight`]: code blocks become `<highlight>` placeholders.
//!   2. [`IntrawordEmphasis`]: `*` inside words stays literal.
//!   3. [`Autolink`]: bare URLs become links.
//!   4. [`FootnoteReturn`]: footnotes get numbered return links.
//!   5. [`Fractions`]: typographic fractions.

mod attributes;
mod autolink;
mod emphasis;
mod footnote;
mod fraction;
mod frontmatter;
mod highlight;

pub use attributes::parse_attributes;
pub use autolink::Autolink;
pub use emphasis::IntrawordEmphasis;
pub use footnote::{FootnoteReturn, RETURN_GLYPH};
pub use fraction::Fractions;
pub use frontmatter::split_front_matter;
pub use highlight::Highlight;

use pulldown_cmark::{html, Event, Options, Parser};

pub trait Plugin {
    #[inline(always)]
    fn remap<'a, I>(&'a mut self, events: I) -> impl Iterator<Item = Event<'a>> + 'a
        where I: Iterator<Item = Event<'a>> + 'a
    {
        events
    }
}

/// A markdown renderer with the site's extension set.
#[derive(Debug, Clone, Copy)]
pub struct Markdown {
    options: Options,
}

impl Default for Markdown {
    fn default() -> Self {
        Markdown {
            options: Options::ENABLE_TABLES
                | Options::ENABLE_FOOTNOTES
                | Options::ENABLE_STRIKETHROUGH
                | Options::ENABLE_SMART_PUNCTUATION
                | Options::ENABLE_HEADING_ATTRIBUTES,
        }
    }
}

impl Markdown {
    pub fn with_options(mut self, options: Options) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> Options {
        self.options
    }

    pub fn render(&self, input: &str) -> String {
        let mut highlight = Highlight;
        let mut emphasis = IntrawordEmphasis;
        let mut autolink = Autolink;
        let mut footnotes = FootnoteReturn::default();
        let mut fractions = Fractions;

        let events = Parser::new_ext(input, self.options);
        let events = highlight.remap(events);
        let events = emphasis.remap(events);
        let events = autolink.remap(events);
        let events = footnotes.remap(events);
        let events = fractions.remap(events);

        let mut output = String::with_capacity(input.len() + input.len() / 2);
        html::push_html(&mut output, events);
        output
    }
}

/// Renders `input` with the default [`Markdown`] renderer.
pub fn render_markdown(input: &str) -> String {
    Markdown::default().render(input)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_common_markdown() {
        let html = render_markdown("# Yup\n\nThis **works**!\n");
        assert_eq!(html, "<h1>Yup</h1>\n<p>This <strong>works</strong>!</p>\n");
    }

    #[test]
    fn tables_and_strikethrough() {
        let html = render_markdown("| a | b |\n|---|---|\n| 1 | 2 |\n\n~~gone~~\n");
        assert!(html.contains("<table>"));
        assert!(html.contains("<td>1</td>"));
        assert!(html.contains("<del>gone</del>"));
    }

    #[test]
    fn smart_punctuation() {
        let html = render_markdown("\"Quoted\" -- and --- it's done\n");
        assert!(html.contains("“Quoted”"));
        assert!(html.contains("–"));
        assert!(html.contains("—"));
        assert!(html.contains("it’s"));
    }

    #[test]
    fn explicit_heading_ids() {
        let html = render_markdown("## Title {#custom}\n");
        assert!(html.contains("<h2 id=\"custom\">Title</h2>"));
    }

    #[test]
    fn xhtml_void_tags() {
        let html = render_markdown("a\n\n---\n\n![alt](x.png)\n");
        assert!(html.contains("<hr />"));
        assert!(html.contains("<img src=\"x.png\" alt=\"alt\" />"));
    }

    #[test]
    fn plugins_compose() {
        let html = render_markdown("Mix 3/4 of foo*bar*baz at https://example.com/1/2.\n");
        assert_eq!(html, "<p>Mix <sup>3</sup>&frasl;<sub>4</sub> of foo*bar*baz at \
                          <a href=\"https://example.com/1/2\">https://example.com/1/2</a>.</p>\n");
    }
}
