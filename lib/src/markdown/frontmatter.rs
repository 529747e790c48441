use memchr::memmem;

use crate::error::Result;

const PREFIX: &[u8] = b"---\n";
const SUFFIX: &[u8] = b"\n---\n\n";

/// Splits `input` into its front matter block and body.
///
/// A document has front matter iff it starts with `---\n`. The block then
/// extends up to the first `\n---\n\n`, and the body is everything after it,
/// untouched. Without the opening delimiter the front matter is empty and
/// the body is all of `input`.
///
/// ```rust
/// use sitegen::markdown::split_front_matter;
///
/// let (meta, body) = split_front_matter(b"---\ntitle: Hi\n---\n\n# Hi\n").unwrap();
/// assert_eq!(meta, b"title: Hi");
/// assert_eq!(body, b"# Hi\n");
/// ```
pub fn split_front_matter(input: &[u8]) -> Result<(&[u8], &[u8])> {
    if !input.starts_with(PREFIX) {
        return Ok((&[], input));
    }

    // The opener's own newline may double as the terminator's leading one,
    // which is how an empty block (`---\n---\n\n`) is spelled.
    let search_from = PREFIX.len() - 1;
    let end = match memmem::find(&input[search_from..], SUFFIX) {
        Some(i) => search_from + i,
        None => return err! {
            "missing front matter terminator",
            "expected" => "a line containing only `---` followed by a blank line",
        },
    };

    let front_matter = &input[PREFIX.len().min(end)..end];
    let body = &input[end + SUFFIX.len()..];
    Ok((front_matter, body))
}
