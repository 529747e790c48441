use rustc_hash::FxHashMap;

/// Parses a whitespace-separated list of `key="value"` or `key='value'`
/// pairs, such as the attributes of a `<highlight>` tag.
///
/// Inside a value, `\"` and `\'` stand for the quote character itself; any
/// other backslash is kept verbatim. Malformed pieces (a key without `=`, a
/// value without quotes, stray text) are skipped. An unterminated quote
/// swallows the rest of the input. Parsing never fails.
///
/// ```rust
/// use sitegen::markdown::parse_attributes;
///
/// let attrs = parse_attributes(r#"language="php" title='A \' quote'"#);
/// assert_eq!(attrs["language"], "php");
/// assert_eq!(attrs["title"], "A ' quote");
/// ```
pub fn parse_attributes(input: &str) -> FxHashMap<String, String> {
    let mut attrs = FxHashMap::default();
    let mut rest = input;
    loop {
        rest = rest.trim_start();
        if rest.is_empty() {
            return attrs;
        }

        let key_len = rest.find(|c: char| c == '=' || c.is_whitespace())
            .unwrap_or(rest.len());

        let (key, after_key) = rest.split_at(key_len);
        let Some(after_eq) = after_key.strip_prefix('=') else {
            rest = skip_token(after_key);
            continue;
        };

        let quote = match after_eq.chars().next() {
            Some(q @ ('"' | '\'')) if !key.is_empty() => q,
            _ => {
                rest = skip_token(after_eq);
                continue;
            }
        };

        match quoted_value(&after_eq[1..], quote) {
            Some((value, remaining)) => {
                attrs.insert(key.to_string(), value);
                rest = remaining;
            }
            None => return attrs,
        }
    }
}

/// Skips to the next whitespace.
fn skip_token(input: &str) -> &str {
    let end = input.find(char::is_whitespace).unwrap_or(input.len());
    &input[end..]
}

/// Reads an escaped value up to the closing `quote`, returning the unescaped
/// value and the input following the quote, or `None` if it never closes.
fn quoted_value(input: &str, quote: char) -> Option<(String, &str)> {
    let mut value = String::new();
    let mut chars = input.char_indices();
    while let Some((i, c)) = chars.next() {
        match c {
            '\\' => match chars.clone().next() {
                Some((_, escaped @ ('"' | '\''))) => {
                    value.push(escaped);
                    chars.next();
                }
                _ => value.push('\\'),
            },
            c if c == quote => return Some((value, &input[i + c.len_utf8()..])),
            c => value.push(c),
        }
    }

    None
}
