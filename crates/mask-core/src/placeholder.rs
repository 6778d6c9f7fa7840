//! Locating `{{ expression }}` placeholders in text.
//!
//! A placeholder is `{{`, a non-empty body containing no `{` or `}`, then
//! `}}`. Matches are leftmost and non-overlapping. Because bodies cannot hold
//! braces, nesting resolves to the innermost brace-free pair: in
//! `{{a{{b}}}}` only `{{b}}` is a placeholder and the surrounding `{{a` and
//! `}}` stay literal. Unbalanced input such as `{{a` or `{{}}` contains no
//! placeholder at all.

use std::ops::Range;
use std::sync::LazyLock;

use regex::Regex;

static PLACEHOLDER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{([^{}]+)\}\}").expect("placeholder pattern is valid"));

/// One placeholder occurrence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placeholder<'a> {
    /// Byte range of the whole `{{...}}` in the source.
    pub span: Range<usize>,
    /// The text between the braces, untrimmed.
    pub body: &'a str,
}

/// Every placeholder in `input`, in order.
pub fn find_placeholders(input: &str) -> Vec<Placeholder<'_>> {
    if !input.contains("{{") {
        return Vec::new();
    }
    PLACEHOLDER_RE
        .captures_iter(input)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let body = caps.get(1)?;
            Some(Placeholder {
                span: whole.range(),
                body: body.as_str(),
            })
        })
        .collect()
}

/// Replace every placeholder with `resolve(body)`.
///
/// Returns `None` when `input` holds no placeholder, so callers can skip the
/// write entirely instead of storing an identical string.
///
/// # Examples
///
/// ```
/// use mask_core::placeholder::render_with;
///
/// let out = render_with("a {{ x }} b", |body| body.trim().to_uppercase());
/// assert_eq!(out.as_deref(), Some("a X b"));
/// assert_eq!(render_with("no markers", |_| String::new()), None);
/// ```
pub fn render_with<F>(input: &str, mut resolve: F) -> Option<String>
where
    F: FnMut(&str) -> String,
{
    let placeholders = find_placeholders(input);
    if placeholders.is_empty() {
        return None;
    }

    let mut out = String::with_capacity(input.len());
    let mut last = 0;
    for placeholder in placeholders {
        out.push_str(&input[last..placeholder.span.start]);
        out.push_str(&resolve(placeholder.body));
        last = placeholder.span.end;
    }
    out.push_str(&input[last..]);
    Some(out)
}
