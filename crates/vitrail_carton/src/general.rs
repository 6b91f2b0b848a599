//! General string helpers shared across crates.

use compact_str::CompactString;

/// Returns `true` when the string contains something other than whitespace.
#[inline]
pub fn is_not_blank(s: &str) -> bool {
    !s.trim().is_empty()
}

/// Split a class attribute string into its tokens, dropping blank entries.
pub fn class_tokens(value: &str) -> Vec<CompactString> {
    value.split_whitespace().map(CompactString::from).collect()
}

/// Keep the non-blank entries of an explicit class list, in order.
pub fn non_blank_tokens<I, S>(tokens: I) -> Vec<CompactString>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    tokens
        .into_iter()
        .filter(|token| is_not_blank(token.as_ref()))
        .map(|token| CompactString::from(token.as_ref().trim()))
        .collect()
}
