//! Splitting an input line into argument tokens.
//!
//! There is no quoting, escaping or substitution: a token is any maximal run of
//! non-whitespace characters. Redirection operators are ordinary tokens at this
//! stage and are picked out later by [`crate::parser`].

/// Split `line` into owned tokens, left to right.
///
/// The line itself is not modified, so callers can keep it around for history
/// or job labels. Empty or whitespace-only input yields an empty vector.
pub fn split_into_tokens(line: &str) -> Vec<String> {
    line.split_whitespace().map(str::to_owned).collect()
}
