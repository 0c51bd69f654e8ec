//! CSS reference rewriting: `url(...)` and `@import "..."`.

use super::link::{LinkRewriter, splice};
use regex::{Captures, Regex};
use std::borrow::Cow;
use std::sync::LazyLock;

/// `url("...")`, `url('...')` or `url(...)`
static URL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)url\(\s*(?:"([^"]*)"|'([^']*)'|([^)"'\s]+))\s*\)"#).unwrap()
});

static IMPORT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)@import\s+(?:"([^"]*)"|'([^']*)')"#).unwrap());

/// Rewrite every root-absolute reference in a stylesheet.
pub fn rewrite_css<'t>(content: &'t str, rewriter: &mut LinkRewriter<'_>) -> Cow<'t, str> {
    let urls = URL_RE.replace_all(content, |caps: &Captures<'_>| {
        replace_value(caps, rewriter)
    });

    let imports = match IMPORT_RE.replace_all(&urls, |caps: &Captures<'_>| {
        replace_value(caps, rewriter)
    }) {
        Cow::Borrowed(_) => None,
        Cow::Owned(output) => Some(output),
    };

    match imports {
        Some(output) => Cow::Owned(output),
        None => urls,
    }
}

/// Rewrite whichever alternative group matched; otherwise keep the match.
fn replace_value(caps: &Captures<'_>, rewriter: &mut LinkRewriter<'_>) -> String {
    let value = caps.iter().skip(1).flatten().next();
    match value.and_then(|value| Some((value, rewriter.rewrite_url(value.as_str())?))) {
        Some((value, rewritten)) => splice(caps, value, &rewritten),
        None => caps[0].to_string(),
    }
}
