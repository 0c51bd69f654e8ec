//! HTML attribute rewriting.
//!
//! Handles `src`/`href` attribute values and `srcset` candidate lists:
//!
//! ```text
//! <img src="/img/a.png" srcset="/img/a.png 1x, /img/a@2x.png 2x">
//!          ───────────          ──────────     ─────────────
//!          rewritten            each candidate URL independently
//! ```

use super::link::{LinkRewriter, splice};
use regex::{Captures, Regex};
use std::borrow::Cow;
use std::sync::LazyLock;

/// `src="..."` / `href='...'`, attribute name preceded by whitespace
static ATTR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)(?:^|\s)(?:src|href)\s*=\s*(?:"([^"]*)"|'([^']*)')"#).unwrap()
});

static SRCSET_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)(?:^|\s)srcset\s*=\s*(?:"([^"]*)"|'([^']*)')"#).unwrap()
});

/// Rewrite every root-absolute reference in an HTML document.
pub fn rewrite_html<'t>(content: &'t str, rewriter: &mut LinkRewriter<'_>) -> Cow<'t, str> {
    let attrs = ATTR_RE.replace_all(content, |caps: &Captures<'_>| {
        let Some(value) = caps.get(1).or_else(|| caps.get(2)) else {
            return caps[0].to_string();
        };
        match rewriter.rewrite_url(value.as_str()) {
            Some(rewritten) => splice(caps, value, &rewritten),
            None => caps[0].to_string(),
        }
    });

    let srcset = match SRCSET_RE.replace_all(&attrs, |caps: &Captures<'_>| {
        let Some(value) = caps.get(1).or_else(|| caps.get(2)) else {
            return caps[0].to_string();
        };
        let before = rewriter.changes;
        let rewritten = rewrite_srcset(value.as_str(), rewriter);
        if rewriter.changes == before {
            caps[0].to_string()
        } else {
            splice(caps, value, &rewritten)
        }
    }) {
        Cow::Borrowed(_) => None,
        Cow::Owned(output) => Some(output),
    };

    match srcset {
        Some(output) => Cow::Owned(output),
        None => attrs,
    }
}

/// Rewrite the URL of each comma-separated candidate, keeping whitespace and
/// descriptors as written.
fn rewrite_srcset(value: &str, rewriter: &mut LinkRewriter<'_>) -> String {
    value
        .split(',')
        .map(|candidate| {
            let trimmed = candidate.trim_start();
            let lead = &candidate[..candidate.len() - trimmed.len()];
            let url_end = trimmed.find(char::is_whitespace).unwrap_or(trimmed.len());
            let (url, rest) = trimmed.split_at(url_end);

            match rewriter.rewrite_url(url) {
                Some(rewritten) => format!("{lead}{rewritten}{rest}"),
                None => candidate.to_string(),
            }
        })
        .collect::<Vec<_>>()
        .join(",")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rewrite::link::{LinkResolver, Unresolved};
    use std::fs;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn fixture() -> (TempDir, LinkResolver) {
        let dir = TempDir::new().unwrap();
        let project = dir.path().join("m/p");
        for file in ["img/a.png", "img/a@2x.png", "css/site.css", "about.html"] {
            let path = project.join(file);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, "x").unwrap();
        }
        let resolver = LinkResolver::new(&project).unwrap();
        (dir, resolver)
    }

    fn rewrite(resolver: &LinkResolver, from: PathBuf, html: &str) -> (String, usize) {
        let mut rewriter = LinkRewriter::new(resolver, &from);
        let output = rewrite_html(html, &mut rewriter).into_owned();
        (output, rewriter.changes)
    }

    #[test]
    fn test_rewrite_src_and_href() {
        let (_dir, resolver) = fixture();
        let html = r#"<link rel="stylesheet" href="/css/site.css"><img src='/img/a.png'>"#;
        let (output, changes) = rewrite(&resolver, resolver.root().to_path_buf(), html);
        assert_eq!(
            output,
            r#"<link rel="stylesheet" href="./css/site.css"><img src='./img/a.png'>"#
        );
        assert_eq!(changes, 2);
    }

    #[test]
    fn test_rewrite_case_insensitive_and_spacing() {
        let (_dir, resolver) = fixture();
        let html = r#"<A HREF = "/about.html#team">x</A>"#;
        let (output, _) = rewrite(&resolver, resolver.root().to_path_buf(), html);
        assert_eq!(output, r#"<A HREF = "./about.html#team">x</A>"#);
    }

    #[test]
    fn test_rewrite_from_nested_page() {
        let (_dir, resolver) = fixture();
        let from = resolver.root().join("img");
        let (output, _) = rewrite(&resolver, from, r#"<a href="/about.html">"#);
        assert_eq!(output, r#"<a href="../about.html">"#);
    }

    #[test]
    fn test_untouched_references() {
        let (_dir, resolver) = fixture();
        let html = concat!(
            r#"<script src="https://cdn.example.com/x.js"></script>"#,
            r#"<img src="//cdn.example.com/a.png">"#,
            r#"<a href="about.html">"#,
            r#"<a href="/missing.html">"#,
            r#"<img data-src="/img/a.png">"#,
        );
        let from = resolver.root().to_path_buf();
        let mut rewriter = LinkRewriter::new(&resolver, &from);
        let output = rewrite_html(html, &mut rewriter);

        assert!(matches!(output, Cow::Borrowed(_)));
        assert_eq!(rewriter.changes, 0);
        assert_eq!(
            rewriter.misses,
            vec![("/missing.html".to_string(), Unresolved::NotFound)]
        );
    }

    #[test]
    fn test_rewrite_srcset_candidates() {
        let (_dir, resolver) = fixture();
        let html = r#"<img srcset="/img/a.png 1x, /img/a@2x.png 2x, /img/none.png 3x">"#;
        let (output, changes) = rewrite(&resolver, resolver.root().to_path_buf(), html);
        assert_eq!(
            output,
            r#"<img srcset="./img/a.png 1x, ./img/a@2x.png 2x, /img/none.png 3x">"#
        );
        assert_eq!(changes, 2);
    }

    #[test]
    fn test_surrounding_bytes_preserved() {
        let (_dir, resolver) = fixture();
        let html = "<!doctype html>\n<p>价格 &amp; 说明</p>\n<img  src=\"/img/a.png\"  alt=\"图\">\n";
        let (output, _) = rewrite(&resolver, resolver.root().to_path_buf(), html);
        assert_eq!(
            output,
            "<!doctype html>\n<p>价格 &amp; 说明</p>\n<img  src=\"./img/a.png\"  alt=\"图\">\n"
        );
    }
}
