//! Page ordering and project-relative path normalization.

use std::cmp::Ordering;
use thiserror::Error;

/// Rank a page for entry selection; lower is more "root-like".
///
/// | Page                      | Score        |
/// |---------------------------|--------------|
/// | `m/p/index.html`          | `0`          |
/// | `m/p/sub/index.html`      | `1 + depth`  |
/// | `m/p/about.html`          | `10 + depth` |
pub fn entry_score(path: &str) -> usize {
    let depth = path.split('/').count();
    let filename = path.rsplit('/').next().unwrap_or_default();
    let is_index = filename.eq_ignore_ascii_case("index.html");

    match (is_index, depth) {
        (true, 3) => 0,
        (true, _) => 1 + depth,
        (false, _) => 10 + depth,
    }
}

/// Order pages by entry score, then by full path.
pub fn compare_pages(a: &str, b: &str) -> Ordering {
    entry_score(a)
        .cmp(&entry_score(b))
        .then_with(|| a.cmp(b))
}

/// Sort pages in place by [`compare_pages`].
pub fn sort_pages(pages: &mut [String]) {
    pages.sort_by(|a, b| compare_pages(a, b));
}

/// Why a project-relative page reference was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathRejection {
    #[error("absolute paths are not allowed")]
    Absolute,
    #[error("`..` segments are not allowed")]
    ParentSegment,
    #[error("path is empty")]
    Empty,
    #[error("path is ambiguous; use `member/project/...` or a path with at most one `/`")]
    Ambiguous,
}

/// Normalize a page reference written inside `member/project`'s metadata.
///
/// # Examples
///
/// | Input (member=`a`, project=`p`) | Output                  |
/// |---------------------------------|-------------------------|
/// | `about.html`                    | `a/p/about.html`        |
/// | `docs\\guide.html`              | `a/p/docs/guide.html`   |
/// | `./docs//guide.html`            | `a/p/docs/guide.html`   |
/// | `a/p/x/y/z.html`                | `a/p/x/y/z.html`        |
/// | `x/y/z.html`                    | rejected (ambiguous)    |
/// | `/about.html`                   | rejected (absolute)     |
/// | `../q/index.html`               | rejected (parent)       |
pub fn normalize_project_path(
    value: &str,
    member: &str,
    project: &str,
) -> Result<String, PathRejection> {
    let value = value.trim().replace('\\', "/");
    if value.starts_with('/') {
        return Err(PathRejection::Absolute);
    }

    let mut segments = Vec::new();
    for segment in value.split('/') {
        match segment {
            ".." => return Err(PathRejection::ParentSegment),
            "" | "." => {}
            _ => segments.push(segment),
        }
    }
    if segments.is_empty() {
        return Err(PathRejection::Empty);
    }

    let normalized = segments.join("/");
    let prefix = format!("{member}/{project}/");
    if normalized.starts_with(&prefix) {
        return Ok(normalized);
    }
    if segments.len() > 2 {
        return Err(PathRejection::Ambiguous);
    }
    Ok(format!("{prefix}{normalized}"))
}
