//! Page discovery.
//!
//! Walks the root once and yields every eligible page as a root-relative,
//! `/`-separated path:
//!
//! ```text
//! <root>/
//! ├── alice/                 member
//! │   └── blog/              project
//! │       ├── index.html     alice/blog/index.html      (kept)
//! │       └── posts/a.htm    alice/blog/posts/a.htm     (kept)
//! ├── alice/readme.html      depth 2                    (skipped)
//! └── node_modules/...       excluded top-level         (pruned)
//! ```

use crate::error::{PortalError, Result};
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Component, Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

/// Page extensions, compared case-insensitively
pub const HTML_EXTENSIONS: &[&str] = &["html", "htm"];

/// Minimum number of segments in a page path: `member/project/file.html`
pub const MIN_DEPTH: usize = 3;

/// Check whether a path string names an HTML page.
pub fn is_html_path(path: &str) -> bool {
    path.rsplit_once('.').is_some_and(|(stem, ext)| {
        !stem.is_empty()
            && HTML_EXTENSIONS
                .iter()
                .any(|candidate| ext.eq_ignore_ascii_case(candidate))
    })
}

/// Number of `/`-separated segments in a page path.
#[inline]
pub fn depth(path: &str) -> usize {
    path.split('/').count()
}

/// Collect all eligible page paths under `root`, sorted and deduplicated.
///
/// Symbolic links are never followed. Entries that cannot be read below the
/// root are skipped; failing to read the root itself is fatal.
pub fn collect_html_paths(root: &Path, excluded: &BTreeSet<String>) -> Result<Vec<String>> {
    let meta = fs::metadata(root).map_err(|err| PortalError::Root(root.to_path_buf(), err))?;
    if !meta.is_dir() {
        return Err(PortalError::RootNotDirectory(root.to_path_buf()));
    }

    let walker = WalkDir::new(root)
        .follow_links(false)
        .min_depth(1)
        .into_iter()
        .filter_entry(|entry| !is_excluded_top_level(entry, excluded));

    let mut paths = BTreeSet::new();
    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) if err.depth() == 0 => {
                return Err(PortalError::Walk(root.to_path_buf(), err));
            }
            Err(_) => continue,
        };
        if !entry.file_type().is_file() {
            continue;
        }

        let Some(relative) = relative_slash_path(root, entry.path()) else {
            continue;
        };
        if depth(&relative) >= MIN_DEPTH && is_html_path(&relative) {
            paths.insert(relative);
        }
    }

    Ok(paths.into_iter().collect())
}

/// Map each project id (`member/project`) to its directory under `root`.
pub fn project_roots(root: &Path, pages: &[String]) -> BTreeMap<String, PathBuf> {
    pages
        .iter()
        .filter_map(|page| {
            let mut parts = page.splitn(3, '/');
            let member = parts.next()?;
            let project = parts.next()?;
            parts.next()?;
            Some((
                format!("{member}/{project}"),
                root.join(member).join(project),
            ))
        })
        .collect()
}

/// Root-relative path of `path` with `/` separators.
///
/// Returns `None` for paths outside `root` or with non-UTF-8 components.
pub fn relative_slash_path(root: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(root).ok()?;
    let parts = relative
        .components()
        .map(|component| match component {
            Component::Normal(part) => part.to_str(),
            _ => None,
        })
        .collect::<Option<Vec<_>>>()?;
    (!parts.is_empty()).then(|| parts.join("/"))
}

fn is_excluded_top_level(entry: &DirEntry, excluded: &BTreeSet<String>) -> bool {
    entry.depth() == 1
        && entry.file_type().is_dir()
        && entry
            .file_name()
            .to_str()
            .is_some_and(|name| excluded.contains(name))
}

// ============================================================================
// Tests
// ============================================================================
