//! Root-absolute link resolution.
//!
//! # Link Type Detection
//!
//! | Prefix        | Type              | Handling                        |
//! |---------------|-------------------|---------------------------------|
//! | `/`           | Root-absolute     | resolved against project root   |
//! | `//`          | Protocol-relative | kept unchanged                  |
//! | anything else | Relative/external | kept unchanged                  |
//!
//! # Resolution
//!
//! ```text
//! /img/logo.png?v=2  ──► split ──► path "/img/logo.png", suffix "?v=2"
//!                                   │
//!                    <project>/img/logo.png ──► canonicalize ──► inside project?
//!                                   │
//!                    relative to referencing dir ──► "./img/logo.png?v=2"
//! ```

use regex::{Captures, Match};
use std::borrow::Cow;
use std::io;
use std::path::{Component, Path, PathBuf};

/// Why a reference was left untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unresolved {
    /// Not a single-slash root-absolute URL
    NotRootAbsolute,
    /// Nothing after the leading slash
    Empty,
    /// Target does not exist
    NotFound,
    /// Target exists but lies outside the project root
    OutsideRoot,
}

/// Check if a URL is root-absolute (exactly one leading `/`).
#[inline]
pub fn is_root_absolute(url: &str) -> bool {
    url.starts_with('/') && !url.starts_with("//")
}

/// Split a URL into its path and its `?query`/`#fragment` suffix.
///
/// # Examples
///
/// | Input              | Path       | Suffix      |
/// |--------------------|------------|-------------|
/// | `/a.css`           | `/a.css`   | ``          |
/// | `/a.css?v=1#x`     | `/a.css`   | `?v=1#x`    |
/// | `/a.html#top?no`   | `/a.html`  | `#top?no`   |
pub fn split_suffix(url: &str) -> (&str, &str) {
    match url.find(['?', '#']) {
        Some(cut) => url.split_at(cut),
        None => (url, ""),
    }
}

/// Resolves root-absolute references against one project root.
#[derive(Debug, Clone)]
pub struct LinkResolver {
    /// Canonical project root
    root: PathBuf,
}

impl LinkResolver {
    /// Create a resolver for `project_root`, which must exist.
    pub fn new(project_root: &Path) -> io::Result<Self> {
        Ok(Self {
            root: project_root.canonicalize()?,
        })
    }

    #[cfg(test)]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a root-absolute URL to a canonical file inside the project.
    pub fn resolve(&self, url: &str) -> Result<PathBuf, Unresolved> {
        if !is_root_absolute(url) {
            return Err(Unresolved::NotRootAbsolute);
        }
        let (path, _) = split_suffix(url);
        let relative = &path[1..];
        if relative.is_empty() {
            return Err(Unresolved::Empty);
        }

        let decoded = urlencoding::decode(relative).unwrap_or(Cow::Borrowed(relative));
        let candidate = self.root.join(decoded.as_ref());
        let target = candidate.canonicalize().map_err(|_| Unresolved::NotFound)?;

        if target.starts_with(&self.root) {
            Ok(target)
        } else {
            Err(Unresolved::OutsideRoot)
        }
    }

    /// Rewrite a root-absolute URL relative to `from_dir` (canonical).
    ///
    /// # Examples
    ///
    /// | URL (from `<project>/pages`) | Output                   |
    /// |------------------------------|--------------------------|
    /// | `/img/a.png`                 | `../img/a.png`           |
    /// | `/pages/b.html#top`          | `./b.html#top`           |
    /// | `/docs/`                     | `../docs/`               |
    pub fn rewrite(&self, url: &str, from_dir: &Path) -> Result<String, Unresolved> {
        let target = self.resolve(url)?;
        let (path, suffix) = split_suffix(url);

        let mut relative = relative_path(from_dir, &target);
        if path.contains('%') {
            relative = encode_segments(&relative);
        }
        if !(relative.starts_with("./") || relative.starts_with("../")) {
            relative = if relative == "." || relative == ".." {
                format!("{relative}/")
            } else {
                format!("./{relative}")
            };
        }
        if path.ends_with('/') && !relative.ends_with('/') {
            relative.push('/');
        }

        relative.push_str(suffix);
        Ok(relative)
    }
}

/// Compute the `/`-separated path from directory `from` to `to`.
///
/// Both paths are expected to be absolute and canonical.
pub fn relative_path(from: &Path, to: &Path) -> String {
    let from: Vec<Component<'_>> = from.components().collect();
    let to: Vec<Component<'_>> = to.components().collect();

    let common = from
        .iter()
        .zip(&to)
        .take_while(|(a, b)| a == b)
        .count();

    let ups = std::iter::repeat_n("..".to_string(), from.len() - common);
    let downs = to[common..]
        .iter()
        .map(|c| c.as_os_str().to_string_lossy().into_owned());
    let parts: Vec<String> = ups.chain(downs).collect();

    if parts.is_empty() {
        ".".to_string()
    } else {
        parts.join("/")
    }
}

/// Percent-encode every segment except `.` and `..`.
fn encode_segments(path: &str) -> String {
    path.split('/')
        .map(|segment| match segment {
            "." | ".." | "" => Cow::Borrowed(segment),
            _ => urlencoding::encode(segment),
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// Replace `value` inside the whole match of `caps`, keeping every other byte.
pub fn splice(caps: &Captures<'_>, value: Match<'_>, replacement: &str) -> String {
    let whole = &caps[0];
    let offset = caps.get(0).map_or(0, |m| m.start());
    let start = value.start() - offset;
    let end = value.end() - offset;
    format!("{}{}{}", &whole[..start], replacement, &whole[end..])
}

/// Rewrites URLs for one referencing file and counts what happened.
pub struct LinkRewriter<'a> {
    resolver: &'a LinkResolver,
    from_dir: &'a Path,
    /// Number of successful substitutions
    pub changes: usize,
    /// URLs that were rewritten, as written in the source
    pub resolved: Vec<String>,
    /// References left untouched because they could not be resolved
    pub misses: Vec<(String, Unresolved)>,
}

impl<'a> LinkRewriter<'a> {
    pub fn new(resolver: &'a LinkResolver, from_dir: &'a Path) -> Self {
        Self {
            resolver,
            from_dir,
            changes: 0,
            resolved: Vec::new(),
            misses: Vec::new(),
        }
    }

    /// Rewrite `url` if it is a resolvable root-absolute reference.
    pub fn rewrite_url(&mut self, url: &str) -> Option<String> {
        match self.resolver.rewrite(url, self.from_dir) {
            Ok(rewritten) => {
                self.changes += 1;
                self.resolved.push(url.to_string());
                Some(rewritten)
            }
            Err(reason @ (Unresolved::NotFound | Unresolved::OutsideRoot)) => {
                self.misses.push((url.to_string(), reason));
                None
            }
            Err(_) => None,
        }
    }
}
