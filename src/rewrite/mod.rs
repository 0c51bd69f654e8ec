//! In-place rewriting of project files.
//!
//! # Passes
//!
//! | Pass     | Files                                   | What changes                    |
//! |----------|-----------------------------------------|---------------------------------|
//! | `html`   | discovered pages                        | `src`, `href`, `srcset`         |
//! | `css`    | `*.css` under each project root         | `url(...)`, `@import`           |
//! | `router` | configured script extensions            | router history base             |
//!
//! Each file is read once per pass and written back only when at least one
//! substitution happened, so a second run over the same tree is a no-op.

mod css;
mod html;
pub mod link;
mod router;

pub use css::rewrite_css;
pub use html::rewrite_html;
pub use link::{LinkResolver, LinkRewriter, Unresolved};
pub use router::rewrite_router;

use crate::config::PortalConfig;
use crate::diagnostic::{DiagnosticKind, Diagnostics};
use crate::discovery::{project_roots, relative_slash_path};
use crate::log;
use std::borrow::Cow;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Directory never scanned for stylesheets or scripts
const VENDOR_DIR: &str = "node_modules";

/// Number of files changed by each pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RewriteReport {
    pub html: usize,
    pub css: usize,
    pub router: usize,
}

impl RewriteReport {
    #[cfg(test)]
    pub fn total(&self) -> usize {
        self.html + self.css + self.router
    }
}

/// Project-owned files found under one project root.
#[derive(Debug, Default)]
struct ProjectFiles {
    stylesheets: Vec<PathBuf>,
    scripts: Vec<PathBuf>,
}

/// Runs the enabled rewrite passes over every discovered project.
pub struct AssetRewriter<'a> {
    config: &'a PortalConfig,
    dry_run: bool,
}

impl<'a> AssetRewriter<'a> {
    pub fn new(config: &'a PortalConfig, dry_run: bool) -> Self {
        Self { config, dry_run }
    }

    /// Rewrite all projects owning at least one page in `pages`.
    pub fn run(&self, pages: &[String], diagnostics: &mut Diagnostics) -> RewriteReport {
        let mut report = RewriteReport::default();
        let rewrite = &self.config.rewrite;
        if !rewrite.any() {
            return report;
        }

        for (id, dir) in project_roots(&self.config.root, pages) {
            let resolver = match LinkResolver::new(&dir) {
                Ok(resolver) => resolver,
                Err(err) => {
                    diagnostics.push(DiagnosticKind::UnreadableFile, &id, err.to_string());
                    continue;
                }
            };

            if rewrite.html {
                let prefix = format!("{id}/");
                for page in pages.iter().filter(|page| page.starts_with(&prefix)) {
                    let path = self.config.root.join(page);
                    report.html += self.rewrite_links(&path, &resolver, rewrite_html, diagnostics);
                }
            }

            let files = self.collect_project_files(&dir);
            if rewrite.css {
                for path in &files.stylesheets {
                    report.css += self.rewrite_links(path, &resolver, rewrite_css, diagnostics);
                }
            }
            if rewrite.router {
                for path in &files.scripts {
                    report.router += self.rewrite_script(path, diagnostics);
                }
            }
        }

        report
    }

    /// Run a link rewriter over one file. Returns 1 if the file changed.
    fn rewrite_links<F>(
        &self,
        path: &Path,
        resolver: &LinkResolver,
        rewrite: F,
        diagnostics: &mut Diagnostics,
    ) -> usize
    where
        F: for<'t> Fn(&'t str, &mut LinkRewriter<'_>) -> Cow<'t, str>,
    {
        let scope = self.scope(path);
        let Some(content) = read_text(path, &scope, diagnostics) else {
            return 0;
        };
        let from_dir = match path.parent().map(Path::canonicalize) {
            Some(Ok(dir)) => dir,
            Some(Err(err)) => {
                diagnostics.push(DiagnosticKind::UnreadableFile, &scope, err.to_string());
                return 0;
            }
            None => return 0,
        };

        let mut rewriter = LinkRewriter::new(resolver, &from_dir);
        let output = rewrite(&content, &mut rewriter);

        for (url, reason) in &rewriter.misses {
            let (kind, message) = match reason {
                Unresolved::OutsideRoot => (
                    DiagnosticKind::AssetOutsideProjectRoot,
                    format!("`{url}` resolves outside the project root"),
                ),
                _ => (
                    DiagnosticKind::AssetNotFound,
                    format!("`{url}` does not exist in the project"),
                ),
            };
            diagnostics.push(kind, &scope, message);
        }

        if rewriter.changes == 0 {
            return 0;
        }
        usize::from(self.commit(path, &output, &scope, diagnostics))
    }

    /// Run the router pass over one script. Returns 1 if the file changed.
    fn rewrite_script(&self, path: &Path, diagnostics: &mut Diagnostics) -> usize {
        let scope = self.scope(path);
        let Some(content) = read_text(path, &scope, diagnostics) else {
            return 0;
        };
        match rewrite_router(&content) {
            Cow::Borrowed(_) => 0,
            Cow::Owned(output) => usize::from(self.commit(path, &output, &scope, diagnostics)),
        }
    }

    /// Write `content` with `\n` line endings unless running dry.
    fn commit(
        &self,
        path: &Path,
        content: &str,
        scope: &str,
        diagnostics: &mut Diagnostics,
    ) -> bool {
        if self.dry_run {
            log!("dry-run"; "would rewrite {scope}");
            return true;
        }
        let content = content.replace("\r\n", "\n").replace('\r', "\n");
        match fs::write(path, content) {
            Ok(()) => true,
            Err(err) => {
                diagnostics.push(DiagnosticKind::WriteFailed, scope, err.to_string());
                false
            }
        }
    }

    /// Stylesheets and scripts under `dir`, skipping vendored packages.
    fn collect_project_files(&self, dir: &Path) -> ProjectFiles {
        let mut files = ProjectFiles::default();
        let walker = WalkDir::new(dir)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| !(entry.file_type().is_dir() && entry.file_name() == VENDOR_DIR));

        for entry in walker.filter_map(|entry| entry.ok()) {
            if !entry.file_type().is_file() {
                continue;
            }
            let Some(ext) = entry.path().extension().and_then(|ext| ext.to_str()) else {
                continue;
            };
            if ext.eq_ignore_ascii_case("css") {
                files.stylesheets.push(entry.into_path());
            } else if self.config.rewrite.is_script_extension(ext) {
                files.scripts.push(entry.into_path());
            }
        }

        files
    }

    fn scope(&self, path: &Path) -> String {
        relative_slash_path(&self.config.root, path).unwrap_or_else(|| path.display().to_string())
    }
}

/// Read a file as UTF-8, recording a note when that is not possible.
fn read_text(path: &Path, scope: &str, diagnostics: &mut Diagnostics) -> Option<String> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(err) => {
            diagnostics.push(DiagnosticKind::UnreadableFile, scope, err.to_string());
            return None;
        }
    };
    match String::from_utf8(bytes) {
        Ok(text) => Some(text),
        Err(_) => {
            diagnostics.push(DiagnosticKind::UnreadableFile, scope, "not valid UTF-8");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::discovery::collect_html_paths;
    use tempfile::TempDir;

    fn write(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn read(root: &Path, rel: &str) -> String {
        fs::read_to_string(root.join(rel)).unwrap()
    }

    fn fixture() -> (TempDir, PortalConfig) {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        write(root, "m/p/index.html", r#"<img src="/img/a.png"><a href="/docs/">d</a>"#);
        write(root, "m/p/docs/index.html", r#"<link href="/css/site.css">"#);
        write(root, "m/p/img/a.png", "png");
        write(root, "m/p/css/site.css", "body{background:url(/img/a.png)}");
        write(root, "m/p/assets/app.js", "x({history:createWebHistory('/'),routes:[]})");
        write(root, "m/p/assets/util.js", "fetch('/api')");
        write(
            root,
            "m/p/node_modules/lib/index.js",
            "x({history:createWebHistory('/'),routes:[]})",
        );
        let config = PortalConfig::for_root(root);
        (dir, config)
    }

    fn run(config: &PortalConfig, dry_run: bool) -> (RewriteReport, Diagnostics) {
        let pages = collect_html_paths(&config.root, &config.catalog.exclude).unwrap();
        let mut diagnostics = Diagnostics::new();
        let report = AssetRewriter::new(config, dry_run).run(&pages, &mut diagnostics);
        (report, diagnostics)
    }

    #[test]
    fn test_run_all_passes() {
        let (dir, config) = fixture();
        let root = dir.path();
        let (report, diagnostics) = run(&config, false);

        assert_eq!(
            report,
            RewriteReport {
                html: 2,
                css: 1,
                router: 1
            }
        );
        assert!(diagnostics.is_empty());
        assert_eq!(
            read(root, "m/p/index.html"),
            r#"<img src="./img/a.png"><a href="./docs/">d</a>"#
        );
        assert_eq!(
            read(root, "m/p/docs/index.html"),
            r#"<link href="../css/site.css">"#
        );
        assert_eq!(
            read(root, "m/p/css/site.css"),
            "body{background:url(../img/a.png)}"
        );
        assert_eq!(
            read(root, "m/p/assets/app.js"),
            "x({history:createWebHistory(window.location.pathname),routes:[]})"
        );
        // Vendored scripts stay untouched
        assert_eq!(
            read(root, "m/p/node_modules/lib/index.js"),
            "x({history:createWebHistory('/'),routes:[]})"
        );
    }

    #[test]
    fn test_second_run_is_noop() {
        let (_dir, config) = fixture();
        run(&config, false);
        let (report, _) = run(&config, false);
        assert_eq!(report.total(), 0);
    }

    #[test]
    fn test_dry_run_leaves_files() {
        let (dir, config) = fixture();
        let (report, _) = run(&config, true);
        assert_eq!(report.total(), 4);
        assert_eq!(
            read(dir.path(), "m/p/index.html"),
            r#"<img src="/img/a.png"><a href="/docs/">d</a>"#
        );
    }

    #[test]
    fn test_disabled_passes() {
        let (dir, mut config) = fixture();
        config.rewrite.html = false;
        config.rewrite.router = false;
        let (report, _) = run(&config, false);
        assert_eq!(report, RewriteReport { html: 0, css: 1, router: 0 });
        assert_eq!(
            read(dir.path(), "m/p/assets/app.js"),
            "x({history:createWebHistory('/'),routes:[]})"
        );
    }

    #[test]
    fn test_line_endings_normalized_on_write() {
        let (dir, config) = fixture();
        write(dir.path(), "m/p/crlf.html", "<p>\r\n<img src=\"/img/a.png\">\r\n");
        run(&config, false);
        assert_eq!(
            read(dir.path(), "m/p/crlf.html"),
            "<p>\n<img src=\"./img/a.png\">\n"
        );
    }

    #[test]
    fn test_lone_carriage_returns_normalized_on_write() {
        let (dir, config) = fixture();
        write(dir.path(), "m/p/cr.html", "<p>\r<img src=\"/img/a.png\">\r\n</p>\r");
        run(&config, false);
        assert_eq!(
            read(dir.path(), "m/p/cr.html"),
            "<p>\n<img src=\"./img/a.png\">\n</p>\n"
        );
    }

    #[test]
    fn test_unresolved_references_become_notes() {
        let (dir, config) = fixture();
        let root = dir.path();
        write(root, "secret.txt", "secret");
        let page = r#"<a href="/../../secret.txt"></a><img src="/gone.png">"#;
        write(root, "m/q/index.html", page);

        let (report, diagnostics) = run(&config, false);
        assert_eq!(read(root, "m/q/index.html"), page);
        assert_eq!(report.html, 2);
        assert_eq!(
            diagnostics
                .of_kind(DiagnosticKind::AssetOutsideProjectRoot)
                .count(),
            1
        );
        assert_eq!(diagnostics.of_kind(DiagnosticKind::AssetNotFound).count(), 1);
        assert_eq!(diagnostics.warning_count(), 0);
    }

    #[test]
    fn test_non_utf8_file_is_skipped() {
        let (dir, config) = fixture();
        let path = dir.path().join("m/p/latin1.html");
        fs::write(&path, b"<img src=\"/img/a.png\">\xe9\xff").unwrap();

        let (_, diagnostics) = run(&config, false);
        assert_eq!(diagnostics.of_kind(DiagnosticKind::UnreadableFile).count(), 1);
        assert_eq!(
            fs::read(&path).unwrap(),
            b"<img src=\"/img/a.png\">\xe9\xff".to_vec()
        );
    }
}
