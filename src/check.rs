//! Consistency check for a persisted manifest.
//!
//! # Checks
//!
//! | Group      | What is verified                                             |
//! |------------|--------------------------------------------------------------|
//! | `version`  | schema is not newer than this binary understands              |
//! | `semantic` | counts, entry/hidden pages, member tree vs flat project list  |
//! | `paths`    | `htmlPaths` are pages on disk and match the member tree       |
//! | `asset`    | no root-absolute references left in project HTML/CSS          |

use crate::catalog::Project;
use crate::config::PortalConfig;
use crate::discovery::{MIN_DEPTH, depth, is_html_path, project_roots, relative_slash_path};
use crate::error::Result;
use crate::manifest::{MANIFEST_VERSION, ManifestPayload};
use crate::rewrite::{LinkResolver, LinkRewriter, rewrite_css, rewrite_html};
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;
use walkdir::WalkDir;

/// Findings of one check run.
#[derive(Debug, Clone, Default)]
pub struct CheckReport {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl CheckReport {
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }

    fn error(&mut self, group: &str, message: impl AsRef<str>) {
        self.errors.push(format!("[{group}] {}", message.as_ref()));
    }

    fn warning(&mut self, group: &str, message: impl AsRef<str>) {
        self.warnings.push(format!("[{group}] {}", message.as_ref()));
    }
}

/// Load the configured manifest and check it against the tree under the root.
pub fn check_portal(config: &PortalConfig) -> Result<CheckReport> {
    let manifest = ManifestPayload::load(config.manifest_path())?;
    let mut report = CheckReport::default();

    check_version(&manifest, &mut report);
    check_semantics(&manifest, &mut report);
    check_paths(&manifest, &config.root, &mut report);
    check_assets(&manifest, &config.root, &mut report);

    Ok(report)
}

fn check_version(manifest: &ManifestPayload, report: &mut CheckReport) {
    if manifest.version > MANIFEST_VERSION {
        report.error(
            "version",
            format!(
                "manifest version {} is newer than supported version {MANIFEST_VERSION}",
                manifest.version
            ),
        );
    }
}

fn check_semantics(manifest: &ManifestPayload, report: &mut CheckReport) {
    let mut from_members: BTreeMap<&str, &Project> = BTreeMap::new();

    for member in &manifest.members {
        if member.project_count != member.projects.len() {
            report.error(
                "semantic",
                format!(
                    "member `{}` projectCount={} does not match projects.len()={}",
                    member.name,
                    member.project_count,
                    member.projects.len()
                ),
            );
        }

        for project in &member.projects {
            from_members.insert(&project.id, project);
            check_project(project, &member.name, report);
        }
    }

    let stats = &manifest.stats;
    if stats.member_count != manifest.members.len() {
        report.error(
            "semantic",
            format!(
                "stats.memberCount={} does not match members.len()={}",
                stats.member_count,
                manifest.members.len()
            ),
        );
    }
    let computed: usize = manifest.members.iter().map(|m| m.projects.len()).sum();
    if stats.project_count != computed {
        report.error(
            "semantic",
            format!(
                "stats.projectCount={} does not match computed={computed}",
                stats.project_count
            ),
        );
    }
    if stats.page_count != manifest.html_paths.len() {
        report.error(
            "semantic",
            format!(
                "stats.pageCount={} does not match htmlPaths.len()={}",
                stats.page_count,
                manifest.html_paths.len()
            ),
        );
    }
    if manifest.projects.len() != computed {
        report.error(
            "semantic",
            format!(
                "projects.len()={} does not match member projects={computed}",
                manifest.projects.len()
            ),
        );
    }

    let mut seen = BTreeSet::new();
    for project in &manifest.projects {
        if !seen.insert(project.id.as_str()) {
            report.error("semantic", format!("duplicate project id `{}`", project.id));
            continue;
        }
        match from_members.get(project.id.as_str()) {
            None => report.error(
                "semantic",
                format!("project `{}` is not listed under any member", project.id),
            ),
            Some(nested) if *nested != project => report.error(
                "semantic",
                format!("project `{}` differs from its member entry", project.id),
            ),
            Some(_) => {}
        }
    }
    for id in from_members.keys().filter(|id| !seen.contains(*id)) {
        report.error(
            "semantic",
            format!("member project `{id}` is missing from projects"),
        );
    }
}

fn check_project(project: &Project, member: &str, report: &mut CheckReport) {
    let label = &project.id;
    if project.member != member {
        report.error(
            "semantic",
            format!(
                "project `{label}` member=`{}` does not match parent `{member}`",
                project.member
            ),
        );
    }
    if !project.pages.contains(&project.entry) {
        report.error(
            "semantic",
            format!("project `{label}` entry is not included in pages"),
        );
    }
    if project.page_count != project.pages.len() {
        report.error(
            "semantic",
            format!(
                "project `{label}` pageCount={} does not match pages.len()={}",
                project.page_count,
                project.pages.len()
            ),
        );
    }

    let hidden: BTreeSet<&String> = project.hidden_pages.iter().flatten().collect();
    if hidden.contains(&project.entry) {
        report.error(
            "semantic",
            format!("project `{label}` hiddenPages must not include the entry"),
        );
    }
    for page in hidden.iter().filter(|page| !project.pages.contains(**page)) {
        report.error(
            "semantic",
            format!("project `{label}` hidden page not found in pages: {page}"),
        );
    }
}

fn check_paths(manifest: &ManifestPayload, root: &Path, report: &mut CheckReport) {
    let html_paths: BTreeSet<&str> = manifest.html_paths.iter().map(String::as_str).collect();
    let member_pages: BTreeSet<&str> = manifest
        .members
        .iter()
        .flat_map(|m| &m.projects)
        .flat_map(|p| &p.pages)
        .map(String::as_str)
        .collect();

    for path in &manifest.html_paths {
        if !is_html_path(path) {
            report.error("paths", format!("non-HTML path in htmlPaths: {path}"));
            continue;
        }
        if depth(path) < MIN_DEPTH {
            report.error("paths", format!("path depth < {MIN_DEPTH}: {path}"));
        }
        if !root.join(path).is_file() {
            report.error("paths", format!("page does not exist: {path}"));
        }
    }

    for page in member_pages.difference(&html_paths) {
        report.error("paths", format!("member page missing from htmlPaths: {page}"));
    }
    for page in html_paths.difference(&member_pages) {
        report.error("paths", format!("htmlPaths entry not listed under members: {page}"));
    }
}

/// Audit project HTML/CSS for root-absolute references that survived a build.
fn check_assets(manifest: &ManifestPayload, root: &Path, report: &mut CheckReport) {
    for (_, dir) in project_roots(root, &manifest.html_paths) {
        let Ok(resolver) = LinkResolver::new(&dir) else {
            continue;
        };

        let walker = WalkDir::new(&dir)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| {
                !(entry.file_type().is_dir() && entry.file_name() == "node_modules")
            });

        for entry in walker.filter_map(|entry| entry.ok()) {
            if !entry.file_type().is_file() {
                continue;
            }
            let path = entry.path();
            let is_css = path
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| ext.eq_ignore_ascii_case("css"));
            let is_page = path.to_str().is_some_and(is_html_path);
            if !(is_css || is_page) {
                continue;
            }

            let (Ok(content), Some(from_dir)) = (
                fs::read_to_string(path),
                path.parent().and_then(|dir| dir.canonicalize().ok()),
            ) else {
                continue;
            };

            let mut rewriter = LinkRewriter::new(&resolver, &from_dir);
            if is_css {
                rewrite_css(&content, &mut rewriter);
            } else {
                rewrite_html(&content, &mut rewriter);
            }

            let file =
                relative_slash_path(root, path).unwrap_or_else(|| path.display().to_string());
            for url in &rewriter.resolved {
                report.error(
                    "asset",
                    format!("root-absolute local asset should be relative: {file} -> {url}"),
                );
            }
            for (url, _) in &rewriter.misses {
                report.warning(
                    "asset",
                    format!("unresolved root-absolute reference: {file} -> {url}"),
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build::{BuildOptions, build_portal};
    use tempfile::TempDir;

    fn write(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn built() -> (TempDir, PortalConfig) {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        write(root, "alice/blog/index.html", r#"<img src="/img/a.png">"#);
        write(root, "alice/blog/about.html", "<p>about</p>");
        write(root, "alice/blog/img/a.png", "png");
        write(root, "bob/app/index.html", "<p>app</p>");
        let config = PortalConfig::for_root(root);
        build_portal(&config, &BuildOptions::default()).unwrap();
        (dir, config)
    }

    fn rewrite_manifest(config: &PortalConfig, edit: impl FnOnce(&mut ManifestPayload)) {
        let mut manifest = ManifestPayload::load(config.manifest_path()).unwrap();
        edit(&mut manifest);
        fs::write(
            config.manifest_path(),
            serde_json::to_string_pretty(&manifest).unwrap(),
        )
        .unwrap();
    }

    #[test]
    fn test_fresh_build_passes() {
        let (_dir, config) = built();
        let report = check_portal(&config).unwrap();
        assert!(report.is_ok(), "{:?}", report.errors);
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn test_missing_manifest_is_fatal() {
        let dir = TempDir::new().unwrap();
        let config = PortalConfig::for_root(dir.path());
        assert!(check_portal(&config).is_err());
    }

    #[test]
    fn test_count_mismatches() {
        let (_dir, config) = built();
        rewrite_manifest(&config, |m| {
            m.stats.page_count += 1;
            m.members[0].project_count = 7;
            m.members[0].projects[0].page_count = 9;
        });
        let report = check_portal(&config).unwrap();
        assert!(report.errors.iter().any(|e| e.contains("stats.pageCount")));
        assert!(report.errors.iter().any(|e| e.contains("projectCount=7")));
        assert!(report.errors.iter().any(|e| e.contains("pageCount=9")));
        // Nested project now differs from the flat list
        assert!(report.errors.iter().any(|e| e.contains("differs")));
    }

    #[test]
    fn test_entry_and_hidden_pages() {
        let (_dir, config) = built();
        rewrite_manifest(&config, |m| {
            let project = &mut m.members[0].projects[0];
            project.hidden_pages = Some(vec![
                project.entry.clone(),
                "alice/blog/ghost.html".to_string(),
            ]);
            project.entry = "alice/blog/missing.html".to_string();
            m.projects[0] = m.members[0].projects[0].clone();
        });
        let report = check_portal(&config).unwrap();
        assert!(report.errors.iter().any(|e| e.contains("entry is not included")));
        assert!(report.errors.iter().any(|e| e.contains("ghost.html")));
    }

    #[test]
    fn test_flat_project_list() {
        let (_dir, config) = built();
        rewrite_manifest(&config, |m| {
            let first = m.projects[0].clone();
            m.projects[1] = first;
        });
        let report = check_portal(&config).unwrap();
        assert!(report.errors.iter().any(|e| e.contains("duplicate project id")));
        assert!(report.errors.iter().any(|e| e.contains("bob/app") && e.contains("missing")));
    }

    #[test]
    fn test_html_paths() {
        let (dir, config) = built();
        fs::remove_file(dir.path().join("alice/blog/about.html")).unwrap();
        rewrite_manifest(&config, |m| m.html_paths.push("alice/notes.txt".to_string()));
        let report = check_portal(&config).unwrap();
        assert!(
            report
                .errors
                .iter()
                .any(|e| e.contains("page does not exist: alice/blog/about.html"))
        );
        assert!(report.errors.iter().any(|e| e.contains("non-HTML path")));
    }

    #[test]
    fn test_newer_version() {
        let (_dir, config) = built();
        rewrite_manifest(&config, |m| m.version = MANIFEST_VERSION + 1);
        let report = check_portal(&config).unwrap();
        assert!(report.errors.iter().any(|e| e.starts_with("[version]")));
    }

    #[test]
    fn test_residual_root_absolute_references() {
        let (dir, config) = built();
        let root = dir.path();
        write(
            root,
            "alice/blog/about.html",
            r#"<img src="/img/a.png"><img src="/img/gone.png">"#,
        );
        let report = check_portal(&config).unwrap();
        assert!(report.errors.iter().any(|e| e.contains("alice/blog/about.html -> /img/a.png")));
        assert_eq!(report.warnings.len(), 1);
        assert!(report.warnings[0].contains("/img/gone.png"));
    }
}
