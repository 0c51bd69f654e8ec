//! Member/project catalog construction.
//!
//! # Flow
//!
//! ```text
//! htmlPaths ──► group by segments 0/1 ──► per project:
//!                                            ├── sort pages by entry score
//!                                            ├── MetadataLoader::load()
//!                                            └── merge → Project
//!                                         per member:
//!                                            └── sort projects by (order?, order, name)
//! ```

pub mod meta;
pub mod page;

pub use meta::{MetadataLoader, ProjectScope, RouteMode};

use crate::config::PortalConfig;
use crate::diagnostic::{DiagnosticKind, Diagnostics};
use page::{compare_pages, sort_pages};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;

// ============================================================================
// Records
// ============================================================================

/// One project as it appears in the manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    /// `member/name`
    pub id: String,
    pub member: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    pub entry: String,
    /// Sorted by entry score; never empty
    pub pages: Vec<String>,
    pub page_count: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hidden_pages: Option<Vec<String>>,
    #[serde(default)]
    pub route_mode: RouteMode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

/// One member (top-level directory) and its projects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Member {
    pub name: String,
    pub project_count: usize,
    pub projects: Vec<Project>,
}

/// The complete catalog for one run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Catalog {
    /// Global sorted page list
    pub html_paths: Vec<String>,
    /// Sorted by name
    pub members: Vec<Member>,
}

impl Catalog {
    /// All projects in catalog order (members by name, then member order).
    pub fn projects(&self) -> impl Iterator<Item = &Project> {
        self.members.iter().flat_map(|m| m.projects.iter())
    }

    pub fn project_count(&self) -> usize {
        self.members.iter().map(|m| m.projects.len()).sum()
    }

    #[cfg(test)]
    pub fn find(&self, id: &str) -> Option<&Project> {
        self.projects().find(|p| p.id == id)
    }
}

/// Order projects: explicit `order` first (ascending), then by name.
pub fn compare_projects(a: &Project, b: &Project) -> Ordering {
    (a.order.is_none(), a.order.unwrap_or(0), &a.name).cmp(&(
        b.order.is_none(),
        b.order.unwrap_or(0),
        &b.name,
    ))
}

/// Group page paths into `member → project → pages`.
///
/// Paths with fewer than three segments are ignored.
pub fn group_pages(paths: &[String]) -> BTreeMap<&str, BTreeMap<&str, Vec<String>>> {
    let mut groups: BTreeMap<&str, BTreeMap<&str, Vec<String>>> = BTreeMap::new();
    for path in paths {
        let mut parts = path.splitn(3, '/');
        let (Some(member), Some(project), Some(_)) = (parts.next(), parts.next(), parts.next())
        else {
            continue;
        };
        groups
            .entry(member)
            .or_default()
            .entry(project)
            .or_default()
            .push(path.clone());
    }
    groups
}

// ============================================================================
// Builder
// ============================================================================

pub struct CatalogBuilder<'a> {
    config: &'a PortalConfig,
}

impl<'a> CatalogBuilder<'a> {
    pub const fn new(config: &'a PortalConfig) -> Self {
        Self { config }
    }

    /// Build the catalog from discovered pages.
    pub fn build(&self, html_paths: Vec<String>, diagnostics: &mut Diagnostics) -> Catalog {
        let loader = MetadataLoader::new(&self.config.catalog.metadata);

        let members = group_pages(&html_paths)
            .into_iter()
            .map(|(member, projects)| {
                let mut projects: Vec<Project> = projects
                    .into_iter()
                    .map(|(name, pages)| {
                        self.build_project(&loader, member, name, pages, diagnostics)
                    })
                    .collect();
                projects.sort_by(compare_projects);

                Member {
                    name: member.to_string(),
                    project_count: projects.len(),
                    projects,
                }
            })
            .collect();

        Catalog {
            html_paths,
            members,
        }
    }

    fn build_project(
        &self,
        loader: &MetadataLoader<'_>,
        member: &str,
        name: &str,
        mut pages: Vec<String>,
        diagnostics: &mut Diagnostics,
    ) -> Project {
        sort_pages(&mut pages);
        pages.dedup();

        let id = format!("{member}/{name}");
        let root = self.config.root.join(member).join(name);
        let scope = ProjectScope {
            member,
            name,
            root: &root,
            pages: &pages,
        };
        let meta = loader.load(&scope, diagnostics);

        // Sorted and non-empty, so the first page is the lowest score
        let entry = meta
            .entry
            .filter(|entry| pages.contains(entry))
            .unwrap_or_else(|| pages[0].clone());

        let hidden_pages = meta.hidden_pages.and_then(|hidden| {
            let mut hidden: Vec<String> = hidden
                .into_iter()
                .filter(|page| pages.contains(page))
                .filter(|page| {
                    if *page == entry {
                        diagnostics.push(
                            DiagnosticKind::UnresolvableReference,
                            id.clone(),
                            format!("entry page `{page}` cannot be hidden; ignored"),
                        );
                        return false;
                    }
                    true
                })
                .collect();
            hidden.sort_by(|a, b| compare_pages(a, b));
            hidden.dedup();
            (!hidden.is_empty()).then_some(hidden)
        });

        Project {
            id,
            member: member.to_string(),
            name: name.to_string(),
            display_name: meta.display_name,
            entry,
            page_count: pages.len(),
            pages,
            hidden_pages,
            route_mode: meta.route_mode.unwrap_or_default(),
            order: meta.order,
            tags: meta.tags,
            updated_at: meta.updated_at,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
