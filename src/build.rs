//! Portal build orchestration.
//!
//! # Pipeline
//!
//! ```text
//! build_portal()
//!     │
//!     ├── collect_html_paths()  ──► sorted page set
//!     │
//!     ├── AssetRewriter::run()  ──► html / css / router passes (in place)
//!     │
//!     ├── CatalogBuilder::build() ──► members → projects (+ metadata)
//!     │
//!     └── ManifestWriter::write() ──► written | unchanged
//! ```
//!
//! Every stage reads the same [`PortalConfig`]; per-file problems end up in
//! [`Diagnostics`] and never abort the run.

use crate::{
    catalog::{Catalog, CatalogBuilder},
    config::PortalConfig,
    diagnostic::Diagnostics,
    discovery::collect_html_paths,
    manifest::{ManifestWriter, WriteOutcome},
    rewrite::{AssetRewriter, RewriteReport},
};
use anyhow::{Context, Result};
use educe::Educe;

/// Per-invocation switches from the `build` subcommand.
#[derive(Debug, Clone, Copy, Educe)]
#[educe(Default)]
pub struct BuildOptions {
    /// Run the rewrite passes before cataloging
    #[educe(Default = true)]
    pub rewrite: bool,
    /// Compute everything but write nothing
    pub dry_run: bool,
}

/// Everything a build produced.
#[derive(Debug)]
pub struct BuildReport {
    pub rewrites: RewriteReport,
    pub catalog: Catalog,
    pub manifest: WriteOutcome,
    pub diagnostics: Diagnostics,
}

/// Discover, rewrite, catalog and persist the portal under `config.root`.
pub fn build_portal(config: &PortalConfig, options: &BuildOptions) -> Result<BuildReport> {
    let mut diagnostics = Diagnostics::new();

    let html_paths = collect_html_paths(&config.root, &config.catalog.exclude)
        .with_context(|| format!("Failed to discover pages under {}", config.root.display()))?;

    let rewrites = if options.rewrite {
        AssetRewriter::new(config, options.dry_run).run(&html_paths, &mut diagnostics)
    } else {
        RewriteReport::default()
    };

    let catalog = CatalogBuilder::new(config).build(html_paths, &mut diagnostics);

    let manifest = ManifestWriter::new(config.manifest_path())
        .write(&catalog, options.dry_run)
        .with_context(|| {
            format!(
                "Failed to write manifest {}",
                config.manifest_path().display()
            )
        })?;

    Ok(BuildReport {
        rewrites,
        catalog,
        manifest,
        diagnostics,
    })
}

// ============================================================================
// Tests
// ============================================================================
