//! `[catalog]` section configuration.
//!
//! Controls where the manifest lands, which metadata file each project may
//! carry, and which top-level directories are never treated as members.

use super::defaults;
use educe::Educe;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::PathBuf;

/// `[catalog]` section in portal.toml.
///
/// # Example
/// ```toml
/// [catalog]
/// manifest = "projects.manifest.json"
/// metadata = "project.json"
/// exclude = [".git", "node_modules", "tools"]
/// ```
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(default, deny_unknown_fields)]
pub struct CatalogConfig {
    /// Manifest output path (relative to root).
    #[serde(default = "defaults::catalog::manifest")]
    #[educe(Default = defaults::catalog::manifest())]
    pub manifest: PathBuf,

    /// Per-project metadata file name, looked up at each project root.
    #[serde(default = "defaults::catalog::metadata")]
    #[educe(Default = defaults::catalog::metadata())]
    pub metadata: String,

    /// Top-level directory names excluded from member discovery.
    #[serde(default = "defaults::catalog::exclude")]
    #[educe(Default = defaults::catalog::exclude())]
    pub exclude: BTreeSet<String>,
}
