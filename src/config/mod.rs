//! Portal configuration management for `portal.toml`.
//!
//! # Sections
//!
//! | Section     | Purpose                                          |
//! |-------------|--------------------------------------------------|
//! | `[catalog]` | Manifest path, metadata file name, exclusions    |
//! | `[rewrite]` | Toggles for the HTML, CSS and router passes      |
//!
//! The file is optional: every field has a default, and CLI flags override
//! whatever the file sets.
//!
//! # Example
//!
//! ```toml
//! [catalog]
//! manifest = "projects.manifest.json"
//! exclude = [".git", "node_modules", "tools"]
//!
//! [rewrite]
//! router = false
//! ```

mod catalog;
pub mod defaults;
mod error;
mod rewrite;

pub use catalog::CatalogConfig;
pub use error::ConfigError;
pub use rewrite::RewriteConfig;

use crate::cli::Cli;
use anyhow::{Result, bail};
use educe::Educe;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

// ============================================================================
// Root Configuration
// ============================================================================

/// Root configuration structure representing portal.toml.
///
/// Passed by reference into every component; nothing in the crate reads
/// paths from globals.
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct PortalConfig {
    /// Absolute root directory holding the member directories
    #[serde(skip)]
    pub root: PathBuf,

    /// Print notes in addition to warnings
    #[serde(skip)]
    pub verbose: bool,

    /// Catalog settings
    #[serde(default)]
    pub catalog: CatalogConfig,

    /// Rewrite settings
    #[serde(default)]
    pub rewrite: RewriteConfig,
}

impl PortalConfig {
    /// Parse configuration from TOML string
    pub fn from_str(content: &str) -> Result<Self> {
        let config: PortalConfig = toml::from_str(content).map_err(ConfigError::from)?;
        Ok(config)
    }

    /// Load configuration from file path
    pub fn from_path(path: &Path) -> Result<Self> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;
        Self::from_str(&content)
    }

    /// Default configuration anchored at `root`.
    #[cfg(test)]
    pub fn for_root(root: &Path) -> Self {
        let mut config = Self::default();
        config.set_root(root);
        config
    }

    /// Load the config file named by the CLI (if present) and apply overrides.
    pub fn load(cli: &Cli) -> Result<Self> {
        let root = cli.root.as_deref().unwrap_or(Path::new("./"));
        let config_path = root.join(&cli.config);

        let mut config = if config_path.exists() {
            Self::from_path(&config_path)?
        } else {
            Self::default()
        };
        config.update_with_cli(cli);
        config.validate()?;

        Ok(config)
    }

    /// Set the root directory and re-anchor the manifest path under it.
    pub fn set_root(&mut self, root: &Path) {
        self.root = Self::normalize_path(root);
        if self.catalog.manifest.is_relative() {
            self.catalog.manifest = self.root.join(&self.catalog.manifest);
        }
    }

    /// Absolute manifest path
    pub fn manifest_path(&self) -> &Path {
        &self.catalog.manifest
    }

    /// Whether a top-level directory name is excluded from member discovery
    #[cfg(test)]
    pub fn is_excluded(&self, name: &str) -> bool {
        self.catalog.exclude.contains(name)
    }

    /// Update configuration with CLI arguments
    pub fn update_with_cli(&mut self, cli: &Cli) {
        let root = cli.root.clone().unwrap_or_else(|| PathBuf::from("./"));

        Self::update_option(&mut self.catalog.manifest, cli.manifest.as_ref());
        self.catalog.exclude.extend(cli.exclude.iter().cloned());
        self.verbose = cli.verbose;

        self.set_root(&root);
    }

    /// Update config option if CLI value is provided
    fn update_option<T: Clone>(config_option: &mut T, cli_option: Option<&T>) {
        if let Some(option) = cli_option {
            *config_option = option.clone();
        }
    }

    /// Normalize a path to absolute, using canonicalize if the path exists
    fn normalize_path(path: &Path) -> PathBuf {
        path.canonicalize().unwrap_or_else(|_| {
            // For non-existent paths, manually make them absolute
            if path.is_absolute() {
                path.to_path_buf()
            } else {
                std::env::current_dir()
                    .map(|cwd| cwd.join(path))
                    .unwrap_or_else(|_| path.to_path_buf())
            }
        })
    }

    /// Validate configuration before any component runs
    pub fn validate(&self) -> Result<()> {
        if !self.root.exists() {
            bail!(ConfigError::Validation(format!(
                "root `{}` not found",
                self.root.display()
            )));
        }
        if !self.root.is_dir() {
            bail!(ConfigError::Validation(format!(
                "root `{}` is not a directory",
                self.root.display()
            )));
        }

        if let Some(name) = self
            .catalog
            .exclude
            .iter()
            .find(|name| name.is_empty() || name.contains(['/', '\\']))
        {
            bail!(ConfigError::Validation(format!(
                "[catalog.exclude] entry `{name}` must be a single directory name"
            )));
        }

        if self.catalog.metadata.is_empty() || self.catalog.metadata.contains(['/', '\\']) {
            bail!(ConfigError::Validation(
                "[catalog.metadata] must be a plain file name".into()
            ));
        }

        if self.rewrite.router && self.rewrite.scripts.is_empty() {
            bail!(ConfigError::Validation(
                "[rewrite.scripts] needs at least one extension when router rewriting is enabled"
                    .into()
            ));
        }
        if let Some(ext) = self.rewrite.scripts.iter().find(|ext| ext.starts_with('.')) {
            bail!(ConfigError::Validation(format!(
                "[rewrite.scripts] entry `{ext}` must not start with a dot"
            )));
        }

        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Commands;
    use tempfile::TempDir;

    fn cli_for(root: &Path) -> Cli {
        Cli {
            root: Some(root.to_path_buf()),
            config: PathBuf::from("portal.toml"),
            manifest: None,
            exclude: Vec::new(),
            verbose: false,
            command: Commands::Check,
        }
    }

    #[test]
    fn test_for_root_anchors_manifest() {
        let dir = TempDir::new().unwrap();
        let config = PortalConfig::for_root(dir.path());

        assert!(config.root.is_absolute());
        assert!(config.manifest_path().starts_with(&config.root));
        assert!(config.manifest_path().ends_with("projects.manifest.json"));
    }

    #[test]
    fn test_load_without_config_file() {
        let dir = TempDir::new().unwrap();
        let config = PortalConfig::load(&cli_for(dir.path())).unwrap();

        assert_eq!(config.catalog.metadata, "project.json");
        assert!(config.is_excluded("node_modules"));
        assert!(!config.is_excluded("alice"));
    }

    #[test]
    fn test_load_with_config_file_and_cli_overrides() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("portal.toml"),
            "[catalog]\nmanifest = \"out/m.json\"\nexclude = [\"build\"]\n",
        )
        .unwrap();

        let mut cli = cli_for(dir.path());
        cli.exclude = vec!["drafts".into()];
        cli.verbose = true;
        let config = PortalConfig::load(&cli).unwrap();

        assert!(config.manifest_path().ends_with("out/m.json"));
        assert!(config.is_excluded("build"));
        assert!(config.is_excluded("drafts"));
        assert!(!config.is_excluded("node_modules"));
        assert!(config.verbose);
    }

    #[test]
    fn test_cli_manifest_override() {
        let dir = TempDir::new().unwrap();
        let mut cli = cli_for(dir.path());
        cli.manifest = Some(PathBuf::from("public/portal.json"));
        let config = PortalConfig::load(&cli).unwrap();

        assert!(config.manifest_path().ends_with("public/portal.json"));
        assert!(config.manifest_path().is_absolute());
    }

    #[test]
    fn test_validate_missing_root() {
        let dir = TempDir::new().unwrap();
        let result = PortalConfig::load(&cli_for(&dir.path().join("missing")));
        assert!(result.is_err());
    }

    #[test]
    fn test_validate_rejects_nested_exclude() {
        let dir = TempDir::new().unwrap();
        let mut cli = cli_for(dir.path());
        cli.exclude = vec!["a/b".into()];
        let err = PortalConfig::load(&cli).unwrap_err();
        assert!(format!("{err}").contains("single directory name"));
    }

    #[test]
    fn test_validate_rejects_dotted_script_extension() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("portal.toml"),
            "[rewrite]\nscripts = [\".js\"]\n",
        )
        .unwrap();
        let err = PortalConfig::load(&cli_for(dir.path())).unwrap_err();
        assert!(format!("{err}").contains("must not start with a dot"));
    }

    #[test]
    fn test_invalid_toml_is_reported() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("portal.toml"), "[catalog\n").unwrap();
        assert!(PortalConfig::load(&cli_for(dir.path())).is_err());
    }
}
