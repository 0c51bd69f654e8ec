//! `[rewrite]` section configuration.

use super::defaults;
use educe::Educe;
use serde::{Deserialize, Serialize};

/// `[rewrite]` section in portal.toml - toggles for each rewriting pass.
///
/// # Example
/// ```toml
/// [rewrite]
/// html = true
/// css = true
/// router = false
/// scripts = ["js", "mjs"]
/// ```
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(default, deny_unknown_fields)]
pub struct RewriteConfig {
    /// Rewrite `src`/`href`/`srcset` in discovered pages.
    #[serde(default = "defaults::r#true")]
    #[educe(Default = true)]
    pub html: bool,

    /// Rewrite `url(...)` and `@import` in project stylesheets.
    #[serde(default = "defaults::r#true")]
    #[educe(Default = true)]
    pub css: bool,

    /// Rewrite router history bases in project scripts.
    #[serde(default = "defaults::r#true")]
    #[educe(Default = true)]
    pub router: bool,

    /// Script extensions scanned by the router pass (without the dot).
    #[serde(default = "defaults::rewrite::scripts")]
    #[educe(Default = defaults::rewrite::scripts())]
    pub scripts: Vec<String>,
}

impl RewriteConfig {
    /// Whether any pass is enabled.
    pub fn any(&self) -> bool {
        self.html || self.css || self.router
    }

    /// Whether `ext` (case-insensitive) is a configured script extension.
    pub fn is_script_extension(&self, ext: &str) -> bool {
        self.scripts.iter().any(|s| s.eq_ignore_ascii_case(ext))
    }
}
