//! Default values for configuration fields.
//!
//! These functions are used by serde for default deserialization.

// ============================================================================
// Common Defaults
// ============================================================================

pub fn r#true() -> bool {
    true
}

// ============================================================================
// [catalog] Section Defaults
// ============================================================================

pub mod catalog {
    use std::collections::BTreeSet;
    use std::path::PathBuf;

    pub fn manifest() -> PathBuf {
        "projects.manifest.json".into()
    }

    pub fn metadata() -> String {
        "project.json".into()
    }

    /// Tooling and output directories that never hold member namespaces.
    pub fn exclude() -> BTreeSet<String> {
        [
            ".git",
            ".github",
            ".vscode",
            "node_modules",
            "dist",
            "scripts",
            "src",
            "tests",
            "tools",
        ]
        .into_iter()
        .map(String::from)
        .collect()
    }
}

// ============================================================================
// [rewrite] Section Defaults
// ============================================================================

pub mod rewrite {
    pub fn scripts() -> Vec<String> {
        ["js", "mjs", "cjs", "ts", "jsx", "tsx"]
            .into_iter()
            .map(String::from)
            .collect()
    }
}
