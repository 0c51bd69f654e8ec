//! Manifest serialization and idempotent persistence.
//!
//! # Output Shape
//!
//! ```json
//! {
//!   "generatedAt": "2026-01-01T00:00:00Z",
//!   "version": 2,
//!   "htmlPaths": ["alice/blog/index.html"],
//!   "members": [{ "name": "alice", "projectCount": 1, "projects": [...] }],
//!   "projects": [...],
//!   "stats": { "memberCount": 1, "projectCount": 1, "pageCount": 1 }
//! }
//! ```
//!
//! The file is rewritten only when something other than `generatedAt` changed.

use crate::catalog::{Catalog, Member, Project};
use crate::error::{PortalError, Result};
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Current manifest schema version
pub const MANIFEST_VERSION: u32 = 2;

/// Key excluded from change detection
const TIMESTAMP_KEY: &str = "generatedAt";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stats {
    pub member_count: usize,
    pub project_count: usize,
    pub page_count: usize,
}

/// Serialized manifest document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestPayload {
    pub generated_at: String,
    pub version: u32,
    pub html_paths: Vec<String>,
    pub members: Vec<Member>,
    pub projects: Vec<Project>,
    pub stats: Stats,
}

impl ManifestPayload {
    /// Assemble a payload stamped with the current UTC time.
    pub fn from_catalog(catalog: &Catalog) -> Self {
        let projects: Vec<Project> = catalog.projects().cloned().collect();
        Self {
            generated_at: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
            version: MANIFEST_VERSION,
            html_paths: catalog.html_paths.clone(),
            members: catalog.members.clone(),
            stats: Stats {
                member_count: catalog.members.len(),
                project_count: projects.len(),
                page_count: catalog.html_paths.len(),
            },
            projects,
        }
    }

    /// Read and parse a persisted manifest.
    pub fn load(path: &Path) -> Result<Self> {
        let content =
            fs::read_to_string(path).map_err(|err| PortalError::Read(path.to_path_buf(), err))?;
        serde_json::from_str(&content)
            .map_err(|err| PortalError::ManifestJson(path.to_path_buf(), err))
    }

    /// Payload as a JSON value without the timestamp.
    fn comparable(&self) -> Result<Value> {
        let mut value = serde_json::to_value(self)?;
        strip_timestamp(&mut value);
        Ok(value)
    }
}

/// Result of [`ManifestWriter::write`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    /// The file was (re)written
    Written,
    /// Existing content already matches
    Unchanged,
    /// Content differs but nothing was written (dry run)
    Pending,
}

pub struct ManifestWriter {
    path: PathBuf,
}

impl ManifestWriter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[cfg(test)]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Persist `catalog` unless the stored manifest is semantically equal.
    pub fn write(&self, catalog: &Catalog, dry_run: bool) -> Result<WriteOutcome> {
        let payload = ManifestPayload::from_catalog(catalog);

        if let Some(existing) = self.read_existing()?
            && existing == payload.comparable()?
        {
            return Ok(WriteOutcome::Unchanged);
        }
        if dry_run {
            return Ok(WriteOutcome::Pending);
        }

        let mut content = serde_json::to_string_pretty(&payload)?;
        content.push('\n');

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .map_err(|err| PortalError::Write(parent.to_path_buf(), err))?;
        }
        fs::write(&self.path, content).map_err(|err| PortalError::Write(self.path.clone(), err))?;

        Ok(WriteOutcome::Written)
    }

    /// Existing manifest as a comparable JSON value.
    ///
    /// A missing or unparsable file yields `None`; any other read failure is fatal.
    fn read_existing(&self) -> Result<Option<Value>> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(PortalError::Read(self.path.clone(), err)),
        };
        Ok(serde_json::from_str::<Value>(&content).ok().map(|mut value| {
            strip_timestamp(&mut value);
            value
        }))
    }
}

fn strip_timestamp(value: &mut Value) {
    if let Value::Object(map) = value {
        map.remove(TIMESTAMP_KEY);
    }
}
