//! Per-project metadata loading and validation.
//!
//! A project may carry a JSON object at its root (default `project.json`):
//!
//! ```json
//! {
//!   "displayName": "Data dashboard",
//!   "routeMode": "hash",
//!   "order": 1,
//!   "tags": ["charts", "demo"],
//!   "updatedAt": "2025-03-01T08:00:00Z",
//!   "hiddenPages": ["draft.html"],
//!   "entry": "pages/home.html"
//! }
//! ```
//!
//! Every field is validated on its own. A bad field is reported and dropped;
//! the rest of the document still applies. Unknown keys are ignored.

use super::page::normalize_project_path;
use crate::diagnostic::{DiagnosticKind, Diagnostics};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeSet;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

// ============================================================================
// Types
// ============================================================================

/// How the host application should route inside a project.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RouteMode {
    #[default]
    Path,
    Hash,
}

/// Validated metadata; every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectMetadata {
    pub display_name: Option<String>,
    pub route_mode: Option<RouteMode>,
    pub order: Option<i64>,
    /// Trimmed, deduplicated, sorted
    pub tags: Option<Vec<String>>,
    /// Kept verbatim once it parses
    pub updated_at: Option<String>,
    /// Full catalog paths, in declaration order, each present in the project
    pub hidden_pages: Option<Vec<String>>,
    /// Full catalog path present in the project
    pub entry: Option<String>,
}

/// The project a metadata document is being validated against.
#[derive(Debug, Clone, Copy)]
pub struct ProjectScope<'a> {
    pub member: &'a str,
    pub name: &'a str,
    pub root: &'a Path,
    /// Pages discovered for this project
    pub pages: &'a [String],
}

impl ProjectScope<'_> {
    fn contains(&self, page: &str) -> bool {
        self.pages.iter().any(|p| p == page)
    }
}

// ============================================================================
// Loader
// ============================================================================

/// Reads `<project root>/<file name>` and validates it field by field.
#[derive(Debug, Clone, Copy)]
pub struct MetadataLoader<'a> {
    file_name: &'a str,
}

impl<'a> MetadataLoader<'a> {
    pub const fn new(file_name: &'a str) -> Self {
        Self { file_name }
    }

    /// Load metadata for `scope`.
    ///
    /// A missing file yields the empty descriptor without any diagnostic.
    pub fn load(&self, scope: &ProjectScope<'_>, diagnostics: &mut Diagnostics) -> ProjectMetadata {
        let source = format!("{}/{}/{}", scope.member, scope.name, self.file_name);
        let path = scope.root.join(self.file_name);

        let raw = match fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == ErrorKind::NotFound => return ProjectMetadata::default(),
            Err(err) => {
                diagnostics.push(
                    DiagnosticKind::InvalidMetadataDocument,
                    source,
                    format!("cannot read metadata ({err}); using defaults"),
                );
                return ProjectMetadata::default();
            }
        };

        match parse_document(&raw) {
            Ok(object) => {
                let mut reader = FieldReader {
                    scope,
                    source,
                    diagnostics,
                };
                reader.read(&object)
            }
            Err(reason) => {
                diagnostics.push(
                    DiagnosticKind::InvalidMetadataDocument,
                    source,
                    format!("{reason}; using defaults"),
                );
                ProjectMetadata::default()
            }
        }
    }
}

fn parse_document(raw: &str) -> Result<Map<String, Value>, String> {
    // Editors on Windows like to prepend a BOM
    let raw = raw.strip_prefix('\u{feff}').unwrap_or(raw);
    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Object(object)) => Ok(object),
        Ok(other) => Err(format!(
            "top-level value must be an object, found {}",
            json_type(&other)
        )),
        Err(err) => Err(format!("invalid JSON: {err}")),
    }
}

// ============================================================================
// Field validation
// ============================================================================

struct FieldReader<'s, 'd> {
    scope: &'s ProjectScope<'s>,
    source: String,
    diagnostics: &'d mut Diagnostics,
}

impl FieldReader<'_, '_> {
    fn read(&mut self, object: &Map<String, Value>) -> ProjectMetadata {
        let get = |key: &str| object.get(key).filter(|v| !v.is_null());

        ProjectMetadata {
            display_name: get("displayName").and_then(|v| self.display_name(v)),
            route_mode: get("routeMode").and_then(|v| self.route_mode(v)),
            order: get("order").and_then(|v| self.order(v)),
            tags: get("tags").and_then(|v| self.tags(v)),
            updated_at: get("updatedAt").and_then(|v| self.updated_at(v)),
            hidden_pages: get("hiddenPages").and_then(|v| self.hidden_pages(v)),
            entry: get("entry").and_then(|v| self.entry(v)),
        }
    }

    fn invalid(&mut self, key: &str, message: impl std::fmt::Display) {
        self.diagnostics.push(
            DiagnosticKind::InvalidFieldValue,
            self.source.clone(),
            format!("`{key}` {message}; field ignored"),
        );
    }

    fn unresolved(&mut self, key: &str, value: &str, reason: impl std::fmt::Display) {
        self.diagnostics.push(
            DiagnosticKind::UnresolvableReference,
            self.source.clone(),
            format!("`{key}` entry `{value}` {reason}; ignored"),
        );
    }

    fn display_name(&mut self, value: &Value) -> Option<String> {
        match value.as_str().map(str::trim) {
            Some(name) if !name.is_empty() => Some(name.to_string()),
            Some(_) => {
                self.invalid("displayName", "must not be blank");
                None
            }
            None => {
                self.invalid("displayName", expected("a string", value));
                None
            }
        }
    }

    fn route_mode(&mut self, value: &Value) -> Option<RouteMode> {
        match value.as_str() {
            Some("path") => Some(RouteMode::Path),
            Some("hash") => Some(RouteMode::Hash),
            Some(other) => {
                self.invalid(
                    "routeMode",
                    format!("must be \"path\" or \"hash\", found \"{other}\""),
                );
                None
            }
            None => {
                self.invalid("routeMode", expected("a string", value));
                None
            }
        }
    }

    fn order(&mut self, value: &Value) -> Option<i64> {
        let order = value.as_i64();
        if order.is_none() {
            self.invalid("order", expected("an integer", value));
        }
        order
    }

    fn tags(&mut self, value: &Value) -> Option<Vec<String>> {
        let Some(items) = value.as_array() else {
            self.invalid("tags", expected("an array of strings", value));
            return None;
        };

        let mut tags = BTreeSet::new();
        for item in items {
            match item.as_str().map(str::trim) {
                Some(tag) if !tag.is_empty() => {
                    tags.insert(tag.to_string());
                }
                Some(_) => self.invalid("tags", "contains a blank tag"),
                None => self.invalid("tags", format!("item {}", expected("a string", item))),
            }
        }

        (!tags.is_empty()).then(|| tags.into_iter().collect())
    }

    fn updated_at(&mut self, value: &Value) -> Option<String> {
        let Some(raw) = value.as_str() else {
            self.invalid("updatedAt", expected("an ISO-8601 string", value));
            return None;
        };
        if is_iso8601(raw.trim()) {
            Some(raw.trim().to_string())
        } else {
            self.invalid("updatedAt", format!("\"{raw}\" is not an ISO-8601 date-time"));
            None
        }
    }

    fn hidden_pages(&mut self, value: &Value) -> Option<Vec<String>> {
        let Some(items) = value.as_array() else {
            self.invalid("hiddenPages", expected("an array of page paths", value));
            return None;
        };

        let mut pages: Vec<String> = Vec::new();
        for item in items {
            let Some(raw) = item.as_str() else {
                self.invalid("hiddenPages", format!("item {}", expected("a string", item)));
                continue;
            };
            if let Some(page) = self.resolve_page("hiddenPages", raw)
                && !pages.contains(&page)
            {
                pages.push(page);
            }
        }
        Some(pages)
    }

    fn entry(&mut self, value: &Value) -> Option<String> {
        let Some(raw) = value.as_str() else {
            self.invalid("entry", expected("a page path string", value));
            return None;
        };
        self.resolve_page("entry", raw)
    }

    /// Normalize a page reference and require it in the discovered page set.
    fn resolve_page(&mut self, key: &str, raw: &str) -> Option<String> {
        let scope = self.scope;
        match normalize_project_path(raw, scope.member, scope.name) {
            Ok(page) if scope.contains(&page) => Some(page),
            Ok(page) => {
                let reason = format!("resolves to `{page}`, which is not a page of this project");
                self.unresolved(key, raw, reason);
                None
            }
            Err(rejection) => {
                self.unresolved(key, raw, rejection);
                None
            }
        }
    }
}

/// Date-times carrying a numeric offset (`+08:00` or `+0800`)
const OFFSET_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f%:z",
    "%Y-%m-%dT%H:%M:%S%.f%z",
    "%Y-%m-%dT%H:%M%:z",
    "%Y-%m-%dT%H:%M%z",
];

/// Local date-times, with or without seconds
const LOCAL_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Accept RFC 3339, an offset or local date-time (seconds optional), or a bare date.
pub fn is_iso8601(value: &str) -> bool {
    if DateTime::parse_from_rfc3339(value).is_ok()
        || NaiveDate::parse_from_str(value, "%Y-%m-%d").is_ok()
        || OFFSET_FORMATS
            .iter()
            .any(|format| DateTime::parse_from_str(value, format).is_ok())
    {
        return true;
    }

    // A trailing `Z` is UTC on any date-time form
    let local = value.strip_suffix(['Z', 'z']).unwrap_or(value);
    LOCAL_FORMATS
        .iter()
        .any(|format| NaiveDateTime::parse_from_str(local, format).is_ok())
}

fn expected(what: &str, found: &Value) -> String {
    format!("must be {what}, found {}", json_type(found))
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(n) if n.is_f64() => "a float",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

// ============================================================================
// Tests
// ============================================================================
