//! Fatal error types.
//!
//! Only failures that make the whole run meaningless live here. Anything
//! scoped to one project or one file is recorded as a
//! [`Diagnostic`](crate::diagnostic::Diagnostic) instead.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PortalError {
    #[error("root directory `{0}` is not accessible")]
    Root(PathBuf, #[source] std::io::Error),

    #[error("root `{0}` is not a directory")]
    RootNotDirectory(PathBuf),

    #[error("failed to walk root directory `{0}`")]
    Walk(PathBuf, #[source] walkdir::Error),

    #[error("IO error when reading `{0}`")]
    Read(PathBuf, #[source] std::io::Error),

    #[error("IO error when writing `{0}`")]
    Write(PathBuf, #[source] std::io::Error),

    #[error("manifest `{0}` is not valid JSON")]
    ManifestJson(PathBuf, #[source] serde_json::Error),

    #[error("failed to serialize manifest")]
    Serialize(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, PortalError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Error, ErrorKind};

    #[test]
    fn test_portal_error_display() {
        let err = PortalError::Root(
            PathBuf::from("/srv/portal"),
            Error::new(ErrorKind::NotFound, "missing"),
        );
        assert!(format!("{err}").contains("/srv/portal"));

        let err = PortalError::RootNotDirectory(PathBuf::from("file.txt"));
        assert!(format!("{err}").contains("not a directory"));
    }

    #[test]
    fn test_portal_error_keeps_source() {
        use std::error::Error as _;

        let err = PortalError::Write(
            PathBuf::from("projects.manifest.json"),
            Error::new(ErrorKind::PermissionDenied, "read-only"),
        );
        assert!(err.source().is_some());
    }
}
