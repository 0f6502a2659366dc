//! Repository URL classification

use crate::error::{RepoError, Result};

/// Repository type
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RepositoryType {
    /// Traditional HTTP repository with index.yaml
    #[default]
    Http,

    /// OCI-compliant registry, referenced by URL and never added with `repo add`
    Oci,

    /// Local filesystem
    File,
}

impl RepositoryType {
    /// Detect repository type from URL
    pub fn detect(url: &str) -> Result<Self> {
        if url.starts_with("oci://") {
            Ok(RepositoryType::Oci)
        } else if url.starts_with("file://") || url.starts_with('/') {
            Ok(RepositoryType::File)
        } else if url.starts_with("http://") || url.starts_with("https://") {
            Ok(RepositoryType::Http)
        } else {
            Err(RepoError::InvalidRepositoryUrl {
                url: url.to_string(),
                reason: "URL must start with http://, https://, oci://, file://, or /".to_string(),
            })
        }
    }

    /// Whether repositories of this type are registered with `helm repo add`
    pub fn is_registrable(self) -> bool {
        matches!(self, RepositoryType::Http)
    }
}
