//! Repositories registered during one run

use helmwrap_core::ChartManifest;
use indexmap::IndexMap;
use indexmap::map::Entry;

use crate::config::RepositoryType;
use crate::naming::registration_name;

/// URL to registration name, in first-seen order
///
/// Lives for a single run; a URL is handed out for registration once.
#[derive(Debug, Default)]
pub struct RepositoryRegistry {
    entries: IndexMap<String, String>,
}

impl RepositoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a repository that was registered outside dependency discovery
    pub fn mark_registered(&mut self, url: impl Into<String>, name: impl Into<String>) {
        self.entries.entry(url.into()).or_insert_with(|| name.into());
    }

    /// Claim a URL for registration
    ///
    /// Returns the name to register it under, or `None` when the URL was
    /// already seen, is not an HTTP(S) repository, or yields no name.
    pub fn register(&mut self, url: &str) -> Option<String> {
        let registrable = RepositoryType::detect(url).is_ok_and(RepositoryType::is_registrable);
        if !registrable {
            return None;
        }

        let name = registration_name(url);
        if name.is_empty() {
            return None;
        }

        match self.entries.entry(url.to_string()) {
            Entry::Occupied(_) => None,
            Entry::Vacant(slot) => {
                slot.insert(name.clone());
                Some(name)
            }
        }
    }

    /// Claim every dependency repository of a chart
    ///
    /// Returns `(name, url)` pairs that still need `helm repo add`.
    pub fn register_dependencies(&mut self, manifest: &ChartManifest) -> Vec<(String, String)> {
        let mut pending = Vec::new();
        for url in manifest.repository_urls() {
            if let Some(name) = self.register(url) {
                tracing::debug!("Dependency repository {} -> {}", url, name);
                pending.push((name, url.to_string()));
            }
        }
        pending
    }

    /// Registration name recorded for a URL
    pub fn name_for(&self, url: &str) -> Option<&str> {
        self.entries.get(url).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
