//! Chart.yaml dependency inspection
//!
//! Decides whether a local chart needs `helm dependency build` and lists the
//! repositories its dependencies point at.

use serde::Deserialize;
use std::path::Path;

/// Chart manifest file name inside a chart directory
pub const CHART_MANIFEST: &str = "Chart.yaml";

/// Directory holding packaged dependency charts
pub const DEPENDENCY_DIR: &str = "charts";

/// Text that marks a dependency section when the manifest is not valid YAML
const DEPENDENCY_MARKER: &str = "dependencies:";

const PACKAGED_CHART_EXTENSION: &str = "tgz";

/// The part of Chart.yaml this engine reads
#[derive(Debug, Deserialize)]
struct ChartFile {
    #[serde(default)]
    dependencies: Option<Vec<ChartDependency>>,
}

/// A dependency declared in Chart.yaml
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ChartDependency {
    #[serde(default)]
    pub name: String,

    /// Repository URL, `@alias`, or `file://` path
    #[serde(default)]
    pub repository: Option<String>,
}

/// Parsed dependency section of a chart manifest
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChartManifest {
    pub dependencies: Vec<ChartDependency>,
    declares_dependencies: bool,
}

impl ChartManifest {
    /// Parse manifest content
    ///
    /// Content that is not valid YAML still counts as declaring dependencies
    /// when it contains a `dependencies:` line, so `helm dependency build`
    /// gets a chance to report the real problem.
    pub fn parse(content: &str) -> Self {
        match serde_yaml::from_str::<ChartFile>(content) {
            Ok(chart) => {
                let dependencies = chart.dependencies.unwrap_or_default();
                Self {
                    declares_dependencies: !dependencies.is_empty(),
                    dependencies,
                }
            }
            Err(e) => {
                tracing::debug!("Chart.yaml is not valid YAML, scanning text: {}", e);
                Self {
                    dependencies: Vec::new(),
                    declares_dependencies: content.contains(DEPENDENCY_MARKER),
                }
            }
        }
    }

    /// Read `Chart.yaml` from a chart directory
    pub fn read(chart_dir: &Path) -> std::io::Result<Self> {
        let content = std::fs::read_to_string(chart_dir.join(CHART_MANIFEST))?;
        Ok(Self::parse(&content))
    }

    pub fn declares_dependencies(&self) -> bool {
        self.declares_dependencies
    }

    /// Repository references of all dependencies, in declaration order
    pub fn repository_urls(&self) -> impl Iterator<Item = &str> {
        self.dependencies
            .iter()
            .filter_map(|dep| dep.repository.as_deref())
    }
}

/// Whether `charts/` holds at least one packaged chart
pub fn has_packaged_dependencies(chart_dir: &Path) -> bool {
    let Ok(entries) = std::fs::read_dir(chart_dir.join(DEPENDENCY_DIR)) else {
        return false;
    };

    entries.flatten().any(|entry| {
        let path = entry.path();
        path.is_file()
            && path
                .extension()
                .is_some_and(|ext| ext == PACKAGED_CHART_EXTENSION)
    })
}

/// Manifest of a chart whose declared dependencies have not been packaged
/// yet, or `None` when there is nothing to build
///
/// An unreadable manifest means there is nothing to build.
pub fn dependency_build_plan(chart_dir: &Path) -> Option<ChartManifest> {
    let manifest = match ChartManifest::read(chart_dir) {
        Ok(manifest) => manifest,
        Err(e) => {
            tracing::debug!(
                "Could not read {} in {}: {}",
                CHART_MANIFEST,
                chart_dir.display(),
                e
            );
            return None;
        }
    };

    if manifest.declares_dependencies() && !has_packaged_dependencies(chart_dir) {
        Some(manifest)
    } else {
        None
    }
}

/// Whether a chart declares dependencies that have not been packaged yet
pub fn needs_dependency_build(chart_dir: &Path) -> bool {
    dependency_build_plan(chart_dir).is_some()
}
