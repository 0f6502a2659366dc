//! Invocation configuration
//!
//! A config record is a JSON object written by the build tooling. It is read
//! as a flat [`ConfigRecord`] and converted into the typed [`Config`], which
//! is either a repository registration or a release operation.

use serde::{Deserialize, Deserializer};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::error::{CoreError, Result};

/// Namespace Helm uses when none is given; never passed explicitly
pub const DEFAULT_NAMESPACE: &str = "default";

/// Chart value that asks for the chart path to be supplied at run time
pub const CHART_PATH_PLACEHOLDER: &str = "__CHART_PATH__";

/// Wire form of a config record
///
/// Every field is optional on the wire; `null` and empty strings mean
/// "not set".
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ConfigRecord {
    /// `repository` or `release`
    #[serde(rename = "type", deserialize_with = "null_as_default")]
    pub kind: String,

    /// Release operation (install, upgrade, uninstall, status, get-values)
    #[serde(deserialize_with = "null_as_default")]
    pub command: String,

    #[serde(deserialize_with = "null_as_default")]
    pub release_name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub chart: String,

    /// Name of a registered repository holding the chart
    #[serde(deserialize_with = "null_as_default")]
    pub repository: String,

    /// Repository URL passed straight to `--repo`
    #[serde(deserialize_with = "null_as_default")]
    pub repo_url: String,

    /// Registration name (repository records)
    #[serde(deserialize_with = "null_as_default")]
    pub repo_name: String,

    #[serde(deserialize_with = "null_as_default")]
    pub namespace: String,
    #[serde(deserialize_with = "null_as_default")]
    pub version: String,
    #[serde(deserialize_with = "null_as_default")]
    pub values_file: String,
    #[serde(deserialize_with = "null_as_default")]
    pub flags: Vec<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub timeout: String,

    // Repository records
    #[serde(deserialize_with = "null_as_default")]
    pub url: String,
    #[serde(deserialize_with = "null_as_default")]
    pub ca_file: String,
    #[serde(deserialize_with = "null_as_default")]
    pub cert_file: String,
    #[serde(deserialize_with = "null_as_default")]
    pub username: String,
    #[serde(deserialize_with = "null_as_default")]
    pub password: String,
    #[serde(deserialize_with = "null_as_default")]
    pub force_update: bool,
    #[serde(deserialize_with = "null_as_default")]
    pub insecure_skip_tls_verify: bool,
    #[serde(deserialize_with = "null_as_default")]
    pub no_update: bool,
}

/// Read an explicit `null` as the field's zero value
fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

impl ConfigRecord {
    /// Read a record from a JSON file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| CoreError::ConfigRead {
            path: path.display().to_string(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| CoreError::ConfigParse {
            path: path.display().to_string(),
            source,
        })
    }
}

/// Typed configuration for one run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Config {
    /// Register a chart repository (`helm repo add`)
    Repository(RepositorySpec),
    /// Act on a release
    Release(ReleaseSpec),
}

impl Config {
    /// Load and validate a config file
    pub fn load(path: &Path) -> Result<Self> {
        ConfigRecord::load(path)?.try_into()
    }

    /// Apply run-time overrides. Repository configs are returned unchanged.
    pub fn apply(self, overrides: &Overrides) -> Self {
        match self {
            Config::Release(spec) => Config::Release(spec.apply(overrides)),
            other => other,
        }
    }
}

impl TryFrom<ConfigRecord> for Config {
    type Error = CoreError;

    fn try_from(record: ConfigRecord) -> Result<Self> {
        match record.kind.as_str() {
            "repository" => Ok(Config::Repository(RepositorySpec {
                name: record.repo_name,
                url: record.url,
                ca_file: non_empty(record.ca_file),
                cert_file: non_empty(record.cert_file),
                username: non_empty(record.username),
                password: non_empty(record.password),
                force_update: record.force_update,
                insecure_skip_tls_verify: record.insecure_skip_tls_verify,
                no_update: record.no_update,
            })),
            "release" => {
                let operation = record.command.parse::<Operation>()?;
                let source = match (non_empty(record.repository), non_empty(record.repo_url)) {
                    (Some(name), None) => ChartSource::Registered(name),
                    (None, Some(url)) => ChartSource::Url(url),
                    (None, None) => ChartSource::Local,
                    (Some(name), Some(url)) => {
                        return Err(CoreError::InvalidConfig {
                            message: format!(
                                "release sets both repository {name:?} and repo_url {url:?}"
                            ),
                        });
                    }
                };

                Ok(Config::Release(ReleaseSpec {
                    operation,
                    release_name: record.release_name,
                    chart: record.chart,
                    source,
                    namespace: non_empty(record.namespace),
                    version: non_empty(record.version),
                    values_file: non_empty(record.values_file).map(PathBuf::from),
                    timeout: non_empty(record.timeout),
                    flags: record.flags,
                }))
            }
            other => Err(CoreError::UnknownConfigKind {
                kind: other.to_string(),
            }),
        }
    }
}

fn non_empty(value: String) -> Option<String> {
    if value.is_empty() { None } else { Some(value) }
}

/// A chart repository registration
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RepositorySpec {
    /// Registration name
    pub name: String,
    pub url: String,
    pub ca_file: Option<String>,
    pub cert_file: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub force_update: bool,
    pub insecure_skip_tls_verify: bool,
    pub no_update: bool,
}

/// Release operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Install,
    Upgrade,
    Uninstall,
    Status,
    GetValues,
}

impl Operation {
    /// Install and upgrade deploy a chart; the others only name a release
    pub fn deploys_chart(self) -> bool {
        matches!(self, Operation::Install | Operation::Upgrade)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Operation::Install => "install",
            Operation::Upgrade => "upgrade",
            Operation::Uninstall => "uninstall",
            Operation::Status => "status",
            Operation::GetValues => "get-values",
        }
    }
}

impl FromStr for Operation {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "install" => Ok(Operation::Install),
            "upgrade" => Ok(Operation::Upgrade),
            "uninstall" => Ok(Operation::Uninstall),
            "status" => Ok(Operation::Status),
            // "get" is the name older records use
            "get-values" | "get" => Ok(Operation::GetValues),
            other => Err(CoreError::UnknownOperation {
                operation: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where the chart of a release comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChartSource {
    /// A repository registered under this name (`<name>/<chart>`)
    Registered(String),
    /// A repository URL handed to `--repo`
    Url(String),
    /// A chart directory or packaged archive on disk
    Local,
}

/// A release operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseSpec {
    pub operation: Operation,
    pub release_name: String,
    pub chart: String,
    pub source: ChartSource,
    /// `None` means the default namespace
    pub namespace: Option<String>,
    pub version: Option<String>,
    pub values_file: Option<PathBuf>,
    pub timeout: Option<String>,
    /// Extra flags appended verbatim
    pub flags: Vec<String>,
}

impl ReleaseSpec {
    pub fn new(operation: Operation, release_name: impl Into<String>) -> Self {
        Self {
            operation,
            release_name: release_name.into(),
            chart: String::new(),
            source: ChartSource::Local,
            namespace: None,
            version: None,
            values_file: None,
            timeout: None,
            flags: Vec::new(),
        }
    }

    /// Whether the chart lives on disk rather than in a repository
    pub fn is_local_chart(&self) -> bool {
        matches!(self.source, ChartSource::Local)
    }

    /// Namespace to pass explicitly, if it differs from the default
    pub fn explicit_namespace(&self) -> Option<&str> {
        self.namespace
            .as_deref()
            .filter(|ns| !ns.is_empty() && *ns != DEFAULT_NAMESPACE)
    }

    fn apply(mut self, overrides: &Overrides) -> Self {
        if let Some(name) = &overrides.repository {
            self.source = ChartSource::Registered(name.clone());
        }
        if let Some(values) = &overrides.values_file {
            self.values_file = Some(values.clone());
        }
        if let Some(chart) = &overrides.chart_path
            && self.chart == CHART_PATH_PLACEHOLDER
        {
            self.chart = chart.display().to_string();
        }
        self
    }
}

/// Values supplied at run time that take precedence over the record
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Overrides {
    /// Registration name of a referenced repository
    pub repository: Option<String>,
    pub values_file: Option<PathBuf>,
    /// Replaces a chart of [`CHART_PATH_PLACEHOLDER`]
    pub chart_path: Option<PathBuf>,
}
