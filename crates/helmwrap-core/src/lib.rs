//! helmwrap Core - configuration and command model for the Helm runner
//!
//! This crate provides the pure pieces of a helmwrap run:
//! - `Config`: The typed release/repository record (with its JSON wire form)
//! - `CommandBuilder`: Config to Helm argument vector
//! - `ChartManifest`: Dependency inspection of a local chart
//! - `ExtractedChart`: A packaged chart unpacked into a scratch directory

pub mod archive;
pub mod chart;
pub mod config;
pub mod error;
pub mod invocation;

pub use archive::{ExtractedChart, extract_chart, is_chart_archive};
pub use chart::{
    ChartDependency, ChartManifest, dependency_build_plan, has_packaged_dependencies,
    needs_dependency_build,
};
pub use config::{
    ChartSource, Config, ConfigRecord, Operation, Overrides, ReleaseSpec, RepositorySpec,
    CHART_PATH_PLACEHOLDER, DEFAULT_NAMESPACE,
};
pub use error::{CoreError, Result};
pub use invocation::{CommandBuilder, CommandInvocation};
