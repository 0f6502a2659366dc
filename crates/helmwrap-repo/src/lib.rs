//! helmwrap Repository Handling
//!
//! This crate decides which chart repositories a run has to register with
//! Helm, and under which names:
//!
//! - **URL classification**: HTTP(S), OCI, and local file references
//! - **Registration names**: A stable short name derived from the URL
//! - **Per-run registry**: Each repository URL is registered at most once
//!
//! ## Example
//!
//! ```rust
//! use helmwrap_repo::{RepositoryRegistry, registration_name};
//!
//! assert_eq!(
//!     registration_name("https://prometheus-community.github.io/helm-charts"),
//!     "prometheus-community"
//! );
//!
//! let mut registry = RepositoryRegistry::new();
//! assert!(registry.register("https://charts.bitnami.com/bitnami").is_some());
//! assert!(registry.register("https://charts.bitnami.com/bitnami").is_none());
//! ```

pub mod config;
pub mod error;
pub mod naming;
pub mod registry;

// Re-exports for convenience
pub use config::RepositoryType;
pub use error::{RepoError, Result};
pub use naming::registration_name;
pub use registry::RepositoryRegistry;
