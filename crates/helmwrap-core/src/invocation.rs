//! Helm argument vectors
//!
//! [`CommandBuilder`] turns a [`Config`] into the exact arguments passed to
//! the Helm binary. It has no side effects; running the result is the
//! caller's job.

use std::fmt;
use std::path::Path;

use crate::config::{ChartSource, Config, Operation, ReleaseSpec, RepositorySpec};

/// A program and its arguments, ready to run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandInvocation {
    program: String,
    args: Vec<String>,
}

impl CommandInvocation {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Append arguments after everything already built
    #[must_use]
    pub fn with_extra_args<I, S>(mut self, extra: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(extra.into_iter().map(Into::into));
        self
    }
}

impl fmt::Display for CommandInvocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// Builds Helm argument vectors
#[derive(Debug, Clone, Default)]
pub struct CommandBuilder {
    debug: bool,
}

impl CommandBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `--debug` to config-driven commands
    #[must_use]
    pub fn debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Build the invocation for a config
    pub fn build(&self, program: &str, config: &Config) -> CommandInvocation {
        CommandInvocation::new(program, self.build_args(config))
    }

    /// Build the argument vector for a config
    pub fn build_args(&self, config: &Config) -> Vec<String> {
        let mut args = match config {
            Config::Repository(spec) => repository_args(spec),
            Config::Release(spec) => release_args(spec),
        };

        if self.debug {
            args.push("--debug".to_string());
        }

        // Caller flags always come last
        if let Config::Release(spec) = config {
            args.extend(spec.flags.iter().cloned());
        }

        args
    }

    /// `repo add <name> <url>` for a repository discovered in a chart
    pub fn dependency_repository(
        &self,
        program: &str,
        name: &str,
        url: &str,
    ) -> CommandInvocation {
        CommandInvocation::new(program, strings(&["repo", "add", name, url]))
    }

    /// `repo update`
    pub fn repository_update(&self, program: &str) -> CommandInvocation {
        CommandInvocation::new(program, strings(&["repo", "update"]))
    }

    /// `dependency build <chart>`
    pub fn dependency_build(&self, program: &str, chart_dir: &Path) -> CommandInvocation {
        CommandInvocation::new(
            program,
            vec![
                "dependency".to_string(),
                "build".to_string(),
                chart_dir.display().to_string(),
            ],
        )
    }
}

fn strings(parts: &[&str]) -> Vec<String> {
    parts.iter().map(|s| s.to_string()).collect()
}

fn repository_args(spec: &RepositorySpec) -> Vec<String> {
    let mut args = strings(&["repo", "add", spec.name.as_str(), spec.url.as_str()]);

    let valued = [
        ("--ca-file", &spec.ca_file),
        ("--cert-file", &spec.cert_file),
        ("--username", &spec.username),
        ("--password", &spec.password),
    ];
    for (flag, value) in valued {
        if let Some(value) = value {
            args.push(flag.to_string());
            args.push(value.clone());
        }
    }

    let switches = [
        ("--force-update", spec.force_update),
        ("--insecure-skip-tls-verify", spec.insecure_skip_tls_verify),
        ("--no-update", spec.no_update),
    ];
    for (flag, set) in switches {
        if set {
            args.push(flag.to_string());
        }
    }

    args
}

fn release_args(spec: &ReleaseSpec) -> Vec<String> {
    let mut args = Vec::new();

    match spec.operation {
        // upgrade --install converges to the same state on every run
        Operation::Install => {
            args.extend(strings(&["upgrade", "--install", spec.release_name.as_str()]));
            push_chart_reference(&mut args, spec);
        }
        Operation::Upgrade => {
            args.extend(strings(&["upgrade", spec.release_name.as_str()]));
            push_chart_reference(&mut args, spec);
        }
        Operation::Uninstall => args.extend(strings(&["uninstall", spec.release_name.as_str()])),
        Operation::Status => args.extend(strings(&["status", spec.release_name.as_str()])),
        Operation::GetValues => {
            args.extend(strings(&["get", "values", spec.release_name.as_str()]))
        }
    }

    if let Some(namespace) = spec.explicit_namespace() {
        args.push("--namespace".to_string());
        args.push(namespace.to_string());
    }

    if spec.operation.deploys_chart() {
        if let Some(version) = &spec.version {
            args.push("--version".to_string());
            args.push(version.clone());
        }
        if let Some(values) = &spec.values_file {
            args.push("--values".to_string());
            args.push(values.display().to_string());
        }
        if let Some(timeout) = &spec.timeout {
            args.push("--timeout".to_string());
            args.push(timeout.clone());
        }
    }

    args
}

fn push_chart_reference(args: &mut Vec<String>, spec: &ReleaseSpec) {
    match &spec.source {
        ChartSource::Registered(repo) => args.push(format!("{}/{}", repo, spec.chart)),
        ChartSource::Url(url) => {
            args.push(spec.chart.clone());
            args.push("--repo".to_string());
            args.push(url.clone());
        }
        ChartSource::Local => args.push(spec.chart.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_NAMESPACE;
    use std::path::PathBuf;

    fn release(operation: Operation, name: &str, namespace: &str) -> ReleaseSpec {
        let mut spec = ReleaseSpec::new(operation, name);
        spec.chart = name.to_string();
        spec.namespace = Some(namespace.to_string());
        spec
    }

    fn args(config: Config) -> Vec<String> {
        CommandBuilder::new().build_args(&config)
    }

    #[test]
    fn test_repository_add() {
        let spec = RepositorySpec {
            name: "jetstack".to_string(),
            url: "https://charts.jetstack.io".to_string(),
            ..Default::default()
        };
        assert_eq!(
            args(Config::Repository(spec)),
            vec!["repo", "add", "jetstack", "https://charts.jetstack.io"]
        );
    }

    #[test]
    fn test_repository_add_with_auth() {
        let spec = RepositorySpec {
            name: "private".to_string(),
            url: "https://charts.example.com".to_string(),
            username: Some("user".to_string()),
            password: Some("pass".to_string()),
            force_update: true,
            ..Default::default()
        };
        insta::assert_snapshot!(
            args(Config::Repository(spec)).join(" "),
            @"repo add private https://charts.example.com --username user --password pass --force-update"
        );
    }

    #[test]
    fn test_repository_flag_order() {
        let spec = RepositorySpec {
            name: "secure".to_string(),
            url: "https://charts.example.com".to_string(),
            ca_file: Some("ca.pem".to_string()),
            cert_file: Some("cert.pem".to_string()),
            username: Some("u".to_string()),
            password: Some("p".to_string()),
            force_update: true,
            insecure_skip_tls_verify: true,
            no_update: true,
        };
        insta::assert_snapshot!(
            args(Config::Repository(spec)).join(" "),
            @"repo add secure https://charts.example.com --ca-file ca.pem --cert-file cert.pem --username u --password p --force-update --insecure-skip-tls-verify --no-update"
        );
    }

    #[test]
    fn test_install_with_repository() {
        let mut spec = release(Operation::Install, "cert-manager", "cert-manager");
        spec.source = ChartSource::Registered("jetstack".to_string());
        spec.version = Some("v1.13.2".to_string());
        spec.flags = vec!["--create-namespace".to_string(), "--wait".to_string()];

        assert_eq!(
            args(Config::Release(spec)),
            vec![
                "upgrade",
                "--install",
                "cert-manager",
                "jetstack/cert-manager",
                "--namespace",
                "cert-manager",
                "--version",
                "v1.13.2",
                "--create-namespace",
                "--wait",
            ]
        );
    }

    #[test]
    fn test_install_with_repo_url() {
        let mut spec = release(Operation::Install, "prometheus", "monitoring");
        spec.chart = "kube-prometheus-stack".to_string();
        spec.source =
            ChartSource::Url("https://prometheus-community.github.io/helm-charts".to_string());

        assert_eq!(
            args(Config::Release(spec)),
            vec![
                "upgrade",
                "--install",
                "prometheus",
                "kube-prometheus-stack",
                "--repo",
                "https://prometheus-community.github.io/helm-charts",
                "--namespace",
                "monitoring",
            ]
        );
    }

    #[test]
    fn test_install_local_chart() {
        let mut spec = release(Operation::Install, "app", DEFAULT_NAMESPACE);
        spec.chart = "./charts/app".to_string();
        spec.values_file = Some(PathBuf::from("values/prod.yaml"));

        insta::assert_snapshot!(
            args(Config::Release(spec)).join(" "),
            @"upgrade --install app ./charts/app --values values/prod.yaml"
        );
    }

    #[test]
    fn test_upgrade_with_repository() {
        let mut spec = release(Operation::Upgrade, "cert-manager", "cert-manager");
        spec.source = ChartSource::Registered("jetstack".to_string());
        spec.version = Some("v1.13.3".to_string());
        spec.timeout = Some("10m".to_string());

        assert_eq!(
            args(Config::Release(spec)),
            vec![
                "upgrade",
                "cert-manager",
                "jetstack/cert-manager",
                "--namespace",
                "cert-manager",
                "--version",
                "v1.13.3",
                "--timeout",
                "10m",
            ]
        );
    }

    #[test]
    fn test_uninstall() {
        let spec = release(Operation::Uninstall, "cert-manager", "cert-manager");
        assert_eq!(
            args(Config::Release(spec)),
            vec!["uninstall", "cert-manager", "--namespace", "cert-manager"]
        );
    }

    #[test]
    fn test_status() {
        let spec = release(Operation::Status, "cert-manager", "cert-manager");
        assert_eq!(
            args(Config::Release(spec)),
            vec!["status", "cert-manager", "--namespace", "cert-manager"]
        );
    }

    #[test]
    fn test_get_values() {
        let spec = release(Operation::GetValues, "cert-manager", "cert-manager");
        assert_eq!(
            args(Config::Release(spec)),
            vec!["get", "values", "cert-manager", "--namespace", "cert-manager"]
        );
    }

    #[test]
    fn test_non_deploy_operations_ignore_chart_flags() {
        let mut spec = release(Operation::Status, "app", DEFAULT_NAMESPACE);
        spec.version = Some("1.0.0".to_string());
        spec.values_file = Some(PathBuf::from("values.yaml"));
        spec.timeout = Some("5m".to_string());
        spec.flags = vec!["--output".to_string(), "json".to_string()];

        assert_eq!(
            args(Config::Release(spec)),
            vec!["status", "app", "--output", "json"]
        );
    }

    #[test]
    fn test_install_always_upgrade_install() {
        for source in [
            ChartSource::Local,
            ChartSource::Registered("repo".to_string()),
            ChartSource::Url("https://example.com".to_string()),
        ] {
            let mut spec = release(Operation::Install, "rel", "ns");
            spec.source = source;
            let built = args(Config::Release(spec));
            assert_eq!(&built[..3], ["upgrade", "--install", "rel"]);
        }
    }

    #[test]
    fn test_namespace_emitted_once_unless_default() {
        let operations = [
            Operation::Install,
            Operation::Upgrade,
            Operation::Uninstall,
            Operation::Status,
            Operation::GetValues,
        ];
        for operation in operations {
            let default = args(Config::Release(release(operation, "r", DEFAULT_NAMESPACE)));
            assert!(!default.iter().any(|a| a == "--namespace"), "{operation}");

            let mut unset = release(operation, "r", DEFAULT_NAMESPACE);
            unset.namespace = None;
            assert!(!args(Config::Release(unset)).iter().any(|a| a == "--namespace"));

            let custom = args(Config::Release(release(operation, "r", "apps")));
            assert_eq!(custom.iter().filter(|a| *a == "--namespace").count(), 1);
        }
    }

    #[test]
    fn test_debug_before_caller_flags() {
        let mut spec = release(Operation::Install, "test", DEFAULT_NAMESPACE);
        spec.chart = "test-chart".to_string();
        spec.flags = vec!["--wait".to_string()];

        let built = CommandBuilder::new()
            .debug(true)
            .build_args(&Config::Release(spec));
        assert_eq!(
            built,
            vec!["upgrade", "--install", "test", "test-chart", "--debug", "--wait"]
        );
    }

    #[test]
    fn test_invocation_extra_args() {
        let spec = release(Operation::Status, "app", DEFAULT_NAMESPACE);
        let invocation = CommandBuilder::new()
            .build("helm", &Config::Release(spec))
            .with_extra_args(["--output", "yaml"]);

        assert_eq!(invocation.program(), "helm");
        assert_eq!(invocation.args(), ["status", "app", "--output", "yaml"]);
        assert_eq!(invocation.to_string(), "helm status app --output yaml");
    }

    #[test]
    fn test_dependency_commands() {
        let builder = CommandBuilder::new().debug(true);
        assert_eq!(
            builder
                .dependency_repository("helm", "bitnami", "https://charts.bitnami.com/bitnami")
                .args(),
            ["repo", "add", "bitnami", "https://charts.bitnami.com/bitnami"]
        );
        assert_eq!(builder.repository_update("helm").args(), ["repo", "update"]);
        assert_eq!(
            builder.dependency_build("helm", Path::new("/tmp/chart")).args(),
            ["dependency", "build", "/tmp/chart"]
        );
    }
}
