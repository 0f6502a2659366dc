//! The run pipeline
//!
//! Stages run once each, in order:
//! load config, register the referenced repository, extract a packaged
//! chart, build chart dependencies, build the Helm command, execute it.
//! The first fatal error stops the run.

use std::path::{Path, PathBuf};

use helmwrap_core::{
    CommandBuilder, CommandInvocation, Config, ExtractedChart, Overrides, RepositorySpec,
    dependency_build_plan, extract_chart, is_chart_archive,
};
use helmwrap_repo::RepositoryRegistry;
use tracing::{debug, info, warn};

use crate::error::{CliError, Result, Stage, StageContext};
use crate::executor::{Executor, ExitOutcome, Streams};

/// Inputs of one run
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Config record to act on
    pub config: PathBuf,
    /// Repository record the release refers to by name
    pub repo_config: Option<PathBuf>,
    pub values: Option<PathBuf>,
    pub chart: Option<PathBuf>,
    /// Appended to the primary command after everything else
    pub passthrough: Vec<String>,
}

/// Drives Helm through an [`Executor`]
pub struct Pipeline<E> {
    executor: E,
    helm: String,
    builder: CommandBuilder,
}

impl<E: Executor> Pipeline<E> {
    pub fn new(executor: E, helm: impl Into<String>, verbose: bool) -> Self {
        Self {
            executor,
            helm: helm.into(),
            builder: CommandBuilder::new().debug(verbose),
        }
    }

    #[cfg(test)]
    fn executor(&self) -> &E {
        &self.executor
    }

    /// Run every stage for one config
    pub fn run(&mut self, options: &RunOptions) -> Result<()> {
        enter(Stage::Load);
        let referenced = match &options.repo_config {
            Some(path) => load_referenced(path).stage(Stage::Load)?,
            None => None,
        };
        let overrides = Overrides {
            repository: referenced.as_ref().map(|repo| repo.name.clone()),
            values_file: options.values.clone(),
            chart_path: options.chart.clone(),
        };
        let mut config = Config::load(&options.config)
            .stage(Stage::Load)?
            .apply(&overrides);

        let mut registry = RepositoryRegistry::new();
        if let Some(repo) = referenced {
            enter(Stage::RegisterReferencedRepository);
            self.register_referenced(&repo);
            registry.mark_registered(repo.url, repo.name);
        }

        // Keeps an extracted chart on disk until Helm has finished with it
        let mut extracted: Option<ExtractedChart> = None;

        if let Config::Release(release) = &mut config
            && release.operation.deploys_chart()
            && release.is_local_chart()
        {
            if is_chart_archive(&release.chart) {
                enter(Stage::ExtractArchive);
                let chart = extract_chart(Path::new(&release.chart)).stage(Stage::ExtractArchive)?;
                release.chart = chart.chart_dir().display().to_string();
                extracted = Some(chart);
            }

            enter(Stage::BuildDependencies);
            self.build_dependencies(Path::new(&release.chart), &mut registry)
                .stage(Stage::BuildDependencies)?;
        }

        enter(Stage::BuildCommand);
        let invocation = self
            .builder
            .build(&self.helm, &config)
            .with_extra_args(options.passthrough.iter().cloned());

        enter(Stage::Execute);
        let result = self.execute_primary(&invocation).stage(Stage::Execute);

        drop(extracted);
        result
    }

    /// `repo add` for the referenced repository; failure is only logged
    fn register_referenced(&mut self, repo: &RepositorySpec) {
        info!("Adding repository {} from {}", repo.name, repo.url);
        let invocation = self
            .builder
            .build(&self.helm, &Config::Repository(repo.clone()));

        if let Err(reason) = self.try_execute(&invocation, Streams::Output) {
            warn!(
                "{}",
                CliError::RepositoryRegistrationFailed {
                    name: repo.name.clone(),
                    url: repo.url.clone(),
                    reason,
                }
            );
        }
    }

    fn build_dependencies(
        &mut self,
        chart_dir: &Path,
        registry: &mut RepositoryRegistry,
    ) -> std::result::Result<(), CliError> {
        let Some(manifest) = dependency_build_plan(chart_dir) else {
            debug!("No dependency build needed for {}", chart_dir.display());
            return Ok(());
        };
        info!("Building chart dependencies for {}", chart_dir.display());

        let pending = registry.register_dependencies(&manifest);
        for (name, url) in &pending {
            info!("Adding repository {} ({})", name, url);
            let invocation = self.builder.dependency_repository(&self.helm, name, url);
            if let Err(reason) = self.try_execute(&invocation, Streams::ErrorsOnly) {
                warn!(
                    "{}",
                    CliError::RepositoryRegistrationFailed {
                        name: name.clone(),
                        url: url.clone(),
                        reason,
                    }
                );
            }
        }

        if !pending.is_empty() {
            info!("Updating repository index");
            let invocation = self.builder.repository_update(&self.helm);
            self.run_required(&invocation, Streams::ErrorsOnly, |reason| {
                CliError::RepositoryUpdateFailed { reason }
            })?;
        }

        let invocation = self.builder.dependency_build(&self.helm, chart_dir);
        self.run_required(&invocation, Streams::Output, |reason| {
            CliError::DependencyBuildFailed {
                chart: chart_dir.display().to_string(),
                reason,
            }
        })
    }

    fn execute_primary(
        &mut self,
        invocation: &CommandInvocation,
    ) -> std::result::Result<(), CliError> {
        info!("Executing: {}", invocation);
        match self.executor.execute(invocation, Streams::All) {
            Ok(outcome) if outcome.is_success() => Ok(()),
            Ok(outcome) => Err(CliError::PrimaryCommandFailed {
                program: invocation.program().to_string(),
                code: outcome.exit_code(),
            }),
            Err(e) => Err(CliError::ProcessStartFailed {
                program: e.program,
                message: e.source.to_string(),
            }),
        }
    }

    /// Run a command whose failure aborts the pipeline
    fn run_required(
        &mut self,
        invocation: &CommandInvocation,
        streams: Streams,
        on_failure: impl FnOnce(String) -> CliError,
    ) -> std::result::Result<(), CliError> {
        debug!("Running: {}", invocation);
        match self.executor.execute(invocation, streams) {
            Ok(outcome) if outcome.is_success() => Ok(()),
            Ok(outcome) => Err(on_failure(outcome.to_string())),
            Err(e) => Err(CliError::ProcessStartFailed {
                program: e.program,
                message: e.source.to_string(),
            }),
        }
    }

    /// Run a command, describing any failure as text
    fn try_execute(
        &mut self,
        invocation: &CommandInvocation,
        streams: Streams,
    ) -> std::result::Result<ExitOutcome, String> {
        debug!("Running: {}", invocation);
        match self.executor.execute(invocation, streams) {
            Ok(outcome) if outcome.is_success() => Ok(outcome),
            Ok(outcome) => Err(outcome.to_string()),
            Err(e) => Err(e.to_string()),
        }
    }
}

fn enter(stage: Stage) {
    debug!("Stage: {}", stage);
}

/// Load the repository record named by `--repo-config`
///
/// A record without a registration name has nothing to register.
fn load_referenced(path: &Path) -> std::result::Result<Option<RepositorySpec>, CliError> {
    match Config::load(path)? {
        Config::Repository(repo) if repo.name.is_empty() => {
            debug!("Repository config {} has no name, skipping", path.display());
            Ok(None)
        }
        Config::Repository(repo) => Ok(Some(repo)),
        Config::Release(_) => Err(CliError::UnsupportedConfigShape {
            message: format!(
                "{} describes a release; --repo-config needs a repository record",
                path.display()
            ),
        }),
    }
}
