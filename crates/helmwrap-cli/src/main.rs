//! helmwrap - runs Helm from declarative config records

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use console::style;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

mod error;
mod executor;
mod exit_codes;
mod pipeline;

use error::StageError;
use executor::ProcessExecutor;
use pipeline::{Pipeline, RunOptions};

#[derive(Parser)]
#[command(name = "helmwrap")]
#[command(author = "Helmwrap Contributors")]
#[command(version)]
#[command(about = "Runs Helm from declarative config records", long_about = None)]
struct Cli {
    /// Config record (JSON) describing a repository or a release
    #[arg(short, long)]
    config: PathBuf,

    /// Helm binary to run
    #[arg(long, env = "HELMWRAP_HELM", default_value = "helm")]
    helm: String,

    /// Repository record the release installs its chart from
    #[arg(long)]
    repo_config: Option<PathBuf>,

    /// Values file used instead of the record's values_file
    #[arg(short = 'f', long)]
    values: Option<PathBuf>,

    /// Chart path substituted for a __CHART_PATH__ chart
    #[arg(long)]
    chart: Option<PathBuf>,

    /// Verbose logging; also passes --debug to Helm
    #[arg(short, long)]
    verbose: bool,

    /// Extra Helm arguments, given after `--`
    #[arg(last = true)]
    helm_args: Vec<String>,
}

fn main() -> ExitCode {
    miette::set_panic_hook();

    let cli = Cli::parse();
    init_logging(cli.verbose);

    let options = RunOptions {
        config: cli.config,
        repo_config: cli.repo_config,
        values: cli.values,
        chart: cli.chart,
        passthrough: cli.helm_args,
    };

    let mut pipeline = Pipeline::new(ProcessExecutor, cli.helm, cli.verbose);
    match pipeline.run(&options) {
        Ok(()) => ExitCode::from(exit_codes::SUCCESS as u8),
        Err(err) => report(err),
    }
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default_level.into()))
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .without_time()
                .with_target(false),
        )
        .init();
}

fn report(err: StageError) -> ExitCode {
    let code = err.exit_code();
    eprintln!(
        "{} {}",
        style("✗").red().bold(),
        style(format!("{} failed", err.stage)).bold()
    );
    eprintln!("{:?}", miette::Report::new(err.cause));
    u8::try_from(code).map_or(ExitCode::FAILURE, ExitCode::from)
}
