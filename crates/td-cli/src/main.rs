use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use td_core::{AppConfig, Bootstrap, ConfigStore, Environment};
use tracing::{info, level_filters::LevelFilter};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "taskdesk")]
#[command(about = "Prepare the Taskdesk local environment")]
#[command(version, long_about = None)]
struct Args {
    /// Directory holding `assets/` (defaults to the executable's directory)
    #[arg(long, value_name = "DIR")]
    home: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    fn level(&self) -> LevelFilter {
        if self.verbose {
            LevelFilter::DEBUG
        } else {
            LevelFilter::INFO
        }
    }

    fn environment(&self) -> Result<Environment> {
        let environment = match &self.home {
            Some(home) => Environment::from_base(home),
            None => Environment::from_executable(),
        };
        environment.context("failed to resolve the environment location")
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    let environment = args.environment()?;

    let mut bootstrap = Bootstrap::new(environment).with_log_level(args.level());
    let report = bootstrap.run().context("failed to prepare the environment")?;

    // RUST_LOG, when set, overrides the level chosen on the command line.
    let filter = EnvFilter::builder()
        .with_default_directive(args.level().into())
        .from_env_lossy();
    tracing::dispatcher::set_global_default(report.sink.dispatch_with_filter(filter))
        .context("failed to install the log sink")?;

    let document = bootstrap.config_store().load()?;
    match AppConfig::from_document(&document) {
        Ok(config) => info!(
            version = %config.version,
            created = %config.creation_date,
            "Taskdesk started"
        ),
        Err(e) => tracing::warn!(error = %e, "config is missing expected fields"),
    }

    Ok(())
}
