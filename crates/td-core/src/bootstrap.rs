//! First-run environment bootstrap.
//!
//! On every start the orchestrator probes the four resources and picks one of
//! three plans:
//!
//! - directory, database or config missing: provision everything that is
//!   missing, seeding the schema and the initial config;
//! - only the log file missing: recreate the log and touch nothing else;
//! - everything present: attach to the existing log and stop.
//!
//! Each step is idempotent on its own, so a run interrupted halfway is
//! completed by the next start.

use crate::config::{initial_payload, ConfigDocument, ConfigStore, JsonConfigStore};
use crate::environment::{Environment, Presence};
use crate::error::{Error, Resource};
use crate::fs::{ensure_directory, ensure_file};
use crate::logging::LogSink;
use chrono::Local;
use std::marker::PhantomData;
use td_local_db::{initialize_schema, Database, RelationalStore};
use tracing::level_filters::LevelFilter;

/// Where the orchestrator is in its run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootstrapState {
    Uninitialized,
    Provisioning,
    LogOnlyRepair,
    Ready,
}

/// What a run decided to do, given what it found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootstrapPlan {
    Provision,
    RepairLog,
    Nothing,
}

impl BootstrapPlan {
    pub fn for_presence(presence: Presence) -> Self {
        if !presence.data_complete() {
            BootstrapPlan::Provision
        } else if !presence.log {
            BootstrapPlan::RepairLog
        } else {
            BootstrapPlan::Nothing
        }
    }
}

/// Outcome of [`Bootstrap::run`].
#[derive(Debug)]
pub struct BootstrapReport {
    /// Resources found before the run touched anything.
    pub presence: Presence,
    pub plan: BootstrapPlan,
    /// Where the run ended; always [`BootstrapState::Ready`] for a returned report.
    pub state: BootstrapState,
    /// The attached log; install it with [`LogSink::dispatch`].
    pub sink: LogSink,
}

/// Drives a relational store and a config store to bring an
/// [`Environment`] to the ready state.
pub struct Bootstrap<R: RelationalStore = Database, C: ConfigStore = JsonConfigStore> {
    environment: Environment,
    config: C,
    log_level: LevelFilter,
    state: BootstrapState,
    _store: PhantomData<fn() -> R>,
}

impl Bootstrap {
    /// Bootstrap backed by SQLite and the JSON config file of `environment`.
    pub fn new(environment: Environment) -> Self {
        let config = JsonConfigStore::new(environment.config_path());
        Self::with_config_store(environment, config)
    }
}

impl<R: RelationalStore, C: ConfigStore> Bootstrap<R, C> {
    pub fn with_config_store(environment: Environment, config: C) -> Self {
        Self {
            environment,
            config,
            log_level: LevelFilter::INFO,
            state: BootstrapState::Uninitialized,
            _store: PhantomData,
        }
    }

    /// Level for the events the run itself writes to the log. Defaults to INFO.
    pub fn with_log_level(mut self, level: LevelFilter) -> Self {
        self.log_level = level;
        self
    }

    pub fn environment(&self) -> &Environment {
        &self.environment
    }

    pub fn config_store(&self) -> &C {
        &self.config
    }

    pub fn state(&self) -> BootstrapState {
        self.state
    }

    /// Probe the environment and create whatever the plan calls for.
    ///
    /// Any failure to create a resource is returned as
    /// [`Error::ResourceCreation`]; the environment may then be partially
    /// provisioned and the next run picks up from there.
    pub fn run(&mut self) -> crate::Result<BootstrapReport> {
        let presence = self.environment.probe();
        let plan = BootstrapPlan::for_presence(presence);

        let sink = match plan {
            BootstrapPlan::Provision => {
                self.state = BootstrapState::Provisioning;
                self.provision(presence)?
            }
            BootstrapPlan::RepairLog => {
                self.state = BootstrapState::LogOnlyRepair;
                let sink = LogSink::attach(self.environment.log_path())?;
                self.scoped(&sink, || {
                    tracing::warn!(
                        path = %self.environment.log_path().display(),
                        "log file was missing, recreated it"
                    );
                });
                sink
            }
            BootstrapPlan::Nothing => LogSink::attach(self.environment.log_path())?,
        };

        self.state = BootstrapState::Ready;
        self.scoped(&sink, || {
            tracing::info!(
                assets = %self.environment.assets_dir().display(),
                ?plan,
                "environment ready"
            );
        });
        Ok(BootstrapReport {
            presence,
            plan,
            state: self.state,
            sink,
        })
    }

    fn provision(&self, presence: Presence) -> crate::Result<LogSink> {
        let assets_dir = self.environment.assets_dir();
        let created_dir = ensure_directory(assets_dir)?;
        let sink = LogSink::attach(self.environment.log_path())?;

        self.scoped(&sink, || -> crate::Result<()> {
            tracing::info!(?presence, "provisioning environment");
            if created_dir {
                tracing::info!(path = %assets_dir.display(), "created directory");
            }
            ensure_file(self.environment.database_path(), Resource::Database)?;
            ensure_file(self.environment.config_path(), Resource::Config)?;
            self.initialize_database()?;
            self.seed_config()
        })?;
        Ok(sink)
    }

    fn initialize_database(&self) -> crate::Result<()> {
        let path = self.environment.database_path();
        let store =
            R::open_or_create(path).map_err(|e| Error::creation(Resource::Database, path, e))?;
        // `store` is dropped, and the connection released, on every early return.
        initialize_schema(&store).map_err(|e| Error::creation(Resource::Database, path, e))?;
        store.close()?;
        tracing::info!(path = %path.display(), "database schema ready");
        Ok(())
    }

    /// Merge the initial payload, skipping every top-level key the document
    /// already holds so `Creation_Date` is written exactly once.
    fn seed_config(&self) -> crate::Result<()> {
        let path = self.environment.config_path();
        let existing = match self.config.load() {
            Ok(document) => document,
            Err(Error::ConfigNotFound(_)) => ConfigDocument::new(),
            Err(e) => return Err(Error::creation(Resource::Config, path, e)),
        };

        let seed: ConfigDocument = initial_payload(Local::now())
            .into_iter()
            .filter(|(key, _)| !existing.contains_key(key))
            .collect();
        if seed.is_empty() {
            tracing::info!("config already seeded");
            return Ok(());
        }

        self.config
            .merge(seed)
            .map_err(|e| Error::creation(Resource::Config, path, e))?;
        Ok(())
    }

    fn scoped<T>(&self, sink: &LogSink, f: impl FnOnce() -> T) -> T {
        tracing::dispatcher::with_default(&sink.dispatch(self.log_level), f)
    }
}
