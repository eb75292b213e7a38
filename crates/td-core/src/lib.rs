//! First-run environment bootstrap for Taskdesk.
//!
//! A Taskdesk environment is an `assets` directory holding the SQLite store
//! (`UserInfo.db`), the JSON config document (`config.json`) and the log
//! (`logs.log`). [`Bootstrap`] creates whichever of these are missing without
//! disturbing the ones that already exist.

pub mod bootstrap;
pub mod config;
pub mod environment;
pub mod error;
pub mod fs;
pub mod logging;

pub use bootstrap::{Bootstrap, BootstrapPlan, BootstrapReport, BootstrapState};
pub use config::{
    initial_payload, AppConfig, ConfigDocument, ConfigStore, JsonConfigStore, LoadOutcome,
    UserData, APP_VERSION,
};
pub use environment::{Environment, Presence};
pub use error::{Error, Resource, Result};
pub use logging::LogSink;
