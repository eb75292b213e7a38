//! The environment descriptor: where each provisioned resource lives.

use std::path::{Path, PathBuf};

pub const ASSETS_DIR_NAME: &str = "assets";
pub const DATABASE_FILE_NAME: &str = "UserInfo.db";
pub const CONFIG_FILE_NAME: &str = "config.json";
pub const LOG_FILE_NAME: &str = "logs.log";

/// Absolute paths of the assets directory and the three files inside it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Environment {
    assets_dir: PathBuf,
    database_path: PathBuf,
    config_path: PathBuf,
    log_path: PathBuf,
}

impl Environment {
    /// Lay the environment out under `<base>/assets`. A relative base is
    /// resolved against the current directory.
    pub fn from_base<P: AsRef<Path>>(base: P) -> crate::Result<Self> {
        let base = base.as_ref();
        let base = if base.is_absolute() {
            base.to_path_buf()
        } else {
            std::env::current_dir()?.join(base)
        };
        Ok(Self::from_assets_dir(base.join(ASSETS_DIR_NAME)))
    }

    /// Lay the environment out next to the running executable.
    pub fn from_executable() -> crate::Result<Self> {
        let exe = std::env::current_exe()?;
        let base = exe.parent().ok_or_else(|| {
            std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("executable {} has no parent directory", exe.display()),
            )
        })?;
        Self::from_base(base)
    }

    fn from_assets_dir(assets_dir: PathBuf) -> Self {
        Self {
            database_path: assets_dir.join(DATABASE_FILE_NAME),
            config_path: assets_dir.join(CONFIG_FILE_NAME),
            log_path: assets_dir.join(LOG_FILE_NAME),
            assets_dir,
        }
    }

    pub fn assets_dir(&self) -> &Path {
        &self.assets_dir
    }

    pub fn database_path(&self) -> &Path {
        &self.database_path
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    pub fn log_path(&self) -> &Path {
        &self.log_path
    }

    /// Check which resources are already in place.
    ///
    /// A zero-length database or config file is the placeholder an
    /// interrupted first run leaves behind, so it counts as missing. An empty
    /// log file is a valid log.
    pub fn probe(&self) -> Presence {
        Presence {
            assets_dir: self.assets_dir.is_dir(),
            database: non_empty_file(&self.database_path),
            config: non_empty_file(&self.config_path),
            log: self.log_path.is_file(),
        }
    }
}

fn non_empty_file(path: &Path) -> bool {
    std::fs::metadata(path)
        .map(|meta| meta.is_file() && meta.len() > 0)
        .unwrap_or(false)
}

/// What [`Environment::probe`] found on disk.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Presence {
    pub assets_dir: bool,
    pub database: bool,
    pub config: bool,
    pub log: bool,
}

impl Presence {
    /// Directory, database and config are all in place.
    pub fn data_complete(&self) -> bool {
        self.assets_dir && self.database && self.config
    }

    pub fn all(&self) -> bool {
        self.data_complete() && self.log
    }
}
