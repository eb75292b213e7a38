//! The JSON config document: versioning metadata plus the user profile.
//!
//! Every write is a read-modify-write of the whole document. Keys are only
//! ever removed by [`ConfigStore::delete`].

use crate::error::Error;
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use serde_json::ser::PrettyFormatter;
use serde_json::{Map, Value};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Version recorded in fresh config documents.
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Layout of `Creation_Date`.
pub const CREATION_DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";

/// Top-level config keys.
pub mod keys {
    pub const VERSION: &str = "Version";
    pub const CREATION_DATE: &str = "Creation_Date";
    pub const USER_DATA: &str = "User_Data";

    /// Keys of the `User_Data` block.
    pub mod user_data {
        pub const ID: &str = "ID";
        pub const USERNAME: &str = "Username";
        pub const EMAIL: &str = "Email";
        pub const PASSWORD: &str = "Password";
    }
}

/// A config document: a JSON object, key order preserved.
pub type ConfigDocument = Map<String, Value>;

/// What reading the config file produced, short of an I/O failure.
#[derive(Debug)]
pub enum LoadOutcome {
    Document(ConfigDocument),
    /// The file holds nothing but whitespace.
    Empty,
    /// The file holds something other than a JSON object.
    Malformed(serde_json::Error),
}

impl LoadOutcome {
    /// The parsed document, or an empty one for the recoverable cases.
    pub fn into_document(self) -> ConfigDocument {
        match self {
            LoadOutcome::Document(document) => document,
            LoadOutcome::Empty | LoadOutcome::Malformed(_) => ConfigDocument::new(),
        }
    }
}

/// Capability to read and update the config document.
pub trait ConfigStore {
    /// Read and classify the current contents. Fails with
    /// [`Error::ConfigNotFound`] when there is no file and with
    /// [`Error::Io`] when it cannot be read.
    fn read(&self) -> crate::Result<LoadOutcome>;

    /// Shallow-merge `fields` into the stored document and persist the result.
    /// Keys of `fields` win; every other stored key is kept. Returns the
    /// document as written.
    fn merge(&self, fields: ConfigDocument) -> crate::Result<ConfigDocument>;

    /// Remove `key` and persist. Returns whether the key was present.
    fn delete(&self, key: &str) -> crate::Result<bool>;

    /// The stored document. Empty or malformed content yields an empty
    /// document; a missing file is still reported as
    /// [`Error::ConfigNotFound`].
    fn load(&self) -> crate::Result<ConfigDocument> {
        match self.read()? {
            LoadOutcome::Document(document) => {
                tracing::debug!(keys = document.len(), "config loaded");
                Ok(document)
            }
            LoadOutcome::Empty => {
                tracing::info!("config file is empty, starting from an empty document");
                Ok(ConfigDocument::new())
            }
            LoadOutcome::Malformed(e) => {
                tracing::warn!(error = %e, "config file is malformed, starting from an empty document");
                Ok(ConfigDocument::new())
            }
        }
    }

    fn get(&self, key: &str) -> crate::Result<Option<Value>> {
        Ok(self.load()?.remove(key))
    }
}

/// [`ConfigStore`] over a pretty-printed JSON file.
#[derive(Debug, Clone)]
pub struct JsonConfigStore {
    path: PathBuf,
}

impl JsonConfigStore {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the document, treating a missing file like an empty one.
    fn load_or_empty(&self) -> crate::Result<ConfigDocument> {
        match self.load() {
            Err(Error::ConfigNotFound(path)) => {
                tracing::info!(path = %path.display(), "config file not found, starting from an empty document");
                Ok(ConfigDocument::new())
            }
            other => other,
        }
    }

    /// Replace the file contents with `document` in one step: write a
    /// sibling temp file, then rename it over the target.
    fn write(&self, document: &ConfigDocument) -> crate::Result<()> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let mut temp = tempfile::NamedTempFile::new_in(dir)?;
        {
            let formatter = PrettyFormatter::with_indent(b"    ");
            let mut serializer = serde_json::Serializer::with_formatter(&mut temp, formatter);
            document.serialize(&mut serializer)?;
        }
        temp.write_all(b"\n")?;
        temp.as_file().sync_all()?;
        temp.persist(&self.path).map_err(|e| e.error)?;
        Ok(())
    }
}

impl ConfigStore for JsonConfigStore {
    fn read(&self) -> crate::Result<LoadOutcome> {
        let contents = match std::fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(Error::ConfigNotFound(self.path.clone()))
            }
            Err(e) => return Err(e.into()),
        };

        if contents.trim().is_empty() {
            return Ok(LoadOutcome::Empty);
        }
        Ok(match serde_json::from_str::<ConfigDocument>(&contents) {
            Ok(document) => LoadOutcome::Document(document),
            Err(e) => LoadOutcome::Malformed(e),
        })
    }

    fn merge(&self, fields: ConfigDocument) -> crate::Result<ConfigDocument> {
        let mut document = self.load_or_empty()?;
        let updated: Vec<String> = fields.keys().cloned().collect();
        for (key, value) in fields {
            document.insert(key, value);
        }
        self.write(&document)?;
        tracing::info!(keys = ?updated, "config updated");
        Ok(document)
    }

    fn delete(&self, key: &str) -> crate::Result<bool> {
        let mut document = self.load_or_empty()?;
        if document.shift_remove(key).is_none() {
            tracing::warn!(key, "key not found in config");
            return Ok(false);
        }
        self.write(&document)?;
        tracing::info!(key, "key deleted from config");
        Ok(true)
    }
}

/// The document a fresh environment starts with: current version, the
/// creation timestamp and an empty user profile.
pub fn initial_payload(created_at: DateTime<Local>) -> ConfigDocument {
    let mut user_data = Map::new();
    for key in [
        keys::user_data::ID,
        keys::user_data::USERNAME,
        keys::user_data::EMAIL,
        keys::user_data::PASSWORD,
    ] {
        user_data.insert(key.to_string(), Value::String(String::new()));
    }

    let mut document = ConfigDocument::new();
    document.insert(keys::VERSION.to_string(), Value::from(APP_VERSION));
    document.insert(
        keys::CREATION_DATE.to_string(),
        Value::from(created_at.format(CREATION_DATE_FORMAT).to_string()),
    );
    document.insert(keys::USER_DATA.to_string(), Value::Object(user_data));
    document
}

/// Typed view of the fields the application itself relies on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(rename = "Version")]
    pub version: String,
    #[serde(rename = "Creation_Date")]
    pub creation_date: String,
    #[serde(rename = "User_Data")]
    pub user_data: UserData,
}

/// The user-profile block. All fields are strings, empty until a user signs in.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserData {
    #[serde(rename = "ID")]
    pub id: String,
    #[serde(rename = "Username")]
    pub username: String,
    #[serde(rename = "Email")]
    pub email: String,
    #[serde(rename = "Password")]
    pub password: String,
}

impl AppConfig {
    /// Interpret a loaded document. Unknown keys are ignored.
    pub fn from_document(document: &ConfigDocument) -> crate::Result<Self> {
        serde_json::from_value(Value::Object(document.clone()))
            .map_err(|e| Error::config_shape(e.to_string()))
    }
}
