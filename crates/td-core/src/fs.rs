//! Filesystem provisioning: create what is missing, leave the rest alone.

use crate::error::{Error, Resource};
use std::fs::{self, OpenOptions};
use std::io::ErrorKind;
use std::path::Path;

/// Create `path` and any missing parents. Returns whether anything was
/// created; an existing directory is left untouched.
///
/// Does not log; callers report the creation once their log sink is attached.
pub fn ensure_directory(path: &Path) -> crate::Result<bool> {
    if path.is_dir() {
        return Ok(false);
    }
    fs::create_dir_all(path).map_err(|e| Error::creation(Resource::AssetsDirectory, path, e))?;
    Ok(true)
}

/// Create an empty file at `path` unless something is already there.
/// Existing content is never truncated.
pub fn ensure_file(path: &Path, resource: Resource) -> crate::Result<bool> {
    match OpenOptions::new().write(true).create_new(true).open(path) {
        Ok(_) => {
            tracing::debug!(path = %path.display(), %resource, "created placeholder");
            Ok(true)
        }
        Err(e) if e.kind() == ErrorKind::AlreadyExists => Ok(false),
        Err(e) => Err(Error::creation(resource, path, e)),
    }
}
