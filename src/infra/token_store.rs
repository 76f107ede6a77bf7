//! Persistence of the session token between runs.

use std::fmt;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing::{debug, warn};

use super::error::InfraError;
use crate::util::lock::mutex_lock;

/// Fixed file name of the persisted token inside the token directory.
pub const TOKEN_FILE_NAME: &str = "auth_token";

const SOURCE: &str = "infra::token_store";

/// Storage for the bearer token of the current session.
pub trait TokenStore: Send + Sync + fmt::Debug {
    fn load(&self) -> Result<Option<String>, InfraError>;
    fn save(&self, token: &str) -> Result<(), InfraError>;
    /// Removes the token; clearing an empty store is not an error.
    fn clear(&self) -> Result<(), InfraError>;
}

/// Keeps the token in `<dir>/auth_token`.
#[derive(Debug, Clone)]
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            path: dir.as_ref().join(TOKEN_FILE_NAME),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TokenStore for FileTokenStore {
    fn load(&self) -> Result<Option<String>, InfraError> {
        match fs::read_to_string(&self.path) {
            Ok(contents) => {
                let token = contents.trim();
                Ok((!token.is_empty()).then(|| token.to_string()))
            }
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    fn save(&self, token: &str) -> Result<(), InfraError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        write_private(&self.path, token, restrict_permissions)?;
        debug!(target: SOURCE, path = %self.path.display(), "session token persisted");
        Ok(())
    }

    fn clear(&self) -> Result<(), InfraError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}

/// Writes `token` and restricts its permissions; when the second step fails
/// the file is removed so no half-persisted token is left behind.
fn write_private(
    path: &Path,
    token: &str,
    restrict: impl FnOnce(&Path) -> Result<(), InfraError>,
) -> Result<(), InfraError> {
    fs::write(path, token)?;
    if let Err(err) = restrict(path) {
        if let Err(cleanup) = fs::remove_file(path) {
            warn!(
                target: SOURCE,
                path = %path.display(),
                error = %cleanup,
                "failed to remove token file after permission error"
            );
        }
        return Err(err);
    }
    Ok(())
}

#[cfg(unix)]
fn restrict_permissions(path: &Path) -> Result<(), InfraError> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o600))?;
    Ok(())
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path) -> Result<(), InfraError> {
    Ok(())
}

/// Process-local store for tests and embedders that manage persistence
/// themselves.
#[derive(Default)]
pub struct MemoryTokenStore {
    token: Mutex<Option<String>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            token: Mutex::new(Some(token.into())),
        }
    }
}

impl fmt::Debug for MemoryTokenStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let present = mutex_lock(&self.token, SOURCE, "debug").is_some();
        f.debug_struct("MemoryTokenStore")
            .field("has_token", &present)
            .finish()
    }
}

impl TokenStore for MemoryTokenStore {
    fn load(&self) -> Result<Option<String>, InfraError> {
        Ok(mutex_lock(&self.token, SOURCE, "load").clone())
    }

    fn save(&self, token: &str) -> Result<(), InfraError> {
        *mutex_lock(&self.token, SOURCE, "save") = Some(token.to_string());
        Ok(())
    }

    fn clear(&self) -> Result<(), InfraError> {
        *mutex_lock(&self.token, SOURCE, "clear") = None;
        Ok(())
    }
}
