//! On-disk session storage.
//!
//! A remembered session lives in the user's config directory and survives
//! reboots. A session-only login goes to the runtime directory (or the
//! temp directory), which the OS clears at the end of the login session.
//! At most one of the two files exists at a time.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::Context;
use loom_core::auth::{AuthContext, Persistence, Session};
use serde::{Deserialize, Serialize};

const SESSION_FILE_NAME: &str = "session.json";
const APP_DIR: &str = "lucid-loom";

/// What is written to the session file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredSession {
    pub token: String,
    pub persistence: Persistence,
    /// Last e-mail used to sign in, offered as the default next time.
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Clone)]
pub struct SessionStore {
    remembered: PathBuf,
    session_only: PathBuf,
}

impl SessionStore {
    pub fn new(remembered: PathBuf, session_only: PathBuf) -> Self {
        Self {
            remembered,
            session_only,
        }
    }

    /// `LOOM_SESSION_FILE` overrides the remembered location.
    pub fn from_env() -> Self {
        let remembered = std::env::var_os("LOOM_SESSION_FILE")
            .map(PathBuf::from)
            .unwrap_or_else(|| {
                dirs::config_dir()
                    .unwrap_or_else(|| PathBuf::from("."))
                    .join(APP_DIR)
                    .join(SESSION_FILE_NAME)
            });
        let session_only = dirs::runtime_dir()
            .unwrap_or_else(std::env::temp_dir)
            .join(APP_DIR)
            .join(SESSION_FILE_NAME);
        Self::new(remembered, session_only)
    }

    fn path_for(&self, persistence: Persistence) -> &Path {
        match persistence {
            Persistence::Remembered => &self.remembered,
            Persistence::SessionOnly => &self.session_only,
        }
    }

    /// The stored session, checking the remembered file first. Unreadable
    /// files are treated as absent.
    pub fn load(&self) -> Option<StoredSession> {
        [&self.remembered, &self.session_only]
            .into_iter()
            .find_map(|path| read_session(path))
    }

    /// Put the stored session (if any) into `auth`.
    pub fn restore(&self, auth: &AuthContext) -> Option<StoredSession> {
        let stored = self.load()?;
        auth.set(stored.token.clone(), stored.persistence);
        Some(stored)
    }

    pub fn save(&self, session: &StoredSession) -> anyhow::Result<()> {
        let path = self.path_for(session.persistence);
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)
                .with_context(|| format!("creating {}", dir.display()))?;
        }
        let json = serde_json::to_string_pretty(session)?;
        write_private(path, json.as_bytes())
            .with_context(|| format!("writing {}", path.display()))?;

        let other = match session.persistence {
            Persistence::Remembered => &self.session_only,
            Persistence::SessionOnly => &self.remembered,
        };
        remove_if_present(other)?;
        tracing::debug!(path = %path.display(), "Session saved");
        Ok(())
    }

    /// Save whatever `auth` currently holds, keeping `email`.
    pub fn save_from(&self, auth: &AuthContext, email: Option<String>) -> anyhow::Result<()> {
        match auth.session() {
            Some(Session { token, persistence }) => self.save(&StoredSession {
                token,
                persistence,
                email,
            }),
            None => self.clear(),
        }
    }

    /// Remove both files. The remembered e-mail goes with them.
    pub fn clear(&self) -> anyhow::Result<()> {
        remove_if_present(&self.remembered)?;
        remove_if_present(&self.session_only)?;
        Ok(())
    }
}

fn read_session(path: &Path) -> Option<StoredSession> {
    let raw = fs::read_to_string(path).ok()?;
    match serde_json::from_str(&raw) {
        Ok(session) => Some(session),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Ignoring unreadable session file");
            None
        }
    }
}

fn remove_if_present(path: &Path) -> anyhow::Result<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e).with_context(|| format!("removing {}", path.display())),
    }
}

/// Write `contents` to a file only the owner can read. A file left over
/// with wider permissions is narrowed before the token is written.
#[cfg(unix)]
fn write_private(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};

    let mut file = fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o600)
        .open(path)?;
    file.set_permissions(fs::Permissions::from_mode(0o600))?;
    file.write_all(contents)
}

#[cfg(not(unix))]
fn write_private(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    let mut file = fs::File::create(path)?;
    file.write_all(contents)
}
