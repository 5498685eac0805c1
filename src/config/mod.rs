//! Configuration management.
//!
//! A board is configured by an optional TOML file with environment-variable
//! overrides: `TASKS_DIR` for the board root, `PUID`/`PGID` for the
//! ownership policy, `LANEFILE_SESSION_TTL_SECS` for bridge session
//! eviction.

use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Default board root when nothing is configured.
const DEFAULT_BOARD_ROOT: &str = "tasks";

/// Default config file name, looked up in the working directory.
const CONFIG_FILE_NAME: &str = "lanefile.toml";

/// Ownership applied to created lane directories and task files.
///
/// Mirrors the container convention of running the service as root while
/// the board files belong to the host user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ownership {
    /// Owner uid.
    pub uid: u32,
    /// Owner gid.
    pub gid: u32,
}

/// Main configuration for a board.
#[derive(Debug, Clone)]
pub struct BoardConfig {
    /// Board root holding one directory per lane.
    pub board_root: PathBuf,
    /// Ownership policy for created paths; `None` leaves ownership alone.
    pub ownership: Option<Ownership>,
    /// Bridge session TTL in seconds; `None` means sessions never expire.
    pub session_ttl_secs: Option<i64>,
}

impl BoardConfig {
    /// Creates a config for the given board root with no ownership policy.
    #[must_use]
    pub fn new(board_root: impl Into<PathBuf>) -> Self {
        Self {
            board_root: board_root.into(),
            ownership: None,
            session_ttl_secs: None,
        }
    }

    /// Loads configuration from `lanefile.toml` (if present) and the
    /// environment. Environment variables win over the file.
    #[must_use]
    pub fn load_default() -> Self {
        let file = std::fs::read_to_string(CONFIG_FILE_NAME)
            .ok()
            .and_then(|raw| match toml::from_str::<ConfigFile>(&raw) {
                Ok(parsed) => Some(parsed),
                Err(e) => {
                    tracing::warn!(error = %e, "Ignoring malformed {CONFIG_FILE_NAME}");
                    None
                },
            })
            .unwrap_or_default();
        Self::from_sources(&file)
    }

    /// Loads configuration from an explicit TOML file plus the environment.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_from(path: &Path) -> crate::Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| crate::Error::OperationFailed {
            operation: "read_config_file".to_string(),
            cause: format!("{}: {e}", path.display()),
        })?;
        let file: ConfigFile =
            toml::from_str(&raw).map_err(|e| crate::Error::InvalidInput(e.to_string()))?;
        Ok(Self::from_sources(&file))
    }

    /// Merges the config file with environment overrides.
    fn from_sources(file: &ConfigFile) -> Self {
        let board_root = env_var("TASKS_DIR")
            .or_else(|| file.board_root.clone())
            .unwrap_or_else(|| DEFAULT_BOARD_ROOT.to_string());

        let uid = env_parse("PUID").or(file.puid);
        let gid = env_parse("PGID").or(file.pgid);
        // Either variable alone configures the policy, defaulting its pair.
        let ownership = (uid.is_some() || gid.is_some()).then(|| Ownership {
            uid: uid.unwrap_or(1000),
            gid: gid.unwrap_or(1000),
        });

        let session_ttl_secs = env_parse("LANEFILE_SESSION_TTL_SECS").or(file.session_ttl_secs);

        Self {
            board_root: PathBuf::from(board_root),
            ownership,
            session_ttl_secs,
        }
    }

    /// Sets the board root.
    #[must_use]
    pub fn with_board_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.board_root = root.into();
        self
    }

    /// Sets the ownership policy.
    #[must_use]
    pub const fn with_ownership(mut self, uid: u32, gid: u32) -> Self {
        self.ownership = Some(Ownership { uid, gid });
        self
    }

    /// Sets the bridge session TTL.
    #[must_use]
    pub const fn with_session_ttl_secs(mut self, secs: i64) -> Self {
        self.session_ttl_secs = Some(secs);
        self
    }
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self::new(DEFAULT_BOARD_ROOT)
    }
}

/// Configuration file structure (for TOML parsing).
#[derive(Debug, Deserialize, Default)]
struct ConfigFile {
    /// Board root directory.
    board_root: Option<String>,
    /// Owner uid for created paths.
    puid: Option<u32>,
    /// Owner gid for created paths.
    pgid: Option<u32>,
    /// Bridge session TTL in seconds.
    session_ttl_secs: Option<i64>,
}

fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    env_var(name).and_then(|v| v.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_has_no_policy() {
        let config = BoardConfig::new("/tmp/board");
        assert_eq!(config.board_root, PathBuf::from("/tmp/board"));
        assert!(config.ownership.is_none());
        assert!(config.session_ttl_secs.is_none());
    }

    #[test]
    fn test_builders() {
        let config = BoardConfig::default()
            .with_board_root("/data/board")
            .with_ownership(1000, 1000)
            .with_session_ttl_secs(3600);
        assert_eq!(config.board_root, PathBuf::from("/data/board"));
        assert_eq!(config.ownership, Some(Ownership { uid: 1000, gid: 1000 }));
        assert_eq!(config.session_ttl_secs, Some(3600));
    }

    #[test]
    fn test_config_file_parsing() {
        let file: ConfigFile = toml::from_str(
            r#"
            board_root = "/srv/tasks"
            puid = 33
            pgid = 33
            session_ttl_secs = 600
            "#,
        )
        .unwrap();
        assert_eq!(file.board_root.as_deref(), Some("/srv/tasks"));
        assert_eq!(file.puid, Some(33));
        assert_eq!(file.session_ttl_secs, Some(600));
    }

    #[test]
    fn test_empty_config_file() {
        let file: ConfigFile = toml::from_str("").unwrap();
        assert!(file.board_root.is_none());
        assert!(file.puid.is_none());
    }
}
