//! Global todosync configuration.

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono_tz::Tz;
use config::{Config, Environment, File, FileFormat};
use serde::Deserialize;

use crate::date;
use crate::error::{SyncError, SyncResult};
use crate::reconcile::{ReconcileOptions, StatusAuthority};
use crate::remote::ProviderRemote;

static DEFAULT_VAULT_PATH: &str = "~/vault";

/// The file as written by the user. Every key is optional.
#[derive(Deserialize, Default)]
struct ConfigFile {
    vault_dir: Option<PathBuf>,
    fetch_weeks_ago: Option<u32>,
    fetch_maximum_events: Option<u32>,
    sync_interval: Option<String>,
    retry_interval: Option<String>,
    status_authority: Option<String>,
    timezone: Option<String>,
    remote: Option<ProviderRemote>,
}

/// Validated configuration at ~/.config/todosync/config.toml
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// As written, `~` unexpanded.
    pub vault_dir: PathBuf,
    pub fetch_weeks_ago: u32,
    pub fetch_maximum_events: u32,
    pub sync_interval: Duration,
    pub retry_interval: Duration,
    pub status_authority: StatusAuthority,
    pub timezone: Tz,
    pub remote: Option<ProviderRemote>,
}

fn duration(key: &str, value: Option<String>, default: &str) -> SyncResult<Duration> {
    let value = value.unwrap_or_else(|| default.to_string());
    humantime::parse_duration(&value)
        .map_err(|e| SyncError::Config(format!("{key}: invalid duration '{value}': {e}")))
}

impl SyncConfig {
    pub fn config_path() -> SyncResult<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| SyncError::Config("Could not determine config directory".into()))?
            .join("todosync");

        Ok(config_dir.join("config.toml"))
    }

    /// Load the config file, creating it on first use, with `TODOSYNC_*`
    /// environment overrides on top.
    pub fn load() -> SyncResult<Self> {
        let config_path = Self::config_path()?;

        if !config_path.exists() {
            Self::create_default_config(&config_path)?;
        }

        let raw: ConfigFile = Config::builder()
            .add_source(File::from(config_path).required(false))
            .add_source(
                Environment::with_prefix("TODOSYNC")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()
            .map_err(|e| SyncError::Config(e.to_string()))?
            .try_deserialize()
            .map_err(|e| SyncError::Config(e.to_string()))?;

        Self::validate(raw)
    }

    pub fn from_toml_str(content: &str) -> SyncResult<Self> {
        let raw: ConfigFile = Config::builder()
            .add_source(File::from_str(content, FileFormat::Toml))
            .build()
            .map_err(|e| SyncError::Config(e.to_string()))?
            .try_deserialize()
            .map_err(|e| SyncError::Config(e.to_string()))?;

        Self::validate(raw)
    }

    fn validate(raw: ConfigFile) -> SyncResult<Self> {
        let fetch_maximum_events = raw.fetch_maximum_events.unwrap_or(2000);
        if fetch_maximum_events == 0 {
            return Err(SyncError::Config(
                "fetch_maximum_events must be at least 1".into(),
            ));
        }

        let status_authority = match raw.status_authority {
            Some(value) => value.parse()?,
            None => StatusAuthority::default(),
        };

        let timezone = match raw.timezone {
            Some(name) => name
                .parse::<Tz>()
                .map_err(|_| SyncError::Config(format!("timezone: unknown zone '{name}'")))?,
            None => date::local_time_zone(),
        };

        Ok(SyncConfig {
            vault_dir: raw
                .vault_dir
                .unwrap_or_else(|| PathBuf::from(DEFAULT_VAULT_PATH)),
            fetch_weeks_ago: raw.fetch_weeks_ago.unwrap_or(4),
            fetch_maximum_events,
            sync_interval: duration("sync_interval", raw.sync_interval, "5m")?,
            retry_interval: duration("retry_interval", raw.retry_interval, "1s")?,
            status_authority,
            timezone,
            remote: raw.remote,
        })
    }

    /// The vault root with `~` expanded.
    pub fn vault_path(&self) -> PathBuf {
        let full_path_str = shellexpand::tilde(&self.vault_dir.to_string_lossy()).into_owned();
        PathBuf::from(full_path_str)
    }

    pub fn require_remote(&self) -> SyncResult<&ProviderRemote> {
        self.remote.as_ref().ok_or_else(|| {
            SyncError::Setup(
                "No [remote] table in the config file. Add one with a `provider` key.".into(),
            )
        })
    }

    pub fn reconcile_options(&self) -> ReconcileOptions {
        ReconcileOptions {
            fetch_weeks_ago: self.fetch_weeks_ago,
            max_results: self.fetch_maximum_events,
            authority: self.status_authority,
            tz: self.timezone,
        }
    }

    /// Create a default config file with all options commented out.
    pub fn create_default_config(path: &Path) -> SyncResult<()> {
        let contents = format!(
            "\
# todosync configuration

# Where your notes live:
# vault_dir = \"{}\"

# How far back to look for todos, and how many events to fetch:
# fetch_weeks_ago = 4
# fetch_maximum_events = 2000

# How often `todosync watch` reconciles, and retries failed updates:
# sync_interval = \"5m\"
# retry_interval = \"1s\"

# Which side wins when a todo's status differs (\"remote\" or \"local\"):
# status_authority = \"remote\"

# Time zone for dates without an offset (defaults to the system zone):
# timezone = \"Europe/Berlin\"

# The calendar to sync with:
# [remote]
# provider = \"google\"
# google_calendar_id = \"primary\"
",
            DEFAULT_VAULT_PATH
        );

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                SyncError::Config(format!("Could not create config directory: {e}"))
            })?;
        }

        std::fs::write(path, contents)
            .map_err(|e| SyncError::Config(format!("Could not write config file: {e}")))?;

        Ok(())
    }
}
