// Runtime configuration. Everything comes from environment variables, with
// a fallback default for all but the API key and creator id.

use crate::error::{Result, UploaderError};
use crate::poll::BackoffPolicy;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://apis.roblox.com";
pub const DEFAULT_NAME_PREFIX: &str = "AutoUploaded_";
pub const DEFAULT_FAILED_POLLS_FILE: &str = "failed_polls.json";
pub const DEFAULT_RETRIED_FILE: &str = "retried_assets.json";
pub const DEFAULT_STILL_FAILED_FILE: &str = "still_failed.json";

/// Who owns uploaded assets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreatorType {
    Group,
    User,
}

impl CreatorType {
    /// Key used inside `creationContext.creator`.
    pub fn id_field(&self) -> &'static str {
        match self {
            CreatorType::Group => "groupId",
            CreatorType::User => "userId",
        }
    }
}

impl std::str::FromStr for CreatorType {
    type Err = UploaderError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "group" => Ok(CreatorType::Group),
            "user" => Ok(CreatorType::User),
            other => Err(UploaderError::Config(format!(
                "creator type must be 'group' or 'user', got '{}'",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Creator {
    pub kind: CreatorType,
    pub id: u64,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub api_key: String,
    pub base_url: String,
    pub creator: Creator,
    /// Folder to scan. When unset the UI asks for one.
    pub upload_folder: Option<PathBuf>,
    pub name_prefix: String,
    /// Directory receiving the `<folder>.json` file of an upload run.
    pub output_dir: PathBuf,
    pub failed_polls_file: PathBuf,
    pub retried_file: PathBuf,
    pub still_failed_file: PathBuf,
    pub backoff: BackoffPolicy,
    pub request_timeout: Duration,
    /// Pause between two create-asset calls.
    pub submit_pacing: Duration,
}

impl Config {
    /// Build the configuration from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup. Empty values
    /// count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let api_key = get("ASSET_API_KEY")
            .ok_or_else(|| UploaderError::Config("ASSET_API_KEY is not set".into()))?;
        let base_url = get("ASSET_API_BASE_URL")
            .unwrap_or_else(|| DEFAULT_BASE_URL.into())
            .trim_end_matches('/')
            .to_string();

        let kind = match get("ASSET_CREATOR_TYPE") {
            Some(v) => v.parse()?,
            None => CreatorType::Group,
        };
        let id = get("ASSET_CREATOR_ID")
            .ok_or_else(|| UploaderError::Config("ASSET_CREATOR_ID is not set".into()))?;
        let id = parse_number::<u64>("ASSET_CREATOR_ID", &id)?;

        let mut backoff = BackoffPolicy::default();
        if let Some(v) = get("ASSET_POLL_ATTEMPTS") {
            backoff.max_attempts = parse_number("ASSET_POLL_ATTEMPTS", &v)?;
            if backoff.max_attempts == 0 {
                return Err(UploaderError::Config(
                    "ASSET_POLL_ATTEMPTS must be at least 1".into(),
                ));
            }
        }
        if let Some(v) = get("ASSET_POLL_DELAY_SECS") {
            let secs: u64 = parse_number("ASSET_POLL_DELAY_SECS", &v)?;
            if secs == 0 {
                return Err(UploaderError::Config(
                    "ASSET_POLL_DELAY_SECS must be at least 1".into(),
                ));
            }
            backoff.initial_delay = Duration::from_secs(secs);
        }
        if let Some(v) = get("ASSET_POLL_MULTIPLIER") {
            let multiplier: f64 = parse_number("ASSET_POLL_MULTIPLIER", &v)?;
            // also rejects NaN
            if !(multiplier >= 1.0 && multiplier.is_finite()) {
                return Err(UploaderError::Config(format!(
                    "ASSET_POLL_MULTIPLIER must be a finite number >= 1, got '{}'",
                    v
                )));
            }
            backoff.multiplier = multiplier;
        }

        let request_timeout = match get("ASSET_REQUEST_TIMEOUT_SECS") {
            Some(v) => Duration::from_secs(parse_number("ASSET_REQUEST_TIMEOUT_SECS", &v)?),
            None => Duration::from_secs(30),
        };

        let path_or = |key: &str, default: &str| expand_home(&get(key).unwrap_or_else(|| default.into()));

        Ok(Config {
            api_key,
            base_url,
            creator: Creator { kind, id },
            upload_folder: get("ASSET_UPLOAD_FOLDER").map(|v| expand_home(&v)),
            name_prefix: lookup("ASSET_NAME_PREFIX").unwrap_or_else(|| DEFAULT_NAME_PREFIX.into()),
            output_dir: path_or("ASSET_OUTPUT_DIR", "."),
            failed_polls_file: path_or("ASSET_FAILED_POLLS_FILE", DEFAULT_FAILED_POLLS_FILE),
            retried_file: path_or("ASSET_RETRIED_FILE", DEFAULT_RETRIED_FILE),
            still_failed_file: path_or("ASSET_STILL_FAILED_FILE", DEFAULT_STILL_FAILED_FILE),
            backoff,
            request_timeout,
            submit_pacing: Duration::from_millis(500),
        })
    }
}

/// Output file for an upload run: the folder's last component plus `.json`.
pub fn output_file_for(folder: &Path) -> PathBuf {
    let stem = folder
        .components()
        .next_back()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .filter(|s| !s.is_empty() && s != "." && s != "..")
        .unwrap_or_else(|| "assets".into());
    PathBuf::from(format!("{}.json", stem))
}

/// Resolve a leading `~` against the user's home directory.
pub fn expand_home(raw: &str) -> PathBuf {
    match raw.strip_prefix("~/").or_else(|| (raw == "~").then_some("")) {
        Some(rest) => dirs::home_dir()
            .map(|home| home.join(rest))
            .unwrap_or_else(|| PathBuf::from(raw)),
        None => PathBuf::from(raw),
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| UploaderError::Config(format!("{} must be a number, got '{}'", key, value)))
}
