use std::{
    env,
    path::PathBuf,
    time::Duration,
};

use serde::{
    Deserialize,
    Serialize,
};
use tracing::{
    info,
    warn,
};

use super::models::{
    Session,
    UserId,
};
use super::errors::Result;
use crate::persistence::{
    get_app_data_dir,
    load_json_or_default,
    save_json,
};

pub const SETTINGS_FILE: &str = "settings.json";

const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_HEARTBEAT_SECS: u64 = 25;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendSettings {
    pub url: Option<String>,
    pub anon_key: Option<String>,
    pub timeout_secs: u64,
    pub heartbeat_secs: u64,
}

impl Default for BackendSettings {
    fn default() -> Self {
        Self {
            url: None,
            anon_key: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            heartbeat_secs: DEFAULT_HEARTBEAT_SECS,
        }
    }
}

/// Contents of `settings.json`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SettingsData {
    pub backend: BackendSettings,
    pub session: Option<Session>,
    pub cache_dir: Option<PathBuf>,
    pub dark_mode: bool,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub backend_url: Option<String>,
    pub anon_key: String,
    pub session: Option<Session>,
    pub request_timeout: Duration,
    pub heartbeat_interval: Duration,
    pub cache_dir: PathBuf,
    pub dark_mode: bool,
}

impl Config {
    /// Settings file first, then `FLASHDECK_*` environment overrides.
    pub fn load() -> Self {
        let settings = load_json_or_default::<SettingsData>(SETTINGS_FILE);
        Self::from_settings(settings, |key| env::var(key).ok())
    }

    pub fn from_settings(settings: SettingsData, var: impl Fn(&str) -> Option<String>) -> Self {
        let backend_url = override_with(&var, "FLASHDECK_BACKEND_URL", settings.backend.url)
            .map(|url| url.trim_end_matches('/').to_string())
            .filter(|url| !url.is_empty());

        let anon_key =
            override_with(&var, "FLASHDECK_ANON_KEY", settings.backend.anon_key).unwrap_or_default();

        let session = match (var("FLASHDECK_USER_ID"), var("FLASHDECK_ACCESS_TOKEN")) {
            (Some(user_id), Some(access_token)) => {
                Some(Session { user_id: UserId(user_id), email: None, access_token })
            }
            (Some(_), None) | (None, Some(_)) => {
                warn!("FLASHDECK_USER_ID and FLASHDECK_ACCESS_TOKEN must be set together, ignoring");
                settings.session
            }
            (None, None) => settings.session,
        };

        let cache_dir = var("FLASHDECK_CACHE_DIR")
            .map(PathBuf::from)
            .or(settings.cache_dir)
            .unwrap_or_else(get_app_data_dir);

        if backend_url.is_none() {
            info!("No backend configured, running with the local in-process store");
        }

        Self {
            backend_url,
            anon_key,
            session,
            request_timeout: Duration::from_secs(settings.backend.timeout_secs.max(1)),
            heartbeat_interval: Duration::from_secs(settings.backend.heartbeat_secs.max(1)),
            cache_dir,
            dark_mode: settings.dark_mode,
        }
    }

    pub fn is_offline(&self) -> bool {
        self.backend_url.is_none()
    }

    pub fn user(&self) -> Option<UserId> {
        self.session.as_ref().map(|session| session.user_id.clone())
    }
}

/// Remembers the light/dark choice in `settings.json`, keeping the rest of
/// the file as it was.
pub fn save_dark_mode(dark_mode: bool) -> Result<()> {
    let mut settings = load_json_or_default::<SettingsData>(SETTINGS_FILE);
    settings.dark_mode = dark_mode;
    save_json(&settings, SETTINGS_FILE)
}

fn override_with(
    var: &impl Fn(&str) -> Option<String>,
    key: &str,
    fallback: Option<String>,
) -> Option<String> {
    match var(key) {
        Some(value) => {
            info!("{key} set from environment");
            Some(value)
        }
        None => fallback,
    }
}
