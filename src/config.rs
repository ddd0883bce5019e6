use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::i18n::Locale;
use crate::view_state::ViewSettings;

pub const CONFIG_FILE: &str = "config.json";

/// Get the config directory using platform-appropriate location.
///
/// - macOS: `~/Library/Application Support/agentstore/`
/// - Linux: `~/.config/agentstore/` (or `$XDG_CONFIG_HOME`)
/// - Windows: `%APPDATA%/agentstore/`
///
/// Falls back to `~/.agentstore/` if platform dir is unavailable.
pub fn config_dir() -> PathBuf {
    dirs::config_dir()
        .map(|d| d.join("agentstore"))
        .unwrap_or_else(|| {
            dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".agentstore")
        })
}

/// Load a JSON file, returning Default if missing or corrupt.
/// Logs when the file exists but cannot be read or parsed, so corrupt files
/// are visible instead of silently resetting state.
pub fn load_json_file<T: DeserializeOwned + Default>(path: &Path) -> T {
    if !path.exists() {
        return T::default();
    }
    let content = match std::fs::read_to_string(path) {
        Ok(s) => s,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "could not read config");
            return T::default();
        }
    };
    match serde_json::from_str(&content) {
        Ok(v) => v,
        Err(e) => {
            tracing::error!(path = %path.display(), error = %e, "corrupt config, using defaults");
            T::default()
        }
    }
}

/// Save a JSON file atomically (temp file + rename).
/// Sets 0600 permissions on Unix.
pub fn save_json_file<T: Serialize>(path: &Path, value: &T) -> Result<(), String> {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(dir)
        .map_err(|e| format!("Failed to create config directory: {e}"))?;

    let json = serde_json::to_string_pretty(value)
        .map_err(|e| format!("Failed to serialize config: {e}"))?;

    let filename = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| format!("Invalid config path: {}", path.display()))?;
    let temp = dir.join(format!("{filename}.tmp.{}", std::process::id()));

    std::fs::write(&temp, &json)
        .map_err(|e| format!("Failed to write temp config: {e}"))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let perms = std::fs::Permissions::from_mode(0o600);
        std::fs::set_permissions(&temp, perms)
            .map_err(|e| format!("Failed to set config permissions: {e}"))?;
    }

    // Either the old file or the new one exists, never a partial write.
    std::fs::rename(&temp, path).map_err(|e| {
        let _ = std::fs::remove_file(&temp);
        format!("Failed to commit config: {e}")
    })?;

    Ok(())
}

// ---------------------------------------------------------------------------
// AppConfig
// ---------------------------------------------------------------------------

pub const ENV_API_URL: &str = "AGENTSTORE_API_URL";
pub const ENV_DATA_PATH: &str = "AGENTSTORE_DATA_PATH";
pub const ENV_BIND: &str = "AGENTSTORE_BIND";
pub const ENV_LOCALE: &str = "AGENTSTORE_LOCALE";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Base URL of the user-data backend.
    #[serde(default = "default_api_url")]
    pub api_url: String,
    /// Capability dataset; `None` searches the conventional locations.
    #[serde(default)]
    pub data_path: Option<PathBuf>,
    /// Listen address of the HTTP surface.
    #[serde(default = "default_bind")]
    pub bind: String,
    #[serde(default)]
    pub locale: Locale,
    #[serde(default = "default_page_size")]
    pub page_size: usize,
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Emit logs as JSON lines instead of human-readable text.
    #[serde(default)]
    pub log_json: bool,
}

fn default_api_url() -> String {
    "http://localhost:8002".to_string()
}

fn default_bind() -> String {
    "127.0.0.1:3000".to_string()
}

fn default_page_size() -> usize {
    20
}

fn default_debounce_ms() -> u64 {
    300
}

fn default_request_timeout_secs() -> u64 {
    30
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            data_path: None,
            bind: default_bind(),
            locale: Locale::default(),
            page_size: default_page_size(),
            debounce_ms: default_debounce_ms(),
            request_timeout_secs: default_request_timeout_secs(),
            log_json: false,
        }
    }
}

impl AppConfig {
    pub fn default_path() -> PathBuf {
        config_dir().join(CONFIG_FILE)
    }

    /// File (explicit path or the default location), then environment.
    pub fn load(explicit: Option<&Path>) -> Self {
        let path = explicit.map(Path::to_path_buf).unwrap_or_else(Self::default_path);
        let mut config: AppConfig = load_json_file(&path);
        config.apply_overrides(|key| std::env::var(key).ok());
        config
    }

    pub fn save(&self, path: &Path) -> Result<(), String> {
        save_json_file(path, self)
    }

    /// Apply `AGENTSTORE_*` overrides from `lookup`. Empty values are
    /// ignored, as is an unparseable locale.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        if let Some(v) = get(ENV_API_URL) {
            self.api_url = v;
        }
        if let Some(v) = get(ENV_DATA_PATH) {
            self.data_path = Some(PathBuf::from(v));
        }
        if let Some(v) = get(ENV_BIND) {
            self.bind = v;
        }
        if let Some(v) = get(ENV_LOCALE) {
            match v.parse() {
                Ok(locale) => self.locale = locale,
                Err(e) => tracing::warn!(value = %v, "ignoring {ENV_LOCALE}: {e}"),
            }
        }
    }

    pub fn view_settings(&self) -> ViewSettings {
        ViewSettings {
            page_size: self.page_size.max(1),
            debounce: Duration::from_millis(self.debounce_ms),
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }
}
