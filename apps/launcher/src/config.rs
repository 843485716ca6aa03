use std::{fs, io, path::Path, time::Duration};

use launcher_core::LaunchSettings;
use serde::Deserialize;
use tracing::{debug, warn};

pub const DEFAULT_CONFIG_PATH: &str = "launcher.toml";

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FileSettings {
    scheme_url: Option<String>,
    download_url: Option<String>,
    validation_base_url: Option<String>,
    request_timeout_secs: Option<u64>,
}

/// Defaults, then the TOML file at `path` (if any), then environment
/// overrides.
pub fn load_settings(path: &Path) -> LaunchSettings {
    let mut settings = LaunchSettings::default();

    match fs::read_to_string(path) {
        Ok(raw) => match toml::from_str::<FileSettings>(&raw) {
            Ok(file) => apply_file(&mut settings, file),
            Err(err) => warn!(
                path = %path.display(),
                "config: ignoring unreadable settings file: {err}"
            ),
        },
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "config: no settings file, using defaults");
        }
        Err(err) => warn!(path = %path.display(), "config: failed to read settings file: {err}"),
    }

    apply_env(&mut settings, |key| std::env::var(key).ok());
    settings
}

fn apply_file(settings: &mut LaunchSettings, file: FileSettings) {
    if let Some(v) = file.scheme_url {
        set_url(&mut settings.scheme_url, v);
    }
    if let Some(v) = file.download_url {
        set_url(&mut settings.download_url, v);
    }
    if let Some(v) = file.validation_base_url {
        settings.validation_base_url = non_empty(v);
    }
    if let Some(secs) = file.request_timeout_secs {
        settings.request_timeout = timeout_from_secs(secs);
    }
}

fn apply_env(settings: &mut LaunchSettings, lookup: impl Fn(&str) -> Option<String>) {
    let get = |name: &str| {
        lookup(&format!("APP__{name}")).or_else(|| lookup(&format!("LAUNCHER_{name}")))
    };

    if let Some(v) = get("SCHEME_URL") {
        set_url(&mut settings.scheme_url, v);
    }
    if let Some(v) = get("DOWNLOAD_URL") {
        set_url(&mut settings.download_url, v);
    }
    if let Some(v) = get("VALIDATION_BASE_URL") {
        settings.validation_base_url = non_empty(v);
    }
    if let Some(v) = get("REQUEST_TIMEOUT_SECS") {
        match v.trim().parse::<u64>() {
            Ok(secs) => settings.request_timeout = timeout_from_secs(secs),
            Err(err) => warn!(value = %v, "config: ignoring invalid request timeout: {err}"),
        }
    }
}

fn set_url(target: &mut String, value: String) {
    match non_empty(value) {
        Some(value) => *target = value,
        None => warn!("config: ignoring empty url override"),
    }
}

fn non_empty(value: String) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

// Zero disables the timeout.
fn timeout_from_secs(secs: u64) -> Option<Duration> {
    (secs > 0).then(|| Duration::from_secs(secs))
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
