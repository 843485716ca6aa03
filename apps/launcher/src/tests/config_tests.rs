use super::*;

use std::{
    collections::HashMap,
    env,
    time::{SystemTime, UNIX_EPOCH},
};

use launcher_core::{DEFAULT_DOWNLOAD_URL, DEFAULT_REQUEST_TIMEOUT, DEFAULT_SCHEME_URL};

fn temp_config(contents: &str) -> std::path::PathBuf {
    let suffix = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock")
        .as_nanos();
    let dir = env::temp_dir().join(format!("auth_launch_config_test_{suffix}"));
    fs::create_dir_all(&dir).expect("temp dir");
    let path = dir.join("launcher.toml");
    fs::write(&path, contents).expect("write config");
    path
}

fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let vars: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |key: &str| vars.get(key).cloned()
}

#[test]
fn missing_file_yields_defaults() {
    let settings = load_settings(Path::new("/definitely/not/here/launcher.toml"));
    assert_eq!(settings.scheme_url, DEFAULT_SCHEME_URL);
    assert_eq!(settings.download_url, DEFAULT_DOWNLOAD_URL);
}

#[test]
fn file_values_override_defaults() {
    let path = temp_config(
        r#"
download_url = "https://mirror.example.com/app"
validation_base_url = "https://api.example.com"
request_timeout_secs = 3
"#,
    );

    let mut settings = LaunchSettings::default();
    let raw = fs::read_to_string(&path).expect("read");
    apply_file(&mut settings, toml::from_str(&raw).expect("parse"));

    assert_eq!(settings.scheme_url, DEFAULT_SCHEME_URL);
    assert_eq!(settings.download_url, "https://mirror.example.com/app");
    assert_eq!(
        settings.validation_base_url.as_deref(),
        Some("https://api.example.com")
    );
    assert_eq!(settings.request_timeout, Some(Duration::from_secs(3)));

    fs::remove_dir_all(path.parent().expect("parent")).expect("cleanup");
}

#[test]
fn unparsable_file_is_ignored() {
    let path = temp_config("download_url = [not toml");
    let settings = load_settings(&path);
    assert_eq!(settings.download_url, DEFAULT_DOWNLOAD_URL);
    fs::remove_dir_all(path.parent().expect("parent")).expect("cleanup");
}

#[test]
fn app_prefixed_env_wins_over_launcher_prefix() {
    let mut settings = LaunchSettings::default();
    apply_env(
        &mut settings,
        env_from(&[
            ("LAUNCHER_SCHEME_URL", "other.app://login"),
            ("APP__SCHEME_URL", "preferred.app://login"),
            ("LAUNCHER_VALIDATION_BASE_URL", "http://127.0.0.1:9000"),
        ]),
    );
    assert_eq!(settings.scheme_url, "preferred.app://login");
    assert_eq!(
        settings.validation_base_url.as_deref(),
        Some("http://127.0.0.1:9000")
    );
}

#[test]
fn invalid_or_empty_env_values_are_ignored() {
    let mut settings = LaunchSettings::default();
    apply_env(
        &mut settings,
        env_from(&[
            ("APP__REQUEST_TIMEOUT_SECS", "soon"),
            ("APP__DOWNLOAD_URL", "   "),
        ]),
    );
    assert_eq!(settings.request_timeout, Some(DEFAULT_REQUEST_TIMEOUT));
    assert_eq!(settings.download_url, DEFAULT_DOWNLOAD_URL);
}

#[test]
fn zero_timeout_disables_it_and_blank_base_url_disables_validation() {
    let mut settings = LaunchSettings {
        validation_base_url: Some("https://api.example.com".into()),
        ..LaunchSettings::default()
    };
    apply_env(
        &mut settings,
        env_from(&[
            ("APP__REQUEST_TIMEOUT_SECS", "0"),
            ("APP__VALIDATION_BASE_URL", ""),
        ]),
    );
    assert_eq!(settings.request_timeout, None);
    assert_eq!(settings.validation_base_url, None);
}
