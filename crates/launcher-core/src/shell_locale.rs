use std::{
    env, fs,
    path::{Path, PathBuf},
};

use serde_json::{Map, Value};

use crate::error::ConfigError;

pub const DEFAULT_SHELL_LOCALE: &str = "ru-RU";

const LOCALE_FIELD: &str = "locale";

fn empty_state_object() -> Value {
    Value::Object(Map::new())
}

/// UI-facing copy. Templates carry `{version}` / `{progress}` placeholders.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShellTexts {
    pub update_checking: &'static str,
    pub update_available: &'static str,
    pub update_not_available: &'static str,
    pub update_downloading: &'static str,
    pub update_downloaded: &'static str,
    pub update_error: &'static str,
    pub game_not_found: &'static str,
    pub game_spawn_failed: &'static str,
}

impl ShellTexts {
    pub fn available(&self, version: &str) -> String {
        self.update_available.replace("{version}", version)
    }

    pub fn downloading(&self, progress: u8) -> String {
        self.update_downloading
            .replace("{progress}", &progress.to_string())
    }
}

pub fn shell_texts_for_locale(locale: &str) -> ShellTexts {
    if locale == "en-US" {
        return ShellTexts {
            update_checking: "Checking for updates...",
            update_available: "Version {version} is available",
            update_not_available: "You have the latest version",
            update_downloading: "Downloading update: {progress}%",
            update_downloaded: "Update is ready to install",
            update_error: "Failed to check for updates",
            game_not_found: "Game files not found. Try reinstalling.",
            game_spawn_failed: "Failed to start the game.",
        };
    }

    ShellTexts {
        update_checking: "Проверка обновлений...",
        update_available: "Доступна версия {version}",
        update_not_available: "У вас последняя версия",
        update_downloading: "Загрузка обновления: {progress}%",
        update_downloaded: "Обновление готово к установке",
        update_error: "Ошибка проверки обновлений",
        game_not_found: "Файл игры не найден. Попробуйте переустановить.",
        game_spawn_failed: "Не удалось запустить игру.",
    }
}

pub fn resolve_shell_locale(
    default_shell_locale: &'static str,
    root_dir: Option<&Path>,
) -> &'static str {
    if let Some(locale) = read_cached_shell_locale(root_dir) {
        return locale;
    }

    for env_key in ["TOWER_LAUNCHER_LOCALE", "LC_ALL", "LANG"] {
        if let Ok(value) = env::var(env_key) {
            if let Some(locale) = normalize_shell_locale(&value) {
                return locale;
            }
        }
    }

    default_shell_locale
}

pub fn normalize_shell_locale(raw: &str) -> Option<&'static str> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if raw == "ru-RU" {
        return Some("ru-RU");
    }
    if raw == "en-US" {
        return Some("en-US");
    }

    let lowered = raw.to_ascii_lowercase();
    if lowered.starts_with("ru") {
        return Some("ru-RU");
    }
    if lowered.starts_with("en") {
        return Some("en-US");
    }
    None
}

fn desktop_state_path(root_dir: Option<&Path>) -> Option<PathBuf> {
    root_dir.map(|root| root.join("data").join("desktop_state.json"))
}

fn read_cached_shell_locale(root_dir: Option<&Path>) -> Option<&'static str> {
    let state_path = desktop_state_path(root_dir)?;
    let raw = fs::read_to_string(state_path).ok()?;
    let parsed: Value = serde_json::from_str(&raw).ok()?;
    let locale = parsed.get(LOCALE_FIELD)?.as_str()?;
    normalize_shell_locale(locale)
}

fn ensure_object(value: &mut Value) -> &mut Map<String, Value> {
    if !value.is_object() {
        *value = empty_state_object();
    }
    match value {
        Value::Object(map) => map,
        _ => unreachable!("value was just normalized into a JSON object"),
    }
}

/// Persists `locale` into the desktop state file, keeping unrelated fields.
/// Unsupported or missing locales clear the cached value.
pub fn write_cached_shell_locale(
    locale: Option<&str>,
    root_dir: Option<&Path>,
) -> Result<Option<&'static str>, ConfigError> {
    let normalized_locale = locale.and_then(normalize_shell_locale);
    if let Some(raw_locale) = locale {
        if normalized_locale.is_none() {
            tracing::warn!("unsupported shell locale '{raw_locale}'; clearing cached locale");
        }
    }

    let Some(state_path) = desktop_state_path(root_dir) else {
        tracing::warn!("shell locale state path is unavailable; skipping locale persistence");
        return Ok(normalized_locale);
    };

    if let Some(parent_dir) = state_path.parent() {
        fs::create_dir_all(parent_dir).map_err(|source| ConfigError::CreateDir {
            path: parent_dir.to_path_buf(),
            source,
        })?;
    }

    let mut parsed = match fs::read_to_string(&state_path) {
        Ok(raw) => match serde_json::from_str::<Value>(&raw) {
            Ok(value) => value,
            Err(error) => {
                tracing::warn!(
                    "failed to parse desktop state {}: {error}. resetting state file",
                    state_path.display()
                );
                empty_state_object()
            }
        },
        Err(error) if error.kind() == std::io::ErrorKind::NotFound => empty_state_object(),
        Err(source) => {
            return Err(ConfigError::Read {
                path: state_path,
                source,
            });
        }
    };
    let object = ensure_object(&mut parsed);

    if let Some(normalized_locale) = normalized_locale {
        object.insert(
            LOCALE_FIELD.to_string(),
            Value::String(normalized_locale.to_string()),
        );
    } else {
        object.remove(LOCALE_FIELD);
    }

    let serialized = serde_json::to_string_pretty(&parsed)?;
    fs::write(&state_path, serialized).map_err(|source| ConfigError::Write {
        path: state_path.clone(),
        source,
    })?;

    Ok(normalized_locale)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shell_texts_for_locale_returns_english_copy() {
        let texts = shell_texts_for_locale("en-US");
        assert_eq!(texts.available("1.2.0"), "Version 1.2.0 is available");
        assert_eq!(texts.downloading(42), "Downloading update: 42%");
    }

    #[test]
    fn shell_texts_for_locale_falls_back_to_russian_copy() {
        let texts = shell_texts_for_locale("de-DE");
        assert_eq!(texts.update_not_available, "У вас последняя версия");
        assert_eq!(texts.available("2.0.1"), "Доступна версия 2.0.1");
    }

    #[test]
    fn normalize_shell_locale_accepts_language_prefixes() {
        assert_eq!(normalize_shell_locale("EN_us"), Some("en-US"));
        assert_eq!(normalize_shell_locale("ru_UA.UTF-8"), Some("ru-RU"));
        assert_eq!(normalize_shell_locale("fr-FR"), None);
        assert_eq!(normalize_shell_locale("   "), None);
    }

    #[test]
    fn write_cached_shell_locale_round_trips_and_keeps_other_fields() {
        let root = tempfile::tempdir().expect("tempdir");
        let state_path = root.path().join("data").join("desktop_state.json");
        fs::create_dir_all(state_path.parent().expect("parent")).expect("create data dir");
        fs::write(&state_path, r#"{"window":"maximized"}"#).expect("seed state");

        let stored = write_cached_shell_locale(Some("en_GB"), Some(root.path()))
            .expect("write locale");
        assert_eq!(stored, Some("en-US"));
        assert_eq!(read_cached_shell_locale(Some(root.path())), Some("en-US"));

        let raw = fs::read_to_string(&state_path).expect("read state");
        let parsed: Value = serde_json::from_str(&raw).expect("state is json");
        assert_eq!(parsed["window"], "maximized");
    }

    #[test]
    fn write_cached_shell_locale_clears_unsupported_locale() {
        let root = tempfile::tempdir().expect("tempdir");
        write_cached_shell_locale(Some("ru-RU"), Some(root.path())).expect("write locale");

        let stored = write_cached_shell_locale(Some("ja-JP"), Some(root.path()))
            .expect("clear locale");
        assert_eq!(stored, None);
        assert_eq!(read_cached_shell_locale(Some(root.path())), None);
    }

    #[test]
    fn write_cached_shell_locale_resets_non_object_state() {
        let root = tempfile::tempdir().expect("tempdir");
        let state_path = root.path().join("data").join("desktop_state.json");
        fs::create_dir_all(state_path.parent().expect("parent")).expect("create data dir");
        fs::write(&state_path, "[1, 2, 3]").expect("seed state");

        write_cached_shell_locale(Some("en-US"), Some(root.path())).expect("write locale");
        assert_eq!(read_cached_shell_locale(Some(root.path())), Some("en-US"));
    }
}
