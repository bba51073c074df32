use log::{debug, error, info, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::{LazyLock, RwLock};

use simplelog::LevelFilter;

use crate::zoom::{ZOOM_DEFAULT, ZOOM_MAX, ZOOM_MIN, ZoomLevel};

pub const CURRENT_VERSION: u32 = 1;
const SETTINGS_FILENAME: &str = "config.yaml";
const STATE_FILENAME: &str = "state.json";
const APP_NAME: &str = "pdfshell";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default = "default_version")]
    pub version: u32,

    /// Zoom step for a session that is not restored
    #[serde(default = "default_zoom_level")]
    pub default_zoom_level: u8,

    /// Where the viewer record is kept between runs
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state_file: Option<PathBuf>,

    #[serde(default = "default_log_file")]
    pub log_file: PathBuf,

    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_version() -> u32 {
    CURRENT_VERSION
}

fn default_zoom_level() -> u8 {
    ZOOM_DEFAULT
}

fn default_log_file() -> PathBuf {
    PathBuf::from(format!("{APP_NAME}.log"))
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            version: CURRENT_VERSION,
            default_zoom_level: default_zoom_level(),
            state_file: None,
            log_file: default_log_file(),
            log_level: default_log_level(),
        }
    }
}

impl Settings {
    /// Configured zoom, pulled into range
    pub fn zoom(&self) -> ZoomLevel {
        ZoomLevel::from(self.default_zoom_level)
    }

    /// Configured level, falling back to `Info` for unknown names
    pub fn level_filter(&self) -> LevelFilter {
        LevelFilter::from_str(&self.log_level).unwrap_or_else(|_| {
            warn!("Unknown log level {:?}, using info", self.log_level);
            LevelFilter::Info
        })
    }

    /// Configured state file, or the per-user default
    pub fn state_path(&self) -> Option<PathBuf> {
        self.state_file.clone().or_else(default_state_path)
    }
}

static SETTINGS: LazyLock<RwLock<Settings>> = LazyLock::new(|| RwLock::new(Settings::default()));

fn preferred_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|config| config.join(APP_NAME).join(SETTINGS_FILENAME))
}

fn default_state_path() -> Option<PathBuf> {
    dirs::data_dir().map(|data| data.join(APP_NAME).join(STATE_FILENAME))
}

/// Load settings from `custom`, or from the per-user config file, creating
/// it with defaults when missing
pub fn load_settings(custom: Option<&Path>) {
    let path = match custom {
        Some(path) => path.to_path_buf(),
        None => match preferred_config_path() {
            Some(path) => path,
            None => {
                warn!("Could not determine config directory, using default settings");
                return;
            }
        },
    };

    if path.exists() {
        load_settings_from_path(&path);
    } else {
        info!("Settings file not found, creating with defaults at {path:?}");
        save_settings_to_file(&get_settings(), &path);
    }
}

fn load_settings_from_path(path: &Path) {
    match fs::read_to_string(path) {
        Ok(content) => match serde_yaml::from_str::<Settings>(&content) {
            Ok(mut settings) => {
                debug!("Loaded settings from {path:?}");

                if settings.version < CURRENT_VERSION {
                    migrate_settings(&mut settings);
                    save_settings_to_file(&settings, path);
                }

                if let Ok(mut global) = SETTINGS.write() {
                    *global = settings;
                }
            }
            Err(e) => {
                error!("Failed to parse settings file {path:?}: {e}");
            }
        },
        Err(e) => {
            error!("Failed to read settings file {path:?}: {e}");
        }
    }
}

fn migrate_settings(settings: &mut Settings) {
    info!(
        "Migrating settings from v{} to v{}",
        settings.version, CURRENT_VERSION
    );
    settings.version = CURRENT_VERSION;
}

fn save_settings_to_file(settings: &Settings, path: &Path) {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            if let Err(e) = fs::create_dir_all(parent) {
                error!("Failed to create config directory {parent:?}: {e}");
                return;
            }
        }
    }

    let content = generate_settings_yaml(settings);

    match fs::write(path, content) {
        Ok(()) => debug!("Saved settings to {path:?}"),
        Err(e) => error!("Failed to save settings to {path:?}: {e}"),
    }
}

fn generate_settings_yaml(settings: &Settings) -> String {
    let mut content = String::new();

    content.push_str(&format!("version: {}\n", settings.version));
    content.push_str(&format!(
        "# Zoom step for new sessions ({ZOOM_MIN} = smallest, {ZOOM_MAX} = largest)\n"
    ));
    content.push_str(&format!(
        "default_zoom_level: {}\n",
        settings.default_zoom_level
    ));
    match &settings.state_file {
        Some(path) => content.push_str(&format!("state_file: \"{}\"\n", path.display())),
        None => content.push_str("# state_file: \"/path/to/state.json\"\n"),
    }
    content.push_str(&format!("log_file: \"{}\"\n", settings.log_file.display()));
    content.push_str("# One of: off, error, warn, info, debug, trace\n");
    content.push_str(&format!("log_level: {}\n", settings.log_level));

    content
}

// Public API for accessing settings

pub fn get_settings() -> Settings {
    SETTINGS.read().map(|s| s.clone()).unwrap_or_default()
}

pub fn set_settings(settings: Settings) {
    if let Ok(mut global) = SETTINGS.write() {
        *global = settings;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use tempfile::TempDir;

    #[test]
    #[serial]
    fn missing_file_is_created_with_defaults() {
        set_settings(Settings::default());
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("conf/config.yaml");

        load_settings(Some(&path));

        assert!(path.exists());
        let written: Settings =
            serde_yaml::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written, Settings::default());
    }

    #[test]
    #[serial]
    fn file_values_replace_globals() {
        set_settings(Settings::default());
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.yaml");
        fs::write(
            &path,
            "version: 1\ndefault_zoom_level: 9\nstate_file: /tmp/s.json\nlog_level: debug\n",
        )
        .unwrap();

        load_settings(Some(&path));
        let settings = get_settings();

        assert_eq!(settings.zoom().get(), ZOOM_MAX);
        assert_eq!(settings.state_path(), Some(PathBuf::from("/tmp/s.json")));
        assert_eq!(settings.level_filter(), LevelFilter::Debug);
        assert_eq!(settings.log_file, default_log_file());
        set_settings(Settings::default());
    }

    #[test]
    #[serial]
    fn old_version_is_migrated_and_rewritten() {
        set_settings(Settings::default());
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.yaml");
        fs::write(&path, "version: 0\n").unwrap();

        load_settings(Some(&path));

        assert_eq!(get_settings().version, CURRENT_VERSION);
        let rewritten = fs::read_to_string(&path).unwrap();
        assert!(rewritten.contains(&format!("version: {CURRENT_VERSION}")));
        set_settings(Settings::default());
    }

    #[test]
    #[serial]
    fn unparsable_file_keeps_current_settings() {
        set_settings(Settings::default());
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.yaml");
        fs::write(&path, "default_zoom_level: [oops").unwrap();

        load_settings(Some(&path));
        assert_eq!(get_settings(), Settings::default());
    }

    #[test]
    fn unknown_log_level_falls_back_to_info() {
        let settings = Settings {
            log_level: "chatty".to_string(),
            ..Settings::default()
        };
        assert_eq!(settings.level_filter(), LevelFilter::Info);
    }
}
