use log::{LevelFilter, debug, error, info, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{LazyLock, RwLock};

use crate::content::DEFAULT_CHUNK_ATTRIBUTE;
use crate::navigation::cache::DEFAULT_CACHE_PAGES;
use crate::overlay::TransformOptions;

pub const CURRENT_VERSION: u32 = 1;
const SETTINGS_FILENAME: &str = "config.yaml";
const APP_NAME: &str = "docsync";

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("failed to read {path:?}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse {path:?}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_yaml::Error,
    },
    #[error("failed to write {path:?}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum LogLevel {
    Off,
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Off => "off",
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }

    pub fn to_level_filter(self) -> LevelFilter {
        match self {
            LogLevel::Off => LevelFilter::Off,
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Trace => LevelFilter::Trace,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub version: u32,

    /// Smallest overlay region edge, in display pixels
    #[serde(default = "default_min_box_size")]
    pub min_box_size: f64,

    #[serde(default = "default_true")]
    pub enforce_minimum: bool,

    #[serde(default = "default_true")]
    pub clamp_to_bounds: bool,

    #[serde(default = "default_hover_debounce_ms")]
    pub hover_debounce_ms: u64,

    #[serde(default = "default_sync_throttle_ms")]
    pub sync_throttle_ms: u64,

    #[serde(default = "default_structure_cache_pages")]
    pub structure_cache_pages: usize,

    #[serde(default = "default_chunk_attribute")]
    pub chunk_attribute: String,

    #[serde(default)]
    pub log_level: LogLevel,
}

fn default_true() -> bool {
    true
}

fn default_min_box_size() -> f64 {
    TransformOptions::DEFAULT_MIN_SIZE
}

fn default_hover_debounce_ms() -> u64 {
    50
}

fn default_sync_throttle_ms() -> u64 {
    300
}

fn default_structure_cache_pages() -> usize {
    DEFAULT_CACHE_PAGES
}

fn default_chunk_attribute() -> String {
    DEFAULT_CHUNK_ATTRIBUTE.to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            version: CURRENT_VERSION,
            min_box_size: default_min_box_size(),
            enforce_minimum: true,
            clamp_to_bounds: true,
            hover_debounce_ms: default_hover_debounce_ms(),
            sync_throttle_ms: default_sync_throttle_ms(),
            structure_cache_pages: default_structure_cache_pages(),
            chunk_attribute: default_chunk_attribute(),
            log_level: LogLevel::default(),
        }
    }
}

static SETTINGS: LazyLock<RwLock<Settings>> = LazyLock::new(|| RwLock::new(Settings::default()));

pub fn preferred_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|config| config.join(APP_NAME).join(SETTINGS_FILENAME))
}

/// Load the user's config file, writing defaults there on first run
pub fn load_settings() {
    let Some(path) = preferred_config_path() else {
        warn!("Could not determine config directory, using default settings");
        return;
    };
    if path.exists() {
        if let Err(e) = load_settings_from_path(&path) {
            error!("{e}");
        }
    } else {
        info!("Settings file not found, creating with defaults at {path:?}");
        if let Err(e) = save_settings_to_file(&get_settings(), &path) {
            error!("{e}");
        }
    }
}

/// Parse a settings file without touching the global settings
pub fn read_settings_file(path: &Path) -> Result<Settings, SettingsError> {
    let content = fs::read_to_string(path).map_err(|source| SettingsError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let mut settings: Settings =
        serde_yaml::from_str(&content).map_err(|source| SettingsError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
    sanitize(&mut settings);
    Ok(settings)
}

/// Load `path` into the global settings, migrating and re-saving older files
pub fn load_settings_from_path(path: &Path) -> Result<(), SettingsError> {
    let mut settings = read_settings_file(path)?;
    debug!("Loaded settings from {path:?}");

    if settings.version < CURRENT_VERSION {
        migrate_settings(&mut settings);
        save_settings_to_file(&settings, path)?;
    }

    if let Ok(mut global) = SETTINGS.write() {
        *global = settings;
    }
    Ok(())
}

fn sanitize(settings: &mut Settings) {
    if !settings.min_box_size.is_finite() || settings.min_box_size < 0.0 {
        warn!(
            "Invalid min_box_size {}, using {}",
            settings.min_box_size, TransformOptions::DEFAULT_MIN_SIZE
        );
        settings.min_box_size = TransformOptions::DEFAULT_MIN_SIZE;
    }
    if settings.structure_cache_pages == 0 {
        warn!("structure_cache_pages must be positive, using {DEFAULT_CACHE_PAGES}");
        settings.structure_cache_pages = DEFAULT_CACHE_PAGES;
    }
    if settings.chunk_attribute.trim().is_empty() {
        warn!("Empty chunk_attribute, using {DEFAULT_CHUNK_ATTRIBUTE}");
        settings.chunk_attribute = default_chunk_attribute();
    }
}

fn migrate_settings(settings: &mut Settings) {
    info!(
        "Migrating settings from v{} to v{}",
        settings.version, CURRENT_VERSION
    );

    // Future migrations go here:
    // if settings.version < 2 {
    //     migrate_v1_to_v2(settings);
    // }

    settings.version = CURRENT_VERSION;
}

pub fn save_settings_to_file(settings: &Settings, path: &Path) -> Result<(), SettingsError> {
    if let Some(parent) = path.parent() {
        if !parent.exists() {
            fs::create_dir_all(parent).map_err(|source| SettingsError::Write {
                path: parent.to_path_buf(),
                source,
            })?;
        }
    }

    fs::write(path, generate_settings_yaml(settings)).map_err(|source| SettingsError::Write {
        path: path.to_path_buf(),
        source,
    })?;
    debug!("Saved settings to {path:?}");
    Ok(())
}

fn generate_settings_yaml(settings: &Settings) -> String {
    let mut content = String::new();

    content.push_str(&format!("version: {}\n", settings.version));
    content.push('\n');
    content.push_str("# Overlay regions smaller than this (display pixels) are grown to it\n");
    content.push_str(&format!("min_box_size: {:?}\n", settings.min_box_size));
    content.push_str(&format!("enforce_minimum: {}\n", settings.enforce_minimum));
    content.push_str(&format!("clamp_to_bounds: {}\n", settings.clamp_to_bounds));
    content.push('\n');
    content.push_str("# Rate limits, in milliseconds\n");
    content.push_str(&format!("hover_debounce_ms: {}\n", settings.hover_debounce_ms));
    content.push_str(&format!("sync_throttle_ms: {}\n", settings.sync_throttle_ms));
    content.push('\n');
    content.push_str(&format!(
        "structure_cache_pages: {}\n",
        settings.structure_cache_pages
    ));
    content.push_str(&format!("chunk_attribute: \"{}\"\n", settings.chunk_attribute));
    content.push_str("# off, error, warn, info, debug or trace\n");
    content.push_str(&format!("log_level: {}\n", settings.log_level.as_str()));

    content
}

// Public API for accessing/modifying settings

pub fn get_settings() -> Settings {
    SETTINGS.read().map(|s| s.clone()).unwrap_or_default()
}

pub fn set_settings(settings: Settings) {
    if let Ok(mut global) = SETTINGS.write() {
        *global = settings;
    }
}
