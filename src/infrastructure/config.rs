use crate::domain::{
    config::{SerialConfig, SerialShConfig},
    error::{SerialShError, SerialShResult},
};
use std::fs;
use std::path::{Path, PathBuf};
use toml::Value;

/// Configuration manager
pub struct ConfigManager {
    global_config_path: PathBuf,
    project_config_path: Option<PathBuf>,
}

impl ConfigManager {
    /// Create new configuration manager
    pub fn new() -> SerialShResult<Self> {
        let global_config_path = Self::get_global_config_path()?;
        let project_config_path = Self::find_project_config_path();

        Ok(Self {
            global_config_path,
            project_config_path,
        })
    }

    /// Manager over explicit locations
    pub fn with_paths(global_config_path: PathBuf, project_config_path: Option<PathBuf>) -> Self {
        Self {
            global_config_path,
            project_config_path,
        }
    }

    /// Load configuration from files.
    ///
    /// Keys set in the project file override the same keys in the global
    /// file; anything unset falls back to the built-in defaults.
    pub fn load_config(&self) -> SerialShResult<SerialShConfig> {
        let mut merged = Value::Table(Default::default());

        if self.global_config_path.exists() {
            merge_values(&mut merged, self.read_value(&self.global_config_path)?);
        }

        if let Some(project_path) = &self.project_config_path {
            if project_path.exists() {
                merge_values(&mut merged, self.read_value(project_path)?);
            }
        }

        merged.try_into().map_err(|e| {
            SerialShError::Configuration(format!("Invalid merged configuration: {}", e))
        })
    }

    /// Get global configuration path
    fn get_global_config_path() -> SerialShResult<PathBuf> {
        let home = dirs::home_dir().ok_or_else(|| {
            SerialShError::Configuration("Could not determine home directory".to_string())
        })?;

        Ok(home.join(".config").join("serialsh").join("config.toml"))
    }

    /// Find project configuration path by walking up directory tree
    fn find_project_config_path() -> Option<PathBuf> {
        let current_dir = std::env::current_dir().ok()?;
        let mut path = current_dir.as_path();

        loop {
            let config_path = path.join(".serialsh").join("config.toml");
            if config_path.exists() {
                return Some(config_path);
            }

            path = path.parent()?;
        }
    }

    fn read_value(&self, path: &Path) -> SerialShResult<Value> {
        let content = fs::read_to_string(path).map_err(|e| {
            SerialShError::Configuration(format!("Failed to read config file {}: {}", path.display(), e))
        })?;

        content.parse::<Value>().map_err(|e| {
            SerialShError::Configuration(format!("Failed to parse config file {}: {}", path.display(), e))
        })
    }

    /// Load configuration from specific path
    pub fn load_config_from_path(&self, path: &Path) -> SerialShResult<SerialShConfig> {
        let content = fs::read_to_string(path).map_err(|e| {
            SerialShError::Configuration(format!("Failed to read config file {}: {}", path.display(), e))
        })?;

        toml::from_str(&content).map_err(|e| {
            SerialShError::Configuration(format!("Failed to parse config file {}: {}", path.display(), e))
        })
    }

    /// Write a starter config into `<path>/.serialsh/config.toml`
    pub fn init_project_config(&self, path: &Path) -> SerialShResult<PathBuf> {
        let config_file = path.join(".serialsh").join("config.toml");
        self.write_starter_config(&config_file)?;
        Ok(config_file)
    }

    /// Write a starter config at the global location
    pub fn init_global_config(&self) -> SerialShResult<PathBuf> {
        self.write_starter_config(&self.global_config_path)?;
        Ok(self.global_config_path.clone())
    }

    fn write_starter_config(&self, config_file: &Path) -> SerialShResult<()> {
        if config_file.exists() {
            return Err(SerialShError::Configuration(format!(
                "Configuration already exists at {}",
                config_file.display()
            )));
        }

        let default_config = SerialShConfig {
            global: Default::default(),
            serial: Some(SerialConfig::new(default_port_name(), 115_200)),
        };

        if let Some(parent) = config_file.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                SerialShError::Configuration(format!("Failed to create config directory: {}", e))
            })?;
        }

        let body = toml::to_string_pretty(&default_config).map_err(|e| {
            SerialShError::Configuration(format!("Failed to serialize config: {}", e))
        })?;
        fs::write(config_file, format!("{}{}", STARTER_HEADER, body)).map_err(|e| {
            SerialShError::Configuration(format!("Failed to write config file {}: {}", config_file.display(), e))
        })
    }

    /// Get the current project config path (if any)
    pub fn get_project_config_path(&self) -> Option<&PathBuf> {
        self.project_config_path.as_ref()
    }

    /// Get the global config path
    pub fn get_global_config_path_ref(&self) -> &PathBuf {
        &self.global_config_path
    }
}

const STARTER_HEADER: &str = "\
# serialsh configuration
#
# [serial] port and baud_rate are required to talk to a device; both can be
# overridden with --port / --baud. Timeouts are in milliseconds. Credentials
# live in the secret store under `secret_service` (see `serialsh credentials set`).

";

fn default_port_name() -> &'static str {
    if cfg!(windows) {
        "COM1"
    } else {
        "/dev/ttyUSB0"
    }
}

/// Recursively overlay `overlay` onto `base`; tables merge, everything else replaces
fn merge_values(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (Value::Table(base_table), Value::Table(overlay_table)) => {
            for (key, value) in overlay_table {
                match base_table.get_mut(&key) {
                    Some(existing) => merge_values(existing, value),
                    None => {
                        base_table.insert(key, value);
                    }
                }
            }
        }
        (base, overlay) => *base = overlay,
    }
}
