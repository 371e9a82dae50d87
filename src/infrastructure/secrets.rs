use crate::core::secrets::SecretStore;
use crate::domain::credentials::{LOGIN_ID_KEY, PASSWORD_KEY};
use crate::domain::error::{SerialShError, SerialShResult};
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::debug;

/// `service -> key -> value`
type SecretTable = BTreeMap<String, BTreeMap<String, String>>;

/// Secrets kept in a TOML file readable only by its owner.
#[derive(Debug)]
pub struct FileSecretStore {
    path: PathBuf,
    // Serializes read-modify-write cycles on the file
    lock: Mutex<()>,
}

impl FileSecretStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    /// Store at `~/.config/serialsh/credentials.toml`
    pub fn default_location() -> SerialShResult<Self> {
        let dir = dirs::config_dir()
            .ok_or_else(|| SerialShError::Configuration("Could not determine config directory".to_string()))?;
        Ok(Self::new(dir.join("serialsh").join("credentials.toml")))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_table(&self) -> SerialShResult<SecretTable> {
        if !self.path.exists() {
            return Ok(SecretTable::new());
        }

        let content = fs::read_to_string(&self.path).map_err(|e| {
            SerialShError::SecretStore(format!("Failed to read {}: {}", self.path.display(), e))
        })?;
        toml::from_str(&content).map_err(|e| {
            SerialShError::SecretStore(format!("Failed to parse {}: {}", self.path.display(), e))
        })
    }

    fn write_table(&self, table: &SecretTable) -> SerialShResult<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                SerialShError::SecretStore(format!("Failed to create {}: {}", parent.display(), e))
            })?;
        }

        let content = toml::to_string_pretty(table)
            .map_err(|e| SerialShError::SecretStore(format!("Failed to serialize secrets: {}", e)))?;
        let write_err =
            |e: std::io::Error| SerialShError::SecretStore(format!("Failed to write {}: {}", self.path.display(), e));

        let mut file = Self::open_for_write(&self.path).map_err(write_err)?;
        file.write_all(content.as_bytes()).map_err(write_err)?;

        // Mode only applies on creation; tighten files that predate the store
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            file.set_permissions(fs::Permissions::from_mode(0o600)).map_err(|e| {
                SerialShError::SecretStore(format!("Failed to restrict {}: {}", self.path.display(), e))
            })?;
        }

        Ok(())
    }

    #[cfg(unix)]
    fn open_for_write(path: &Path) -> std::io::Result<fs::File> {
        use std::os::unix::fs::OpenOptionsExt;
        fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .mode(0o600)
            .open(path)
    }

    #[cfg(not(unix))]
    fn open_for_write(path: &Path) -> std::io::Result<fs::File> {
        fs::OpenOptions::new().write(true).create(true).truncate(true).open(path)
    }
}

impl SecretStore for FileSecretStore {
    fn get(&self, service: &str, key: &str) -> SerialShResult<Option<String>> {
        let _guard = self
            .lock
            .lock()
            .map_err(|_| SerialShError::SecretStore("secret store lock poisoned".to_string()))?;
        let table = self.read_table()?;
        Ok(table.get(service).and_then(|entries| entries.get(key)).cloned())
    }

    fn set(&self, service: &str, key: &str, value: &str) -> SerialShResult<()> {
        let _guard = self
            .lock
            .lock()
            .map_err(|_| SerialShError::SecretStore("secret store lock poisoned".to_string()))?;
        let mut table = self.read_table()?;
        table
            .entry(service.to_string())
            .or_default()
            .insert(key.to_string(), value.to_string());
        self.write_table(&table)?;
        debug!("Stored '{}' for service '{}'", key, service);
        Ok(())
    }
}

/// In-process secret store
#[derive(Debug, Default)]
pub struct MemorySecretStore {
    entries: Mutex<HashMap<(String, String), String>>,
}

impl MemorySecretStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populated with `login_id` and `password` under `service`
    pub fn with_credentials(service: &str, login_id: &str, password: &str) -> Self {
        let store = Self::new();
        if let Ok(mut entries) = store.entries.lock() {
            entries.insert((service.to_string(), LOGIN_ID_KEY.to_string()), login_id.to_string());
            entries.insert((service.to_string(), PASSWORD_KEY.to_string()), password.to_string());
        }
        store
    }
}

impl SecretStore for MemorySecretStore {
    fn get(&self, service: &str, key: &str) -> SerialShResult<Option<String>> {
        let entries = self
            .entries
            .lock()
            .map_err(|_| SerialShError::SecretStore("secret store lock poisoned".to_string()))?;
        Ok(entries.get(&(service.to_string(), key.to_string())).cloned())
    }

    fn set(&self, service: &str, key: &str, value: &str) -> SerialShResult<()> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| SerialShError::SecretStore("secret store lock poisoned".to_string()))?;
        entries.insert((service.to_string(), key.to_string()), value.to_string());
        Ok(())
    }
}
