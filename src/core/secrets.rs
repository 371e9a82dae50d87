use crate::domain::credentials::{Credentials, LOGIN_ID_KEY, PASSWORD_KEY};
use crate::domain::error::SerialShResult;
use tracing::warn;

/// Pluggable secret storage keyed by service and key name
pub trait SecretStore: Send + Sync {
    fn get(&self, service: &str, key: &str) -> SerialShResult<Option<String>>;

    fn set(&self, service: &str, key: &str, value: &str) -> SerialShResult<()>;
}

/// Load the credential pair stored under `service`.
///
/// Store failures are logged and treated as missing values.
pub fn load_credentials(store: &dyn SecretStore, service: &str) -> Credentials {
    let fetch = |key: &str| match store.get(service, key) {
        Ok(value) => value,
        Err(e) => {
            warn!("Failed to read '{}' for service '{}': {}", key, service, e);
            None
        }
    };

    Credentials::from_parts(fetch(LOGIN_ID_KEY), fetch(PASSWORD_KEY))
}

/// Persist both halves of a credential pair under `service`
pub fn store_credentials(
    store: &dyn SecretStore,
    service: &str,
    login_id: &str,
    password: &str,
) -> SerialShResult<()> {
    store.set(service, LOGIN_ID_KEY, login_id)?;
    store.set(service, PASSWORD_KEY, password)
}
