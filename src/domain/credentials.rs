use std::fmt;

/// Secret store key holding the login identifier
pub const LOGIN_ID_KEY: &str = "login_id";
/// Secret store key holding the password
pub const PASSWORD_KEY: &str = "password";

/// Login identifier and secret used by the login handshake.
///
/// Either half may be missing when the secret store has nothing for it;
/// `Debug` never prints the secret.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    login_id: Option<String>,
    password: Option<String>,
}

impl Credentials {
    pub fn new(login_id: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            login_id: Some(login_id.into()),
            password: Some(password.into()),
        }
    }

    pub fn from_parts(login_id: Option<String>, password: Option<String>) -> Self {
        Self { login_id, password }
    }

    pub fn login_id(&self) -> Option<&str> {
        self.login_id.as_deref().filter(|id| !id.is_empty())
    }

    pub fn password(&self) -> Option<&str> {
        self.password.as_deref().filter(|pw| !pw.is_empty())
    }

    /// Both halves present and non-empty
    pub fn is_complete(&self) -> bool {
        self.login_id().is_some() && self.password().is_some()
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("login_id", &self.login_id)
            .field("password", &self.password.as_ref().map(|_| "[redacted]"))
            .finish()
    }
}
