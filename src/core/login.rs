//! Login handshake over the serial console.
//!
//! `Idle -> AwaitingPrompt -> Authenticated | Failed`. The machine nudges
//! the remote with a bare newline, answers identifier and password prompts
//! with the stored credentials and succeeds on the first shell prompt.

use crate::core::secrets::{load_credentials, store_credentials, SecretStore};
use crate::core::session::{PromptMarkers, SessionEngine};
use crate::core::sink::{OutputSink, Reporter};
use crate::core::transport::{SharedTransport, Transport};
use crate::domain::config::GlobalConfig;
use crate::domain::credentials::Credentials;
use crate::domain::error::SerialShResult;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info};

/// Echoed to the sink in place of the secret
const PASSWORD_PLACEHOLDER: &str = "[password entered]";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LoginState {
    Idle,
    AwaitingPrompt,
    Authenticated,
    Failed,
}

impl std::fmt::Display for LoginState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LoginState::Idle => write!(f, "Idle"),
            LoginState::AwaitingPrompt => write!(f, "AwaitingPrompt"),
            LoginState::Authenticated => write!(f, "Authenticated"),
            LoginState::Failed => write!(f, "Failed"),
        }
    }
}

/// What a received line asks of the login machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginPrompt {
    Identifier,
    Password,
    Shell,
    Other,
}

/// Classify one line seen during the handshake.
///
/// Identifier prompts are tested first, so a banner such as
/// `Last login: Tue ...` is answered with the identifier too.
pub fn classify_login_line(line: &str, markers: &PromptMarkers) -> LoginPrompt {
    let lower = line.to_lowercase();
    if lower.contains("login:") || lower.contains("username:") {
        LoginPrompt::Identifier
    } else if lower.contains("password:") {
        LoginPrompt::Password
    } else if markers.is_prompt(line) {
        LoginPrompt::Shell
    } else {
        LoginPrompt::Other
    }
}

#[derive(Debug, Clone)]
pub struct LoginConfig {
    /// Secret store service holding `login_id` and `password`
    pub service: String,
    pub markers: PromptMarkers,
    /// Pause after the initial newline nudge
    pub settle_after_nudge: Duration,
    /// Pause after sending the identifier
    pub settle_after_login_id: Duration,
    /// Pause after sending the password
    pub settle_after_password: Duration,
}

impl Default for LoginConfig {
    fn default() -> Self {
        Self {
            service: "serial_device".to_string(),
            markers: PromptMarkers::default(),
            settle_after_nudge: Duration::from_millis(500),
            settle_after_login_id: Duration::from_millis(500),
            settle_after_password: Duration::from_secs(1),
        }
    }
}

impl From<&GlobalConfig> for LoginConfig {
    fn from(global: &GlobalConfig) -> Self {
        let settle = Duration::from_millis(global.login_settle_ms);
        Self {
            service: global.secret_service.clone(),
            markers: PromptMarkers::new(global.prompt_markers.iter().cloned()),
            settle_after_nudge: settle,
            settle_after_login_id: settle,
            settle_after_password: Duration::from_millis(global.password_settle_ms),
        }
    }
}

pub struct LoginStateMachine {
    transport: SharedTransport,
    engine: SessionEngine,
    secrets: Arc<dyn SecretStore>,
    config: LoginConfig,
    credentials: Credentials,
    state: LoginState,
}

impl LoginStateMachine {
    /// Create the machine and load credentials from the secret store
    pub fn new(
        transport: SharedTransport,
        engine: SessionEngine,
        secrets: Arc<dyn SecretStore>,
        config: LoginConfig,
    ) -> Self {
        let credentials = load_credentials(secrets.as_ref(), &config.service);
        debug!("Loaded credentials for service '{}': {:?}", config.service, credentials);

        Self {
            transport,
            engine,
            secrets,
            config,
            credentials,
            state: LoginState::Idle,
        }
    }

    pub fn state(&self) -> LoginState {
        self.state
    }

    pub fn is_logged_in(&self) -> bool {
        self.state == LoginState::Authenticated
    }

    pub fn has_credentials(&self) -> bool {
        self.credentials.is_complete()
    }

    /// Forget a previous login so the next call runs the handshake again
    pub fn reset(&mut self) {
        self.state = LoginState::Idle;
    }

    /// Persist a new credential pair, then use it for later logins
    pub fn set_credentials(&mut self, login_id: &str, password: &str) -> SerialShResult<()> {
        store_credentials(self.secrets.as_ref(), &self.config.service, login_id, password)?;
        self.credentials = Credentials::new(login_id, password);
        info!("Credentials updated for service '{}'", self.config.service);
        Ok(())
    }

    /// Run the handshake; returns whether the session is authenticated.
    ///
    /// Already authenticated machines return `true` without touching the
    /// transport. Transport failures end in `Failed`, never in an error.
    pub async fn login_sequence(&mut self, timeout: Duration, sink: Option<&dyn OutputSink>) -> bool {
        let reporter = Reporter::new(sink);

        if self.state == LoginState::Authenticated {
            debug!("Login requested while already authenticated");
            return true;
        }

        let (login_id, password) = match (self.credentials.login_id(), self.credentials.password()) {
            (Some(id), Some(pw)) => (id.to_string(), pw.to_string()),
            _ => {
                reporter.error("Login credentials not set in secret store.");
                self.state = LoginState::Failed;
                return false;
            }
        };

        reporter.info("Starting login sequence...");
        self.state = LoginState::AwaitingPrompt;

        match self.handshake(&login_id, &password, timeout, &reporter).await {
            Ok(true) => {
                reporter.info("Login successful!");
                self.state = LoginState::Authenticated;
                true
            }
            Ok(false) => {
                reporter.warn("Login timed out or failed.");
                self.state = LoginState::Failed;
                false
            }
            Err(e) => {
                reporter.error_with("during login", &e);
                self.state = LoginState::Failed;
                false
            }
        }
    }

    async fn handshake(
        &self,
        login_id: &str,
        password: &str,
        timeout: Duration,
        reporter: &Reporter<'_>,
    ) -> SerialShResult<bool> {
        let guard = self.transport.lock().await;
        let transport: &dyn Transport = &**guard;

        transport.write_line("").await?;
        tokio::time::sleep(self.config.settle_after_nudge).await;

        let deadline = self.engine.deadline(timeout);
        while Instant::now() < deadline {
            let Some(line) = self.engine.read_event(transport, deadline).await? else {
                self.engine.pause(deadline).await;
                continue;
            };

            reporter.received(&line);
            match classify_login_line(&line, &self.config.markers) {
                LoginPrompt::Identifier => {
                    transport.write_line(login_id).await?;
                    reporter.sent(login_id);
                    tokio::time::sleep(self.config.settle_after_login_id).await;
                }
                LoginPrompt::Password => {
                    transport.write_line(password).await?;
                    reporter.sent(PASSWORD_PLACEHOLDER);
                    tokio::time::sleep(self.config.settle_after_password).await;
                }
                LoginPrompt::Shell => return Ok(true),
                LoginPrompt::Other => {}
            }
        }

        Ok(false)
    }
}
