use crate::cli::args::{
    timeout_or, Args, Command, ConfigCommand, CredentialsCommand, GrepArgs, OutputFormat, RunArgs,
};
use crate::cli::output::{ConsoleWriter, OutputWriter};
use crate::core::command::{LinePattern, PatternSet};
use crate::core::secrets::store_credentials;
use crate::core::session::{EngineConfig, PromptMarkers, SessionEngine};
use crate::core::sink::OutputSink;
use crate::core::{CommandRunner, LoginConfig, LoginStateMachine, SharedTransport};
use crate::domain::config::{SerialConfig, SerialShConfig};
use crate::domain::error::{SerialShError, SerialShResult};
use crate::infrastructure::config::ConfigManager;
use crate::infrastructure::logging::init_logging;
use crate::infrastructure::persistence::FsCaptureStore;
use crate::infrastructure::secrets::FileSecretStore;
use crate::infrastructure::serial::{list_ports, SerialTransport};
use std::sync::Arc;
use tracing::{debug, info};

/// Execute CLI command.
///
/// Returns `Ok(false)` when the command ran but did not succeed: the login
/// failed or the device produced no output.
pub async fn execute_command(args: Args) -> SerialShResult<bool> {
    let writer = ConsoleWriter::new(args.output);

    // Load configuration using ConfigManager
    let config_manager = ConfigManager::new()?;
    let mut config = if let Some(config_path) = &args.config {
        config_manager.load_config_from_path(config_path)?
    } else {
        config_manager.load_config()?
    };
    apply_overrides(&mut config, args.port.clone(), args.baud);

    if !args.quiet {
        init_logging(args.verbose, &config.global.log_level)
            .map_err(|e| SerialShError::Configuration(format!("Failed to initialize logging: {}", e)))?;
    }

    let sink = LiveSink::new(args.quiet, args.output);

    match args.command {
        Command::Login { timeout } => {
            let mut session = DeviceSession::open(&config).await?;
            let timeout = timeout_or(timeout, config.global.login_timeout());
            let ok = session.login.login_sequence(timeout, Some(&sink)).await;
            session.close().await;
            writer.write_message(&format!("Login state: {}", session.login.state()))?;
            Ok(ok)
        }
        Command::Run(run) => execute_run(run, &config, &writer, &sink).await,
        Command::Dmesg { timeout } => {
            let mut session = DeviceSession::open(&config).await?;
            if !session.login.login_sequence(config.global.login_timeout(), Some(&sink)).await {
                session.close().await;
                return Ok(false);
            }

            let timeout = timeout_or(timeout, config.global.command_timeout());
            let (output, summary) = session.runner.run_kernel_log(timeout, Some(&sink)).await;
            session.close().await;

            writer.write_kernel_summary(&output, &summary)?;
            Ok(!output.is_empty())
        }
        Command::Grep(grep) => execute_grep(grep, &config, &writer, &sink).await,
        Command::Credentials(credentials) => match credentials.command {
            CredentialsCommand::Set { login_id, password } => {
                let password = password.filter(|p| !p.is_empty()).ok_or_else(|| {
                    SerialShError::InvalidInput(
                        "password required: pass --password or set SERIALSH_PASSWORD".to_string(),
                    )
                })?;
                if login_id.trim().is_empty() {
                    return Err(SerialShError::InvalidInput("login id must not be empty".to_string()));
                }

                let store = FileSecretStore::default_location()?;
                store_credentials(&store, &config.global.secret_service, login_id.trim(), &password)?;
                writer.write_message(&format!(
                    "Credentials for service '{}' stored in {}",
                    config.global.secret_service,
                    store.path().display()
                ))?;
                Ok(true)
            }
        },
        Command::Ports => {
            let ports = list_ports()?;
            writer.write_ports(&ports)?;
            Ok(true)
        }
        Command::Config(config_args) => match config_args.command {
            ConfigCommand::Show => {
                writer.write_config(&config)?;
                Ok(true)
            }
            ConfigCommand::Init { dir, global } => {
                let path = if global {
                    config_manager.init_global_config()?
                } else {
                    let dir = match dir {
                        Some(dir) => dir,
                        None => std::env::current_dir()?,
                    };
                    config_manager.init_project_config(&dir)?
                };
                writer.write_message(&format!("Configuration initialized at '{}'", path.display()))?;
                Ok(true)
            }
        },
    }
}

async fn execute_run(
    args: RunArgs,
    config: &SerialShConfig,
    writer: &ConsoleWriter,
    sink: &LiveSink,
) -> SerialShResult<bool> {
    let command = args.command_line();
    let mut session = DeviceSession::open(config).await?;

    if !args.no_login && !session.login.login_sequence(config.global.login_timeout(), Some(sink)).await {
        session.close().await;
        return Ok(false);
    }

    let markers = (!args.prompts.is_empty()).then(|| PromptMarkers::new(args.prompts));
    let timeout = timeout_or(args.timeout, config.global.command_timeout());
    let output = session
        .runner
        .run_command(&command, timeout, markers.as_ref(), Some(sink))
        .await;
    session.close().await;

    writer.write_command(&output)?;
    Ok(!output.is_empty())
}

async fn execute_grep(
    args: GrepArgs,
    config: &SerialShConfig,
    writer: &ConsoleWriter,
    sink: &LiveSink,
) -> SerialShResult<bool> {
    let mut patterns = PatternSet::new();
    for (label, pattern) in &args.patterns {
        let compiled = LinePattern::regex(pattern)
            .map_err(|e| SerialShError::InvalidInput(format!("invalid pattern for '{}': {}", label, e)))?;
        patterns.insert(label.clone(), compiled);
    }
    let labels: Vec<String> = patterns.labels().map(str::to_string).collect();

    let mut session = DeviceSession::open(config).await?;
    if !args.no_login && !session.login.login_sequence(config.global.login_timeout(), Some(sink)).await {
        session.close().await;
        return Ok(false);
    }

    let timeout = timeout_or(args.timeout, config.global.command_timeout());
    let (output, buckets) = session
        .runner
        .run_and_classify(&args.command, timeout, &patterns, Some(sink))
        .await;
    session.close().await;

    writer.write_buckets(&output, &labels, &buckets)?;
    Ok(!output.is_empty())
}

/// `--port` / `--baud` win over the configuration files
fn apply_overrides(config: &mut SerialShConfig, port: Option<String>, baud: Option<u32>) {
    if port.is_none() && baud.is_none() {
        return;
    }

    let serial = config.serial.get_or_insert_with(SerialConfig::default);
    if let Some(port) = port {
        serial.port = Some(port);
    }
    if let Some(baud) = baud {
        serial.baud_rate = Some(baud);
    }
}

/// One open serial link with its login machine and command runner
struct DeviceSession {
    transport: SharedTransport,
    login: LoginStateMachine,
    runner: CommandRunner,
}

impl DeviceSession {
    async fn open(config: &SerialShConfig) -> SerialShResult<Self> {
        let serial = config.serial.as_ref().ok_or_else(|| {
            SerialShError::Configuration("no [serial] section and no --port/--baud given".to_string())
        })?;

        let transport = SharedTransport::new(SerialTransport::from_config(serial)?);
        transport.open().await?;
        info!("Session opened on {}", transport.name().await);

        let engine = SessionEngine::new(EngineConfig::from(&config.global));
        let secrets = Arc::new(FileSecretStore::default_location()?);
        let login = LoginStateMachine::new(
            transport.clone(),
            engine.clone(),
            secrets,
            LoginConfig::from(&config.global),
        );

        let store = Arc::new(FsCaptureStore::new(&config.global.logs_dir));
        let runner = CommandRunner::new(transport.clone(), engine, store)
            .with_markers(PromptMarkers::new(config.global.prompt_markers.iter().cloned()));

        Ok(Self {
            transport,
            login,
            runner,
        })
    }

    async fn close(&self) {
        if let Err(e) = self.transport.close().await {
            debug!("Ignoring close failure: {}", e);
        }
    }
}

/// Live console sink honoring `--quiet` and keeping stdout clean for JSON
struct LiveSink {
    quiet: bool,
    format: OutputFormat,
}

impl LiveSink {
    fn new(quiet: bool, format: OutputFormat) -> Self {
        Self { quiet, format }
    }
}

impl OutputSink for LiveSink {
    fn emit(&self, line: &str) {
        if self.quiet {
            return;
        }
        match self.format {
            OutputFormat::Json => eprintln!("{}", line),
            _ => println!("{}", line),
        }
    }
}
