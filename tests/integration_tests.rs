mod common;

use common::{fast_engine, quick_login_config, ScriptedTransport};
use serialsh::core::sink::BufferSink;
use serialsh::core::{CommandRunner, CommandStatus, LoginStateMachine, SharedTransport};
use serialsh::infrastructure::{FsCaptureStore, MemorySecretStore};
use serialsh::SerialShConfig;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

/// End-to-end flows over one shared transport
#[cfg(test)]
mod integration_tests {
    use super::*;

    #[test]
    fn test_config_serialization() {
        let config = SerialShConfig::default();
        let toml_str = toml::to_string(&config).expect("Failed to serialize config");
        let deserialized: SerialShConfig = toml::from_str(&toml_str).expect("Failed to deserialize config");

        assert_eq!(config.global.log_level, deserialized.global.log_level);
        assert_eq!(config.global.prompt_markers, deserialized.global.prompt_markers);
    }

    #[tokio::test(start_paused = true)]
    async fn test_login_then_dmesg_to_disk() {
        let temp_dir = TempDir::new().unwrap();
        let device = ScriptedTransport::new()
            .respond_to("", &["buildroot login: "])
            .respond_to("root", &["Password: "])
            .respond_to("toor", &["# "])
            .respond_to(
                "dmesg",
                &[
                    "[    0.000000] Booting Linux on physical CPU 0x0",
                    "[    1.204711] WARNING: CPU: 0 PID: 1 at kernel/irq.c",
                    "[    2.318004] mmc0: error -110 whilst initialising SD card",
                    "# ",
                ],
            );
        let transport = SharedTransport::new(device.clone());
        transport.open().await.unwrap();

        let mut login = LoginStateMachine::new(
            transport.clone(),
            fast_engine(),
            Arc::new(MemorySecretStore::with_credentials("serial_device", "root", "toor")),
            quick_login_config(),
        );
        let runner = CommandRunner::new(
            transport.clone(),
            fast_engine(),
            Arc::new(FsCaptureStore::new(temp_dir.path())),
        );
        let sink = BufferSink::new();

        assert!(login.login_sequence(Duration::from_secs(5), Some(&sink)).await);
        let (output, summary) = runner.run_kernel_log(Duration::from_secs(5), Some(&sink)).await;

        assert_eq!(output.status, CommandStatus::Completed);
        assert_eq!(output.lines.len(), 4);
        assert_eq!(summary.warnings.len(), 1);
        assert_eq!(summary.errors.len(), 1);

        let folder = std::path::PathBuf::from(output.destination.as_str());
        assert!(folder.starts_with(temp_dir.path().join("dmesg")));
        assert_eq!(output.saved_to, Some(folder.join("output.txt")));
        assert_eq!(
            std::fs::read_to_string(folder.join("boot_time.txt")).unwrap(),
            "[    0.000000] Booting Linux on physical CPU 0x0\n"
        );
        assert_eq!(
            std::fs::read_to_string(folder.join("errors.txt")).unwrap(),
            "[    2.318004] mmc0: error -110 whilst initialising SD card\n"
        );
        assert!(sink.contains("[*] Output saved to"));
        assert!(sink.lines().iter().all(|line| !line.contains("toor")));

        assert_eq!(device.writes(), vec!["", "root", "toor", "dmesg"]);
        transport.close().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_login_leaves_transport_usable() {
        let device = ScriptedTransport::new().respond_to("whoami", &["nobody", "$ "]);
        let transport = SharedTransport::new(device.clone());

        let mut login = LoginStateMachine::new(
            transport.clone(),
            fast_engine(),
            Arc::new(MemorySecretStore::with_credentials("serial_device", "root", "toor")),
            quick_login_config(),
        );
        assert!(!login.login_sequence(Duration::from_millis(300), Some(&BufferSink::new())).await);

        let temp_dir = TempDir::new().unwrap();
        let runner = CommandRunner::new(transport, fast_engine(), Arc::new(FsCaptureStore::new(temp_dir.path())));
        let output = runner
            .run_command("whoami", Duration::from_secs(1), None, Some(&BufferSink::new()))
            .await;

        assert_eq!(output.lines, vec!["nobody", "$ "]);
        assert!(output.is_completed());
    }

    #[tokio::test(start_paused = true)]
    async fn test_repeated_command_keeps_each_saved_capture() {
        let temp_dir = TempDir::new().unwrap();
        let device = ScriptedTransport::new()
            .respond_to("cat /proc/loadavg", &["first", "# "])
            .respond_to("cat /proc/loadavg", &["second", "# "]);
        let runner = CommandRunner::new(
            SharedTransport::new(device.clone()),
            fast_engine(),
            Arc::new(FsCaptureStore::new(temp_dir.path())),
        );

        let a = runner
            .run_command("cat /proc/loadavg", Duration::from_secs(5), None, Some(&BufferSink::new()))
            .await;
        let b = runner
            .run_command("cat /proc/loadavg", Duration::from_secs(5), None, Some(&BufferSink::new()))
            .await;

        assert_ne!(a.destination, b.destination);
        let a_path = a.saved_to.clone().unwrap();
        let b_path = b.saved_to.clone().unwrap();
        assert_eq!(std::fs::read_to_string(a_path).unwrap(), a.text());
        assert_eq!(std::fs::read_to_string(b_path).unwrap(), b.text());
        assert_eq!(a.text(), "first\n# ");
    }
}
