use serialsh::core::command::{KernelLogSummary, LinePattern, PatternSet};
use serialsh::core::PromptMarkers;
use serialsh::{SerialShConfig, SerialShError};
use std::time::{Duration, Instant};

fn synthetic_kernel_log(lines: usize) -> String {
    (0..lines)
        .map(|i| match i % 10 {
            0 => format!("[{:>5}.{:06}] usb 1-1: WARNING: over-current", i / 100, i % 1_000_000),
            5 => format!("[{:>5}.{:06}] mmc0: error -110 reading block", i / 100, i % 1_000_000),
            _ => format!("[{:>5}.{:06}] eth0: link up, 100Mbps, full-duplex", i / 100, i % 1_000_000),
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Performance tests
#[cfg(test)]
mod performance_tests {
    use super::*;

    #[test]
    fn test_kernel_log_summary_performance() {
        let log = synthetic_kernel_log(20_000);

        let start = Instant::now();
        let summary = KernelLogSummary::parse(&log);
        let elapsed = start.elapsed();

        assert_eq!(summary.warnings.len(), 2_000);
        assert_eq!(summary.errors.len(), 2_000);
        assert!(elapsed < Duration::from_secs(2), "Kernel log summary too slow: {:?}", elapsed);
    }

    #[test]
    fn test_pattern_classification_performance() {
        let log = synthetic_kernel_log(20_000);
        let patterns = PatternSet::new()
            .with("usb", LinePattern::literal("usb "))
            .with("mmc", LinePattern::regex(r"mmc\d+: error -\d+").unwrap())
            .with("link", LinePattern::regex(r"link (up|down)").unwrap());

        let start = Instant::now();
        let buckets = patterns.classify(&log);
        let elapsed = start.elapsed();

        assert_eq!(buckets["usb"].len(), 2_000);
        assert_eq!(buckets["mmc"].len(), 2_000);
        assert_eq!(buckets["link"].len(), 16_000);
        assert!(elapsed < Duration::from_secs(2), "Classification too slow: {:?}", elapsed);
    }

    #[test]
    fn test_prompt_detection_performance() {
        let markers = PromptMarkers::default();
        let line = "eth0: link up, 100Mbps, full-duplex, lpa 0x45E1";

        let start = Instant::now();
        for _ in 0..100_000 {
            assert!(!markers.is_prompt(line));
        }
        let elapsed = start.elapsed();

        assert!(elapsed < Duration::from_secs(1), "Prompt detection too slow: {:?}", elapsed);
    }

    #[test]
    fn test_config_serialization_performance() {
        let config = SerialShConfig::default();

        let start = Instant::now();
        for _ in 0..1000 {
            let serialized = toml::to_string(&config).expect("Serialization failed");
            let _: SerialShConfig = toml::from_str(&serialized).expect("Deserialization failed");
        }
        let elapsed = start.elapsed();

        assert!(elapsed < Duration::from_secs(2), "Config serialization too slow: {:?}", elapsed);
    }

    #[test]
    fn test_error_performance() {
        let start = Instant::now();
        for _ in 0..10_000 {
            let error = SerialShError::transport("Test error");
            let _ = error.to_string();
        }
        let elapsed = start.elapsed();

        assert!(elapsed < Duration::from_millis(500), "Error handling too slow: {:?}", elapsed);
    }
}
