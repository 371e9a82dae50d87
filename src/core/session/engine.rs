use crate::core::sink::Reporter;
use crate::core::transport::Transport;
use crate::domain::config::GlobalConfig;
use crate::domain::error::SerialShResult;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

/// Timing knobs for the polling loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    /// Pause after a read attempt that produced nothing
    pub poll_interval: Duration,
    /// Upper bound for a single read attempt
    pub read_timeout: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(100),
            read_timeout: Duration::from_secs(1),
        }
    }
}

impl From<&GlobalConfig> for EngineConfig {
    fn from(global: &GlobalConfig) -> Self {
        Self {
            poll_interval: global.poll_interval(),
            read_timeout: global.read_timeout(),
        }
    }
}

/// Why a capture loop stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CaptureOutcome {
    /// The acceptance predicate matched an event
    Matched,
    /// The deadline passed first; not an error
    TimedOut,
}

/// Ordered events collected by one capture loop
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Capture {
    pub events: Vec<String>,
    pub outcome: CaptureOutcome,
    pub elapsed: Duration,
}

impl Capture {
    pub fn is_matched(&self) -> bool {
        self.outcome == CaptureOutcome::Matched
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Events joined by newlines
    pub fn text(&self) -> String {
        self.events.join("\n")
    }
}

/// Timeout-bounded read loop shared by login and command execution.
///
/// The engine owns no transport; callers pass the transport they hold the
/// session lock for, which keeps one request/response cycle atomic.
#[derive(Debug, Clone, Copy, Default)]
pub struct SessionEngine {
    config: EngineConfig,
}

impl SessionEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Deadline for an operation starting now
    pub fn deadline(&self, timeout: Duration) -> Instant {
        Instant::now() + timeout
    }

    /// One read attempt bounded by the per-attempt timeout and `deadline`.
    ///
    /// Blank lines count as no event.
    pub async fn read_event(
        &self,
        transport: &dyn Transport,
        deadline: Instant,
    ) -> SerialShResult<Option<String>> {
        let remaining = deadline.saturating_duration_since(Instant::now());
        let attempt = self.config.read_timeout.min(remaining);
        let line = transport.read_line(attempt).await?;
        Ok(line.filter(|l| !l.trim().is_empty()))
    }

    /// Sleep one poll interval, never past `deadline`
    pub async fn pause(&self, deadline: Instant) {
        let remaining = deadline.saturating_duration_since(Instant::now());
        tokio::time::sleep(self.config.poll_interval.min(remaining)).await;
    }

    /// Read events until `accept` matches one or `timeout` elapses.
    ///
    /// The matching event is part of the capture. Transport errors abort
    /// the loop and are returned to the caller.
    pub async fn capture_until<P>(
        &self,
        transport: &dyn Transport,
        timeout: Duration,
        mut accept: P,
        reporter: Option<&Reporter<'_>>,
    ) -> SerialShResult<Capture>
    where
        P: FnMut(&str) -> bool,
    {
        let start = Instant::now();
        let deadline = start + timeout;
        let mut events = Vec::new();

        while Instant::now() < deadline {
            match self.read_event(transport, deadline).await? {
                Some(event) => {
                    if let Some(reporter) = reporter {
                        reporter.received(&event);
                    }
                    let matched = accept(&event);
                    events.push(event);
                    if matched {
                        debug!("Capture matched after {} events", events.len());
                        return Ok(Capture {
                            events,
                            outcome: CaptureOutcome::Matched,
                            elapsed: start.elapsed(),
                        });
                    }
                }
                None => self.pause(deadline).await,
            }
        }

        debug!("Capture timed out after {:?} with {} events", timeout, events.len());
        Ok(Capture {
            events,
            outcome: CaptureOutcome::TimedOut,
            elapsed: start.elapsed(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::session::PromptMarkers;
    use crate::core::sink::BufferSink;
    use crate::domain::error::SerialShError;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    struct QueueTransport {
        lines: Mutex<VecDeque<Result<String, String>>>,
    }

    impl QueueTransport {
        fn new(lines: &[&str]) -> Self {
            Self {
                lines: Mutex::new(lines.iter().map(|l| Ok(l.to_string())).collect()),
            }
        }
    }

    #[async_trait]
    impl Transport for QueueTransport {
        fn name(&self) -> &str {
            "queue"
        }

        async fn open(&self) -> SerialShResult<()> {
            Ok(())
        }

        async fn close(&self) -> SerialShResult<()> {
            Ok(())
        }

        fn is_open(&self) -> bool {
            true
        }

        async fn write_line(&self, _text: &str) -> SerialShResult<()> {
            Ok(())
        }

        async fn read_line(&self, timeout: Duration) -> SerialShResult<Option<String>> {
            let next = self.lines.lock().unwrap().pop_front();
            match next {
                Some(Ok(line)) => Ok(Some(line)),
                Some(Err(message)) => Err(SerialShError::transport(message)),
                None => {
                    tokio::time::sleep(timeout).await;
                    Ok(None)
                }
            }
        }
    }

    fn fast_engine() -> SessionEngine {
        SessionEngine::new(EngineConfig {
            poll_interval: Duration::from_millis(10),
            read_timeout: Duration::from_millis(10),
        })
    }

    #[tokio::test]
    async fn test_capture_stops_at_first_match() {
        let transport = QueueTransport::new(&["one", "two", "user$ ", "three"]);
        let markers = PromptMarkers::default();

        let capture = fast_engine()
            .capture_until(&transport, Duration::from_secs(2), |l| markers.is_prompt(l), None)
            .await
            .unwrap();

        assert_eq!(capture.outcome, CaptureOutcome::Matched);
        assert_eq!(capture.events, vec!["one", "two", "user$ "]);
        assert_eq!(capture.text(), "one\ntwo\nuser$ ");
    }

    #[tokio::test]
    async fn test_first_event_match_is_captured() {
        let transport = QueueTransport::new(&["#"]);
        let capture = fast_engine()
            .capture_until(&transport, Duration::from_secs(1), |_| true, None)
            .await
            .unwrap();
        assert!(capture.is_matched());
        assert_eq!(capture.events, vec!["#"]);
    }

    #[tokio::test]
    async fn test_timeout_with_no_output() {
        let transport = QueueTransport::new(&[]);
        let timeout = Duration::from_millis(120);
        let engine = fast_engine();

        let capture = engine
            .capture_until(&transport, timeout, |_| true, None)
            .await
            .unwrap();

        assert_eq!(capture.outcome, CaptureOutcome::TimedOut);
        assert!(capture.is_empty());
        assert!(capture.elapsed >= timeout);
        assert!(capture.elapsed < timeout + engine.config().poll_interval + Duration::from_millis(50));
    }

    #[tokio::test]
    async fn test_blank_lines_are_not_events() {
        let transport = QueueTransport::new(&["", "   ", "data"]);
        let sink = BufferSink::new();
        let reporter = Reporter::new(Some(&sink));

        let capture = fast_engine()
            .capture_until(&transport, Duration::from_millis(200), |_| false, Some(&reporter))
            .await
            .unwrap();

        assert_eq!(capture.outcome, CaptureOutcome::TimedOut);
        assert_eq!(capture.events, vec!["data"]);
        assert_eq!(sink.lines(), vec!["data"]);
    }

    #[tokio::test]
    async fn test_transport_error_is_returned() {
        let transport = QueueTransport {
            lines: Mutex::new(VecDeque::from(vec![Ok("a".to_string()), Err("unplugged".to_string())])),
        };

        let result = fast_engine()
            .capture_until(&transport, Duration::from_secs(1), |_| false, None)
            .await;

        assert!(matches!(result, Err(SerialShError::Transport { .. })));
    }
}
