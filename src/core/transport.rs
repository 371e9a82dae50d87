use crate::domain::error::SerialShResult;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, MutexGuard};

/// Duplex line channel to the remote device.
///
/// Implementations serialize their own byte-level operations, so a write
/// and a read never interleave on the wire. Longer exchanges (write then
/// capture) are serialized one level up by [`SharedTransport`].
#[async_trait]
pub trait Transport: Send + Sync {
    /// Short human-readable name, e.g. the port path
    fn name(&self) -> &str;

    /// Open the channel. Opening an already open channel is a no-op.
    async fn open(&self) -> SerialShResult<()>;

    /// Close the channel. Closing a closed channel is a no-op.
    async fn close(&self) -> SerialShResult<()>;

    fn is_open(&self) -> bool;

    /// Write `text` followed by a newline.
    async fn write_line(&self, text: &str) -> SerialShResult<()>;

    /// Read one line, waiting at most `timeout`.
    ///
    /// Returns `Ok(None)` when nothing arrived in time. Trailing `\r`/`\n`
    /// are stripped and undecodable bytes are dropped.
    async fn read_line(&self, timeout: Duration) -> SerialShResult<Option<String>>;
}

/// Transport handle shared by the login state machine and command runner.
///
/// Holding the guard returned by [`SharedTransport::lock`] grants one
/// caller exclusive use of the channel for a whole request/response cycle.
#[derive(Clone)]
pub struct SharedTransport {
    inner: Arc<Mutex<Box<dyn Transport>>>,
}

impl SharedTransport {
    pub fn new<T: Transport + 'static>(transport: T) -> Self {
        Self::from_boxed(Box::new(transport))
    }

    pub fn from_boxed(transport: Box<dyn Transport>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(transport)),
        }
    }

    /// Acquire the session lock for one full exchange
    pub async fn lock(&self) -> MutexGuard<'_, Box<dyn Transport>> {
        self.inner.lock().await
    }

    pub async fn open(&self) -> SerialShResult<()> {
        self.lock().await.open().await
    }

    pub async fn close(&self) -> SerialShResult<()> {
        self.lock().await.close().await
    }

    pub async fn name(&self) -> String {
        self.lock().await.name().to_string()
    }
}

impl std::fmt::Debug for SharedTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedTransport").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex as StdMutex;

    // Records every operation so interleaving can be asserted
    struct RecordingTransport {
        log: Arc<StdMutex<Vec<String>>>,
    }

    #[async_trait]
    impl Transport for RecordingTransport {
        fn name(&self) -> &str {
            "recording"
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

        async fn write_line(&self, text: &str) -> SerialShResult<()> {
            self.log.lock().unwrap().push(format!("w:{}", text));
            tokio::time::sleep(Duration::from_millis(5)).await;
            Ok(())
        }

        async fn read_line(&self, _timeout: Duration) -> SerialShResult<Option<String>> {
            tokio::time::sleep(Duration::from_millis(5)).await;
            let mut log = self.log.lock().unwrap();
            let last = log.last().cloned().unwrap_or_default();
            log.push(format!("r:{}", last));
            Ok(Some(last))
        }
    }

    #[tokio::test]
    async fn test_session_lock_serializes_cycles() {
        let log = Arc::new(StdMutex::new(Vec::new()));
        let shared = SharedTransport::new(RecordingTransport { log: Arc::clone(&log) });

        let mut handles = Vec::new();
        for i in 0..4 {
            let shared = shared.clone();
            handles.push(tokio::spawn(async move {
                let guard = shared.lock().await;
                guard.write_line(&format!("cmd{}", i)).await.unwrap();
                guard.read_line(Duration::from_millis(1)).await.unwrap()
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        // Every write is immediately followed by the read of the same cycle
        let log = log.lock().unwrap();
        assert_eq!(log.len(), 8);
        for pair in log.chunks(2) {
            assert!(pair[0].starts_with("w:cmd"));
            assert_eq!(pair[1], format!("r:{}", pair[0]));
        }
    }

    #[tokio::test]
    async fn test_shared_transport_name() {
        let shared = SharedTransport::new(RecordingTransport {
            log: Arc::new(StdMutex::new(Vec::new())),
        });
        assert_eq!(shared.name().await, "recording");
        assert!(shared.open().await.is_ok());
        assert!(shared.close().await.is_ok());
    }
}
