#![allow(dead_code)]

use async_trait::async_trait;
use serialsh::core::command::{sanitize_command_name, CaptureContent, CaptureStore, Destination};
use serialsh::core::login::LoginConfig;
use serialsh::core::session::{EngineConfig, SessionEngine};
use serialsh::core::transport::Transport;
use serialsh::{SerialShError, SerialShResult};
use std::collections::{HashMap, VecDeque};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Default)]
struct Script {
    /// Lines waiting to be read
    pending: VecDeque<String>,
    /// Replies keyed by the exact text written
    responses: HashMap<String, VecDeque<Vec<String>>>,
    /// Replies handed out in order for writes without a keyed response
    replies: VecDeque<Vec<String>>,
    writes: Vec<String>,
    fail_writes: bool,
}

/// In-memory device: every write releases the next scripted batch of lines.
///
/// Reads with nothing pending sleep for the whole attempt timeout, like a
/// quiet serial line would.
#[derive(Clone, Default)]
pub struct ScriptedTransport {
    script: Arc<Mutex<Script>>,
    open: Arc<AtomicBool>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lines readable before anything is written
    pub fn banner(self, lines: &[&str]) -> Self {
        self.script.lock().unwrap().pending.extend(lines.iter().map(|l| l.to_string()));
        self
    }

    /// Reply to the next unkeyed write
    pub fn reply(self, lines: &[&str]) -> Self {
        self.script
            .lock()
            .unwrap()
            .replies
            .push_back(lines.iter().map(|l| l.to_string()).collect());
        self
    }

    /// Reply to a write of exactly `text`; repeated calls queue further replies
    pub fn respond_to(self, text: &str, lines: &[&str]) -> Self {
        self.script
            .lock()
            .unwrap()
            .responses
            .entry(text.to_string())
            .or_default()
            .push_back(lines.iter().map(|l| l.to_string()).collect());
        self
    }

    pub fn fail_writes(&self) {
        self.script.lock().unwrap().fail_writes = true;
    }

    pub fn writes(&self) -> Vec<String> {
        self.script.lock().unwrap().writes.clone()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn open(&self) -> SerialShResult<()> {
        self.open.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn close(&self) -> SerialShResult<()> {
        self.open.store(false, Ordering::SeqCst);
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.open.load(Ordering::SeqCst)
    }

    async fn write_line(&self, text: &str) -> SerialShResult<()> {
        let mut script = self.script.lock().unwrap();
        if script.fail_writes {
            return Err(SerialShError::transport("scripted write failure"));
        }
        script.writes.push(text.to_string());

        let keyed = script.responses.get_mut(text).and_then(|queue| queue.pop_front());
        let batch = match keyed {
            Some(batch) => Some(batch),
            None => script.replies.pop_front(),
        };
        if let Some(batch) = batch {
            script.pending.extend(batch);
        }
        Ok(())
    }

    async fn read_line(&self, timeout: Duration) -> SerialShResult<Option<String>> {
        let next = self.script.lock().unwrap().pending.pop_front();
        match next {
            Some(line) => Ok(Some(line)),
            None => {
                tokio::time::sleep(timeout).await;
                Ok(None)
            }
        }
    }
}

/// Engine with short polling so scripted runs finish quickly
pub fn fast_engine() -> SessionEngine {
    SessionEngine::new(EngineConfig {
        poll_interval: Duration::from_millis(10),
        read_timeout: Duration::from_millis(50),
    })
}

/// Login config without settle pauses
pub fn quick_login_config() -> LoginConfig {
    LoginConfig {
        settle_after_nudge: Duration::ZERO,
        settle_after_login_id: Duration::ZERO,
        settle_after_password: Duration::ZERO,
        ..LoginConfig::default()
    }
}

/// One persisted file as seen by [`MemoryCaptureStore`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedCapture {
    pub destination: String,
    pub name: String,
    pub content: String,
}

/// Capture store keeping everything in memory
#[derive(Default)]
pub struct MemoryCaptureStore {
    saved: Mutex<Vec<SavedCapture>>,
    counter: AtomicUsize,
}

impl MemoryCaptureStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn saved(&self) -> Vec<SavedCapture> {
        self.saved.lock().unwrap().clone()
    }

    pub fn find(&self, name: &str) -> Option<SavedCapture> {
        self.saved().into_iter().find(|s| s.name == name)
    }
}

impl CaptureStore for MemoryCaptureStore {
    fn destination_for(&self, command: &str) -> Destination {
        let n = self.counter.fetch_add(1, Ordering::SeqCst);
        Destination::new(format!("mem/{}/{}", sanitize_command_name(command), n))
    }

    fn save(&self, destination: &Destination, name: &str, content: &CaptureContent) -> SerialShResult<PathBuf> {
        self.saved.lock().unwrap().push(SavedCapture {
            destination: destination.to_string(),
            name: name.to_string(),
            content: content.render(),
        });
        Ok(PathBuf::from(destination.as_str()).join(name))
    }
}

/// Capture store whose saves always fail
pub struct FailingCaptureStore;

impl CaptureStore for FailingCaptureStore {
    fn destination_for(&self, command: &str) -> Destination {
        Destination::new(format!("/read-only/{}", sanitize_command_name(command)))
    }

    fn save(&self, destination: &Destination, name: &str, _content: &CaptureContent) -> SerialShResult<PathBuf> {
        Err(SerialShError::persistence(
            PathBuf::from(destination.as_str()).join(name),
            "read-only file system",
        ))
    }
}
