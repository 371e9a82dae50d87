use crate::domain::error::SerialShResult;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::path::PathBuf;

/// Where the artifacts of one command invocation are stored
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Destination(String);

impl Destination {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Text or ordered lines to persist
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureContent {
    /// Written verbatim
    Text(String),
    /// Each line written with a trailing newline
    Lines(Vec<String>),
}

impl CaptureContent {
    pub fn render(&self) -> String {
        match self {
            CaptureContent::Text(text) => text.clone(),
            CaptureContent::Lines(lines) => lines.iter().map(|l| format!("{}\n", l)).collect(),
        }
    }
}

/// Durable storage for captured output.
pub trait CaptureStore: Send + Sync {
    /// Name a fresh destination for one invocation of `command`.
    ///
    /// Two calls never share a destination.
    fn destination_for(&self, command: &str) -> Destination;

    /// Store `content` as `name` under `destination`, returning its location
    fn save(
        &self,
        destination: &Destination,
        name: &str,
        content: &CaptureContent,
    ) -> SerialShResult<PathBuf>;
}

/// Folder-safe name from the first word of a command.
///
/// ASCII letters, digits, `-`, `_` and `.` survive, everything else
/// becomes `_`.
pub fn sanitize_command_name(command: &str) -> String {
    match command.split_whitespace().next() {
        Some(word) => sanitize(word),
        None => "command".to_string(),
    }
}

/// File names for classification buckets, one per label in order.
///
/// Every word of a label is kept. Names that clash with `reserved` or with an
/// earlier bucket get a `_N` suffix.
pub fn bucket_file_names<'a>(
    labels: impl IntoIterator<Item = &'a str>,
    reserved: &[&str],
) -> Vec<String> {
    let mut taken: HashSet<String> = reserved.iter().map(|name| name.to_string()).collect();

    labels
        .into_iter()
        .map(|label| {
            let stem = match label.trim() {
                "" => "bucket".to_string(),
                trimmed => sanitize(trimmed),
            };
            let mut name = format!("{}.txt", stem);
            let mut n = 1;
            while taken.contains(&name) {
                name = format!("{}_{}.txt", stem, n);
                n += 1;
            }
            taken.insert(name.clone());
            name
        })
        .collect()
}

fn sanitize(text: &str) -> String {
    text.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect()
}
