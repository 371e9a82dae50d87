//! Prompt detection heuristic.
//!
//! A line whose trimmed form ends in one of the marker strings is taken as
//! "the remote is idle and waiting for input". Command output that happens
//! to end in a marker (`a > b`, `cost: 5$`) is a false positive and ends the
//! capture early; that limitation is kept as-is.

use serde::{Deserialize, Serialize};

/// Set of trailing markers that signal a shell prompt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptMarkers {
    markers: Vec<String>,
}

impl PromptMarkers {
    /// Build from arbitrary markers; empty entries are ignored
    pub fn new<I, S>(markers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            markers: markers
                .into_iter()
                .map(Into::into)
                .filter(|m: &String| !m.is_empty())
                .collect(),
        }
    }

    pub fn markers(&self) -> &[String] {
        &self.markers
    }

    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }

    /// True when `line`, with surrounding whitespace removed, ends with a marker
    pub fn is_prompt(&self, line: &str) -> bool {
        let trimmed = line.trim();
        self.markers.iter().any(|marker| trimmed.ends_with(marker.as_str()))
    }
}

impl Default for PromptMarkers {
    fn default() -> Self {
        Self::new(["$", "#", ">"])
    }
}
