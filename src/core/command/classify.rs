//! Line classification of captured output.

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::LazyLock;

/// Boot-time anchor of a kernel log: the `[    0.000000]` timestamp
static BOOT_TIME_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\[\s*0\.000000\]").expect("boot time pattern is valid"));

/// A single line matcher, resolved once before the match loop
#[derive(Debug, Clone)]
pub enum LinePattern {
    /// Case-insensitive substring
    Literal(String),
    /// Regular expression, used as given
    Regex(Regex),
}

impl LinePattern {
    pub fn literal(text: impl Into<String>) -> Self {
        Self::Literal(text.into().to_lowercase())
    }

    /// Compile `pattern` case-insensitively
    pub fn regex(pattern: &str) -> Result<Self, regex::Error> {
        RegexBuilder::new(pattern)
            .case_insensitive(true)
            .build()
            .map(Self::Regex)
    }

    pub fn is_match(&self, line: &str) -> bool {
        match self {
            LinePattern::Literal(needle) => line.to_lowercase().contains(needle.as_str()),
            LinePattern::Regex(regex) => regex.is_match(line),
        }
    }
}

impl From<Regex> for LinePattern {
    fn from(regex: Regex) -> Self {
        Self::Regex(regex)
    }
}

/// Ordered label to pattern mapping
#[derive(Debug, Clone, Default)]
pub struct PatternSet {
    patterns: Vec<(String, LinePattern)>,
}

impl PatternSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, label: impl Into<String>, pattern: LinePattern) -> Self {
        self.insert(label, pattern);
        self
    }

    /// Add or replace the pattern for `label`
    pub fn insert(&mut self, label: impl Into<String>, pattern: LinePattern) {
        let label = label.into();
        match self.patterns.iter_mut().find(|(l, _)| *l == label) {
            Some(entry) => entry.1 = pattern,
            None => self.patterns.push((label, pattern)),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.patterns.iter().map(|(label, _)| label.as_str())
    }

    /// Bucket every line of `output` under each label it matches.
    ///
    /// All labels are present in the result; lines are stored trimmed and a
    /// line may land in several buckets.
    pub fn classify(&self, output: &str) -> HashMap<String, Vec<String>> {
        let mut buckets: HashMap<String, Vec<String>> = self
            .patterns
            .iter()
            .map(|(label, _)| (label.clone(), Vec::new()))
            .collect();

        for line in output.lines() {
            for (label, pattern) in &self.patterns {
                if pattern.is_match(line) {
                    if let Some(bucket) = buckets.get_mut(label) {
                        bucket.push(line.trim().to_string());
                    }
                }
            }
        }

        buckets
    }
}

/// Buckets extracted from `dmesg`-style output
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KernelLogSummary {
    /// First line stamped at time zero
    pub boot_time: Option<String>,
    pub warnings: Vec<String>,
    pub errors: Vec<String>,
}

impl KernelLogSummary {
    pub fn parse(output: &str) -> Self {
        let mut summary = Self::default();

        for line in output.lines() {
            let lower = line.to_lowercase();
            if summary.boot_time.is_none() && BOOT_TIME_PATTERN.is_match(line) {
                summary.boot_time = Some(line.trim().to_string());
            }
            if lower.contains("warning") {
                summary.warnings.push(line.trim().to_string());
            }
            if lower.contains("error") {
                summary.errors.push(line.trim().to_string());
            }
        }

        summary
    }
}
