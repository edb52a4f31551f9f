//! Classification verdicts and the serialized check result record

use crate::error::{Error, Result};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeSet;
use std::path::Path;

/// Outcome of checking one pull request against the directory policy.
///
/// Every variant other than [`Verdict::Approved`] is an expected business
/// outcome that downstream glue reports to the author.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// All files are inside one task directory of the allowed directory
    Approved,
    /// Files outside the allowed directory, in input order
    OutsideAllowedDirectory(Vec<String>),
    /// The PR author has no roster entry
    UnmappedAuthor,
    /// Two or more distinct task directories were touched
    MultipleTasks(BTreeSet<String>),
    /// Files inside the allowed directory but outside any task directory
    NonTaskFiles(Vec<String>),
}

/// Fieldless verdict tag, carrying the exit code convention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum VerdictKind {
    /// `0`
    Approved = 0,
    /// `2`
    OutsideAllowedDirectory = 2,
    /// `3`
    UnmappedAuthor = 3,
    /// `4`
    MultipleTasks = 4,
    /// `5`
    NonTaskFiles = 5,
}

impl VerdictKind {
    /// Parse from a process exit code
    #[inline]
    pub const fn from_exit_code(code: i32) -> Option<Self> {
        match code {
            0 => Some(Self::Approved),
            2 => Some(Self::OutsideAllowedDirectory),
            3 => Some(Self::UnmappedAuthor),
            4 => Some(Self::MultipleTasks),
            5 => Some(Self::NonTaskFiles),
            _ => None,
        }
    }

    /// Exit code for this verdict
    #[inline]
    pub const fn exit_code(self) -> i32 {
        self as i32
    }

    /// Stable snake_case name
    #[inline]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Approved => "approved",
            Self::OutsideAllowedDirectory => "outside_allowed_directory",
            Self::UnmappedAuthor => "unmapped_author",
            Self::MultipleTasks => "multiple_tasks",
            Self::NonTaskFiles => "non_task_files",
        }
    }
}

impl Verdict {
    /// Tag of this verdict
    pub const fn kind(&self) -> VerdictKind {
        match self {
            Verdict::Approved => VerdictKind::Approved,
            Verdict::OutsideAllowedDirectory(_) => VerdictKind::OutsideAllowedDirectory,
            Verdict::UnmappedAuthor => VerdictKind::UnmappedAuthor,
            Verdict::MultipleTasks(_) => VerdictKind::MultipleTasks,
            Verdict::NonTaskFiles(_) => VerdictKind::NonTaskFiles,
        }
    }

    /// Exit code for this verdict
    #[inline]
    pub const fn exit_code(&self) -> i32 {
        self.kind().exit_code()
    }

    /// `true` only for [`Verdict::Approved`]
    #[inline]
    pub const fn is_approved(&self) -> bool {
        matches!(self, Verdict::Approved)
    }
}

fn default_exit_code() -> i32 {
    1
}

fn unknown() -> String {
    "unknown".to_string()
}

/// Accept `2` as well as `"2"` for the exit code.
fn lenient_exit_code<'de, D>(deserializer: D) -> std::result::Result<i32, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Code {
        Int(i64),
        Text(String),
    }

    match Code::deserialize(deserializer)? {
        Code::Int(n) => i32::try_from(n).map_err(serde::de::Error::custom),
        Code::Text(s) => s.trim().parse().map_err(serde::de::Error::custom),
    }
}

/// Serialized verdict consumed by the notification commands
/// (`.github/check_result.json`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckResult {
    /// Verdict exit code
    #[serde(default = "default_exit_code", deserialize_with = "lenient_exit_code")]
    pub exit_code: i32,
    /// PR author login
    #[serde(default = "unknown")]
    pub author: String,
    /// Allowed directory of the author, `null` when unmapped
    #[serde(default)]
    pub allowed: Option<String>,
    /// Files outside the allowed directory
    #[serde(default)]
    pub violations: Vec<String>,
    /// Files inside the allowed directory but outside any task directory
    #[serde(default)]
    pub non_task_files: Vec<String>,
    /// Task directories touched (sorted)
    #[serde(default)]
    pub tasks: Vec<String>,
}

impl CheckResult {
    /// Build the record for a verdict
    pub fn from_verdict(author: &str, allowed: Option<&str>, verdict: &Verdict) -> Self {
        let mut result = Self {
            exit_code: verdict.exit_code(),
            author: author.to_string(),
            allowed: allowed.map(str::to_string),
            violations: Vec::new(),
            non_task_files: Vec::new(),
            tasks: Vec::new(),
        };
        match verdict {
            Verdict::OutsideAllowedDirectory(files) => result.violations = files.clone(),
            Verdict::NonTaskFiles(files) => result.non_task_files = files.clone(),
            Verdict::MultipleTasks(tasks) => result.tasks = tasks.iter().cloned().collect(),
            Verdict::Approved | Verdict::UnmappedAuthor => {}
        }
        result
    }

    /// Verdict tag, if the exit code is one of the known ones
    #[inline]
    pub fn kind(&self) -> Option<VerdictKind> {
        VerdictKind::from_exit_code(self.exit_code)
    }

    /// Allowed directory or `"unknown"`
    pub fn allowed_or_unknown(&self) -> &str {
        self.allowed.as_deref().unwrap_or("unknown")
    }

    /// Parse from JSON text
    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Load from disk. A missing file is `Ok(None)`.
    pub fn load(path: &Path) -> Result<Option<Self>> {
        match std::fs::read_to_string(path) {
            Ok(text) => Self::from_json(&text).map(Some),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(Error::Io(e)),
        }
    }

    /// Write pretty JSON, creating parent directories
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}
