//! AI review of a submission through GitHub Models
//!
//! Collects the text files of `students/<student>/<task>/`, appends them to
//! a prepared grading prompt and asks the model for a verdict. The answer, or
//! a JSON diagnostic on failure, is written to the output file.

use crate::error::{Error, Result};
use crate::http::ModelsClient;
use crate::policy::detect::normalize_task;
use serde::Serialize;
use std::cmp::Ordering;
use std::path::{Path, PathBuf};
use std::time::Instant;
use walkdir::{DirEntry, WalkDir};

/// Most files sent to the model
pub const MAX_FILES: usize = 50;

/// Per-file content limit, in characters
pub const MAX_CHARS_PER_FILE: usize = 15_000;

/// Longest error detail kept in a diagnostic, in characters
pub const MAX_DETAIL_CHARS: usize = 2_000;

const TEXT_EXTS: &[&str] = &[
    "txt", "md", "html", "css", "js", "ts", "tsx", "jsx", "json", "yml", "yaml", "xml", "ini",
    "cfg", "py", "java", "c", "cpp", "h", "hpp", "rs", "go", "sh", "bat", "ps1",
];

const IGNORE_EXTS: &[&str] = &[
    "png", "jpg", "jpeg", "gif", "svg", "webp", "avif", "zip", "rar", "7z", "pdf", "mp4", "mov",
    "avi", "mp3", "wav",
];

const IGNORE_DIRS: &[&str] = &["node_modules", "dist", "build", ".cache", ".git"];

const REMEDIATION: &str = "Remediation: The token used lacks the models permission. Create a \
    fine-grained PAT (or org secret) with \"models:read\" (and if required, \"models:write\") \
    scope, store it as GH_MODELS_TOKEN secret, and re-run. Alternatively, if using the default \
    GITHUB_TOKEN, ensure GitHub Models are enabled for this repository and workflow permissions \
    include models.";

/// Keep only `[A-Za-z0-9_-]`; an empty result is an error
pub fn sanitize_student(raw: &str) -> Result<String> {
    let clean: String = raw
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_' || *c == '-')
        .collect();
    if clean.is_empty() {
        return Err(Error::Config(format!(
            "invalid student name '{}' after sanitization",
            raw
        )));
    }
    Ok(clean)
}

/// One collected student file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StudentFile {
    /// POSIX path relative to the task folder
    pub name: String,
    /// UTF-8 content, truncated to [`MAX_CHARS_PER_FILE`]
    pub content: String,
}

enum FileClass {
    Text,
    Ignored,
    Probe,
}

fn classify_extension(path: &Path) -> FileClass {
    let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
        return FileClass::Probe;
    };
    let ext = ext.to_ascii_lowercase();
    if IGNORE_EXTS.contains(&ext.as_str()) {
        FileClass::Ignored
    } else if TEXT_EXTS.contains(&ext.as_str()) {
        FileClass::Text
    } else {
        FileClass::Probe
    }
}

fn truncate_chars(text: &str, limit: usize) -> &str {
    match text.char_indices().nth(limit) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Files sort before directories, then by name
fn files_first(a: &DirEntry, b: &DirEntry) -> Ordering {
    a.file_type()
        .is_dir()
        .cmp(&b.file_type().is_dir())
        .then_with(|| a.file_name().cmp(b.file_name()))
}

fn is_ignored_dir(entry: &DirEntry) -> bool {
    entry.depth() > 0
        && entry.file_type().is_dir()
        && entry
            .file_name()
            .to_str()
            .is_some_and(|name| IGNORE_DIRS.contains(&name))
}

/// Collect up to [`MAX_FILES`] text files under `base`.
///
/// Each directory lists its own files before descending into subdirectories,
/// in name order. Ignored directories and symlinks are not followed;
/// binary/media extensions and non-UTF-8 files are skipped. A missing `base`
/// yields an empty list.
pub fn collect_files(base: &Path) -> Result<Vec<StudentFile>> {
    let mut result = Vec::new();
    if !base.is_dir() {
        return Ok(result);
    }

    let walker = WalkDir::new(base)
        .follow_links(false)
        .sort_by(files_first)
        .into_iter()
        .filter_entry(|e| !is_ignored_dir(e));

    for entry in walker {
        let entry = entry.map_err(|e| Error::InvalidPath(format!("{}: {}", base.display(), e)))?;
        let path = entry.path();
        if !entry.file_type().is_file() || matches!(classify_extension(path), FileClass::Ignored) {
            continue;
        }

        let Ok(content) = std::fs::read_to_string(path) else {
            tracing::debug!(path = %path.display(), "skipping non-UTF-8 file");
            continue;
        };
        let name = path
            .strip_prefix(base)
            .map(|p| p.to_string_lossy().replace('\\', "/"))
            .unwrap_or_else(|_| path.to_string_lossy().into_owned());

        result.push(StudentFile {
            name,
            content: truncate_chars(&content, MAX_CHARS_PER_FILE).to_string(),
        });
        if result.len() >= MAX_FILES {
            break;
        }
    }
    Ok(result)
}

/// Prompt followed by every file as a `## name` block
pub fn combine_prompt(prompt: &str, files: &[StudentFile]) -> String {
    let blocks = files
        .iter()
        .map(|f| format!("## {}\n{}", f.name, f.content))
        .collect::<Vec<_>>()
        .join("\n\n");
    format!("{}\n\nStudent files (text only):\n{}", prompt, blocks)
}

/// Written instead of an answer when the model call fails
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Diagnostic {
    /// HTTP status
    pub status: u16,
    /// Error detail, truncated
    pub detail: String,
    /// Requested URL
    pub endpoint: String,
    /// Model name
    pub model: String,
    /// Number of files sent
    pub files_count: usize,
    /// Time until the error response
    pub latency_seconds: f64,
    /// Permission hint for 401/403
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remediation: Option<String>,
}

impl Diagnostic {
    fn render(&self) -> Result<String> {
        Ok(format!(
            "Error invoking model:\n{}",
            serde_json::to_string_pretty(self)?
        ))
    }
}

/// Inputs of one AI check
#[derive(Debug, Clone)]
pub struct AiCheckRequest {
    /// Repository checkout root
    pub root: PathBuf,
    /// Student folder name (sanitized before use)
    pub student: String,
    /// Raw task reference
    pub task: String,
    /// Prepared prompt file
    pub prompt_file: PathBuf,
    /// Where the answer or diagnostic goes
    pub out: PathBuf,
    /// Model name
    pub model: String,
}

/// Result of [`run_ai_check`]
#[derive(Debug, Clone, PartialEq)]
pub enum AiCheckOutcome {
    /// The answer was written
    Answered {
        /// Files sent with the prompt
        files_count: usize,
    },
    /// The model API answered with an error; a diagnostic was written
    Rejected(Diagnostic),
    /// The call itself failed; the error text was written
    Unreachable(String),
}

impl AiCheckOutcome {
    /// `true` when an answer was written
    pub fn is_success(&self) -> bool {
        matches!(self, AiCheckOutcome::Answered { .. })
    }
}

/// Run the whole check and write `request.out`
pub async fn run_ai_check(client: &ModelsClient, request: &AiCheckRequest) -> Result<AiCheckOutcome> {
    let student = sanitize_student(&request.student)?;
    let task = normalize_task(&request.task)?;

    if !request.prompt_file.exists() {
        return Err(Error::Config(format!(
            "prompt file not found: {}",
            request.prompt_file.display()
        )));
    }
    let prompt = std::fs::read_to_string(&request.prompt_file)?;

    let base = request.root.join("students").join(&student).join(&task);
    let files = collect_files(&base)?;
    if files.is_empty() {
        tracing::warn!("no files collected under students/{}/{}", student, task);
    } else {
        let shown: Vec<&str> = files.iter().take(5).map(|f| f.name.as_str()).collect();
        tracing::debug!(count = files.len(), first = ?shown, "collected files");
    }

    let combined = combine_prompt(&prompt, &files);
    tracing::info!(
        model = %request.model,
        files = files.len(),
        chars = combined.chars().count(),
        "calling model"
    );

    let started = Instant::now();
    let outcome = match client.chat_completion(&request.model, &combined).await {
        Ok(answer) => {
            std::fs::write(&request.out, &answer)?;
            tracing::info!(chars = answer.chars().count(), "wrote AI response");
            AiCheckOutcome::Answered {
                files_count: files.len(),
            }
        }
        Err(Error::Api { status, message }) => {
            let diagnostic = Diagnostic {
                status,
                detail: truncate_chars(&message, MAX_DETAIL_CHARS).to_string(),
                endpoint: client.completions_url(),
                model: request.model.clone(),
                files_count: files.len(),
                latency_seconds: started.elapsed().as_secs_f64(),
                remediation: matches!(status, 401 | 403).then(|| REMEDIATION.to_string()),
            };
            std::fs::write(&request.out, diagnostic.render()?)?;
            tracing::warn!(status, "model API returned an error");
            AiCheckOutcome::Rejected(diagnostic)
        }
        Err(e) => {
            let text = format!("Error calling models API: {}", e.message());
            std::fs::write(&request.out, &text)?;
            tracing::warn!("{}", text);
            AiCheckOutcome::Unreachable(text)
        }
    };
    Ok(outcome)
}
