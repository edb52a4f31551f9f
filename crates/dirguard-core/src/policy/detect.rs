//! Student/task detection from changed paths
//!
//! These are looser than the classifier: they run after a verdict (or
//! without one) to name the submission in issue titles and prompts.

use crate::error::{Error, Result};
use crate::platform::PathUtil;
use regex::Regex;
use std::collections::BTreeSet;
use std::sync::OnceLock;

fn student_task_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^students/([^/]+)/((?:task_|Task_)(\d{1,2}))/").expect("static regex")
    })
}

fn any_task_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)task_\d{2}").expect("static regex"))
}

fn first_number(s: &str) -> Option<u32> {
    let start = s.find(|c: char| c.is_ascii_digit())?;
    let digits: String = s[start..].chars().take_while(char::is_ascii_digit).collect();
    digits.parse().ok()
}

/// Normalize a task reference (`task_1`, `Task_01`, `1`, `lab 3`) to `task_NN`.
pub fn normalize_task(raw: &str) -> Result<String> {
    let n = first_number(raw).ok_or_else(|| {
        Error::Prompt(format!(
            "invalid task name '{}', specify a number like 01 or task_01",
            raw
        ))
    })?;
    Ok(format!("task_{:02}", n))
}

/// Short task label for issue titles (`task_03` -> `task3`)
pub fn short_task_label(task: &str) -> String {
    match first_number(task) {
        Some(n) => format!("task{}", n),
        None => task.to_string(),
    }
}

/// Student folder and task folder for a success issue.
///
/// Looks for `students/<Name>/task_N[N]/...`. When no path matches, the
/// student falls back to the last segment of `fallback_allowed` and the task
/// to any `task_NN` found anywhere in the paths. Either side may be empty.
pub fn detect_student_and_task<S: AsRef<str>>(
    files: &[S],
    fallback_allowed: Option<&str>,
) -> (Option<String>, Option<String>) {
    let re = student_task_re();
    for f in files {
        if let Some(caps) = re.captures(f.as_ref()) {
            return (Some(caps[1].to_string()), Some(caps[2].to_string()));
        }
    }

    let student = fallback_allowed.and_then(|allowed| {
        let normalized = PathUtil::normalize_dir(allowed);
        let mut segments = normalized.split('/');
        match (segments.next(), segments.next()) {
            (Some("students"), Some(name)) if !name.is_empty() => Some(name.to_string()),
            _ => None,
        }
    });

    let task = files
        .iter()
        .find_map(|f| any_task_re().find(f.as_ref()).map(|m| m.as_str().to_string()));

    (student, task)
}

/// The single `(student, task_NN)` pair a PR submits.
///
/// Paths must look like `students/<student>/<segment-with-digits>/...`.
/// Anything else is ignored; zero or several pairs is an error.
pub fn detect_student_task<S: AsRef<str>>(paths: &[S]) -> Result<(String, String)> {
    let mut pairs: BTreeSet<(String, String)> = BTreeSet::new();
    for path in paths {
        let parts: Vec<&str> = path.as_ref().split('/').collect();
        if parts.len() < 3 || parts[0] != "students" {
            continue;
        }
        let Some(n) = first_number(parts[2]) else {
            continue;
        };
        pairs.insert((parts[1].to_string(), format!("task_{:02}", n)));
    }

    let mut iter = pairs.iter();
    match (iter.next(), iter.next()) {
        (None, _) => Err(Error::Prompt(
            "could not detect student/task from PR file list".to_string(),
        )),
        (Some(pair), None) => Ok(pair.clone()),
        (Some(_), Some(_)) => Err(Error::Prompt(format!(
            "multiple student/task combinations detected: {:?}",
            pairs
        ))),
    }
}
