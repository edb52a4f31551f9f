//! Directory policy classifier
//!
//! Decides whether the files changed by a pull request stay inside the
//! author's allowed directory and inside exactly one `task_NN` folder.
//!
//! Precedence of [`classify`] (first match wins):
//!
//! 1. author not in roster -> [`Verdict::UnmappedAuthor`]
//! 2. any file outside the allowed directory -> [`Verdict::OutsideAllowedDirectory`]
//! 3. more than one task directory -> [`Verdict::MultipleTasks`]
//! 4. any file inside the allowed directory but outside a task -> [`Verdict::NonTaskFiles`]
//! 5. otherwise [`Verdict::Approved`]

use super::task_dir::TaskDir;
use super::verdict::Verdict;
use crate::platform::PathUtil;
use crate::roster::Roster;
use std::collections::BTreeSet;
use std::fmt;

/// The PR author has no roster entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnmappedAuthor {
    /// Username that failed to resolve
    pub username: String,
}

impl fmt::Display for UnmappedAuthor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "user '{}' is not mapped in the roster", self.username)
    }
}

impl std::error::Error for UnmappedAuthor {}

/// Where a changed path lies relative to an allowed directory
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement<'a> {
    /// Not under the allowed directory
    Outside,
    /// Exactly the allowed directory itself
    AllowedRoot,
    /// Under a `task_NN` directory directly below the allowed directory
    InTask(TaskDir<'a>),
    /// Under the allowed directory but not inside a task directory
    NonTask,
}

/// Place one path relative to `allowed`.
///
/// Only the first segment below the prefix is inspected: a path whose first
/// segment parses as `task_NN` is a task entry, whatever follows it.
pub fn place<'a>(path: &'a str, allowed: &str) -> Placement<'a> {
    if path == allowed {
        return Placement::AllowedRoot;
    }
    let Some(rest) = PathUtil::strip_dir(path, allowed) else {
        return Placement::Outside;
    };
    let segment = rest.split('/').next().unwrap_or_default();
    match TaskDir::parse(segment) {
        Some(task) => Placement::InTask(task),
        None => Placement::NonTask,
    }
}

/// Look up the allowed directory of `username`
pub fn resolve_author<'r>(
    username: &str,
    roster: &'r Roster,
) -> std::result::Result<&'r str, UnmappedAuthor> {
    roster.allowed_dir(username).ok_or_else(|| UnmappedAuthor {
        username: username.to_string(),
    })
}

/// Distinct task directory names touched under `allowed`
pub fn collect_task_dirs<'a, S: AsRef<str>>(files: &'a [S], allowed: &str) -> BTreeSet<&'a str> {
    files
        .iter()
        .filter_map(|f| match place(f.as_ref(), allowed) {
            Placement::InTask(task) => Some(task.as_str()),
            _ => None,
        })
        .collect()
}

/// Paths outside `allowed`, in input order
pub fn find_violations<'a, S: AsRef<str>>(files: &'a [S], allowed: &str) -> Vec<&'a str> {
    files
        .iter()
        .map(AsRef::as_ref)
        .filter(|f| place(f, allowed) == Placement::Outside)
        .collect()
}

/// Paths inside `allowed` but outside any task directory, in input order
pub fn find_non_task_files<'a, S: AsRef<str>>(files: &'a [S], allowed: &str) -> Vec<&'a str> {
    files
        .iter()
        .map(AsRef::as_ref)
        .filter(|f| place(f, allowed) == Placement::NonTask)
        .collect()
}

/// Classify the changed files of one pull request
pub fn classify<S: AsRef<str>>(username: &str, files: &[S], roster: &Roster) -> Verdict {
    let allowed = match resolve_author(username, roster) {
        Ok(dir) => dir,
        Err(unmapped) => {
            tracing::debug!("{}", unmapped);
            return Verdict::UnmappedAuthor;
        }
    };
    classify_for_dir(files, allowed)
}

/// Classify against an already resolved allowed directory (steps 2-5)
pub fn classify_for_dir<S: AsRef<str>>(files: &[S], allowed: &str) -> Verdict {
    let violations = find_violations(files, allowed);
    if !violations.is_empty() {
        return Verdict::OutsideAllowedDirectory(to_owned(violations));
    }

    let tasks = collect_task_dirs(files, allowed);
    if tasks.len() > 1 {
        return Verdict::MultipleTasks(tasks.into_iter().map(str::to_string).collect());
    }

    let non_task = find_non_task_files(files, allowed);
    if !non_task.is_empty() {
        return Verdict::NonTaskFiles(to_owned(non_task));
    }

    Verdict::Approved
}

fn to_owned(paths: Vec<&str>) -> Vec<String> {
    paths.into_iter().map(str::to_string).collect()
}
