//! # dirguard core
//!
//! Directory policy checks and GitHub glue for course repositories where
//! every student submits work under `students/<Name>/task_NN/`.
//!
//! - [`policy`] classifies the changed files of a pull request against the
//!   author's allowed directory (a pure function over a [`roster::Roster`]).
//! - [`notify`] turns a stored [`policy::CheckResult`] into labels, comments,
//!   closed PRs and tracking issues.
//! - [`prompt`] and [`review`] prepare a grading prompt and run it through
//!   GitHub Models.
//! - [`table`] renders the roster into the course README.
//!
//! ## Example
//!
//! ```
//! use dirguard_core::policy::{classify, Verdict};
//! use dirguard_core::roster::Roster;
//!
//! let (roster, _warnings) =
//!     Roster::from_csv_str("Github Username,Directory\nalice,./students/Alice\n").unwrap();
//! let verdict = classify("alice", &["students/Alice/task_01/index.html"], &roster);
//! assert_eq!(verdict, Verdict::Approved);
//! ```

#![warn(missing_docs, rust_2018_idioms)]

pub mod check;
pub mod error;
pub mod git;
pub mod http;
pub mod notify;
pub mod output;
pub mod platform;
pub mod policy;
pub mod prompt;
pub mod review;
pub mod roster;
pub mod table;
pub mod types;

pub use check::{check_files, check_pull_request, CheckReport};
pub use error::{Error, ErrorKind, Result};
pub use http::{GitHubApiClient, ModelsClient};
pub use policy::{classify, CheckResult, Verdict, VerdictKind};
pub use roster::{Roster, RosterWarning, StudentRecord};
pub use types::RepoSlug;

#[cfg(test)]
mod tests {
    #[test]
    fn test_library_version() {
        let _ = env!("CARGO_PKG_VERSION");
    }
}
