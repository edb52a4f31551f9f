//! Student directory policy: path classification and verdicts

pub mod classifier;
pub mod detect;
pub mod task_dir;
pub mod verdict;

pub use classifier::{
    classify, classify_for_dir, collect_task_dirs, find_non_task_files, find_violations, place,
    resolve_author, Placement, UnmappedAuthor,
};
pub use task_dir::TaskDir;
pub use verdict::{CheckResult, Verdict, VerdictKind};
