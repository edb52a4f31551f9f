//! PR comment bodies posted for each rejection kind

use crate::policy::{CheckResult, VerdictKind};

/// Hidden marker identifying the bot's own comment
pub const COMMENT_MARKER: &str = "<!-- student-dir-checker -->";

/// Most tasks listed in a multi-task comment
pub const MAX_LISTED_TASKS: usize = 10;

/// Most files listed in a directory comment
pub const MAX_LISTED_FILES: usize = 20;

fn unmapped_author(author: &str) -> String {
    format!(
        "⚠️ Невозможно сопоставить пользователя **{}** с `students/students.csv`. \
         Пожалуйста, проверьте вручную.",
        author
    )
}

fn multiple_tasks(tasks: &[String]) -> String {
    let listed = tasks
        .iter()
        .take(MAX_LISTED_TASKS)
        .map(|t| format!("`{}`", t))
        .collect::<Vec<_>>()
        .join(", ");
    let listed = if listed.is_empty() { "—".to_string() } else { listed };

    format!(
        "⚠️ В одном pull request обнаружены изменения сразу по нескольким заданиям: {}.\n\n\
         Пожалуйста, разделите каждое задание в отдельный PR (например, task_01 — один PR, \
         task_02 — другой).",
        listed
    )
}

fn wrong_directory(allowed: &str, files: &[String]) -> String {
    let listed = files
        .iter()
        .take(MAX_LISTED_FILES)
        .map(|f| format!("- {}", f))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "⚠️ Обнаружены изменения вне вашей разрешённой директории.\n\n\
         Разрешённая директория: **{}**\n\n\
         Изменённые файлы, которые нужно перенести:\n{}\n\n\
         Инструкция: перенесите ваши файлы в указанную папку students/NameLatin/task_xx/ и \
         создайте новый PR. Если вы считаете, что изменения вне папки обоснованы, ответьте на \
         этот комментарий и преподаватель рассмотрит ваш случай.",
        allowed, listed
    )
}

/// Comment body (without marker) for a rejected result, `None` for any other
pub fn rejection_body(result: &CheckResult) -> Option<String> {
    match result.kind()? {
        VerdictKind::Approved => None,
        VerdictKind::UnmappedAuthor => Some(unmapped_author(&result.author)),
        VerdictKind::MultipleTasks => Some(multiple_tasks(&result.tasks)),
        VerdictKind::OutsideAllowedDirectory => Some(wrong_directory(
            result.allowed_or_unknown(),
            &result.violations,
        )),
        VerdictKind::NonTaskFiles => Some(wrong_directory(
            result.allowed_or_unknown(),
            &result.non_task_files,
        )),
    }
}

/// Prefix a body with [`COMMENT_MARKER`]
pub fn with_marker(body: &str) -> String {
    format!("{}\n{}", COMMENT_MARKER, body)
}

/// Title of the tracking issue opened on approval
pub fn tracking_issue_title(student: &str, task_label: &str) -> String {
    format!("[LABS][{}][{}]", student, task_label)
}

/// Body of the tracking issue opened on approval
pub fn tracking_issue_body(student: &str, task_label: &str) -> String {
    format!(
        "NameLatin = {}\n\ntaskN = {}\n\n(Auto-created by CI on directory approval)",
        student, task_label
    )
}

/// PR comment pointing at the tracking issue
pub fn tracking_issue_comment(issue_number: u64, title: &str) -> String {
    format!(
        "Created tracking issue #{} for AI check: {}",
        issue_number, title
    )
}
