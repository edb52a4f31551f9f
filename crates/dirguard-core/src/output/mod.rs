//! Step outputs and formatting

pub mod json_format;
pub mod writer;

use crate::policy::CheckResult;
pub use json_format::{format_json_array, safe_output_escape};
pub use writer::{append_outputs, format_outputs, OutputValue};

/// Step outputs describing a check result
pub fn check_outputs(result: &CheckResult) -> Vec<(&'static str, OutputValue)> {
    let verdict = result.kind().map(|k| k.as_str()).unwrap_or("error");
    vec![
        ("exit_code", OutputValue::Line(result.exit_code.to_string())),
        ("verdict", OutputValue::Line(verdict.to_string())),
        ("approved", OutputValue::Line((result.exit_code == 0).to_string())),
        ("author", OutputValue::Line(result.author.clone())),
        ("allowed", OutputValue::Line(result.allowed_or_unknown().to_string())),
        ("violations", OutputValue::Block(format_json_array(&result.violations))),
        ("non_task_files", OutputValue::Block(format_json_array(&result.non_task_files))),
        ("tasks", OutputValue::Block(format_json_array(&result.tasks))),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::Verdict;

    #[test]
    fn test_check_outputs() {
        let result = CheckResult::from_verdict(
            "alice",
            Some("students/Alice"),
            &Verdict::OutsideAllowedDirectory(vec!["README.md".into()]),
        );
        let text = format_outputs(&check_outputs(&result));
        assert!(text.contains("exit_code=2\n"));
        assert!(text.contains("verdict=outside_allowed_directory\n"));
        assert!(text.contains("approved=false\n"));
        assert!(text.contains("violations<<DIRGUARD_EOF\n[\"README.md\"]\nDIRGUARD_EOF\n"));
    }
}
