//! Property-based tests for the directory classifier

use dirguard_core::policy::{classify, Verdict, VerdictKind};
use dirguard_core::roster::{Roster, StudentRecord};
use proptest::prelude::*;
use std::collections::BTreeSet;

const AUTHOR: &str = "student";
const ALLOWED: &str = "students/Student";

fn roster() -> Roster {
    std::iter::once(StudentRecord::new(AUTHOR, "./students/Student")).collect()
}

// Relative file path below a task directory
fn arb_tail() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-z0-9_-]{1,12}(/[a-z0-9_-]{1,12}){0,2}\\.(js|html|css|md)")
        .expect("valid regex")
}

fn arb_task() -> impl Strategy<Value = String> {
    (0u8..100).prop_map(|n| format!("task_{:02}", n))
}

// Paths under ALLOWED whose first segment is not a task directory
fn arb_non_task() -> impl Strategy<Value = String> {
    prop_oneof![
        arb_tail().prop_map(|t| format!("{}/docs/{}", ALLOWED, t)),
        "[a-z]{1,8}".prop_map(|n| format!("{}/readme_{}.md", ALLOWED, n)),
        arb_tail().prop_map(|t| format!("{}/tasks_01/{}", ALLOWED, t)),
    ]
}

// Paths that never lie under ALLOWED
fn arb_outside() -> impl Strategy<Value = String> {
    prop_oneof![
        arb_tail().prop_map(|t| format!("students/Other/{}", t)),
        arb_tail().prop_map(|t| format!("students/StudentX/task_01/{}", t)),
        arb_tail().prop_map(|t| format!(".github/{}", t)),
        Just("README.md".to_string()),
    ]
}

proptest! {
    #[test]
    fn test_single_task_is_approved(task in arb_task(), tails in prop::collection::vec(arb_tail(), 1..20)) {
        let files: Vec<String> = tails.iter().map(|t| format!("{}/{}/{}", ALLOWED, task, t)).collect();
        prop_assert_eq!(classify(AUTHOR, &files, &roster()), Verdict::Approved);
    }

    #[test]
    fn test_outside_files_are_reported_in_order(
        task in arb_task(),
        inside in prop::collection::vec(arb_tail(), 0..10),
        outside in prop::collection::vec(arb_outside(), 1..10),
    ) {
        let mut files: Vec<String> = inside.iter().map(|t| format!("{}/{}/{}", ALLOWED, task, t)).collect();
        files.extend(outside.iter().cloned());
        prop_assert_eq!(
            classify(AUTHOR, &files, &roster()),
            Verdict::OutsideAllowedDirectory(outside)
        );
    }

    #[test]
    fn test_unmapped_author_wins(
        author in "[a-z]{1,12}",
        files in prop::collection::vec(arb_outside(), 0..10),
    ) {
        prop_assume!(author != AUTHOR);
        prop_assert_eq!(classify(&author, &files, &roster()), Verdict::UnmappedAuthor);
    }

    #[test]
    fn test_two_distinct_tasks_are_rejected(a in 0u8..50, b in 50u8..100, tail in arb_tail()) {
        let files = vec![
            format!("{}/task_{:02}/{}", ALLOWED, a, tail),
            format!("{}/task_{:02}/{}", ALLOWED, b, tail),
        ];
        match classify(AUTHOR, &files, &roster()) {
            Verdict::MultipleTasks(tasks) => prop_assert_eq!(tasks.len(), 2),
            other => prop_assert!(false, "unexpected verdict {:?}", other),
        }
    }

    #[test]
    fn test_verdict_kind_ignores_order(
        files in prop::collection::vec(
            prop_oneof![
                arb_outside(),
                (arb_task(), arb_tail()).prop_map(|(k, t)| format!("{}/{}/{}", ALLOWED, k, t)),
                arb_tail().prop_map(|t| format!("{}/{}", ALLOWED, t)),
            ],
            0..15,
        ).prop_shuffle(),
    ) {
        let mut reversed = files.clone();
        reversed.reverse();
        let r = roster();
        prop_assert_eq!(classify(AUTHOR, &files, &r).kind(), classify(AUTHOR, &reversed, &r).kind());
    }

    #[test]
    fn test_non_task_files_are_reported_exactly(
        task in arb_task(),
        entries in prop::collection::vec(
            prop_oneof![
                arb_non_task().prop_map(|p| (true, p)),
                arb_tail().prop_map(|t| (false, t)),
            ],
            1..20,
        ),
    ) {
        prop_assume!(entries.iter().any(|(non_task, _)| *non_task));
        let files: Vec<String> = entries
            .iter()
            .map(|(non_task, p)| if *non_task { p.clone() } else { format!("{}/{}/{}", ALLOWED, task, p) })
            .collect();
        let expected: Vec<String> = entries
            .iter()
            .filter(|(non_task, _)| *non_task)
            .map(|(_, p)| p.clone())
            .collect();
        prop_assert_eq!(classify(AUTHOR, &files, &roster()), Verdict::NonTaskFiles(expected));
    }

    #[test]
    fn test_multiple_tasks_set_is_order_independent(
        files in prop::collection::vec(
            (arb_task(), arb_tail()).prop_map(|(k, t)| (k.clone(), format!("{}/{}/{}", ALLOWED, k, t))),
            2..20,
        ).prop_shuffle(),
    ) {
        let expected: BTreeSet<String> = files.iter().map(|(k, _)| k.clone()).collect();
        prop_assume!(expected.len() > 1);
        let paths: Vec<String> = files.into_iter().map(|(_, p)| p).collect();
        let mut reversed = paths.clone();
        reversed.reverse();

        let r = roster();
        prop_assert_eq!(classify(AUTHOR, &paths, &r), Verdict::MultipleTasks(expected.clone()));
        prop_assert_eq!(classify(AUTHOR, &reversed, &r), Verdict::MultipleTasks(expected));
    }

    #[test]
    fn test_classify_is_deterministic(
        author in prop_oneof![Just(AUTHOR.to_string()), "[a-z]{1,12}"],
        files in prop::collection::vec(
            prop_oneof![
                arb_outside(),
                arb_non_task(),
                (arb_task(), arb_tail()).prop_map(|(k, t)| format!("{}/{}/{}", ALLOWED, k, t)),
            ],
            0..15,
        ),
    ) {
        let r = roster();
        prop_assert_eq!(classify(&author, &files, &r), classify(&author, &files, &r));
    }

    #[test]
    fn test_exit_code_roundtrip(code in prop_oneof![Just(0), Just(2), Just(3), Just(4), Just(5)]) {
        let kind = VerdictKind::from_exit_code(code);
        prop_assert_eq!(kind.map(|k| k.exit_code()), Some(code));
    }
}
