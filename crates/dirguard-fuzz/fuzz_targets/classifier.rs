#![no_main]
use dirguard_core::policy::{classify_for_dir, place, Placement, Verdict};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        // First line is the allowed directory, the rest are changed paths
        let mut lines = s.lines();
        let Some(allowed) = lines.next() else {
            return;
        };
        let files: Vec<&str> = lines.collect();

        let verdict = classify_for_dir(&files, allowed);
        let outside = files
            .iter()
            .filter(|f| place(f, allowed) == Placement::Outside)
            .count();
        match verdict {
            Verdict::OutsideAllowedDirectory(v) => assert_eq!(v.len(), outside),
            _ => assert_eq!(outside, 0),
        }
    }
});
