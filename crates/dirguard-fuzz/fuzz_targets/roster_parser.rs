#![no_main]
use dirguard_core::roster::Roster;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok((roster, _warnings)) = Roster::from_csv_reader(data) {
        for record in roster.records() {
            assert!(!record.directory.ends_with('/'));
            assert_eq!(roster.allowed_dir(&record.username), Some(record.directory.as_str()));
        }
    }
});
