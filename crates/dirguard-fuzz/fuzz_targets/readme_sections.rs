#![no_main]
use dirguard_core::prompt::{assemble_prompt, PromptInput};
use dirguard_core::table::render_table;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        let prompt = assemble_prompt(&PromptInput {
            student: "Fuzz",
            task: "task_01",
            variant: "1",
            readme: s,
            variants: s,
        });
        assert!(prompt.starts_with("[System message"));
        let _ = render_table(s);
    }
});
