#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &str| {
    // Malformed input must surface as collected Vec<LayoutParseError>, never panic.
    if let Ok(rows) = skin_config::load_layout(std::io::Cursor::new(data)) {
        let _ = skin_core::layout::Layout::load(&rows);
    }
});
