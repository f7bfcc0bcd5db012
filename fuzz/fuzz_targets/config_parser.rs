#![no_main]

use libfuzzer_sys::fuzz_target;
use safety_gate::config_loader::{parse, ConfigFormat};

fuzz_target!(|data: &[u8]| {
    if let Ok(input) = std::str::from_utf8(data) {
        // Both formats must reject bad input with an error, never a panic
        let _ = parse(input, ConfigFormat::Toml);
        let _ = parse(input, ConfigFormat::Yaml);
    }
});
