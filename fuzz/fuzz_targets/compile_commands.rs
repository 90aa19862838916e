#![no_main]

use depdiscover_sbom_scanner::build::{extract_include_paths, parse_compile_commands, scan_includes};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(content) = std::str::from_utf8(data) else {
        return;
    };

    if let Ok(commands) = parse_compile_commands(content, "fuzz/compile_commands.json") {
        for command in &commands {
            let _ = extract_include_paths(&command.command);
        }
    }
    let _ = scan_includes(content);
});
