#![no_main]

use depdiscover_sbom_scanner::{ConanfileParser, ManifestParser};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(content) = std::str::from_utf8(data) {
        let _ = ConanfileParser.parse(content, "fuzz/conanfile.txt");
    }
});
