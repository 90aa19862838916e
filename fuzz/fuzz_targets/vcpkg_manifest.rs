#![no_main]

use depdiscover_sbom_scanner::{ManifestParser, VcpkgManifestParser};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(content) = std::str::from_utf8(data) {
        let _ = VcpkgManifestParser.parse(content, "fuzz/vcpkg.json");
    }
});
