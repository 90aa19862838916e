#![no_main]

use depdiscover_sbom_scanner::{CmakeLibsParser, ManifestParser};
use libfuzzer_sys::fuzz_target;

// 존재하지 않는 빌드 디렉토리: 메타데이터 탐색은 항상 빈 결과
fuzz_target!(|data: &[u8]| {
    if let Ok(content) = std::str::from_utf8(data) {
        let _ = CmakeLibsParser.parse(content, "/nonexistent/fuzz/libs.txt");
    }
});
