//! 메트릭 이름 상수
//!
//! 스캐너가 기록하는 카운터와 히스토그램의 이름을 중앙에서 정의합니다.
//! 레코더가 설치되지 않은 경우 `metrics::counter!()` 호출은 아무 동작도 하지 않습니다.
//!
//! # 네이밍 컨벤션
//!
//! - 접두어: `depdiscover_`
//! - 단계명: `elf_`, `correlate_`, `enrich_`
//! - 접미어: `_total` (counter), `_seconds` (histogram)
//!
//! # 사용 예시
//!
//! ```ignore
//! use metrics::counter;
//!
//! counter!(depdiscover_core::metrics::ELF_BINARIES_SCANNED_TOTAL).increment(1);
//! ```

// ─── 레이블 키 상수 ────────────────────────────────────────────────

/// 매니페스트 종류 레이블 키 (vcpkg, conan, cmake_target)
pub const LABEL_MANIFEST_KIND: &str = "kind";

/// 결과 레이블 키 (success, failure)
pub const LABEL_RESULT: &str = "result";

// ─── ELF 스캐너 메트릭 ─────────────────────────────────────────────

/// 스캔한 바이너리 수 (counter, label: result)
pub const ELF_BINARIES_SCANNED_TOTAL: &str = "depdiscover_elf_binaries_scanned_total";

/// 추출한 needed 라이브러리 수 (counter)
pub const ELF_LIBRARIES_EXTRACTED_TOTAL: &str = "depdiscover_elf_libraries_extracted_total";

// ─── 상관 분석 메트릭 ──────────────────────────────────────────────

/// 선언된 의존성 수 (counter, label: kind)
pub const CORRELATE_DECLARED_TOTAL: &str = "depdiscover_correlate_declared_total";

/// 의존성에 귀속된 헤더 수 (counter)
pub const CORRELATE_HEADERS_ATTRIBUTED_TOTAL: &str =
    "depdiscover_correlate_headers_attributed_total";

/// 의존성에 귀속된 라이브러리 수 (counter)
pub const CORRELATE_LIBRARIES_ATTRIBUTED_TOTAL: &str =
    "depdiscover_correlate_libraries_attributed_total";

/// 생성된 합성 시스템 의존성 수 (counter)
pub const CORRELATE_SYNTHETIC_TOTAL: &str = "depdiscover_correlate_synthetic_total";

// ─── 보강 메트릭 ───────────────────────────────────────────────────

/// 발견된 CVE 수 (counter)
pub const ENRICH_CVES_FOUND_TOTAL: &str = "depdiscover_enrich_cves_found_total";

/// 완료된 스캔 수 (counter)
pub const SCANS_COMPLETED_TOTAL: &str = "depdiscover_scans_completed_total";

/// 스캔 소요 시간 (histogram, 초)
pub const SCAN_DURATION_SECONDS: &str = "depdiscover_scan_duration_seconds";

/// 등록된 모든 메트릭 이름
pub const ALL_METRIC_NAMES: [&str; 9] = [
    ELF_BINARIES_SCANNED_TOTAL,
    ELF_LIBRARIES_EXTRACTED_TOTAL,
    CORRELATE_DECLARED_TOTAL,
    CORRELATE_HEADERS_ATTRIBUTED_TOTAL,
    CORRELATE_LIBRARIES_ATTRIBUTED_TOTAL,
    CORRELATE_SYNTHETIC_TOTAL,
    ENRICH_CVES_FOUND_TOTAL,
    SCANS_COMPLETED_TOTAL,
    SCAN_DURATION_SECONDS,
];
