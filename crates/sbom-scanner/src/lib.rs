//! # depdiscover-sbom-scanner
//!
//! C/C++ 프로젝트의 선언 의존성(vcpkg, conan, CMake 링크 타깃)을 빌드 결과물에서 관찰한
//! 헤더, 공유 라이브러리와 연결하고 라이선스/취약점 정보를 붙여 리포트를 생성합니다.
//!
//! # Module Structure
//!
//! - [`error`]: 도메인 에러 (`SbomScannerError`)
//! - [`config`]: 스캐너 설정 (`SbomScannerConfig`, 빌더)
//! - [`types`]: 도메인 타입 (`Dependency`, `DependencyKind`, `Provenance`, `CveRecord`)
//! - [`parser`]: 매니페스트 파서 (`ManifestParser` trait, vcpkg, conan, libs.txt)
//! - [`build`]: compile_commands.json 기반 헤더 풀 수집 (`HeaderCollector`)
//! - [`lookup`]: 권위 있는 패키지 조회 (`AuthoritativeLookup`, pkg-config)
//! - [`correlate`]: 상관 분석 엔진 (`Correlator`, `MatchPolicy`, `merge_declared`)
//! - [`license`]: 라이선스 해석 (`LicenseResolver`)
//! - [`vuln`]: 로컬 취약점 DB 매칭 (`VulnDb`, `VulnMatcher`)
//! - [`enrich`]: 보강 단계 (`Enricher`)
//! - [`report`]: 고유 JSON / CycloneDX 리포트
//! - [`scanner`]: 오케스트레이터 (`DependencyScanner`, 빌더)
//!
//! # Architecture
//!
//! ```text
//! manifests ──> ManifestParser ──> merge_declared ──┐
//! compile_commands.json ──> HeaderCollector ────────┼──> Correlator ──> Enricher ──> report
//! binaries ──> depdiscover_elf ─────────────────────┘
//! ```
//!
//! # 사용 예시
//!
//! ```
//! use depdiscover_sbom_scanner::{Correlator, Dependency, DependencyKind, Provenance};
//!
//! let declared = vec![Dependency::declared("fmt", "10.1.1", DependencyKind::Vcpkg, Provenance::Manifest)];
//! let headers = vec!["/usr/include/fmt/core.h".to_owned(), "/usr/include/stdio.h".to_owned()];
//! let libraries = vec!["libfmt.so.9".to_owned(), "libz.so.1".to_owned()];
//!
//! let outcome = Correlator::legacy().correlate(declared, headers, libraries);
//! assert_eq!(outcome.dependencies[0].headers, vec!["/usr/include/fmt/core.h"]);
//! assert_eq!(outcome.dependencies[0].libraries, vec!["libfmt.so.9"]);
//! assert_eq!(outcome.dependencies[1].name, "libz.so.1");
//! assert_eq!(outcome.unattributed_headers, vec!["/usr/include/stdio.h"]);
//! ```

pub mod build;
pub mod config;
pub mod correlate;
pub mod enrich;
pub mod error;
pub mod license;
pub mod lookup;
pub mod parser;
pub mod report;
pub mod scanner;
pub mod types;
pub mod vuln;

// --- Public API Re-exports ---

// Scanner (main orchestrator)
pub use scanner::{DependencyScanner, DependencyScannerBuilder, ScanOutcome, SkippedInput};

// Configuration
pub use config::{SbomScannerConfig, SbomScannerConfigBuilder};

// Error
pub use error::SbomScannerError;

// Types
pub use types::{CveRecord, Dependency, DependencyKind, Provenance, ReportFormat};

// Parser
pub use parser::cmake_libs::CmakeLibsParser;
pub use parser::conan::ConanfileParser;
pub use parser::vcpkg::VcpkgManifestParser;
pub use parser::{ManifestDetector, ManifestParser};

// Correlation
pub use correlate::{
    CorrelationOutcome, Correlator, LegacyMatchPolicy, MatchPolicy, MatchPolicyKind,
    StrictMatchPolicy, merge_declared,
};
pub use lookup::{AuthoritativeLookup, NoLookup, PackageInfo, PkgConfigLookup, StaticLookup};

// Enrichment
pub use enrich::Enricher;
pub use license::{HeuristicLicenseResolver, LicenseResolver};
pub use vuln::db::{VersionRange, VulnDb, VulnDbEntry};
pub use vuln::{SeverityCounts, VulnMatcher, VulnerabilityResolver};

// Report
pub use report::{ReportContext, ReportDocument};
