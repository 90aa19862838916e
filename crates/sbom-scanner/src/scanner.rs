//! 스캔 오케스트레이터 -- 전체 파이프라인 관리
//!
//! [`DependencyScanner`]는 설정된 입력을 읽어 상관 분석과 보강까지 한 번에 수행합니다.
//!
//! # 내부 아키텍처
//!
//! ```text
//! vcpkg.json ─┬─ ManifestParser (이어 붙임) ──────┐
//! conanfile ──┘                                   │
//! libs.txt ───── ManifestParser ─ merge_declared ─┤
//! compile_commands.json ─ HeaderCollector ─────────┼─ Correlator ─ Enricher ─ ScanOutcome
//! binaries ─ scan_needed_libraries ────────────────┘
//! ```
//!
//! 개별 입력의 실패(파일 없음, 형식 오류, 읽기 실패)는 경고와 함께 건너뛰며
//! 스캔 전체를 중단하지 않습니다. 건너뛴 입력은 [`ScanOutcome::skipped`]에 남습니다.
//!
//! 모든 단계는 동기 I/O를 수행합니다. async 컨텍스트에서는 `spawn_blocking`으로 감싸세요.

use std::collections::BTreeSet;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use depdiscover_core::metrics as m;
use tracing::{debug, info, warn};

use crate::build::HeaderCollector;
use crate::config::SbomScannerConfig;
use crate::correlate::{Correlator, merge_declared};
use crate::enrich::Enricher;
use crate::error::SbomScannerError;
use crate::license::{HeuristicLicenseResolver, LicenseResolver};
use crate::lookup::{AuthoritativeLookup, NoLookup, PkgConfigLookup};
use crate::parser::ManifestDetector;
use crate::report::{ReportContext, ReportDocument, render};
use crate::types::{Dependency, DependencyKind, ReportFormat};
use crate::vuln::{SeverityCounts, VulnMatcher, VulnerabilityResolver};

/// 매니페스트 최대 크기 (10 MB)
const MAX_MANIFEST_SIZE: u64 = 10 * 1024 * 1024;

/// 건너뛴 입력
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedInput {
    /// 입력 경로
    pub path: String,
    /// 건너뛴 사유
    pub reason: String,
}

/// 스캔 결과
#[derive(Debug, Clone, Default)]
pub struct ScanOutcome {
    /// 선언 의존성(통합 순서) 뒤에 합성 시스템 의존성이 이어지는 목록
    pub dependencies: Vec<Dependency>,
    /// 귀속되지 않은 헤더
    pub unattributed_headers: Vec<String>,
    /// 병합 후 선언 의존성 수
    pub declared_count: usize,
    /// 헤더 풀 크기
    pub header_count: usize,
    /// 성공적으로 읽은 바이너리 수
    pub binaries_scanned: usize,
    /// 건너뛴 입력
    pub skipped: Vec<SkippedInput>,
    /// 소요 시간
    pub duration: Duration,
}

impl ScanOutcome {
    /// 합성 시스템 의존성 수
    pub fn synthetic_count(&self) -> usize {
        self.dependencies.iter().filter(|d| d.is_synthetic()).count()
    }

    /// 심각도별 취약점 집계
    pub fn severity_counts(&self) -> SeverityCounts {
        SeverityCounts::from_dependencies(&self.dependencies)
    }

    /// 리포트를 생성합니다.
    pub fn render(
        &self,
        format: ReportFormat,
        context: &ReportContext,
    ) -> Result<ReportDocument, SbomScannerError> {
        render(
            format,
            context,
            &self.dependencies,
            &self.unattributed_headers,
        )
    }
}

/// 의존성 스캐너
///
/// [`DependencyScannerBuilder`]로 생성합니다. 한 인스턴스로 여러 번 스캔할 수 있습니다.
pub struct DependencyScanner {
    config: SbomScannerConfig,
    correlator: Correlator,
    enricher: Enricher,
}

impl DependencyScanner {
    /// 스캐너 설정
    pub fn config(&self) -> &SbomScannerConfig {
        &self.config
    }

    /// 설정된 모든 입력으로 스캔을 수행합니다.
    pub fn scan(&self) -> ScanOutcome {
        let started = Instant::now();
        let mut skipped = Vec::new();

        let declared = self.collect_declared(&mut skipped);
        let declared_count = declared.len();

        let headers = self.collect_headers(&mut skipped);
        let header_count = headers.len();

        let (libraries, binaries_scanned) = self.collect_libraries(&mut skipped);

        let mut outcome = self.correlator.correlate(declared, headers, libraries);
        self.enricher.enrich(&mut outcome.dependencies);

        let duration = started.elapsed();
        let result = if skipped.is_empty() { "success" } else { "partial" };
        metrics::counter!(m::SCANS_COMPLETED_TOTAL, m::LABEL_RESULT => result).increment(1);
        metrics::histogram!(m::SCAN_DURATION_SECONDS).record(duration.as_secs_f64());

        info!(
            dependencies = outcome.dependencies.len(),
            declared = declared_count,
            headers = header_count,
            binaries = binaries_scanned,
            skipped = skipped.len(),
            elapsed_ms = duration.as_millis() as u64,
            "scan completed"
        );

        ScanOutcome {
            dependencies: outcome.dependencies,
            unattributed_headers: outcome.unattributed_headers,
            declared_count,
            header_count,
            binaries_scanned,
            skipped,
            duration,
        }
    }

    /// vcpkg → conan → cmake 순서로 선언 의존성을 통합합니다.
    ///
    /// vcpkg, conan 레코드는 그대로 이어 붙이고 cmake 레코드만 누적 목록에 병합합니다.
    fn collect_declared(&self, skipped: &mut Vec<SkippedInput>) -> Vec<Dependency> {
        let sources = [
            (DependencyKind::Vcpkg, self.config.vcpkg_manifest.as_str()),
            (DependencyKind::Conan, self.config.conan_manifest.as_str()),
            (DependencyKind::CmakeTarget, self.config.libs_file.as_str()),
        ];

        let mut declared = Vec::new();
        for (kind, path) in sources {
            if path.is_empty() {
                continue;
            }
            let Some(parser) = ManifestDetector::parser_for(kind) else {
                continue;
            };

            let content = match read_input(Path::new(path), MAX_MANIFEST_SIZE) {
                Ok(content) => content,
                Err(e) => {
                    warn!(path, kind = %kind, error = %e, "skipping manifest");
                    skipped.push(SkippedInput {
                        path: path.to_owned(),
                        reason: e.to_string(),
                    });
                    continue;
                }
            };

            match parser.parse(&content, path) {
                Ok(records) => {
                    debug!(path, kind = %kind, count = records.len(), "manifest parsed");
                    metrics::counter!(m::CORRELATE_DECLARED_TOTAL, m::LABEL_MANIFEST_KIND => kind.as_str())
                        .increment(records.len() as u64);
                    if kind == DependencyKind::CmakeTarget {
                        merge_declared(self.correlator.policy().as_ref(), &mut declared, records);
                    } else {
                        declared.extend(records);
                    }
                }
                Err(e) => {
                    warn!(path, kind = %kind, error = %e, "failed to parse manifest, skipping");
                    skipped.push(SkippedInput {
                        path: path.to_owned(),
                        reason: e.to_string(),
                    });
                }
            }
        }
        declared
    }

    fn collect_headers(&self, skipped: &mut Vec<SkippedInput>) -> BTreeSet<String> {
        let path = self.config.compile_commands.as_str();
        if path.is_empty() {
            return BTreeSet::new();
        }

        let collector = HeaderCollector::new(
            self.config.system_include_dirs.clone(),
            self.config.max_file_size,
        );
        match collector.collect_from_file(Path::new(path)) {
            Ok(headers) => headers,
            Err(e) => {
                warn!(path, error = %e, "skipping compile commands");
                skipped.push(SkippedInput {
                    path: path.to_owned(),
                    reason: e.to_string(),
                });
                BTreeSet::new()
            }
        }
    }

    /// 바이너리 순서대로 needed 라이브러리를 모읍니다. 중복은 상관 분석에서 제거됩니다.
    fn collect_libraries(&self, skipped: &mut Vec<SkippedInput>) -> (Vec<String>, usize) {
        let mut libraries = Vec::new();
        let mut scanned = 0usize;

        for binary in &self.config.binaries {
            match depdiscover_elf::scan_needed_libraries(Path::new(binary), self.config.max_file_size) {
                Ok(found) => {
                    scanned += 1;
                    libraries.extend(found);
                }
                Err(e) => {
                    warn!(path = %binary, error = %e, "skipping binary");
                    skipped.push(SkippedInput {
                        path: binary.clone(),
                        reason: e.to_string(),
                    });
                }
            }
        }
        (libraries, scanned)
    }
}

/// 크기 상한을 확인한 뒤 입력 파일을 읽습니다.
fn read_input(path: &Path, max_size: u64) -> Result<String, SbomScannerError> {
    let io_error = |source| SbomScannerError::Io {
        path: path.display().to_string(),
        source,
    };

    let metadata = std::fs::metadata(path).map_err(io_error)?;
    if metadata.len() > max_size {
        return Err(SbomScannerError::FileTooBig {
            path: path.display().to_string(),
            size: metadata.len(),
            max: max_size,
        });
    }
    std::fs::read_to_string(path).map_err(io_error)
}

/// [`DependencyScanner`] 빌더
///
/// 설정에 따라 조회기와 해석기를 구성합니다. 테스트나 임베딩에서는
/// `lookup`, `license_resolver`, `vulnerability_resolver`로 구현을 직접 주입할 수 있습니다.
#[derive(Default)]
pub struct DependencyScannerBuilder {
    config: SbomScannerConfig,
    lookup: Option<Arc<dyn AuthoritativeLookup>>,
    license_resolver: Option<Arc<dyn LicenseResolver>>,
    vulnerability_resolver: Option<Arc<dyn VulnerabilityResolver>>,
}

impl DependencyScannerBuilder {
    /// 새 빌더를 생성합니다.
    pub fn new() -> Self {
        Self::default()
    }

    /// 스캐너 설정을 지정합니다.
    pub fn config(mut self, config: SbomScannerConfig) -> Self {
        self.config = config;
        self
    }

    /// 권위 있는 조회 구현을 지정합니다. `pkg_config` 설정보다 우선합니다.
    pub fn lookup(mut self, lookup: Arc<dyn AuthoritativeLookup>) -> Self {
        self.lookup = Some(lookup);
        self
    }

    /// 라이선스 해석기를 지정합니다. `license_lookup` 설정보다 우선합니다.
    pub fn license_resolver(mut self, resolver: Arc<dyn LicenseResolver>) -> Self {
        self.license_resolver = Some(resolver);
        self
    }

    /// 취약점 해석기를 지정합니다. `vuln_check` 설정보다 우선합니다.
    pub fn vulnerability_resolver(mut self, resolver: Arc<dyn VulnerabilityResolver>) -> Self {
        self.vulnerability_resolver = Some(resolver);
        self
    }

    /// 스캐너를 빌드합니다.
    ///
    /// 취약점 조회가 활성화되어 있으면 이 시점에 로컬 DB를 읽습니다.
    /// DB를 읽지 못해도 빌드는 성공하며, 조회 결과는 `CHECK-ERROR`가 됩니다.
    pub fn build(self) -> Result<DependencyScanner, SbomScannerError> {
        self.config.validate()?;
        let config = self.config;

        let lookup: Arc<dyn AuthoritativeLookup> = match self.lookup {
            Some(lookup) => lookup,
            None if config.pkg_config => {
                Arc::new(PkgConfigLookup::new(config.pkg_config_program.clone()))
            }
            None => Arc::new(NoLookup),
        };
        let correlator = Correlator::new(config.match_policy.build(), lookup);

        let mut enricher = Enricher::new();
        if let Some(resolver) = self.license_resolver {
            enricher = enricher.with_license_resolver(resolver);
        } else if config.license_lookup {
            enricher = enricher.with_license_resolver(Arc::new(HeuristicLicenseResolver::new(
                config.licenses.clone(),
                config.license_search_depth,
            )));
        }
        if let Some(resolver) = self.vulnerability_resolver {
            enricher = enricher.with_vulnerability_resolver(resolver);
        } else if config.vuln_check {
            let matcher = VulnMatcher::from_path(Path::new(&config.vuln_db_path), config.min_severity)
                .with_aliases(config.package_aliases.clone());
            enricher = enricher.with_vulnerability_resolver(Arc::new(matcher));
        }

        info!(
            policy = %config.match_policy,
            pkg_config = config.pkg_config,
            license_lookup = config.license_lookup,
            vuln_check = config.vuln_check,
            "dependency scanner ready"
        );

        Ok(DependencyScanner {
            config,
            correlator,
            enricher,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SbomScannerConfigBuilder;

    fn offline_config(dir: &Path) -> SbomScannerConfigBuilder {
        let at = |name: &str| dir.join(name).display().to_string();
        SbomScannerConfigBuilder::new()
            .compile_commands(at("compile_commands.json"))
            .libs_file(at("libs.txt"))
            .vcpkg_manifest(at("vcpkg.json"))
            .conan_manifest(at("conanfile.txt"))
            .pkg_config(false)
            .license_lookup(false)
            .vuln_check(false)
    }

    #[test]
    fn builder_rejects_invalid_config() {
        let result = DependencyScannerBuilder::new()
            .config(SbomScannerConfig {
                max_file_size: 0,
                ..Default::default()
            })
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn missing_inputs_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let config = offline_config(dir.path()).build().unwrap();
        let scanner = DependencyScannerBuilder::new().config(config).build().unwrap();

        let outcome = scanner.scan();
        assert!(outcome.dependencies.is_empty());
        // compile_commands, libs, vcpkg, conan
        assert_eq!(outcome.skipped.len(), 4);
    }

    #[test]
    fn manifests_concatenate_in_fixed_order() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("vcpkg.json"),
            r#"{"dependencies": ["fmt", {"name": "zlib", "version>=": "1.2.13"}]}"#,
        )
        .unwrap();
        std::fs::write(
            dir.path().join("conanfile.txt"),
            "[requires]\nfmt/10.1.1\nboost/1.83.0\n",
        )
        .unwrap();

        let config = offline_config(dir.path()).build().unwrap();
        let scanner = DependencyScannerBuilder::new().config(config).build().unwrap();
        let outcome = scanner.scan();

        let names: Vec<_> = outcome.dependencies.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["fmt", "zlib", "fmt", "boost"]);
        // 매니페스트 레코드끼리는 병합하지 않음
        assert_eq!(outcome.dependencies[0].version, "latest");
        assert_eq!(outcome.dependencies[0].kind, DependencyKind::Vcpkg);
        assert_eq!(outcome.dependencies[2].version, "10.1.1");
        assert_eq!(outcome.dependencies[2].kind, DependencyKind::Conan);
        assert_eq!(outcome.declared_count, 4);
    }

    #[test]
    fn malformed_manifest_does_not_abort_scan() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("vcpkg.json"), "{ not json").unwrap();
        std::fs::write(dir.path().join("conanfile.txt"), "[requires]\nzlib/1.3\n").unwrap();

        let config = offline_config(dir.path()).build().unwrap();
        let scanner = DependencyScannerBuilder::new().config(config).build().unwrap();
        let outcome = scanner.scan();

        assert_eq!(outcome.dependencies.len(), 1);
        assert_eq!(outcome.dependencies[0].name, "zlib");
        assert!(
            outcome
                .skipped
                .iter()
                .any(|s| s.path.ends_with("vcpkg.json"))
        );
    }

    #[test]
    fn missing_binary_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let config = offline_config(dir.path())
            .binaries(vec![dir.path().join("nope").display().to_string()])
            .build()
            .unwrap();
        let scanner = DependencyScannerBuilder::new().config(config).build().unwrap();
        let outcome = scanner.scan();
        assert_eq!(outcome.binaries_scanned, 0);
        assert!(outcome.skipped.iter().any(|s| s.path.ends_with("nope")));
    }

    #[test]
    fn non_elf_binary_contributes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("run.sh");
        std::fs::write(&script, "#!/bin/sh\necho hi\n").unwrap();
        let config = offline_config(dir.path())
            .binaries(vec![script.display().to_string()])
            .build()
            .unwrap();
        let scanner = DependencyScannerBuilder::new().config(config).build().unwrap();
        let outcome = scanner.scan();
        assert_eq!(outcome.binaries_scanned, 1);
        assert_eq!(outcome.synthetic_count(), 0);
    }

    #[test]
    fn oversized_manifest_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vcpkg.json");
        std::fs::write(&path, "x").unwrap();
        let err = read_input(&path, 0).unwrap_err();
        assert!(matches!(err, SbomScannerError::FileTooBig { .. }));
    }

    #[test]
    fn render_native_report() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("conanfile.txt"), "[requires]\nzlib/1.3\n").unwrap();
        let config = offline_config(dir.path()).build().unwrap();
        let scanner = DependencyScannerBuilder::new().config(config).build().unwrap();

        let doc = scanner
            .scan()
            .render(ReportFormat::Native, &ReportContext::new("demo", "/w"))
            .unwrap();
        assert_eq!(doc.component_count, 1);
        assert!(doc.content.contains("\"zlib\""));
    }
}
