//! 스캐너 설정
//!
//! [`SbomScannerConfig`]는 core의 [`DepdiscoverConfig`]에서 파생되며,
//! 문자열로 된 선택 값(매칭 정책, 리포트 형식, 최소 심각도)을 타입으로 해석해 둡니다.
//!
//! # 사용 예시
//!
//! ```
//! use depdiscover_sbom_scanner::{MatchPolicyKind, SbomScannerConfig, SbomScannerConfigBuilder};
//!
//! // 기본값으로 생성
//! let config = SbomScannerConfig::default();
//! config.validate().unwrap();
//!
//! // 빌더로 생성
//! let config = SbomScannerConfigBuilder::new()
//!     .libs_file("build/libs.txt")
//!     .binaries(vec!["build/app".to_owned()])
//!     .match_policy(MatchPolicyKind::Strict)
//!     .vuln_check(false)
//!     .build()
//!     .unwrap();
//! assert_eq!(config.match_policy, MatchPolicyKind::Strict);
//! ```

use std::collections::BTreeMap;
use std::path::{Component, Path};

use depdiscover_core::config::{DepdiscoverConfig, MAX_BINARY_SIZE_LIMIT};
use depdiscover_core::types::Severity;
use serde::{Deserialize, Serialize};

use crate::correlate::MatchPolicyKind;
use crate::error::SbomScannerError;
use crate::types::ReportFormat;

/// 경로 최대 길이
const MAX_PATH_LEN: usize = 4096;

/// 라이선스 파일 탐색 최대 단계 수
const MAX_LICENSE_SEARCH_DEPTH: usize = 16;

/// 스캐너 설정
///
/// 입력 경로가 빈 문자열이면 해당 입력은 사용하지 않습니다.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SbomScannerConfig {
    /// 리포트에 기록할 프로젝트 이름
    pub project_name: String,
    /// 리포트 형식
    pub report_format: ReportFormat,

    // --- 입력 ---
    /// compile_commands.json 경로
    pub compile_commands: String,
    /// libs.txt 경로
    pub libs_file: String,
    /// vcpkg.json 경로
    pub vcpkg_manifest: String,
    /// conanfile.txt 경로
    pub conan_manifest: String,
    /// 스캔할 바이너리 목록
    pub binaries: Vec<String>,
    /// 입력 파일 최대 크기 (바이트)
    pub max_file_size: u64,
    /// 헤더 해석 시 시스템 include 디렉토리
    pub system_include_dirs: Vec<String>,

    // --- 상관 분석 ---
    /// 매칭 정책
    pub match_policy: MatchPolicyKind,
    /// pkg-config 조회 활성화
    pub pkg_config: bool,
    /// pkg-config 실행 파일
    pub pkg_config_program: String,

    // --- 보강 ---
    /// 라이선스 조회 활성화
    pub license_lookup: bool,
    /// 라이선스 파일 탐색 단계 수
    pub license_search_depth: usize,
    /// 프로젝트 이름 → 라이선스
    pub licenses: BTreeMap<String, Vec<String>>,
    /// 취약점 조회 활성화
    pub vuln_check: bool,
    /// 로컬 취약점 DB 경로
    pub vuln_db_path: String,
    /// 포함할 최소 심각도
    pub min_severity: Severity,
    /// 취약점 조회 전 적용할 패키지 별칭
    pub package_aliases: BTreeMap<String, String>,
}

impl Default for SbomScannerConfig {
    fn default() -> Self {
        Self::from_core(&DepdiscoverConfig::default())
    }
}

impl SbomScannerConfig {
    /// core 설정에서 스캐너 설정을 생성합니다.
    ///
    /// 해석할 수 없는 선택 값은 기본값으로 대체합니다. core 설정의 `validate()`가
    /// 먼저 호출되었다면 대체는 일어나지 않습니다.
    pub fn from_core(core: &DepdiscoverConfig) -> Self {
        let scan = &core.scan;
        let enrichment = &core.enrichment;

        Self {
            project_name: core.general.project_name.clone(),
            report_format: ReportFormat::from_str_loose(&core.general.report_format)
                .unwrap_or_default(),
            compile_commands: scan.compile_commands.clone(),
            libs_file: scan.libs_file.clone(),
            vcpkg_manifest: scan.vcpkg_manifest.clone(),
            conan_manifest: scan.conan_manifest.clone(),
            binaries: scan.binaries.clone(),
            max_file_size: scan.max_file_size,
            system_include_dirs: scan.system_include_dirs.clone(),
            match_policy: MatchPolicyKind::from_str_loose(&scan.match_policy).unwrap_or_default(),
            pkg_config: enrichment.pkg_config,
            pkg_config_program: enrichment.pkg_config_program.clone(),
            license_lookup: enrichment.license_lookup,
            license_search_depth: enrichment.license_search_depth,
            licenses: enrichment.licenses.clone(),
            vuln_check: enrichment.vuln_check,
            vuln_db_path: enrichment.vuln_db_path.clone(),
            min_severity: Severity::from_str_loose(&enrichment.min_severity).unwrap_or_default(),
            package_aliases: enrichment.package_aliases.clone(),
        }
    }

    /// 입력 파일 경로 목록 (설정된 것만)
    pub fn input_paths(&self) -> impl Iterator<Item = (&'static str, &str)> {
        [
            ("compile_commands", self.compile_commands.as_str()),
            ("libs_file", self.libs_file.as_str()),
            ("vcpkg_manifest", self.vcpkg_manifest.as_str()),
            ("conan_manifest", self.conan_manifest.as_str()),
        ]
        .into_iter()
        .chain(self.binaries.iter().map(|b| ("binaries", b.as_str())))
        .filter(|(_, path)| !path.is_empty())
    }

    /// 설정 값의 유효성을 검증합니다.
    ///
    /// # 검증 규칙
    ///
    /// - `max_file_size`: 1 이상, 4GB 이하
    /// - 입력 경로: 4096자 이하
    /// - `pkg_config_program`: pkg-config 활성화 시 비어 있으면 안 됨
    /// - `license_search_depth`: 라이선스 조회 활성화 시 1-16
    /// - `vuln_db_path`: 취약점 조회 활성화 시 비어 있으면 안 되고 `..`을 포함하면 안 됨
    pub fn validate(&self) -> Result<(), SbomScannerError> {
        if self.max_file_size == 0 || self.max_file_size > MAX_BINARY_SIZE_LIMIT {
            return Err(config_error(
                "max_file_size",
                format!("must be 1-{MAX_BINARY_SIZE_LIMIT}"),
            ));
        }

        for (field, path) in self.input_paths() {
            if path.len() > MAX_PATH_LEN {
                return Err(config_error(
                    field,
                    format!("path exceeds maximum length {MAX_PATH_LEN}"),
                ));
            }
        }

        if self.binaries.iter().any(|b| b.trim().is_empty()) {
            return Err(config_error(
                "binaries",
                "binary path must not be empty".to_owned(),
            ));
        }

        if self.pkg_config && self.pkg_config_program.trim().is_empty() {
            return Err(config_error(
                "pkg_config_program",
                "must not be empty when pkg_config is enabled".to_owned(),
            ));
        }

        if self.license_lookup
            && (self.license_search_depth == 0
                || self.license_search_depth > MAX_LICENSE_SEARCH_DEPTH)
        {
            return Err(config_error(
                "license_search_depth",
                format!("must be 1-{MAX_LICENSE_SEARCH_DEPTH}"),
            ));
        }

        if self.vuln_check {
            if self.vuln_db_path.is_empty() {
                return Err(config_error(
                    "vuln_db_path",
                    "must not be empty when vuln_check is enabled".to_owned(),
                ));
            }
            if Path::new(&self.vuln_db_path)
                .components()
                .any(|c| c == Component::ParentDir)
            {
                return Err(config_error(
                    "vuln_db_path",
                    "contains path traversal pattern '..'".to_owned(),
                ));
            }
            if self.vuln_db_path.len() > MAX_PATH_LEN {
                return Err(config_error(
                    "vuln_db_path",
                    format!("path exceeds maximum length {MAX_PATH_LEN}"),
                ));
            }
        }

        Ok(())
    }
}

fn config_error(field: &str, reason: String) -> SbomScannerError {
    SbomScannerError::Config {
        field: field.to_owned(),
        reason,
    }
}

/// [`SbomScannerConfig`] 빌더
///
/// 빌드 시 유효성을 검증합니다.
#[derive(Default)]
pub struct SbomScannerConfigBuilder {
    config: SbomScannerConfig,
}

impl SbomScannerConfigBuilder {
    /// 기본값을 가진 새 빌더를 생성합니다.
    pub fn new() -> Self {
        Self::default()
    }

    /// 기존 설정에서 시작합니다.
    pub fn from_config(config: SbomScannerConfig) -> Self {
        Self { config }
    }

    /// 프로젝트 이름을 설정합니다.
    pub fn project_name(mut self, name: impl Into<String>) -> Self {
        self.config.project_name = name.into();
        self
    }

    /// 리포트 형식을 설정합니다.
    pub fn report_format(mut self, format: ReportFormat) -> Self {
        self.config.report_format = format;
        self
    }

    /// compile_commands.json 경로를 설정합니다.
    pub fn compile_commands(mut self, path: impl Into<String>) -> Self {
        self.config.compile_commands = path.into();
        self
    }

    /// libs.txt 경로를 설정합니다.
    pub fn libs_file(mut self, path: impl Into<String>) -> Self {
        self.config.libs_file = path.into();
        self
    }

    /// vcpkg.json 경로를 설정합니다.
    pub fn vcpkg_manifest(mut self, path: impl Into<String>) -> Self {
        self.config.vcpkg_manifest = path.into();
        self
    }

    /// conanfile.txt 경로를 설정합니다.
    pub fn conan_manifest(mut self, path: impl Into<String>) -> Self {
        self.config.conan_manifest = path.into();
        self
    }

    /// 스캔할 바이너리 목록을 설정합니다.
    pub fn binaries(mut self, binaries: Vec<String>) -> Self {
        self.config.binaries = binaries;
        self
    }

    /// 입력 파일 최대 크기를 설정합니다.
    pub fn max_file_size(mut self, size: u64) -> Self {
        self.config.max_file_size = size;
        self
    }

    /// 시스템 include 디렉토리를 설정합니다.
    pub fn system_include_dirs(mut self, dirs: Vec<String>) -> Self {
        self.config.system_include_dirs = dirs;
        self
    }

    /// 매칭 정책을 설정합니다.
    pub fn match_policy(mut self, policy: MatchPolicyKind) -> Self {
        self.config.match_policy = policy;
        self
    }

    /// pkg-config 조회 여부를 설정합니다.
    pub fn pkg_config(mut self, enabled: bool) -> Self {
        self.config.pkg_config = enabled;
        self
    }

    /// 라이선스 조회 여부를 설정합니다.
    pub fn license_lookup(mut self, enabled: bool) -> Self {
        self.config.license_lookup = enabled;
        self
    }

    /// 라이선스 테이블을 설정합니다.
    pub fn licenses(mut self, table: BTreeMap<String, Vec<String>>) -> Self {
        self.config.licenses = table;
        self
    }

    /// 취약점 조회 여부를 설정합니다.
    pub fn vuln_check(mut self, enabled: bool) -> Self {
        self.config.vuln_check = enabled;
        self
    }

    /// 취약점 DB 경로를 설정합니다.
    pub fn vuln_db_path(mut self, path: impl Into<String>) -> Self {
        self.config.vuln_db_path = path.into();
        self
    }

    /// 최소 심각도를 설정합니다.
    pub fn min_severity(mut self, severity: Severity) -> Self {
        self.config.min_severity = severity;
        self
    }

    /// 설정을 검증하고 빌드합니다.
    ///
    /// # Errors
    ///
    /// 유효성 검증 실패 시 `SbomScannerError::Config` 반환
    pub fn build(self) -> Result<SbomScannerConfig, SbomScannerError> {
        self.config.validate()?;
        Ok(self.config)
    }
}
