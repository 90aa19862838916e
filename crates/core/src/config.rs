//! 설정 관리 -- depdiscover.toml 파싱 및 런타임 설정
//!
//! [`DepdiscoverConfig`]는 모든 크레이트의 설정을 담는 최상위 구조체입니다.
//!
//! # 설정 로딩 우선순위
//! 1. CLI 인자 (최고 우선)
//! 2. 환경변수 (`DEPDISCOVER_SCAN_MATCH_POLICY=strict` 형식)
//! 3. 설정 파일 (`depdiscover.toml`)
//! 4. 기본값 (`Default` 구현)
//!
//! # 사용 예시
//! ```no_run
//! # async fn example() -> Result<(), depdiscover_core::error::DepdiscoverError> {
//! use depdiscover_core::config::DepdiscoverConfig;
//!
//! // 파일에서 로드 + 환경변수 오버라이드
//! let config = DepdiscoverConfig::load("depdiscover.toml").await?;
//!
//! // TOML 문자열에서 직접 파싱
//! let config = DepdiscoverConfig::parse("[general]\nlog_level = \"debug\"")?;
//! # Ok(())
//! # }
//! ```

use std::collections::BTreeMap;
use std::path::{Component, Path};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{ConfigError, DepdiscoverError};
use crate::types::Severity;

/// 기본 설정 파일 경로
pub const DEFAULT_CONFIG_PATH: &str = "depdiscover.toml";

/// 바이너리 파일 최대 크기 상한 (4 GiB)
pub const MAX_BINARY_SIZE_LIMIT: u64 = 4 * 1024 * 1024 * 1024;

/// depdiscover 통합 설정
///
/// `depdiscover.toml` 파일의 최상위 구조를 나타냅니다.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DepdiscoverConfig {
    /// 일반 설정
    #[serde(default)]
    pub general: GeneralConfig,
    /// 스캔 입력 설정
    #[serde(default)]
    pub scan: ScanConfig,
    /// 라이선스/취약점 보강 설정
    #[serde(default)]
    pub enrichment: EnrichmentConfig,
}

impl DepdiscoverConfig {
    /// TOML 파일에서 설정을 로드하고 환경변수 오버라이드를 적용합니다.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, DepdiscoverError> {
        let mut config = Self::from_file(path).await?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// 설정 파일이 없으면 기본값으로 대체하여 로드합니다.
    ///
    /// 파일이 존재하지 않는 경우에만 기본값을 사용하며,
    /// 파싱 실패나 검증 실패는 그대로 에러로 반환합니다.
    pub async fn load_or_default(path: impl AsRef<Path>) -> Result<Self, DepdiscoverError> {
        let path = path.as_ref();
        let mut config = match Self::from_file(path).await {
            Ok(config) => config,
            Err(DepdiscoverError::Config(ConfigError::FileNotFound { .. })) => {
                debug!(path = %path.display(), "config file not found, using defaults");
                Self::default()
            }
            Err(e) => return Err(e),
        };
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// TOML 파일에서 설정을 로드합니다 (환경변수 오버라이드 없음).
    pub async fn from_file(path: impl AsRef<Path>) -> Result<Self, DepdiscoverError> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                DepdiscoverError::Config(ConfigError::FileNotFound {
                    path: path.display().to_string(),
                })
            } else {
                DepdiscoverError::Io(e)
            }
        })?;
        let config = Self::parse(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// TOML 문자열에서 설정을 파싱합니다.
    pub fn parse(toml_str: &str) -> Result<Self, DepdiscoverError> {
        toml::from_str(toml_str).map_err(|e| {
            DepdiscoverError::Config(ConfigError::ParseFailed {
                reason: e.to_string(),
            })
        })
    }

    /// 현재 설정을 TOML 문자열로 직렬화합니다.
    pub fn to_toml(&self) -> Result<String, DepdiscoverError> {
        toml::to_string_pretty(self).map_err(|e| {
            DepdiscoverError::Config(ConfigError::ParseFailed {
                reason: e.to_string(),
            })
        })
    }

    /// 환경변수로 설정값을 오버라이드합니다.
    ///
    /// 환경변수 네이밍 규칙: `DEPDISCOVER_{SECTION}_{FIELD}`
    /// 예: `DEPDISCOVER_SCAN_MATCH_POLICY=strict`
    pub fn apply_env_overrides(&mut self) {
        // General
        override_string(
            &mut self.general.log_level,
            "DEPDISCOVER_GENERAL_LOG_LEVEL",
        );
        override_string(
            &mut self.general.log_format,
            "DEPDISCOVER_GENERAL_LOG_FORMAT",
        );
        override_string(
            &mut self.general.project_name,
            "DEPDISCOVER_GENERAL_PROJECT_NAME",
        );
        override_string(
            &mut self.general.output_path,
            "DEPDISCOVER_GENERAL_OUTPUT_PATH",
        );
        override_string(
            &mut self.general.report_format,
            "DEPDISCOVER_GENERAL_REPORT_FORMAT",
        );

        // Scan
        override_string(
            &mut self.scan.compile_commands,
            "DEPDISCOVER_SCAN_COMPILE_COMMANDS",
        );
        override_string(&mut self.scan.libs_file, "DEPDISCOVER_SCAN_LIBS_FILE");
        override_csv(&mut self.scan.binaries, "DEPDISCOVER_SCAN_BINARIES");
        override_string(
            &mut self.scan.vcpkg_manifest,
            "DEPDISCOVER_SCAN_VCPKG_MANIFEST",
        );
        override_string(
            &mut self.scan.conan_manifest,
            "DEPDISCOVER_SCAN_CONAN_MANIFEST",
        );
        override_u64(
            &mut self.scan.max_file_size,
            "DEPDISCOVER_SCAN_MAX_FILE_SIZE",
        );
        override_csv(
            &mut self.scan.system_include_dirs,
            "DEPDISCOVER_SCAN_SYSTEM_INCLUDE_DIRS",
        );
        override_string(
            &mut self.scan.match_policy,
            "DEPDISCOVER_SCAN_MATCH_POLICY",
        );

        // Enrichment
        override_bool(
            &mut self.enrichment.pkg_config,
            "DEPDISCOVER_ENRICHMENT_PKG_CONFIG",
        );
        override_string(
            &mut self.enrichment.pkg_config_program,
            "DEPDISCOVER_ENRICHMENT_PKG_CONFIG_PROGRAM",
        );
        override_bool(
            &mut self.enrichment.license_lookup,
            "DEPDISCOVER_ENRICHMENT_LICENSE_LOOKUP",
        );
        override_bool(
            &mut self.enrichment.vuln_check,
            "DEPDISCOVER_ENRICHMENT_VULN_CHECK",
        );
        override_string(
            &mut self.enrichment.vuln_db_path,
            "DEPDISCOVER_ENRICHMENT_VULN_DB_PATH",
        );
        override_string(
            &mut self.enrichment.min_severity,
            "DEPDISCOVER_ENRICHMENT_MIN_SEVERITY",
        );
        override_usize(
            &mut self.enrichment.license_search_depth,
            "DEPDISCOVER_ENRICHMENT_LICENSE_SEARCH_DEPTH",
        );
    }

    /// 설정값의 유효성을 검증합니다.
    pub fn validate(&self) -> Result<(), DepdiscoverError> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.general.log_level.as_str()) {
            return Err(invalid(
                "general.log_level",
                format!("must be one of: {}", valid_levels.join(", ")),
            ));
        }

        let valid_formats = ["json", "pretty"];
        if !valid_formats.contains(&self.general.log_format.as_str()) {
            return Err(invalid(
                "general.log_format",
                format!("must be one of: {}", valid_formats.join(", ")),
            ));
        }

        let valid_reports = ["native", "cyclonedx"];
        if !valid_reports.contains(&self.general.report_format.as_str()) {
            return Err(invalid(
                "general.report_format",
                format!("must be one of: {}", valid_reports.join(", ")),
            ));
        }

        if self.general.output_path.is_empty() {
            return Err(invalid("general.output_path", "must not be empty".to_owned()));
        }
        if Path::new(&self.general.output_path)
            .components()
            .any(|c| matches!(c, Component::ParentDir))
        {
            return Err(invalid(
                "general.output_path",
                "must not contain '..' components".to_owned(),
            ));
        }

        let valid_policies = ["legacy", "strict"];
        if !valid_policies.contains(&self.scan.match_policy.as_str()) {
            return Err(invalid(
                "scan.match_policy",
                format!("must be one of: {}", valid_policies.join(", ")),
            ));
        }

        if self.scan.max_file_size == 0 || self.scan.max_file_size > MAX_BINARY_SIZE_LIMIT {
            return Err(invalid(
                "scan.max_file_size",
                format!("must be between 1 and {MAX_BINARY_SIZE_LIMIT}"),
            ));
        }

        if self.enrichment.pkg_config && self.enrichment.pkg_config_program.trim().is_empty() {
            return Err(invalid(
                "enrichment.pkg_config_program",
                "must not be empty when pkg_config is enabled".to_owned(),
            ));
        }

        if Severity::from_str_loose(&self.enrichment.min_severity).is_none() {
            return Err(invalid(
                "enrichment.min_severity",
                "must be one of: info, low, medium, high, critical".to_owned(),
            ));
        }

        if self.enrichment.license_search_depth > 16 {
            return Err(invalid(
                "enrichment.license_search_depth",
                "must be at most 16".to_owned(),
            ));
        }

        Ok(())
    }
}

fn invalid(field: &str, reason: String) -> DepdiscoverError {
    ConfigError::InvalidValue {
        field: field.to_owned(),
        reason,
    }
    .into()
}

/// 일반 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// 로그 레벨 (trace, debug, info, warn, error)
    pub log_level: String,
    /// 로그 형식 (json, pretty)
    pub log_format: String,
    /// 리포트에 기록할 프로젝트 이름
    pub project_name: String,
    /// 리포트 출력 경로 (`-`는 stdout)
    pub output_path: String,
    /// 리포트 형식 (native, cyclonedx)
    pub report_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_owned(),
            log_format: "pretty".to_owned(),
            project_name: "Unknown Project".to_owned(),
            output_path: "depdiscover.json".to_owned(),
            report_format: "native".to_owned(),
        }
    }
}

/// 스캔 입력 설정
///
/// 경로가 존재하지 않는 입력은 스캔 시 경고와 함께 건너뜁니다.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// compile_commands.json 경로
    pub compile_commands: String,
    /// CMake가 생성한 libs.txt 경로
    pub libs_file: String,
    /// 스캔할 바이너리 경로 목록
    pub binaries: Vec<String>,
    /// vcpkg.json 경로
    pub vcpkg_manifest: String,
    /// conanfile.txt 경로
    pub conan_manifest: String,
    /// 바이너리 최대 크기 (바이트)
    pub max_file_size: u64,
    /// 헤더 탐색 시 사용할 시스템 include 디렉토리
    pub system_include_dirs: Vec<String>,
    /// 매칭 정책 (legacy, strict)
    pub match_policy: String,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            compile_commands: "compile_commands.json".to_owned(),
            libs_file: "libs.txt".to_owned(),
            binaries: Vec::new(),
            vcpkg_manifest: "vcpkg.json".to_owned(),
            conan_manifest: "conanfile.txt".to_owned(),
            max_file_size: 512 * 1024 * 1024, // 512MB
            system_include_dirs: vec![
                "/usr/include".to_owned(),
                "/usr/local/include".to_owned(),
                "/usr/include/x86_64-linux-gnu".to_owned(),
                "/opt/local/include".to_owned(),
            ],
            match_policy: "legacy".to_owned(),
        }
    }
}

/// 라이선스/취약점 보강 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EnrichmentConfig {
    /// pkg-config 조회 활성화
    pub pkg_config: bool,
    /// pkg-config 실행 파일
    pub pkg_config_program: String,
    /// 라이선스 조회 활성화
    pub license_lookup: bool,
    /// 헤더 디렉토리 기준 라이선스 파일 탐색 단계 수
    pub license_search_depth: usize,
    /// 취약점 조회 활성화
    pub vuln_check: bool,
    /// 로컬 취약점 DB 경로 (JSON)
    pub vuln_db_path: String,
    /// 리포트에 포함할 최소 심각도
    pub min_severity: String,
    /// 프로젝트 이름 → 라이선스 목록
    pub licenses: BTreeMap<String, Vec<String>>,
    /// 패키지 이름 별칭 (취약점 조회 전 적용)
    pub package_aliases: BTreeMap<String, String>,
}

impl Default for EnrichmentConfig {
    fn default() -> Self {
        Self {
            pkg_config: true,
            pkg_config_program: "pkg-config".to_owned(),
            license_lookup: true,
            license_search_depth: 3,
            vuln_check: true,
            vuln_db_path: "/var/lib/depdiscover/vuln-db.json".to_owned(),
            min_severity: "info".to_owned(),
            licenses: default_license_table(),
            package_aliases: default_package_aliases(),
        }
    }
}

/// 잘 알려진 프로젝트의 라이선스 기본 테이블
pub fn default_license_table() -> BTreeMap<String, Vec<String>> {
    let entries: &[(&str, &[&str])] = &[
        ("openssl", &["Apache-2.0"]),
        ("zlib", &["Zlib"]),
        ("fmt", &["MIT"]),
        ("nlohmann_json", &["MIT"]),
        ("spdlog", &["MIT"]),
        ("libcurl", &["curl"]),
        ("gtest", &["BSD-3-Clause"]),
        ("gmock", &["BSD-3-Clause"]),
        ("boost", &["BSL-1.0"]),
        ("protobuf", &["BSD-3-Clause"]),
        ("abseil", &["Apache-2.0"]),
        ("eigen", &["MPL-2.0"]),
        ("qt", &["LGPL-3.0", "GPL-2.0", "GPL-3.0"]),
        ("ffmpeg", &["LGPL-2.1"]),
        ("opencv", &["Apache-2.0"]),
        ("sqlite3", &["Public-Domain"]),
        ("catch2", &["BSL-1.0"]),
    ];
    entries
        .iter()
        .map(|(name, licenses)| {
            (
                (*name).to_owned(),
                licenses.iter().map(|l| (*l).to_owned()).collect(),
            )
        })
        .collect()
}

/// 패키지 이름 별칭 기본 테이블
pub fn default_package_aliases() -> BTreeMap<String, String> {
    BTreeMap::from([("libcurl".to_owned(), "curl".to_owned())])
}

// --- 환경변수 오버라이드 헬퍼 ---

fn override_string(target: &mut String, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        *target = val;
    }
}

fn override_bool(target: &mut bool, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<bool>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse bool from env var, ignoring"
            ),
        }
    }
}

fn override_usize(target: &mut usize, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<usize>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse usize from env var, ignoring"
            ),
        }
    }
}

fn override_u64(target: &mut u64, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<u64>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse u64 from env var, ignoring"
            ),
        }
    }
}

fn override_csv(target: &mut Vec<String>, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        *target = val
            .split(',')
            .map(|s| s.trim().to_owned())
            .filter(|s| !s.is_empty())
            .collect();
    }
}
