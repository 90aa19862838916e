//! 스캐너 에러 타입
//!
//! [`SbomScannerError`]는 의존성 스캔 파이프라인에서 발생할 수 있는 모든 에러를 나타냅니다.
//! `From<SbomScannerError> for DepdiscoverError` 구현을 통해 `?` 연산자로
//! 상위 에러 타입으로 자연스럽게 전파됩니다.
//!
//! # 에러 카테고리
//!
//! - **매니페스트 파싱**: `ManifestParse`
//! - **빌드 정보**: `BuildInfo`
//! - **바이너리**: `Binary`
//! - **취약점 DB**: `VulnDbLoad`, `VulnDbParse`
//! - **버전 비교**: `VersionParse`
//! - **리포트**: `Report`
//! - **설정**: `Config`
//! - **파일 I/O**: `Io`, `FileTooBig`

use depdiscover_core::error::{ConfigError, DepdiscoverError, ScanError};
use depdiscover_elf::ElfScanError;

/// 스캐너 도메인 에러
#[derive(Debug, thiserror::Error)]
pub enum SbomScannerError {
    /// 매니페스트 파싱 실패
    #[error("manifest parse error: {path}: {reason}")]
    ManifestParse {
        /// 파싱 대상 파일 경로
        path: String,
        /// 파싱 실패 사유
        reason: String,
    },

    /// compile_commands.json 처리 실패
    #[error("build info error: {path}: {reason}")]
    BuildInfo {
        /// 파일 경로
        path: String,
        /// 실패 사유
        reason: String,
    },

    /// 바이너리 스캔 실패
    #[error(transparent)]
    Binary(#[from] ElfScanError),

    /// 취약점 DB 로딩 실패
    #[error("vulnerability db load error: {path}: {reason}")]
    VulnDbLoad {
        /// DB 파일 경로
        path: String,
        /// 로딩 실패 사유
        reason: String,
    },

    /// 취약점 DB 파싱 실패
    #[error("vulnerability db parse error: {0}")]
    VulnDbParse(String),

    /// 버전 문자열 파싱 실패
    #[error("version parse error: '{version}': {reason}")]
    VersionParse {
        /// 파싱 대상 버전 문자열
        version: String,
        /// 파싱 실패 사유
        reason: String,
    },

    /// 리포트 생성 실패
    #[error("report error: {0}")]
    Report(String),

    /// 설정 에러
    #[error("config error: {field}: {reason}")]
    Config {
        /// 설정 필드명
        field: String,
        /// 에러 사유
        reason: String,
    },

    /// 파일 I/O 에러
    #[error("io error: {path}: {source}")]
    Io {
        /// 관련 파일 경로
        path: String,
        /// 원본 I/O 에러
        source: std::io::Error,
    },

    /// 파일 크기 초과
    #[error("file too large: {path}: {size} bytes (max: {max})")]
    FileTooBig {
        /// 파일 경로
        path: String,
        /// 실제 파일 크기 (바이트)
        size: u64,
        /// 최대 허용 크기 (바이트)
        max: u64,
    },
}

impl From<SbomScannerError> for DepdiscoverError {
    fn from(err: SbomScannerError) -> Self {
        match err {
            SbomScannerError::ManifestParse { path, reason } => {
                DepdiscoverError::Scan(ScanError::Manifest { path, reason })
            }
            SbomScannerError::BuildInfo { path, reason } => {
                DepdiscoverError::Scan(ScanError::BuildInfo { path, reason })
            }
            SbomScannerError::Binary(e) => e.into(),
            SbomScannerError::VulnDbLoad { path, reason } => DepdiscoverError::Scan(
                ScanError::VulnDb(format!("vulnerability db load error: {path}: {reason}")),
            ),
            SbomScannerError::VulnDbParse(msg) => DepdiscoverError::Scan(ScanError::VulnDb(msg)),
            SbomScannerError::VersionParse { version, reason } => DepdiscoverError::Scan(
                ScanError::VulnDb(format!("version parse error: '{version}': {reason}")),
            ),
            SbomScannerError::Report(msg) => DepdiscoverError::Scan(ScanError::Report(msg)),
            SbomScannerError::Config { field, reason } => {
                DepdiscoverError::Config(ConfigError::InvalidValue { field, reason })
            }
            SbomScannerError::Io { source, .. } => DepdiscoverError::Io(source),
            SbomScannerError::FileTooBig { path, size, max } => {
                DepdiscoverError::Scan(ScanError::Manifest {
                    path,
                    reason: format!("file too large: {size} bytes (max: {max})"),
                })
            }
        }
    }
}
