//! ELF 스캐너 에러 타입
//!
//! 형식이 다르거나 잘린 파일은 에러가 아닌 "해당 없음"으로 처리되므로
//! 이 타입은 파일 자체를 읽을 수 없는 경우만 표현합니다.

use depdiscover_core::error::{BinaryError, DepdiscoverError};

/// ELF 스캐너 도메인 에러
#[derive(Debug, thiserror::Error)]
pub enum ElfScanError {
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

impl From<ElfScanError> for DepdiscoverError {
    fn from(err: ElfScanError) -> Self {
        match err {
            ElfScanError::Io { path, source } => DepdiscoverError::Binary(BinaryError::Unreadable {
                path,
                reason: source.to_string(),
            }),
            ElfScanError::FileTooBig { path, size, max } => {
                DepdiscoverError::Binary(BinaryError::TooLarge { path, size, max })
            }
        }
    }
}
