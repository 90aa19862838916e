//! # depdiscover-core
//!
//! depdiscover 워크스페이스의 공통 기반 크레이트입니다.
//!
//! - [`error`]: 최상위 에러 [`DepdiscoverError`]와 도메인별 에러
//! - [`config`]: `depdiscover.toml` 설정 로딩, 환경변수 오버라이드, 검증
//! - [`types`]: 크레이트 간 공유 타입 ([`Severity`])
//! - [`metrics`]: 메트릭 이름 상수

pub mod config;
pub mod error;
pub mod metrics;
pub mod types;

// 에러
pub use error::{BinaryError, ConfigError, DepdiscoverError, ScanError};

// 설정
pub use config::DepdiscoverConfig;

// 도메인 타입
pub use types::Severity;
