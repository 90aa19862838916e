//! 에러 타입 -- 도메인별 에러 정의

/// depdiscover 최상위 에러 타입
///
/// 각 크레이트의 도메인 에러는 `From` 구현을 통해 이 타입으로 변환되어
/// `?` 연산자로 상위 계층까지 전파됩니다.
#[derive(Debug, thiserror::Error)]
pub enum DepdiscoverError {
    /// 설정 관련 에러
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// 바이너리 스캔 에러
    #[error("binary error: {0}")]
    Binary(#[from] BinaryError),

    /// 의존성 스캔 에러
    #[error("scan error: {0}")]
    Scan(#[from] ScanError),

    /// I/O 에러
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// 설정 관련 에러
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// 설정 파일을 찾을 수 없음
    #[error("config file not found: {path}")]
    FileNotFound { path: String },

    /// 설정 파싱 실패
    #[error("failed to parse config: {reason}")]
    ParseFailed { reason: String },

    /// 유효하지 않은 설정 값
    #[error("invalid config value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },
}

/// 바이너리 스캔 에러
///
/// "지원하지 않는 형식"은 에러가 아니라 빈 결과로 처리되므로
/// 여기에는 스캔 자체가 불가능한 경우만 포함됩니다.
#[derive(Debug, thiserror::Error)]
pub enum BinaryError {
    /// 바이너리를 읽을 수 없음
    #[error("cannot read binary '{path}': {reason}")]
    Unreadable { path: String, reason: String },

    /// 파일 크기 초과
    #[error("binary too large: {path} ({size} bytes, max: {max})")]
    TooLarge { path: String, size: u64, max: u64 },
}

/// 의존성 스캔 에러
#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    /// 매니페스트 파싱 실패
    #[error("manifest parse error in '{path}': {reason}")]
    Manifest { path: String, reason: String },

    /// 빌드 정보 (compile_commands 등) 처리 실패
    #[error("build info error in '{path}': {reason}")]
    BuildInfo { path: String, reason: String },

    /// 취약점 데이터베이스 에러
    #[error("vulnerability database error: {0}")]
    VulnDb(String),

    /// 리포트 생성 실패
    #[error("report generation failed: {0}")]
    Report(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_error_converts_into_top_level() {
        let err: DepdiscoverError = ConfigError::FileNotFound {
            path: "/etc/depdiscover.toml".to_owned(),
        }
        .into();
        assert!(matches!(err, DepdiscoverError::Config(_)));
        assert!(err.to_string().contains("/etc/depdiscover.toml"));
    }

    #[test]
    fn binary_error_display_contains_sizes() {
        let err = BinaryError::TooLarge {
            path: "app".to_owned(),
            size: 300,
            max: 100,
        };
        let msg = err.to_string();
        assert!(msg.contains("300"));
        assert!(msg.contains("100"));
    }

    #[test]
    fn scan_error_converts_into_top_level() {
        let err: DepdiscoverError = ScanError::Manifest {
            path: "vcpkg.json".to_owned(),
            reason: "expected object".to_owned(),
        }
        .into();
        assert!(matches!(err, DepdiscoverError::Scan(_)));
        assert!(err.to_string().starts_with("scan error"));
    }

    #[test]
    fn io_error_converts_into_top_level() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err: DepdiscoverError = io.into();
        assert!(matches!(err, DepdiscoverError::Io(_)));
    }
}
