//! 권위 있는 패키지 조회 (pkg-config)
//!
//! [`AuthoritativeLookup`]은 패키지 시스템에 이름으로 질의해 정확한 버전,
//! include 디렉토리, 링크 라이브러리 이름을 얻습니다. 조회 성공 시 상관 분석
//! 엔진은 해당 결과를 가장 먼저 사용합니다.
//!
//! - [`PkgConfigLookup`]: `pkg-config` 프로세스 실행
//! - [`StaticLookup`]: 고정된 맵 (테스트, 오프라인)
//! - [`NoLookup`]: 조회 비활성화

use std::collections::HashMap;
use std::process::Command;

use tracing::{debug, warn};

/// 패키지 조회 결과
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PackageInfo {
    /// 패키지 버전
    pub version: String,
    /// include 디렉토리 (`-I` 값)
    pub include_dirs: Vec<String>,
    /// 링크 라이브러리 이름 (`-l` 값, `lib` 접두사 없음)
    pub lib_names: Vec<String>,
}

/// 이름 기반 패키지 조회
pub trait AuthoritativeLookup: Send + Sync {
    /// 조회 구현 이름
    fn name(&self) -> &str;

    /// 패키지를 조회합니다. 패키지가 없거나 조회에 실패하면 `None`을 반환합니다.
    fn query(&self, package: &str) -> Option<PackageInfo>;
}

/// `pkg-config` 실행 기반 조회
#[derive(Debug, Clone)]
pub struct PkgConfigLookup {
    program: String,
}

impl PkgConfigLookup {
    /// 실행할 pkg-config 프로그램으로 생성합니다.
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// 프로그램을 실행하고 성공 시 표준 출력을 반환합니다.
    fn run(&self, flag: &str, package: &str) -> Option<String> {
        let output = match Command::new(&self.program).arg(flag).arg(package).output() {
            Ok(output) => output,
            Err(e) => {
                warn!(program = %self.program, error = %e, "failed to run pkg-config");
                return None;
            }
        };
        if !output.status.success() {
            return None;
        }
        Some(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

impl Default for PkgConfigLookup {
    fn default() -> Self {
        Self::new("pkg-config")
    }
}

impl AuthoritativeLookup for PkgConfigLookup {
    fn name(&self) -> &str {
        "pkg-config"
    }

    fn query(&self, package: &str) -> Option<PackageInfo> {
        // 옵션으로 해석될 수 있는 이름은 질의하지 않음
        if package.is_empty() || package.starts_with('-') {
            return None;
        }

        let version = self.run("--modversion", package)?;
        let version = version.trim_end_matches(['\n', '\r']).trim().to_owned();
        if version.is_empty() {
            return None;
        }

        let include_dirs = self
            .run("--cflags-only-I", package)
            .map(|out| flag_values(&out, "-I"))
            .unwrap_or_default();
        let lib_names = self
            .run("--libs-only-l", package)
            .map(|out| flag_values(&out, "-l"))
            .unwrap_or_default();

        debug!(
            package,
            version = %version,
            include_dirs = include_dirs.len(),
            libs = lib_names.len(),
            "pkg-config lookup succeeded"
        );
        Some(PackageInfo {
            version,
            include_dirs,
            lib_names,
        })
    }
}

/// 공백으로 구분된 토큰 중 `flag`로 시작하는 토큰의 값을 추출합니다.
pub fn flag_values(output: &str, flag: &str) -> Vec<String> {
    output
        .split_whitespace()
        .filter_map(|token| token.strip_prefix(flag))
        .filter(|value| !value.is_empty())
        .map(str::to_owned)
        .collect()
}

/// 고정 맵 기반 조회
#[derive(Debug, Clone, Default)]
pub struct StaticLookup {
    packages: HashMap<String, PackageInfo>,
}

impl StaticLookup {
    /// 빈 조회 테이블을 생성합니다.
    pub fn new() -> Self {
        Self::default()
    }

    /// 패키지를 추가합니다.
    pub fn with_package(mut self, name: impl Into<String>, info: PackageInfo) -> Self {
        self.packages.insert(name.into(), info);
        self
    }
}

impl AuthoritativeLookup for StaticLookup {
    fn name(&self) -> &str {
        "static"
    }

    fn query(&self, package: &str) -> Option<PackageInfo> {
        self.packages.get(package).cloned()
    }
}

/// 항상 `None`을 반환하는 조회
#[derive(Debug, Clone, Copy, Default)]
pub struct NoLookup;

impl AuthoritativeLookup for NoLookup {
    fn name(&self) -> &str {
        "none"
    }

    fn query(&self, _package: &str) -> Option<PackageInfo> {
        None
    }
}
