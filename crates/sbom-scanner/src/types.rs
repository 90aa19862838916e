//! 도메인 타입 -- 의존성 레코드와 출처 정보
//!
//! 선언된 의존성, 합성 시스템 의존성, CVE 레코드 등 스캐너 전반에서 쓰는 타입을 정의합니다.

use std::fmt;

use serde::{Deserialize, Serialize};

/// 버전을 알 수 없음을 나타내는 자리표시자
pub const VERSION_UNKNOWN: &str = "unknown";

/// 버전 미지정(최신)을 나타내는 자리표시자
pub const VERSION_LATEST: &str = "latest";

/// 자리표시자 버전인지 확인합니다.
pub fn is_placeholder_version(version: &str) -> bool {
    version == VERSION_UNKNOWN || version == VERSION_LATEST
}

/// 의존성 선언 유형 (매니페스트 종류)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DependencyKind {
    /// vcpkg.json
    Vcpkg,
    /// conanfile.txt
    Conan,
    /// CMake 링크 타깃 (libs.txt)
    CmakeTarget,
    /// 바이너리에서만 발견된 시스템 라이브러리
    System,
}

impl DependencyKind {
    /// 리포트에 쓰는 문자열 표현
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Vcpkg => "vcpkg",
            Self::Conan => "conan",
            Self::CmakeTarget => "cmake_target",
            Self::System => "system",
        }
    }
}

impl fmt::Display for DependencyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 레코드 데이터의 출처
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Provenance {
    /// 매니페스트 선언
    #[serde(rename = "manifest")]
    Manifest,
    /// CMake 타깃 이름만 알려진 경우
    #[serde(rename = "cmake_target")]
    CmakeTarget,
    /// 빌드 트리 메타데이터(FetchContent, vcpkg_installed)에서 버전 확인
    #[serde(rename = "cmake_fetchcontent/vcpkg")]
    CmakeFetchContent,
    /// pkg-config 조회 결과
    #[serde(rename = "pkgconfig")]
    PkgConfig,
    /// 바이너리 스캔
    #[serde(rename = "elf_scan")]
    ElfScan,
}

impl Provenance {
    /// 리포트에 쓰는 문자열 표현
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Manifest => "manifest",
            Self::CmakeTarget => "cmake_target",
            Self::CmakeFetchContent => "cmake_fetchcontent/vcpkg",
            Self::PkgConfig => "pkgconfig",
            Self::ElfScan => "elf_scan",
        }
    }
}

impl fmt::Display for Provenance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 의존성 하나에 첨부되는 취약점 조회 결과
///
/// 조회를 하지 못했거나 취약점이 없는 경우에도 `NOT-CHECKED`, `SAFE`,
/// `CHECK-ERROR` 같은 표식 레코드로 결과를 남깁니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CveRecord {
    /// 취약점 ID 또는 표식
    pub id: String,
    /// 요약
    pub summary: String,
    /// 심각도 문자열
    pub severity: String,
    /// 수정 버전 (없으면 빈 문자열)
    pub fixed_version: String,
}

impl CveRecord {
    /// 실제 취약점이 아닌 표식 레코드인지 확인합니다.
    pub fn is_sentinel(&self) -> bool {
        matches!(self.id.as_str(), "NOT-CHECKED" | "SAFE" | "CHECK-ERROR")
    }
}

/// 의존성 레코드
///
/// 매니페스트 파서가 생성하고, 상관 분석 단계에서 버전/출처/헤더/라이브러리가,
/// 보강 단계에서 라이선스/취약점이 채워집니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dependency {
    /// 이름
    pub name: String,
    /// 버전 또는 자리표시자
    pub version: String,
    /// 선언 유형
    #[serde(rename = "type")]
    pub kind: DependencyKind,
    /// 출처
    pub source: Provenance,
    /// 귀속된 헤더 절대 경로
    pub headers: Vec<String>,
    /// 귀속된 공유 라이브러리 이름
    pub libraries: Vec<String>,
    /// 라이선스
    pub licenses: Vec<String>,
    /// 취약점 조회 결과
    pub cves: Vec<CveRecord>,
}

impl Dependency {
    /// 매니페스트에서 선언된 의존성을 생성합니다.
    pub fn declared(
        name: impl Into<String>,
        version: impl Into<String>,
        kind: DependencyKind,
        source: Provenance,
    ) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            kind,
            source,
            headers: Vec::new(),
            libraries: Vec::new(),
            licenses: Vec::new(),
            cves: Vec::new(),
        }
    }

    /// 선언되지 않은 라이브러리에 대한 합성 시스템 의존성을 생성합니다.
    ///
    /// 이름은 라이브러리 파일명 그대로이며 해당 라이브러리 하나만 소유합니다.
    pub fn synthetic_system(library: impl Into<String>) -> Self {
        let library = library.into();
        Self {
            name: library.clone(),
            version: VERSION_UNKNOWN.to_owned(),
            kind: DependencyKind::System,
            source: Provenance::ElfScan,
            headers: Vec::new(),
            libraries: vec![library],
            licenses: Vec::new(),
            cves: Vec::new(),
        }
    }

    /// 버전이 자리표시자인지 확인합니다.
    pub fn has_placeholder_version(&self) -> bool {
        is_placeholder_version(&self.version)
    }

    /// 합성 시스템 의존성인지 확인합니다.
    pub fn is_synthetic(&self) -> bool {
        self.kind == DependencyKind::System && self.source == Provenance::ElfScan
    }
}

impl fmt::Display for Dependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}@{} ({}, {})",
            self.name, self.version, self.kind, self.source
        )
    }
}

/// 리포트 출력 형식
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    /// depdiscover 고유 JSON (schema 1.2)
    #[default]
    Native,
    /// CycloneDX 1.5 JSON
    CycloneDx,
}

impl fmt::Display for ReportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Native => write!(f, "native"),
            Self::CycloneDx => write!(f, "cyclonedx"),
        }
    }
}

impl ReportFormat {
    /// 문자열에서 리포트 형식을 파싱합니다.
    pub fn from_str_loose(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "native" | "json" | "depdiscover" => Some(Self::Native),
            "cyclonedx" | "cdx" => Some(Self::CycloneDx),
            _ => None,
        }
    }
}
