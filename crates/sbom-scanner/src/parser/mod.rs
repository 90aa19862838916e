//! 매니페스트 파서 -- vcpkg.json, conanfile.txt, libs.txt
//!
//! [`ManifestParser`] trait은 각 매니페스트 형식의 파서가 구현해야 하는 인터페이스입니다.
//! [`ManifestDetector`]는 파일 이름으로 매니페스트 종류를 판별합니다.
//!
//! # 지원 형식
//!
//! - `vcpkg.json` (JSON) -- [`VcpkgManifestParser`]
//! - `conanfile.txt` (INI 유사) -- [`ConanfileParser`]
//! - `libs.txt` (CMake 링크 타깃 목록) -- [`CmakeLibsParser`]
//!
//! # 확장
//!
//! 새로운 형식을 지원하려면 `ManifestParser` trait을 구현하고
//! `ManifestDetector`에 등록합니다.

pub mod cmake_libs;
pub mod conan;
pub mod vcpkg;

use std::path::Path;

use crate::error::SbomScannerError;
use crate::types::{Dependency, DependencyKind};

pub use cmake_libs::CmakeLibsParser;
pub use conan::ConanfileParser;
pub use vcpkg::VcpkgManifestParser;

/// 매니페스트 파서 trait
///
/// 매니페스트 내용을 파싱해 선언된 의존성 목록을 생성합니다.
pub trait ManifestParser: Send + Sync {
    /// 이 파서가 생성하는 의존성 유형
    fn kind(&self) -> DependencyKind;

    /// 주어진 경로의 파일을 이 파서가 처리할 수 있는지 확인합니다.
    fn can_parse(&self, path: &Path) -> bool;

    /// 매니페스트 내용을 파싱합니다.
    ///
    /// # Arguments
    ///
    /// - `content`: 파일 내용 (UTF-8 문자열)
    /// - `source_path`: 원본 파일 경로 (에러 메시지, 주변 빌드 트리 탐색용)
    fn parse(&self, content: &str, source_path: &str) -> Result<Vec<Dependency>, SbomScannerError>;
}

/// 파일 이름이 `expected`와 같은지 확인합니다.
pub(crate) fn file_name_is(path: &Path, expected: &str) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|name| name == expected)
}

/// 매니페스트 탐지기
pub struct ManifestDetector {
    known_filenames: Vec<(String, DependencyKind)>,
}

impl ManifestDetector {
    /// 기본 매니페스트 파일명으로 탐지기를 생성합니다.
    pub fn new() -> Self {
        Self {
            known_filenames: vec![
                ("vcpkg.json".to_owned(), DependencyKind::Vcpkg),
                ("conanfile.txt".to_owned(), DependencyKind::Conan),
                ("libs.txt".to_owned(), DependencyKind::CmakeTarget),
            ],
        }
    }

    /// 알려진 매니페스트 파일명 목록
    pub fn known_filenames(&self) -> &[(String, DependencyKind)] {
        &self.known_filenames
    }

    /// 주어진 경로가 알려진 매니페스트인지 확인합니다.
    pub fn is_manifest(&self, path: &Path) -> bool {
        self.detect_kind(path).is_some()
    }

    /// 매니페스트 종류를 반환합니다.
    pub fn detect_kind(&self, path: &Path) -> Option<DependencyKind> {
        let file_name = path.file_name().and_then(|n| n.to_str())?;

        self.known_filenames
            .iter()
            .find(|(known, _)| known == file_name)
            .map(|(_, kind)| *kind)
    }

    /// 종류에 맞는 파서를 반환합니다.
    pub fn parser_for(kind: DependencyKind) -> Option<Box<dyn ManifestParser>> {
        match kind {
            DependencyKind::Vcpkg => Some(Box::new(VcpkgManifestParser)),
            DependencyKind::Conan => Some(Box::new(ConanfileParser)),
            DependencyKind::CmakeTarget => Some(Box::new(CmakeLibsParser)),
            DependencyKind::System => None,
        }
    }
}

impl Default for ManifestDetector {
    fn default() -> Self {
        Self::new()
    }
}
