//! libs.txt 파서 -- CMake 링크 타깃 목록
//!
//! 빌드 스크립트가 내보낸 `;` 구분 링크 타깃 목록의 첫 줄을 읽습니다.
//! 경로(`/` 포함)와 링커 플래그(`-` 시작)는 건너뜁니다.
//!
//! 각 타깃에 대해 libs.txt가 있는 빌드 디렉토리에서 버전 메타데이터를 찾습니다.
//!
//! | 위치 | 정보 |
//! |------|------|
//! | `_deps/json-src/include/nlohmann/json.hpp` | `NLOHMANN_JSON_VERSION_*` → 버전, MIT |
//! | `_deps/fmt-src/include/fmt/core.h` | `FMT_VERSION` 정수 → 버전, MIT |
//! | `vcpkg_installed/x64-linux/share/<name>/vcpkg.json` | `version-string`/`version`, `license` |

use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;
use tracing::{debug, trace};

use crate::error::SbomScannerError;
use crate::parser::{ManifestParser, file_name_is};
use crate::types::{Dependency, DependencyKind, Provenance, VERSION_UNKNOWN};

static NLOHMANN_VERSION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?s)#define\s+NLOHMANN_JSON_VERSION_MAJOR\s+(\d+).*?#define\s+NLOHMANN_JSON_VERSION_MINOR\s+(\d+).*?#define\s+NLOHMANN_JSON_VERSION_PATCH\s+(\d+)",
    )
    .expect("valid nlohmann version regex")
});

static FMT_VERSION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"#define\s+FMT_VERSION\s+(\d+)").expect("valid fmt version regex"));

/// Qt 타깃 기본 버전
const QT_SYSTEM_VERSION: &str = "System/Qt";

/// Qt 타깃 기본 라이선스
const QT_DEFAULT_LICENSE: &str = "LGPL-3.0";

/// 빌드 트리에서 찾은 메타데이터
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetMetadata {
    /// 버전 (찾지 못하면 `unknown`)
    pub version: String,
    /// 라이선스 (찾지 못하면 `unknown`)
    pub license: String,
}

/// libs.txt 파서
pub struct CmakeLibsParser;

impl ManifestParser for CmakeLibsParser {
    fn kind(&self) -> DependencyKind {
        DependencyKind::CmakeTarget
    }

    fn can_parse(&self, path: &Path) -> bool {
        file_name_is(path, "libs.txt")
    }

    fn parse(&self, content: &str, source_path: &str) -> Result<Vec<Dependency>, SbomScannerError> {
        let build_dir = Path::new(source_path)
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));

        let first_line = content.lines().next().unwrap_or_default();
        let deps: Vec<Dependency> = first_line
            .split(';')
            .map(str::trim)
            .filter(|entry| !entry.is_empty() && !entry.contains('/') && !entry.starts_with('-'))
            .map(|target| declare_target(target, build_dir))
            .collect();

        debug!(
            path = source_path,
            build_dir = %build_dir.display(),
            count = deps.len(),
            "parsed cmake link targets"
        );
        Ok(deps)
    }
}

/// 타깃 하나를 빌드 메타데이터와 함께 선언된 의존성으로 변환합니다.
fn declare_target(target: &str, build_dir: &Path) -> Dependency {
    let mut dep = Dependency::declared(
        target,
        VERSION_UNKNOWN,
        DependencyKind::CmakeTarget,
        Provenance::CmakeTarget,
    );

    let meta = probe_metadata(target, build_dir);
    if meta.version != VERSION_UNKNOWN {
        dep.version = meta.version;
        dep.source = Provenance::CmakeFetchContent;
    }
    if meta.license != VERSION_UNKNOWN {
        dep.licenses.push(meta.license);
    }

    if target.starts_with("Qt") {
        if dep.version == VERSION_UNKNOWN {
            dep.version = QT_SYSTEM_VERSION.to_owned();
        }
        if dep.licenses.is_empty() {
            dep.licenses.push(QT_DEFAULT_LICENSE.to_owned());
        }
    }
    dep
}

/// 타깃 이름의 정규화된 형태 (`ns::target` → `ns`, 소문자)
pub fn clean_target_name(target: &str) -> String {
    target
        .split_once("::")
        .map_or(target, |(ns, _)| ns)
        .to_lowercase()
}

/// 빌드 디렉토리에서 타깃의 버전과 라이선스를 찾습니다.
pub fn probe_metadata(target: &str, build_dir: &Path) -> TargetMetadata {
    let clean = clean_target_name(target);
    let deps_dir = build_dir.join("_deps");

    if deps_dir.is_dir() {
        if clean.contains("nlohmann") || clean.contains("json") {
            let header = deps_dir.join("json-src/include/nlohmann/json.hpp");
            if let Some(version) = read_nlohmann_version(&header) {
                return TargetMetadata {
                    version,
                    license: "MIT".to_owned(),
                };
            }
        }
        if clean == "fmt" {
            let header = deps_dir.join("fmt-src/include/fmt/core.h");
            if let Some(version) = read_fmt_version(&header) {
                return TargetMetadata {
                    version,
                    license: "MIT".to_owned(),
                };
            }
        }
    }

    let port_manifest = build_dir
        .join("vcpkg_installed/x64-linux/share")
        .join(&clean)
        .join("vcpkg.json");
    read_port_manifest(&port_manifest).unwrap_or_else(|| TargetMetadata {
        version: VERSION_UNKNOWN.to_owned(),
        license: VERSION_UNKNOWN.to_owned(),
    })
}

fn read_nlohmann_version(header: &Path) -> Option<String> {
    let content = std::fs::read_to_string(header).ok()?;
    let caps = NLOHMANN_VERSION.captures(&content)?;
    trace!(path = %header.display(), "found nlohmann_json version defines");
    Some(format!("{}.{}.{}", &caps[1], &caps[2], &caps[3]))
}

fn read_fmt_version(header: &Path) -> Option<String> {
    let content = std::fs::read_to_string(header).ok()?;
    let raw: u64 = FMT_VERSION.captures(&content)?[1].parse().ok()?;
    trace!(path = %header.display(), raw, "found FMT_VERSION define");
    Some(fmt_version_string(raw))
}

/// `FMT_VERSION` 정수(예: 100101)를 `10.1.1` 형태로 변환합니다.
pub fn fmt_version_string(raw: u64) -> String {
    format!("{}.{}.{}", raw / 10_000, (raw % 10_000) / 100, raw % 100)
}

fn read_port_manifest(path: &Path) -> Option<TargetMetadata> {
    let content = std::fs::read_to_string(path).ok()?;
    let json: Value = serde_json::from_str(&content).ok()?;
    let field = |key: &str| json.get(key).and_then(Value::as_str).map(str::to_owned);
    Some(TargetMetadata {
        version: field("version-string")
            .or_else(|| field("version"))
            .unwrap_or_else(|| VERSION_UNKNOWN.to_owned()),
        license: field("license").unwrap_or_else(|| VERSION_UNKNOWN.to_owned()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_in(dir: &Path, content: &str) -> Vec<Dependency> {
        let path = dir.join("libs.txt");
        CmakeLibsParser
            .parse(content, &path.display().to_string())
            .unwrap()
    }

    #[test]
    fn first_line_split_and_filtered() {
        let dir = tempfile::tempdir().unwrap();
        let deps = parse_in(
            dir.path(),
            "fmt::fmt;;/usr/lib/libm.so;-lpthread;spdlog::spdlog\nignored;line\n",
        );
        let names: Vec<_> = deps.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["fmt::fmt", "spdlog::spdlog"]);
        assert!(deps.iter().all(|d| d.kind == DependencyKind::CmakeTarget));
        assert!(deps.iter().all(|d| d.source == Provenance::CmakeTarget));
        assert!(deps.iter().all(|d| d.version == "unknown"));
    }

    #[test]
    fn empty_content_yields_nothing() {
        let dir = tempfile::tempdir().unwrap();
        assert!(parse_in(dir.path(), "").is_empty());
    }

    #[test]
    fn clean_target_name_takes_namespace() {
        assert_eq!(clean_target_name("nlohmann_json::nlohmann_json"), "nlohmann_json");
        assert_eq!(clean_target_name("ZLIB::ZLIB"), "zlib");
        assert_eq!(clean_target_name("pthread"), "pthread");
    }

    #[test]
    fn fmt_version_decoding() {
        assert_eq!(fmt_version_string(100101), "10.1.1");
        assert_eq!(fmt_version_string(90100), "9.1.0");
    }

    #[test]
    fn fetchcontent_nlohmann_header_sets_version_and_license() {
        let dir = tempfile::tempdir().unwrap();
        let include = dir.path().join("_deps/json-src/include/nlohmann");
        std::fs::create_dir_all(&include).unwrap();
        std::fs::write(
            include.join("json.hpp"),
            "#define NLOHMANN_JSON_VERSION_MAJOR 3\n\
             #define NLOHMANN_JSON_VERSION_MINOR 11\n\
             #define NLOHMANN_JSON_VERSION_PATCH 2\n",
        )
        .unwrap();

        let deps = parse_in(dir.path(), "nlohmann_json::nlohmann_json");
        assert_eq!(deps[0].version, "3.11.2");
        assert_eq!(deps[0].source, Provenance::CmakeFetchContent);
        assert_eq!(deps[0].licenses, vec!["MIT"]);
    }

    #[test]
    fn fetchcontent_fmt_header_sets_version() {
        let dir = tempfile::tempdir().unwrap();
        let include = dir.path().join("_deps/fmt-src/include/fmt");
        std::fs::create_dir_all(&include).unwrap();
        std::fs::write(include.join("core.h"), "#define FMT_VERSION 100101\n").unwrap();

        let deps = parse_in(dir.path(), "fmt::fmt");
        assert_eq!(deps[0].version, "10.1.1");
        assert_eq!(deps[0].licenses, vec!["MIT"]);
    }

    #[test]
    fn vcpkg_installed_port_manifest() {
        let dir = tempfile::tempdir().unwrap();
        let share = dir.path().join("vcpkg_installed/x64-linux/share/zlib");
        std::fs::create_dir_all(&share).unwrap();
        std::fs::write(
            share.join("vcpkg.json"),
            r#"{ "name": "zlib", "version": "1.3", "license": "Zlib" }"#,
        )
        .unwrap();

        let deps = parse_in(dir.path(), "ZLIB::ZLIB");
        assert_eq!(deps[0].version, "1.3");
        assert_eq!(deps[0].source, Provenance::CmakeFetchContent);
        assert_eq!(deps[0].licenses, vec!["Zlib"]);
    }

    #[test]
    fn port_manifest_without_license_keeps_licenses_empty() {
        let dir = tempfile::tempdir().unwrap();
        let share = dir.path().join("vcpkg_installed/x64-linux/share/spdlog");
        std::fs::create_dir_all(&share).unwrap();
        std::fs::write(share.join("vcpkg.json"), r#"{ "version-string": "1.12.0" }"#).unwrap();

        let deps = parse_in(dir.path(), "spdlog::spdlog");
        assert_eq!(deps[0].version, "1.12.0");
        assert!(deps[0].licenses.is_empty());
    }

    #[test]
    fn qt_targets_get_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let deps = parse_in(dir.path(), "Qt6::Widgets");
        assert_eq!(deps[0].version, "System/Qt");
        assert_eq!(deps[0].licenses, vec!["LGPL-3.0"]);
        assert_eq!(deps[0].source, Provenance::CmakeTarget);
    }

    #[test]
    fn relative_source_path_uses_current_dir() {
        let deps = CmakeLibsParser.parse("pthread", "libs.txt").unwrap();
        assert_eq!(deps[0].name, "pthread");
    }
}
