//! vcpkg.json 파서
//!
//! [`VcpkgManifestParser`]는 `dependencies` 배열의 각 항목을 선언된 의존성으로 변환합니다.
//!
//! # vcpkg.json 형식 예시
//!
//! ```json
//! {
//!   "name": "my-app",
//!   "dependencies": [
//!     "fmt",
//!     { "name": "nlohmann-json", "version>=": "3.11.2" },
//!     { "name": "zlib", "version-string": "1.2.13#1" }
//!   ]
//! }
//! ```

use std::path::Path;

use serde_json::Value;
use tracing::debug;

use crate::error::SbomScannerError;
use crate::parser::{ManifestParser, file_name_is};
use crate::types::{Dependency, DependencyKind, Provenance, VERSION_LATEST, VERSION_UNKNOWN};
use crate::vuln::version::clean_version;

/// 버전 필드 우선순위
const VERSION_KEYS: [&str; 3] = ["version-string", "version>=", "version"];

/// vcpkg.json 파서
pub struct VcpkgManifestParser;

impl ManifestParser for VcpkgManifestParser {
    fn kind(&self) -> DependencyKind {
        DependencyKind::Vcpkg
    }

    fn can_parse(&self, path: &Path) -> bool {
        file_name_is(path, "vcpkg.json")
    }

    fn parse(&self, content: &str, source_path: &str) -> Result<Vec<Dependency>, SbomScannerError> {
        let manifest: Value =
            serde_json::from_str(content).map_err(|e| SbomScannerError::ManifestParse {
                path: source_path.to_owned(),
                reason: e.to_string(),
            })?;

        let Some(entries) = manifest.get("dependencies").and_then(Value::as_array) else {
            debug!(path = source_path, "vcpkg manifest has no dependencies array");
            return Ok(Vec::new());
        };

        let deps: Vec<Dependency> = entries
            .iter()
            .filter_map(parse_entry)
            .filter(|(name, _)| !name.is_empty())
            .map(|(name, version)| {
                Dependency::declared(name, version, DependencyKind::Vcpkg, Provenance::Manifest)
            })
            .collect();

        debug!(path = source_path, count = deps.len(), "parsed vcpkg manifest");
        Ok(deps)
    }
}

/// 배열 항목 하나를 (이름, 버전)으로 변환합니다. 문자열도 객체도 아니면 건너뜁니다.
fn parse_entry(entry: &Value) -> Option<(String, String)> {
    match entry {
        Value::String(name) => Some((name.clone(), VERSION_LATEST.to_owned())),
        Value::Object(obj) => {
            let name = obj
                .get("name")
                .and_then(Value::as_str)
                .unwrap_or(VERSION_UNKNOWN)
                .to_owned();
            let version = VERSION_KEYS
                .iter()
                .find_map(|key| obj.get(*key).and_then(Value::as_str))
                .map_or_else(|| VERSION_LATEST.to_owned(), clean_version);
            Some((name, version))
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(content: &str) -> Vec<Dependency> {
        VcpkgManifestParser.parse(content, "vcpkg.json").unwrap()
    }

    #[test]
    fn string_entries_are_latest() {
        let deps = parse(r#"{ "dependencies": ["fmt", "spdlog"] }"#);
        assert_eq!(deps.len(), 2);
        assert_eq!(deps[0].name, "fmt");
        assert_eq!(deps[0].version, "latest");
        assert_eq!(deps[0].kind, DependencyKind::Vcpkg);
        assert_eq!(deps[0].source, Provenance::Manifest);
    }

    #[test]
    fn object_entries_use_version_priority() {
        let deps = parse(
            r#"{ "dependencies": [
                { "name": "zlib", "version-string": "1.2.13#1", "version": "9.9.9" },
                { "name": "nlohmann-json", "version>=": "3.11.2" },
                { "name": "boost", "version": "1.83.0" },
                { "name": "openssl" }
            ] }"#,
        );
        let versions: Vec<_> = deps.iter().map(|d| d.version.as_str()).collect();
        assert_eq!(versions, vec!["1.2.13", "3.11.2", "1.83.0", "latest"]);
    }

    #[test]
    fn object_without_name_defaults_to_unknown() {
        let deps = parse(r#"{ "dependencies": [{ "version": "1.0" }] }"#);
        assert_eq!(deps[0].name, "unknown");
    }

    #[test]
    fn empty_names_and_other_values_are_dropped() {
        let deps = parse(r#"{ "dependencies": ["", 42, null, { "name": "" }, "fmt"] }"#);
        assert_eq!(deps.len(), 1);
        assert_eq!(deps[0].name, "fmt");
    }

    #[test]
    fn missing_dependencies_is_empty() {
        assert!(parse(r#"{ "name": "app" }"#).is_empty());
        assert!(parse(r#"{ "dependencies": {} }"#).is_empty());
    }

    #[test]
    fn malformed_json_is_error() {
        let result = VcpkgManifestParser.parse("{ not json", "/p/vcpkg.json");
        match result {
            Err(SbomScannerError::ManifestParse { path, .. }) => assert_eq!(path, "/p/vcpkg.json"),
            other => panic!("expected ManifestParse, got {other:?}"),
        }
    }
}
