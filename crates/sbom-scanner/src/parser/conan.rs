//! conanfile.txt 파서
//!
//! `[requires]` 섹션의 `name/version` 줄만 읽습니다. 다른 섹션 헤더가 나오면
//! 섹션이 끝납니다.
//!
//! ```text
//! [requires]
//! zlib/1.2.13
//! openssl/3.1.0@conan/stable#rev
//!
//! [generators]
//! CMakeDeps
//! ```

use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use crate::error::SbomScannerError;
use crate::parser::{ManifestParser, file_name_is};
use crate::types::{Dependency, DependencyKind, Provenance};
use crate::vuln::version::clean_version;

static REQUIRES_HEADER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*\[requires\]\s*$").expect("valid section regex"));

static REQUIREMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*([^/\s]+)/([^#\s]+)").expect("valid requirement regex"));

/// conanfile.txt 파서
pub struct ConanfileParser;

impl ManifestParser for ConanfileParser {
    fn kind(&self) -> DependencyKind {
        DependencyKind::Conan
    }

    fn can_parse(&self, path: &Path) -> bool {
        file_name_is(path, "conanfile.txt")
    }

    fn parse(&self, content: &str, source_path: &str) -> Result<Vec<Dependency>, SbomScannerError> {
        let mut deps = Vec::new();
        let mut in_requires = false;

        for line in content.lines() {
            if REQUIRES_HEADER.is_match(line) {
                in_requires = true;
                continue;
            }
            let trimmed = line.trim_start();
            if trimmed.starts_with('[') && trimmed.contains(']') {
                in_requires = false;
                continue;
            }
            if !in_requires {
                continue;
            }
            if let Some(caps) = REQUIREMENT.captures(line) {
                deps.push(Dependency::declared(
                    &caps[1],
                    clean_version(&caps[2]),
                    DependencyKind::Conan,
                    Provenance::Manifest,
                ));
            }
        }

        debug!(path = source_path, count = deps.len(), "parsed conanfile");
        Ok(deps)
    }
}
