//! include 경로 추출, `#include` 스캔, 헤더 경로 해석

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use tracing::trace;

static INCLUDE_FLAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"-I\s*(\S+)").expect("valid include flag regex"));

static INCLUDE_DIRECTIVE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\s*#\s*include\s*[<"]([^>"]+)[>"]"#).expect("valid include directive regex")
});

/// 명령줄에서 `-I<path>`, `-I <path>` 값을 모두 추출합니다.
pub fn extract_include_paths(command: &str) -> Vec<String> {
    INCLUDE_FLAG
        .captures_iter(command)
        .map(|caps| caps[1].to_owned())
        .collect()
}

/// 소스 내용에서 `#include` 대상 이름을 줄 순서대로 추출합니다.
pub fn scan_includes(source: &str) -> Vec<String> {
    source
        .lines()
        .filter_map(|line| INCLUDE_DIRECTIVE.captures(line))
        .map(|caps| caps[1].to_owned())
        .collect()
}

/// 헤더 이름을 실제 파일의 정규화된 절대 경로로 해석합니다.
///
/// 1. 절대 경로면 존재 여부만 확인
/// 2. `include_paths` 순서대로 (상대 경로는 `work_dir` 기준)
/// 3. `system_dirs` 순서대로
///
/// 찾지 못하면 `None`을 반환합니다.
pub fn resolve_header(
    header: &str,
    include_paths: &[String],
    work_dir: &str,
    system_dirs: &[String],
) -> Option<String> {
    let header_path = Path::new(header);
    if header_path.is_absolute() {
        return canonical_if_exists(header_path);
    }

    let from_includes = include_paths.iter().find_map(|inc| {
        let mut base = PathBuf::from(inc);
        if base.is_relative() && !work_dir.is_empty() {
            base = Path::new(work_dir).join(base);
        }
        canonical_if_exists(&base.join(header_path))
    });
    if from_includes.is_some() {
        return from_includes;
    }

    system_dirs
        .iter()
        .find_map(|dir| canonical_if_exists(&Path::new(dir).join(header_path)))
}

fn canonical_if_exists(path: &Path) -> Option<String> {
    if !path.exists() {
        return None;
    }
    let resolved = std::fs::canonicalize(path).ok()?;
    trace!(path = %resolved.display(), "resolved header");
    Some(resolved.to_string_lossy().into_owned())
}
