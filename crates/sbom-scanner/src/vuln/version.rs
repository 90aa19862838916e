//! 버전 정규화와 범위 매칭
//!
//! `semver` 크레이트로 버전이 영향 범위에 포함되는지 확인합니다.
//! C/C++ 패키지는 `1.3`, `v2.0`처럼 SemVer가 아닌 버전이 흔하므로
//! 누락된 구성 요소를 0으로 채워 파싱하고, 그래도 실패하면 문자열 비교로 fallback합니다.

use std::sync::LazyLock;

use regex::Regex;

use super::db::VersionRange;

// 고정 패턴이므로 컴파일 실패는 없음
static VERSION_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+)\.(\d+)(?:\.(\d+))?").expect("valid version regex"));

/// 버전 문자열에서 `major.minor[.patch]` 부분을 추출합니다.
///
/// 일치하는 부분이 없으면 원본을 그대로 반환합니다.
///
/// ```
/// use depdiscover_sbom_scanner::vuln::version::clean_version;
///
/// assert_eq!(clean_version("3.11.2#abc"), "3.11.2");
/// assert_eq!(clean_version("v1.2"), "1.2");
/// assert_eq!(clean_version("main"), "main");
/// ```
pub fn clean_version(raw: &str) -> String {
    VERSION_PATTERN
        .find(raw)
        .map_or_else(|| raw.to_owned(), |m| m.as_str().to_owned())
}

/// 취약점 조회 전 선행 `v`를 제거합니다.
pub fn strip_v_prefix(version: &str) -> &str {
    version.strip_prefix('v').unwrap_or(version)
}

/// 관대한 SemVer 파싱 (`1` → `1.0.0`, `1.2` → `1.2.0`, `v1.2.3` → `1.2.3`)
pub fn parse_lenient(version: &str) -> Option<semver::Version> {
    let version = strip_v_prefix(version.trim());
    if let Ok(v) = semver::Version::parse(version) {
        return Some(v);
    }
    let parts: Vec<&str> = version.split('.').collect();
    let padded = match parts.as_slice() {
        [major] => format!("{major}.0.0"),
        [major, minor] => format!("{major}.{minor}.0"),
        _ => return None,
    };
    semver::Version::parse(&padded).ok()
}

/// 주어진 버전이 영향 범위 중 하나에 포함되는지 확인합니다.
///
/// # 매칭 규칙
///
/// - `introduced`가 None이면 시작 제한 없음
/// - `fixed`가 None이면 아직 수정되지 않음
/// - `introduced <= version < fixed`이면 영향받음
pub fn is_affected(version_str: &str, ranges: &[VersionRange]) -> bool {
    ranges.iter().any(|range| is_in_range(version_str, range))
}

/// 단일 버전 범위에 대해 매칭 여부를 확인합니다.
fn is_in_range(version_str: &str, range: &VersionRange) -> bool {
    if let Some(version) = parse_lenient(version_str) {
        return is_in_range_semver(&version, range);
    }

    is_in_range_string(version_str, range)
}

fn is_in_range_semver(version: &semver::Version, range: &VersionRange) -> bool {
    if let Some(ref introduced) = range.introduced
        && let Some(intro_ver) = parse_lenient(introduced)
        && version < &intro_ver
    {
        return false;
    }

    if let Some(ref fixed) = range.fixed
        && let Some(fix_ver) = parse_lenient(fixed)
        && version >= &fix_ver
    {
        return false;
    }

    true
}

/// 문자열 비교 (SemVer 파싱 실패 시)
fn is_in_range_string(version: &str, range: &VersionRange) -> bool {
    if let Some(ref introduced) = range.introduced
        && version < introduced.as_str()
    {
        return false;
    }

    if let Some(ref fixed) = range.fixed
        && version >= fixed.as_str()
    {
        return false;
    }

    true
}

#[cfg(test)]
mod tests {
    use super::*;

    fn range(introduced: Option<&str>, fixed: Option<&str>) -> VersionRange {
        VersionRange {
            introduced: introduced.map(str::to_owned),
            fixed: fixed.map(str::to_owned),
        }
    }

    #[test]
    fn clean_version_extracts_first_match() {
        assert_eq!(clean_version("3.11.2"), "3.11.2");
        assert_eq!(clean_version("1.2.13#cafe"), "1.2.13");
        assert_eq!(clean_version("release-10.1"), "10.1");
        assert_eq!(clean_version("1.2.3.4"), "1.2.3");
    }

    #[test]
    fn clean_version_keeps_unmatched_input() {
        assert_eq!(clean_version("latest"), "latest");
        assert_eq!(clean_version(""), "");
        assert_eq!(clean_version("7"), "7");
    }

    #[test]
    fn parse_lenient_pads_missing_components() {
        assert_eq!(parse_lenient("1.3"), Some(semver::Version::new(1, 3, 0)));
        assert_eq!(parse_lenient("2"), Some(semver::Version::new(2, 0, 0)));
        assert_eq!(parse_lenient("v1.2.3"), Some(semver::Version::new(1, 2, 3)));
        assert_eq!(parse_lenient("1.1.1w"), None);
        assert_eq!(parse_lenient("unknown"), None);
    }

    #[test]
    fn affected_in_range() {
        let ranges = vec![range(Some("1.0.0"), Some("1.0.5"))];
        assert!(is_affected("1.0.0", &ranges));
        assert!(is_affected("1.0.4", &ranges));
        assert!(!is_affected("0.9.0", &ranges));
        assert!(!is_affected("1.0.5", &ranges));
    }

    #[test]
    fn two_component_versions_compare_numerically() {
        let ranges = vec![range(Some("1.2"), Some("1.3"))];
        assert!(is_affected("1.2.13", &ranges));
        assert!(!is_affected("1.3", &ranges));
        // 문자열 비교였다면 "1.10" < "1.3" 이 됨
        assert!(!is_affected("1.10", &ranges));
    }

    #[test]
    fn open_ended_ranges() {
        assert!(is_affected("99.0.0", &[range(Some("1.0.0"), None)]));
        assert!(is_affected("0.1.0", &[range(None, Some("1.0.5"))]));
        assert!(is_affected("1.0.0", &[range(None, None)]));
    }

    #[test]
    fn empty_ranges_not_affected() {
        assert!(!is_affected("1.0.0", &[]));
    }

    #[test]
    fn multiple_ranges_any_match() {
        let ranges = vec![range(Some("1.0.0"), Some("1.0.5")), range(Some("2.0.0"), Some("2.0.3"))];
        assert!(is_affected("2.0.1", &ranges));
        assert!(!is_affected("1.5.0", &ranges));
    }

    #[test]
    fn non_semver_falls_back_to_string_compare() {
        let ranges = vec![range(Some("1.1.1a"), Some("1.1.1w"))];
        assert!(is_affected("1.1.1k", &ranges));
        assert!(!is_affected("1.1.1w", &ranges));
    }
}
