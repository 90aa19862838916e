//! 이름 매칭 정책 -- 병합 규칙과 헤더/라이브러리 귀속 규칙
//!
//! 상관 분석 엔진은 제어 흐름만 담당하고, "이 이름이 이 경로와 관련 있는가"의 판단은
//! [`MatchPolicy`] 구현에 위임합니다.
//!
//! - [`LegacyMatchPolicy`]: 부분 문자열 기반 병합, 토큰/부분 문자열 헤더 대체 매칭 (기본값)
//! - [`StrictMatchPolicy`]: 정확한 이름 일치만 병합, 대체 매칭 없음

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// 이름 매칭 정책
pub trait MatchPolicy: Send + Sync {
    /// 정책 이름
    fn name(&self) -> &'static str;

    /// 누적된 레코드(`existing`)와 새 레코드(`incoming`)를 병합해야 하는지 판단합니다.
    fn should_merge(&self, existing: &str, incoming: &str) -> bool;

    /// `/<name>/`, `/<name>.h`, `/<name>.hpp` 경로 조각 일치 (대소문자 무시)
    fn header_exact(&self, header: &str, name: &str) -> bool;

    /// 이름을 토큰으로 나눈 뒤 `/<token>/` 일치
    fn header_token(&self, header: &str, name: &str) -> bool;

    /// 헤더 경로에 이름이 포함되는지 (마지막 대체 규칙)
    fn header_loose(&self, header: &str, name: &str) -> bool;

    /// 라이브러리 파일명이 의존성 이름에 속하는지
    fn library_matches(&self, library: &str, name: &str) -> bool;
}

/// 설정에서 선택하는 정책 종류
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchPolicyKind {
    /// [`LegacyMatchPolicy`]
    #[default]
    Legacy,
    /// [`StrictMatchPolicy`]
    Strict,
}

impl MatchPolicyKind {
    /// 문자열에서 정책 종류를 파싱합니다.
    pub fn from_str_loose(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "legacy" | "loose" | "default" => Some(Self::Legacy),
            "strict" | "exact" => Some(Self::Strict),
            _ => None,
        }
    }

    /// 정책 인스턴스를 생성합니다.
    pub fn build(self) -> Arc<dyn MatchPolicy> {
        match self {
            Self::Legacy => Arc::new(LegacyMatchPolicy),
            Self::Strict => Arc::new(StrictMatchPolicy),
        }
    }
}

impl fmt::Display for MatchPolicyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Legacy => write!(f, "legacy"),
            Self::Strict => write!(f, "strict"),
        }
    }
}

/// 대소문자를 무시한 부분 문자열 포함 여부 (ASCII)
pub fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack
        .to_ascii_lowercase()
        .contains(&needle.to_ascii_lowercase())
}

/// 선행 `lib` 접두사를 제거합니다.
pub fn strip_lib_prefix(name: &str) -> &str {
    name.strip_prefix("lib").unwrap_or(name)
}

/// 이름을 매칭 토큰으로 나눕니다.
///
/// `_`와 `-`를 구분자로 취급하며, 3자 미만 토큰과 `lib`는 제외합니다.
pub fn name_tokens(name: &str) -> Vec<&str> {
    name.split(|c: char| c == '_' || c == '-' || c.is_whitespace())
        .filter(|t| t.len() >= 3 && *t != "lib")
        .collect()
}

fn exact_segment_match(header: &str, name: &str) -> bool {
    if name.is_empty() {
        return false;
    }
    let header = header.to_ascii_lowercase();
    let name = name.to_ascii_lowercase();
    header.contains(&format!("/{name}/"))
        || header.contains(&format!("/{name}.h"))
        || header.contains(&format!("/{name}.hpp"))
}

/// 부분 문자열 기반 정책 (기본값)
///
/// 이름이 같거나 한쪽이 다른 쪽의 부분 문자열이면 병합합니다.
/// 예를 들어 `json`과 `nlohmann_json`은 같은 의존성으로 취급됩니다.
#[derive(Debug, Clone, Copy, Default)]
pub struct LegacyMatchPolicy;

impl MatchPolicy for LegacyMatchPolicy {
    fn name(&self) -> &'static str {
        "legacy"
    }

    fn should_merge(&self, existing: &str, incoming: &str) -> bool {
        if existing.is_empty() || incoming.is_empty() {
            return existing == incoming && !existing.is_empty();
        }
        existing == incoming || incoming.contains(existing) || existing.contains(incoming)
    }

    fn header_exact(&self, header: &str, name: &str) -> bool {
        exact_segment_match(header, name)
    }

    fn header_token(&self, header: &str, name: &str) -> bool {
        name_tokens(name)
            .iter()
            .any(|token| contains_ignore_case(header, &format!("/{token}/")))
    }

    fn header_loose(&self, header: &str, name: &str) -> bool {
        !name.is_empty() && contains_ignore_case(header, name)
    }

    fn library_matches(&self, library: &str, name: &str) -> bool {
        let wanted = strip_lib_prefix(name);
        !wanted.is_empty() && strip_lib_prefix(library).starts_with(wanted)
    }
}

/// 정확한 이름 일치만 허용하는 정책
///
/// 병합은 이름이 같을 때만, 헤더는 경로 조각 일치만,
/// 라이브러리는 `lib` 접두사와 첫 `.` 이후를 제외한 이름이 같을 때만 귀속됩니다.
#[derive(Debug, Clone, Copy, Default)]
pub struct StrictMatchPolicy;

impl MatchPolicy for StrictMatchPolicy {
    fn name(&self) -> &'static str {
        "strict"
    }

    fn should_merge(&self, existing: &str, incoming: &str) -> bool {
        !existing.is_empty() && existing == incoming
    }

    fn header_exact(&self, header: &str, name: &str) -> bool {
        exact_segment_match(header, name)
    }

    fn header_token(&self, _header: &str, _name: &str) -> bool {
        false
    }

    fn header_loose(&self, _header: &str, _name: &str) -> bool {
        false
    }

    fn library_matches(&self, library: &str, name: &str) -> bool {
        let wanted = strip_lib_prefix(name);
        if wanted.is_empty() {
            return false;
        }
        let stem = strip_lib_prefix(library);
        let stem = stem.split_once('.').map_or(stem, |(head, _)| head);
        stem == wanted
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn legacy_merges_on_substring_both_ways() {
        let p = LegacyMatchPolicy;
        assert!(p.should_merge("json", "nlohmann_json"));
        assert!(p.should_merge("nlohmann_json", "json"));
        assert!(p.should_merge("fmt", "fmt"));
        assert!(!p.should_merge("fmt", "spdlog"));
    }

    #[test]
    fn legacy_never_merges_empty_names() {
        let p = LegacyMatchPolicy;
        assert!(!p.should_merge("", "fmt"));
        assert!(!p.should_merge("fmt", ""));
        assert!(!p.should_merge("", ""));
    }

    #[test]
    fn strict_merges_only_equal_names() {
        let p = StrictMatchPolicy;
        assert!(p.should_merge("fmt", "fmt"));
        assert!(!p.should_merge("json", "nlohmann_json"));
    }

    #[test]
    fn exact_header_forms() {
        let p = LegacyMatchPolicy;
        assert!(p.header_exact("/usr/include/fmt/core.h", "fmt"));
        assert!(p.header_exact("/usr/include/zlib.h", "zlib"));
        assert!(p.header_exact("/opt/inc/Catch.hpp", "catch"));
        assert!(p.header_exact("/usr/include/FMT/core.h", "fmt"));
        assert!(!p.header_exact("/usr/include/fmtlib/core.h", "fmt"));
        assert!(!p.header_exact("/usr/include/fmt/core.h", ""));
    }

    #[test]
    fn token_header_match_skips_short_and_lib_tokens() {
        let p = LegacyMatchPolicy;
        assert!(p.header_token("/usr/include/nlohmann/json.hpp", "nlohmann_json"));
        assert!(p.header_token("/usr/include/Boost/asio.hpp", "boost-asio"));
        // "io" 는 3자 미만, "lib" 는 제외
        assert!(!p.header_token("/usr/include/io/x.h", "lib_io"));
        assert!(!p.header_token("/usr/include/lib/x.h", "lib-io"));
    }

    #[test]
    fn name_tokens_split_on_separators() {
        assert_eq!(name_tokens("nlohmann_json"), vec!["nlohmann", "json"]);
        assert_eq!(name_tokens("lib-ssl_io"), vec!["ssl"]);
        assert!(name_tokens("").is_empty());
    }

    #[test]
    fn loose_header_match_is_plain_substring() {
        let p = LegacyMatchPolicy;
        assert!(p.header_loose("/usr/include/libpng16/png.h", "png"));
        assert!(!p.header_loose("/usr/include/foo.h", ""));
        assert!(!StrictMatchPolicy.header_loose("/usr/include/libpng16/png.h", "png"));
    }

    #[test]
    fn legacy_library_prefix_match() {
        let p = LegacyMatchPolicy;
        assert!(p.library_matches("libfmt.so.9", "fmt"));
        assert!(p.library_matches("libfmt.so.9", "libfmt"));
        assert!(p.library_matches("libfmtd.so", "fmt"));
        assert!(!p.library_matches("libz.so.1", "zlib"));
    }

    #[test]
    fn library_match_ignores_lib_only_names() {
        assert!(!LegacyMatchPolicy.library_matches("libc.so.6", "lib"));
        assert!(!LegacyMatchPolicy.library_matches("libc.so.6", ""));
        assert!(!StrictMatchPolicy.library_matches("libc.so.6", "lib"));
    }

    #[test]
    fn strict_library_match_requires_exact_stem() {
        let p = StrictMatchPolicy;
        assert!(p.library_matches("libfmt.so.9", "fmt"));
        assert!(!p.library_matches("libfmtd.so", "fmt"));
        assert!(p.library_matches("libssl.so.3", "libssl"));
    }

    #[test]
    fn policy_kind_parses_and_builds() {
        assert_eq!(MatchPolicyKind::from_str_loose("STRICT"), Some(MatchPolicyKind::Strict));
        assert_eq!(MatchPolicyKind::from_str_loose("legacy"), Some(MatchPolicyKind::Legacy));
        assert_eq!(MatchPolicyKind::from_str_loose("fuzzy"), None);
        assert_eq!(MatchPolicyKind::Strict.build().name(), "strict");
        assert_eq!(MatchPolicyKind::default().build().name(), "legacy");
    }
}
