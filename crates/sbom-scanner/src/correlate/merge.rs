//! 선언된 의존성 병합
//!
//! 새로 파싱한 소스의 레코드를 누적 목록에 하나씩 합칩니다.
//! 병합 대상은 [`MatchPolicy::should_merge`]가 처음 참을 반환하는 누적 레코드입니다.

use tracing::debug;

use super::policy::MatchPolicy;
use crate::types::Dependency;

/// `incoming` 레코드를 `accumulated`에 병합합니다.
///
/// 병합되면 기존 레코드의 식별 필드는 유지하고, 기존 버전이 자리표시자이며
/// 새 버전이 구체적이면 버전만 채웁니다. 병합 대상이 없으면 끝에 추가합니다.
pub fn merge_declared(
    policy: &dyn MatchPolicy,
    accumulated: &mut Vec<Dependency>,
    incoming: Vec<Dependency>,
) {
    for dep in incoming {
        match accumulated
            .iter_mut()
            .find(|existing| policy.should_merge(&existing.name, &dep.name))
        {
            Some(existing) => {
                if existing.has_placeholder_version() && !dep.has_placeholder_version() {
                    debug!(
                        existing = %existing.name,
                        incoming = %dep.name,
                        version = %dep.version,
                        "backfilled version on merge"
                    );
                    existing.version = dep.version;
                } else {
                    debug!(existing = %existing.name, incoming = %dep.name, "merged declared dependency");
                }
            }
            None => accumulated.push(dep),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::correlate::policy::{LegacyMatchPolicy, StrictMatchPolicy};
    use crate::types::{DependencyKind, Provenance};

    fn dep(name: &str, version: &str, kind: DependencyKind) -> Dependency {
        Dependency::declared(name, version, kind, Provenance::Manifest)
    }

    #[test]
    fn substring_merge_backfills_version() {
        let mut acc = vec![dep("json", "unknown", DependencyKind::CmakeTarget)];
        merge_declared(
            &LegacyMatchPolicy,
            &mut acc,
            vec![dep("nlohmann_json", "3.11.2", DependencyKind::Vcpkg)],
        );
        assert_eq!(acc.len(), 1);
        assert_eq!(acc[0].name, "json");
        assert_eq!(acc[0].version, "3.11.2");
        assert_eq!(acc[0].kind, DependencyKind::CmakeTarget);
    }

    #[test]
    fn concrete_version_is_not_overwritten() {
        let mut acc = vec![dep("fmt", "10.1.1", DependencyKind::Vcpkg)];
        merge_declared(
            &LegacyMatchPolicy,
            &mut acc,
            vec![dep("fmt", "9.0.0", DependencyKind::Conan)],
        );
        assert_eq!(acc.len(), 1);
        assert_eq!(acc[0].version, "10.1.1");
    }

    #[test]
    fn placeholder_incoming_does_not_backfill() {
        let mut acc = vec![dep("fmt", "latest", DependencyKind::Vcpkg)];
        merge_declared(
            &LegacyMatchPolicy,
            &mut acc,
            vec![dep("fmt", "unknown", DependencyKind::CmakeTarget)],
        );
        assert_eq!(acc[0].version, "latest");
    }

    #[test]
    fn unrelated_names_are_appended_in_order() {
        let mut acc = vec![dep("fmt", "10.1.1", DependencyKind::Vcpkg)];
        merge_declared(
            &LegacyMatchPolicy,
            &mut acc,
            vec![
                dep("spdlog", "1.12.0", DependencyKind::Conan),
                dep("boost", "1.83.0", DependencyKind::Conan),
            ],
        );
        let names: Vec<_> = acc.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["fmt", "spdlog", "boost"]);
    }

    #[test]
    fn first_matching_record_receives_merge() {
        let mut acc = vec![
            dep("ssl", "unknown", DependencyKind::CmakeTarget),
            dep("openssl", "unknown", DependencyKind::CmakeTarget),
        ];
        merge_declared(
            &LegacyMatchPolicy,
            &mut acc,
            vec![dep("openssl", "3.1.0", DependencyKind::Conan)],
        );
        assert_eq!(acc[0].version, "3.1.0");
        assert_eq!(acc[1].version, "unknown");
    }

    #[test]
    fn strict_policy_keeps_substring_names_apart() {
        let mut acc = vec![dep("json", "unknown", DependencyKind::CmakeTarget)];
        merge_declared(
            &StrictMatchPolicy,
            &mut acc,
            vec![dep("nlohmann_json", "3.11.2", DependencyKind::Vcpkg)],
        );
        assert_eq!(acc.len(), 2);
    }

    #[test]
    fn empty_incoming_is_noop() {
        let mut acc = vec![dep("fmt", "10.1.1", DependencyKind::Vcpkg)];
        merge_declared(&LegacyMatchPolicy, &mut acc, Vec::new());
        assert_eq!(acc.len(), 1);
    }
}
