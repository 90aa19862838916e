//! 상관 분석 엔진
//!
//! 선언된 의존성, 헤더 풀, 라이브러리 풀을 받아 각 헤더와 라이브러리를
//! 최대 하나의 의존성에 귀속시킵니다.
//!
//! # 처리 순서 (의존성마다, 선언 순서대로)
//!
//! 1. 권위 있는 조회 ([`AuthoritativeLookup`]) -- 버전/출처 갱신, include 디렉토리 접두사와
//!    `lib<name>` 포함 여부로 헤더/라이브러리 귀속
//! 2. 정확한 이름 헤더 매칭 (헤더가 아직 없을 때)
//! 3. 토큰 헤더 매칭 (헤더가 아직 없을 때)
//! 4. 부분 문자열 헤더 매칭 (헤더가 아직 없을 때, 정책이 허용하는 경우)
//! 5. 라이브러리 접두사 매칭 (라이브러리가 아직 없을 때)
//!
//! 풀은 단계마다 "귀속됨"과 "남음"으로 분할되며, 남은 풀만 다음 단계와 다음 의존성에
//! 넘어갑니다. 먼저 선언된 의존성이 모호한 항목을 가져갑니다.
//! 끝까지 남은 라이브러리는 합성 시스템 의존성이 됩니다.

pub mod merge;
pub mod policy;

use std::collections::BTreeSet;
use std::sync::Arc;

use depdiscover_core::metrics as m;
use tracing::{debug, info};

use crate::lookup::{AuthoritativeLookup, NoLookup};
use crate::types::{Dependency, Provenance};

pub use merge::merge_declared;
pub use policy::{LegacyMatchPolicy, MatchPolicy, MatchPolicyKind, StrictMatchPolicy};

/// 상관 분석 결과
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CorrelationOutcome {
    /// 선언된 의존성(입력 순서) 뒤에 합성 시스템 의존성이 이어지는 목록
    pub dependencies: Vec<Dependency>,
    /// 어떤 의존성에도 귀속되지 않은 헤더
    pub unattributed_headers: Vec<String>,
}

impl CorrelationOutcome {
    /// 합성 시스템 의존성 수
    pub fn synthetic_count(&self) -> usize {
        self.dependencies.iter().filter(|d| d.is_synthetic()).count()
    }
}

/// 상관 분석 엔진
pub struct Correlator {
    policy: Arc<dyn MatchPolicy>,
    lookup: Arc<dyn AuthoritativeLookup>,
}

impl Correlator {
    /// 매칭 정책과 권위 있는 조회로 엔진을 생성합니다.
    pub fn new(policy: Arc<dyn MatchPolicy>, lookup: Arc<dyn AuthoritativeLookup>) -> Self {
        Self { policy, lookup }
    }

    /// 기본 정책, 조회 없음으로 엔진을 생성합니다.
    pub fn legacy() -> Self {
        Self::new(Arc::new(LegacyMatchPolicy), Arc::new(NoLookup))
    }

    /// 매칭 정책
    pub fn policy(&self) -> &Arc<dyn MatchPolicy> {
        &self.policy
    }

    /// 상관 분석을 수행합니다.
    ///
    /// 풀은 중복 제거 후 정렬된 순서로 순회합니다. 실패하지 않습니다.
    pub fn correlate(
        &self,
        declared: Vec<Dependency>,
        headers: impl IntoIterator<Item = String>,
        libraries: impl IntoIterator<Item = String>,
    ) -> CorrelationOutcome {
        let mut header_pool = dedup_sorted(headers);
        let mut library_pool = dedup_sorted(libraries);

        let header_total = header_pool.len();
        let library_total = library_pool.len();

        let mut dependencies = Vec::with_capacity(declared.len() + library_pool.len());
        for mut dep in declared {
            let (headers_left, libraries_left) = self.attach(&mut dep, header_pool, library_pool);
            header_pool = headers_left;
            library_pool = libraries_left;
            dependencies.push(dep);
        }

        let attributed_headers = header_total - header_pool.len();
        let attributed_libraries = library_total - library_pool.len();
        let synthetic = library_pool.len();

        for library in library_pool {
            debug!(library = %library, "no declared owner, creating system dependency");
            dependencies.push(Dependency::synthetic_system(library));
        }

        metrics::counter!(m::CORRELATE_HEADERS_ATTRIBUTED_TOTAL).increment(attributed_headers as u64);
        metrics::counter!(m::CORRELATE_LIBRARIES_ATTRIBUTED_TOTAL)
            .increment(attributed_libraries as u64);
        metrics::counter!(m::CORRELATE_SYNTHETIC_TOTAL).increment(synthetic as u64);

        info!(
            policy = self.policy.name(),
            dependencies = dependencies.len(),
            headers_attributed = attributed_headers,
            headers_unattributed = header_pool.len(),
            libraries_attributed = attributed_libraries,
            synthetic,
            "correlation complete"
        );

        CorrelationOutcome {
            dependencies,
            unattributed_headers: header_pool,
        }
    }

    /// 의존성 하나에 대해 모든 단계를 적용하고 남은 풀을 반환합니다.
    fn attach(
        &self,
        dep: &mut Dependency,
        headers: Vec<String>,
        libraries: Vec<String>,
    ) -> (Vec<String>, Vec<String>) {
        if dep.name.is_empty() {
            return (headers, libraries);
        }

        let (mut headers, mut libraries) = (headers, libraries);

        if let Some(info) = self.lookup.query(&dep.name) {
            debug!(dependency = %dep.name, version = %info.version, "authoritative lookup hit");
            dep.version = info.version;
            dep.source = Provenance::PkgConfig;

            let (claimed, rest) = partition(headers, |h| {
                info.include_dirs
                    .iter()
                    .any(|dir| !dir.is_empty() && h.starts_with(dir.as_str()))
            });
            dep.headers.extend(claimed);
            headers = rest;

            let (claimed, rest) = partition(libraries, |lib| {
                info.lib_names
                    .iter()
                    .any(|l| !l.is_empty() && lib.contains(&format!("lib{l}")))
            });
            dep.libraries.extend(claimed);
            libraries = rest;
        }

        let policy = self.policy.as_ref();
        for rule in HeaderRule::ORDER {
            if !dep.headers.is_empty() {
                break;
            }
            let name = dep.name.as_str();
            let (claimed, rest) = partition(headers, |h| rule.matches(policy, h, name));
            dep.headers.extend(claimed);
            headers = rest;
        }

        if dep.libraries.is_empty() {
            let (claimed, rest) = partition(libraries, |lib| policy.library_matches(lib, &dep.name));
            dep.libraries.extend(claimed);
            libraries = rest;
        }

        (headers, libraries)
    }
}

impl Default for Correlator {
    fn default() -> Self {
        Self::legacy()
    }
}

/// 헤더 매칭 규칙 (적용 순서대로)
#[derive(Debug, Clone, Copy)]
enum HeaderRule {
    Exact,
    Token,
    Loose,
}

impl HeaderRule {
    const ORDER: [Self; 3] = [Self::Exact, Self::Token, Self::Loose];

    fn matches(self, policy: &dyn MatchPolicy, header: &str, name: &str) -> bool {
        match self {
            Self::Exact => policy.header_exact(header, name),
            Self::Token => policy.header_token(header, name),
            Self::Loose => policy.header_loose(header, name),
        }
    }
}

/// 풀을 중복 제거하고 정렬합니다.
fn dedup_sorted(items: impl IntoIterator<Item = String>) -> Vec<String> {
    items.into_iter().collect::<BTreeSet<_>>().into_iter().collect()
}

/// 풀을 (조건을 만족하는 항목, 나머지)로 분할합니다. 순서는 유지됩니다.
fn partition(pool: Vec<String>, mut claim: impl FnMut(&str) -> bool) -> (Vec<String>, Vec<String>) {
    pool.into_iter().partition(|item| claim(item.as_str()))
}
