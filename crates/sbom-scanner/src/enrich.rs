//! 보강 단계 -- 라이선스와 취약점 첨부
//!
//! 상관 분석이 끝난 의존성 목록에 [`LicenseResolver`]와 [`VulnerabilityResolver`]
//! 결과를 붙입니다. 두 해석기 모두 선택 사항이며, 없으면 해당 필드는 비워 둡니다.

use std::sync::Arc;

use depdiscover_core::metrics as m;
use tracing::{debug, info};

use crate::license::LicenseResolver;
use crate::types::Dependency;
use crate::vuln::VulnerabilityResolver;

/// 보강 오케스트레이터
#[derive(Clone, Default)]
pub struct Enricher {
    licenses: Option<Arc<dyn LicenseResolver>>,
    vulnerabilities: Option<Arc<dyn VulnerabilityResolver>>,
}

impl Enricher {
    /// 해석기 없이 생성합니다.
    pub fn new() -> Self {
        Self::default()
    }

    /// 라이선스 해석기를 설정합니다.
    pub fn with_license_resolver(mut self, resolver: Arc<dyn LicenseResolver>) -> Self {
        self.licenses = Some(resolver);
        self
    }

    /// 취약점 해석기를 설정합니다.
    pub fn with_vulnerability_resolver(mut self, resolver: Arc<dyn VulnerabilityResolver>) -> Self {
        self.vulnerabilities = Some(resolver);
        self
    }

    /// 의존성 목록을 순서대로 보강합니다.
    ///
    /// - 매니페스트 파서가 미리 붙인 라이선스는 유지합니다.
    /// - 합성 시스템 의존성은 취약점을 조회하지 않습니다.
    pub fn enrich(&self, dependencies: &mut [Dependency]) {
        let mut cves_found = 0usize;

        for dep in dependencies.iter_mut() {
            if dep.licenses.is_empty()
                && let Some(resolver) = &self.licenses
            {
                dep.licenses = resolver.resolve(&dep.name, &dep.headers);
            }

            if dep.is_synthetic() {
                continue;
            }

            if let Some(resolver) = &self.vulnerabilities {
                dep.cves = resolver.query(&dep.name, &dep.version);
                let real = dep.cves.iter().filter(|c| !c.is_sentinel()).count();
                if real > 0 {
                    debug!(dependency = %dep.name, version = %dep.version, cves = real, "vulnerabilities attached");
                }
                cves_found += real;
            }
        }

        metrics::counter!(m::ENRICH_CVES_FOUND_TOTAL).increment(cves_found as u64);
        info!(
            dependencies = dependencies.len(),
            cves = cves_found,
            licenses = self.licenses.is_some(),
            vulnerabilities = self.vulnerabilities.is_some(),
            "enrichment complete"
        );
    }
}
