//! 취약점 조회 -- 로컬 DB 매칭과 결과 표식
//!
//! [`VulnerabilityResolver`]는 (이름, 버전)으로 [`CveRecord`] 목록을 돌려줍니다.
//! 결과가 항상 하나 이상이 되도록 조회하지 못한 경우에도 표식 레코드를 남깁니다.
//!
//! | 상황 | 레코드 |
//! |------|--------|
//! | 버전이 비었거나 `latest`/`unknown` | `NOT-CHECKED` |
//! | DB를 읽지 못함 | `CHECK-ERROR` |
//! | 일치하는 취약점 없음 | `SAFE` (조회 날짜 포함) |
//!
//! # 사용 흐름
//!
//! 1. `VulnDb::load()` -- 로컬 JSON DB 로드
//! 2. `VulnMatcher::new(db, min_severity)` -- 매처 생성 (별칭 테이블은 `with_aliases`)
//! 3. `VulnerabilityResolver::query(name, version)` -- 의존성마다 조회

pub mod db;
pub mod version;

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use depdiscover_core::types::Severity;
use tracing::{debug, warn};

use crate::types::{CveRecord, Dependency, is_placeholder_version};

pub use db::{VersionRange, VulnDb, VulnDbEntry};

/// 버전을 알 수 없어 조회하지 않음
pub const SENTINEL_NOT_CHECKED: &str = "NOT-CHECKED";
/// 조회했으나 취약점 없음
pub const SENTINEL_SAFE: &str = "SAFE";
/// 조회 실패
pub const SENTINEL_CHECK_ERROR: &str = "CHECK-ERROR";

/// 취약점 조회
pub trait VulnerabilityResolver: Send + Sync {
    /// 조회 구현 이름
    fn name(&self) -> &str;

    /// 패키지 버전의 취약점을 조회합니다. 결과는 비어 있지 않습니다.
    fn query(&self, package: &str, version: &str) -> Vec<CveRecord>;
}

/// 로컬 DB 기반 취약점 매처
#[derive(Debug, Clone)]
pub struct VulnMatcher {
    db: Result<Arc<VulnDb>, String>,
    min_severity: Severity,
    aliases: BTreeMap<String, String>,
}

impl VulnMatcher {
    /// 로드된 DB로 매처를 생성합니다.
    pub fn new(db: Arc<VulnDb>, min_severity: Severity) -> Self {
        Self {
            db: Ok(db),
            min_severity,
            aliases: BTreeMap::new(),
        }
    }

    /// DB를 사용할 수 없는 매처를 생성합니다. 모든 조회는 `CHECK-ERROR`가 됩니다.
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self {
            db: Err(reason.into()),
            min_severity: Severity::Info,
            aliases: BTreeMap::new(),
        }
    }

    /// 파일에서 DB를 로드합니다. 실패하면 경고 후 사용 불가 상태가 됩니다.
    pub fn from_path(path: &Path, min_severity: Severity) -> Self {
        match VulnDb::load(path) {
            Ok(db) => Self::new(Arc::new(db), min_severity),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "vulnerability database unavailable");
                Self {
                    min_severity,
                    ..Self::unavailable(e.to_string())
                }
            }
        }
    }

    /// 조회 전 적용할 패키지 별칭 테이블을 설정합니다.
    pub fn with_aliases(mut self, aliases: BTreeMap<String, String>) -> Self {
        self.aliases = aliases;
        self
    }

    /// 최소 심각도
    pub fn min_severity(&self) -> Severity {
        self.min_severity
    }

    /// DB 사용 가능 여부
    pub fn is_available(&self) -> bool {
        self.db.is_ok()
    }

    fn sentinel(id: &str, summary: String, severity: &str) -> CveRecord {
        CveRecord {
            id: id.to_owned(),
            summary,
            severity: severity.to_owned(),
            fixed_version: String::new(),
        }
    }
}

impl VulnerabilityResolver for VulnMatcher {
    fn name(&self) -> &str {
        "local-db"
    }

    fn query(&self, package: &str, version: &str) -> Vec<CveRecord> {
        let version = version.trim();
        if version.is_empty() || is_placeholder_version(version) {
            return vec![Self::sentinel(
                SENTINEL_NOT_CHECKED,
                "Version unknown or latest, cannot query vulnerability database".to_owned(),
                "UNKNOWN",
            )];
        }
        let version = version::strip_v_prefix(version);

        let db = match &self.db {
            Ok(db) => db,
            Err(reason) => {
                return vec![Self::sentinel(
                    SENTINEL_CHECK_ERROR,
                    format!("Vulnerability database unavailable: {reason}"),
                    "UNKNOWN",
                )];
            }
        };

        let lookup_name = self.aliases.get(package).map_or(package, String::as_str);

        let records: Vec<CveRecord> = db
            .lookup(lookup_name)
            .into_iter()
            .filter(|entry| version::is_affected(version, &entry.affected_ranges))
            .filter(|entry| entry.severity_level() >= self.min_severity)
            .map(|entry| CveRecord {
                id: entry.id.clone(),
                summary: entry.summary.clone(),
                severity: if entry.severity.is_empty() {
                    entry.severity_level().to_string().to_uppercase()
                } else {
                    entry.severity.clone()
                },
                fixed_version: entry.fixed_version.clone().unwrap_or_default(),
            })
            .collect();

        if records.is_empty() {
            debug!(package = lookup_name, version, "no known vulnerabilities");
            let today = chrono::Local::now().format("%Y-%m-%d");
            return vec![Self::sentinel(
                SENTINEL_SAFE,
                format!(
                    "No known vulnerabilities found. Checked on {today} via local vulnerability database"
                ),
                "NONE",
            )];
        }

        debug!(package = lookup_name, version, found = records.len(), "vulnerabilities matched");
        records
    }
}

/// 심각도별 취약점 개수 (표식 레코드 제외)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeverityCounts {
    pub critical: usize,
    pub high: usize,
    pub medium: usize,
    pub low: usize,
    pub info: usize,
}

impl SeverityCounts {
    /// 의존성 목록의 취약점 레코드를 집계합니다.
    pub fn from_dependencies(dependencies: &[Dependency]) -> Self {
        let mut counts = Self::default();
        for cve in dependencies
            .iter()
            .flat_map(|d| d.cves.iter())
            .filter(|c| !c.is_sentinel())
        {
            let level = Severity::from_str_loose(&cve.severity)
                .or_else(|| cve.severity.parse::<f64>().ok().map(Severity::from_cvss_score))
                .unwrap_or_default();
            match level {
                Severity::Critical => counts.critical += 1,
                Severity::High => counts.high += 1,
                Severity::Medium => counts.medium += 1,
                Severity::Low => counts.low += 1,
                Severity::Info => counts.info += 1,
            }
        }
        counts
    }

    /// 전체 취약점 수
    pub fn total(&self) -> usize {
        self.critical + self.high + self.medium + self.low + self.info
    }
}
