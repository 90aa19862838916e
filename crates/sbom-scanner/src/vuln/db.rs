//! 로컬 취약점 데이터베이스
//!
//! 오프라인 JSON 파일 하나에서 취약점 엔트리를 읽어 패키지 이름으로 인덱싱합니다.
//!
//! # JSON 형식
//!
//! ```json
//! [
//!   {
//!     "id": "CVE-2022-37434",
//!     "package": "zlib",
//!     "summary": "heap-based buffer over-read in inflate",
//!     "severity": "CRITICAL",
//!     "affected_ranges": [{ "introduced": "1.2.2", "fixed": "1.2.13" }],
//!     "fixed_version": "1.2.13"
//!   }
//! ]
//! ```
//!
//! `severity`는 `LOW`/`MODERATE`/`HIGH`/`CRITICAL` 같은 이름이나 CVSS 점수 문자열입니다.

use std::collections::HashMap;
use std::path::Path;

use depdiscover_core::types::Severity;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::SbomScannerError;

/// 취약점 DB 파일 최대 크기 (50 MB)
const MAX_VULN_DB_FILE_SIZE: u64 = 50 * 1024 * 1024;

/// 취약점 DB 엔트리 최대 개수
const MAX_VULN_DB_ENTRIES: usize = 1_000_000;

/// 취약점 DB 엔트리
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VulnDbEntry {
    /// 취약점 ID (예: CVE-2022-37434)
    pub id: String,
    /// 영향받는 패키지명
    pub package: String,
    /// 요약
    #[serde(default)]
    pub summary: String,
    /// 심각도 (이름 또는 CVSS 점수)
    #[serde(default)]
    pub severity: String,
    /// 영향받는 버전 범위
    #[serde(default)]
    pub affected_ranges: Vec<VersionRange>,
    /// 수정된 버전
    #[serde(default)]
    pub fixed_version: Option<String>,
}

impl VulnDbEntry {
    /// 심각도 문자열을 [`Severity`]로 해석합니다.
    ///
    /// 이름도 점수도 아니면 `Info`로 취급합니다.
    pub fn severity_level(&self) -> Severity {
        Severity::from_str_loose(self.severity.trim())
            .or_else(|| {
                self.severity
                    .trim()
                    .parse::<f64>()
                    .ok()
                    .map(Severity::from_cvss_score)
            })
            .unwrap_or_default()
    }
}

/// 영향받는 버전 범위
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionRange {
    /// 도입 버전 (이 버전부터 영향)
    #[serde(default)]
    pub introduced: Option<String>,
    /// 수정 버전 (None이면 미수정)
    #[serde(default)]
    pub fixed: Option<String>,
}

/// 로컬 취약점 데이터베이스
///
/// 패키지 이름으로 인덱싱된 HashMap으로 O(1) 조회합니다.
#[derive(Debug, Default)]
pub struct VulnDb {
    entries: Vec<VulnDbEntry>,
    index: HashMap<String, Vec<usize>>,
}

impl VulnDb {
    /// 빈 데이터베이스를 생성합니다.
    pub fn empty() -> Self {
        Self::default()
    }

    fn build_index(entries: &[VulnDbEntry]) -> HashMap<String, Vec<usize>> {
        let mut index: HashMap<String, Vec<usize>> = HashMap::new();
        for (idx, entry) in entries.iter().enumerate() {
            index.entry(entry.package.clone()).or_default().push(idx);
        }
        index
    }

    /// 엔트리 목록으로 데이터베이스를 생성합니다.
    pub fn from_entries(mut entries: Vec<VulnDbEntry>) -> Self {
        if entries.len() > MAX_VULN_DB_ENTRIES {
            warn!(
                entries = entries.len(),
                max = MAX_VULN_DB_ENTRIES,
                "vulnerability database entry limit reached, truncating"
            );
            entries.truncate(MAX_VULN_DB_ENTRIES);
        }
        let index = Self::build_index(&entries);
        Self { entries, index }
    }

    /// JSON 문자열에서 데이터베이스를 파싱합니다.
    pub fn from_json(json: &str) -> Result<Self, SbomScannerError> {
        let entries: Vec<VulnDbEntry> = serde_json::from_str(json).map_err(|e| {
            SbomScannerError::VulnDbParse(format!("failed to parse vuln db JSON: {e}"))
        })?;
        Ok(Self::from_entries(entries))
    }

    /// 파일에서 데이터베이스를 로드합니다.
    ///
    /// 동기 I/O를 수행합니다. async 컨텍스트에서는 `spawn_blocking`으로 감싸세요.
    pub fn load(path: &Path) -> Result<Self, SbomScannerError> {
        let metadata = std::fs::metadata(path).map_err(|e| SbomScannerError::VulnDbLoad {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;

        if metadata.len() > MAX_VULN_DB_FILE_SIZE {
            return Err(SbomScannerError::VulnDbLoad {
                path: path.display().to_string(),
                reason: format!(
                    "file size {} bytes exceeds maximum {} bytes",
                    metadata.len(),
                    MAX_VULN_DB_FILE_SIZE
                ),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|e| SbomScannerError::VulnDbLoad {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;

        let db = Self::from_json(&content).map_err(|e| match e {
            SbomScannerError::VulnDbParse(reason) => SbomScannerError::VulnDbParse(format!(
                "{}: {reason}",
                path.display()
            )),
            other => other,
        })?;

        info!(path = %path.display(), entries = db.entry_count(), "loaded vuln db");
        Ok(db)
    }

    /// 전체 엔트리 수
    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }

    /// 패키지 이름으로 엔트리를 조회합니다.
    pub fn lookup(&self, package: &str) -> Vec<&VulnDbEntry> {
        let found: Vec<&VulnDbEntry> = self
            .index
            .get(package)
            .map(|indices| indices.iter().filter_map(|&idx| self.entries.get(idx)).collect())
            .unwrap_or_default();
        debug!(package, matches = found.len(), "vuln db lookup");
        found
    }

    /// 전체 엔트리
    pub fn entries(&self) -> &[VulnDbEntry] {
        &self.entries
    }
}
