//! 라이선스 해석
//!
//! [`HeuristicLicenseResolver`]는 다음 순서로 라이선스를 찾습니다.
//!
//! 1. 설정의 프로젝트 → 라이선스 테이블 (정확한 이름)
//! 2. 이름 휴리스틱 (`boost` → BSL-1.0, `gpl` → GPL)
//! 3. 헤더가 있는 디렉토리와 상위 디렉토리의 라이선스 파일 내용
//! 4. 아무것도 없으면 `UNKNOWN`

use std::collections::{BTreeMap, HashSet};
use std::io::{BufRead, BufReader};
use std::path::Path;

use tracing::{debug, trace};

/// 라이선스를 찾지 못했을 때의 값
pub const LICENSE_UNKNOWN: &str = "UNKNOWN";

/// 라이선스 파일 후보 이름
const LICENSE_FILE_NAMES: [&str; 7] = [
    "LICENSE",
    "LICENSE.txt",
    "LICENSE.md",
    "COPYING",
    "COPYING.txt",
    "NOTICE",
    "Copyright.txt",
];

/// 라이선스 파일에서 읽는 최대 줄 수
const MAX_LICENSE_LINES: usize = 20;

/// 라이선스 해석
pub trait LicenseResolver: Send + Sync {
    /// 의존성 이름과 귀속된 헤더로 라이선스를 찾습니다. 결과는 비어 있지 않습니다.
    fn resolve(&self, name: &str, headers: &[String]) -> Vec<String>;
}

/// 테이블, 이름, 라이선스 파일 기반 해석기
#[derive(Debug, Clone)]
pub struct HeuristicLicenseResolver {
    table: BTreeMap<String, Vec<String>>,
    search_depth: usize,
}

impl HeuristicLicenseResolver {
    /// 라이선스 테이블과 탐색 깊이(헤더 디렉토리 포함 단계 수)로 생성합니다.
    pub fn new(table: BTreeMap<String, Vec<String>>, search_depth: usize) -> Self {
        Self {
            table,
            search_depth,
        }
    }

    fn scan_license_files(&self, headers: &[String]) -> Vec<String> {
        let mut licenses: Vec<String> = Vec::new();
        let mut checked: HashSet<&Path> = HashSet::new();

        for header in headers {
            let path = Path::new(header);
            if !path.is_absolute() {
                continue;
            }

            let mut dir = path.parent();
            for _ in 0..self.search_depth {
                let Some(current) = dir else { break };
                if !checked.insert(current) {
                    break;
                }

                for file_name in LICENSE_FILE_NAMES {
                    let candidate = current.join(file_name);
                    if !candidate.is_file() {
                        continue;
                    }
                    if let Some(detected) = classify_license_file(&candidate)
                        && !licenses.contains(&detected)
                    {
                        trace!(file = %candidate.display(), license = %detected, "license file matched");
                        licenses.push(detected);
                    }
                }

                dir = current.parent();
            }
        }
        licenses
    }
}

impl Default for HeuristicLicenseResolver {
    fn default() -> Self {
        Self::new(depdiscover_core::config::default_license_table(), 3)
    }
}

impl LicenseResolver for HeuristicLicenseResolver {
    fn resolve(&self, name: &str, headers: &[String]) -> Vec<String> {
        if let Some(known) = self.table.get(name) {
            return known.clone();
        }

        if name.contains("boost") {
            return vec!["BSL-1.0".to_owned()];
        }
        if name.contains("gpl") {
            return vec!["GPL".to_owned()];
        }

        let licenses = self.scan_license_files(headers);
        if licenses.is_empty() {
            debug!(dependency = name, "no license found");
            return vec![LICENSE_UNKNOWN.to_owned()];
        }
        licenses
    }
}

/// 라이선스 파일의 처음 몇 줄로 라이선스 종류를 추정합니다.
///
/// 파일을 읽을 수 없으면 `None`, 내용을 알아볼 수 없으면 `See file: <이름>`을 반환합니다.
pub fn classify_license_file(path: &Path) -> Option<String> {
    let file = std::fs::File::open(path).ok()?;
    let head: String = BufReader::new(file)
        .lines()
        .take(MAX_LICENSE_LINES)
        .map_while(Result::ok)
        .map(|line| line.to_uppercase() + "\n")
        .collect();

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    Some(classify_license_text(&head).map_or_else(|| format!("See file: {file_name}"), str::to_owned))
}

/// 대문자로 변환된 라이선스 본문에서 SPDX 식별자를 추정합니다.
pub fn classify_license_text(upper: &str) -> Option<&'static str> {
    let has = |needle: &str| upper.contains(needle);

    if has("MIT LICENSE") {
        return Some("MIT");
    }
    if has("APACHE LICENSE") && has("VERSION 2.0") {
        return Some("Apache-2.0");
    }
    if has("GNU GENERAL PUBLIC LICENSE") {
        if has("VERSION 3") {
            return Some("GPL-3.0");
        }
        if has("VERSION 2") {
            return Some("GPL-2.0");
        }
        return Some("GPL");
    }
    if has("GNU LESSER GENERAL PUBLIC LICENSE") {
        return Some("LGPL");
    }
    if has("BOOST SOFTWARE LICENSE") {
        return Some("BSL-1.0");
    }
    if has("BSD 3-CLAUSE") {
        return Some("BSD-3-Clause");
    }
    if has("BSD 2-CLAUSE") {
        return Some("BSD-2-Clause");
    }
    if has("MOZILLA PUBLIC LICENSE") {
        return Some("MPL-2.0");
    }
    if has("ZLIB LICENSE") {
        return Some("Zlib");
    }
    None
}
