//! depdiscover 고유 JSON 리포트 (schema 1.2)
//!
//! ```json
//! {
//!   "header": {
//!     "schema_version": "1.2",
//!     "scan_date": "2024-05-01",
//!     "tool": { "name": "depdiscover", "version": "0.1.0", "description": "...", "homepage": "" },
//!     "project": { "name": "demo", "workspace_root": "/work/demo" }
//!   },
//!   "dependencies": [ { "name": "fmt", "version": "10.1.1", "type": "vcpkg", "source": "manifest", ... } ],
//!   "unattributed_headers": [ "/usr/include/stdio.h" ]
//! }
//! ```

use serde::{Deserialize, Serialize};

use super::{ReportContext, ReportDocument, TOOL_DESCRIPTION, TOOL_NAME};
use crate::error::SbomScannerError;
use crate::types::{Dependency, ReportFormat};

/// 리포트 스키마 버전
pub const SCHEMA_VERSION: &str = "1.2";

/// 리포트 루트
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NativeReport {
    pub header: ReportHeader,
    pub dependencies: Vec<Dependency>,
    #[serde(default)]
    pub unattributed_headers: Vec<String>,
}

/// 리포트 헤더
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportHeader {
    pub schema_version: String,
    pub scan_date: String,
    pub tool: ToolInfo,
    pub project: ProjectInfo,
}

/// 리포트를 생성한 도구 정보
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolInfo {
    pub name: String,
    pub version: String,
    pub description: String,
    pub homepage: String,
}

impl Default for ToolInfo {
    fn default() -> Self {
        Self {
            name: TOOL_NAME.to_owned(),
            version: env!("CARGO_PKG_VERSION").to_owned(),
            description: TOOL_DESCRIPTION.to_owned(),
            homepage: env!("CARGO_PKG_HOMEPAGE").to_owned(),
        }
    }
}

/// 스캔 대상 프로젝트 정보
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectInfo {
    pub name: String,
    pub workspace_root: String,
}

/// 고유 JSON 리포트를 생성합니다.
pub fn generate(
    context: &ReportContext,
    dependencies: &[Dependency],
    unattributed_headers: &[String],
) -> Result<ReportDocument, SbomScannerError> {
    let report = NativeReport {
        header: ReportHeader {
            schema_version: SCHEMA_VERSION.to_owned(),
            scan_date: context.scan_date.clone(),
            tool: ToolInfo::default(),
            project: ProjectInfo {
                name: context.project_name.clone(),
                workspace_root: context.workspace_root.clone(),
            },
        },
        dependencies: dependencies.to_vec(),
        unattributed_headers: unattributed_headers.to_vec(),
    };

    let content = serde_json::to_string_pretty(&report)
        .map_err(|e| SbomScannerError::Report(format!("native report serialization failed: {e}")))?;

    Ok(ReportDocument {
        format: ReportFormat::Native,
        content,
        component_count: dependencies.len(),
    })
}
