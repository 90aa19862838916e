//! 리포트 생성 -- depdiscover 고유 JSON, CycloneDX 1.5 JSON
//!
//! [`render`]는 보강이 끝난 의존성 목록을 선택한 형식의 문서로 직렬화합니다.

pub mod cyclonedx;
pub mod native;

use std::path::Path;

use tracing::info;

use crate::error::SbomScannerError;
use crate::types::{Dependency, ReportFormat};

pub use native::{NativeReport, ProjectInfo, ReportHeader, SCHEMA_VERSION, ToolInfo};

/// 도구 이름
pub const TOOL_NAME: &str = "depdiscover";

/// 도구 설명
pub const TOOL_DESCRIPTION: &str = "Native C/C++ dependency scanner and SBOM generator";

/// 리포트 메타데이터
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportContext {
    /// 프로젝트 이름
    pub project_name: String,
    /// 스캔한 작업 디렉토리
    pub workspace_root: String,
    /// 스캔 날짜 (YYYY-MM-DD)
    pub scan_date: String,
}

impl ReportContext {
    /// 오늘 날짜로 컨텍스트를 생성합니다.
    pub fn new(project_name: impl Into<String>, workspace_root: impl Into<String>) -> Self {
        Self {
            project_name: project_name.into(),
            workspace_root: workspace_root.into(),
            scan_date: chrono::Local::now().format("%Y-%m-%d").to_string(),
        }
    }

    /// 스캔 날짜를 지정합니다.
    pub fn with_scan_date(mut self, date: impl Into<String>) -> Self {
        self.scan_date = date.into();
        self
    }
}

/// 생성된 리포트 문서
#[derive(Debug, Clone)]
pub struct ReportDocument {
    /// 형식
    pub format: ReportFormat,
    /// 직렬화된 JSON
    pub content: String,
    /// 컴포넌트(의존성) 수
    pub component_count: usize,
}

impl ReportDocument {
    /// 문서를 파일에 씁니다.
    pub fn write_to(&self, path: &Path) -> Result<(), SbomScannerError> {
        std::fs::write(path, &self.content).map_err(|e| SbomScannerError::Io {
            path: path.display().to_string(),
            source: e,
        })?;
        info!(
            path = %path.display(),
            format = %self.format,
            components = self.component_count,
            "report written"
        );
        Ok(())
    }
}

/// 선택한 형식으로 리포트를 생성합니다.
pub fn render(
    format: ReportFormat,
    context: &ReportContext,
    dependencies: &[Dependency],
    unattributed_headers: &[String],
) -> Result<ReportDocument, SbomScannerError> {
    match format {
        ReportFormat::Native => native::generate(context, dependencies, unattributed_headers),
        ReportFormat::CycloneDx => cyclonedx::generate(context, dependencies),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn context_defaults_to_today() {
        let ctx = ReportContext::new("demo", "/work");
        assert_eq!(ctx.scan_date.len(), 10);
        assert_eq!(ctx.with_scan_date("2024-01-02").scan_date, "2024-01-02");
    }

    #[test]
    fn render_dispatches_by_format() {
        let ctx = ReportContext::new("demo", "/work");
        let native = render(ReportFormat::Native, &ctx, &[], &[]).unwrap();
        assert_eq!(native.format, ReportFormat::Native);
        let cdx = render(ReportFormat::CycloneDx, &ctx, &[], &[]).unwrap();
        assert_eq!(cdx.format, ReportFormat::CycloneDx);
        assert!(cdx.content.contains("CycloneDX"));
    }

    #[test]
    fn write_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.json");
        let doc = render(ReportFormat::Native, &ReportContext::new("demo", "/w"), &[], &[]).unwrap();
        doc.write_to(&path).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), doc.content);
    }

    #[test]
    fn write_to_missing_dir_is_io_error() {
        let doc = render(ReportFormat::Native, &ReportContext::new("demo", "/w"), &[], &[]).unwrap();
        let result = doc.write_to(Path::new("/nonexistent/dir/report.json"));
        assert!(matches!(result, Err(SbomScannerError::Io { .. })));
    }
}
