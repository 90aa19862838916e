//! CycloneDX 1.5 JSON SBOM 생성
//!
//! [CycloneDX](https://cyclonedx.org/) 1.5 사양에 따른 JSON SBOM 문서를 생성합니다.
//! 각 의존성은 `library` 컴포넌트가 되고, 실제 취약점 레코드는 `vulnerabilities`
//! 배열에 컴포넌트 참조(`bom-ref`)와 함께 기록됩니다. 표식 레코드는 제외됩니다.

use serde::Serialize;

use super::{ReportContext, ReportDocument, TOOL_NAME};
use crate::error::SbomScannerError;
use crate::types::{Dependency, ReportFormat};

/// CycloneDX 1.5 BOM 루트 구조
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CycloneDxBom {
    bom_format: String,
    spec_version: String,
    serial_number: String,
    version: u32,
    metadata: CycloneDxMetadata,
    components: Vec<CycloneDxComponent>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    vulnerabilities: Vec<CycloneDxVulnerability>,
}

#[derive(Serialize)]
struct CycloneDxMetadata {
    timestamp: String,
    tools: Vec<CycloneDxTool>,
    component: CycloneDxProject,
}

#[derive(Serialize)]
struct CycloneDxTool {
    name: String,
    version: String,
}

#[derive(Serialize)]
struct CycloneDxProject {
    #[serde(rename = "type")]
    component_type: String,
    name: String,
}

#[derive(Serialize)]
struct CycloneDxComponent {
    #[serde(rename = "type")]
    component_type: String,
    #[serde(rename = "bom-ref")]
    bom_ref: String,
    name: String,
    version: String,
    purl: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    licenses: Vec<CycloneDxLicenseChoice>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    properties: Vec<CycloneDxProperty>,
}

#[derive(Serialize)]
struct CycloneDxLicenseChoice {
    license: CycloneDxLicense,
}

#[derive(Serialize)]
struct CycloneDxLicense {
    name: String,
}

#[derive(Serialize)]
struct CycloneDxProperty {
    name: String,
    value: String,
}

#[derive(Serialize)]
struct CycloneDxVulnerability {
    id: String,
    description: String,
    ratings: Vec<CycloneDxRating>,
    affects: Vec<CycloneDxAffect>,
    #[serde(skip_serializing_if = "Option::is_none")]
    recommendation: Option<String>,
}

#[derive(Serialize)]
struct CycloneDxRating {
    severity: String,
}

#[derive(Serialize)]
struct CycloneDxAffect {
    #[serde(rename = "ref")]
    bom_ref: String,
}

/// `pkg:generic/<name>@<version>` 형식의 purl
pub fn generic_purl(name: &str, version: &str) -> String {
    format!("pkg:generic/{name}@{version}")
}

/// 의존성 목록에서 CycloneDX 1.5 JSON SBOM을 생성합니다.
pub fn generate(
    context: &ReportContext,
    dependencies: &[Dependency],
) -> Result<ReportDocument, SbomScannerError> {
    let mut vulnerabilities = Vec::new();
    let components: Vec<CycloneDxComponent> = dependencies
        .iter()
        .map(|dep| {
            let purl = generic_purl(&dep.name, &dep.version);

            for cve in dep.cves.iter().filter(|c| !c.is_sentinel()) {
                vulnerabilities.push(CycloneDxVulnerability {
                    id: cve.id.clone(),
                    description: cve.summary.clone(),
                    ratings: vec![CycloneDxRating {
                        severity: cve.severity.to_lowercase(),
                    }],
                    affects: vec![CycloneDxAffect {
                        bom_ref: purl.clone(),
                    }],
                    recommendation: (!cve.fixed_version.is_empty())
                        .then(|| format!("Upgrade to {}", cve.fixed_version)),
                });
            }

            CycloneDxComponent {
                component_type: "library".to_owned(),
                bom_ref: purl.clone(),
                name: dep.name.clone(),
                version: dep.version.clone(),
                purl,
                licenses: dep
                    .licenses
                    .iter()
                    .map(|l| CycloneDxLicenseChoice {
                        license: CycloneDxLicense { name: l.clone() },
                    })
                    .collect(),
                properties: vec![
                    CycloneDxProperty {
                        name: "depdiscover:type".to_owned(),
                        value: dep.kind.to_string(),
                    },
                    CycloneDxProperty {
                        name: "depdiscover:source".to_owned(),
                        value: dep.source.to_string(),
                    },
                ],
            }
        })
        .collect();

    let component_count = components.len();

    let bom = CycloneDxBom {
        bom_format: "CycloneDX".to_owned(),
        spec_version: "1.5".to_owned(),
        serial_number: format!("urn:uuid:{}", uuid::Uuid::new_v4()),
        version: 1,
        metadata: CycloneDxMetadata {
            timestamp: chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, true),
            tools: vec![CycloneDxTool {
                name: TOOL_NAME.to_owned(),
                version: env!("CARGO_PKG_VERSION").to_owned(),
            }],
            component: CycloneDxProject {
                component_type: "application".to_owned(),
                name: context.project_name.clone(),
            },
        },
        components,
        vulnerabilities,
    };

    let content = serde_json::to_string_pretty(&bom)
        .map_err(|e| SbomScannerError::Report(format!("CycloneDX serialization failed: {e}")))?;

    Ok(ReportDocument {
        format: ReportFormat::CycloneDx,
        content,
        component_count,
    })
}
