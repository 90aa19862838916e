//! `depdiscover scan` command handler

use std::io::Write;
use std::path::Path;

use serde::Serialize;
use tracing::info;

use depdiscover_core::config::DepdiscoverConfig;
use depdiscover_sbom_scanner::{
    DependencyScannerBuilder, MatchPolicyKind, ReportContext, ReportFormat, SbomScannerConfig,
    SbomScannerConfigBuilder, ScanOutcome,
};

use crate::cli::{MatchPolicyArg, ReportFormatArg, ScanArgs};
use crate::error::CliError;
use crate::output::{OutputWriter, Render};

/// Report destination meaning stdout.
const STDOUT_PATH: &str = "-";

/// Execute the `scan` command.
pub async fn execute(
    args: ScanArgs,
    config: DepdiscoverConfig,
    writer: &OutputWriter,
) -> Result<(), CliError> {
    let scanner_config = scanner_config(&args, &config)?;
    let output = args
        .output
        .clone()
        .unwrap_or_else(|| config.general.output_path.clone());

    info!(
        project = %scanner_config.project_name,
        format = %scanner_config.report_format,
        policy = %scanner_config.match_policy,
        binaries = scanner_config.binaries.len(),
        "starting dependency scan"
    );

    let scanner = DependencyScannerBuilder::new()
        .config(scanner_config.clone())
        .build()?;

    let outcome = tokio::task::spawn_blocking(move || scanner.scan())
        .await
        .map_err(|e| CliError::Command(format!("scan task failed: {e}")))?;

    let workspace_root = std::env::current_dir()?.display().to_string();
    let context = ReportContext::new(scanner_config.project_name.clone(), workspace_root);
    let document = outcome.render(scanner_config.report_format, &context)?;

    let to_stdout = output == STDOUT_PATH;
    if to_stdout {
        let stdout = std::io::stdout();
        let mut handle = stdout.lock();
        writeln!(handle, "{}", document.content)?;
    } else {
        document.write_to(Path::new(&output))?;
    }

    let summary = ScanSummary::new(&scanner_config, &output, &outcome);
    if to_stdout {
        writer.render_stderr(&summary)?;
    } else {
        writer.render(&summary)?;
    }

    if args.fail_on_vulns && summary.vulnerabilities.total > 0 {
        return Err(CliError::Scan(format!(
            "found {} vulnerabilities",
            summary.vulnerabilities.total
        )));
    }

    Ok(())
}

/// Layer command-line overrides on top of the loaded configuration.
pub fn scanner_config(
    args: &ScanArgs,
    config: &DepdiscoverConfig,
) -> Result<SbomScannerConfig, CliError> {
    let mut builder = SbomScannerConfigBuilder::from_config(SbomScannerConfig::from_core(config));

    if let Some(path) = &args.compile_commands {
        builder = builder.compile_commands(path_string(path));
    }
    if let Some(path) = &args.libs {
        builder = builder.libs_file(path_string(path));
    }
    if let Some(path) = &args.vcpkg {
        builder = builder.vcpkg_manifest(path_string(path));
    }
    if let Some(path) = &args.conan {
        builder = builder.conan_manifest(path_string(path));
    }
    if !args.binaries.is_empty() {
        builder = builder.binaries(args.binaries.iter().map(|p| path_string(p)).collect());
    }
    if let Some(name) = &args.name {
        builder = builder.project_name(name.clone());
    }
    if let Some(format) = args.format {
        builder = builder.report_format(match format {
            ReportFormatArg::Native => ReportFormat::Native,
            ReportFormatArg::Cyclonedx => ReportFormat::CycloneDx,
        });
    }
    if let Some(policy) = args.policy {
        builder = builder.match_policy(match policy {
            MatchPolicyArg::Legacy => MatchPolicyKind::Legacy,
            MatchPolicyArg::Strict => MatchPolicyKind::Strict,
        });
    }
    if let Some(path) = &args.vuln_db {
        builder = builder.vuln_db_path(path_string(path));
    }
    if args.no_vuln_check {
        builder = builder.vuln_check(false);
    }
    if args.no_pkg_config {
        builder = builder.pkg_config(false);
    }

    builder
        .build()
        .map_err(|e| CliError::Config(format!("invalid scanner config: {e}")))
}

fn path_string(path: &Path) -> String {
    path.display().to_string()
}

/// Summary printed after a scan.
#[derive(Debug, Serialize)]
pub struct ScanSummary {
    pub project: String,
    pub report_path: String,
    pub report_format: String,
    pub match_policy: String,
    pub dependencies: usize,
    pub declared: usize,
    pub synthetic: usize,
    pub headers: usize,
    pub unattributed_headers: usize,
    pub binaries_scanned: usize,
    pub duration_ms: u64,
    pub vulnerabilities: VulnSummary,
    pub findings: Vec<FindingEntry>,
    pub skipped: Vec<SkippedEntry>,
}

#[derive(Debug, Default, Serialize)]
pub struct VulnSummary {
    pub critical: usize,
    pub high: usize,
    pub medium: usize,
    pub low: usize,
    pub info: usize,
    pub total: usize,
    /// Dependencies whose lookup failed (`CHECK-ERROR`).
    pub check_errors: usize,
}

#[derive(Debug, Serialize)]
pub struct FindingEntry {
    pub cve_id: String,
    pub severity: String,
    pub dependency: String,
    pub version: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub fixed_version: String,
}

#[derive(Debug, Serialize)]
pub struct SkippedEntry {
    pub path: String,
    pub reason: String,
}

impl ScanSummary {
    pub fn new(config: &SbomScannerConfig, report_path: &str, outcome: &ScanOutcome) -> Self {
        let counts = outcome.severity_counts();
        let check_errors = outcome
            .dependencies
            .iter()
            .filter(|d| d.cves.iter().any(|c| c.id == "CHECK-ERROR"))
            .count();

        let findings = outcome
            .dependencies
            .iter()
            .flat_map(|dep| {
                dep.cves
                    .iter()
                    .filter(|c| !c.is_sentinel())
                    .map(move |cve| FindingEntry {
                        cve_id: cve.id.clone(),
                        severity: cve.severity.clone(),
                        dependency: dep.name.clone(),
                        version: dep.version.clone(),
                        fixed_version: cve.fixed_version.clone(),
                    })
            })
            .collect();

        Self {
            project: config.project_name.clone(),
            report_path: report_path.to_owned(),
            report_format: config.report_format.to_string(),
            match_policy: config.match_policy.to_string(),
            dependencies: outcome.dependencies.len(),
            declared: outcome.declared_count,
            synthetic: outcome.synthetic_count(),
            headers: outcome.header_count,
            unattributed_headers: outcome.unattributed_headers.len(),
            binaries_scanned: outcome.binaries_scanned,
            duration_ms: outcome.duration.as_millis() as u64,
            vulnerabilities: VulnSummary {
                critical: counts.critical,
                high: counts.high,
                medium: counts.medium,
                low: counts.low,
                info: counts.info,
                total: counts.total(),
                check_errors,
            },
            findings,
            skipped: outcome
                .skipped
                .iter()
                .map(|s| SkippedEntry {
                    path: s.path.clone(),
                    reason: s.reason.clone(),
                })
                .collect(),
        }
    }
}

impl Render for ScanSummary {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        use colored::Colorize;

        writeln!(w, "Project: {}", self.project.bold())?;
        writeln!(
            w,
            "Report: {} ({}, {} policy)",
            self.report_path, self.report_format, self.match_policy
        )?;
        writeln!(
            w,
            "Dependencies: {} ({} declared, {} system)",
            self.dependencies, self.declared, self.synthetic
        )?;
        writeln!(
            w,
            "Headers: {} ({} unattributed)",
            self.headers, self.unattributed_headers
        )?;
        writeln!(w, "Binaries scanned: {}", self.binaries_scanned)?;
        writeln!(w, "Duration: {} ms", self.duration_ms)?;
        writeln!(w)?;

        let vuln_str = format!(
            "{} total (C:{} H:{} M:{} L:{} I:{})",
            self.vulnerabilities.total,
            self.vulnerabilities.critical,
            self.vulnerabilities.high,
            self.vulnerabilities.medium,
            self.vulnerabilities.low,
            self.vulnerabilities.info
        );
        if self.vulnerabilities.total > 0 {
            writeln!(w, "Vulnerabilities: {}", vuln_str.red().bold())?;
        } else {
            writeln!(w, "Vulnerabilities: {}", vuln_str.green().bold())?;
        }
        if self.vulnerabilities.check_errors > 0 {
            writeln!(
                w,
                "{}",
                format!(
                    "Vulnerability lookup failed for {} dependencies",
                    self.vulnerabilities.check_errors
                )
                .yellow()
            )?;
        }

        if !self.findings.is_empty() {
            writeln!(w)?;
            writeln!(
                w,
                "{:<18} {:<10} {:<25} {:<12} Fixed",
                "CVE", "Severity", "Dependency", "Version"
            )?;
            writeln!(w, "{}", "-".repeat(80))?;

            for f in &self.findings {
                let severity_colored = match f.severity.to_uppercase().as_str() {
                    "CRITICAL" => f.severity.red().bold(),
                    "HIGH" => f.severity.red(),
                    "MEDIUM" => f.severity.yellow(),
                    "INFO" => f.severity.dimmed(),
                    _ => f.severity.normal(),
                };
                let fixed = if f.fixed_version.is_empty() {
                    "N/A"
                } else {
                    f.fixed_version.as_str()
                };
                writeln!(
                    w,
                    "{:<18} {:<10} {:<25} {:<12} {}",
                    f.cve_id, severity_colored, f.dependency, f.version, fixed
                )?;
            }
        }

        if !self.skipped.is_empty() {
            writeln!(w)?;
            writeln!(w, "{}", "Skipped inputs:".yellow().bold())?;
            for s in &self.skipped {
                writeln!(w, "  {} ({})", s.path, s.reason)?;
            }
        }

        Ok(())
    }
}
