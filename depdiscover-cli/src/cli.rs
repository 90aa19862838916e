//! CLI argument parsing using clap derive API
//!
//! This module defines the command-line interface structure using clap's derive macros.
//! It is purely declarative with no side effects or I/O.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

/// depdiscover -- native C/C++ dependency discovery and SBOM generation.
///
/// Use `depdiscover <COMMAND> --help` for subcommand details.
#[derive(Parser, Debug)]
#[command(name = "depdiscover", version, about, long_about = None)]
pub struct Cli {
    /// Path to the depdiscover.toml configuration file [default: depdiscover.toml].
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Override log level (trace, debug, info, warn, error).
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Output format for command summaries.
    #[arg(long = "output-format", global = true, default_value = "text")]
    pub output_format: OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Supported output formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output.
    Text,
    /// Machine-readable JSON.
    Json,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Discover dependencies and write a report.
    Scan(ScanArgs),

    /// List the shared libraries a single ELF binary needs.
    Elf(ElfArgs),

    /// Manage configuration.
    Config(ConfigArgs),
}

// ---- scan ----

/// Report formats selectable on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ReportFormatArg {
    /// depdiscover JSON report (schema 1.2).
    Native,
    /// CycloneDX 1.5 JSON.
    Cyclonedx,
}

/// Correlation match policies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum MatchPolicyArg {
    /// Substring and token heuristics.
    Legacy,
    /// Exact names only.
    Strict,
}

/// Run the full discovery pipeline.
///
/// Inputs not given here fall back to the `[scan]` section of the configuration.
#[derive(Args, Debug, Default)]
pub struct ScanArgs {
    /// compile_commands.json produced by the build.
    #[arg(short = 'c', long)]
    pub compile_commands: Option<PathBuf>,

    /// CMake link-library list (libs.txt).
    #[arg(short = 'l', long)]
    pub libs: Option<PathBuf>,

    /// Binary to inspect for needed libraries (repeatable).
    #[arg(short = 'b', long = "binary")]
    pub binaries: Vec<PathBuf>,

    /// vcpkg.json manifest.
    #[arg(short = 'v', long)]
    pub vcpkg: Option<PathBuf>,

    /// conanfile.txt manifest.
    #[arg(short = 'C', long)]
    pub conan: Option<PathBuf>,

    /// Report output path ("-" for stdout).
    #[arg(short = 'o', long)]
    pub output: Option<String>,

    /// Project name recorded in the report.
    #[arg(short = 'n', long)]
    pub name: Option<String>,

    /// Report format.
    #[arg(long)]
    pub format: Option<ReportFormatArg>,

    /// Dependency match policy.
    #[arg(long)]
    pub policy: Option<MatchPolicyArg>,

    /// Offline vulnerability database (JSON).
    #[arg(long)]
    pub vuln_db: Option<PathBuf>,

    /// Skip vulnerability lookup.
    #[arg(long)]
    pub no_vuln_check: bool,

    /// Skip pkg-config lookup.
    #[arg(long)]
    pub no_pkg_config: bool,

    /// Exit with a scan error (code 4) when vulnerabilities are found.
    #[arg(long)]
    pub fail_on_vulns: bool,
}

// ---- elf ----

/// Inspect one binary.
#[derive(Args, Debug)]
pub struct ElfArgs {
    /// Path to the binary.
    pub binary: PathBuf,
}

// ---- config ----

/// Manage depdiscover configuration.
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Validate the configuration file and report errors.
    Validate,
    /// Show the effective configuration (file + env overrides + defaults).
    Show {
        /// Show only a specific section (general, scan, enrichment).
        #[arg(long)]
        section: Option<String>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_verify_structure() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_cli_parse_scan_defaults() {
        let cli = Cli::try_parse_from(["depdiscover", "scan"]).expect("parse succeeded");
        assert!(cli.config.is_none(), "config should default to None");
        assert!(cli.log_level.is_none());
        assert_eq!(cli.output_format, OutputFormat::Text);
        match cli.command {
            Commands::Scan(args) => {
                assert!(args.compile_commands.is_none());
                assert!(args.binaries.is_empty());
                assert!(args.output.is_none());
                assert!(args.format.is_none());
                assert!(!args.fail_on_vulns);
            }
            _ => panic!("expected Scan command"),
        }
    }

    #[test]
    fn test_cli_parse_scan_short_flags() {
        let cli = Cli::try_parse_from([
            "depdiscover",
            "scan",
            "-c",
            "build/compile_commands.json",
            "-l",
            "build/libs.txt",
            "-b",
            "build/app",
            "-b",
            "build/tool",
            "-v",
            "vcpkg.json",
            "-C",
            "conanfile.txt",
            "-o",
            "-",
            "-n",
            "demo",
        ])
        .expect("parse succeeded");

        match cli.command {
            Commands::Scan(args) => {
                assert_eq!(
                    args.compile_commands,
                    Some(PathBuf::from("build/compile_commands.json"))
                );
                assert_eq!(args.libs, Some(PathBuf::from("build/libs.txt")));
                assert_eq!(
                    args.binaries,
                    vec![PathBuf::from("build/app"), PathBuf::from("build/tool")]
                );
                assert_eq!(args.vcpkg, Some(PathBuf::from("vcpkg.json")));
                assert_eq!(args.conan, Some(PathBuf::from("conanfile.txt")));
                assert_eq!(args.output.as_deref(), Some("-"));
                assert_eq!(args.name.as_deref(), Some("demo"));
            }
            _ => panic!("expected Scan command"),
        }
    }

    #[test]
    fn test_cli_parse_scan_long_flags() {
        let cli = Cli::try_parse_from([
            "depdiscover",
            "scan",
            "--format",
            "cyclonedx",
            "--policy",
            "strict",
            "--vuln-db",
            "db.json",
            "--no-pkg-config",
            "--fail-on-vulns",
        ])
        .expect("parse succeeded");

        match cli.command {
            Commands::Scan(args) => {
                assert_eq!(args.format, Some(ReportFormatArg::Cyclonedx));
                assert_eq!(args.policy, Some(MatchPolicyArg::Strict));
                assert_eq!(args.vuln_db, Some(PathBuf::from("db.json")));
                assert!(args.no_pkg_config);
                assert!(!args.no_vuln_check);
                assert!(args.fail_on_vulns);
            }
            _ => panic!("expected Scan command"),
        }
    }

    #[test]
    fn test_cli_parse_scan_invalid_format() {
        let result = Cli::try_parse_from(["depdiscover", "scan", "--format", "spdx"]);
        assert!(result.is_err(), "unknown report format should be rejected");
    }

    #[test]
    fn test_cli_parse_elf() {
        let cli = Cli::try_parse_from(["depdiscover", "elf", "/usr/bin/ls"]).expect("parse succeeded");
        match cli.command {
            Commands::Elf(args) => assert_eq!(args.binary, PathBuf::from("/usr/bin/ls")),
            _ => panic!("expected Elf command"),
        }
    }

    #[test]
    fn test_cli_parse_elf_requires_binary() {
        assert!(Cli::try_parse_from(["depdiscover", "elf"]).is_err());
    }

    #[test]
    fn test_cli_parse_config_validate() {
        let cli = Cli::try_parse_from(["depdiscover", "config", "validate"]).expect("parse succeeded");
        match cli.command {
            Commands::Config(args) => assert!(matches!(args.action, ConfigAction::Validate)),
            _ => panic!("expected Config command"),
        }
    }

    #[test]
    fn test_cli_parse_config_show_section() {
        let cli = Cli::try_parse_from(["depdiscover", "config", "show", "--section", "scan"])
            .expect("parse succeeded");
        match cli.command {
            Commands::Config(args) => match args.action {
                ConfigAction::Show { section } => assert_eq!(section.as_deref(), Some("scan")),
                _ => panic!("expected Show action"),
            },
            _ => panic!("expected Config command"),
        }
    }

    #[test]
    fn test_cli_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "depdiscover",
            "scan",
            "--config",
            "custom.toml",
            "--log-level",
            "debug",
            "--output-format",
            "json",
        ])
        .expect("parse succeeded");
        assert_eq!(cli.config, Some(PathBuf::from("custom.toml")));
        assert_eq!(cli.log_level.as_deref(), Some("debug"));
        assert_eq!(cli.output_format, OutputFormat::Json);
    }

    #[test]
    fn test_cli_missing_subcommand() {
        assert!(Cli::try_parse_from(["depdiscover"]).is_err());
    }
}
