//! CLI-specific error types and exit code mapping

use depdiscover_core::error::DepdiscoverError;
use depdiscover_elf::ElfScanError;
use depdiscover_sbom_scanner::SbomScannerError;

/// CLI-specific error type.
///
/// The `exit_code()` method maps errors to process exit codes.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Configuration loading or validation failure.
    #[error("configuration error: {0}")]
    Config(String),

    /// A subcommand-specific operation failed.
    #[error("{0}")]
    Command(String),

    /// JSON serialisation failed during output rendering.
    #[error("json output error: {0}")]
    JsonSerialize(#[from] serde_json::Error),

    /// IO error (report write, stdout write, etc.).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Wrapped domain error from depdiscover-core.
    #[error("{0}")]
    Core(#[from] DepdiscoverError),

    /// Scanner domain error, or vulnerabilities found with `--fail-on-vulns`.
    #[error("scan error: {0}")]
    Scan(String),
}

impl CliError {
    /// Map the error to a process exit code.
    ///
    /// | Code | Meaning                  |
    /// |------|--------------------------|
    /// | 0    | Success                  |
    /// | 1    | General / command error  |
    /// | 2    | Configuration error      |
    /// | 4    | Scan error               |
    /// | 10   | IO error                 |
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Config(_) => 2,
            Self::Scan(_) => 4,
            Self::Io(_) => 10,
            Self::Core(inner) => match inner {
                DepdiscoverError::Config(_) => 2,
                DepdiscoverError::Binary(_) | DepdiscoverError::Scan(_) => 4,
                DepdiscoverError::Io(_) => 10,
            },
            Self::JsonSerialize(_) | Self::Command(_) => 1,
        }
    }
}

impl From<SbomScannerError> for CliError {
    fn from(e: SbomScannerError) -> Self {
        Self::Scan(e.to_string())
    }
}

impl From<ElfScanError> for CliError {
    fn from(e: ElfScanError) -> Self {
        Self::Scan(e.to_string())
    }
}
