//! `depdiscover elf` command handler

use std::io::Write;
use std::path::PathBuf;

use serde::Serialize;
use tracing::info;

use depdiscover_core::config::DepdiscoverConfig;
use depdiscover_elf::{ElfImage, Endianness, needed_libraries};

use crate::cli::ElfArgs;
use crate::error::CliError;
use crate::output::{OutputWriter, Render};

/// Execute the `elf` command.
pub async fn execute(
    args: ElfArgs,
    config: &DepdiscoverConfig,
    writer: &OutputWriter,
) -> Result<(), CliError> {
    let path = args.binary;
    let max_size = config.scan.max_file_size;
    info!(path = %path.display(), "inspecting binary");

    let report = tokio::task::spawn_blocking(move || inspect(path, max_size))
        .await
        .map_err(|e| CliError::Command(format!("elf task failed: {e}")))??;

    writer.render(&report)
}

/// Read one binary and collect its needed libraries.
pub fn inspect(path: PathBuf, max_size: u64) -> Result<ElfReport, CliError> {
    let display = path.display().to_string();
    let Some(image) = ElfImage::open(&path, max_size)? else {
        return Ok(ElfReport {
            path: display,
            elf64: false,
            endianness: None,
            machine: None,
            dynamic: false,
            libraries: Vec::new(),
        });
    };

    let header = image.header();
    Ok(ElfReport {
        path: display,
        elf64: true,
        endianness: Some(
            match header.endianness {
                Endianness::Little => "little",
                Endianness::Big => "big",
            }
            .to_owned(),
        ),
        machine: Some(header.machine),
        dynamic: image.dynamic_segment().is_some(),
        libraries: needed_libraries(&image),
    })
}

/// Needed-library listing of one binary.
#[derive(Debug, Serialize)]
pub struct ElfReport {
    pub path: String,
    /// The file is a recognised ELF64 image.
    pub elf64: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endianness: Option<String>,
    /// `e_machine`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub machine: Option<u16>,
    /// A dynamic-linking segment is present.
    pub dynamic: bool,
    pub libraries: Vec<String>,
}

impl Render for ElfReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        use colored::Colorize;

        writeln!(w, "Binary: {}", self.path.bold())?;

        if !self.elf64 {
            writeln!(w, "  {}", "not an ELF64 image, nothing to report".yellow())?;
            return Ok(());
        }

        writeln!(
            w,
            "  Endianness: {}",
            self.endianness.as_deref().unwrap_or("unknown")
        )?;
        if let Some(machine) = self.machine {
            writeln!(w, "  Machine: {machine:#06x}")?;
        }

        if !self.dynamic {
            writeln!(w, "  {}", "statically linked (no dynamic segment)".dimmed())?;
            return Ok(());
        }

        writeln!(w, "  Needed libraries: {}", self.libraries.len())?;
        for lib in &self.libraries {
            writeln!(w, "    {lib}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inspect_non_elf_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("script.sh");
        std::fs::write(&path, "#!/bin/sh\necho hi\n").expect("write");

        let report = inspect(path, 1024 * 1024).expect("non-ELF is not an error");
        assert!(!report.elf64);
        assert!(report.libraries.is_empty());
    }

    #[test]
    fn test_inspect_missing_file_is_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let err = inspect(dir.path().join("missing"), 1024).expect_err("missing file");
        assert_eq!(err.exit_code(), 4);
    }

    #[test]
    fn test_inspect_too_large_is_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("big.bin");
        std::fs::write(&path, vec![0u8; 128]).expect("write");
        assert!(inspect(path, 16).is_err());
    }

    #[test]
    fn test_render_text_lists_libraries() {
        let report = ElfReport {
            path: "build/app".to_owned(),
            elf64: true,
            endianness: Some("little".to_owned()),
            machine: Some(0x3e),
            dynamic: true,
            libraries: vec!["libz.so.1".to_owned(), "libc.so.6".to_owned()],
        };
        let mut buffer = Vec::new();
        report.render_text(&mut buffer).expect("render");
        let output = String::from_utf8(buffer).expect("utf8");
        assert!(output.contains("Needed libraries: 2"));
        assert!(output.contains("libz.so.1"));
        assert!(output.contains("0x003e"));
    }

    #[test]
    fn test_json_omits_header_fields_for_non_elf() {
        let report = ElfReport {
            path: "README".to_owned(),
            elf64: false,
            endianness: None,
            machine: None,
            dynamic: false,
            libraries: Vec::new(),
        };
        let json = serde_json::to_value(&report).expect("json");
        assert!(json.get("endianness").is_none());
        assert_eq!(json["elf64"], false);
    }
}
