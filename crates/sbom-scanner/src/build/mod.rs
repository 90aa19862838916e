//! 빌드 호출 스캔 -- 헤더 풀 생성
//!
//! compile_commands.json의 각 소스 파일을 읽어 `#include` 대상을 찾고,
//! 명령의 include 경로와 시스템 경로로 실제 헤더 파일을 해석합니다.
//! 결과는 중복 없이 정렬된 절대 경로 집합입니다.

pub mod compile_commands;
pub mod includes;

use std::collections::BTreeSet;
use std::path::Path;

use tracing::{debug, info, warn};

use crate::error::SbomScannerError;

pub use compile_commands::{CompileCommand, load_compile_commands, parse_compile_commands};
pub use includes::{extract_include_paths, resolve_header, scan_includes};

/// 헤더 풀 수집기
#[derive(Debug, Clone)]
pub struct HeaderCollector {
    system_include_dirs: Vec<String>,
    max_file_size: u64,
}

impl HeaderCollector {
    /// 시스템 include 경로와 파일 크기 상한으로 수집기를 생성합니다.
    pub fn new(system_include_dirs: Vec<String>, max_file_size: u64) -> Self {
        Self {
            system_include_dirs,
            max_file_size,
        }
    }

    /// compile_commands.json 파일에서 헤더 풀을 수집합니다.
    pub fn collect_from_file(&self, path: &Path) -> Result<BTreeSet<String>, SbomScannerError> {
        let commands = load_compile_commands(path, self.max_file_size)?;
        Ok(self.collect(&commands))
    }

    /// 컴파일 명령 목록에서 헤더 풀을 수집합니다.
    ///
    /// 읽을 수 없는 소스 파일과 해석되지 않는 헤더는 건너뜁니다.
    pub fn collect(&self, commands: &[CompileCommand]) -> BTreeSet<String> {
        let mut headers = BTreeSet::new();
        let mut unresolved = 0usize;

        for cmd in commands {
            let include_paths = extract_include_paths(&cmd.command);
            let source_path = source_file_path(cmd);
            let source = match std::fs::read_to_string(&source_path) {
                Ok(source) => source,
                Err(e) => {
                    debug!(file = %source_path.display(), error = %e, "skipping unreadable source");
                    continue;
                }
            };

            for name in scan_includes(&source) {
                match resolve_header(
                    &name,
                    &include_paths,
                    &cmd.directory,
                    &self.system_include_dirs,
                ) {
                    Some(path) => {
                        headers.insert(path);
                    }
                    None => unresolved += 1,
                }
            }
        }

        if unresolved > 0 {
            warn!(unresolved, "some included headers could not be resolved");
        }
        info!(
            commands = commands.len(),
            headers = headers.len(),
            "collected header pool"
        );
        headers
    }
}

/// 상대 소스 경로는 명령의 작업 디렉토리 기준으로 해석합니다.
fn source_file_path(cmd: &CompileCommand) -> std::path::PathBuf {
    let file = Path::new(&cmd.file);
    if file.is_relative() && !cmd.directory.is_empty() {
        Path::new(&cmd.directory).join(file)
    } else {
        file.to_path_buf()
    }
}
