//! compile_commands.json 로더
//!
//! 컴파일 데이터베이스의 각 엔트리를 [`CompileCommand`]로 변환합니다.
//! `file`이 없거나 `command`/`arguments`가 모두 없는 엔트리는 건너뜁니다.

use std::path::Path;

use serde_json::Value;
use tracing::{debug, info};

use crate::error::SbomScannerError;

/// 컴파일 명령 하나
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileCommand {
    /// 소스 파일 경로
    pub file: String,
    /// 전체 명령줄 (`arguments` 배열은 공백으로 연결)
    pub command: String,
    /// 컴파일러 작업 디렉토리 (없으면 빈 문자열)
    pub directory: String,
}

/// JSON 내용을 파싱합니다. 최상위가 배열이 아니면 에러입니다.
pub fn parse_compile_commands(
    content: &str,
    source_path: &str,
) -> Result<Vec<CompileCommand>, SbomScannerError> {
    let build_err = |reason: String| SbomScannerError::BuildInfo {
        path: source_path.to_owned(),
        reason,
    };

    let doc: Value = serde_json::from_str(content).map_err(|e| build_err(e.to_string()))?;
    let Value::Array(entries) = doc else {
        return Err(build_err("expected top-level array".to_owned()));
    };

    let commands: Vec<CompileCommand> = entries.iter().filter_map(parse_entry).collect();
    debug!(
        path = source_path,
        entries = entries.len(),
        commands = commands.len(),
        "parsed compile commands"
    );
    Ok(commands)
}

fn parse_entry(entry: &Value) -> Option<CompileCommand> {
    let file = entry.get("file")?.as_str()?.to_owned();
    let directory = entry
        .get("directory")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_owned();

    let command = if let Some(command) = entry.get("command").and_then(Value::as_str) {
        command.to_owned()
    } else if let Some(args) = entry.get("arguments").and_then(Value::as_array) {
        args.iter()
            .filter_map(Value::as_str)
            .collect::<Vec<_>>()
            .join(" ")
    } else {
        return None;
    };

    Some(CompileCommand {
        file,
        command,
        directory,
    })
}

/// 파일에서 컴파일 데이터베이스를 로드합니다.
pub fn load_compile_commands(
    path: &Path,
    max_size: u64,
) -> Result<Vec<CompileCommand>, SbomScannerError> {
    let display = path.display().to_string();
    let metadata = std::fs::metadata(path).map_err(|e| SbomScannerError::Io {
        path: display.clone(),
        source: e,
    })?;
    if metadata.len() > max_size {
        return Err(SbomScannerError::FileTooBig {
            path: display,
            size: metadata.len(),
            max: max_size,
        });
    }

    let content = std::fs::read_to_string(path).map_err(|e| SbomScannerError::Io {
        path: display.clone(),
        source: e,
    })?;
    let commands = parse_compile_commands(&content, &display)?;
    info!(path = %path.display(), count = commands.len(), "loaded compile commands");
    Ok(commands)
}
