//! depdiscover 명령줄 도구
//!
//! 설정을 로드하고 로깅을 초기화한 뒤 서브커맨드를 실행합니다.
//! 실패 시 [`CliError::exit_code`]에 따른 종료 코드로 끝납니다.

mod cli;
mod commands;
mod error;
mod logging;
mod output;

use clap::Parser;
use colored::Colorize;

use depdiscover_core::config::GeneralConfig;

use crate::cli::{Cli, Commands};
use crate::commands::ConfigSource;
use crate::error::CliError;
use crate::output::OutputWriter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let code = match run(cli).await {
        Ok(()) => 0,
        Err(e) => {
            eprintln!("{} {}", "error:".red().bold(), e);
            e.exit_code()
        }
    };
    std::process::exit(code);
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let source = ConfigSource::from_arg(cli.config.as_deref());
    let loaded = source.load().await;

    // 설정 로드가 실패해도 에러를 기록할 수 있도록 기본 로깅 설정으로 초기화
    let mut general = loaded
        .as_ref()
        .map(|c| c.general.clone())
        .unwrap_or_else(|_| GeneralConfig::default());
    if let Some(level) = cli.log_level {
        general.log_level = level;
    }
    logging::init_tracing(&general).map_err(|e| CliError::Config(e.to_string()))?;

    tracing::debug!(config = %source.display(), explicit = source.explicit, "depdiscover starting");

    let writer = OutputWriter::new(cli.output_format);

    match cli.command {
        Commands::Config(args) => commands::config::execute(args, &source, &writer).await,
        Commands::Scan(args) => commands::scan::execute(args, loaded?, &writer).await,
        Commands::Elf(args) => commands::elf::execute(args, &loaded?, &writer).await,
    }
}
