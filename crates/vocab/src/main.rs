use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use tracing::error;
use vocab::config::{Config, OutputFormat};
use vocab::migrate;
use vocab::utils::init_logger;
use vocab_migration::RunReport;

#[tokio::main]
async fn main() -> ExitCode {
    let config = Config::parse();
    if let Err(e) = init_logger(&config.log_level) {
        eprintln!("{:#}", e);
    }

    match migrate::run(&config).await {
        Ok(report) => {
            if let Err(e) = print_report(&report, config.format) {
                error!("输出迁移结果失败: {:#}", e);
                return ExitCode::FAILURE;
            }
            if report.has_failures() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            }
        }
        Err(e) => {
            error!("迁移未能开始: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn print_report(report: &RunReport, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Text => {
            for line in report.lines() {
                println!("{}", line);
            }
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&report.summaries())?);
        }
    }
    Ok(())
}
