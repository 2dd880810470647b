use clap::{Parser, ValueEnum};
use vocab_migration::RunnerOptions;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// 每个迁移一行
    Text,
    Json,
}

/// 运行配置，在启动时构造一次，之后以引用传递
#[derive(Debug, Clone, Parser)]
#[command(name = "vocab-migrate", version, about = "应用所有待执行的数据库迁移")]
pub struct Config {
    /// 数据库连接地址
    #[arg(long, env = "DATABASE_URL", default_value = "sqlite://vocab.sqlite")]
    pub database_url: String,

    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// SQLite busy_timeout，单位秒
    #[arg(long = "busy-timeout", env = "DB_BUSY_TIMEOUT", default_value_t = 90)]
    pub busy_timeout_secs: u64,

    /// 只检查哪些迁移待执行，不做任何修改
    #[arg(long, env = "MIGRATE_DRY_RUN")]
    pub dry_run: bool,

    #[arg(long, env = "MIGRATE_FORMAT", value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

impl Config {
    pub fn runner_options(&self) -> RunnerOptions {
        RunnerOptions { dry_run: self.dry_run }
    }

    /// 测试用的内存数据库配置
    #[cfg(test)]
    pub fn in_memory() -> Self {
        Self {
            database_url: "sqlite::memory:".to_string(),
            log_level: "debug".to_string(),
            busy_timeout_secs: 5,
            dry_run: false,
            format: OutputFormat::Text,
        }
    }
}
