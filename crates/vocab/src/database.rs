use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};
use sea_orm::sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sea_orm::{ConnectionTrait, DatabaseConnection, SqlxSqliteConnector};
use tracing::{debug, info};
use vocab_migration::Gateway;

use crate::config::Config;

/// 迁移之前就存在的基础表
const BASE_TABLES: [&str; 2] = [
    "CREATE TABLE IF NOT EXISTS users (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        username TEXT NOT NULL UNIQUE,
        email TEXT NOT NULL UNIQUE,
        password_hash TEXT NOT NULL,
        created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
    )",
    "CREATE TABLE IF NOT EXISTS user_settings (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        user_id INTEGER NOT NULL UNIQUE REFERENCES users(id),
        daily_goal INTEGER NOT NULL DEFAULT 20,
        language TEXT NOT NULL DEFAULT 'en',
        updated_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
    )",
];

/// 创建 SQLite 连接选项
fn create_sqlite_options(config: &Config) -> Result<SqliteConnectOptions> {
    let options = SqliteConnectOptions::from_str(&config.database_url)
        .with_context(|| format!("无效的数据库地址: {}", config.database_url))?
        .busy_timeout(Duration::from_secs(config.busy_timeout_secs))
        .foreign_keys(true);
    if config.dry_run {
        // 日志模式会写入数据库文件头，dry run 只读打开且保持原有模式
        return Ok(options.read_only(true).create_if_missing(false));
    }
    Ok(options
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .synchronous(SqliteSynchronous::Normal))
}

/// 建立迁移使用的连接
///
/// 使用单连接池并在整个运行期间持有，避免多连接导致的迁移顺序问题；
/// 内存数据库在连接关闭后即丢失，因此不回收空闲连接。
pub async fn connect(config: &Config) -> Result<Gateway> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .min_connections(1)
        .acquire_timeout(Duration::from_secs(config.busy_timeout_secs))
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(create_sqlite_options(config)?)
        .await
        .context("连接数据库失败")?;
    debug!("已连接数据库 {}", config.database_url);
    Ok(Gateway::new(SqlxSqliteConnector::from_sqlx_sqlite_pool(pool)))
}

/// 确保基础表存在，如果不存在则创建
pub async fn ensure_base_tables(db: &DatabaseConnection) -> Result<()> {
    for sql in BASE_TABLES {
        db.execute_unprepared(sql).await.context("创建基础表失败")?;
    }
    info!("基础表检查完成");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_connect_and_create_base_tables() {
        let gateway = connect(&Config::in_memory()).await.unwrap();
        let db = gateway.connection();
        ensure_base_tables(db).await.unwrap();
        // 重复执行不应报错
        ensure_base_tables(db).await.unwrap();

        let registry = vocab_migration::migrations().unwrap();
        let pending = registry.list_pending(&gateway).await.unwrap();
        assert_eq!(pending.len(), 3);
    }

    #[tokio::test]
    async fn test_unreachable_database_is_reported() {
        let mut config = Config::in_memory();
        config.database_url = "sqlite:///nonexistent-vocab-dir/nested/vocab.sqlite".to_string();
        config.busy_timeout_secs = 1;
        let err = connect(&config).await.err().unwrap();
        assert!(err.to_string().contains("连接数据库失败"));
    }
}
