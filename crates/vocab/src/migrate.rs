use anyhow::{Context, Result};
use tracing::{info, warn};
use vocab_migration::{RunReport, Runner};

use crate::config::Config;
use crate::database;

/// 连接数据库并应用全部待执行的迁移
///
/// 单元级别的失败记录在报告中，只有连接、建表等准备工作失败才返回错误。
pub async fn run(config: &Config) -> Result<RunReport> {
    let registry = vocab_migration::migrations().context("加载迁移列表失败")?;
    let gateway = database::connect(config).await?;
    // dry run 不做任何修改，基础表缺失时由检查报告
    if !config.dry_run {
        database::ensure_base_tables(gateway.connection()).await?;
    }

    info!("共 {} 个迁移，开始检查", registry.len());
    let report = Runner::new(config.runner_options())
        .run(&gateway, registry.units())
        .await;

    if let Err(e) = gateway.into_connection().close().await {
        warn!("关闭数据库连接失败: {}", e);
    }
    Ok(report)
}
