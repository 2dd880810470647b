use sea_orm::DbErr;
use tracing::{debug, error, info, warn};

use crate::error::MigrationError;
use crate::gateway::Gateway;
use crate::report::{MigrationRecord, RunReport};
use crate::unit::MigrationUnit;

#[derive(Debug, Clone, Copy, Default)]
pub struct RunnerOptions {
    /// 只检查，不执行任何前向步骤
    pub dry_run: bool,
}

/// 按顺序应用迁移单元
///
/// 每个单元在独立事务中执行，任一单元失败即回滚并停止，后续单元不会被尝试。
#[derive(Debug, Default)]
pub struct Runner {
    options: RunnerOptions,
}

impl Runner {
    pub fn new(options: RunnerOptions) -> Self {
        Self { options }
    }

    pub async fn run(&self, gateway: &Gateway, units: &[MigrationUnit]) -> RunReport {
        // 运行开始前统一检查，前面单元的执行不会改变后续单元的待执行状态
        let mut initial = Vec::with_capacity(units.len());
        for unit in units {
            initial.push(gateway.is_applied(unit.check()).await);
        }

        let mut report = RunReport::default();
        for (unit, applied) in units.iter().zip(initial) {
            let record = self.apply(gateway, unit, applied).await;
            let failed = record.is_failed();
            report.push(record);
            if failed {
                warn!("迁移 {} 失败，停止执行后续 {} 个迁移", unit.name(), remaining(units, unit));
                break;
            }
        }
        report
    }

    async fn apply(
        &self,
        gateway: &Gateway,
        unit: &MigrationUnit,
        applied: Result<bool, DbErr>,
    ) -> MigrationRecord {
        let applied = match applied {
            Ok(applied) => Ok(applied),
            // 依赖的表可能由前面的单元创建，执行到这里时再检查一次
            Err(_) => gateway.is_applied(unit.check()).await,
        };
        match applied {
            Ok(true) => {
                debug!("迁移 {} 已应用，跳过", unit.name());
                return MigrationRecord::skipped(unit.name());
            }
            Ok(false) => {}
            Err(source) => {
                let err = MigrationError::PreconditionCheck {
                    unit: unit.name().to_string(),
                    source,
                };
                error!("{}", err);
                return MigrationRecord::failed(unit.name(), err);
            }
        }

        if self.options.dry_run {
            info!("迁移 {} 待执行（dry run）", unit.name());
            return MigrationRecord::pending(unit.name());
        }

        match execute(gateway, unit).await {
            Ok(rows) => {
                info!("迁移 {} 已应用，影响 {} 行", unit.name(), rows);
                MigrationRecord::applied(unit.name(), rows)
            }
            Err(err) => {
                error!("{}", err);
                MigrationRecord::failed(unit.name(), err)
            }
        }
    }
}

async fn execute(gateway: &Gateway, unit: &MigrationUnit) -> Result<u64, MigrationError> {
    let transaction_error = |source: DbErr| MigrationError::Transaction {
        unit: unit.name().to_string(),
        source,
    };

    let txn = gateway.begin().await.map_err(transaction_error)?;
    let mut rows = 0;
    for (index, step) in unit.steps().iter().enumerate() {
        match step.execute(&txn).await {
            Ok(affected) => rows += affected,
            Err(err) => {
                if let Err(e) = txn.rollback().await {
                    warn!("回滚迁移 {} 失败: {}", unit.name(), e);
                }
                return Err(err.into_migration_error(unit.name(), index + 1));
            }
        }
    }
    txn.commit().await.map_err(transaction_error)?;
    Ok(rows)
}

fn remaining(units: &[MigrationUnit], failed: &MigrationUnit) -> usize {
    units
        .iter()
        .position(|u| u.name() == failed.name())
        .map(|i| units.len() - i - 1)
        .unwrap_or(0)
}
