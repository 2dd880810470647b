//! 词汇学习平台的数据库迁移
//!
//! 每个迁移单元都带有幂等检查，已经生效的单元会被跳过，
//! 因此失败后修复问题再重新运行是安全的。

mod backfill;
mod check;
mod error;
mod gateway;
mod predicate;
mod registry;
mod report;
mod runner;
mod step;
mod unit;

#[cfg(test)]
mod testing;

mod m20240318_000001_add_avatar_fields;
mod m20240502_000001_add_mastery_threshold_column;
mod m20240611_000001_update_mastery_threshold;

pub use backfill::{backfill, BackfillRule};
pub use check::AppliedCheck;
pub use error::{MigrationError, StepError};
pub use gateway::Gateway;
pub use m20240611_000001_update_mastery_threshold::MASTERY_THRESHOLD;
pub use predicate::Predicate;
pub use registry::Registry;
pub use report::{MigrationRecord, MigrationStatus, RecordSummary, RunReport};
pub use runner::{Runner, RunnerOptions};
pub use step::Step;
pub use unit::MigrationUnit;

/// 内置的迁移单元，按执行顺序排列，新增迁移追加到末尾
pub fn migrations() -> Result<Registry, MigrationError> {
    let mut registry = Registry::new();
    registry.register(m20240318_000001_add_avatar_fields::unit())?;
    registry.register(m20240502_000001_add_mastery_threshold_column::unit())?;
    registry.register(m20240611_000001_update_mastery_threshold::unit())?;
    Ok(registry)
}
