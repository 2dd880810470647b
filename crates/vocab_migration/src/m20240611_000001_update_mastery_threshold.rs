use sea_orm_migration::prelude::*;

use crate::{BackfillRule, MigrationUnit, Predicate};

/// 新的默认掌握阈值
pub const MASTERY_THRESHOLD: i64 = 5;

/// 将阈值为 10 及以上的设置统一调整为 5
///
/// 旧版分两次处理（先等于 10，再大于 10），这里合并为一个 `>= 10` 的谓词。
pub fn unit() -> MigrationUnit {
    MigrationUnit::backfill(
        "update_mastery_threshold",
        BackfillRule::set_to(
            UserSettings::Table,
            UserSettings::MasteryThreshold,
            Predicate::Gte(10),
            MASTERY_THRESHOLD,
        ),
    )
}

#[derive(DeriveIden)]
enum UserSettings {
    Table,
    MasteryThreshold,
}
