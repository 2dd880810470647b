use sea_orm_migration::prelude::*;

use crate::{AppliedCheck, MigrationUnit, Step};

/// 单词连续答对多少次视为已掌握
pub fn unit() -> MigrationUnit {
    MigrationUnit::new(
        "add_mastery_threshold_column",
        AppliedCheck::columns_exist(UserSettings::Table, [UserSettings::MasteryThreshold]),
    )
    .step(Step::add_column(
        UserSettings::Table,
        UserSettings::MasteryThreshold,
        |col| col.integer().not_null().default(10),
    ))
}

#[derive(DeriveIden, Clone, Copy)]
enum UserSettings {
    Table,
    MasteryThreshold,
}
