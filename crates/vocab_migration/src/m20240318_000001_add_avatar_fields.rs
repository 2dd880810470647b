use sea_orm_migration::prelude::*;

use crate::{AppliedCheck, MigrationUnit, Step};

/// 为 users 表添加头像字段
///
/// SQLite 不支持单次 ALTER TABLE 添加多列，需要分开执行
pub fn unit() -> MigrationUnit {
    MigrationUnit::new(
        "add_avatar_fields",
        AppliedCheck::columns_exist(Users::Table, [Users::AvatarUrl, Users::AvatarType]),
    )
    .step(Step::add_column(Users::Table, Users::AvatarUrl, |col| col.text().null()))
    .step(Step::add_column(Users::Table, Users::AvatarType, |col| {
        // default: 系统默认头像, upload: 用户上传, url: 外部链接
        col.text().not_null().default("default")
    }))
}

#[derive(DeriveIden, Clone, Copy)]
enum Users {
    Table,
    AvatarUrl,
    AvatarType,
}
