use sea_orm::{ConnectionTrait, DatabaseTransaction, Statement, Value};
use sea_orm_migration::prelude::*;
use tracing::debug;

use crate::backfill::{backfill, BackfillRule};
use crate::check::has_column;
use crate::error::StepError;

/// 迁移单元中的一个前向步骤，总是在单元的事务内执行
#[derive(Debug, Clone)]
pub enum Step {
    /// 添加列；列已存在时跳过
    AddColumn {
        table: String,
        column: String,
        def: ColumnDef,
    },
    /// 带参数的 SQL 语句
    Sql { sql: String, values: Vec<Value> },
    Backfill(BackfillRule),
}

impl Step {
    /// 构造添加列的步骤，`build` 用于补充列类型、默认值等定义
    pub fn add_column<T, C, F>(table: T, column: C, build: F) -> Self
    where
        T: Iden,
        C: Iden + 'static,
        F: FnOnce(&mut ColumnDef) -> &mut ColumnDef,
    {
        let table = table.to_string();
        let name = column.to_string();
        let mut def = ColumnDef::new(column);
        build(&mut def);
        Self::AddColumn {
            table,
            column: name,
            def,
        }
    }

    pub fn sql<I>(sql: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = Value>,
    {
        Self::Sql {
            sql: sql.into(),
            values: values.into_iter().collect(),
        }
    }

    /// 执行步骤，返回受影响的行数
    pub async fn execute(&self, txn: &DatabaseTransaction) -> Result<u64, StepError> {
        match self {
            Self::AddColumn { table, column, def } => {
                if has_column(txn, table, column).await? {
                    debug!("{}.{} 字段已存在，跳过", table, column);
                    return Ok(0);
                }
                let manager = SchemaManager::new(txn);
                manager
                    .alter_table(
                        Table::alter()
                            .table(Alias::new(table.as_str()))
                            .add_column(def.clone())
                            .to_owned(),
                    )
                    .await?;
                debug!("已添加 {}.{} 字段", table, column);
                Ok(0)
            }
            Self::Sql { sql, values } => {
                let stmt = Statement::from_sql_and_values(txn.get_database_backend(), sql.as_str(), values.clone());
                let result = txn.execute(stmt).await?;
                Ok(result.rows_affected())
            }
            Self::Backfill(rule) => backfill(txn, rule).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use sea_orm::TransactionTrait;

    use super::*;
    use crate::check::has_column;
    use crate::testing::memory_db;

    #[derive(DeriveIden)]
    enum Users {
        Table,
        Nickname,
    }

    #[tokio::test]
    async fn test_add_column_is_skipped_when_present() {
        let db = memory_db().await;
        let step = Step::add_column(Users::Table, Users::Nickname, |col| col.string().null());
        let Step::AddColumn { table, column, .. } = &step else {
            panic!("unexpected step: {:?}", step);
        };
        assert_eq!(table, "users");
        assert_eq!(column, "nickname");

        for _ in 0..2 {
            let txn = db.begin().await.unwrap();
            assert_eq!(step.execute(&txn).await.unwrap(), 0);
            txn.commit().await.unwrap();
        }
        assert!(has_column(&db, "users", "nickname").await.unwrap());
    }

    #[tokio::test]
    async fn test_sql_step_reports_rows() {
        let db = memory_db().await;
        db.execute_unprepared(
            "INSERT INTO users (username, email, password_hash) VALUES ('a', 'a@x', 'h'), ('b', 'b@x', 'h')",
        )
        .await
        .unwrap();
        let step = Step::sql(
            "UPDATE users SET email = lower(email) WHERE username <> ?",
            [Value::from("nobody")],
        );
        let txn = db.begin().await.unwrap();
        assert_eq!(step.execute(&txn).await.unwrap(), 2);
        txn.rollback().await.unwrap();
    }
}
