use sea_orm::sea_query::{Alias, Asterisk, ConditionalStatement, Expr, Func, Iden, Query};
use sea_orm::{ConnectionTrait, DbErr, Statement};

use crate::predicate::Predicate;

/// 迁移单元的幂等检查：只读，返回 `true` 表示该单元的效果已经存在
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppliedCheck {
    TableExists(String),
    /// 所有列都存在才视为已应用；表不存在时检查本身失败
    ColumnsExist { table: String, columns: Vec<String> },
    /// 没有任何行匹配谓词时视为已应用
    ///
    /// 表不存在时检查失败；列不存在时视为未应用，该列应由同一次运行中更早的单元添加。
    NoRowsMatch {
        table: String,
        column: String,
        predicate: Predicate,
    },
}

impl AppliedCheck {
    pub fn table_exists(table: impl Iden) -> Self {
        Self::TableExists(table.to_string())
    }

    pub fn columns_exist<I, C>(table: impl Iden, columns: I) -> Self
    where
        I: IntoIterator<Item = C>,
        C: Iden,
    {
        Self::ColumnsExist {
            table: table.to_string(),
            columns: columns.into_iter().map(|c| c.to_string()).collect(),
        }
    }

    pub async fn evaluate<C: ConnectionTrait>(&self, db: &C) -> Result<bool, DbErr> {
        match self {
            Self::TableExists(table) => table_exists(db, table).await,
            Self::ColumnsExist { table, columns } => {
                ensure_table(db, table).await?;
                for column in columns {
                    if !has_column(db, table, column).await? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            Self::NoRowsMatch {
                table,
                column,
                predicate,
            } => {
                ensure_table(db, table).await?;
                if !has_column(db, table, column).await? {
                    return Ok(false);
                }
                Ok(count_matching(db, table, column, predicate).await? == 0)
            }
        }
    }
}

async fn ensure_table<C: ConnectionTrait>(db: &C, table: &str) -> Result<(), DbErr> {
    if table_exists(db, table).await? {
        Ok(())
    } else {
        Err(DbErr::Custom(format!("table {} does not exist", table)))
    }
}

pub(crate) async fn table_exists<C: ConnectionTrait>(db: &C, table: &str) -> Result<bool, DbErr> {
    let stmt = Statement::from_sql_and_values(
        db.get_database_backend(),
        "SELECT 1 FROM sqlite_master WHERE type='table' AND name=? LIMIT 1",
        [table.into()],
    );
    Ok(db.query_one(stmt).await?.is_some())
}

pub(crate) async fn has_column<C: ConnectionTrait>(db: &C, table: &str, column: &str) -> Result<bool, DbErr> {
    let stmt = Statement::from_sql_and_values(
        db.get_database_backend(),
        "SELECT COUNT(*) FROM pragma_table_info(?) WHERE name = ?",
        [table.into(), column.into()],
    );
    let count: i64 = match db.query_one(stmt).await? {
        Some(row) => row.try_get_by_index(0)?,
        None => 0,
    };
    Ok(count >= 1)
}

pub(crate) async fn count_matching<C: ConnectionTrait>(
    db: &C,
    table: &str,
    column: &str,
    predicate: &Predicate,
) -> Result<i64, DbErr> {
    let query = Query::select()
        .expr(Func::count(Expr::col(Asterisk)))
        .from(Alias::new(table))
        .cond_where(predicate.to_condition(column))
        .to_owned();
    let backend = db.get_database_backend();
    let count: i64 = match db.query_one(backend.build(&query)).await? {
        Some(row) => row.try_get_by_index(0)?,
        None => 0,
    };
    Ok(count)
}
