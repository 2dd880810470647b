use std::fmt;
use std::sync::Arc;

use sea_orm::sea_query::{Alias, Condition, ConditionalStatement, Expr, Iden, Query};
use sea_orm::ConnectionTrait;
use tracing::{debug, info};

use crate::error::StepError;
use crate::predicate::Predicate;

type Rewrite = Arc<dyn Fn(i64) -> i64 + Send + Sync>;

/// 数据回填规则：把匹配 `predicate` 的行的 `column` 改写为 `rewrite` 的结果
///
/// 改写结果不能再匹配 `predicate`，否则规则无法收敛，执行时会直接报错。
#[derive(Clone)]
pub struct BackfillRule {
    table: String,
    key_column: String,
    column: String,
    predicate: Predicate,
    rewrite: Rewrite,
}

impl BackfillRule {
    pub fn new<F>(table: impl Iden, column: impl Iden, predicate: Predicate, rewrite: F) -> Self
    where
        F: Fn(i64) -> i64 + Send + Sync + 'static,
    {
        Self {
            table: table.to_string(),
            key_column: "id".to_string(),
            column: column.to_string(),
            predicate,
            rewrite: Arc::new(rewrite),
        }
    }

    /// 把匹配的行统一设置为 `value`
    pub fn set_to(table: impl Iden, column: impl Iden, predicate: Predicate, value: i64) -> Self {
        Self::new(table, column, predicate, move |_| value)
    }

    /// 指定主键列，默认为 `id`
    pub fn key_column(mut self, key_column: impl Iden) -> Self {
        self.key_column = key_column.to_string();
        self
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn column(&self) -> &str {
        &self.column
    }

    pub fn predicate(&self) -> &Predicate {
        &self.predicate
    }

    pub fn rewrite(&self, value: i64) -> i64 {
        (self.rewrite)(value)
    }

    fn condition(&self) -> Condition {
        self.predicate.to_condition(&self.column)
    }
}

impl fmt::Debug for BackfillRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BackfillRule")
            .field("table", &self.table)
            .field("key_column", &self.key_column)
            .field("column", &self.column)
            .field("predicate", &self.predicate)
            .finish_non_exhaustive()
    }
}

/// 执行回填，返回实际改写的行数
///
/// 先读出全部匹配行并校验每个改写结果，确认收敛后才开始写入，
/// 因此规则不收敛时不会写入任何一行。
pub async fn backfill<C: ConnectionTrait>(db: &C, rule: &BackfillRule) -> Result<u64, StepError> {
    let backend = db.get_database_backend();
    let select = Query::select()
        .column(Alias::new(rule.key_column.as_str()))
        .column(Alias::new(rule.column.as_str()))
        .from(Alias::new(rule.table.as_str()))
        .cond_where(rule.condition())
        .to_owned();
    let rows = db.query_all(backend.build(&select)).await?;
    debug!(
        "{} 中共有 {} 行匹配 {}",
        rule.table,
        rows.len(),
        rule.predicate.describe(&rule.column)
    );

    let mut updates = Vec::with_capacity(rows.len());
    for row in rows {
        let key: i64 = row.try_get("", &rule.key_column)?;
        let current: i64 = row.try_get("", &rule.column)?;
        let next = rule.rewrite(current);
        if rule.predicate.matches(next) {
            return Err(StepError::NonConvergent {
                table: rule.table.clone(),
                column: rule.column.clone(),
                from: current,
                to: next,
            });
        }
        updates.push((key, next));
    }

    let mut changed = 0;
    for (key, next) in updates {
        // 写入时再次带上谓词，只改写仍处于旧值的行
        let update = Query::update()
            .table(Alias::new(rule.table.as_str()))
            .value(Alias::new(rule.column.as_str()), next)
            .cond_where(
                Condition::all()
                    .add(Expr::col(Alias::new(rule.key_column.as_str())).eq(key))
                    .add(rule.condition()),
            )
            .to_owned();
        changed += db.execute(backend.build(&update)).await?.rows_affected();
    }

    info!("回填 {}.{} 完成，改写 {} 行", rule.table, rule.column, changed);
    Ok(changed)
}
