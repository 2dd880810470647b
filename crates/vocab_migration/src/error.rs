use sea_orm::DbErr;
use thiserror::Error;

/// 迁移过程中可能出现的错误
///
/// 除 `DuplicateMigration` 外，所有错误都携带迁移单元名称，
/// 执行类错误还携带出错步骤的序号（从 1 开始）。
#[derive(Error, Debug)]
pub enum MigrationError {
    #[error("duplicate migration: {0}")]
    DuplicateMigration(String),
    #[error("precondition check for {unit} failed: {source}")]
    PreconditionCheck { unit: String, source: DbErr },
    #[error("{unit} step {step} failed: {source}")]
    Execution { unit: String, step: usize, source: DbErr },
    #[error("{unit} transaction failed: {source}")]
    Transaction { unit: String, source: DbErr },
    #[error("{unit} step {step}: backfill on {table}.{column} does not converge ({from} -> {to} still matches)")]
    NonConvergentBackfill {
        unit: String,
        step: usize,
        table: String,
        column: String,
        from: i64,
        to: i64,
    },
}

impl MigrationError {
    /// 出错的迁移单元名称
    pub fn unit(&self) -> &str {
        match self {
            Self::DuplicateMigration(unit)
            | Self::PreconditionCheck { unit, .. }
            | Self::Execution { unit, .. }
            | Self::Transaction { unit, .. }
            | Self::NonConvergentBackfill { unit, .. } => unit,
        }
    }
}

/// 单个步骤的错误，由 runner 补充单元名称与步骤序号后转换为 [`MigrationError`]
#[derive(Error, Debug)]
pub enum StepError {
    #[error(transparent)]
    Database(#[from] DbErr),
    #[error("backfill on {table}.{column} does not converge ({from} -> {to} still matches)")]
    NonConvergent {
        table: String,
        column: String,
        from: i64,
        to: i64,
    },
}

impl StepError {
    pub(crate) fn into_migration_error(self, unit: &str, step: usize) -> MigrationError {
        match self {
            Self::Database(source) => MigrationError::Execution {
                unit: unit.to_string(),
                step,
                source,
            },
            Self::NonConvergent { table, column, from, to } => MigrationError::NonConvergentBackfill {
                unit: unit.to_string(),
                step,
                table,
                column,
                from,
                to,
            },
        }
    }
}
