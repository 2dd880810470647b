use sea_orm::{DatabaseConnection, DatabaseTransaction, DbErr, TransactionTrait};

use crate::check::AppliedCheck;

/// 迁移使用的数据库访问入口
///
/// 整个运行期间持有同一个连接；检查在事务外执行，每个单元各自开启一个事务。
#[derive(Clone)]
pub struct Gateway {
    db: DatabaseConnection,
}

impl Gateway {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub fn connection(&self) -> &DatabaseConnection {
        &self.db
    }

    pub async fn is_applied(&self, check: &AppliedCheck) -> Result<bool, DbErr> {
        check.evaluate(&self.db).await
    }

    pub async fn begin(&self) -> Result<DatabaseTransaction, DbErr> {
        self.db.begin().await
    }

    pub fn into_connection(self) -> DatabaseConnection {
        self.db
    }
}
