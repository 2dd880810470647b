//! 测试用的内存数据库与数据构造工具

use std::str::FromStr;

use sea_orm::sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sea_orm::{ConnectionTrait, DatabaseConnection, SqlxSqliteConnector, Statement};

use crate::gateway::Gateway;

/// 迁移之前的基础表结构
const BASE_SCHEMA: [&str; 2] = [
    "CREATE TABLE users (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        username TEXT NOT NULL UNIQUE,
        email TEXT NOT NULL UNIQUE,
        password_hash TEXT NOT NULL,
        created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
    )",
    "CREATE TABLE user_settings (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        user_id INTEGER NOT NULL UNIQUE REFERENCES users(id),
        daily_goal INTEGER NOT NULL DEFAULT 20,
        language TEXT NOT NULL DEFAULT 'en',
        updated_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
    )",
];

/// 单连接的内存数据库，连接关闭即丢失数据，因此禁用空闲回收
pub(crate) async fn memory_db() -> DatabaseConnection {
    let options = SqliteConnectOptions::from_str("sqlite::memory:").unwrap();
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await
        .unwrap();
    let db = SqlxSqliteConnector::from_sqlx_sqlite_pool(pool);
    for sql in BASE_SCHEMA {
        db.execute_unprepared(sql).await.unwrap();
    }
    db
}

pub(crate) async fn memory_gateway() -> Gateway {
    Gateway::new(memory_db().await)
}

pub(crate) async fn memory_db_with_threshold() -> DatabaseConnection {
    let db = memory_db().await;
    db.execute_unprepared("ALTER TABLE user_settings ADD COLUMN mastery_threshold INTEGER NOT NULL DEFAULT 10")
        .await
        .unwrap();
    db
}

async fn insert_user(db: &DatabaseConnection) -> i64 {
    let backend = db.get_database_backend();
    let next: i64 = db
        .query_one(Statement::from_string(backend, "SELECT COUNT(*) FROM users"))
        .await
        .unwrap()
        .unwrap()
        .try_get_by_index(0)
        .unwrap();
    let name = format!("learner{}", next + 1);
    db.execute(Statement::from_sql_and_values(
        backend,
        "INSERT INTO users (username, email, password_hash) VALUES (?, ?, 'x')",
        [name.clone().into(), format!("{}@example.com", name).into()],
    ))
    .await
    .unwrap()
    .last_insert_id() as i64
}

/// 插入 `count` 个用户及其默认设置
pub(crate) async fn seed_learners(db: &DatabaseConnection, count: usize) {
    for _ in 0..count {
        let user_id = insert_user(db).await;
        db.execute(Statement::from_sql_and_values(
            db.get_database_backend(),
            "INSERT INTO user_settings (user_id) VALUES (?)",
            [user_id.into()],
        ))
        .await
        .unwrap();
    }
}

/// 插入设置行并指定 mastery_threshold，要求该列已存在
pub(crate) async fn seed_settings(db: &DatabaseConnection, values: &[i64]) {
    for value in values {
        let user_id = insert_user(db).await;
        db.execute(Statement::from_sql_and_values(
            db.get_database_backend(),
            "INSERT INTO user_settings (user_id, mastery_threshold) VALUES (?, ?)",
            [user_id.into(), (*value).into()],
        ))
        .await
        .unwrap();
    }
}

pub(crate) async fn thresholds(db: &DatabaseConnection) -> Vec<i64> {
    db.query_all(Statement::from_string(
        db.get_database_backend(),
        "SELECT mastery_threshold FROM user_settings ORDER BY id",
    ))
    .await
    .unwrap()
    .into_iter()
    .map(|row| row.try_get_by_index(0).unwrap())
    .collect()
}
