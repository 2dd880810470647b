use anyhow::{Context, Result};
use async_trait::async_trait;
use sea_orm::ActiveValue::{NotSet, Set};
use sea_orm::{ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder};
use serde::{Deserialize, Serialize};
use vocab_entity::entities::prelude::{User, UserSettings};
use vocab_entity::entities::{user, user_settings};

use crate::utils::now_standard_string;

/// 按主键读取、写入和按条件查询记录的存储接口
#[async_trait]
pub trait Repository: Send + Sync {
    type Key: Send + Sync;
    type Record: Send + Sync;

    async fn get(&self, key: Self::Key) -> Result<Option<Self::Record>>;

    /// 存在则更新，否则插入，返回写入后的记录
    async fn upsert(&self, record: Self::Record) -> Result<Self::Record>;

    async fn query(&self, predicate: Condition) -> Result<Vec<Self::Record>>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: Option<i32>,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub avatar_url: Option<String>,
    pub avatar_type: String,
}

impl UserRecord {
    pub fn new(username: impl Into<String>, email: impl Into<String>, password_hash: impl Into<String>) -> Self {
        Self {
            id: None,
            username: username.into(),
            email: email.into(),
            password_hash: password_hash.into(),
            avatar_url: None,
            avatar_type: "default".to_string(),
        }
    }
}

impl From<user::Model> for UserRecord {
    fn from(model: user::Model) -> Self {
        Self {
            id: Some(model.id),
            username: model.username,
            email: model.email,
            password_hash: model.password_hash,
            avatar_url: model.avatar_url,
            avatar_type: model.avatar_type,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSettingsRecord {
    pub user_id: i32,
    pub daily_goal: i32,
    pub language: String,
    pub mastery_threshold: i32,
}

impl UserSettingsRecord {
    pub fn for_user(user_id: i32) -> Self {
        Self {
            user_id,
            daily_goal: 20,
            language: "en".to_string(),
            mastery_threshold: vocab_migration::MASTERY_THRESHOLD as i32,
        }
    }
}

impl From<user_settings::Model> for UserSettingsRecord {
    fn from(model: user_settings::Model) -> Self {
        Self {
            user_id: model.user_id,
            daily_goal: model.daily_goal,
            language: model.language,
            mastery_threshold: model.mastery_threshold,
        }
    }
}

pub struct UserRepository {
    db: DatabaseConnection,
}

impl UserRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl Repository for UserRepository {
    type Key = i32;
    type Record = UserRecord;

    async fn get(&self, key: i32) -> Result<Option<UserRecord>> {
        let model = User::find_by_id(key).one(&self.db).await?;
        Ok(model.map(Into::into))
    }

    async fn upsert(&self, record: UserRecord) -> Result<UserRecord> {
        let existing = match record.id {
            Some(id) => User::find_by_id(id).one(&self.db).await?,
            None => None,
        };
        let model = match existing {
            Some(model) => {
                let mut active: user::ActiveModel = model.into();
                active.username = Set(record.username);
                active.email = Set(record.email);
                active.password_hash = Set(record.password_hash);
                active.avatar_url = Set(record.avatar_url);
                active.avatar_type = Set(record.avatar_type);
                active.update(&self.db).await.context("更新用户失败")?
            }
            None => user::ActiveModel {
                id: record.id.map_or(NotSet, Set),
                username: Set(record.username),
                email: Set(record.email),
                password_hash: Set(record.password_hash),
                avatar_url: Set(record.avatar_url),
                avatar_type: Set(record.avatar_type),
                created_at: Set(now_standard_string()),
            }
            .insert(&self.db)
            .await
            .context("创建用户失败")?,
        };
        Ok(model.into())
    }

    async fn query(&self, predicate: Condition) -> Result<Vec<UserRecord>> {
        let models = User::find()
            .filter(predicate)
            .order_by_asc(user::Column::Id)
            .all(&self.db)
            .await?;
        Ok(models.into_iter().map(Into::into).collect())
    }
}

/// 学习设置以 user_id 为键
pub struct SettingsRepository {
    db: DatabaseConnection,
}

impl SettingsRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    async fn find(&self, user_id: i32) -> Result<Option<user_settings::Model>> {
        let model = UserSettings::find()
            .filter(user_settings::Column::UserId.eq(user_id))
            .one(&self.db)
            .await?;
        Ok(model)
    }
}

#[async_trait]
impl Repository for SettingsRepository {
    type Key = i32;
    type Record = UserSettingsRecord;

    async fn get(&self, user_id: i32) -> Result<Option<UserSettingsRecord>> {
        Ok(self.find(user_id).await?.map(Into::into))
    }

    async fn upsert(&self, record: UserSettingsRecord) -> Result<UserSettingsRecord> {
        let model = match self.find(record.user_id).await? {
            Some(model) => {
                let mut active: user_settings::ActiveModel = model.into();
                active.daily_goal = Set(record.daily_goal);
                active.language = Set(record.language);
                active.mastery_threshold = Set(record.mastery_threshold);
                active.updated_at = Set(now_standard_string());
                active.update(&self.db).await.context("更新学习设置失败")?
            }
            None => user_settings::ActiveModel {
                id: NotSet,
                user_id: Set(record.user_id),
                daily_goal: Set(record.daily_goal),
                language: Set(record.language),
                mastery_threshold: Set(record.mastery_threshold),
                updated_at: Set(now_standard_string()),
            }
            .insert(&self.db)
            .await
            .context("创建学习设置失败")?,
        };
        Ok(model.into())
    }

    async fn query(&self, predicate: Condition) -> Result<Vec<UserSettingsRecord>> {
        let models = UserSettings::find()
            .filter(predicate)
            .order_by_asc(user_settings::Column::UserId)
            .all(&self.db)
            .await?;
        Ok(models.into_iter().map(Into::into).collect())
    }
}

#[cfg(test)]
mod tests {
    use vocab_migration::{Runner, RunnerOptions};

    use super::*;
    use crate::config::Config;
    use crate::database::{connect, ensure_base_tables};

    async fn migrated_db() -> DatabaseConnection {
        let gateway = connect(&Config::in_memory()).await.unwrap();
        ensure_base_tables(gateway.connection()).await.unwrap();
        let registry = vocab_migration::migrations().unwrap();
        let report = Runner::new(RunnerOptions::default())
            .run(&gateway, registry.units())
            .await;
        assert!(!report.has_failures(), "{:?}", report.lines());
        gateway.into_connection()
    }

    #[tokio::test]
    async fn test_user_upsert_and_get() {
        let repo = UserRepository::new(migrated_db().await);
        let created = repo.upsert(UserRecord::new("alice", "alice@example.com", "hash")).await.unwrap();
        let id = created.id.unwrap();
        assert_eq!(created.avatar_type, "default");

        let mut changed = created.clone();
        changed.avatar_url = Some("https://cdn.example.com/a.png".to_string());
        changed.avatar_type = "url".to_string();
        let updated = repo.upsert(changed).await.unwrap();
        assert_eq!(updated.id, Some(id));

        let fetched = repo.get(id).await.unwrap().unwrap();
        assert_eq!(fetched, updated);
        assert!(repo.get(id + 100).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_settings_query_by_predicate() {
        let db = migrated_db().await;
        let users = UserRepository::new(db.clone());
        let settings = SettingsRepository::new(db);

        for (name, threshold) in [("amy", 3), ("ben", 5), ("cat", 8)] {
            let user = users
                .upsert(UserRecord::new(name, format!("{}@example.com", name), "hash"))
                .await
                .unwrap();
            let mut record = UserSettingsRecord::for_user(user.id.unwrap());
            record.mastery_threshold = threshold;
            settings.upsert(record).await.unwrap();
        }

        let strict = settings
            .query(Condition::all().add(user_settings::Column::MasteryThreshold.gte(5)))
            .await
            .unwrap();
        let thresholds: Vec<i32> = strict.iter().map(|s| s.mastery_threshold).collect();
        assert_eq!(thresholds, vec![5, 8]);

        // 以 user_id 为键更新，而不是新增一行
        let amy_id = users
            .query(Condition::all().add(user::Column::Username.eq("amy")))
            .await
            .unwrap()[0]
            .id
            .unwrap();
        let mut amy = settings.get(amy_id).await.unwrap().unwrap();
        amy.language = "de".to_string();
        settings.upsert(amy.clone()).await.unwrap();
        assert_eq!(settings.query(Condition::all()).await.unwrap().len(), 3);
        assert_eq!(settings.get(amy.user_id).await.unwrap().unwrap().language, "de");
    }

    #[test]
    fn test_password_hash_is_not_serialized() {
        let json = serde_json::to_value(UserRecord::new("dan", "dan@example.com", "secret")).unwrap();
        assert!(json.get("password_hash").is_none());
        assert_eq!(json["avatar_type"], "default");
    }
}
