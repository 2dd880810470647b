pub use super::user::Entity as User;
pub use super::user_settings::Entity as UserSettings;
