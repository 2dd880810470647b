pub mod prelude;

pub mod user;
pub mod user_settings;
