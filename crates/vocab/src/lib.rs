pub mod config;
pub mod database;
pub mod migrate;
pub mod repository;
pub mod utils;
