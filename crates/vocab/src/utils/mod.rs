use std::fmt;

use anyhow::{Context, Result};
use chrono::{Local, Utc};
use tracing::{Event, Subscriber};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::Layer;

/// 当前 UTC 时间，与 SQLite 的 CURRENT_TIMESTAMP 一致
pub fn now_standard_string() -> String {
    Utc::now().format("%Y-%m-%d %H:%M:%S").to_string()
}

// 自定义控制台输出层，输出到 stderr，stdout 只留给迁移结果
struct ConsoleLayer;

impl<S> Layer<S> for ConsoleLayer
where
    S: Subscriber + for<'lookup> tracing_subscriber::registry::LookupSpan<'lookup>,
{
    fn on_event(&self, event: &Event<'_>, _ctx: tracing_subscriber::layer::Context<'_, S>) {
        let mut visitor = MessageVisitor::new();
        event.record(&mut visitor);

        if let Some(message) = visitor.message {
            let timestamp = Local::now().format("%b %d %H:%M:%S");
            let (color_code, level_str) = level_style(event.metadata().level());
            eprintln!("\x1b[2m{}\x1b[0m {}{:>5}\x1b[0m {}", timestamp, color_code, level_str, message);
        }
    }
}

fn level_style(level: &tracing::Level) -> (&'static str, &'static str) {
    match *level {
        tracing::Level::ERROR => ("\x1b[31m", "ERROR"),
        tracing::Level::WARN => ("\x1b[33m", " WARN"),
        tracing::Level::INFO => ("\x1b[32m", " INFO"),
        tracing::Level::DEBUG => ("\x1b[36m", "DEBUG"),
        tracing::Level::TRACE => ("\x1b[35m", "TRACE"),
    }
}

// 用于提取日志消息的访问者
struct MessageVisitor {
    message: Option<String>,
}

impl MessageVisitor {
    fn new() -> Self {
        Self { message: None }
    }
}

impl tracing::field::Visit for MessageVisitor {
    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            self.message = Some(format!("{:?}", value));
        }
    }

    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        if field.name() == "message" {
            self.message = Some(value.to_string());
        }
    }
}

pub fn init_logger(log_level: &str) -> Result<()> {
    let console_layer = ConsoleLayer.with_filter(build_console_filter(log_level));
    tracing_subscriber::registry()
        .with(console_layer)
        .try_init()
        .context("初始化日志失败")
}

/// 构建控制台日志过滤器，降低 sqlx 慢查询等噪音
fn build_console_filter(base_level: &str) -> tracing_subscriber::EnvFilter {
    tracing_subscriber::EnvFilter::builder().parse_lossy(format!(
        "{},\
            sqlx::query=error,\
            sqlx=error,\
            sea_orm::database=error,\
            sea_orm_migration=warn",
        base_level
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_now_standard_string_format() {
        let now = now_standard_string();
        assert_eq!(now.len(), 19);
        let parsed = chrono::NaiveDateTime::parse_from_str(&now, "%Y-%m-%d %H:%M:%S").unwrap();
        // 与数据库默认值同为 UTC
        let drift = Utc::now().naive_utc() - parsed;
        assert!(drift.num_seconds().abs() <= 5);
    }

    #[test]
    fn test_console_filter_keeps_base_level() {
        let filter = build_console_filter("debug");
        let rendered = filter.to_string();
        assert!(rendered.contains("debug"));
        assert!(rendered.contains("sqlx=error"));
    }
}
