use std::fmt;

use serde::Serialize;

use crate::error::MigrationError;

#[derive(Debug)]
pub enum MigrationStatus {
    Applied { rows: u64 },
    Skipped,
    /// 仅在 dry run 中出现：尚未应用，也没有执行
    Pending,
    Failed(MigrationError),
}

/// 单个迁移单元的执行结果
#[derive(Debug)]
pub struct MigrationRecord {
    pub name: String,
    pub status: MigrationStatus,
}

impl MigrationRecord {
    pub fn applied(name: &str, rows: u64) -> Self {
        Self::with_status(name, MigrationStatus::Applied { rows })
    }

    pub fn skipped(name: &str) -> Self {
        Self::with_status(name, MigrationStatus::Skipped)
    }

    pub fn pending(name: &str) -> Self {
        Self::with_status(name, MigrationStatus::Pending)
    }

    pub fn failed(name: &str, error: MigrationError) -> Self {
        Self::with_status(name, MigrationStatus::Failed(error))
    }

    fn with_status(name: &str, status: MigrationStatus) -> Self {
        Self {
            name: name.to_string(),
            status,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self.status, MigrationStatus::Failed(_))
    }

    pub fn summary(&self) -> RecordSummary<'_> {
        let (status, rows, error) = match &self.status {
            MigrationStatus::Applied { rows } => ("applied", Some(*rows), None),
            MigrationStatus::Skipped => ("skipped", None, None),
            MigrationStatus::Pending => ("pending", None, None),
            MigrationStatus::Failed(e) => ("failed", None, Some(e.to_string())),
        };
        RecordSummary {
            name: &self.name,
            status,
            rows,
            error,
        }
    }
}

impl fmt::Display for MigrationRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.status {
            MigrationStatus::Applied { rows } => write!(f, "{}: applied ({} rows)", self.name, rows),
            MigrationStatus::Skipped => write!(f, "{}: skipped (already applied)", self.name),
            MigrationStatus::Pending => write!(f, "{}: pending", self.name),
            MigrationStatus::Failed(e) => write!(f, "{}: FAILED — {}", self.name, e),
        }
    }
}

/// 用于 JSON 输出的扁平结构
#[derive(Debug, Serialize)]
pub struct RecordSummary<'a> {
    pub name: &'a str,
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rows: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// 一次运行的全部记录，顺序与执行顺序一致
#[derive(Debug, Default)]
pub struct RunReport {
    records: Vec<MigrationRecord>,
}

impl RunReport {
    pub(crate) fn push(&mut self, record: MigrationRecord) {
        self.records.push(record);
    }

    pub fn records(&self) -> &[MigrationRecord] {
        &self.records
    }

    pub fn has_failures(&self) -> bool {
        self.records.iter().any(MigrationRecord::is_failed)
    }

    pub fn summaries(&self) -> Vec<RecordSummary<'_>> {
        self.records.iter().map(MigrationRecord::summary).collect()
    }

    pub fn lines(&self) -> Vec<String> {
        self.records.iter().map(ToString::to_string).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_lines() {
        assert_eq!(
            MigrationRecord::applied("update_mastery_threshold", 3).to_string(),
            "update_mastery_threshold: applied (3 rows)"
        );
        assert_eq!(
            MigrationRecord::skipped("add_avatar_fields").to_string(),
            "add_avatar_fields: skipped (already applied)"
        );
        let failed = MigrationRecord::failed(
            "add_avatar_fields",
            MigrationError::DuplicateMigration("add_avatar_fields".to_string()),
        );
        assert_eq!(
            failed.to_string(),
            "add_avatar_fields: FAILED — duplicate migration: add_avatar_fields"
        );
    }

    #[test]
    fn test_summary_json() {
        let mut report = RunReport::default();
        report.push(MigrationRecord::applied("a", 2));
        report.push(MigrationRecord::skipped("b"));
        assert!(!report.has_failures());

        let json = serde_json::to_value(report.summaries()).unwrap();
        assert_eq!(
            json,
            serde_json::json!([
                {"name": "a", "status": "applied", "rows": 2},
                {"name": "b", "status": "skipped"},
            ])
        );
    }
}
