use crate::backfill::BackfillRule;
use crate::check::AppliedCheck;
use crate::predicate::Predicate;
use crate::step::Step;

/// 一个具名、幂等的迁移单元
///
/// 由幂等检查和若干前向步骤组成，构造完成后不再修改。
#[derive(Debug, Clone)]
pub struct MigrationUnit {
    name: String,
    check: AppliedCheck,
    steps: Vec<Step>,
}

impl MigrationUnit {
    pub fn new(name: impl Into<String>, check: AppliedCheck) -> Self {
        Self {
            name: name.into(),
            check,
            steps: Vec::new(),
        }
    }

    /// 追加一个前向步骤
    pub fn step(mut self, step: Step) -> Self {
        self.steps.push(step);
        self
    }

    /// 回填单元：没有行匹配规则谓词时视为已应用
    pub fn backfill(name: impl Into<String>, rule: BackfillRule) -> Self {
        let check = AppliedCheck::NoRowsMatch {
            table: rule.table().to_string(),
            column: rule.column().to_string(),
            predicate: Predicate::clone(rule.predicate()),
        };
        Self::new(name, check).step(Step::Backfill(rule))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn check(&self) -> &AppliedCheck {
        &self.check
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }
}
