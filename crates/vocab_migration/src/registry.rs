use crate::error::MigrationError;
use crate::gateway::Gateway;
use crate::unit::MigrationUnit;

/// 按注册顺序保存的迁移单元序列
#[derive(Debug, Default, Clone)]
pub struct Registry {
    units: Vec<MigrationUnit>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, unit: MigrationUnit) -> Result<(), MigrationError> {
        if self.units.iter().any(|u| u.name() == unit.name()) {
            return Err(MigrationError::DuplicateMigration(unit.name().to_string()));
        }
        self.units.push(unit);
        Ok(())
    }

    pub fn units(&self) -> &[MigrationUnit] {
        &self.units
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// 按注册顺序返回尚未应用的单元，任何检查失败都会立即返回错误
    pub async fn list_pending(&self, gateway: &Gateway) -> Result<Vec<&MigrationUnit>, MigrationError> {
        let mut pending = Vec::new();
        for unit in &self.units {
            let applied = gateway
                .is_applied(unit.check())
                .await
                .map_err(|source| MigrationError::PreconditionCheck {
                    unit: unit.name().to_string(),
                    source,
                })?;
            if !applied {
                pending.push(unit);
            }
        }
        Ok(pending)
    }
}
