// ==========================================
// 批量记录导入引擎 - 特权字段强制写入
// ==========================================
// 职责: 在标准 create/write 之后,经特权低层路径写入
//       创建/修改的作者与时间戳元数据
// 红线: 仅用于四个特权字段,失败原样上抛(该行致命)
// ==========================================

use crate::domain::{TargetEntity, Values};
use crate::engine::error::ImportResult;
use crate::store::RecordStore;
use std::sync::Arc;

/// 特权字段强制写入器
pub struct FieldOverrideEnforcer {
    store: Arc<dyn RecordStore>,
}

impl FieldOverrideEnforcer {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    /// 开关开启且行内携带非空值时,强制写入该列;否则无操作
    ///
    /// 取值来源是映射后的完整行(而非裁剪后的 values),
    /// 与标准写路径互不影响。
    pub async fn force_if_enabled(
        &self,
        entity: &TargetEntity,
        row: &Values,
        field: &str,
        enabled: bool,
    ) -> ImportResult<()> {
        if !enabled {
            return Ok(());
        }
        let Some(value) = row.get(field).filter(|v| !v.is_null()) else {
            return Ok(());
        };
        self.store.force_column(entity, field, value).await?;
        Ok(())
    }
}
