// ==========================================
// 批量记录导入引擎 - 值归一化
// ==========================================
// 职责: 写入前丢弃无效字段与(可选)无变化字段
// 红线: 只裁剪传入的 values 副本,从不修改行数据本身
// ==========================================

use crate::domain::{TargetEntity, Values};
use crate::engine::error::ImportResult;
use crate::store::RecordStore;
use std::sync::Arc;
use tracing::trace;

/// 值归一化器
///
/// 创建路径: 只按模型 schema 过滤;
/// 更新路径 + skip_fields_unchanged: 再丢弃与存量相等的字段,
/// 避免无效写与 write_date 的无谓变更。
pub struct ValueNormalizer {
    store: Arc<dyn RecordStore>,
    model: String,
    skip_fields_unchanged: bool,
}

impl ValueNormalizer {
    pub fn new(
        store: Arc<dyn RecordStore>,
        model: impl Into<String>,
        skip_fields_unchanged: bool,
    ) -> Self {
        Self {
            store,
            model: model.into(),
            skip_fields_unchanged,
        }
    }

    pub async fn purge(
        &self,
        existing: Option<&TargetEntity>,
        mut values: Values,
    ) -> ImportResult<Values> {
        // 步骤 1: 丢弃模型 schema 之外的字段
        let schema = self.store.model_fields(&self.model).await?;
        values.retain(|field, _| schema.contains(field));

        // 步骤 2: 创建路径到此为止
        let Some(entity) = existing else {
            return Ok(values);
        };

        // 步骤 3: 更新路径,丢弃与存量一致的字段
        if self.skip_fields_unchanged && !values.is_empty() {
            let fields: Vec<String> = values.keys().cloned().collect();
            let current = self.store.read(entity, &fields).await?;
            values.retain(|field, value| current.get(field) != Some(value));
            trace!(
                model = self.model.as_str(),
                record_id = entity.id,
                remaining = values.len(),
                "无变化字段已裁剪"
            );
        }
        Ok(values)
    }
}
