// ==========================================
// 批量记录导入引擎 - 既有记录查找策略
// ==========================================
// 职责: 按唯一键定位行对应的既有目标实体
// 红线: 必填键校验由对账器先行完成,此处缺键即契约违反
// ==========================================

use crate::domain::{scalar_text, TargetEntity, UniqueKeySpec, Values};
use crate::engine::error::{ImportError, ImportResult};
use crate::store::RecordStore;
use serde_json::Value;
use std::sync::Arc;

/// 查找裁定
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FindDecision {
    /// 未配置唯一键: 有意的"永远创建"
    AlwaysCreate,
    Found(TargetEntity),
    NotFound,
}

/// 既有记录查找策略
///
/// - 唯一键未配置 → `AlwaysCreate`
/// - 唯一键是外部标识 → 标识表解析,查不到不报错
/// - 普通字段 → 等值搜索,按创建时间降序取第一条
pub struct FinderStrategy {
    store: Arc<dyn RecordStore>,
    model: String,
    unique_key: UniqueKeySpec,
}

impl FinderStrategy {
    pub fn new(store: Arc<dyn RecordStore>, model: impl Into<String>, unique_key: UniqueKeySpec) -> Self {
        Self {
            store,
            model: model.into(),
            unique_key,
        }
    }

    fn key_value<'a>(&self, row: &'a Values, key: &str) -> ImportResult<&'a Value> {
        row.get(key).ok_or_else(|| ImportError::MissingUniqueKey {
            key: key.to_string(),
        })
    }

    pub async fn find(&self, row: &Values) -> ImportResult<FindDecision> {
        match &self.unique_key {
            UniqueKeySpec::Unset => Ok(FindDecision::AlwaysCreate),
            UniqueKeySpec::ExternalId(key) => {
                let identifier = scalar_text(self.key_value(row, key)?);
                match self.store.resolve_external_id(&identifier).await? {
                    Some(entity) => Ok(FindDecision::Found(entity)),
                    None => Ok(FindDecision::NotFound),
                }
            }
            UniqueKeySpec::Field(key) => {
                let value = self.key_value(row, key)?;
                let ids = self
                    .store
                    .search_by_field(&self.model, key, value, 1)
                    .await?;
                match ids.first() {
                    Some(id) => Ok(FindDecision::Found(TargetEntity::new(*id, &self.model))),
                    None => Ok(FindDecision::NotFound),
                }
            }
        }
    }

    pub async fn exists(&self, row: &Values) -> ImportResult<bool> {
        Ok(matches!(self.find(row).await?, FindDecision::Found(_)))
    }
}
