// ==========================================
// 批量记录导入引擎 - 唯一键定义
// ==========================================
// 职责: 描述一行数据如何匹配到既有目标实体
// ==========================================

use crate::domain::row::{scalar_text, Values};

/// 唯一键定义
///
/// 每个对账器实例只激活一种变体:
/// - `Unset`: 无唯一键,永远走创建路径,从不查找
/// - `Field`: 按目标字段做等值查找
/// - `ExternalId`: 行内该字段的值是全局外部标识
///   (`namespace.local` 形式),通过标识表解析而非字段搜索
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UniqueKeySpec {
    Unset,
    Field(String),
    ExternalId(String),
}

impl UniqueKeySpec {
    /// 由 record_handler 配置构造
    pub fn from_options(unique_key: &str, is_external_id: bool) -> Self {
        if unique_key.is_empty() {
            UniqueKeySpec::Unset
        } else if is_external_id {
            UniqueKeySpec::ExternalId(unique_key.to_string())
        } else {
            UniqueKeySpec::Field(unique_key.to_string())
        }
    }

    /// 唯一键字段名(`Unset` 时为 None)
    pub fn key_name(&self) -> Option<&str> {
        match self {
            UniqueKeySpec::Unset => None,
            UniqueKeySpec::Field(name) | UniqueKeySpec::ExternalId(name) => Some(name),
        }
    }

    /// 从映射后的行中取唯一键值的文本表示(用于报告 ref)
    pub fn row_ref(&self, row: &Values) -> Option<String> {
        let key = self.key_name()?;
        row.get(key).map(scalar_text)
    }
}
