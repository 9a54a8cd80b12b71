// ==========================================
// 批量记录导入引擎 - 行数据与目标实体
// ==========================================
// 职责: 定义导入行、目标实体等基础值类型
// 红线: 不含数据访问逻辑,不含引擎逻辑
// ==========================================

use serde_json::Value;

/// 字段名 → 标量值 的有序映射
///
/// 映射前的源行(OriginalRow)与映射后的行(Row)都使用该类型,
/// 由外部 Mapper 负责两者之间的转换。
pub type Values = serde_json::Map<String, Value>;

/// 目标记录标识(store 内 rowid)
pub type RecordId = i64;

/// 目标实体句柄
///
/// 指向目标 store 中一条已持久化记录,仅携带稳定标识与所属模型,
/// 字段 schema 由 store 维护。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetEntity {
    pub id: RecordId,
    pub model: String,
}

impl TargetEntity {
    pub fn new(id: RecordId, model: impl Into<String>) -> Self {
        Self {
            id,
            model: model.into(),
        }
    }
}

/// 将标量 Value 渲染为报告/标识用文本
///
/// 字符串直接取内容,其余类型使用 JSON 文本表示。
pub fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_scalar_text() {
        assert_eq!(scalar_text(&json!("id_1")), "id_1");
        assert_eq!(scalar_text(&json!(42)), "42");
        assert_eq!(scalar_text(&json!(true)), "true");
    }
}
