// ==========================================
// 批量记录导入引擎 - Mapper 接口与直接映射实现
// ==========================================
// 职责: 源行 → 目标行 的字段映射契约(映射本身在引擎之外)
// ==========================================

use crate::config::MapperOptions;
use crate::domain::{TranslationSet, Values};
use crate::engine::error::{ImportError, ImportResult};
use serde::Deserialize;

// ==========================================
// Mapper Trait
// ==========================================
// 用途: 对账器消费的外部映射能力
// 实现者: DirectMapper 及调用方自定义映射器
pub trait Mapper: Send + Sync {
    /// 将源行转换为目标行(纯转换,不访问 store)
    fn map(&self, original: &Values) -> ImportResult<Values>;

    /// 必填源键集合(缺失任何一个即跳过该行)
    fn required_source_keys(&self) -> Vec<String>;

    /// 从行数据中收集多语言文本
    fn collect_translatable(&self, row: &Values, original: &Values) -> TranslationSet;
}

impl std::fmt::Debug for dyn Mapper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("dyn Mapper")
    }
}

// ==========================================
// DirectMapper - 直接字段映射
// ==========================================
/// 直接字段映射器
///
/// 按 (源列, 目标字段) 对逐一拷贝;源列 `字段:locale`
/// (如 `city:fr_FR`)不进入目标行,而是收集为该 locale 的译文。
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DirectMapper {
    #[serde(default)]
    direct: Vec<(String, String)>,
    #[serde(default)]
    required: Vec<String>,
}

impl DirectMapper {
    pub fn new(direct: Vec<(String, String)>, required: Vec<String>) -> Self {
        Self { direct, required }
    }

    /// 由注册表传入的 mapper 选项构造
    pub fn from_options(options: &MapperOptions) -> ImportResult<Self> {
        let raw = serde_json::Value::Object(options.extra.clone());
        serde_json::from_value(raw)
            .map_err(|e| ImportError::Configuration(format!("mapper 选项非法: {e}")))
    }
}

impl Mapper for DirectMapper {
    fn map(&self, original: &Values) -> ImportResult<Values> {
        let mut row = Values::new();
        for (source, dest) in &self.direct {
            if let Some(value) = original.get(source) {
                row.insert(dest.clone(), value.clone());
            }
        }
        Ok(row)
    }

    fn required_source_keys(&self) -> Vec<String> {
        self.required.clone()
    }

    fn collect_translatable(&self, _row: &Values, original: &Values) -> TranslationSet {
        let mut set = TranslationSet::new();
        for (source, dest) in &self.direct {
            let prefix = format!("{source}:");
            for (key, value) in original {
                if let Some(lang) = key.strip_prefix(&prefix) {
                    if lang.is_empty() {
                        continue;
                    }
                    if let Some(text) = value.as_str() {
                        set.insert(lang, dest.clone(), text);
                    }
                }
            }
        }
        set
    }
}
