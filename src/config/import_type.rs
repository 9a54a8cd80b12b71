// ==========================================
// 批量记录导入引擎 - 导入类型配置
// ==========================================
// 职责: 解析声明式导入配置(每模型一行: importer/mapper/
//       record_handler/tracking_handler 及其选项)
// 红线: 配置在导入单元建立时一次性校验,不在行处理中惰性读取
// ==========================================

use crate::domain::{UniqueKeySpec, Values};
use crate::engine::error::ImportError;
use serde::Deserialize;
use serde_json::Value;

/// record_handler 选项
///
/// 四个 override_* 开关只在行内出现对应值时生效;
/// skip_fields_unchanged 控制更新路径上的无变化字段丢弃。
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RecordHandlerOptions {
    #[serde(default)]
    pub unique_key: String,
    #[serde(default)]
    pub unique_key_is_external_id: bool,
    #[serde(default)]
    pub override_create_uid: bool,
    #[serde(default)]
    pub override_create_date: bool,
    #[serde(default)]
    pub override_write_uid: bool,
    #[serde(default)]
    pub override_write_date: bool,
    #[serde(default)]
    pub skip_fields_unchanged: bool,
}

impl RecordHandlerOptions {
    pub fn unique_key_spec(&self) -> UniqueKeySpec {
        UniqueKeySpec::from_options(&self.unique_key, self.unique_key_is_external_id)
    }
}

/// mapper 选项: name 用于注册表解析,其余键透传给工厂
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MapperOptions {
    #[serde(default)]
    pub name: String,
    #[serde(flatten)]
    pub extra: Values,
}

/// 单行配置的 options 块(缺失的子表取默认值)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ImportLineOptions {
    #[serde(default)]
    pub importer: Values,
    #[serde(default)]
    pub mapper: MapperOptions,
    #[serde(default)]
    pub record_handler: RecordHandlerOptions,
    #[serde(default)]
    pub tracking_handler: Values,
}

/// 一行导入配置: 目标模型 + importer 选择器 + 上下文 + 选项
#[derive(Debug, Clone, Deserialize)]
pub struct ImportLine {
    pub model: String,
    pub importer: String,
    #[serde(default)]
    pub context: Values,
    #[serde(default)]
    pub options: ImportLineOptions,
}

/// 带位置信息的配置行(最后一行在链式导入中有特殊意义)
#[derive(Debug, Clone)]
pub struct ImporterInfo<'a> {
    pub line: &'a ImportLine,
    pub is_last_importer: bool,
}

/// 导入类型: 人读名称 + 唯一助记键 + 配置行集合
#[derive(Debug, Clone)]
pub struct ImportTypeConfig {
    pub name: String,
    pub key: String,
    lines: Vec<ImportLine>,
}

impl ImportTypeConfig {
    /// 从 JSON 文本解析并校验
    ///
    /// # 错误
    /// - Configuration: JSON 非法、行集合为空、model/importer 缺失
    pub fn from_json(
        name: impl Into<String>,
        key: impl Into<String>,
        options_json: &str,
    ) -> Result<Self, ImportError> {
        let name = name.into();
        let raw: Value = serde_json::from_str(options_json)
            .map_err(|e| ImportError::Configuration(format!("配置解析失败 ({name}): {e}")))?;
        let lines: Vec<ImportLine> = serde_json::from_value(raw)
            .map_err(|e| ImportError::Configuration(format!("配置结构非法 ({name}): {e}")))?;

        let config = Self {
            name,
            key: key.into(),
            lines,
        };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ImportError> {
        if self.lines.is_empty() {
            return Err(ImportError::Configuration(format!(
                "未找到任何导入配置行: {}",
                self.name
            )));
        }
        for (idx, line) in self.lines.iter().enumerate() {
            if line.model.is_empty() {
                return Err(ImportError::Configuration(format!(
                    "配置行 {idx} 缺少 model: {}",
                    self.name
                )));
            }
            if line.importer.is_empty() {
                return Err(ImportError::Configuration(format!(
                    "配置行 {idx} 缺少 importer: {}",
                    self.name
                )));
            }
        }
        Ok(())
    }

    pub fn lines(&self) -> &[ImportLine] {
        &self.lines
    }

    /// 按声明顺序枚举配置行,并标记末行
    pub fn available_importers(&self) -> impl Iterator<Item = ImporterInfo<'_>> {
        let last = self.lines.len().saturating_sub(1);
        self.lines.iter().enumerate().map(move |(idx, line)| ImporterInfo {
            line,
            is_last_importer: idx == last,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FULL: &str = r#"
    [
      {
        "model": "partner",
        "importer": "record.importer",
        "context": {"source": "crm"},
        "options": {
          "mapper": {"name": "partner.mapper", "direct": [["id", "ref"]]},
          "record_handler": {
            "unique_key": "ref",
            "override_create_uid": true,
            "skip_fields_unchanged": true
          }
        }
      },
      {
        "model": "user",
        "importer": "record.importer"
      }
    ]
    "#;

    #[test]
    fn test_parse_full_config() {
        let config = ImportTypeConfig::from_json("伙伴导入", "partner_import", FULL).unwrap();
        assert_eq!(config.lines().len(), 2);

        let first = &config.lines()[0];
        assert_eq!(first.model, "partner");
        assert_eq!(first.options.mapper.name, "partner.mapper");
        assert!(first.options.record_handler.override_create_uid);
        assert!(first.options.record_handler.skip_fields_unchanged);
        assert!(!first.options.record_handler.override_write_uid);
        assert_eq!(
            first.options.record_handler.unique_key_spec(),
            UniqueKeySpec::Field("ref".to_string())
        );
        assert_eq!(first.context["source"], "crm");
    }

    #[test]
    fn test_missing_option_tables_default_empty() {
        let config = ImportTypeConfig::from_json("x", "x", FULL).unwrap();
        let second = &config.lines()[1];
        assert!(second.options.importer.is_empty());
        assert_eq!(second.options.record_handler.unique_key, "");
        assert_eq!(
            second.options.record_handler.unique_key_spec(),
            UniqueKeySpec::Unset
        );
    }

    #[test]
    fn test_last_importer_flag() {
        let config = ImportTypeConfig::from_json("x", "x", FULL).unwrap();
        let flags: Vec<bool> = config
            .available_importers()
            .map(|info| info.is_last_importer)
            .collect();
        assert_eq!(flags, vec![false, true]);
    }

    #[test]
    fn test_empty_config_rejected() {
        let err = ImportTypeConfig::from_json("x", "x", "[]").unwrap_err();
        assert!(matches!(err, ImportError::Configuration(_)));
    }

    #[test]
    fn test_missing_model_rejected() {
        let err =
            ImportTypeConfig::from_json("x", "x", r#"[{"importer": "a", "model": ""}]"#)
                .unwrap_err();
        assert!(matches!(err, ImportError::Configuration(_)));
    }
}
