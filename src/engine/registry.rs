// ==========================================
// 批量记录导入引擎 - 组件注册表
// ==========================================
// 职责: 稳定字符串键 → 工厂函数,在导入单元建立时
//       一次性解析 mapper 与 importer 钩子,行处理中不再查表
// ==========================================

use crate::config::{ImportLine, MapperOptions};
use crate::engine::error::{ImportError, ImportResult};
use crate::engine::mapper::{DirectMapper, Mapper};
use crate::engine::reconciler::{NoopHooks, RecordHooks};
use std::collections::HashMap;
use std::sync::Arc;

/// 默认 mapper 键(未指定 name 时使用)
pub const DEFAULT_MAPPER: &str = "mapper.direct";

/// 默认 importer 钩子键
pub const DEFAULT_IMPORTER: &str = "record.importer";

pub type MapperFactory =
    Arc<dyn Fn(&MapperOptions) -> ImportResult<Arc<dyn Mapper>> + Send + Sync>;
pub type HooksFactory =
    Arc<dyn Fn(&ImportLine) -> ImportResult<Arc<dyn RecordHooks>> + Send + Sync>;

/// 组件注册表
pub struct ComponentRegistry {
    mappers: HashMap<String, MapperFactory>,
    importers: HashMap<String, HooksFactory>,
}

impl ComponentRegistry {
    /// 创建注册表并预置默认组件
    pub fn new() -> Self {
        let mut registry = Self {
            mappers: HashMap::new(),
            importers: HashMap::new(),
        };
        registry.register_mapper(DEFAULT_MAPPER, |options| {
            Ok(Arc::new(DirectMapper::from_options(options)?) as Arc<dyn Mapper>)
        });
        registry.register_importer(DEFAULT_IMPORTER, |_line| {
            Ok(Arc::new(NoopHooks) as Arc<dyn RecordHooks>)
        });
        registry
    }

    pub fn register_mapper<F>(&mut self, key: impl Into<String>, factory: F)
    where
        F: Fn(&MapperOptions) -> ImportResult<Arc<dyn Mapper>> + Send + Sync + 'static,
    {
        self.mappers.insert(key.into(), Arc::new(factory));
    }

    pub fn register_importer<F>(&mut self, key: impl Into<String>, factory: F)
    where
        F: Fn(&ImportLine) -> ImportResult<Arc<dyn RecordHooks>> + Send + Sync + 'static,
    {
        self.importers.insert(key.into(), Arc::new(factory));
    }

    /// 解析 mapper(name 为空时回落默认直接映射)
    pub fn resolve_mapper(&self, options: &MapperOptions) -> ImportResult<Arc<dyn Mapper>> {
        let key = if options.name.is_empty() {
            DEFAULT_MAPPER
        } else {
            options.name.as_str()
        };
        let factory = self.mappers.get(key).ok_or_else(|| {
            ImportError::Configuration(format!("未注册的 mapper: {key}"))
        })?;
        factory(options)
    }

    /// 解析 importer 钩子
    pub fn resolve_importer(&self, line: &ImportLine) -> ImportResult<Arc<dyn RecordHooks>> {
        let factory = self.importers.get(&line.importer).ok_or_else(|| {
            ImportError::Configuration(format!("未注册的 importer: {}", line.importer))
        })?;
        factory(line)
    }
}

impl Default for ComponentRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_default_mapper_resolution() {
        let registry = ComponentRegistry::new();
        let options = MapperOptions::default();
        assert!(registry.resolve_mapper(&options).is_ok());
    }

    #[test]
    fn test_unknown_mapper_is_configuration_error() {
        let registry = ComponentRegistry::new();
        let options: MapperOptions =
            serde_json::from_value(json!({"name": "nope.mapper"})).unwrap();
        let err = registry.resolve_mapper(&options).unwrap_err();
        assert!(matches!(err, ImportError::Configuration(_)));
    }

    #[test]
    fn test_unknown_importer_is_configuration_error() {
        let registry = ComponentRegistry::new();
        let line: ImportLine = serde_json::from_value(json!({
            "model": "partner",
            "importer": "nope.importer"
        }))
        .unwrap();
        let err = registry.resolve_importer(&line).unwrap_err();
        assert!(matches!(err, ImportError::Configuration(_)));
    }
}
