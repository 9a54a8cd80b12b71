// ==========================================
// 测试辅助函数
// ==========================================
// 职责: 提供测试所需的 store 初始化、配置与行数据生成
// ==========================================

#![allow(dead_code)]

use record_importer::{ComponentRegistry, ImportTypeConfig, SqliteRecordStore, Values};
use serde_json::{json, Value};
use std::error::Error;
use std::sync::Arc;
use tempfile::NamedTempFile;

/// 创建临时测试 store 并注册 partner 模型
///
/// # 返回
/// - NamedTempFile: 临时数据库文件(需要保持存活)
/// - Arc<SqliteRecordStore>: store 实例
pub fn create_test_store() -> Result<(NamedTempFile, Arc<SqliteRecordStore>), Box<dyn Error>> {
    record_importer::logging::init_test();
    let temp_file = NamedTempFile::new()?;
    let db_path = temp_file.path().to_str().unwrap().to_string();

    let store = SqliteRecordStore::new(&db_path)?;
    store.define_model("partner", &["ref", "name", "city"])?;

    Ok((temp_file, Arc::new(store)))
}

/// 默认注册表(预置 mapper.direct / record.importer)
pub fn create_registry() -> Arc<ComponentRegistry> {
    Arc::new(ComponentRegistry::new())
}

/// 生成 n 行伪造源数据(1-based 编号)
///
/// keys 支持 "id" / "fullname" / "city" / "city:fr_FR" 等
pub fn fake_lines(n: usize, keys: &[&str]) -> Vec<Values> {
    (1..=n)
        .map(|i| {
            let mut row = Values::new();
            for key in keys {
                let value = match *key {
                    "id" => json!(format!("id_{i}")),
                    "fullname" => json!(format!("fullname_{i}")),
                    "city" => json!(format!("city_{i}")),
                    "city:fr_FR" => json!(format!("ville_{i}")),
                    other => json!(format!("{other}_{i}")),
                };
                row.insert((*key).to_string(), value);
            }
            row
        })
        .collect()
}

/// partner 模型的标准 mapper 选项(直接映射 + 必填源键)
pub fn partner_mapper_options() -> Value {
    json!({
        "direct": [["id", "ref"], ["fullname", "name"], ["city", "city"]],
        "required": ["id", "fullname"]
    })
}

/// 组装单模型 partner 导入配置
pub fn partner_config(record_handler: Value) -> ImportTypeConfig {
    partner_config_with_mapper(partner_mapper_options(), record_handler)
}

pub fn partner_config_with_mapper(mapper: Value, record_handler: Value) -> ImportTypeConfig {
    let options = json!([{
        "model": "partner",
        "importer": "record.importer",
        "options": {
            "mapper": mapper,
            "record_handler": record_handler
        }
    }]);
    ImportTypeConfig::from_json("伙伴导入", "partner_import", &options.to_string())
        .expect("测试配置解析失败")
}

/// 默认 record_handler 选项: 按 ref 字段做唯一键
pub fn default_handler() -> Value {
    json!({"unique_key": "ref"})
}
