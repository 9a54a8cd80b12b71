// ==========================================
// 批量记录导入引擎 - 配置层
// ==========================================
// 职责: 导入类型的声明式配置解析与建立期校验
// ==========================================

pub mod import_type;

// 重导出核心配置类型
pub use import_type::{
    ImportLine, ImportLineOptions, ImportTypeConfig, ImporterInfo, MapperOptions,
    RecordHandlerOptions,
};
