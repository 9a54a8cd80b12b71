// ==========================================
// 批量记录导入引擎 - 领域模型层
// ==========================================
// 职责: 定义行数据、唯一键、翻译集合、对账结果等值类型
// 红线: 不含数据访问逻辑,不含引擎逻辑
// ==========================================

pub mod report;
pub mod row;
pub mod translation;
pub mod unique_key;

// 重导出核心类型
pub use report::{
    ImportSummary, ModelReport, ReconcileOutcome, Report, ReportCounts, ReportEntry,
};
pub use row::{scalar_text, RecordId, TargetEntity, Values};
pub use translation::TranslationSet;
pub use unique_key::UniqueKeySpec;
