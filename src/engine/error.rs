// ==========================================
// 批量记录导入引擎 - 引擎层错误类型
// ==========================================
// 工具: thiserror 派生宏
// ==========================================
// 错误分层:
// - Configuration: 导入单元建立期致命,任何行处理之前暴露
// - 其余变体: 行级失败,由 ImportRunner 捕获并归入 errored 桶
// ==========================================

use crate::store::StoreError;
use thiserror::Error;

/// 引擎层错误类型
#[derive(Error, Debug)]
pub enum ImportError {
    // ===== 建立期错误 =====
    #[error("配置错误: {0}")]
    Configuration(String),

    // ===== 行级错误 =====
    #[error("唯一键取值缺失: {key}")]
    MissingUniqueKey { key: String },

    #[error("行映射失败: {0}")]
    Mapping(String),

    #[error(transparent)]
    Store(#[from] StoreError),

    // ===== 调度错误 =====
    #[error("任务调度失败: {0}")]
    TaskQueue(String),

    // ===== 通用错误 =====
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result 类型别名
pub type ImportResult<T> = Result<T, ImportError>;
