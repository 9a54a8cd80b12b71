// ==========================================
// 批量记录导入引擎 - store 层
// ==========================================
// 职责: 目标记录 store 的抽象接口与 SQLite 实现
// 红线: store 不含对账规则,只做数据 CRUD
// ==========================================

pub mod error;
pub mod record_store;
pub mod sqlite_store;

// 重导出核心类型
pub use error::{StoreError, StoreResult};
pub use record_store::{
    is_privileged_field, RecordStore, TranslationRow, WriteContext, PRIVILEGED_FIELDS,
};
pub use sqlite_store::SqliteRecordStore;
