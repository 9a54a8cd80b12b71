// ==========================================
// 批量记录导入引擎 - 核心库
// ==========================================
// 技术栈: Rust + SQLite
// 系统定位: 外部记录批量导入与行级对账
//           (find-or-create-or-update + 报告归集)
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 值类型与报告
pub mod domain;

// store 层 - 目标记录数据访问
pub mod store;

// 引擎层 - 对账规则与运行器
pub mod engine;

// 配置层 - 导入类型配置
pub mod config;

// 数据库基础设施(连接初始化/PRAGMA/schema 统一)
pub mod db;

// 日志系统
pub mod logging;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::{
    ImportSummary, ModelReport, ReconcileOutcome, Report, ReportCounts, ReportEntry, TargetEntity,
    TranslationSet, UniqueKeySpec, Values,
};

// store
pub use store::{RecordStore, SqliteRecordStore, StoreError, WriteContext};

// 引擎
pub use engine::{
    ComponentRegistry, DirectMapper, FieldOverrideEnforcer, FinderStrategy, ImportError,
    ImportRunner, ImportUnit, Mapper, RecordHooks, RecordReconciler, TaskQueue,
    TokioTaskQueue, TranslationPropagator, ValueNormalizer,
};

// 配置
pub use config::{ImportTypeConfig, RecordHandlerOptions};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "批量记录导入引擎";

// ==========================================
// 预编译检查
// ==========================================
