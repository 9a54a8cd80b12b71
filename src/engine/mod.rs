// ==========================================
// 批量记录导入引擎 - 引擎层
// ==========================================
// 职责: 行级对账编排与导入单元运行
// 红线: 所有数据访问经过 RecordStore,不直接触碰连接
// ==========================================

pub mod enforcer;
pub mod error;
pub mod finder;
pub mod mapper;
pub mod normalizer;
pub mod reconciler;
pub mod registry;
pub mod runner;
pub mod translator;

// 重导出核心类型
pub use enforcer::FieldOverrideEnforcer;
pub use error::{ImportError, ImportResult};
pub use finder::{FindDecision, FinderStrategy};
pub use mapper::{DirectMapper, Mapper};
pub use normalizer::ValueNormalizer;
pub use reconciler::{NoopHooks, RecordHooks, RecordReconciler};
pub use registry::{ComponentRegistry, DEFAULT_IMPORTER, DEFAULT_MAPPER};
pub use runner::{ImportJob, ImportRunner, ImportUnit, TaskHandle, TaskQueue, TokioTaskQueue};
pub use translator::TranslationPropagator;
