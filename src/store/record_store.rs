// ==========================================
// 批量记录导入引擎 - 目标 store Trait
// ==========================================
// 职责: 定义对账引擎所需的数据访问接口(不含业务逻辑)
// 红线: store 不含对账规则,只做 CRUD / 搜索 / 特权列更新
// ==========================================

use crate::domain::{RecordId, TargetEntity, Values};
use crate::store::error::StoreResult;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};

/// 四个特权元数据字段
///
/// 标准 create/write 路径会静默忽略它们,只有 `force_column`
/// 可以在事后写入。永不扩展到任意业务字段。
pub const PRIVILEGED_FIELDS: [&str; 4] = ["create_uid", "create_date", "write_uid", "write_date"];

/// 判断是否为特权字段
pub fn is_privileged_field(field: &str) -> bool {
    PRIVILEGED_FIELDS.contains(&field)
}

/// 写入上下文
///
/// 每次导入发起的 create/write 都带 `import_session = true` 标记,
/// `extra` 透传导入单元配置中的 context 键值。
#[derive(Debug, Clone, Default)]
pub struct WriteContext {
    pub import_session: bool,
    pub extra: Values,
}

impl WriteContext {
    /// 导入会话上下文
    pub fn import_session(extra: Values) -> Self {
        Self {
            import_session: true,
            extra,
        }
    }
}

/// 翻译查询结果行
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslationRow {
    pub record_id: RecordId,
    pub src: Option<String>,
    pub value: String,
    pub state: String,
}

// ==========================================
// RecordStore Trait
// ==========================================
// 用途: 对账引擎的唯一共享可变资源
// 实现者: SqliteRecordStore(使用 rusqlite)
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// 模型的有效字段集合
    ///
    /// # 返回
    /// - Err(UnknownModel): 模型未注册任何字段
    async fn model_fields(&self, model: &str) -> StoreResult<BTreeSet<String>>;

    /// 按字段等值搜索,结果按 created_at 降序(最新优先)
    async fn search_by_field(
        &self,
        model: &str,
        field: &str,
        value: &Value,
        limit: usize,
    ) -> StoreResult<Vec<RecordId>>;

    /// 创建记录
    ///
    /// 特权字段即使出现在 values 中也会被忽略。
    async fn create(&self, model: &str, values: &Values, ctx: &WriteContext)
        -> StoreResult<RecordId>;

    /// 更新业务字段并刷新 write_date
    ///
    /// 空 values 是合法的无操作: 不触碰 write_date,
    /// 但仍计入 `last_write_fields` 观测。
    async fn write(&self, entity: &TargetEntity, values: &Values, ctx: &WriteContext)
        -> StoreResult<()>;

    /// 读取字段当前值(特权字段从记录本体列读取)
    async fn read(&self, entity: &TargetEntity, fields: &[String]) -> StoreResult<Values>;

    /// 特权单列更新,绕过标准写路径
    ///
    /// # 返回
    /// - Err(PrivilegedColumn): 列不在四个特权字段之内
    async fn force_column(
        &self,
        entity: &TargetEntity,
        column: &str,
        value: &Value,
    ) -> StoreResult<()>;

    /// 解析外部标识(`namespace.local`),不存在时返回 None
    async fn resolve_external_id(&self, identifier: &str) -> StoreResult<Option<TargetEntity>>;

    /// 注册外部标识映射(已存在时为无操作)
    async fn register_external_id(
        &self,
        identifier: &str,
        entity: &TargetEntity,
    ) -> StoreResult<()>;

    /// 幂等落库一组翻译(state = 'translated')
    ///
    /// # 参数
    /// - values: 字段 → 译文
    /// - src_values: 字段当前的未翻译值(作为 src 文本)
    async fn upsert_translations(
        &self,
        entity: &TargetEntity,
        lang: &str,
        values: &BTreeMap<String, String>,
        src_values: &Values,
    ) -> StoreResult<()>;

    /// 查询某 (model, field, lang) 的全部翻译(测试/报表用)
    async fn translations(
        &self,
        model: &str,
        field: &str,
        lang: &str,
    ) -> StoreResult<Vec<TranslationRow>>;

    /// 最近一次 write 调用传入的字段名(未写过则为 None)
    ///
    /// 用于验证 skip_fields_unchanged 策略确实产生了零字段写。
    async fn last_write_fields(&self, entity: &TargetEntity) -> StoreResult<Option<Vec<String>>>;
}
