// ==========================================
// 批量记录导入引擎 - 行级对账器
// ==========================================
// 职责: 单行 find-or-create-or-update 编排
//       (查找 → 归一化 → 写入 → 特权覆写 → 翻译)
// 红线: 不吞掉 store 失败,原样上抛由 ImportRunner 按行归因
// ==========================================

use crate::config::RecordHandlerOptions;
use crate::domain::{ReconcileOutcome, TargetEntity, UniqueKeySpec, Values};
use crate::engine::enforcer::FieldOverrideEnforcer;
use crate::engine::error::ImportResult;
use crate::engine::finder::{FindDecision, FinderStrategy};
use crate::engine::mapper::Mapper;
use crate::engine::normalizer::ValueNormalizer;
use crate::engine::translator::TranslationPropagator;
use crate::store::{RecordStore, WriteContext};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

// ==========================================
// RecordHooks Trait
// ==========================================
// 用途: create/write 前后的扩展点,默认全部无操作
#[async_trait]
pub trait RecordHooks: Send + Sync {
    async fn pre_create(&self, _values: &Values, _original: &Values) -> ImportResult<()> {
        Ok(())
    }

    async fn post_create(
        &self,
        _entity: &TargetEntity,
        _values: &Values,
        _original: &Values,
    ) -> ImportResult<()> {
        Ok(())
    }

    async fn pre_write(
        &self,
        _entity: &TargetEntity,
        _values: &Values,
        _original: &Values,
    ) -> ImportResult<()> {
        Ok(())
    }

    async fn post_write(
        &self,
        _entity: &TargetEntity,
        _values: &Values,
        _original: &Values,
    ) -> ImportResult<()> {
        Ok(())
    }
}

impl std::fmt::Debug for dyn RecordHooks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("dyn RecordHooks")
    }
}

/// 默认空钩子
pub struct NoopHooks;

#[async_trait]
impl RecordHooks for NoopHooks {}

// ==========================================
// RecordReconciler - 行级对账器
// ==========================================
/// 行级对账器
///
/// # 流程
/// 1. 映射源行,校验必填源键(任何 store 访问之前)
/// 2. 按唯一键查找既有实体
/// 3. 命中 + 允许覆盖 → 更新路径;命中 + 不允许 → 跳过
/// 4. 未命中或无唯一键 → 创建路径
pub struct RecordReconciler {
    store: Arc<dyn RecordStore>,
    mapper: Arc<dyn Mapper>,
    hooks: Arc<dyn RecordHooks>,
    model: String,
    unique_key: UniqueKeySpec,
    options: RecordHandlerOptions,
    override_existing: bool,
    context: WriteContext,
    finder: FinderStrategy,
    normalizer: ValueNormalizer,
    enforcer: FieldOverrideEnforcer,
    translator: TranslationPropagator,
}

impl RecordReconciler {
    pub fn new(
        store: Arc<dyn RecordStore>,
        mapper: Arc<dyn Mapper>,
        hooks: Arc<dyn RecordHooks>,
        model: impl Into<String>,
        options: RecordHandlerOptions,
        override_existing: bool,
        context: WriteContext,
    ) -> Self {
        let model = model.into();
        let unique_key = options.unique_key_spec();
        Self {
            finder: FinderStrategy::new(store.clone(), model.clone(), unique_key.clone()),
            normalizer: ValueNormalizer::new(
                store.clone(),
                model.clone(),
                options.skip_fields_unchanged,
            ),
            enforcer: FieldOverrideEnforcer::new(store.clone()),
            translator: TranslationPropagator::new(store.clone()),
            store,
            mapper,
            hooks,
            model,
            unique_key,
            options,
            override_existing,
            context,
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// 由映射后的行派生报告引用(唯一键值)
    pub fn row_ref(&self, row: &Values) -> Option<String> {
        self.unique_key.row_ref(row)
    }

    /// 由源行派生报告引用(映射失败时无引用)
    pub fn row_ref_from_original(&self, original: &Values) -> Option<String> {
        let row = self.mapper.map(original).ok()?;
        self.unique_key.row_ref(&row)
    }

    /// 必填源键缺失检查(缺失/null/空串都算缺失)
    fn missing_required_key(&self, original: &Values) -> Option<String> {
        self.mapper.required_source_keys().into_iter().find(|key| {
            match original.get(key.as_str()) {
                None | Some(Value::Null) => true,
                Some(Value::String(s)) => s.is_empty(),
                Some(_) => false,
            }
        })
    }

    /// 单行对账
    ///
    /// 返回的 `Err` 表示行级失败(store/映射错误),
    /// 由调用方归入 errored 桶;跳过条件不是错误。
    pub async fn reconcile(&self, original: &Values) -> ImportResult<ReconcileOutcome> {
        let row = self.mapper.map(original)?;

        // 步骤 1: 必填源键校验,先于任何 store 访问
        if let Some(missing) = self.missing_required_key(original) {
            let mut message = format!("MISSING REQUIRED SOURCE KEY={missing}");
            if let Some(row_ref) = self.row_ref(&row) {
                message.push_str(&format!(": ref={row_ref}"));
            }
            return Ok(ReconcileOutcome::Skipped(message));
        }

        // 步骤 2: 查找既有实体
        match self.finder.find(&row).await? {
            FindDecision::Found(entity) => {
                if !self.override_existing {
                    let row_ref = self.row_ref(&row).unwrap_or_default();
                    return Ok(ReconcileOutcome::Skipped(format!(
                        "ALREADY EXISTS: ref={row_ref}"
                    )));
                }
                self.update_existing(entity, &row, original).await
            }
            FindDecision::NotFound | FindDecision::AlwaysCreate => {
                self.create_missing(&row, original).await
            }
        }
    }

    /// 更新路径
    async fn update_existing(
        &self,
        entity: TargetEntity,
        row: &Values,
        original: &Values,
    ) -> ImportResult<ReconcileOutcome> {
        self.hooks.pre_write(&entity, row, original).await?;

        let values = self.normalizer.purge(Some(&entity), row.clone()).await?;
        self.store.write(&entity, &values, &self.context).await?;

        self.hooks.post_write(&entity, &values, original).await?;

        // 特权覆写严格在标准写之后
        self.enforcer
            .force_if_enabled(&entity, row, "write_uid", self.options.override_write_uid)
            .await?;
        self.enforcer
            .force_if_enabled(&entity, row, "write_date", self.options.override_write_date)
            .await?;

        let translatable = self.mapper.collect_translatable(row, original);
        self.translator.apply(&entity, &translatable).await?;

        debug!(
            model = self.model.as_str(),
            record_id = entity.id,
            "行已更新"
        );
        Ok(ReconcileOutcome::Updated(entity))
    }

    /// 创建路径
    async fn create_missing(
        &self,
        row: &Values,
        original: &Values,
    ) -> ImportResult<ReconcileOutcome> {
        self.hooks.pre_create(row, original).await?;

        let values = self.normalizer.purge(None, row.clone()).await?;
        let id = self.store.create(&self.model, &values, &self.context).await?;
        let entity = TargetEntity::new(id, &self.model);

        self.hooks.post_create(&entity, &values, original).await?;

        self.enforcer
            .force_if_enabled(&entity, row, "create_uid", self.options.override_create_uid)
            .await?;
        self.enforcer
            .force_if_enabled(
                &entity,
                row,
                "create_date",
                self.options.override_create_date,
            )
            .await?;

        // 外部标识唯一键: 创建后登记映射(已存在则无操作)
        if let UniqueKeySpec::ExternalId(key) = &self.unique_key {
            if let Some(identifier) = row.get(key.as_str()) {
                let identifier = crate::domain::scalar_text(identifier);
                self.store.register_external_id(&identifier, &entity).await?;
            }
        }

        let translatable = self.mapper.collect_translatable(row, original);
        self.translator.apply(&entity, &translatable).await?;

        debug!(
            model = self.model.as_str(),
            record_id = entity.id,
            "行已创建"
        );
        Ok(ReconcileOutcome::Created(entity))
    }
}
