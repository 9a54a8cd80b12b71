// ==========================================
// 批量记录导入引擎 - 导入运行器与任务调度
// ==========================================
// 职责: 遍历导入单元的 (模型, importer) 配置行,
//       逐行调用对账器,按模型归集报告;
//       可选将每行配置作为独立任务提交外部队列
// 红线: 行级失败只影响该行,绝不中断整个单元;
//       建立期配置错误在处理任何行之前暴露
// ==========================================

use crate::config::{ImportLine, ImportTypeConfig};
use crate::domain::{ImportSummary, ModelReport, ReconcileOutcome, Report, Values};
use crate::engine::error::{ImportError, ImportResult};
use crate::engine::reconciler::RecordReconciler;
use crate::engine::registry::ComponentRegistry;
use crate::store::{RecordStore, WriteContext};
use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

// ==========================================
// ImportUnit - 导入单元
// ==========================================
/// 导入单元: 行集合 + 导入类型配置 + 单元级策略
#[derive(Clone)]
pub struct ImportUnit {
    pub id: Uuid,
    pub config: ImportTypeConfig,
    pub rows: Vec<Values>,
    /// 命中既有记录时允许更新(关闭则跳过)
    pub override_existing: bool,
    /// 调试模式: 不经任务队列,内联执行
    pub debug: bool,
}

impl ImportUnit {
    pub fn new(config: ImportTypeConfig, rows: Vec<Values>) -> Self {
        Self {
            id: Uuid::new_v4(),
            config,
            rows,
            override_existing: true,
            debug: false,
        }
    }

    /// 调试模式判定: 显式开关或 IMPORTER_DEBUG_MODE 环境变量
    pub fn debug_mode(&self) -> bool {
        self.debug || std::env::var_os("IMPORTER_DEBUG_MODE").is_some()
    }
}

// ==========================================
// TaskQueue - 外部任务队列抽象
// ==========================================

/// 一个待执行的 (模型, importer) 配置行任务
pub struct ImportJob {
    store: Arc<dyn RecordStore>,
    registry: Arc<ComponentRegistry>,
    unit: Arc<ImportUnit>,
    line_index: usize,
}

impl ImportJob {
    /// 执行任务,产出 (模型名, 模型报告)
    ///
    /// 与内联模式走完全相同的行处理路径,
    /// 两种模式对同一输入产出相同的报告内容。
    pub async fn execute(self) -> ImportResult<(String, ModelReport)> {
        let line = self
            .unit
            .config
            .lines()
            .get(self.line_index)
            .ok_or_else(|| {
                ImportError::Configuration(format!("配置行越界: {}", self.line_index))
            })?;
        let reconciler = build_reconciler(
            &self.store,
            &self.registry,
            line,
            self.unit.override_existing,
        )?;
        let report = ImportRunner::process_rows(&reconciler, &self.unit.rows).await;
        Ok((line.model.clone(), report))
    }
}

/// 为一条配置行构建对账器(建立期,配置错误在此暴露)
fn build_reconciler(
    store: &Arc<dyn RecordStore>,
    registry: &ComponentRegistry,
    line: &ImportLine,
    override_existing: bool,
) -> ImportResult<RecordReconciler> {
    let mapper = registry.resolve_mapper(&line.options.mapper)?;
    let hooks = registry.resolve_importer(line)?;
    Ok(RecordReconciler::new(
        store.clone(),
        mapper,
        hooks,
        line.model.clone(),
        line.options.record_handler.clone(),
        override_existing,
        WriteContext::import_session(line.context.clone()),
    ))
}

/// 任务句柄: 任务标识 + 可等待的结果
pub struct TaskHandle {
    task_id: Uuid,
    handle: JoinHandle<ImportResult<(String, ModelReport)>>,
}

impl TaskHandle {
    pub fn new(task_id: Uuid, handle: JoinHandle<ImportResult<(String, ModelReport)>>) -> Self {
        Self { task_id, handle }
    }

    pub fn task_id(&self) -> Uuid {
        self.task_id
    }

    /// 等待任务完成
    pub async fn wait(self) -> ImportResult<(String, ModelReport)> {
        self.handle
            .await
            .map_err(|e| ImportError::TaskQueue(e.to_string()))?
    }
}

// 用途: 异步调度的外部能力(队列内部机制不在引擎范围内)
#[async_trait]
pub trait TaskQueue: Send + Sync {
    async fn submit(&self, job: ImportJob) -> ImportResult<TaskHandle>;
}

/// 基于 tokio 的进程内任务队列
pub struct TokioTaskQueue;

#[async_trait]
impl TaskQueue for TokioTaskQueue {
    async fn submit(&self, job: ImportJob) -> ImportResult<TaskHandle> {
        let task_id = Uuid::new_v4();
        let handle = tokio::spawn(job.execute());
        Ok(TaskHandle::new(task_id, handle))
    }
}

// ==========================================
// ImportRunner - 导入运行器
// ==========================================
pub struct ImportRunner {
    store: Arc<dyn RecordStore>,
    registry: Arc<ComponentRegistry>,
    report: Mutex<Report>,
}

impl ImportRunner {
    pub fn new(store: Arc<dyn RecordStore>, registry: Arc<ComponentRegistry>) -> Self {
        Self {
            store,
            registry,
            report: Mutex::new(Report::new()),
        }
    }

    /// 当前累积报告(快照)
    ///
    /// 报告锁中毒时沿用内部数据: 报告只做追加合并,
    /// 持锁方恐慌不会留下半更新状态。
    pub fn get_report(&self) -> Report {
        self.report
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// 设置报告: reset=true 替换,否则并入
    pub fn set_report(&self, new_report: Report, reset: bool) {
        let mut guard = self
            .report
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if reset {
            *guard = new_report;
        } else {
            guard.merge(new_report);
        }
    }

    /// 为一条配置行构建对账器
    fn build_reconciler(
        &self,
        line: &ImportLine,
        override_existing: bool,
    ) -> ImportResult<RecordReconciler> {
        build_reconciler(&self.store, &self.registry, line, override_existing)
    }

    /// 按交付顺序逐行对账,行级失败归入 errored 桶
    pub(crate) async fn process_rows(
        reconciler: &RecordReconciler,
        rows: &[Values],
    ) -> ModelReport {
        let mut report = ModelReport::default();
        for original in rows {
            let row_ref = reconciler.row_ref_from_original(original);
            match reconciler.reconcile(original).await {
                Ok(outcome) => report.record(&outcome, row_ref),
                Err(err) => {
                    warn!(
                        model = reconciler.model(),
                        error = %err,
                        "行对账失败"
                    );
                    report.record(&ReconcileOutcome::Errored(err.to_string()), row_ref);
                }
            }
        }
        report
    }

    /// 内联(调试)模式: 在当前任务中顺序执行全部配置行
    ///
    /// 所有对账器在处理任何行之前构建完毕,
    /// 配置错误因此不会产出部分报告。
    pub async fn run(&self, unit: &ImportUnit) -> ImportResult<ImportSummary> {
        let mut reconcilers = Vec::new();
        for info in unit.config.available_importers() {
            reconcilers.push((
                info.line.model.clone(),
                info.is_last_importer,
                self.build_reconciler(info.line, unit.override_existing)?,
            ));
        }

        let mut run_report = Report::new();
        for (model, is_last, reconciler) in &reconcilers {
            let model_report = Self::process_rows(reconciler, &unit.rows).await;
            debug!(
                model = model.as_str(),
                is_last_importer = *is_last,
                "配置行处理完成"
            );
            run_report.merge_model(model, model_report);
        }

        info!(
            unit_id = %unit.id,
            import_type = unit.config.key.as_str(),
            rows = unit.rows.len(),
            "导入单元完成"
        );
        self.set_report(run_report.clone(), false);
        Ok(run_report.summary())
    }

    /// 异步模式: 每条配置行作为独立任务提交队列,返回任务句柄
    ///
    /// 调用方负责回收结果;建立期校验在提交任何任务之前完成。
    pub async fn dispatch(
        &self,
        unit: &Arc<ImportUnit>,
        queue: &dyn TaskQueue,
    ) -> ImportResult<Vec<TaskHandle>> {
        // 建立期校验: 所有行的组件必须可解析
        for line in unit.config.lines() {
            self.build_reconciler(line, unit.override_existing)?;
        }

        let mut handles = Vec::with_capacity(unit.config.lines().len());
        for line_index in 0..unit.config.lines().len() {
            let job = ImportJob {
                store: self.store.clone(),
                registry: self.registry.clone(),
                unit: unit.clone(),
                line_index,
            };
            handles.push(queue.submit(job).await?);
        }
        Ok(handles)
    }

    /// 统一入口: 按调试开关选择内联或队列调度
    ///
    /// 队列模式下等待全部任务并合并报告,
    /// 两种模式对同一输入产出相同的报告内容与汇总。
    pub async fn run_import(
        &self,
        unit: Arc<ImportUnit>,
        queue: &dyn TaskQueue,
    ) -> ImportResult<ImportSummary> {
        if unit.debug_mode() {
            warn!("### 调试模式已激活: 不使用任务队列 ###");
            return self.run(&unit).await;
        }

        let handles = self.dispatch(&unit, queue).await?;
        let results =
            futures::future::try_join_all(handles.into_iter().map(TaskHandle::wait)).await?;
        let mut run_report = Report::new();
        for (model, model_report) in results {
            run_report.merge_model(&model, model_report);
        }
        self.set_report(run_report.clone(), false);
        Ok(run_report.summary())
    }
}
