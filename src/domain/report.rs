// ==========================================
// 批量记录导入引擎 - 对账结果与报告
// ==========================================
// 职责: 定义行级对账结果、模型级/全局报告结构
// 红线: 报告只做归类与合并,不做任何业务判断
// ==========================================

use crate::domain::row::TargetEntity;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// 行级对账结果
///
/// - `Created` / `Updated`: 携带目标实体句柄
/// - `Skipped`: 非错误的跳过(缺必填源键、已存在且不允许覆盖)
/// - `Errored`: 行级失败,原因为底层错误的文本描述
#[derive(Debug, Clone, PartialEq)]
pub enum ReconcileOutcome {
    Created(TargetEntity),
    Updated(TargetEntity),
    Skipped(String),
    Errored(String),
}

impl ReconcileOutcome {
    /// 报告桶名称(created/updated/skipped/errored)
    pub fn kind(&self) -> &'static str {
        match self {
            ReconcileOutcome::Created(_) => "created",
            ReconcileOutcome::Updated(_) => "updated",
            ReconcileOutcome::Skipped(_) => "skipped",
            ReconcileOutcome::Errored(_) => "errored",
        }
    }
}

/// 报告条目: 消息 + 行引用(唯一键值,可能缺失)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportEntry {
    pub message: String,
    pub row_ref: Option<String>,
}

impl ReportEntry {
    pub fn new(message: impl Into<String>, row_ref: Option<String>) -> Self {
        Self {
            message: message.into(),
            row_ref,
        }
    }
}

/// 单模型报告: 四个结果桶,桶内保持行处理顺序
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelReport {
    pub created: Vec<ReportEntry>,
    pub updated: Vec<ReportEntry>,
    pub skipped: Vec<ReportEntry>,
    pub errored: Vec<ReportEntry>,
}

impl ModelReport {
    /// 归类一条对账结果
    ///
    /// 结果种类与桶的映射是穷尽的,新增种类必须在此归类。
    pub fn record(&mut self, outcome: &ReconcileOutcome, row_ref: Option<String>) {
        match outcome {
            ReconcileOutcome::Created(entity) => self
                .created
                .push(ReportEntry::new(format!("CREATED: id={}", entity.id), row_ref)),
            ReconcileOutcome::Updated(entity) => self
                .updated
                .push(ReportEntry::new(format!("UPDATED: id={}", entity.id), row_ref)),
            ReconcileOutcome::Skipped(reason) => {
                self.skipped.push(ReportEntry::new(reason.clone(), row_ref))
            }
            ReconcileOutcome::Errored(reason) => {
                self.errored.push(ReportEntry::new(reason.clone(), row_ref))
            }
        }
    }

    /// 合并另一份模型报告(桶内顺序: self 在前)
    pub fn merge(&mut self, other: ModelReport) {
        self.created.extend(other.created);
        self.updated.extend(other.updated);
        self.skipped.extend(other.skipped);
        self.errored.extend(other.errored);
    }

    pub fn counts(&self) -> ReportCounts {
        ReportCounts {
            created: self.created.len(),
            updated: self.updated.len(),
            skipped: self.skipped.len(),
            errored: self.errored.len(),
        }
    }
}

/// 模型级计数汇总(按桶内条目数派生)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportCounts {
    pub created: usize,
    pub updated: usize,
    pub skipped: usize,
    pub errored: usize,
}

impl ReportCounts {
    pub fn new(created: usize, updated: usize, skipped: usize, errored: usize) -> Self {
        Self {
            created,
            updated,
            skipped,
            errored,
        }
    }
}

/// 导入汇总: 模型名 → 计数
pub type ImportSummary = BTreeMap<String, ReportCounts>;

/// 全局报告: 模型名 → 模型报告
///
/// 生命周期: 每个导入单元开始时为空,跨行/跨模型累积;
/// 独立导入运行之间由调用方通过 `set_report(_, reset=true)` 重置。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Report {
    by_model: BTreeMap<String, ModelReport>,
}

impl Report {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.by_model.is_empty()
    }

    pub fn model(&self, model: &str) -> Option<&ModelReport> {
        self.by_model.get(model)
    }

    pub fn model_mut(&mut self, model: &str) -> &mut ModelReport {
        self.by_model.entry(model.to_string()).or_default()
    }

    /// 并入一份模型报告
    ///
    /// 不同模型占据不同键,合并无冲突;同一模型重复导入时为拼接。
    pub fn merge_model(&mut self, model: &str, report: ModelReport) {
        self.model_mut(model).merge(report);
    }

    /// 并入另一份全局报告
    pub fn merge(&mut self, other: Report) {
        for (model, model_report) in other.by_model {
            self.merge_model(&model, model_report);
        }
    }

    /// 各模型计数汇总
    pub fn summary(&self) -> ImportSummary {
        self.by_model
            .iter()
            .map(|(model, report)| (model.clone(), report.counts()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entity(id: i64) -> TargetEntity {
        TargetEntity::new(id, "partner")
    }

    #[test]
    fn test_outcome_kind() {
        assert_eq!(ReconcileOutcome::Created(entity(1)).kind(), "created");
        assert_eq!(ReconcileOutcome::Updated(entity(1)).kind(), "updated");
        assert_eq!(ReconcileOutcome::Skipped("x".into()).kind(), "skipped");
        assert_eq!(ReconcileOutcome::Errored("x".into()).kind(), "errored");
    }

    #[test]
    fn test_record_preserves_order() {
        let mut report = ModelReport::default();
        report.record(
            &ReconcileOutcome::Skipped("first".into()),
            Some("id_1".into()),
        );
        report.record(
            &ReconcileOutcome::Skipped("second".into()),
            Some("id_2".into()),
        );
        assert_eq!(report.skipped[0].message, "first");
        assert_eq!(report.skipped[1].message, "second");
        assert_eq!(report.counts(), ReportCounts::new(0, 0, 2, 0));
    }

    #[test]
    fn test_report_merge_disjoint_models() {
        let mut a = Report::new();
        a.model_mut("partner")
            .record(&ReconcileOutcome::Created(entity(1)), None);

        let mut b = Report::new();
        b.model_mut("user")
            .record(&ReconcileOutcome::Updated(entity(2)), None);

        a.merge(b);
        assert_eq!(a.model("partner").unwrap().created.len(), 1);
        assert_eq!(a.model("user").unwrap().updated.len(), 1);
    }

    #[test]
    fn test_report_merge_same_model_concatenates() {
        let mut a = Report::new();
        a.model_mut("partner")
            .record(&ReconcileOutcome::Created(entity(1)), Some("id_1".into()));

        let mut b = Report::new();
        b.model_mut("partner")
            .record(&ReconcileOutcome::Created(entity(2)), Some("id_2".into()));

        a.merge(b);
        let partner = a.model("partner").unwrap();
        assert_eq!(partner.created.len(), 2);
        assert_eq!(partner.created[0].row_ref.as_deref(), Some("id_1"));
        assert_eq!(partner.created[1].row_ref.as_deref(), Some("id_2"));
    }
}
