// ==========================================
// 批量记录导入引擎 - 多语言文本落库
// ==========================================
// 职责: 将收集到的 locale 覆写应用到已创建/已更新的实体
// 红线: 只在实体存在之后运行(create/write 之后),幂等
// ==========================================

use crate::domain::{TargetEntity, TranslationSet};
use crate::engine::error::ImportResult;
use crate::store::RecordStore;
use std::sync::Arc;
use tracing::debug;

/// 翻译传播器
pub struct TranslationPropagator {
    store: Arc<dyn RecordStore>,
}

impl TranslationPropagator {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    /// 逐 locale 落库翻译
    ///
    /// 每条翻译以 (model, field, locale, record_id) 为键 upsert,
    /// src 取字段当前未翻译值,state 固定为 translated。
    /// 重复应用同一组合是就地更新而非追加。
    pub async fn apply(
        &self,
        entity: &TargetEntity,
        translations: &TranslationSet,
    ) -> ImportResult<()> {
        if translations.is_empty() {
            return Ok(());
        }

        for (lang, fields) in translations.iter() {
            let names: Vec<String> = fields.keys().cloned().collect();
            let src_values = self.store.read(entity, &names).await?;
            self.store
                .upsert_translations(entity, lang, fields, &src_values)
                .await?;
            debug!(
                model = entity.model.as_str(),
                record_id = entity.id,
                lang = lang.as_str(),
                fields = fields.len(),
                "翻译已落库"
            );
        }
        Ok(())
    }
}
