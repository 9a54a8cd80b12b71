// ==========================================
// 批量记录导入引擎 - 多语言文本集合
// ==========================================
// 职责: 承载每行收集到的 locale → 字段 → 译文 映射
// ==========================================

use std::collections::BTreeMap;

/// 多语言文本集合
///
/// 由外部 Mapper 从行数据中收集,TranslationPropagator 在实体
/// 创建/更新之后落库。空集合等价于无翻译操作。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TranslationSet {
    by_lang: BTreeMap<String, BTreeMap<String, String>>,
}

impl TranslationSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// 写入一条 (locale, 字段, 译文)
    pub fn insert(&mut self, lang: impl Into<String>, field: impl Into<String>, text: impl Into<String>) {
        self.by_lang
            .entry(lang.into())
            .or_default()
            .insert(field.into(), text.into());
    }

    pub fn is_empty(&self) -> bool {
        self.by_lang.is_empty()
    }

    /// 按 locale 迭代 (字段 → 译文 保持有序)
    pub fn iter(&self) -> impl Iterator<Item = (&String, &BTreeMap<String, String>)> {
        self.by_lang.iter()
    }

    pub fn get(&self, lang: &str) -> Option<&BTreeMap<String, String>> {
        self.by_lang.get(lang)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_and_iter() {
        let mut set = TranslationSet::new();
        assert!(set.is_empty());
        set.insert("fr_FR", "city", "ville_1");
        set.insert("fr_FR", "name", "nom_1");
        set.insert("de_DE", "city", "stadt_1");

        assert!(!set.is_empty());
        let langs: Vec<&String> = set.iter().map(|(lang, _)| lang).collect();
        assert_eq!(langs, vec!["de_DE", "fr_FR"]);
        assert_eq!(
            set.get("fr_FR").unwrap().get("city"),
            Some(&"ville_1".to_string())
        );
    }

    #[test]
    fn test_insert_overwrites_same_field() {
        let mut set = TranslationSet::new();
        set.insert("fr_FR", "city", "v1");
        set.insert("fr_FR", "city", "v2");
        assert_eq!(set.get("fr_FR").unwrap().get("city"), Some(&"v2".to_string()));
    }
}
