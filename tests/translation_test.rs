// ==========================================
// 批量记录导入引擎 - 翻译传播集成测试
// ==========================================
// 场景: 按 locale 收集的字段译文在创建/更新后落库,
//       重复导入就地更新而非追加
// ==========================================

mod test_helpers;

use record_importer::{ImportRunner, ImportUnit, RecordStore, ReportCounts};
use serde_json::json;
use std::sync::Arc;

#[tokio::test]
async fn test_translations_created_once_per_entity() {
    let (_tmp, store) = test_helpers::create_test_store().unwrap();
    let runner = Arc::new(ImportRunner::new(
        store.clone() as Arc<dyn RecordStore>,
        test_helpers::create_registry(),
    ));

    let lines = test_helpers::fake_lines(10, &["id", "fullname", "city", "city:fr_FR"]);
    let config = test_helpers::partner_config(test_helpers::default_handler());
    let unit = ImportUnit::new(config, lines);

    let summary = runner.run(&unit).await.unwrap();
    assert_eq!(summary["partner"], ReportCounts::new(10, 0, 0, 0));

    let rows = store
        .translations("partner", "city", "fr_FR")
        .await
        .unwrap();
    assert_eq!(rows.len(), 10);
    assert_eq!(rows[0].value, "ville_1");
    assert_eq!(rows[0].src.as_deref(), Some("city_1"));
    assert_eq!(rows[0].state, "translated");
}

#[tokio::test]
async fn test_reimport_updates_translation_in_place() {
    let (_tmp, store) = test_helpers::create_test_store().unwrap();
    let runner = Arc::new(ImportRunner::new(
        store.clone() as Arc<dyn RecordStore>,
        test_helpers::create_registry(),
    ));

    let mut lines = test_helpers::fake_lines(1, &["id", "fullname", "city", "city:fr_FR"]);
    let config = test_helpers::partner_config(test_helpers::default_handler());

    let unit = ImportUnit::new(config.clone(), lines.clone());
    runner.run(&unit).await.unwrap();

    // 修改译文后重新导入: 更新路径,翻译就地覆盖
    lines[0].insert("city:fr_FR".into(), json!("ville_rev"));
    let unit = ImportUnit::new(config, lines);
    let summary = runner.run(&unit).await.unwrap();
    assert_eq!(summary["partner"], ReportCounts::new(0, 1, 0, 0));

    let rows = store
        .translations("partner", "city", "fr_FR")
        .await
        .unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].value, "ville_rev");
}

#[tokio::test]
async fn test_rows_without_locale_columns_write_no_translations() {
    let (_tmp, store) = test_helpers::create_test_store().unwrap();
    let runner = Arc::new(ImportRunner::new(
        store.clone() as Arc<dyn RecordStore>,
        test_helpers::create_registry(),
    ));

    let lines = test_helpers::fake_lines(3, &["id", "fullname", "city"]);
    let config = test_helpers::partner_config(test_helpers::default_handler());
    let unit = ImportUnit::new(config, lines);
    runner.run(&unit).await.unwrap();

    let rows = store
        .translations("partner", "city", "fr_FR")
        .await
        .unwrap();
    assert!(rows.is_empty());
}
