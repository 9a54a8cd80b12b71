// ==========================================
// 批量记录导入引擎 - SQLite 连接初始化
// ==========================================
// 目标:
// - 统一所有 Connection::open 的 PRAGMA 行为
// - 统一 busy_timeout,减少并发写入时的偶发 busy 错误
// - 提供目标 store 的 schema 安装入口
// ==========================================

use rusqlite::Connection;
use rusqlite::OptionalExtension;
use std::time::Duration;

/// 默认 busy_timeout(毫秒)
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// 当前代码所期望的 schema_version
pub const CURRENT_SCHEMA_VERSION: i64 = 1;

/// 配置 SQLite 连接的统一 PRAGMA
///
/// 说明:
/// - foreign_keys 需要"每个连接"单独开启
/// - busy_timeout 需要"每个连接"单独配置
pub fn configure_sqlite_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS))?;
    Ok(())
}

/// 打开 SQLite 连接并应用统一配置
pub fn open_sqlite_connection(db_path: &str) -> rusqlite::Result<Connection> {
    let conn = Connection::open(db_path)?;
    configure_sqlite_connection(&conn)?;
    Ok(conn)
}

/// 安装目标 store schema(幂等)
///
/// 表结构:
/// - model_field: 模型字段 schema(ValueNormalizer 的过滤依据)
/// - target_record: 记录本体 + 四个特权元数据列
/// - record_value: 业务字段值(JSON 文本)
/// - external_identifier: 外部标识 → 记录 映射
/// - record_translation: 按 (model, field, lang, record_id) 去重的翻译
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS model_field (
            model TEXT NOT NULL,
            field TEXT NOT NULL,
            PRIMARY KEY (model, field)
        );

        CREATE TABLE IF NOT EXISTS target_record (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            model TEXT NOT NULL,
            created_at TEXT NOT NULL,
            create_uid TEXT,
            create_date TEXT,
            write_uid TEXT,
            write_date TEXT
        );
        CREATE INDEX IF NOT EXISTS idx_target_record_model
            ON target_record (model, created_at DESC);

        CREATE TABLE IF NOT EXISTS record_value (
            record_id INTEGER NOT NULL REFERENCES target_record (id) ON DELETE CASCADE,
            field TEXT NOT NULL,
            value TEXT NOT NULL,
            PRIMARY KEY (record_id, field)
        );
        CREATE INDEX IF NOT EXISTS idx_record_value_field
            ON record_value (field, value);

        CREATE TABLE IF NOT EXISTS external_identifier (
            identifier TEXT PRIMARY KEY,
            model TEXT NOT NULL,
            record_id INTEGER NOT NULL REFERENCES target_record (id)
        );

        CREATE TABLE IF NOT EXISTS record_translation (
            model TEXT NOT NULL,
            field TEXT NOT NULL,
            lang TEXT NOT NULL,
            record_id INTEGER NOT NULL REFERENCES target_record (id) ON DELETE CASCADE,
            src TEXT,
            value TEXT NOT NULL,
            state TEXT NOT NULL DEFAULT 'translated',
            PRIMARY KEY (model, field, lang, record_id)
        );
        "#,
    )?;

    conn.execute(
        "INSERT OR IGNORE INTO schema_version (version) VALUES (?1)",
        [CURRENT_SCHEMA_VERSION],
    )?;
    Ok(())
}

/// 读取 schema_version(若表不存在则返回 None)
pub fn read_schema_version(conn: &Connection) -> rusqlite::Result<Option<i64>> {
    let has_table: bool = conn
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version' LIMIT 1",
            [],
            |_row| Ok(true),
        )
        .optional()?
        .unwrap_or(false);

    if !has_table {
        return Ok(None);
    }

    let v: Option<i64> =
        conn.query_row("SELECT MAX(version) FROM schema_version", [], |row| row.get(0))?;
    Ok(v)
}
