// ==========================================
// 批量记录导入引擎 - SQLite store 实现
// ==========================================
// 职责: RecordStore 的 rusqlite 落地实现
// 存储: target_record + record_value (EAV) + external_identifier
//       + record_translation
// 红线: 所有连接经过 db::open_sqlite_connection 统一 PRAGMA
// ==========================================

use crate::db::{init_schema, open_sqlite_connection};
use crate::domain::{scalar_text, RecordId, TargetEntity, Values};
use crate::store::error::{StoreError, StoreResult};
use crate::store::record_store::{
    is_privileged_field, RecordStore, TranslationRow, WriteContext,
};
use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::debug;

// ==========================================
// SqliteRecordStore
// ==========================================
pub struct SqliteRecordStore {
    conn: Arc<Mutex<Connection>>,
    // 每条记录最近一次 write 传入的字段名(观测零字段写)
    write_log: Mutex<HashMap<RecordId, Vec<String>>>,
}

impl SqliteRecordStore {
    /// 创建新的 store 实例并安装 schema
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> StoreResult<Self> {
        let conn = open_sqlite_connection(db_path)
            .map_err(|e| StoreError::DatabaseConnectionError(e.to_string()))?;
        init_schema(&conn)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            write_log: Mutex::new(HashMap::new()),
        })
    }

    /// 内存数据库实例(测试用)
    pub fn new_in_memory() -> StoreResult<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| StoreError::DatabaseConnectionError(e.to_string()))?;
        crate::db::configure_sqlite_connection(&conn)?;
        init_schema(&conn)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            write_log: Mutex::new(HashMap::new()),
        })
    }

    /// 注册模型的有效字段(幂等)
    pub fn define_model(&self, model: &str, fields: &[&str]) -> StoreResult<()> {
        let conn = self.lock_conn()?;
        let mut stmt =
            conn.prepare("INSERT OR IGNORE INTO model_field (model, field) VALUES (?1, ?2)")?;
        for field in fields {
            stmt.execute(params![model, field])?;
        }
        Ok(())
    }

    fn lock_conn(&self) -> StoreResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| StoreError::LockError(e.to_string()))
    }

    fn now_text() -> String {
        Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
    }

    /// record_value 中的统一值表示(JSON 文本)
    fn value_text(value: &Value) -> StoreResult<String> {
        serde_json::to_string(value)
            .map_err(|e| StoreError::DatabaseQueryError(format!("值序列化失败: {e}")))
    }

    fn parse_value(text: &str) -> Value {
        serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_string()))
    }

    fn ensure_exists(conn: &Connection, entity: &TargetEntity) -> StoreResult<()> {
        let found: Option<i64> = conn
            .query_row(
                "SELECT id FROM target_record WHERE id = ?1 AND model = ?2",
                params![entity.id, entity.model],
                |row| row.get(0),
            )
            .optional()?;
        if found.is_none() {
            return Err(StoreError::NotFound {
                entity: entity.model.clone(),
                id: entity.id.to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl RecordStore for SqliteRecordStore {
    async fn model_fields(&self, model: &str) -> StoreResult<BTreeSet<String>> {
        let conn = self.lock_conn()?;
        let mut stmt = conn.prepare("SELECT field FROM model_field WHERE model = ?1")?;
        let fields: BTreeSet<String> = stmt
            .query_map(params![model], |row| row.get::<_, String>(0))?
            .collect::<Result<_, _>>()?;

        if fields.is_empty() {
            return Err(StoreError::UnknownModel(model.to_string()));
        }
        Ok(fields)
    }

    async fn search_by_field(
        &self,
        model: &str,
        field: &str,
        value: &Value,
        limit: usize,
    ) -> StoreResult<Vec<RecordId>> {
        let value_text = Self::value_text(value)?;
        let conn = self.lock_conn()?;
        // 同一唯一键值存在多条记录时,最新创建的一条排在最前
        let mut stmt = conn.prepare(
            r#"
            SELECT r.id
            FROM target_record r
            JOIN record_value v ON v.record_id = r.id
            WHERE r.model = ?1 AND v.field = ?2 AND v.value = ?3
            ORDER BY r.created_at DESC, r.id DESC
            LIMIT ?4
            "#,
        )?;
        let ids: Vec<RecordId> = stmt
            .query_map(params![model, field, value_text, limit as i64], |row| {
                row.get::<_, i64>(0)
            })?
            .collect::<Result<_, _>>()?;
        Ok(ids)
    }

    async fn create(
        &self,
        model: &str,
        values: &Values,
        ctx: &WriteContext,
    ) -> StoreResult<RecordId> {
        let now = Self::now_text();
        let mut conn = self.lock_conn()?;
        let tx = conn.transaction()?;

        tx.execute(
            r#"
            INSERT INTO target_record (model, created_at, create_date, write_date)
            VALUES (?1, ?2, ?2, ?2)
            "#,
            params![model, now],
        )?;
        let record_id = tx.last_insert_rowid();

        {
            let mut stmt = tx.prepare(
                "INSERT INTO record_value (record_id, field, value) VALUES (?1, ?2, ?3)",
            )?;
            for (field, value) in values {
                // 标准写路径忽略特权字段
                if is_privileged_field(field) {
                    continue;
                }
                stmt.execute(params![record_id, field, Self::value_text(value)?])?;
            }
        }
        tx.commit()?;

        debug!(
            model,
            record_id,
            import_session = ctx.import_session,
            "记录已创建"
        );
        Ok(record_id)
    }

    async fn write(
        &self,
        entity: &TargetEntity,
        values: &Values,
        ctx: &WriteContext,
    ) -> StoreResult<()> {
        let written: Vec<String> = values
            .keys()
            .filter(|k| !is_privileged_field(k))
            .cloned()
            .collect();

        {
            let mut conn = self.lock_conn()?;
            Self::ensure_exists(&conn, entity)?;

            // 零字段写是合法无操作: 不触碰 write_date
            if !written.is_empty() {
                let tx = conn.transaction()?;
                {
                    let mut stmt = tx.prepare(
                        r#"
                        INSERT INTO record_value (record_id, field, value) VALUES (?1, ?2, ?3)
                        ON CONFLICT (record_id, field) DO UPDATE SET value = excluded.value
                        "#,
                    )?;
                    for field in &written {
                        let value = &values[field.as_str()];
                        stmt.execute(params![entity.id, field, Self::value_text(value)?])?;
                    }
                }
                tx.execute(
                    "UPDATE target_record SET write_date = ?1 WHERE id = ?2",
                    params![Self::now_text(), entity.id],
                )?;
                tx.commit()?;
            }
        }

        debug!(
            model = entity.model.as_str(),
            record_id = entity.id,
            fields = written.len(),
            import_session = ctx.import_session,
            "记录已更新"
        );
        self.write_log
            .lock()
            .map_err(|e| StoreError::LockError(e.to_string()))?
            .insert(entity.id, written);
        Ok(())
    }

    async fn read(&self, entity: &TargetEntity, fields: &[String]) -> StoreResult<Values> {
        let conn = self.lock_conn()?;
        Self::ensure_exists(&conn, entity)?;

        let mut result = Values::new();
        for field in fields {
            let value = if is_privileged_field(field) {
                let text: Option<String> = conn.query_row(
                    &format!("SELECT {field} FROM target_record WHERE id = ?1"),
                    params![entity.id],
                    |row| row.get(0),
                )?;
                text.map(Value::String).unwrap_or(Value::Null)
            } else {
                conn.query_row(
                    "SELECT value FROM record_value WHERE record_id = ?1 AND field = ?2",
                    params![entity.id, field],
                    |row| row.get::<_, String>(0),
                )
                .optional()?
                .map(|t| Self::parse_value(&t))
                .unwrap_or(Value::Null)
            };
            result.insert(field.clone(), value);
        }
        Ok(result)
    }

    async fn force_column(
        &self,
        entity: &TargetEntity,
        column: &str,
        value: &Value,
    ) -> StoreResult<()> {
        // 窄化能力: 只允许四个特权元数据列
        if !is_privileged_field(column) {
            return Err(StoreError::PrivilegedColumn {
                column: column.to_string(),
            });
        }

        let conn = self.lock_conn()?;
        // 列名来自白名单,此处拼接不构成注入面
        let affected = conn.execute(
            &format!("UPDATE target_record SET {column} = ?1 WHERE id = ?2"),
            params![scalar_text(value), entity.id],
        )?;
        if affected == 0 {
            return Err(StoreError::NotFound {
                entity: entity.model.clone(),
                id: entity.id.to_string(),
            });
        }
        debug!(
            model = entity.model.as_str(),
            record_id = entity.id,
            column,
            "特权列已强制写入"
        );
        Ok(())
    }

    async fn resolve_external_id(&self, identifier: &str) -> StoreResult<Option<TargetEntity>> {
        let conn = self.lock_conn()?;
        let found = conn
            .query_row(
                "SELECT model, record_id FROM external_identifier WHERE identifier = ?1",
                params![identifier],
                |row| {
                    Ok(TargetEntity {
                        model: row.get::<_, String>(0)?,
                        id: row.get::<_, i64>(1)?,
                    })
                },
            )
            .optional()?;
        Ok(found)
    }

    async fn register_external_id(
        &self,
        identifier: &str,
        entity: &TargetEntity,
    ) -> StoreResult<()> {
        let conn = self.lock_conn()?;
        // 已有映射时保持原样(无操作)
        conn.execute(
            "INSERT OR IGNORE INTO external_identifier (identifier, model, record_id) VALUES (?1, ?2, ?3)",
            params![identifier, entity.model, entity.id],
        )?;
        Ok(())
    }

    async fn upsert_translations(
        &self,
        entity: &TargetEntity,
        lang: &str,
        values: &BTreeMap<String, String>,
        src_values: &Values,
    ) -> StoreResult<()> {
        let conn = self.lock_conn()?;
        let mut stmt = conn.prepare(
            r#"
            INSERT INTO record_translation (model, field, lang, record_id, src, value, state)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, 'translated')
            ON CONFLICT (model, field, lang, record_id)
            DO UPDATE SET src = excluded.src, value = excluded.value, state = 'translated'
            "#,
        )?;
        for (field, text) in values {
            let src = src_values
                .get(field)
                .filter(|v| !v.is_null())
                .map(scalar_text);
            stmt.execute(params![entity.model, field, lang, entity.id, src, text])?;
        }
        Ok(())
    }

    async fn translations(
        &self,
        model: &str,
        field: &str,
        lang: &str,
    ) -> StoreResult<Vec<TranslationRow>> {
        let conn = self.lock_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT record_id, src, value, state
            FROM record_translation
            WHERE model = ?1 AND field = ?2 AND lang = ?3
            ORDER BY record_id
            "#,
        )?;
        let rows: Vec<TranslationRow> = stmt
            .query_map(params![model, field, lang], |row| {
                Ok(TranslationRow {
                    record_id: row.get(0)?,
                    src: row.get(1)?,
                    value: row.get(2)?,
                    state: row.get(3)?,
                })
            })?
            .collect::<Result<_, _>>()?;
        Ok(rows)
    }

    async fn last_write_fields(&self, entity: &TargetEntity) -> StoreResult<Option<Vec<String>>> {
        Ok(self
            .write_log
            .lock()
            .map_err(|e| StoreError::LockError(e.to_string()))?
            .get(&entity.id)
            .cloned())
    }
}
