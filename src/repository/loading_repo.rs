// ==========================================
// 货运装车调度核心 - 装车单仓储
// ==========================================
// 红线: Repository 不含业务逻辑
// 说明: loading 主表 + loading_shipment 明细表，事务内整体写入
// ==========================================

use crate::db::{
    format_db_timestamp, invalid_text_column, open_sqlite_connection, parse_db_timestamp,
};
use crate::domain::loading::Loading;
use crate::domain::types::LoadingStatus;
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, OptionalExtension, Row, Transaction};
use std::sync::{Arc, Mutex};

const SELECT_COLUMNS: &str = r#"
    SELECT loading_id, queue_entry_id, checker_id, origin_branch_id, destination_branch_id,
           departure_time, notes, status, created_at, updated_at
    FROM loading
"#;

// ==========================================
// LoadingRepository - 装车单仓储
// ==========================================
pub struct LoadingRepository {
    conn: Arc<Mutex<Connection>>,
}

impl LoadingRepository {
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 行映射（shipment_ids 由调用方补齐）
    fn map_row(row: &Row<'_>) -> rusqlite::Result<Loading> {
        let status_raw: String = row.get(7)?;
        let departure_time = match row.get::<_, Option<String>>(5)? {
            Some(raw) => Some(parse_db_timestamp(5, &raw)?),
            None => None,
        };
        Ok(Loading {
            id: row.get(0)?,
            queue_entry_id: row.get(1)?,
            checker_id: row.get(2)?,
            origin_branch_id: row.get(3)?,
            destination_branch_id: row.get(4)?,
            departure_time,
            notes: row.get(6)?,
            shipment_ids: Vec::new(),
            status: LoadingStatus::from_str(&status_raw)
                .ok_or_else(|| invalid_text_column(7, "status", &status_raw))?,
            created_at: parse_db_timestamp(8, &row.get::<_, String>(8)?)?,
            updated_at: parse_db_timestamp(9, &row.get::<_, String>(9)?)?,
        })
    }

    fn load_shipment_ids(conn: &Connection, loading_id: &str) -> RepositoryResult<Vec<String>> {
        let mut stmt = conn.prepare(
            "SELECT shipment_id FROM loading_shipment WHERE loading_id = ?1 ORDER BY shipment_id",
        )?;
        let rows = stmt.query_map(params![loading_id], |row| row.get::<_, String>(0))?;
        let mut ids = Vec::new();
        for row in rows {
            ids.push(row?);
        }
        Ok(ids)
    }

    fn write_shipment_ids(tx: &Transaction<'_>, loading: &Loading) -> RepositoryResult<()> {
        tx.execute(
            "DELETE FROM loading_shipment WHERE loading_id = ?1",
            params![loading.id],
        )?;
        let mut stmt =
            tx.prepare("INSERT INTO loading_shipment (loading_id, shipment_id) VALUES (?1, ?2)")?;
        for shipment_id in &loading.shipment_ids {
            stmt.execute(params![loading.id, shipment_id])?;
        }
        Ok(())
    }

    /// 插入装车单（单号重复时返回 UniqueConstraintViolation）
    pub fn insert(&self, loading: &Loading) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let tx = conn.unchecked_transaction()?;

        tx.execute(
            r#"
            INSERT INTO loading (
                loading_id, queue_entry_id, checker_id, origin_branch_id, destination_branch_id,
                departure_time, notes, status, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
            params![
                loading.id,
                loading.queue_entry_id,
                loading.checker_id,
                loading.origin_branch_id,
                loading.destination_branch_id,
                loading.departure_time.as_ref().map(format_db_timestamp),
                loading.notes,
                loading.status.to_db_str(),
                format_db_timestamp(&loading.created_at),
                format_db_timestamp(&loading.updated_at),
            ],
        )?;
        Self::write_shipment_ids(&tx, loading)?;

        tx.commit()?;
        Ok(())
    }

    /// 更新可编辑字段与运单明细（锁定字段不写）
    pub fn update(&self, loading: &Loading) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let tx = conn.unchecked_transaction()?;

        let affected = tx.execute(
            r#"
            UPDATE loading
            SET checker_id = ?2, departure_time = ?3, notes = ?4, status = ?5, updated_at = ?6
            WHERE loading_id = ?1
            "#,
            params![
                loading.id,
                loading.checker_id,
                loading.departure_time.as_ref().map(format_db_timestamp),
                loading.notes,
                loading.status.to_db_str(),
                format_db_timestamp(&loading.updated_at),
            ],
        )?;
        if affected == 0 {
            return Err(RepositoryError::NotFound {
                entity: "Loading".to_string(),
                id: loading.id.clone(),
            });
        }
        Self::write_shipment_ids(&tx, loading)?;

        tx.commit()?;
        Ok(())
    }

    /// 按单号查询（含运单明细）
    pub fn find_by_id(&self, id: &str) -> RepositoryResult<Option<Loading>> {
        let conn = self.get_conn()?;
        let sql = format!("{} WHERE loading_id = ?1", SELECT_COLUMNS);
        let loading = conn.query_row(&sql, params![id], Self::map_row).optional()?;

        match loading {
            Some(mut loading) => {
                loading.shipment_ids = Self::load_shipment_ids(&conn, &loading.id)?;
                Ok(Some(loading))
            }
            None => Ok(None),
        }
    }

    /// 按状态查询（含运单明细），按创建时间倒序
    pub fn list_by_status(&self, status: LoadingStatus) -> RepositoryResult<Vec<Loading>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "{} WHERE status = ?1 ORDER BY created_at DESC, loading_id ASC",
            SELECT_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params![status.to_db_str()], Self::map_row)?;

        let mut loadings = Vec::new();
        for row in rows {
            let mut loading = row?;
            loading.shipment_ids = Self::load_shipment_ids(&conn, &loading.id)?;
            loadings.push(loading);
        }
        Ok(loadings)
    }

    /// 删除装车单（明细随外键级联删除）
    pub fn delete(&self, id: &str) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let affected = conn.execute("DELETE FROM loading WHERE loading_id = ?1", params![id])?;
        if affected == 0 {
            return Err(RepositoryError::NotFound {
                entity: "Loading".to_string(),
                id: id.to_string(),
            });
        }
        Ok(())
    }
}
