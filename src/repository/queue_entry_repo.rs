// ==========================================
// 货运装车调度核心 - 排队条目仓储
// ==========================================
// 红线: Repository 不含业务逻辑
// ==========================================

use crate::db::{
    format_db_timestamp, invalid_text_column, open_sqlite_connection, parse_db_timestamp,
};
use crate::domain::queue::QueueEntry;
use crate::domain::types::QueueStatus;
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::sync::{Arc, Mutex};

const SELECT_COLUMNS: &str = r#"
    SELECT queue_entry_id, branch_id, vehicle_id, driver_id, assistant_id,
           sequence_number, status, created_at, updated_at
    FROM queue_entry
"#;

// ==========================================
// QueueEntryRepository - 排队条目仓储
// ==========================================
/// 排队条目仓储
/// 职责: 管理 queue_entry 表的 CRUD 操作
pub struct QueueEntryRepository {
    conn: Arc<Mutex<Connection>>,
}

impl QueueEntryRepository {
    /// 创建新的 QueueEntryRepository 实例
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建仓储实例
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    fn map_row(row: &Row<'_>) -> rusqlite::Result<QueueEntry> {
        let status_raw: String = row.get(6)?;
        let status = QueueStatus::from_str(&status_raw)
            .ok_or_else(|| invalid_text_column(6, "status", &status_raw))?;
        Ok(QueueEntry {
            id: row.get(0)?,
            branch_id: row.get(1)?,
            vehicle_id: row.get(2)?,
            driver_id: row.get(3)?,
            assistant_id: row.get(4)?,
            sequence_number: row.get(5)?,
            status,
            created_at: parse_db_timestamp(7, &row.get::<_, String>(7)?)?,
            updated_at: parse_db_timestamp(8, &row.get::<_, String>(8)?)?,
        })
    }

    /// 插入排队条目
    pub fn insert(&self, entry: &QueueEntry) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO queue_entry (
                queue_entry_id, branch_id, vehicle_id, driver_id, assistant_id,
                sequence_number, status, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
            params![
                entry.id,
                entry.branch_id,
                entry.vehicle_id,
                entry.driver_id,
                entry.assistant_id,
                entry.sequence_number,
                entry.status.to_db_str(),
                format_db_timestamp(&entry.created_at),
                format_db_timestamp(&entry.updated_at),
            ],
        )?;
        Ok(())
    }

    /// 按 ID 查询
    pub fn find_by_id(&self, id: &str) -> RepositoryResult<Option<QueueEntry>> {
        let conn = self.get_conn()?;
        let sql = format!("{} WHERE queue_entry_id = ?1", SELECT_COLUMNS);
        let entry = conn
            .query_row(&sql, params![id], Self::map_row)
            .optional()?;
        Ok(entry)
    }

    /// 按网点 + 状态查询，按排队序号升序
    pub fn find_by_branch_and_status(
        &self,
        branch_id: &str,
        status: QueueStatus,
    ) -> RepositoryResult<Vec<QueueEntry>> {
        let conn = self.get_conn()?;
        let sql = format!(
            r#"{} WHERE branch_id = ?1 AND status = ?2
            ORDER BY sequence_number ASC, created_at ASC, queue_entry_id ASC"#,
            SELECT_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params![branch_id, status.to_db_str()], Self::map_row)?;

        let mut entries = Vec::new();
        for row in rows {
            entries.push(row?);
        }
        Ok(entries)
    }

    /// 网点内指定状态的最大排队序号
    pub fn max_sequence_number(
        &self,
        branch_id: &str,
        status: QueueStatus,
    ) -> RepositoryResult<Option<i32>> {
        let conn = self.get_conn()?;
        let max: Option<i32> = conn.query_row(
            "SELECT MAX(sequence_number) FROM queue_entry WHERE branch_id = ?1 AND status = ?2",
            params![branch_id, status.to_db_str()],
            |row| row.get(0),
        )?;
        Ok(max)
    }

    /// 更新可编辑字段（车辆/司机/助手/序号）
    pub fn update_fields(&self, entry: &QueueEntry) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let affected = conn.execute(
            r#"
            UPDATE queue_entry
            SET vehicle_id = ?2, driver_id = ?3, assistant_id = ?4,
                sequence_number = ?5, updated_at = ?6
            WHERE queue_entry_id = ?1
            "#,
            params![
                entry.id,
                entry.vehicle_id,
                entry.driver_id,
                entry.assistant_id,
                entry.sequence_number,
                format_db_timestamp(&entry.updated_at),
            ],
        )?;
        if affected == 0 {
            return Err(RepositoryError::NotFound {
                entity: "QueueEntry".to_string(),
                id: entry.id.clone(),
            });
        }
        Ok(())
    }

    /// 条件更新状态（仅当当前状态为 from 时生效）
    pub fn update_status(
        &self,
        id: &str,
        from: QueueStatus,
        to: QueueStatus,
        updated_at: &chrono::NaiveDateTime,
    ) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let affected = conn.execute(
            r#"
            UPDATE queue_entry SET status = ?3, updated_at = ?4
            WHERE queue_entry_id = ?1 AND status = ?2
            "#,
            params![id, from.to_db_str(), to.to_db_str(), format_db_timestamp(updated_at)],
        )?;
        if affected == 0 {
            return Err(RepositoryError::StaleState {
                entity: "QueueEntry".to_string(),
                id: id.to_string(),
                expected: from.to_db_str().to_string(),
            });
        }
        Ok(())
    }

    /// 删除（仅当状态为 WAITING 时生效）
    pub fn delete_waiting(&self, id: &str) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let affected = conn.execute(
            "DELETE FROM queue_entry WHERE queue_entry_id = ?1 AND status = ?2",
            params![id, QueueStatus::Waiting.to_db_str()],
        )?;
        if affected == 0 {
            return Err(RepositoryError::StaleState {
                entity: "QueueEntry".to_string(),
                id: id.to_string(),
                expected: QueueStatus::Waiting.to_db_str().to_string(),
            });
        }
        Ok(())
    }
}
