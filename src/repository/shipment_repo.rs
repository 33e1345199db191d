// ==========================================
// 货运装车调度核心 - 运单仓储
// ==========================================
// 红线: Repository 不含业务逻辑
// ==========================================

use crate::db::{invalid_text_column, open_sqlite_connection};
use crate::domain::shipment::ShipmentReceipt;
use crate::domain::types::{PaymentType, ShipmentStatus};
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::sync::{Arc, Mutex};

const SELECT_COLUMNS: &str = r#"
    SELECT shipment_id, origin_branch_id, destination_branch_id, status,
           weight_kg, price, payment_type, goods_description
    FROM shipment_receipt
"#;

// ==========================================
// ShipmentReceiptRepository - 运单仓储
// ==========================================
pub struct ShipmentReceiptRepository {
    conn: Arc<Mutex<Connection>>,
}

impl ShipmentReceiptRepository {
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

    fn map_row(row: &Row<'_>) -> rusqlite::Result<ShipmentReceipt> {
        let status_raw: String = row.get(3)?;
        let payment_raw: String = row.get(6)?;
        Ok(ShipmentReceipt {
            id: row.get(0)?,
            origin_branch_id: row.get(1)?,
            destination_branch_id: row.get(2)?,
            status: ShipmentStatus::from_str(&status_raw)
                .ok_or_else(|| invalid_text_column(3, "status", &status_raw))?,
            weight_kg: row.get(4)?,
            price: row.get(5)?,
            payment_type: PaymentType::from_str(&payment_raw)
                .ok_or_else(|| invalid_text_column(6, "payment_type", &payment_raw))?,
            goods_description: row.get(7)?,
        })
    }

    /// 批量插入运单（INSERT OR REPLACE）
    pub fn batch_insert(&self, receipts: &[ShipmentReceipt]) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        let tx = conn.unchecked_transaction()?;

        let mut count = 0;
        {
            let mut stmt = tx.prepare(
                r#"
                INSERT OR REPLACE INTO shipment_receipt (
                    shipment_id, origin_branch_id, destination_branch_id, status,
                    weight_kg, price, payment_type, goods_description
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                "#,
            )?;
            for r in receipts {
                stmt.execute(params![
                    r.id,
                    r.origin_branch_id,
                    r.destination_branch_id,
                    r.status.to_db_str(),
                    r.weight_kg,
                    r.price,
                    r.payment_type.to_db_str(),
                    r.goods_description,
                ])?;
                count += 1;
            }
        }

        tx.commit()?;
        Ok(count)
    }

    pub fn find_by_id(&self, id: &str) -> RepositoryResult<Option<ShipmentReceipt>> {
        let conn = self.get_conn()?;
        let sql = format!("{} WHERE shipment_id = ?1", SELECT_COLUMNS);
        Ok(conn.query_row(&sql, params![id], Self::map_row).optional()?)
    }

    /// 按状态查询全部运单
    pub fn list_by_status(&self, status: ShipmentStatus) -> RepositoryResult<Vec<ShipmentReceipt>> {
        let conn = self.get_conn()?;
        let sql = format!("{} WHERE status = ?1 ORDER BY shipment_id", SELECT_COLUMNS);
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params![status.to_db_str()], Self::map_row)?;

        let mut receipts = Vec::new();
        for row in rows {
            receipts.push(row?);
        }
        Ok(receipts)
    }

    /// 批量条件更新状态（事务内；任一运单状态不符则整体回滚）
    pub fn update_status_batch(
        &self,
        ids: &[String],
        from: ShipmentStatus,
        to: ShipmentStatus,
    ) -> RepositoryResult<usize> {
        if ids.is_empty() {
            return Ok(0);
        }
        let conn = self.get_conn()?;
        let tx = conn.unchecked_transaction()?;

        {
            let mut stmt = tx.prepare(
                "UPDATE shipment_receipt SET status = ?3 WHERE shipment_id = ?1 AND status = ?2",
            )?;
            for id in ids {
                let affected = stmt.execute(params![id, from.to_db_str(), to.to_db_str()])?;
                if affected == 0 {
                    // tx drop 时自动回滚
                    return Err(RepositoryError::StaleState {
                        entity: "ShipmentReceipt".to_string(),
                        id: id.clone(),
                        expected: from.to_db_str().to_string(),
                    });
                }
            }
        }

        tx.commit()?;
        Ok(ids.len())
    }
}
