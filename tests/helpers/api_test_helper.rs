// ==========================================
// API集成测试辅助工具
// ==========================================
// 职责: 搭建共享连接的测试环境并写入基础数据
// ==========================================
// 基础数据:
// - 网点 A / B / C
// - A 网点: 理货员 E1、司机 D1、行政 S1
// - 运单 R1(A→B) R2(A→C) R3(A→B) R4(A→B, LOADED)
// - A 网点排队车辆 Q1(序号1) Q2(序号2)；B 网点 QB(序号1)
// ==========================================

#[path = "../test_helpers.rs"]
mod test_helpers;

use std::sync::{Arc, Mutex};

use rusqlite::Connection;
use tempfile::NamedTempFile;

use loading_dispatch::api::{DirectoryApi, LoadingApi, QueueApi, ShipmentApi};
use loading_dispatch::config::{ConfigManager, DispatchConfigReader};
use loading_dispatch::domain::actor::{Actor, Branch, Employee};
use loading_dispatch::domain::loading::CreateLoadingInput;
use loading_dispatch::domain::queue::{NewQueueEntry, QueueEntry};
use loading_dispatch::domain::types::{JobFunction, QueueStatus, Role, ShipmentStatus};
use loading_dispatch::logging;
use loading_dispatch::repository::{
    ActionLogRepository, DirectoryRepository, LoadingRepository, QueueEntryRepository,
    ShipmentReceiptRepository,
};

pub use test_helpers::receipt;

/// 测试环境
pub struct DispatchTestEnv<C: DispatchConfigReader> {
    pub db_path: String,
    pub conn: Arc<Mutex<Connection>>,

    pub queue_api: Arc<QueueApi>,
    pub shipment_api: Arc<ShipmentApi>,
    pub directory_api: Arc<DirectoryApi>,
    pub loading_api: Arc<LoadingApi<C>>,

    // Repository层（用于测试数据准备与断言）
    pub queue_repo: Arc<QueueEntryRepository>,
    pub shipment_repo: Arc<ShipmentReceiptRepository>,
    pub loading_repo: Arc<LoadingRepository>,
    pub directory_repo: Arc<DirectoryRepository>,
    pub action_log_repo: Arc<ActionLogRepository>,

    pub q1: QueueEntry,
    pub q2: QueueEntry,
    pub qb: QueueEntry,

    // 临时文件（确保生命周期）
    _temp_file: NamedTempFile,
}

impl DispatchTestEnv<ConfigManager> {
    /// 使用真实 ConfigManager
    pub fn new() -> Result<Self, Box<dyn std::error::Error>> {
        Self::build(|conn| ConfigManager::from_connection(conn))
    }

    pub fn config_manager(&self) -> ConfigManager {
        ConfigManager::from_connection(self.conn.clone()).expect("ConfigManager")
    }
}

impl<C: DispatchConfigReader> DispatchTestEnv<C> {
    /// 使用指定配置实现
    pub fn with_config(config: C) -> Result<Self, Box<dyn std::error::Error>> {
        Self::build(move |_| Ok(config))
    }

    fn build<F>(make_config: F) -> Result<Self, Box<dyn std::error::Error>>
    where
        F: FnOnce(Arc<Mutex<Connection>>) -> Result<C, Box<dyn std::error::Error>>,
    {
        logging::init_test();
        let (temp_file, db_path) = test_helpers::create_test_db()?;
        let conn = Arc::new(Mutex::new(test_helpers::open_test_connection(&db_path)?));

        let config = Arc::new(make_config(conn.clone())?);

        let queue_repo = Arc::new(QueueEntryRepository::from_connection(conn.clone()));
        let shipment_repo = Arc::new(ShipmentReceiptRepository::from_connection(conn.clone()));
        let loading_repo = Arc::new(LoadingRepository::from_connection(conn.clone()));
        let directory_repo = Arc::new(DirectoryRepository::from_connection(conn.clone()));
        let action_log_repo = Arc::new(ActionLogRepository::new(conn.clone()));

        let queue_api = Arc::new(QueueApi::new(queue_repo.clone(), action_log_repo.clone()));
        let shipment_api = Arc::new(ShipmentApi::new(shipment_repo.clone()));
        let directory_api = Arc::new(DirectoryApi::new(directory_repo.clone()));
        let loading_api = Arc::new(LoadingApi::new(
            config,
            loading_repo.clone(),
            directory_repo.clone(),
            action_log_repo.clone(),
            queue_api.clone(),
            shipment_api.clone(),
        ));

        seed_directory(&directory_repo)?;
        shipment_repo.batch_insert(&[
            receipt("R1", "A", "B", ShipmentStatus::Pending),
            receipt("R2", "A", "C", ShipmentStatus::Pending),
            receipt("R3", "A", "B", ShipmentStatus::Pending),
            receipt("R4", "A", "B", ShipmentStatus::Loaded),
        ])?;

        let q1 = queue_api.create(&director(), new_entry("A", "B 1234 XY", "D1", 1))?;
        let q2 = queue_api.create(&director(), new_entry("A", "B 5678 XY", "D1", 2))?;
        let qb = queue_api.create(&director(), new_entry("B", "B 9999 ZZ", "D1", 1))?;

        Ok(Self {
            db_path,
            conn,
            queue_api,
            shipment_api,
            directory_api,
            loading_api,
            queue_repo,
            shipment_repo,
            loading_repo,
            directory_repo,
            action_log_repo,
            q1,
            q2,
            qb,
            _temp_file: temp_file,
        })
    }

    pub fn queue_status(&self, id: &str) -> QueueStatus {
        self.queue_repo
            .find_by_id(id)
            .expect("查询排队条目失败")
            .expect("排队条目不存在")
            .status
    }

    pub fn shipment_status(&self, id: &str) -> ShipmentStatus {
        self.shipment_repo
            .find_by_id(id)
            .expect("查询运单失败")
            .expect("运单不存在")
            .status
    }

    pub fn loading_count(&self) -> i64 {
        let conn = self.conn.lock().unwrap();
        conn.query_row("SELECT COUNT(*) FROM loading", [], |row| row.get(0))
            .unwrap()
    }

    /// A→B，使用 Q1、理货员 E1
    pub fn valid_input(&self, shipment_ids: &[&str]) -> CreateLoadingInput {
        CreateLoadingInput {
            id: None,
            queue_entry_id: self.q1.id.clone(),
            checker_id: "E1".to_string(),
            origin_branch_id: "A".to_string(),
            destination_branch_id: "B".to_string(),
            shipment_ids: shipment_ids.iter().map(|s| s.to_string()).collect(),
            departure_time: None,
            notes: None,
        }
    }
}

fn seed_directory(repo: &DirectoryRepository) -> Result<(), Box<dyn std::error::Error>> {
    let branches = [("A", "JKT", "Jakarta"), ("B", "BDG", "Bandung"), ("C", "SBY", "Surabaya")];
    for (id, code, name) in branches {
        repo.upsert_branch(&Branch {
            id: id.to_string(),
            code: code.to_string(),
            name: name.to_string(),
        })?;
    }
    for (id, name, function, role) in [
        ("E1", "Budi", JobFunction::Checker, Role::Checker),
        ("D1", "Agus", JobFunction::Driver, Role::Supir),
        ("S1", "Sari", JobFunction::Admin, Role::StaffAdmin),
    ] {
        repo.upsert_employee(&Employee {
            id: id.to_string(),
            name: name.to_string(),
            branch_id: "A".to_string(),
            job_function: function,
            role: Some(role),
        })?;
    }
    Ok(())
}

pub fn new_entry(branch: &str, vehicle: &str, driver: &str, sequence: i32) -> NewQueueEntry {
    NewQueueEntry {
        branch_id: branch.to_string(),
        vehicle_id: vehicle.to_string(),
        driver_id: driver.to_string(),
        assistant_id: None,
        sequence_number: sequence,
    }
}

// ==========================================
// 常用操作人
// ==========================================

pub fn director() -> Actor {
    Actor::new("emp-director", Role::Director, None)
}

/// A 网点行政专员（网点字段受限）
pub fn staff_admin_a() -> Actor {
    Actor::new("S1", Role::StaffAdmin, Some("A"))
}

pub fn staff_admin_b() -> Actor {
    Actor::new("emp-admin-b", Role::StaffAdmin, Some("B"))
}

pub fn sales_a() -> Actor {
    Actor::new("emp-sales-a", Role::StaffPenjualan, Some("A"))
}
