// ==========================================
// 货运装车调度核心 - 应用状态
// ==========================================
// 职责: 管理应用级别的共享连接与 API 实例
// ==========================================

use std::sync::{Arc, Mutex};

use rusqlite::Connection;

use crate::api::{DirectoryApi, LoadingApi, QueueApi, ShipmentApi};
use crate::config::config_manager::ConfigManager;
use crate::repository::{
    ActionLogRepository, DirectoryRepository, LoadingRepository, QueueEntryRepository,
    ShipmentReceiptRepository,
};

/// 应用状态
///
/// 所有仓储共享同一个连接
pub struct AppState {
    pub db_path: String,

    pub config_manager: Arc<ConfigManager>,

    pub queue_api: Arc<QueueApi>,
    pub shipment_api: Arc<ShipmentApi>,
    pub directory_api: Arc<DirectoryApi>,
    pub loading_api: Arc<LoadingApi<ConfigManager>>,
}

impl AppState {
    /// 打开数据库、建表并创建所有 API 实例
    pub fn new(db_path: String) -> Result<Self, String> {
        tracing::info!("初始化AppState，数据库路径: {}", db_path);

        let conn = crate::db::open_sqlite_connection(&db_path)
            .map_err(|e| format!("无法打开数据库: {}", e))?;
        crate::db::init_schema(&conn).map_err(|e| format!("建表失败: {}", e))?;

        Self::from_connection(db_path, Arc::new(Mutex::new(conn)))
    }

    /// 基于已有连接创建（连接需已完成建表）
    pub fn from_connection(db_path: String, conn: Arc<Mutex<Connection>>) -> Result<Self, String> {
        let config_manager = Arc::new(
            ConfigManager::from_connection(conn.clone())
                .map_err(|e| format!("无法创建ConfigManager: {}", e))?,
        );

        // ==========================================
        // Repository 层
        // ==========================================
        let queue_repo = Arc::new(QueueEntryRepository::from_connection(conn.clone()));
        let shipment_repo = Arc::new(ShipmentReceiptRepository::from_connection(conn.clone()));
        let loading_repo = Arc::new(LoadingRepository::from_connection(conn.clone()));
        let directory_repo = Arc::new(DirectoryRepository::from_connection(conn.clone()));
        let action_log_repo = Arc::new(ActionLogRepository::new(conn));

        // ==========================================
        // API 层
        // ==========================================
        let queue_api = Arc::new(QueueApi::new(queue_repo, action_log_repo.clone()));
        let shipment_api = Arc::new(ShipmentApi::new(shipment_repo));
        let directory_api = Arc::new(DirectoryApi::new(directory_repo.clone()));
        let loading_api = Arc::new(LoadingApi::new(
            config_manager.clone(),
            loading_repo,
            directory_repo,
            action_log_repo,
            queue_api.clone(),
            shipment_api.clone(),
        ));

        tracing::info!("AppState初始化完成");

        Ok(Self {
            db_path,
            config_manager,
            queue_api,
            shipment_api,
            directory_api,
            loading_api,
        })
    }

    /// 按配置初始化语言，返回生效的语言
    pub async fn apply_locale(&self) -> String {
        crate::i18n::apply_configured_locale(self.config_manager.as_ref()).await
    }
}
