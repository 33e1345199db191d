// ==========================================
// 货运装车调度核心 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、覆写管理
// 存储: config_kv 表 (key-value + scope)
// ==========================================

use crate::config::dispatch_config_trait::DispatchConfigReader;
use crate::db::open_sqlite_connection;
use crate::engine::display_id::{is_valid_date_format, is_valid_strftime, DisplayIdFormat};
use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};
use serde_json::json;
use std::collections::HashMap;
use std::error::Error;
use std::sync::{Arc, Mutex};

const GLOBAL_SCOPE: &str = "global";
const DEFAULT_DEPARTURE_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M";

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 创建新的 ConfigManager 实例
    pub fn new(db_path: &str) -> Result<Self, Box<dyn Error>> {
        let conn = open_sqlite_connection(db_path)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建 ConfigManager
    ///
    /// 说明：会对传入连接再次应用统一 PRAGMA（幂等）。
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Result<Self, Box<dyn Error>> {
        {
            let conn_guard = conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
            crate::db::configure_sqlite_connection(&conn_guard)?;
        }

        Ok(Self { conn })
    }

    /// 从 config_kv 表读取配置值（scope_id='global'）
    fn get_config_value(&self, key: &str) -> Result<Option<String>, Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let value = conn
            .query_row(
                "SELECT value FROM config_kv WHERE scope_id = ?1 AND key = ?2",
                params![GLOBAL_SCOPE, key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    /// 读取 global scope 的配置值（公开方法，供其他模块复用）
    pub fn get_global_config_value(&self, key: &str) -> Result<Option<String>, Box<dyn Error>> {
        self.get_config_value(key)
    }

    fn get_config_or_default(&self, key: &str, default: &str) -> Result<String, Box<dyn Error>> {
        Ok(self.get_config_value(key)?.unwrap_or_else(|| default.to_string()))
    }

    /// 写入 global scope 配置（UPSERT）
    pub fn set_global_value(&self, key: &str, value: &str) -> Result<(), Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
        conn.execute(
            "INSERT INTO config_kv (scope_id, key, value) VALUES (?1, ?2, ?3)
             ON CONFLICT(scope_id, key) DO UPDATE SET value = ?3, updated_at = datetime('now')",
            params![GLOBAL_SCOPE, key, value],
        )?;
        tracing::debug!(config_key = key, value = value, "配置已更新");
        Ok(())
    }

    /// 获取所有 global 配置的快照（JSON格式）
    pub fn get_config_snapshot(&self) -> Result<String, Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let mut stmt =
            conn.prepare("SELECT key, value FROM config_kv WHERE scope_id = ?1 ORDER BY key")?;
        let rows = stmt.query_map(params![GLOBAL_SCOPE], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        let mut config_map: HashMap<String, String> = HashMap::new();
        for row in rows {
            let (key, value) = row?;
            config_map.insert(key, value);
        }

        Ok(serde_json::to_string(&json!(config_map))?)
    }

    fn parse_or_default<T: std::str::FromStr + Copy + std::fmt::Display>(
        &self,
        key: &str,
        default: T,
    ) -> Result<T, Box<dyn Error>> {
        let raw = self.get_config_or_default(key, &default.to_string())?;
        Ok(raw.trim().parse::<T>().unwrap_or_else(|_| {
            tracing::warn!(config_key = key, raw_value = %raw, "配置值格式错误，使用默认值");
            default
        }))
    }

    /// 读取时间格式串，空串或非法说明符时回退默认值
    fn format_or_default(
        &self,
        key: &str,
        default: &str,
        is_valid: fn(&str) -> bool,
    ) -> Result<String, Box<dyn Error>> {
        let raw = self.get_config_or_default(key, default)?;
        if is_valid(&raw) {
            return Ok(raw);
        }
        tracing::warn!(config_key = key, raw_value = %raw, "时间格式非法，使用默认值");
        Ok(default.to_string())
    }
}

// ==========================================
// DispatchConfigReader Trait 实现
// ==========================================
#[async_trait]
impl DispatchConfigReader for ConfigManager {
    async fn get_display_id_format(&self) -> Result<DisplayIdFormat, Box<dyn Error>> {
        let defaults = DisplayIdFormat::default();

        let prefix = self.get_config_or_default(config_keys::LOADING_ID_PREFIX, &defaults.prefix)?;
        let date_format = self.format_or_default(
            config_keys::LOADING_ID_DATE_FORMAT,
            &defaults.date_format,
            is_valid_date_format,
        )?;
        let suffix_min =
            self.parse_or_default(config_keys::LOADING_ID_SUFFIX_MIN, defaults.suffix_min)?;
        let suffix_max =
            self.parse_or_default(config_keys::LOADING_ID_SUFFIX_MAX, defaults.suffix_max)?;

        Ok(DisplayIdFormat {
            prefix: if prefix.trim().is_empty() {
                defaults.prefix
            } else {
                prefix.trim().to_string()
            },
            date_format,
            suffix_min,
            suffix_max,
        })
    }

    async fn get_departure_time_format(&self) -> Result<String, Box<dyn Error>> {
        self.format_or_default(
            config_keys::DEPARTURE_TIME_FORMAT,
            DEFAULT_DEPARTURE_TIME_FORMAT,
            is_valid_strftime,
        )
    }

    async fn get_queue_require_origin_branch(&self) -> Result<bool, Box<dyn Error>> {
        let value = self.get_config_or_default(config_keys::QUEUE_REQUIRE_ORIGIN_BRANCH, "true")?;
        match value.trim().to_lowercase().as_str() {
            "false" | "0" | "no" => Ok(false),
            _ => Ok(true),
        }
    }

    async fn get_default_locale(&self) -> Result<String, Box<dyn Error>> {
        self.get_config_or_default(config_keys::DEFAULT_LOCALE, "zh-CN")
    }

    async fn get_log_filter(&self) -> Result<String, Box<dyn Error>> {
        self.get_config_or_default(config_keys::LOG_FILTER, "info")
    }
}

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    // 装车单号
    pub const LOADING_ID_PREFIX: &str = "loading_id_prefix";
    pub const LOADING_ID_DATE_FORMAT: &str = "loading_id_date_format";
    pub const LOADING_ID_SUFFIX_MIN: &str = "loading_id_suffix_min";
    pub const LOADING_ID_SUFFIX_MAX: &str = "loading_id_suffix_max";

    // 出发时间
    pub const DEPARTURE_TIME_FORMAT: &str = "departure_time_format";

    // 排队
    pub const QUEUE_REQUIRE_ORIGIN_BRANCH: &str = "queue_require_origin_branch";

    // 运行环境
    pub const DEFAULT_LOCALE: &str = "default_locale";
    pub const LOG_FILTER: &str = "log_filter";
}
