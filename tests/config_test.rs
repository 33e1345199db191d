// ==========================================
// ConfigManager 集成测试
// ==========================================
// 测试目标: 验证配置读取及其对装车流程的影响
// ==========================================

mod helpers;

use std::sync::Mutex;

use helpers::api_test_helper::*;
use loading_dispatch::app::AppState;
use loading_dispatch::config::{config_keys, ConfigManager, DispatchConfigReader};
use loading_dispatch::domain::types::QueueStatus;
use test_helpers::{create_test_db, insert_test_config};

// 语言为进程级全局状态
static LOCALE_LOCK: Mutex<()> = Mutex::new(());

#[tokio::test]
async fn test_config_manager_creation() {
    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");

    let config_manager = ConfigManager::new(&db_path);
    assert!(
        config_manager.is_ok(),
        "ConfigManager should be created successfully"
    );
}

#[tokio::test]
async fn test_read_configured_values() {
    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    let conn = test_helpers::open_test_connection(&db_path).expect("Failed to open db");
    insert_test_config(
        &conn,
        &[
            (config_keys::LOADING_ID_PREFIX, "MUAT"),
            (config_keys::LOADING_ID_SUFFIX_MIN, "5000"),
            (config_keys::LOADING_ID_SUFFIX_MAX, "5999"),
            (config_keys::DEPARTURE_TIME_FORMAT, "%d/%m/%Y %H:%M"),
            (config_keys::QUEUE_REQUIRE_ORIGIN_BRANCH, "No"),
            (config_keys::DEFAULT_LOCALE, "id"),
        ],
    )
    .expect("Failed to insert test config");

    let config_manager = ConfigManager::new(&db_path).expect("Failed to create ConfigManager");

    let format = config_manager.get_display_id_format().await.unwrap();
    assert_eq!(format.prefix, "MUAT");
    assert_eq!(format.date_format, "%d%m%y");
    assert_eq!((format.suffix_min, format.suffix_max), (5000, 5999));

    assert_eq!(
        config_manager.get_departure_time_format().await.unwrap(),
        "%d/%m/%Y %H:%M"
    );
    assert!(!config_manager.get_queue_require_origin_branch().await.unwrap());
    assert_eq!(config_manager.get_default_locale().await.unwrap(), "id");
    assert_eq!(config_manager.get_log_filter().await.unwrap(), "info");
}

#[tokio::test]
async fn test_configured_id_format_used_by_create() {
    let env = DispatchTestEnv::new().expect("无法创建测试环境");
    let config = env.config_manager();
    config.set_global_value(config_keys::LOADING_ID_PREFIX, "MUAT").unwrap();
    config.set_global_value(config_keys::LOADING_ID_SUFFIX_MIN, "7777").unwrap();
    config.set_global_value(config_keys::LOADING_ID_SUFFIX_MAX, "7777").unwrap();

    let loading = env
        .loading_api
        .create(&director(), env.valid_input(&["R1"]))
        .await
        .unwrap();
    assert!(loading.id.starts_with("MUAT-"), "id={}", loading.id);
    assert!(loading.id.ends_with("-7777"), "id={}", loading.id);
}

#[tokio::test]
async fn test_configured_departure_format_and_queue_branch() {
    let env = DispatchTestEnv::new().expect("无法创建测试环境");
    let config = env.config_manager();
    config
        .set_global_value(config_keys::DEPARTURE_TIME_FORMAT, "%d/%m/%Y %H:%M")
        .unwrap();
    config
        .set_global_value(config_keys::QUEUE_REQUIRE_ORIGIN_BRANCH, "false")
        .unwrap();

    let mut input = env.valid_input(&["R1"]);
    input.queue_entry_id = env.qb.id.clone();
    input.departure_time = Some("01/05/2024 08:00".to_string());
    let loading = env.loading_api.create(&director(), input).await.unwrap();

    assert_eq!(
        loading.departure_time.map(|t| t.format("%Y-%m-%d %H:%M").to_string()),
        Some("2024-05-01 08:00".to_string())
    );
    assert_eq!(env.queue_status(&env.qb.id), QueueStatus::Departed);
}

#[tokio::test]
async fn test_app_state_wiring_and_locale() {
    let _guard = LOCALE_LOCK.lock().unwrap_or_else(|e| e.into_inner());
    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");

    let state = AppState::new(db_path.clone()).expect("AppState should initialize");
    assert_eq!(state.db_path, db_path);
    assert!(state.queue_api.list_waiting("A").unwrap().is_empty());
    assert_eq!(state.queue_api.suggest_next_sequence("A").unwrap(), 1);

    state
        .config_manager
        .set_global_value(config_keys::DEFAULT_LOCALE, "en")
        .unwrap();
    assert_eq!(state.apply_locale().await, "en");

    // 不支持的语言保持当前设置
    state
        .config_manager
        .set_global_value(config_keys::DEFAULT_LOCALE, "fr")
        .unwrap();
    assert_eq!(state.apply_locale().await, "en");

    loading_dispatch::i18n::set_locale("zh-CN");
}
