// ==========================================
// 装车分配性质与示例场景测试
// ==========================================

mod helpers;

use std::collections::BTreeSet;

use helpers::api_test_helper::*;
use helpers::mock_config::MockConfig;
use loading_dispatch::api::ApiError;
use loading_dispatch::domain::loading::LoadingPatch;
use loading_dispatch::domain::types::{LoadingStatus, QueueStatus, ShipmentStatus};
use loading_dispatch::engine::select_all_eligible;

fn set(values: &[&str]) -> BTreeSet<String> {
    values.iter().map(|s| s.to_string()).collect()
}

// ==========================================
// 性质
// ==========================================

#[test]
fn test_eligible_for_只返回匹配三元组() {
    let env = DispatchTestEnv::new().expect("无法创建测试环境");
    env.shipment_repo
        .batch_insert(&[
            receipt("R5", "B", "A", ShipmentStatus::Pending),
            receipt("R6", "C", "A", ShipmentStatus::Delivered),
            receipt("R7", "A", "B", ShipmentStatus::Cancelled),
        ])
        .unwrap();

    let branches = ["A", "B", "C"];
    let mut seen = BTreeSet::new();
    for origin in branches {
        for destination in branches {
            for r in env.shipment_api.eligible_for(origin, destination).unwrap() {
                assert_eq!(r.status, ShipmentStatus::Pending);
                assert_eq!(r.origin_branch_id, origin);
                assert_eq!(r.destination_branch_id, destination);
                seen.insert(r.id);
            }
        }
    }
    assert_eq!(seen, set(&["R1", "R2", "R3", "R5"]));
}

#[tokio::test]
async fn test_空运单列表一律拒绝() {
    let env = DispatchTestEnv::new().expect("无法创建测试环境");

    let err = env
        .loading_api
        .create(&director(), env.valid_input(&[]))
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::Validation { ref field, .. } if field == "shipment_ids"));

    let loading = env
        .loading_api
        .create(&director(), env.valid_input(&["R1"]))
        .await
        .unwrap();
    let err = env
        .loading_api
        .update(
            &director(),
            &loading.id,
            LoadingPatch {
                shipment_ids: Some(Vec::new()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::Validation { ref field, .. } if field == "shipment_ids"));
    assert_eq!(env.shipment_status("R1"), ShipmentStatus::Loaded);
}

#[tokio::test]
async fn test_草稿状态随发车时间派生() {
    let env = DispatchTestEnv::new().expect("无法创建测试环境");
    let mut draft = env.loading_api.new_draft().await.unwrap();
    assert_eq!(draft.status(), LoadingStatus::Muat);

    for (raw, expected) in [
        ("2024-05-01T08:00", LoadingStatus::Berangkat),
        ("", LoadingStatus::Muat),
        ("2024-05-01 09:30", LoadingStatus::Berangkat),
        ("   ", LoadingStatus::Muat),
    ] {
        env.loading_api.set_departure_time(&mut draft, raw).await.unwrap();
        assert_eq!(draft.status(), expected, "raw={:?}", raw);
        assert_eq!(draft.departure_time().is_some(), expected == LoadingStatus::Berangkat);
    }

    // 解析失败时保持原值
    assert!(env.loading_api.set_departure_time(&mut draft, "kemarin").await.is_err());
    assert_eq!(draft.status(), LoadingStatus::Muat);
}

#[tokio::test]
async fn test_更换出发网点清空已选运单() {
    let env = DispatchTestEnv::new().expect("无法创建测试环境");
    let mut draft = env.loading_api.new_draft().await.unwrap();
    draft.set_origin_branch("A").unwrap();
    draft.set_destination_branch("B").unwrap();
    env.loading_api.toggle_shipment(&mut draft, "R1");
    env.loading_api.toggle_shipment(&mut draft, "R3");

    // 目的网点变化不清空
    draft.set_destination_branch("C").unwrap();
    assert_eq!(draft.selection().len(), 2);

    // 相同值不视为变化
    draft.set_origin_branch("A").unwrap();
    assert_eq!(draft.selection().len(), 2);

    draft.set_origin_branch("B").unwrap();
    assert!(draft.selection().is_empty());
}

#[test]
fn test_全选两次恢复原选择() {
    let env = DispatchTestEnv::new().expect("无法创建测试环境");
    let eligible = set(&["R1", "R3"]);

    for original in [set(&[]), set(&["X9"]), set(&["R1", "R3"]), set(&["R1", "R3", "X9"])] {
        let once = env.loading_api.select_all_eligible("A", "B", &original).unwrap();
        let twice = env.loading_api.select_all_eligible("A", "B", &once).unwrap();
        assert_eq!(twice, original, "original={:?}", original);
        assert_ne!(once.is_superset(&eligible), original.is_superset(&eligible));
    }

    // 部分选中: 第一次补全，第二次取消全部可装项
    let partial = set(&["R1"]);
    let once = env.loading_api.select_all_eligible("A", "B", &partial).unwrap();
    assert_eq!(once, eligible);
    let twice = env.loading_api.select_all_eligible("A", "B", &once).unwrap();
    assert!(twice.is_empty());
}

#[tokio::test]
async fn test_创建失败保持排队条目等待() {
    let env =
        DispatchTestEnv::with_config(MockConfig::fixed_suffix(4242)).expect("无法创建测试环境");
    let taken = env
        .loading_api
        .create(&director(), {
            let mut input = env.valid_input(&["R3"]);
            input.queue_entry_id = env.q2.id.clone();
            input
        })
        .await
        .unwrap();

    let failures = vec![
        env.valid_input(&[]),
        env.valid_input(&["R2"]),
        env.valid_input(&["R4"]),
        {
            let mut input = env.valid_input(&["R1"]);
            input.checker_id = "S1".to_string();
            input
        },
        {
            let mut input = env.valid_input(&["R1"]);
            input.departure_time = Some("08:00".to_string());
            input
        },
        {
            // 单号冲突（存储层拒绝）
            let mut input = env.valid_input(&["R1"]);
            input.id = Some(taken.id.clone());
            input
        },
    ];

    for input in failures {
        let result = env.loading_api.create(&director(), input.clone()).await;
        assert!(result.is_err(), "input={:?}", input);
        assert_eq!(env.queue_status(&env.q1.id), QueueStatus::Waiting, "input={:?}", input);
        assert_eq!(env.shipment_status("R1"), ShipmentStatus::Pending);
    }

    let err = env
        .loading_api
        .create(&sales_a(), env.valid_input(&["R1"]))
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::Authorization { .. }));
    assert_eq!(env.queue_status(&env.q1.id), QueueStatus::Waiting);
}

#[tokio::test]
async fn test_排队条目更新失败时删除装车单() {
    let config = MockConfig::default();
    let hook = config.on_display_id_format.clone();
    let env = DispatchTestEnv::with_config(config).expect("无法创建测试环境");

    // 装车单入库之后，排队条目状态写入被存储拒绝
    let conn = env.conn.clone();
    hook.arm(move || {
        conn.lock()
            .unwrap()
            .execute_batch(
                r#"
                CREATE TRIGGER block_queue_update BEFORE UPDATE ON queue_entry
                BEGIN
                    SELECT RAISE(ABORT, 'queue store unavailable');
                END;
                "#,
            )
            .unwrap();
    });

    let err = env
        .loading_api
        .create(&director(), env.valid_input(&["R1", "R3"]))
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::RemoteFailure(_)), "{:?}", err);

    assert_eq!(env.loading_count(), 0);
    assert_eq!(env.queue_status(&env.q1.id), QueueStatus::Waiting);
    assert_eq!(env.shipment_status("R1"), ShipmentStatus::Pending);
    assert_eq!(env.shipment_status("R3"), ShipmentStatus::Pending);
}

#[tokio::test]
async fn test_编辑锁定字段() {
    let env = DispatchTestEnv::new().expect("无法创建测试环境");
    let loading = env
        .loading_api
        .create(&director(), env.valid_input(&["R1"]))
        .await
        .unwrap();

    let patches = [
        LoadingPatch {
            origin_branch_id: Some("C".to_string()),
            shipment_ids: Some(vec!["R3".to_string()]),
            ..Default::default()
        },
        LoadingPatch {
            destination_branch_id: Some("C".to_string()),
            ..Default::default()
        },
        LoadingPatch {
            queue_entry_id: Some(env.q2.id.clone()),
            notes: Some("换车".to_string()),
            ..Default::default()
        },
    ];
    for patch in patches {
        let err = env
            .loading_api
            .update(&director(), &loading.id, patch)
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::ImmutableField { .. }));
    }

    let stored = env.loading_api.find(&loading.id).unwrap();
    assert_eq!(stored.shipment_ids, vec!["R1".to_string()]);
    assert_eq!(stored.notes, None);
    assert_eq!(env.shipment_status("R3"), ShipmentStatus::Pending);
    assert_eq!(env.queue_status(&env.q2.id), QueueStatus::Waiting);

    // 与原值相同视为未修改
    let same = LoadingPatch {
        origin_branch_id: Some("A".to_string()),
        destination_branch_id: Some("B".to_string()),
        queue_entry_id: Some(env.q1.id.clone()),
        notes: Some("同值".to_string()),
        ..Default::default()
    };
    let updated = env.loading_api.update(&director(), &loading.id, same).await.unwrap();
    assert_eq!(updated.notes.as_deref(), Some("同值"));
}

// ==========================================
// 示例场景
// ==========================================

#[test]
fn test_场景1_可装运单按线路筛选() {
    let env = DispatchTestEnv::new().expect("无法创建测试环境");
    let ids: Vec<String> = env
        .shipment_api
        .eligible_for("A", "C")
        .unwrap()
        .into_iter()
        .map(|r| r.id)
        .collect();
    assert_eq!(ids, vec!["R2".to_string()]);
}

#[tokio::test]
async fn test_场景2_出发网点改为C() {
    let env = DispatchTestEnv::new().expect("无法创建测试环境");
    let mut draft = env.loading_api.new_draft().await.unwrap();
    draft.set_origin_branch("A").unwrap();
    draft.set_destination_branch("B").unwrap();
    env.loading_api.toggle_shipment(&mut draft, "R1");

    draft.set_origin_branch("C").unwrap();
    assert!(draft.selection().is_empty());
}

#[tokio::test]
async fn test_场景3与4_先装车后发车() {
    let env = DispatchTestEnv::new().expect("无法创建测试环境");

    let mut input = env.valid_input(&["R1"]);
    input.departure_time = Some(String::new());
    let loading = env.loading_api.create(&staff_admin_a(), input).await.unwrap();
    assert_eq!(loading.status, LoadingStatus::Muat);

    let updated = env
        .loading_api
        .update(
            &staff_admin_a(),
            &loading.id,
            LoadingPatch {
                departure_time: Some("2024-05-01T08:00".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.status, LoadingStatus::Berangkat);
    assert_eq!(
        updated.departure_time.map(|t| t.format("%Y-%m-%d %H:%M").to_string()),
        Some("2024-05-01 08:00".to_string())
    );
}

#[test]
fn test_场景5_全选与取消全选() {
    let eligible = set(&["R1", "R2"]);
    let all = select_all_eligible(&eligible, &BTreeSet::new());
    assert_eq!(all, eligible);
    assert!(select_all_eligible(&eligible, &all).is_empty());
}

#[tokio::test]
async fn test_场景6_空运单创建失败() {
    let env = DispatchTestEnv::new().expect("无法创建测试环境");
    let err = env
        .loading_api
        .create(&staff_admin_a(), env.valid_input(&[]))
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::Validation { .. }));
    assert_eq!(env.queue_status(&env.q1.id), QueueStatus::Waiting);
    assert_eq!(env.loading_count(), 0);
}
