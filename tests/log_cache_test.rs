// ==========================================
// 本地日志缓存仓储 集成测试
// ==========================================
// 职责: 验证追加/列出/合并的持久化语义与用户隔离
// ==========================================


use track_my_impact::domain::types::DisposalMethod;
use track_my_impact::logging;
use track_my_impact::repository::error::RepositoryError;
use track_my_impact::repository::log_cache_repo::LogCacheRepository;

#[test]
fn test_append_and_list_order() {
    logging::init_test();
    let (_tmp, db_path) = test_helpers::create_test_db().unwrap();
    let repo = LogCacheRepository::new(&db_path).unwrap();

    let mut older = test_helpers::create_test_entry("e1", DisposalMethod::Recycled, 0.4);
    older.timestamp = test_helpers::test_timestamp(1);
    let mut newer = test_helpers::create_test_entry("e2", DisposalMethod::Composted, 0.1);
    newer.timestamp = test_helpers::test_timestamp(30);

    repo.append("user-a", &older).unwrap();
    repo.append("user-a", &newer).unwrap();

    let logs = repo.list("user-a").unwrap();
    assert_eq!(logs.len(), 2);
    // 时间倒序
    assert_eq!(logs[0].id, "e2");
    assert_eq!(logs[1].id, "e1");
}

#[test]
fn test_user_isolation() {
    let (_tmp, db_path) = test_helpers::create_test_db().unwrap();
    let repo = LogCacheRepository::new(&db_path).unwrap();

    let entry = test_helpers::create_test_entry("e1", DisposalMethod::Recycled, 0.4);
    repo.append("user-a", &entry).unwrap();

    assert_eq!(repo.list("user-a").unwrap().len(), 1);
    assert!(repo.list("user-b").unwrap().is_empty());
    assert_eq!(repo.count_all().unwrap(), 1);
}

#[test]
fn test_empty_user_key_rejected() {
    let (_tmp, db_path) = test_helpers::create_test_db().unwrap();
    let repo = LogCacheRepository::new(&db_path).unwrap();

    let entry = test_helpers::create_test_entry("e1", DisposalMethod::Recycled, 0.4);
    let err = repo.append("  ", &entry).unwrap_err();
    assert!(matches!(err, RepositoryError::ValidationError(_)));
}

#[test]
fn test_merge_remote_precedence_and_local_fields() {
    let (_tmp, db_path) = test_helpers::create_test_db().unwrap();
    let repo = LogCacheRepository::new(&db_path).unwrap();

    let local = test_helpers::create_test_entry("e1", DisposalMethod::Recycled, 0.4);
    repo.append("user-a", &local).unwrap();

    // 远端镜像: 金额与文案修正, 无本地字段
    let mut remote = test_helpers::create_test_entry("e1", DisposalMethod::Recycled, 0.35);
    remote.material_id = None;
    remote.category = None;
    remote.confidence = None;
    remote.water_savings = None;
    remote.energy_savings = None;
    remote.nudge_text = "server nudge".to_string();
    remote.timestamp = test_helpers::test_timestamp(10);

    let written = repo.merge_remote("user-a", &[remote]).unwrap();
    assert_eq!(written, 1);

    let logs = repo.list("user-a").unwrap();
    assert_eq!(logs.len(), 1);
    // 远端权威字段覆盖
    assert_eq!(logs[0].impact_value, 0.35);
    assert_eq!(logs[0].nudge_text, "server nudge");
    assert_eq!(logs[0].timestamp, test_helpers::test_timestamp(10));
    // 仅本地字段保留
    assert_eq!(logs[0].material_id.as_deref(), Some("metal_aluminium_food_cans"));
    assert_eq!(logs[0].confidence, Some(0.9));
}

#[test]
fn test_merge_remote_idempotent_and_inserts_new() {
    let (_tmp, db_path) = test_helpers::create_test_db().unwrap();
    let repo = LogCacheRepository::new(&db_path).unwrap();

    let mut r2 = test_helpers::create_test_entry("r2", DisposalMethod::Landfilled, -0.1);
    r2.timestamp = test_helpers::test_timestamp(20);
    let remote = vec![
        test_helpers::create_test_entry("r1", DisposalMethod::Recycled, 0.2),
        r2,
    ];

    repo.merge_remote("user-a", &remote).unwrap();
    let first = repo.list("user-a").unwrap();
    assert_eq!(first.len(), 2);

    // 同一远端记录再合并一次, 结果不变
    repo.merge_remote("user-a", &remote).unwrap();
    let second = repo.list("user-a").unwrap();
    assert_eq!(first.len(), second.len());
    for (a, b) in first.iter().zip(second.iter()) {
        assert_eq!(
            serde_json::to_value(a).unwrap(),
            serde_json::to_value(b).unwrap()
        );
    }
}

#[test]
fn test_local_metrics_signed_sum() {
    let (_tmp, db_path) = test_helpers::create_test_db().unwrap();
    let repo = LogCacheRepository::new(&db_path).unwrap();

    repo.append(
        "user-a",
        &test_helpers::create_test_entry("e1", DisposalMethod::Recycled, 0.5),
    )
    .unwrap();
    let mut landfilled = test_helpers::create_test_entry("e2", DisposalMethod::Landfilled, -0.2);
    landfilled.water_savings = None;
    landfilled.energy_savings = None;
    repo.append("user-a", &landfilled).unwrap();

    let metrics = repo.local_metrics("user-a").unwrap();
    assert_eq!(metrics.total_items, 2);
    // 带符号累计: 0.5 + (-0.2)
    assert!((metrics.co2_saved - 0.3).abs() < 1e-9);
    assert!((metrics.recycling_rate - 50.0).abs() < 1e-9);
}

#[test]
fn test_reopen_persists() {
    let (_tmp, db_path) = test_helpers::create_test_db().unwrap();
    {
        let repo = LogCacheRepository::new(&db_path).unwrap();
        repo.append(
            "user-a",
            &test_helpers::create_test_entry("e1", DisposalMethod::Recycled, 0.4),
        )
        .unwrap();
    }
    // 重新打开同一数据库文件
    let repo = LogCacheRepository::new(&db_path).unwrap();
    assert_eq!(repo.list("user-a").unwrap().len(), 1);
}
