// ==========================================
// 分类编排器 端到端测试
// ==========================================
// 职责: 验证模型路径/降级路径、记录门禁与失败语义
// 说明: 后端地址指向不可达端口, 验证传输失败时本地缓存不变
// ==========================================


use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Notify;
use track_my_impact::api::error::ApiError;
use track_my_impact::app::AppState;
use track_my_impact::classifier::model::{
    ClassifierResult, ImageClassifier, ModelConfig, ModelLoader, Normalization, PreprocessedImage,
};
use track_my_impact::config::AppConfig;
use track_my_impact::domain::types::{ClassificationSource, DisposalMethod, ModelStatus};
use track_my_impact::logging;

// ==========================================
// 测试辅助: 模拟推理后端
// ==========================================

/// 固定得分后端
struct ScriptedClassifier {
    scores: Vec<f32>,
}

#[async_trait]
impl ImageClassifier for ScriptedClassifier {
    async fn predict(&self, _image: &PreprocessedImage) -> ClassifierResult<Vec<f32>> {
        Ok(self.scores.clone())
    }
}

/// 阻塞后端: predict 等待通知后才返回（用于 in-flight 防抖验证）
struct BlockingClassifier {
    release: Arc<Notify>,
    scores: Vec<f32>,
}

#[async_trait]
impl ImageClassifier for BlockingClassifier {
    async fn predict(&self, _image: &PreprocessedImage) -> ClassifierResult<Vec<f32>> {
        self.release.notified().await;
        Ok(self.scores.clone())
    }
}

struct ScriptedLoader {
    available: bool,
    classifier: Option<Arc<dyn ImageClassifier>>,
}

#[async_trait]
impl ModelLoader for ScriptedLoader {
    async fn is_available(&self, _config: &ModelConfig) -> bool {
        self.available
    }

    async fn load(&self, _config: &ModelConfig) -> ClassifierResult<Arc<dyn ImageClassifier>> {
        match &self.classifier {
            Some(c) => Ok(c.clone()),
            None => Err(track_my_impact::classifier::ClassifierError::LoadError(
                "no backend".to_string(),
            )),
        }
    }
}

/// 构造测试 AppState
///
/// - 参考数据/标签文件写入临时目录
/// - 缓存数据库为临时文件
/// - 后端基地址指向不可达端口（任何网络调用快速失败）
fn build_state(
    loader: Arc<dyn ModelLoader>,
) -> (tempfile::TempDir, tempfile::NamedTempFile, AppState) {
    logging::init_test();
    let data_dir = test_helpers::create_test_data_dir().unwrap();
    let labels_path = data_dir.path().join("labels.json");
    std::fs::write(
        &labels_path,
        r#"["metal_aluminium_food_cans", "plastic_plastic_water_bottles"]"#,
    )
    .unwrap();

    let (db_file, db_path) = test_helpers::create_test_db().unwrap();

    let config = AppConfig {
        api_base_url: "http://127.0.0.1:1".to_string(),
        data_dir: data_dir.path().to_path_buf(),
        cache_db_path: db_path,
        model: ModelConfig {
            input_size: 2,
            num_classes: 2,
            model_path: PathBuf::from("unused/model.json"),
            labels_path,
            normalization: Normalization::default(),
        },
        fallback_rng_seed: Some(42),
    };

    let state = AppState::with_loader(config, loader).unwrap();
    (data_dir, db_file, state)
}

fn ready_loader(scores: Vec<f32>) -> Arc<dyn ModelLoader> {
    Arc::new(ScriptedLoader {
        available: true,
        classifier: Some(Arc::new(ScriptedClassifier { scores })),
    })
}

fn missing_loader() -> Arc<dyn ModelLoader> {
    Arc::new(ScriptedLoader {
        available: false,
        classifier: None,
    })
}

const RGB: [u8; 12] = [128u8; 12]; // 2x2x3

// ==========================================
// 分类路径
// ==========================================

#[tokio::test]
async fn test_classify_with_model() {
    let (_dir, _db, state) = build_state(ready_loader(vec![0.9, 0.1]));

    let outcome = state.orchestrator.classify(&RGB).await.unwrap();
    assert_eq!(outcome.material.material_id, "metal_aluminium_food_cans");
    assert_eq!(outcome.material.friendly_name, "Aluminium Food Can");
    assert_eq!(outcome.material.source, ClassificationSource::LocalModel);
    assert!(!outcome.uncertain);
    assert_eq!(outcome.suggested_weight_grams, 50);
    assert_eq!(outcome.model_status, ModelStatus::Ready);
}

#[tokio::test]
async fn test_classify_degrades_to_fallback_guess() {
    let (_dir, _db, state) = build_state(missing_loader());

    let outcome = state.orchestrator.classify(&RGB).await.unwrap();
    assert_eq!(outcome.material.source, ClassificationSource::FallbackGuess);
    // 固定降级置信度, 低于警告阈值
    assert_eq!(outcome.material.confidence, 0.65);
    assert!(outcome.uncertain);
    // 猜测来自已知标签集
    assert!(state
        .dataset
        .known_labels()
        .contains(&outcome.material.material_id));
    assert_eq!(outcome.model_status, ModelStatus::Unavailable);
}

#[tokio::test]
async fn test_low_confidence_flags_uncertain() {
    let (_dir, _db, state) = build_state(ready_loader(vec![0.6, 0.4]));

    let outcome = state.orchestrator.classify(&RGB).await.unwrap();
    assert_eq!(outcome.material.source, ClassificationSource::LocalModel);
    assert!(outcome.uncertain);
}

#[tokio::test]
async fn test_second_classify_while_in_flight_is_busy() {
    let release = Arc::new(Notify::new());
    let loader: Arc<dyn ModelLoader> = Arc::new(ScriptedLoader {
        available: true,
        classifier: Some(Arc::new(BlockingClassifier {
            release: release.clone(),
            scores: vec![0.9, 0.1],
        })),
    });
    let (_dir, _db, state) = build_state(loader);
    let orchestrator = state.orchestrator.clone();

    let first = tokio::spawn(async move { orchestrator.classify(&RGB).await });
    // 等第一个请求进入推理阻塞
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;

    let err = state.orchestrator.classify(&RGB).await.unwrap_err();
    assert!(matches!(err, ApiError::Busy));

    release.notify_one();
    assert!(first.await.unwrap().is_ok());

    // 完成后防抖复位（再次放行阻塞后端, 否则最后一次 classify 会卡在 Notify 上）
    release.notify_one();
    assert!(state.orchestrator.classify(&RGB).await.is_ok());
}

// ==========================================
// 记录门禁与失败语义
// ==========================================

#[tokio::test]
async fn test_log_impact_gates() {
    let (_dir, _db, state) = build_state(ready_loader(vec![0.9, 0.1]));
    let outcome = state.orchestrator.classify(&RGB).await.unwrap();
    let material = outcome.material;

    // 无分类结果
    let err = state
        .orchestrator
        .log_impact(Some("user-a"), None, Some(DisposalMethod::Recycled), 50)
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::ValidationError(_)));

    // 未选处置方法
    let err = state
        .orchestrator
        .log_impact(Some("user-a"), Some(&material), None, 50)
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::ValidationError(_)));

    // 未认证 → 固定提示语
    let err = state
        .orchestrator
        .log_impact(None, Some(&material), Some(DisposalMethod::Recycled), 50)
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::AuthenticationRequired));
    assert_eq!(err.user_message(), "Please sign in to log this item.");

    // 非法重量
    let err = state
        .orchestrator
        .log_impact(Some("user-a"), Some(&material), Some(DisposalMethod::Recycled), 0)
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::ValidationError(_)));

    // 全部门禁失败路径都未落任何缓存
    assert_eq!(state.cache.count_all().unwrap(), 0);
}

#[tokio::test]
async fn test_log_impact_transport_failure_leaves_cache_unchanged() {
    let (_dir, _db, state) = build_state(ready_loader(vec![0.9, 0.1]));
    let outcome = state.orchestrator.classify(&RGB).await.unwrap();

    // 已认证但服务端不可达
    state.api.set_token("token".to_string());
    let err = state
        .orchestrator
        .log_impact(
            Some("user-a"),
            Some(&outcome.material),
            Some(DisposalMethod::Recycled),
            50,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::TransportError(_)));
    // 本地状态不变
    assert_eq!(state.cache.count_all().unwrap(), 0);
}

#[tokio::test]
async fn test_log_manual_offline_keeps_local_baseline() {
    let (_dir, _db, state) = build_state(missing_loader());
    state.api.set_token("token".to_string());

    // 服务端不可达 → 本地 WARM 基线照常落缓存
    let entry = state
        .orchestrator
        .log_manual(
            Some("user-a"),
            "Aluminum Cans",
            Some(DisposalMethod::Recycled),
            2.0,
        )
        .await
        .unwrap();

    // -(-9110 × 0.002) = 18.22 kg CO₂e（正 = 避免排放）
    assert!((entry.impact_value - 18.22).abs() < 1e-9);
    assert_eq!(entry.weight_grams, 2000);
    assert_eq!(entry.impact_material.as_deref(), Some("metal"));
    assert_eq!(entry.water_savings.unwrap(), 24.0);
    assert!(!entry.nudge_text.is_empty());

    let logs = state.cache.list("user-a").unwrap();
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0].id, entry.id);
}

#[tokio::test]
async fn test_log_manual_without_warm_row_uses_preview() {
    let (_dir, _db, state) = build_state(missing_loader());
    state.api.set_token("token".to_string());

    let entry = state
        .orchestrator
        .log_manual(
            Some("user-a"),
            "Mystery Material",
            Some(DisposalMethod::Landfilled),
            1.0,
        )
        .await
        .unwrap();

    // 启发式预览: weight × 2.1, 非有益方法为负
    assert!((entry.impact_value + 2.1).abs() < 1e-9);
    assert_eq!(entry.water_savings.unwrap(), 0.0);
}

#[tokio::test]
async fn test_log_manual_requires_auth() {
    let (_dir, _db, state) = build_state(missing_loader());

    let err = state
        .orchestrator
        .log_manual(None, "Glass", Some(DisposalMethod::Recycled), 1.0)
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::AuthenticationRequired));
    assert_eq!(state.cache.count_all().unwrap(), 0);
}
