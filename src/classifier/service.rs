// ==========================================
// 废弃物影响追踪系统 - 分类服务
// ==========================================
// 依据: 混合分类流程约定 - 模型探测/加载合并/降级猜测
// 职责: 模型句柄与标签表的惰性单例管理 + 降级猜测
// 红线: 并发初始化合并为一次加载（显式服务对象, 非模块级全局状态）
// 红线: 加载失败可在下次尝试重试探测; 随机源可注入种子
// ==========================================

use crate::classifier::labels;
use crate::classifier::model::{
    preprocess_rgb, ClassifierError, ClassifierResult, ImageClassifier, ModelConfig, ModelLoader,
    Prediction,
};
use crate::domain::types::ModelStatus;
use crate::engine::FALLBACK_CONFIDENCE;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::sync::{Arc, Mutex};
use tokio::sync::OnceCell;

/// top-k 预测条数
const TOP_K: usize = 3;

// ==========================================
// LoadedModel - 已加载的模型句柄 + 标签表
// ==========================================
#[derive(Clone)]
struct LoadedModel {
    classifier: Arc<dyn ImageClassifier>,
    labels: Arc<Vec<String>>,
}

// ==========================================
// ClassifierService - 分类服务
// ==========================================
/// 会话级分类服务
///
/// 模型句柄与标签表惰性初始化且会话内复用;
/// 并发调用者等待同一 in-flight 加载（OnceCell 合并）,
/// 加载失败时单元保持未初始化, 下次分类尝试重新探测。
pub struct ClassifierService {
    config: ModelConfig,
    loader: Arc<dyn ModelLoader>,
    loaded: OnceCell<LoadedModel>,
    status: Mutex<ModelStatus>,
    rng: Mutex<ChaCha8Rng>,
}

impl ClassifierService {
    /// 创建分类服务
    ///
    /// # 参数
    /// - config: 模型配置
    /// - loader: 模型加载器（注入式）
    /// - rng_seed: 降级猜测随机种子（None = 系统熵; 测试注入固定值）
    pub fn new(config: ModelConfig, loader: Arc<dyn ModelLoader>, rng_seed: Option<u64>) -> Self {
        let rng = match rng_seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };
        Self {
            config,
            loader,
            loaded: OnceCell::new(),
            status: Mutex::new(ModelStatus::Checking),
            rng: Mutex::new(rng),
        }
    }

    /// 当前模型状态（用户可见状态消息来源）
    pub fn status(&self) -> ModelStatus {
        self.status
            .lock()
            .map(|s| *s)
            .unwrap_or(ModelStatus::Unavailable)
    }

    /// 模型是否已就绪（已有句柄则视为可用, 不再探测）
    pub fn is_ready(&self) -> bool {
        self.loaded.initialized()
    }

    fn set_status(&self, status: ModelStatus) {
        if let Ok(mut s) = self.status.lock() {
            *s = status;
        }
    }

    /// 确保模型与标签已加载（合并并发加载）
    async fn ensure_loaded(&self) -> ClassifierResult<LoadedModel> {
        let result = self
            .loaded
            .get_or_try_init(|| async {
                self.set_status(ModelStatus::Checking);
                if !self.loader.is_available(&self.config).await {
                    return Err(ClassifierError::ModelUnavailable(format!(
                        "模型 artifact 不存在: {}",
                        self.config.model_path.display()
                    )));
                }

                self.set_status(ModelStatus::Loading);
                let classifier = self.loader.load(&self.config).await?;
                let labels = labels::load_labels(&self.config.labels_path).await?;
                if labels.is_empty() {
                    return Err(ClassifierError::LabelFormat("标签表为空".to_string()));
                }
                if labels.len() != self.config.num_classes {
                    tracing::warn!(
                        expected = self.config.num_classes,
                        actual = labels.len(),
                        "类别数与标签长度不一致, 以标签长度为准"
                    );
                }

                tracing::info!(labels = labels.len(), "分类模型加载完成");
                Ok(LoadedModel {
                    classifier,
                    labels: Arc::new(labels),
                })
            })
            .await;

        match result {
            Ok(loaded) => {
                self.set_status(ModelStatus::Ready);
                Ok(loaded.clone())
            }
            Err(e) => {
                self.set_status(ModelStatus::Unavailable);
                Err(e)
            }
        }
    }

    /// 本地推理: 预处理 → 推理 → 按置信度降序 top-k
    ///
    /// # 参数
    /// - rgb: 行主序 RGB8 缓冲（已缩放到 input_size）
    ///
    /// # 返回
    /// - Ok(Vec<Prediction>): 非空, 首位为最高置信度
    /// - Err: 模型不可用 / 预处理失败 / 推理失败（编排器据此降级）
    pub async fn classify(&self, rgb: &[u8]) -> ClassifierResult<Vec<Prediction>> {
        let loaded = self.ensure_loaded().await?;
        let image = preprocess_rgb(rgb, &self.config)?;
        let scores = loaded.classifier.predict(&image).await?;

        if scores.len() != loaded.labels.len() {
            return Err(ClassifierError::InferenceError(format!(
                "得分数 {} 与标签数 {} 不一致",
                scores.len(),
                loaded.labels.len()
            )));
        }

        let mut indexed: Vec<(usize, f32)> = scores.iter().copied().enumerate().collect();
        indexed.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));

        Ok(indexed
            .into_iter()
            .take(TOP_K)
            .map(|(idx, score)| Prediction {
                label: loaded.labels[idx].clone(),
                confidence: score as f64,
            })
            .collect())
    }

    /// 降级猜测: 从已知标签集伪随机取一个, 置信度固定 0.65
    ///
    /// 显式降级模式, 调用方必须以状态消息区分（不得伪装成模型结果）。
    pub fn fallback_guess(&self, known_labels: &[String]) -> ClassifierResult<Prediction> {
        if known_labels.is_empty() {
            return Err(ClassifierError::ModelUnavailable(
                "已知标签集为空, 无法降级猜测".to_string(),
            ));
        }
        let idx = self
            .rng
            .lock()
            .map_err(|e| ClassifierError::InferenceError(format!("随机源锁获取失败: {}", e)))?
            .gen_range(0..known_labels.len());
        Ok(Prediction {
            label: known_labels[idx].clone(),
            confidence: FALLBACK_CONFIDENCE,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::model::PreprocessedImage;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// 脚本化后端: 固定得分向量
    struct ScriptedClassifier {
        scores: Vec<f32>,
    }

    #[async_trait]
    impl ImageClassifier for ScriptedClassifier {
        async fn predict(&self, _image: &PreprocessedImage) -> ClassifierResult<Vec<f32>> {
            Ok(self.scores.clone())
        }
    }

    /// 计数加载器: 记录 load 调用次数
    struct CountingLoader {
        available: bool,
        loads: AtomicUsize,
        scores: Vec<f32>,
    }

    #[async_trait]
    impl ModelLoader for CountingLoader {
        async fn is_available(&self, _config: &ModelConfig) -> bool {
            self.available
        }

        async fn load(&self, _config: &ModelConfig) -> ClassifierResult<Arc<dyn ImageClassifier>> {
            self.loads.fetch_add(1, Ordering::SeqCst);
            Ok(Arc::new(ScriptedClassifier {
                scores: self.scores.clone(),
            }))
        }
    }

    fn write_labels(dir: &tempfile::TempDir, labels: &[&str]) -> std::path::PathBuf {
        let path = dir.path().join("labels.json");
        std::fs::write(&path, serde_json::to_string(labels).unwrap()).unwrap();
        path
    }

    fn test_config(labels_path: std::path::PathBuf) -> ModelConfig {
        ModelConfig {
            input_size: 2,
            num_classes: 3,
            model_path: labels_path.clone(), // 探测由 CountingLoader 接管
            labels_path,
            normalization: Normalization::default(),
        }
    }

    use crate::classifier::model::Normalization;

    #[tokio::test]
    async fn test_classify_top_k_order() {
        let dir = tempfile::tempdir().unwrap();
        let labels_path = write_labels(&dir, &["a", "b", "c"]);
        let loader = Arc::new(CountingLoader {
            available: true,
            loads: AtomicUsize::new(0),
            scores: vec![0.1, 0.7, 0.2],
        });
        let service = ClassifierService::new(test_config(labels_path), loader, Some(1));

        let predictions = service.classify(&[0u8; 12]).await.unwrap();
        assert_eq!(predictions[0].label, "b");
        assert!((predictions[0].confidence - 0.7).abs() < 1e-6);
        assert_eq!(predictions[1].label, "c");
        assert_eq!(predictions.len(), 3);
        assert_eq!(service.status(), ModelStatus::Ready);
    }

    #[tokio::test]
    async fn test_concurrent_loads_coalesced() {
        let dir = tempfile::tempdir().unwrap();
        let labels_path = write_labels(&dir, &["a", "b", "c"]);
        let loader = Arc::new(CountingLoader {
            available: true,
            loads: AtomicUsize::new(0),
            scores: vec![0.5, 0.3, 0.2],
        });
        let service = Arc::new(ClassifierService::new(
            test_config(labels_path),
            loader.clone(),
            Some(1),
        ));

        let mut handles = Vec::new();
        for _ in 0..8 {
            let s = service.clone();
            handles.push(tokio::spawn(async move { s.classify(&[0u8; 12]).await }));
        }
        for h in handles {
            assert!(h.await.unwrap().is_ok());
        }
        // 并发初始化合并为一次加载
        assert_eq!(loader.loads.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_unavailable_model_degrades() {
        let dir = tempfile::tempdir().unwrap();
        let labels_path = write_labels(&dir, &["a"]);
        let loader = Arc::new(CountingLoader {
            available: false,
            loads: AtomicUsize::new(0),
            scores: vec![],
        });
        let service = ClassifierService::new(test_config(labels_path), loader, Some(1));

        assert!(service.classify(&[0u8; 12]).await.is_err());
        assert_eq!(service.status(), ModelStatus::Unavailable);
        assert!(!service.is_ready());
    }

    #[tokio::test]
    async fn test_fallback_guess_deterministic_with_seed() {
        let dir = tempfile::tempdir().unwrap();
        let labels_path = write_labels(&dir, &["a"]);
        let known: Vec<String> = vec!["x".into(), "y".into(), "z".into()];

        let make = || {
            ClassifierService::new(
                test_config(labels_path.clone()),
                Arc::new(CountingLoader {
                    available: false,
                    loads: AtomicUsize::new(0),
                    scores: vec![],
                }),
                Some(42),
            )
        };
        let a = make().fallback_guess(&known).unwrap();
        let b = make().fallback_guess(&known).unwrap();
        // 固定种子 → 确定性标签, 且来自已知标签集
        assert_eq!(a.label, b.label);
        assert!(known.contains(&a.label));
        assert_eq!(a.confidence, 0.65);
    }

    #[tokio::test]
    async fn test_fallback_guess_empty_labels() {
        let dir = tempfile::tempdir().unwrap();
        let labels_path = write_labels(&dir, &["a"]);
        let service = ClassifierService::new(
            test_config(labels_path),
            Arc::new(CountingLoader {
                available: false,
                loads: AtomicUsize::new(0),
                scores: vec![],
            }),
            Some(1),
        );
        assert!(service.fallback_guess(&[]).is_err());
    }
}
