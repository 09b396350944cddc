// ==========================================
// 废弃物影响追踪系统 - 应用状态
// ==========================================
// 职责: 管理应用级别的共享状态和服务实例
// 依据: 分层架构约定 (domain/repository/engine/api/app)
// ==========================================

use std::sync::Arc;

use crate::api::client::ImpactApiClient;
use crate::api::error::ApiResult;
use crate::classifier::model::{ArtifactProbeLoader, ModelLoader};
use crate::classifier::orchestrator::ClassificationOrchestrator;
use crate::classifier::service::ClassifierService;
use crate::config::AppConfig;
use crate::dataset::ReferenceDataset;
use crate::domain::log_entry::{LocalMetrics, LogEntry};
use crate::domain::material::MaterialOption;
use crate::engine::ImpactLevel;
use crate::repository::log_cache_repo::LogCacheRepository;

/// 应用状态
///
/// 包含所有服务实例和共享资源
pub struct AppState {
    /// 应用配置
    pub config: AppConfig,

    /// 会话级参考数据集（只读共享）
    pub dataset: Arc<ReferenceDataset>,

    /// 后端 API 客户端
    pub api: Arc<ImpactApiClient>,

    /// 本地日志缓存仓储
    pub cache: Arc<LogCacheRepository>,

    /// 分类服务
    pub classifier: Arc<ClassifierService>,

    /// 分类编排器
    pub orchestrator: Arc<ClassificationOrchestrator>,
}

impl AppState {
    /// 创建新的 AppState 实例（默认加载器, 仅做 artifact 探测）
    ///
    /// # 参数
    /// - config: 应用配置
    ///
    /// # 说明
    /// 该方法会：
    /// 1. 加载参考数据集（任一文件失败即报错, 阻断启动）
    /// 2. 初始化本地缓存仓储（建表幂等）
    /// 3. 创建 API 客户端与分类服务
    /// 4. 组装编排器
    pub fn new(config: AppConfig) -> ApiResult<Self> {
        Self::with_loader(config, Arc::new(ArtifactProbeLoader))
    }

    /// 创建 AppState 并注入推理后端加载器（生产部署 / 测试模拟）
    pub fn with_loader(config: AppConfig, loader: Arc<dyn ModelLoader>) -> ApiResult<Self> {
        tracing::info!(
            data_dir = %config.data_dir.display(),
            cache_db = %config.cache_db_path,
            api_base = %config.api_base_url,
            "初始化 AppState"
        );

        let dataset = Arc::new(ReferenceDataset::load_from_dir(&config.data_dir)?);
        let cache = Arc::new(LogCacheRepository::new(&config.cache_db_path)?);
        let api = Arc::new(ImpactApiClient::new(&config.api_base_url)?);
        let classifier = Arc::new(ClassifierService::new(
            config.model.clone(),
            loader,
            config.fallback_rng_seed,
        ));
        let orchestrator = Arc::new(ClassificationOrchestrator::new(
            dataset.clone(),
            classifier.clone(),
            api.clone(),
            cache.clone(),
        ));

        tracing::info!("AppState 初始化完成");

        Ok(Self {
            config,
            dataset,
            api,
            cache,
            classifier,
            orchestrator,
        })
    }

    /// 从服务端拉取最近记录并合并到本地缓存
    ///
    /// # 参数
    /// - user_key: 用户缓存键
    /// - limit: 最近记录条数上限
    ///
    /// # 返回
    /// - Ok(Vec<LogEntry>): 合并后的本地缓存全量（时间倒序）
    /// - Err: 未认证 / 传输失败（本地缓存不变）
    pub async fn sync_recent(&self, user_key: &str, limit: u32) -> ApiResult<Vec<LogEntry>> {
        let remote = self.api.recent_impacts(limit).await?;
        let entries: Vec<LogEntry> = remote.into_iter().map(|r| r.into_log_entry()).collect();
        let merged = self.cache.merge_remote(user_key, &entries)?;
        tracing::info!(merged, "远端日志已合并到本地缓存");
        Ok(self.cache.list(user_key)?)
    }

    /// 本地缓存汇总指标（离线仪表盘口径）
    pub fn local_metrics(&self, user_key: &str) -> ApiResult<LocalMetrics> {
        Ok(self.cache.local_metrics(user_key)?)
    }

    /// 由累计 CO₂ 求等级（徽章与下一目标）
    pub fn impact_level(&self, total_co2_kg: f64) -> ImpactLevel {
        ImpactLevel::for_total_co2(total_co2_kg)
    }

    /// 手工记录材料下拉选项（WARM 类目派生）
    pub fn material_options(&self) -> Vec<MaterialOption> {
        self.dataset.material_options()
    }
}
