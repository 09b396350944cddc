// ==========================================
// 废弃物影响追踪系统 - 混合分类编排器
// ==========================================
// 依据: 混合分类流程约定 (本地推理优先, 降级可观测)
// 状态机: Idle → ModelCheck → {LocalInference | FallbackGuess}
//        → Mapped → (选择处置方法) → Logging → {Logged | Error}
// 红线: 记录门禁 = 处置方法已选 + 重量有效 + 已认证; 置信度不参与门禁
// 红线: 远端失败时本地状态不变（无半写）
// 红线: 进行中的分类请求未完成时拒绝第二次 classify（Busy）
// ==========================================

use crate::api::client::ImpactApiClient;
use crate::api::error::{ApiError, ApiResult};
use crate::classifier::service::ClassifierService;
use crate::dataset::ReferenceDataset;
use crate::domain::log_entry::LogEntry;
use crate::domain::material::ClassifiedMaterial;
use crate::domain::types::{ClassificationSource, DisposalMethod, ModelStatus};
use crate::engine::{ImpactCalculator, LabelMapper};
use crate::repository::log_cache_repo::LogCacheRepository;
use chrono::Utc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use uuid::Uuid;

// ==========================================
// ClassificationOutcome - 单次分类结果
// ==========================================
#[derive(Debug, Clone)]
pub struct ClassificationOutcome {
    pub material: ClassifiedMaterial,
    pub model_status: ModelStatus,        // 状态消息来源（降级模式可区分）
    pub uncertain: bool,                  // confidence < 0.7 → 非阻塞警告
    pub suggested_weight_grams: i64,      // 表单预填重量
}

/// in-flight 防抖守卫（Drop 时复位）
struct InFlightGuard<'a>(&'a AtomicBool);

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

// ==========================================
// ClassificationOrchestrator - 分类编排器
// ==========================================
/// 单次分类尝试的决策过程
///
/// 本地推理优先, 模型不可用时降级为伪随机猜测;
/// 记录经远端 API 确认后才落入本地缓存。
pub struct ClassificationOrchestrator {
    dataset: Arc<ReferenceDataset>,
    service: Arc<ClassifierService>,
    mapper: LabelMapper,
    calculator: ImpactCalculator,
    api: Arc<ImpactApiClient>,
    cache: Arc<LogCacheRepository>,
    in_flight: AtomicBool,
}

impl ClassificationOrchestrator {
    /// 创建编排器
    pub fn new(
        dataset: Arc<ReferenceDataset>,
        service: Arc<ClassifierService>,
        api: Arc<ImpactApiClient>,
        cache: Arc<LogCacheRepository>,
    ) -> Self {
        let mapper = LabelMapper::new(dataset.cnn_mappings.clone());
        Self {
            dataset,
            service,
            mapper,
            calculator: ImpactCalculator::new(),
            api,
            cache,
            in_flight: AtomicBool::new(false),
        }
    }

    /// 当前模型状态消息
    pub fn model_status(&self) -> ModelStatus {
        self.service.status()
    }

    /// 对图像执行一次分类尝试
    ///
    /// # 参数
    /// - rgb: 行主序 RGB8 缓冲（已缩放到模型输入尺寸）
    ///
    /// # 流程
    /// 1. in-flight 防抖（进行中 → Busy）
    /// 2. ModelCheck + LocalInference（模型错误一律捕获, 不外泄）
    /// 3. 失败 → FallbackGuess（已知标签集 + 固定置信度 0.65）
    /// 4. Mapped（显式查表, 未知标签回退并记录）
    pub async fn classify(&self, rgb: &[u8]) -> ApiResult<ClassificationOutcome> {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(ApiError::Busy);
        }
        let _guard = InFlightGuard(&self.in_flight);

        let (label, confidence, source) = match self.service.classify(rgb).await {
            Ok(predictions) => match predictions.into_iter().next() {
                Some(top) => (top.label, top.confidence, ClassificationSource::LocalModel),
                None => self.fallback_prediction()?,
            },
            Err(e) => {
                // 模型失败静默降级, 不阻断功能
                tracing::warn!(error = %e, "本地推理不可用, 进入降级猜测模式");
                self.fallback_prediction()?
            }
        };

        let material = self.mapper.map(&label, confidence, source);
        let uncertain = material.is_uncertain();
        let suggested_weight_grams = material.default_weight_grams();

        Ok(ClassificationOutcome {
            material,
            model_status: self.service.status(),
            uncertain,
            suggested_weight_grams,
        })
    }

    /// 降级猜测（已知标签集为空时才视为错误）
    fn fallback_prediction(&self) -> ApiResult<(String, f64, ClassificationSource)> {
        let known = self.dataset.known_labels();
        let guess = self.service.fallback_guess(&known)?;
        Ok((guess.label, guess.confidence, ClassificationSource::FallbackGuess))
    }

    /// 记录分类结果的处置事件
    ///
    /// # 门禁（硬前置条件, 不满足 → 校验消息 + 零网络调用）
    /// 1. 已有分类结果
    /// 2. 已选处置方法
    /// 3. 已认证（user_key 存在）
    /// 4. 重量有限且 > 0
    ///
    /// # 失败语义
    /// 远端调用失败 → 透传错误消息, 本地缓存不变。
    pub async fn log_impact(
        &self,
        user_key: Option<&str>,
        material: Option<&ClassifiedMaterial>,
        method: Option<DisposalMethod>,
        weight_grams: i64,
    ) -> ApiResult<LogEntry> {
        let material = material.ok_or_else(|| {
            ApiError::ValidationError("Classify an item before logging the impact.".to_string())
        })?;
        let method = method.ok_or_else(|| {
            ApiError::ValidationError("Select a disposal method to continue.".to_string())
        })?;
        let user_key = user_key.ok_or(ApiError::AuthenticationRequired)?;
        if weight_grams <= 0 {
            return Err(ApiError::ValidationError(
                "Enter a valid weight in grams.".to_string(),
            ));
        }

        let response = self
            .api
            .calculate_impact(&material.impact_material, method, weight_grams)
            .await?;

        let entry = LogEntry {
            id: Uuid::new_v4().to_string(),
            material_id: Some(material.material_id.clone()),
            impact_material: Some(material.impact_material.clone()),
            friendly_name: material.friendly_name.clone(),
            category: Some(material.category.clone()),
            method,
            weight_grams,
            confidence: Some(material.confidence),
            impact_value: response.impact_value,
            nudge_text: response.nudge_text,
            water_savings: None,
            energy_savings: None,
            timestamp: response.created_at,
        };

        self.cache.append(user_key, &entry)?;
        tracing::info!(
            material = %entry.friendly_name,
            method = %method,
            impact_value = entry.impact_value,
            "处置事件已记录"
        );
        Ok(entry)
    }

    /// 记录手工选择的处置事件（无图像路径）
    ///
    /// 本地 WARM 计算为基线（无参考行时启发式预览）;
    /// 远端确认成功则以服务端 impact_value/nudge_text 为准,
    /// 远端失败时保留本地基线照常落缓存（离线容忍, 与分类路径不同）。
    pub async fn log_manual(
        &self,
        user_key: Option<&str>,
        category_name: &str,
        method: Option<DisposalMethod>,
        weight_kg: f64,
    ) -> ApiResult<LogEntry> {
        let user_key = user_key.ok_or(ApiError::AuthenticationRequired)?;
        let method = method.ok_or_else(|| {
            ApiError::ValidationError("Select a disposal method to continue.".to_string())
        })?;
        if !weight_kg.is_finite() || weight_kg <= 0.0 {
            return Err(ApiError::ValidationError(
                "Enter a valid weight in kilograms.".to_string(),
            ));
        }

        // 本地基线: WARM 行命中 → 带符号 delta; 未命中 → 启发式预览
        let (mut impact_value, water_savings, energy_savings) = match self
            .calculator
            .calculate(category_name, method, weight_kg, &self.dataset)
        {
            Some(result) => (result.co2_delta, result.water_saved, result.energy_saved),
            None => match self.calculator.manual_preview(method, weight_kg) {
                Some(p) => (p.co2_delta, p.water_savings, p.energy_savings),
                // weight 已在上方校验, 此分支不会触发
                None => (0.0, 0.0, 0.0),
            },
        };
        let mut nudge_text = self.calculator.default_nudge_text(method).to_string();

        let impact_material = self.calculator.impact_material_key(category_name);
        let weight_grams = (weight_kg * 1000.0).round() as i64;

        match self
            .api
            .calculate_impact(impact_material, method, weight_grams)
            .await
        {
            Ok(response) => {
                impact_value = response.impact_value;
                nudge_text = response.nudge_text;
            }
            Err(ApiError::AuthenticationRequired) => return Err(ApiError::AuthenticationRequired),
            Err(e) => {
                tracing::warn!(error = %e, "远端记录失败, 保留本地基线");
            }
        }

        let entry = LogEntry {
            id: Uuid::new_v4().to_string(),
            material_id: None,
            impact_material: Some(impact_material.to_string()),
            friendly_name: category_name.to_string(),
            category: None,
            method,
            weight_grams,
            confidence: None,
            impact_value,
            nudge_text,
            water_savings: Some(water_savings),
            energy_savings: Some(energy_savings),
            timestamp: Utc::now(),
        };

        self.cache.append(user_key, &entry)?;
        Ok(entry)
    }
}
