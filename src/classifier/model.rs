// ==========================================
// 废弃物影响追踪系统 - 模型接口与预处理
// ==========================================
// 依据: 训练管线导出的模型配置 (输入尺寸/归一化/类别数)
// 职责: 推理后端接口（注入式）+ 图像预处理 + 模型配置
// 红线: crate 不绑定具体 NN 运行时, 推理实现由调用方提供
// ==========================================

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;

/// 默认模型输入边长（像素）
pub const DEFAULT_INPUT_SIZE: u32 = 224;
/// 训练脚本输出的类别数（标签文件不一致时以标签为准）
pub const DEFAULT_NUM_CLASSES: usize = 31;

// ==========================================
// ClassifierError - 分类层错误类型
// ==========================================
#[derive(Error, Debug)]
pub enum ClassifierError {
    #[error("模型不可用: {0}")]
    ModelUnavailable(String),

    #[error("模型加载失败: {0}")]
    LoadError(String),

    #[error("推理失败: {0}")]
    InferenceError(String),

    #[error("标签文件格式不支持: {0}")]
    LabelFormat(String),

    #[error("标签文件读取失败: {path}: {source}")]
    LabelUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("图像预处理失败: {0}")]
    PreprocessError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result 类型别名
pub type ClassifierResult<T> = Result<T, ClassifierError>;

// ==========================================
// Normalization - 像素归一化模式
// ==========================================
// 与训练配置对齐: "0_1" → [0,1], "-1_1" → [-1,1]（MobileNetV2 口径）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Normalization {
    #[serde(rename = "0_1")]
    ZeroToOne,
    #[serde(rename = "-1_1")]
    MinusOneToOne,
}

impl Normalization {
    /// 由配置字符串解析, 未知值落回 [0,1]
    pub fn from_str_or_default(s: &str) -> Self {
        match s {
            "-1_1" => Normalization::MinusOneToOne,
            _ => Normalization::ZeroToOne,
        }
    }

    /// 单字节像素值归一化
    pub fn apply(&self, byte: u8) -> f32 {
        match self {
            Normalization::ZeroToOne => byte as f32 / 255.0,
            Normalization::MinusOneToOne => byte as f32 / 127.5 - 1.0,
        }
    }
}

impl Default for Normalization {
    fn default() -> Self {
        Normalization::ZeroToOne
    }
}

// ==========================================
// ModelConfig - 模型配置
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    pub input_size: u32,           // 输入边长（默认 224）
    pub num_classes: usize,        // 期望类别数（标签为准）
    pub model_path: PathBuf,       // 模型 artifact 路径
    pub labels_path: PathBuf,      // 标签文件路径
    pub normalization: Normalization,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            input_size: DEFAULT_INPUT_SIZE,
            num_classes: DEFAULT_NUM_CLASSES,
            model_path: PathBuf::from("data/model/model.json"),
            labels_path: PathBuf::from("data/labels.json"),
            normalization: Normalization::default(),
        }
    }
}

// ==========================================
// PreprocessedImage - 预处理后的输入张量
// ==========================================
/// 固定尺寸 RGB 图像, 已按配置归一化, 行主序 [H, W, 3]
#[derive(Debug, Clone)]
pub struct PreprocessedImage {
    pub pixels: Vec<f32>,
    pub size: u32,
}

/// 将 RGB8 缓冲预处理为模型输入
///
/// # 参数
/// - rgb: 行主序 RGB8 缓冲, 长度必须为 input_size² × 3
///   （图像解码与缩放由调用方完成）
///
/// # 返回
/// - Err(PreprocessError): 缓冲长度与配置不符
pub fn preprocess_rgb(rgb: &[u8], config: &ModelConfig) -> ClassifierResult<PreprocessedImage> {
    let expected = (config.input_size as usize).pow(2) * 3;
    if rgb.len() != expected {
        return Err(ClassifierError::PreprocessError(format!(
            "RGB 缓冲长度 {} 与期望 {} ({}x{}x3) 不符",
            rgb.len(),
            expected,
            config.input_size,
            config.input_size
        )));
    }
    let pixels = rgb.iter().map(|&b| config.normalization.apply(b)).collect();
    Ok(PreprocessedImage {
        pixels,
        size: config.input_size,
    })
}

// ==========================================
// Prediction - 单条预测
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub label: String,
    pub confidence: f64,
}

// ==========================================
// ImageClassifier Trait - 推理后端接口
// ==========================================
// 实现者: 调用方注入的 NN 运行时适配器（测试中为脚本化模拟）
#[async_trait]
pub trait ImageClassifier: Send + Sync {
    /// 对预处理后的图像推理
    ///
    /// # 返回
    /// - Ok(Vec<f32>): 各类别得分, 长度与标签表一致, 按标签序
    /// - Err: 推理失败（编排器捕获后降级）
    async fn predict(&self, image: &PreprocessedImage) -> ClassifierResult<Vec<f32>>;
}

// ==========================================
// ModelLoader Trait - 模型加载接口
// ==========================================
// 用途: 分类服务探测 artifact 并加载推理后端
#[async_trait]
pub trait ModelLoader: Send + Sync {
    /// 探测模型 artifact 是否存在（资源存在性检查, 不加载）
    async fn is_available(&self, config: &ModelConfig) -> bool;

    /// 加载推理后端
    ///
    /// # 返回
    /// - Ok: 已就绪的分类器句柄
    /// - Err(LoadError / ModelUnavailable): 服务降级到猜测模式
    async fn load(&self, config: &ModelConfig) -> ClassifierResult<Arc<dyn ImageClassifier>>;
}

// ==========================================
// ArtifactProbeLoader - 默认加载器
// ==========================================
/// 仅做文件存在性探测的加载器
///
/// 未注册推理后端时 `load` 返回 ModelUnavailable,
/// 编排器据此进入降级猜测模式。生产部署注入真实后端实现。
pub struct ArtifactProbeLoader;

#[async_trait]
impl ModelLoader for ArtifactProbeLoader {
    async fn is_available(&self, config: &ModelConfig) -> bool {
        tokio::fs::try_exists(&config.model_path)
            .await
            .unwrap_or(false)
    }

    async fn load(&self, config: &ModelConfig) -> ClassifierResult<Arc<dyn ImageClassifier>> {
        Err(ClassifierError::ModelUnavailable(format!(
            "未注册推理后端 (model_path={})",
            config.model_path.display()
        )))
    }
}
