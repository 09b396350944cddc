// ==========================================
// 废弃物影响追踪系统 - 分类层
// ==========================================
// 依据: 混合分类流程约定
// ==========================================

pub mod labels;
pub mod model;
pub mod orchestrator;
pub mod service;

pub use model::{
    ClassifierError, ClassifierResult, ImageClassifier, ModelConfig, ModelLoader, Normalization,
    Prediction, PreprocessedImage,
};
pub use orchestrator::{ClassificationOrchestrator, ClassificationOutcome};
pub use service::ClassifierService;
