// ==========================================
// 废弃物影响追踪系统 - 核心库
// ==========================================
// 技术栈: Rust + SQLite + REST
// 系统定位: 废弃物处置记录与环境影响量化（本地优先, 远端同步）
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 本地缓存
pub mod repository;

// 引擎层 - 影响计算与标签映射
pub mod engine;

// 分类层 - 模型服务与编排
pub mod classifier;

// 参考数据集 - EPA WARM 因子等
pub mod dataset;

// 配置层 - 应用配置
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一）
pub mod db;

// 日志系统
pub mod logging;

// API 层 - 远端客户端与错误口径
pub mod api;

// 应用层 - 状态组装
pub mod app;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{ClassificationSource, DisposalMethod, ModelStatus};

// 领域实体
pub use domain::{ClassifiedMaterial, LocalMetrics, LogEntry, MaterialOption};

// 引擎
pub use engine::{ImpactCalculator, ImpactLevel, ImpactResult, LabelMapper};

// 分类
pub use classifier::{ClassificationOrchestrator, ClassificationOutcome, ClassifierService};

// 数据集
pub use dataset::ReferenceDataset;

// API
pub use api::{ApiError, ApiResult, ImpactApiClient};

// 应用
pub use app::AppState;

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "Track My Impact";
