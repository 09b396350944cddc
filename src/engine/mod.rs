// ==========================================
// 废弃物影响追踪系统 - 引擎层
// ==========================================
// 依据: EPA WARM v15.2 - 影响计算口径
// 红线: 无状态引擎, 全部纯函数
// ==========================================

pub mod impact_calculator;
pub mod impact_level;
pub mod label_mapper;

pub use impact_calculator::{ImpactCalculator, ImpactEquivalencies, ImpactResult, ManualPreview};
pub use impact_level::ImpactLevel;
pub use label_mapper::LabelMapper;

/// 置信度警告阈值: confidence < 0.7 触发非阻塞 "uncertain classification" 警告
pub const CONFIDENCE_WARN_THRESHOLD: f64 = 0.7;

/// 降级猜测的固定置信度
pub const FALLBACK_CONFIDENCE: f64 = 0.65;

/// 单位换算: 1 MMBtu = 293.071 kWh
pub const MMBTU_TO_KWH: f64 = 293.071;
