// ==========================================
// 废弃物影响追踪系统 - 领域层
// ==========================================
// 依据: 业务实体口径
// ==========================================

pub mod log_entry;
pub mod material;
pub mod reference;
pub mod types;

pub use log_entry::{LocalMetrics, LogEntry};
pub use material::{ClassifiedMaterial, MaterialOption};
pub use reference::{DomesticMaterial, EquivalencyFactor, MaterialMetadata, WarmFactor};
pub use types::{ClassificationSource, DisposalMethod, ModelStatus};
