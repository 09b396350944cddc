// ==========================================
// 废弃物影响追踪系统 - 参考数据集层
// ==========================================
// 依据: data/ 目录参考数据
// ==========================================

pub mod loader;

pub use loader::{DatasetError, DatasetResult, ReferenceDataset};
