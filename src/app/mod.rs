// ==========================================
// 废弃物影响追踪系统 - 应用层
// ==========================================
// 职责: 应用状态组装与共享
// ==========================================

pub mod state;

pub use state::AppState;
