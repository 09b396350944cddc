// ==========================================
// 废弃物影响追踪系统 - API 层
// ==========================================
// 依据: 后端 REST 接口约定与统一错误口径
// ==========================================

pub mod client;
pub mod error;

pub use client::{
    ActivitySummary, CommunityStats, ImpactApiClient, ImpactCalculationResponse,
    LeaderboardEntry, LeaderboardPayload, RecentImpact, RegisterPayload, UserProfile,
};
pub use error::{ApiError, ApiResult};
