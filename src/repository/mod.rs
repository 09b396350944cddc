// ==========================================
// 废弃物影响追踪系统 - 数据仓储层
// ==========================================
// 红线: Repository 不含业务逻辑, 只负责数据访问
// ==========================================

pub mod error;
pub mod log_cache_repo;

pub use error::{RepositoryError, RepositoryResult};
pub use log_cache_repo::LogCacheRepository;
