// ==========================================
// 废弃物影响追踪系统 - API 层错误类型
// ==========================================
// 依据: 统一错误口径 (数据/模型/校验/传输)
// 职责: 统一错误口径, 转换下层技术错误为用户可见消息
// 红线: 所有异步边界捕获并转换, 进程内无致命错误
// 红线: LookupMiss 表现为 Option::None, 不进入错误枚举
// ==========================================

use crate::classifier::model::ClassifierError;
use crate::dataset::DatasetError;
use crate::repository::error::RepositoryError;
use thiserror::Error;

/// API 层错误类型
#[derive(Error, Debug)]
pub enum ApiError {
    // ==========================================
    // 参考数据错误（阻断依赖计算）
    // ==========================================
    #[error("参考数据不可用: {0}")]
    DataUnavailable(String),

    // ==========================================
    // 模型错误（降级, 非阻断）
    // ==========================================
    #[error("分类模型不可用: {0}")]
    ModelUnavailable(String),

    // ==========================================
    // 校验错误（阻断下一步操作, 不抛出）
    // ==========================================
    #[error("{0}")]
    ValidationError(String),

    #[error("Please sign in to log this item.")]
    AuthenticationRequired,

    #[error("分类请求进行中, 请稍候")]
    Busy,

    // ==========================================
    // 传输错误（本地状态不变, 无自动重试）
    // ==========================================
    #[error("{0}")]
    TransportError(String),

    // ==========================================
    // 通用错误
    // ==========================================
    #[error("内部错误: {0}")]
    InternalError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ApiError {
    /// 用户可见消息（边界统一口径）
    pub fn user_message(&self) -> String {
        self.to_string()
    }
}

// ==========================================
// 下层错误转换
// ==========================================

impl From<DatasetError> for ApiError {
    fn from(err: DatasetError) -> Self {
        ApiError::DataUnavailable(err.to_string())
    }
}

impl From<ClassifierError> for ApiError {
    fn from(err: ClassifierError) -> Self {
        ApiError::ModelUnavailable(err.to_string())
    }
}

impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::ValidationError(msg) => ApiError::ValidationError(msg),
            RepositoryError::Other(e) => ApiError::Other(e),
            other => ApiError::InternalError(other.to_string()),
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        ApiError::TransportError(err.to_string())
    }
}

/// Result 类型别名
pub type ApiResult<T> = Result<T, ApiError>;
