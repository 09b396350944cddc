// ==========================================
// 废弃物影响追踪系统 - 应用配置
// ==========================================
// 依据: 运行配置约定 - 文件与环境变量双来源
// 来源优先级: 内置默认值 < JSON 配置文件 < 环境变量
// ==========================================

use crate::api::client::DEFAULT_API_BASE;
use crate::classifier::model::{ModelConfig, Normalization};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// 配置层错误类型
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("配置文件读取失败: {path}: {source}")]
    FileUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("配置文件解析失败: {path}: {source}")]
    ParseError {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Result 类型别名
pub type ConfigResult<T> = Result<T, ConfigError>;

// ==========================================
// AppConfig - 应用配置
// ==========================================
/// 应用级配置
///
/// 所有字段都有可运行的默认值; JSON 文件可覆盖任意子集,
/// 环境变量优先级最高（便于调试/测试/CI）。
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// 后端 API 基地址
    pub api_base_url: String,
    /// 参考数据目录（warm-factors.json 等四份 JSON）
    pub data_dir: PathBuf,
    /// 本地日志缓存数据库路径
    pub cache_db_path: String,
    /// 分类模型配置
    pub model: ModelConfig,
    /// 降级猜测随机种子（None = 系统熵）
    pub fallback_rng_seed: Option<u64>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE.to_string(),
            data_dir: PathBuf::from("data"),
            cache_db_path: default_cache_db_path(),
            model: ModelConfig::default(),
            fallback_rng_seed: None,
        }
    }
}

impl AppConfig {
    /// 加载配置: 默认值 → JSON 文件（存在时）→ 环境变量
    ///
    /// # 参数
    /// - config_path: JSON 配置文件路径; 文件不存在时静默使用默认值
    pub fn load(config_path: &Path) -> ConfigResult<Self> {
        let mut config = if config_path.exists() {
            let raw = std::fs::read_to_string(config_path).map_err(|e| {
                ConfigError::FileUnavailable {
                    path: config_path.to_path_buf(),
                    source: e,
                }
            })?;
            serde_json::from_str(&raw).map_err(|e| ConfigError::ParseError {
                path: config_path.to_path_buf(),
                source: e,
            })?
        } else {
            Self::default()
        };
        config.apply_env_overrides();
        Ok(config)
    }

    /// 应用环境变量覆盖
    ///
    /// # 环境变量
    /// - TMI_API_BASE_URL: 后端基地址
    /// - TMI_DATA_DIR: 参考数据目录
    /// - TMI_CACHE_DB: 缓存数据库路径
    /// - TMI_MODEL_INPUT: 模型输入边长（非法值忽略）
    /// - TMI_MODEL_NORM: 归一化模式 "0_1" / "-1_1"
    pub fn apply_env_overrides(&mut self) {
        if let Some(v) = env_non_empty("TMI_API_BASE_URL") {
            self.api_base_url = v;
        }
        if let Some(v) = env_non_empty("TMI_DATA_DIR") {
            self.data_dir = PathBuf::from(v);
        }
        if let Some(v) = env_non_empty("TMI_CACHE_DB") {
            self.cache_db_path = v;
        }
        if let Some(v) = env_non_empty("TMI_MODEL_INPUT") {
            match v.parse::<u32>() {
                Ok(size) if size > 0 => self.model.input_size = size,
                _ => tracing::warn!(value = %v, "TMI_MODEL_INPUT 非法, 保留原值"),
            }
        }
        if let Some(v) = env_non_empty("TMI_MODEL_NORM") {
            self.model.normalization = Normalization::from_str_or_default(&v);
        }
    }
}

fn env_non_empty(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

// ==========================================
// 默认缓存数据库路径
// ==========================================

/// 获取默认缓存数据库路径
///
/// # 返回
/// - 开发环境: 用户数据目录/track-my-impact-dev/impact_cache.db
/// - 生产环境: 用户数据目录/track-my-impact/impact_cache.db
/// - 数据目录不可得时回退到 ./impact_cache.db
pub fn default_cache_db_path() -> String {
    let mut path = PathBuf::from("./impact_cache.db");

    if let Some(data_dir) = dirs::data_dir() {
        #[cfg(debug_assertions)]
        {
            path = data_dir.join("track-my-impact-dev");
        }

        #[cfg(not(debug_assertions))]
        {
            path = data_dir.join("track-my-impact");
        }

        // 确保目录存在
        std::fs::create_dir_all(&path).ok();
        path = path.join("impact_cache.db");
    }

    path.to_string_lossy().to_string()
}
