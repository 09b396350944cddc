// ==========================================
// 废弃物影响追踪系统 - 领域类型定义
// ==========================================
// 依据: EPA WARM v15.2 - 处置方法口径
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 处置方法 (Disposal Method)
// ==========================================
// 红线: Incinerated 是合法的用户选项,但无 WARM 参考数据
// 序列化格式: 小写 (与后端 API / 本地缓存一致)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DisposalMethod {
    Recycled,    // 回收
    Composted,   // 堆肥
    Landfilled,  // 填埋
    Incinerated, // 焚烧（无参考数据）
}

impl DisposalMethod {
    /// 由前端方法 id 解析（不区分大小写）
    pub fn from_id(id: &str) -> Option<Self> {
        match id.trim().to_lowercase().as_str() {
            "recycled" => Some(DisposalMethod::Recycled),
            "composted" => Some(DisposalMethod::Composted),
            "landfilled" => Some(DisposalMethod::Landfilled),
            "incinerated" => Some(DisposalMethod::Incinerated),
            _ => None,
        }
    }

    /// 方法 id（后端 API 入参）
    pub fn id(&self) -> &'static str {
        match self {
            DisposalMethod::Recycled => "recycled",
            DisposalMethod::Composted => "composted",
            DisposalMethod::Landfilled => "landfilled",
            DisposalMethod::Incinerated => "incinerated",
        }
    }

    /// 用户展示名
    pub fn display_name(&self) -> &'static str {
        match self {
            DisposalMethod::Recycled => "Recycled",
            DisposalMethod::Composted => "Composted",
            DisposalMethod::Landfilled => "Landfilled",
            DisposalMethod::Incinerated => "Incinerated",
        }
    }

    /// WARM 因子表的 disposal_method 标签
    ///
    /// # 返回
    /// - Some(标签): Recycling / Composting / Landfill
    /// - None: Incinerated 无参考数据（LookupMiss 口径）
    pub fn warm_label(&self) -> Option<&'static str> {
        match self {
            DisposalMethod::Recycled => Some("Recycling"),
            DisposalMethod::Composted => Some("Composting"),
            DisposalMethod::Landfilled => Some("Landfill"),
            DisposalMethod::Incinerated => None,
        }
    }

    /// 是否相对填埋基线有益（用于启发式预览符号）
    pub fn is_beneficial(&self) -> bool {
        matches!(self, DisposalMethod::Recycled | DisposalMethod::Composted)
    }
}

impl fmt::Display for DisposalMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id())
    }
}

// ==========================================
// 分类来源 (Classification Source)
// ==========================================
// 红线: 降级猜测必须在状态消息中可区分,不得伪装成模型结果
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ClassificationSource {
    LocalModel,    // 本地模型推理
    FallbackGuess, // 降级伪随机猜测（置信度固定 0.65）
}

impl fmt::Display for ClassificationSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClassificationSource::LocalModel => write!(f, "LOCAL_MODEL"),
            ClassificationSource::FallbackGuess => write!(f, "FALLBACK_GUESS"),
        }
    }
}

// ==========================================
// 模型状态 (Model Status)
// ==========================================
// 用途: 分类服务对外暴露的可用性状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ModelStatus {
    Checking,    // 探测中
    Loading,     // 加载中
    Ready,       // 已加载
    Unavailable, // 不可用 - 降级模式
}

impl ModelStatus {
    /// 用户可见状态消息
    pub fn message(&self) -> &'static str {
        match self {
            ModelStatus::Checking => "Checking model availability...",
            ModelStatus::Loading => "Loading classification model...",
            ModelStatus::Ready => "Model loaded",
            ModelStatus::Unavailable => "Model unavailable - using fallback",
        }
    }
}

impl fmt::Display for ModelStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelStatus::Checking => write!(f, "CHECKING"),
            ModelStatus::Loading => write!(f, "LOADING"),
            ModelStatus::Ready => write!(f, "READY"),
            ModelStatus::Unavailable => write!(f, "UNAVAILABLE"),
        }
    }
}
