// ==========================================
// 废弃物影响追踪系统 - 日志条目领域模型
// ==========================================
// 依据: 本地缓存与远端镜像的合并口径
// 符号不变式: impact_value 正 = 避免排放, 负 = 新增排放（相对填埋基线）
// ==========================================

use crate::domain::types::DisposalMethod;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ==========================================
// LogEntry - 已记录的处置事件
// ==========================================
// 持久化: 本地缓存（按用户隔离）+ 远端镜像
// 合并口径: 按 id 合并, 远端覆盖同名字段（金额/时间戳以远端为准）,
//           仅本地存在的字段保留
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    // ===== 身份 =====
    pub id: String, // 本地: UUID v4; 远端: 服务端 id

    // ===== 材料标识 =====
    #[serde(default)]
    pub material_id: Option<String>, // 原始 CNN 标签（仅本地分类路径）
    #[serde(default)]
    pub impact_material: Option<String>, // 后端 impact_material 键
    pub friendly_name: String,           // 展示名（远端路径为 material_id）
    #[serde(default)]
    pub category: Option<String>, // 粗分类（仅本地）

    // ===== 处置信息 =====
    pub method: DisposalMethod, // 处置方法
    pub weight_grams: i64,      // 重量（克）
    #[serde(default)]
    pub confidence: Option<f64>, // 分类置信度（仅分类路径）

    // ===== 影响（带符号）=====
    pub impact_value: f64, // kg CO₂e 相对填埋基线（正=避免）
    pub nudge_text: String, // 行为建议文案
    #[serde(default)]
    pub water_savings: Option<f64>, // 升（仅本地计算路径）
    #[serde(default)]
    pub energy_savings: Option<f64>, // kWh（仅本地计算路径）

    // ===== 时间 =====
    pub timestamp: DateTime<Utc>, // 本地: 记录时刻; 合并后以远端 created_at 为准
}

impl LogEntry {
    /// 与远端同 id 记录合并
    ///
    /// 远端权威字段（金额/方法/重量/文案/时间戳）覆盖本地;
    /// 仅本地存在的字段（材料标识/置信度/水电量）保留。
    /// 幂等: 对同一远端记录重复合并结果不变。
    pub fn merge_remote(&self, remote: &LogEntry) -> LogEntry {
        LogEntry {
            id: self.id.clone(),
            material_id: remote.material_id.clone().or_else(|| self.material_id.clone()),
            impact_material: remote
                .impact_material
                .clone()
                .or_else(|| self.impact_material.clone()),
            friendly_name: remote.friendly_name.clone(),
            category: remote.category.clone().or_else(|| self.category.clone()),
            method: remote.method,
            weight_grams: remote.weight_grams,
            confidence: remote.confidence.or(self.confidence),
            impact_value: remote.impact_value,
            nudge_text: remote.nudge_text.clone(),
            water_savings: remote.water_savings.or(self.water_savings),
            energy_savings: remote.energy_savings.or(self.energy_savings),
            timestamp: remote.timestamp,
        }
    }
}

// ==========================================
// LocalMetrics - 本地缓存汇总指标
// ==========================================
// 用途: 仪表盘离线口径（与服务端 summary 并列展示）
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LocalMetrics {
    pub total_items: i64,    // 条目数
    pub co2_saved: f64,      // Σ impact_value（带符号累计）
    pub water_saved: f64,    // Σ water_savings
    pub energy_saved: f64,   // Σ energy_savings
    pub recycling_rate: f64, // 回收条目占比（%）
}

impl LocalMetrics {
    /// 由日志列表汇总
    pub fn from_logs(logs: &[LogEntry]) -> Self {
        if logs.is_empty() {
            return Self::default();
        }
        let total_items = logs.len() as i64;
        let co2_saved = logs.iter().map(|l| l.impact_value).sum();
        let water_saved = logs.iter().filter_map(|l| l.water_savings).sum();
        let energy_saved = logs.iter().filter_map(|l| l.energy_savings).sum();
        let recycled = logs
            .iter()
            .filter(|l| l.method == DisposalMethod::Recycled)
            .count() as f64;
        Self {
            total_items,
            co2_saved,
            water_saved,
            energy_saved,
            recycling_rate: recycled / total_items as f64 * 100.0,
        }
    }
}
