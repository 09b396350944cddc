// ==========================================
// 废弃物影响追踪系统 - 材料领域模型
// ==========================================
// 依据: 分类结果与材料选项的业务口径
// 用途: 分类编排器输出 / 计算器入参
// ==========================================

use crate::domain::types::ClassificationSource;
use serde::{Deserialize, Serialize};

// ==========================================
// ClassifiedMaterial - 分类结果材料
// ==========================================
// 生命周期: 单次分类尝试内（瞬态,记录前不持久化）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifiedMaterial {
    pub material_id: String,     // 原始 CNN 标签
    pub impact_material: String, // 后端 impact_material 键
    pub friendly_name: String,   // 用户展示名
    pub category: String,        // 粗分类
    pub confidence: f64,         // 置信度 [0,1]
    pub default_weight_kg: f64,  // 默认重量（kg）
    pub source: ClassificationSource, // 本地模型 / 降级猜测
}

impl ClassifiedMaterial {
    /// 置信度是否低于警告阈值（< 0.7 → 非阻塞警告）
    pub fn is_uncertain(&self) -> bool {
        self.confidence < crate::engine::CONFIDENCE_WARN_THRESHOLD
    }

    /// 默认重量的克数（表单预填）
    pub fn default_weight_grams(&self) -> i64 {
        (self.default_weight_kg * 1000.0).round() as i64
    }
}

// ==========================================
// MaterialOption - 材料下拉选项
// ==========================================
// 派生: WARM 因子表 warm_category 去重、排序
// id 口径: 小写 + 空白转下划线
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialOption {
    pub id: String,       // e.g. "aluminum_cans"
    pub name: String,     // e.g. "Aluminum Cans"
    pub category: String, // 与 name 相同（WARM 类目即类别）
}

impl MaterialOption {
    /// 由 WARM 类目名生成选项
    pub fn from_category_name(name: &str) -> Self {
        let id = name
            .split_whitespace()
            .collect::<Vec<_>>()
            .join("_")
            .to_lowercase();
        Self {
            id,
            name: name.to_string(),
            category: name.to_string(),
        }
    }
}
