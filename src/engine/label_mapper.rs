// ==========================================
// 废弃物影响追踪系统 - 标签映射引擎
// ==========================================
// 依据: cnn-mappings 标签元数据表
// 职责: CNN 标签 → ClassifiedMaterial（显式查表）
// 红线: 未映射标签是可观测事件（WARN 日志）, 不是静默默认
// ==========================================

use crate::domain::material::ClassifiedMaterial;
use crate::domain::reference::MaterialMetadata;
use crate::domain::types::ClassificationSource;
use std::collections::HashMap;

// ===== 通用回退材料常量 =====
const FALLBACK_CATEGORY: &str = "other";
const FALLBACK_IMPACT_MATERIAL: &str = "plastic";
const FALLBACK_DEFAULT_WEIGHT_KG: f64 = 0.1;

// ==========================================
// LabelMapper - 标签映射引擎
// ==========================================
/// CNN 标签到材料元数据的显式查表
///
/// 替代按下划线拆分/前缀匹配的启发式解析; 未知标签落回通用材料并记录。
pub struct LabelMapper {
    mappings: HashMap<String, MaterialMetadata>,
}

impl LabelMapper {
    /// 由 cnn-mappings 表构造
    pub fn new(mappings: HashMap<String, MaterialMetadata>) -> Self {
        Self { mappings }
    }

    /// 已知标签数
    pub fn len(&self) -> usize {
        self.mappings.len()
    }

    /// 映射表是否为空
    pub fn is_empty(&self) -> bool {
        self.mappings.is_empty()
    }

    /// 标签 → ClassifiedMaterial
    ///
    /// # 参数
    /// - label: 原始 CNN 标签
    /// - confidence: 置信度 [0,1]
    /// - source: 本地模型 / 降级猜测
    ///
    /// # 说明
    /// 未知标签 → 通用回退材料（category "other", impact_material "plastic",
    /// 默认 0.1 kg, 友好名由标签文本派生）, 并以 WARN 记录。
    pub fn map(
        &self,
        label: &str,
        confidence: f64,
        source: ClassificationSource,
    ) -> ClassifiedMaterial {
        match self.mappings.get(label) {
            Some(meta) => ClassifiedMaterial {
                material_id: label.to_string(),
                impact_material: meta.impact_material.clone(),
                friendly_name: meta.friendly_name.clone(),
                category: meta.category.clone(),
                confidence,
                default_weight_kg: meta.default_weight_kg,
                source,
            },
            None => {
                tracing::warn!(label, "CNN 标签未在映射表中, 使用通用回退材料");
                ClassifiedMaterial {
                    material_id: label.to_string(),
                    impact_material: FALLBACK_IMPACT_MATERIAL.to_string(),
                    friendly_name: friendly_name_from_label(label),
                    category: FALLBACK_CATEGORY.to_string(),
                    confidence,
                    default_weight_kg: FALLBACK_DEFAULT_WEIGHT_KG,
                    source,
                }
            }
        }
    }
}

/// 由标签文本派生友好名: 下划线转空格 + 词首大写
fn friendly_name_from_label(label: &str) -> String {
    label
        .split('_')
        .filter(|w| !w.is_empty())
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
