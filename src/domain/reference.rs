// ==========================================
// 废弃物影响追踪系统 - 参考数据行模型
// ==========================================
// 依据: data/ 参考数据 JSON 形状
// 数据源: data/warm-factors.json / equivalency-factors.json /
//         domestic-materials.json / cnn-mappings.json
// 红线: 会话内只读,一次加载
// ==========================================

use serde::{Deserialize, Serialize};

// ==========================================
// WarmFactor - EPA WARM 因子行
// ==========================================
// 键: (warm_category 不区分大小写, disposal_method) - 首个匹配生效
// 符号口径: co2e_kg_per_ton 为正 = 净排放, 为负 = 净避免
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WarmFactor {
    pub warm_category: String,            // WARM 材料类目
    pub disposal_method: String,          // Recycling / Landfill / Composting
    pub co2e_kg_per_ton: f64,             // kg CO₂e / 公吨（带符号）
    #[serde(default)]
    pub energy_kwh_per_ton: Option<f64>,  // kWh / 公吨（可缺失）
    #[serde(default)]
    pub energy_mmbtu_per_ton: Option<f64>, // MMBtu / 公吨（kWh 缺失时回退）
    #[serde(default)]
    pub water_savings_liters_per_ton: f64, // 升 / 公吨
}

impl WarmFactor {
    /// 是否匹配 (类目, 方法标签)
    ///
    /// 类目不区分大小写,方法标签精确匹配
    pub fn matches(&self, category: &str, method_label: &str) -> bool {
        self.warm_category.eq_ignore_ascii_case(category) && self.disposal_method == method_label
    }
}

// ==========================================
// EquivalencyFactor - 等效换算因子行
// ==========================================
// 换算语义: 量值 / conversion_rate = 等效数值
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EquivalencyFactor {
    pub equivalency_id: String, // cars_off_road / homes_powered / trees_planted
    pub unit_from: String,      // kg_co2e / kwh
    pub unit_to: String,        // car_days / home_hours / trees
    #[serde(default)]
    pub conversion_rate: f64,   // 0/缺失时该因子跳过
}

impl EquivalencyFactor {
    /// 将量值换算为等效数值
    ///
    /// # 返回
    /// - Some(数值): unit_from 匹配且 conversion_rate 有效
    /// - None: 单位不匹配或 conversion_rate 为 0/非有限
    pub fn convert(&self, unit_from: &str, quantity: f64) -> Option<f64> {
        if self.unit_from != unit_from {
            return None;
        }
        if !self.conversion_rate.is_finite() || self.conversion_rate == 0.0 {
            return None;
        }
        Some(quantity / self.conversion_rate)
    }
}

// ==========================================
// DomesticMaterial - CNN 标签 → WARM 类目映射行
// ==========================================
// 键: cnn_class_name 不区分大小写精确匹配
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DomesticMaterial {
    pub cnn_class_name: String, // CNN 输出标签
    pub warm_category: String,  // 对应 WARM 类目
    #[serde(default)]
    pub friendly_name: Option<String>, // 展示名（可缺失）
    #[serde(default)]
    pub category: Option<String>, // 粗分类（plastic/paper/...）
}

// ==========================================
// MaterialMetadata - 标签元数据（cnn-mappings）
// ==========================================
// 键: CNN 标签（完整类名）
// 对齐: cnn-mappings.json（camelCase 键）
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MaterialMetadata {
    pub friendly_name: String,   // 用户展示名
    pub category: String,        // 粗分类
    pub impact_material: String, // 后端 impact_material 键
    pub warm_category: String,   // WARM 类目
    pub default_weight_kg: f64,  // 默认重量（kg）
}
