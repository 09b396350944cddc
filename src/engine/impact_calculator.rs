// ==========================================
// 废弃物影响追踪系统 - 影响计算引擎
// ==========================================
// 依据: EPA WARM v15.2 - 因子表与单位换算口径
// 职责: WARM 因子查表 + 单位换算 + 等效换算
// 红线: 无状态, 纯函数, 幂等; 查表未命中返回 None（不是错误）
// 符号口径: co2_delta 正 = 避免排放, 负 = 新增排放（相对填埋基线）
// ==========================================

use crate::dataset::ReferenceDataset;
use crate::domain::types::DisposalMethod;
use crate::engine::MMBTU_TO_KWH;
use serde::{Deserialize, Serialize};

// ==========================================
// ImpactResult - 影响计算结果
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImpactResult {
    // ===== 展示量（绝对值）=====
    pub co2_saved: f64,    // kg CO₂e
    pub water_saved: f64,  // 升
    pub energy_saved: f64, // kWh

    // ===== 带符号量（累计口径）=====
    // 手工记录路径取 -(co2_per_ton × tons), 使避免排放为正
    pub co2_delta: f64, // kg CO₂e 相对填埋基线

    // ===== 等效换算 =====
    pub equivalencies: ImpactEquivalencies,
}

// ==========================================
// ImpactEquivalencies - 用户可感知等效量
// ==========================================
// 换算语义: 量值 / conversion_rate; 因子缺失/单位不匹配时为 0
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImpactEquivalencies {
    pub car_days: f64,   // cars_off_road: kg_co2e → car_days
    pub home_hours: f64, // homes_powered: kwh → home_hours
    pub trees: f64,      // trees_planted: kg_co2e → trees
}

// ==========================================
// ManualPreview - 手工记录启发式预览
// ==========================================
// 用途: 无参考行时的本地预览口径（非 WARM 数据）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManualPreview {
    pub co2_delta: f64,      // weight × 2.1, 有益方法为正
    pub water_savings: f64,  // 回收: weight × 15.3 L/kg
    pub energy_savings: f64, // 回收: weight × 2.8 kWh/kg
}

// ==========================================
// ImpactCalculator - 影响计算引擎
// ==========================================
// 红线: 无状态引擎, 所有方法都是纯函数
pub struct ImpactCalculator;

impl ImpactCalculator {
    /// 创建新的影响计算引擎
    pub fn new() -> Self {
        Self
    }

    /// 计算单次处置事件的环境影响
    ///
    /// # 参数
    /// - category: WARM 材料类目（不区分大小写）
    /// - method: 处置方法
    /// - weight_kg: 重量（kg）, 必须有限且 > 0
    /// - dataset: 会话级参考数据集
    ///
    /// # 返回
    /// - Some(ImpactResult): 查表命中
    /// - None: 入参非法 / 方法无参考数据 / 查表未命中（"无数据", 非错误）
    pub fn calculate(
        &self,
        category: &str,
        method: DisposalMethod,
        weight_kg: f64,
        dataset: &ReferenceDataset,
    ) -> Option<ImpactResult> {
        if !weight_kg.is_finite() || weight_kg <= 0.0 {
            return None;
        }
        let method_label = method.warm_label()?;
        let row = dataset.find_warm_factor(category, method_label)?;

        // kg → 公吨
        let tons = weight_kg / 1000.0;

        let co2_per_ton = row.co2e_kg_per_ton;
        let water_per_ton = row.water_savings_liters_per_ton;
        let energy_per_ton = effective_energy_kwh_per_ton(
            row.energy_kwh_per_ton,
            row.energy_mmbtu_per_ton,
        );

        let co2_saved = (co2_per_ton * tons).abs();
        let energy_saved = (energy_per_ton * tons).abs();
        let water_saved = (water_per_ton * tons).abs();
        // 负因子 = 净避免 → delta 为正
        let co2_delta = -(co2_per_ton * tons);

        let equivalencies =
            self.compute_equivalencies(dataset, co2_saved, energy_saved);

        Some(ImpactResult {
            co2_saved,
            water_saved,
            energy_saved,
            co2_delta,
            equivalencies,
        })
    }

    /// 等效换算（因子未命中/无效时该项为 0）
    fn compute_equivalencies(
        &self,
        dataset: &ReferenceDataset,
        co2_kg: f64,
        kwh: f64,
    ) -> ImpactEquivalencies {
        let car_days = dataset
            .find_equivalency("cars_off_road")
            .and_then(|f| f.convert("kg_co2e", co2_kg))
            .unwrap_or(0.0);
        let home_hours = dataset
            .find_equivalency("homes_powered")
            .and_then(|f| f.convert("kwh", kwh))
            .unwrap_or(0.0);
        let trees = dataset
            .find_equivalency("trees_planted")
            .and_then(|f| f.convert("kg_co2e", co2_kg))
            .unwrap_or(0.0);
        ImpactEquivalencies {
            car_days,
            home_hours,
            trees,
        }
    }

    /// 无参考行时的启发式预览（手工记录路径）
    ///
    /// 非 WARM 口径: co2 = weight × 2.1（有益方法为正）;
    /// 仅回收计水（15.3 L/kg）与电（2.8 kWh/kg）。
    pub fn manual_preview(&self, method: DisposalMethod, weight_kg: f64) -> Option<ManualPreview> {
        if !weight_kg.is_finite() || weight_kg <= 0.0 {
            return None;
        }
        let base = weight_kg * 2.1;
        let co2_delta = if method.is_beneficial() { base } else { -base };
        let is_recycled = method == DisposalMethod::Recycled;
        Some(ManualPreview {
            co2_delta,
            water_savings: if is_recycled { weight_kg * 15.3 } else { 0.0 },
            energy_savings: if is_recycled { weight_kg * 2.8 } else { 0.0 },
        })
    }

    /// 本地默认行为建议文案（服务端不可达时的回退）
    pub fn default_nudge_text(&self, method: DisposalMethod) -> &'static str {
        match method {
            DisposalMethod::Recycled => "Great choice! Recycling keeps materials in circulation.",
            DisposalMethod::Composted => "Composting organics prevents methane in landfills.",
            _ => "Consider recycling or composting next time to avoid landfill emissions.",
        }
    }

    /// 材料展示名 → 后端 impact_material 键
    ///
    /// 显式归类（子串匹配, 顺序即优先级）; 无匹配时默认 "metal"。
    pub fn impact_material_key(&self, material_name: &str) -> &'static str {
        let name = material_name.to_lowercase();
        let contains_any =
            |keys: &[&str]| keys.iter().any(|k| name.contains(k));

        if name.contains("glass") {
            "glass"
        } else if contains_any(&["metal", "aluminum", "steel"]) {
            "metal"
        } else if contains_any(&["paper", "cardboard", "magazine"]) {
            "paper"
        } else if contains_any(&["organic", "food", "compost"]) {
            "organic"
        } else if contains_any(&["textile", "clothing", "fabric"]) {
            "textiles"
        } else if name.contains("polystyrene") || name.contains("plastic") {
            "plastic"
        } else {
            "metal"
        }
    }
}

impl Default for ImpactCalculator {
    fn default() -> Self {
        Self::new()
    }
}

/// 能量因子回退: kWh 缺失或为 0 时, MMBtu × 293.071
fn effective_energy_kwh_per_ton(kwh: Option<f64>, mmbtu: Option<f64>) -> f64 {
    match kwh {
        Some(v) if v.is_finite() && v != 0.0 => v,
        _ => match mmbtu {
            Some(v) if v.is_finite() => v * MMBTU_TO_KWH,
            _ => 0.0,
        },
    }
}
