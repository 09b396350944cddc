// ==========================================
// 废弃物影响追踪系统 - 影响等级引擎
// ==========================================
// 职责: 累计 CO₂ 节省 → 成就等级（七档）
// 用途: 用户进度展示
// ==========================================

use serde::{Deserialize, Serialize};

// ==========================================
// ImpactLevel - 成就等级
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImpactLevel {
    pub level: String,       // 等级名
    pub badge: String,       // 徽章（emoji）
    pub description: String, // 描述文案
    pub next_target: f64,    // 下一等级目标（kg CO₂e）
}

impl ImpactLevel {
    /// 按累计 CO₂ 节省量（kg）判定等级
    ///
    /// 阈值自高到低: 500 / 200 / 100 / 50 / 20 / 5 / 0
    pub fn for_total_co2(total_co2_saved: f64) -> Self {
        let (level, badge, description, next_target) = if total_co2_saved >= 500.0 {
            (
                "Planet Protector",
                "🌍",
                "Exceptional environmental leadership - inspiring communities",
                1000.0,
            )
        } else if total_co2_saved >= 200.0 {
            (
                "Environmental Champion",
                "🏆",
                "Outstanding impact - leading the way in sustainable practices",
                500.0,
            )
        } else if total_co2_saved >= 100.0 {
            (
                "Sustainability Expert",
                "🌟",
                "Significant positive impact - making a real difference",
                200.0,
            )
        } else if total_co2_saved >= 50.0 {
            (
                "Green Guardian",
                "🌿",
                "Well-established sustainable habits - great progress!",
                100.0,
            )
        } else if total_co2_saved >= 20.0 {
            (
                "Eco Conscious",
                "🍃",
                "Building solid environmental habits - keep it up!",
                50.0,
            )
        } else if total_co2_saved >= 5.0 {
            (
                "Getting Started",
                "🌱",
                "Taking first steps towards sustainability",
                20.0,
            )
        } else {
            (
                "New Explorer",
                "⭐",
                "Beginning your environmental journey - every action counts!",
                5.0,
            )
        };

        Self {
            level: level.to_string(),
            badge: badge.to_string(),
            description: description.to_string(),
            next_target,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_boundaries() {
        assert_eq!(ImpactLevel::for_total_co2(0.0).level, "New Explorer");
        assert_eq!(ImpactLevel::for_total_co2(4.99).level, "New Explorer");
        assert_eq!(ImpactLevel::for_total_co2(5.0).level, "Getting Started");
        assert_eq!(ImpactLevel::for_total_co2(20.0).level, "Eco Conscious");
        assert_eq!(ImpactLevel::for_total_co2(50.0).level, "Green Guardian");
        assert_eq!(ImpactLevel::for_total_co2(100.0).level, "Sustainability Expert");
        assert_eq!(ImpactLevel::for_total_co2(200.0).level, "Environmental Champion");
        assert_eq!(ImpactLevel::for_total_co2(500.0).level, "Planet Protector");
    }

    #[test]
    fn test_next_target_progression() {
        assert_eq!(ImpactLevel::for_total_co2(0.0).next_target, 5.0);
        assert_eq!(ImpactLevel::for_total_co2(600.0).next_target, 1000.0);
    }
}
