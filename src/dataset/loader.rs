// ==========================================
// 废弃物影响追踪系统 - 参考数据集加载器
// ==========================================
// 依据: data/ 目录四份参考 JSON
// 数据源: 数据目录下的四个 JSON 文件
// 红线: 任一文件加载失败 → DataUnavailable, 阻断依赖计算
// 红线: 会话内加载一次, 只读共享
// ==========================================

use crate::domain::reference::{
    DomesticMaterial, EquivalencyFactor, MaterialMetadata, WarmFactor,
};
use crate::domain::MaterialOption;
use serde::de::DeserializeOwned;
use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// WARM 因子文件名
pub const WARM_FACTORS_FILE: &str = "warm-factors.json";
/// 家庭材料映射文件名
pub const DOMESTIC_MATERIALS_FILE: &str = "domestic-materials.json";
/// 等效换算因子文件名
pub const EQUIVALENCY_FACTORS_FILE: &str = "equivalency-factors.json";
/// CNN 标签元数据文件名
pub const CNN_MAPPINGS_FILE: &str = "cnn-mappings.json";

// ==========================================
// DatasetError - 数据集层错误
// ==========================================
/// 参考数据加载错误（DataUnavailable 口径）
#[derive(Error, Debug)]
pub enum DatasetError {
    #[error("参考数据文件读取失败: {path}: {source}")]
    FileUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("参考数据文件解析失败: {path}: {source}")]
    ParseError {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Result 类型别名
pub type DatasetResult<T> = Result<T, DatasetError>;

// ==========================================
// ReferenceDataset - 会话级参考数据集
// ==========================================
/// 一次加载、会话期只读的参考数据集合
///
/// 持有 WARM 因子、等效换算因子、家庭材料映射与 CNN 标签元数据。
/// 调用方以 `Arc<ReferenceDataset>` 共享。
#[derive(Debug, Clone)]
pub struct ReferenceDataset {
    pub warm_factors: Vec<WarmFactor>,
    pub domestic_materials: Vec<DomesticMaterial>,
    pub equivalency_factors: Vec<EquivalencyFactor>,
    pub cnn_mappings: HashMap<String, MaterialMetadata>,
}

impl ReferenceDataset {
    /// 从数据目录加载全部参考文件
    ///
    /// # 参数
    /// - data_dir: 含四个 JSON 文件的目录
    ///
    /// # 返回
    /// - Ok(ReferenceDataset): 全部加载成功
    /// - Err(DatasetError): 任一文件缺失或格式错误
    pub fn load_from_dir<P: AsRef<Path>>(data_dir: P) -> DatasetResult<Self> {
        let dir = data_dir.as_ref();

        let warm_factors: Vec<WarmFactor> = load_json(&dir.join(WARM_FACTORS_FILE))?;
        let domestic_materials: Vec<DomesticMaterial> =
            load_json(&dir.join(DOMESTIC_MATERIALS_FILE))?;
        let equivalency_factors: Vec<EquivalencyFactor> =
            load_json(&dir.join(EQUIVALENCY_FACTORS_FILE))?;
        let cnn_mappings: HashMap<String, MaterialMetadata> =
            load_json(&dir.join(CNN_MAPPINGS_FILE))?;

        tracing::info!(
            warm_factors = warm_factors.len(),
            domestic_materials = domestic_materials.len(),
            equivalency_factors = equivalency_factors.len(),
            cnn_mappings = cnn_mappings.len(),
            "参考数据集加载完成"
        );

        Ok(Self {
            warm_factors,
            domestic_materials,
            equivalency_factors,
            cnn_mappings,
        })
    }

    /// 查找 WARM 因子行（类目不区分大小写 + 方法标签精确匹配, 首个匹配生效）
    pub fn find_warm_factor(&self, category: &str, method_label: &str) -> Option<&WarmFactor> {
        self.warm_factors
            .iter()
            .find(|row| row.matches(category, method_label))
    }

    /// 查找家庭材料映射行（cnn_class_name 不区分大小写精确匹配）
    pub fn find_domestic_material(&self, cnn_class_name: &str) -> Option<&DomesticMaterial> {
        self.domestic_materials
            .iter()
            .find(|row| row.cnn_class_name.eq_ignore_ascii_case(cnn_class_name))
    }

    /// 查找等效换算因子（按 equivalency_id）
    pub fn find_equivalency(&self, equivalency_id: &str) -> Option<&EquivalencyFactor> {
        self.equivalency_factors
            .iter()
            .find(|row| row.equivalency_id == equivalency_id)
    }

    /// 由 WARM 因子表派生材料下拉选项（去重、按名称排序）
    pub fn material_options(&self) -> Vec<MaterialOption> {
        let names: BTreeSet<&str> = self
            .warm_factors
            .iter()
            .map(|row| row.warm_category.as_str())
            .filter(|name| !name.is_empty())
            .collect();
        names
            .into_iter()
            .map(MaterialOption::from_category_name)
            .collect()
    }

    /// 已知 CNN 标签集（降级猜测抽样域, 排序保证确定性）
    pub fn known_labels(&self) -> Vec<String> {
        let mut labels: Vec<String> = self.cnn_mappings.keys().cloned().collect();
        labels.sort();
        labels
    }
}

/// 读取并反序列化单个 JSON 文件
fn load_json<T: DeserializeOwned>(path: &Path) -> DatasetResult<T> {
    let raw = std::fs::read_to_string(path).map_err(|source| DatasetError::FileUnavailable {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&raw).map_err(|source| DatasetError::ParseError {
        path: path.to_path_buf(),
        source,
    })
}
