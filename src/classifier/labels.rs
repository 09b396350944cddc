// ==========================================
// 废弃物影响追踪系统 - 标签文件解析
// ==========================================
// 依据: 训练管线导出的标签文件格式
// 兼容三种格式:
//   1) ["class_a", "class_b", ...]            （索引序）
//   2) [{"index": 0, "name": "class_a"}, ...] （显式索引）
//   3) {"0": "class_a", "1": "class_b"}       （对象映射, 按键排序）
// ==========================================

use crate::classifier::model::{ClassifierError, ClassifierResult};
use serde_json::Value;
use std::path::Path;

/// 从标签文件加载标签表
pub async fn load_labels<P: AsRef<Path>>(path: P) -> ClassifierResult<Vec<String>> {
    let path = path.as_ref();
    let raw = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| ClassifierError::LabelUnavailable {
            path: path.to_path_buf(),
            source,
        })?;
    parse_labels(&raw)
}

/// 解析标签 JSON 文本
pub fn parse_labels(raw: &str) -> ClassifierResult<Vec<String>> {
    let value: Value = serde_json::from_str(raw)
        .map_err(|e| ClassifierError::LabelFormat(e.to_string()))?;

    match value {
        Value::Array(items) => parse_label_array(items),
        Value::Object(map) => {
            // 对象映射格式: 数值键排序后取值
            let mut entries: Vec<(i64, String)> = Vec::new();
            for (key, val) in map {
                let idx = key
                    .parse::<i64>()
                    .map_err(|_| ClassifierError::LabelFormat(format!("非数值键: {}", key)))?;
                let name = val
                    .as_str()
                    .ok_or_else(|| {
                        ClassifierError::LabelFormat(format!("键 {} 的值不是字符串", idx))
                    })?
                    .to_string();
                entries.push((idx, name));
            }
            entries.sort_by_key(|(idx, _)| *idx);
            Ok(entries.into_iter().map(|(_, name)| name).collect())
        }
        _ => Err(ClassifierError::LabelFormat(
            "既不是数组也不是对象".to_string(),
        )),
    }
}

/// 解析数组格式（字符串数组或对象数组）
fn parse_label_array(items: Vec<Value>) -> ClassifierResult<Vec<String>> {
    if items.is_empty() {
        return Ok(Vec::new());
    }

    // 格式 1: 字符串数组
    if items.iter().all(|v| v.is_string()) {
        return Ok(items
            .into_iter()
            .filter_map(|v| v.as_str().map(str::to_string))
            .collect());
    }

    // 格式 2: 对象数组 {index, name|className}
    let mut with_index: Vec<(Option<i64>, String)> = Vec::with_capacity(items.len());
    for item in &items {
        let obj = item.as_object().ok_or_else(|| {
            ClassifierError::LabelFormat("数组元素类型混杂".to_string())
        })?;
        let name = obj
            .get("name")
            .or_else(|| obj.get("className"))
            .and_then(Value::as_str)
            .ok_or_else(|| {
                ClassifierError::LabelFormat("对象元素缺少 name/className".to_string())
            })?
            .to_string();
        let index = obj.get("index").and_then(Value::as_i64);
        with_index.push((index, name));
    }

    // 全部带显式 index → 按 index 落位（允许空洞后压实）
    if with_index.iter().all(|(idx, _)| idx.is_some()) {
        let max_idx = with_index
            .iter()
            .filter_map(|(idx, _)| *idx)
            .max()
            .unwrap_or(0);
        let mut slots: Vec<Option<String>> = vec![None; (max_idx + 1) as usize];
        for (idx, name) in with_index {
            if let Some(i) = idx {
                slots[i as usize] = Some(name);
            }
        }
        Ok(slots.into_iter().flatten().collect())
    } else {
        // 部分无 index → 按出现顺序
        Ok(with_index.into_iter().map(|(_, name)| name).collect())
    }
}
