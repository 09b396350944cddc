// ==========================================
// 参考数据集加载 集成测试
// ==========================================
// 职责: 验证数据目录加载、查表语义与派生集合
// ==========================================


use track_my_impact::dataset::{DatasetError, ReferenceDataset};
use track_my_impact::logging;

#[test]
fn test_load_from_dir() {
    logging::init_test();
    let dir = test_helpers::create_test_data_dir().unwrap();
    let dataset = ReferenceDataset::load_from_dir(dir.path()).unwrap();

    assert_eq!(dataset.warm_factors.len(), 5);
    assert_eq!(dataset.domestic_materials.len(), 1);
    assert_eq!(dataset.equivalency_factors.len(), 3);
    assert_eq!(dataset.cnn_mappings.len(), 2);
}

#[test]
fn test_missing_file_is_unavailable() {
    let dir = tempfile::tempdir().unwrap();
    test_helpers::write_reference_data(dir.path()).unwrap();
    std::fs::remove_file(dir.path().join("warm-factors.json")).unwrap();

    let err = ReferenceDataset::load_from_dir(dir.path()).unwrap_err();
    assert!(matches!(err, DatasetError::FileUnavailable { .. }));
}

#[test]
fn test_malformed_file_is_parse_error() {
    let dir = tempfile::tempdir().unwrap();
    test_helpers::write_reference_data(dir.path()).unwrap();
    std::fs::write(dir.path().join("equivalency-factors.json"), "[ broken").unwrap();

    let err = ReferenceDataset::load_from_dir(dir.path()).unwrap_err();
    assert!(matches!(err, DatasetError::ParseError { .. }));
}

#[test]
fn test_warm_lookup_case_insensitive_category() {
    let dir = test_helpers::create_test_data_dir().unwrap();
    let dataset = ReferenceDataset::load_from_dir(dir.path()).unwrap();

    let row = dataset.find_warm_factor("ALUMINUM CANS", "Recycling").unwrap();
    assert_eq!(row.co2e_kg_per_ton, -9110.0);
    // 方法标签精确匹配
    assert!(dataset.find_warm_factor("Aluminum Cans", "recycling").is_none());
    // 未命中 → None, 不是错误
    assert!(dataset.find_warm_factor("Unobtainium", "Recycling").is_none());
}

#[test]
fn test_domestic_material_lookup() {
    let dir = test_helpers::create_test_data_dir().unwrap();
    let dataset = ReferenceDataset::load_from_dir(dir.path()).unwrap();

    let row = dataset
        .find_domestic_material("METAL_ALUMINIUM_FOOD_CANS")
        .unwrap();
    assert_eq!(row.warm_category, "Aluminum Cans");
    assert!(dataset.find_domestic_material("unknown_label").is_none());
}

#[test]
fn test_material_options_deduped_sorted() {
    let dir = test_helpers::create_test_data_dir().unwrap();
    let dataset = ReferenceDataset::load_from_dir(dir.path()).unwrap();

    let options = dataset.material_options();
    // 5 行 WARM 因子 → 3 个去重类目, 按名称排序
    assert_eq!(options.len(), 3);
    assert_eq!(options[0].name, "Aluminum Cans");
    assert_eq!(options[0].id, "aluminum_cans");
    assert_eq!(options[1].name, "Food Waste");
    assert_eq!(options[2].name, "Glass");
}

#[test]
fn test_known_labels_sorted() {
    let dir = test_helpers::create_test_data_dir().unwrap();
    let dataset = ReferenceDataset::load_from_dir(dir.path()).unwrap();

    let labels = dataset.known_labels();
    assert_eq!(
        labels,
        vec![
            "metal_aluminium_food_cans".to_string(),
            "plastic_plastic_water_bottles".to_string()
        ]
    );
}
