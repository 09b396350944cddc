// ==========================================
// 废弃物影响追踪系统 - 主入口
// ==========================================
// 技术栈: Rust + SQLite + REST
// 系统定位: 废弃物处置记录与环境影响量化
// ==========================================

use std::path::PathBuf;

use track_my_impact::app::AppState;
use track_my_impact::config::AppConfig;
use track_my_impact::logging;

#[tokio::main]
async fn main() {
    // 初始化日志系统
    logging::init();

    tracing::info!("==================================================");
    tracing::info!("{} - 废弃物影响追踪系统", track_my_impact::APP_NAME);
    tracing::info!("系统版本: {}", track_my_impact::VERSION);
    tracing::info!("==================================================");

    // 加载配置（TMI_CONFIG 指定配置文件, 默认 ./config.json）
    let config_path = std::env::var("TMI_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config.json"));
    let config = match AppConfig::load(&config_path) {
        Ok(c) => c,
        Err(e) => {
            tracing::error!("配置加载失败: {}", e);
            std::process::exit(1);
        }
    };
    tracing::info!("使用缓存数据库: {}", config.cache_db_path);
    tracing::info!("后端地址: {}", config.api_base_url);

    // 创建 AppState
    tracing::info!("正在初始化 AppState...");
    let state = match AppState::new(config) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!("AppState 初始化失败: {}", e.user_message());
            std::process::exit(1);
        }
    };

    tracing::info!("AppState 初始化成功");
    tracing::info!("模型状态: {}", state.classifier.status());
    tracing::info!(
        "参考数据: warm_factors={}, cnn_mappings={}",
        state.dataset.warm_factors.len(),
        state.dataset.cnn_mappings.len()
    );
    tracing::info!("可记录材料选项: {}", state.material_options().len());
}
