// ==========================================
// 化工设备参数可视化 - 服务端主入口
// ==========================================
// 配置: CHEM_EQUIPMENT_* 环境变量
// 停止: Ctrl+C（优雅关闭，处理中的请求完成后退出）
// ==========================================

use anyhow::Context;
use chem_equipment::app::{serve, AppState};
use chem_equipment::config::AppConfig;
use chem_equipment::logging;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::from_env();
    logging::init_with_format(config.log_format);

    tracing::info!("==================================================");
    tracing::info!("{}", chem_equipment::APP_NAME);
    tracing::info!("系统版本: {}", chem_equipment::VERSION);
    tracing::info!("==================================================");
    tracing::info!("使用数据库: {}", config.db_path);

    let bind_addr = config.bind_addr;
    let state = AppState::new(config).map_err(anyhow::Error::msg)?;

    let listener = tokio::net::TcpListener::bind(bind_addr)
        .await
        .with_context(|| format!("无法监听地址 {}", bind_addr))?;

    serve(state, listener, shutdown_signal())
        .await
        .context("HTTP 服务异常退出")?;

    tracing::info!("服务已停止");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("无法监听 Ctrl+C 信号: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("收到停止信号，正在关闭...");
}
