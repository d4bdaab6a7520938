// ==========================================
// 化工设备参数可视化 - 终端客户端入口
// ==========================================
// 配置: CHEM_EQUIPMENT_API_URL / CHEM_EQUIPMENT_TIMEOUT_SECS / CHEM_EQUIPMENT_REPORT_DIR
// ==========================================

use anyhow::Context;
use chem_equipment::client::{HttpEquipmentApi, Shell};
use chem_equipment::config::ClientConfig;
use chem_equipment::logging;

fn main() -> anyhow::Result<()> {
    logging::init_client();

    let config = ClientConfig::from_env();
    tracing::info!("API 地址: {}", config.api_url);

    let api = HttpEquipmentApi::new(&config).context("无法创建 HTTP 客户端")?;

    let stdin = std::io::stdin();
    let stdout = std::io::stdout();
    let mut shell = Shell::new(api, stdin.lock(), stdout.lock(), config);
    shell.run().context("终端读写失败")?;

    Ok(())
}
