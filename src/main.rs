//! # toformat：应用入口
//!
//! 本文件仅负责日志初始化、读取配置与启动 HTTP 服务。
//! 业务逻辑分布在各子模块中，详见 `lib.rs` 架构文档。

use toformat::error::AppError;
use toformat::server;
use toformat::settings::Settings;

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(err) = run().await {
        log::error!("启动失败: {}", err.describe());
        std::process::exit(1);
    }
}

async fn run() -> Result<(), AppError> {
    let settings = Settings::load()?;
    log::info!("setup: settings loaded (bind={})", settings.bind_addr);

    server::serve(settings).await
}
