//! # HTTP 服务模块
//!
//! 负责路由构建与监听循环；转换逻辑全部在 `image_handler` 中。

pub mod assets;
mod http;

use std::sync::Arc;

pub use http::{create_router, route_conversion, AppState};

use crate::error::AppError;
use crate::image_handler::ImageHandler;
use crate::settings::Settings;

/// 绑定端口并持续服务，收到 Ctrl-C 后优雅退出。
pub async fn serve(settings: Settings) -> Result<(), AppError> {
    let samples = assets::samples()?;
    log::debug!("示例图片已渲染 - png={} bytes jpg={} bytes", samples.png.len(), samples.jpg.len());

    let handler = ImageHandler::new(settings.image)?;
    log::info!(
        "🖼️ 转换器就绪 - 大小上限: {} bytes 像素上限: {} 允许内网: {}",
        handler.config().max_file_size,
        handler.config().max_decoded_pixels,
        handler.config().allow_private_network
    );
    let app = create_router(Arc::new(handler));

    let listener = tokio::net::TcpListener::bind(settings.bind_addr).await?;
    log::info!("🚀 服务已启动 - 监听: {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    log::info!("服务已停止");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        log::warn!("⚠️ 无法监听 Ctrl-C 信号: {}", err);
        std::future::pending::<()>().await;
    }
    log::info!("收到退出信号，开始优雅关闭");
}
