//! # HTTP 路由层
//!
//! ## 设计思路
//!
//! 路由层只做“前缀分派 + 响应组装”，不承载业务逻辑：
//! - 转换入口：`/png=<url>`、`/jpeg=<url>`、`/jpg=<url>`、`/gif=<url>`
//! - 示例图片：`/img.png`、`/img.jpg`
//! - 空 favicon：`/favicon.ico`
//! - 其余路径：文档（curl 返回纯文本，其他客户端返回 HTML）

use std::sync::Arc;

use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode, Uri},
    response::{IntoResponse, Response},
    routing::any,
    Router,
};

use bytes::Bytes;

use super::assets;
use crate::error::AppError;
use crate::image_handler::{
    ConversionRequest, ConversionTarget, ImageError, ImageHandler,
};

/// 所有请求共享的只读状态。
#[derive(Clone)]
pub struct AppState {
    handler: Arc<ImageHandler>,
}

/// 构建服务路由。
pub fn create_router(handler: Arc<ImageHandler>) -> Router {
    Router::new()
        .route("/favicon.ico", any(favicon))
        .route("/img.png", any(sample_png))
        .route("/img.jpg", any(sample_jpg))
        .fallback(dispatch)
        .with_state(AppState { handler })
}

/// 用原始请求 URI（含 query）匹配前缀表。
///
/// 前缀之后的部分原样作为源地址；URI 恰好等于前缀时视为未命中。
pub fn route_conversion(request_uri: &str) -> Option<ConversionRequest> {
    ConversionTarget::ALL.into_iter().find_map(|target| {
        let prefix = target.prefix();
        if request_uri.len() > prefix.len() && request_uri.starts_with(prefix) {
            Some(ConversionRequest {
                target,
                source_url: request_uri[prefix.len()..].to_string(),
            })
        } else {
            None
        }
    })
}

async fn dispatch(State(state): State<AppState>, uri: Uri, headers: HeaderMap) -> Response {
    let request_uri = uri
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or_else(|| uri.path());

    match route_conversion(request_uri) {
        Some(request) => convert(&state, request).await,
        None => documentation(&headers),
    }
}

async fn convert(state: &AppState, request: ConversionRequest) -> Response {
    match state.handler.convert(&request).await {
        Ok(converted) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, converted.content_type)],
            converted.bytes,
        )
            .into_response(),
        Err(err) => {
            log::warn!(
                "⚠️ 转换失败 - 目标: {} URL: {} code={} stage={} detail={}",
                request.target.prefix(),
                ImageHandler::redact_url_for_log(&request.source_url),
                err.code(),
                err.stage(),
                err.detail()
            );
            error_response(&err)
        }
    }
}

/// 所有转换失败统一返回 500 + 纯文本错误短句。
fn error_response(err: &ImageError) -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        [(header::CONTENT_TYPE, "text/plain")],
        err.to_string(),
    )
        .into_response()
}

async fn favicon() -> StatusCode {
    StatusCode::OK
}

async fn sample_png() -> Response {
    sample_response(assets::samples().map(|s| s.png.clone()), "image/png")
}

async fn sample_jpg() -> Response {
    sample_response(assets::samples().map(|s| s.jpg.clone()), "image/jpeg")
}

fn sample_response(sample: Result<Bytes, AppError>, content_type: &'static str) -> Response {
    match sample {
        Ok(bytes) => ([(header::CONTENT_TYPE, content_type)], bytes).into_response(),
        Err(err) => {
            log::error!("❌ 示例图片不可用 - {}", err);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                [(header::CONTENT_TYPE, "text/plain")],
                "Sample image unavailable",
            )
                .into_response()
        }
    }
}

fn documentation(headers: &HeaderMap) -> Response {
    let user_agent = headers
        .get(header::USER_AGENT)
        .and_then(|value| value.to_str().ok());
    let doc = assets::documentation(user_agent);

    ([(header::CONTENT_TYPE, doc.content_type)], doc.body).into_response()
}
