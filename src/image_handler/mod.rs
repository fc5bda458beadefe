//! # 图片转换模块（image_handler）
//!
//! ## 设计思路
//!
//! 该模块将“地址校验 → HEAD 探测 → GET 下载 → 解码 → 透明度归一化 → 编码”
//! 按职责拆分为多个子模块，避免单文件膨胀与耦合，且完全不依赖 HTTP 服务框架。
//!
//! - `handler`：编排整条处理流水线
//! - `loader`：负责地址安全校验、探测与下载
//! - `pipeline`：负责类型复核、解码、像素限制与铺白底
//! - `encoder`：负责按目标格式编码
//! - `config/error/source`：配置、错误、数据模型与分派表
//!
//! ## 新同事快速上手
//!
//! ```text
//! server::http（前缀分派）
//!    ↓
//! handler.rs（统一编排 + 阶段耗时日志）
//!    ├─ loader.rs（URL 校验 + HEAD 探测 + GET 下载）
//!    ├─ pipeline.rs（类型复核 + 解码 + 铺白底）
//!    └─ encoder.rs（PNG / JPEG / GIF 编码）
//!    ↓
//! ConvertedImage 或 ImageError
//! ```

mod config;
mod encoder;
mod error;
mod handler;
mod loader;
mod pipeline;
mod source;

pub use config::ImageConfig;
pub use error::ImageError;
pub use handler::ImageHandler;
pub use source::{
    Codec, ConversionRequest, ConversionTarget, ConvertedImage, ProbeResult,
    SupportedContentType,
};
