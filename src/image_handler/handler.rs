//! # 核心编排模块
//!
//! ## 设计思路
//!
//! `ImageHandler` 只负责流程编排，不感知 HTTP 框架。
//! 处理链路固定为：
//! 1. 校验源地址
//! 2. HEAD 探测内容类型
//! 3. GET 下载原始字节
//! 4. 解码 + 透明度归一化 + 编码（阻塞线程池）
//!
//! ## 实现思路
//!
//! - 配置在构造时校验并冻结，所有请求共享同一份只读配置。
//! - HTTP 客户端复用连接池，但不保存任何请求级状态。
//! - 记录 `probe/fetch/decode/encode/total` 阶段耗时，便于性能诊断。

use std::sync::Arc;
use std::time::{Duration, Instant};

use super::source::{ConversionRequest, ConversionTarget, ConvertedImage, FetchedImage, SupportedContentType};
use super::{ImageConfig, ImageError};

/// 图片转换处理器。
///
/// 封装了只读配置与 HTTP 客户端，并编排各子模块实现完整流程。
pub struct ImageHandler {
    pub(super) config: Arc<ImageConfig>,
    pub(super) client: reqwest::Client,
}

impl ImageHandler {
    /// 根据配置创建处理器。
    ///
    /// # 示例
    /// ```rust
    /// use toformat::image_handler::{ImageConfig, ImageHandler};
    ///
    /// let handler = ImageHandler::new(ImageConfig::default())?;
    /// # Ok::<(), toformat::image_handler::ImageError>(())
    /// ```
    pub fn new(config: ImageConfig) -> Result<Self, ImageError> {
        config.validate()?;
        let client = Self::build_http_client(&config)?;

        Ok(Self {
            config: Arc::new(config),
            client,
        })
    }

    pub fn config(&self) -> &ImageConfig {
        &self.config
    }

    /// 处理主入口：探测、下载、解码、归一化、编码。
    ///
    /// 任一阶段失败立即返回，不重试、不降级到其他格式。
    pub async fn convert(&self, request: &ConversionRequest) -> Result<ConvertedImage, ImageError> {
        let total_start = Instant::now();
        let config = Arc::clone(&self.config);

        let url = Self::parse_source_url(&request.source_url, &config)?;
        let redacted = Self::redact_url_for_log(url.as_str());
        log::info!("🌐 开始转换 - 目标: {} URL: {}", request.target.prefix(), redacted);

        let probe_start = Instant::now();
        let probe = self.probe(&url, &config).await?;
        let probe_elapsed = probe_start.elapsed();

        let fetch_start = Instant::now();
        let fetched = self.fetch(&url, &config).await?;
        let fetch_elapsed = fetch_start.elapsed();

        let target = request.target;
        let (converted, decode_elapsed, encode_elapsed) = tokio::task::spawn_blocking(move || {
            Self::transcode(fetched, probe.content_type, target, &config)
        })
        .await
        .map_err(|e| ImageError::EncodeFailure(format!("转换任务异常终止：{}", e)))??;

        log::info!(
            "✅ 转换完成 - URL: {} 类型: {} -> {} 输出: {} bytes probe={}ms fetch={}ms decode={}ms encode={}ms total={}ms",
            redacted,
            probe.content_type.as_str(),
            converted.content_type,
            converted.bytes.len(),
            probe_elapsed.as_millis(),
            fetch_elapsed.as_millis(),
            decode_elapsed.as_millis(),
            encode_elapsed.as_millis(),
            total_start.elapsed().as_millis()
        );

        Ok(converted)
    }

    /// CPU 密集段：解码 → 归一化 → 编码。
    pub(crate) fn transcode(
        fetched: FetchedImage,
        probed: SupportedContentType,
        target: ConversionTarget,
        config: &ImageConfig,
    ) -> Result<(ConvertedImage, Duration, Duration), ImageError> {
        let decode_start = Instant::now();
        let decoded = Self::decode(fetched, probed, config)?;
        let normalized = Self::normalize(decoded);
        let decode_elapsed = decode_start.elapsed();

        let encode_start = Instant::now();
        let converted = Self::encode(&normalized, target, config)?;

        Ok((converted, decode_elapsed, encode_start.elapsed()))
    }
}
