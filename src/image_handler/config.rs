//! # 配置模块
//!
//! ## 设计思路
//!
//! 将转换链路中所有“可调阈值”集中到 `ImageConfig`，进程启动时确定，运行期只读。
//! 每个请求拿到的是同一份不可变配置，不存在请求中途配置漂移的问题。
//!
//! ## 实现思路
//!
//! - `Default` 提供生产可用的参数组合。
//! - `validate` 在启动阶段拒绝明显无效的取值（零超时、零体积上限等）。

use serde::Deserialize;

use super::ImageError;

/// 转换链路配置。
///
/// 字段覆盖了探测、下载、解码与编码四个阶段。
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ImageConfig {
    /// 下载原始字节时允许的最大文件体积（字节）。
    pub max_file_size: u64,
    /// 单次 HTTP 请求总超时（秒）。
    pub download_timeout: u64,
    /// 建立连接（TCP/TLS）超时时间（秒）。
    pub connect_timeout: u64,
    /// 下载首包超时时间（毫秒）。
    pub stream_first_byte_timeout_ms: u64,
    /// 下载分块读取超时时间（毫秒）。
    pub stream_chunk_timeout_ms: u64,
    /// 最大重定向次数。
    pub max_redirects: usize,
    /// 是否允许访问内网或本地地址（默认关闭，防 SSRF）。
    pub allow_private_network: bool,
    /// 解码后的像素上限（`width * height`）。
    pub max_decoded_pixels: u64,
    /// JPEG 输出质量（1~100）。
    pub jpeg_quality: u8,
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            max_file_size: 50 * 1024 * 1024,
            download_timeout: 30,
            connect_timeout: 8,
            stream_first_byte_timeout_ms: 10_000,
            stream_chunk_timeout_ms: 15_000,
            max_redirects: 5,
            allow_private_network: false,
            max_decoded_pixels: 40_000_000,
            jpeg_quality: 75,
        }
    }
}

impl ImageConfig {
    /// 校验配置取值范围。
    ///
    /// # 示例
    /// ```rust
    /// use toformat::image_handler::ImageConfig;
    ///
    /// assert!(ImageConfig::default().validate().is_ok());
    /// ```
    pub fn validate(&self) -> Result<(), ImageError> {
        if self.max_file_size == 0 {
            return Err(ImageError::LoadFailure("max_file_size 不能为 0".to_string()));
        }
        if !(1..=600).contains(&self.download_timeout) {
            return Err(ImageError::LoadFailure(
                "download_timeout 必须在 1~600 秒之间".to_string(),
            ));
        }
        if !(1..=120).contains(&self.connect_timeout) {
            return Err(ImageError::LoadFailure(
                "connect_timeout 必须在 1~120 秒之间".to_string(),
            ));
        }
        if !(500..=120_000).contains(&self.stream_first_byte_timeout_ms) {
            return Err(ImageError::LoadFailure(
                "stream_first_byte_timeout_ms 必须在 500~120000 毫秒之间".to_string(),
            ));
        }
        if !(500..=120_000).contains(&self.stream_chunk_timeout_ms) {
            return Err(ImageError::LoadFailure(
                "stream_chunk_timeout_ms 必须在 500~120000 毫秒之间".to_string(),
            ));
        }
        if self.max_decoded_pixels == 0 {
            return Err(ImageError::DecodeFailure("max_decoded_pixels 不能为 0".to_string()));
        }
        if !(1..=100).contains(&self.jpeg_quality) {
            return Err(ImageError::EncodeFailure(
                "jpeg_quality 必须在 1~100 之间".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(ImageConfig::default().validate().is_ok());
    }

    #[test]
    fn rejects_zero_connect_timeout() {
        let config = ImageConfig {
            connect_timeout: 0,
            ..ImageConfig::default()
        };

        assert!(matches!(config.validate(), Err(ImageError::LoadFailure(_))));
    }

    #[test]
    fn rejects_out_of_range_jpeg_quality() {
        let config = ImageConfig {
            jpeg_quality: 0,
            ..ImageConfig::default()
        };

        assert!(matches!(config.validate(), Err(ImageError::EncodeFailure(_))));
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config: ImageConfig =
            serde_json::from_str(r#"{"allow_private_network": true}"#).expect("parse failed");

        assert!(config.allow_private_network);
        assert_eq!(config.max_file_size, 50 * 1024 * 1024);
        assert_eq!(config.jpeg_quality, 75);
    }
}
