//! # 数据模型与分派表
//!
//! ## 设计思路
//!
//! 将“外部输入语义”和“流水线中间结果”解耦：
//! - `ConversionTarget` 表示请求前缀（保留 `/jpg=` 与 `/jpeg=` 的文本差异）
//! - `Codec` 表示真正执行编解码的格式族
//! - `SupportedContentType` 表示远端声明的内容类型
//! - `ProbeResult` / `FetchedImage` / `DecodedImage` / `ConvertedImage` 为各阶段产物
//!
//! 每个方向的映射都是穷举 `match`，未登记的字符串返回类型化错误，不做静默兜底。

use bytes::Bytes;
use image::{DynamicImage, ImageFormat};

use super::ImageError;

/// 编解码格式族。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Codec {
    Png,
    Jpeg,
    Gif,
}

impl Codec {
    pub(crate) fn image_format(self) -> ImageFormat {
        match self {
            Self::Png => ImageFormat::Png,
            Self::Jpeg => ImageFormat::Jpeg,
            Self::Gif => ImageFormat::Gif,
        }
    }

    /// 透明度归一化策略表。
    ///
    /// 仅 PNG 铺白底；GIF 虽可携带透明色，但保持原样输出。
    pub(crate) fn flattens_alpha(self) -> bool {
        match self {
            Self::Png => true,
            Self::Jpeg => false,
            Self::Gif => false,
        }
    }

    /// `infer` 嗅探出的 MIME 与格式族是否一致。
    pub(crate) fn matches_sniffed_mime(self, mime: &str) -> bool {
        match self {
            Self::Png => mime == "image/png",
            Self::Jpeg => mime == "image/jpeg",
            Self::Gif => mime == "image/gif",
        }
    }
}

/// 请求前缀对应的输出目标。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConversionTarget {
    Png,
    Jpeg,
    Jpg,
    Gif,
}

impl ConversionTarget {
    /// 前缀分派表，按顺序匹配，首个命中者生效。
    pub const ALL: [ConversionTarget; 4] = [Self::Png, Self::Jpeg, Self::Jpg, Self::Gif];

    pub fn prefix(self) -> &'static str {
        match self {
            Self::Png => "/png=",
            Self::Jpeg => "/jpeg=",
            Self::Jpg => "/jpg=",
            Self::Gif => "/gif=",
        }
    }

    /// 响应头 `Content-Type`。
    ///
    /// `/jpg=` 输出 `image/jpg`，与 `/jpeg=` 的 `image/jpeg` 区分，兼容既有客户端。
    pub fn content_type(self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
            Self::Jpg => "image/jpg",
            Self::Gif => "image/gif",
        }
    }

    pub fn codec(self) -> Codec {
        match self {
            Self::Png => Codec::Png,
            Self::Jpeg | Self::Jpg => Codec::Jpeg,
            Self::Gif => Codec::Gif,
        }
    }
}

/// 允许进入下载阶段的远端内容类型。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupportedContentType {
    ImagePng,
    ImageJpeg,
    ImageJpg,
    ImageGif,
}

impl SupportedContentType {
    /// 严格按字面值（区分大小写、不接受参数）解析。
    ///
    /// # 示例
    /// ```rust
    /// use toformat::image_handler::SupportedContentType;
    ///
    /// assert!(SupportedContentType::parse("image/jpg").is_ok());
    /// assert!(SupportedContentType::parse("IMAGE/PNG").is_err());
    /// ```
    pub fn parse(value: &str) -> Result<Self, ImageError> {
        match value {
            "image/png" => Ok(Self::ImagePng),
            "image/jpeg" => Ok(Self::ImageJpeg),
            "image/jpg" => Ok(Self::ImageJpg),
            "image/gif" => Ok(Self::ImageGif),
            other => Err(ImageError::UnsupportedType(format!(
                "不支持的内容类型：{:?}",
                other
            ))),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::ImagePng => "image/png",
            Self::ImageJpeg => "image/jpeg",
            Self::ImageJpg => "image/jpg",
            Self::ImageGif => "image/gif",
        }
    }

    pub fn codec(self) -> Codec {
        match self {
            Self::ImagePng => Codec::Png,
            Self::ImageJpeg | Self::ImageJpg => Codec::Jpeg,
            Self::ImageGif => Codec::Gif,
        }
    }
}

/// 一次转换请求：目标格式 + 源地址。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionRequest {
    pub target: ConversionTarget,
    pub source_url: String,
}

/// 探测阶段输出，只用于决定是否继续下载。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProbeResult {
    pub content_type: SupportedContentType,
    /// `Content-Length` 缺失或无法解析时为 `None`。
    pub declared_length: Option<u64>,
}

/// 下载阶段输出：原始字节与第二次响应声明的内容类型。
pub(crate) struct FetchedImage {
    pub(crate) bytes: Vec<u8>,
    pub(crate) declared_content_type: Option<String>,
}

/// 解码阶段输出，归单个请求独占。
pub(crate) struct DecodedImage {
    pub(crate) image: DynamicImage,
    pub(crate) codec: Codec,
}

/// 编码完成、可直接写入响应体的结果。
#[derive(Debug, Clone)]
pub struct ConvertedImage {
    pub content_type: &'static str,
    pub bytes: Bytes,
}
