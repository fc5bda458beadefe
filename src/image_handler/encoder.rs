//! # 编码模块
//!
//! 按目标格式族选择唯一的编码器，整张图编码进内存缓冲后才交给响应层，
//! 保证编码失败时客户端收不到任何半截图片字节。

use std::borrow::Cow;

use bytes::Bytes;
use image::codecs::gif::GifEncoder;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::{DynamicImage, Frame};

use super::source::{Codec, ConversionTarget, ConvertedImage};
use super::{ImageConfig, ImageError, ImageHandler};

impl ImageHandler {
    pub(crate) fn encode(
        image: &DynamicImage,
        target: ConversionTarget,
        config: &ImageConfig,
    ) -> Result<ConvertedImage, ImageError> {
        let mut buffer = Vec::new();

        match target.codec() {
            Codec::Png => image
                .write_with_encoder(PngEncoder::new(&mut buffer))
                .map_err(|e| ImageError::EncodeFailure(format!("PNG 编码失败：{}", e)))?,
            Codec::Jpeg => {
                let encoder = JpegEncoder::new_with_quality(&mut buffer, config.jpeg_quality);
                jpeg_compatible(image)
                    .write_with_encoder(encoder)
                    .map_err(|e| ImageError::EncodeFailure(format!("JPEG 编码失败：{}", e)))?
            }
            Codec::Gif => {
                let mut encoder = GifEncoder::new(&mut buffer);
                encoder
                    .encode_frame(Frame::new(image.to_rgba8()))
                    .map_err(|e| ImageError::EncodeFailure(format!("GIF 编码失败：{}", e)))?;
            }
        }

        Ok(ConvertedImage {
            content_type: target.content_type(),
            bytes: Bytes::from(buffer),
        })
    }
}

/// JPEG 只接受 8 位灰度或 RGB；其余色彩模型直接丢弃 alpha 转成 RGB。
fn jpeg_compatible(image: &DynamicImage) -> Cow<'_, DynamicImage> {
    match image {
        DynamicImage::ImageLuma8(_) | DynamicImage::ImageRgb8(_) => Cow::Borrowed(image),
        other => Cow::Owned(DynamicImage::ImageRgb8(other.to_rgb8())),
    }
}
