//! # 解码与透明度归一化模块
//!
//! ## 设计思路
//!
//! 将“字节 → 图像 → 无透明通道图像”的过程集中管理，并在关键节点增加资源上限控制。
//! 优先做类型复核与尺寸检查，再进行完整解码，降低恶意输入触发高内存开销的风险。
//!
//! ## 实现思路
//!
//! 1. 复核下载响应声明的类型（必须受支持，且与探测结果同一格式族）
//! 2. 文件签名嗅探，确认字节内容与声明格式一致
//! 3. 读取 header 尺寸，按像素上限快速拒绝
//! 4. 按格式族完整解码
//! 5. 按策略表决定是否铺白底

use image::{DynamicImage, GenericImageView, Rgb, RgbImage};
use std::io::Cursor;

use super::source::{DecodedImage, FetchedImage, SupportedContentType};
use super::{ImageConfig, ImageError, ImageHandler};

impl ImageHandler {
    /// 将下载到的字节解码为内存图像。
    ///
    /// `probed` 为探测阶段确认过的类型；实际使用的是下载响应自己声明的类型。
    pub(crate) fn decode(
        fetched: FetchedImage,
        probed: SupportedContentType,
        config: &ImageConfig,
    ) -> Result<DecodedImage, ImageError> {
        let declared = fetched.declared_content_type.as_deref().unwrap_or("");
        let content_type = SupportedContentType::parse(declared)?;

        if content_type.codec() != probed.codec() {
            log::warn!(
                "⚠️ 探测与下载声明的类型不一致：HEAD={} GET={}",
                probed.as_str(),
                content_type.as_str()
            );
            return Err(ImageError::UnsupportedType(format!(
                "探测类型 {} 与下载类型 {} 不一致",
                probed.as_str(),
                content_type.as_str()
            )));
        }

        let codec = content_type.codec();
        let bytes = fetched.bytes;

        if bytes.is_empty() {
            return Err(ImageError::DecodeFailure("图片内容为空".to_string()));
        }

        if let Some(kind) = infer::get(&bytes) {
            if !codec.matches_sniffed_mime(kind.mime_type()) {
                return Err(ImageError::DecodeFailure(format!(
                    "文件签名 {} 与声明类型 {} 不符",
                    kind.mime_type(),
                    content_type.as_str()
                )));
            }
        }

        let format = codec.image_format();
        let (header_width, header_height) =
            image::ImageReader::with_format(Cursor::new(&bytes), format)
                .into_dimensions()
                .map_err(|e| ImageError::DecodeFailure(format!("无法读取图片尺寸：{}", e)))?;
        Self::validate_pixel_limits(config, header_width, header_height)?;

        let image = image::load_from_memory_with_format(&bytes, format)
            .map_err(|e| ImageError::DecodeFailure(format!("图片解码失败：{}", e)))?;

        let (width, height) = image.dimensions();
        log::debug!(
            "🧩 解码完成 - 类型: {} 尺寸: {}x{} 色彩: {:?}",
            content_type.as_str(),
            width,
            height,
            image.color()
        );

        Ok(DecodedImage { image, codec })
    }

    /// 按格式族策略表执行透明度归一化。
    pub(crate) fn normalize(decoded: DecodedImage) -> DynamicImage {
        if decoded.codec.flattens_alpha() {
            DynamicImage::ImageRgb8(flatten_onto_white(&decoded.image))
        } else {
            decoded.image
        }
    }

    /// 校验像素数量是否超过配置上限。
    fn validate_pixel_limits(config: &ImageConfig, width: u32, height: u32) -> Result<(), ImageError> {
        let pixels = (width as u64)
            .checked_mul(height as u64)
            .ok_or_else(|| ImageError::DecodeFailure("图片像素数溢出".to_string()))?;

        if pixels > config.max_decoded_pixels {
            return Err(ImageError::DecodeFailure(format!(
                "图片像素过大：{} 像素（限制：{} 像素）",
                pixels, config.max_decoded_pixels
            )));
        }

        Ok(())
    }
}

/// 以 source-over 方式将图像合成到不透明白色画布上。
///
/// 输出不含 alpha 通道，可直接交给不支持透明度的编码器。
pub(crate) fn flatten_onto_white(image: &DynamicImage) -> RgbImage {
    let rgba = image.to_rgba8();
    let (width, height) = rgba.dimensions();
    let mut canvas = RgbImage::from_pixel(width, height, Rgb([255, 255, 255]));

    for (dst, src) in canvas.pixels_mut().zip(rgba.pixels()) {
        let [r, g, b, a] = src.0;
        *dst = Rgb([
            blend_over_white(r, a),
            blend_over_white(g, a),
            blend_over_white(b, a),
        ]);
    }

    canvas
}

fn blend_over_white(channel: u8, alpha: u8) -> u8 {
    let c = channel as u32;
    let a = alpha as u32;
    ((c * a + 255 * (255 - a) + 127) / 255) as u8
}
