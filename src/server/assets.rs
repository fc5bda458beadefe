//! # 内置静态内容
//!
//! 文档在编译期嵌入，示例图片在启动时渲染一次，此后全进程只读共享。

use std::io::Cursor;

use bytes::Bytes;
use image::{DynamicImage, ImageBuffer, ImageFormat, Rgb, Rgba};
use once_cell::sync::Lazy;

use crate::error::AppError;

const WEB_DOC: &str = include_str!("../../assets/index.html");

const TERMINAL_DOC: &str = "\
# toformat.link Terminal Documentation
-------------------------------
## Format to PNG
curl -L toformat.link/png=https://toformat.link/img.jpg > img.png

## Format to GIF
curl -L toformat.link/gif=https://toformat.link/img.jpg > img.gif

## Format to JPG
curl -L toformat.link/jpg=https://toformat.link/img.png > img.jpg

## Format to JPEG
curl -L toformat.link/jpeg=https://toformat.link/img.png > img.jpeg

";

const SAMPLE_SIZE: u32 = 64;

static SAMPLES: Lazy<Result<Samples, String>> = Lazy::new(Samples::render);

/// 示例图片的已编码字节。
#[derive(Debug, Clone)]
pub struct Samples {
    pub png: Bytes,
    pub jpg: Bytes,
}

impl Samples {
    fn render() -> Result<Self, String> {
        Ok(Self {
            png: encode_sample(sample_with_alpha(), ImageFormat::Png)?,
            jpg: encode_sample(sample_opaque(), ImageFormat::Jpeg)?,
        })
    }
}

pub struct Documentation {
    pub content_type: &'static str,
    pub body: &'static str,
}

/// 命令行客户端返回纯文本，其余返回 HTML。
pub fn documentation(user_agent: Option<&str>) -> Documentation {
    if user_agent.is_some_and(|ua| ua.contains("curl")) {
        Documentation {
            content_type: "text/plain",
            body: TERMINAL_DOC,
        }
    } else {
        Documentation {
            content_type: "text/html",
            body: WEB_DOC,
        }
    }
}

/// 取示例图片；首次调用时渲染，失败结果同样被缓存。
///
/// 启动阶段会先调用一次，渲染失败时服务直接拒绝启动。
pub fn samples() -> Result<&'static Samples, AppError> {
    SAMPLES
        .as_ref()
        .map_err(|err| AppError::Asset(format!("示例图片渲染失败: {}", err)))
}

// 四角透明，转 JPEG 时能直接看到铺白底效果。
fn sample_with_alpha() -> DynamicImage {
    let center = SAMPLE_SIZE as f32 / 2.0;
    DynamicImage::ImageRgba8(ImageBuffer::from_fn(SAMPLE_SIZE, SAMPLE_SIZE, |x, y| {
        let dx = x as f32 - center;
        let dy = y as f32 - center;
        let alpha = if (dx * dx + dy * dy).sqrt() <= center { 255 } else { 0 };
        Rgba([(x * 4) as u8, (y * 4) as u8, 160, alpha])
    }))
}

fn sample_opaque() -> DynamicImage {
    DynamicImage::ImageRgb8(ImageBuffer::from_fn(SAMPLE_SIZE, SAMPLE_SIZE, |x, y| {
        Rgb([(y * 4) as u8, 120, (x * 4) as u8])
    }))
}

fn encode_sample(image: DynamicImage, format: ImageFormat) -> Result<Bytes, String> {
    let mut cursor = Cursor::new(Vec::new());
    image
        .write_to(&mut cursor, format)
        .map_err(|err| format!("{:?}: {}", format, err))?;
    Ok(Bytes::from(cursor.into_inner()))
}
