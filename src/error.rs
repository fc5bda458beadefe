//! 统一错误类型模块
//!
//! # 设计思路
//!
//! 转换链路内部使用 `ImageError`；进程级操作（读取配置、绑定端口、启动服务）
//! 统一返回 `AppError`，由 `main` 打印后退出。
//!
//! # 实现思路
//!
//! - 使用 `thiserror` 派生可读错误消息。
//! - 为 `ImageError` 与 `std::io::Error` 提供 `From` 转换，调用侧直接用 `?`。

use crate::image_handler::ImageError;

/// 应用级统一错误类型
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// 图片处理配置无效
    #[error("图片处理配置无效: {0}")]
    Image(#[from] ImageError),

    /// 网络监听 / 文件读取等 I/O 错误
    #[error("I/O 错误: {0}")]
    Io(#[from] std::io::Error),

    /// 配置文件或环境变量解析失败
    #[error("配置错误: {0}")]
    Settings(String),

    /// 内置资源（示例图片）无法生成
    #[error("内置资源错误: {0}")]
    Asset(String),
}

impl AppError {
    /// `ImageError` 的 `Display` 只有固定短句，这里补上细节便于启动期排查。
    pub fn describe(&self) -> String {
        match self {
            Self::Image(err) => format!("{} ({})", self, err.detail()),
            other => other.to_string(),
        }
    }
}
