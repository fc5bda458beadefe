//! # toformat：在线图片格式转换服务
//!
//! ## 架构总览
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │  客户端  GET /jpg=https://example.test/photo.png          │
//! └───────┬──────────────────────────────────────────────────┘
//!         ↕ HTTP (200 + 图片 / 500 + text/plain)
//! ┌───────┼──────────────────────────────────────────────────┐
//! │       ↕            服务端 (Rust)                         │
//! │                                                          │
//! │  ┌─ server ────── axum 路由：前缀分派 / 示例图 / 文档     │
//! │  │                                                       │
//! │  ├─ image_handler  探测·下载·解码·铺白底·编码             │
//! │  │                                                       │
//! │  ├─ settings       监听地址 + 链路参数（启动时读取一次）  │
//! │  └─ error ──────── AppError（进程级统一错误）             │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! ## 模块职责
//!
//! | 模块 | 职责 |
//! |------|------|
//! | [`error`] | 进程级错误 `AppError` |
//! | [`image_handler`] | 单次转换请求的完整流水线，不依赖 HTTP 框架 |
//! | [`server`] | 路由、响应组装、静态内容、监听循环 |
//! | [`settings`] | 默认值 / JSON 文件 / 环境变量三层配置 |

pub mod error;
pub mod image_handler;
pub mod server;
pub mod settings;
