//! 进程配置：监听地址 + 转换链路参数。
//!
//! 读取顺序：默认值 → `TOFORMAT_SETTINGS` 指向的 JSON 文件 → 单项环境变量覆盖。
//! 只在启动时读取一次，运行期不再变化。

use std::fs;
use std::net::SocketAddr;
use std::path::Path;

use serde::Deserialize;

use crate::error::AppError;
use crate::image_handler::ImageConfig;

pub const SETTINGS_PATH_ENV: &str = "TOFORMAT_SETTINGS";
pub const BIND_ENV: &str = "TOFORMAT_BIND";
pub const ALLOW_PRIVATE_NETWORK_ENV: &str = "TOFORMAT_ALLOW_PRIVATE_NETWORK";
pub const MAX_FILE_SIZE_ENV: &str = "TOFORMAT_MAX_FILE_SIZE";

const DEFAULT_BIND: &str = "0.0.0.0:3000";

#[derive(Debug, Clone)]
pub struct Settings {
    pub bind_addr: SocketAddr,
    pub image: ImageConfig,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct SettingsFile {
    bind: Option<String>,
    image: ImageConfig,
}

impl Settings {
    /// 从真实进程环境读取。
    pub fn load() -> Result<Self, AppError> {
        Self::load_with(|key| std::env::var(key).ok())
    }

    /// 以任意键值来源读取，便于测试注入。
    pub fn load_with<F>(env: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let file = match env(SETTINGS_PATH_ENV) {
            Some(path) => Self::read_file(Path::new(&path))?,
            None => SettingsFile::default(),
        };

        let bind = env(BIND_ENV)
            .or(file.bind)
            .unwrap_or_else(|| DEFAULT_BIND.to_string());
        let bind_addr = bind
            .parse::<SocketAddr>()
            .map_err(|e| AppError::Settings(format!("监听地址无效 {:?}: {}", bind, e)))?;

        let mut image = file.image;
        if let Some(value) = env(ALLOW_PRIVATE_NETWORK_ENV) {
            image.allow_private_network = parse_bool(ALLOW_PRIVATE_NETWORK_ENV, &value)?;
        }
        if let Some(value) = env(MAX_FILE_SIZE_ENV) {
            image.max_file_size = value.trim().parse::<u64>().map_err(|e| {
                AppError::Settings(format!("{} 无效 {:?}: {}", MAX_FILE_SIZE_ENV, value, e))
            })?;
        }
        image.validate()?;

        log::debug!(
            "⚙️ 配置已加载 - bind={} allow_private_network={} max_file_size={}",
            bind_addr,
            image.allow_private_network,
            image.max_file_size
        );

        Ok(Self { bind_addr, image })
    }

    fn read_file(path: &Path) -> Result<SettingsFile, AppError> {
        let content = fs::read_to_string(path)?;
        serde_json::from_str::<SettingsFile>(&content)
            .map_err(|e| AppError::Settings(format!("解析设置文件失败 {}: {}", path.display(), e)))
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool, AppError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(AppError::Settings(format!("{} 无效：{:?}", key, other))),
    }
}
