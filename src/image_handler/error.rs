//! # 错误模型模块
//!
//! ## 设计思路
//!
//! 使用单一错误枚举承载转换链路中的所有失败分支，避免字符串拼接式错误处理。
//! 对外（HTTP 响应体）只输出固定的英文短句，保持与既有客户端兼容；
//! 变体内携带的细节字符串仅用于日志诊断，不会透传给调用方。

/// 图片转换统一错误类型。
///
/// `Display` 输出即 HTTP 500 响应体，细节通过 [`ImageError::detail`] 读取。
#[derive(Debug, thiserror::Error)]
pub enum ImageError {
    /// 源地址缺失、格式错误、协议不支持或命中内网地址，发生在任何网络请求之前。
    #[error("Invalid image url")]
    InvalidUrl(String),

    /// HEAD 探测请求本身失败（连接、超时、重定向异常）。
    ///
    /// 对外与 `InvalidUrl` 同一短句，日志中按 `probe` 阶段区分。
    #[error("Invalid image url")]
    ProbeFailure(String),

    /// 声明的内容类型不在支持列表中（探测阶段或解码阶段）。
    #[error("Unsupported image type")]
    UnsupportedType(String),

    /// 完整下载失败：传输错误、非 2xx 状态、超时或体积超限。
    #[error("Failed to load image")]
    LoadFailure(String),

    /// 响应体无法按声明格式解码。
    #[error("Failed to decode image")]
    DecodeFailure(String),

    /// 内存图像无法序列化为目标格式。
    #[error("Failed to encode image")]
    EncodeFailure(String),
}

impl ImageError {
    /// 稳定错误码，仅用于日志检索。
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidUrl(_) => "invalid_url",
            Self::ProbeFailure(_) => "probe_failure",
            Self::UnsupportedType(_) => "unsupported_type",
            Self::LoadFailure(_) => "load_failure",
            Self::DecodeFailure(_) => "decode_failure",
            Self::EncodeFailure(_) => "encode_failure",
        }
    }

    /// 出错所处的流水线阶段。
    pub fn stage(&self) -> &'static str {
        match self {
            Self::InvalidUrl(_) => "url",
            Self::ProbeFailure(_) => "probe",
            Self::UnsupportedType(_) => "validate",
            Self::LoadFailure(_) => "fetch",
            Self::DecodeFailure(_) => "decode",
            Self::EncodeFailure(_) => "encode",
        }
    }

    pub fn detail(&self) -> &str {
        match self {
            Self::InvalidUrl(detail)
            | Self::ProbeFailure(detail)
            | Self::UnsupportedType(detail)
            | Self::LoadFailure(detail)
            | Self::DecodeFailure(detail)
            | Self::EncodeFailure(detail) => detail,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_never_leaks_detail() {
        let err = ImageError::DecodeFailure("png: invalid checksum at offset 33".to_string());

        assert_eq!(err.to_string(), "Failed to decode image");
        assert_eq!(err.detail(), "png: invalid checksum at offset 33");
        assert_eq!(err.code(), "decode_failure");
        assert_eq!(err.stage(), "decode");
    }

    #[test]
    fn messages_match_http_contract() {
        assert_eq!(ImageError::InvalidUrl(String::new()).to_string(), "Invalid image url");
        assert_eq!(ImageError::ProbeFailure(String::new()).to_string(), "Invalid image url");
        assert_eq!(
            ImageError::UnsupportedType(String::new()).to_string(),
            "Unsupported image type"
        );
        assert_eq!(ImageError::LoadFailure(String::new()).to_string(), "Failed to load image");
        assert_eq!(
            ImageError::EncodeFailure(String::new()).to_string(),
            "Failed to encode image"
        );
    }

    #[test]
    fn url_rejection_and_probe_failure_log_distinct_stages() {
        let rejected = ImageError::InvalidUrl("URL 格式错误".to_string());
        let unreachable = ImageError::ProbeFailure("connection refused".to_string());

        assert_eq!(rejected.to_string(), unreachable.to_string());
        assert_eq!((rejected.code(), rejected.stage()), ("invalid_url", "url"));
        assert_eq!((unreachable.code(), unreachable.stage()), ("probe_failure", "probe"));
    }
}
