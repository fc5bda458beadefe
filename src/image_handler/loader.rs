//! # 探测与下载模块
//!
//! ## 设计思路
//!
//! 远端资源分两次请求获取：先 `HEAD` 探测声明的内容类型与体积，确认是支持的图片后再 `GET` 完整下载。
//! 目标是尽快失败，不为不支持的类型传输任何响应体。
//!
//! ## 实现思路
//!
//! - URL：语法 + 协议 + 主机字面值校验，全部在发出网络请求之前完成。
//! - 域名：每一跳都先用 `lookup_host` 解析，任一结果命中内网即拒绝；
//!   通过后把解析结果钉进客户端（`resolve`），连接阶段不再二次解析。
//! - 重定向：客户端不自动跟随，逐跳取 `Location` 重新走一遍上述校验。
//! - 探测：只读响应头；内容类型按字面值精确匹配。
//! - 下载：流式分块读取，首包与分块分别设置超时，累计体积超限立即中止。
//! - 两次请求彼此独立，下载阶段声明的类型会在解码前重新校验（见 `pipeline`）。

use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use tokio::net::lookup_host;

use super::source::{FetchedImage, ProbeResult, SupportedContentType};
use super::{ImageConfig, ImageError, ImageHandler};

const BUFFER_INITIAL_CAPACITY: usize = 16 * 1024;

impl ImageHandler {
    /// 解析并校验源地址。
    ///
    /// 任何失败都发生在网络请求之前。
    pub(crate) fn parse_source_url(
        url: &str,
        config: &ImageConfig,
    ) -> Result<reqwest::Url, ImageError> {
        if url.is_empty() {
            return Err(ImageError::InvalidUrl("源地址为空".to_string()));
        }

        let parsed = reqwest::Url::parse(url)
            .map_err(|e| ImageError::InvalidUrl(format!("URL 格式错误：{}", e)))?;

        if parsed.scheme() != "http" && parsed.scheme() != "https" {
            return Err(ImageError::InvalidUrl(format!(
                "仅支持 HTTP/HTTPS：{}",
                parsed.scheme()
            )));
        }

        let host = parsed
            .host_str()
            .ok_or_else(|| ImageError::InvalidUrl("URL 缺少主机地址".to_string()))?;

        if !config.allow_private_network && Self::is_blocked_host(host) {
            return Err(ImageError::InvalidUrl(format!(
                "禁止访问本地或内网地址：{}",
                host
            )));
        }

        Ok(parsed)
    }

    /// 只取响应头的探测请求。
    pub(crate) async fn probe(
        &self,
        url: &reqwest::Url,
        config: &ImageConfig,
    ) -> Result<ProbeResult, ImageError> {
        log::debug!("🔎 HEAD 探测 - URL: {}", Self::redact_url_for_log(url.as_str()));

        let response = self
            .send_following_redirects(reqwest::Method::HEAD, url, config, ImageError::ProbeFailure)
            .await?;

        let declared_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|ct| ct.to_str().ok())
            .unwrap_or("");
        let content_type = SupportedContentType::parse(declared_type)?;

        let declared_length = Self::declared_content_length(response.headers());
        if let Some(size) = declared_length {
            Self::check_file_size(size, config)?;
        }

        Ok(ProbeResult {
            content_type,
            declared_length,
        })
    }

    /// 完整下载响应体。
    ///
    /// 传输错误、非 2xx、超时与体积超限统一归为 `LoadFailure`。
    pub(crate) async fn fetch(
        &self,
        url: &reqwest::Url,
        config: &ImageConfig,
    ) -> Result<FetchedImage, ImageError> {
        log::debug!("📡 GET 下载 - URL: {}", Self::redact_url_for_log(url.as_str()));

        let mut response = self
            .send_following_redirects(reqwest::Method::GET, url, config, ImageError::LoadFailure)
            .await?;

        if !response.status().is_success() {
            return Err(ImageError::LoadFailure(format!(
                "HTTP {}",
                response.status().as_u16()
            )));
        }

        let declared_content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|ct| ct.to_str().ok())
            .map(str::to_string);

        let total_len = Self::declared_content_length(response.headers());
        if let Some(size) = total_len {
            Self::check_file_size(size, config)?;
        }

        let initial_capacity = total_len
            .map(|len| len.min(config.max_file_size).min(usize::MAX as u64) as usize)
            .filter(|len| *len > 0)
            .unwrap_or(BUFFER_INITIAL_CAPACITY);
        let mut buffer = Vec::with_capacity(initial_capacity);
        let mut total: u64 = 0;
        let mut received_first_chunk = false;

        loop {
            let read_timeout = if received_first_chunk {
                Duration::from_millis(config.stream_chunk_timeout_ms)
            } else {
                Duration::from_millis(config.stream_first_byte_timeout_ms)
            };

            let next_chunk = tokio::time::timeout(read_timeout, response.chunk())
                .await
                .map_err(|_| {
                    if received_first_chunk {
                        ImageError::LoadFailure("下载数据流读取超时".to_string())
                    } else {
                        ImageError::LoadFailure("下载首包超时".to_string())
                    }
                })?;

            let Some(chunk) =
                next_chunk.map_err(|e| ImageError::LoadFailure(format!("下载失败：{}", e)))?
            else {
                break;
            };

            received_first_chunk = true;
            total = total.saturating_add(chunk.len() as u64);
            if total > config.max_file_size {
                return Err(ImageError::LoadFailure("下载内容超过大小限制".to_string()));
            }
            buffer.extend_from_slice(&chunk);
        }

        log::debug!("✅ 下载完成 - {} bytes", total);

        Ok(FetchedImage {
            bytes: buffer,
            declared_content_type,
        })
    }

    /// 发送请求并手动跟随重定向。
    ///
    /// 主机校验失败一律是 `InvalidUrl`；传输、解析与重定向异常交给 `transport_error`
    /// 按所处阶段归类。
    async fn send_following_redirects(
        &self,
        method: reqwest::Method,
        url: &reqwest::Url,
        config: &ImageConfig,
        transport_error: fn(String) -> ImageError,
    ) -> Result<reqwest::Response, ImageError> {
        let mut current_url = url.clone();
        let mut redirects = 0;

        loop {
            let client = self.client_for_url(&current_url, config, transport_error).await?;
            let response = client
                .request(method.clone(), current_url.clone())
                .send()
                .await
                .map_err(|e| {
                    transport_error(Self::describe_reqwest_error(&e, current_url.as_str(), config))
                })?;

            if !response.status().is_redirection() {
                return Ok(response);
            }

            if redirects >= config.max_redirects {
                return Err(transport_error(format!(
                    "重定向次数超过限制（{}）",
                    config.max_redirects
                )));
            }

            let location = response
                .headers()
                .get(reqwest::header::LOCATION)
                .and_then(|value| value.to_str().ok())
                .ok_or_else(|| transport_error("重定向响应缺少 Location 头".to_string()))?;

            let next_url = current_url
                .join(location)
                .map_err(|e| transport_error(format!("重定向 URL 解析失败：{}", e)))?;

            Self::parse_source_url(next_url.as_str(), config)?;

            log::debug!("↪️ 跳转到: {}", Self::redact_url_for_log(next_url.as_str()));
            current_url = next_url;
            redirects += 1;
        }
    }

    /// 为本跳挑选客户端。
    ///
    /// 允许内网或主机本身是 IP 字面值时复用共享客户端；域名则解析后钉住地址。
    async fn client_for_url(
        &self,
        url: &reqwest::Url,
        config: &ImageConfig,
        transport_error: fn(String) -> ImageError,
    ) -> Result<reqwest::Client, ImageError> {
        if config.allow_private_network {
            return Ok(self.client.clone());
        }

        let host = url
            .host_str()
            .ok_or_else(|| ImageError::InvalidUrl("URL 缺少主机地址".to_string()))?;

        if Self::is_blocked_host(host) {
            return Err(ImageError::InvalidUrl(format!(
                "禁止访问本地或内网地址：{}",
                host
            )));
        }

        if Self::host_literal(host).parse::<IpAddr>().is_ok() {
            return Ok(self.client.clone());
        }

        let port = url
            .port_or_known_default()
            .ok_or_else(|| ImageError::InvalidUrl("URL 缺少端口信息".to_string()))?;

        let pinned = Self::resolve_public_socket_addrs(host, port, transport_error).await?;
        let addr = pinned
            .first()
            .copied()
            .ok_or_else(|| transport_error(format!("URL 未解析到有效地址：{}", host)))?;

        Self::client_builder(config)
            .resolve(host, addr)
            .build()
            .map_err(|e| transport_error(format!("无法创建 DNS 绑定客户端：{}", e)))
    }

    async fn resolve_public_socket_addrs(
        host: &str,
        port: u16,
        transport_error: fn(String) -> ImageError,
    ) -> Result<Vec<SocketAddr>, ImageError> {
        let addrs = lookup_host((host, port))
            .await
            .map_err(|e| transport_error(format!("URL 主机解析失败：{}", e)))?;

        Self::ensure_public_addrs(host, addrs)
    }

    /// 任一解析结果落在内网即整体拒绝。
    fn ensure_public_addrs(
        host: &str,
        addrs: impl IntoIterator<Item = SocketAddr>,
    ) -> Result<Vec<SocketAddr>, ImageError> {
        let mut result = Vec::new();
        for addr in addrs {
            if Self::is_private_or_local_ip(addr.ip()) {
                return Err(ImageError::InvalidUrl(format!(
                    "{} 解析结果命中内网地址：{}",
                    host,
                    addr.ip()
                )));
            }

            result.push(addr);
        }

        Ok(result)
    }

    pub(crate) fn build_http_client(config: &ImageConfig) -> Result<reqwest::Client, ImageError> {
        Self::client_builder(config)
            .build()
            .map_err(|e| ImageError::LoadFailure(format!("无法创建 HTTP 客户端：{}", e)))
    }

    fn client_builder(config: &ImageConfig) -> reqwest::ClientBuilder {
        reqwest::Client::builder()
            .timeout(Duration::from_secs(config.download_timeout))
            .connect_timeout(Duration::from_secs(config.connect_timeout))
            .redirect(reqwest::redirect::Policy::none())
            .user_agent(concat!("toformat/", env!("CARGO_PKG_VERSION")))
    }

    fn declared_content_length(headers: &reqwest::header::HeaderMap) -> Option<u64> {
        headers
            .get(reqwest::header::CONTENT_LENGTH)
            .and_then(|cl| cl.to_str().ok())
            .and_then(|cl| cl.trim().parse::<u64>().ok())
    }

    fn check_file_size(size: u64, config: &ImageConfig) -> Result<(), ImageError> {
        if size > config.max_file_size {
            return Err(ImageError::LoadFailure(format!(
                "文件过大：{:.2} MB（限制：{:.2} MB）",
                size as f64 / 1024.0 / 1024.0,
                config.max_file_size as f64 / 1024.0 / 1024.0
            )));
        }

        Ok(())
    }

    /// 去掉 query 与 fragment，避免签名参数等敏感信息进入日志。
    pub(crate) fn redact_url_for_log(url: &str) -> String {
        let Ok(parsed) = reqwest::Url::parse(url) else {
            return "<invalid-url>".to_string();
        };

        let host = parsed.host_str().unwrap_or("<unknown-host>");
        let port = parsed.port().map(|p| format!(":{}", p)).unwrap_or_default();
        let path = parsed.path();

        format!("{}://{}{}{}", parsed.scheme(), host, port, path)
    }

    fn sanitize_error_message_with_redacted_url(error_msg: &str, url: &str) -> String {
        let redacted = Self::redact_url_for_log(url);
        error_msg.replace(url, &redacted)
    }

    fn describe_reqwest_error(e: &reqwest::Error, url: &str, config: &ImageConfig) -> String {
        let err_msg = Self::sanitize_error_message_with_redacted_url(&e.to_string(), url);

        if e.is_timeout() {
            format!("请求超时（{}秒）", config.download_timeout)
        } else if e.is_connect() {
            format!("无法连接：{}", err_msg)
        } else {
            format!("请求失败：{}", err_msg)
        }
    }

    fn is_blocked_host(host: &str) -> bool {
        if Self::is_local_hostname(host) {
            return true;
        }

        Self::host_literal(host)
            .parse::<IpAddr>()
            .map(Self::is_private_or_local_ip)
            .unwrap_or(false)
    }

    /// IPv6 主机在 URL 中带方括号。
    fn host_literal(host: &str) -> &str {
        host.trim_start_matches('[').trim_end_matches(']')
    }

    /// 判断主机名是否指向本地地址。
    fn is_local_hostname(host: &str) -> bool {
        host.eq_ignore_ascii_case("localhost")
            || host.eq_ignore_ascii_case("localhost.")
            || host.ends_with(".local")
    }

    /// 判断 IP 是否属于本地/内网/链路本地等受限范围。
    fn is_private_or_local_ip(ip: IpAddr) -> bool {
        match ip {
            IpAddr::V4(v4) => {
                if v4.is_private()
                    || v4.is_loopback()
                    || v4.is_link_local()
                    || v4.is_broadcast()
                    || v4.is_documentation()
                    || v4.is_unspecified()
                    || v4.is_multicast()
                {
                    return true;
                }

                // 0.0.0.0/8 与运营商级 NAT 100.64.0.0/10
                let octets = v4.octets();
                octets[0] == 0 || (octets[0] == 100 && (octets[1] & 0b1100_0000) == 0b0100_0000)
            }
            IpAddr::V6(v6) => {
                // ::ffff:a.b.c.d 实际连的是 IPv4
                if let Some(v4) = v6.to_ipv4_mapped() {
                    return Self::is_private_or_local_ip(IpAddr::V4(v4));
                }

                v6.is_loopback()
                    || v6.is_unspecified()
                    || v6.is_unique_local()
                    || v6.is_unicast_link_local()
                    || v6.is_multicast()
            }
        }
    }
}
