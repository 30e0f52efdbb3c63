//! 资源探测：从 URL 推导本地文件名，并通过一次元数据请求获取资源总大小

use reqwest::header::{HeaderMap, ACCEPT_RANGES, CONTENT_LENGTH};
use url::Url;

use crate::core::error::{DownloadError, DownloadResult};

/// 探测得到的远程资源信息，探测完成后不再改变
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resource {
    pub url: String,
    pub name: String,
    pub total_size: u64,
    pub supports_range: bool,
}

/// 取 URL 路径的最后一段作为文件名
///
/// 根路径、以 `/` 结尾的路径以及 `.`/`..` 都视为无效定位符。
pub fn derive_file_name(url: &str) -> DownloadResult<String> {
    let parsed = Url::parse(url)
        .map_err(|e| DownloadError::InvalidLocator(format!("{} ({})", url, e)))?;

    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(DownloadError::InvalidLocator(format!(
            "{} (不支持的协议: {})",
            url,
            parsed.scheme()
        )));
    }

    parsed
        .path_segments()
        .and_then(|mut segments| segments.next_back())
        .filter(|name| !name.is_empty() && *name != "." && *name != "..")
        .map(str::to_string)
        .ok_or_else(|| DownloadError::InvalidLocator(format!("{} (URL 中没有文件名)", url)))
}

/// 从响应头中解析 `Content-Length`
pub fn parse_content_length(headers: &HeaderMap) -> DownloadResult<u64> {
    let value = headers
        .get(CONTENT_LENGTH)
        .ok_or_else(|| DownloadError::UnknownSize("响应头中缺少 Content-Length".to_string()))?;

    value
        .to_str()
        .ok()
        .and_then(|s| s.trim().parse::<u64>().ok())
        .ok_or_else(|| {
            DownloadError::UnknownSize(format!("无法解析 Content-Length: {:?}", value))
        })
}

fn supports_byte_ranges(headers: &HeaderMap) -> bool {
    headers
        .get(ACCEPT_RANGES)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.eq_ignore_ascii_case("bytes"))
        .unwrap_or(false)
}

/// 探测资源：先推导文件名（不涉及网络），再获取大小
///
/// 优先发送 HEAD；HEAD 失败或没有可用的 `Content-Length` 时，
/// 退回到 GET 并丢弃响应体。
pub async fn probe(client: &reqwest::Client, url: &str) -> DownloadResult<Resource> {
    let name = derive_file_name(url)?;

    match client.head(url).send().await {
        Ok(response) if response.status().is_success() => {
            if let Ok(total_size) = parse_content_length(response.headers()) {
                let supports_range = supports_byte_ranges(response.headers());
                return Ok(resource(url, name, total_size, supports_range));
            }
            log::debug!("HEAD 响应中没有可用的 Content-Length，改用 GET 探测: {}", url);
        }
        Ok(response) => {
            log::debug!("HEAD 请求返回 {}，改用 GET 探测: {}", response.status(), url);
        }
        Err(e) => {
            log::debug!("HEAD 请求失败: {}，改用 GET 探测: {}", e, url);
        }
    }

    let response = client
        .get(url)
        .send()
        .await
        .map_err(DownloadError::from_request)?;

    if !response.status().is_success() {
        return Err(DownloadError::Status {
            url: url.to_string(),
            status: response.status(),
        });
    }

    let total_size = parse_content_length(response.headers())?;
    let supports_range = supports_byte_ranges(response.headers());
    // 响应体直接丢弃，只需要头部信息
    drop(response);

    Ok(resource(url, name, total_size, supports_range))
}

fn resource(url: &str, name: String, total_size: u64, supports_range: bool) -> Resource {
    if !supports_range {
        log::warn!("服务器未声明 Accept-Ranges: bytes，分块请求可能失败: {}", url);
    }
    log::info!("探测完成: {} ({} 字节)", name, total_size);
    Resource {
        url: url.to_string(),
        name,
        total_size,
        supports_range,
    }
}
