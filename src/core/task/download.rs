use std::fmt;
use std::sync::OnceLock;

use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use regex::Regex;
use reqwest::header::{CONTENT_RANGE, RANGE};
use reqwest::StatusCode;

use crate::core::error::{DownloadError, DownloadResult};
use super::chunk_manager::ChunkSpec;
use super::retry::RetryStrategy;
use super::storage::OutputFile;

/// 块数据来源
///
/// 生产环境是 HTTP Range 请求；调度器只依赖这个 trait，便于在测试里替换为内存数据。
#[async_trait]
pub trait ChunkSource: Send + Sync {
    /// 拉取 `chunk` 对应的字节，返回的数据长度必须恰好等于 `chunk.length`
    async fn fetch(&self, chunk: ChunkSpec) -> DownloadResult<Bytes>;
}

/// 通过 `Range: bytes=a-b` 请求拉取单个块
#[derive(Debug, Clone)]
pub struct HttpRangeFetcher {
    client: reqwest::Client,
    url: String,
    total_size: Option<u64>,
}

impl HttpRangeFetcher {
    pub fn new(client: reqwest::Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
            total_size: None,
        }
    }

    /// 设置探测到的资源总大小，206 响应中 `Content-Range` 的总长度必须与之一致
    pub fn with_total_size(mut self, total_size: u64) -> Self {
        self.total_size = Some(total_size);
        self
    }
}

#[async_trait]
impl ChunkSource for HttpRangeFetcher {
    async fn fetch(&self, chunk: ChunkSpec) -> DownloadResult<Bytes> {
        // 空区间无法表示成 Range 头
        if chunk.is_empty() {
            return Ok(Bytes::new());
        }

        let mut response = self
            .client
            .get(&self.url)
            .header(RANGE, chunk.range_header())
            .send()
            .await
            .map_err(DownloadError::from_request)?;

        let status = response.status();
        if status == StatusCode::PARTIAL_CONTENT {
            let content_range = response
                .headers()
                .get(CONTENT_RANGE)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string);
            if let Some(content_range) = content_range {
                check_content_range(&content_range, &chunk, self.total_size)?;
            }
        } else if !status.is_success() {
            return Err(DownloadError::Status {
                url: self.url.clone(),
                status,
            });
        }
        // 200 表示服务器忽略了 Range，只有当返回体恰好等于请求长度时才可接受，由下面的长度检查保证

        let mut buffer = BytesMut::with_capacity(chunk.length as usize);
        while let Some(bytes) = response.chunk().await.map_err(DownloadError::from_request)? {
            let received = buffer.len() as u64 + bytes.len() as u64;
            if received > chunk.length {
                return Err(DownloadError::LengthMismatch {
                    expected: chunk.length,
                    actual: received,
                });
            }
            buffer.extend_from_slice(&bytes);
        }

        if buffer.len() as u64 != chunk.length {
            return Err(DownloadError::LengthMismatch {
                expected: chunk.length,
                actual: buffer.len() as u64,
            });
        }

        Ok(buffer.freeze())
    }
}

fn content_range_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^bytes\s+(\d+)-(\d+)/(\d+|\*)$").expect("content-range regex is valid")
    })
}

/// 校验 206 响应的 `Content-Range` 是否正好是请求的区间
///
/// `total_size` 为 `Some` 时还要求总长度一致；服务器返回 `*` 时不做比较。
fn check_content_range(header: &str, chunk: &ChunkSpec, total_size: Option<u64>) -> DownloadResult<()> {
    let mismatch = || DownloadError::RangeMismatch {
        expected: match total_size {
            Some(total) => format!("{}-{}/{}", chunk.offset, chunk.last_byte(), total),
            None => format!("{}-{}", chunk.offset, chunk.last_byte()),
        },
        actual: header.to_string(),
    };

    let caps = content_range_regex().captures(header.trim()).ok_or_else(mismatch)?;
    let start: u64 = caps[1].parse().map_err(|_| mismatch())?;
    let end: u64 = caps[2].parse().map_err(|_| mismatch())?;

    if start != chunk.offset || end != chunk.last_byte() {
        return Err(mismatch());
    }
    if let (Some(expected), Ok(actual)) = (total_size, caps[3].parse::<u64>()) {
        if expected != actual {
            return Err(mismatch());
        }
    }
    Ok(())
}

/// 单个块最终失败的记录
#[derive(Debug)]
pub struct ChunkFailure {
    pub chunk: ChunkSpec,
    pub attempts: usize,
    pub error: DownloadError,
}

impl fmt::Display for ChunkFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} 下载失败（共尝试 {} 次）: {}",
            self.chunk, self.attempts, self.error
        )
    }
}

/// 执行一个块的完整流程：拉取 -> 按偏移写入；按重试策略处理可重试的错误
///
/// 成功时返回写入的字节数。
pub async fn perform_chunk_download<S>(
    source: &S,
    output: &OutputFile,
    chunk: ChunkSpec,
    retry: &RetryStrategy,
) -> Result<u64, ChunkFailure>
where
    S: ChunkSource + ?Sized,
{
    let mut retries = 0;

    loop {
        let result = async {
            let data = source.fetch(chunk).await?;
            output.write_chunk(chunk.offset, &data).await?;
            Ok::<u64, DownloadError>(data.len() as u64)
        }
        .await;

        match result {
            Ok(written) => {
                log::debug!("{} 完成", chunk);
                return Ok(written);
            }
            Err(error) if retry.should_retry(&error, retries) => {
                let delay = retry.get_delay(retries);
                retries += 1;
                log::warn!(
                    "{} 出错: {}，将在 {:?} 后重试 (第 {} 次重试)",
                    chunk,
                    error,
                    delay,
                    retries
                );
                tokio::time::sleep(delay).await;
            }
            Err(error) => {
                return Err(ChunkFailure {
                    chunk,
                    attempts: retries + 1,
                    error,
                });
            }
        }
    }
}
