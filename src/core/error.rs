use thiserror::Error;
use std::io;

/// 下载过程中可能出现的错误
///
/// 分为两类：
/// - 致命错误（定位符无效、大小未知、目标文件无法分配、配置错误）：直接终止整个下载
/// - 分块错误（网络、超时、状态码、长度不符、写入失败）：只影响出错的那一块
#[derive(Error, Debug)]
pub enum DownloadError {
    #[error("无效的URL: {0}")]
    InvalidLocator(String),

    #[error("无法确定资源大小: {0}")]
    UnknownSize(String),

    #[error("{context}: {source}")]
    Storage {
        context: String,
        #[source]
        source: io::Error,
    },

    #[error("网络错误: {0}")]
    Network(#[from] reqwest::Error),

    #[error("请求超时")]
    Timeout,

    #[error("服务器返回错误状态 {status}: {url}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },

    #[error("数据长度不匹配: 预期 {expected} 字节, 实际 {actual} 字节")]
    LengthMismatch {
        expected: u64,
        actual: u64,
    },

    #[error("返回的字节区间不匹配: 请求 {expected}, 实际 {actual}")]
    RangeMismatch {
        expected: String,
        actual: String,
    },

    #[error("下载任务异常退出: {0}")]
    TaskAborted(String),

    #[error("配置无效: {0}")]
    Config(String),
}

impl DownloadError {
    /// 由 reqwest 错误构造，超时单独归类
    pub fn from_request(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            DownloadError::Timeout
        } else {
            DownloadError::Network(err)
        }
    }

    pub fn is_retryable(&self) -> bool {
        match self {
            DownloadError::Network(_)
            | DownloadError::Timeout
            | DownloadError::LengthMismatch { .. } => true,
            DownloadError::Status { status, .. } => {
                status.is_server_error() || *status == reqwest::StatusCode::TOO_MANY_REQUESTS
            }
            _ => false,
        }
    }

    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            DownloadError::InvalidLocator(_)
                | DownloadError::UnknownSize(_)
                | DownloadError::Config(_)
        )
    }
}

/// 为 io 错误附加上下文信息
///
/// `io::Error` 本身不携带路径，也不说明当时在做什么；
/// 这里提供类似 `anyhow::Context` 的写法，但仍然产出带类型的 `DownloadError::Storage`。
pub(crate) trait ErrContext<T> {
    fn context(self, context: impl Into<String>) -> Result<T, DownloadError>;
}

impl<T, E: Into<io::Error>> ErrContext<T> for Result<T, E> {
    fn context(self, context: impl Into<String>) -> Result<T, DownloadError> {
        self.map_err(|err| DownloadError::Storage {
            context: context.into(),
            source: err.into(),
        })
    }
}

pub type DownloadResult<T> = Result<T, DownloadError>;

#[cfg(test)]
mod tests {
    use super::*;

    fn status(code: u16) -> DownloadError {
        DownloadError::Status {
            url: "http://example.com/a.bin".to_string(),
            status: reqwest::StatusCode::from_u16(code).unwrap(),
        }
    }

    #[test]
    fn test_error_retryable() {
        assert!(DownloadError::Timeout.is_retryable());
        assert!(status(503).is_retryable());
        assert!(status(429).is_retryable());
        assert!(DownloadError::LengthMismatch { expected: 10, actual: 4 }.is_retryable());

        assert!(!status(416).is_retryable());
        assert!(!status(404).is_retryable());
        let storage = DownloadError::Storage {
            context: "写入失败".to_string(),
            source: io::Error::new(io::ErrorKind::Other, "disk full"),
        };
        assert!(!storage.is_retryable());
    }

    #[test]
    fn test_error_fatal() {
        assert!(DownloadError::InvalidLocator("http://example.com/".to_string()).is_fatal());
        assert!(DownloadError::UnknownSize("缺少 Content-Length".to_string()).is_fatal());
        assert!(DownloadError::Config("线程数必须大于0".to_string()).is_fatal());
        assert!(!DownloadError::Timeout.is_fatal());
        assert!(!status(500).is_fatal());
    }

    #[test]
    fn test_error_context() {
        let result: Result<(), io::Error> =
            Err(io::Error::new(io::ErrorKind::PermissionDenied, "denied"));
        let err = result.context("无法创建文件 out.bin").unwrap_err();
        match err {
            DownloadError::Storage { context, source } => {
                assert_eq!(context, "无法创建文件 out.bin");
                assert_eq!(source.kind(), io::ErrorKind::PermissionDenied);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_length_mismatch_message() {
        let err = DownloadError::LengthMismatch { expected: 32768, actual: 100 };
        assert_eq!(err.to_string(), "数据长度不匹配: 预期 32768 字节, 实际 100 字节");
    }
}
