use serde::{Deserialize, Serialize};
use std::fs;
use std::num::NonZeroU64;
use std::path::Path;
use std::time::Duration;
use crate::core::error::{DownloadError, ErrContext};
use crate::core::scheduler::{SchedulerOptions, SchedulingMode};
use crate::core::task::RetryStrategy;

/// 配置结构体
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct Config {
    /// 分块大小（字节）
    pub chunk_size: u64,
    /// 每一波（或任务池中）同时下载的块数
    pub max_concurrency: usize,
    /// 调度方式：waves 或 pool
    pub scheduling: SchedulingMode,
    /// 单次请求超时时间（秒）
    pub timeout: u64,
    /// 建立连接超时时间（秒）
    pub connect_timeout: u64,
    /// User-Agent
    pub user_agent: String,
    /// 每个块的重试次数
    pub retry_count: usize,
    /// 重试延迟（秒）
    pub retry_delay: u64,
    /// 最大重试延迟（秒）
    pub retry_max_delay: u64,
    /// 有块失败时是否以非零状态退出
    pub strict: bool,
    /// 默认下载目录
    pub download_dir: String,
    /// 是否显示进度条
    pub show_progress: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            chunk_size: 32768,
            max_concurrency: 4,
            scheduling: SchedulingMode::Waves,
            timeout: 30,
            connect_timeout: 10,
            user_agent: format!("rangedown/{}", env!("CARGO_PKG_VERSION")),
            retry_count: 2,
            retry_delay: 1,
            retry_max_delay: 30,
            strict: false,
            download_dir: ".".to_string(),
            show_progress: true,
        }
    }
}

impl Config {
    /// 加载配置文件，文件不存在时写入带说明的默认配置
    pub fn load(path: &str) -> Result<Self, DownloadError> {
        if Path::new(path).exists() {
            let content = fs::read_to_string(path)
                .context(format!("无法读取配置文件 {}", path))?;
            toml::from_str(&content)
                .map_err(|e| DownloadError::Config(format!("配置文件格式错误 {}: {}", path, e)))
        } else {
            let config = Config::default();
            config.save_with_tutorial(path)?;
            log::info!("已生成默认配置文件: {}", path);
            Ok(config)
        }
    }

    /// 保存带教程的配置文件（唯一写入方法）
    pub fn save_with_tutorial(&self, path: &str) -> Result<(), DownloadError> {
        if let Some(parent) = Path::new(path).parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .context(format!("无法创建配置目录 {}", parent.display()))?;
        }
        let config_content = toml::to_string_pretty(self)
            .map_err(|e| DownloadError::Config(format!("无法序列化配置: {}", e)))?;
        let full_content = format!("{}\n{}", Config::generate_tutorial_content(), config_content);
        fs::write(path, full_content)
            .context(format!("无法写入配置文件 {}", path))?;
        Ok(())
    }

    /// 生成配置文件教程内容（静态方法）
    fn generate_tutorial_content() -> &'static str {
        r#"# rangedown 配置文件
# ====================
#
# TOML 格式。命令行参数会覆盖这里的设置，优先级：命令行 > 配置文件 > 默认值
#
# chunk_size       分块大小（字节），默认 32768
# max_concurrency  每波同时下载的块数，默认 4
# scheduling       "waves"：分批启动，批次之间同步等待
#                  "pool" ：固定容量任务池，任一块完成立即补位
# timeout          单次请求超时（秒），超时的块按失败处理
# connect_timeout  建立连接超时（秒）
# retry_count      每个块的重试次数，0 表示不重试
# retry_delay      第一次重试前的等待（秒），之后指数退避
# retry_max_delay  重试等待的上限（秒）
# strict           true 时只要有块失败就以非零状态退出
# download_dir     下载目录
# show_progress    是否显示进度条
#
# 使用示例：
#   rangedown https://example.com/file.zip
#   rangedown -t 8 -s 1048576 https://example.com/file.zip
#   rangedown --mode pool --strict https://example.com/file.zip
"#
    }

    /// 校验配置合法性
    pub fn validate(&self) -> Result<(), DownloadError> {
        if self.chunk_size == 0 {
            return Err(DownloadError::Config("分块大小必须大于0".to_string()));
        }
        if self.max_concurrency == 0 {
            return Err(DownloadError::Config("并发数必须大于0".to_string()));
        }
        if self.timeout == 0 {
            return Err(DownloadError::Config("超时时间必须大于0".to_string()));
        }
        if self.connect_timeout == 0 {
            return Err(DownloadError::Config("连接超时时间必须大于0".to_string()));
        }
        if self.download_dir.is_empty() {
            return Err(DownloadError::Config("下载目录不能为空".to_string()));
        }
        if self.retry_max_delay < self.retry_delay {
            return Err(DownloadError::Config("最大重试延迟不能小于重试延迟".to_string()));
        }
        Ok(())
    }

    /// 合并命令行参数到配置
    pub fn merge_from_args(&mut self, args: &crate::cli::Args) {
        // 命令行参数覆盖配置文件
        if let Some(chunk_size) = args.chunk_size {
            self.chunk_size = chunk_size;
        }
        if let Some(threads) = args.threads {
            self.max_concurrency = threads;
        }
        if let Some(mode) = args.mode {
            self.scheduling = mode;
        }
        if let Some(retries) = args.retries {
            self.retry_count = retries;
        }
        if let Some(timeout) = args.timeout {
            self.timeout = timeout;
        }
        if let Some(dir) = &args.download_dir {
            self.download_dir = dir.clone();
        }
        if args.strict {
            self.strict = true;
        }
        if args.quiet {
            self.show_progress = false;
        }
    }

    pub fn chunk_size(&self) -> Result<NonZeroU64, DownloadError> {
        NonZeroU64::new(self.chunk_size)
            .ok_or_else(|| DownloadError::Config("分块大小必须大于0".to_string()))
    }

    pub fn retry_strategy(&self) -> RetryStrategy {
        RetryStrategy {
            max_retries: self.retry_count,
            base_delay: Duration::from_secs(self.retry_delay),
            max_delay: Duration::from_secs(self.retry_max_delay),
            ..RetryStrategy::default()
        }
    }

    pub fn scheduler_options(&self) -> SchedulerOptions {
        SchedulerOptions {
            max_concurrency: self.max_concurrency,
            mode: self.scheduling,
            retry: self.retry_strategy(),
        }
    }

    /// 获取配置摘要信息
    pub fn get_summary(&self) -> String {
        format!(
            "配置摘要:\n\
            - 下载目录: {}\n\
            - 分块大小: {} 字节\n\
            - 并发数: {}\n\
            - 调度方式: {}\n\
            - 超时时间: {} 秒\n\
            - 重试次数: {}\n\
            - 严格模式: {}",
            self.download_dir,
            self.chunk_size,
            self.max_concurrency,
            match self.scheduling {
                SchedulingMode::Waves => "分批",
                SchedulingMode::Pool => "任务池",
            },
            self.timeout,
            self.retry_count,
            if self.strict { "启用" } else { "禁用" }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.chunk_size, 32768);
        assert_eq!(config.max_concurrency, 4);
        assert_eq!(config.scheduling, SchedulingMode::Waves);
        assert_eq!(config.timeout, 30);
        assert_eq!(config.retry_count, 2);
        assert!(!config.strict);
    }

    #[test]
    fn test_config_validation() {
        let mut config = Config::default();
        assert!(config.validate().is_ok());

        config.chunk_size = 0;
        assert!(config.validate().is_err());
        assert!(config.chunk_size().is_err());

        config = Config::default();
        config.max_concurrency = 0;
        assert!(config.validate().is_err());

        config = Config::default();
        config.retry_delay = 60;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_save_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("conf").join("rangedown.toml");
        let path = path.to_str().unwrap();

        let config = Config {
            chunk_size: 1 << 20,
            scheduling: SchedulingMode::Pool,
            ..Config::default()
        };
        config.save_with_tutorial(path).expect("保存带教程的配置失败");

        let content = std::fs::read_to_string(path).unwrap();
        assert!(content.contains("rangedown 配置文件"));
        assert!(content.contains("scheduling = \"pool\""));

        let loaded = Config::load(path).expect("加载配置失败");
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_config_load_creates_default() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("new.toml");
        let path = path.to_str().unwrap();

        let config = Config::load(path).unwrap();
        assert_eq!(config, Config::default());
        assert!(Path::new(path).exists());
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: Config = toml::from_str("max_concurrency = 8\nstrict = true\n").unwrap();
        assert_eq!(config.max_concurrency, 8);
        assert!(config.strict);
        assert_eq!(config.chunk_size, 32768);
    }

    #[test]
    fn test_config_summary() {
        let summary = Config::default().get_summary();
        assert!(summary.contains("配置摘要"));
        assert!(summary.contains("分块大小: 32768 字节"));
        assert!(summary.contains("分批"));
    }
}
