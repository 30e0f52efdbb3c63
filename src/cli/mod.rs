//! CLI: 命令行接口和参数解析模块
//!
//! ## 主要功能
//!
//! - 命令行参数解析和验证
//! - 配置文件加载，并把命令行参数合并进配置
//!
//! ## 示例
//!
//! - 基本下载：`rangedown <url>`
//! - 调整分块与并发：`rangedown -s 1048576 -t 8 <url>`
//! - 任务池调度：`rangedown --mode pool <url>`
//! - 指定配置：`rangedown -c rangedown.toml <url>`

use clap::Parser;
use crate::config::Config;
use crate::core::error::DownloadError;
use crate::core::scheduler::SchedulingMode;
use crate::utils::validator;

const LONG_VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (built ",
    env!("VERGEN_BUILD_DATE"),
    ")"
);

/// rangedown 命令行参数
///
/// 示例用法：
///   rangedown https://example.com/file.zip
///   rangedown -t 8 --mode pool https://example.com/file.zip
///
/// 更多用法请加 --help 查看
#[derive(Parser, Debug, Clone)]
#[command(
    name = "rangedown",
    author = "panzhifu",
    version = env!("CARGO_PKG_VERSION"),
    long_version = LONG_VERSION,
    about = "一个用 Rust 编写的分段并行下载器",
    long_about = "把远程文件按固定大小切分为字节区间，通过 HTTP Range 请求并发下载，\n并直接写入预分配文件的对应偏移。\n\n示例：\n  rangedown https://example.com/file.zip\n  rangedown -s 1048576 -t 8 https://example.com/file.zip\n  rangedown --mode pool --strict https://example.com/file.zip\n"
)]
pub struct Args {
    /// 要下载的文件URL
    #[arg(required = true, help = "要下载的文件URL。")]
    pub url: String,

    /// 配置文件路径
    #[arg(short = 'c', long, help = "TOML 配置文件路径；文件不存在时会生成带说明的默认配置。")]
    pub config: Option<String>,

    /// 分块大小（字节）
    #[arg(short = 's', long, help = "分块大小（字节），默认 32768。")]
    pub chunk_size: Option<u64>,

    /// 每波同时下载的块数
    #[arg(short = 't', long, help = "每波同时下载的块数，默认 4。")]
    pub threads: Option<usize>,

    /// 调度方式
    #[arg(short = 'm', long, value_enum, help = "调度方式：waves（分批）或 pool（任务池）。")]
    pub mode: Option<SchedulingMode>,

    /// 每个块的重试次数
    #[arg(short = 'r', long, help = "每个块失败后的重试次数，0 表示不重试。")]
    pub retries: Option<usize>,

    /// 单次请求超时（秒）
    #[arg(long, help = "单次请求超时（秒）。")]
    pub timeout: Option<u64>,

    /// 指定下载目录（默认：当前工作目录）
    #[arg(long, short = 'd', help = "指定下载目录，覆盖配置文件中的设置，默认当前工作目录。")]
    pub download_dir: Option<String>,

    /// 指定下载文件名
    #[arg(long, short = 'n', help = "指定下载文件名，覆盖URL自动推断。")]
    pub file_name: Option<String>,

    /// 有块失败时以非零状态退出
    #[arg(long, help = "只要有块下载失败就以非零状态退出。")]
    pub strict: bool,

    /// 不显示进度条
    #[arg(short = 'q', long, help = "不显示进度条。")]
    pub quiet: bool,

    /// 日志详细程度
    #[arg(short = 'v', long, action = clap::ArgAction::Count, help = "提高日志详细程度（-v info，-vv debug）。")]
    pub verbose: u8,

    /// 日志文件
    #[arg(long, help = "把日志写入文件而不是标准错误输出。")]
    pub log_file: Option<String>,
}

impl Args {
    pub fn parse_args() -> Result<(Self, Config), DownloadError> {
        Self::resolve(Args::parse())
    }

    /// 加载配置文件并合并命令行参数
    pub fn resolve(args: Args) -> Result<(Self, Config), DownloadError> {
        if !validator::is_valid_url(&args.url) {
            return Err(DownloadError::InvalidLocator(args.url.clone()));
        }
        if let Some(name) = &args.file_name {
            validator::validate_file_name(name)
                .map_err(|e| DownloadError::Config(e.to_string()))?;
        }

        let mut config = match &args.config {
            Some(path) => Config::load(path)?,
            None => Config::default(),
        };

        // 合并命令行参数到配置
        config.merge_from_args(&args);

        // 验证配置
        config.validate()?;

        Ok((args, config))
    }
}

// 测试模块
#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn parse(args: &[&str]) -> Args {
        Args::try_parse_from(args).unwrap()
    }

    #[test]
    fn test_args_parsing() {
        let args = parse(&["rangedown", "https://example.com/file.zip"]);
        assert_eq!(args.url, "https://example.com/file.zip");
        assert!(args.mode.is_none());
        assert!(!args.strict);
    }

    #[test]
    fn test_url_is_required() {
        assert!(Args::try_parse_from(["rangedown"]).is_err());
    }

    #[test]
    fn test_cli_overrides_defaults() {
        let args = parse(&[
            "rangedown", "-s", "1024", "-t", "8", "--mode", "pool", "-r", "0", "--strict", "-q",
            "https://example.com/file.zip",
        ]);
        let (_, config) = Args::resolve(args).unwrap();
        assert_eq!(config.chunk_size, 1024);
        assert_eq!(config.max_concurrency, 8);
        assert_eq!(config.scheduling, SchedulingMode::Pool);
        assert_eq!(config.retry_count, 0);
        assert!(config.strict);
        assert!(!config.show_progress);
    }

    #[test]
    fn test_cli_overrides_config_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("rangedown.toml");
        std::fs::write(&path, "chunk_size = 4096\nmax_concurrency = 2\n").unwrap();

        let args = parse(&[
            "rangedown", "-c", path.to_str().unwrap(), "-t", "6", "https://example.com/file.zip",
        ]);
        let (_, config) = Args::resolve(args).unwrap();
        assert_eq!(config.chunk_size, 4096);
        assert_eq!(config.max_concurrency, 6);
    }

    #[test]
    fn test_invalid_values_rejected() {
        let args = parse(&["rangedown", "-t", "0", "https://example.com/file.zip"]);
        assert!(matches!(Args::resolve(args), Err(DownloadError::Config(_))));

        let args = parse(&["rangedown", "ftp://example.com/file.zip"]);
        assert!(matches!(Args::resolve(args), Err(DownloadError::InvalidLocator(_))));

        let args = parse(&["rangedown", "-n", "../escape.bin", "https://example.com/file.zip"]);
        assert!(matches!(Args::resolve(args), Err(DownloadError::Config(_))));
    }
}
