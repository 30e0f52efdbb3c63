use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::config::Config;
use crate::core::error::{DownloadError, DownloadResult};
use crate::core::probe::{self, Resource};
use crate::core::scheduler::{SchedulerReport, WaveScheduler};
use crate::core::task::{ChunkFailure, ChunkPlan, HttpRangeFetcher, OutputFile};
use crate::ui::ProgressManager;

/// 完整下载，或宽松模式下的部分失败
pub const EXIT_SUCCESS: u8 = 0;
/// 参数、配置、探测或预分配阶段的错误
pub const EXIT_FATAL: u8 = 1;
/// 严格模式下存在失败块
pub const EXIT_PARTIAL_FAILURE: u8 = 2;

/// 一次下载的结果
#[derive(Debug)]
pub struct DownloadReport {
    pub resource: Resource,
    pub path: PathBuf,
    pub scheduler: SchedulerReport,
    pub elapsed: Duration,
}

impl DownloadReport {
    pub fn is_complete(&self) -> bool {
        self.scheduler.is_complete()
    }

    pub fn failures(&self) -> &[ChunkFailure] {
        &self.scheduler.failures
    }

    pub fn exit_code(&self, strict: bool) -> u8 {
        if self.is_complete() || !strict {
            EXIT_SUCCESS
        } else {
            EXIT_PARTIAL_FAILURE
        }
    }
}

/// 把一次下载调用的结果映射为进程退出码
pub fn exit_code(result: &DownloadResult<DownloadReport>, strict: bool) -> u8 {
    match result {
        Ok(report) => report.exit_code(strict),
        Err(_) => EXIT_FATAL,
    }
}

/// 下载编排：探测 -> 预分配 -> 调度，本身不处理任何块级逻辑
pub struct Downloader {
    client: reqwest::Client,
    config: Arc<Config>,
}

impl Downloader {
    pub fn new(config: Config) -> DownloadResult<Self> {
        config.validate()?;
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout))
            .connect_timeout(Duration::from_secs(config.connect_timeout))
            .user_agent(&config.user_agent)
            .build()
            .map_err(DownloadError::Network)?;

        Ok(Downloader {
            client,
            config: Arc::new(config),
        })
    }

    /// 下载 `url`，`file_name` 为 `Some` 时覆盖从 URL 推导出的文件名
    ///
    /// 只有探测和预分配阶段的错误会作为 `Err` 返回；块级失败记录在报告里。
    pub async fn download(&self, url: &str, file_name: Option<&str>) -> DownloadResult<DownloadReport> {
        let start = Instant::now();
        log::info!("开始下载: {}", url);

        let resource = probe::probe(&self.client, url).await?;

        let name = file_name.unwrap_or(&resource.name);
        let path = Path::new(&self.config.download_dir).join(name);
        log::info!("文件将保存到: {}", path.display());

        let output = OutputFile::allocate(&path, resource.total_size).await?;

        let plan = ChunkPlan::new(resource.total_size, self.config.chunk_size()?);
        let progress = Arc::new(ProgressManager::new(
            resource.total_size,
            name,
            self.config.show_progress,
        ));
        let source = Arc::new(
            HttpRangeFetcher::new(self.client.clone(), url).with_total_size(resource.total_size),
        );
        let scheduler = WaveScheduler::new(source, output, self.config.scheduler_options(), progress);

        let scheduler_report = scheduler.run(&plan).await;

        Ok(DownloadReport {
            resource,
            path,
            scheduler: scheduler_report,
            elapsed: start.elapsed(),
        })
    }
}
