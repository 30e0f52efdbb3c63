//! 分块调度：按波次（或固定容量的任务池）并发执行 拉取 -> 写入
//!
//! 波次模式下，每一批最多启动 `max_concurrency` 个任务，等这一批全部结束后才启动下一批；
//! 池模式下在途任务数保持在 `max_concurrency` 以内，任一任务结束即回收其句柄并补上下一个块。
//! 两种模式的并发上限相同，单个块失败都不会中断其它块。

use std::sync::Arc;

use futures::future::{join_all, BoxFuture};
use futures::stream::{FuturesUnordered, StreamExt};
use futures::FutureExt;
use serde::{Deserialize, Serialize};
use tokio::task::{JoinError, JoinHandle};

use crate::core::error::DownloadError;
use crate::core::task::{perform_chunk_download, ChunkFailure, ChunkPlan, ChunkSource, ChunkSpec, OutputFile, RetryStrategy};
use crate::ui::ProgressManager;

/// 调度方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SchedulingMode {
    /// 分批启动，批与批之间完全同步
    #[default]
    Waves,
    /// 固定容量任务池，没有批次边界
    Pool,
}

#[derive(Debug, Clone)]
pub struct SchedulerOptions {
    pub max_concurrency: usize,
    pub mode: SchedulingMode,
    pub retry: RetryStrategy,
}

impl Default for SchedulerOptions {
    fn default() -> Self {
        Self {
            max_concurrency: 4,
            mode: SchedulingMode::Waves,
            retry: RetryStrategy::default(),
        }
    }
}

/// 调度结果
#[derive(Debug, Default)]
pub struct SchedulerReport {
    pub total_chunks: usize,
    /// 实际执行的波次数，池模式下为 0
    pub waves: usize,
    pub written_bytes: u64,
    pub failures: Vec<ChunkFailure>,
}

impl SchedulerReport {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

type ChunkHandle = JoinHandle<Result<u64, ChunkFailure>>;
type JoinedChunk = Result<Result<u64, ChunkFailure>, JoinError>;

pub struct WaveScheduler {
    source: Arc<dyn ChunkSource>,
    output: OutputFile,
    options: SchedulerOptions,
    progress: Arc<ProgressManager>,
}

impl WaveScheduler {
    pub fn new(
        source: Arc<dyn ChunkSource>,
        output: OutputFile,
        options: SchedulerOptions,
        progress: Arc<ProgressManager>,
    ) -> Self {
        Self {
            source,
            output,
            options,
            progress,
        }
    }

    pub async fn run(&self, plan: &ChunkPlan) -> SchedulerReport {
        log::info!(
            "开始调度 {} 个块 (块大小 {} 字节, 并发 {}, 模式 {:?})",
            plan.len(),
            plan.chunk_size(),
            self.max_concurrency(),
            self.options.mode
        );

        let mut report = match self.options.mode {
            SchedulingMode::Waves => self.run_waves(plan).await,
            SchedulingMode::Pool => self.run_pool(plan).await,
        };
        report.total_chunks = plan.len();
        report.failures.sort_by_key(|f| f.chunk.index);

        self.progress.finish();
        log::info!(
            "调度结束: {}/{} 个块成功, 写入 {} 字节",
            report.total_chunks - report.failures.len(),
            report.total_chunks,
            report.written_bytes
        );
        report
    }

    fn max_concurrency(&self) -> usize {
        self.options.max_concurrency.max(1)
    }

    async fn run_waves(&self, plan: &ChunkPlan) -> SchedulerReport {
        let mut report = SchedulerReport::default();
        let wave_count = plan.wave_count(self.max_concurrency());

        for (wave_index, wave) in plan.waves(self.max_concurrency()).enumerate() {
            log::debug!("启动第 {}/{} 波, 共 {} 个块", wave_index + 1, wave_count, wave.len());

            // 按偏移升序启动，完成顺序不做要求
            let (chunks, handles): (Vec<ChunkSpec>, Vec<ChunkHandle>) = wave
                .iter()
                .map(|&chunk| (chunk, self.spawn_chunk(chunk)))
                .unzip();

            // 屏障：本波全部结束（无论成败）后才进入下一波
            let results = join_all(handles).await;
            for (chunk, joined) in chunks.into_iter().zip(results) {
                self.collect(&mut report, chunk, joined);
            }
            report.waves += 1;
        }

        report
    }

    async fn run_pool(&self, plan: &ChunkPlan) -> SchedulerReport {
        let mut report = SchedulerReport::default();
        let max_concurrency = self.max_concurrency();
        let mut in_flight: FuturesUnordered<BoxFuture<'static, (ChunkSpec, JoinedChunk)>> =
            FuturesUnordered::new();

        for &chunk in plan.chunks() {
            // 池满时先回收一个已结束的任务再补位
            if in_flight.len() >= max_concurrency {
                if let Some((done, joined)) = in_flight.next().await {
                    self.collect(&mut report, done, joined);
                }
            }
            in_flight.push(self.spawn_chunk(chunk).map(move |joined| (chunk, joined)).boxed());
        }

        while let Some((done, joined)) = in_flight.next().await {
            self.collect(&mut report, done, joined);
        }

        report
    }

    fn spawn_chunk(&self, chunk: ChunkSpec) -> ChunkHandle {
        let source = Arc::clone(&self.source);
        let output = self.output.clone();
        let retry = self.options.retry.clone();
        let progress = Arc::clone(&self.progress);

        tokio::spawn(async move {
            let result = perform_chunk_download(source.as_ref(), &output, chunk, &retry).await;

            match &result {
                Ok(written) => progress.record_chunk(*written),
                Err(failure) => {
                    log::error!("{}", failure);
                    progress.record_failure(&failure.to_string());
                }
            }
            result
        })
    }

    fn collect(
        &self,
        report: &mut SchedulerReport,
        chunk: ChunkSpec,
        joined: JoinedChunk,
    ) {
        match joined {
            Ok(Ok(written)) => report.written_bytes += written,
            Ok(Err(failure)) => report.failures.push(failure),
            Err(e) => {
                let failure = ChunkFailure {
                    chunk,
                    attempts: 1,
                    error: DownloadError::TaskAborted(e.to_string()),
                };
                log::error!("{}", failure);
                self.progress.record_failure(&failure.to_string());
                report.failures.push(failure);
            }
        }
    }
}
