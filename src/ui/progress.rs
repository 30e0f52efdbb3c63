use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use indicatif::{ProgressBar, ProgressStyle};

const PROGRESS_TEMPLATE: &str =
    "{msg} [{elapsed_precise}] [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({bytes_per_sec}, {eta})";

// 结构体：ProgressManager
// 记录已完成的字节数和块数，并驱动终端进度条；只用于展示，不参与调度
pub struct ProgressManager {
    progress_bar: ProgressBar,
    completed_bytes: AtomicU64,
    completed_chunks: AtomicUsize,
    failed_chunks: AtomicUsize,
}

impl ProgressManager {
    // 构造函数：visible 为 false 时使用隐藏的进度条
    pub fn new(total: u64, name: &str, visible: bool) -> Self {
        let progress_bar = if visible {
            ProgressBar::new(total)
        } else {
            ProgressBar::hidden()
        };
        if let Ok(style) = ProgressStyle::with_template(PROGRESS_TEMPLATE) {
            progress_bar.set_style(style.progress_chars("=>-"));
        }
        progress_bar.set_message(name.to_string());

        ProgressManager {
            progress_bar,
            completed_bytes: AtomicU64::new(0),
            completed_chunks: AtomicUsize::new(0),
            failed_chunks: AtomicUsize::new(0),
        }
    }

    pub fn hidden(total: u64) -> Self {
        Self::new(total, "", false)
    }

    // 方法：记录一个块写入完成
    pub fn record_chunk(&self, bytes: u64) {
        self.completed_bytes.fetch_add(bytes, Ordering::Relaxed);
        self.completed_chunks.fetch_add(1, Ordering::Relaxed);
        self.progress_bar.inc(bytes);
    }

    // 方法：记录一个块失败，消息打印在进度条上方
    pub fn record_failure(&self, message: &str) {
        self.failed_chunks.fetch_add(1, Ordering::Relaxed);
        if self.progress_bar.is_hidden() {
            eprintln!("✗ {}", message);
        } else {
            self.progress_bar.println(format!("✗ {}", message));
        }
    }

    pub fn completed_bytes(&self) -> u64 {
        self.completed_bytes.load(Ordering::Relaxed)
    }

    pub fn completed_chunks(&self) -> usize {
        self.completed_chunks.load(Ordering::Relaxed)
    }

    pub fn failed_chunks(&self) -> usize {
        self.failed_chunks.load(Ordering::Relaxed)
    }

    pub fn finish(&self) {
        let message = if self.failed_chunks() == 0 { "完成" } else { "部分失败" };
        self.progress_bar.finish_with_message(message);
    }
}
