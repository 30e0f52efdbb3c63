mod progress;

use std::fmt;
use std::time::{Duration, Instant};
pub use progress::ProgressManager;

pub fn print_success(message: &str) {
    println!("✓ {}", message);
}

pub fn print_error(message: &str) {
    eprintln!("✗ {}", message);
}

pub struct DownloadSummary {
    pub file_name: String,
    pub total_size: u64,
    pub written_bytes: u64,
    pub total_chunks: usize,
    pub failed_chunks: usize,
    pub elapsed_time: Duration,
}

impl fmt::Display for DownloadSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "\n下载摘要:")?;
        writeln!(f, "文件: {}", self.file_name)?;
        writeln!(f, "总大小: {}", format_size(self.total_size))?;
        writeln!(f, "已写入: {}", format_size(self.written_bytes))?;
        writeln!(f, "分块: {} (失败 {})", self.total_chunks, self.failed_chunks)?;
        write!(f, "下载耗时: {:.2}秒", self.elapsed_time.as_secs_f64())
    }
}

pub fn format_size(size: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
    let mut size = size as f64;
    let mut unit_index = 0;

    while size >= 1024.0 && unit_index < UNITS.len() - 1 {
        size /= 1024.0;
        unit_index += 1;
    }

    format!("{:.2} {}", size, UNITS[unit_index])
}

/// 作用域计时器：离开作用域时打印总耗时，无论从哪条路径返回
pub struct ScopedTimer {
    start: Instant,
}

impl ScopedTimer {
    pub fn start() -> Self {
        Self { start: Instant::now() }
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}

impl Drop for ScopedTimer {
    fn drop(&mut self) {
        let elapsed = self.elapsed();
        log::info!("总耗时 {:?}", elapsed);
        println!("Execution time is {:.2} seconds", elapsed.as_secs_f64());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(0), "0.00 B");
        assert_eq!(format_size(1500), "1.46 KB");
        assert_eq!(format_size(2048), "2.00 KB");
        assert_eq!(format_size(5 * 1024 * 1024), "5.00 MB");
    }

    #[test]
    fn test_summary_display() {
        let summary = DownloadSummary {
            file_name: "file.bin".to_string(),
            total_size: 100_000,
            written_bytes: 98_304,
            total_chunks: 4,
            failed_chunks: 1,
            elapsed_time: Duration::from_millis(1500),
        };
        let text = summary.to_string();
        assert!(text.contains("file.bin"));
        assert!(text.contains("分块: 4 (失败 1)"));
        assert!(text.contains("1.50秒"));
    }
}
