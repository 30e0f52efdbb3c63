//! Core: 资源探测、分块调度、单块下载与错误处理等核心逻辑模块

pub mod downloader;
pub mod error;
pub mod probe;
pub mod scheduler;
pub mod task;

// 只导出主流程和其它模块实际用到的类型
pub use downloader::{exit_code, DownloadReport, Downloader};
pub use error::{DownloadError, DownloadResult};
pub use probe::Resource;
pub use scheduler::{SchedulerOptions, SchedulerReport, SchedulingMode, WaveScheduler};
